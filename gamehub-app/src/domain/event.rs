use serde::Serialize;

use crate::domain::{
    MatchId, OrderId, TeamId, TournamentId, TransactionId, UserId,
    ledger::TransactionStatus,
    r#match::{MatchResult, MatchStatus},
    notification::Notification,
    order::OrderStatus,
    tournament::TournamentStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    User(UserId),
    Tournament(TournamentId),
    Team(TeamId),
    Match(MatchId),
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Room::User(id) => write!(f, "user:{}", id),
            Room::Tournament(id) => write!(f, "tournament:{}", id),
            Room::Team(id) => write!(f, "team:{}", id),
            Room::Match(id) => write!(f, "match:{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum DomainEvent {
    Notification(Notification),
    TournamentUpdated {
        tournament_id: TournamentId,
        status: TournamentStatus,
    },
    ParticipantJoined {
        tournament_id: TournamentId,
        user_id: UserId,
    },
    ParticipantLeft {
        tournament_id: TournamentId,
        user_id: UserId,
    },
    MatchStarted {
        match_id: MatchId,
    },
    MatchCompleted {
        match_id: MatchId,
        result: MatchResult,
    },
    MatchUpdated {
        match_id: MatchId,
        status: MatchStatus,
    },
    TeamMemberJoined {
        team_id: TeamId,
        user_id: UserId,
    },
    TeamMemberLeft {
        team_id: TeamId,
        user_id: UserId,
    },
    TeamLeaderChanged {
        team_id: TeamId,
        leader_id: UserId,
    },
    OrderUpdated {
        order_id: OrderId,
        status: OrderStatus,
    },
    TransactionUpdated {
        transaction_id: TransactionId,
        status: TransactionStatus,
    },
}

/// Side effects collected by a workflow while it mutates state. Nothing in here
/// reaches a client until the workflow hands the outbox to the dispatcher after the
/// write has committed.
#[derive(Debug, Default)]
pub struct Outbox {
    pub events: Vec<(Room, DomainEvent)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored notifications are pushed to their owner's personal room.
    pub fn notification(mut self, notification: Notification) -> Self {
        let room = Room::User(notification.user_id);
        self.events
            .push((room, DomainEvent::Notification(notification)));
        self
    }

    pub fn event(mut self, room: Room, event: DomainEvent) -> Self {
        self.events.push((room, event));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_names() {
        let id = UserId::new();
        assert_eq!(Room::User(id).to_string(), format!("user:{}", id));
        let id = MatchId::new();
        assert_eq!(Room::Match(id).to_string(), format!("match:{}", id));
    }

    #[test]
    fn test_event_wire_shape() {
        let match_id = MatchId::new();
        let json = serde_json::to_value(DomainEvent::MatchStarted { match_id }).unwrap();
        assert_eq!(json["event"], "match_started");
        assert_eq!(json["data"]["matchId"], match_id.to_string());
    }
}
