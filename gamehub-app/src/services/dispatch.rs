use std::sync::Arc;

use crate::{domain::event::Outbox, ports::realtime::RealtimePort};

pub trait EventDispatcher {
    /// Publishes everything collected in the outbox. Call only after the
    /// corresponding write has committed.
    fn dispatch(&self, outbox: Outbox);
}

pub struct EventDispatcherImpl<R: RealtimePort> {
    realtime_port: Arc<R>,
}

impl<R: RealtimePort> EventDispatcherImpl<R> {
    pub fn new(realtime_port: Arc<R>) -> Self {
        Self { realtime_port }
    }
}

impl<R: RealtimePort> EventDispatcher for EventDispatcherImpl<R> {
    fn dispatch(&self, outbox: Outbox) {
        for (room, event) in outbox.events.iter() {
            log::debug!("Publishing event to {}", room);
            self.realtime_port.publish(room, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            TeamId, UserId,
            event::{DomainEvent, Room},
            notification::{NotificationDraft, NotificationType},
        },
        testing::RecordingRealtime,
    };

    #[test]
    fn test_notifications_reach_owner_room() {
        let realtime = Arc::new(RecordingRealtime::default());
        let dispatcher = EventDispatcherImpl::new(realtime.clone());
        let user_id = UserId::new();
        let team_id = TeamId::new();
        let notification =
            NotificationDraft::new(user_id, NotificationType::Team, "Hi", "there")
                .into_notification(chrono::Utc::now());

        dispatcher.dispatch(
            Outbox::new()
                .notification(notification.clone())
                .event(
                    Room::Team(team_id),
                    DomainEvent::TeamMemberJoined { team_id, user_id },
                ),
        );

        let published = realtime.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, format!("user:{}", user_id));
        assert_eq!(published[0].1, DomainEvent::Notification(notification));
        assert_eq!(published[1].0, format!("team:{}", team_id));
    }

    #[test]
    fn test_empty_outbox_publishes_nothing() {
        let realtime = Arc::new(RecordingRealtime::default());
        EventDispatcherImpl::new(realtime.clone()).dispatch(Outbox::new());
        assert!(realtime.published().is_empty());
    }
}
