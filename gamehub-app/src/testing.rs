//! In-memory doubles for the repositories and ports, used by the workflow tests.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::{
    domain::{
        GameProfileId, LedgerError, MatchId, NotificationId, OrderId, Page, Pagination,
        RepoError, RewardId, SortOrder, TeamId, TournamentId, TransactionId, UserId,
        cache::MokaCacheStore,
        event::{DomainEvent, Outbox, Room},
        game_profile::{GameProfile, GameProfileInput, GameProfileRepository, GameProfileUpdate},
        ledger::{
            NewTransaction, Settlement, Transaction, TransactionMetadata, TransactionQuery,
            TransactionRepository, TransactionStatus, TransactionType,
        },
        r#match::{
            CompleteMatchError, Match, MatchParticipant, MatchQuery, MatchRepository, MatchResult, MatchStatus,
            MatchUpdate, NewMatch, ParticipantOutcome,
        },
        notification::{
            Notification, NotificationCounts, NotificationDraft, NotificationQuery,
            NotificationRepository,
        },
        order::{NewOrder, Order, OrderQuery, OrderRepository, OrderStatus, OrderTransition},
        reward::{
            NewReward, Reward, RewardQuery, RewardRepository, RewardType, RewardUpdate, UserReward,
        },
        team::{NewTeam, Team, TeamMember, TeamQuery, TeamRepository, TeamRole, TeamUpdate},
        tournament::{
            NewTournament, Tournament, TournamentParticipant, TournamentQuery,
            TournamentRepository, TournamentStatus, TournamentUpdate,
        },
        user::{
            NewUser, Role, User, UserActivity, UserProfile, UserQuery, UserRepository,
            UserSortBy, UserUpdate,
        },
    },
    ports::{
        email::{EmailPort, SendEmailError},
        image_storage::{ImageFolder, ImageStorageError, ImageStoragePort, ImageTransform, StoredImage},
        realtime::RealtimePort,
        token::{TokenError, TokenPort},
    },
    services::dispatch::EventDispatcher,
};

pub const TEST_PASSWORD: &str = "Passw0rd!";

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    tournaments: HashMap<TournamentId, Tournament>,
    participants: Vec<TournamentParticipant>,
    teams: HashMap<TeamId, Team>,
    members: Vec<TeamMember>,
    matches: HashMap<MatchId, Match>,
    match_participants: Vec<MatchParticipant>,
    transactions: Vec<Transaction>,
    orders: Vec<Order>,
    rewards: Vec<Reward>,
    claims: Vec<(UserId, RewardId, DateTime<Utc>)>,
    notifications: Vec<Notification>,
    game_profiles: Vec<GameProfile>,
}

impl State {
    fn username(&self, id: UserId) -> String {
        self.users
            .get(&id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn store_notification(&mut self, draft: NotificationDraft) -> Notification {
        let notification = draft.into_notification(Utc::now());
        self.notifications.push(notification.clone());
        notification
    }

    fn ledger_entry(
        &mut self,
        user_id: UserId,
        transaction_type: TransactionType,
        amount: i64,
        description: String,
        order_id: OrderId,
    ) {
        let now = Utc::now();
        self.transactions.push(Transaction {
            id: TransactionId::new(),
            user_id,
            transaction_type,
            amount,
            status: TransactionStatus::Completed,
            description: Some(description),
            metadata: Some(TransactionMetadata::Order { order_id }),
            created_at: now,
            updated_at: now,
        });
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_user(&self, username: &str, role: Role, coins: i64) -> User {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: format!("{}@example.com", username),
            username: username.to_string(),
            password_hash: bcrypt::hash(TEST_PASSWORD, 4).unwrap(),
            first_name: None,
            last_name: None,
            gamer_tag: None,
            avatar: None,
            role,
            is_active: true,
            is_verified: true,
            level: 1,
            experience: 0,
            coins,
            last_login: None,
            created_at: now,
            updated_at: now,
            profile: Some(UserProfile::default()),
        };
        self.state.lock().users.insert(user.id, user.clone());
        user
    }

    pub fn user(&self, id: UserId) -> Option<User> {
        self.state.lock().users.get(&id).cloned()
    }

    pub fn notifications_for(&self, id: UserId) -> Vec<Notification> {
        self.state
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == id)
            .cloned()
            .collect()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state.lock().orders.clone()
    }

    pub fn transactions_for(&self, id: UserId) -> Vec<Transaction> {
        self.state
            .lock()
            .transactions
            .iter()
            .filter(|t| t.user_id == id)
            .cloned()
            .collect()
    }

    pub fn rows_referencing(&self, id: UserId) -> usize {
        let s = self.state.lock();
        s.notifications.iter().filter(|n| n.user_id == id).count()
            + s.transactions.iter().filter(|t| t.user_id == id).count()
            + s.claims.iter().filter(|c| c.0 == id).count()
            + s.orders.iter().filter(|o| o.user_id == id).count()
            + s.members.iter().filter(|m| m.user_id == id).count()
            + s.participants.iter().filter(|p| p.user_id == id).count()
            + s.match_participants.iter().filter(|p| p.user_id == id).count()
            + s.game_profiles.iter().filter(|p| p.user_id == id).count()
            + usize::from(s.users.contains_key(&id))
    }
}

fn page<T>(items: Vec<T>, pagination: &Pagination) -> Page<T> {
    Page {
        total: items.len() as u64,
        items: pagination.slice(items),
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut s = self.state.lock();
        if s.users.values().any(|u| u.email == new_user.email || u.username == new_user.username)
        {
            return Err(RepoError::UniqueViolation);
        }
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: new_user.email,
            username: new_user.username,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            gamer_tag: None,
            avatar: None,
            role: new_user.role,
            is_active: true,
            is_verified: new_user.is_verified,
            level: 1,
            experience: 0,
            coins: 0,
            last_login: None,
            created_at: now,
            updated_at: now,
            profile: Some(UserProfile::default()),
        };
        s.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, RepoError> {
        self.state
            .lock()
            .users
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .state
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .state
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_gamer_tag(&self, gamer_tag: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .state
            .lock()
            .users
            .values()
            .find(|u| u.gamer_tag.as_deref() == Some(gamer_tag))
            .cloned())
    }

    async fn query_users(&self, query: UserQuery) -> Result<Page<User>, RepoError> {
        let s = self.state.lock();
        let mut users: Vec<User> = s
            .users
            .values()
            .filter(|u| u.is_active)
            .filter(|u| match &query.search {
                Some(term) => [Some(&u.username), u.first_name.as_ref(), u.last_name.as_ref()]
                    .into_iter()
                    .flatten()
                    .any(|v| v.contains(term.as_str())),
                None => true,
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| match query.sort_by {
            UserSortBy::CreatedAt => a.created_at.cmp(&b.created_at),
            UserSortBy::Username => a.username.cmp(&b.username),
            UserSortBy::Level => a.level.cmp(&b.level),
            UserSortBy::Experience => a.experience.cmp(&b.experience),
        });
        if query.sort_order == SortOrder::Descending {
            users.reverse();
        }
        Ok(page(users, &query.pagination))
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, RepoError> {
        let mut s = self.state.lock();
        if let Some(tag) = &update.gamer_tag
            && s.users
                .values()
                .any(|u| u.id != id && u.gamer_tag.as_deref() == Some(tag.as_str()))
        {
            return Err(RepoError::UniqueViolation);
        }
        let user = s.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        if let Some(v) = update.first_name {
            user.first_name = Some(v);
        }
        if let Some(v) = update.last_name {
            user.last_name = Some(v);
        }
        if let Some(v) = update.gamer_tag {
            user.gamer_tag = Some(v);
        }
        if let Some(v) = update.avatar {
            user.avatar = v;
        }
        if let Some(v) = update.role {
            user.role = v;
        }
        if let Some(v) = update.is_active {
            user.is_active = v;
        }
        if let Some(v) = update.is_verified {
            user.is_verified = v;
        }
        if let Some(v) = update.password_hash {
            user.password_hash = v;
        }
        if let Some(v) = update.last_login {
            user.last_login = Some(v);
        }
        if let Some(p) = update.profile {
            let profile = user.profile.get_or_insert_with(UserProfile::default);
            if let Some(v) = p.bio {
                profile.bio = Some(v);
            }
            if let Some(v) = p.country {
                profile.country = Some(v);
            }
            if let Some(v) = p.timezone {
                profile.timezone = Some(v);
            }
            if let Some(v) = p.game_setup {
                profile.game_setup = v;
            }
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_active(
        &self,
        id: UserId,
        active: bool,
        notification: NotificationDraft,
    ) -> Result<(User, Notification), RepoError> {
        let mut s = self.state.lock();
        let user = s.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.is_active = active;
        let user = user.clone();
        let notification = s.store_notification(notification);
        Ok((user, notification))
    }

    async fn delete_user_cascade(&self, id: UserId) -> Result<(), RepoError> {
        let mut s = self.state.lock();
        if !s.users.contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        s.notifications.retain(|n| n.user_id != id);
        s.transactions.retain(|t| t.user_id != id);
        s.claims.retain(|c| c.0 != id);
        s.orders.retain(|o| o.user_id != id);
        s.members.retain(|m| m.user_id != id);
        s.participants.retain(|p| p.user_id != id);
        s.match_participants.retain(|p| p.user_id != id);
        s.game_profiles.retain(|p| p.user_id != id);
        s.users.remove(&id);
        Ok(())
    }

    async fn user_activity(&self, id: UserId) -> Result<UserActivity, RepoError> {
        let s = self.state.lock();
        Ok(UserActivity {
            teams: s.members.iter().filter(|m| m.user_id == id).count() as u64,
            tournaments: s.participants.iter().filter(|p| p.user_id == id).count() as u64,
            matches: s.match_participants.iter().filter(|p| p.user_id == id).count() as u64,
        })
    }
}

#[async_trait::async_trait]
impl GameProfileRepository for InMemoryStore {
    async fn list_game_profiles(&self, user_id: UserId) -> Result<Vec<GameProfile>, RepoError> {
        let mut profiles: Vec<GameProfile> = self
            .state
            .lock()
            .game_profiles
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        profiles.sort_by_key(|p| (!p.is_primary, p.created_at));
        Ok(profiles)
    }

    async fn upsert_game_profile(
        &self,
        user_id: UserId,
        input: GameProfileInput,
    ) -> Result<GameProfile, RepoError> {
        let mut s = self.state.lock();
        let now = Utc::now();
        if let Some(existing) = s
            .game_profiles
            .iter_mut()
            .find(|p| p.user_id == user_id && p.game_id == input.game_id)
        {
            existing.game_name = input.game_name;
            existing.game_uid = input.game_uid;
            existing.in_game_name = input.in_game_name;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let is_primary = !s.game_profiles.iter().any(|p| p.user_id == user_id);
        let profile = GameProfile {
            id: GameProfileId::new(),
            user_id,
            game_id: input.game_id,
            game_name: input.game_name,
            game_uid: input.game_uid,
            in_game_name: input.in_game_name,
            is_primary,
            created_at: now,
            updated_at: now,
        };
        s.game_profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_game_profile(
        &self,
        user_id: UserId,
        id: GameProfileId,
        update: GameProfileUpdate,
    ) -> Result<GameProfile, RepoError> {
        let mut s = self.state.lock();
        if !s
            .game_profiles
            .iter()
            .any(|p| p.id == id && p.user_id == user_id)
        {
            return Err(RepoError::NotFound);
        }
        if update.is_primary == Some(true) {
            for p in s.game_profiles.iter_mut().filter(|p| p.user_id == user_id) {
                p.is_primary = false;
            }
        }
        let profile = s
            .game_profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        if let Some(v) = update.game_uid {
            profile.game_uid = v;
        }
        if let Some(v) = update.in_game_name {
            profile.in_game_name = v;
        }
        if let Some(v) = update.is_primary {
            profile.is_primary = v;
        }
        Ok(profile.clone())
    }

    async fn delete_game_profile(
        &self,
        user_id: UserId,
        id: GameProfileId,
    ) -> Result<(), RepoError> {
        let mut s = self.state.lock();
        let index = s
            .game_profiles
            .iter()
            .position(|p| p.id == id && p.user_id == user_id)
            .ok_or(RepoError::NotFound)?;
        let removed = s.game_profiles.remove(index);
        if removed.is_primary
            && let Some(next) = s
                .game_profiles
                .iter_mut()
                .filter(|p| p.user_id == user_id)
                .min_by_key(|p| p.created_at)
        {
            next.is_primary = true;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TournamentRepository for InMemoryStore {
    async fn create_tournament(&self, t: NewTournament) -> Result<Tournament, RepoError> {
        let now = Utc::now();
        let tournament = Tournament {
            id: TournamentId::new(),
            title: t.title,
            description: t.description,
            rules: t.rules,
            game: t.game,
            format: t.format,
            max_participants: t.max_participants,
            entry_fee: t.entry_fee,
            prize_pool: t.prize_pool,
            status: TournamentStatus::Upcoming,
            start_date: t.start_date,
            end_date: t.end_date,
            banner: None,
            created_by: t.created_by,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .tournaments
            .insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    async fn get_tournament(&self, id: TournamentId) -> Result<Tournament, RepoError> {
        self.state
            .lock()
            .tournaments
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn query_tournaments(
        &self,
        query: TournamentQuery,
    ) -> Result<Page<Tournament>, RepoError> {
        let mut items: Vec<Tournament> = self
            .state
            .lock()
            .tournaments
            .values()
            .filter(|t| query.status.is_none_or(|s| t.status == s))
            .filter(|t| query.game.as_ref().is_none_or(|g| t.game.contains(g.as_str())))
            .cloned()
            .collect();
        items.sort_by_key(|t| t.start_date);
        Ok(page(items, &query.pagination))
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        u: TournamentUpdate,
    ) -> Result<Tournament, RepoError> {
        let mut s = self.state.lock();
        let t = s.tournaments.get_mut(&id).ok_or(RepoError::NotFound)?;
        if let Some(v) = u.title {
            t.title = v;
        }
        if let Some(v) = u.description {
            t.description = Some(v);
        }
        if let Some(v) = u.rules {
            t.rules = Some(v);
        }
        if let Some(v) = u.game {
            t.game = v;
        }
        if let Some(v) = u.format {
            t.format = v;
        }
        if let Some(v) = u.max_participants {
            t.max_participants = v;
        }
        if let Some(v) = u.entry_fee {
            t.entry_fee = v;
        }
        if let Some(v) = u.prize_pool {
            t.prize_pool = v;
        }
        if let Some(v) = u.status {
            t.status = v;
        }
        if let Some(v) = u.start_date {
            t.start_date = v;
        }
        if let Some(v) = u.end_date {
            t.end_date = Some(v);
        }
        if let Some(v) = u.banner {
            t.banner = Some(v);
        }
        t.updated_at = Utc::now();
        Ok(t.clone())
    }

    async fn delete_tournament(&self, id: TournamentId) -> Result<(), RepoError> {
        let mut s = self.state.lock();
        s.tournaments.remove(&id).ok_or(RepoError::NotFound)?;
        s.participants.retain(|p| p.tournament_id != id);
        for m in s.matches.values_mut() {
            if m.tournament_id == Some(id) {
                m.tournament_id = None;
            }
        }
        Ok(())
    }

    async fn count_participants(&self, id: TournamentId) -> Result<u64, RepoError> {
        Ok(self
            .state
            .lock()
            .participants
            .iter()
            .filter(|p| p.tournament_id == id)
            .count() as u64)
    }

    async fn add_participant(
        &self,
        id: TournamentId,
        user_id: UserId,
    ) -> Result<TournamentParticipant, RepoError> {
        let mut s = self.state.lock();
        if s
            .participants
            .iter()
            .any(|p| p.tournament_id == id && p.user_id == user_id)
        {
            return Err(RepoError::UniqueViolation);
        }
        let participant = TournamentParticipant {
            tournament_id: id,
            user_id,
            username: s.username(user_id),
            registered_at: Utc::now(),
        };
        s.participants.push(participant.clone());
        Ok(participant)
    }

    async fn remove_participant(
        &self,
        id: TournamentId,
        user_id: UserId,
    ) -> Result<(), RepoError> {
        let mut s = self.state.lock();
        let index = s
            .participants
            .iter()
            .position(|p| p.tournament_id == id && p.user_id == user_id)
            .ok_or(RepoError::NotFound)?;
        s.participants.remove(index);
        Ok(())
    }

    async fn list_participants(
        &self,
        id: TournamentId,
    ) -> Result<Vec<TournamentParticipant>, RepoError> {
        Ok(self
            .state
            .lock()
            .participants
            .iter()
            .filter(|p| p.tournament_id == id)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl TeamRepository for InMemoryStore {
    async fn create_team_with_leader(
        &self,
        team: NewTeam,
        leader: UserId,
    ) -> Result<Team, RepoError> {
        let mut s = self.state.lock();
        let now = Utc::now();
        let team = Team {
            id: TeamId::new(),
            name: team.name,
            description: team.description,
            logo: None,
            max_members: team.max_members,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let member = TeamMember {
            team_id: team.id,
            user_id: leader,
            username: s.username(leader),
            role: TeamRole::Leader,
            joined_at: now,
        };
        s.teams.insert(team.id, team.clone());
        s.members.push(member);
        Ok(team)
    }

    async fn get_team(&self, id: TeamId) -> Result<Team, RepoError> {
        self.state
            .lock()
            .teams
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn query_teams(&self, query: TeamQuery) -> Result<Page<Team>, RepoError> {
        let mut items: Vec<Team> = self
            .state
            .lock()
            .teams
            .values()
            .filter(|t| t.is_active)
            .filter(|t| {
                query
                    .search
                    .as_ref()
                    .is_none_or(|term| t.name.contains(term.as_str()))
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(items, &query.pagination))
    }

    async fn update_team(&self, id: TeamId, u: TeamUpdate) -> Result<Team, RepoError> {
        let mut s = self.state.lock();
        let team = s.teams.get_mut(&id).ok_or(RepoError::NotFound)?;
        if let Some(v) = u.name {
            team.name = v;
        }
        if let Some(v) = u.description {
            team.description = Some(v);
        }
        if let Some(v) = u.logo {
            team.logo = Some(v);
        }
        if let Some(v) = u.max_members {
            team.max_members = v;
        }
        if let Some(v) = u.is_active {
            team.is_active = v;
        }
        team.updated_at = Utc::now();
        Ok(team.clone())
    }

    async fn find_membership(&self, user_id: UserId) -> Result<Option<TeamMember>, RepoError> {
        Ok(self
            .state
            .lock()
            .members
            .iter()
            .find(|m| m.user_id == user_id)
            .cloned())
    }

    async fn get_member(
        &self,
        id: TeamId,
        user_id: UserId,
    ) -> Result<Option<TeamMember>, RepoError> {
        Ok(self
            .state
            .lock()
            .members
            .iter()
            .find(|m| m.team_id == id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&self, id: TeamId) -> Result<Vec<TeamMember>, RepoError> {
        let mut members: Vec<TeamMember> = self
            .state
            .lock()
            .members
            .iter()
            .filter(|m| m.team_id == id)
            .cloned()
            .collect();
        members.sort_by_key(|m| (m.role != TeamRole::Leader, m.joined_at));
        Ok(members)
    }

    async fn count_members(&self, id: TeamId) -> Result<u64, RepoError> {
        Ok(self
            .state
            .lock()
            .members
            .iter()
            .filter(|m| m.team_id == id)
            .count() as u64)
    }

    async fn add_member(
        &self,
        id: TeamId,
        user_id: UserId,
        role: TeamRole,
    ) -> Result<TeamMember, RepoError> {
        let mut s = self.state.lock();
        if s.members.iter().any(|m| m.team_id == id && m.user_id == user_id) {
            return Err(RepoError::UniqueViolation);
        }
        let member = TeamMember {
            team_id: id,
            user_id,
            username: s.username(user_id),
            role,
            joined_at: Utc::now(),
        };
        s.members.push(member.clone());
        Ok(member)
    }

    async fn remove_member(&self, id: TeamId, user_id: UserId) -> Result<(), RepoError> {
        let mut s = self.state.lock();
        let index = s
            .members
            .iter()
            .position(|m| m.team_id == id && m.user_id == user_id)
            .ok_or(RepoError::NotFound)?;
        s.members.remove(index);
        Ok(())
    }

    async fn transfer_leadership(
        &self,
        id: TeamId,
        from: UserId,
        to: UserId,
    ) -> Result<(), RepoError> {
        let mut s = self.state.lock();
        if !s.members.iter().any(|m| m.team_id == id && m.user_id == to) {
            return Err(RepoError::NotFound);
        }
        for m in s.members.iter_mut().filter(|m| m.team_id == id) {
            if m.user_id == from {
                m.role = TeamRole::Member;
            } else if m.user_id == to {
                m.role = TeamRole::Leader;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MatchRepository for InMemoryStore {
    async fn create_match(
        &self,
        new_match: NewMatch,
        participants: Vec<UserId>,
    ) -> Result<Match, RepoError> {
        let mut s = self.state.lock();
        if participants.iter().any(|id| !s.users.contains_key(id)) {
            return Err(RepoError::ForeignKeyViolation);
        }
        let now = Utc::now();
        let created = Match {
            id: MatchId::new(),
            title: new_match.title,
            tournament_id: new_match.tournament_id,
            game: new_match.game,
            round: new_match.round,
            status: MatchStatus::Scheduled,
            scheduled_at: new_match.scheduled_at,
            started_at: None,
            ended_at: None,
            result: None,
            screenshots: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        for (i, user_id) in participants.into_iter().enumerate() {
            let username = s.username(user_id);
            s.match_participants.push(MatchParticipant {
                match_id: created.id,
                user_id,
                username,
                score: None,
                position: Some(i as i32 + 1),
            });
        }
        s.matches.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_match(&self, id: MatchId) -> Result<Match, RepoError> {
        self.state
            .lock()
            .matches
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn query_matches(&self, query: MatchQuery) -> Result<Page<Match>, RepoError> {
        let mut items: Vec<Match> = self
            .state
            .lock()
            .matches
            .values()
            .filter(|m| query.status.is_none_or(|s| m.status == s))
            .filter(|m| query.game.as_ref().is_none_or(|g| m.game.contains(g.as_str())))
            .filter(|m| query.tournament_id.is_none_or(|t| m.tournament_id == Some(t)))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        Ok(page(items, &query.pagination))
    }

    async fn list_tournament_matches(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<Match>, RepoError> {
        let mut items: Vec<Match> = self
            .state
            .lock()
            .matches
            .values()
            .filter(|m| m.tournament_id == Some(tournament_id))
            .cloned()
            .collect();
        items.sort_by_key(|m| (m.round, m.scheduled_at));
        Ok(items)
    }

    async fn update_match(&self, id: MatchId, u: MatchUpdate) -> Result<Match, RepoError> {
        let mut s = self.state.lock();
        let m = s.matches.get_mut(&id).ok_or(RepoError::NotFound)?;
        if let Some(v) = u.title {
            m.title = v;
        }
        if let Some(v) = u.game {
            m.game = v;
        }
        if let Some(v) = u.round {
            m.round = Some(v);
        }
        if let Some(v) = u.status {
            m.status = v;
        }
        if let Some(v) = u.scheduled_at {
            m.scheduled_at = Some(v);
        }
        if let Some(v) = u.started_at {
            m.started_at = Some(v);
        }
        if let Some(v) = u.ended_at {
            m.ended_at = Some(v);
        }
        if let Some(v) = u.screenshots {
            m.screenshots = v;
        }
        m.updated_at = Utc::now();
        Ok(m.clone())
    }

    async fn delete_match(&self, id: MatchId) -> Result<(), RepoError> {
        let mut s = self.state.lock();
        s.matches.remove(&id).ok_or(RepoError::NotFound)?;
        s.match_participants.retain(|p| p.match_id != id);
        Ok(())
    }

    async fn list_participants(&self, id: MatchId) -> Result<Vec<MatchParticipant>, RepoError> {
        let mut items: Vec<MatchParticipant> = self
            .state
            .lock()
            .match_participants
            .iter()
            .filter(|p| p.match_id == id)
            .cloned()
            .collect();
        items.sort_by_key(|p| p.position);
        Ok(items)
    }

    async fn complete_match(
        &self,
        id: MatchId,
        result: MatchResult,
        outcomes: Vec<ParticipantOutcome>,
    ) -> Result<Match, CompleteMatchError> {
        let mut s = self.state.lock();
        let status = s.matches.get(&id).ok_or(RepoError::NotFound)?.status;
        if status.is_terminal() {
            return Err(CompleteMatchError::AlreadyFinished(status));
        }
        for o in outcomes.iter() {
            if !s
                .match_participants
                .iter()
                .any(|p| p.match_id == id && p.user_id == o.user_id)
            {
                return Err(RepoError::NotFound.into());
            }
        }
        for o in outcomes {
            if let Some(p) = s
                .match_participants
                .iter_mut()
                .find(|p| p.match_id == id && p.user_id == o.user_id)
            {
                p.score = Some(o.score);
                p.position = Some(o.position);
            }
            if let Some(u) = s.users.get_mut(&o.user_id) {
                u.experience += o.experience;
            }
        }
        let m = s.matches.get_mut(&id).ok_or(RepoError::NotFound)?;
        m.status = MatchStatus::Completed;
        m.ended_at = Some(Utc::now());
        m.result = Some(result);
        Ok(m.clone())
    }
}

#[async_trait::async_trait]
impl TransactionRepository for InMemoryStore {
    async fn create_transaction(&self, t: NewTransaction) -> Result<Transaction, RepoError> {
        let now = Utc::now();
        let transaction = Transaction {
            id: TransactionId::new(),
            user_id: t.user_id,
            transaction_type: t.transaction_type,
            amount: t.amount,
            status: t.status,
            description: t.description,
            metadata: t.metadata,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, RepoError> {
        self.state
            .lock()
            .transactions
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn query_transactions(
        &self,
        query: TransactionQuery,
    ) -> Result<Page<Transaction>, RepoError> {
        let mut items: Vec<Transaction> = self
            .state
            .lock()
            .transactions
            .iter()
            .filter(|t| query.user_id.is_none_or(|u| t.user_id == u))
            .filter(|t| query.status.is_none_or(|s| t.status == s))
            .filter(|t| query.transaction_type.is_none_or(|k| t.transaction_type == k))
            .cloned()
            .collect();
        items.reverse();
        Ok(page(items, &query.pagination))
    }

    async fn settle(
        &self,
        id: TransactionId,
        settlement: Settlement,
        notification: NotificationDraft,
    ) -> Result<(Transaction, Notification), LedgerError> {
        let mut s = self.state.lock();
        let index = s
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or(RepoError::NotFound)?;
        let current = s.transactions[index].clone();
        if current.status != TransactionStatus::Pending {
            return Err(LedgerError::StaleState);
        }
        let status = match &settlement {
            Settlement::Approve => {
                let delta = current.approval_delta();
                let user = s
                    .users
                    .get_mut(&current.user_id)
                    .ok_or(RepoError::NotFound)?;
                if user.coins + delta < 0 {
                    return Err(LedgerError::InsufficientBalance);
                }
                user.coins += delta;
                TransactionStatus::Completed
            }
            Settlement::Reject { .. } => TransactionStatus::Failed,
        };
        let t = &mut s.transactions[index];
        t.status = status;
        if let Settlement::Reject { reason } = settlement {
            t.metadata = t.metadata.take().map(|m| m.with_rejection(reason));
        }
        t.updated_at = Utc::now();
        let t = t.clone();
        let notification = s.store_notification(notification);
        Ok((t, notification))
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryStore {
    async fn place_order(&self, o: NewOrder) -> Result<Order, LedgerError> {
        let mut s = self.state.lock();
        let paid_with_coins = o.paid_with_coins();
        if paid_with_coins {
            let user = s.users.get_mut(&o.user_id).ok_or(RepoError::NotFound)?;
            if user.coins < o.total_amount {
                return Err(LedgerError::InsufficientBalance);
            }
            user.coins -= o.total_amount;
        }
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            user_id: o.user_id,
            items: o.items,
            total_amount: o.total_amount,
            status: OrderStatus::Pending,
            payment_method: o.payment_method,
            shipping_address: o.shipping_address,
            created_at: now,
            updated_at: now,
        };
        if paid_with_coins {
            s.ledger_entry(
                order.user_id,
                TransactionType::Purchase,
                order.total_amount,
                format!("Order #{}", order.id),
                order.id,
            );
        }
        s.orders.push(order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, RepoError> {
        self.state
            .lock()
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Page<Order>, RepoError> {
        let mut items: Vec<Order> = self
            .state
            .lock()
            .orders
            .iter()
            .filter(|o| query.user_id.is_none_or(|u| o.user_id == u))
            .filter(|o| query.status.is_none_or(|st| o.status == st))
            .cloned()
            .collect();
        items.reverse();
        Ok(page(items, &query.pagination))
    }

    async fn transition(
        &self,
        id: OrderId,
        transition: OrderTransition,
    ) -> Result<(Order, Notification), LedgerError> {
        let mut s = self.state.lock();
        let index = s
            .orders
            .iter()
            .position(|o| o.id == id)
            .ok_or(RepoError::NotFound)?;
        if s.orders[index].status != transition.from {
            return Err(LedgerError::StaleState);
        }
        let order = &mut s.orders[index];
        order.status = transition.to;
        if let Some(address) = transition.shipping_address {
            order.shipping_address = Some(address);
        }
        order.updated_at = Utc::now();
        let order = order.clone();
        if let Some(amount) = transition.refund {
            let user = s
                .users
                .get_mut(&order.user_id)
                .ok_or(RepoError::NotFound)?;
            user.coins += amount;
            s.ledger_entry(
                order.user_id,
                TransactionType::Refund,
                amount,
                format!("Refund for cancelled order #{}", order.id),
                order.id,
            );
        }
        let notification = s.store_notification(transition.notification);
        Ok((order, notification))
    }
}

#[async_trait::async_trait]
impl RewardRepository for InMemoryStore {
    async fn create_reward(&self, r: NewReward) -> Result<Reward, RepoError> {
        let now = Utc::now();
        let reward = Reward {
            id: RewardId::new(),
            title: r.title,
            description: r.description,
            reward_type: r.reward_type,
            value: r.value,
            requirements: r.requirements,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().rewards.push(reward.clone());
        Ok(reward)
    }

    async fn get_reward(&self, id: RewardId) -> Result<Reward, RepoError> {
        self.state
            .lock()
            .rewards
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn query_rewards(&self, query: RewardQuery) -> Result<Page<Reward>, RepoError> {
        let items: Vec<Reward> = self
            .state
            .lock()
            .rewards
            .iter()
            .filter(|r| !query.active_only || r.is_active)
            .filter(|r| query.reward_type.is_none_or(|t| r.reward_type == t))
            .cloned()
            .collect();
        Ok(page(items, &query.pagination))
    }

    async fn update_reward(&self, id: RewardId, u: RewardUpdate) -> Result<Reward, RepoError> {
        let mut s = self.state.lock();
        let r = s
            .rewards
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RepoError::NotFound)?;
        if let Some(v) = u.title {
            r.title = v;
        }
        if let Some(v) = u.description {
            r.description = Some(v);
        }
        if let Some(v) = u.reward_type {
            r.reward_type = v;
        }
        if let Some(v) = u.value {
            r.value = v;
        }
        if let Some(v) = u.requirements {
            r.requirements = Some(v);
        }
        if let Some(v) = u.is_active {
            r.is_active = v;
        }
        Ok(r.clone())
    }

    async fn claimed_reward_ids(&self, user_id: UserId) -> Result<Vec<RewardId>, RepoError> {
        Ok(self
            .state
            .lock()
            .claims
            .iter()
            .filter(|c| c.0 == user_id)
            .map(|c| c.1)
            .collect())
    }

    async fn list_claims(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<Page<UserReward>, RepoError> {
        let s = self.state.lock();
        let mut items: Vec<UserReward> = s
            .claims
            .iter()
            .filter(|c| c.0 == user_id)
            .filter_map(|c| {
                s.rewards.iter().find(|r| r.id == c.1).map(|r| UserReward {
                    user_id,
                    reward: r.clone(),
                    claimed_at: c.2,
                })
            })
            .collect();
        items.reverse();
        Ok(page(items, &pagination))
    }

    async fn claim(
        &self,
        user_id: UserId,
        reward: &Reward,
        notification: NotificationDraft,
    ) -> Result<(UserReward, Notification), RepoError> {
        let mut s = self.state.lock();
        if s.claims.iter().any(|c| c.0 == user_id && c.1 == reward.id) {
            return Err(RepoError::UniqueViolation);
        }
        let user = s.users.get_mut(&user_id).ok_or(RepoError::NotFound)?;
        match reward.reward_type {
            RewardType::Coins => user.coins += reward.value,
            RewardType::Experience => user.experience += reward.value,
            _ => {}
        }
        let claimed_at = Utc::now();
        s.claims.push((user_id, reward.id, claimed_at));
        let notification = s.store_notification(notification);
        Ok((
            UserReward {
                user_id,
                reward: reward.clone(),
                claimed_at,
            },
            notification,
        ))
    }
}

#[async_trait::async_trait]
impl NotificationRepository for InMemoryStore {
    async fn create_notification(
        &self,
        draft: NotificationDraft,
    ) -> Result<Notification, RepoError> {
        Ok(self.state.lock().store_notification(draft))
    }

    async fn query_notifications(
        &self,
        query: NotificationQuery,
    ) -> Result<Page<Notification>, RepoError> {
        let mut items: Vec<Notification> = self
            .state
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == query.user_id)
            .filter(|n| query.notification_type.is_none_or(|t| n.notification_type == t))
            .filter(|n| query.is_read.is_none_or(|r| n.is_read == r))
            .cloned()
            .collect();
        items.reverse();
        Ok(page(items, &query.pagination))
    }

    async fn count_notifications(&self, user_id: UserId) -> Result<NotificationCounts, RepoError> {
        let s = self.state.lock();
        let own = s.notifications.iter().filter(|n| n.user_id == user_id);
        Ok(NotificationCounts {
            unread: own.clone().filter(|n| !n.is_read).count() as u64,
            total: own.count() as u64,
        })
    }

    async fn mark_read(&self, user_id: UserId, id: NotificationId) -> Result<(), RepoError> {
        let mut s = self.state.lock();
        let n = s
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .ok_or(RepoError::NotFound)?;
        n.is_read = true;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepoError> {
        let mut s = self.state.lock();
        let mut count = 0;
        for n in s
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            count += 1;
        }
        Ok(count)
    }

    async fn delete_notification(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<(), RepoError> {
        let mut s = self.state.lock();
        let index = s
            .notifications
            .iter()
            .position(|n| n.id == id && n.user_id == user_id)
            .ok_or(RepoError::NotFound)?;
        s.notifications.remove(index);
        Ok(())
    }

    async fn clear_notifications(&self, user_id: UserId) -> Result<u64, RepoError> {
        let mut s = self.state.lock();
        let before = s.notifications.len();
        s.notifications.retain(|n| n.user_id != user_id);
        Ok((before - s.notifications.len()) as u64)
    }
}

#[derive(Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<(Room, DomainEvent)>>,
}

impl RecordingDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<(Room, DomainEvent)> {
        self.events.lock().clone()
    }
}

impl EventDispatcher for RecordingDispatcher {
    fn dispatch(&self, outbox: Outbox) {
        self.events.lock().extend(outbox.events);
    }
}

#[derive(Default)]
pub struct RecordingRealtime {
    published: Mutex<Vec<(String, DomainEvent)>>,
}

impl RecordingRealtime {
    pub fn published(&self) -> Vec<(String, DomainEvent)> {
        self.published.lock().clone()
    }
}

impl RealtimePort for RecordingRealtime {
    fn publish(&self, room: &Room, event: &DomainEvent) {
        self.published.lock().push((room.to_string(), event.clone()));
    }
}

#[derive(Default)]
pub struct RecordingEmail {
    sent: Mutex<Vec<(String, String, String)>>,
    pub fail: bool,
}

impl RecordingEmail {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    /// `(to, subject, body)` of every delivered email.
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().clone()
    }
}

impl EmailPort for RecordingEmail {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), SendEmailError> {
        if self.fail {
            return Err(SendEmailError::SendEmailError("relay down".to_string()));
        }
        self.sent
            .lock()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }

    fn test_connection(&self) -> Result<bool, SendEmailError> {
        Ok(!self.fail)
    }
}

/// Tokens of the form `access:<id>:<n>` / `refresh:<id>:<n>`.
#[derive(Default)]
pub struct FakeTokens {
    counter: Mutex<u64>,
}

impl FakeTokens {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn issue(&self, kind: &str, user_id: UserId) -> String {
        let mut counter = self.counter.lock();
        *counter += 1;
        format!("{}:{}:{}", kind, user_id, counter)
    }

    fn verify(kind: &str, token: &str) -> Option<UserId> {
        let mut parts = token.split(':');
        if parts.next()? != kind {
            return None;
        }
        parts.next()?.parse().ok()
    }
}

impl TokenPort for FakeTokens {
    fn issue_access_token(&self, user_id: UserId) -> Result<String, TokenError> {
        Ok(self.issue("access", user_id))
    }

    fn issue_refresh_token(&self, user_id: UserId) -> Result<String, TokenError> {
        Ok(self.issue("refresh", user_id))
    }

    fn verify_access_token(&self, token: &str) -> Option<UserId> {
        Self::verify("access", token)
    }

    fn verify_refresh_token(&self, token: &str) -> Option<UserId> {
        Self::verify("refresh", token)
    }
}

#[derive(Default)]
pub struct FakeImageStore {
    stored: Mutex<Vec<String>>,
}

impl FakeImageStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn stored(&self) -> Vec<String> {
        self.stored.lock().clone()
    }
}

#[async_trait::async_trait]
impl ImageStoragePort for FakeImageStore {
    async fn upload(
        &self,
        folder: ImageFolder,
        data: Vec<u8>,
        extension: &str,
    ) -> Result<StoredImage, ImageStorageError> {
        let public_id = format!("gamehub/{}/{}", folder.as_str(), uuid::Uuid::new_v4());
        self.stored.lock().push(public_id.clone());
        Ok(StoredImage {
            url: format!("https://img.test/{}.{}", public_id, extension),
            public_id,
            bytes: data.len(),
            format: extension.to_string(),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), ImageStorageError> {
        let mut stored = self.stored.lock();
        let index = stored
            .iter()
            .position(|p| p == public_id)
            .ok_or(ImageStorageError::NotFound)?;
        stored.remove(index);
        Ok(())
    }

    fn url_for(&self, public_id: &str, transform: &ImageTransform) -> String {
        match transform.width {
            Some(w) => format!("https://img.test/w_{}/{}", w, public_id),
            None => format!("https://img.test/{}", public_id),
        }
    }

    fn public_id_from_url(&self, url: &str) -> Option<String> {
        let rest = url.strip_prefix("https://img.test/")?;
        Some(rest.rsplit_once('.').map(|(id, _)| id).unwrap_or(rest).to_string())
    }
}

pub fn cache() -> Arc<MokaCacheStore> {
    Arc::new(MokaCacheStore::new())
}
