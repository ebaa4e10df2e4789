use std::sync::Arc;

use crate::{
    domain::{
        cache::MokaCacheStore, game_profile::GameProfileRepository, ledger::TransactionRepository,
        r#match::MatchRepository, notification::NotificationRepository, order::OrderRepository,
        reward::RewardRepository, team::TeamRepository, tournament::TournamentRepository,
        user::UserRepository,
    },
    ports::{
        email::EmailPort, image_storage::ImageStoragePort, realtime::RealtimePort,
        token::TokenPort,
    },
    services::dispatch::EventDispatcherImpl,
    workflow::{
        account::{
            authenticate::{AuthenticateUseCase, AuthenticateUseCaseImpl},
            password::{PasswordUseCase, PasswordUseCaseImpl},
            register::{RegisterUseCase, RegisterUseCaseImpl},
            session::{SessionUseCase, SessionUseCaseImpl},
            verification::{VerificationUseCase, VerificationUseCaseImpl},
        },
        email::outreach::{OutreachUseCase, OutreachUseCaseImpl},
        image::upload::{ImageUseCase, ImageUseCaseImpl},
        r#match::{
            manage::{ManageMatchUseCase, ManageMatchUseCaseImpl},
            query::{MatchQueryUseCase, MatchQueryUseCaseImpl},
            result::{MatchResultUseCase, MatchResultUseCaseImpl},
        },
        notification::inbox::{InboxUseCase, InboxUseCaseImpl},
        order::{
            fulfil::{FulfilOrderUseCase, FulfilOrderUseCaseImpl},
            place::{PlaceOrderUseCase, PlaceOrderUseCaseImpl},
            query::{OrderQueryUseCase, OrderQueryUseCaseImpl},
        },
        reward::{
            claim::{ClaimRewardUseCase, ClaimRewardUseCaseImpl},
            manage::{ManageRewardUseCase, ManageRewardUseCaseImpl},
            query::{RewardQueryUseCase, RewardQueryUseCaseImpl},
        },
        team::{
            manage::{ManageTeamUseCase, ManageTeamUseCaseImpl},
            membership::{TeamMembershipUseCase, TeamMembershipUseCaseImpl},
            query::{TeamQueryUseCase, TeamQueryUseCaseImpl},
        },
        tournament::{
            manage::{ManageTournamentUseCase, ManageTournamentUseCaseImpl},
            participation::{TournamentParticipationUseCase, TournamentParticipationUseCaseImpl},
            query::{TournamentQueryUseCase, TournamentQueryUseCaseImpl},
        },
        transaction::{
            query::{TransactionQueryUseCase, TransactionQueryUseCaseImpl},
            request::{CoinRequestUseCase, CoinRequestUseCaseImpl},
            settle::{SettleTransactionUseCase, SettleTransactionUseCaseImpl},
        },
        user::{
            admin::{UserAdminUseCase, UserAdminUseCaseImpl},
            game_profile::{GameProfileUseCase, GameProfileUseCaseImpl},
            profile::{ProfileUseCase, ProfileUseCaseImpl},
            query::{UserQueryUseCase, UserQueryUseCaseImpl},
        },
    },
};

pub mod domain;
pub mod ports;
pub mod services;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL used in links sent by email.
    pub frontend_url: String,
}

pub struct Application {
    pub account_register_use_case: Box<dyn RegisterUseCase + Send + Sync + 'static>,
    pub account_session_use_case: Box<dyn SessionUseCase + Send + Sync + 'static>,
    pub account_verification_use_case: Box<dyn VerificationUseCase + Send + Sync + 'static>,
    pub account_password_use_case: Box<dyn PasswordUseCase + Send + Sync + 'static>,
    pub account_authenticate_use_case: Arc<dyn AuthenticateUseCase + Send + Sync + 'static>,

    pub user_query_use_case: Box<dyn UserQueryUseCase + Send + Sync + 'static>,
    pub user_profile_use_case: Box<dyn ProfileUseCase + Send + Sync + 'static>,
    pub user_admin_use_case: Box<dyn UserAdminUseCase + Send + Sync + 'static>,
    pub user_game_profile_use_case: Box<dyn GameProfileUseCase + Send + Sync + 'static>,

    pub tournament_query_use_case: Box<dyn TournamentQueryUseCase + Send + Sync + 'static>,
    pub tournament_manage_use_case: Box<dyn ManageTournamentUseCase + Send + Sync + 'static>,
    pub tournament_participation_use_case:
        Box<dyn TournamentParticipationUseCase + Send + Sync + 'static>,

    pub team_query_use_case: Box<dyn TeamQueryUseCase + Send + Sync + 'static>,
    pub team_manage_use_case: Box<dyn ManageTeamUseCase + Send + Sync + 'static>,
    pub team_membership_use_case: Box<dyn TeamMembershipUseCase + Send + Sync + 'static>,

    pub match_query_use_case: Box<dyn MatchQueryUseCase + Send + Sync + 'static>,
    pub match_manage_use_case: Box<dyn ManageMatchUseCase + Send + Sync + 'static>,
    pub match_result_use_case: Box<dyn MatchResultUseCase + Send + Sync + 'static>,

    pub transaction_query_use_case: Box<dyn TransactionQueryUseCase + Send + Sync + 'static>,
    pub transaction_request_use_case: Box<dyn CoinRequestUseCase + Send + Sync + 'static>,
    pub transaction_settle_use_case: Box<dyn SettleTransactionUseCase + Send + Sync + 'static>,

    pub order_query_use_case: Box<dyn OrderQueryUseCase + Send + Sync + 'static>,
    pub order_place_use_case: Box<dyn PlaceOrderUseCase + Send + Sync + 'static>,
    pub order_fulfil_use_case: Box<dyn FulfilOrderUseCase + Send + Sync + 'static>,

    pub reward_query_use_case: Box<dyn RewardQueryUseCase + Send + Sync + 'static>,
    pub reward_claim_use_case: Box<dyn ClaimRewardUseCase + Send + Sync + 'static>,
    pub reward_manage_use_case: Box<dyn ManageRewardUseCase + Send + Sync + 'static>,

    pub notification_inbox_use_case: Box<dyn InboxUseCase + Send + Sync + 'static>,
    pub image_use_case: Box<dyn ImageUseCase + Send + Sync + 'static>,
    pub email_outreach_use_case: Box<dyn OutreachUseCase + Send + Sync + 'static>,
}

pub struct Repositories<U, G, T, TM, M, TX, O, R, N> {
    pub users: Arc<U>,
    pub game_profiles: Arc<G>,
    pub tournaments: Arc<T>,
    pub teams: Arc<TM>,
    pub matches: Arc<M>,
    pub transactions: Arc<TX>,
    pub orders: Arc<O>,
    pub rewards: Arc<R>,
    pub notifications: Arc<N>,
}

pub struct Ports<TK, E, I, RT> {
    pub token: Arc<TK>,
    pub email: Arc<E>,
    pub image_storage: Arc<I>,
    pub realtime: Arc<RT>,
}

pub fn build_application<
    U: UserRepository + Send + Sync + 'static,
    G: GameProfileRepository + Send + Sync + 'static,
    T: TournamentRepository + Send + Sync + 'static,
    TM: TeamRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    TX: TransactionRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    R: RewardRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    TK: TokenPort + Send + Sync + 'static,
    E: EmailPort + Send + Sync + 'static,
    I: ImageStoragePort + Send + Sync + 'static,
    RT: RealtimePort + Send + Sync + 'static,
>(
    config: AppConfig,
    repositories: Repositories<U, G, T, TM, M, TX, O, R, N>,
    ports: Ports<TK, E, I, RT>,
) -> Application {
    let Repositories {
        users,
        game_profiles,
        tournaments,
        teams,
        matches,
        transactions,
        orders,
        rewards,
        notifications,
    } = repositories;
    let Ports {
        token,
        email,
        image_storage,
        realtime,
    } = ports;
    let frontend_url = config.frontend_url;

    let cache = Arc::new(MokaCacheStore::new());
    let dispatcher = Arc::new(EventDispatcherImpl::new(realtime));

    Application {
        account_register_use_case: Box::new(RegisterUseCaseImpl::new(
            users.clone(),
            cache.clone(),
            token.clone(),
            email.clone(),
            frontend_url.clone(),
        )),
        account_session_use_case: Box::new(SessionUseCaseImpl::new(
            users.clone(),
            cache.clone(),
            token.clone(),
        )),
        account_verification_use_case: Box::new(VerificationUseCaseImpl::new(
            users.clone(),
            cache.clone(),
            email.clone(),
            frontend_url.clone(),
        )),
        account_password_use_case: Box::new(PasswordUseCaseImpl::new(
            users.clone(),
            cache.clone(),
            email.clone(),
            frontend_url.clone(),
        )),
        account_authenticate_use_case: Arc::new(AuthenticateUseCaseImpl::new(
            users.clone(),
            cache.clone(),
            token.clone(),
        )),

        user_query_use_case: Box::new(UserQueryUseCaseImpl::new(users.clone(), cache.clone())),
        user_profile_use_case: Box::new(ProfileUseCaseImpl::new(
            users.clone(),
            cache.clone(),
            image_storage.clone(),
        )),
        user_admin_use_case: Box::new(UserAdminUseCaseImpl::new(
            users.clone(),
            cache.clone(),
            dispatcher.clone(),
        )),
        user_game_profile_use_case: Box::new(GameProfileUseCaseImpl::new(
            game_profiles.clone(),
            users.clone(),
            cache.clone(),
        )),

        tournament_query_use_case: Box::new(TournamentQueryUseCaseImpl::new(
            tournaments.clone(),
            matches.clone(),
        )),
        tournament_manage_use_case: Box::new(ManageTournamentUseCaseImpl::new(
            tournaments.clone(),
            dispatcher.clone(),
        )),
        tournament_participation_use_case: Box::new(TournamentParticipationUseCaseImpl::new(
            tournaments.clone(),
            dispatcher.clone(),
        )),

        team_query_use_case: Box::new(TeamQueryUseCaseImpl::new(teams.clone())),
        team_manage_use_case: Box::new(ManageTeamUseCaseImpl::new(
            teams.clone(),
            users.clone(),
            notifications.clone(),
            dispatcher.clone(),
        )),
        team_membership_use_case: Box::new(TeamMembershipUseCaseImpl::new(
            teams.clone(),
            dispatcher.clone(),
        )),

        match_query_use_case: Box::new(MatchQueryUseCaseImpl::new(matches.clone())),
        match_manage_use_case: Box::new(ManageMatchUseCaseImpl::new(
            matches.clone(),
            tournaments.clone(),
            dispatcher.clone(),
        )),
        match_result_use_case: Box::new(MatchResultUseCaseImpl::new(
            matches.clone(),
            notifications.clone(),
            cache.clone(),
            dispatcher.clone(),
        )),

        transaction_query_use_case: Box::new(TransactionQueryUseCaseImpl::new(
            transactions.clone(),
        )),
        transaction_request_use_case: Box::new(CoinRequestUseCaseImpl::new(
            transactions.clone(),
            users.clone(),
        )),
        transaction_settle_use_case: Box::new(SettleTransactionUseCaseImpl::new(
            transactions.clone(),
            cache.clone(),
            dispatcher.clone(),
        )),

        order_query_use_case: Box::new(OrderQueryUseCaseImpl::new(orders.clone())),
        order_place_use_case: Box::new(PlaceOrderUseCaseImpl::new(
            orders.clone(),
            cache.clone(),
            dispatcher.clone(),
        )),
        order_fulfil_use_case: Box::new(FulfilOrderUseCaseImpl::new(
            orders.clone(),
            dispatcher.clone(),
        )),

        reward_query_use_case: Box::new(RewardQueryUseCaseImpl::new(
            rewards.clone(),
            users.clone(),
        )),
        reward_claim_use_case: Box::new(ClaimRewardUseCaseImpl::new(
            rewards.clone(),
            users.clone(),
            cache.clone(),
            dispatcher.clone(),
        )),
        reward_manage_use_case: Box::new(ManageRewardUseCaseImpl::new(rewards.clone())),

        notification_inbox_use_case: Box::new(InboxUseCaseImpl::new(notifications.clone())),
        image_use_case: Box::new(ImageUseCaseImpl::new(
            image_storage,
            teams,
            tournaments,
            matches,
        )),
        email_outreach_use_case: Box::new(OutreachUseCaseImpl::new(email, frontend_url)),
    }
}
