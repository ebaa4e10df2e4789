use chrono::Utc;
use gamehub_app::domain::{
    LedgerError, RepoError, UserId,
    game_profile::{GameProfileInput, GameProfileRepository},
    ledger::{
        NewTransaction, Settlement, TransactionMetadata, TransactionRepository, TransactionStatus,
        TransactionType,
    },
    r#match::{
        CompleteMatchError, MatchRepository, MatchResult, MatchStatus, NewMatch,
        ParticipantOutcome, ParticipantResult,
    },
    notification::{NotificationDraft, NotificationRepository, NotificationType},
    order::{NewOrder, OrderItem, OrderQuery, OrderRepository},
    reward::{NewReward, RewardRepository, RewardType},
    team::{NewTeam, TeamRepository},
    tournament::{NewTournament, TournamentFormat, TournamentRepository},
    user::{NewUser, Role, User, UserRepository},
};
use gamehub_persistence_sea_orm::{
    create_tables,
    entity::{
        game_profile, match_participant, notification, order, profile, team_member,
        tournament_participant, transaction, user, user_reward,
    },
    game_profiles::GameProfileRepositoryImpl,
    matches::MatchRepositoryImpl,
    notifications::NotificationRepositoryImpl,
    orders::OrderRepositoryImpl,
    rewards::RewardRepositoryImpl,
    teams::TeamRepositoryImpl,
    tournaments::TournamentRepositoryImpl,
    transactions::TransactionRepositoryImpl,
    users::UserRepositoryImpl,
};
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter,
};

async fn memory_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    create_tables(&db).await.unwrap();
    db
}

async fn player(users: &UserRepositoryImpl, name: &str) -> User {
    users
        .create_user(NewUser {
            email: format!("{}@example.com", name),
            username: name.to_string(),
            password_hash: "hash".to_string(),
            first_name: None,
            last_name: None,
            role: Role::User,
            is_verified: true,
        })
        .await
        .unwrap()
}

async fn fund(db: &DatabaseConnection, user_id: UserId, amount: i64) {
    let transactions = TransactionRepositoryImpl::with_connection(db.clone());
    let deposit = transactions
        .create_transaction(NewTransaction {
            user_id,
            transaction_type: TransactionType::Deposit,
            amount,
            status: TransactionStatus::Pending,
            description: Some("Deposit via card".to_string()),
            metadata: Some(TransactionMetadata::Deposit {
                payment_method: Some("card".to_string()),
                rejection_reason: None,
            }),
        })
        .await
        .unwrap();
    transactions
        .settle(
            deposit.id,
            Settlement::Approve,
            NotificationDraft::new(user_id, NotificationType::Transaction, "Approved", "ok"),
        )
        .await
        .unwrap();
}

async fn rows_for<E: EntityTrait>(db: &DatabaseConnection, column: E::Column, id: UserId) -> u64
where
    E::Column: ColumnTrait,
    E::Model: Sync,
{
    E::find()
        .filter(column.eq(id.0))
        .count(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_hard_delete_removes_every_dependent_row() {
    let db = memory_db().await;
    let users = UserRepositoryImpl::with_connection(db.clone());
    let alice = player(&users, "alice").await;
    let bob = player(&users, "bob").await;
    fund(&db, alice.id, 100).await;

    GameProfileRepositoryImpl::with_connection(db.clone())
        .upsert_game_profile(
            alice.id,
            GameProfileInput {
                game_id: "pubg".to_string(),
                game_name: "PUBG Mobile".to_string(),
                game_uid: "123".to_string(),
                in_game_name: "ally".to_string(),
            },
        )
        .await
        .unwrap();

    let tournaments = TournamentRepositoryImpl::with_connection(db.clone());
    let cup = tournaments
        .create_tournament(NewTournament {
            title: "Cup".to_string(),
            description: None,
            rules: Some("Erangel only".to_string()),
            game: "PUBG Mobile".to_string(),
            format: TournamentFormat::SingleElimination,
            max_participants: 8,
            entry_fee: 0,
            prize_pool: 0,
            start_date: Utc::now(),
            end_date: None,
            created_by: bob.id,
        })
        .await
        .unwrap();
    assert_eq!(
        tournaments.get_tournament(cup.id).await.unwrap().rules.as_deref(),
        Some("Erangel only")
    );
    tournaments.add_participant(cup.id, alice.id).await.unwrap();
    tournaments.add_participant(cup.id, bob.id).await.unwrap();

    TeamRepositoryImpl::with_connection(db.clone())
        .create_team_with_leader(
            NewTeam {
                name: "Squad".to_string(),
                description: None,
                max_members: 5,
            },
            alice.id,
        )
        .await
        .unwrap();

    MatchRepositoryImpl::with_connection(db.clone())
        .create_match(
            NewMatch {
                title: "Opening round".to_string(),
                tournament_id: Some(cup.id),
                game: "PUBG Mobile".to_string(),
                round: Some(1),
                scheduled_at: None,
            },
            vec![alice.id, bob.id],
        )
        .await
        .unwrap();

    OrderRepositoryImpl::with_connection(db.clone())
        .place_order(NewOrder {
            user_id: alice.id,
            items: vec![OrderItem {
                name: "Skin".to_string(),
                quantity: 1,
                price: 40,
                product_id: None,
            }],
            total_amount: 40,
            payment_method: Some("coins".to_string()),
            shipping_address: None,
        })
        .await
        .unwrap();

    let rewards = RewardRepositoryImpl::with_connection(db.clone());
    let badge = rewards
        .create_reward(NewReward {
            title: "Badge".to_string(),
            description: None,
            reward_type: RewardType::Badge,
            value: 0,
            requirements: None,
        })
        .await
        .unwrap();
    rewards
        .claim(
            alice.id,
            &badge,
            NotificationDraft::new(alice.id, NotificationType::Reward, "Claimed", "Badge"),
        )
        .await
        .unwrap();

    users.delete_user_cascade(alice.id).await.unwrap();

    assert_eq!(rows_for::<user::Entity>(&db, user::Column::Id, alice.id).await, 0);
    assert_eq!(
        rows_for::<profile::Entity>(&db, profile::Column::UserId, alice.id).await,
        0
    );
    assert_eq!(
        rows_for::<game_profile::Entity>(&db, game_profile::Column::UserId, alice.id).await,
        0
    );
    assert_eq!(
        rows_for::<notification::Entity>(&db, notification::Column::UserId, alice.id).await,
        0
    );
    assert_eq!(
        rows_for::<transaction::Entity>(&db, transaction::Column::UserId, alice.id).await,
        0
    );
    assert_eq!(
        rows_for::<order::Entity>(&db, order::Column::UserId, alice.id).await,
        0
    );
    assert_eq!(
        rows_for::<user_reward::Entity>(&db, user_reward::Column::UserId, alice.id).await,
        0
    );
    assert_eq!(
        rows_for::<team_member::Entity>(&db, team_member::Column::UserId, alice.id).await,
        0
    );
    assert_eq!(
        rows_for::<tournament_participant::Entity>(
            &db,
            tournament_participant::Column::UserId,
            alice.id
        )
        .await,
        0
    );
    assert_eq!(
        rows_for::<match_participant::Entity>(&db, match_participant::Column::UserId, alice.id)
            .await,
        0
    );

    // bob is untouched
    assert!(users.get_user(bob.id).await.is_ok());
    assert_eq!(tournaments.count_participants(cup.id).await.unwrap(), 1);
    assert!(matches!(
        users.delete_user_cascade(alice.id).await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
async fn test_coin_order_without_funds_leaves_no_row() {
    let db = memory_db().await;
    let users = UserRepositoryImpl::with_connection(db.clone());
    let carol = player(&users, "carol").await;
    fund(&db, carol.id, 30).await;

    let orders = OrderRepositoryImpl::with_connection(db.clone());
    let res = orders
        .place_order(NewOrder {
            user_id: carol.id,
            items: vec![OrderItem {
                name: "Crate".to_string(),
                quantity: 1,
                price: 50,
                product_id: None,
            }],
            total_amount: 50,
            payment_method: Some("coins".to_string()),
            shipping_address: None,
        })
        .await;

    assert_eq!(res, Err(LedgerError::InsufficientBalance));
    let page = orders
        .query_orders(OrderQuery {
            user_id: Some(carol.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert_eq!(users.get_user(carol.id).await.unwrap().coins, 30);
}

#[tokio::test]
async fn test_withdrawal_above_balance_is_refused() {
    let db = memory_db().await;
    let users = UserRepositoryImpl::with_connection(db.clone());
    let dave = player(&users, "dave").await;
    fund(&db, dave.id, 20).await;

    let transactions = TransactionRepositoryImpl::with_connection(db.clone());
    let withdrawal = transactions
        .create_transaction(NewTransaction {
            user_id: dave.id,
            transaction_type: TransactionType::Withdrawal,
            amount: 25,
            status: TransactionStatus::Pending,
            description: None,
            metadata: None,
        })
        .await
        .unwrap();
    let res = transactions
        .settle(
            withdrawal.id,
            Settlement::Approve,
            NotificationDraft::new(dave.id, NotificationType::Transaction, "Approved", "ok"),
        )
        .await;

    assert!(matches!(res, Err(LedgerError::InsufficientBalance)));
    assert_eq!(users.get_user(dave.id).await.unwrap().coins, 20);
    assert_eq!(
        transactions.get_transaction(withdrawal.id).await.unwrap().status,
        TransactionStatus::Pending
    );
}

#[tokio::test]
async fn test_match_completion_grants_experience() {
    let db = memory_db().await;
    let users = UserRepositoryImpl::with_connection(db.clone());
    let a = player(&users, "erin").await;
    let b = player(&users, "frank").await;

    let matches = MatchRepositoryImpl::with_connection(db.clone());
    let created = matches
        .create_match(
            NewMatch {
                title: "Showmatch".to_string(),
                tournament_id: None,
                game: "Valorant Mobile".to_string(),
                round: None,
                scheduled_at: None,
            },
            vec![a.id, b.id],
        )
        .await
        .unwrap();
    let result = MatchResult(vec![
        ParticipantResult {
            user_id: a.id,
            score: 10,
            position: 1,
        },
        ParticipantResult {
            user_id: b.id,
            score: 5,
            position: 2,
        },
    ]);
    let outcomes: Vec<ParticipantOutcome> = result.0.iter().map(ParticipantOutcome::from).collect();
    let completed = matches
        .complete_match(created.id, result.clone(), outcomes.clone())
        .await
        .unwrap();
    let replay = matches
        .complete_match(created.id, result.clone(), outcomes)
        .await;
    assert_eq!(
        replay,
        Err(CompleteMatchError::AlreadyFinished(MatchStatus::Completed))
    );

    assert_eq!(completed.title, "Showmatch");
    assert_eq!(completed.result, Some(result));
    assert_eq!(users.get_user(a.id).await.unwrap().experience, 100);
    assert_eq!(users.get_user(b.id).await.unwrap().experience, 80);
    let participants = matches.list_participants(created.id).await.unwrap();
    assert_eq!(participants[0].username, "erin");
    assert_eq!(participants[0].score, Some(10));
}

#[tokio::test]
async fn test_second_claim_conflicts() {
    let db = memory_db().await;
    let users = UserRepositoryImpl::with_connection(db.clone());
    let gina = player(&users, "gina").await;
    let rewards = RewardRepositoryImpl::with_connection(db.clone());
    let coins = rewards
        .create_reward(NewReward {
            title: "Welcome coins".to_string(),
            description: None,
            reward_type: RewardType::Coins,
            value: 50,
            requirements: None,
        })
        .await
        .unwrap();
    let draft = NotificationDraft::new(gina.id, NotificationType::Reward, "Claimed", "coins");

    rewards.claim(gina.id, &coins, draft.clone()).await.unwrap();
    let second = rewards.claim(gina.id, &coins, draft).await;

    assert!(matches!(second, Err(RepoError::UniqueViolation)));
    assert_eq!(users.get_user(gina.id).await.unwrap().coins, 50);
    let counts = NotificationRepositoryImpl::with_connection(db.clone())
        .count_notifications(gina.id)
        .await
        .unwrap();
    assert_eq!(counts.total, 1);
}
