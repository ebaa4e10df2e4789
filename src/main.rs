use std::sync::Arc;

use gamehub_api::{JwtTokenService, RealtimeHub};
use gamehub_app::{AppConfig, Ports, Repositories, build_application};
use gamehub_email_lettre::LettreEmailAdapter;
use gamehub_image_store::LocalImageStore;
use gamehub_persistence_sea_orm::{
    game_profiles::GameProfileRepositoryImpl, matches::MatchRepositoryImpl,
    notifications::NotificationRepositoryImpl, orders::OrderRepositoryImpl,
    rewards::RewardRepositoryImpl, teams::TeamRepositoryImpl,
    tournaments::TournamentRepositoryImpl, transactions::TransactionRepositoryImpl,
    users::UserRepositoryImpl,
};
use log::{LevelFilter, info};
use log4rs::{
    Config,
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            RollingFileAppender,
            policy::compound::{
                CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
            },
        },
    },
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

const LOG_SIZE_LIMIT: u64 = 10 * 1024 * 1024; // 10 MB

const LOG_FILE_COUNT: u32 = 3;

const LOG_PATTERN: &str = "{d} {l} {t} - {m}{n}";

fn init_logger() {
    let file_path = std::env::var("LOG_FILE_PATH").expect("LOG_FILE_PATH must be set");
    let archive_pattern =
        std::env::var("LOG_ARCHIVE_PATTERN").expect("LOG_ARCHIVE_PATTERN must be set");

    let stderr_level = LevelFilter::Info;
    let file_level = LevelFilter::Debug;

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    // A `.gz` archive pattern makes the roller compress old files.
    let trigger = SizeTrigger::new(LOG_SIZE_LIMIT);
    let roller = FixedWindowRoller::builder()
        .build(&archive_pattern, LOG_FILE_COUNT)
        .unwrap();
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

    let logfile = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(file_path, Box::new(policy))
        .unwrap();

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(file_level)))
                .build("logfile", Box::new(logfile)),
        )
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(stderr_level)))
                .build("stderr", Box::new(stderr)),
        )
        .build(
            Root::builder()
                .appender("logfile")
                .appender("stderr")
                .build(LevelFilter::Trace),
        )
        .unwrap();

    let _handle = log4rs::init_config(config).expect("Failed to initialize logger");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }

    init_logger();

    let frontend_url = std::env::var("GAMEHUB_FRONTEND_URL")
        .unwrap_or_else(|_| "http://localhost:8081".to_string());

    let repositories = Repositories {
        users: Arc::new(UserRepositoryImpl::new().await),
        game_profiles: Arc::new(GameProfileRepositoryImpl::new().await),
        tournaments: Arc::new(TournamentRepositoryImpl::new().await),
        teams: Arc::new(TeamRepositoryImpl::new().await),
        matches: Arc::new(MatchRepositoryImpl::new().await),
        transactions: Arc::new(TransactionRepositoryImpl::new().await),
        orders: Arc::new(OrderRepositoryImpl::new().await),
        rewards: Arc::new(RewardRepositoryImpl::new().await),
        notifications: Arc::new(NotificationRepositoryImpl::new().await),
    };

    let realtime = Arc::new(RealtimeHub::new());
    let ports = Ports {
        token: Arc::new(JwtTokenService::new()),
        email: Arc::new(LettreEmailAdapter::new()),
        image_storage: Arc::new(LocalImageStore::new()),
        realtime: realtime.clone(),
    };

    let app = build_application(AppConfig { frontend_url }, repositories, ports);

    info!("Starting application");

    gamehub_api::run(Arc::new(app), realtime, shutdown_signal()).await;

    info!("Application shut down");
}
