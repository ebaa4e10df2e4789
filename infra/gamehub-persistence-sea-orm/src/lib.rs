use std::collections::HashMap;

use async_lock::OnceCell;
use gamehub_app::domain::{Pagination, RepoError};
use sea_orm::{
    ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QuerySelect, Schema, SqlErr, TransactionError,
};

pub mod entity;
pub mod game_profiles;
pub mod matches;
pub mod notifications;
pub mod orders;
pub mod rewards;
pub mod teams;
pub mod tournaments;
pub mod transactions;
pub mod users;

use entity::{
    game_profile, r#match, match_participant, notification, order, profile, reward, team,
    team_member, tournament, tournament_participant, transaction, user, user_reward,
};

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

pub async fn create_db_pool() -> DatabaseConnection {
    DB_POOL
        .get_or_init(|| async move {
            let mariadb_database =
                std::env::var("MARIADB_DATABASE").expect("MARIADB_DATABASE must be set");
            let mariadb_user = std::env::var("MARIADB_USER").expect("MARIADB_USER must be set");
            let mariadb_password =
                std::env::var("MARIADB_PASSWORD").expect("MARIADB_PASSWORD must be set");
            let mariadb_host = std::env::var("MARIADB_HOST").expect("MARIADB_HOST must be set");
            let mariadb_port = std::env::var("MARIADB_PORT").expect("MARIADB_PORT must be set");
            let db_url = format!(
                "mysql://{}:{}@{}:{}/{}",
                mariadb_user, mariadb_password, mariadb_host, mariadb_port, mariadb_database
            );

            let mut opt = ConnectOptions::new(&db_url);
            opt.max_connections(10).sqlx_logging(false);

            Database::connect(opt)
                .await
                .expect("Failed to connect to database")
        })
        .await
        .clone()
}

/// Creates every table, parents before the tables referencing them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());
    let statements = [
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(profile::Entity),
        schema.create_table_from_entity(game_profile::Entity),
        schema.create_table_from_entity(tournament::Entity),
        schema.create_table_from_entity(tournament_participant::Entity),
        schema.create_table_from_entity(team::Entity),
        schema.create_table_from_entity(team_member::Entity),
        schema.create_table_from_entity(r#match::Entity),
        schema.create_table_from_entity(match_participant::Entity),
        schema.create_table_from_entity(transaction::Entity),
        schema.create_table_from_entity(order::Entity),
        schema.create_table_from_entity(reward::Entity),
        schema.create_table_from_entity(user_reward::Entity),
        schema.create_table_from_entity(notification::Entity),
    ];
    for statement in statements.iter() {
        db.execute(statement).await?;
    }
    Ok(())
}

pub(crate) fn storage_error(e: DbErr) -> RepoError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => RepoError::UniqueViolation,
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => RepoError::ForeignKeyViolation,
        _ => match e {
            DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepoError::NotFound,
            other => RepoError::StorageError(other.to_string()),
        },
    }
}

pub(crate) fn flatten_transaction<T, E: From<RepoError>>(
    res: Result<T, TransactionError<E>>,
) -> Result<T, E> {
    match res {
        Ok(value) => Ok(value),
        Err(TransactionError::Transaction(e)) => Err(e),
        Err(TransactionError::Connection(e)) => Err(storage_error(e).into()),
    }
}

/// Decodes an enum stored as its wire name.
pub(crate) fn decode<T>(value: &str, parse: fn(&str) -> Option<T>) -> Result<T, RepoError> {
    parse(value).ok_or_else(|| RepoError::StorageError(format!("Unexpected value `{}`", value)))
}

pub(crate) fn from_json<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, RepoError> {
    serde_json::from_value(value).map_err(|e| RepoError::StorageError(e.to_string()))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, RepoError> {
    serde_json::to_value(value).map_err(|e| RepoError::StorageError(e.to_string()))
}

pub(crate) fn window<S: QuerySelect>(select: S, pagination: &Pagination) -> S {
    select
        .offset(pagination.offset.map(|o| o as u64))
        .limit(pagination.limit.map(|l| l as u64))
}

pub(crate) async fn usernames<C: ConnectionTrait>(
    db: &C,
    ids: Vec<uuid::Uuid>,
) -> Result<HashMap<uuid::Uuid, String>, RepoError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(uuid::Uuid, String)> = user::Entity::find()
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Username)
        .filter(user::Column::Id.is_in(ids))
        .into_tuple()
        .all(db)
        .await
        .map_err(storage_error)?;
    Ok(rows.into_iter().collect())
}
