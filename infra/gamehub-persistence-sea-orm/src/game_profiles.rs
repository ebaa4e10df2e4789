use chrono::Utc;
use gamehub_app::domain::{
    GameProfileId, RepoError, UserId,
    game_profile::{GameProfile, GameProfileInput, GameProfileRepository, GameProfileUpdate},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, prelude::Expr,
};

use crate::{create_db_pool, entity::game_profile, flatten_transaction, storage_error};

pub struct GameProfileRepositoryImpl {
    db: DatabaseConnection,
}

impl GameProfileRepositoryImpl {
    pub async fn new() -> Self {
        let db = create_db_pool().await;
        Self { db }
    }

    pub fn with_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_profile(model: game_profile::Model) -> GameProfile {
        GameProfile {
            id: GameProfileId(model.id),
            user_id: UserId(model.user_id),
            game_id: model.game_id,
            game_name: model.game_name,
            game_uid: model.game_uid,
            in_game_name: model.in_game_name,
            is_primary: model.is_primary,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[async_trait::async_trait]
impl GameProfileRepository for GameProfileRepositoryImpl {
    async fn list_game_profiles(&self, user_id: UserId) -> Result<Vec<GameProfile>, RepoError> {
        let models = game_profile::Entity::find()
            .filter(game_profile::Column::UserId.eq(user_id.0))
            .order_by_desc(game_profile::Column::IsPrimary)
            .order_by_asc(game_profile::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(models.into_iter().map(Self::model_to_profile).collect())
    }

    async fn upsert_game_profile(
        &self,
        user_id: UserId,
        input: GameProfileInput,
    ) -> Result<GameProfile, RepoError> {
        let res = self
            .db
            .transaction::<_, GameProfile, RepoError>(|c| {
                Box::pin(async move {
                    let now = Utc::now();
                    let existing = game_profile::Entity::find()
                        .filter(game_profile::Column::UserId.eq(user_id.0))
                        .filter(game_profile::Column::GameId.eq(input.game_id.as_str()))
                        .one(c)
                        .await
                        .map_err(storage_error)?;

                    let model = match existing {
                        Some(model) => {
                            let mut model: game_profile::ActiveModel = model.into();
                            model.game_name = Set(input.game_name);
                            model.game_uid = Set(input.game_uid);
                            model.in_game_name = Set(input.in_game_name);
                            model.updated_at = Set(now);
                            model.update(c).await.map_err(storage_error)?
                        }
                        None => {
                            let owned = game_profile::Entity::find()
                                .filter(game_profile::Column::UserId.eq(user_id.0))
                                .count(c)
                                .await
                                .map_err(storage_error)?;
                            game_profile::ActiveModel {
                                id: Set(GameProfileId::new().0),
                                user_id: Set(user_id.0),
                                game_id: Set(input.game_id),
                                game_name: Set(input.game_name),
                                game_uid: Set(input.game_uid),
                                in_game_name: Set(input.in_game_name),
                                is_primary: Set(owned == 0),
                                created_at: Set(now),
                                updated_at: Set(now),
                            }
                            .insert(c)
                            .await
                            .map_err(storage_error)?
                        }
                    };
                    Ok(Self::model_to_profile(model))
                })
            })
            .await;
        flatten_transaction(res)
    }

    async fn update_game_profile(
        &self,
        user_id: UserId,
        id: GameProfileId,
        update: GameProfileUpdate,
    ) -> Result<GameProfile, RepoError> {
        let res = self
            .db
            .transaction::<_, GameProfile, RepoError>(|c| {
                Box::pin(async move {
                    let existing = game_profile::Entity::find_by_id(id.0)
                        .filter(game_profile::Column::UserId.eq(user_id.0))
                        .one(c)
                        .await
                        .map_err(storage_error)?
                        .ok_or(RepoError::NotFound)?;

                    if update.is_primary == Some(true) {
                        game_profile::Entity::update_many()
                            .col_expr(game_profile::Column::IsPrimary, Expr::value(false))
                            .filter(game_profile::Column::UserId.eq(user_id.0))
                            .filter(game_profile::Column::Id.ne(id.0))
                            .exec(c)
                            .await
                            .map_err(storage_error)?;
                    }

                    let mut model: game_profile::ActiveModel = existing.into();
                    if let Some(v) = update.game_uid {
                        model.game_uid = Set(v);
                    }
                    if let Some(v) = update.in_game_name {
                        model.in_game_name = Set(v);
                    }
                    if let Some(v) = update.is_primary {
                        model.is_primary = Set(v);
                    }
                    model.updated_at = Set(Utc::now());
                    let model = model.update(c).await.map_err(storage_error)?;
                    Ok(Self::model_to_profile(model))
                })
            })
            .await;
        flatten_transaction(res)
    }

    async fn delete_game_profile(
        &self,
        user_id: UserId,
        id: GameProfileId,
    ) -> Result<(), RepoError> {
        let res = self
            .db
            .transaction::<_, (), RepoError>(|c| {
                Box::pin(async move {
                    let existing = game_profile::Entity::find_by_id(id.0)
                        .filter(game_profile::Column::UserId.eq(user_id.0))
                        .one(c)
                        .await
                        .map_err(storage_error)?
                        .ok_or(RepoError::NotFound)?;
                    game_profile::Entity::delete_by_id(existing.id)
                        .exec(c)
                        .await
                        .map_err(storage_error)?;

                    if !existing.is_primary {
                        return Ok(());
                    }
                    let oldest = game_profile::Entity::find()
                        .filter(game_profile::Column::UserId.eq(user_id.0))
                        .order_by_asc(game_profile::Column::CreatedAt)
                        .one(c)
                        .await
                        .map_err(storage_error)?;
                    if let Some(next) = oldest {
                        let mut next: game_profile::ActiveModel = next.into();
                        next.is_primary = Set(true);
                        next.update(c).await.map_err(storage_error)?;
                    }
                    Ok(())
                })
            })
            .await;
        flatten_transaction(res)
    }
}
