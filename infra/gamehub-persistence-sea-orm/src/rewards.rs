use std::collections::HashMap;

use chrono::Utc;
use gamehub_app::domain::{
    Page, Pagination, RepoError, RewardId, UserId,
    notification::{Notification, NotificationDraft},
    reward::{
        NewReward, Reward, RewardQuery, RewardRepository, RewardRequirements, RewardType,
        RewardUpdate, UserReward,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ExprTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::Expr,
};

use crate::{
    create_db_pool, decode,
    entity::{reward, user, user_reward},
    flatten_transaction, from_json,
    notifications::store_draft,
    storage_error, to_json, window,
};

pub struct RewardRepositoryImpl {
    db: DatabaseConnection,
}

impl RewardRepositoryImpl {
    pub async fn new() -> Self {
        let db = create_db_pool().await;
        Self { db }
    }

    pub fn with_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_reward(model: reward::Model) -> Result<Reward, RepoError> {
        Ok(Reward {
            id: RewardId(model.id),
            title: model.title,
            description: model.description,
            reward_type: decode(&model.reward_type, RewardType::parse)?,
            value: model.value,
            requirements: model
                .requirements
                .map(from_json::<RewardRequirements>)
                .transpose()?,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[async_trait::async_trait]
impl RewardRepository for RewardRepositoryImpl {
    async fn create_reward(&self, r: NewReward) -> Result<Reward, RepoError> {
        let now = Utc::now();
        let model = reward::ActiveModel {
            id: Set(RewardId::new().0),
            title: Set(r.title),
            description: Set(r.description),
            reward_type: Set(r.reward_type.as_str().to_string()),
            value: Set(r.value),
            requirements: Set(r.requirements.as_ref().map(to_json).transpose()?),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(storage_error)?;
        Self::model_to_reward(model)
    }

    async fn get_reward(&self, id: RewardId) -> Result<Reward, RepoError> {
        let model = reward::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(RepoError::NotFound)?;
        Self::model_to_reward(model)
    }

    async fn query_rewards(&self, query: RewardQuery) -> Result<Page<Reward>, RepoError> {
        let mut select = reward::Entity::find();
        if query.active_only {
            select = select.filter(reward::Column::IsActive.eq(true));
        }
        if let Some(reward_type) = query.reward_type {
            select = select.filter(reward::Column::RewardType.eq(reward_type.as_str()));
        }
        let total = select.clone().count(&self.db).await.map_err(storage_error)?;
        let models = window(
            select.order_by_asc(reward::Column::CreatedAt),
            &query.pagination,
        )
        .all(&self.db)
        .await
        .map_err(storage_error)?;
        let items = models
            .into_iter()
            .map(Self::model_to_reward)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total })
    }

    async fn update_reward(&self, id: RewardId, u: RewardUpdate) -> Result<Reward, RepoError> {
        let existing = reward::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(RepoError::NotFound)?;
        let mut model: reward::ActiveModel = existing.into();
        if let Some(v) = u.title {
            model.title = Set(v);
        }
        if let Some(v) = u.description {
            model.description = Set(Some(v));
        }
        if let Some(v) = u.reward_type {
            model.reward_type = Set(v.as_str().to_string());
        }
        if let Some(v) = u.value {
            model.value = Set(v);
        }
        if let Some(v) = u.requirements {
            model.requirements = Set(Some(to_json(&v)?));
        }
        if let Some(v) = u.is_active {
            model.is_active = Set(v);
        }
        model.updated_at = Set(Utc::now());
        let model = model.update(&self.db).await.map_err(storage_error)?;
        Self::model_to_reward(model)
    }

    async fn claimed_reward_ids(&self, user_id: UserId) -> Result<Vec<RewardId>, RepoError> {
        let ids: Vec<uuid::Uuid> = user_reward::Entity::find()
            .select_only()
            .column(user_reward::Column::RewardId)
            .filter(user_reward::Column::UserId.eq(user_id.0))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(ids.into_iter().map(RewardId).collect())
    }

    async fn list_claims(
        &self,
        user_id: UserId,
        pagination: Pagination,
    ) -> Result<Page<UserReward>, RepoError> {
        let select = user_reward::Entity::find().filter(user_reward::Column::UserId.eq(user_id.0));
        let total = select.clone().count(&self.db).await.map_err(storage_error)?;
        let claims = window(
            select.order_by_desc(user_reward::Column::ClaimedAt),
            &pagination,
        )
        .all(&self.db)
        .await
        .map_err(storage_error)?;

        let ids: Vec<uuid::Uuid> = claims.iter().map(|c| c.reward_id).collect();
        let rewards: HashMap<uuid::Uuid, Reward> = reward::Entity::find()
            .filter(reward::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(|m| Self::model_to_reward(m).map(|r| (r.id.0, r)))
            .collect::<Result<_, _>>()?;

        let items = claims
            .into_iter()
            .filter_map(|c| {
                rewards.get(&c.reward_id).map(|reward| UserReward {
                    user_id,
                    reward: reward.clone(),
                    claimed_at: c.claimed_at,
                })
            })
            .collect();
        Ok(Page { items, total })
    }

    async fn claim(
        &self,
        user_id: UserId,
        reward: &Reward,
        notification: NotificationDraft,
    ) -> Result<(UserReward, Notification), RepoError> {
        let reward = reward.clone();
        let res = self
            .db
            .transaction::<_, (UserReward, Notification), RepoError>(|c| {
                Box::pin(async move {
                    let claim = user_reward::ActiveModel {
                        user_id: Set(user_id.0),
                        reward_id: Set(reward.id.0),
                        claimed_at: Set(Utc::now()),
                    }
                    .insert(c)
                    .await
                    .map_err(storage_error)?;

                    let column = match reward.reward_type {
                        RewardType::Coins => Some(user::Column::Coins),
                        RewardType::Experience => Some(user::Column::Experience),
                        RewardType::Badge | RewardType::Item => None,
                    };
                    if let Some(column) = column.filter(|_| reward.value != 0) {
                        let res = user::Entity::update_many()
                            .col_expr(column, Expr::col(column).add(reward.value))
                            .filter(user::Column::Id.eq(user_id.0))
                            .exec(c)
                            .await
                            .map_err(storage_error)?;
                        if res.rows_affected == 0 {
                            return Err(RepoError::NotFound);
                        }
                    }

                    let notification = store_draft(c, notification).await?;
                    Ok((
                        UserReward {
                            user_id,
                            reward,
                            claimed_at: claim.claimed_at,
                        },
                        notification,
                    ))
                })
            })
            .await;
        flatten_transaction(res)
    }
}
