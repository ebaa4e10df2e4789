use std::{collections::HashSet, sync::Arc};

use serde::Serialize;

use crate::{
    domain::{
        Page, Pagination, RepoError, RewardId,
        reward::{Reward, RewardQuery, RewardRepository, UserReward},
        user::{User, UserRepository},
    },
    workflow::reward::RewardError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardCounts {
    /// Active rewards the user has not claimed yet, eligible or not.
    pub unclaimed_count: u64,
    pub total_count: u64,
}

#[async_trait::async_trait]
pub trait RewardQueryUseCase {
    async fn list_rewards(&self, query: RewardQuery) -> Result<Page<Reward>, RewardError>;
    async fn get_reward(&self, id: RewardId) -> Result<Reward, RewardError>;
    /// Active, unclaimed rewards whose requirements the user currently meets.
    async fn available_rewards(&self, user: &User) -> Result<Vec<Reward>, RewardError>;
    async fn claimed_rewards(
        &self,
        user: &User,
        pagination: Pagination,
    ) -> Result<Page<UserReward>, RewardError>;
    async fn reward_counts(&self, user: &User) -> Result<RewardCounts, RewardError>;
}

pub struct RewardQueryUseCaseImpl<R: RewardRepository, U: UserRepository> {
    reward_repository: Arc<R>,
    user_repository: Arc<U>,
}

impl<R: RewardRepository, U: UserRepository> RewardQueryUseCaseImpl<R, U> {
    pub fn new(reward_repository: Arc<R>, user_repository: Arc<U>) -> Self {
        Self {
            reward_repository,
            user_repository,
        }
    }

    async fn unclaimed(&self, user: &User) -> Result<Vec<Reward>, RewardError> {
        let claimed: HashSet<RewardId> = self
            .reward_repository
            .claimed_reward_ids(user.id)
            .await?
            .into_iter()
            .collect();
        let active = self
            .reward_repository
            .query_rewards(RewardQuery {
                active_only: true,
                ..Default::default()
            })
            .await?;
        Ok(active
            .items
            .into_iter()
            .filter(|r| !claimed.contains(&r.id))
            .collect())
    }
}

#[async_trait::async_trait]
impl<R: RewardRepository + Send + Sync + 'static, U: UserRepository + Send + Sync + 'static>
    RewardQueryUseCase for RewardQueryUseCaseImpl<R, U>
{
    async fn list_rewards(&self, query: RewardQuery) -> Result<Page<Reward>, RewardError> {
        Ok(self.reward_repository.query_rewards(query).await?)
    }

    async fn get_reward(&self, id: RewardId) -> Result<Reward, RewardError> {
        Ok(self.reward_repository.get_reward(id).await?)
    }

    async fn available_rewards(&self, user: &User) -> Result<Vec<Reward>, RewardError> {
        let current = match self.user_repository.get_user(user.id).await {
            Ok(current) => current,
            Err(RepoError::NotFound) => return Err(RewardError::UserNotFound),
            Err(e) => return Err(e.into()),
        };
        let activity = self.user_repository.user_activity(user.id).await?;
        Ok(self
            .unclaimed(user)
            .await?
            .into_iter()
            .filter(|r| r.is_eligible(&current, &activity).is_ok())
            .collect())
    }

    async fn claimed_rewards(
        &self,
        user: &User,
        pagination: Pagination,
    ) -> Result<Page<UserReward>, RewardError> {
        Ok(self.reward_repository.list_claims(user.id, pagination).await?)
    }

    async fn reward_counts(&self, user: &User) -> Result<RewardCounts, RewardError> {
        let unclaimed_count = self.unclaimed(user).await?.len() as u64;
        let total_count = self
            .reward_repository
            .claimed_reward_ids(user.id)
            .await?
            .len() as u64;
        Ok(RewardCounts {
            unclaimed_count,
            total_count,
        })
    }
}
