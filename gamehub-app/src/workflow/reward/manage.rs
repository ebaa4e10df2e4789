use std::sync::Arc;

use crate::{
    domain::{
        RewardId,
        permission::{Capability, authorize},
        reward::{NewReward, Reward, RewardRepository, RewardUpdate},
        user::User,
    },
    workflow::reward::RewardError,
};

#[async_trait::async_trait]
pub trait ManageRewardUseCase {
    async fn create_reward(&self, actor: &User, reward: NewReward) -> Result<Reward, RewardError>;
    async fn update_reward(
        &self,
        actor: &User,
        id: RewardId,
        update: RewardUpdate,
    ) -> Result<Reward, RewardError>;
    /// Deactivates; existing claims keep pointing at the reward.
    async fn delete_reward(&self, actor: &User, id: RewardId) -> Result<(), RewardError>;
}

pub struct ManageRewardUseCaseImpl<R: RewardRepository> {
    reward_repository: Arc<R>,
}

impl<R: RewardRepository> ManageRewardUseCaseImpl<R> {
    pub fn new(reward_repository: Arc<R>) -> Self {
        Self { reward_repository }
    }
}

#[async_trait::async_trait]
impl<R: RewardRepository + Send + Sync + 'static> ManageRewardUseCase
    for ManageRewardUseCaseImpl<R>
{
    async fn create_reward(&self, actor: &User, reward: NewReward) -> Result<Reward, RewardError> {
        authorize(actor, &Capability::ManageRewards)?;
        let reward = self.reward_repository.create_reward(reward).await?;
        log::info!("Reward {} created by {}", reward.id, actor.id);
        Ok(reward)
    }

    async fn update_reward(
        &self,
        actor: &User,
        id: RewardId,
        update: RewardUpdate,
    ) -> Result<Reward, RewardError> {
        authorize(actor, &Capability::ManageRewards)?;
        Ok(self.reward_repository.update_reward(id, update).await?)
    }

    async fn delete_reward(&self, actor: &User, id: RewardId) -> Result<(), RewardError> {
        authorize(actor, &Capability::ManageRewards)?;
        self.reward_repository
            .update_reward(
                id,
                RewardUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await?;
        log::info!("Reward {} deactivated by {}", id, actor.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{permission::AccessDenied, reward::RewardType, user::Role},
        testing::InMemoryStore,
        workflow::reward::query::{RewardQueryUseCase, RewardQueryUseCaseImpl},
    };

    #[tokio::test]
    async fn test_deleted_reward_leaves_listing() {
        let store = InMemoryStore::new();
        let use_case = ManageRewardUseCaseImpl::new(store.clone());
        let query = RewardQueryUseCaseImpl::new(store.clone(), store.clone());
        let admin = store.seed_user("admin", Role::Admin, 0);
        let moderator = store.seed_user("mod", Role::Moderator, 0);
        let draft = NewReward {
            title: "Veteran".to_string(),
            description: None,
            reward_type: RewardType::Badge,
            value: 0,
            requirements: None,
        };

        let denied = use_case.create_reward(&moderator, draft.clone()).await;
        assert!(matches!(
            denied,
            Err(RewardError::Access(AccessDenied::InsufficientPermissions))
        ));
        let reward = use_case.create_reward(&admin, draft).await.unwrap();
        assert_eq!(query.available_rewards(&moderator).await.unwrap().len(), 1);
        assert_eq!(
            query.reward_counts(&moderator).await.unwrap().unclaimed_count,
            1
        );

        use_case.delete_reward(&admin, reward.id).await.unwrap();
        assert!(query.available_rewards(&moderator).await.unwrap().is_empty());
        assert!(!query.get_reward(reward.id).await.unwrap().is_active);
    }
}
