use std::sync::Arc;

use crate::{
    domain::{
        RepoError, RewardId,
        cache::{CacheStore, CacheStoreExt},
        event::Outbox,
        notification::{NotificationDraft, NotificationType},
        reward::{RewardRepository, UserReward},
        user::{User, UserRepository},
    },
    services::dispatch::EventDispatcher,
    workflow::reward::RewardError,
};

#[async_trait::async_trait]
pub trait ClaimRewardUseCase {
    /// Requirements are checked against the user's live stats, not the session copy.
    async fn claim_reward(&self, user: &User, id: RewardId) -> Result<UserReward, RewardError>;
}

pub struct ClaimRewardUseCaseImpl<
    R: RewardRepository,
    U: UserRepository,
    C: CacheStore,
    D: EventDispatcher,
> {
    reward_repository: Arc<R>,
    user_repository: Arc<U>,
    cache: Arc<C>,
    dispatcher: Arc<D>,
}

impl<R: RewardRepository, U: UserRepository, C: CacheStore, D: EventDispatcher>
    ClaimRewardUseCaseImpl<R, U, C, D>
{
    pub fn new(
        reward_repository: Arc<R>,
        user_repository: Arc<U>,
        cache: Arc<C>,
        dispatcher: Arc<D>,
    ) -> Self {
        Self {
            reward_repository,
            user_repository,
            cache,
            dispatcher,
        }
    }
}

#[async_trait::async_trait]
impl<
    R: RewardRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    D: EventDispatcher + Send + Sync + 'static,
> ClaimRewardUseCase for ClaimRewardUseCaseImpl<R, U, C, D>
{
    async fn claim_reward(&self, user: &User, id: RewardId) -> Result<UserReward, RewardError> {
        let reward = match self.reward_repository.get_reward(id).await {
            Ok(reward) if reward.is_active => reward,
            Ok(_) | Err(RepoError::NotFound) => return Err(RewardError::Unavailable),
            Err(e) => return Err(e.into()),
        };
        if self
            .reward_repository
            .claimed_reward_ids(user.id)
            .await?
            .contains(&id)
        {
            return Err(RewardError::AlreadyClaimed);
        }
        let current = match self.user_repository.get_user(user.id).await {
            Ok(current) => current,
            Err(RepoError::NotFound) => return Err(RewardError::UserNotFound),
            Err(e) => return Err(e.into()),
        };
        let activity = self.user_repository.user_activity(user.id).await?;
        reward.is_eligible(&current, &activity)?;

        let (claim, notification) = self
            .reward_repository
            .claim(
                user.id,
                &reward,
                NotificationDraft::new(
                    user.id,
                    NotificationType::Reward,
                    "Reward Claimed!",
                    format!("You have claimed the reward: {}", reward.title),
                ),
            )
            .await?;
        self.cache.invalidate_user(user.id);
        log::info!("Reward {} claimed by {}", id, user.id);
        self.dispatcher
            .dispatch(Outbox::new().notification(notification));
        Ok(claim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            reward::{NewReward, RewardRequirements, RewardType, RewardUpdate, UnmetRequirement},
            user::Role,
        },
        testing::{self, InMemoryStore, RecordingDispatcher},
    };

    fn coins(value: i64, requirements: Option<RewardRequirements>) -> NewReward {
        NewReward {
            title: "Welcome bonus".to_string(),
            description: None,
            reward_type: RewardType::Coins,
            value,
            requirements,
        }
    }

    #[tokio::test]
    async fn test_claim_once() {
        let store = InMemoryStore::new();
        let dispatcher = RecordingDispatcher::new();
        let use_case = ClaimRewardUseCaseImpl::new(
            store.clone(),
            store.clone(),
            testing::cache(),
            dispatcher.clone(),
        );
        let user = store.seed_user("ada", Role::User, 5);
        let reward = store.create_reward(coins(25, None)).await.unwrap();

        let claim = use_case.claim_reward(&user, reward.id).await.unwrap();
        assert_eq!(claim.reward.id, reward.id);
        assert_eq!(store.user(user.id).unwrap().coins, 30);
        let again = use_case.claim_reward(&user, reward.id).await;
        assert!(matches!(again, Err(RewardError::AlreadyClaimed)));
        assert_eq!(store.user(user.id).unwrap().coins, 30);
        assert_eq!(store.notifications_for(user.id).len(), 1);
        assert_eq!(dispatcher.events().len(), 1);
    }

    #[tokio::test]
    async fn test_claim_checks_requirements_and_activity() {
        let store = InMemoryStore::new();
        let use_case = ClaimRewardUseCaseImpl::new(
            store.clone(),
            store.clone(),
            testing::cache(),
            RecordingDispatcher::new(),
        );
        let user = store.seed_user("ada", Role::User, 0);
        let gated = store
            .create_reward(coins(
                10,
                Some(RewardRequirements {
                    min_level: Some(5),
                    ..Default::default()
                }),
            ))
            .await
            .unwrap();
        let result = use_case.claim_reward(&user, gated.id).await;
        assert!(matches!(
            result,
            Err(RewardError::Unmet(UnmetRequirement::Level))
        ));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Level requirement not met"
        );

        let retired = store.create_reward(coins(10, None)).await.unwrap();
        store
            .update_reward(
                retired.id,
                RewardUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let inactive = use_case.claim_reward(&user, retired.id).await;
        assert!(matches!(inactive, Err(RewardError::Unavailable)));
        let unknown = use_case.claim_reward(&user, RewardId::new()).await;
        assert!(matches!(unknown, Err(RewardError::Unavailable)));
    }
}
