use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        Page, UserId,
        cache::{CacheStore, CacheStoreExt, USER_PROFILE_TTL, keys},
        user::{User, UserActivity, UserQuery, UserRepository},
    },
    workflow::user::UserError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub user: User,
    pub activity: UserActivity,
}

#[async_trait::async_trait]
pub trait UserQueryUseCase {
    async fn list_users(&self, query: UserQuery) -> Result<Page<User>, UserError>;
    async fn get_profile(&self, id: UserId) -> Result<PublicProfile, UserError>;
}

pub struct UserQueryUseCaseImpl<U: UserRepository, C: CacheStore> {
    user_repository: Arc<U>,
    cache: Arc<C>,
}

impl<U: UserRepository, C: CacheStore> UserQueryUseCaseImpl<U, C> {
    pub fn new(user_repository: Arc<U>, cache: Arc<C>) -> Self {
        Self {
            user_repository,
            cache,
        }
    }
}

#[async_trait::async_trait]
impl<U: UserRepository + Send + Sync + 'static, C: CacheStore + Send + Sync + 'static>
    UserQueryUseCase for UserQueryUseCaseImpl<U, C>
{
    async fn list_users(&self, query: UserQuery) -> Result<Page<User>, UserError> {
        Ok(self.user_repository.query_users(query).await?)
    }

    async fn get_profile(&self, id: UserId) -> Result<PublicProfile, UserError> {
        let key = keys::user_profile(id);
        if let Some(profile) = self.cache.get_json::<PublicProfile>(&key) {
            return Ok(profile);
        }
        let user = self.user_repository.get_user(id).await?;
        let activity = self.user_repository.user_activity(id).await?;
        let profile = PublicProfile { user, activity };
        self.cache.set_json(&key, &profile, USER_PROFILE_TTL);
        Ok(profile)
    }
}
