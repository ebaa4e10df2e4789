use std::sync::Arc;

use crate::{
    domain::{
        RepoError, UserId,
        cache::{CacheStore, CacheStoreExt, keys},
        event::Outbox,
        notification::{NotificationDraft, NotificationType},
        permission::{Capability, authorize},
        user::{NewUser, Role, User, UserRepository, UserUpdate},
    },
    services::{dispatch::EventDispatcher, password::hash_password},
    workflow::user::UserError,
};

#[derive(Debug, Clone)]
pub struct AdminNewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct AdminUserUpdate {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

#[async_trait::async_trait]
pub trait UserAdminUseCase {
    async fn create_user(&self, actor: &User, new_user: AdminNewUser) -> Result<User, UserError>;
    async fn update_user(
        &self,
        actor: &User,
        id: UserId,
        update: AdminUserUpdate,
    ) -> Result<User, UserError>;
    /// Deactivates the account, or removes it with every dependent row when `permanent`.
    async fn delete_user(&self, actor: &User, id: UserId, permanent: bool)
    -> Result<(), UserError>;
    async fn ban_user(
        &self,
        actor: &User,
        id: UserId,
        reason: Option<String>,
    ) -> Result<User, UserError>;
    async fn unban_user(&self, actor: &User, id: UserId) -> Result<User, UserError>;
}

pub struct UserAdminUseCaseImpl<U: UserRepository, C: CacheStore, D: EventDispatcher> {
    user_repository: Arc<U>,
    cache: Arc<C>,
    dispatcher: Arc<D>,
}

impl<U: UserRepository, C: CacheStore, D: EventDispatcher> UserAdminUseCaseImpl<U, C, D> {
    pub fn new(user_repository: Arc<U>, cache: Arc<C>, dispatcher: Arc<D>) -> Self {
        Self {
            user_repository,
            cache,
            dispatcher,
        }
    }

    fn forget(&self, id: UserId) {
        self.cache.invalidate_user(id);
        self.cache.del(&keys::refresh_token(id));
    }

    async fn set_active(
        &self,
        id: UserId,
        active: bool,
        draft: NotificationDraft,
    ) -> Result<User, UserError> {
        let (user, notification) = self.user_repository.set_active(id, active, draft).await?;
        self.cache.invalidate_user(id);
        self.dispatcher.dispatch(Outbox::new().notification(notification));
        Ok(user)
    }
}

#[async_trait::async_trait]
impl<
    U: UserRepository + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    D: EventDispatcher + Send + Sync + 'static,
> UserAdminUseCase for UserAdminUseCaseImpl<U, C, D>
{
    async fn create_user(&self, actor: &User, new_user: AdminNewUser) -> Result<User, UserError> {
        authorize(actor, &Capability::CreateUsers)?;
        if self
            .user_repository
            .find_by_email(&new_user.email)
            .await?
            .is_some()
        {
            return Err(UserError::EmailTaken);
        }
        if self
            .user_repository
            .find_by_username(&new_user.username)
            .await?
            .is_some()
        {
            return Err(UserError::UsernameTaken);
        }
        let password_hash = hash_password(&new_user.password).map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            UserError::Internal
        })?;
        let user = self
            .user_repository
            .create_user(NewUser {
                email: new_user.email,
                username: new_user.username,
                password_hash,
                first_name: new_user.first_name,
                last_name: new_user.last_name,
                role: new_user.role,
                is_verified: true,
            })
            .await
            .map_err(|e| match e {
                RepoError::UniqueViolation => UserError::EmailTaken,
                e => e.into(),
            })?;
        log::info!("User {} created by {}", user.id, actor.id);
        Ok(user)
    }

    async fn update_user(
        &self,
        actor: &User,
        id: UserId,
        update: AdminUserUpdate,
    ) -> Result<User, UserError> {
        authorize(actor, &Capability::ManageUsers)?;
        let user = self
            .user_repository
            .update_user(
                id,
                UserUpdate {
                    role: update.role,
                    is_active: update.is_active,
                    is_verified: update.is_verified,
                    ..Default::default()
                },
            )
            .await?;
        self.cache.invalidate_user(id);
        Ok(user)
    }

    async fn delete_user(
        &self,
        actor: &User,
        id: UserId,
        permanent: bool,
    ) -> Result<(), UserError> {
        authorize(actor, &Capability::ManageUsers)?;
        if permanent {
            self.user_repository.delete_user_cascade(id).await?;
            log::info!("User {} permanently deleted by {}", id, actor.id);
        } else {
            self.user_repository
                .update_user(
                    id,
                    UserUpdate {
                        is_active: Some(false),
                        ..Default::default()
                    },
                )
                .await?;
        }
        self.forget(id);
        Ok(())
    }

    async fn ban_user(
        &self,
        actor: &User,
        id: UserId,
        reason: Option<String>,
    ) -> Result<User, UserError> {
        authorize(actor, &Capability::ModerateUsers)?;
        let message = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "Your account has been suspended.".to_string());
        let draft =
            NotificationDraft::new(id, NotificationType::System, "Account Suspended", message);
        let user = self.set_active(id, false, draft).await?;
        self.forget(id);
        Ok(user)
    }

    async fn unban_user(&self, actor: &User, id: UserId) -> Result<User, UserError> {
        authorize(actor, &Capability::ModerateUsers)?;
        let draft = NotificationDraft::new(
            id,
            NotificationType::System,
            "Account Restored",
            "Your account has been restored.",
        );
        self.set_active(id, true, draft).await
    }
}
