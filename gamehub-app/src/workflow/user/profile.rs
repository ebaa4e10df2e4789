use std::sync::Arc;

use crate::{
    domain::{
        RepoError, UserId,
        cache::{CacheStore, CacheStoreExt},
        user::{ProfileUpdate, User, UserRepository, UserUpdate},
    },
    ports::image_storage::{ImageFolder, ImageStoragePort, ImageUpload, StoredImage},
    workflow::user::UserError,
};

#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gamer_tag: Option<String>,
    pub bio: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
}

#[async_trait::async_trait]
pub trait ProfileUseCase {
    async fn update_profile(
        &self,
        user_id: UserId,
        changes: ProfileChanges,
    ) -> Result<User, UserError>;
    /// Replaces the avatar, removing the previous image from storage.
    async fn upload_avatar(
        &self,
        user_id: UserId,
        upload: ImageUpload,
    ) -> Result<(User, StoredImage), UserError>;
    async fn delete_avatar(&self, user_id: UserId) -> Result<User, UserError>;
}

pub struct ProfileUseCaseImpl<U: UserRepository, C: CacheStore, I: ImageStoragePort> {
    user_repository: Arc<U>,
    cache: Arc<C>,
    image_storage: Arc<I>,
}

impl<U: UserRepository, C: CacheStore, I: ImageStoragePort> ProfileUseCaseImpl<U, C, I> {
    pub fn new(user_repository: Arc<U>, cache: Arc<C>, image_storage: Arc<I>) -> Self {
        Self {
            user_repository,
            cache,
            image_storage,
        }
    }

    async fn discard_image(&self, url: &str) {
        let Some(public_id) = self.image_storage.public_id_from_url(url) else {
            return;
        };
        if let Err(e) = self.image_storage.delete(&public_id).await {
            log::warn!("Failed to delete image {}: {}", public_id, e);
        }
    }
}

#[async_trait::async_trait]
impl<
    U: UserRepository + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
    I: ImageStoragePort + Send + Sync + 'static,
> ProfileUseCase for ProfileUseCaseImpl<U, C, I>
{
    async fn update_profile(
        &self,
        user_id: UserId,
        changes: ProfileChanges,
    ) -> Result<User, UserError> {
        if let Some(tag) = &changes.gamer_tag
            && let Some(owner) = self.user_repository.find_by_gamer_tag(tag).await?
            && owner.id != user_id
        {
            return Err(UserError::GamerTagTaken);
        }

        let touches_profile =
            changes.bio.is_some() || changes.country.is_some() || changes.timezone.is_some();
        let update = UserUpdate {
            first_name: changes.first_name,
            last_name: changes.last_name,
            gamer_tag: changes.gamer_tag,
            profile: touches_profile.then(|| ProfileUpdate {
                bio: changes.bio,
                country: changes.country,
                timezone: changes.timezone,
                game_setup: None,
            }),
            ..Default::default()
        };
        let user = match self.user_repository.update_user(user_id, update).await {
            Ok(user) => user,
            Err(RepoError::UniqueViolation) => return Err(UserError::GamerTagTaken),
            Err(e) => return Err(e.into()),
        };
        self.cache.invalidate_user(user_id);
        Ok(user)
    }

    async fn upload_avatar(
        &self,
        user_id: UserId,
        upload: ImageUpload,
    ) -> Result<(User, StoredImage), UserError> {
        let extension = upload.validate()?;
        let current = self.user_repository.get_user(user_id).await?;
        let stored = self
            .image_storage
            .upload(ImageFolder::Avatars, upload.data, extension)
            .await
            .map_err(|e| {
                log::error!("Failed to store avatar for user {}: {}", user_id, e);
                UserError::ImageUpload
            })?;
        if let Some(previous) = &current.avatar {
            self.discard_image(previous).await;
        }

        let user = self
            .user_repository
            .update_user(
                user_id,
                UserUpdate {
                    avatar: Some(Some(stored.url.clone())),
                    ..Default::default()
                },
            )
            .await?;
        self.cache.invalidate_user(user_id);
        Ok((user, stored))
    }

    async fn delete_avatar(&self, user_id: UserId) -> Result<User, UserError> {
        let current = self.user_repository.get_user(user_id).await?;
        let user = self
            .user_repository
            .update_user(
                user_id,
                UserUpdate {
                    avatar: Some(None),
                    ..Default::default()
                },
            )
            .await?;
        if let Some(previous) = &current.avatar {
            self.discard_image(previous).await;
        }
        self.cache.invalidate_user(user_id);
        Ok(user)
    }
}
