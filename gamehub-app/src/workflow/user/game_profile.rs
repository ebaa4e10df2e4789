use std::sync::Arc;

use crate::{
    domain::{
        GameProfileId, RepoError, UserId,
        cache::{CacheStore, CacheStoreExt},
        game_profile::{
            GameProfile, GameProfileInput, GameProfileRepository, GameProfileUpdate,
            SUPPORTED_GAMES, SupportedGame,
        },
        user::{ProfileUpdate, UserRepository, UserUpdate},
    },
    workflow::user::UserError,
};

#[async_trait::async_trait]
pub trait GameProfileUseCase {
    fn supported_games(&self) -> &'static [SupportedGame];
    async fn list_game_profiles(&self, user_id: UserId) -> Result<Vec<GameProfile>, UserError>;
    /// Creates the profile for the game, or refreshes it when one exists.
    async fn save_game_profile(
        &self,
        user_id: UserId,
        input: GameProfileInput,
    ) -> Result<GameProfile, UserError>;
    async fn update_game_profile(
        &self,
        user_id: UserId,
        id: GameProfileId,
        update: GameProfileUpdate,
    ) -> Result<GameProfile, UserError>;
    async fn delete_game_profile(&self, user_id: UserId, id: GameProfileId)
    -> Result<(), UserError>;
}

pub struct GameProfileUseCaseImpl<G: GameProfileRepository, U: UserRepository, C: CacheStore> {
    game_profile_repository: Arc<G>,
    user_repository: Arc<U>,
    cache: Arc<C>,
}

impl<G: GameProfileRepository, U: UserRepository, C: CacheStore> GameProfileUseCaseImpl<G, U, C> {
    pub fn new(game_profile_repository: Arc<G>, user_repository: Arc<U>, cache: Arc<C>) -> Self {
        Self {
            game_profile_repository,
            user_repository,
            cache,
        }
    }
}

fn profile_error(e: RepoError) -> UserError {
    match e {
        RepoError::NotFound => UserError::GameProfileNotFound,
        e => e.into(),
    }
}

#[async_trait::async_trait]
impl<
    G: GameProfileRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
> GameProfileUseCase for GameProfileUseCaseImpl<G, U, C>
{
    fn supported_games(&self) -> &'static [SupportedGame] {
        &SUPPORTED_GAMES
    }

    async fn list_game_profiles(&self, user_id: UserId) -> Result<Vec<GameProfile>, UserError> {
        Ok(self
            .game_profile_repository
            .list_game_profiles(user_id)
            .await?)
    }

    async fn save_game_profile(
        &self,
        user_id: UserId,
        input: GameProfileInput,
    ) -> Result<GameProfile, UserError> {
        if !SUPPORTED_GAMES.iter().any(|g| g.id == input.game_id) {
            return Err(UserError::UnsupportedGame);
        }
        let profile = self
            .game_profile_repository
            .upsert_game_profile(user_id, input)
            .await?;
        self.user_repository
            .update_user(
                user_id,
                UserUpdate {
                    profile: Some(ProfileUpdate {
                        game_setup: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .await?;
        self.cache.invalidate_user(user_id);
        Ok(profile)
    }

    async fn update_game_profile(
        &self,
        user_id: UserId,
        id: GameProfileId,
        update: GameProfileUpdate,
    ) -> Result<GameProfile, UserError> {
        self.game_profile_repository
            .update_game_profile(user_id, id, update)
            .await
            .map_err(profile_error)
    }

    async fn delete_game_profile(
        &self,
        user_id: UserId,
        id: GameProfileId,
    ) -> Result<(), UserError> {
        self.game_profile_repository
            .delete_game_profile(user_id, id)
            .await
            .map_err(profile_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::user::Role,
        testing::{InMemoryStore, cache},
    };

    fn input(game_id: &str) -> GameProfileInput {
        GameProfileInput {
            game_id: game_id.to_string(),
            game_name: game_id.to_uppercase(),
            game_uid: "123".to_string(),
            in_game_name: "ace".to_string(),
        }
    }

    #[tokio::test]
    async fn test_primary_profile_rules() {
        let store = InMemoryStore::new();
        let ada = store.seed_user("ada", Role::User, 0);
        let use_case = GameProfileUseCaseImpl::new(store.clone(), store.clone(), cache());

        let first = use_case.save_game_profile(ada.id, input("pubg")).await.unwrap();
        let second = use_case.save_game_profile(ada.id, input("codm")).await.unwrap();
        assert!(first.is_primary);
        assert!(!second.is_primary);
        assert!(store.user(ada.id).unwrap().profile.unwrap().game_setup);

        use_case
            .update_game_profile(
                ada.id,
                second.id,
                GameProfileUpdate {
                    is_primary: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let profiles = use_case.list_game_profiles(ada.id).await.unwrap();
        assert_eq!(profiles[0].id, second.id);
        assert_eq!(profiles.iter().filter(|p| p.is_primary).count(), 1);

        use_case.delete_game_profile(ada.id, second.id).await.unwrap();
        let profiles = use_case.list_game_profiles(ada.id).await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert!(profiles[0].is_primary);
    }

    #[tokio::test]
    async fn test_unknown_game_and_foreign_profile() {
        let store = InMemoryStore::new();
        let ada = store.seed_user("ada", Role::User, 0);
        let bob = store.seed_user("bob", Role::User, 0);
        let use_case = GameProfileUseCaseImpl::new(store.clone(), store.clone(), cache());

        let result = use_case.save_game_profile(ada.id, input("chess")).await;
        assert!(matches!(result, Err(UserError::UnsupportedGame)));

        let profile = use_case.save_game_profile(ada.id, input("pubg")).await.unwrap();
        let result = use_case.delete_game_profile(bob.id, profile.id).await;
        assert!(matches!(result, Err(UserError::GameProfileNotFound)));
    }
}
