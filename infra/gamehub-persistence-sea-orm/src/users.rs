use std::collections::HashMap;

use chrono::Utc;
use gamehub_app::domain::{
    Page, RepoError, SortOrder, UserId,
    notification::{Notification, NotificationDraft},
    user::{
        NewUser, ProfileUpdate, Role, User, UserActivity, UserProfile, UserQuery, UserRepository,
        UserSortBy, UserUpdate,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::{
    create_db_pool, decode,
    entity::{
        game_profile, match_participant, notification, order, profile, team_member,
        tournament_participant, transaction, user, user_reward,
    },
    flatten_transaction, notifications::store_draft, storage_error, window,
};

pub struct UserRepositoryImpl {
    db: DatabaseConnection,
}

impl UserRepositoryImpl {
    pub async fn new() -> Self {
        let db = create_db_pool().await;
        Self { db }
    }

    pub fn with_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_user(
        model: user::Model,
        profile: Option<profile::Model>,
    ) -> Result<User, RepoError> {
        Ok(User {
            id: UserId(model.id),
            email: model.email,
            username: model.username,
            password_hash: model.password_hash,
            first_name: model.first_name,
            last_name: model.last_name,
            gamer_tag: model.gamer_tag,
            avatar: model.avatar,
            role: decode(&model.role, Role::parse)?,
            is_active: model.is_active,
            is_verified: model.is_verified,
            level: model.level,
            experience: model.experience,
            coins: model.coins,
            last_login: model.last_login,
            created_at: model.created_at,
            updated_at: model.updated_at,
            profile: profile.map(|p| UserProfile {
                bio: p.bio,
                country: p.country,
                timezone: p.timezone,
                game_setup: p.game_setup,
            }),
        })
    }

    async fn load<C: ConnectionTrait>(db: &C, model: user::Model) -> Result<User, RepoError> {
        let profile = profile::Entity::find_by_id(model.id)
            .one(db)
            .await
            .map_err(storage_error)?;
        Self::model_to_user(model, profile)
    }

    async fn find_one(&self, condition: Condition) -> Result<Option<User>, RepoError> {
        let model = user::Entity::find()
            .filter(condition)
            .one(&self.db)
            .await
            .map_err(storage_error)?;
        match model {
            Some(model) => Ok(Some(Self::load(&self.db, model).await?)),
            None => Ok(None),
        }
    }

    async fn apply_profile_update<C: ConnectionTrait>(
        db: &C,
        user_id: uuid::Uuid,
        update: ProfileUpdate,
    ) -> Result<(), RepoError> {
        let existing = profile::Entity::find_by_id(user_id)
            .one(db)
            .await
            .map_err(storage_error)?;
        let is_new = existing.is_none();
        let mut model: profile::ActiveModel = match existing {
            Some(model) => model.into(),
            None => profile::ActiveModel {
                user_id: Set(user_id),
                bio: Set(None),
                country: Set(None),
                timezone: Set(None),
                game_setup: Set(false),
            },
        };
        if let Some(bio) = update.bio {
            model.bio = Set(Some(bio));
        }
        if let Some(country) = update.country {
            model.country = Set(Some(country));
        }
        if let Some(timezone) = update.timezone {
            model.timezone = Set(Some(timezone));
        }
        if let Some(game_setup) = update.game_setup {
            model.game_setup = Set(game_setup);
        }
        if is_new {
            model.insert(db).await.map_err(storage_error)?;
        } else if model.is_changed() {
            model.update(db).await.map_err(storage_error)?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create_user(&self, new_user: NewUser) -> Result<User, RepoError> {
        let res = self
            .db
            .transaction::<_, User, RepoError>(|c| {
                Box::pin(async move {
                    let now = Utc::now();
                    let model = user::ActiveModel {
                        id: Set(UserId::new().0),
                        email: Set(new_user.email),
                        username: Set(new_user.username),
                        password_hash: Set(new_user.password_hash),
                        first_name: Set(new_user.first_name),
                        last_name: Set(new_user.last_name),
                        gamer_tag: Set(None),
                        avatar: Set(None),
                        role: Set(new_user.role.as_str().to_string()),
                        is_active: Set(true),
                        is_verified: Set(new_user.is_verified),
                        level: Set(1),
                        experience: Set(0),
                        coins: Set(0),
                        last_login: Set(None),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(c)
                    .await
                    .map_err(storage_error)?;
                    let profile = profile::ActiveModel {
                        user_id: Set(model.id),
                        bio: Set(None),
                        country: Set(None),
                        timezone: Set(None),
                        game_setup: Set(false),
                    }
                    .insert(c)
                    .await
                    .map_err(storage_error)?;
                    Self::model_to_user(model, Some(profile))
                })
            })
            .await;
        flatten_transaction(res)
    }

    async fn get_user(&self, id: UserId) -> Result<User, RepoError> {
        let model = user::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(RepoError::NotFound)?;
        Self::load(&self.db, model).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        self.find_one(Condition::all().add(user::Column::Email.eq(email)))
            .await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        self.find_one(Condition::all().add(user::Column::Username.eq(username)))
            .await
    }

    async fn find_by_gamer_tag(&self, gamer_tag: &str) -> Result<Option<User>, RepoError> {
        self.find_one(Condition::all().add(user::Column::GamerTag.eq(gamer_tag)))
            .await
    }

    async fn query_users(&self, query: UserQuery) -> Result<Page<User>, RepoError> {
        let mut select = user::Entity::find().filter(user::Column::IsActive.eq(true));
        if let Some(term) = &query.search {
            select = select.filter(
                Condition::any()
                    .add(user::Column::Username.contains(term))
                    .add(user::Column::FirstName.contains(term))
                    .add(user::Column::LastName.contains(term)),
            );
        }
        let total = select.clone().count(&self.db).await.map_err(storage_error)?;

        let column = match query.sort_by {
            UserSortBy::CreatedAt => user::Column::CreatedAt,
            UserSortBy::Username => user::Column::Username,
            UserSortBy::Level => user::Column::Level,
            UserSortBy::Experience => user::Column::Experience,
        };
        let order = match query.sort_order {
            SortOrder::Ascending => Order::Asc,
            SortOrder::Descending => Order::Desc,
        };
        let models = window(select.order_by(column, order), &query.pagination)
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        let ids: Vec<uuid::Uuid> = models.iter().map(|m| m.id).collect();
        let mut profiles: HashMap<uuid::Uuid, profile::Model> = profile::Entity::find()
            .filter(profile::Column::UserId.is_in(ids))
            .all(&self.db)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(|p| (p.user_id, p))
            .collect();
        let items = models
            .into_iter()
            .map(|m| {
                let profile = profiles.remove(&m.id);
                Self::model_to_user(m, profile)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total })
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, RepoError> {
        let res = self
            .db
            .transaction::<_, User, RepoError>(|c| {
                Box::pin(async move {
                    let existing = user::Entity::find_by_id(id.0)
                        .one(c)
                        .await
                        .map_err(storage_error)?
                        .ok_or(RepoError::NotFound)?;
                    let mut model: user::ActiveModel = existing.into();
                    if let Some(v) = update.first_name {
                        model.first_name = Set(Some(v));
                    }
                    if let Some(v) = update.last_name {
                        model.last_name = Set(Some(v));
                    }
                    if let Some(v) = update.gamer_tag {
                        model.gamer_tag = Set(Some(v));
                    }
                    if let Some(v) = update.avatar {
                        model.avatar = Set(v);
                    }
                    if let Some(v) = update.role {
                        model.role = Set(v.as_str().to_string());
                    }
                    if let Some(v) = update.is_active {
                        model.is_active = Set(v);
                    }
                    if let Some(v) = update.is_verified {
                        model.is_verified = Set(v);
                    }
                    if let Some(v) = update.password_hash {
                        model.password_hash = Set(v);
                    }
                    if let Some(v) = update.last_login {
                        model.last_login = Set(Some(v));
                    }
                    model.updated_at = Set(Utc::now());
                    let model = model.update(c).await.map_err(storage_error)?;

                    if let Some(profile_update) = update.profile {
                        Self::apply_profile_update(c, model.id, profile_update).await?;
                    }
                    Self::load(c, model).await
                })
            })
            .await;
        flatten_transaction(res)
    }

    async fn set_active(
        &self,
        id: UserId,
        active: bool,
        notification: NotificationDraft,
    ) -> Result<(User, Notification), RepoError> {
        let res = self
            .db
            .transaction::<_, (User, Notification), RepoError>(|c| {
                Box::pin(async move {
                    let existing = user::Entity::find_by_id(id.0)
                        .one(c)
                        .await
                        .map_err(storage_error)?
                        .ok_or(RepoError::NotFound)?;
                    let mut model: user::ActiveModel = existing.into();
                    model.is_active = Set(active);
                    model.updated_at = Set(Utc::now());
                    let model = model.update(c).await.map_err(storage_error)?;
                    let user = Self::load(c, model).await?;
                    let notification = store_draft(c, notification).await?;
                    Ok((user, notification))
                })
            })
            .await;
        flatten_transaction(res)
    }

    async fn delete_user_cascade(&self, id: UserId) -> Result<(), RepoError> {
        let res = self
            .db
            .transaction::<_, (), RepoError>(|c| {
                Box::pin(async move {
                    let user_id = id.0;
                    if user::Entity::find_by_id(user_id)
                        .one(c)
                        .await
                        .map_err(storage_error)?
                        .is_none()
                    {
                        return Err(RepoError::NotFound);
                    }

                    notification::Entity::delete_many()
                        .filter(notification::Column::UserId.eq(user_id))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    transaction::Entity::delete_many()
                        .filter(transaction::Column::UserId.eq(user_id))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    user_reward::Entity::delete_many()
                        .filter(user_reward::Column::UserId.eq(user_id))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    order::Entity::delete_many()
                        .filter(order::Column::UserId.eq(user_id))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    team_member::Entity::delete_many()
                        .filter(team_member::Column::UserId.eq(user_id))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    tournament_participant::Entity::delete_many()
                        .filter(tournament_participant::Column::UserId.eq(user_id))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    match_participant::Entity::delete_many()
                        .filter(match_participant::Column::UserId.eq(user_id))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    game_profile::Entity::delete_many()
                        .filter(game_profile::Column::UserId.eq(user_id))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    profile::Entity::delete_by_id(user_id)
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    user::Entity::delete_by_id(user_id)
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    log::info!("Hard deleted user {}", id);
                    Ok(())
                })
            })
            .await;
        flatten_transaction(res)
    }

    async fn user_activity(&self, id: UserId) -> Result<UserActivity, RepoError> {
        let teams = team_member::Entity::find()
            .filter(team_member::Column::UserId.eq(id.0))
            .count(&self.db)
            .await
            .map_err(storage_error)?;
        let tournaments = tournament_participant::Entity::find()
            .filter(tournament_participant::Column::UserId.eq(id.0))
            .count(&self.db)
            .await
            .map_err(storage_error)?;
        let matches = match_participant::Entity::find()
            .filter(match_participant::Column::UserId.eq(id.0))
            .count(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(UserActivity {
            teams,
            tournaments,
            matches,
        })
    }
}
