use chrono::Utc;
use gamehub_app::domain::{
    Page, RepoError, TeamId, UserId,
    team::{NewTeam, Team, TeamMember, TeamQuery, TeamRepository, TeamRole, TeamUpdate},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, prelude::Expr,
};

use crate::{
    create_db_pool, decode,
    entity::{team, team_member},
    flatten_transaction, storage_error, usernames, window,
};

pub struct TeamRepositoryImpl {
    db: DatabaseConnection,
}

impl TeamRepositoryImpl {
    pub async fn new() -> Self {
        let db = create_db_pool().await;
        Self { db }
    }

    pub fn with_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_team(model: team::Model) -> Team {
        Team {
            id: TeamId(model.id),
            name: model.name,
            description: model.description,
            logo: model.logo,
            max_members: model.max_members,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    async fn to_members(
        &self,
        models: Vec<team_member::Model>,
    ) -> Result<Vec<TeamMember>, RepoError> {
        let mut names = usernames(&self.db, models.iter().map(|m| m.user_id).collect()).await?;
        models
            .into_iter()
            .map(|m| {
                Ok(TeamMember {
                    team_id: TeamId(m.team_id),
                    user_id: UserId(m.user_id),
                    username: names.remove(&m.user_id).unwrap_or_default(),
                    role: decode(&m.role, TeamRole::parse)?,
                    joined_at: m.joined_at,
                })
            })
            .collect()
    }

    async fn set_role<C: ConnectionTrait>(
        db: &C,
        id: TeamId,
        user_id: UserId,
        role: TeamRole,
    ) -> Result<(), RepoError> {
        team_member::Entity::update_many()
            .col_expr(team_member::Column::Role, Expr::value(role.as_str()))
            .filter(team_member::Column::TeamId.eq(id.0))
            .filter(team_member::Column::UserId.eq(user_id.0))
            .exec(db)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TeamRepository for TeamRepositoryImpl {
    async fn create_team_with_leader(
        &self,
        new_team: NewTeam,
        leader: UserId,
    ) -> Result<Team, RepoError> {
        let res = self
            .db
            .transaction::<_, Team, RepoError>(|c| {
                Box::pin(async move {
                    let now = Utc::now();
                    let model = team::ActiveModel {
                        id: Set(TeamId::new().0),
                        name: Set(new_team.name),
                        description: Set(new_team.description),
                        logo: Set(None),
                        max_members: Set(new_team.max_members),
                        is_active: Set(true),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(c)
                    .await
                    .map_err(storage_error)?;
                    team_member::ActiveModel {
                        team_id: Set(model.id),
                        user_id: Set(leader.0),
                        role: Set(TeamRole::Leader.as_str().to_string()),
                        joined_at: Set(now),
                    }
                    .insert(c)
                    .await
                    .map_err(storage_error)?;
                    Ok(Self::model_to_team(model))
                })
            })
            .await;
        flatten_transaction(res)
    }

    async fn get_team(&self, id: TeamId) -> Result<Team, RepoError> {
        team::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .map(Self::model_to_team)
            .ok_or(RepoError::NotFound)
    }

    async fn query_teams(&self, query: TeamQuery) -> Result<Page<Team>, RepoError> {
        let mut select = team::Entity::find().filter(team::Column::IsActive.eq(true));
        if let Some(term) = &query.search {
            select = select.filter(team::Column::Name.contains(term));
        }
        let total = select.clone().count(&self.db).await.map_err(storage_error)?;
        let items = window(
            select.order_by_desc(team::Column::CreatedAt),
            &query.pagination,
        )
        .all(&self.db)
        .await
        .map_err(storage_error)?
        .into_iter()
        .map(Self::model_to_team)
        .collect();
        Ok(Page { items, total })
    }

    async fn update_team(&self, id: TeamId, u: TeamUpdate) -> Result<Team, RepoError> {
        let existing = team::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(RepoError::NotFound)?;
        let mut model: team::ActiveModel = existing.into();
        if let Some(v) = u.name {
            model.name = Set(v);
        }
        if let Some(v) = u.description {
            model.description = Set(Some(v));
        }
        if let Some(v) = u.logo {
            model.logo = Set(Some(v));
        }
        if let Some(v) = u.max_members {
            model.max_members = Set(v);
        }
        if let Some(v) = u.is_active {
            model.is_active = Set(v);
        }
        model.updated_at = Set(Utc::now());
        let model = model.update(&self.db).await.map_err(storage_error)?;
        Ok(Self::model_to_team(model))
    }

    async fn find_membership(&self, user_id: UserId) -> Result<Option<TeamMember>, RepoError> {
        let model = team_member::Entity::find()
            .filter(team_member::Column::UserId.eq(user_id.0))
            .one(&self.db)
            .await
            .map_err(storage_error)?;
        match model {
            Some(model) => Ok(self.to_members(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_member(
        &self,
        id: TeamId,
        user_id: UserId,
    ) -> Result<Option<TeamMember>, RepoError> {
        let model = team_member::Entity::find_by_id((id.0, user_id.0))
            .one(&self.db)
            .await
            .map_err(storage_error)?;
        match model {
            Some(model) => Ok(self.to_members(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_members(&self, id: TeamId) -> Result<Vec<TeamMember>, RepoError> {
        let models = team_member::Entity::find()
            .filter(team_member::Column::TeamId.eq(id.0))
            .order_by_asc(team_member::Column::JoinedAt)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        let mut members = self.to_members(models).await?;
        // stable, so join order survives within each role
        members.sort_by_key(|m| m.role != TeamRole::Leader);
        Ok(members)
    }

    async fn count_members(&self, id: TeamId) -> Result<u64, RepoError> {
        team_member::Entity::find()
            .filter(team_member::Column::TeamId.eq(id.0))
            .count(&self.db)
            .await
            .map_err(storage_error)
    }

    async fn add_member(
        &self,
        id: TeamId,
        user_id: UserId,
        role: TeamRole,
    ) -> Result<TeamMember, RepoError> {
        let model = team_member::ActiveModel {
            team_id: Set(id.0),
            user_id: Set(user_id.0),
            role: Set(role.as_str().to_string()),
            joined_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(storage_error)?;
        self.to_members(vec![model])
            .await?
            .pop()
            .ok_or(RepoError::NotFound)
    }

    async fn remove_member(&self, id: TeamId, user_id: UserId) -> Result<(), RepoError> {
        let res = team_member::Entity::delete_by_id((id.0, user_id.0))
            .exec(&self.db)
            .await
            .map_err(storage_error)?;
        if res.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn transfer_leadership(
        &self,
        id: TeamId,
        from: UserId,
        to: UserId,
    ) -> Result<(), RepoError> {
        let res = self
            .db
            .transaction::<_, (), RepoError>(|c| {
                Box::pin(async move {
                    if team_member::Entity::find_by_id((id.0, to.0))
                        .one(c)
                        .await
                        .map_err(storage_error)?
                        .is_none()
                    {
                        return Err(RepoError::NotFound);
                    }
                    Self::set_role(c, id, from, TeamRole::Member).await?;
                    Self::set_role(c, id, to, TeamRole::Leader).await?;
                    Ok(())
                })
            })
            .await;
        flatten_transaction(res)
    }
}
