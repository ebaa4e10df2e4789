use chrono::Utc;
use gamehub_app::domain::{
    Page, RepoError, TournamentId, UserId,
    tournament::{
        NewTournament, Tournament, TournamentFormat, TournamentParticipant, TournamentQuery,
        TournamentRepository, TournamentStatus, TournamentUpdate,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, prelude::Expr,
};

use crate::{
    create_db_pool, decode,
    entity::{r#match, tournament, tournament_participant},
    flatten_transaction, storage_error, usernames, window,
};

pub struct TournamentRepositoryImpl {
    db: DatabaseConnection,
}

impl TournamentRepositoryImpl {
    pub async fn new() -> Self {
        let db = create_db_pool().await;
        Self { db }
    }

    pub fn with_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_tournament(model: tournament::Model) -> Result<Tournament, RepoError> {
        Ok(Tournament {
            id: TournamentId(model.id),
            title: model.title,
            description: model.description,
            rules: model.rules,
            game: model.game,
            format: decode(&model.format, TournamentFormat::parse)?,
            max_participants: model.max_participants,
            entry_fee: model.entry_fee,
            prize_pool: model.prize_pool,
            status: decode(&model.status, TournamentStatus::parse)?,
            start_date: model.start_date,
            end_date: model.end_date,
            banner: model.banner,
            created_by: UserId(model.created_by),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[async_trait::async_trait]
impl TournamentRepository for TournamentRepositoryImpl {
    async fn create_tournament(&self, t: NewTournament) -> Result<Tournament, RepoError> {
        let now = Utc::now();
        let model = tournament::ActiveModel {
            id: Set(TournamentId::new().0),
            title: Set(t.title),
            description: Set(t.description),
            rules: Set(t.rules),
            game: Set(t.game),
            format: Set(t.format.as_str().to_string()),
            max_participants: Set(t.max_participants),
            entry_fee: Set(t.entry_fee),
            prize_pool: Set(t.prize_pool),
            status: Set(TournamentStatus::Upcoming.as_str().to_string()),
            start_date: Set(t.start_date),
            end_date: Set(t.end_date),
            banner: Set(None),
            created_by: Set(t.created_by.0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(storage_error)?;
        Self::model_to_tournament(model)
    }

    async fn get_tournament(&self, id: TournamentId) -> Result<Tournament, RepoError> {
        let model = tournament::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(RepoError::NotFound)?;
        Self::model_to_tournament(model)
    }

    async fn query_tournaments(
        &self,
        query: TournamentQuery,
    ) -> Result<Page<Tournament>, RepoError> {
        let mut select = tournament::Entity::find();
        if let Some(status) = query.status {
            select = select.filter(tournament::Column::Status.eq(status.as_str()));
        }
        if let Some(game) = &query.game {
            select = select.filter(tournament::Column::Game.contains(game));
        }
        let total = select.clone().count(&self.db).await.map_err(storage_error)?;
        let models = window(
            select.order_by_asc(tournament::Column::StartDate),
            &query.pagination,
        )
        .all(&self.db)
        .await
        .map_err(storage_error)?;
        let items = models
            .into_iter()
            .map(Self::model_to_tournament)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total })
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        u: TournamentUpdate,
    ) -> Result<Tournament, RepoError> {
        let existing = tournament::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(RepoError::NotFound)?;
        let mut model: tournament::ActiveModel = existing.into();
        if let Some(v) = u.title {
            model.title = Set(v);
        }
        if let Some(v) = u.description {
            model.description = Set(Some(v));
        }
        if let Some(v) = u.rules {
            model.rules = Set(Some(v));
        }
        if let Some(v) = u.game {
            model.game = Set(v);
        }
        if let Some(v) = u.format {
            model.format = Set(v.as_str().to_string());
        }
        if let Some(v) = u.max_participants {
            model.max_participants = Set(v);
        }
        if let Some(v) = u.entry_fee {
            model.entry_fee = Set(v);
        }
        if let Some(v) = u.prize_pool {
            model.prize_pool = Set(v);
        }
        if let Some(v) = u.status {
            model.status = Set(v.as_str().to_string());
        }
        if let Some(v) = u.start_date {
            model.start_date = Set(v);
        }
        if let Some(v) = u.end_date {
            model.end_date = Set(Some(v));
        }
        if let Some(v) = u.banner {
            model.banner = Set(Some(v));
        }
        model.updated_at = Set(Utc::now());
        let model = model.update(&self.db).await.map_err(storage_error)?;
        Self::model_to_tournament(model)
    }

    async fn delete_tournament(&self, id: TournamentId) -> Result<(), RepoError> {
        let res = self
            .db
            .transaction::<_, (), RepoError>(|c| {
                Box::pin(async move {
                    if tournament::Entity::find_by_id(id.0)
                        .one(c)
                        .await
                        .map_err(storage_error)?
                        .is_none()
                    {
                        return Err(RepoError::NotFound);
                    }
                    tournament_participant::Entity::delete_many()
                        .filter(tournament_participant::Column::TournamentId.eq(id.0))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    r#match::Entity::update_many()
                        .col_expr(
                            r#match::Column::TournamentId,
                            Expr::value(Option::<uuid::Uuid>::None),
                        )
                        .filter(r#match::Column::TournamentId.eq(id.0))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    tournament::Entity::delete_by_id(id.0)
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    Ok(())
                })
            })
            .await;
        flatten_transaction(res)
    }

    async fn count_participants(&self, id: TournamentId) -> Result<u64, RepoError> {
        tournament_participant::Entity::find()
            .filter(tournament_participant::Column::TournamentId.eq(id.0))
            .count(&self.db)
            .await
            .map_err(storage_error)
    }

    async fn add_participant(
        &self,
        id: TournamentId,
        user_id: UserId,
    ) -> Result<TournamentParticipant, RepoError> {
        let model = tournament_participant::ActiveModel {
            tournament_id: Set(id.0),
            user_id: Set(user_id.0),
            registered_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(storage_error)?;
        let mut names = usernames(&self.db, vec![user_id.0]).await?;
        Ok(TournamentParticipant {
            tournament_id: id,
            user_id,
            username: names.remove(&user_id.0).unwrap_or_default(),
            registered_at: model.registered_at,
        })
    }

    async fn remove_participant(
        &self,
        id: TournamentId,
        user_id: UserId,
    ) -> Result<(), RepoError> {
        let res = tournament_participant::Entity::delete_many()
            .filter(tournament_participant::Column::TournamentId.eq(id.0))
            .filter(tournament_participant::Column::UserId.eq(user_id.0))
            .exec(&self.db)
            .await
            .map_err(storage_error)?;
        if res.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn list_participants(
        &self,
        id: TournamentId,
    ) -> Result<Vec<TournamentParticipant>, RepoError> {
        let models = tournament_participant::Entity::find()
            .filter(tournament_participant::Column::TournamentId.eq(id.0))
            .order_by_asc(tournament_participant::Column::RegisteredAt)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        let mut names = usernames(&self.db, models.iter().map(|m| m.user_id).collect()).await?;
        Ok(models
            .into_iter()
            .map(|m| TournamentParticipant {
                tournament_id: id,
                user_id: UserId(m.user_id),
                username: names.remove(&m.user_id).unwrap_or_default(),
                registered_at: m.registered_at,
            })
            .collect())
    }
}
