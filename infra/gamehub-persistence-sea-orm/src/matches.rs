use chrono::Utc;
use gamehub_app::domain::{
    MatchId, Page, RepoError, TournamentId, UserId,
    r#match::{
        CompleteMatchError, Match, MatchParticipant, MatchQuery, MatchRepository, MatchResult, MatchStatus,
        MatchUpdate, NewMatch, ParticipantOutcome,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ExprTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait, prelude::Expr,
};

use crate::{
    create_db_pool, decode,
    entity::{r#match, match_participant, user},
    flatten_transaction, from_json, storage_error, to_json, usernames, window,
};

pub struct MatchRepositoryImpl {
    db: DatabaseConnection,
}

impl MatchRepositoryImpl {
    pub async fn new() -> Self {
        let db = create_db_pool().await;
        Self { db }
    }

    pub fn with_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_match(model: r#match::Model) -> Result<Match, RepoError> {
        Ok(Match {
            id: MatchId(model.id),
            title: model.title,
            tournament_id: model.tournament_id.map(TournamentId),
            game: model.game,
            round: model.round,
            status: decode(&model.status, MatchStatus::parse)?,
            scheduled_at: model.scheduled_at,
            started_at: model.started_at,
            ended_at: model.ended_at,
            result: model.result.map(from_json::<MatchResult>).transpose()?,
            screenshots: from_json(model.screenshots)?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    fn models_to_matches(models: Vec<r#match::Model>) -> Result<Vec<Match>, RepoError> {
        models.into_iter().map(Self::model_to_match).collect()
    }
}

#[async_trait::async_trait]
impl MatchRepository for MatchRepositoryImpl {
    async fn create_match(
        &self,
        new_match: NewMatch,
        participants: Vec<UserId>,
    ) -> Result<Match, RepoError> {
        let res = self
            .db
            .transaction::<_, Match, RepoError>(|c| {
                Box::pin(async move {
                    let now = Utc::now();
                    let model = r#match::ActiveModel {
                        id: Set(MatchId::new().0),
                        title: Set(new_match.title),
                        tournament_id: Set(new_match.tournament_id.map(|t| t.0)),
                        game: Set(new_match.game),
                        round: Set(new_match.round),
                        status: Set(MatchStatus::Scheduled.as_str().to_string()),
                        scheduled_at: Set(new_match.scheduled_at),
                        started_at: Set(None),
                        ended_at: Set(None),
                        result: Set(None),
                        screenshots: Set(serde_json::json!([])),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(c)
                    .await
                    .map_err(storage_error)?;

                    for (i, user_id) in participants.into_iter().enumerate() {
                        match_participant::ActiveModel {
                            match_id: Set(model.id),
                            user_id: Set(user_id.0),
                            score: Set(None),
                            position: Set(Some(i as i32 + 1)),
                        }
                        .insert(c)
                        .await
                        .map_err(storage_error)?;
                    }
                    Self::model_to_match(model)
                })
            })
            .await;
        flatten_transaction(res)
    }

    async fn get_match(&self, id: MatchId) -> Result<Match, RepoError> {
        let model = r#match::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(RepoError::NotFound)?;
        Self::model_to_match(model)
    }

    async fn query_matches(&self, query: MatchQuery) -> Result<Page<Match>, RepoError> {
        let mut select = r#match::Entity::find();
        if let Some(status) = query.status {
            select = select.filter(r#match::Column::Status.eq(status.as_str()));
        }
        if let Some(game) = &query.game {
            select = select.filter(r#match::Column::Game.contains(game));
        }
        if let Some(tournament_id) = query.tournament_id {
            select = select.filter(r#match::Column::TournamentId.eq(tournament_id.0));
        }
        let total = select.clone().count(&self.db).await.map_err(storage_error)?;
        let models = window(
            select.order_by_desc(r#match::Column::ScheduledAt),
            &query.pagination,
        )
        .all(&self.db)
        .await
        .map_err(storage_error)?;
        Ok(Page {
            items: Self::models_to_matches(models)?,
            total,
        })
    }

    async fn list_tournament_matches(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<Match>, RepoError> {
        let models = r#match::Entity::find()
            .filter(r#match::Column::TournamentId.eq(tournament_id.0))
            .order_by_asc(r#match::Column::Round)
            .order_by_asc(r#match::Column::ScheduledAt)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        Self::models_to_matches(models)
    }

    async fn update_match(&self, id: MatchId, u: MatchUpdate) -> Result<Match, RepoError> {
        let existing = r#match::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(RepoError::NotFound)?;
        let mut model: r#match::ActiveModel = existing.into();
        if let Some(v) = u.title {
            model.title = Set(v);
        }
        if let Some(v) = u.game {
            model.game = Set(v);
        }
        if let Some(v) = u.round {
            model.round = Set(Some(v));
        }
        if let Some(v) = u.status {
            model.status = Set(v.as_str().to_string());
        }
        if let Some(v) = u.scheduled_at {
            model.scheduled_at = Set(Some(v));
        }
        if let Some(v) = u.started_at {
            model.started_at = Set(Some(v));
        }
        if let Some(v) = u.ended_at {
            model.ended_at = Set(Some(v));
        }
        if let Some(v) = u.screenshots {
            model.screenshots = Set(to_json(&v)?);
        }
        model.updated_at = Set(Utc::now());
        let model = model.update(&self.db).await.map_err(storage_error)?;
        Self::model_to_match(model)
    }

    async fn delete_match(&self, id: MatchId) -> Result<(), RepoError> {
        let res = self
            .db
            .transaction::<_, (), RepoError>(|c| {
                Box::pin(async move {
                    match_participant::Entity::delete_many()
                        .filter(match_participant::Column::MatchId.eq(id.0))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    let res = r#match::Entity::delete_by_id(id.0)
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    if res.rows_affected == 0 {
                        return Err(RepoError::NotFound);
                    }
                    Ok(())
                })
            })
            .await;
        flatten_transaction(res)
    }

    async fn list_participants(&self, id: MatchId) -> Result<Vec<MatchParticipant>, RepoError> {
        let models = match_participant::Entity::find()
            .filter(match_participant::Column::MatchId.eq(id.0))
            .order_by_asc(match_participant::Column::Position)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        let mut names = usernames(&self.db, models.iter().map(|m| m.user_id).collect()).await?;
        Ok(models
            .into_iter()
            .map(|m| MatchParticipant {
                match_id: id,
                user_id: UserId(m.user_id),
                username: names.remove(&m.user_id).unwrap_or_default(),
                score: m.score,
                position: m.position,
            })
            .collect())
    }

    async fn complete_match(
        &self,
        id: MatchId,
        result: MatchResult,
        outcomes: Vec<ParticipantOutcome>,
    ) -> Result<Match, CompleteMatchError> {
        let res = self
            .db
            .transaction::<_, Match, CompleteMatchError>(|c| {
                Box::pin(async move {
                    let existing = r#match::Entity::find_by_id(id.0)
                        .one(c)
                        .await
                        .map_err(storage_error)?
                        .ok_or(RepoError::NotFound)?;
                    let status = decode(&existing.status, MatchStatus::parse)?;
                    if status.is_terminal() {
                        return Err(CompleteMatchError::AlreadyFinished(status));
                    }

                    let now = Utc::now();
                    let res = r#match::Entity::update_many()
                        .col_expr(
                            r#match::Column::Status,
                            Expr::value(MatchStatus::Completed.as_str()),
                        )
                        .col_expr(r#match::Column::EndedAt, Expr::value(Some(now)))
                        .col_expr(r#match::Column::Result, Expr::value(Some(to_json(&result)?)))
                        .col_expr(r#match::Column::UpdatedAt, Expr::value(now))
                        .filter(r#match::Column::Id.eq(id.0))
                        .filter(r#match::Column::Status.eq(status.as_str()))
                        .exec(c)
                        .await
                        .map_err(storage_error)?;
                    if res.rows_affected == 0 {
                        return Err(CompleteMatchError::AlreadyFinished(MatchStatus::Completed));
                    }

                    for outcome in outcomes.iter() {
                        let participant =
                            match_participant::Entity::find_by_id((id.0, outcome.user_id.0))
                                .one(c)
                                .await
                                .map_err(storage_error)?
                                .ok_or(RepoError::NotFound)?;
                        let mut participant: match_participant::ActiveModel = participant.into();
                        participant.score = Set(Some(outcome.score));
                        participant.position = Set(Some(outcome.position));
                        participant.update(c).await.map_err(storage_error)?;

                        user::Entity::update_many()
                            .col_expr(
                                user::Column::Experience,
                                Expr::col(user::Column::Experience).add(outcome.experience),
                            )
                            .filter(user::Column::Id.eq(outcome.user_id.0))
                            .exec(c)
                            .await
                            .map_err(storage_error)?;
                    }

                    let model = r#match::Entity::find_by_id(id.0)
                        .one(c)
                        .await
                        .map_err(storage_error)?
                        .ok_or(RepoError::NotFound)?;
                    Ok(Self::model_to_match(model)?)
                })
            })
            .await;
        flatten_transaction(res)
    }
}
