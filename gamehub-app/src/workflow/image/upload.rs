use std::sync::Arc;

use crate::{
    domain::{
        MatchId, TeamId, TournamentId,
        r#match::{MatchRepository, MatchUpdate},
        permission::{AccessDenied, Capability, PermissionPolicy, authorize},
        team::{Team, TeamRepository, TeamRole, TeamUpdate},
        tournament::{Tournament, TournamentRepository, TournamentUpdate},
        user::User,
    },
    ports::image_storage::{
        ImageFolder, ImageStorageError, ImageStoragePort, ImageTransform, ImageUpload, StoredImage,
    },
    workflow::image::{ImageError, MAX_SCREENSHOTS, OptimizedUrls, UploadedImage},
};

const BANNER_BASE: (u32, u32) = (300, 150);
const SCREENSHOT_BASE: (u32, u32) = (300, 169);

#[async_trait::async_trait]
pub trait ImageUseCase {
    /// Replaces the team's logo and drops the previous file. Leader only.
    async fn upload_team_logo(
        &self,
        actor: &User,
        team_id: TeamId,
        upload: ImageUpload,
    ) -> Result<(Team, StoredImage), ImageError>;
    async fn upload_tournament_banner(
        &self,
        actor: &User,
        tournament_id: TournamentId,
        upload: ImageUpload,
    ) -> Result<(Tournament, UploadedImage), ImageError>;
    /// Appends to the match's screenshots; participants and staff only.
    async fn upload_match_screenshots(
        &self,
        actor: &User,
        match_id: MatchId,
        uploads: Vec<ImageUpload>,
    ) -> Result<Vec<UploadedImage>, ImageError>;
    async fn delete_image(&self, actor: &User, public_id: &str) -> Result<(), ImageError>;
    fn transform_url(
        &self,
        public_id: &str,
        transform: &ImageTransform,
    ) -> Result<String, ImageError>;
}

pub struct ImageUseCaseImpl<
    I: ImageStoragePort,
    T: TeamRepository,
    R: TournamentRepository,
    M: MatchRepository,
> {
    image_storage: Arc<I>,
    team_repository: Arc<T>,
    tournament_repository: Arc<R>,
    match_repository: Arc<M>,
}

impl<I: ImageStoragePort, T: TeamRepository, R: TournamentRepository, M: MatchRepository>
    ImageUseCaseImpl<I, T, R, M>
{
    pub fn new(
        image_storage: Arc<I>,
        team_repository: Arc<T>,
        tournament_repository: Arc<R>,
        match_repository: Arc<M>,
    ) -> Self {
        Self {
            image_storage,
            team_repository,
            tournament_repository,
            match_repository,
        }
    }

    async fn store(
        &self,
        folder: ImageFolder,
        upload: ImageUpload,
        what: &'static str,
    ) -> Result<StoredImage, ImageError> {
        let extension = upload.validate()?;
        self.image_storage
            .upload(folder, upload.data, extension)
            .await
            .map_err(|e| {
                log::error!("Failed to store {}: {}", what.to_lowercase(), e);
                ImageError::UploadFailed(what)
            })
    }

    async fn discard(&self, url: &str) {
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
    I: ImageStoragePort + Send + Sync + 'static,
    T: TeamRepository + Send + Sync + 'static,
    R: TournamentRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
> ImageUseCase for ImageUseCaseImpl<I, T, R, M>
{
    async fn upload_team_logo(
        &self,
        actor: &User,
        team_id: TeamId,
        upload: ImageUpload,
    ) -> Result<(Team, StoredImage), ImageError> {
        let membership = self
            .team_repository
            .get_member(team_id, actor.id)
            .await
            .map_err(|e| ImageError::from_repo(e, "Team"))?;
        if membership.is_none_or(|m| m.role != TeamRole::Leader) {
            return Err(ImageError::NotTeamLeader);
        }
        let current = self
            .team_repository
            .get_team(team_id)
            .await
            .map_err(|e| ImageError::from_repo(e, "Team"))?;

        let stored = self.store(ImageFolder::Teams, upload, "Team logo").await?;
        if let Some(previous) = &current.logo {
            self.discard(previous).await;
        }
        let team = self
            .team_repository
            .update_team(
                team_id,
                TeamUpdate {
                    logo: Some(stored.url.clone()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| ImageError::from_repo(e, "Team"))?;
        Ok((team, stored))
    }

    async fn upload_tournament_banner(
        &self,
        actor: &User,
        tournament_id: TournamentId,
        upload: ImageUpload,
    ) -> Result<(Tournament, UploadedImage), ImageError> {
        authorize(actor, &Capability::ManageTournaments)?;
        let current = self
            .tournament_repository
            .get_tournament(tournament_id)
            .await
            .map_err(|e| ImageError::from_repo(e, "Tournament"))?;

        let stored = self
            .store(ImageFolder::Tournaments, upload, "Tournament banner")
            .await?;
        if let Some(previous) = &current.banner {
            self.discard(previous).await;
        }
        let tournament = self
            .tournament_repository
            .update_tournament(
                tournament_id,
                TournamentUpdate {
                    banner: Some(stored.url.clone()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| ImageError::from_repo(e, "Tournament"))?;
        let optimized_urls =
            OptimizedUrls::build(self.image_storage.as_ref(), &stored.public_id, BANNER_BASE);
        Ok((
            tournament,
            UploadedImage {
                image: stored,
                optimized_urls,
            },
        ))
    }

    async fn upload_match_screenshots(
        &self,
        actor: &User,
        match_id: MatchId,
        uploads: Vec<ImageUpload>,
    ) -> Result<Vec<UploadedImage>, ImageError> {
        if uploads.is_empty() {
            return Err(ImageError::NoFile);
        }
        if uploads.len() > MAX_SCREENSHOTS {
            return Err(ImageError::TooManyFiles);
        }
        if !actor.is_active {
            return Err(AccessDenied::AccountInactive.into());
        }
        let current = self
            .match_repository
            .get_match(match_id)
            .await
            .map_err(|e| ImageError::from_repo(e, "Match"))?;
        let plays = self
            .match_repository
            .list_participants(match_id)
            .await
            .map_err(|e| ImageError::from_repo(e, "Match"))?
            .iter()
            .any(|p| p.user_id == actor.id);
        if !plays && !Capability::ManageMatches.allows(actor.role) {
            return Err(ImageError::NotMatchParticipant);
        }
        for upload in uploads.iter() {
            upload.validate()?;
        }

        let mut uploaded = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let stored = self
                .store(ImageFolder::Screenshots, upload, "Screenshot")
                .await?;
            let optimized_urls = OptimizedUrls::build(
                self.image_storage.as_ref(),
                &stored.public_id,
                SCREENSHOT_BASE,
            );
            uploaded.push(UploadedImage {
                image: stored,
                optimized_urls,
            });
        }

        let mut screenshots = current.screenshots;
        screenshots.extend(uploaded.iter().map(|u| u.image.url.clone()));
        self.match_repository
            .update_match(
                match_id,
                MatchUpdate {
                    screenshots: Some(screenshots),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| ImageError::from_repo(e, "Match"))?;
        Ok(uploaded)
    }

    async fn delete_image(&self, actor: &User, public_id: &str) -> Result<(), ImageError> {
        if public_id.trim().is_empty() {
            return Err(ImageError::MissingPublicId);
        }
        match self.image_storage.delete(public_id).await {
            Ok(()) => {
                log::info!("Image {} deleted by {}", public_id, actor.id);
                Ok(())
            }
            Err(ImageStorageError::NotFound) => Err(ImageError::ImageNotFound),
            Err(e) => {
                log::error!("Failed to delete image {}: {}", public_id, e);
                Err(ImageError::DeleteFailed)
            }
        }
    }

    fn transform_url(
        &self,
        public_id: &str,
        transform: &ImageTransform,
    ) -> Result<String, ImageError> {
        if public_id.trim().is_empty() {
            return Err(ImageError::MissingPublicId);
        }
        Ok(self.image_storage.url_for(public_id, transform))
    }
}
