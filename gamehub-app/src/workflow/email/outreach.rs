use std::sync::Arc;

use crate::{
    domain::{
        mail::{self, MailContent, TournamentInvitation},
        permission::{Capability, authorize},
        user::User,
    },
    ports::email::EmailPort,
    workflow::email::EmailError,
};

const SAMPLE_USERNAME: &str = "Test User";

/// Which account email to render for a test send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestTemplate {
    Welcome,
    Verification,
    PasswordReset,
    Plain,
}

impl TestTemplate {
    pub fn parse(s: &str) -> Self {
        match s {
            "welcome" => TestTemplate::Welcome,
            "verification" => TestTemplate::Verification,
            "password-reset" => TestTemplate::PasswordReset,
            _ => TestTemplate::Plain,
        }
    }
}

#[async_trait::async_trait]
pub trait OutreachUseCase {
    /// `Ok(false)` when the relay refuses the configured credentials.
    async fn test_config(&self, actor: &User) -> Result<bool, EmailError>;
    async fn test_send(
        &self,
        actor: &User,
        to: &str,
        template: TestTemplate,
    ) -> Result<(), EmailError>;
    async fn send_tournament_invitation(
        &self,
        actor: &User,
        email: &str,
        username: &str,
        invitation: TournamentInvitation,
    ) -> Result<(), EmailError>;
}

pub struct OutreachUseCaseImpl<E: EmailPort> {
    email_port: Arc<E>,
    frontend_url: String,
}

impl<E: EmailPort> OutreachUseCaseImpl<E> {
    pub fn new(email_port: Arc<E>, frontend_url: String) -> Self {
        Self {
            email_port,
            frontend_url,
        }
    }

    fn deliver(&self, to: &str, mail: MailContent, what: &'static str) -> Result<(), EmailError> {
        self.email_port
            .send_email(to, &mail.subject, &mail.body)
            .map_err(|e| {
                log::error!("Failed to send {} to {}: {}", what, to, e);
                EmailError::SendFailed(what)
            })
    }
}

#[async_trait::async_trait]
impl<E: EmailPort + Send + Sync + 'static> OutreachUseCase for OutreachUseCaseImpl<E> {
    async fn test_config(&self, actor: &User) -> Result<bool, EmailError> {
        authorize(actor, &Capability::AdministerEmail)?;
        match self.email_port.test_connection() {
            Ok(valid) => Ok(valid),
            Err(e) => {
                log::warn!("Email relay check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn test_send(
        &self,
        actor: &User,
        to: &str,
        template: TestTemplate,
    ) -> Result<(), EmailError> {
        authorize(actor, &Capability::AdministerEmail)?;
        if to.trim().is_empty() {
            return Err(EmailError::MissingRecipient);
        }
        let mail = match template {
            TestTemplate::Welcome => mail::welcome(SAMPLE_USERNAME, &self.frontend_url),
            TestTemplate::Verification => {
                mail::verification(SAMPLE_USERNAME, "123456", &self.frontend_url)
            }
            TestTemplate::PasswordReset => {
                mail::password_reset(SAMPLE_USERNAME, "sample-token", &self.frontend_url)
            }
            TestTemplate::Plain => mail::test_message(),
        };
        let mail = MailContent {
            subject: format!("[Test] {}", mail.subject),
            ..mail
        };
        self.deliver(to, mail, "test email")
    }

    async fn send_tournament_invitation(
        &self,
        actor: &User,
        email: &str,
        username: &str,
        invitation: TournamentInvitation,
    ) -> Result<(), EmailError> {
        authorize(actor, &Capability::SendInvitations)?;
        if email.trim().is_empty()
            || username.trim().is_empty()
            || invitation.tournament_name.trim().is_empty()
        {
            return Err(EmailError::MissingInvitationFields);
        }
        let mail = mail::tournament_invitation(username, &invitation, &self.frontend_url);
        self.deliver(email, mail, "tournament invitation")?;
        log::info!("Tournament invitation sent to {} by {}", email, actor.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{permission::AccessDenied, user::Role},
        testing::{InMemoryStore, RecordingEmail},
    };

    const FRONTEND: &str = "https://gamehub.test";

    #[tokio::test]
    async fn test_admin_tools() {
        let store = InMemoryStore::new();
        let admin = store.seed_user("admin", Role::Admin, 0);
        let moderator = store.seed_user("mod", Role::Moderator, 0);
        let email = RecordingEmail::new();
        let use_case = OutreachUseCaseImpl::new(email.clone(), FRONTEND.to_string());

        assert!(use_case.test_config(&admin).await.unwrap());
        let denied = use_case.test_config(&moderator).await;
        assert!(matches!(
            denied,
            Err(EmailError::Access(AccessDenied::InsufficientPermissions))
        ));
        let missing = use_case.test_send(&admin, "", TestTemplate::Plain).await;
        assert!(matches!(missing, Err(EmailError::MissingRecipient)));

        use_case
            .test_send(&admin, "ops@example.com", TestTemplate::parse("welcome"))
            .await
            .unwrap();
        let sent = email.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.starts_with("[Test] Welcome to GameHub"));

        let failing = OutreachUseCaseImpl::new(RecordingEmail::failing(), FRONTEND.to_string());
        assert!(!failing.test_config(&admin).await.unwrap());
        let result = failing
            .test_send(&admin, "ops@example.com", TestTemplate::Plain)
            .await;
        assert_eq!(result.unwrap_err().to_string(), "Failed to send test email");
    }

    #[tokio::test]
    async fn test_invitation_requires_fields() {
        let store = InMemoryStore::new();
        let moderator = store.seed_user("mod", Role::Moderator, 0);
        let player = store.seed_user("player", Role::User, 0);
        let email = RecordingEmail::new();
        let use_case = OutreachUseCaseImpl::new(email.clone(), FRONTEND.to_string());
        let invitation = TournamentInvitation {
            tournament_name: "Spring Cup".to_string(),
            ..Default::default()
        };

        let denied = use_case
            .send_tournament_invitation(&player, "a@b.c", "ada", invitation.clone())
            .await;
        assert!(matches!(denied, Err(EmailError::Access(_))));
        let incomplete = use_case
            .send_tournament_invitation(&moderator, "a@b.c", "", invitation.clone())
            .await;
        assert!(matches!(incomplete, Err(EmailError::MissingInvitationFields)));

        use_case
            .send_tournament_invitation(&moderator, "a@b.c", "ada", invitation)
            .await
            .unwrap();
        assert_eq!(email.sent()[0].1, "You're Invited: Spring Cup");
    }
}
