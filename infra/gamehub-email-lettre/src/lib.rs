use std::str::FromStr;

use gamehub_app::ports::email::{EmailPort, SendEmailError};
use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

/// Sends the HTML mail bodies the app renders through an authenticated SMTP relay.
pub struct LettreEmailAdapter {
    transport: SmtpTransport,
    from: Mailbox,
}

impl LettreEmailAdapter {
    pub fn new() -> Self {
        let host =
            std::env::var("GAMEHUB_EMAIL_HOST").expect("GAMEHUB_EMAIL_HOST env var not set");
        let user =
            std::env::var("GAMEHUB_EMAIL_USER").expect("GAMEHUB_EMAIL_USER env var not set");
        let password = std::env::var("GAMEHUB_EMAIL_PASSWORD")
            .expect("GAMEHUB_EMAIL_PASSWORD env var not set");
        let from =
            std::env::var("GAMEHUB_EMAIL_FROM").expect("GAMEHUB_EMAIL_FROM env var not set");
        let from = parse_mailbox(&from).expect("Invalid GAMEHUB_EMAIL_FROM address");
        let transport = SmtpTransport::relay(&host)
            .expect("Failed to create SMTP transport")
            .credentials(Credentials::new(user, password))
            .build();
        Self { transport, from }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, SendEmailError> {
    Mailbox::from_str(address.trim()).map_err(|e| SendEmailError::InvalidToAddress(e.to_string()))
}

impl EmailPort for LettreEmailAdapter {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), SendEmailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(to)?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| SendEmailError::SendEmailError(e.to_string()))?;
        self.transport.send(&email).map_err(|e| {
            log::warn!("SMTP relay refused mail to {}: {}", to, e);
            SendEmailError::SendEmailError(e.to_string())
        })?;
        log::info!("Sent \"{}\" to {}", subject, to);
        Ok(())
    }

    fn test_connection(&self) -> Result<bool, SendEmailError> {
        self.transport
            .test_connection()
            .map_err(|e| SendEmailError::SendEmailError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mailbox() {
        assert!(parse_mailbox("GameHub <noreply@gamehub.example>").is_ok());
        assert!(parse_mailbox(" player@example.com ").is_ok());
        assert!(matches!(
            parse_mailbox("not-an-address"),
            Err(SendEmailError::InvalidToAddress(_))
        ));
    }
}
