//! Plain-text bodies for the account and tournament emails.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailContent {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Default)]
pub struct TournamentInvitation {
    pub tournament_name: String,
    pub game: Option<String>,
    pub start_date: Option<String>,
    pub entry_fee: Option<i64>,
    pub prize_pool: Option<i64>,
    pub max_participants: Option<i32>,
}

pub fn verification(username: &str, code: &str, frontend_url: &str) -> MailContent {
    MailContent {
        subject: "Verify your GameHub account".to_string(),
        body: format!(
            "Hello {},\n\n\
            Thank you for joining GameHub! Use this verification code in the app:\n\n\
            {}\n\n\
            You can also verify here: {}/verify-email?token={}\n\n\
            If you didn't create an account, please ignore this email.\n\n\
            Best regards,\n\
            The GameHub Team",
            username, code, frontend_url, code
        ),
    }
}

pub fn password_reset(username: &str, token: &str, frontend_url: &str) -> MailContent {
    MailContent {
        subject: "Reset your GameHub password".to_string(),
        body: format!(
            "Hello {},\n\n\
            We received a request to reset your password. Open the link below to choose a new one:\n\
            {}/reset-password?token={}\n\n\
            The link expires in 30 minutes. If you didn't ask for a reset, you can ignore this email.\n\n\
            Best regards,\n\
            The GameHub Team",
            username, frontend_url, token
        ),
    }
}

pub fn welcome(username: &str, frontend_url: &str) -> MailContent {
    MailContent {
        subject: "Welcome to GameHub - Let the Games Begin!".to_string(),
        body: format!(
            "Hello {},\n\n\
            Your email has been verified. You can now join tournaments, create or join a team \
            and earn rewards.\n\n\
            Visit {} to start playing!\n\n\
            Best regards,\n\
            The GameHub Team",
            username, frontend_url
        ),
    }
}

pub fn tournament_invitation(
    username: &str,
    invitation: &TournamentInvitation,
    frontend_url: &str,
) -> MailContent {
    let mut details = String::new();
    if let Some(game) = &invitation.game {
        details.push_str(&format!("Game: {}\n", game));
    }
    if let Some(start_date) = &invitation.start_date {
        details.push_str(&format!("Start date: {}\n", start_date));
    }
    if let Some(entry_fee) = invitation.entry_fee {
        details.push_str(&format!("Entry fee: {} coins\n", entry_fee));
    }
    if let Some(prize_pool) = invitation.prize_pool {
        details.push_str(&format!("Prize pool: {} coins\n", prize_pool));
    }
    if let Some(max_participants) = invitation.max_participants {
        details.push_str(&format!("Max participants: {}\n", max_participants));
    }
    MailContent {
        subject: format!("You're Invited: {}", invitation.tournament_name),
        body: format!(
            "Hello {},\n\n\
            You've been invited to join the tournament {}.\n\n\
            {}\n\
            Sign up at {} before registration closes.\n\n\
            Best regards,\n\
            The GameHub Team",
            username, invitation.tournament_name, details, frontend_url
        ),
    }
}

pub fn test_message() -> MailContent {
    MailContent {
        subject: "GameHub email configuration test".to_string(),
        body: "This is a test email. If you can read it, the SMTP relay works.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_contains_code() {
        let mail = verification("alice", "123456", "https://gamehub.test");
        assert!(mail.body.contains("123456"));
        assert!(mail.body.contains("https://gamehub.test/verify-email?token=123456"));
    }

    #[test]
    fn test_invitation_lists_known_details() {
        let mail = tournament_invitation(
            "bob",
            &TournamentInvitation {
                tournament_name: "Spring Cup".to_string(),
                game: Some("Valorant".to_string()),
                entry_fee: Some(10),
                ..Default::default()
            },
            "https://gamehub.test",
        );
        assert_eq!(mail.subject, "You're Invited: Spring Cup");
        assert!(mail.body.contains("Game: Valorant"));
        assert!(mail.body.contains("Entry fee: 10 coins"));
        assert!(!mail.body.contains("Prize pool"));
    }
}
