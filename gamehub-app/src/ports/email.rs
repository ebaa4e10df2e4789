pub trait EmailPort {
    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), SendEmailError>;
    /// Checks that the relay accepts a connection with the configured credentials.
    fn test_connection(&self) -> Result<bool, SendEmailError>;
}

#[derive(Debug, Clone)]
pub enum SendEmailError {
    InvalidToAddress(String),
    SendEmailError(String),
}

impl std::fmt::Display for SendEmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendEmailError::InvalidToAddress(e) => write!(f, "Invalid recipient: {}", e),
            SendEmailError::SendEmailError(e) => write!(f, "Failed to send email: {}", e),
        }
    }
}
