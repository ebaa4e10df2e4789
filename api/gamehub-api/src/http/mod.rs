use validator::ValidationError;

pub mod auth;
pub mod email;
pub mod health;
pub mod images;
pub mod matches;
pub mod notifications;
pub mod orders;
pub mod rewards;
pub mod teams;
pub mod tournaments;
pub mod transactions;
pub mod users;

const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// At least 8 characters mixing lower case, upper case, a digit and one of `@$!%*?&`.
pub(crate) fn password_rule(password: &str) -> Result<(), ValidationError> {
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c));
    let strong = password.len() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));
    if allowed && strong {
        Ok(())
    } else {
        Err(ValidationError::new("password").with_message(
            "Password must be at least 8 characters and contain uppercase, lowercase, number and special character".into(),
        ))
    }
}

pub(crate) fn username_rule(username: &str) -> Result<(), ValidationError> {
    if username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ValidationError::new("username")
            .with_message("Username can only contain letters, numbers and underscores".into()))
    }
}

pub(crate) fn team_name_rule(name: &str) -> Result<(), ValidationError> {
    if name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("name").with_message(
            "Team name can only contain letters, numbers, spaces, underscores and hyphens".into(),
        ))
    }
}

pub(crate) fn country_rule(country: &str) -> Result<(), ValidationError> {
    if country.len() == 2 && country.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(ValidationError::new("country").with_message("Country must be a 2 letter code".into()))
    }
}
