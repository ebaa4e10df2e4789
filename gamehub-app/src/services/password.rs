pub fn hash_password(password: &str) -> Result<String, String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| e.to_string())
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(valid) => valid,
        Err(e) => {
            log::warn!("Failed to verify password hash: {}", e);
            false
        }
    }
}
