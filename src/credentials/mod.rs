/// Read a secret from the environment variable `var`.
/// Returns Some(value) if the env var is set and non-empty after trimming, None otherwise.
pub fn token_from_env(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(val) => {
            let trimmed = val.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}
