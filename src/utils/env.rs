use log::debug;

/// Load `.env` into the process environment if one is present. Missing files
/// are fine; explicit environment always wins over file values.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(_) => debug!("No .env file found; using process environment only"),
    }
}
