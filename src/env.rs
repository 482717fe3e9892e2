use std::path::Path;

use tracing::{debug, info};

/// Loads optional env files before anything reads configuration. Missing
/// files are skipped; a later file overrides an earlier one.
pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    for env_file in ["config/common.env", ".env"] {
        if !Path::new(env_file).exists() {
            debug!("Environment file {} not found, skipping", env_file);
            continue;
        }

        dotenvy::from_filename_override(env_file)?;
        info!("Loaded environment from: {}", env_file);
    }

    Ok(())
}

/// Listening port, from the PORT variable, defaulting to 3000.
pub fn port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000)
}

/// SQLite database location, creating the file on first run.
pub fn database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:database.sqlite?mode=rwc".to_string())
}

/// Directory teacher images are written to and served from.
pub fn upload_dir() -> String {
    std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "public/uploads".to_string())
}
