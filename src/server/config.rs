use std::env;
use std::path::PathBuf;

#[derive(Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_address: String,
    /// Directory uploaded recipe images are written under; served at `/media`.
    pub media_root: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let media_root = env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));

        Ok(ServerConfig {
            database_url,
            bind_address,
            media_root,
        })
    }
}
