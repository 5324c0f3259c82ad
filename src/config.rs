use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the JSON document holding the full record collection,
    /// e.g. "./linklet.json". The special value ":memory:" selects an
    /// ephemeral in-process store.
    pub store_path: String,

    /// Host to bind the HTTP server to, e.g. "0.0.0.0"
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Public base URL used when deriving short URLs, e.g. "https://go.example.com"
    /// Must NOT have a trailing slash.
    pub base_url: String,
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse::<u16>()
            .context("PORT must be a valid port number (1–65535)")?;

        let base_url = std::env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_owned();

        Ok(Self {
            store_path: std::env::var("STORE_PATH").unwrap_or_else(|_| "./linklet.json".into()),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            base_url,
        })
    }
}
