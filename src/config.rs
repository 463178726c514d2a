use anyhow::Result;

/// Maximum length accepted for translatable text, in characters.
pub const MAX_TEXT_LENGTH: usize = 5000;

/// Hard cap on the number of texts in a single batch request.
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_path: String,

    // Translate backend. When no URL is configured the placeholder tag
    // backend is used instead of a real provider.
    pub backend_url: Option<String>,
    pub backend_api_key: Option<String>,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/translations.db".to_string()),

            backend_url: std::env::var("TRANSLATE_BACKEND_URL").ok(),
            backend_api_key: std::env::var("TRANSLATE_BACKEND_API_KEY").ok(),

            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }
}
