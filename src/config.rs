use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PRIMARY_MODEL: &str = "gpt-4o-mini"; // ucuz, çoğu fotoğraf için yeterli
pub const DEFAULT_FALLBACK_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 1280;

/// Credential variables, checked in order.
const API_KEY_VARS: [&str; 2] = ["OPENAI_KEY", "OPENAI_API_KEY"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// None means analysis endpoints answer 503; the server still starts.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub primary_model: String,
    pub fallback_model: String,
    pub request_timeout: Duration,
    pub max_image_dimension: u32,
    pub max_request_bytes: usize,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let openai_api_key = API_KEY_VARS.iter().find_map(|key| non_empty(*key));

        let openai_base_url = non_empty("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let primary_model =
            non_empty("VISION_MODEL_PRIMARY").unwrap_or_else(|| DEFAULT_PRIMARY_MODEL.to_string());
        let fallback_model = non_empty("VISION_MODEL_FALLBACK")
            .unwrap_or_else(|| DEFAULT_FALLBACK_MODEL.to_string());

        let timeout_secs: u64 = parse_or(non_empty("OPENAI_TIMEOUT_SECS"), "OPENAI_TIMEOUT_SECS", 60)?;
        let max_image_dimension: u32 = parse_or(
            non_empty("MAX_IMAGE_DIMENSION"),
            "MAX_IMAGE_DIMENSION",
            DEFAULT_MAX_IMAGE_DIMENSION,
        )?;
        if max_image_dimension == 0 {
            return Err(ConfigError::InvalidValue {
                var: "MAX_IMAGE_DIMENSION",
                value: "0".to_string(),
            });
        }
        let max_request_bytes: usize = parse_or(
            non_empty("MAX_REQUEST_BYTES"),
            "MAX_REQUEST_BYTES",
            20 * 1024 * 1024,
        )?;

        let host = non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(non_empty("PORT"), "PORT", 8080)?;

        Ok(AppConfig {
            openai_api_key,
            openai_base_url,
            primary_model,
            fallback_model,
            request_timeout: Duration::from_secs(timeout_secs),
            max_image_dimension,
            max_request_bytes,
            host,
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        None => Ok(default),
    }
}
