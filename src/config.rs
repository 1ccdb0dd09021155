//! Runtime configuration loaded from the environment (and `.env` via dotenvy).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::export::BackendKind;

const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Groq chat-completions settings.
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Which converter renders each exported document kind, and where the binaries live.
#[derive(Debug, Clone)]
pub struct PdfConfig {
    pub lesson_plan_backend: BackendKind,
    pub creative_writing_backend: BackendKind,
    pub application_backend: BackendKind,
    pub wkhtmltopdf_bin: String,
    pub weasyprint_bin: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            lesson_plan_backend: BackendKind::WeasyPrint,
            creative_writing_backend: BackendKind::Wkhtmltopdf,
            application_backend: BackendKind::Wkhtmltopdf,
            wkhtmltopdf_bin: "wkhtmltopdf".to_string(),
            weasyprint_bin: "weasyprint".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on the in-memory store.
    pub database_url: Option<String>,
    pub groq: GroqConfig,
    pub public_base_url: String,
    pub static_dir: PathBuf,
    pub pdf: PdfConfig,
    pub creative_follow_up_separator: bool,
    pub wizard_session_ttl: Duration,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let groq = GroqConfig {
            api_key: required("GROQ_API_KEY")?,
            base_url: optional("GROQ_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
            model: optional("GROQ_MODEL").unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
            timeout: Duration::from_secs(parsed("GROQ_TIMEOUT_SECS", 60)?),
        };

        let defaults = PdfConfig::default();
        let pdf = PdfConfig {
            lesson_plan_backend: parsed("LESSON_PLAN_PDF_BACKEND", defaults.lesson_plan_backend)?,
            creative_writing_backend: parsed(
                "CREATIVE_WRITING_PDF_BACKEND",
                defaults.creative_writing_backend,
            )?,
            application_backend: parsed("APPLICATION_PDF_BACKEND", defaults.application_backend)?,
            wkhtmltopdf_bin: optional("WKHTMLTOPDF_BIN").unwrap_or(defaults.wkhtmltopdf_bin),
            weasyprint_bin: optional("WEASYPRINT_BIN").unwrap_or(defaults.weasyprint_bin),
        };

        let database_url = optional("DATABASE_URL");
        if database_url.is_none() {
            log::warn!("DATABASE_URL not set, records will only be kept in memory");
        }

        Ok(Self {
            host: optional("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed("SERVER_PORT", 8080)?,
            database_url,
            groq,
            public_base_url: optional("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8080".to_string()),
            static_dir: optional("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./static")),
            pdf,
            creative_follow_up_separator: parsed("CREATIVE_FOLLOW_UP_SEPARATOR", false)?,
            wizard_session_ttl: Duration::from_secs(parsed("WIZARD_SESSION_TTL_SECS", 3600)?),
            cors_allowed_origins: optional("CORS_ALLOWED_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_else(|| {
                    vec![
                        "http://localhost:5173".to_string(),
                        "http://localhost:3000".to_string(),
                        "http://127.0.0.1:8080".to_string(),
                    ]
                }),
        })
    }

    /// Absolute URL of the header logo embedded in exported documents.
    pub fn logo_url(&self) -> String {
        format!(
            "{}/static/core/images/header_logo.png",
            self.public_base_url.trim_end_matches('/')
        )
    }

    /// Configuration suitable for tests and local tooling; never reads the environment.
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: None,
            groq: GroqConfig {
                api_key: "test-key".to_string(),
                base_url: DEFAULT_GROQ_BASE_URL.to_string(),
                model: DEFAULT_GROQ_MODEL.to_string(),
                timeout: Duration::from_secs(5),
            },
            public_base_url: "http://localhost:8080".to_string(),
            static_dir: PathBuf::from("./static"),
            pdf: PdfConfig::default(),
            creative_follow_up_separator: false,
            wizard_session_ttl: Duration::from_secs(600),
            cors_allowed_origins: Vec::new(),
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_ignores_blanks() {
        let origins = split_list(" https://a.example , ,https://b.example,");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_logo_url_trims_trailing_slash() {
        let mut config = AppConfig::for_tests();
        config.public_base_url = "https://portal.example/".to_string();
        assert_eq!(
            config.logo_url(),
            "https://portal.example/static/core/images/header_logo.png"
        );
    }

    #[test]
    fn test_default_pdf_backends() {
        let pdf = PdfConfig::default();
        assert_eq!(pdf.lesson_plan_backend, BackendKind::WeasyPrint);
        assert_eq!(pdf.application_backend, BackendKind::Wkhtmltopdf);
    }
}
