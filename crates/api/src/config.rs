use std::path::PathBuf;
use std::str::FromStr;

use folio_core::imaging::{
    ImageConfig, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_BYTES, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH,
};
use folio_core::seo::SiteInfo;

use crate::auth::jwt::{JwtConfig, DEFAULT_ACCESS_EXPIRY_MINS};

/// Default number of items per public listing page.
const DEFAULT_PAGE_SIZE: i64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Where uploaded images live and how they are normalized.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Root directory of stored assets, served under `/media`.
    pub root: PathBuf,
    pub image: ImageConfig,
}

/// Admin account created at startup when the user table is empty.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Server configuration loaded from environment variables.
///
/// Everything except `JWT_SECRET` has a default suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
    pub site: SiteInfo,
    /// Default page size of public listings.
    pub page_size: i64,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only enable behind a reverse proxy that sets them.
    pub trust_proxy_headers: bool,
    pub admin: Option<AdminBootstrap>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `HOST`                   | `0.0.0.0`               |
    /// | `PORT`                   | `3000`                  |
    /// | `CORS_ORIGINS`           | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                    |
    /// | `JWT_SECRET`             | required                |
    /// | `JWT_ACCESS_EXPIRY_MINS` | `60`                    |
    /// | `MEDIA_ROOT`             | `storage/media`         |
    /// | `UPLOAD_MAX_BYTES`       | `5242880`               |
    /// | `IMAGE_MAX_WIDTH`        | `1200`                  |
    /// | `IMAGE_MAX_HEIGHT`       | `800`                   |
    /// | `IMAGE_JPEG_QUALITY`     | `85`                    |
    /// | `SITE_BASE_URL`          | `http://localhost:3000` |
    /// | `SITE_NAME`              | `folio`                 |
    /// | `SITE_TAGLINE`           | empty                   |
    /// | `PAGE_SIZE`              | `5`                     |
    /// | `TRUST_PROXY_HEADERS`    | `false`                 |
    /// | `ADMIN_USERNAME`, `ADMIN_EMAIL`, `ADMIN_PASSWORD` | unset |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let cors_origins = env
            .string("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let secret = env.get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let jwt = JwtConfig {
            secret,
            access_token_expiry_mins: env
                .parsed("JWT_ACCESS_EXPIRY_MINS", DEFAULT_ACCESS_EXPIRY_MINS)?,
        };

        let image = ImageConfig {
            max_bytes: env.parsed("UPLOAD_MAX_BYTES", DEFAULT_MAX_BYTES)?,
            max_width: env.parsed("IMAGE_MAX_WIDTH", DEFAULT_MAX_WIDTH)?,
            max_height: env.parsed("IMAGE_MAX_HEIGHT", DEFAULT_MAX_HEIGHT)?,
            jpeg_quality: env.parsed("IMAGE_JPEG_QUALITY", DEFAULT_JPEG_QUALITY)?,
        };
        if image.max_width == 0 || image.max_height == 0 {
            return Err(ConfigError::Invalid {
                key: "IMAGE_MAX_WIDTH",
                value: format!("{}x{}", image.max_width, image.max_height),
                reason: "image bounds must be positive".into(),
            });
        }
        if !(1..=100).contains(&image.jpeg_quality) {
            return Err(ConfigError::Invalid {
                key: "IMAGE_JPEG_QUALITY",
                value: image.jpeg_quality.to_string(),
                reason: "must be between 1 and 100".into(),
            });
        }

        let site = SiteInfo::new(
            &env.string("SITE_BASE_URL", "http://localhost:3000"),
            &env.string("SITE_NAME", "folio"),
            &env.string("SITE_TAGLINE", ""),
        );

        let admin = match (
            env.get("ADMIN_USERNAME"),
            env.get("ADMIN_EMAIL"),
            env.get("ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(email), Some(password)) => Some(AdminBootstrap {
                username,
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            host: env.string("HOST", "0.0.0.0"),
            port: env.parsed("PORT", 3000)?,
            cors_origins,
            request_timeout_secs: env.parsed("REQUEST_TIMEOUT_SECS", 30)?,
            jwt,
            media: MediaConfig {
                root: PathBuf::from(env.string("MEDIA_ROOT", "storage/media")),
                image,
            },
            site,
            page_size: env.parsed::<i64>("PAGE_SIZE", DEFAULT_PAGE_SIZE)?.max(1),
            trust_proxy_headers: env.parsed("TRUST_PROXY_HEADERS", false)?,
            admin,
        })
    }

    /// Largest request body accepted: the upload limit plus room for
    /// multipart framing and form fields.
    pub fn body_limit_bytes(&self) -> usize {
        self.media.image.max_bytes.saturating_add(64 * 1024)
    }
}

/// Typed access to a key lookup. Blank values count as unset.
struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
