//! Environment-driven application configuration.
//!
//! Centralises every setting the binary needs so they are validated
//! consistently and can be tested in isolation against a mock environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::cookie::Key;
use mockable::Env;
use reqwest::Url;
use tracing::warn;

use crate::outbound::{CloudinaryConfig, GoogleConfig, MapQuestConfig, StripeConfig};

const BIND_ADDR_ENV: &str = "BIND_ADDR";
const DATABASE_URL_ENV: &str = "DATABASE_URL";
const DATABASE_POOL_SIZE_ENV: &str = "DATABASE_POOL_SIZE";
const SESSION_KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const SESSION_ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const SESSION_COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const STRIPE_SECRET_KEY_ENV: &str = "STRIPE_SECRET_KEY";
const STRIPE_CLIENT_ID_ENV: &str = "STRIPE_CLIENT_ID";
const STRIPE_API_BASE_ENV: &str = "STRIPE_API_BASE";
const GOOGLE_CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
const GOOGLE_CLIENT_SECRET_ENV: &str = "GOOGLE_CLIENT_SECRET";
const GOOGLE_REDIRECT_URL_ENV: &str = "GOOGLE_REDIRECT_URL";
const GEOCODER_API_KEY_ENV: &str = "GEOCODER_API_KEY";
const GEOCODER_API_BASE_ENV: &str = "GEOCODER_API_BASE";
const CLOUDINARY_CLOUD_NAME_ENV: &str = "CLOUDINARY_CLOUD_NAME";
const CLOUDINARY_UPLOAD_PRESET_ENV: &str = "CLOUDINARY_UPLOAD_PRESET";
const CLOUDINARY_FOLDER_ENV: &str = "CLOUDINARY_FOLDER";
const CLOUDINARY_API_BASE_ENV: &str = "CLOUDINARY_API_BASE";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_SESSION_KEY_PATH: &str = "/var/run/secrets/session_key";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_GEOCODER_API_BASE: &str = "https://www.mapquestapi.com";
const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";
const DEFAULT_CLOUDINARY_FOLDER: &str = "listings";

/// Errors raised while validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}': {message}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        message: String,
    },
    /// Reading the session key file failed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Cookie-session settings.
pub struct SessionSettings {
    /// Signing key for cookie sessions.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("key", &"<redacted>")
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

/// Complete application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub pool_max_size: u32,
    pub session: SessionSettings,
    pub stripe: StripeConfig,
    pub google: GoogleConfig,
    pub geocoder: MapQuestConfig,
    pub images: CloudinaryConfig,
}

impl AppConfig {
    /// Assemble the configuration from the given environment.
    pub fn from_env<E: Env>(env: &E) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: bind_addr(env)?,
            database_url: required(env, DATABASE_URL_ENV)?,
            pool_max_size: pool_size(env)?,
            session: session_settings(env)?,
            stripe: StripeConfig {
                api_base: base_url(env, STRIPE_API_BASE_ENV, DEFAULT_STRIPE_API_BASE)?,
                secret_key: required(env, STRIPE_SECRET_KEY_ENV)?,
                client_id: required(env, STRIPE_CLIENT_ID_ENV)?,
            },
            google: google(env)?,
            geocoder: MapQuestConfig {
                api_base: base_url(env, GEOCODER_API_BASE_ENV, DEFAULT_GEOCODER_API_BASE)?,
                api_key: required(env, GEOCODER_API_KEY_ENV)?,
            },
            images: CloudinaryConfig {
                api_base: base_url(env, CLOUDINARY_API_BASE_ENV, DEFAULT_CLOUDINARY_API_BASE)?,
                cloud_name: required(env, CLOUDINARY_CLOUD_NAME_ENV)?,
                upload_preset: required(env, CLOUDINARY_UPLOAD_PRESET_ENV)?,
                folder: env
                    .string(CLOUDINARY_FOLDER_ENV)
                    .unwrap_or_else(|| DEFAULT_CLOUDINARY_FOLDER.to_owned()),
            },
        })
    }
}

fn required<E: Env>(env: &E, name: &'static str) -> Result<String, ConfigError> {
    env.string(name).ok_or(ConfigError::MissingEnv { name })
}

fn bind_addr<E: Env>(env: &E) -> Result<SocketAddr, ConfigError> {
    let raw = env
        .string(BIND_ADDR_ENV)
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
    raw.parse().map_err(|err| ConfigError::InvalidEnv {
        name: BIND_ADDR_ENV,
        value: raw,
        message: format!("{err}"),
    })
}

fn pool_size<E: Env>(env: &E) -> Result<u32, ConfigError> {
    let Some(raw) = env.string(DATABASE_POOL_SIZE_ENV) else {
        return Ok(DEFAULT_POOL_SIZE);
    };
    raw.parse().map_err(|err| ConfigError::InvalidEnv {
        name: DATABASE_POOL_SIZE_ENV,
        value: raw,
        message: format!("{err}"),
    })
}

fn base_url<E: Env>(env: &E, name: &'static str, default: &str) -> Result<Url, ConfigError> {
    let raw = env
        .string(name)
        .unwrap_or_else(|| default.to_owned());
    Url::parse(&raw).map_err(|err| ConfigError::InvalidEnv {
        name,
        value: raw,
        message: format!("{err}"),
    })
}

fn google<E: Env>(env: &E) -> Result<GoogleConfig, ConfigError> {
    let client_id = required(env, GOOGLE_CLIENT_ID_ENV)?;
    let client_secret = required(env, GOOGLE_CLIENT_SECRET_ENV)?;
    let redirect_url = required(env, GOOGLE_REDIRECT_URL_ENV)?;
    GoogleConfig::new(client_id, client_secret, redirect_url).map_err(|err| {
        ConfigError::InvalidEnv {
            name: GOOGLE_REDIRECT_URL_ENV,
            value: String::new(),
            message: format!("{err}"),
        }
    })
}

/// Load the session signing key, falling back to an ephemeral key only in
/// debug builds or when explicitly allowed.
fn session_settings<E: Env>(env: &E) -> Result<SessionSettings, ConfigError> {
    let cookie_secure = env
        .string(SESSION_COOKIE_SECURE_ENV)
        .map(|value| value != "0")
        .unwrap_or(true);

    let key_path = env
        .string(SESSION_KEY_FILE_ENV)
        .unwrap_or_else(|| DEFAULT_SESSION_KEY_PATH.to_owned());
    let key = match std::fs::read(&key_path) {
        Ok(bytes) => Key::derive_from(&bytes),
        Err(err) => {
            let allow_dev =
                env.string(SESSION_ALLOW_EPHEMERAL_ENV).as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %err, "using temporary session key (dev only)");
                Key::generate()
            } else {
                return Err(ConfigError::KeyRead {
                    path: PathBuf::from(key_path),
                    source: err,
                });
            }
        }
    };

    Ok(SessionSettings { key, cookie_secure })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::MockEnv;

    fn env_with(vars: Vec<(&'static str, &'static str)>) -> MockEnv {
        let mut env = MockEnv::new();
        env.expect_string().returning(move |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned())
        });
        env
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgres://localhost/marketplace"),
            ("SESSION_ALLOW_EPHEMERAL", "1"),
            ("STRIPE_SECRET_KEY", "sk_test_1"),
            ("STRIPE_CLIENT_ID", "ca_1"),
            ("GOOGLE_CLIENT_ID", "gid"),
            ("GOOGLE_CLIENT_SECRET", "gsecret"),
            ("GOOGLE_REDIRECT_URL", "https://app.invalid/login"),
            ("GEOCODER_API_KEY", "mq"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_UPLOAD_PRESET", "unsigned"),
        ]
    }

    #[test]
    fn full_environment_yields_defaults_for_optional_settings() {
        let config = AppConfig::from_env(&env_with(full_env())).expect("config loads");
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.pool_max_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.stripe.api_base.as_str(), "https://api.stripe.com/");
        assert_eq!(config.images.folder, "listings");
        assert!(config.session.cookie_secure);
    }

    #[test]
    fn missing_database_url_is_reported_by_name() {
        let vars = full_env()
            .into_iter()
            .filter(|(key, _)| *key != "DATABASE_URL")
            .collect();
        let err = AppConfig::from_env(&env_with(vars)).expect_err("config must fail");
        assert!(matches!(
            err,
            ConfigError::MissingEnv {
                name: "DATABASE_URL"
            }
        ));
    }

    #[test]
    fn malformed_bind_address_is_invalid() {
        let mut vars = full_env();
        vars.push(("BIND_ADDR", "not-an-addr"));
        let err = AppConfig::from_env(&env_with(vars)).expect_err("config must fail");
        assert!(matches!(err, ConfigError::InvalidEnv { name: "BIND_ADDR", .. }));
    }

    #[test]
    fn cookie_secure_zero_disables_the_secure_flag() {
        let mut vars = full_env();
        vars.push(("SESSION_COOKIE_SECURE", "0"));
        let config = AppConfig::from_env(&env_with(vars)).expect("config loads");
        assert!(!config.session.cookie_secure);
    }
}
