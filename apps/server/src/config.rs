//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use auth::{CookieEncryptionKey, OidcConfig, ResponseMode, MAX_COOKIE_LIFETIME_SECS};
use serde::{Deserialize, Serialize};
use tower_sessions::cookie::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0:3000")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Resource an access token is requested for on login
    #[serde(default)]
    pub resource_url: Option<String>,

    /// Application state carried through the login round trip
    #[serde(default)]
    pub custom_state: Option<String>,

    /// Where the browser goes when sign-in fails
    #[serde(default = "default_failure_redirect")]
    pub failure_redirect: String,

    /// Provider endpoint that ends the provider-side session
    ///
    /// Falls back to the discovered `end_session_endpoint` when unset.
    #[serde(default)]
    pub destroy_session_url: Option<String>,

    /// Where the provider sends the browser after logout
    #[serde(default = "default_post_logout_redirect_uri")]
    pub post_logout_redirect_uri: String,

    /// Session cookie settings
    #[serde(default)]
    pub session: SessionConfig,

    /// OpenID Connect client settings
    #[serde(default)]
    pub oidc: OidcConfig,
}

/// Session cookie settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Only send cookies over https
    ///
    /// Defaults to true with `response_mode = form_post`, false otherwise.
    #[serde(default)]
    pub secure: Option<bool>,

    /// SameSite policy for session and context cookies
    ///
    /// Defaults to `none` with `response_mode = form_post`, `lax` otherwise.
    #[serde(default)]
    pub same_site: Option<SameSitePolicy>,

    /// Idle time after which a session expires
    #[serde(default = "default_session_max_age")]
    pub max_age_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secure: None,
            same_site: None,
            max_age_secs: default_session_max_age(),
        }
    }
}

impl SessionConfig {
    /// Session idle timeout
    pub fn max_age(&self) -> Duration {
        let secs = self.max_age_secs.min(MAX_COOKIE_LIFETIME_SECS);
        Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
    }
}

/// SameSite cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

impl FromStr for SameSitePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            _ => Err(ConfigError::InvalidValue {
                key: "same_site".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl From<SameSitePolicy> for tower_sessions::cookie::SameSite {
    fn from(value: SameSitePolicy) -> Self {
        match value {
            SameSitePolicy::Strict => Self::Strict,
            SameSitePolicy::Lax => Self::Lax,
            SameSitePolicy::None => Self::None,
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_failure_redirect() -> String {
    "/".to_string()
}

fn default_post_logout_redirect_uri() -> String {
    "http://localhost:3000".to_string()
}

fn default_session_max_age() -> u64 {
    86400
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            log_level: default_log_level(),
            resource_url: None,
            custom_state: None,
            failure_redirect: default_failure_redirect(),
            destroy_session_url: None,
            post_logout_redirect_uri: default_post_logout_redirect_uri(),
            session: SessionConfig::default(),
            oidc: OidcConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the config file and environment
    ///
    /// Environment variables take precedence over the file, which takes
    /// precedence over defaults.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let mut config = match Self::find_config_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::from_toml_str(&std::fs::read_to_string(&path)?)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Override fields from `WEBAPP_*` and `OIDC_*` variables
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = var("WEBAPP_BIND_ADDRESS") {
            self.bind_address = addr;
        }
        if let Some(level) = var("WEBAPP_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = var("WEBAPP_RESOURCE_URL") {
            self.resource_url = Some(url);
        }
        if let Some(state) = var("WEBAPP_CUSTOM_STATE") {
            self.custom_state = Some(state);
        }
        if let Some(url) = var("WEBAPP_FAILURE_REDIRECT") {
            self.failure_redirect = url;
        }
        if let Some(url) = var("WEBAPP_DESTROY_SESSION_URL") {
            self.destroy_session_url = Some(url);
        }
        if let Some(url) = var("WEBAPP_POST_LOGOUT_REDIRECT_URI") {
            self.post_logout_redirect_uri = url;
        }
        if let Some(val) = var("WEBAPP_SESSION_SECURE") {
            self.session.secure = Some(parse_value("WEBAPP_SESSION_SECURE", &val)?);
        }
        if let Some(val) = var("WEBAPP_SESSION_SAME_SITE") {
            self.session.same_site = Some(val.parse()?);
        }
        if let Some(val) = var("WEBAPP_SESSION_MAX_AGE_SECS") {
            self.session.max_age_secs = parse_value("WEBAPP_SESSION_MAX_AGE_SECS", &val)?;
        }

        let oidc = &mut self.oidc;
        if let Some(url) = var("OIDC_IDENTITY_METADATA") {
            oidc.identity_metadata = url;
        }
        if let Some(id) = var("OIDC_CLIENT_ID") {
            oidc.client_id = id;
        }
        if let Some(secret) = var("OIDC_CLIENT_SECRET") {
            oidc.client_secret = Some(secret);
        }
        if let Some(val) = var("OIDC_RESPONSE_TYPE") {
            oidc.response_type = val.parse().map_err(|_| invalid("OIDC_RESPONSE_TYPE", &val))?;
        }
        if let Some(val) = var("OIDC_RESPONSE_MODE") {
            oidc.response_mode = val.parse().map_err(|_| invalid("OIDC_RESPONSE_MODE", &val))?;
        }
        if let Some(url) = var("OIDC_REDIRECT_URL") {
            oidc.redirect_url = url;
        }
        if let Some(val) = var("OIDC_ALLOW_HTTP_FOR_REDIRECT_URL") {
            oidc.allow_http_for_redirect_url = parse_value("OIDC_ALLOW_HTTP_FOR_REDIRECT_URL", &val)?;
        }
        if let Some(val) = var("OIDC_VALIDATE_ISSUER") {
            oidc.validate_issuer = parse_value("OIDC_VALIDATE_ISSUER", &val)?;
        }
        if let Some(issuers) = var("OIDC_ISSUER") {
            oidc.issuer = split_list(&issuers);
        }
        if let Some(val) = var("OIDC_PASS_REQ_TO_CALLBACK") {
            oidc.pass_req_to_callback = parse_value("OIDC_PASS_REQ_TO_CALLBACK", &val)?;
        }
        if let Some(val) = var("OIDC_USE_COOKIE_INSTEAD_OF_SESSION") {
            oidc.use_cookie_instead_of_session =
                parse_value("OIDC_USE_COOKIE_INSTEAD_OF_SESSION", &val)?;
        }
        // A key from the environment becomes the primary key, file keys stay
        // usable for decryption.
        if let (Some(key), Some(iv)) = (
            var("OIDC_COOKIE_ENCRYPTION_KEY"),
            var("OIDC_COOKIE_ENCRYPTION_IV"),
        ) {
            oidc.cookie_encryption_keys
                .insert(0, CookieEncryptionKey::new(key, iv));
        }
        if let Some(scopes) = var("OIDC_SCOPE") {
            oidc.scope = split_list(&scopes);
        }
        if let Some(level) = var("OIDC_LOGGING_LEVEL") {
            oidc.logging_level = level;
        }
        if let Some(val) = var("OIDC_NONCE_LIFETIME") {
            oidc.nonce_lifetime = parse_value("OIDC_NONCE_LIFETIME", &val)?;
        }
        if let Some(val) = var("OIDC_NONCE_MAX_AMOUNT") {
            oidc.nonce_max_amount = parse_value("OIDC_NONCE_MAX_AMOUNT", &val)?;
        }
        if let Some(val) = var("OIDC_CLOCK_SKEW") {
            oidc.clock_skew = parse_value("OIDC_CLOCK_SKEW", &val)?;
        }

        Ok(())
    }

    /// SameSite policy applied to session and context cookies
    ///
    /// A `form_post` return is a cross-site POST, which only carries
    /// `SameSite=None` cookies.
    pub fn cookie_same_site(&self) -> SameSitePolicy {
        self.session
            .same_site
            .unwrap_or(match self.oidc.response_mode {
                ResponseMode::FormPost => SameSitePolicy::None,
                ResponseMode::Query => SameSitePolicy::Lax,
            })
    }

    /// Whether session and context cookies carry the `Secure` attribute
    pub fn cookie_secure(&self) -> bool {
        self.session
            .secure
            .unwrap_or(self.oidc.response_mode == ResponseMode::FormPost)
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("WEBAPP_CONFIG") {
            return Some(PathBuf::from(path));
        }

        let locations = [
            Some(PathBuf::from("oidc-webapp.toml")),
            dirs::config_dir().map(|p| p.join("oidc-webapp").join("config.toml")),
        ];

        locations.into_iter().flatten().find(|p| p.exists())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_address
            .parse::<SocketAddr>()
            .map_err(|_| invalid("bind_address", &self.bind_address))?;

        if self.failure_redirect.trim().is_empty() {
            return Err(invalid("failure_redirect", &self.failure_redirect));
        }

        if let Some(url) = &self.destroy_session_url {
            url::Url::parse(url).map_err(|_| invalid("destroy_session_url", url))?;
        }

        if self.session.max_age_secs == 0 || self.session.max_age_secs > MAX_COOKIE_LIFETIME_SECS {
            return Err(invalid(
                "session.max_age_secs",
                &self.session.max_age_secs.to_string(),
            ));
        }

        if self.oidc.response_mode == ResponseMode::FormPost {
            let same_site = self.cookie_same_site();
            if same_site != SameSitePolicy::None {
                return Err(invalid(
                    "session.same_site",
                    &format!("{:?} (response_mode form_post needs none)", same_site),
                ));
            }
            if !self.cookie_secure() {
                return Err(invalid(
                    "session.secure",
                    "false (response_mode form_post needs secure cookies)",
                ));
            }
        }

        self.oidc.validate()?;
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid OIDC configuration: {0}")]
    Oidc(#[from] auth::AuthError),

    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
