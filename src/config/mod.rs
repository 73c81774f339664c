use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub tenancy: TenancyConfig,
    pub routes: RoutesConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Shape of the canonical URL a tenant is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantUrlMode {
    /// `/tenant/{slug}/...` on the current host (served through a rewrite)
    Path,
    /// `http://{slug}.localhost:{dev_port}/...`
    Local,
    /// `{scheme}://{slug}.{base_domain}/...`
    Subdomain,
}

impl FromStr for TenantUrlMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" => Ok(TenantUrlMode::Path),
            "local" | "localhost" => Ok(TenantUrlMode::Local),
            "subdomain" => Ok(TenantUrlMode::Subdomain),
            other => Err(ConfigError::UnknownUrlMode(other.to_string())),
        }
    }
}

impl fmt::Display for TenantUrlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantUrlMode::Path => write!(f, "path"),
            TenantUrlMode::Local => write!(f, "local"),
            TenantUrlMode::Subdomain => write!(f, "subdomain"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub enable_request_logging: bool,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Root domain tenants live under, e.g. `casestream.com`
    pub base_domain: String,
    pub url_mode: TenantUrlMode,
    pub url_scheme: String,
    pub dev_port: u16,
    /// Internal routing prefix for tenant-scoped paths
    pub tenant_prefix: String,
    /// Leftmost labels that still mean "the apex", e.g. `www`
    pub apex_aliases: Vec<String>,
    /// Slugs that can never be claimed by an account
    pub reserved_slugs: Vec<String>,
    /// Accounts preloaded into the in-memory directory
    pub known_accounts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Exact-match paths reachable without a session
    pub public: Vec<String>,
    /// Segment-aware prefixes that need a session and a tenant
    pub protected: Vec<String>,
    /// Prefixes the resolver never looks at (API, assets)
    pub bypass_prefixes: Vec<String>,
    /// File extensions the resolver never looks at
    pub bypass_extensions: Vec<String>,
    pub login_path: String,
    pub dashboard_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub require_https: bool,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub session_cookie: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown tenant URL mode '{0}' (expected path, local or subdomain)")]
    UnknownUrlMode(String),

    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("CASESTREAM_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("CASESTREAM_HOST") {
            self.api.host = v;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("LOG_LEVEL") {
            self.api.log_level = v;
        }

        // Tenancy overrides
        if let Ok(v) = env::var("CASESTREAM_BASE_DOMAIN") {
            self.tenancy.base_domain = v.trim().to_ascii_lowercase();
        }
        if let Ok(v) = env::var("TENANT_URL_MODE") {
            match v.parse() {
                Ok(mode) => self.tenancy.url_mode = mode,
                Err(e) => tracing::warn!("Ignoring TENANT_URL_MODE: {}", e),
            }
        }
        if let Ok(v) = env::var("TENANT_URL_SCHEME") {
            self.tenancy.url_scheme = v;
        }
        if let Ok(v) = env::var("TENANT_DEV_PORT") {
            self.tenancy.dev_port = v.parse().unwrap_or(self.tenancy.dev_port);
        }
        if let Ok(v) = env::var("TENANT_APEX_ALIASES") {
            self.tenancy.apex_aliases = split_list(&v);
        }
        if let Ok(v) = env::var("CASESTREAM_ACCOUNTS") {
            self.tenancy.known_accounts = split_list(&v);
        }

        // Route overrides
        if let Ok(v) = env::var("ROUTES_PUBLIC") {
            self.routes.public = split_list(&v);
        }
        if let Ok(v) = env::var("ROUTES_PROTECTED") {
            self.routes.protected = split_list(&v);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SESSION_COOKIE") {
            self.security.session_cookie = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Ok(v) = env::var("SECURITY_REQUIRE_HTTPS") {
            self.security.require_https = v.parse().unwrap_or(self.security.require_https);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                enable_request_logging: true,
                log_level: "debug".to_string(),
            },
            tenancy: TenancyConfig {
                base_domain: "localhost".to_string(),
                url_mode: TenantUrlMode::Local,
                url_scheme: "http".to_string(),
                dev_port: 3000,
                tenant_prefix: "/tenant".to_string(),
                apex_aliases: vec!["www".to_string()],
                reserved_slugs: default_reserved_slugs(),
                known_accounts: Vec::new(),
            },
            routes: RoutesConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string()],
                require_https: false,
                jwt_secret: "casestream-dev-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                session_cookie: "cs_session".to_string(),
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                enable_request_logging: true,
                log_level: "info".to_string(),
            },
            tenancy: TenancyConfig {
                base_domain: "staging.casestream.com".to_string(),
                url_mode: TenantUrlMode::Subdomain,
                url_scheme: "https".to_string(),
                dev_port: 3000,
                tenant_prefix: "/tenant".to_string(),
                apex_aliases: vec!["www".to_string()],
                reserved_slugs: default_reserved_slugs(),
                known_accounts: Vec::new(),
            },
            routes: RoutesConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.casestream.com".to_string()],
                require_https: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                session_cookie: "cs_session".to_string(),
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                enable_request_logging: false,
                log_level: "info".to_string(),
            },
            tenancy: TenancyConfig {
                base_domain: "casestream.com".to_string(),
                url_mode: TenantUrlMode::Subdomain,
                url_scheme: "https".to_string(),
                dev_port: 3000,
                tenant_prefix: "/tenant".to_string(),
                apex_aliases: vec!["www".to_string()],
                reserved_slugs: default_reserved_slugs(),
                known_accounts: Vec::new(),
            },
            routes: RoutesConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://casestream.com".to_string()],
                require_https: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 12,
                session_cookie: "cs_session".to_string(),
            },
        }
    }

    /// Development defaults with path-prefix tenant URLs, a fixed secret and two
    /// seeded accounts. Nothing here reads the process environment.
    pub fn for_testing() -> Self {
        let mut config = Self::development();
        config.api.port = 0;
        config.api.enable_request_logging = false;
        config.tenancy.base_domain = "example.com".to_string();
        config.tenancy.url_mode = TenantUrlMode::Path;
        config.tenancy.known_accounts = vec!["acme".to_string(), "globex".to_string()];
        config.security.enable_cors = false;
        config.security.jwt_secret = "test-secret".to_string();
        config.security.jwt_expiry_hours = 1;
        config
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Collects every problem instead of stopping at the first one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.security.jwt_secret.is_empty() {
            errors.push("JWT_SECRET must be set".to_string());
        }
        if self.security.session_cookie.trim().is_empty() {
            errors.push("Session cookie name cannot be empty".to_string());
        }
        if self.security.jwt_expiry_hours == 0 {
            errors.push("JWT expiry cannot be 0 hours".to_string());
        }
        if self.security.jwt_expiry_hours > MAX_JWT_EXPIRY_HOURS {
            errors.push(format!(
                "JWT expiry cannot exceed {} hours, got {}",
                MAX_JWT_EXPIRY_HOURS, self.security.jwt_expiry_hours
            ));
        }
        if self.tenancy.base_domain.is_empty() || self.tenancy.base_domain.contains('/') {
            errors.push(format!("Invalid base domain '{}'", self.tenancy.base_domain));
        }
        if !matches!(self.tenancy.url_scheme.as_str(), "http" | "https") {
            errors.push(format!("Unsupported URL scheme '{}'", self.tenancy.url_scheme));
        }
        if !self.tenancy.tenant_prefix.starts_with('/') || self.tenancy.tenant_prefix.len() < 2 {
            errors.push(format!(
                "Tenant prefix '{}' must be a non-root absolute path",
                self.tenancy.tenant_prefix
            ));
        }
        for path in [&self.routes.login_path, &self.routes.dashboard_path] {
            if !path.starts_with('/') {
                errors.push(format!("Route '{}' must start with '/'", path));
            }
        }
        if !self.routes.public.contains(&self.routes.login_path) {
            errors.push(format!("Login path '{}' must be public", self.routes.login_path));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            public: ["/", "/login", "/signup", "/forgot-password"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            protected: [
                "/dashboard",
                "/cases",
                "/contacts",
                "/documents",
                "/settings",
                "/profile",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            bypass_prefixes: ["/api/", "/health", "/static/", "/assets/", "/favicon.ico"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            bypass_extensions: ["svg", "png", "jpg", "jpeg", "gif", "webp", "ico"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            login_path: "/login".to_string(),
            dashboard_path: "/dashboard".to_string(),
        }
    }
}

fn default_reserved_slugs() -> Vec<String> {
    ["www", "api", "app", "admin", "mail", "tenant", "localhost"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Longest session lifetime accepted from configuration (ten years).
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365 * 10;

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
