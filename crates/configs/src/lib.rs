use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub firestore: FirestoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 5000, worker_threads: Some(4) }
    }
}

/// Location of the JSON collection files used when the document store is unavailable.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir() }
    }
}

/// Service-account credentials and endpoints for the Firestore document store.
///
/// All three of `project_id`, `client_email` and `private_key` must be present
/// for the store to be considered (only `project_id` with `emulator_host`).
#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreConfig {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default = "default_firestore_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub emulator_host: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            client_email: String::new(),
            private_key: String::new(),
            endpoint: default_firestore_endpoint(),
            token_uri: default_token_uri(),
            emulator_host: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub frontend_url: Option<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { allowed_origins: default_allowed_origins(), frontend_url: None }
    }
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_firestore_endpoint() -> String { "https://firestore.googleapis.com".into() }
fn default_token_uri() -> String { "https://oauth2.googleapis.com/token".into() }
fn default_request_timeout() -> u64 { 30 }
fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".into(),
        "http://localhost:3000".into(),
        "https://yaalir-travel-planning-app.vercel.app".into(),
        "http://yaalir-travel-planning-app.vercel.app".into(),
    ]
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

fn is_missing_file(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Environment lookup used while normalizing; the process environment outside tests.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`); without a file, configuration comes
    /// from defaults and environment variables only. Validated either way.
    pub fn load_and_validate() -> Result<Self> {
        match load_default() {
            Ok(mut cfg) => {
                cfg.normalize_and_validate()?;
                Ok(cfg)
            }
            Err(e) if is_missing_file(&e) => Self::from_env(),
            Err(e) => Err(e),
        }
    }

    /// Configuration from defaults and environment variables only.
    pub fn from_env() -> Result<Self> {
        let mut cfg = AppConfig::default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_with(&env_nonempty)
    }

    /// Deployment variables (`SERVER_HOST`, `PORT`/`SERVER_PORT`, `DATA_DIR`)
    /// override the file. Credentials, secrets and `FRONTEND_URL` only fill blanks.
    pub fn normalize_with(&mut self, env: EnvLookup<'_>) -> Result<()> {
        self.server.normalize(env)?;
        self.storage.normalize_from_env(env);
        self.firestore.normalize_from_env(env);
        self.auth.normalize_from_env(env);
        self.auth.validate()?;
        self.cors.normalize_from_env(env);
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self, env: EnvLookup<'_>) -> Result<()> {
        if let Some(host) = env("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = env("PORT").or_else(|| env("SERVER_PORT")) {
            self.port = port.parse().map_err(|_| anyhow!("invalid port {port:?}"))?;
        }
        if self.host.trim().is_empty() {
            self.host = "0.0.0.0".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    fn normalize_from_env(&mut self, env: EnvLookup<'_>) {
        if let Some(dir) = env("DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
    }
}

impl FirestoreConfig {
    pub fn normalize_from_env(&mut self, env: EnvLookup<'_>) {
        if self.project_id.trim().is_empty() {
            if let Some(v) = env("FIREBASE_PROJECT_ID") { self.project_id = v; }
        }
        if self.client_email.trim().is_empty() {
            if let Some(v) = env("FIREBASE_CLIENT_EMAIL") { self.client_email = v; }
        }
        if self.private_key.trim().is_empty() {
            if let Some(v) = env("FIREBASE_PRIVATE_KEY") { self.private_key = v; }
        }
        if self.emulator_host.is_none() {
            self.emulator_host = env("FIRESTORE_EMULATOR_HOST");
        }
    }

    /// Names of required credential fields that are empty.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.project_id.trim().is_empty() { missing.push("FIREBASE_PROJECT_ID"); }
        if self.emulator_host.is_some() {
            return missing;
        }
        if self.client_email.trim().is_empty() { missing.push("FIREBASE_CLIENT_EMAIL"); }
        if self.private_key.trim().is_empty() { missing.push("FIREBASE_PRIVATE_KEY"); }
        missing
    }
}

impl AuthConfig {
    fn normalize_from_env(&mut self, env: EnvLookup<'_>) {
        if self.jwt_secret.trim().is_empty() {
            if let Some(v) = env("JWT_SECRET") { self.jwt_secret = v; }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set it in config.toml or JWT_SECRET"));
        }
        Ok(())
    }
}

impl CorsConfig {
    fn normalize_from_env(&mut self, env: EnvLookup<'_>) {
        if self.frontend_url.is_none() {
            self.frontend_url = env("FRONTEND_URL");
        }
    }

    /// Allowed origins including `frontend_url`, without duplicates.
    pub fn origins(&self) -> Vec<String> {
        let mut all = self.allowed_origins.clone();
        if let Some(url) = &self.frontend_url {
            if !all.contains(url) { all.push(url.clone()); }
        }
        all
    }
}
