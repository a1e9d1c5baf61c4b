use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_ssm::Client as SsmClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::auth::BlockList;

/// Prefix shared by every environment variable the service reads
pub const ENV_PREFIX: &str = "HOTEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Parameter not found: {name}")]
    ParameterNotFound { name: String },

    #[error("AWS SDK error: {source}")]
    AwsSdk {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub aws: AwsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

/// Where records are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Dynamodb,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_guests_table")]
    pub guests_table_name: String,
    #[serde(default = "default_rooms_table")]
    pub rooms_table_name: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Overrides the DynamoDB endpoint, e.g. for DynamoDB Local
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default = "default_store_backend")]
    pub store_backend: StoreBackend,
    #[serde(default)]
    pub auto_create_tables: bool,
    /// SSM parameter holding the guests table name
    #[serde(default)]
    pub guests_table_parameter: Option<String>,
    /// SSM parameter holding the rooms table name
    #[serde(default)]
    pub rooms_table_parameter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_admin_group")]
    pub admin_group: String,
    /// Comma separated `email=REASON` pairs
    #[serde(default)]
    pub blocked_users: String,
}

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    pub dynamodb_client: DynamoDbClient,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub enable_json_logging: bool,
}

pub struct ParameterStoreConfig {
    ssm_client: SsmClient,
    cache: Arc<RwLock<HashMap<String, (String, Instant)>>>,
    cache_ttl: Duration,
}

impl std::fmt::Debug for ParameterStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterStoreConfig")
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_size", &"<runtime>")
            .finish()
    }
}

/// Deserialize one configuration section from `HOTEL_*` variables
///
/// `overrides` replaces the process environment as the variable source when set.
fn load_section<T: DeserializeOwned>(
    section: &str,
    overrides: Option<HashMap<String, String>>,
) -> Result<T, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::Environment::with_prefix(ENV_PREFIX).source(overrides))
        .build()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to load {} config: {}", section, e),
        })?;

    settings
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", section, e),
        })
}

impl Config {
    pub async fn from_environment() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment");

        let server = ServerConfig::from_env()?;
        let mut database = DatabaseConfig::from_env()?;
        let auth = AuthConfig::from_env()?;
        let observability = ObservabilityConfig::from_env()?;

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(database.region.clone()))
            .load()
            .await;

        let mut dynamodb_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
        if let Some(endpoint_url) = &database.endpoint_url {
            info!("Using DynamoDB endpoint override {}", endpoint_url);
            dynamodb_config = dynamodb_config.endpoint_url(endpoint_url);
        }
        let dynamodb_client = DynamoDbClient::from_conf(dynamodb_config.build());
        let parameter_store =
            ParameterStoreConfig::new(SsmClient::new(&sdk_config), Duration::from_secs(5 * 60));

        database.resolve_table_names(&parameter_store).await;

        let aws = AwsConfig {
            region: database.region.clone(),
            dynamodb_client,
        };

        let config = Config {
            server,
            database,
            auth,
            aws,
            observability,
        };

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.block_list()?;
        Ok(())
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_section("server", None)
    }

    pub fn from_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        load_section("server", Some(vars))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "Server port cannot be 0".to_string(),
            });
        }

        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "Request timeout cannot be 0".to_string(),
            });
        }

        Ok(())
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_section("database", None)
    }

    pub fn from_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        load_section("database", Some(vars))
    }

    /// Replace table names with Parameter Store values where parameters are configured
    async fn resolve_table_names(&mut self, parameter_store: &ParameterStoreConfig) {
        if let Some(parameter) = &self.guests_table_parameter {
            self.guests_table_name = parameter_store
                .get_parameter_with_default(parameter, &self.guests_table_name)
                .await;
        }

        if let Some(parameter) = &self.rooms_table_parameter {
            self.rooms_table_name = parameter_store
                .get_parameter_with_default(parameter, &self.rooms_table_name)
                .await;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.guests_table_name.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Guests table name cannot be empty".to_string(),
            });
        }

        if self.rooms_table_name.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Rooms table name cannot be empty".to_string(),
            });
        }

        if self.guests_table_name == self.rooms_table_name {
            return Err(ConfigError::ValidationError {
                message: "Guests and rooms must use different tables".to_string(),
            });
        }

        if self.store_backend == StoreBackend::Memory && self.auto_create_tables {
            warn!("AUTO_CREATE_TABLES has no effect with the in-memory store");
        }

        Ok(())
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_section("auth", None)
    }

    pub fn from_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        load_section("auth", Some(vars))
    }

    pub fn block_list(&self) -> Result<BlockList, ConfigError> {
        BlockList::from_str(&self.blocked_users)
            .map_err(|e| ConfigError::ValidationError {
                message: e.to_string(),
            })
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_section("observability", None)
    }

    pub fn from_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        load_section("observability", Some(vars))
    }
}

impl ParameterStoreConfig {
    pub fn new(ssm_client: SsmClient, cache_ttl: Duration) -> Self {
        Self {
            ssm_client,
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl,
        }
    }

    pub async fn get_parameter(&self, name: &str) -> Result<String, ConfigError> {
        debug!("Getting parameter: {}", name);

        {
            let cache = self.cache.read().await;
            if let Some((value, timestamp)) = cache.get(name) {
                if timestamp.elapsed() < self.cache_ttl {
                    debug!("Parameter found in cache: {}", name);
                    return Ok(value.clone());
                }
                debug!("Parameter cache expired: {}", name);
            }
        }

        let result = self
            .ssm_client
            .get_parameter()
            .name(name)
            .with_decryption(false)
            .send()
            .await
            .map_err(|e| ConfigError::AwsSdk {
                source: Box::new(e),
            })?;

        let value = result
            .parameter()
            .and_then(|p| p.value())
            .ok_or_else(|| ConfigError::ParameterNotFound {
                name: name.to_string(),
            })?
            .to_string();

        self.cache
            .write()
            .await
            .insert(name.to_string(), (value.clone(), Instant::now()));

        debug!("Parameter retrieved and cached: {}", name);
        Ok(value)
    }

    pub async fn get_parameter_with_default(&self, name: &str, default: &str) -> String {
        match self.get_parameter(name).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to get parameter {}, using default {}: {}", name, default, e);
                default.to_string()
            }
        }
    }
}

pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_max_request_size() -> usize {
    1024 * 1024 // 1MB
}

pub(crate) fn default_guests_table() -> String {
    "guests".to_string()
}

pub(crate) fn default_rooms_table() -> String {
    "rooms".to_string()
}

pub(crate) fn default_region() -> String {
    "us-east-1".to_string()
}

pub(crate) fn default_store_backend() -> StoreBackend {
    StoreBackend::Dynamodb
}

pub(crate) fn default_admin_group() -> String {
    "admin".to_string()
}

pub(crate) fn default_service_name() -> String {
    "hotel-rs".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
