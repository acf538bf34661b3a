use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Main configuration structure for prompt-dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub openai: OpenAIConfig,
    pub qdrant: QdrantConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    /// Bind address for the HTTP server, host:port
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub embedding_model: String,
    pub embedding_dimensions: usize,
}

impl OpenAIConfig {
    pub fn api_key(&self) -> anyhow::Result<String> {
        env::var("OPENAI_API_KEY").map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    /// Host for Qdrant server
    pub host: String,
    /// Port for Qdrant server (gRPC)
    pub port: u16,
    /// Collection holding one point per registered function
    pub collection: String,
    /// Similarity score cutoff below which no match is returned (0.0-1.0)
    pub similarity_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
}

impl Config {
    /// Load configuration from file with environment variable overrides
    /// ALWAYS returns a valid config - never fails
    pub fn load() -> Self {
        // Load environment variables from .env files
        let env_paths = ["../.env", ".env"];

        let mut env_loaded = false;
        for path in &env_paths {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
                break;
            }
        }

        if !env_loaded {
            tracing::warn!(
                "No .env file found in any expected location - continuing with env vars only"
            );
        }

        // Default config path
        let config_path = env::var("PD_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        // Load config from file if it exists
        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match serde_yaml::from_str::<Config>(&contents) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", config_path);
                        config
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to parse config file {}: {} - using defaults",
                            config_path,
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::warn!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration - log warnings but don't fail
        if let Err(e) = config.validate() {
            tracing::warn!("Config validation warnings: {} - continuing anyway", e);
        }

        config
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(name) = env::var("PD_SERVER_NAME") {
            self.server.name = name;
        }
        if let Ok(bind) = env::var("PD_HTTP_BIND") {
            self.server.bind = bind;
        }

        // OpenAI overrides
        if let Ok(model) = env::var("PD_EMBEDDING_MODEL") {
            self.openai.embedding_model = model;
        }
        if let Ok(dims) = env::var("PD_EMBEDDING_DIMENSIONS") {
            if let Ok(dims_num) = dims.parse() {
                self.openai.embedding_dimensions = dims_num;
            }
        }

        // Qdrant overrides
        if let Ok(host) = env::var("QDRANT_HOST") {
            self.qdrant.host = host;
        }
        if let Ok(port) = env::var("QDRANT_PORT") {
            if let Ok(port_num) = port.parse() {
                self.qdrant.port = port_num;
            }
        }
        if let Ok(collection) = env::var("QDRANT_COLLECTION") {
            self.qdrant.collection = collection;
        }
        if let Ok(threshold) = env::var("QDRANT_SIMILARITY_THRESHOLD") {
            if let Ok(threshold_val) = threshold.parse() {
                self.qdrant.similarity_threshold = threshold_val;
            }
        }

        // Retry overrides
        if let Ok(jitter) = env::var("PD_RETRY_JITTER_FACTOR") {
            if let Ok(jitter_val) = jitter.parse() {
                self.retry.jitter_factor = jitter_val;
            }
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.qdrant.port == 0 {
            return Err("Qdrant port cannot be 0".into());
        }
        if self.qdrant.similarity_threshold < 0.0 || self.qdrant.similarity_threshold > 1.0 {
            return Err("Qdrant similarity threshold must be between 0.0 and 1.0".into());
        }
        if self.qdrant.collection.is_empty() {
            return Err("Qdrant collection name cannot be empty".into());
        }
        if self.openai.embedding_dimensions == 0 {
            return Err("Embedding dimensions cannot be 0".into());
        }
        if self.retry.max_attempts == 0 {
            return Err("Retry max_attempts cannot be 0".into());
        }
        if self.retry.jitter_factor < 0.0 || self.retry.jitter_factor > 1.0 {
            return Err("Retry jitter factor must be between 0.0 and 1.0".into());
        }
        Ok(())
    }

    pub fn qdrant_url(&self) -> String {
        format!("http://{}:{}", self.qdrant.host, self.qdrant.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "prompt-dispatch".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                bind: "127.0.0.1:8787".to_string(),
            },
            openai: OpenAIConfig {
                embedding_model: "text-embedding-3-small".to_string(),
                embedding_dimensions: 1536,
            },
            qdrant: QdrantConfig {
                host: "localhost".to_string(),
                port: 6334,
                collection: "function-registry".to_string(),
                similarity_threshold: 0.1,
            },
            retry: RetryConfig {
                max_attempts: 5,
                initial_delay_ms: 200,
                max_delay_ms: 30000,
                jitter_factor: 0.2,
            },
        }
    }
}
