//! Configuration for the HR copilot engine

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::index::DistanceMetric;
use crate::routing::{DEFAULT_EMPLOYEE_KEYWORDS, DEFAULT_POLICY_KEYWORDS};

/// Smallest chunk size the chunker accepts
pub const MIN_CHUNK_SIZE: usize = 100;

/// Upper bound on provider retries; backoff doubles per attempt
pub const MAX_RETRIES: u32 = 10;

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Generation provider configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Query routing keyword sets
    pub routing: RoutingConfig,
    /// Data locations
    pub paths: PathsConfig,
}

/// Hosted or local model backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini (API key)
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
    /// Offline token-hashing embedder (embeddings only)
    Hashing,
}

impl std::str::FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            "hashing" | "hash" | "offline" => Ok(Self::Hashing),
            other => Err(Error::config(format!("unknown provider '{}'", other))),
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which backend answers prompts
    pub provider: ProviderKind,
    /// Generation model name
    pub model: String,
    /// Temperature for generation, 0.0 to 1.0
    pub temperature: f32,
    /// Maximum output tokens
    pub max_tokens: u32,
    /// Upper bound for a single provider call in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Ollama base URL
    pub base_url: String,
    /// Gemini API key
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: 60,
            max_retries: 2,
            base_url: "http://localhost:11434".to_string(),
            api_key: None,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which backend produces vectors
    pub provider: ProviderKind,
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (768 for embedding-001 and nomic-embed-text)
    pub dimensions: usize,
    /// Texts per embedding request
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: "models/embedding-001".to_string(),
            dimensions: 768,
            batch_size: 32,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of neighbors fetched per query
    pub top_k: usize,
    /// Maximum accepted distance
    pub similarity_threshold: f32,
    /// Distance metric used for build and search
    pub metric: DistanceMetric,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            similarity_threshold: 0.5,
            metric: DistanceMetric::Cosine,
        }
    }
}

/// Keyword sets for query routing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub employee_keywords: Vec<String>,
    pub policy_keywords: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            employee_keywords: DEFAULT_EMPLOYEE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            policy_keywords: DEFAULT_POLICY_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// Data locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Employee records CSV
    pub employee_data: PathBuf,
    /// Directory of policy `.txt` files
    pub policies_dir: PathBuf,
    /// Directory holding the persisted vector index
    pub vector_store: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            employee_data: PathBuf::from("data/employees.csv"),
            policies_dir: PathBuf::from("data/policies"),
            vector_store: PathBuf::from("vector_store"),
        }
    }
}

impl RagConfig {
    /// Load from an optional TOML file, then apply process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file; missing sections take their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::config(format!("invalid TOML: {}", e)))
    }

    /// Apply overrides from an environment-like lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GOOGLE_API_KEY").filter(|k| !k.is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = lookup("MODEL_NAME") {
            self.llm.model = model;
        }
        if let Some(value) = lookup("TEMPERATURE") {
            self.llm.temperature = parse_var("TEMPERATURE", &value)?;
        }
        if let Some(value) = lookup("MAX_TOKENS") {
            self.llm.max_tokens = parse_var("MAX_TOKENS", &value)?;
        }
        if let Some(value) = lookup("CHUNK_SIZE") {
            self.chunking.chunk_size = parse_var("CHUNK_SIZE", &value)?;
        }
        if let Some(value) = lookup("CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = parse_var("CHUNK_OVERLAP", &value)?;
        }
        if let Some(value) = lookup("RETRIEVAL_K") {
            self.retrieval.top_k = parse_var("RETRIEVAL_K", &value)?;
        }
        if let Some(value) = lookup("SIMILARITY_THRESHOLD") {
            self.retrieval.similarity_threshold = parse_var("SIMILARITY_THRESHOLD", &value)?;
        }
        if let Some(path) = lookup("EMPLOYEE_DATA_PATH") {
            self.paths.employee_data = PathBuf::from(path);
        }
        if let Some(path) = lookup("POLICIES_DIR") {
            self.paths.policies_dir = PathBuf::from(path);
        }
        if let Some(path) = lookup("VECTOR_STORE_PATH") {
            self.paths.vector_store = PathBuf::from(path);
        }
        if let Some(value) = lookup("LLM_PROVIDER") {
            let kind: ProviderKind = value.parse()?;
            self.llm.provider = kind;
            // Ollama answers need Ollama vectors unless embeddings were set explicitly offline
            if kind == ProviderKind::Ollama && self.embeddings.provider == ProviderKind::Gemini {
                self.embeddings.provider = ProviderKind::Ollama;
                self.embeddings.model = "nomic-embed-text".to_string();
            }
        }
        if let Some(value) = lookup("EMBEDDING_PROVIDER") {
            self.embeddings.provider = value.parse()?;
        }
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.llm.base_url = url;
        }
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(Error::config(format!(
                "temperature must be between 0 and 1, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.provider == ProviderKind::Hashing {
            return Err(Error::config("the hashing provider cannot generate answers"));
        }
        if self.llm.max_retries > MAX_RETRIES {
            return Err(Error::config(format!(
                "max_retries must be at most {}, got {}",
                MAX_RETRIES, self.llm.max_retries
            )));
        }
        if self.retrieval.top_k < 1 {
            return Err(Error::config("retrieval top_k must be at least 1"));
        }
        let threshold = self.retrieval.similarity_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(Error::config(format!(
                "similarity threshold must be a non-negative number, got {}",
                threshold
            )));
        }
        if self.chunking.chunk_size < MIN_CHUNK_SIZE {
            return Err(Error::config(format!(
                "chunk_size must be at least {}",
                MIN_CHUNK_SIZE
            )));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config("chunk_overlap must be less than chunk_size"));
        }
        if self.embeddings.dimensions == 0 || self.embeddings.batch_size == 0 {
            return Err(Error::config(
                "embedding dimensions and batch_size must be positive",
            ));
        }
        Ok(())
    }

    /// Request budget for provider calls
    pub fn provider_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.llm.timeout_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{} has an invalid value '{}'", name, value)))
}
