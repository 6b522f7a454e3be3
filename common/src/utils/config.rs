use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    Memory,
}

fn default_storage_kind() -> StorageKind {
    StorageKind::Local
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub surrealdb_address: String,
    pub surrealdb_username: String,
    pub surrealdb_password: String,
    pub surrealdb_namespace: String,
    /// Database holding the authoritative course records.
    pub record_database: String,
    /// Database holding the vector index points. Kept separate from the
    /// record database; the two are never written in one transaction.
    pub vector_database: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_storage_kind")]
    pub storage: StorageKind,
    #[serde(default = "default_embedding_backend")]
    pub embedding_backend: String,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: u32,
    #[serde(default = "default_extraction_model")]
    pub extraction_model: String,
    #[serde(default = "default_query_model")]
    pub query_model: String,
    #[serde(default = "default_vector_namespace")]
    pub vector_namespace: String,
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Sleep after each non-cached extraction call, for rate-limited tiers.
    #[serde(default)]
    pub extraction_pacing_ms: u64,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_source_dir() -> String {
    "./raw-pdfs".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_backend() -> String {
    "fastembed".to_string()
}

// Matches the default fastembed model; override together with the backend.
fn default_embedding_dimensions() -> u32 {
    384
}

fn default_extraction_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_query_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_vector_namespace() -> String {
    "courses".to_string()
}

fn default_worker_pool_size() -> usize {
    4
}

fn default_batch_size() -> usize {
    8
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let config: AppConfig = Config::builder()
            .set_override("openai_api_key", "key")
            .and_then(|b| b.set_override("surrealdb_address", "mem://"))
            .and_then(|b| b.set_override("surrealdb_username", "root"))
            .and_then(|b| b.set_override("surrealdb_password", "root"))
            .and_then(|b| b.set_override("surrealdb_namespace", "test"))
            .and_then(|b| b.set_override("record_database", "records"))
            .and_then(|b| b.set_override("vector_database", "vectors"))
            .and_then(|builder| builder.build())
            .and_then(Config::try_deserialize)
            .expect("config with defaults should deserialize");

        assert_eq!(config.data_dir, "./data");
        assert_eq!(config.source_dir, "./raw-pdfs");
        assert_eq!(config.embedding_backend, "fastembed");
        assert_eq!(config.embedding_dimensions, 384);
        assert_eq!(config.vector_namespace, "courses");
        assert_eq!(config.worker_pool_size, 4);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.extraction_pacing_ms, 0);
    }
}
