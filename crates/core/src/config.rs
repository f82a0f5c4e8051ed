use serde::Deserialize;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `SHELFWISE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Where the rating/user/book tables live and how they are pruned before
/// the engine sees them.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_path")]
    pub data_path: String,
    #[serde(default = "default_min_book_ratings")]
    pub min_book_ratings: usize,
    #[serde(default = "default_min_user_ratings")]
    pub min_user_ratings: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Neighbors contributing to a collaborative prediction.
    #[serde(default = "default_cf_neighbors")]
    pub cf_neighbors: usize,
    #[serde(default = "default_similarity_floor")]
    pub similarity_floor: f64,
    #[serde(default = "default_similarity_ceiling")]
    pub similarity_ceiling: f64,
    /// Ratings strictly above this mark an item as liked.
    #[serde(default = "default_liked_threshold")]
    pub liked_threshold: f32,
    #[serde(default = "default_content_max_terms")]
    pub content_max_terms: usize,
    #[serde(default = "default_title_max_terms")]
    pub title_max_terms: usize,
    #[serde(default = "default_weight_cf")]
    pub weight_cf: f64,
    #[serde(default = "default_weight_cb")]
    pub weight_cb: f64,
    #[serde(default = "default_search_threshold")]
    pub search_threshold: f64,
    #[serde(default = "default_quick_search_threshold")]
    pub quick_search_threshold: f64,
    #[serde(default = "default_k")]
    pub default_k: usize,
    #[serde(default = "default_min_k")]
    pub min_k: usize,
    #[serde(default = "default_max_k")]
    pub max_k: usize,
    /// Periodic rebuild interval; 0 disables it.
    #[serde(default)]
    pub refresh_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

// Default functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    5000
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_data_path() -> String {
    "./data".to_string()
}
fn default_min_book_ratings() -> usize {
    3
}
fn default_min_user_ratings() -> usize {
    5
}
fn default_cf_neighbors() -> usize {
    10
}
fn default_similarity_floor() -> f64 {
    0.1
}
fn default_similarity_ceiling() -> f64 {
    0.99
}
fn default_liked_threshold() -> f32 {
    3.0
}
fn default_content_max_terms() -> usize {
    500
}
fn default_title_max_terms() -> usize {
    300
}
fn default_weight_cf() -> f64 {
    0.4
}
fn default_weight_cb() -> f64 {
    0.6
}
fn default_search_threshold() -> f64 {
    0.3
}
fn default_quick_search_threshold() -> f64 {
    0.7
}
fn default_k() -> usize {
    10
}
fn default_min_k() -> usize {
    1
}
fn default_max_k() -> usize {
    100
}
fn default_cache_enabled() -> bool {
    true
}
fn default_ttl_secs() -> u64 {
    3600
}
fn default_max_entries() -> usize {
    100_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            min_book_ratings: default_min_book_ratings(),
            min_user_ratings: default_min_user_ratings(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cf_neighbors: default_cf_neighbors(),
            similarity_floor: default_similarity_floor(),
            similarity_ceiling: default_similarity_ceiling(),
            liked_threshold: default_liked_threshold(),
            content_max_terms: default_content_max_terms(),
            title_max_terms: default_title_max_terms(),
            weight_cf: default_weight_cf(),
            weight_cb: default_weight_cb(),
            search_threshold: default_search_threshold(),
            quick_search_threshold: default_quick_search_threshold(),
            default_k: default_k(),
            min_k: default_min_k(),
            max_k: default_max_k(),
            refresh_interval_secs: 0,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            data: DataConfig::default(),
            engine: EngineConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Clamp a caller-supplied result count into `[min_k, max_k]`.
    pub fn clamp_k(&self, k: Option<usize>) -> usize {
        k.unwrap_or(self.default_k).clamp(self.min_k, self.max_k)
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config file.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("SHELFWISE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
