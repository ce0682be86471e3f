// Single source of truth for all default values.

// --- Retry ---
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TRANSIENT_BASE_DELAY_MS: u64 = 200;
pub const DEFAULT_RATE_LIMITED_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 10_000;
pub const DEFAULT_JITTER_FRACTION: f64 = 0.2;

// --- Circuit breaker ---
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_FAILURE_WINDOW_SECS: u64 = 60;
pub const DEFAULT_COOLDOWN_SECS: u64 = 30;
pub const DEFAULT_COOLDOWN_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_MAX_COOLDOWN_SECS: u64 = 300; // 5 minutes

// --- Orchestrator ---
pub const DEFAULT_FANOUT_DEADLINE_MS: u64 = 10_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_FALLBACK_BACKEND: &str = "in_memory";
pub const DEFAULT_DEDUP_BY_CONTENT: bool = false;

// --- Cache ---
pub const DEFAULT_CACHE_ENABLED: bool = true;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 180; // 3 minutes
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 1_000;

// --- Scoring ---
pub const DEFAULT_WEIGHT_SIMILARITY: f64 = 0.30;
pub const DEFAULT_WEIGHT_RECENCY: f64 = 0.15;
pub const DEFAULT_WEIGHT_AUTHORITY: f64 = 0.20;
pub const DEFAULT_WEIGHT_CONTEXT_RELEVANCE: f64 = 0.15;
pub const DEFAULT_WEIGHT_KEYWORD_MATCH: f64 = 0.10;
pub const DEFAULT_WEIGHT_SEMANTIC_MATCH: f64 = 0.05;
pub const DEFAULT_WEIGHT_USER_FEEDBACK: f64 = 0.05;
pub const DEFAULT_RECENCY_HALF_LIFE_DAYS: f64 = 30.0;
pub const DEFAULT_NEAR_DUPLICATE_THRESHOLD: f64 = 0.85;
pub const DEFAULT_SHINGLE_SIZE: usize = 3;
pub const DEFAULT_SEMANTIC_ENABLED: bool = false;

// --- Metrics ---
pub const DEFAULT_METRICS_RETENTION_DAYS: i64 = 30;

// --- Backends ---
pub const DEFAULT_HOSTED_INDEX_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_HOSTED_INDEX_TIMEOUT_MS: u64 = 8_000;
pub const DEFAULT_VECTOR_DB_FILENAME: &str = "quarry-vectors.db";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
