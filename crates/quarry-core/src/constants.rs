/// Quarry version string.
pub const QUARRY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the log filter.
pub const LOG_ENV_VAR: &str = "QUARRY_LOG";

/// Environment variable holding the hosted index API key.
pub const HOSTED_INDEX_API_KEY_ENV: &str = "QUARRY_HOSTED_INDEX_API_KEY";

/// Prefix for environment overrides applied on top of the TOML config.
pub const ENV_PREFIX: &str = "QUARRY_";

/// Maximum conversation turns kept in a query context.
pub const MAX_CONTEXT_TURNS: usize = 10;

/// Maximum prior query strings kept in a query context.
pub const MAX_PREVIOUS_QUERIES: usize = 5;

/// Upper bound on `Query::max_results`.
pub const MAX_RESULTS_LIMIT: usize = 100;

/// Neutral value for factors that have no signal.
pub const NEUTRAL_FACTOR: f64 = 0.5;

/// Tolerance when checking that weights sum to 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

// --- Candidate metadata keys ---

/// RFC 3339 string or epoch seconds of the last document update.
pub const META_UPDATED_AT: &str = "updated_at";
/// Fallback timestamp key when `updated_at` is absent.
pub const META_CREATED_AT: &str = "created_at";
/// Source trust tier: "official", "verified", "community", "unverified", or a number in [0,1].
pub const META_TRUST_TIER: &str = "trust_tier";
/// Array of string tags (or a comma-separated string).
pub const META_TAGS: &str = "tags";
/// Domain label of the document.
pub const META_DOMAIN: &str = "domain";
