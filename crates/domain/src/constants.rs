//! Domain constants shared by the client, cache and worker.

/// Freshness window for cached API responses.
pub const CACHE_TTL_SECONDS: i64 = 30;

/// Prefix of every response cache key.
pub const CACHE_KEY_PREFIX: &str = "apsis_mail:api:";

/// Queue that carries deferred subscriber creation.
pub const SUBSCRIPTION_QUEUE_NAME: &str = "apsis_mail_add_subscriber";

/// Time budget for one drain of the subscription queue.
pub const SUBSCRIPTION_WORKER_TIME_BUDGET_SECS: u64 = 60;

// HTTP defaults
/// Request timeout when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("apsis-client/", env!("CARGO_PKG_VERSION"));
