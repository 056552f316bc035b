//! Centralized default constants for descry.
//!
//! Every crate reads its fallback values from here so that the environment
//! variable tables in `from_env` constructors stay in sync.

// =============================================================================
// WORKER
// =============================================================================

/// Sleep between polls when the queue is empty, in seconds.
pub const IDLE_INTERVAL_SECS: u64 = 5;

/// Backoff schedule in seconds, indexed by retry attempt (1-based, capped at the last entry).
pub const RETRY_DELAYS_SECS: [u64; 3] = [5, 10, 20];

/// Transient failures a job may accumulate before it is abandoned.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Upper bound for one extraction call, in seconds.
pub const EXTRACTION_TIMEOUT_SECS: u64 = 300;

/// Default worker event broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Base URL of the notification receiver. Endpoint names are appended to it.
pub const NOTIFY_BASE_URL: &str = "http://127.0.0.1:3000/image_cores/";

/// HTTP timeout for a single notification request, in seconds.
pub const NOTIFY_TIMEOUT_SECS: u64 = 30;

/// Receiver endpoint for status events.
pub const STATUS_ENDPOINT: &str = "status_receiver";

/// Receiver endpoint for description events.
pub const DESCRIPTION_ENDPOINT: &str = "description_receiver";

// =============================================================================
// INPUT VALIDATION
// =============================================================================

/// Maximum accepted input file size in bytes (10 MB).
pub const MAX_INPUT_SIZE_BYTES: u64 = 10 * 1024 * 1024;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Ollama base URL.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Timeout for vision generation requests in seconds.
pub const VISION_TIMEOUT_SECS: u64 = 120;

/// Prompt sent with every image to the vision backend.
pub const VISION_PROMPT: &str =
    "Describe this image in detail. Include any text visible in the image.";

// =============================================================================
// SERVER / STORAGE
// =============================================================================

/// Default SQLite database URL for the queue.
pub const DATABASE_URL: &str = "sqlite://descry_queue.db";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8000;

/// Default HTTP bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

// =============================================================================
// ENVIRONMENT VARIABLE NAMES
// =============================================================================

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_NOTIFY_BASE_URL: &str = "NOTIFY_BASE_URL";
pub const ENV_NOTIFY_TIMEOUT_SECS: &str = "NOTIFY_TIMEOUT_SECS";
pub const ENV_IDLE_INTERVAL_SECS: &str = "IDLE_INTERVAL_SECS";
pub const ENV_RETRY_DELAYS_SECS: &str = "RETRY_DELAYS_SECS";
pub const ENV_MAX_RETRY_ATTEMPTS: &str = "MAX_RETRY_ATTEMPTS";
pub const ENV_EXTRACTION_TIMEOUT_SECS: &str = "EXTRACTION_TIMEOUT_SECS";
pub const ENV_MAX_INPUT_SIZE_BYTES: &str = "MAX_INPUT_SIZE_BYTES";
pub const ENV_INPUT_ROOT: &str = "INPUT_ROOT";
pub const ENV_WORKER_ENABLED: &str = "WORKER_ENABLED";
pub const ENV_OLLAMA_URL: &str = "OLLAMA_URL";

/// Overrides the Ollama model tag used for every non-test selector.
pub const ENV_OLLAMA_VISION_MODEL: &str = "OLLAMA_VISION_MODEL";
