//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!
//! Relay config ([config] section, or pushed by the OpenHIM core):
//!     → handle.rs validates it into a ConfigSnapshot
//!     → atomic swap of Arc<ConfigSnapshot>
//!     → each relay reads one snapshot for its whole duration
//!
//! On file change (local mode):
//!     watcher.rs detects change → loader.rs → handle.rs swap
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full replacement
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod handle;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use handle::{ConfigHandle, ConfigSnapshot};
pub use loader::{load_config, ConfigError};
pub use schema::{
    ApiConfig, AppConfig, LimitsConfig, ListenerConfig, MediatorConfig, MediatorInfo,
    ObservabilityConfig,
};
pub use validation::ValidationError;
