//! Configuration types for lognorm.
//!
//! [`Settings::load`] layers an optional TOML file and `LOGNORM__*`
//! environment variables on top of the embedded defaults.
//! [`Settings::defaults`] returns the defaults without touching the
//! filesystem or the environment (useful in tests).
//!
//! Nothing else in this crate reads configuration; the binary hands the
//! values on as plain constructor parameters.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[broker]
endpoints      = ["nats://127.0.0.1:4222"]
ack_timeout_ms = 5000
nack_delay_ms  = 1000
egress_subject = "logs.normalized"
queue_capacity = 4096

[sources]
container_subject  = "logs.container"
journal_subject    = "logs.journal"
structured_subject = "logs.ecs"

[log]
filter = "info"
"#;

const ENV_PREFIX: &str = "LOGNORM";
const ENV_SEPARATOR: &str = "__";

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub broker: BrokerSettings,
    #[serde(default)]
    pub sources: SourceSettings,
    #[serde(default)]
    pub log: LogSettings,
}

/// `[broker]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerSettings {
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
    #[serde(default = "default_nack_delay_ms")]
    pub nack_delay_ms: u64,
    #[serde(default = "default_egress_subject")]
    pub egress_subject: String,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_endpoints() -> Vec<String> { vec!["nats://127.0.0.1:4222".to_string()] }
fn default_ack_timeout_ms() -> u64 { 5000 }
fn default_nack_delay_ms() -> u64 { 1000 }
fn default_egress_subject() -> String { "logs.normalized".to_string() }
fn default_queue_capacity() -> usize { 4096 }

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            ack_timeout_ms: default_ack_timeout_ms(),
            nack_delay_ms: default_nack_delay_ms(),
            egress_subject: default_egress_subject(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl BrokerSettings {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn nack_delay(&self) -> Duration {
        Duration::from_millis(self.nack_delay_ms)
    }
}

/// `[sources]` section: inbound subject per adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_container_subject")]
    pub container_subject: String,
    #[serde(default = "default_journal_subject")]
    pub journal_subject: String,
    #[serde(default = "default_structured_subject")]
    pub structured_subject: String,
}

fn default_container_subject() -> String { "logs.container".to_string() }
fn default_journal_subject() -> String { "logs.journal".to_string() }
fn default_structured_subject() -> String { "logs.ecs".to_string() }

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            container_subject: default_container_subject(),
            journal_subject: default_journal_subject(),
            structured_subject: default_structured_subject(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String { "info".to_string() }

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Settings {
    /// Load the defaults, then `path` (if given, must exist), then
    /// `LOGNORM__SECTION__KEY` environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .list_separator(",")
                    .with_list_parse_key("broker.endpoints")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
