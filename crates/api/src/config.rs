//! Application configuration loaded from environment variables.

use booking::BookingSettings;
use serde::Serialize;
use wizard::MissingPrerequisitePolicy;

/// Format of the log lines written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `BOOKING_ENABLED`: whether booking sessions can be started (default: `true`)
/// - `CURRENCY_SYMBOL`: symbol used for fiat prices (default: `"€"`)
/// - `TOKEN_SYMBOL`: symbol used for token prices (default: `"TDF"`)
/// - `CHAIN_ID`: chain token payments are made on (default: `42220`)
/// - `MISSING_PREREQUISITE_POLICY`: `restart` or `reject` (default: `restart`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub booking: BookingConfig,
    /// Variables that were set but could not be parsed.
    pub ignored: Vec<&'static str>,
}

/// Booking settings shared with the pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingConfig {
    pub enabled: bool,
    pub currency_symbol: String,
    pub token_symbol: String,
    pub chain_id: u64,
    pub missing_prerequisite_policy: MissingPrerequisitePolicy,
}

impl BookingConfig {
    /// Settings handed to the booking coordinator.
    pub fn settings(&self) -> BookingSettings {
        BookingSettings {
            chain_id: self.chain_id,
            policy: self.missing_prerequisite_policy,
            ..BookingSettings::default()
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            currency_symbol: "€".to_string(),
            token_symbol: "TDF".to_string(),
            chain_id: 42220,
            missing_prerequisite_policy: MissingPrerequisitePolicy::Restart,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Reads `key` through `lookup`, recording it in `ignored` when `parse` rejects it.
fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    parse: impl Fn(&str) -> Option<T>,
    ignored: &mut Vec<&'static str>,
) -> Option<T> {
    let raw = lookup(key)?;
    let value = parse(&raw);
    if value.is_none() {
        ignored.push(key);
    }
    value
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`. Unparseable values fall back to
    /// defaults and their variable names are listed in `ignored`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut ignored = Vec::new();
        let defaults = BookingConfig::default();
        let booking = BookingConfig {
            enabled: parse_var(&lookup, "BOOKING_ENABLED", parse_flag, &mut ignored)
                .unwrap_or(defaults.enabled),
            currency_symbol: lookup("CURRENCY_SYMBOL").unwrap_or(defaults.currency_symbol),
            token_symbol: lookup("TOKEN_SYMBOL").unwrap_or(defaults.token_symbol),
            chain_id: parse_var(&lookup, "CHAIN_ID", |v| v.parse().ok(), &mut ignored)
                .unwrap_or(defaults.chain_id),
            missing_prerequisite_policy: parse_var(
                &lookup,
                "MISSING_PREREQUISITE_POLICY",
                |v| v.parse().ok(),
                &mut ignored,
            )
            .unwrap_or(defaults.missing_prerequisite_policy),
        };

        let log_format = parse_var(
            &lookup,
            "LOG_FORMAT",
            |v| match v.trim().to_ascii_lowercase().as_str() {
                "pretty" => Some(LogFormat::Pretty),
                "json" => Some(LogFormat::Json),
                _ => None,
            },
            &mut ignored,
        )
        .unwrap_or_default();

        Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT", |p| p.parse().ok(), &mut ignored).unwrap_or(3000),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_format,
            booking,
            ignored,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            booking: BookingConfig::default(),
            ignored: Vec::new(),
        }
    }
}
