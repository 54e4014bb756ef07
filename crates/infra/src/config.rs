//! Configuration loading and representation.
//!
//! Everything comes from environment variables. Missing values fall back to
//! defaults; present but malformed values are an error.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use courierflow_orders::ProofPolicy;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_POLL_SECS: u64 = 30;
pub const DEFAULT_COURIER_FEE: u64 = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub proof_policy: ProofPolicy,
    pub max_page_size: usize,
    pub notification_poll_interval: Duration,
    /// Paid to a courier per completed delivery, in minor currency units.
    pub courier_fee_per_delivery: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            proof_policy: ProofPolicy::default(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            notification_poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            courier_fee_per_delivery: DEFAULT_COURIER_FEE,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set; using insecure dev default");
            DEFAULT_JWT_SECRET.to_string()
        });

        let proof_defaults = ProofPolicy::default();
        let allowed_mime_types = match get("PROOF_ALLOWED_MIME_TYPES") {
            Some(raw) => split_list(&raw),
            None => proof_defaults.allowed_mime_types,
        };
        if allowed_mime_types.is_empty() {
            return Err(ConfigError::invalid("PROOF_ALLOWED_MIME_TYPES", "no mime types listed"));
        }

        let max_image_bytes = parse_positive(&get, "PROOF_MAX_IMAGE_BYTES", proof_defaults.max_image_bytes)?;
        let max_page_size =
            parse_positive(&get, "QUERY_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE as u64)? as usize;
        let poll_secs = parse_positive(&get, "NOTIFICATION_POLL_SECS", DEFAULT_POLL_SECS)?;
        let courier_fee_per_delivery = match get("COURIER_FEE_PER_DELIVERY") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| ConfigError::invalid("COURIER_FEE_PER_DELIVERY", e.to_string()))?,
            None => DEFAULT_COURIER_FEE,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            proof_policy: ProofPolicy {
                allowed_mime_types,
                max_image_bytes,
            },
            max_page_size,
            notification_poll_interval: Duration::from_secs(poll_secs),
            courier_fee_per_delivery,
        })
    }
}

fn parse_positive(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::invalid(key, "must be greater than zero")),
        Ok(v) => Ok(v),
        Err(e) => Err(ConfigError::invalid(key, e.to_string())),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.notification_poll_interval, Duration::from_secs(30));
        // The proof policy default is owned by the domain.
        assert_eq!(cfg.proof_policy, ProofPolicy::default());
        assert!(cfg.proof_policy.allowed_mime_types.iter().any(|m| m == "image/webp"));
    }

    #[test]
    fn values_are_read_and_normalized() {
        let cfg = EngineConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("PROOF_ALLOWED_MIME_TYPES", " Image/PNG , image/heic,"),
            ("PROOF_MAX_IMAGE_BYTES", "2048"),
            ("QUERY_MAX_PAGE_SIZE", "25"),
            ("COURIER_FEE_PER_DELIVERY", "0"),
        ]))
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(
            cfg.proof_policy.allowed_mime_types,
            vec!["image/png".to_string(), "image/heic".to_string()]
        );
        assert_eq!(cfg.proof_policy.max_image_bytes, 2048);
        assert_eq!(cfg.max_page_size, 25);
        assert_eq!(cfg.courier_fee_per_delivery, 0);
    }

    #[test]
    fn malformed_values_are_rejected_not_defaulted() {
        let err = EngineConfig::from_lookup(lookup(&[("QUERY_MAX_PAGE_SIZE", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "QUERY_MAX_PAGE_SIZE", .. }));

        let err = EngineConfig::from_lookup(lookup(&[("NOTIFICATION_POLL_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "NOTIFICATION_POLL_SECS", .. }));

        assert!(EngineConfig::from_lookup(lookup(&[("BIND_ADDR", "nowhere")])).is_err());
    }
}
