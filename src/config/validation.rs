//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Every chamber address is `host:port` with a numeric port
//! - Sizes and limits are non-zero, HTTP paths are absolute
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WalkerConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::WalkerConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &WalkerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let addresses = [
        ("handshake.address", &config.handshake.address),
        ("udp_callback.address", &config.udp_callback.address),
        ("word_lengths.address", &config.word_lengths.address),
        ("word_puzzle.address", &config.word_puzzle.address),
        ("file_digest.address", &config.file_digest.address),
        ("yap.address", &config.yap.address),
        ("http_proxy.control_address", &config.http_proxy.control_address),
        ("http_proxy.bind_address", &config.http_proxy.bind_address),
        ("http_proxy.upstream", &config.http_proxy.upstream),
        ("finale.address", &config.finale.address),
    ];
    for (field, address) in addresses {
        if let Err(message) = check_host_port(address) {
            errors.push(ValidationError::new(field, message));
        }
    }

    if config.transport.read_chunk_size == 0 {
        errors.push(ValidationError::new("transport.read_chunk_size", "must be greater than 0"));
    }
    if config.transport.datagram_size < crate::codec::yap::HEADER_SIZE {
        errors.push(ValidationError::new(
            "transport.datagram_size",
            "must hold at least a YAP header",
        ));
    }
    if config.transport.udp_reply_timeout_secs == Some(0) {
        errors.push(ValidationError::new(
            "transport.udp_reply_timeout_secs",
            "must be greater than 0 when set",
        ));
    }
    if config.http_proxy.max_concurrent_fetches == 0 {
        errors.push(ValidationError::new(
            "http_proxy.max_concurrent_fetches",
            "must be greater than 0",
        ));
    }
    for (field, path) in [
        ("http_proxy.upstream_path_prefix", &config.http_proxy.upstream_path_prefix),
        ("http_proxy.submit_path", &config.http_proxy.submit_path),
    ] {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, "must start with '/'"));
        }
    }
    if let Some(username) = &config.identity.username {
        if username.trim().is_empty() {
            errors.push(ValidationError::new("identity.username", "must not be blank"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_host_port(address: &str) -> Result<(), String> {
    let Some((host, port)) = address.rsplit_once(':') else {
        return Err(format!("{:?} is not host:port", address));
    };
    if host.is_empty() {
        return Err(format!("{:?} has no host", address));
    }
    port.parse::<u16>()
        .map(|_| ())
        .map_err(|_| format!("{:?} has an invalid port", address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&WalkerConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = WalkerConfig::default();
        config.handshake.address = "rick".into();
        config.yap.address = ":6001".into();
        config.finale.address = "rick:99999".into();
        config.transport.read_chunk_size = 0;
        config.http_proxy.submit_path = "submit".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "handshake.address",
                "yap.address",
                "finale.address",
                "transport.read_chunk_size",
                "http_proxy.submit_path",
            ]
        );
    }

    #[test]
    fn ipv6_style_address_uses_last_colon() {
        assert!(check_host_port("[::1]:8080").is_ok());
    }
}
