//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the walker.
//! All types derive Serde traits for deserialization from config files, and
//! every section defaults to the values of the reference deployment.

use serde::{Deserialize, Serialize};

/// Root configuration for a walk.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Who is walking.
    pub identity: IdentityConfig,

    /// Socket read and datagram sizing.
    pub transport: TransportConfig,

    /// Chamber 0: username handshake.
    pub handshake: EndpointConfig,

    /// Chamber 1: UDP callback.
    pub udp_callback: UdpCallbackConfig,

    /// Chamber 2: word lengths.
    pub word_lengths: WordLengthsConfig,

    /// Chamber 3: word puzzle (decipher or word-after-sum).
    pub word_puzzle: WordPuzzleConfig,

    /// Chamber 4: length-prefixed file digest.
    pub file_digest: FileDigestConfig,

    /// Chamber 5: YAP over UDP.
    pub yap: EndpointConfig,

    /// Chamber 6: HTTP proxy.
    pub http_proxy: HttpProxyConfig,

    /// Chamber 7: final message.
    pub finale: EndpointConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            transport: TransportConfig::default(),
            handshake: EndpointConfig::new("rick:2000"),
            udp_callback: UdpCallbackConfig::default(),
            word_lengths: WordLengthsConfig::default(),
            word_puzzle: WordPuzzleConfig::default(),
            file_digest: FileDigestConfig::default(),
            yap: EndpointConfig::new("rick:6001"),
            http_proxy: HttpProxyConfig::default(),
            finale: EndpointConfig::new("rick:33333"),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Identity of the walker.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    /// Username sent to chamber 0. Falls back to `$USER` when unset.
    pub username: Option<String>,
}

/// Transport sizing shared by all chambers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Bytes requested per TCP read.
    pub read_chunk_size: usize,

    /// Receive buffer for a single UDP datagram.
    pub datagram_size: usize,

    /// Give up waiting for a UDP reply after this many seconds. `None` waits forever.
    pub udp_reply_timeout_secs: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: 1024,
            datagram_size: 2048,
            udp_reply_timeout_secs: None,
        }
    }
}

/// A chamber reachable at a single address.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Chamber address (e.g., "rick:2000").
    pub address: String,
}

impl EndpointConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

/// Chamber 1 settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UdpCallbackConfig {
    pub address: String,

    /// Local UDP port to bind; 0 lets the OS pick one.
    pub callback_port: u16,
}

impl Default for UdpCallbackConfig {
    fn default() -> Self {
        Self {
            address: "rick:4000".to_string(),
            callback_port: 0,
        }
    }
}

/// Chamber 2 settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WordLengthsConfig {
    pub address: String,

    /// Stop once the summed word lengths reach this value.
    pub max_total: usize,
}

impl Default for WordLengthsConfig {
    fn default() -> Self {
        Self {
            address: "rick:3010".to_string(),
            max_total: 1000,
        }
    }
}

/// Which puzzle chamber 3 poses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PuzzleMode {
    /// Decipher the words preceding an in-stream key.
    Decipher,
    /// Report the first word after a running sum is exceeded.
    WordAfterSum,
}

/// Chamber 3 settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WordPuzzleConfig {
    pub address: String,

    pub mode: PuzzleMode,

    /// Sum threshold for `word-after-sum` mode.
    pub max_total: u64,
}

impl Default for WordPuzzleConfig {
    fn default() -> Self {
        Self {
            address: "rick:6501".to_string(),
            mode: PuzzleMode::Decipher,
            max_total: 1200,
        }
    }
}

/// Digest used to fingerprint the transferred file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
}

/// Chamber 4 settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileDigestConfig {
    pub address: String,

    pub algorithm: HashAlgorithm,
}

impl Default for FileDigestConfig {
    fn default() -> Self {
        Self {
            address: "rick:9000".to_string(),
            algorithm: HashAlgorithm::Md5,
        }
    }
}

/// Chamber 6 settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpProxyConfig {
    /// Where the announcement is sent and error reports are read from.
    pub control_address: String,

    /// Local address the proxy listens on; port 0 picks a free port.
    pub bind_address: String,

    /// Upstream file provider (e.g., "web:81"). Also used as the Host header.
    pub upstream: String,

    /// Prefix prepended to the requested path when forwarding.
    pub upstream_path_prefix: String,

    /// GET requests under this path are submissions, not fetches.
    pub submit_path: String,

    /// Upstream fetches allowed in flight at once; fetches past the limit
    /// are answered with `503` instead of being forwarded.
    pub max_concurrent_fetches: usize,
}

impl Default for HttpProxyConfig {
    fn default() -> Self {
        Self {
            control_address: "rick:8003".to_string(),
            bind_address: "0.0.0.0:0".to_string(),
            upstream: "web:81".to_string(),
            upstream_path_prefix: "/rfc".to_string(),
            submit_path: "/submit".to_string(),
            max_concurrent_fetches: 64,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default `tracing` filter; `RUST_LOG` takes precedence.
    pub log_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "chamber_walker=debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = WalkerConfig::default();
        assert_eq!(config.handshake.address, "rick:2000");
        assert_eq!(config.udp_callback.address, "rick:4000");
        assert_eq!(config.word_lengths.max_total, 1000);
        assert_eq!(config.word_puzzle.mode, PuzzleMode::Decipher);
        assert_eq!(config.file_digest.algorithm, HashAlgorithm::Md5);
        assert_eq!(config.yap.address, "rick:6001");
        assert_eq!(config.http_proxy.upstream, "web:81");
        assert_eq!(config.finale.address, "rick:33333");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: WalkerConfig = toml::from_str(
            r#"
            [identity]
            username = "fast_rhino"

            [word_puzzle]
            mode = "word-after-sum"

            [file_digest]
            algorithm = "sha1"

            [yap]
            address = "127.0.0.1:6001"
            "#,
        )
        .unwrap();

        assert_eq!(config.identity.username.as_deref(), Some("fast_rhino"));
        assert_eq!(config.word_puzzle.mode, PuzzleMode::WordAfterSum);
        assert_eq!(config.word_puzzle.max_total, 1200);
        assert_eq!(config.file_digest.algorithm, HashAlgorithm::Sha1);
        assert_eq!(config.transport.read_chunk_size, 1024);
        assert_eq!(config.yap.address, "127.0.0.1:6001");
        assert_eq!(config.finale.address, "rick:33333");
    }

    #[test]
    fn endpoint_section_requires_address() {
        assert!(toml::from_str::<WalkerConfig>("[finale]\n").is_err());
    }
}
