//! Error taxonomy for bridge operations

use crate::config::ConfigError;

/// A request violated the configured batch/text limits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} array length {len} exceeds max batch size of {limit}")]
    BatchTooLarge {
        field: String,
        len: usize,
        limit: usize,
    },

    #[error("{field}[{index}] length {len} exceeds max text length of {limit}")]
    TextTooLong {
        field: String,
        index: usize,
        len: usize,
        limit: usize,
    },
}

/// Failure of one logical request against one host
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("GPU host {host} returned 503 after {consecutive} consecutive attempt(s)")]
    Overloaded { host: String, consecutive: u32 },

    #[error("GPU host {host} {path} rejected credentials ({status}): {body}")]
    Unauthorized {
        host: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("GPU host {host} {path} returned {status}: {body}")]
    Status {
        host: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("GPU host {host} {path} timed out after {timeout_ms}ms")]
    Timeout {
        host: String,
        path: String,
        timeout_ms: u64,
    },

    #[error("GPU host {host} {path} request failed: {source}")]
    Transport {
        host: String,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GPU host {host} {path} returned an undecodable body: {source}")]
    Decode {
        host: String,
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HostError {
    pub fn is_overload(&self) -> bool {
        matches!(self, HostError::Overloaded { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, HostError::Unauthorized { .. })
    }
}

/// Top-level error returned by every public client operation
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("All GPU hosts failed for {path}: {}", describe_last(.last))]
    AllHostsFailed {
        path: String,
        #[source]
        last: Option<HostError>,
    },
}

fn describe_last(last: &Option<HostError>) -> String {
    match last {
        Some(e) => e.to_string(),
        None => "no host attempted".to_string(),
    }
}

impl BridgeError {
    /// The last host-level failure behind an `AllHostsFailed`
    pub fn last_host_error(&self) -> Option<&HostError> {
        match self {
            BridgeError::AllHostsFailed { last, .. } => last.as_ref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.last_host_error().is_some_and(HostError::is_unauthorized)
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::BatchTooLarge {
            field: "texts".to_string(),
            len: 101,
            limit: 100,
        };
        assert_eq!(err.to_string(), "texts array length 101 exceeds max batch size of 100");

        let err = ValidationError::TextTooLong {
            field: "texts".to_string(),
            index: 0,
            len: 100,
            limit: 50,
        };
        assert_eq!(err.to_string(), "texts[0] length 100 exceeds max text length of 50");
    }

    #[test]
    fn test_overload_message_mentions_count() {
        let err = HostError::Overloaded {
            host: "gpu-1".to_string(),
            consecutive: 4,
        };
        assert!(err.is_overload());
        assert_eq!(err.to_string(), "GPU host gpu-1 returned 503 after 4 consecutive attempt(s)");
    }

    #[test]
    fn test_all_hosts_failed_wraps_last() {
        let err = BridgeError::AllHostsFailed {
            path: "/embed".to_string(),
            last: Some(HostError::Unauthorized {
                host: "gpu-1".to_string(),
                path: "/embed".to_string(),
                status: 401,
                body: "{\"detail\":\"Unauthorized\"}".to_string(),
            }),
        };
        assert!(err.is_unauthorized());
        assert!(err.to_string().starts_with("All GPU hosts failed for /embed: GPU host gpu-1"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_validation_is_not_host_failure() {
        let err: BridgeError = ValidationError::BatchTooLarge {
            field: "candidates".to_string(),
            len: 5,
            limit: 3,
        }
        .into();
        assert!(err.last_host_error().is_none());
        assert_eq!(err.to_string(), "candidates array length 5 exceeds max batch size of 3");
    }
}
