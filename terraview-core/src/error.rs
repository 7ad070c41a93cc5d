use thiserror::Error;

/// Errors surfaced by the relay.
///
/// None of these are fatal to the process: upstream failures degrade to
/// "no data this cycle" and delivery failures only tear down the one
/// offending connection.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Malformed payload: {context}")]
    MalformedPayload { context: String },

    #[error("Delivery failure: {0}")]
    DeliveryFailure(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedPayload {
                context: err.to_string(),
            }
        } else {
            Self::UpstreamUnavailable(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_error_maps_to_serialization() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_error_display() {
        let err = Error::UpstreamUnavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Upstream unavailable: connection refused");

        let err = Error::MalformedPayload {
            context: "missing field `id`".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed payload: missing field `id`");
    }
}
