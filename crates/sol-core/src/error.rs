use thiserror::Error;

/// Errors raised by the Solana client core.
///
/// Every variant is returned before any wire bytes are produced, so a caller
/// that sees one of these never holds a partially-built transaction.
#[derive(Debug, Error)]
pub enum SolError {
    /// Malformed caller input (bad seed, empty instruction list, wrong-size key).
    #[error("validation error: {0}")]
    Validation(String),

    /// The ed25519 subsystem failed, or a secret key does not match its public key.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// An operation was invoked in the wrong lifecycle state.
    #[error("state error: {0}")]
    State(String),

    /// No bump seed in 1..=255 produced an off-curve program address.
    #[error("unable to find a viable program address nonce")]
    NoViableBump,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_validation() {
        let err = SolError::Validation("max seed length exceeded".into());
        assert_eq!(err.to_string(), "validation error: max seed length exceeded");
    }

    #[test]
    fn display_crypto() {
        let err = SolError::Crypto("invalid secret key".into());
        assert_eq!(err.to_string(), "crypto error: invalid secret key");
    }

    #[test]
    fn display_state() {
        let err = SolError::State("message is already serialized".into());
        assert_eq!(err.to_string(), "state error: message is already serialized");
    }

    #[test]
    fn display_no_viable_bump() {
        let err = SolError::NoViableBump;
        assert_eq!(
            err.to_string(),
            "unable to find a viable program address nonce"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        let err: SolError = io.into();
        assert!(matches!(err, SolError::Io(_)));
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(SolError::State("test".into()));
        assert!(err.to_string().contains("test"));
    }

    #[test]
    fn debug_format_works() {
        let err = SolError::Crypto("fail".into());
        let debug = format!("{:?}", err);
        assert!(debug.contains("Crypto"));
    }
}
