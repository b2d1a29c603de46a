//! Classify HTTP status codes and fetch errors.

use crate::session::FetchError;

/// How a failed fetch is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Session is no longer valid; renew and retry without charging the file.
    AuthExpired,
    /// Recorded on the file and charged against its budget.
    Transient,
}

/// Classify an HTTP status. Returns None for success (2xx).
pub fn classify_http_status(status: u16) -> Option<ErrorKind> {
    match status {
        200..=299 => None,
        401 => Some(ErrorKind::AuthExpired),
        _ => Some(ErrorKind::Transient),
    }
}

/// Classify an error reported by a Fetcher or Lister.
pub fn classify_fetch_error(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::AuthExpired(_) => ErrorKind::AuthExpired,
        FetchError::Status(code) => classify_http_status(*code).unwrap_or(ErrorKind::Transient),
        FetchError::Transport(_) => ErrorKind::Transient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert_eq!(classify_http_status(200), None);
        assert_eq!(classify_http_status(204), None);
    }

    #[test]
    fn unauthorized_is_auth_expired() {
        assert_eq!(classify_http_status(401), Some(ErrorKind::AuthExpired));
        assert_eq!(
            classify_fetch_error(&FetchError::AuthExpired(401)),
            ErrorKind::AuthExpired
        );
        assert_eq!(
            classify_fetch_error(&FetchError::Status(401)),
            ErrorKind::AuthExpired
        );
    }

    #[test]
    fn other_failures_are_transient() {
        assert_eq!(classify_http_status(403), Some(ErrorKind::Transient));
        assert_eq!(classify_http_status(404), Some(ErrorKind::Transient));
        assert_eq!(classify_http_status(503), Some(ErrorKind::Transient));
        assert_eq!(classify_http_status(302), Some(ErrorKind::Transient));
        assert_eq!(
            classify_fetch_error(&FetchError::Transport("timed out".into())),
            ErrorKind::Transient
        );
    }
}
