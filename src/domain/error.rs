use thiserror::Error;

/// Machine-readable classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidResolution,
    SessionBusy,
    Resolution,
    NotFound,
    Transfer,
    Io,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Please select a valid resolution.")]
    InvalidResolution,

    #[error("A download is already in progress")]
    SessionBusy,

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("No available streams")]
    NotFound,

    #[error("Transfer error: {0}")]
    Transfer(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Download aborted: session is no longer active")]
    Aborted,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidResolution => ErrorKind::InvalidResolution,
            Self::SessionBusy => ErrorKind::SessionBusy,
            Self::Resolution(_) => ErrorKind::Resolution,
            Self::NotFound => ErrorKind::NotFound,
            Self::Transfer(_) => ErrorKind::Transfer,
            Self::Io(_) => ErrorKind::Io,
            Self::Aborted => ErrorKind::Aborted,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(AppError::SessionBusy.kind(), ErrorKind::SessionBusy);
        assert_eq!(
            AppError::Resolution("bad playlist".into()).kind(),
            ErrorKind::Resolution
        );
        assert_eq!(AppError::Transfer("reset".into()).kind(), ErrorKind::Transfer);
    }

    #[test]
    fn test_io_error_conversion() {
        let err: AppError = std::io::Error::other("disk full").into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("disk full"));
    }
}
