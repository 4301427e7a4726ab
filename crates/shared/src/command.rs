#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validate(#[from] validator::ValidationErrors),

    #[error("invalid event: {0}")]
    Invalid(String),

    #[error("stale event: {0}")]
    Stale(String),

    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable code surfaced to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validate(_) | Error::Invalid(_) => "INVALID_EVENT",
            Error::Stale(_) => "STALE_EVENT",
            Error::UnknownEntity(_) => "UNKNOWN_ENTITY",
            Error::Conflict(_) => "CONFLICT",
            Error::Storage(_) => "STORAGE_FAILURE",
            Error::Internal(_) => "INTERNAL",
        }
    }

    pub fn is_retriable(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        Self::Storage(value.into())
    }
}

impl From<evento::WriteError> for Error {
    fn from(value: evento::WriteError) -> Self {
        Self::Storage(value.into())
    }
}

impl From<std::time::SystemTimeError> for Error {
    fn from(value: std::time::SystemTimeError) -> Self {
        Self::Storage(value.into())
    }
}

impl From<time::error::ComponentRange> for Error {
    fn from(value: time::error::ComponentRange) -> Self {
        Self::Internal(value.to_string())
    }
}

#[macro_export]
macro_rules! invalid {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::Invalid(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err($crate::Error::Invalid(format!($err)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::Invalid(format!($fmt, $($arg)*)))
    };
}

#[macro_export]
macro_rules! stale {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::Stale(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err($crate::Error::Stale(format!($err)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::Stale(format!($fmt, $($arg)*)))
    };
}

#[macro_export]
macro_rules! unknown_entity {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::UnknownEntity(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err($crate::Error::UnknownEntity(format!($err)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::UnknownEntity(format!($fmt, $($arg)*)))
    };
}

#[macro_export]
macro_rules! conflict {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::Conflict(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err($crate::Error::Conflict(format!($err)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::Conflict(format!($fmt, $($arg)*)))
    };
}

#[macro_export]
macro_rules! internal {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::Internal(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err($crate::Error::Internal(format!($err)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::Internal(format!($fmt, $($arg)*)))
    };
}
