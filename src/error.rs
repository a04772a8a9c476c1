use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("{0} not found")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Payment gateway error: {0}")]
    Gateway(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Payment declined: {0}")]
    PaymentDeclined(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl OrderError {
    /// Stable, machine-readable error kind exposed to API callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyCart => "empty_cart",
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidStatus(_) => "invalid_status",
            Self::Gateway(_) => "gateway",
            Self::Conflict(_) => "conflict",
            Self::PaymentDeclined(_) => "payment_declined",
            Self::ValidationError(_) | Self::CsvError(_) => "validation",
            Self::IoError(_) | Self::InternalError(_) => "internal",
            #[cfg(feature = "storage-rocksdb")]
            Self::StorageError(_) => "internal",
        }
    }

    /// Whether the message is safe to show to a caller outside diagnostic mode.
    pub fn is_internal(&self) -> bool {
        self.kind() == "internal"
    }

    #[cfg(any(test, feature = "storage-rocksdb"))]
    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(Box::new(std::io::Error::other(msg.into())))
    }
}

impl From<serde_json::Error> for OrderError {
    fn from(e: serde_json::Error) -> Self {
        Self::InternalError(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;
