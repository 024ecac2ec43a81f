use sea_orm::error::DbErr;
use sea_orm::TransactionError;
use uuid::Uuid;

/// Error type shared by every engine service.
///
/// Validation variants are raised before any store mutation; store-level
/// variants roll the surrounding transaction back, so a failed operation
/// never leaves a stock mutation without its ledger entry or vice versa.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Adjustment with zero delta would record a vacuous ledger entry")]
    NoOpAdjustment,

    #[error("No inventory row for product {product_id} in warehouse {warehouse_id}")]
    UnknownInventoryRow {
        warehouse_id: Uuid,
        product_id: Uuid,
    },

    #[error("Stock invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Cyclic bundle definition detected at product {0}")]
    CyclicBundleDefinition(Uuid),

    #[error("Product {0} is a bundle and has no physical stock to restock")]
    NotRestockable(Uuid),

    #[error("Invalid reservation state: {0}")]
    InvalidReservationState(String),

    #[error("Malformed ledger entry: {0}")]
    MalformedEntry(String),

    #[error("Timed out acquiring stock lock")]
    LockTimeout,

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Normalizes database errors at `map_err` call sites.
    pub fn db_error(error: DbErr) -> Self {
        ServiceError::DatabaseError(error)
    }

    /// Unwraps the error produced by `DatabaseConnection::transaction`,
    /// surfacing the inner service error when the closure failed and the
    /// connection error otherwise.
    pub fn from_transaction_error(error: TransactionError<ServiceError>) -> Self {
        match error {
            TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
            TransactionError::Transaction(service_err) => service_err,
        }
    }

    /// Whether the failure is transient and worth a caller-side retry.
    ///
    /// The engine itself never retries; lock timeouts are surfaced for the
    /// caller's own backoff policy. A cyclic bundle definition is a
    /// data-integrity fault and is deliberately not retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::LockTimeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_timeout_is_the_only_retryable_failure() {
        assert!(ServiceError::LockTimeout.is_retryable());
        assert!(!ServiceError::NoOpAdjustment.is_retryable());
        assert!(!ServiceError::CyclicBundleDefinition(Uuid::new_v4()).is_retryable());
        assert!(!ServiceError::InsufficientStock("x".into()).is_retryable());
    }

    #[test]
    fn transaction_error_unwraps_to_inner_service_error() {
        let err = ServiceError::from_transaction_error(TransactionError::Transaction(
            ServiceError::NoOpAdjustment,
        ));
        assert!(matches!(err, ServiceError::NoOpAdjustment));

        let err = ServiceError::from_transaction_error(TransactionError::<ServiceError>::Connection(
            DbErr::Custom("gone".into()),
        ));
        assert!(matches!(err, ServiceError::DatabaseError(_)));
    }
}
