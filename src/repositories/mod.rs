//! Shared persistence helpers used inside service transactions.
//!
//! Functions take any `ConnectionTrait` so callers pass the open transaction.
//! Every status write is a compare-and-set against the status the caller
//! observed; a lost race surfaces as `ServiceError::ConcurrentModification`.

pub mod fulfillment_repository;
pub mod sales_order_repository;

use crate::errors::ServiceError;

fn ensure_row_updated(
    rows_affected: u64,
    entity: &str,
    id: i32,
    expected: &impl std::fmt::Display,
) -> Result<(), ServiceError> {
    if rows_affected == 0 {
        tracing::warn!(entity, id, expected = %expected, "Status changed concurrently");
        return Err(ServiceError::ConcurrentModification(format!(
            "{} {} is no longer '{}'",
            entity, id, expected
        )));
    }
    Ok(())
}
