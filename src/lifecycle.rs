//! Status state machines for sales orders, production orders and deliveries.
//!
//! These functions are pure: services consult them before issuing the
//! compare-and-set status write.

use std::fmt::Display;

use crate::entities::{DeliveryStatus, ProductionOrderStatus, SalesOrderStatus};
use crate::errors::ServiceError;

/// A status enum with a fixed table of legal moves.
pub trait Lifecycle: Copy + Display + PartialEq {
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    fn can_transition_to(self, next: Self) -> bool;

    fn is_terminal(self) -> bool;

    /// Returns an `InvalidTransition` error unless `self -> next` is allowed.
    fn ensure_transition(self, next: Self) -> Result<(), ServiceError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(ServiceError::InvalidTransition {
                entity: Self::ENTITY,
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl Lifecycle for SalesOrderStatus {
    const ENTITY: &'static str = "sales order";

    fn can_transition_to(self, next: Self) -> bool {
        use SalesOrderStatus::*;
        matches!(
            (self, next),
            (Created, InProduction)
                | (Created, Cancelled)
                | (InProduction, ReadyForDelivery)
                | (InProduction, Cancelled)
                | (ReadyForDelivery, Delivered)
                | (ReadyForDelivery, Cancelled)
                | (Delivered, Billed)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, SalesOrderStatus::Billed | SalesOrderStatus::Cancelled)
    }
}

impl Lifecycle for ProductionOrderStatus {
    const ENTITY: &'static str = "production order";

    fn can_transition_to(self, next: Self) -> bool {
        use ProductionOrderStatus::*;
        matches!(
            (self, next),
            (Planned, InProgress)
                | (Planned, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(
            self,
            ProductionOrderStatus::Completed | ProductionOrderStatus::Cancelled
        )
    }
}

impl Lifecycle for DeliveryStatus {
    const ENTITY: &'static str = "delivery";

    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (DeliveryStatus::Pending, DeliveryStatus::Delivered)
                | (DeliveryStatus::Pending, DeliveryStatus::Cancelled)
        )
    }

    fn is_terminal(self) -> bool {
        !matches!(self, DeliveryStatus::Pending)
    }
}
