//! Order status workflow

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::DeliveryType;

/// Where an order is in the kitchen workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, not yet seen by the kitchen.
    Pending,

    /// Accepted by the kitchen.
    Confirmed,

    /// Being cooked.
    Preparing,

    /// With the driver.
    OutForDelivery,

    /// Waiting at the counter.
    Ready,

    /// Handed over.
    Completed,

    /// Cancelled by staff.
    Cancelled,
}

/// Errors raised by status transitions. The order is never modified when one is returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// The order is in a terminal status and has nowhere to go.
    #[error("order is {} and cannot be advanced", .0.label())]
    NoNextStatus(OrderStatus),

    /// The order moved on (or was cancelled) since the caller last looked at it.
    #[error("order is {}, not {}", .actual.label(), .seen.label())]
    StaleStatus {
        /// Status the caller based the request on.
        seen: OrderStatus,

        /// Status the order is actually in.
        actual: OrderStatus,
    },

    /// Completed orders cannot be cancelled.
    #[error("order is {} and cannot be cancelled", .0.label())]
    NotCancellable(OrderStatus),
}

/// Outcome of a successful transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The status moved.
    Changed {
        /// Previous status
        from: OrderStatus,

        /// New status
        to: OrderStatus,
    },

    /// The order was already where the request wanted it.
    Unchanged(OrderStatus),
}

impl StatusChange {
    /// Status after the request.
    pub fn status(self) -> OrderStatus {
        match self {
            StatusChange::Changed { to, .. } => to,
            StatusChange::Unchanged(status) => status,
        }
    }

    /// Whether the request moved the order.
    pub fn is_changed(self) -> bool {
        matches!(self, StatusChange::Changed { .. })
    }
}

impl OrderStatus {
    /// Every status, in workflow order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Customer-facing label.
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Ready => "Ready for Collection",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Machine name, as used in JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the status is final.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Whether the order still belongs on the kitchen display.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// The single next status on the happy path.
    ///
    /// Preparing orders go out for delivery or wait for collection depending on the delivery
    /// type. Terminal statuses have no next status.
    pub fn next(self, delivery_type: DeliveryType) -> Option<OrderStatus> {
        match (self, delivery_type) {
            (OrderStatus::Pending, _) => Some(OrderStatus::Confirmed),
            (OrderStatus::Confirmed, _) => Some(OrderStatus::Preparing),
            (OrderStatus::Preparing, DeliveryType::Delivery) => Some(OrderStatus::OutForDelivery),
            (OrderStatus::Preparing, DeliveryType::Collection) => Some(OrderStatus::Ready),
            (OrderStatus::OutForDelivery | OrderStatus::Ready, _) => Some(OrderStatus::Completed),
            (OrderStatus::Completed | OrderStatus::Cancelled, _) => None,
        }
    }

    /// Advances from `seen`, the status the caller last observed.
    ///
    /// If the order is still at `seen` it moves to the next status. If it already reached
    /// the status after `seen`, a repeated request, nothing happens.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::NoNextStatus`]: the order is terminal.
    /// - [`TransitionError::StaleStatus`]: the order is somewhere other than `seen` or its
    ///   successor.
    pub fn advance(
        self,
        seen: OrderStatus,
        delivery_type: DeliveryType,
    ) -> Result<StatusChange, TransitionError> {
        if self == seen {
            let to = self
                .next(delivery_type)
                .ok_or(TransitionError::NoNextStatus(self))?;

            return Ok(StatusChange::Changed { from: self, to });
        }

        if seen.next(delivery_type) == Some(self) {
            return Ok(StatusChange::Unchanged(self));
        }

        if self.is_terminal() {
            return Err(TransitionError::NoNextStatus(self));
        }

        Err(TransitionError::StaleStatus { seen, actual: self })
    }

    /// Cancels from any non-terminal status.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotCancellable`] for completed orders.
    pub fn cancel(self) -> Result<StatusChange, TransitionError> {
        match self {
            OrderStatus::Cancelled => Ok(StatusChange::Unchanged(self)),
            OrderStatus::Completed => Err(TransitionError::NotCancellable(self)),
            _ => Ok(StatusChange::Changed {
                from: self,
                to: OrderStatus::Cancelled,
            }),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for unknown status names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown order status \"{0}\"")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn delivery_happy_path() {
        let path: Vec<_> = std::iter::successors(Some(OrderStatus::Pending), |status| {
            status.next(DeliveryType::Delivery)
        })
        .collect();

        assert_eq!(
            path,
            [
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Preparing,
                OrderStatus::OutForDelivery,
                OrderStatus::Completed,
            ]
        );
    }

    #[test]
    fn collection_happy_path() {
        let path: Vec<_> = std::iter::successors(Some(OrderStatus::Pending), |status| {
            status.next(DeliveryType::Collection)
        })
        .collect();

        assert_eq!(
            path,
            [
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Preparing,
                OrderStatus::Ready,
                OrderStatus::Completed,
            ]
        );
    }

    #[test]
    fn preparing_delivery_order_goes_out_for_delivery() -> TestResult {
        let change = OrderStatus::Preparing.advance(OrderStatus::Preparing, DeliveryType::Delivery)?;

        assert_eq!(
            change,
            StatusChange::Changed {
                from: OrderStatus::Preparing,
                to: OrderStatus::OutForDelivery,
            }
        );

        Ok(())
    }

    #[test]
    fn terminal_statuses_cannot_advance() {
        for status in [OrderStatus::Completed, OrderStatus::Cancelled] {
            assert_eq!(status.next(DeliveryType::Delivery), None);
            assert_eq!(
                status.advance(status, DeliveryType::Delivery),
                Err(TransitionError::NoNextStatus(status))
            );
        }
    }

    #[test]
    fn repeated_advance_is_a_no_op() -> TestResult {
        // Two staff members pressed "advance" on the same confirmed order.
        let current = OrderStatus::Preparing;
        let change = current.advance(OrderStatus::Confirmed, DeliveryType::Collection)?;

        assert_eq!(change, StatusChange::Unchanged(OrderStatus::Preparing));
        assert!(!change.is_changed());

        Ok(())
    }

    #[test]
    fn repeated_final_advance_is_a_no_op() -> TestResult {
        let change = OrderStatus::Completed.advance(OrderStatus::Ready, DeliveryType::Collection)?;

        assert_eq!(change, StatusChange::Unchanged(OrderStatus::Completed));

        Ok(())
    }

    #[test]
    fn advancing_a_cancelled_order_from_a_stale_view_is_rejected() {
        assert_eq!(
            OrderStatus::Cancelled.advance(OrderStatus::Confirmed, DeliveryType::Delivery),
            Err(TransitionError::NoNextStatus(OrderStatus::Cancelled))
        );
    }

    #[test]
    fn stale_view_of_an_active_order_is_rejected() {
        assert_eq!(
            OrderStatus::OutForDelivery.advance(OrderStatus::Pending, DeliveryType::Delivery),
            Err(TransitionError::StaleStatus {
                seen: OrderStatus::Pending,
                actual: OrderStatus::OutForDelivery,
            })
        );
    }

    #[test]
    fn cancellation_rules() -> TestResult {
        for status in OrderStatus::ALL.into_iter().filter(|s| s.is_active()) {
            assert_eq!(
                status.cancel()?,
                StatusChange::Changed {
                    from: status,
                    to: OrderStatus::Cancelled,
                }
            );
        }

        assert_eq!(
            OrderStatus::Cancelled.cancel()?,
            StatusChange::Unchanged(OrderStatus::Cancelled)
        );
        assert_eq!(
            OrderStatus::Completed.cancel(),
            Err(TransitionError::NotCancellable(OrderStatus::Completed))
        );

        Ok(())
    }

    #[test]
    fn labels() {
        assert_eq!(OrderStatus::OutForDelivery.label(), "Out for Delivery");
        assert_eq!(OrderStatus::Ready.label(), "Ready for Collection");
    }

    #[test]
    fn names_round_trip() -> TestResult {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>()?, status);
            assert_eq!(
                serde_json::to_string(&status)?,
                format!("\"{}\"", status.as_str())
            );
        }

        assert!("shipped".parse::<OrderStatus>().is_err());

        Ok(())
    }
}
