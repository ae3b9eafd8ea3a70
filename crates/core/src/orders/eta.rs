//! Estimated time remaining

use jiff::{SignedDuration, Timestamp};

use super::{DeliveryType, OrderStatus};

/// Minutes until the order reaches the customer, from a fixed table.
///
/// Cancelled orders have no estimate.
pub fn estimated_minutes_remaining(delivery_type: DeliveryType, status: OrderStatus) -> Option<u32> {
    let minutes = match (status, delivery_type) {
        (OrderStatus::Pending, DeliveryType::Delivery) => 45,
        (OrderStatus::Pending, DeliveryType::Collection) => 30,
        (OrderStatus::Confirmed, DeliveryType::Delivery) => 40,
        (OrderStatus::Confirmed, DeliveryType::Collection) => 25,
        (OrderStatus::Preparing, DeliveryType::Delivery) => 30,
        (OrderStatus::Preparing, DeliveryType::Collection) => 15,
        (OrderStatus::OutForDelivery, _) => 15,
        (OrderStatus::Ready | OrderStatus::Completed, _) => 0,
        (OrderStatus::Cancelled, _) => return None,
    };

    Some(minutes)
}

/// Estimate shown to a customer polling their order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    /// Minutes remaining
    pub minutes_remaining: Option<u32>,

    /// Poll time plus the minutes remaining
    pub ready_at: Option<Timestamp>,
}

/// Estimate for an order polled at `now`.
pub fn estimate(delivery_type: DeliveryType, status: OrderStatus, now: Timestamp) -> Estimate {
    let minutes_remaining = estimated_minutes_remaining(delivery_type, status);

    let ready_at = minutes_remaining.and_then(|minutes| {
        now.checked_add(SignedDuration::from_mins(i64::from(minutes)))
            .ok()
    });

    Estimate {
        minutes_remaining,
        ready_at,
    }
}
