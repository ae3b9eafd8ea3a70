//! Order Models

use jiff::Timestamp;
use tiffin::orders::{
    Order, OrderReference, OrderStatus,
    eta::{self, Estimate},
};

use crate::domain::sessions::CustomerUuid;

/// A stored order and the account that placed it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order: Order,

    /// Signed-in customer who placed the order; `None` for guests.
    pub owner: Option<CustomerUuid>,
}

/// What a customer polling their order sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusView {
    pub reference: OrderReference,
    pub status: OrderStatus,
    pub estimate: Estimate,
}

impl OrderStatusView {
    pub fn new(order: &Order, now: Timestamp) -> Self {
        Self {
            reference: order.reference.clone(),
            status: order.status,
            estimate: eta::estimate(order.delivery_type, order.status, now),
        }
    }
}
