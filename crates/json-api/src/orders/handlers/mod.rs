//! Order Handlers

use salvo::prelude::StatusError;
use tiffin::orders::OrderReference;

use crate::extensions::*;

pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod reorder;
pub(crate) mod status;

/// Malformed references cannot name an order, so they are reported like unknown ones.
pub(crate) fn parse_reference(reference: &str) -> Result<OrderReference, StatusError> {
    reference.parse().or_404("Order not found")
}
