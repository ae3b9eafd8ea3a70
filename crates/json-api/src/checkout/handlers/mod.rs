//! Checkout Handlers

pub(crate) mod place_order;
