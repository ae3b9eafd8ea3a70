//! Tiffin
//!
//! Tiffin is the basket, pricing and order-lifecycle engine behind a small restaurant's
//! online ordering: it holds the in-progress basket, prices delivery and promotions,
//! turns a basket into a price-frozen order and walks that order through the kitchen.

pub mod basket;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod pricing;
pub mod promotions;
