//! Tiffin Domain Concerns

pub mod accounts;
pub mod baskets;
pub mod checkout;
pub mod kitchen;
pub mod menu;
pub mod orders;
pub mod promotions;
pub mod sessions;
