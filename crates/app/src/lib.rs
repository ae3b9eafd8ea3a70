//! Application services for the Tiffin ordering engine.
//!
//! Services wrap the `tiffin` engine with session storage, order storage, promotion
//! bookkeeping and rate limiting. Menu, promotions, orders, sessions and saved baskets live
//! in `PostgreSQL`; rate-limit windows are kept in process memory.

pub mod clock;
pub mod context;
pub mod database;
pub mod domain;
pub mod rate_limit;
pub mod seed;
pub mod storage;
pub mod uuids;

#[cfg(test)]
mod test;
