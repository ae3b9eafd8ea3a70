//! Kitchen Handlers

pub(crate) mod advance;
pub(crate) mod cancel;
pub(crate) mod index;
