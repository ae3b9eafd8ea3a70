//! Test support

mod db;

pub(crate) use context::*;
pub(crate) use db::TestDb;
