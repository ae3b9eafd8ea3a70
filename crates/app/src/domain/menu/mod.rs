//! Menu

mod repository;

pub(crate) use repository::PgMenuRepository;
