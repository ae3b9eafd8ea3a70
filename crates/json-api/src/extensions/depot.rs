//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};
use tiffin_app::domain::sessions::{ClientAddress, CustomerUuid, Visitor};

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    fn insert_visitor(&mut self, visitor: Visitor, client: ClientAddress);

    fn visitor_or_500(&self) -> Result<Visitor, StatusError>;

    fn client_address_or_500(&self) -> Result<ClientAddress, StatusError>;

    /// The signed-in customer, or 401 for guests.
    fn customer_or_401(&self) -> Result<CustomerUuid, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_visitor(&mut self, visitor: Visitor, client: ClientAddress) {
        self.inject(visitor);
        self.inject(client);
    }

    fn visitor_or_500(&self) -> Result<Visitor, StatusError> {
        self.obtain_or_500::<Visitor>().copied()
    }

    fn client_address_or_500(&self) -> Result<ClientAddress, StatusError> {
        self.obtain_or_500::<ClientAddress>().cloned()
    }

    fn customer_or_401(&self) -> Result<CustomerUuid, StatusError> {
        self.visitor_or_500()?
            .customer
            .ok_or_else(|| StatusError::unauthorized().brief("Sign in to continue"))
    }
}
