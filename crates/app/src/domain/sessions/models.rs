//! Session Models

use std::fmt;

use crate::uuids::TypedUuid;

/// Session marker
#[derive(Debug)]
pub struct Session;

/// Session UUID
pub type SessionUuid = TypedUuid<Session>;

/// Customer marker
#[derive(Debug)]
pub struct Customer;

/// Customer UUID
pub type CustomerUuid = TypedUuid<Customer>;

/// Who is making a request: always a session, and a customer when signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visitor {
    pub session: SessionUuid,
    pub customer: Option<CustomerUuid>,
}

impl Visitor {
    pub fn guest(session: SessionUuid) -> Self {
        Self {
            session,
            customer: None,
        }
    }

    pub fn customer(session: SessionUuid, customer: CustomerUuid) -> Self {
        Self {
            session,
            customer: Some(customer),
        }
    }
}

/// Network address of a client, used to key rate limits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientAddress(String);

impl ClientAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of a value in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Basket snapshot
    Basket,

    /// Reference of the last order placed from the session
    LastOrderReference,
}

impl SessionKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKey::Basket => "basket",
            SessionKey::LastOrderReference => "last_order_reference",
        }
    }
}
