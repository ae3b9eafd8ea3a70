//! Accounts service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use tiffin::basket::Basket;
use tracing::{info, warn};

use crate::{
    domain::{
        accounts::{errors::AccountsServiceError, repository::ProfileStore},
        sessions::{CustomerUuid, SessionBaskets, SessionUuid},
    },
    storage::StoreError,
};

/// Copies a signed-in customer's basket onto their profile so it follows them between
/// devices. Failures are logged; the basket operation itself has already succeeded.
pub async fn mirror_basket(
    profiles: &dyn ProfileStore,
    customer: Option<CustomerUuid>,
    basket: &Basket,
) {
    let Some(customer) = customer else {
        return;
    };

    let result = if basket.is_blank() {
        profiles.clear_saved_basket(customer).await
    } else {
        match basket.to_snapshot().to_value() {
            Ok(snapshot) => profiles.save_basket(customer, snapshot).await,
            Err(error) => Err(error.into()),
        }
    };

    if let Err(error) = result {
        warn!(%customer, %error, "failed to save basket to profile");
    }
}

#[derive(Clone)]
pub struct PgAccountsService {
    sessions: SessionBaskets,
    profiles: Arc<dyn ProfileStore>,
}

impl PgAccountsService {
    pub fn new(sessions: SessionBaskets, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { sessions, profiles }
    }
}

impl fmt::Debug for PgAccountsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgAccountsService")
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AccountsService for PgAccountsService {
    async fn on_sign_in(
        &self,
        session: SessionUuid,
        customer: CustomerUuid,
    ) -> Result<usize, AccountsServiceError> {
        let Some(value) = self.profiles.saved_basket(customer).await? else {
            return Ok(0);
        };

        let saved = match self.sessions.parse(value) {
            Ok(saved) => saved,
            Err(error) => {
                warn!(%customer, %error, "discarding unreadable saved basket");

                self.profiles.clear_saved_basket(customer).await?;

                return Ok(0);
            }
        };

        let mut basket = self.sessions.load(session).await?;
        let before = basket.len();

        basket.merge_saved(saved);

        self.sessions.save(session, &basket).await?;
        self.profiles.clear_saved_basket(customer).await?;

        let restored = basket.len().saturating_sub(before);

        info!(%session, %customer, restored, "saved basket merged on sign-in");

        Ok(restored)
    }

    async fn on_sign_out(
        &self,
        session: SessionUuid,
        customer: CustomerUuid,
    ) -> Result<bool, AccountsServiceError> {
        let basket = self.sessions.load(session).await?;
        let keep = !basket.is_blank();

        if keep {
            let snapshot = basket.to_snapshot().to_value().map_err(StoreError::from)?;

            self.profiles.save_basket(customer, snapshot).await?;
        }

        self.sessions.clear(session).await?;
        self.sessions.forget_last_order(session).await?;

        info!(%session, %customer, saved = keep, "signed out");

        Ok(keep)
    }
}

#[automock]
#[async_trait]
pub trait AccountsService: Send + Sync {
    /// Merges the basket saved on the customer's profile into the session basket.
    ///
    /// Session lines win over saved ones. The saved basket is cleared afterwards. Returns the
    /// number of lines that came from the saved basket.
    async fn on_sign_in(
        &self,
        session: SessionUuid,
        customer: CustomerUuid,
    ) -> Result<usize, AccountsServiceError>;

    /// Saves the session basket to the customer's profile and empties the session.
    ///
    /// Nothing is saved when the basket has neither lines nor a promo. Returns whether a
    /// basket was saved.
    async fn on_sign_out(
        &self,
        session: SessionUuid,
        customer: CustomerUuid,
    ) -> Result<bool, AccountsServiceError>;
}
