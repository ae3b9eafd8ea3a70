//! App Context

use std::{fmt, sync::Arc};

use rusty_money::iso::Currency;
use sqlx::{PgPool, migrate::MigrateError};
use thiserror::Error;
use tiffin::{catalog::CatalogItem, pricing::PricingPolicy, promotions::DiscountRule};
use tracing::info;

use crate::{
    clock::{Clock, SystemClock},
    database::{self, Db, HealthCheck},
    domain::{
        accounts::{AccountsService, PgAccountsService, PgProfileStore, ProfileStore},
        baskets::{BasketsService, PgBasketsService},
        checkout::{CheckoutCoordinator, CheckoutService},
        kitchen::{KitchenService, PgKitchenService},
        menu::PgMenuRepository,
        orders::{OrdersService, PgOrdersRepository, PgOrdersService},
        promotions::PgPromotionsRepository,
        sessions::{PgSessionStore, SessionBaskets},
    },
    rate_limit::{FixedWindowRateLimiter, RateLimiter, RateLimits},
    seed::{SeedData, SeedError},
};

/// Restaurant-wide settings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AppSettings {
    pub pricing: PricingPolicy,
    pub rate_limits: RateLimits,
}

/// Why the application could not start.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to apply migrations: {0}")]
    Migrate(#[from] MigrateError),

    #[error(transparent)]
    Seed(#[from] SeedError),
}

/// Storage handed to every service.
#[derive(Clone)]
pub struct Repositories {
    pub db: Db,
    pub(crate) menu: PgMenuRepository,
    pub(crate) promotions: PgPromotionsRepository,
    pub(crate) orders: PgOrdersRepository,
    pub sessions: SessionBaskets,
    pub profiles: Arc<dyn ProfileStore>,
}

impl Repositories {
    pub fn postgres(db: Db, pricing: PricingPolicy) -> Self {
        Self {
            menu: PgMenuRepository::new(),
            promotions: PgPromotionsRepository::new(),
            orders: PgOrdersRepository::new(),
            sessions: SessionBaskets::new(Arc::new(PgSessionStore::new(db.clone())), pricing),
            profiles: Arc::new(PgProfileStore::new(db.clone())),
            db,
        }
    }

    /// Writes the menu and promotion terms in one transaction.
    ///
    /// Existing rows are updated in place; promotion use counts are kept.
    pub async fn seed(
        &self,
        menu: &[CatalogItem],
        rules: &[DiscountRule],
        currency: &'static Currency,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.db.begin().await?;

        for item in menu {
            self.menu.upsert_item(&mut tx, item).await?;
        }

        for rule in rules {
            self.promotions.upsert_rule(&mut tx, rule, currency).await?;
        }

        tx.commit().await?;

        info!(items = menu.len(), promotions = rules.len(), "menu and promotions seeded");

        Ok(())
    }
}

impl fmt::Debug for Repositories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repositories")
            .field("db", &self.db)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub baskets: Arc<dyn BasketsService>,
    pub checkout: Arc<dyn CheckoutService>,
    pub orders: Arc<dyn OrdersService>,
    pub kitchen: Arc<dyn KitchenService>,
    pub accounts: Arc<dyn AccountsService>,
    pub health: Arc<dyn HealthCheck>,
}

impl AppContext {
    /// Connects to `PostgreSQL`, applies migrations and seeds the menu.
    ///
    /// # Errors
    ///
    /// Returns an error when the database is unreachable, a migration fails, or the seed
    /// data contains invalid prices or discounts.
    pub async fn from_database_url(
        database_url: &str,
        settings: AppSettings,
        seed: &SeedData,
    ) -> Result<Self, InitError> {
        let pool = database::connect(database_url).await?;

        Self::from_pool(pool, settings, seed).await
    }

    /// Like [`AppContext::from_database_url`], over an existing pool.
    ///
    /// # Errors
    ///
    /// Returns an error when a migration fails, the seed data is invalid, or it cannot be
    /// written.
    pub async fn from_pool(
        pool: PgPool,
        settings: AppSettings,
        seed: &SeedData,
    ) -> Result<Self, InitError> {
        database::migrate(&pool).await?;

        let currency = settings.pricing.currency;
        let repositories = Repositories::postgres(Db::new(pool), settings.pricing);

        repositories
            .seed(&seed.catalog(currency)?, &seed.rules(currency)?, currency)
            .await?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let rate_limiter = Arc::new(FixedWindowRateLimiter::new(
            settings.rate_limits,
            clock.clone(),
        ));

        Ok(Self::from_parts(&repositories, rate_limiter, clock))
    }

    pub fn from_parts(
        repositories: &Repositories,
        rate_limiter: Arc<dyn RateLimiter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            baskets: Arc::new(PgBasketsService::new(
                repositories.clone(),
                rate_limiter.clone(),
                clock.clone(),
            )),
            checkout: Arc::new(CheckoutCoordinator::new(
                repositories.clone(),
                rate_limiter,
                clock.clone(),
            )),
            orders: Arc::new(PgOrdersService::new(repositories.clone(), clock.clone())),
            kitchen: Arc::new(PgKitchenService::new(repositories.clone(), clock)),
            accounts: Arc::new(PgAccountsService::new(
                repositories.sessions.clone(),
                repositories.profiles.clone(),
            )),
            health: Arc::new(repositories.db.clone()),
        }
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}
