//! Seed data
//!
//! Menu items and promotions loaded from YAML at start-up:
//!
//! ```yaml
//! menu:
//!   - id: 1
//!     name: Chana Masala
//!     price: "9.50"
//! promotions:
//!   - code: WELCOME
//!     description: 20% off your first order
//!     kind: percentage
//!     value: "20"
//!     scope: auto_applied
//!     first_order_only: true
//! ```

use std::{fs, path::Path};

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::Deserialize;
use thiserror::Error;
use tiffin::{
    catalog::CatalogItem,
    pricing::{self, PricingError},
    promotions::{DiscountError, DiscountKind, DiscountRule, RuleScope},
};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse seed YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("invalid amount: {0}")]
    Amount(#[from] PricingError),

    #[error("invalid percentage \"{0}\"")]
    Percentage(String),

    #[error("invalid discount for {code}: {source}")]
    Discount {
        code: String,
        #[source]
        source: DiscountError,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub menu: Vec<SeedItem>,
    pub promotions: Vec<SeedPromotion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedItem {
    pub id: u64,
    pub name: String,
    pub price: String,
    #[serde(default = "available")]
    pub available: bool,
}

fn available() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedDiscountKind {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedScope {
    #[default]
    Code,
    AutoApplied,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedPromotion {
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub badge: Option<String>,
    pub kind: SeedDiscountKind,

    /// Percent (`"20"`) or amount (`"2.50"`), depending on `kind`.
    pub value: String,
    #[serde(default)]
    pub min_order: Option<String>,
    #[serde(default)]
    pub max_uses: Option<u32>,
    #[serde(default = "available")]
    pub active: bool,
    #[serde(default)]
    pub valid_from: Option<Timestamp>,
    #[serde(default)]
    pub valid_until: Option<Timestamp>,
    #[serde(default)]
    pub scope: SeedScope,
    #[serde(default)]
    pub first_order_only: bool,
}

impl SeedData {
    pub fn from_yaml(yaml: &str) -> Result<Self, SeedError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Menu items priced in `currency`.
    pub fn catalog(&self, currency: &'static Currency) -> Result<Vec<CatalogItem>, SeedError> {
        self.menu
            .iter()
            .map(|item| {
                let mut entry = CatalogItem::new(
                    item.id,
                    item.name.clone(),
                    pricing::parse_amount(&item.price, currency)?,
                );
                entry.is_available = item.available;

                Ok(entry)
            })
            .collect()
    }

    /// Discount rules with amounts in `currency`.
    pub fn rules(&self, currency: &'static Currency) -> Result<Vec<DiscountRule>, SeedError> {
        self.promotions
            .iter()
            .map(|promotion| promotion.to_rule(currency))
            .collect()
    }
}

impl SeedPromotion {
    fn to_rule(&self, currency: &'static Currency) -> Result<DiscountRule, SeedError> {
        let kind = match self.kind {
            SeedDiscountKind::Percentage => {
                let percent: Decimal = self
                    .value
                    .trim()
                    .trim_end_matches('%')
                    .parse()
                    .map_err(|_err| SeedError::Percentage(self.value.clone()))?;

                DiscountKind::percent_off(percent)
            }
            SeedDiscountKind::Fixed => {
                DiscountKind::amount_off(pricing::parse_amount(&self.value, currency)?)
            }
        }
        .map_err(|source| SeedError::Discount {
            code: self.code.clone(),
            source,
        })?;

        let mut rule = DiscountRule::new(&self.code, kind);

        rule.description.clone_from(&self.description);
        rule.badge.clone_from(&self.badge);
        rule.min_order = self
            .min_order
            .as_deref()
            .map(|amount| pricing::parse_amount(amount, currency))
            .transpose()?;
        rule.max_uses = self.max_uses;
        rule.active = self.active;
        rule.valid_from = self.valid_from;
        rule.valid_until = self.valid_until;
        rule.scope = match self.scope {
            SeedScope::Code => RuleScope::CodeRedeemed,
            SeedScope::AutoApplied => RuleScope::AutoApplied,
        };
        rule.first_order_only = self.first_order_only;

        Ok(rule)
    }
}
