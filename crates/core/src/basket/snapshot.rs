//! Session snapshots
//!
//! Baskets are stored in the visitor's session (and attached to a customer's profile at
//! sign-out) as plain JSON with decimal-string prices:
//!
//! ```json
//! {"items": {"3": {"quantity": 2, "price": "9.50", "notes": "no onions"}},
//!  "promo": {"code": "WELCOME10", "discount": "1.90"}}
//! ```
//!
//! Older sessions hold only the item map, without the `items` wrapper; those are read as a
//! basket without a promotion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    catalog::ItemId,
    pricing::{PricingError, PricingPolicy, format_amount, parse_amount},
};

use super::{AppliedPromo, Basket, BasketLine, MAX_LINE_QUANTITY, normalise_notes};

/// Errors raised when a stored snapshot cannot be turned back into a basket.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The stored value is not a JSON object.
    #[error("basket snapshot must be a JSON object")]
    NotAnObject,

    /// The snapshot does not have the expected shape.
    #[error("malformed basket snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// An item key is not a valid item id.
    #[error("invalid item id \"{0}\" in basket snapshot")]
    InvalidItemId(String),

    /// A line quantity is larger than a basket allows.
    #[error("quantity {quantity} for item {item} exceeds {MAX_LINE_QUANTITY}")]
    QuantityOutOfRange {
        /// Item key
        item: String,

        /// Stored quantity
        quantity: u32,
    },

    /// A stored amount could not be parsed.
    #[error("invalid amount in basket snapshot: {0}")]
    Amount(#[from] PricingError),
}

/// Stored form of one basket line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    /// Units
    pub quantity: u32,

    /// Unit price as a decimal string
    pub price: String,

    /// Kitchen notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Stored form of the applied promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoSnapshot {
    /// Promo code
    pub code: String,

    /// Discount as a decimal string
    pub discount: String,
}

/// Stored form of a basket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BasketSnapshot {
    /// Lines keyed by item id
    pub items: BTreeMap<String, LineSnapshot>,

    /// Applied promotion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo: Option<PromoSnapshot>,
}

impl BasketSnapshot {
    /// Reads a snapshot from stored JSON, accepting both the current and the legacy layout.
    ///
    /// An empty promo object is read as no promotion.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] if the value is not an object or a field has the wrong type.
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        let Value::Object(mut map) = value else {
            return Err(SnapshotError::NotAnObject);
        };

        let Some(items) = map.remove("items") else {
            return Ok(Self {
                items: serde_json::from_value(Value::Object(map))?,
                promo: None,
            });
        };

        let promo = match map.remove("promo") {
            None | Some(Value::Null) => None,
            Some(Value::Object(promo)) if promo.is_empty() => None,
            Some(promo) => Some(serde_json::from_value(promo)?),
        };

        Ok(Self {
            items: serde_json::from_value(items)?,
            promo,
        })
    }

    /// The snapshot as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Malformed`] if serialisation fails.
    pub fn to_value(&self) -> Result<Value, SnapshotError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Whether the snapshot has neither lines nor a promotion.
    pub fn is_blank(&self) -> bool {
        self.items.is_empty() && self.promo.is_none()
    }
}

impl Basket {
    /// Stored form of the basket.
    pub fn to_snapshot(&self) -> BasketSnapshot {
        BasketSnapshot {
            items: self
                .raw_lines()
                .map(|line| {
                    (
                        line.item_id.to_string(),
                        LineSnapshot {
                            quantity: line.quantity,
                            price: format_amount(&line.unit_price),
                            notes: line.notes.clone(),
                        },
                    )
                })
                .collect(),
            promo: self.promo().map(|promo| PromoSnapshot {
                code: promo.code.clone(),
                discount: format_amount(&promo.discount),
            }),
        }
    }

    /// Rebuilds a basket from its stored form. Lines with a zero quantity are skipped.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] for unparseable ids, prices or out-of-range quantities.
    pub fn from_snapshot(
        snapshot: &BasketSnapshot,
        policy: PricingPolicy,
    ) -> Result<Self, SnapshotError> {
        let mut basket = Basket::new(policy);

        for (key, line) in &snapshot.items {
            if line.quantity == 0 {
                continue;
            }

            if line.quantity > MAX_LINE_QUANTITY {
                return Err(SnapshotError::QuantityOutOfRange {
                    item: key.clone(),
                    quantity: line.quantity,
                });
            }

            let item_id: ItemId = key
                .parse()
                .map_err(|_err| SnapshotError::InvalidItemId(key.clone()))?;

            basket.insert_line(BasketLine {
                item_id,
                quantity: line.quantity,
                unit_price: parse_amount(&line.price, policy.currency)?,
                notes: line.notes.as_deref().and_then(normalise_notes),
            });
        }

        if let Some(promo) = &snapshot.promo {
            basket.promo = Some(AppliedPromo {
                code: promo.code.trim().to_uppercase(),
                discount: parse_amount(&promo.discount, policy.currency)?,
            });
        }

        Ok(basket)
    }
}
