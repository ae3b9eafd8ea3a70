//! Orders
//!
//! A placed order is a frozen copy of the basket at checkout time: names, prices and totals
//! never change afterwards. Only the status moves, through the kitchen workflow in [`status`].

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rusty_money::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{catalog::ItemId, pricing::Price};

pub mod eta;
pub mod status;

pub use status::{OrderStatus, StatusChange, TransitionError};

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    /// Driven to the customer's address.
    #[default]
    Delivery,

    /// Picked up from the restaurant.
    Collection,
}

impl DeliveryType {
    /// Customer-facing label.
    pub fn label(self) -> &'static str {
        match self {
            DeliveryType::Delivery => "Delivery",
            DeliveryType::Collection => "Collection",
        }
    }

    /// Machine name, as used in JSON and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryType::Delivery => "delivery",
            DeliveryType::Collection => "collection",
        }
    }
}

impl FromStr for DeliveryType {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [DeliveryType::Delivery, DeliveryType::Collection]
            .into_iter()
            .find(|option| option.as_str() == s.trim())
            .ok_or_else(|| UnknownOption(s.to_string()))
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Simulated card payment at checkout.
    Card,

    /// Cash handed to the driver.
    CashOnDelivery,

    /// Cash paid when collecting.
    CashOnCollection,
}

impl PaymentMethod {
    /// Customer-facing label.
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Card => "Card Payment",
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
            PaymentMethod::CashOnCollection => "Cash on Collection",
        }
    }

    /// Machine name, as used in JSON and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::CashOnCollection => "cash_on_collection",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            PaymentMethod::Card,
            PaymentMethod::CashOnDelivery,
            PaymentMethod::CashOnCollection,
        ]
        .into_iter()
        .find(|option| option.as_str() == s.trim())
        .ok_or_else(|| UnknownOption(s.to_string()))
    }
}

/// Error returned for unknown delivery types or payment methods.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown option \"{0}\"")]
pub struct UnknownOption(pub String);

/// Error returned for malformed order references.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("\"{0}\" is not a valid order reference")]
pub struct InvalidReference(pub String);

/// Short, customer-facing order code: eight upper-case hexadecimal characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderReference(String);

impl OrderReference {
    /// Number of characters in a reference.
    pub const LEN: usize = 8;

    /// Generates a fresh random reference.
    ///
    /// References are random rather than sequential; uniqueness is enforced by the order
    /// store, which retries on collision.
    pub fn generate() -> Self {
        let bytes = Uuid::new_v4().into_bytes();

        Self(
            bytes
                .iter()
                .take(Self::LEN / 2)
                .map(|byte| format!("{byte:02X}"))
                .collect(),
        )
    }

    /// The reference as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderReference {
    type Err = InvalidReference;

    /// Parses a reference, accepting lower-case input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let candidate = s.trim().to_ascii_uppercase();

        if candidate.len() == Self::LEN && candidate.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(candidate))
        } else {
            Err(InvalidReference(s.to_string()))
        }
    }
}

impl TryFrom<String> for OrderReference {
    type Error = InvalidReference;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderReference> for String {
    fn from(value: OrderReference) -> Self {
        value.0
    }
}

/// Who placed the order and how to reach them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    /// Full name
    pub full_name: String,

    /// Email address
    pub email: String,

    /// Phone number
    pub phone: String,
}

/// Where a delivery order goes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeliveryAddress {
    /// First address line
    pub line1: String,

    /// Optional second address line
    pub line2: Option<String>,

    /// Town or city
    pub city: String,

    /// Postcode
    pub postcode: String,
}

/// One line of a placed order, frozen at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    /// Menu item the line came from. May no longer exist on the menu.
    pub item_id: Option<ItemId>,

    /// Item name at the time of ordering
    pub item_name: String,

    /// Unit price at the time the item was added to the basket
    pub unit_price: Price,

    /// Quantity ordered
    pub quantity: u32,

    /// Customer notes for the kitchen
    pub notes: Option<String>,
}

impl OrderItem {
    /// Unit price times quantity.
    pub fn line_total(&self) -> Price {
        Money::from_minor(
            self.unit_price
                .to_minor_units()
                .saturating_mul(i64::from(self.quantity)),
            self.unit_price.currency(),
        )
    }
}

/// Frozen pricing of an order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    /// Sum of line totals
    pub subtotal: Price,

    /// Delivery charge, zero for collection
    pub delivery_charge: Price,

    /// Promotional discount
    pub discount: Price,

    /// Amount payable
    pub total: Price,
}

/// Everything needed to create an order, before it has a reference or a status.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    /// Contact details
    pub customer: CustomerDetails,

    /// Delivery address; present only for delivery orders
    pub address: Option<DeliveryAddress>,

    /// Free-text instructions for the kitchen or driver
    pub special_instructions: Option<String>,

    /// Delivery or collection
    pub delivery_type: DeliveryType,

    /// Payment method
    pub payment_method: PaymentMethod,

    /// Last four digits of a simulated card
    pub card_last_four: Option<String>,

    /// Frozen order lines
    pub items: Vec<OrderItem>,

    /// Frozen totals
    pub totals: OrderTotals,

    /// Promo code redeemed by the order
    pub promo_code: Option<String>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Customer-facing reference
    pub reference: OrderReference,

    /// Contact details
    pub customer: CustomerDetails,

    /// Delivery address; present only for delivery orders
    pub address: Option<DeliveryAddress>,

    /// Free-text instructions for the kitchen or driver
    pub special_instructions: Option<String>,

    /// Delivery or collection
    pub delivery_type: DeliveryType,

    /// Payment method
    pub payment_method: PaymentMethod,

    /// Last four digits of a simulated card
    pub card_last_four: Option<String>,

    /// Frozen order lines
    pub items: Vec<OrderItem>,

    /// Frozen totals
    pub totals: OrderTotals,

    /// Promo code redeemed by the order
    pub promo_code: Option<String>,

    /// Kitchen status
    pub status: OrderStatus,

    /// When the order was placed
    pub created_at: Timestamp,

    /// When the status last changed
    pub updated_at: Timestamp,
}

impl Order {
    /// Places a drafted order under the given reference.
    pub fn place(draft: OrderDraft, reference: OrderReference, now: Timestamp) -> Self {
        let OrderDraft {
            customer,
            address,
            special_instructions,
            delivery_type,
            payment_method,
            card_last_four,
            items,
            totals,
            promo_code,
        } = draft;

        Self {
            reference,
            customer,
            address,
            special_instructions,
            delivery_type,
            payment_method,
            card_last_four,
            items,
            totals,
            promo_code,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the order one step along the kitchen workflow.
    ///
    /// `seen` is the status the caller based the request on; see [`OrderStatus::advance`].
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] if the order cannot advance from its current status.
    pub fn advance(
        &mut self,
        seen: OrderStatus,
        now: Timestamp,
    ) -> Result<StatusChange, TransitionError> {
        let change = self.status.advance(seen, self.delivery_type)?;

        self.apply(change, now);

        Ok(change)
    }

    /// Cancels the order.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotCancellable`] if the order was already completed.
    pub fn cancel(&mut self, now: Timestamp) -> Result<StatusChange, TransitionError> {
        let change = self.status.cancel()?;

        self.apply(change, now);

        Ok(change)
    }

    fn apply(&mut self, change: StatusChange, now: Timestamp) {
        if let StatusChange::Changed { to, .. } = change {
            self.status = to;
            self.updated_at = now;
        }
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;

    fn draft(delivery_type: DeliveryType) -> OrderDraft {
        OrderDraft {
            customer: CustomerDetails {
                full_name: "Asha Patel".to_string(),
                email: "asha@example.com".to_string(),
                phone: "07700 900123".to_string(),
            },
            address: None,
            special_instructions: None,
            delivery_type,
            payment_method: PaymentMethod::CashOnCollection,
            card_last_four: None,
            items: vec![OrderItem {
                item_id: Some(ItemId(1)),
                item_name: "Samosa".to_string(),
                unit_price: Money::from_minor(350, GBP),
                quantity: 2,
                notes: None,
            }],
            totals: OrderTotals {
                subtotal: Money::from_minor(700, GBP),
                delivery_charge: Money::from_minor(0, GBP),
                discount: Money::from_minor(0, GBP),
                total: Money::from_minor(700, GBP),
            },
            promo_code: None,
        }
    }

    #[test]
    fn generated_references_are_eight_upper_hex_chars() {
        let reference = OrderReference::generate();

        assert_eq!(reference.as_str().len(), OrderReference::LEN);
        assert!(
            reference
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
    }

    #[test]
    fn references_parse_case_insensitively() -> TestResult {
        let reference: OrderReference = "a1b2c3d4".parse()?;

        assert_eq!(reference.as_str(), "A1B2C3D4");
        assert!("A1B2C3D".parse::<OrderReference>().is_err());
        assert!("A1B2C3DZ".parse::<OrderReference>().is_err());

        Ok(())
    }

    #[test]
    fn references_round_trip_through_json() -> TestResult {
        let reference: OrderReference = "DEADBEEF".parse()?;

        let json = serde_json::to_string(&reference)?;
        assert_eq!(json, "\"DEADBEEF\"");

        let parsed: OrderReference = serde_json::from_str(&json)?;
        assert_eq!(parsed, reference);

        assert!(serde_json::from_str::<OrderReference>("\"nope\"").is_err());

        Ok(())
    }

    #[test]
    fn line_total_multiplies_unit_price() {
        let item = OrderItem {
            item_id: None,
            item_name: "Chai".to_string(),
            unit_price: Money::from_minor(275, GBP),
            quantity: 3,
            notes: None,
        };

        assert_eq!(item.line_total(), Money::from_minor(825, GBP));
    }

    #[test]
    fn placed_orders_start_pending() -> TestResult {
        let now = Timestamp::from_second(1_700_000_000)?;
        let order = Order::place(draft(DeliveryType::Collection), "0000ABCD".parse()?, now);

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.created_at, now);
        assert_eq!(order.updated_at, now);
        assert_eq!(order.total_quantity(), 2);

        Ok(())
    }

    #[test]
    fn advancing_updates_the_timestamp_only_on_change() -> TestResult {
        let placed = Timestamp::from_second(1_700_000_000)?;
        let later = Timestamp::from_second(1_700_000_600)?;
        let mut order = Order::place(draft(DeliveryType::Delivery), "0000ABCD".parse()?, placed);

        let change = order.advance(OrderStatus::Pending, later)?;
        assert_eq!(
            change,
            StatusChange::Changed {
                from: OrderStatus::Pending,
                to: OrderStatus::Confirmed
            }
        );
        assert_eq!(order.updated_at, later);

        let repeat = order.advance(OrderStatus::Pending, placed)?;
        assert_eq!(repeat, StatusChange::Unchanged(OrderStatus::Confirmed));
        assert_eq!(order.updated_at, later);

        Ok(())
    }

    #[test]
    fn cancel_then_cancel_again_is_a_no_op() -> TestResult {
        let now = Timestamp::from_second(1_700_000_000)?;
        let mut order = Order::place(draft(DeliveryType::Delivery), "0000ABCD".parse()?, now);

        assert!(order.cancel(now)?.is_changed());
        assert_eq!(
            order.cancel(now)?,
            StatusChange::Unchanged(OrderStatus::Cancelled)
        );
        assert_eq!(order.status, OrderStatus::Cancelled);

        Ok(())
    }

    #[test]
    fn machine_names_match_the_json_names() -> TestResult {
        for delivery_type in [DeliveryType::Delivery, DeliveryType::Collection] {
            assert_eq!(
                serde_json::to_value(delivery_type)?,
                serde_json::Value::from(delivery_type.as_str())
            );
            assert_eq!(delivery_type.as_str().parse::<DeliveryType>()?, delivery_type);
        }

        assert_eq!(
            "cash_on_collection".parse::<PaymentMethod>()?,
            PaymentMethod::CashOnCollection
        );
        assert_eq!(
            "cheque".parse::<PaymentMethod>(),
            Err(UnknownOption("cheque".to_string()))
        );

        Ok(())
    }
}
