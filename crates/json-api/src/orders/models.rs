//! Order Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use tiffin::{
    orders::{DeliveryType, Order, OrderItem, OrderStatus, PaymentMethod},
    pricing::format_amount,
};

use tiffin_app::domain::orders::models::OrderStatusView;

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub(crate) enum DeliveryOption {
    #[default]
    Delivery,
    Collection,
}

impl From<DeliveryOption> for DeliveryType {
    fn from(option: DeliveryOption) -> Self {
        match option {
            DeliveryOption::Delivery => DeliveryType::Delivery,
            DeliveryOption::Collection => DeliveryType::Collection,
        }
    }
}

impl From<DeliveryType> for DeliveryOption {
    fn from(delivery_type: DeliveryType) -> Self {
        match delivery_type {
            DeliveryType::Delivery => DeliveryOption::Delivery,
            DeliveryType::Collection => DeliveryOption::Collection,
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub(crate) enum PaymentOption {
    Card,
    CashOnDelivery,
    CashOnCollection,
}

impl From<PaymentOption> for PaymentMethod {
    fn from(option: PaymentOption) -> Self {
        match option {
            PaymentOption::Card => PaymentMethod::Card,
            PaymentOption::CashOnDelivery => PaymentMethod::CashOnDelivery,
            PaymentOption::CashOnCollection => PaymentMethod::CashOnCollection,
        }
    }
}

impl From<PaymentMethod> for PaymentOption {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Card => PaymentOption::Card,
            PaymentMethod::CashOnDelivery => PaymentOption::CashOnDelivery,
            PaymentMethod::CashOnCollection => PaymentOption::CashOnCollection,
        }
    }
}

/// Order Response
///
/// Prices are the ones frozen when the order was placed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    /// Customer-facing order reference
    pub reference: String,

    pub status: String,
    pub status_label: String,
    pub delivery_type: DeliveryOption,
    pub payment_method: PaymentOption,
    pub payment_label: String,

    /// Last four digits of the card, for card payments
    pub card_last_four: Option<String>,

    pub full_name: String,
    pub email: String,
    pub phone: String,

    /// Delivery address, for delivery orders
    pub address: Option<AddressResponse>,

    pub special_instructions: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub subtotal: String,
    pub delivery_charge: String,
    pub discount: String,
    pub total: String,
    pub promo_code: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Address Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddressResponse {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postcode: String,
}

/// Order Item Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemResponse {
    /// Menu item, if it is still on the menu
    pub item_id: Option<u64>,

    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub notes: Option<String>,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            item_id: item.item_id.map(|id| id.0),
            name: item.item_name.clone(),
            quantity: item.quantity,
            unit_price: format_amount(&item.unit_price),
            line_total: format_amount(&item.line_total()),
            notes: item.notes.clone(),
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            reference: order.reference.to_string(),
            status: order.status.as_str().to_string(),
            status_label: order.status.label().to_string(),
            delivery_type: order.delivery_type.into(),
            payment_method: order.payment_method.into(),
            payment_label: order.payment_method.label().to_string(),
            card_last_four: order.card_last_four.clone(),
            full_name: order.customer.full_name.clone(),
            email: order.customer.email.clone(),
            phone: order.customer.phone.clone(),
            address: order.address.as_ref().map(|address| AddressResponse {
                line1: address.line1.clone(),
                line2: address.line2.clone(),
                city: address.city.clone(),
                postcode: address.postcode.clone(),
            }),
            special_instructions: order.special_instructions.clone(),
            items: order.items.iter().map(OrderItemResponse::from).collect(),
            subtotal: format_amount(&order.totals.subtotal),
            delivery_charge: format_amount(&order.totals.delivery_charge),
            discount: format_amount(&order.totals.discount),
            total: format_amount(&order.totals.total),
            promo_code: order.promo_code.clone(),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
        }
    }
}

/// Order Status Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderStatusResponse {
    pub reference: String,
    pub status: String,
    pub status_label: String,

    /// Minutes until ready or delivered, while the order is in progress
    pub estimated_minutes_remaining: Option<u32>,

    /// When the order should be ready or delivered
    pub estimated_ready_time: Option<String>,
}

impl From<OrderStatusView> for OrderStatusResponse {
    fn from(view: OrderStatusView) -> Self {
        Self {
            reference: view.reference.to_string(),
            status: view.status.as_str().to_string(),
            status_label: view.status.label().to_string(),
            estimated_minutes_remaining: view.estimate.minutes_remaining,
            estimated_ready_time: view.estimate.ready_at.map(|at| at.to_string()),
        }
    }
}

/// Status Change Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct StatusChangeResponse {
    pub reference: String,
    pub status: String,
    pub status_label: String,

    /// False when the request repeated one already applied
    pub changed: bool,
}

impl StatusChangeResponse {
    pub(crate) fn new(reference: &str, status: OrderStatus, changed: bool) -> Self {
        Self {
            reference: reference.to_string(),
            status: status.as_str().to_string(),
            status_label: status.label().to_string(),
            changed,
        }
    }
}
