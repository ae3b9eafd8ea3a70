//! Orders Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use tiffin::{
    catalog::ItemId,
    orders::{
        CustomerDetails, DeliveryAddress, DeliveryType, Order, OrderItem, OrderReference,
        OrderStatus, OrderTotals, PaymentMethod,
    },
    promotions::CustomerHistory,
};
use uuid::Uuid;

use crate::{
    database::{decode_error, try_get_currency, try_get_item_id, try_get_price, try_i64_from_item_id},
    domain::{orders::models::OrderRecord, sessions::CustomerUuid},
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const CREATE_ORDER_ITEM_SQL: &str = include_str!("sql/create_order_item.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const GET_ORDER_FOR_UPDATE_SQL: &str = include_str!("sql/get_order_for_update.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("sql/get_order_items.sql");
const LIST_ACTIVE_ORDERS_SQL: &str = include_str!("sql/list_active_orders.sql");
const LIST_CUSTOMER_ORDERS_SQL: &str = include_str!("sql/list_customer_orders.sql");
const CUSTOMER_HAS_ORDERS_SQL: &str = include_str!("sql/customer_has_orders.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("sql/update_order_status.sql");

/// An `orders` row; items are attached separately.
pub(crate) struct OrderRow {
    pub uuid: Uuid,
    pub record: OrderRecord,
    currency: &'static Currency,
}

/// An `order_items` row.
struct OrderItemRow {
    order_uuid: Uuid,
    item_id: Option<ItemId>,
    item_name: String,
    unit_price: i64,
    quantity: u32,
    notes: Option<String>,
}

/// Placed orders and their frozen lines.
#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Stores a new order and its lines, returning the order's row id.
    ///
    /// Returns `None` without storing anything when the reference is already taken. The
    /// clash does not abort the transaction, so the caller can retry with a new reference.
    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record: &OrderRecord,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let order = &record.order;
        let address = order.address.as_ref();

        let created = query_scalar::<Postgres, Uuid>(CREATE_ORDER_SQL)
            .bind(Uuid::now_v7())
            .bind(order.reference.as_str())
            .bind(record.owner.map(CustomerUuid::into_uuid))
            .bind(&order.customer.full_name)
            .bind(&order.customer.email)
            .bind(&order.customer.phone)
            .bind(address.map(|address| address.line1.as_str()))
            .bind(address.and_then(|address| address.line2.as_deref()))
            .bind(address.map(|address| address.city.as_str()))
            .bind(address.map(|address| address.postcode.as_str()))
            .bind(order.special_instructions.as_deref())
            .bind(order.delivery_type.as_str())
            .bind(order.payment_method.as_str())
            .bind(order.card_last_four.as_deref())
            .bind(order.totals.total.currency().iso_alpha_code)
            .bind(order.totals.subtotal.to_minor_units())
            .bind(order.totals.delivery_charge.to_minor_units())
            .bind(order.totals.discount.to_minor_units())
            .bind(order.totals.total.to_minor_units())
            .bind(order.promo_code.as_deref())
            .bind(order.status.as_str())
            .bind(SqlxTimestamp::from(order.created_at))
            .bind(SqlxTimestamp::from(order.updated_at))
            .fetch_optional(&mut **tx)
            .await?;

        let Some(order_uuid) = created else {
            return Ok(None);
        };

        for (line_no, item) in order.items.iter().enumerate() {
            query(CREATE_ORDER_ITEM_SQL)
                .bind(Uuid::now_v7())
                .bind(order_uuid)
                .bind(i32::try_from(line_no).map_err(|e| sqlx::Error::Encode(Box::new(e)))?)
                .bind(item.item_id.map(try_i64_from_item_id).transpose()?)
                .bind(&item.item_name)
                .bind(item.unit_price.to_minor_units())
                .bind(i32::try_from(item.quantity).map_err(|e| sqlx::Error::Encode(Box::new(e)))?)
                .bind(item.notes.as_deref())
                .execute(&mut **tx)
                .await?;
        }

        Ok(Some(order_uuid))
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference: &OrderReference,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        let row = query_as::<Postgres, OrderRow>(GET_ORDER_SQL)
            .bind(reference.as_str())
            .fetch_optional(&mut **tx)
            .await?;

        let rows = self.with_items(tx, row.into_iter().collect()).await?;

        Ok(rows.into_iter().next().map(|row| row.record))
    }

    /// Loads an order and locks it until the transaction ends.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference: &OrderReference,
    ) -> Result<Option<OrderRow>, sqlx::Error> {
        let row = query_as::<Postgres, OrderRow>(GET_ORDER_FOR_UPDATE_SQL)
            .bind(reference.as_str())
            .fetch_optional(&mut **tx)
            .await?;

        Ok(self.with_items(tx, row.into_iter().collect()).await?.pop())
    }

    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order_uuid: Uuid,
        status: OrderStatus,
        updated_at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_ORDER_STATUS_SQL)
            .bind(order_uuid)
            .bind(status.as_str())
            .bind(SqlxTimestamp::from(updated_at))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Orders the kitchen still has to deal with, oldest first.
    pub(crate) async fn active_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let rows = query_as::<Postgres, OrderRow>(LIST_ACTIVE_ORDERS_SQL)
            .fetch_all(&mut **tx)
            .await?;

        Ok(self
            .with_items(tx, rows)
            .await?
            .into_iter()
            .map(|row| row.record.order)
            .collect())
    }

    /// A customer's orders, newest first.
    pub(crate) async fn customer_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let rows = query_as::<Postgres, OrderRow>(LIST_CUSTOMER_ORDERS_SQL)
            .bind(customer.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(self
            .with_items(tx, rows)
            .await?
            .into_iter()
            .map(|row| row.record.order)
            .collect())
    }

    /// Order history used by first-order offers. Cancelled orders still count.
    pub(crate) async fn customer_history(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: Option<CustomerUuid>,
    ) -> Result<CustomerHistory, sqlx::Error> {
        let Some(customer) = customer else {
            return Ok(CustomerHistory::Guest);
        };

        let has_orders = query_scalar::<Postgres, bool>(CUSTOMER_HAS_ORDERS_SQL)
            .bind(customer.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        Ok(if has_orders {
            CustomerHistory::HasOrders
        } else {
            CustomerHistory::NoOrders
        })
    }

    /// Attaches every row's lines, in line order.
    async fn with_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut rows: Vec<OrderRow>,
    ) -> Result<Vec<OrderRow>, sqlx::Error> {
        if rows.is_empty() {
            return Ok(rows);
        }

        let uuids: Vec<Uuid> = rows.iter().map(|row| row.uuid).collect();

        let items = query_as::<Postgres, OrderItemRow>(GET_ORDER_ITEMS_SQL)
            .bind(&uuids)
            .fetch_all(&mut **tx)
            .await?;

        let mut by_order: FxHashMap<Uuid, Vec<OrderItemRow>> = FxHashMap::default();

        for item in items {
            by_order.entry(item.order_uuid).or_default().push(item);
        }

        for row in &mut rows {
            let currency = row.currency;

            row.record.order.items = by_order
                .remove(&row.uuid)
                .unwrap_or_default()
                .into_iter()
                .map(|item| OrderItem {
                    item_id: item.item_id,
                    item_name: item.item_name,
                    unit_price: Money::from_minor(item.unit_price, currency),
                    quantity: item.quantity,
                    notes: item.notes,
                })
                .collect();
        }

        Ok(rows)
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let currency = try_get_currency(row)?;

        let reference: String = row.try_get("reference")?;
        let delivery_type: String = row.try_get("delivery_type")?;
        let payment_method: String = row.try_get("payment_method")?;
        let status: String = row.try_get("status")?;

        let address = match row.try_get::<Option<String>, _>("address_line1")? {
            Some(line1) => Some(DeliveryAddress {
                line1,
                line2: row.try_get("address_line2")?,
                city: row.try_get::<Option<String>, _>("city")?.unwrap_or_default(),
                postcode: row
                    .try_get::<Option<String>, _>("postcode")?
                    .unwrap_or_default(),
            }),
            None => None,
        };

        let order = Order {
            reference: reference
                .parse()
                .map_err(|e| decode_error("reference", e))?,
            customer: CustomerDetails {
                full_name: row.try_get("full_name")?,
                email: row.try_get("email")?,
                phone: row.try_get("phone")?,
            },
            address,
            special_instructions: row.try_get("special_instructions")?,
            delivery_type: delivery_type
                .parse::<DeliveryType>()
                .map_err(|e| decode_error("delivery_type", e))?,
            payment_method: payment_method
                .parse::<PaymentMethod>()
                .map_err(|e| decode_error("payment_method", e))?,
            card_last_four: row.try_get("card_last_four")?,
            items: Vec::new(),
            totals: OrderTotals {
                subtotal: try_get_price(row, "subtotal", currency)?,
                delivery_charge: try_get_price(row, "delivery_charge", currency)?,
                discount: try_get_price(row, "discount", currency)?,
                total: try_get_price(row, "total", currency)?,
            },
            promo_code: row.try_get("promo_code")?,
            status: status
                .parse::<OrderStatus>()
                .map_err(|e| decode_error("status", e))?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        };

        Ok(Self {
            uuid: row.try_get("uuid")?,
            record: OrderRecord {
                order,
                owner: row
                    .try_get::<Option<Uuid>, _>("customer_uuid")?
                    .map(CustomerUuid::from_uuid),
            },
            currency,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItemRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let quantity: i32 = row.try_get("quantity")?;

        Ok(Self {
            order_uuid: row.try_get("order_uuid")?,
            item_id: try_get_item_id(row, "item_id")?,
            item_name: row.try_get("item_name")?,
            unit_price: row.try_get("unit_price")?,
            quantity: u32::try_from(quantity).map_err(|e| decode_error("quantity", e))?,
            notes: row.try_get("notes")?,
        })
    }
}
