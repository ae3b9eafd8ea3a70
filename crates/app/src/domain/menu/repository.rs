//! Menu Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use tiffin::catalog::{CatalogItem, ItemId, MenuSnapshot};

use crate::database::{decode_error, try_get_currency, try_get_price, try_i64_from_item_id};

const LIST_MENU_ITEMS_SQL: &str = include_str!("sql/list_menu_items.sql");
const UPSERT_MENU_ITEM_SQL: &str = include_str!("sql/upsert_menu_item.sql");

/// A `menu_items` row.
struct MenuItemRow(CatalogItem);

#[derive(Debug, Clone, Default)]
pub(crate) struct PgMenuRepository;

impl PgMenuRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// The whole menu, unavailable items included.
    pub(crate) async fn menu(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<MenuSnapshot, sqlx::Error> {
        let rows = query_as::<Postgres, MenuItemRow>(LIST_MENU_ITEMS_SQL)
            .fetch_all(&mut **tx)
            .await?;

        Ok(rows.into_iter().map(|MenuItemRow(item)| item).collect())
    }

    /// Adds an item or replaces its details; baskets keep the price they captured.
    pub(crate) async fn upsert_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: &CatalogItem,
    ) -> Result<(), sqlx::Error> {
        query(UPSERT_MENU_ITEM_SQL)
            .bind(try_i64_from_item_id(item.id)?)
            .bind(&item.name)
            .bind(item.price.to_minor_units())
            .bind(item.price.currency().iso_alpha_code)
            .bind(item.is_available)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for MenuItemRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let id: i64 = row.try_get("id")?;
        let currency = try_get_currency(row)?;

        Ok(Self(CatalogItem {
            id: u64::try_from(id)
                .map(ItemId)
                .map_err(|e| decode_error("id", e))?,
            name: row.try_get("name")?,
            price: try_get_price(row, "price", currency)?,
            is_available: row.try_get("is_available")?,
        }))
    }
}
