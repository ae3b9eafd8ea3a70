//! Catalog

use std::{fmt, num::ParseIntError, str::FromStr};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::pricing::Price;

/// Identifier of a menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ItemId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ItemId)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A sellable menu item as the catalog currently describes it.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    /// Item identifier
    pub id: ItemId,

    /// Display name
    pub name: String,

    /// Current unit price
    pub price: Price,

    /// Whether the kitchen is currently serving the item
    pub is_available: bool,
}

impl CatalogItem {
    /// Creates an available item.
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            is_available: true,
        }
    }

    /// Marks the item as unavailable.
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }
}

/// Read access to menu items.
pub trait Catalog {
    /// Look up an item, whether or not it is currently available.
    fn get_item(&self, id: ItemId) -> Option<&CatalogItem>;

    /// Look up an item that can currently be ordered.
    fn get_orderable(&self, id: ItemId) -> Option<&CatalogItem> {
        self.get_item(id).filter(|item| item.is_available)
    }
}

/// An in-memory copy of the menu.
#[derive(Debug, Clone, Default)]
pub struct MenuSnapshot {
    items: FxHashMap<ItemId, CatalogItem>,
}

impl MenuSnapshot {
    /// Creates a menu from a list of items; later duplicates replace earlier ones.
    pub fn new(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
        }
    }

    /// Adds or replaces an item.
    pub fn insert(&mut self, item: CatalogItem) {
        self.items.insert(item.id, item);
    }

    /// Removes an item from the menu.
    pub fn remove(&mut self, id: ItemId) -> Option<CatalogItem> {
        self.items.remove(&id)
    }

    /// Number of items on the menu.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the menu has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Catalog for MenuSnapshot {
    fn get_item(&self, id: ItemId) -> Option<&CatalogItem> {
        self.items.get(&id)
    }
}

impl FromIterator<CatalogItem> for MenuSnapshot {
    fn from_iter<I: IntoIterator<Item = CatalogItem>>(iter: I) -> Self {
        Self::new(iter)
    }
}
