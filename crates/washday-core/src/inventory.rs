//! Wardrobe and supply collections.
//!
//! Both collections are keyed by id and kept in insertion order. A missing id
//! is never an error: mutators report `false`/`None` and leave state alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::model::{ClothingCategory, ClothingItem, Supply, SupplyType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSort {
    /// Longest since last wash first; never-washed items lead.
    #[default]
    LastWashed,
    Name,
    /// Most washed first.
    WashCount,
}

#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub category: Option<ClothingCategory>,
    /// Case-insensitive match on name or category label.
    pub search: Option<String>,
    pub sort: ItemSort,
}

#[derive(Debug, Clone, Default)]
pub struct SupplyQuery {
    pub supply_type: Option<SupplyType>,
    /// Case-insensitive match on name or type label.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryStore {
    items: Vec<ClothingItem>,
    supplies: Vec<Supply>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(items: Vec<ClothingItem>, supplies: Vec<Supply>) -> Self {
        Self { items, supplies }
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.supplies.clear();
    }

    // ── Clothing ─────────────────────────────────────────────────────

    pub fn items(&self) -> &[ClothingItem] {
        &self.items
    }

    pub fn item(&self, id: Uuid) -> Option<&ClothingItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Insert, or replace the item with the same id.
    pub fn add_item(&mut self, item: ClothingItem) -> Result<Uuid, ValidationError> {
        item.validate()?;
        let id = item.id;
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
        Ok(id)
    }

    /// Replace an existing item. `Ok(false)` when the id is gone.
    pub fn update_item(&mut self, item: ClothingItem) -> Result<bool, ValidationError> {
        item.validate()?;
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => {
                *existing = item;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn delete_item(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    /// Stamp the wash instant and bump the count together.
    pub fn mark_as_washed(&mut self, id: Uuid, now: DateTime<Utc>) -> Option<&ClothingItem> {
        let item = self.items.iter_mut().find(|i| i.id == id)?;
        item.record_wash(now);
        Some(item)
    }

    pub fn query_items(&self, query: &ItemQuery, now: DateTime<Utc>) -> Vec<ClothingItem> {
        let needle = normalized(query.search.as_deref());
        let mut hits: Vec<ClothingItem> = self
            .items
            .iter()
            .filter(|i| query.category.map_or(true, |c| i.category == c))
            .filter(|i| {
                needle.as_deref().map_or(true, |n| {
                    contains_ci(&i.name, n) || contains_ci(i.category.label(), n)
                })
            })
            .cloned()
            .collect();

        match query.sort {
            ItemSort::LastWashed => hits.sort_by_key(|i| {
                std::cmp::Reverse(i.days_since_wash(now).unwrap_or(i64::MAX))
            }),
            ItemSort::Name => hits.sort_by_key(|i| i.name.to_lowercase()),
            ItemSort::WashCount => hits.sort_by_key(|i| std::cmp::Reverse(i.wash_count)),
        }
        hits
    }

    /// Items last washed more than `days` days ago, most overdue first.
    /// Never-washed items are not overdue.
    pub fn needs_wash(&self, now: DateTime<Utc>, days: i64) -> Vec<ClothingItem> {
        let mut overdue: Vec<ClothingItem> = self
            .items
            .iter()
            .filter(|i| i.days_since_wash(now).is_some_and(|d| d > days))
            .cloned()
            .collect();
        overdue.sort_by_key(|i| std::cmp::Reverse(i.days_since_wash(now)));
        overdue
    }

    // ── Supplies ─────────────────────────────────────────────────────

    pub fn supplies(&self) -> &[Supply] {
        &self.supplies
    }

    pub fn supply(&self, id: Uuid) -> Option<&Supply> {
        self.supplies.iter().find(|s| s.id == id)
    }

    /// Insert, or replace the supply with the same id.
    pub fn add_supply(&mut self, supply: Supply) -> Result<Uuid, ValidationError> {
        supply.validate()?;
        let id = supply.id;
        match self.supplies.iter_mut().find(|s| s.id == id) {
            Some(existing) => *existing = supply,
            None => self.supplies.push(supply),
        }
        Ok(id)
    }

    pub fn update_supply(&mut self, supply: Supply) -> Result<bool, ValidationError> {
        supply.validate()?;
        match self.supplies.iter_mut().find(|s| s.id == supply.id) {
            Some(existing) => {
                *existing = supply;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn delete_supply(&mut self, id: Uuid) -> bool {
        let before = self.supplies.len();
        self.supplies.retain(|s| s.id != id);
        self.supplies.len() != before
    }

    /// Use `amount` percentage points. `Ok(None)` when the id is gone,
    /// otherwise the clamped remaining percentage.
    pub fn consume_supply(&mut self, id: Uuid, amount: f64) -> Result<Option<f64>, ValidationError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::NonPositiveAmount { amount });
        }
        match self.supplies.iter_mut().find(|s| s.id == id) {
            Some(supply) => supply.consume(amount).map(Some),
            None => Ok(None),
        }
    }

    /// Supplies under the low threshold, in no particular order.
    pub fn low_supplies(&self) -> Vec<Supply> {
        self.supplies.iter().filter(|s| s.is_low()).cloned().collect()
    }

    /// Matching supplies, emptiest first.
    pub fn query_supplies(&self, query: &SupplyQuery) -> Vec<Supply> {
        let needle = normalized(query.search.as_deref());
        let mut hits: Vec<Supply> = self
            .supplies
            .iter()
            .filter(|s| query.supply_type.map_or(true, |t| s.supply_type == t))
            .filter(|s| {
                needle.as_deref().map_or(true, |n| {
                    contains_ci(&s.name, n) || contains_ci(s.supply_type.label(), n)
                })
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.remaining_percent().total_cmp(&b.remaining_percent()));
        hits
    }
}

fn normalized(search: Option<&str>) -> Option<String> {
    search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}
