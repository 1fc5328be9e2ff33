use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClothingCategory {
    Tops,
    Bottoms,
    Outerwear,
    Underwear,
    Sportswear,
    Accessories,
    Bedding,
    Towels,
}

impl ClothingCategory {
    /// Every category in declaration order. Statistics break ties in this order.
    pub const ALL: [ClothingCategory; 8] = [
        ClothingCategory::Tops,
        ClothingCategory::Bottoms,
        ClothingCategory::Outerwear,
        ClothingCategory::Underwear,
        ClothingCategory::Sportswear,
        ClothingCategory::Accessories,
        ClothingCategory::Bedding,
        ClothingCategory::Towels,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ClothingCategory::Tops => "Tops",
            ClothingCategory::Bottoms => "Bottoms",
            ClothingCategory::Outerwear => "Outerwear",
            ClothingCategory::Underwear => "Underwear",
            ClothingCategory::Sportswear => "Sportswear",
            ClothingCategory::Accessories => "Accessories",
            ClothingCategory::Bedding => "Bedding",
            ClothingCategory::Towels => "Towels",
        }
    }

    /// Default icon reference for items of this category.
    pub fn icon(&self) -> &'static str {
        match self {
            ClothingCategory::Tops => "tshirt",
            ClothingCategory::Bottoms => "figure.stand",
            ClothingCategory::Outerwear => "cloud.snow",
            ClothingCategory::Underwear => "heart",
            ClothingCategory::Sportswear => "figure.run",
            ClothingCategory::Accessories => "bag",
            ClothingCategory::Bedding => "bed.double",
            ClothingCategory::Towels => "humidity",
        }
    }
}

impl std::fmt::Display for ClothingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ClothingCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "category".into(),
                message: format!("unknown category '{wanted}'"),
            })
    }
}

/// A tracked garment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothingItem {
    pub id: Uuid,
    pub name: String,
    pub category: ClothingCategory,
    pub color: String,
    #[serde(default)]
    pub last_washed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub wash_count: u32,
    #[serde(default)]
    pub notes: String,
    pub icon: String,
}

impl ClothingItem {
    /// New, never-washed item using the category's default icon.
    pub fn new(name: impl Into<String>, category: ClothingCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category,
            color: String::new(),
            last_washed: None,
            wash_count: 0,
            notes: String::new(),
            icon: category.icon().to_string(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Whole days since the last wash, `None` if never washed.
    pub fn days_since_wash(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_washed.map(|at| (now - at).num_days())
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName {
                field: "name".into(),
            });
        }
        Ok(())
    }

    /// Record a wash: both fields change together.
    pub(crate) fn record_wash(&mut self, now: DateTime<Utc>) {
        self.last_washed = Some(now);
        self.wash_count = self.wash_count.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("towels".parse::<ClothingCategory>().unwrap(), ClothingCategory::Towels);
        assert_eq!(" Tops ".parse::<ClothingCategory>().unwrap(), ClothingCategory::Tops);
        assert!("socks".parse::<ClothingCategory>().is_err());
    }

    #[test]
    fn category_serializes_with_stable_tags() {
        let json = serde_json::to_string(&ClothingCategory::Sportswear).unwrap();
        assert_eq!(json, "\"sportswear\"");
    }

    #[test]
    fn new_item_uses_category_icon() {
        let item = ClothingItem::new("Duvet", ClothingCategory::Bedding);
        assert_eq!(item.icon, "bed.double");
        assert_eq!(item.wash_count, 0);
        assert!(item.last_washed.is_none());
    }

    #[test]
    fn days_since_wash_counts_whole_days() {
        let now = Utc::now();
        let mut item = ClothingItem::new("Shirt", ClothingCategory::Tops);
        assert_eq!(item.days_since_wash(now), None);
        item.record_wash(now - Duration::hours(50));
        assert_eq!(item.days_since_wash(now), Some(2));
        assert_eq!(item.wash_count, 1);
    }

    #[test]
    fn blank_name_is_rejected() {
        let item = ClothingItem::new("   ", ClothingCategory::Tops);
        assert!(matches!(
            item.validate(),
            Err(ValidationError::EmptyName { .. })
        ));
    }
}
