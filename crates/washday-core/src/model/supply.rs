use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Supplies strictly below this remaining percentage are "low".
pub const LOW_SUPPLY_THRESHOLD: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyType {
    Detergent,
    LiquidDetergent,
    FabricSoftener,
    StainRemover,
    Bleach,
    Pods,
    DryerSheets,
}

impl SupplyType {
    pub const ALL: [SupplyType; 7] = [
        SupplyType::Detergent,
        SupplyType::LiquidDetergent,
        SupplyType::FabricSoftener,
        SupplyType::StainRemover,
        SupplyType::Bleach,
        SupplyType::Pods,
        SupplyType::DryerSheets,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SupplyType::Detergent => "Detergent",
            SupplyType::LiquidDetergent => "Liquid Detergent",
            SupplyType::FabricSoftener => "Fabric Softener",
            SupplyType::StainRemover => "Stain Remover",
            SupplyType::Bleach => "Bleach",
            SupplyType::Pods => "Pods",
            SupplyType::DryerSheets => "Dryer Sheets",
        }
    }
}

impl std::fmt::Display for SupplyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for SupplyType {
    type Err = ValidationError;

    /// Accepts the label ("Liquid Detergent") or the tag ("liquid_detergent").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "type".into(),
                message: format!("unknown supply type '{}'", s.trim()),
            })
    }
}

/// A consumable laundry supply.
///
/// `remaining_percent` is private so every write goes through the clamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supply {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub supply_type: SupplyType,
    #[serde(deserialize_with = "deserialize_percent")]
    remaining_percent: f64,
    pub purchased_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

impl Supply {
    /// A full supply purchased at `purchased_at`.
    pub fn new(
        name: impl Into<String>,
        supply_type: SupplyType,
        purchased_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            supply_type,
            remaining_percent: 100.0,
            purchased_at,
            notes: String::new(),
        }
    }

    pub fn with_remaining(mut self, percent: f64) -> Self {
        self.set_remaining_percent(percent);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn remaining_percent(&self) -> f64 {
        self.remaining_percent
    }

    pub fn set_remaining_percent(&mut self, percent: f64) {
        self.remaining_percent = clamp_percent(percent);
    }

    pub fn is_low(&self) -> bool {
        self.remaining_percent < LOW_SUPPLY_THRESHOLD
    }

    /// Subtract `amount` percentage points and re-clamp.
    pub fn consume(&mut self, amount: f64) -> Result<f64, ValidationError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::NonPositiveAmount { amount });
        }
        self.set_remaining_percent(self.remaining_percent - amount);
        Ok(self.remaining_percent)
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName {
                field: "name".into(),
            });
        }
        Ok(())
    }
}

fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0)
}

fn deserialize_percent<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_percent)
}
