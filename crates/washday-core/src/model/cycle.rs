use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleType {
    Wash,
    Dry,
}

impl CycleType {
    pub const ALL: [CycleType; 2] = [CycleType::Wash, CycleType::Dry];

    pub fn as_str(&self) -> &'static str {
        match self {
            CycleType::Wash => "wash",
            CycleType::Dry => "dry",
        }
    }
}

impl std::fmt::Display for CycleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CycleType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wash" | "washer" => Ok(CycleType::Wash),
            "dry" | "dryer" => Ok(CycleType::Dry),
            other => Err(ValidationError::InvalidValue {
                field: "cycle_type".into(),
                message: format!("expected 'wash' or 'dry', got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WashTemperature {
    Cold,
    #[default]
    Warm,
    Hot,
}

impl WashTemperature {
    pub fn degrees(&self) -> &'static str {
        match self {
            WashTemperature::Cold => "68°F",
            WashTemperature::Warm => "104°F",
            WashTemperature::Hot => "140°F",
        }
    }
}

impl std::str::FromStr for WashTemperature {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cold" => Ok(WashTemperature::Cold),
            "warm" => Ok(WashTemperature::Warm),
            "hot" => Ok(WashTemperature::Hot),
            other => Err(ValidationError::InvalidValue {
                field: "temperature".into(),
                message: format!("expected cold, warm or hot, got '{other}'"),
            }),
        }
    }
}

/// What went into the machine. Copied onto the cycle record at completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleLoad {
    #[serde(default)]
    pub temperature: WashTemperature,
    #[serde(default)]
    pub item_ids: Vec<Uuid>,
    #[serde(default)]
    pub supply_ids: Vec<Uuid>,
    #[serde(default)]
    pub notes: String,
}

impl CycleLoad {
    pub fn with_temperature(temperature: WashTemperature) -> Self {
        Self {
            temperature,
            ..Self::default()
        }
    }
}

/// One completed wash or dry run.
///
/// Immutable once built, and only built by a timer reaching zero, so the
/// fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WashCycle {
    id: Uuid,
    occurred_at: DateTime<Utc>,
    duration_secs: u64,
    temperature: WashTemperature,
    #[serde(default)]
    item_ids: Vec<Uuid>,
    #[serde(default)]
    supply_ids: Vec<Uuid>,
    #[serde(rename = "type")]
    cycle_type: CycleType,
    #[serde(default)]
    notes: String,
}

impl WashCycle {
    pub(crate) fn completed(
        cycle_type: CycleType,
        duration_secs: u64,
        occurred_at: DateTime<Utc>,
        load: CycleLoad,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at,
            duration_secs,
            temperature: load.temperature,
            item_ids: load.item_ids,
            supply_ids: load.supply_ids,
            cycle_type,
            notes: load.notes,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn temperature(&self) -> WashTemperature {
        self.temperature
    }

    pub fn item_ids(&self) -> &[Uuid] {
        &self.item_ids
    }

    pub fn supply_ids(&self) -> &[Uuid] {
        &self.supply_ids
    }

    pub fn cycle_type(&self) -> CycleType {
        self.cycle_type
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_type_parses_appliance_names() {
        assert_eq!("washer".parse::<CycleType>().unwrap(), CycleType::Wash);
        assert_eq!("DRY".parse::<CycleType>().unwrap(), CycleType::Dry);
        assert!("spin".parse::<CycleType>().is_err());
    }

    #[test]
    fn completed_cycle_copies_the_load() {
        let item = Uuid::new_v4();
        let load = CycleLoad {
            temperature: WashTemperature::Hot,
            item_ids: vec![item],
            supply_ids: vec![],
            notes: "whites".into(),
        };
        let cycle = WashCycle::completed(CycleType::Wash, 5400, Utc::now(), load);
        assert_eq!(cycle.temperature(), WashTemperature::Hot);
        assert_eq!(cycle.item_ids(), &[item]);
        assert_eq!(cycle.notes(), "whites");
        assert_eq!(cycle.duration_secs(), 5400);
    }

    #[test]
    fn cycle_json_uses_type_tag() {
        let cycle = WashCycle::completed(CycleType::Dry, 60, Utc::now(), CycleLoad::default());
        let json = serde_json::to_value(&cycle).unwrap();
        assert_eq!(json["type"], "dry");
        assert_eq!(json["temperature"], "warm");
    }
}
