use serde::Serialize;

use super::cycle::{CycleType, WashTemperature};

/// A named machine program with a preset duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Program {
    pub name: &'static str,
    pub cycle_type: CycleType,
    pub duration_secs: u64,
    /// Dry programs carry no temperature.
    pub temperature: Option<WashTemperature>,
}

const fn wash(name: &'static str, duration_secs: u64, temperature: WashTemperature) -> Program {
    Program {
        name,
        cycle_type: CycleType::Wash,
        duration_secs,
        temperature: Some(temperature),
    }
}

const fn dry(name: &'static str, duration_secs: u64) -> Program {
    Program {
        name,
        cycle_type: CycleType::Dry,
        duration_secs,
        temperature: None,
    }
}

pub const WASH_PROGRAMS: [Program; 6] = [
    wash("Quick", 900, WashTemperature::Cold),
    wash("Cotton", 5400, WashTemperature::Hot),
    wash("Synthetic", 3600, WashTemperature::Warm),
    wash("Delicate", 2700, WashTemperature::Cold),
    wash("Wool", 2400, WashTemperature::Cold),
    wash("Intensive", 7200, WashTemperature::Hot),
];

pub const DRY_PROGRAMS: [Program; 6] = [
    dry("Quick", 1800),
    dry("Cotton", 3600),
    dry("Synthetic", 2700),
    dry("Delicate", 2400),
    dry("Towels", 4500),
    dry("Refresh", 900),
];

pub fn programs(cycle_type: CycleType) -> &'static [Program] {
    match cycle_type {
        CycleType::Wash => &WASH_PROGRAMS,
        CycleType::Dry => &DRY_PROGRAMS,
    }
}

/// Case-insensitive lookup by program name.
pub fn find_program(cycle_type: CycleType, name: &str) -> Option<Program> {
    programs(cycle_type)
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .copied()
}
