//! Domain entities: wardrobe items, supplies, and completed cycles.

mod clothing;
mod cycle;
mod program;
mod supply;

pub use clothing::{ClothingCategory, ClothingItem};
pub use cycle::{CycleLoad, CycleType, WashCycle, WashTemperature};
pub use program::{find_program, programs, Program, DRY_PROGRAMS, WASH_PROGRAMS};
pub use supply::{Supply, SupplyType, LOW_SUPPLY_THRESHOLD};
