//! # Washday Core Library
//!
//! This library provides the core logic for the Washday laundry tracker.
//! Every operation is available through the `washday` CLI binary, which is a
//! thin layer over the [`LaundryContext`] command surface defined here.
//!
//! ## Architecture
//!
//! - **Timer Engine**: one countdown state machine per appliance (wash, dry).
//!   The caller invokes `tick()` once per second; [`TickDriver`] does that on
//!   the tokio runtime
//! - **Ledger**: append-only history of completed cycles
//! - **Inventory**: tracked garments and consumable supplies
//! - **Statistics**: pure aggregation over ledger and inventory
//! - **Storage**: SQLite-backed collections and alerts, TOML configuration
//!
//! ## Key Components
//!
//! - [`LaundryContext`]: the process-wide owner of all mutable state
//! - [`TimerEngine`]: countdown state machine
//! - [`Database`]: persistence and alert gateway
//! - [`Config`]: application configuration management

pub mod clock;
pub mod context;
pub mod error;
pub mod events;
pub mod gateway;
pub mod inventory;
pub mod ledger;
pub mod model;
pub mod stats;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{ContextSettings, LaundryContext};
pub use error::{
    ConfigError, CoreError, NotificationError, PersistenceError, Result, ValidationError,
};
pub use events::Event;
pub use gateway::{
    Collection, LogNotifier, MemoryStore, NoopNotifier, NotificationGateway, PersistenceGateway,
    StoreTxn, TxnBody,
};
pub use inventory::{InventoryStore, ItemQuery, ItemSort, SupplyQuery};
pub use ledger::{CycleFilter, CycleLedger};
pub use model::{
    find_program, programs, ClothingCategory, ClothingItem, CycleLoad, CycleType, Program, Supply,
    SupplyType, WashCycle, WashTemperature, LOW_SUPPLY_THRESHOLD,
};
pub use stats::{Achievement, AchievementStatus, CategoryWashes, Statistics, Trend};
pub use storage::{data_dir, Config, Database, PendingAlert};
pub use timer::{PhaseKind, TickDriver, TimerEngine, TimerPhase, TimerState};
