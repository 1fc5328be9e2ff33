//! The process-wide laundry context.
//!
//! One [`LaundryContext`] owns both timer engines, the wardrobe/supply
//! inventory and the cycle ledger. It is built once at startup from the
//! persistence gateway and handed out behind an `Arc`.
//!
//! ## Locking
//!
//! Each engine has its own mutex so wash and dry never wait on each other.
//! The ledger has one more; an engine that completes takes its own lock and
//! then the ledger lock, never the other way round. `reset_all_data` takes
//! every lock in the order wash, dry, inventory, ledger.
//!
//! ## Gateway failures
//!
//! Saves and alert requests are issued inside the same critical section as
//! the state change that caused them. When one fails the in-memory state
//! stands; the failure is logged and kept for [`LaundryContext::take_gateway_error`].
//!
//! ## Shared stores
//!
//! Several processes may hold a context over the same database. A
//! completion is committed in one store transaction that re-reads the saved
//! timer and cycle history: if the saved timer is no longer the run that
//! just finished (stopped, restarted or already completed elsewhere) the
//! completion is dropped, otherwise the cycle is appended to the saved
//! history rather than to this process's copy of it.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CoreError, PersistenceError, ValidationError};
use crate::events::Event;
use crate::gateway::{Collection, NotificationGateway, PersistenceGateway};
use crate::inventory::{InventoryStore, ItemQuery, SupplyQuery};
use crate::ledger::{CycleFilter, CycleLedger};
use crate::model::{ClothingItem, CycleLoad, CycleType, Supply, WashCycle};
use crate::stats::{self, Statistics};
use crate::storage::Config;
use crate::timer::{TimerEngine, TimerState};

/// Knobs the context reads at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSettings {
    pub wash_default_secs: u64,
    pub dry_default_secs: u64,
    pub notifications_enabled: bool,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ContextSettings {
    fn from(config: &Config) -> Self {
        Self {
            wash_default_secs: config.timers.wash_default_secs,
            dry_default_secs: config.timers.dry_default_secs,
            notifications_enabled: config.notifications.enabled,
        }
    }
}

impl ContextSettings {
    fn default_secs(&self, cycle_type: CycleType) -> u64 {
        match cycle_type {
            CycleType::Wash => self.wash_default_secs,
            CycleType::Dry => self.dry_default_secs,
        }
    }
}

pub struct LaundryContext {
    wash: Mutex<TimerEngine>,
    dry: Mutex<TimerEngine>,
    inventory: Mutex<InventoryStore>,
    ledger: Mutex<CycleLedger>,
    store: Arc<dyn PersistenceGateway>,
    notifier: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
    settings: ContextSettings,
    last_gateway_error: Mutex<Option<CoreError>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding a lock leaves plain data behind; keep serving it.
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl LaundryContext {
    /// Build the context from whatever `store` holds.
    ///
    /// Absent or undecodable collections start empty. Timers come back in
    /// the phase they were saved in; call [`reconcile_timers`](Self::reconcile_timers)
    /// before using a context loaded from a previous process.
    pub fn load(
        store: Arc<dyn PersistenceGateway>,
        notifier: Arc<dyn NotificationGateway>,
        clock: Arc<dyn Clock>,
        settings: ContextSettings,
    ) -> Self {
        let items: Vec<ClothingItem> = decode_or_default(store.as_ref(), Collection::ClothingItems);
        let supplies: Vec<Supply> = decode_or_default(store.as_ref(), Collection::Supplies);
        let ledger: CycleLedger = decode_or_default(store.as_ref(), Collection::WashCycles);
        let wash = load_engine(store.as_ref(), CycleType::Wash, &settings);
        let dry = load_engine(store.as_ref(), CycleType::Dry, &settings);

        info!(
            items = items.len(),
            supplies = supplies.len(),
            cycles = ledger.len(),
            "laundry context loaded"
        );

        Self {
            wash: Mutex::new(wash),
            dry: Mutex::new(dry),
            inventory: Mutex::new(InventoryStore::from_parts(items, supplies)),
            ledger: Mutex::new(ledger),
            store,
            notifier,
            clock,
            settings,
            last_gateway_error: Mutex::new(None),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn engine(&self, cycle_type: CycleType) -> MutexGuard<'_, TimerEngine> {
        match cycle_type {
            CycleType::Wash => lock(&self.wash),
            CycleType::Dry => lock(&self.dry),
        }
    }

    // ── Timers ───────────────────────────────────────────────────────

    /// Start a countdown with the default load (warm, nothing attached).
    pub fn start_timer(
        &self,
        cycle_type: CycleType,
        duration_secs: i64,
    ) -> Result<Event, ValidationError> {
        self.start_timer_with(cycle_type, duration_secs, CycleLoad::default())
    }

    /// Start a countdown, replacing a running one of the same type.
    pub fn start_timer_with(
        &self,
        cycle_type: CycleType,
        duration_secs: i64,
        load: CycleLoad,
    ) -> Result<Event, ValidationError> {
        let mut engine = self.engine(cycle_type);
        let now = self.clock.now();
        let replacing = engine.is_running();

        let event = engine.start(duration_secs, load, now)?;
        if replacing {
            self.cancel_alert(cycle_type);
        }
        if let Some(fires_at) = engine.ends_at() {
            self.schedule_alert(cycle_type, fires_at);
        }
        self.persist_engine(&engine);

        info!(
            cycle_type = %cycle_type,
            duration_secs,
            replacing,
            schedule_id = engine.schedule_id(),
            "timer started"
        );
        Ok(event)
    }

    pub fn stop_timer(&self, cycle_type: CycleType) -> Option<Event> {
        let mut engine = self.engine(cycle_type);
        let Some(event) = engine.stop(self.clock.now()) else {
            debug!(cycle_type = %cycle_type, "stop ignored: timer not running");
            return None;
        };
        self.cancel_alert(cycle_type);
        self.persist_engine(&engine);
        info!(cycle_type = %cycle_type, "timer stopped");
        Some(event)
    }

    pub fn reset_timer(&self, cycle_type: CycleType) -> Option<Event> {
        let mut engine = self.engine(cycle_type);
        let was_running = engine.is_running();
        let Some(event) = engine.reset(self.clock.now()) else {
            debug!(cycle_type = %cycle_type, "reset ignored: timer already idle");
            return None;
        };
        if was_running {
            self.cancel_alert(cycle_type);
        }
        self.persist_engine(&engine);
        info!(cycle_type = %cycle_type, "timer reset");
        Some(event)
    }

    /// Apply one tick regardless of which schedule delivers it.
    pub fn tick(&self, cycle_type: CycleType) -> Option<Event> {
        let mut engine = self.engine(cycle_type);
        let event = engine.tick(self.clock.now());
        self.after_tick(&mut engine, event)
    }

    /// Apply a tick from the schedule armed with `schedule_id`. Ticks from a
    /// superseded schedule do nothing.
    pub fn tick_scheduled(&self, cycle_type: CycleType, schedule_id: u64) -> Option<Event> {
        let mut engine = self.engine(cycle_type);
        let event = engine.tick_scheduled(schedule_id, self.clock.now());
        self.after_tick(&mut engine, event)
    }

    /// Pick up changes another process made to a run this context still
    /// counts down. Returns `true` when the saved timer replaced ours.
    pub fn refresh_timer(&self, cycle_type: CycleType) -> bool {
        let mut engine = self.engine(cycle_type);
        if !engine.is_running() {
            return false;
        }
        let collection = Collection::Timer(cycle_type);
        let saved = match self.store.load(collection) {
            Ok(saved) => saved,
            Err(e) => {
                self.record_gateway_error(collection, e);
                return false;
            }
        };
        let SavedRun::Replaced(other) = saved_run(saved, &engine) else {
            return false;
        };
        self.adopt(&mut engine, other);

        match self.store.load(Collection::WashCycles) {
            Ok(saved) => {
                let mut ledger = lock(&self.ledger);
                let fresh = decode_ledger(saved, &ledger);
                *ledger = fresh;
            }
            Err(e) => self.record_gateway_error(Collection::WashCycles, e),
        }
        true
    }

    /// `Some(schedule_id)` while the engine is running.
    pub fn running_schedule(&self, cycle_type: CycleType) -> Option<u64> {
        let engine = self.engine(cycle_type);
        engine.is_running().then(|| engine.schedule_id())
    }

    pub fn timer_snapshot(&self, cycle_type: CycleType) -> TimerState {
        self.engine(cycle_type).snapshot()
    }

    /// Catch running timers up with the wall clock after a cold start.
    ///
    /// A countdown that ran out while nobody was ticking it completes here,
    /// once; the rest report how much time is left.
    pub fn reconcile_timers(&self) -> Vec<Event> {
        let now = self.clock.now();
        let mut events = Vec::new();
        for cycle_type in CycleType::ALL {
            let mut engine = self.engine(cycle_type);
            // Remaining time is recomputed from the start instant on every
            // load, so a resumed run has nothing new to save.
            let Some(event) = engine.reconcile(now) else {
                continue;
            };
            if let Event::TimerCompleted { cycle, .. } = &event {
                if !self.commit_completion(&mut engine, cycle) {
                    continue;
                }
                info!(cycle_type = %cycle_type, "timer expired while away");
            }
            events.push(event);
        }
        events
    }

    fn after_tick(&self, engine: &mut TimerEngine, event: Option<Event>) -> Option<Event> {
        let Some(Event::TimerCompleted { cycle, .. }) = &event else {
            return event;
        };
        if !self.commit_completion(engine, cycle) {
            return None;
        }
        info!(
            cycle_type = %cycle.cycle_type(),
            duration_secs = cycle.duration_secs(),
            "timer completed"
        );
        event
    }

    /// Append `cycle` and save the completed engine in one store
    /// transaction. Returns `false` when the saved timer shows the run was
    /// already stopped, restarted or completed by another process; `engine`
    /// then takes the saved state and nothing is appended.
    ///
    /// Caller holds the engine lock for the cycle's type.
    fn commit_completion(&self, engine: &mut TimerEngine, cycle: &WashCycle) -> bool {
        let timer = Collection::Timer(engine.cycle_type());
        let mut ledger = lock(&self.ledger);
        let mut outcome = None;
        let ours: &TimerEngine = engine;

        let result = self.store.transaction(&mut |txn| {
            let saved = decode_ledger(txn.load(Collection::WashCycles)?, &ledger);
            if let SavedRun::Replaced(other) = saved_run(txn.load(timer)?, ours) {
                outcome = Some((saved, Some(other)));
                return Ok(());
            }
            let mut merged = saved;
            merged.append(cycle.clone());
            txn.save(Collection::WashCycles, &encode(Collection::WashCycles, &merged)?)?;
            txn.save(timer, &encode(timer, ours)?)?;
            outcome = Some((merged, None));
            Ok(())
        });

        match (result, outcome) {
            (Ok(()), Some((saved, None))) => {
                *ledger = saved;
                true
            }
            (Ok(()), Some((saved, Some(other)))) => {
                *ledger = saved;
                drop(ledger);
                self.adopt(engine, other);
                false
            }
            (result, _) => {
                if let Err(e) = result {
                    self.record_gateway_error(Collection::WashCycles, e);
                }
                ledger.append(cycle.clone());
                true
            }
        }
    }

    /// Replace a running engine with what another process saved.
    fn adopt(&self, engine: &mut TimerEngine, other: Option<TimerEngine>) {
        let cycle_type = engine.cycle_type();
        match other {
            Some(mut other) => {
                other.set_default_secs(self.settings.default_secs(cycle_type));
                *engine = other;
            }
            // Cleared by a full reset. Reset in place so schedule ids keep moving.
            None => {
                engine.reset(self.clock.now());
            }
        }
        info!(
            cycle_type = %cycle_type,
            schedule_id = engine.schedule_id(),
            "timer changed by another process"
        );
    }

    // ── Wardrobe ─────────────────────────────────────────────────────

    pub fn add_item(&self, item: ClothingItem) -> Result<Uuid, ValidationError> {
        let mut inventory = lock(&self.inventory);
        let id = inventory.add_item(item)?;
        self.persist(Collection::ClothingItems, inventory.items());
        info!(item_id = %id, "item added");
        Ok(id)
    }

    pub fn update_item(&self, item: ClothingItem) -> Result<bool, ValidationError> {
        let mut inventory = lock(&self.inventory);
        let id = item.id;
        let updated = inventory.update_item(item)?;
        if updated {
            self.persist(Collection::ClothingItems, inventory.items());
        } else {
            debug!(item_id = %id, "update ignored: no such item");
        }
        Ok(updated)
    }

    pub fn delete_item(&self, id: Uuid) -> bool {
        let mut inventory = lock(&self.inventory);
        let deleted = inventory.delete_item(id);
        if deleted {
            self.persist(Collection::ClothingItems, inventory.items());
        } else {
            debug!(item_id = %id, "delete ignored: no such item");
        }
        deleted
    }

    /// Stamp the item as washed now. `None` if it no longer exists.
    pub fn mark_washed(&self, id: Uuid) -> Option<ClothingItem> {
        let mut inventory = lock(&self.inventory);
        let Some(item) = inventory.mark_as_washed(id, self.clock.now()).cloned() else {
            debug!(item_id = %id, "mark washed ignored: no such item");
            return None;
        };
        self.persist(Collection::ClothingItems, inventory.items());
        Some(item)
    }

    pub fn item(&self, id: Uuid) -> Option<ClothingItem> {
        lock(&self.inventory).item(id).cloned()
    }

    pub fn items(&self, query: &ItemQuery) -> Vec<ClothingItem> {
        lock(&self.inventory).query_items(query, self.clock.now())
    }

    /// Items last washed more than `days` ago, most overdue first.
    pub fn needs_wash(&self, days: i64) -> Vec<ClothingItem> {
        lock(&self.inventory).needs_wash(self.clock.now(), days)
    }

    // ── Supplies ─────────────────────────────────────────────────────

    pub fn add_supply(&self, supply: Supply) -> Result<Uuid, ValidationError> {
        let mut inventory = lock(&self.inventory);
        let id = inventory.add_supply(supply)?;
        self.persist(Collection::Supplies, inventory.supplies());
        info!(supply_id = %id, "supply added");
        Ok(id)
    }

    pub fn update_supply(&self, supply: Supply) -> Result<bool, ValidationError> {
        let mut inventory = lock(&self.inventory);
        let id = supply.id;
        let updated = inventory.update_supply(supply)?;
        if updated {
            self.persist(Collection::Supplies, inventory.supplies());
        } else {
            debug!(supply_id = %id, "update ignored: no such supply");
        }
        Ok(updated)
    }

    pub fn delete_supply(&self, id: Uuid) -> bool {
        let mut inventory = lock(&self.inventory);
        let deleted = inventory.delete_supply(id);
        if deleted {
            self.persist(Collection::Supplies, inventory.supplies());
        } else {
            debug!(supply_id = %id, "delete ignored: no such supply");
        }
        deleted
    }

    /// Use up `amount` percent. Returns the new remaining percent, or
    /// `None` if the supply no longer exists.
    pub fn consume_supply(&self, id: Uuid, amount: f64) -> Result<Option<f64>, ValidationError> {
        let mut inventory = lock(&self.inventory);
        let remaining = inventory.consume_supply(id, amount)?;
        match remaining {
            Some(percent) => {
                self.persist(Collection::Supplies, inventory.supplies());
                debug!(supply_id = %id, amount, remaining = percent, "supply consumed");
            }
            None => debug!(supply_id = %id, "consume ignored: no such supply"),
        }
        Ok(remaining)
    }

    pub fn supply(&self, id: Uuid) -> Option<Supply> {
        lock(&self.inventory).supply(id).cloned()
    }

    pub fn supplies(&self, query: &SupplyQuery) -> Vec<Supply> {
        lock(&self.inventory).query_supplies(query)
    }

    pub fn low_supplies(&self) -> Vec<Supply> {
        lock(&self.inventory).low_supplies()
    }

    // ── History & statistics ─────────────────────────────────────────

    pub fn recent_cycles(&self, limit: usize) -> Vec<WashCycle> {
        lock(&self.ledger).recent(limit)
    }

    pub fn history(&self, filter: &CycleFilter) -> Vec<WashCycle> {
        lock(&self.ledger).query(filter)
    }

    pub fn history_by_day<Tz: TimeZone>(
        &self,
        filter: &CycleFilter,
        tz: &Tz,
    ) -> Vec<(chrono::NaiveDate, Vec<WashCycle>)> {
        lock(&self.ledger).by_day(filter, tz)
    }

    /// Statistics as of `now`; months follow `now`'s time zone.
    pub fn statistics<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Statistics {
        let inventory = lock(&self.inventory).clone();
        let ledger = lock(&self.ledger).clone();
        stats::compute(&ledger, &inventory, now)
    }

    // ── Admin ────────────────────────────────────────────────────────

    /// Wipe every collection and put both timers back to a fresh idle state.
    pub fn reset_all_data(&self) {
        let mut wash = lock(&self.wash);
        let mut dry = lock(&self.dry);
        let mut inventory = lock(&self.inventory);
        let mut ledger = lock(&self.ledger);

        // Reset in place: schedule ids must keep moving forward.
        let now = self.clock.now();
        wash.reset(now);
        dry.reset(now);
        inventory.clear();
        ledger.clear();

        for cycle_type in CycleType::ALL {
            self.cancel_alert(cycle_type);
        }
        for collection in Collection::ALL {
            if let Err(e) = self.store.clear(collection) {
                self.record_gateway_error(collection, e);
            }
        }
        warn!("all laundry data reset");
    }

    /// The most recent persistence or notification failure, if any.
    pub fn take_gateway_error(&self) -> Option<CoreError> {
        lock(&self.last_gateway_error).take()
    }

    // ── Gateways ─────────────────────────────────────────────────────

    fn persist<T: Serialize + ?Sized>(&self, collection: Collection, value: &T) {
        let result =
            encode(collection, value).and_then(|payload| self.store.save(collection, &payload));
        if let Err(e) = result {
            self.record_gateway_error(collection, e);
        }
    }

    fn persist_engine(&self, engine: &TimerEngine) {
        self.persist(Collection::Timer(engine.cycle_type()), engine);
    }

    fn record_gateway_error(&self, collection: Collection, err: PersistenceError) {
        warn!(collection = %collection, error = %err, "persistence failed");
        *lock(&self.last_gateway_error) = Some(err.into());
    }

    fn schedule_alert(&self, cycle_type: CycleType, fires_at: DateTime<Utc>) {
        if !self.settings.notifications_enabled {
            debug!(cycle_type = %cycle_type, "alerts disabled, not scheduling");
            return;
        }
        if let Err(e) = self.notifier.schedule_completion(cycle_type, fires_at) {
            warn!(cycle_type = %cycle_type, error = %e, "alert scheduling failed");
            *lock(&self.last_gateway_error) = Some(e.into());
        }
    }

    fn cancel_alert(&self, cycle_type: CycleType) {
        if let Err(e) = self.notifier.cancel(cycle_type) {
            warn!(cycle_type = %cycle_type, error = %e, "alert cancellation failed");
            *lock(&self.last_gateway_error) = Some(e.into());
        }
    }
}

fn encode<T: Serialize + ?Sized>(collection: Collection, value: &T) -> Result<String, PersistenceError> {
    serde_json::to_string(value).map_err(|e| PersistenceError::Encode {
        collection: collection.to_string(),
        message: e.to_string(),
    })
}

/// Saved history, or `fallback` when the saved copy cannot be read.
fn decode_ledger(saved: Option<String>, fallback: &CycleLedger) -> CycleLedger {
    let Some(payload) = saved else {
        return CycleLedger::new();
    };
    serde_json::from_str(&payload).unwrap_or_else(|e| {
        warn!(error = %e, "corrupt cycle history, keeping this process's copy");
        fallback.clone()
    })
}

/// How the saved timer relates to the run `ours` is counting down.
enum SavedRun {
    Same,
    /// Stopped, restarted, completed or cleared elsewhere.
    Replaced(Option<TimerEngine>),
}

fn saved_run(saved: Option<String>, ours: &TimerEngine) -> SavedRun {
    let Some(payload) = saved else {
        return SavedRun::Replaced(None);
    };
    match serde_json::from_str::<TimerEngine>(&payload) {
        Ok(other) if other.cycle_type() != ours.cycle_type() => SavedRun::Same,
        Ok(other) if other.is_running() && other.schedule_id() == ours.schedule_id() => {
            SavedRun::Same
        }
        Ok(other) => SavedRun::Replaced(Some(other)),
        Err(e) => {
            warn!(cycle_type = %ours.cycle_type(), error = %e, "corrupt saved timer, keeping ours");
            SavedRun::Same
        }
    }
}

fn decode_or_default<T: DeserializeOwned + Default>(
    store: &dyn PersistenceGateway,
    collection: Collection,
) -> T {
    decode(store, collection).unwrap_or_default()
}

fn decode<T: DeserializeOwned>(store: &dyn PersistenceGateway, collection: Collection) -> Option<T> {
    let payload = match store.load(collection) {
        Ok(Some(payload)) => payload,
        Ok(None) => return None,
        Err(e) => {
            warn!(collection = %collection, error = %e, "load failed, starting empty");
            return None;
        }
    };
    match serde_json::from_str(&payload) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(collection = %collection, error = %e, "corrupt payload, starting empty");
            None
        }
    }
}

fn load_engine(
    store: &dyn PersistenceGateway,
    cycle_type: CycleType,
    settings: &ContextSettings,
) -> TimerEngine {
    let default_secs = settings.default_secs(cycle_type);
    match decode::<TimerEngine>(store, Collection::Timer(cycle_type)) {
        Some(mut engine) if engine.cycle_type() == cycle_type => {
            engine.set_default_secs(default_secs);
            engine
        }
        Some(_) => {
            warn!(cycle_type = %cycle_type, "persisted timer has the wrong type, starting idle");
            TimerEngine::new(cycle_type, default_secs)
        }
        None => TimerEngine::new(cycle_type, default_secs),
    }
}
