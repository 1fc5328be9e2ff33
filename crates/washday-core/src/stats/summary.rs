//! Laundry summary statistics.
//!
//! - **Totals**: wash and dry cycle counts, summed per-item wash counts
//! - **Rate**: wash cycles per whole week since the first wash (floor 1)
//! - **Months**: wash cycles in the current and the previous calendar month
//! - **Categories**: summed item wash counts per clothing category

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::achievements::{self, AchievementStatus};
use crate::inventory::InventoryStore;
use crate::ledger::{CycleFilter, CycleLedger};
use crate::model::{ClothingCategory, CycleType};

/// Direction of this month's washes against last month's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWashes {
    pub category: ClothingCategory,
    pub washes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Completed wash cycles
    pub total_washes: usize,
    /// Completed dry cycles
    pub total_dries: usize,
    /// Sum of every item's wash count
    pub clothes_washed: u64,
    /// Number of tracked supplies
    pub supply_count: usize,
    /// Category with the highest summed wash count; absent when nothing
    /// has been washed. Ties go to the earlier category.
    pub most_washed_category: Option<ClothingCategory>,
    pub average_washes_per_week: f64,
    pub this_month_washes: usize,
    pub last_month_washes: usize,
    /// Absent when last month had no washes.
    pub month_trend: Option<Trend>,
    /// Non-zero categories, most washed first.
    pub category_breakdown: Vec<CategoryWashes>,
    pub achievements: Vec<AchievementStatus>,
}

/// Summarise `ledger` and `inventory` as of `now`.
pub fn compute<Tz: TimeZone>(
    ledger: &CycleLedger,
    inventory: &InventoryStore,
    now: &DateTime<Tz>,
) -> Statistics {
    let now_utc = now.with_timezone(&Utc);
    let washes = CycleFilter::of_type(CycleType::Wash);
    let total_washes = ledger.count(&washes);
    let total_dries = ledger.count(&CycleFilter::of_type(CycleType::Dry));

    let (this_month_washes, last_month_washes) = match month_windows(now) {
        Some((last_start, this_start, next_start)) => (
            ledger.count(&CycleFilter {
                from: Some(this_start),
                to: Some(next_start),
                ..washes
            }),
            ledger.count(&CycleFilter {
                from: Some(last_start),
                to: Some(this_start),
                ..washes
            }),
        ),
        None => (0, 0),
    };

    let earliest_wash = ledger
        .cycles()
        .iter()
        .filter(|c| washes.matches(c))
        .map(|c| c.occurred_at())
        .min();
    let average_washes_per_week = match earliest_wash {
        Some(first) => total_washes as f64 / whole_weeks_floor_one(first, now_utc) as f64,
        None => 0.0,
    };

    let per_category = category_totals(inventory);
    let clothes_washed = per_category.iter().map(|c| c.washes).sum();
    let most_washed_category = most_washed(&per_category);

    let mut category_breakdown: Vec<CategoryWashes> =
        per_category.into_iter().filter(|c| c.washes > 0).collect();
    // Stable: equal counts stay in enumeration order.
    category_breakdown.sort_by(|a, b| b.washes.cmp(&a.washes));

    Statistics {
        total_washes,
        total_dries,
        clothes_washed,
        supply_count: inventory.supplies().len(),
        most_washed_category,
        average_washes_per_week,
        this_month_washes,
        last_month_washes,
        month_trend: compare_trend(this_month_washes, last_month_washes),
        category_breakdown,
        achievements: achievements::evaluate(total_washes, inventory.items().len()),
    }
}

pub fn compare_trend(current: usize, previous: usize) -> Option<Trend> {
    if previous == 0 {
        return None;
    }
    Some(match current.cmp(&previous) {
        std::cmp::Ordering::Greater => Trend::Up,
        std::cmp::Ordering::Less => Trend::Down,
        std::cmp::Ordering::Equal => Trend::Flat,
    })
}

/// `[start, end)` of the calendar month containing `at`, in `at`'s zone.
pub fn month_window<Tz: TimeZone>(at: &DateTime<Tz>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (_, this_start, next_start) = month_windows(at)?;
    Some((this_start, next_start))
}

/// Starts of the previous, current and next calendar months.
fn month_windows<Tz: TimeZone>(
    at: &DateTime<Tz>,
) -> Option<(DateTime<Utc>, DateTime<Utc>, DateTime<Utc>)> {
    let tz = at.timezone();
    let local = at.date_naive();
    let (year, month) = (local.year(), local.month());
    let (prev_year, prev_month) = if month == 1 { (year - 1, 12) } else { (year, month - 1) };
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    Some((
        month_start(&tz, prev_year, prev_month)?,
        month_start(&tz, year, month)?,
        month_start(&tz, next_year, next_month)?,
    ))
}

/// Local midnight on the 1st. Where midnight falls in a DST gap the first
/// valid instant after it is used.
fn month_start<Tz: TimeZone>(tz: &Tz, year: i32, month: u32) -> Option<DateTime<Utc>> {
    let midnight = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whole weeks from `first` to `now`, rounded down, never below one.
fn whole_weeks_floor_one(first: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - first).num_weeks().max(1)
}

fn category_totals(inventory: &InventoryStore) -> Vec<CategoryWashes> {
    ClothingCategory::ALL
        .into_iter()
        .map(|category| CategoryWashes {
            category,
            washes: inventory
                .items()
                .iter()
                .filter(|i| i.category == category)
                .map(|i| u64::from(i.wash_count))
                .sum(),
        })
        .collect()
}

fn most_washed(per_category: &[CategoryWashes]) -> Option<ClothingCategory> {
    let mut best: Option<CategoryWashes> = None;
    for entry in per_category.iter().filter(|c| c.washes > 0) {
        if best.map_or(true, |b| entry.washes > b.washes) {
            best = Some(*entry);
        }
    }
    best.map(|b| b.category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClothingItem, CycleLoad, Supply, SupplyType, WashCycle};
    use chrono::FixedOffset;

    fn utc(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn ledger_with(cycles: &[(CycleType, &str)]) -> CycleLedger {
        let mut ledger = CycleLedger::new();
        for (cycle_type, at) in cycles {
            ledger.append(WashCycle::completed(
                *cycle_type,
                3600,
                utc(at),
                CycleLoad::default(),
            ));
        }
        ledger
    }

    fn item(category: ClothingCategory, wash_count: u32) -> ClothingItem {
        let mut item = ClothingItem::new("thing", category);
        item.wash_count = wash_count;
        item
    }

    #[test]
    fn empty_inputs_produce_zeroes() {
        let stats = compute(&CycleLedger::new(), &InventoryStore::new(), &Utc::now());
        assert_eq!(stats.total_washes, 0);
        assert_eq!(stats.total_dries, 0);
        assert_eq!(stats.clothes_washed, 0);
        assert_eq!(stats.supply_count, 0);
        assert_eq!(stats.average_washes_per_week, 0.0);
        assert_eq!(stats.this_month_washes, 0);
        assert_eq!(stats.last_month_washes, 0);
        assert!(stats.most_washed_category.is_none());
        assert!(stats.month_trend.is_none());
        assert!(stats.category_breakdown.is_empty());
        assert!(stats.achievements.iter().all(|a| !a.unlocked));
    }

    #[test]
    fn this_and_last_month_counts() {
        let ledger = ledger_with(&[
            (CycleType::Wash, "2026-06-02T08:00:00Z"),
            (CycleType::Wash, "2026-06-10T08:00:00Z"),
            (CycleType::Wash, "2026-06-14T21:00:00Z"),
            (CycleType::Wash, "2026-05-01T00:00:00Z"),
            (CycleType::Wash, "2026-05-31T23:59:59Z"),
            (CycleType::Wash, "2026-04-30T12:00:00Z"),
            (CycleType::Dry, "2026-06-03T08:00:00Z"),
        ]);
        let now = utc("2026-06-15T12:00:00Z");
        let stats = compute(&ledger, &InventoryStore::new(), &now);
        assert_eq!(stats.this_month_washes, 3);
        assert_eq!(stats.last_month_washes, 2);
        assert_eq!(stats.total_washes, 6);
        assert_eq!(stats.total_dries, 1);
        assert_eq!(stats.month_trend, Some(Trend::Up));
    }

    #[test]
    fn month_boundaries_follow_the_reference_zone() {
        // 23:30 UTC on May 31st is already June 1st two hours east.
        let ledger = ledger_with(&[(CycleType::Wash, "2026-05-31T23:30:00Z")]);
        let east = FixedOffset::east_opt(2 * 3600).unwrap();
        let now_east = utc("2026-06-10T12:00:00Z").with_timezone(&east);
        let stats = compute(&ledger, &InventoryStore::new(), &now_east);
        assert_eq!(stats.this_month_washes, 1);
        assert_eq!(stats.last_month_washes, 0);

        let stats = compute(&ledger, &InventoryStore::new(), &utc("2026-06-10T12:00:00Z"));
        assert_eq!(stats.this_month_washes, 0);
        assert_eq!(stats.last_month_washes, 1);
    }

    #[test]
    fn january_looks_back_to_december() {
        let ledger = ledger_with(&[
            (CycleType::Wash, "2025-12-24T10:00:00Z"),
            (CycleType::Wash, "2026-01-03T10:00:00Z"),
        ]);
        let stats = compute(&ledger, &InventoryStore::new(), &utc("2026-01-20T10:00:00Z"));
        assert_eq!(stats.this_month_washes, 1);
        assert_eq!(stats.last_month_washes, 1);
        assert_eq!(stats.month_trend, Some(Trend::Flat));
    }

    #[test]
    fn march_looks_back_over_a_short_february() {
        let ledger = ledger_with(&[
            (CycleType::Wash, "2026-02-01T00:00:00Z"),
            (CycleType::Wash, "2026-02-28T23:00:00Z"),
            (CycleType::Wash, "2026-01-31T23:00:00Z"),
        ]);
        let stats = compute(&ledger, &InventoryStore::new(), &utc("2026-03-01T00:00:00Z"));
        assert_eq!(stats.this_month_washes, 0);
        assert_eq!(stats.last_month_washes, 2);
        assert_eq!(stats.month_trend, Some(Trend::Down));
    }

    #[test]
    fn weekly_average_floors_weeks_at_one() {
        let now = utc("2026-06-15T12:00:00Z");
        let recent = ledger_with(&[
            (CycleType::Wash, "2026-06-14T12:00:00Z"),
            (CycleType::Wash, "2026-06-15T08:00:00Z"),
        ]);
        let stats = compute(&recent, &InventoryStore::new(), &now);
        assert_eq!(stats.average_washes_per_week, 2.0);

        // 20 days is two whole weeks.
        let older = ledger_with(&[
            (CycleType::Wash, "2026-05-26T12:00:00Z"),
            (CycleType::Wash, "2026-06-01T12:00:00Z"),
            (CycleType::Wash, "2026-06-10T12:00:00Z"),
            (CycleType::Dry, "2026-01-01T12:00:00Z"),
        ]);
        let stats = compute(&older, &InventoryStore::new(), &now);
        assert_eq!(stats.average_washes_per_week, 1.5);
    }

    #[test]
    fn most_washed_category_breaks_ties_by_enumeration_order() {
        let mut inventory = InventoryStore::new();
        inventory.add_item(item(ClothingCategory::Towels, 4)).unwrap();
        inventory.add_item(item(ClothingCategory::Bottoms, 3)).unwrap();
        inventory.add_item(item(ClothingCategory::Bottoms, 1)).unwrap();
        inventory.add_item(item(ClothingCategory::Outerwear, 0)).unwrap();

        let stats = compute(&CycleLedger::new(), &inventory, &Utc::now());
        assert_eq!(stats.most_washed_category, Some(ClothingCategory::Bottoms));
        assert_eq!(stats.clothes_washed, 8);
        assert_eq!(
            stats.category_breakdown,
            vec![
                CategoryWashes {
                    category: ClothingCategory::Bottoms,
                    washes: 4
                },
                CategoryWashes {
                    category: ClothingCategory::Towels,
                    washes: 4
                },
            ]
        );
    }

    #[test]
    fn unwashed_wardrobe_has_no_most_washed_category() {
        let mut inventory = InventoryStore::new();
        inventory.add_item(item(ClothingCategory::Tops, 0)).unwrap();
        inventory
            .add_supply(Supply::new("Pods", SupplyType::Pods, Utc::now()))
            .unwrap();
        let stats = compute(&CycleLedger::new(), &inventory, &Utc::now());
        assert!(stats.most_washed_category.is_none());
        assert_eq!(stats.supply_count, 1);
    }

    #[test]
    fn trend_needs_a_previous_month() {
        assert_eq!(compare_trend(5, 0), None);
        assert_eq!(compare_trend(0, 2), Some(Trend::Down));
        assert_eq!(compare_trend(2, 2), Some(Trend::Flat));
    }

    #[test]
    fn month_window_spans_the_calendar_month() {
        let (start, end) = month_window(&utc("2026-02-14T10:00:00Z")).unwrap();
        assert_eq!(start, utc("2026-02-01T00:00:00Z"));
        assert_eq!(end, utc("2026-03-01T00:00:00Z"));
    }
}
