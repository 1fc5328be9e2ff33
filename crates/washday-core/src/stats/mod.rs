//! Statistics over the cycle history and the inventory.
//!
//! Everything here is a pure function of a ledger, an inventory and a
//! reference instant. Month boundaries follow the time zone of that instant.

mod achievements;
mod summary;

pub use achievements::{Achievement, AchievementStatus};
pub use summary::{compare_trend, compute, month_window, CategoryWashes, Statistics, Trend};
