use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::NotificationError;
use crate::model::CycleType;

/// Schedules the "your laundry is done" alert.
///
/// At most one alert is pending per cycle type: scheduling again replaces
/// the previous request for that type.
pub trait NotificationGateway: Send + Sync {
    fn schedule_completion(
        &self,
        cycle_type: CycleType,
        fires_at: DateTime<Utc>,
    ) -> Result<(), NotificationError>;

    fn cancel(&self, cycle_type: CycleType) -> Result<(), NotificationError>;

    /// When the pending alert for `cycle_type` fires, if one is known.
    fn pending(&self, _cycle_type: CycleType) -> Option<DateTime<Utc>> {
        None // default: delivery is fire-and-forget
    }
}

/// Drops every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl NotificationGateway for NoopNotifier {
    fn schedule_completion(
        &self,
        _cycle_type: CycleType,
        _fires_at: DateTime<Utc>,
    ) -> Result<(), NotificationError> {
        Ok(())
    }

    fn cancel(&self, _cycle_type: CycleType) -> Result<(), NotificationError> {
        Ok(())
    }
}

/// Writes requests to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationGateway for LogNotifier {
    fn schedule_completion(
        &self,
        cycle_type: CycleType,
        fires_at: DateTime<Utc>,
    ) -> Result<(), NotificationError> {
        info!(cycle_type = %cycle_type, fires_at = %fires_at, "completion alert scheduled");
        Ok(())
    }

    fn cancel(&self, cycle_type: CycleType) -> Result<(), NotificationError> {
        info!(cycle_type = %cycle_type, "completion alert cancelled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fire_and_forget_notifiers_track_nothing() {
        let fires_at = Utc::now() + Duration::minutes(45);
        let notifiers: [&dyn NotificationGateway; 2] = [&NoopNotifier, &LogNotifier];
        for notifier in notifiers {
            notifier.schedule_completion(CycleType::Dry, fires_at).unwrap();
            assert!(notifier.pending(CycleType::Dry).is_none());
            notifier.cancel(CycleType::Dry).unwrap();
        }
    }
}
