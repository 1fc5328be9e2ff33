use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstWash,
    TenWashes,
    FiftyWashes,
    HundredWashes,
    FullWardrobe,
}

impl Achievement {
    pub const ALL: [Achievement; 5] = [
        Achievement::FirstWash,
        Achievement::TenWashes,
        Achievement::FiftyWashes,
        Achievement::HundredWashes,
        Achievement::FullWardrobe,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Achievement::FirstWash => "First Wash",
            Achievement::TenWashes => "10 Washes",
            Achievement::FiftyWashes => "50 Washes",
            Achievement::HundredWashes => "Laundry Master",
            Achievement::FullWardrobe => "Wardrobe",
        }
    }

    fn unlocked(&self, total_washes: usize, item_count: usize) -> bool {
        match self {
            Achievement::FirstWash => total_washes > 0,
            Achievement::TenWashes => total_washes >= 10,
            Achievement::FiftyWashes => total_washes >= 50,
            Achievement::HundredWashes => total_washes >= 100,
            Achievement::FullWardrobe => item_count >= 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementStatus {
    pub achievement: Achievement,
    pub unlocked: bool,
}

pub(super) fn evaluate(total_washes: usize, item_count: usize) -> Vec<AchievementStatus> {
    Achievement::ALL
        .into_iter()
        .map(|achievement| AchievementStatus {
            achievement,
            unlocked: achievement.unlocked(total_washes, item_count),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unlocked(total_washes: usize, items: usize) -> Vec<Achievement> {
        evaluate(total_washes, items)
            .into_iter()
            .filter(|s| s.unlocked)
            .map(|s| s.achievement)
            .collect()
    }

    #[test]
    fn thresholds() {
        assert!(unlocked(0, 0).is_empty());
        assert_eq!(unlocked(1, 0), vec![Achievement::FirstWash]);
        assert_eq!(
            unlocked(50, 10),
            vec![
                Achievement::FirstWash,
                Achievement::TenWashes,
                Achievement::FiftyWashes,
                Achievement::FullWardrobe
            ]
        );
        assert_eq!(unlocked(100, 0).len(), 4);
    }
}
