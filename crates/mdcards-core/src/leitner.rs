// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::Deserialize;
use serde::Serialize;

use crate::error::DeckError;
use crate::error::Fallible;

/// Base interval in days for each box. Box 0 is "due again today".
pub const DEFAULT_INTERVALS: [u32; 7] = [0, 1, 2, 4, 8, 15, 25];

pub const HARD_FACTOR: f64 = 0.8;
pub const OKAY_FACTOR: f64 = 1.0;
pub const EASY_FACTOR: f64 = 1.5;

/// The minimum review interval in days for a remembered card.
const MIN_INTERVAL: u64 = 1;

/// How well the user remembered a card.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Grade {
    Forgot,
    Hard,
    Okay,
    Easy,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Forgot, Grade::Hard, Grade::Okay, Grade::Easy];

    pub fn as_str(&self) -> &str {
        match self {
            Grade::Forgot => "forgot",
            Grade::Hard => "hard",
            Grade::Okay => "okay",
            Grade::Easy => "easy",
        }
    }

    /// Map the 1-4 menu choice onto a grade.
    pub fn from_choice(choice: usize) -> Option<Grade> {
        match choice {
            1 => Some(Grade::Forgot),
            2 => Some(Grade::Hard),
            3 => Some(Grade::Okay),
            4 => Some(Grade::Easy),
            _ => None,
        }
    }
}

/// The immutable scheduling table a session runs with.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SchedulerConfig {
    intervals: Vec<u32>,
    hard_factor: f64,
    okay_factor: f64,
    easy_factor: f64,
}

impl SchedulerConfig {
    /// Build a config from a box interval table, using the default grade
    /// multipliers.
    pub fn new(intervals: Vec<u32>) -> Fallible<Self> {
        match intervals.first() {
            None => {
                return Err(DeckError::InvalidConfig(
                    "the interval table must not be empty".to_string(),
                ));
            }
            Some(&first) if first != 0 => {
                return Err(DeckError::InvalidConfig(format!(
                    "the interval of box 0 must be 0, not {first}"
                )));
            }
            Some(_) => {}
        }
        Ok(Self {
            intervals,
            hard_factor: HARD_FACTOR,
            okay_factor: OKAY_FACTOR,
            easy_factor: EASY_FACTOR,
        })
    }

    pub fn intervals(&self) -> &[u32] {
        &self.intervals
    }

    /// Index of the highest box.
    pub fn last_box(&self) -> usize {
        self.intervals.len() - 1
    }

    /// The box a card lands in after being graded. Hard keeps the box, a
    /// success moves one box up, forgetting starts over.
    pub fn next_box(&self, box_index: usize, grade: Grade) -> usize {
        let box_index = box_index.min(self.last_box());
        match grade {
            Grade::Forgot => 0,
            Grade::Hard => box_index,
            Grade::Okay | Grade::Easy => (box_index + 1).min(self.last_box()),
        }
    }

    /// Days until the next review of a card landing in `box_index` with the
    /// given grade. Truncates the scaled interval and never returns less than
    /// one day for a remembered card; a forgotten card is due again today.
    pub fn interval_days(&self, box_index: usize, grade: Grade) -> u64 {
        let factor = match grade {
            Grade::Forgot => return 0,
            Grade::Hard => self.hard_factor,
            Grade::Okay => self.okay_factor,
            Grade::Easy => self.easy_factor,
        };
        let base = self.intervals[box_index.min(self.last_box())] as f64;
        let days = (base * factor).floor() as u64;
        days.max(MIN_INTERVAL)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            intervals: DEFAULT_INTERVALS.to_vec(),
            hard_factor: HARD_FACTOR,
            okay_factor: OKAY_FACTOR,
            easy_factor: EASY_FACTOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_table() {
        assert!(matches!(
            SchedulerConfig::new(vec![]),
            Err(DeckError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_nonzero_first_interval() {
        assert!(matches!(
            SchedulerConfig::new(vec![1, 3, 7]),
            Err(DeckError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_next_box() {
        let config = SchedulerConfig::default();
        assert_eq!(config.next_box(2, Grade::Forgot), 0);
        assert_eq!(config.next_box(2, Grade::Hard), 2);
        assert_eq!(config.next_box(0, Grade::Hard), 0);
        assert_eq!(config.next_box(2, Grade::Okay), 3);
        assert_eq!(config.next_box(2, Grade::Easy), 3);
        assert_eq!(config.next_box(6, Grade::Easy), 6);
    }

    #[test]
    fn test_out_of_range_box_is_clamped() {
        let config = SchedulerConfig::default();
        assert_eq!(config.next_box(42, Grade::Hard), 6);
        assert_eq!(config.interval_days(42, Grade::Okay), 25);
    }

    #[test]
    fn test_interval_days() {
        let config = SchedulerConfig::default();
        // floor(2 * 0.8) = 1
        assert_eq!(config.interval_days(2, Grade::Hard), 1);
        assert_eq!(config.interval_days(3, Grade::Okay), 4);
        // floor(4 * 1.5) = 6
        assert_eq!(config.interval_days(3, Grade::Easy), 6);
        // floor(25 * 0.8) = 20
        assert_eq!(config.interval_days(6, Grade::Hard), 20);
        assert_eq!(config.interval_days(2, Grade::Forgot), 0);
    }

    #[test]
    fn test_remembered_cards_wait_at_least_a_day() {
        let config = SchedulerConfig::default();
        for grade in [Grade::Hard, Grade::Okay, Grade::Easy] {
            assert_eq!(config.interval_days(0, grade), 1);
        }
        // floor(1 * 0.8) = 0, lifted to the minimum.
        assert_eq!(config.interval_days(1, Grade::Hard), 1);
    }

    #[test]
    fn test_grade_from_choice() {
        assert_eq!(Grade::from_choice(1), Some(Grade::Forgot));
        assert_eq!(Grade::from_choice(4), Some(Grade::Easy));
        assert_eq!(Grade::from_choice(0), None);
        assert_eq!(Grade::from_choice(5), None);
    }
}
