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

use crate::leitner::Grade;
use crate::leitner::SchedulerConfig;
use crate::types::date::Date;

/// Where a card sits in the Leitner system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewState {
    /// Index into the box interval table.
    pub box_index: usize,
    /// The first day the card can be reviewed.
    pub due: Date,
}

impl ReviewState {
    /// The state of a card that has never been reviewed.
    pub fn new(today: Date) -> Self {
        Self {
            box_index: 0,
            due: today,
        }
    }

    pub fn is_due(&self, today: Date) -> bool {
        self.due <= today
    }

    /// Not due yet, but due within `lookahead` days.
    pub fn is_near_due(&self, today: Date, lookahead: u64) -> bool {
        !self.is_due(today) && self.due <= today.add_days(lookahead)
    }
}

pub fn update_review_state(
    state: ReviewState,
    grade: Grade,
    today: Date,
    config: &SchedulerConfig,
) -> ReviewState {
    let box_index = config.next_box(state.box_index, grade);
    let days = config.interval_days(box_index, grade);
    ReviewState {
        box_index,
        due: today.add_days(days),
    }
}
