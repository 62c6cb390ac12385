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

use serde::Serialize;

use crate::types::card_id::CardId;
use crate::types::date::Date;
use crate::types::review_state::ReviewState;

/// A flashcard read from a deck file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Card {
    id: CardId,
    front: String,
    back: String,
    category: String,
    state: ReviewState,
    /// 1-based line number of the card heading.
    line: usize,
}

impl Card {
    pub fn new(
        id: CardId,
        front: String,
        back: String,
        category: String,
        state: ReviewState,
        line: usize,
    ) -> Self {
        Self {
            id,
            front,
            back,
            category,
            state,
            line,
        }
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    pub fn back(&self) -> &str {
        &self.back
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn box_index(&self) -> usize {
        self.state.box_index
    }

    pub fn due(&self) -> Date {
        self.state.due
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn set_state(&mut self, state: ReviewState) {
        self.state = state;
    }

    /// Case-insensitive prefix match of `filter` against the category. The
    /// empty filter matches every card.
    pub fn matches_category(&self, filter: &str) -> bool {
        category_matches(&self.category, filter)
    }
}

pub fn category_matches(category: &str, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    category.to_lowercase().starts_with(&filter.to_lowercase())
}
