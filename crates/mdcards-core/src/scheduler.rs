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

use std::collections::VecDeque;

use serde::Serialize;

use crate::deck::Deck;
use crate::error::Fallible;
use crate::leitner::Grade;
use crate::leitner::SchedulerConfig;
use crate::rng::TinyRng;
use crate::rng::shuffle;
use crate::types::card::Card;
use crate::types::date::Date;
use crate::types::review_state::update_review_state;

/// How a study session is run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionConfig {
    /// Keep file order instead of shuffling.
    pub sequential: bool,
    /// Category prefix filter. Empty matches every card.
    pub category: String,
    /// How many cards to draw. 0 means no limit.
    pub count: usize,
    /// How many days ahead the session may borrow cards from when today's
    /// cards do not fill it.
    pub future_days_due: u64,
    /// Grade cards without changing their schedule.
    pub test_mode: bool,
    /// Show each card's category with its front.
    pub show_category: bool,
}

/// Pick the cards for a session, as indices into `cards`, in file order.
pub fn assemble_queue(cards: &[Card], config: &SessionConfig, today: Date) -> Vec<usize> {
    if config.count == 0 && config.category.is_empty() {
        return (0..cards.len()).collect();
    }
    let mut primary: Vec<usize> = Vec::new();
    let mut overflow: Vec<usize> = Vec::new();
    for (index, card) in cards.iter().enumerate() {
        if config.count > 0 && primary.len() >= config.count {
            break;
        }
        if !card.matches_category(&config.category) {
            continue;
        }
        let state = card.state();
        if config.test_mode || state.is_due(today) {
            primary.push(index);
        } else if state.is_near_due(today, config.future_days_due) {
            overflow.push(index);
        }
    }
    if config.count > 0 && primary.len() < config.count {
        let missing = config.count - primary.len();
        primary.extend(overflow.into_iter().take(missing));
    }
    primary
}

/// Apply a grade to a card, in place.
pub fn review_card(card: &mut Card, grade: Grade, today: Date, config: &SchedulerConfig) {
    let next = update_review_state(card.state(), grade, today, config);
    card.set_state(next);
}

/// The earliest due date in the deck, or `None` if some card is already due.
pub fn next_due_date(cards: &[Card], today: Date) -> Option<Date> {
    if cards.iter().any(|card| card.state().is_due(today)) {
        return None;
    }
    cards.iter().map(|card| card.due()).min()
}

/// How many cards got each grade.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub forgot: usize,
    pub hard: usize,
    pub okay: usize,
    pub easy: usize,
}

impl Tally {
    pub fn record(&mut self, grade: Grade) {
        match grade {
            Grade::Forgot => self.forgot += 1,
            Grade::Hard => self.hard += 1,
            Grade::Okay => self.okay += 1,
            Grade::Easy => self.easy += 1,
        }
    }

    pub fn get(&self, grade: Grade) -> usize {
        match grade {
            Grade::Forgot => self.forgot,
            Grade::Hard => self.hard,
            Grade::Okay => self.okay,
            Grade::Easy => self.easy,
        }
    }

    pub fn total(&self) -> usize {
        self.forgot + self.hard + self.okay + self.easy
    }
}

/// A study session over a deck. The queue holds indices into the deck's
/// cards, so grading a card updates the deck itself.
pub struct Session {
    config: SessionConfig,
    queue: VecDeque<usize>,
    size: usize,
    current: Option<usize>,
    reviewed: usize,
    completed: usize,
    tally: Tally,
}

impl Session {
    /// Build the queue for a session. Fails if the category filter matches
    /// no card.
    pub fn new(
        deck: &Deck,
        config: SessionConfig,
        today: Date,
        rng: &mut TinyRng,
    ) -> Fallible<Self> {
        deck.check_category(&config.category)?;
        let mut queue = assemble_queue(deck.cards(), &config, today);
        if !config.sequential {
            shuffle(&mut queue, rng);
        }
        log::debug!("Session queue has {} cards", queue.len());
        Ok(Self {
            size: queue.len(),
            queue: queue.into(),
            config,
            current: None,
            reviewed: 0,
            completed: 0,
            tally: Tally::default(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The number of cards the session started with.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Cards still waiting in the queue, not counting the current one.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// How many answers have been given so far.
    pub fn reviewed(&self) -> usize {
        self.reviewed
    }

    /// Cards that are done for this session. A forgotten card is not done
    /// until it comes back and is remembered, so this never exceeds
    /// [`Session::size`].
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }

    /// Take the next card off the queue and make it current.
    pub fn next_card(&mut self) -> Option<usize> {
        self.current = self.queue.pop_front();
        self.current
    }

    /// Grade the current card.
    ///
    /// Outside of test mode the card's box and due date are updated and the
    /// deck is written back straight away. A forgotten card goes to the back
    /// of the queue to be seen again this session. In test mode the grade is
    /// only tallied.
    pub fn answer(&mut self, deck: &mut Deck, grade: Grade, today: Date) -> Fallible<()> {
        let Some(index) = self.current.take() else {
            return Ok(());
        };
        self.reviewed += 1;
        self.tally.record(grade);
        if self.config.test_mode {
            self.completed += 1;
            return Ok(());
        }
        let config = deck.scheduler().clone();
        let card = deck.card_mut(index);
        review_card(card, grade, today, &config);
        log::debug!(
            "Card {} graded {}: box {}, due {}",
            card.id(),
            grade.as_str(),
            card.box_index(),
            card.due()
        );
        if grade == Grade::Forgot {
            self.queue.push_back(index);
        } else {
            self.completed += 1;
        }
        deck.persist()
    }
}
