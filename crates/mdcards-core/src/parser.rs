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

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::DeckError;
use crate::error::Fallible;
use crate::markup::Line;
use crate::markup::LineReader;
use crate::markup::parse_token;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::review_state::ReviewState;

/// Reads cards out of the lines of an already repaired deck.
pub struct Parser {
    path: PathBuf,
    last_box: usize,
}

enum State {
    /// Before the first card heading, or right after a category heading.
    Initial,
    /// Collecting the body of a card.
    ReadingCard {
        id: CardId,
        front: String,
        back: String,
        state: ReviewState,
        start_line: usize,
    },
}

impl Parser {
    /// `last_box` is the highest box of the scheduler's interval table;
    /// boxes beyond it are clamped.
    pub fn new(path: PathBuf, last_box: usize) -> Self {
        Parser { path, last_box }
    }

    /// Parse all the cards in `lines`, starting at `body_start`.
    pub fn parse(&self, lines: &[String], body_start: usize) -> Fallible<Vec<Card>> {
        let mut cards = Vec::new();
        let mut reader = LineReader::default();
        let mut state = State::Initial;
        let mut category = String::new();
        for (index, line) in lines.iter().enumerate().skip(body_start) {
            let line_num = index + 1;
            state = match reader.read(line) {
                Line::Category(text) => {
                    self.finalize(state, &category, &mut cards)?;
                    category = text.to_string();
                    State::Initial
                }
                Line::CardHeading(heading) => {
                    self.finalize(state, &category, &mut cards)?;
                    let span = heading.token.ok_or_else(|| {
                        DeckError::malformed(&self.path, line_num, "Card heading has no metadata.")
                    })?;
                    let meta = parse_token(&line[span.start..span.end])
                        .map_err(|msg| DeckError::malformed(&self.path, line_num, msg))?;
                    let id = meta.id.ok_or_else(|| {
                        DeckError::malformed(&self.path, line_num, "Card metadata has no id.")
                    })?;
                    State::ReadingCard {
                        id,
                        front: heading.front.to_string(),
                        back: String::new(),
                        state: ReviewState {
                            box_index: meta.state.box_index.min(self.last_box),
                            due: meta.state.due,
                        },
                        start_line: line_num,
                    }
                }
                // Leftover legacy metadata is not part of the answer.
                Line::Metadata(_) => state,
                Line::Text(text) => match state {
                    State::Initial => State::Initial,
                    State::ReadingCard {
                        id,
                        front,
                        mut back,
                        state,
                        start_line,
                    } => {
                        back.push_str(text);
                        back.push('\n');
                        State::ReadingCard {
                            id,
                            front,
                            back,
                            state,
                            start_line,
                        }
                    }
                },
            };
        }
        self.finalize(state, &category, &mut cards)?;

        let mut seen = HashSet::new();
        for card in cards.iter() {
            if !seen.insert(card.id()) {
                return Err(DeckError::malformed(
                    &self.path,
                    card.line(),
                    format!("Duplicate card id {}.", card.id()),
                ));
            }
        }
        Ok(cards)
    }

    fn finalize(&self, state: State, category: &str, cards: &mut Vec<Card>) -> Fallible<()> {
        match state {
            State::Initial => Ok(()),
            State::ReadingCard {
                id,
                front,
                back,
                state,
                start_line,
            } => {
                if front.is_empty() {
                    return Err(DeckError::malformed(
                        &self.path,
                        start_line,
                        "Card has an empty front.",
                    ));
                }
                let back = back.trim();
                if back.is_empty() {
                    return Err(DeckError::malformed(
                        &self.path,
                        start_line,
                        "Card has an empty back.",
                    ));
                }
                cards.push(Card::new(
                    id,
                    front,
                    back.to_string(),
                    category.to_string(),
                    state,
                    start_line,
                ));
                Ok(())
            }
        }
    }
}
