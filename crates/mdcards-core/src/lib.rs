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

//! mdcards-core: Leitner-box flashcards kept in a single markdown file.
//!
//! This library provides:
//! - Reading and repairing a deck file, and patching review state back into it
//! - The Leitner box scheduler and its configuration
//! - Study sessions over a deck

pub mod deck;
pub mod error;
pub mod leitner;
pub(crate) mod markup;
pub mod parser;
pub mod repair;
pub mod rng;
pub mod scheduler;
pub mod settings;
pub mod types;

// Re-exports for convenience
pub use deck::Deck;
pub use error::{DeckError, Fallible};
pub use leitner::{Grade, SchedulerConfig};
pub use rng::TinyRng;
pub use scheduler::{Session, SessionConfig, Tally, assemble_queue, next_due_date, review_card};
pub use settings::DeckSettings;
pub use types::card::Card;
pub use types::card_id::CardId;
pub use types::date::Date;
pub use types::review_state::{ReviewState, update_review_state};
