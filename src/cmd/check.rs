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

use std::io::Write;
use std::io::stdout;

use mdcards_core::Date;
use mdcards_core::Deck;

use crate::error::Fallible;

/// Open a deck, which assigns ids to new cards, and print a summary.
pub fn check_deck(file: String) -> Fallible<()> {
    let today = Date::today();
    let deck = Deck::open(&file, today)?;
    print_summary(&deck, today, &mut stdout().lock())
}

fn print_summary(deck: &Deck, today: Date, output: &mut impl Write) -> Fallible<()> {
    let cards = deck.cards();
    let due = cards.iter().filter(|card| card.state().is_due(today)).count();
    writeln!(
        output,
        "{}: {} cards in {} categories, {} due today.",
        deck.path().display(),
        cards.len(),
        deck.categories().len(),
        due
    )?;
    Ok(())
}
