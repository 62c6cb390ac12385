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

pub fn list_categories(file: String) -> Fallible<()> {
    let today = Date::today();
    let deck = Deck::open(&file, today)?;
    print_categories(&deck, today, &mut stdout().lock())
}

/// One line per category, in file order, with card and due counts. Cards
/// before the first category heading are listed as `(none)`.
fn print_categories(deck: &Deck, today: Date, output: &mut impl Write) -> Fallible<()> {
    for category in deck.categories() {
        let cards: Vec<_> = deck
            .cards()
            .iter()
            .filter(|card| card.category() == category)
            .collect();
        let due = cards.iter().filter(|card| card.state().is_due(today)).count();
        let name = if category.is_empty() { "(none)" } else { category };
        writeln!(output, "{name}: {} cards, {due} due", cards.len())?;
    }
    Ok(())
}
