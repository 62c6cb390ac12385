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

use std::io::BufRead;
use std::io::Write;
use std::io::stdin;
use std::io::stdout;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use mdcards_core::Date;
use mdcards_core::Deck;
use mdcards_core::DeckSettings;
use mdcards_core::Grade;
use mdcards_core::Session;
use mdcards_core::SessionConfig;
use mdcards_core::TinyRng;
use mdcards_core::next_due_date;

use crate::error::Fallible;
use crate::error::fail;
use crate::terminal::clear_screen;
use crate::terminal::read_number;
use crate::terminal::wait_for_enter;
use crate::terminal::wrap;

/// Used when neither the command line nor the deck says how many cards to
/// study.
const DEFAULT_CARDS_PER_SESSION: usize = 20;

pub struct StudyOptions {
    pub sequential: bool,
    /// `Some(None)` means the category is chosen interactively.
    pub category: Option<Option<String>>,
    pub show_category: bool,
    /// `Some(None)` means every card is tested.
    pub test: Option<Option<usize>>,
    pub number: Option<usize>,
    pub future_days: Option<u64>,
    pub width: usize,
}

pub fn study(file: String, options: StudyOptions) -> Fallible<()> {
    let today = Date::today();
    let mut deck = Deck::open(&file, today)?;
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default();
    let mut rng = TinyRng::from_seed(seed);
    let mut input = stdin().lock();
    let mut output = stdout().lock();
    run_session(&mut deck, options, today, &mut rng, &mut input, &mut output)
}

/// Flags take precedence over the deck's frontmatter.
fn session_config(
    settings: &DeckSettings,
    options: &StudyOptions,
    category: String,
) -> SessionConfig {
    let count = match options.test {
        Some(limit) => limit.unwrap_or(0),
        None => options
            .number
            .or(settings.cards_per_session)
            .unwrap_or(DEFAULT_CARDS_PER_SESSION),
    };
    SessionConfig {
        sequential: options.sequential,
        category,
        count,
        future_days_due: options
            .future_days
            .or(settings.future_days_due)
            .unwrap_or(0),
        test_mode: options.test.is_some(),
        show_category: options.show_category,
    }
}

fn run_session(
    deck: &mut Deck,
    options: StudyOptions,
    today: Date,
    rng: &mut TinyRng,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Fallible<()> {
    let category = match &options.category {
        None => String::new(),
        Some(Some(category)) => category.clone(),
        Some(None) => choose_category(deck, input, output)?,
    };
    let config = session_config(deck.settings(), &options, category);
    log::debug!("Session config: {}", serde_json::to_string(&config)?);

    let mut session = Session::new(deck, config, today, rng)?;
    if session.size() == 0 {
        writeln!(output, "Nothing to study right now.")?;
        print_next_due(deck, today, output)?;
        return Ok(());
    }

    while let Some(index) = session.next_card() {
        let card = deck.card(index);
        clear_screen(output)?;
        writeln!(output, "[{}/{}]", session.completed() + 1, session.size())?;
        if session.config().show_category && !card.category().is_empty() {
            writeln!(output, "{}", card.category())?;
        }
        writeln!(output)?;
        write!(output, "{}", wrap(card.front(), options.width))?;
        writeln!(output)?;
        write!(output, "Press Enter to show the answer.")?;
        output.flush()?;
        wait_for_enter(input)?;

        writeln!(output)?;
        write!(output, "{}", wrap(card.back(), options.width))?;
        writeln!(output)?;
        for (n, grade) in Grade::ALL.iter().enumerate() {
            write!(output, "{}) {}  ", n + 1, grade.as_str())?;
        }
        writeln!(output)?;
        write!(output, "How well did you remember? ")?;
        output.flush()?;
        let choice = read_number(input, output, 1, Grade::ALL.len())?;
        let Some(grade) = Grade::from_choice(choice) else {
            return fail(format!("invalid choice: {choice}"));
        };
        session.answer(deck, grade, today)?;
    }

    clear_screen(output)?;
    writeln!(output, "Session finished, {} reviews.", session.reviewed())?;
    for grade in Grade::ALL {
        writeln!(output, "  {}: {}", grade.as_str(), session.tally().get(grade))?;
    }
    if !session.config().test_mode {
        print_next_due(deck, today, output)?;
    }
    Ok(())
}

fn print_next_due(deck: &Deck, today: Date, output: &mut impl Write) -> Fallible<()> {
    match next_due_date(deck.cards(), today) {
        None => writeln!(output, "You still have cards due today.")?,
        Some(due) => writeln!(
            output,
            "Next card is due on {due} (in {} days).",
            today.days_until(due)
        )?,
    }
    Ok(())
}

/// List the deck's categories and read the user's pick.
fn choose_category(
    deck: &Deck,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Fallible<String> {
    let categories: Vec<&str> = deck
        .categories()
        .into_iter()
        .filter(|category| !category.is_empty())
        .collect();
    if categories.is_empty() {
        return fail("the deck has no categories to choose from");
    }
    writeln!(output, "Categories:")?;
    for (n, category) in categories.iter().enumerate() {
        writeln!(output, "  {}) {category}", n + 1)?;
    }
    write!(output, "Choose a category: ")?;
    output.flush()?;
    let choice = read_number(input, output, 1, categories.len())?;
    Ok(categories[choice - 1].to_string())
}
