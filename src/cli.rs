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

use clap::Parser;

use crate::cmd::categories::list_categories;
use crate::cmd::check::check_deck;
use crate::cmd::study::StudyOptions;
use crate::cmd::study::study;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Study the cards in a deck.
    Study {
        /// Path to the deck file.
        file: String,
        /// Show cards in the order they appear in the file. By default, cards are shuffled.
        #[arg(short, long)]
        sequential: bool,
        /// Only study cards from this category, e.g. "2.1" for "2.1 Regular Expressions".
        /// Without a value, choose one interactively.
        #[arg(short, long)]
        category: Option<Option<String>>,
        /// Show the category of each card.
        #[arg(short = 'o', long)]
        show_category: bool,
        /// Test yourself on this many cards, due or not, without changing their schedule.
        /// Without a value, every card is tested.
        #[arg(short, long)]
        test: Option<Option<usize>>,
        /// Number of cards to study. Defaults to `cards_per_session` from the frontmatter, or 20.
        #[arg(short, long)]
        number: Option<usize>,
        /// Fill the session with cards due within this many days.
        /// Defaults to `future_days_due` from the frontmatter, or 0.
        #[arg(long)]
        future_days: Option<u64>,
        /// Wrap card text at this many columns. 0 disables wrapping.
        #[arg(long, default_value_t = 80)]
        width: usize,
    },
    /// Check a deck for errors, assigning ids to new cards.
    Check {
        /// Path to the deck file.
        file: String,
    },
    /// List the categories of a deck.
    Categories {
        /// Path to the deck file.
        file: String,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Study {
            file,
            sequential,
            category,
            show_category,
            test,
            number,
            future_days,
            width,
        } => {
            let options = StudyOptions {
                sequential,
                category,
                show_category,
                test,
                number,
                future_days,
                width,
            };
            study(file, options)
        }
        Command::Check { file } => check_deck(file),
        Command::Categories { file } => list_categories(file),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Command::command().debug_assert();
    }

    #[test]
    fn test_optional_values() {
        let args = ["mdcards", "study", "deck.md", "-c", "-t", "5", "-o"];
        let cli = Command::try_parse_from(args).unwrap();
        match cli {
            Command::Study {
                category,
                test,
                show_category,
                ..
            } => {
                assert_eq!(category, Some(None));
                assert_eq!(test, Some(Some(5)));
                assert!(show_category);
            }
            _ => panic!("Expected the study command."),
        }
    }

    #[test]
    fn test_defaults() {
        let args = ["mdcards", "study", "deck.md", "--category", "2.1"];
        let cli = Command::try_parse_from(args).unwrap();
        match cli {
            Command::Study {
                file,
                category,
                test,
                width,
                ..
            } => {
                assert_eq!(file, "deck.md");
                assert_eq!(category, Some(Some("2.1".to_string())));
                assert_eq!(test, None);
                assert_eq!(width, 80);
            }
            _ => panic!("Expected the study command."),
        }
    }
}
