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

use std::collections::HashMap;
use std::fs::File;
use std::fs::canonicalize;
use std::fs::metadata;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::error::DeckError;
use crate::error::Fallible;
use crate::leitner::SchedulerConfig;
use crate::markup::Line;
use crate::markup::LineReader;
use crate::markup::TokenSpan;
use crate::markup::parse_token;
use crate::markup::replace_token;
use crate::parser::Parser;
use crate::repair::repair_lines;
use crate::settings::DeckSettings;
use crate::settings::split_frontmatter;
use crate::types::card::Card;
use crate::types::card::category_matches;
use crate::types::card_id::CardId;
use crate::types::date::Date;

/// A deck file and the cards read from it.
///
/// The file is the only persistent store: scheduling state lives in a
/// metadata token at the end of each card heading, and writing back only
/// ever touches those tokens.
#[derive(Debug)]
pub struct Deck {
    path: PathBuf,
    settings: DeckSettings,
    scheduler: SchedulerConfig,
    cards: Vec<Card>,
}

impl Deck {
    /// Open a deck, assigning ids to new cards and repairing duplicated ones.
    ///
    /// The repair pass runs over the raw lines first; the structural parse
    /// then reads the repaired lines. If the repair changed anything and the
    /// parse succeeded, the whole file is rewritten. A deck that fails to
    /// parse is left as it was.
    pub fn open(path: impl AsRef<Path>, today: Date) -> Fallible<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let mut lines = read_lines(&path)?;
        let (frontmatter, body_start) = split_frontmatter(&lines)?;
        let settings = match frontmatter {
            Some(source) => DeckSettings::from_toml(&source)?,
            None => DeckSettings::default(),
        };
        let scheduler = settings.scheduler_config()?;

        let repaired = repair_lines(&path, &mut lines, body_start, today)?;

        let parser = Parser::new(path.clone(), scheduler.last_box());
        let cards = parser.parse(&lines, body_start)?;
        if cards.is_empty() {
            return Err(DeckError::EmptyDeck(path));
        }
        if repaired {
            log::debug!("Repaired card metadata, rewriting {}", path.display());
            write_lines(&path, &lines)?;
        }
        log::debug!("Loaded {} cards from {}", cards.len(), path.display());
        Ok(Self {
            path,
            settings,
            scheduler,
            cards,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &DeckSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &SchedulerConfig {
        &self.scheduler
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, index: usize) -> &Card {
        &self.cards[index]
    }

    pub fn card_mut(&mut self, index: usize) -> &mut Card {
        &mut self.cards[index]
    }

    /// Distinct categories, in the order they first appear.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for card in self.cards.iter() {
            if !categories.contains(&card.category()) {
                categories.push(card.category());
            }
        }
        categories
    }

    /// Fails with [`DeckError::InvalidCategory`] if no card matches `filter`.
    pub fn check_category(&self, filter: &str) -> Fallible<()> {
        if self
            .cards
            .iter()
            .any(|card| category_matches(card.category(), filter))
        {
            Ok(())
        } else {
            Err(DeckError::InvalidCategory(filter.to_string()))
        }
    }

    /// Write every card's box and due date back into the file.
    ///
    /// The file is re-read and each card's token is located by id, so edits
    /// made to fronts, backs or surrounding prose since the deck was opened
    /// are kept. Only the tokens are rewritten.
    pub fn persist(&self) -> Fallible<()> {
        let mut lines = read_lines(&self.path)?;
        let (_, body_start) = split_frontmatter(&lines)?;
        let tokens = locate_tokens(&lines, body_start);
        let mut changed = false;
        for card in self.cards.iter() {
            let (index, span) = tokens.get(&card.id()).copied().ok_or_else(|| {
                DeckError::write_failure(
                    &self.path,
                    format!("card {} is no longer in the file", card.id()),
                )
            })?;
            let patched = replace_token(&lines[index], span, card.id(), card.state());
            if patched != lines[index] {
                lines[index] = patched;
                changed = true;
            }
        }
        if changed {
            write_lines(&self.path, &lines)?;
        }
        Ok(())
    }
}

/// Map each card id to the line and span of its token.
fn locate_tokens(lines: &[String], body_start: usize) -> HashMap<CardId, (usize, TokenSpan)> {
    let mut reader = LineReader::default();
    let mut tokens = HashMap::new();
    for (index, line) in lines.iter().enumerate().skip(body_start) {
        if let Line::CardHeading(heading) = reader.read(line) {
            if let Some(span) = heading.token {
                if let Ok(meta) = parse_token(&line[span.start..span.end]) {
                    if let Some(id) = meta.id {
                        tokens.entry(id).or_insert((index, span));
                    }
                }
            }
        }
    }
    tokens
}

/// Read a deck as a list of lines. Both `\n` and `\r\n` line endings are
/// accepted.
fn read_lines(path: &Path) -> Fallible<Vec<String>> {
    let mut file = File::open(path).map_err(|e| DeckError::file_not_found(path, e))?;
    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|e| DeckError::Io(format!("{}: {e}", path.display())))?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Replace the contents of the deck with `lines`, `\n`-terminated.
///
/// Symlinks are followed, so the file that receives the text is the one the
/// link points to. The text goes to a temporary file next to it, which takes
/// over the deck's permissions and is then renamed over it: the deck is
/// either fully old or fully new. A read-only deck is not written.
fn write_lines(path: &Path, lines: &[String]) -> Fallible<()> {
    let target = canonicalize(path).map_err(|e| DeckError::write_failure(path, e))?;
    let permissions = metadata(&target)
        .map_err(|e| DeckError::write_failure(path, e))?
        .permissions();
    if permissions.readonly() {
        return Err(DeckError::write_failure(path, "the file is read-only"));
    }
    let dir = target.parent().unwrap_or(Path::new("/"));
    let mut text = lines.join("\n");
    text.push('\n');
    let mut file = NamedTempFile::new_in(dir).map_err(|e| DeckError::write_failure(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| DeckError::write_failure(path, e))?;
    file.as_file()
        .set_permissions(permissions)
        .map_err(|e| DeckError::write_failure(path, e))?;
    file.as_file()
        .sync_all()
        .map_err(|e| DeckError::write_failure(path, e))?;
    file.persist(&target)
        .map_err(|e| DeckError::write_failure(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #[cfg(unix)]
    use std::fs::Permissions;
    use std::fs::read_dir;
    use std::fs::read_to_string;
    #[cfg(unix)]
    use std::fs::set_permissions;
    #[cfg(unix)]
    use std::fs::symlink_metadata;
    use std::fs::write;
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;
    #[cfg(unix)]
    use std::os::unix::fs::symlink;

    use tempfile::TempDir;
    use tempfile::tempdir;

    use super::*;
    use crate::leitner::Grade;
    use crate::scheduler::review_card;
    use crate::types::date::ymd;

    const DECK: &str = "# 1 Basics

## What is Rust?

A systems programming language.

## What is Cargo?

Rust's build tool
and package manager.

# 2.1 Regular Expressions

## What does `\\d` match?

A digit.
";

    fn today() -> Date {
        ymd(2024, 5, 10)
    }

    fn make_deck(text: &str) -> Fallible<(TempDir, PathBuf)> {
        let dir = tempdir().map_err(|e| DeckError::Io(e.to_string()))?;
        let path = dir.path().join("deck.md");
        write(&path, text).map_err(|e| DeckError::Io(e.to_string()))?;
        Ok((dir, path))
    }

    #[test]
    fn test_open_assigns_ids_and_rewrites_file() -> Fallible<()> {
        let (_dir, path) = make_deck(DECK)?;
        let deck = Deck::open(&path, today())?;
        assert_eq!(deck.cards().len(), 3);
        assert_eq!(deck.card(1).back(), "Rust's build tool\nand package manager.");
        assert_eq!(deck.card(2).front(), "What does `\\d` match?");
        assert_eq!(deck.categories(), vec!["1 Basics", "2.1 Regular Expressions"]);

        let text = read_to_string(&path).unwrap();
        for card in deck.cards() {
            assert!(text.contains(&format!("`mdfc;id:{};box:0;due:2024-05-10;`", card.id())));
        }
        // Prose is untouched.
        assert!(text.contains("\nRust's build tool\nand package manager.\n"));
        Ok(())
    }

    #[test]
    fn test_round_trip() -> Fallible<()> {
        let (_dir, path) = make_deck(DECK)?;
        let first = Deck::open(&path, today())?;
        let written = read_to_string(&path).unwrap();
        first.persist()?;
        assert_eq!(read_to_string(&path).unwrap(), written);
        // Reopening on a later day must not hand out new ids or dates.
        let second = Deck::open(&path, ymd(2024, 6, 1))?;
        assert_eq!(first.cards(), second.cards());
        Ok(())
    }

    #[test]
    fn test_persist_only_touches_tokens() -> Fallible<()> {
        let (_dir, path) = make_deck(DECK)?;
        let mut deck = Deck::open(&path, today())?;
        let config = deck.scheduler().clone();
        review_card(deck.card_mut(0), Grade::Okay, today(), &config);

        // The user fixes a typo while the session is running.
        let edited = read_to_string(&path)
            .unwrap()
            .replace("A systems programming language.", "A systems language.");
        write(&path, &edited).unwrap();

        deck.persist()?;
        let text = read_to_string(&path).unwrap();
        assert!(text.contains("A systems language."));
        assert!(text.contains(&format!(
            "## What is Rust? `mdfc;id:{};box:1;due:2024-05-11;`",
            deck.card(0).id()
        )));
        Ok(())
    }

    #[test]
    fn test_crlf_input() -> Fallible<()> {
        let (_dir, path) = make_deck("# Cat\r\n## Q\r\nA\r\n")?;
        let deck = Deck::open(&path, today())?;
        assert_eq!(deck.card(0).back(), "A");
        let text = read_to_string(&path).unwrap();
        assert!(!text.contains('\r'));
        assert!(text.ends_with("A\n"));
        Ok(())
    }

    #[test]
    fn test_frontmatter_is_preserved() -> Fallible<()> {
        let (_dir, path) = make_deck(
            "---\ncards_per_session = 7\nintervals = [0, 3]\n---\n\
             ## Q `mdfc;box:5;due:2024-01-01;`\nA\n",
        )?;
        let deck = Deck::open(&path, today())?;
        assert_eq!(deck.settings().cards_per_session, Some(7));
        assert_eq!(deck.scheduler().intervals(), &[0, 3]);
        // Legacy box 5 is beyond the table.
        assert_eq!(deck.card(0).box_index(), 1);
        let text = read_to_string(&path).unwrap();
        assert!(text.starts_with(
            "---\ncards_per_session = 7\nintervals = [0, 3]\n---\n## Q `mdfc;id:"
        ));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let result = Deck::open("/nonexistent/deck.md", today());
        match result {
            Err(DeckError::FileNotFound { path, message }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/deck.md"));
                assert!(!message.is_empty());
            }
            _ => panic!("Expected FileNotFound."),
        }
    }

    #[test]
    fn test_unopenable_path_is_file_not_found() -> Fallible<()> {
        let (_dir, path) = make_deck(DECK)?;
        // A regular file used as a directory fails to open, but not with
        // NotFound.
        let result = Deck::open(path.join("deck.md"), today());
        assert!(matches!(result, Err(DeckError::FileNotFound { .. })));
        Ok(())
    }

    #[test]
    fn test_non_utf8_deck_is_io_error() -> Fallible<()> {
        let (_dir, path) = make_deck("")?;
        write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(Deck::open(&path, today()), Err(DeckError::Io(_))));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_keeps_permissions() -> Fallible<()> {
        let (_dir, path) = make_deck(DECK)?;
        set_permissions(&path, Permissions::from_mode(0o644)).unwrap();
        let mut deck = Deck::open(&path, today())?;
        assert_eq!(metadata(&path).unwrap().permissions().mode() & 0o777, 0o644);

        let config = deck.scheduler().clone();
        review_card(deck.card_mut(0), Grade::Easy, today(), &config);
        deck.persist()?;
        assert_eq!(metadata(&path).unwrap().permissions().mode() & 0o777, 0o644);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_follows_symlinks() -> Fallible<()> {
        let (dir, real) = make_deck("# C\n## Q\nA\n")?;
        let link = dir.path().join("link.md");
        symlink(&real, &link).unwrap();

        let deck = Deck::open(&link, today())?;
        assert!(symlink_metadata(&link).unwrap().file_type().is_symlink());
        let text = read_to_string(&real).unwrap();
        assert!(text.contains(&format!("## Q `mdfc;id:{};", deck.card(0).id())));
        // No stray temporary files are left next to the deck.
        assert_eq!(read_dir(dir.path()).unwrap().count(), 2);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_deck_is_not_written() -> Fallible<()> {
        let (_dir, path) = make_deck("# C\n## Q\nA\n")?;
        set_permissions(&path, Permissions::from_mode(0o444)).unwrap();
        let result = Deck::open(&path, today());
        assert!(matches!(result, Err(DeckError::WriteFailure { .. })));
        assert_eq!(read_to_string(&path).unwrap(), "# C\n## Q\nA\n");
        Ok(())
    }

    #[test]
    fn test_empty_deck() -> Fallible<()> {
        let (_dir, path) = make_deck("# Only a category\n\nSome prose.\n")?;
        let result = Deck::open(&path, today());
        assert_eq!(result.err(), Some(DeckError::EmptyDeck(path)));
        Ok(())
    }

    #[test]
    fn test_malformed_card_does_not_rewrite() -> Fallible<()> {
        let (_dir, path) = make_deck("# Cat\n## Q\n\n## R\nB\n")?;
        let result = Deck::open(&path, today());
        assert!(matches!(result, Err(DeckError::MalformedCard { line: 2, .. })));
        assert_eq!(read_to_string(&path).unwrap(), "# Cat\n## Q\n\n## R\nB\n");
        Ok(())
    }

    #[test]
    fn test_check_category() -> Fallible<()> {
        let (_dir, path) = make_deck(DECK)?;
        let deck = Deck::open(&path, today())?;
        assert!(deck.check_category("").is_ok());
        assert!(deck.check_category("2").is_ok());
        assert!(deck.check_category("1 basics").is_ok());
        assert_eq!(
            deck.check_category("3"),
            Err(DeckError::InvalidCategory("3".to_string()))
        );
        Ok(())
    }

    #[test]
    fn test_persist_fails_when_card_was_removed() -> Fallible<()> {
        let (_dir, path) = make_deck("## Q\nA\n")?;
        let deck = Deck::open(&path, today())?;
        write(&path, "## Something else\nB\n").unwrap();
        assert!(matches!(deck.persist(), Err(DeckError::WriteFailure { .. })));
        Ok(())
    }
}
