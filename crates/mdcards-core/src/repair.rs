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

//! The metadata repair pass.
//!
//! Runs over the raw lines of a deck before the structural parse and makes
//! sure every card heading ends in a token with a unique id. Headings
//! without a token get a fresh one, legacy `box`/`due` data is migrated into
//! the heading, and duplicated ids (from copy-pasted cards or merged files)
//! are replaced.

use std::collections::HashSet;
use std::path::Path;

use crate::error::DeckError;
use crate::error::Fallible;
use crate::markup::Line;
use crate::markup::LineReader;
use crate::markup::Metadata;
use crate::markup::TokenSpan;
use crate::markup::append_token;
use crate::markup::parse_token;
use crate::markup::replace_token;
use crate::types::card_id::CardId;
use crate::types::date::Date;
use crate::types::review_state::ReviewState;

struct HeadingInfo {
    index: usize,
    front: String,
    token: Option<(TokenSpan, Metadata)>,
    /// A standalone legacy metadata line in this card's body.
    legacy_line: Option<(usize, Metadata)>,
}

/// Repair `lines` in place, starting at `body_start`. Returns whether
/// anything changed.
pub fn repair_lines(
    path: &Path,
    lines: &mut Vec<String>,
    body_start: usize,
    today: Date,
) -> Fallible<bool> {
    let headings = scan(path, lines, body_start)?;

    // Ids already written anywhere in the file. New ids steer clear of these
    // so an existing card never loses its id to a newcomer.
    let reserved: HashSet<CardId> = headings
        .iter()
        .filter_map(|h| h.token.as_ref().and_then(|(_, meta)| meta.id))
        .collect();

    let mut seen: HashSet<CardId> = HashSet::new();
    let mut removed: Vec<usize> = Vec::new();
    let mut changed = false;
    for heading in headings {
        let line = &lines[heading.index];
        match heading.token {
            Some((_, Metadata { id: Some(id), .. })) if seen.insert(id) => {}
            Some((span, meta)) => {
                let id = fresh_id(&heading.front, &seen, &reserved);
                seen.insert(id);
                log::info!(
                    "Assigning id {id} to the card on line {} ({}).",
                    heading.index + 1,
                    match meta.id {
                        Some(old) => format!("duplicate of {old}"),
                        None => "legacy metadata".to_string(),
                    }
                );
                lines[heading.index] = replace_token(line, span, id, meta.state);
                changed = true;
            }
            None => {
                let id = fresh_id(&heading.front, &seen, &reserved);
                seen.insert(id);
                let state = match heading.legacy_line {
                    Some((legacy_index, meta)) => {
                        removed.push(legacy_index);
                        meta.state
                    }
                    None => ReviewState::new(today),
                };
                log::info!("Assigning id {id} to the card on line {}.", heading.index + 1);
                lines[heading.index] = append_token(line, id, state);
                changed = true;
            }
        }
    }

    // Indices were collected in file order; drop from the back so earlier
    // indices stay valid.
    for index in removed.into_iter().rev() {
        lines.remove(index);
    }
    Ok(changed)
}

fn scan(path: &Path, lines: &[String], body_start: usize) -> Fallible<Vec<HeadingInfo>> {
    let mut reader = LineReader::default();
    let mut headings: Vec<HeadingInfo> = Vec::new();
    // Whether the last heading is still open, i.e. no category heading has
    // closed it yet.
    let mut open = false;
    for (index, line) in lines.iter().enumerate().skip(body_start) {
        match reader.read(line) {
            Line::Category(_) => open = false,
            Line::CardHeading(heading) => {
                let token = match heading.token {
                    Some(span) => {
                        let meta = parse_token(&line[span.start..span.end])
                            .map_err(|msg| DeckError::malformed(path, index + 1, msg))?;
                        Some((span, meta))
                    }
                    None => None,
                };
                headings.push(HeadingInfo {
                    index,
                    front: heading.front.to_string(),
                    token,
                    legacy_line: None,
                });
                open = true;
            }
            Line::Metadata(token) => {
                if let Some(current) = headings.last_mut().filter(|_| open) {
                    if current.token.is_none() && current.legacy_line.is_none() {
                        let meta = parse_token(token)
                            .map_err(|msg| DeckError::malformed(path, index + 1, msg))?;
                        current.legacy_line = Some((index, meta));
                    }
                }
            }
            Line::Text(_) => {}
        }
    }
    Ok(headings)
}

fn fresh_id(front: &str, seen: &HashSet<CardId>, reserved: &HashSet<CardId>) -> CardId {
    let mut attempt = 0;
    loop {
        let id = CardId::derive(front, attempt);
        if !seen.contains(&id) && !reserved.contains(&id) {
            return id;
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::date::ymd;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    fn repair(lines: &mut Vec<String>) -> Fallible<bool> {
        repair_lines(Path::new("test.md"), lines, 0, ymd(2024, 5, 10))
    }

    /// The metadata embedded in a heading line.
    fn token_of(line: &str) -> Metadata {
        let start = line.find("`mdfc;").expect("heading has a token");
        parse_token(&line[start..]).unwrap()
    }

    #[test]
    fn test_assigns_ids_to_new_cards() -> Fallible<()> {
        let mut deck =
            lines("# Rust\n## What is Rust?\nA language.\n## What is Cargo?\nA build tool.");
        assert!(repair(&mut deck)?);
        let first = token_of(&deck[1]);
        let second = token_of(&deck[3]);
        assert!(deck[1].starts_with("## What is Rust? `mdfc;id:"));
        assert_eq!(first.state, ReviewState::new(ymd(2024, 5, 10)));
        assert!(first.id.is_some());
        assert_ne!(first.id, second.id);
        assert_eq!(deck[2], "A language.");
        Ok(())
    }

    #[test]
    fn test_second_run_changes_nothing() -> Fallible<()> {
        let mut deck = lines(
            "# A\n## Q1\nA1\n`mdfc;box:2;due:2023-01-01;`\n\
             ## Q2 `mdfc;box:1;due:2023-02-01;`\nA2\n## Q1\nA1",
        );
        assert!(repair(&mut deck)?);
        let once = deck.clone();
        assert!(!repair(&mut deck)?);
        assert_eq!(deck, once);
        Ok(())
    }

    #[test]
    fn test_migrates_legacy_metadata_line() -> Fallible<()> {
        let mut deck = lines("# A\n## Q1\n\nA1\n\n`mdfc;box:3;due:2023-01-01;`\n\n## Q2\nA2");
        assert!(repair(&mut deck)?);
        assert_eq!(deck.len(), 8);
        assert!(!deck.iter().any(|line| line.starts_with("`mdfc;")));
        let meta = token_of(&deck[1]);
        assert_eq!(meta.state, ReviewState { box_index: 3, due: ymd(2023, 1, 1) });
        // The second card had no legacy line, so it starts fresh.
        assert_eq!(token_of(&deck[6]).state, ReviewState::new(ymd(2024, 5, 10)));
        Ok(())
    }

    #[test]
    fn test_migrates_legacy_heading_token() -> Fallible<()> {
        let mut deck = lines("## Q `mdfc;box:2;due:2023-03-04;`\nA");
        assert!(repair(&mut deck)?);
        let meta = token_of(&deck[0]);
        assert!(meta.id.is_some());
        assert_eq!(meta.state, ReviewState { box_index: 2, due: ymd(2023, 3, 4) });
        Ok(())
    }

    #[test]
    fn test_replaces_duplicate_ids() -> Fallible<()> {
        let mut deck = lines(
            "## Q1 `mdfc;id:AAAA;box:2;due:2023-01-01;`\nA1\n\
             ## Q2 `mdfc;id:AAAA;box:4;due:2023-06-01;`\nA2",
        );
        assert!(repair(&mut deck)?);
        // The first occurrence keeps its id.
        assert_eq!(deck[0], "## Q1 `mdfc;id:AAAA;box:2;due:2023-01-01;`");
        let second = token_of(&deck[2]);
        assert_ne!(second.id, Some("AAAA".parse().unwrap()));
        // Only the id changes; the schedule is kept.
        assert_eq!(second.state, ReviewState { box_index: 4, due: ymd(2023, 6, 1) });
        Ok(())
    }

    #[test]
    fn test_identical_fronts_get_distinct_ids() -> Fallible<()> {
        let mut deck = lines("## Same\nA\n## Same\nB\n## Same\nC");
        repair(&mut deck)?;
        let ids: HashSet<Option<CardId>> = [0, 2, 4]
            .iter()
            .map(|i| token_of(&deck[*i]).id)
            .collect();
        assert_eq!(ids.len(), 3);
        Ok(())
    }

    #[test]
    fn test_new_ids_avoid_existing_ids() -> Fallible<()> {
        let taken = CardId::derive("Q", 0);
        let text = format!("## Q\nA\n## Other `mdfc;id:{taken};box:1;due:2023-01-01;`\nB");
        let mut deck = lines(&text);
        repair(&mut deck)?;
        assert_ne!(token_of(&deck[0]).id, Some(taken));
        assert_eq!(token_of(&deck[2]).id, Some(taken));
        Ok(())
    }

    #[test]
    fn test_leaves_frontmatter_and_fences_alone() -> Fallible<()> {
        let mut deck = lines("---\ncards_per_session = 3\n---\n## Q\n```\n## not a card\n```");
        repair_lines(Path::new("test.md"), &mut deck, 3, ymd(2024, 5, 10))?;
        assert_eq!(deck[0..3], lines("---\ncards_per_session = 3\n---")[..]);
        assert!(deck[3].contains("`mdfc;id:"));
        assert_eq!(deck[5], "## not a card");
        Ok(())
    }

    #[test]
    fn test_bad_token_is_malformed_card() {
        let mut deck = lines("# A\n## Q `mdfc;id:AAAA;box:two;due:2023-01-01;`\nA");
        let result = repair(&mut deck);
        assert!(matches!(result, Err(DeckError::MalformedCard { line: 2, .. })));
    }
}
