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

//! Line classification and the inline metadata token.
//!
//! A card heading carries its scheduling state at the end of the line:
//!
//! ```text
//! ## What does `?` do? `mdfc;id:Ab3x;box:2;due:2026-10-19;`
//! ```
//!
//! Older decks keep `box` and `due` without an id, either in the heading or
//! on a line of their own somewhere in the card body.

use crate::types::card_id::CardId;
use crate::types::date::Date;
use crate::types::review_state::ReviewState;

const TOKEN_PREFIX: &str = "`mdfc;";

/// The decoded contents of a metadata token.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Metadata {
    pub id: Option<CardId>,
    pub state: ReviewState,
}

/// Byte range of a metadata token within a line, backticks included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

pub(crate) struct Heading<'a> {
    /// The display text, token excluded.
    pub front: &'a str,
    pub token: Option<TokenSpan>,
}

pub(crate) enum Line<'a> {
    /// `# <text>`
    Category(&'a str),
    /// `## <text>`, or any deeper heading level.
    CardHeading(Heading<'a>),
    /// A line that is nothing but a metadata token.
    Metadata(&'a str),
    /// Any other line, including everything inside fenced code blocks.
    Text(&'a str),
}

/// Classifies lines one at a time, tracking fenced code blocks so that a
/// `# comment` inside a code sample is not mistaken for a heading.
#[derive(Default)]
pub(crate) struct LineReader {
    fence: Option<&'static str>,
}

impl LineReader {
    pub fn read<'a>(&mut self, line: &'a str) -> Line<'a> {
        let trimmed = line.trim_start();
        if let Some(fence) = self.fence {
            if trimmed.starts_with(fence) {
                self.fence = None;
            }
            return Line::Text(line);
        }
        for fence in ["```", "~~~"] {
            if trimmed.starts_with(fence) {
                self.fence = Some(fence);
                return Line::Text(line);
            }
        }
        if let Some((level, rest)) = heading_level(line) {
            return if level == 1 {
                Line::Category(rest.trim())
            } else {
                Line::CardHeading(split_heading(line, line.len() - rest.len()))
            };
        }
        if is_metadata_line(line) {
            return Line::Metadata(line.trim());
        }
        Line::Text(line)
    }
}

/// The number of leading `#` characters and the text after the separating
/// space, if the line is an ATX heading.
fn heading_level(line: &str) -> Option<(usize, &str)> {
    let level = line.bytes().take_while(|b| *b == b'#').count();
    if level == 0 {
        return None;
    }
    line[level..].strip_prefix(' ').map(|rest| (level, rest))
}

fn split_heading(line: &str, text_start: usize) -> Heading<'_> {
    match find_token(line, text_start) {
        Some(span) => Heading {
            front: line[text_start..span.start].trim(),
            token: Some(span),
        },
        None => Heading {
            front: line[text_start..].trim(),
            token: None,
        },
    }
}

fn find_token(line: &str, from: usize) -> Option<TokenSpan> {
    let start = from + line[from..].find(TOKEN_PREFIX)?;
    let body = start + TOKEN_PREFIX.len();
    let end = body + line[body..].find('`')? + 1;
    Some(TokenSpan { start, end })
}

fn is_metadata_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with(TOKEN_PREFIX)
        && find_token(trimmed, 0).is_some_and(|span| span.end == trimmed.len())
}

/// Decode a token such as `` `mdfc;id:Ab3x;box:2;due:2026-10-19;` ``.
pub(crate) fn parse_token(token: &str) -> Result<Metadata, String> {
    let inner = token.trim().trim_matches('`');
    let mut fields = inner.split(';');
    if fields.next() != Some("mdfc") {
        return Err(format!("Not a metadata token: {token}"));
    }
    let mut id = None;
    let mut box_index = None;
    let mut due = None;
    for field in fields.map(str::trim).filter(|f| !f.is_empty()) {
        let (key, value) = field
            .split_once(':')
            .ok_or_else(|| format!("Malformed metadata field '{field}'."))?;
        let value = value.trim();
        match key.trim() {
            "id" => id = Some(value.parse::<CardId>().map_err(|e| e.to_string())?),
            "box" => {
                let parsed = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid box number '{value}'."))?;
                box_index = Some(parsed);
            }
            "due" => due = Some(value.parse::<Date>().map_err(|e| e.to_string())?),
            other => return Err(format!("Unknown metadata field '{other}'.")),
        }
    }
    match (box_index, due) {
        (Some(box_index), Some(due)) => Ok(Metadata {
            id,
            state: ReviewState { box_index, due },
        }),
        (None, _) => Err("Metadata is missing the box number.".to_string()),
        (_, None) => Err("Metadata is missing the due date.".to_string()),
    }
}

pub(crate) fn render_token(id: CardId, state: ReviewState) -> String {
    format!("`mdfc;id:{id};box:{};due:{};`", state.box_index, state.due)
}

/// Replace the token at `span` in `line` with a freshly rendered one,
/// leaving the rest of the line untouched.
pub(crate) fn replace_token(line: &str, span: TokenSpan, id: CardId, state: ReviewState) -> String {
    format!("{}{}{}", &line[..span.start], render_token(id, state), &line[span.end..])
}

/// Append a token to a heading line that has none.
pub(crate) fn append_token(line: &str, id: CardId, state: ReviewState) -> String {
    format!("{} {}", line.trim_end(), render_token(id, state))
}
