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

use serde::Deserialize;
use serde::Serialize;

use crate::error::DeckError;
use crate::error::Fallible;
use crate::leitner::DEFAULT_INTERVALS;
use crate::leitner::SchedulerConfig;

/// Settings that can be specified at the top of a deck file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeckSettings {
    /// How many cards a study session draws when no count is given.
    pub cards_per_session: Option<usize>,
    /// How many days ahead a session may borrow cards from.
    pub future_days_due: Option<u64>,
    /// The box interval table, in days.
    pub intervals: Option<Vec<u32>>,
}

impl DeckSettings {
    pub fn from_toml(source: &str) -> Fallible<Self> {
        toml::from_str(source)
            .map_err(|e| DeckError::InvalidConfig(format!("failed to parse TOML frontmatter: {e}")))
    }

    pub fn scheduler_config(&self) -> Fallible<SchedulerConfig> {
        let intervals = self
            .intervals
            .clone()
            .unwrap_or_else(|| DEFAULT_INTERVALS.to_vec());
        SchedulerConfig::new(intervals)
    }
}

/// Locate TOML frontmatter at the top of a deck.
///
/// Returns the frontmatter source, if any, and the index of the first line
/// after it. Cards are only read from that line onwards.
pub fn split_frontmatter(lines: &[String]) -> Fallible<(Option<String>, usize)> {
    match lines.first() {
        Some(line) if line.trim() == "---" => {}
        _ => return Ok((None, 0)),
    };
    let closing = lines
        .iter()
        .skip(1)
        .position(|line| line.trim() == "---")
        .map(|idx| idx + 1)
        .ok_or_else(|| {
            DeckError::InvalidConfig("frontmatter opening '---' found but no closing '---'".into())
        })?;
    let source = lines[1..closing].join("\n");
    Ok((Some(source), closing + 1))
}
