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

use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

pub const ID_LENGTH: usize = 4;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// The short identifier embedded in every card heading. Four symbols from a
/// 62-letter alphabet, so roughly 14.7 million distinct values.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardId([u8; ID_LENGTH]);

impl CardId {
    /// Derive an identifier from the card's front text and an attempt
    /// counter. Bumping `attempt` yields a fresh candidate when the previous
    /// one is taken, so generation is deterministic for a given file.
    pub fn derive(front: &str, attempt: u32) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(front.as_bytes());
        hasher.update(&attempt.to_le_bytes());
        let digest = hasher.finalize();
        let mut id = [0u8; ID_LENGTH];
        for (slot, byte) in id.iter_mut().zip(digest.as_bytes()) {
            *slot = ALPHABET[(*byte as usize) % ALPHABET.len()];
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        // Every byte comes from `ALPHABET`, which is ASCII.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq)]
pub struct InvalidCardId(pub String);

impl Display for InvalidCardId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "invalid card id '{}': expected {ID_LENGTH} alphanumeric characters",
            self.0
        )
    }
}

impl FromStr for CardId {
    type Err = InvalidCardId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != ID_LENGTH || !bytes.iter().all(u8::is_ascii_alphanumeric) {
            return Err(InvalidCardId(s.to_string()));
        }
        let mut id = [0u8; ID_LENGTH];
        id.copy_from_slice(bytes);
        Ok(Self(id))
    }
}

impl TryFrom<String> for CardId {
    type Error = InvalidCardId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CardId> for String {
    fn from(id: CardId) -> String {
        id.to_string()
    }
}
