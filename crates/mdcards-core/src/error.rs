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

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::path::Path;
use std::path::PathBuf;

/// Everything that can go wrong while opening, scheduling or writing back a
/// deck. None of these are retried.
#[derive(Debug, PartialEq)]
pub enum DeckError {
    /// The deck file could not be opened. `message` carries the cause.
    FileNotFound { path: PathBuf, message: String },
    /// A card is missing its front or back, or its metadata is unreadable.
    /// `line` is 1-based.
    MalformedCard {
        path: PathBuf,
        line: usize,
        message: String,
    },
    /// The file parsed, but contains no cards.
    EmptyDeck(PathBuf),
    /// The category filter does not match any card.
    InvalidCategory(String),
    /// The frontmatter could not be parsed or holds unusable values.
    InvalidConfig(String),
    /// The deck could not be written back.
    WriteFailure { path: PathBuf, message: String },
    /// The deck was opened but could not be read, e.g. it is not UTF-8.
    Io(String),
}

pub type Fallible<T> = Result<T, DeckError>;

impl DeckError {
    pub(crate) fn malformed(path: &Path, line: usize, message: impl Into<String>) -> Self {
        DeckError::MalformedCard {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn file_not_found(path: &Path, message: impl Display) -> Self {
        DeckError::FileNotFound {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub(crate) fn write_failure(path: &Path, message: impl Display) -> Self {
        DeckError::WriteFailure {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

impl Display for DeckError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DeckError::FileNotFound { path, message } => {
                write!(f, "cannot open deck file {}: {}", path.display(), message)
            }
            DeckError::MalformedCard {
                path,
                line,
                message,
            } => write!(f, "{} Location: {}:{}", message, path.display(), line),
            DeckError::EmptyDeck(path) => {
                write!(f, "no flashcards found in {}", path.display())
            }
            DeckError::InvalidCategory(category) => {
                write!(f, "no card matches the category '{category}'")
            }
            DeckError::InvalidConfig(message) => write!(f, "invalid deck settings: {message}"),
            DeckError::WriteFailure { path, message } => {
                write!(f, "failed to write {}: {}", path.display(), message)
            }
            DeckError::Io(message) => write!(f, "I/O error: {message}"),
        }
    }
}

impl Error for DeckError {}
