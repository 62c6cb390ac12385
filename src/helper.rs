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

use std::fs::write;
use std::path::PathBuf;

use chrono::NaiveDate;
use mdcards_core::Date;
use tempfile::TempDir;
use tempfile::tempdir;

use crate::error::Fallible;

/// A sample deck: three cards in two categories, two of them due on
/// [`today`].
pub const SAMPLE_DECK: &str = "# 1 Basics

## What is Rust? `mdfc;id:AAAA;box:2;due:2024-05-09;`

A systems programming language.

## What is Cargo? `mdfc;id:BBBB;box:0;due:2024-05-10;`

Rust's build tool.

# 2.1 Regular Expressions

## What does `\\d` match? `mdfc;id:CCCC;box:4;due:2024-06-01;`

A digit.
";

pub fn today() -> Date {
    Date::new(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap())
}

/// Write `text` to a deck file in a fresh temporary directory. The
/// directory is deleted when the returned handle is dropped.
pub fn create_deck(text: &str) -> Fallible<(TempDir, PathBuf)> {
    let dir = tempdir()?;
    let path = dir.path().join("deck.md");
    write(&path, text)?;
    Ok((dir, path))
}
