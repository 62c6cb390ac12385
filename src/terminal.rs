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

use std::env;
use std::io::BufRead;
use std::io::Write;

use crate::error::Fallible;
use crate::error::fail;

/// Set to `true` to keep previous output on screen, e.g. when reading logs.
const DEBUG_VAR: &str = "MDCARDS_DEBUG";

/// Move the cursor home and erase the screen.
pub fn clear_screen(output: &mut impl Write) -> Fallible<()> {
    if env::var(DEBUG_VAR).is_ok_and(|value| value == "true") {
        return Ok(());
    }
    write!(output, "\x1b[H\x1b[0J")?;
    Ok(())
}

/// Read one line of input, without surrounding whitespace.
pub fn read_line(input: &mut impl BufRead) -> Fallible<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return fail("unexpected end of input");
    }
    Ok(line.trim().to_string())
}

/// Block until the user presses Enter.
pub fn wait_for_enter(input: &mut impl BufRead) -> Fallible<()> {
    read_line(input).map(|_| ())
}

/// Read a number between `min` and `max` inclusive, asking again until one
/// is given.
pub fn read_number(
    input: &mut impl BufRead,
    output: &mut impl Write,
    min: usize,
    max: usize,
) -> Fallible<usize> {
    loop {
        let line = read_line(input)?;
        match line.parse::<usize>() {
            Ok(n) if (min..=max).contains(&n) => return Ok(n),
            _ => {
                write!(output, "Please enter a number between {min} and {max}: ")?;
                output.flush()?;
            }
        }
    }
}

/// Wrap text at whitespace so that lines fit in `width` columns.
///
/// Continuation lines of an indented line or a list item are indented to
/// line up with the item's text. Lines that already fit, and lines inside
/// fenced code blocks, are kept as they are. Words longer than `width` get a
/// line of their own. A width of 0 disables wrapping.
pub fn wrap(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut in_fence = false;
    for line in text.lines() {
        let is_fence = line.trim_start().starts_with("```");
        if width == 0 || in_fence || is_fence || line.chars().count() <= width {
            out.push_str(line);
            out.push('\n');
        } else {
            wrap_line(line, width, &mut out);
        }
        if is_fence {
            in_fence = !in_fence;
        }
    }
    out
}

fn wrap_line(line: &str, width: usize, out: &mut String) {
    let indent = hanging_indent(line);
    let (prefix, body) = line.split_at(indent);
    let mut current = prefix.to_string();
    let mut current_len = prefix.chars().count();
    let mut has_word = false;
    for word in body.split_whitespace() {
        let len = word.chars().count();
        if has_word && current_len + 1 + len > width {
            out.push_str(&current);
            out.push('\n');
            current = " ".repeat(indent);
            current_len = indent;
            has_word = false;
        }
        if has_word {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += len;
        has_word = true;
    }
    out.push_str(current.trim_end());
    out.push('\n');
}

/// The byte length of a line's leading whitespace plus its list marker
/// (`- `, `* `, `+ `, `1. `, `1) `), if any.
fn hanging_indent(line: &str) -> usize {
    let leading = line.len() - line.trim_start().len();
    let rest = &line[leading..];
    let marker = match rest.strip_prefix(['-', '*', '+']) {
        Some(_) => 1,
        None => {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            match rest.as_bytes().get(digits) {
                Some(b'.') | Some(b')') if digits > 0 => digits + 1,
                _ => 0,
            }
        }
    };
    if marker > 0 && rest[marker..].starts_with(' ') {
        leading + marker + 1
    } else {
        leading
    }
}
