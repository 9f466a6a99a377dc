//! Correlating an input port with the output port of the same device.
//!
//! ALSA names ports `"<client> <port name>:<client id>:<port id>"`-ish, and
//! the output side of a controller is usually published under a shorter
//! name. `"nanoKONTROL2 28:0"` on the input side corresponds to
//! `"nanoKONTROL2:0"` on the output side. The rule is kept as a pure
//! function so a mismatch can be diagnosed from the port lists alone.

use std::fmt;

/// Result of looking up the output port belonging to an input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPortMatch {
    /// Exactly one output port matched.
    Unique(usize),
    /// Several output ports matched; none is opened.
    Ambiguous(Vec<usize>),
    /// The transform applied but no output carries the expected name.
    NotFound { expected: String },
    /// The input name has no recognisable shape and no output shares it.
    Unparseable,
}

impl fmt::Display for OutputPortMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unique(index) => write!(f, "output #{index}"),
            Self::Ambiguous(candidates) => write!(f, "ambiguous outputs {candidates:?}"),
            Self::NotFound { expected } => write!(f, "no output named '{expected}'"),
            Self::Unparseable => f.write_str("input name not correlatable"),
        }
    }
}

#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Derive the expected output port name from an input port name.
///
/// Finds the first word that is directly followed by a space, then the last
/// `:<digits>` group after it (with at least one character in between), and
/// returns just `<word>:<digits>`. Returns `None` when the name does not have
/// this shape.
pub fn correlated_output_name(input: &str) -> Option<String> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();

    let mut i = 0;
    while i < chars.len() {
        if !is_word_char(chars[i].1) {
            i += 1;
            continue;
        }

        let word_start = i;
        while i < chars.len() && is_word_char(chars[i].1) {
            i += 1;
        }
        let word_end = i;

        if i < chars.len() && chars[i].1 == ' ' {
            if let Some(result) = collapse(input, &chars, word_start, word_end) {
                return Some(result);
            }
        }
    }
    None
}

/// Build `<word>:<digits>` when the text after the space contains a
/// `:<digits>` group.
fn collapse(
    input: &str,
    chars: &[(usize, char)],
    word_start: usize,
    word_end: usize,
) -> Option<String> {
    // Body starts after the space; needs at least one char before the colon.
    let body_start = word_end + 1;

    let colon = (body_start + 1..chars.len()).rev().find(|&k| {
        chars[k].1 == ':' && chars.get(k + 1).is_some_and(|(_, c)| c.is_ascii_digit())
    })?;

    let digits_start = colon + 1;
    let digits_end = (digits_start..chars.len())
        .find(|&k| !chars[k].1.is_ascii_digit())
        .unwrap_or(chars.len());

    let byte = |k: usize| chars.get(k).map_or(input.len(), |(offset, _)| *offset);

    Some(format!(
        "{}:{}",
        &input[byte(word_start)..byte(word_end)],
        &input[byte(digits_start)..byte(digits_end)]
    ))
}

/// Pick the output port for `input` among `outputs`.
///
/// The transformed name is tried first. When the transform does not apply
/// or finds nothing, an output carrying the identical name is accepted, as
/// CoreMIDI and WinMM publish both directions under one name.
pub fn resolve_output_port(input: &str, outputs: &[String]) -> OutputPortMatch {
    let matching = |name: &str| -> Vec<usize> {
        outputs
            .iter()
            .enumerate()
            .filter(|(_, output)| output.as_str() == name)
            .map(|(index, _)| index)
            .collect()
    };

    let expected = correlated_output_name(input);
    if let Some(expected) = &expected {
        let found = matching(expected);
        if !found.is_empty() {
            return from_candidates(found);
        }
    }

    let same_name = matching(input);
    if !same_name.is_empty() {
        return from_candidates(same_name);
    }

    match expected {
        Some(expected) => OutputPortMatch::NotFound { expected },
        None => OutputPortMatch::Unparseable,
    }
}

fn from_candidates(mut candidates: Vec<usize>) -> OutputPortMatch {
    if candidates.len() == 1 {
        OutputPortMatch::Unique(candidates.remove(0))
    } else {
        OutputPortMatch::Ambiguous(candidates)
    }
}
