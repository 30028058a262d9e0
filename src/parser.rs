//! Turns free-form oracle text into a shot position and optional odds.
//!
//! The oracle is asked to answer with `|PLACE|x|` and `|ODDS|y|`, but game
//! progress must not depend on it complying: a missing place tag falls back
//! to the first bare integer anywhere in the reply.

use crate::common::ParseError;
use crate::config::BOARD_CELLS;

pub const PLACE_TAG: &str = "|PLACE|";
pub const ODDS_TAG: &str = "|ODDS|";

/// Structured reading of one oracle reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct SuggestedMove {
    pub shot: u8,
    pub odds: Option<u32>,
}

/// Digits enclosed as `<tag>digits|`, taken from the first well-formed match.
fn tagged_digits<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let mut rest = text;
    while let Some(at) = rest.find(tag) {
        let after = &rest[at + tag.len()..];
        let len = after.bytes().take_while(u8::is_ascii_digit).count();
        if len > 0 && after.as_bytes().get(len) == Some(&b'|') {
            return Some(&after[..len]);
        }
        rest = &rest[at + 1..];
    }
    None
}

/// First maximal run of ASCII digits.
fn first_integer(text: &str) -> Option<&str> {
    let start = text.bytes().position(|b| b.is_ascii_digit())?;
    let len = text[start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    Some(&text[start..start + len])
}

/// Odds from a strict `|ODDS|n|` tag, if present and representable.
pub fn extract_odds(text: &str) -> Option<u32> {
    tagged_digits(text, ODDS_TAG)?.parse().ok()
}

/// Shot from a `|PLACE|n|` tag, else from the first bare integer. Only
/// positions in `[0, BOARD_CELLS)` are accepted.
pub fn extract_shot(text: &str) -> Result<u8, ParseError> {
    let digits = tagged_digits(text, PLACE_TAG)
        .or_else(|| first_integer(text))
        .ok_or(ParseError::UnparsableSuggestion)?;
    match digits.parse::<u64>() {
        Ok(v) if v < BOARD_CELLS as u64 => Ok(v as u8),
        _ => Err(ParseError::UnparsableSuggestion),
    }
}

/// Full reading: the odds never block shot extraction, but a reply without a
/// usable shot is an error.
pub fn parse_suggestion(text: &str) -> Result<SuggestedMove, ParseError> {
    let odds = extract_odds(text);
    let shot = extract_shot(text)?;
    Ok(SuggestedMove { shot, odds })
}
