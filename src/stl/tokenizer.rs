//! Facet token scanner for ASCII STL.
//!
//! A facet's text is scanned as a small state machine over its bytes:
//!
//! ```text
//!                 ' '                        ' ' (emit token, start next)
//!  SkippingToToken ──► AccumulatingToken ◄──┐
//!        ▲                    │     └───────┘
//!        └────── '\n' ────────┘ (emit token)
//! ```
//!
//! Every emitted token is trimmed and parsed as an `f32`. Parsed values fill
//! the 12 float slots of a triangle in record order (normal xyz, v1 xyz,
//! v2 xyz, v3 xyz). Tokens that do not parse (keywords such as `facet` or
//! `vertex`, or malformed numbers) are dropped without consuming a slot.
//! Scanning stops in `Done` once all 12 slots are filled; a token still
//! pending when the text runs out is discarded.

use crate::mesh::Triangle;
use std::ops::Range;

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Looking for the space that opens the next token.
    SkippingToToken,
    /// Inside a token that began at `start`.
    AccumulatingToken { start: usize },
    /// All slots filled.
    Done,
}

/// Advance the scanner by one byte at `pos`.
///
/// Returns the next state and, when `byte` terminates a token, the byte
/// range of that token.
pub fn transition(state: ScanState, pos: usize, byte: u8) -> (ScanState, Option<Range<usize>>) {
    match state {
        ScanState::SkippingToToken => match byte {
            b' ' => (ScanState::AccumulatingToken { start: pos + 1 }, None),
            _ => (ScanState::SkippingToToken, None),
        },
        ScanState::AccumulatingToken { start } => match byte {
            // A space both ends this token and opens the next one.
            b' ' => (
                ScanState::AccumulatingToken { start: pos + 1 },
                Some(start..pos),
            ),
            b'\n' => (ScanState::SkippingToToken, Some(start..pos)),
            _ => (state, None),
        },
        ScanState::Done => (ScanState::Done, None),
    }
}

/// Outcome of scanning one facet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacetScan {
    /// The triangle, with unfilled slots left at 0.0.
    pub triangle: Triangle,
    /// Number of slots filled from the text.
    pub filled: usize,
}

impl FacetScan {
    /// Whether all 12 slots were filled.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.filled == Triangle::FLOAT_COUNT
    }
}

/// Extract the 12 floats of one facet.
pub fn scan_facet(text: &[u8]) -> FacetScan {
    let mut floats = [0.0f32; Triangle::FLOAT_COUNT];
    let mut filled = 0;
    let mut state = ScanState::SkippingToToken;

    for (pos, &byte) in text.iter().enumerate() {
        let (next, token) = transition(state, pos, byte);
        state = next;

        if let Some(value) = token.and_then(|range| parse_token(&text[range])) {
            floats[filled] = value;
            filled += 1;
            if filled == Triangle::FLOAT_COUNT {
                state = ScanState::Done;
            }
        }

        if state == ScanState::Done {
            break;
        }
    }

    FacetScan {
        triangle: Triangle::from_floats(floats),
        filled,
    }
}

fn parse_token(token: &[u8]) -> Option<f32> {
    std::str::from_utf8(token).ok()?.trim().parse().ok()
}
