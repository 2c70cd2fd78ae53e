use std::fmt;
use std::str::FromStr;

use crate::utils::error::{Error, Result};

/// A compiled topic pattern: eight ordered slots, each an 8-bit mask over
/// the symbol alphabet `a..h`.
///
/// A literal token sets the bits of its letters (OR'd together); `*` sets
/// its slot to all-bits; `>` sets its slot and every remaining slot to
/// all-bits. Slots past the last token stay zero. Compilation is a pure
/// function of the source string: equal strings always produce identical
/// byte patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Topic {
    slots: [u8; 8],
}

impl Topic {
    /// Encoded size of a topic on the wire, in bytes.
    pub const LEN: usize = 8;

    /// Build a topic from raw wire bytes.
    ///
    /// Accepts any byte pattern: masks received off the wire never went
    /// through the grammar, and matching must stay robust to them.
    pub fn from_bytes(slots: [u8; Self::LEN]) -> Self {
        Self { slots }
    }

    /// The slot masks exactly as they travel on the wire.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.slots
    }

    /// True for the all-zero pattern, the state of a session before its
    /// first Subscribe. It matches nothing except another all-zero pattern.
    pub fn is_empty(&self) -> bool {
        self.slots == [0; Self::LEN]
    }

    /// Slot-wise overlap test: a slot pair matches iff the masks are equal
    /// or share at least one bit, and the whole pattern matches iff all
    /// eight slot pairs do.
    ///
    /// This is symmetric and deliberately not a containment test. Equality
    /// is what lets two zero slots (both "unspecified") agree, and an
    /// all-bits slot never matches a zero slot, so depth must line up on
    /// both sides: a topic of depth 5 pairs with patterns that are also
    /// unspecified past slot 4, while a tail opened by `>` pairs only with
    /// topics specified through every slot. The broker runs this once per
    /// (session, publish) pair, so it stays a fixed eight-iteration bit
    /// test.
    pub fn matches(&self, other: &Topic) -> bool {
        self.slots
            .iter()
            .zip(other.slots.iter())
            .all(|(a, b)| a == b || a & b != 0)
    }
}

impl FromStr for Topic {
    type Err = Error;

    /// Compile a topic string, enforcing the grammar while building the
    /// masks: 1-8 dot-separated tokens, each `[a-h]+`, `*`, or `>`, with
    /// `>` only permitted as the final token.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidTopic {
            topic: s.to_string(),
            reason,
        };

        if s.is_empty() {
            return Err(invalid("topic is empty".to_string()));
        }

        let tokens: Vec<&str> = s.split('.').collect();
        if tokens.len() > 8 {
            return Err(invalid("topic has more than 8 tokens".to_string()));
        }

        let mut slots = [0u8; Self::LEN];
        for (idx, token) in tokens.iter().enumerate() {
            match *token {
                "" => {
                    return Err(invalid(
                        "empty token (leading, trailing or consecutive dots)".to_string(),
                    ));
                }
                "*" => slots[idx] = 0xFF,
                ">" => {
                    if idx != tokens.len() - 1 {
                        return Err(invalid("'>' wildcard must be the last token".to_string()));
                    }
                    for slot in &mut slots[idx..] {
                        *slot = 0xFF;
                    }
                }
                literal => {
                    for c in literal.chars() {
                        if !matches!(c, 'a'..='h') {
                            return Err(invalid(format!(
                                "token '{literal}' contains invalid character '{c}' (allowed: a-h, '*', '>')"
                            )));
                        }
                        slots[idx] |= 1 << (c as u8 - b'a');
                    }
                }
            }
        }

        Ok(Topic { slots })
    }
}

impl fmt::Display for Topic {
    /// Best-effort rendering for logs: letters per slot, `*` for an
    /// all-bits slot, `>` once for a run of all-bits slots reaching the
    /// end, `-` for the all-zero pattern. Masks received off the wire may
    /// not round-trip through this exactly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }

        let depth = Self::LEN - self.slots.iter().rev().take_while(|&&s| s == 0).count();
        for (idx, &slot) in self.slots[..depth].iter().enumerate() {
            if idx > 0 {
                write!(f, ".")?;
            }
            if slot == 0xFF && self.slots[idx..].iter().all(|&s| s == 0xFF) {
                write!(f, ">")?;
                break;
            }
            match slot {
                0xFF => write!(f, "*")?,
                0 => write!(f, "-")?,
                _ => {
                    for bit in 0..8u8 {
                        if slot & (1 << bit) != 0 {
                            write!(f, "{}", (b'a' + bit) as char)?;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
