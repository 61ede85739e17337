/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt;

/// Opaque per-type state token. Internally a modification sequence;
/// clients only ever see the string form and echo it back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct State(u64);

impl State {
    pub fn new(modseq: u64) -> Self {
        State(modseq)
    }

    pub fn initial() -> Self {
        State(0)
    }

    pub fn modseq(&self) -> u64 {
        self.0
    }

    pub fn parse(value: &str) -> Option<Self> {
        if value.is_empty() || value.len() > 20 || !value.bytes().all(|b| b.is_ascii_digit()) {
            None
        } else {
            value.parse::<u64>().ok().map(State)
        }
    }
}

impl From<u64> for State {
    fn from(modseq: u64) -> Self {
        State(modseq)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl serde::Serialize for State {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

impl<'de> serde::Deserialize<'de> for State {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <&str>::deserialize(deserializer)?;
        State::parse(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid state {value:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::State;

    #[test]
    fn parse_round_trip() {
        for modseq in [0u64, 1, 999, u64::MAX] {
            let token = State::new(modseq).to_string();
            assert_eq!(State::parse(&token), Some(State::new(modseq)));
        }

        for invalid in ["", "x12", "12x", "-4", " 1", &"9".repeat(21)] {
            assert_eq!(State::parse(invalid), None, "{invalid:?}");
        }
    }
}
