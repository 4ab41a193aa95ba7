// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Display colors for substance companions

use crate::error::JournalError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Palette a substance can be drawn in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstanceColor {
    /// #FF3B30
    Red,
    /// #FF9500
    Orange,
    /// #FFCC00
    Yellow,
    /// #34C759
    Green,
    /// #00C7BE
    Mint,
    /// #30B0C7
    Teal,
    /// #32ADE6
    Cyan,
    /// #007AFF
    Blue,
    /// #5856D6
    Indigo,
    /// #AF52DE
    Purple,
    /// #FF2D55
    Pink,
    /// #A2845E
    Brown,
    /// #FF7F50
    Coral,
    /// #D2B48C
    Tan,
    /// #556B2F
    OliveGreen,
    /// #8B008B
    Magenta,
}

impl SubstanceColor {
    /// Palette in suggestion order
    pub const PALETTE: [Self; 16] = [
        Self::Blue,
        Self::Orange,
        Self::Green,
        Self::Purple,
        Self::Red,
        Self::Yellow,
        Self::Teal,
        Self::Pink,
        Self::Indigo,
        Self::Mint,
        Self::Brown,
        Self::Cyan,
        Self::Coral,
        Self::Tan,
        Self::OliveGreen,
        Self::Magenta,
    ];

    /// Name used in config and on the command line
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Mint => "mint",
            Self::Teal => "teal",
            Self::Cyan => "cyan",
            Self::Blue => "blue",
            Self::Indigo => "indigo",
            Self::Purple => "purple",
            Self::Pink => "pink",
            Self::Brown => "brown",
            Self::Coral => "coral",
            Self::Tan => "tan",
            Self::OliveGreen => "olive_green",
            Self::Magenta => "magenta",
        }
    }

    /// RGB components
    #[must_use]
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Self::Red => (0xFF, 0x3B, 0x30),
            Self::Orange => (0xFF, 0x95, 0x00),
            Self::Yellow => (0xFF, 0xCC, 0x00),
            Self::Green => (0x34, 0xC7, 0x59),
            Self::Mint => (0x00, 0xC7, 0xBE),
            Self::Teal => (0x30, 0xB0, 0xC7),
            Self::Cyan => (0x32, 0xAD, 0xE6),
            Self::Blue => (0x00, 0x7A, 0xFF),
            Self::Indigo => (0x58, 0x56, 0xD6),
            Self::Purple => (0xAF, 0x52, 0xDE),
            Self::Pink => (0xFF, 0x2D, 0x55),
            Self::Brown => (0xA2, 0x84, 0x5E),
            Self::Coral => (0xFF, 0x7F, 0x50),
            Self::Tan => (0xD2, 0xB4, 0x8C),
            Self::OliveGreen => (0x55, 0x6B, 0x2F),
            Self::Magenta => (0x8B, 0x00, 0x8B),
        }
    }

    /// Hex string, e.g. `#007AFF`
    #[must_use]
    pub fn hex(&self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}

impl FromStr for SubstanceColor {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::PALETTE
            .into_iter()
            .find(|c| c.name() == needle)
            .ok_or_else(|| JournalError::UnknownColor(s.to_string()))
    }
}

/// Pick a color for a new substance.
///
/// Returns the first palette color nobody uses yet. Once the palette is
/// exhausted the least used color is recycled, earliest in palette order on ties.
#[must_use]
pub fn suggest<'a, I>(taken: I) -> SubstanceColor
where
    I: IntoIterator<Item = &'a SubstanceColor>,
{
    let mut usage: HashMap<SubstanceColor, usize> = HashMap::new();
    for color in taken {
        *usage.entry(*color).or_default() += 1;
    }

    SubstanceColor::PALETTE
        .into_iter()
        .min_by_key(|c| usage.get(c).copied().unwrap_or(0))
        .unwrap_or(SubstanceColor::Blue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_first_free() {
        let none: Vec<SubstanceColor> = Vec::new();
        assert_eq!(suggest(&none), SubstanceColor::Blue);
        assert_eq!(
            suggest(&[SubstanceColor::Blue, SubstanceColor::Green]),
            SubstanceColor::Orange
        );
    }

    #[test]
    fn test_suggest_recycles_least_used() {
        let mut taken: Vec<SubstanceColor> = SubstanceColor::PALETTE.to_vec();
        taken.push(SubstanceColor::Blue);
        taken.push(SubstanceColor::Orange);
        assert_eq!(suggest(&taken), SubstanceColor::Green);
    }

    #[test]
    fn test_parse_and_hex() {
        assert_eq!("Olive Green".parse::<SubstanceColor>().unwrap(), SubstanceColor::OliveGreen);
        assert_eq!(SubstanceColor::Blue.hex(), "#007AFF");
        assert!("chartreuse".parse::<SubstanceColor>().is_err());
    }
}
