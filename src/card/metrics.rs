// src/card/metrics.rs
//! Deterministic text measurement for card layout.
//!
//! Layout (wrap + pill sizing) must be reproducible without a graphics
//! surface, so widths come from a fixed per-glyph advance model rather
//! than from the shaping engine. The raster stage draws lines that
//! layout already broke, so shaping drift cannot change line structure.

/// Font roles used on the card; each carries its fixed pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    /// Masthead "CDLT NEWS".
    Wordmark,
    /// Wrapped headline block.
    Headline,
    /// Category chip label.
    Chip,
    /// Timestamp/author line.
    Meta,
    /// Reference-code stamp.
    Stamp,
}

impl FontRole {
    pub fn size_px(self) -> f32 {
        match self {
            FontRole::Wordmark => 70.0,
            FontRole::Headline => 64.0,
            FontRole::Chip => 30.0,
            FontRole::Meta => 30.0,
            FontRole::Stamp => 28.0,
        }
    }

    /// Vertical advance between wrapped lines of this role.
    pub fn line_height_px(self) -> f32 {
        self.size_px() * 1.22
    }
}

/// Width oracle used by layout and unit tests.
pub trait TextMeasure {
    fn text_width(&self, role: FontRole, text: &str) -> f32;
}

/// Fixed advance-factor model: width = size * sum(factor(char)).
/// Factors approximate a bold grotesque; exactness does not matter,
/// determinism and monotonicity do.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvanceTable;

impl AdvanceTable {
    fn factor(c: char) -> f32 {
        match c {
            ' ' => 0.28,
            'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.30,
            'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '"' => 0.38,
            'm' | 'w' => 0.82,
            'M' | 'W' => 0.92,
            'I' | 'J' => 0.38,
            '0'..='9' => 0.56,
            'A'..='Z' => 0.70,
            'a'..='z' => 0.52,
            '¿' | '?' | '¡' => 0.50,
            '-' | '–' => 0.40,
            _ => 0.60, // accented letters, emoji, everything else
        }
    }
}

impl TextMeasure for AdvanceTable {
    fn text_width(&self, role: FontRole, text: &str) -> f32 {
        let units: f32 = text.chars().map(Self::factor).sum();
        units * role.size_px()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_is_additive_and_deterministic() {
        let m = AdvanceTable;
        let a = m.text_width(FontRole::Headline, "abc");
        let b = m.text_width(FontRole::Headline, "def");
        let ab = m.text_width(FontRole::Headline, "abcdef");
        assert!((a + b - ab).abs() < 1e-3);
        assert_eq!(a, m.text_width(FontRole::Headline, "abc"));
    }

    #[test]
    fn wider_roles_scale_with_size() {
        let m = AdvanceTable;
        let chip = m.text_width(FontRole::Chip, "ECONOMÍA");
        let headline = m.text_width(FontRole::Headline, "ECONOMÍA");
        assert!(headline > chip);
    }

    #[test]
    fn empty_text_has_zero_width() {
        assert_eq!(AdvanceTable.text_width(FontRole::Meta, ""), 0.0);
    }
}
