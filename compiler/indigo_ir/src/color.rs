//! Color values and the CSS keyword color table.
//!
//! Colors normalize to 8-bit RGB with an optional alpha channel. Alpha-free
//! colors can round-trip through `#rgb` / `#rrggbb` / keyword spellings; the
//! minifier asks [`Rgba::shortest`] for the cheapest of those. Alpha-bearing
//! colors only ever serialize as `rgba(...)` because a hex spelling would be
//! lossy in the grammars we target.

use std::fmt;

/// An RGB color with optional alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// `None` means fully opaque and eligible for hex/keyword spellings.
    pub alpha: Option<f32>,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba {
            r,
            g,
            b,
            alpha: None,
        }
    }

    pub fn rgba(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        Rgba {
            r,
            g,
            b,
            alpha: Some(alpha.clamp(0.0, 1.0)),
        }
    }

    /// Parse `#rgb` or `#rrggbb` (leading `#` required).
    pub fn parse_hex(text: &str) -> Option<Rgba> {
        let digits = text.strip_prefix('#')?;
        match digits.len() {
            3 => {
                let mut out = [0u8; 3];
                for (slot, ch) in out.iter_mut().zip(digits.chars()) {
                    let nibble = ch.to_digit(16)? as u8;
                    *slot = nibble << 4 | nibble;
                }
                Some(Rgba::rgb(out[0], out[1], out[2]))
            }
            6 => {
                let mut out = [0u8; 3];
                for (i, slot) in out.iter_mut().enumerate() {
                    *slot = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).ok()?;
                }
                Some(Rgba::rgb(out[0], out[1], out[2]))
            }
            _ => None,
        }
    }

    /// Convert HSL (hue in degrees, saturation/lightness in 0..=1) to RGB.
    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64) -> Rgba {
        let h = hue.rem_euclid(360.0) / 360.0;
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);
        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return Rgba::rgb(v, v, v);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let channel = |t: f64| -> u8 {
            let t = t.rem_euclid(1.0);
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            (v * 255.0).round() as u8
        };
        Rgba::rgb(
            channel(h + 1.0 / 3.0),
            channel(h),
            channel(h - 1.0 / 3.0),
        )
    }

    /// True when each channel's two hex digits repeat (`#aabbcc`).
    fn has_short_hex(&self) -> bool {
        let repeats = |v: u8| v >> 4 == v & 0x0f;
        repeats(self.r) && repeats(self.g) && repeats(self.b)
    }

    /// Full six-digit hex spelling, `#rrggbb`.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// The shortest exact spelling: 3-hex, else keyword, else 6-hex.
    /// Alpha-bearing colors never shorten.
    pub fn shortest(&self) -> String {
        if self.alpha.is_some() {
            return self.to_string();
        }
        if self.has_short_hex() {
            return format!(
                "#{:x}{:x}{:x}",
                self.r & 0x0f,
                self.g & 0x0f,
                self.b & 0x0f
            );
        }
        if let Some(name) = keyword_of(self.r, self.g, self.b) {
            if name.len() < 7 {
                return name.to_string();
            }
        }
        self.hex()
    }

    /// Componentwise saturating addition; alpha is carried from the left.
    #[must_use]
    pub fn saturating_add(&self, other: &Rgba) -> Rgba {
        Rgba {
            r: self.r.saturating_add(other.r),
            g: self.g.saturating_add(other.g),
            b: self.b.saturating_add(other.b),
            alpha: self.alpha,
        }
    }

    /// Componentwise saturating subtraction; alpha is carried from the left.
    #[must_use]
    pub fn saturating_sub(&self, other: &Rgba) -> Rgba {
        Rgba {
            r: self.r.saturating_sub(other.r),
            g: self.g.saturating_sub(other.g),
            b: self.b.saturating_sub(other.b),
            alpha: self.alpha,
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alpha {
            Some(a) => write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, crate::value::format_number(f64::from(a))),
            None => f.write_str(&self.hex()),
        }
    }
}

/// CSS keyword colors the compiler recognizes.
///
/// Sorted by name for binary search. The table is intentionally limited to
/// keywords short enough to matter to the minifier plus the sixteen basic
/// colors; unknown keywords simply stay identifiers, so growing this table
/// widens minification without affecting correctness.
const KEYWORDS: &[(&str, [u8; 3])] = &[
    ("aqua", [0x00, 0xff, 0xff]),
    ("azure", [0xf0, 0xff, 0xff]),
    ("beige", [0xf5, 0xf5, 0xdc]),
    ("bisque", [0xff, 0xe4, 0xc4]),
    ("black", [0x00, 0x00, 0x00]),
    ("blue", [0x00, 0x00, 0xff]),
    ("brown", [0xa5, 0x2a, 0x2a]),
    ("coral", [0xff, 0x7f, 0x50]),
    ("crimson", [0xdc, 0x14, 0x3c]),
    ("cyan", [0x00, 0xff, 0xff]),
    ("fuchsia", [0xff, 0x00, 0xff]),
    ("gold", [0xff, 0xd7, 0x00]),
    ("gray", [0x80, 0x80, 0x80]),
    ("green", [0x00, 0x80, 0x00]),
    ("grey", [0x80, 0x80, 0x80]),
    ("indigo", [0x4b, 0x00, 0x82]),
    ("ivory", [0xff, 0xff, 0xf0]),
    ("khaki", [0xf0, 0xe6, 0x8c]),
    ("lime", [0x00, 0xff, 0x00]),
    ("linen", [0xfa, 0xf0, 0xe6]),
    ("maroon", [0x80, 0x00, 0x00]),
    ("navy", [0x00, 0x00, 0x80]),
    ("olive", [0x80, 0x80, 0x00]),
    ("orange", [0xff, 0xa5, 0x00]),
    ("orchid", [0xda, 0x70, 0xd6]),
    ("peru", [0xcd, 0x85, 0x3f]),
    ("pink", [0xff, 0xc0, 0xcb]),
    ("plum", [0xdd, 0xa0, 0xdd]),
    ("purple", [0x80, 0x00, 0x80]),
    ("red", [0xff, 0x00, 0x00]),
    ("salmon", [0xfa, 0x80, 0x72]),
    ("sienna", [0xa0, 0x52, 0x2d]),
    ("silver", [0xc0, 0xc0, 0xc0]),
    ("snow", [0xff, 0xfa, 0xfa]),
    ("tan", [0xd2, 0xb4, 0x8c]),
    ("teal", [0x00, 0x80, 0x80]),
    ("tomato", [0xff, 0x63, 0x47]),
    ("violet", [0xee, 0x82, 0xee]),
    ("wheat", [0xf5, 0xde, 0xb3]),
    ("white", [0xff, 0xff, 0xff]),
    ("yellow", [0xff, 0xff, 0x00]),
];

/// Look up a keyword color by name (case-insensitive).
pub fn keyword_color(name: &str) -> Option<Rgba> {
    let lower = name.to_ascii_lowercase();
    KEYWORDS
        .binary_search_by_key(&lower.as_str(), |(keyword, _)| *keyword)
        .ok()
        .map(|idx| {
            let [r, g, b] = KEYWORDS[idx].1;
            Rgba::rgb(r, g, b)
        })
}

/// Reverse lookup: the keyword for an exact RGB triple, preferring the first
/// (alphabetically earliest) match so `aqua` beats `cyan`.
pub fn keyword_of(r: u8, g: u8, b: u8) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .find(|(_, rgb)| *rgb == [r, g, b])
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_is_sorted() {
        for pair in KEYWORDS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn parses_both_hex_widths() {
        assert_eq!(Rgba::parse_hex("#fff"), Some(Rgba::rgb(255, 255, 255)));
        assert_eq!(Rgba::parse_hex("#1a2b3c"), Some(Rgba::rgb(0x1a, 0x2b, 0x3c)));
        assert_eq!(Rgba::parse_hex("#12345"), None);
    }

    #[test]
    fn shortest_prefers_three_hex() {
        assert_eq!(Rgba::rgb(0xff, 0x00, 0x00).shortest(), "red");
        assert_eq!(Rgba::rgb(0x11, 0x22, 0x33).shortest(), "#123");
        assert_eq!(Rgba::rgb(0x1a, 0x2b, 0x3c).shortest(), "#1a2b3c");
        assert_eq!(Rgba::rgb(0xa5, 0x2a, 0x2a).shortest(), "brown");
    }

    #[test]
    fn alpha_never_shortens() {
        let c = Rgba::rgba(255, 0, 0, 0.5);
        assert_eq!(c.shortest(), "rgba(255, 0, 0, 0.5)");
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(Rgba::from_hsl(0.0, 1.0, 0.5), Rgba::rgb(255, 0, 0));
        assert_eq!(Rgba::from_hsl(120.0, 1.0, 0.5), Rgba::rgb(0, 255, 0));
        assert_eq!(Rgba::from_hsl(240.0, 1.0, 0.5), Rgba::rgb(0, 0, 255));
        assert_eq!(Rgba::from_hsl(0.0, 0.0, 1.0), Rgba::rgb(255, 255, 255));
    }
}
