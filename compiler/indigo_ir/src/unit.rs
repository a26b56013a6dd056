//! CSS units and conversion between compatible ones.
//!
//! Units fall into conversion groups (absolute size, time, resolution, angle,
//! frequency). Two units in the same group convert through a shared base
//! factor; everything else (relative sizes like `em`, viewport units, `%`)
//! only equals itself. The minifier leans on [`Unit::group`] and
//! [`Unit::factor`] to try alternative spellings of the same quantity.

use std::fmt;

/// A value's unit suffix.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Unit {
    // Absolute sizes
    Px,
    Pt,
    Pc,
    In,
    Cm,
    Mm,
    Q,
    // Relative sizes (not inter-convertible)
    Em,
    Rem,
    Ex,
    Ch,
    Vw,
    Vh,
    Vmin,
    Vmax,
    Percent,
    // Time
    S,
    Ms,
    // Resolution
    Dpi,
    Dpcm,
    Dppx,
    // Angle
    Deg,
    Grad,
    Rad,
    Turn,
    // Frequency
    Hz,
    Khz,
    /// Anything we do not recognize is carried through verbatim.
    Other(String),
}

/// Conversion group a unit belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnitGroup {
    AbsoluteSize,
    Time,
    Resolution,
    Angle,
    Frequency,
    /// Relative or unknown units: convertible only to themselves.
    Opaque,
}

impl Unit {
    /// Parse a unit suffix. Case-insensitive; unknown suffixes are preserved.
    pub fn parse(text: &str) -> Unit {
        match text.to_ascii_lowercase().as_str() {
            "px" => Unit::Px,
            "pt" => Unit::Pt,
            "pc" => Unit::Pc,
            "in" => Unit::In,
            "cm" => Unit::Cm,
            "mm" => Unit::Mm,
            "q" => Unit::Q,
            "em" => Unit::Em,
            "rem" => Unit::Rem,
            "ex" => Unit::Ex,
            "ch" => Unit::Ch,
            "vw" => Unit::Vw,
            "vh" => Unit::Vh,
            "vmin" => Unit::Vmin,
            "vmax" => Unit::Vmax,
            "%" => Unit::Percent,
            "s" => Unit::S,
            "ms" => Unit::Ms,
            "dpi" => Unit::Dpi,
            "dpcm" => Unit::Dpcm,
            "dppx" => Unit::Dppx,
            "deg" => Unit::Deg,
            "grad" => Unit::Grad,
            "rad" => Unit::Rad,
            "turn" => Unit::Turn,
            "hz" => Unit::Hz,
            "khz" => Unit::Khz,
            _ => Unit::Other(text.to_string()),
        }
    }

    /// The conversion group this unit belongs to.
    pub fn group(&self) -> UnitGroup {
        match self {
            Unit::Px | Unit::Pt | Unit::Pc | Unit::In | Unit::Cm | Unit::Mm | Unit::Q => {
                UnitGroup::AbsoluteSize
            }
            Unit::S | Unit::Ms => UnitGroup::Time,
            Unit::Dpi | Unit::Dpcm | Unit::Dppx => UnitGroup::Resolution,
            Unit::Deg | Unit::Grad | Unit::Rad | Unit::Turn => UnitGroup::Angle,
            Unit::Hz | Unit::Khz => UnitGroup::Frequency,
            _ => UnitGroup::Opaque,
        }
    }

    /// Factor converting one of this unit into the group's base unit
    /// (px, ms, dpi, deg, hz). `None` for opaque units.
    pub fn factor(&self) -> Option<f64> {
        let f = match self {
            Unit::Px => 1.0,
            Unit::Pt => 96.0 / 72.0,
            Unit::Pc => 16.0,
            Unit::In => 96.0,
            Unit::Cm => 96.0 / 2.54,
            Unit::Mm => 96.0 / 25.4,
            Unit::Q => 96.0 / 101.6,
            Unit::S => 1000.0,
            Unit::Ms => 1.0,
            Unit::Dpi => 1.0,
            Unit::Dpcm => 2.54,
            Unit::Dppx => 96.0,
            Unit::Deg => 1.0,
            Unit::Grad => 0.9,
            Unit::Rad => 180.0 / std::f64::consts::PI,
            Unit::Turn => 360.0,
            Unit::Hz => 1.0,
            Unit::Khz => 1000.0,
            _ => return None,
        };
        Some(f)
    }

    /// Convert `value` expressed in `self` into `target`, when both sit in
    /// the same non-opaque group.
    pub fn convert(&self, value: f64, target: &Unit) -> Option<f64> {
        if self == target {
            return Some(value);
        }
        if self.group() != target.group() || self.group() == UnitGroup::Opaque {
            return None;
        }
        let from = self.factor()?;
        let to = target.factor()?;
        Some(value * from / to)
    }

    /// All units sharing a conversion group with `self` (including `self`).
    pub fn convertible_peers(&self) -> &'static [Unit] {
        const SIZE: &[Unit] = &[
            Unit::Px,
            Unit::Pt,
            Unit::Pc,
            Unit::In,
            Unit::Cm,
            Unit::Mm,
            Unit::Q,
        ];
        const TIME: &[Unit] = &[Unit::S, Unit::Ms];
        const RESOLUTION: &[Unit] = &[Unit::Dpi, Unit::Dpcm, Unit::Dppx];
        const ANGLE: &[Unit] = &[Unit::Deg, Unit::Grad, Unit::Rad, Unit::Turn];
        const FREQUENCY: &[Unit] = &[Unit::Hz, Unit::Khz];
        match self.group() {
            UnitGroup::AbsoluteSize => SIZE,
            UnitGroup::Time => TIME,
            UnitGroup::Resolution => RESOLUTION,
            UnitGroup::Angle => ANGLE,
            UnitGroup::Frequency => FREQUENCY,
            UnitGroup::Opaque => &[],
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Unit::Px => "px",
            Unit::Pt => "pt",
            Unit::Pc => "pc",
            Unit::In => "in",
            Unit::Cm => "cm",
            Unit::Mm => "mm",
            Unit::Q => "q",
            Unit::Em => "em",
            Unit::Rem => "rem",
            Unit::Ex => "ex",
            Unit::Ch => "ch",
            Unit::Vw => "vw",
            Unit::Vh => "vh",
            Unit::Vmin => "vmin",
            Unit::Vmax => "vmax",
            Unit::Percent => "%",
            Unit::S => "s",
            Unit::Ms => "ms",
            Unit::Dpi => "dpi",
            Unit::Dpcm => "dpcm",
            Unit::Dppx => "dppx",
            Unit::Deg => "deg",
            Unit::Grad => "grad",
            Unit::Rad => "rad",
            Unit::Turn => "turn",
            Unit::Hz => "hz",
            Unit::Khz => "khz",
            Unit::Other(text) => text,
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_conversions() {
        assert_eq!(Unit::In.convert(1.0, &Unit::Px), Some(96.0));
        assert_eq!(Unit::Pt.convert(72.0, &Unit::In), Some(1.0));
        assert_eq!(Unit::Pc.convert(1.0, &Unit::Px), Some(16.0));
    }

    #[test]
    fn cross_group_is_none() {
        assert_eq!(Unit::Px.convert(1.0, &Unit::S), None);
        assert_eq!(Unit::Em.convert(1.0, &Unit::Px), None);
    }

    #[test]
    fn time_round_trip() {
        let ms = Unit::S.convert(1.5, &Unit::Ms).unwrap();
        assert_eq!(ms, 1500.0);
        assert_eq!(Unit::Ms.convert(ms, &Unit::S), Some(1.5));
    }

    #[test]
    fn unknown_unit_survives() {
        let u = Unit::parse("foo");
        assert_eq!(u, Unit::Other("foo".to_string()));
        assert_eq!(u.to_string(), "foo");
        assert_eq!(u.factor(), None);
    }
}
