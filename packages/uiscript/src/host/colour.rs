//! Colour value types shared by the host and the script bindings.

use serde::Serialize;

/// 8-bit RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Colourb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Floating point RGBA colour, channels nominally in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Colourf {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Colourb {
    pub const WHITE: Colourb = Colourb::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from integer channels, clamping each into `0..=255`.
    pub fn from_ints(r: i64, g: i64, b: i64, a: i64) -> Self {
        Self::new(clamp_channel(r), clamp_channel(g), clamp_channel(b), clamp_channel(a))
    }

    pub fn to_colourf(self) -> Colourf {
        Colourf::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }

    /// Channel-wise saturating addition.
    pub fn saturating_add(self, other: Colourb) -> Self {
        Self::new(
            self.r.saturating_add(other.r),
            self.g.saturating_add(other.g),
            self.b.saturating_add(other.b),
            self.a.saturating_add(other.a),
        )
    }

    /// Scale every channel, alpha included.
    pub fn scale(self, factor: f32) -> Self {
        let s = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Self::new(s(self.r), s(self.g), s(self.b), s(self.a))
    }
}

impl Default for Colourb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl std::fmt::Display for Colourb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Colourb({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Colourf {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_colourb(self) -> Colourb {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Colourb::new(c(self.r), c(self.g), c(self.b), c(self.a))
    }
}

impl Default for Colourf {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }
}

impl std::fmt::Display for Colourf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Colourf({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

fn clamp_channel(value: i64) -> u8 {
    value.clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ints_clamps() {
        assert_eq!(Colourb::from_ints(-5, 300, 128, 255), Colourb::new(0, 255, 128, 255));
    }

    #[test]
    fn test_conversion_is_stable_for_byte_values() {
        let c = Colourb::new(0, 51, 204, 255);
        assert_eq!(c.to_colourf().to_colourb(), c);
    }

    #[test]
    fn test_saturating_add_and_scale() {
        let c = Colourb::new(200, 10, 0, 255).saturating_add(Colourb::new(100, 10, 0, 0));
        assert_eq!(c, Colourb::new(255, 20, 0, 255));
        assert_eq!(Colourb::new(100, 50, 0, 200).scale(0.5), Colourb::new(50, 25, 0, 100));
    }
}
