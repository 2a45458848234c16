//! Colors with straight alpha.

/// An 8-bit-per-channel color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel; 255 is fully opaque.
    pub a: u8,
}

impl Rgba {
    /// A color from all four channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Rgba {
        Rgba { r, g, b, a }
    }

    /// A fully opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Rgba {
        Rgba { r, g, b, a: 255 }
    }

    /// Whether any blending is needed when drawing this color.
    pub fn is_translucent(&self) -> bool {
        self.a != 255
    }

    /// The color with its channels dimmed by `brightness`, alpha untouched.
    pub fn dimmed(&self, brightness: f64) -> Rgba {
        Rgba {
            r: (self.r as f64 * brightness).round() as u8,
            g: (self.g as f64 * brightness).round() as u8,
            b: (self.b as f64 * brightness).round() as u8,
            a: self.a,
        }
    }

    /// This color composited over `under`, producing an opaque result.
    pub fn over(&self, under: Rgba) -> Rgba {
        if !self.is_translucent() {
            return *self;
        }
        let opacity = self.a as f64 / 255.0;
        let transparency = 1.0 - opacity;
        Rgba::opaque(
            (under.r as f64 * transparency + self.r as f64 * opacity).round() as u8,
            (under.g as f64 * transparency + self.g as f64 * opacity).round() as u8,
            (under.b as f64 * transparency + self.b as f64 * opacity).round() as u8,
        )
    }
}
