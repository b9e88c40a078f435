//! Color model and capability-tier downgrade.
//!
//! `Color` is the tagged variant from the data model: the default terminal
//! color, a 256-entry palette index, or a truecolor RGB triple. Downgrading
//! to a lower capability tier happens here using perceptually accurate
//! (CIELAB) nearest-color matching rather than naive Euclidean RGB distance.

/// A cell or style color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Color {
    /// The terminal's default foreground/background.
    #[default]
    Default,
    /// 256-color palette index.
    Indexed(u8),
    /// Truecolor RGB.
    Rgb {
        /// Red component.
        r: u8,
        /// Green component.
        g: u8,
        /// Blue component.
        b: u8,
    },
}

/// Terminal color/graphics capability tier (glossary: "Capability tier").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorTier {
    /// 256-color palette output.
    A,
    /// Truecolor (24-bit RGB) output.
    B,
    /// Truecolor plus enhanced graphics (Kitty/Sixel/iTerm2 images).
    C,
}

impl From<Color> for crossterm::style::Color {
    fn from(color: Color) -> Self {
        match color {
            Color::Default => crossterm::style::Color::Reset,
            Color::Indexed(i) => crossterm::style::Color::AnsiValue(i),
            Color::Rgb { r, g, b } => crossterm::style::Color::Rgb { r, g, b },
        }
    }
}

impl Color {
    /// Downgrade this color to the given capability tier.
    ///
    /// Tier A quantizes RGB to the nearest 256-color palette entry using
    /// CIELAB distance; tiers B and C pass truecolor through unchanged.
    pub fn downgrade(self, tier: ColorTier) -> Color {
        match (tier, self) {
            (ColorTier::A, Color::Rgb { r, g, b }) => Color::Indexed(rgb_to_256(r, g, b)),
            _ => self,
        }
    }
}

/// LAB color representation for perceptual distance calculation.
#[derive(Debug, Clone, Copy)]
struct Lab {
    l: f32,
    a: f32,
    b: f32,
}

/// Convert RGB to CIELAB color space using the D65 illuminant.
fn rgb_to_lab(r: u8, g: u8, b: u8) -> Lab {
    let r_linear = srgb_to_linear(r);
    let g_linear = srgb_to_linear(g);
    let b_linear = srgb_to_linear(b);

    let x = r_linear * 0.4124 + g_linear * 0.3576 + b_linear * 0.1805;
    let y = r_linear * 0.2126 + g_linear * 0.7152 + b_linear * 0.0722;
    let z = r_linear * 0.0193 + g_linear * 0.1192 + b_linear * 0.9505;

    let x_n = 0.95047;
    let y_n = 1.0;
    let z_n = 1.08883;

    let fx = lab_f(x / x_n);
    let fy = lab_f(y / y_n);
    let fz = lab_f(z / z_n);

    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);

    Lab { l, a, b }
}

fn srgb_to_linear(c: u8) -> f32 {
    let c_norm = f32::from(c) / 255.0;
    if c_norm <= 0.04045 {
        c_norm / 12.92
    } else {
        ((c_norm + 0.055) / 1.055).powf(2.4)
    }
}

fn lab_f(t: f32) -> f32 {
    let delta: f32 = 6.0 / 29.0;
    if t > delta.powi(3) {
        t.cbrt()
    } else {
        t / (3.0 * delta.powi(2)) + 4.0 / 29.0
    }
}

fn lab_distance(a: Lab, b: Lab) -> f32 {
    let dl = a.l - b.l;
    let da = a.a - b.a;
    let db = a.b - b.b;
    (dl * dl + da * da + db * db).sqrt()
}

/// 16 basic ANSI RGB reference points, index = SGR-relative color index.
const BASIC_16_RGB: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (128, 0, 0),
    (0, 128, 0),
    (128, 128, 0),
    (0, 0, 128),
    (128, 0, 128),
    (0, 128, 128),
    (192, 192, 192),
    (128, 128, 128),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (0, 0, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

/// Convert RGB to the nearest 256-color palette index using CIELAB distance.
///
/// The 256-color palette is: 0-15 basic colors, 16-231 a 6x6x6 color cube,
/// 232-255 a grayscale ramp.
pub fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    let source = rgb_to_lab(r, g, b);
    let mut best_idx = 16_u8;
    let mut best_distance = f32::MAX;

    for i in 0..24_u8 {
        let gray = 8 + 10 * i;
        let dist = lab_distance(source, rgb_to_lab(gray, gray, gray));
        if dist < best_distance {
            best_distance = dist;
            best_idx = 232 + i;
        }
    }

    for ri in 0..6_u8 {
        for gi in 0..6_u8 {
            for bi in 0..6_u8 {
                let r_val = if ri == 0 { 0 } else { 55 + 40 * ri };
                let g_val = if gi == 0 { 0 } else { 55 + 40 * gi };
                let b_val = if bi == 0 { 0 } else { 55 + 40 * bi };
                let dist = lab_distance(source, rgb_to_lab(r_val, g_val, b_val));
                if dist < best_distance {
                    best_distance = dist;
                    best_idx = 16 + 36 * ri + 6 * gi + bi;
                }
            }
        }
    }

    for (i, &(cr, cg, cb)) in BASIC_16_RGB.iter().enumerate() {
        let dist = lab_distance(source, rgb_to_lab(cr, cg, cb));
        if dist < best_distance {
            best_distance = dist;
            best_idx = i as u8;
        }
    }

    best_idx
}

/// Convert RGB to the nearest basic 16-color ANSI index (0-15) using CIELAB
/// distance. Used by the most conservative capability profiles.
pub fn rgb_to_16(r: u8, g: u8, b: u8) -> u8 {
    let source = rgb_to_lab(r, g, b);
    let mut best_idx = 7_u8;
    let mut best_distance = f32::MAX;
    for (i, &(cr, cg, cb)) in BASIC_16_RGB.iter().enumerate() {
        let dist = lab_distance(source, rgb_to_lab(cr, cg, cb));
        if dist < best_distance {
            best_distance = dist;
            best_idx = i as u8;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_color_is_default_variant() {
        assert_eq!(Color::default(), Color::Default);
    }

    #[test]
    fn truecolor_tier_passes_through() {
        let c = Color::Rgb { r: 10, g: 20, b: 30 };
        assert_eq!(c.downgrade(ColorTier::B), c);
        assert_eq!(c.downgrade(ColorTier::C), c);
    }

    #[test]
    fn tier_a_quantizes_rgb() {
        let c = Color::Rgb { r: 255, g: 0, b: 0 };
        match c.downgrade(ColorTier::A) {
            Color::Indexed(_) => {}
            other => panic!("expected Indexed, got {other:?}"),
        }
    }

    #[test]
    fn tier_a_leaves_indexed_alone() {
        let c = Color::Indexed(42);
        assert_eq!(c.downgrade(ColorTier::A), c);
    }

    #[test]
    fn rgb_to_256_pure_red() {
        assert_eq!(rgb_to_256(255, 0, 0), 196);
    }

    #[test]
    fn rgb_to_256_black() {
        assert_eq!(rgb_to_256(0, 0, 0), 0);
    }

    #[test]
    fn rgb_to_16_pure_colors() {
        assert_eq!(rgb_to_16(255, 0, 0), 9);
        assert_eq!(rgb_to_16(0, 0, 0), 0);
        assert_eq!(rgb_to_16(255, 255, 255), 15);
    }
}
