use std::fmt;

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    const fn from_hex(hex: u32) -> Self {
        Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }

    /// Relative luminance in [0, 1], used to pick a readable text colour
    pub fn luminance(&self) -> f64 {
        (0.2126 * self.0 as f64 + 0.7152 * self.1 as f64 + 0.0722 * self.2 as f64) / 255.0
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Diverging red → white → green scale over [-1, 1]
pub const SENTIMENT_STOPS: [(f64, Rgb); 5] = [
    (-1.0, Rgb::from_hex(0xd73027)),
    (-0.5, Rgb::from_hex(0xfc8d59)),
    (0.0, Rgb::from_hex(0xf7f7f7)),
    (0.5, Rgb::from_hex(0x91cf60)),
    (1.0, Rgb::from_hex(0x1a9850)),
];

/// Colour for a sentiment score; out-of-range scores take the end colours
pub fn sentiment_color(score: f64) -> Rgb {
    let score = if score.is_finite() { score.clamp(-1.0, 1.0) } else { 0.0 };

    for pair in SENTIMENT_STOPS.windows(2) {
        let (lo, lo_color) = pair[0];
        let (hi, hi_color) = pair[1];
        if score <= hi {
            let t = (score - lo) / (hi - lo);
            return lo_color.lerp(hi_color, t);
        }
    }
    SENTIMENT_STOPS[SENTIMENT_STOPS.len() - 1].1
}

/// Black or white, whichever reads better on `background`
pub fn text_color(background: Rgb) -> Rgb {
    if background.luminance() > 0.55 {
        Rgb(0x1f, 0x1f, 0x1f)
    } else {
        Rgb(0xff, 0xff, 0xff)
    }
}
