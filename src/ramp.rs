use anyhow::{anyhow, Result};

/// Ramp used when no custom ramp is configured. Index 0 is the densest glyph,
/// drawn for the darkest cells; the final '.' is drawn for the brightest.
pub const DEFAULT_RAMP: &str =
    "$#@&%ZYXWVUTSRQPONMLKJIHGFEDCBA098765432?][}{/)(><zyxwvutsrqponmlkjihgfedcba*+1-.";

/// An ordered, immutable sequence of glyphs used to quantize cell luminance.
///
/// The ramp runs from densest ink (index 0, darkest gray) to sparsest ink
/// (last index, brightest gray). On the white canvas this keeps dark regions
/// heavy and bright regions airy. Constructed once and shared by reference
/// across all frames.
#[derive(Debug, Clone)]
pub struct BrightnessRamp {
    glyphs: Vec<char>,
}

impl BrightnessRamp {
    /// Build a ramp from a glyph string, densest glyph first.
    ///
    /// Requires at least two glyphs and ASCII-only content; non-ASCII glyphs
    /// would break the fixed-width cell layout.
    pub fn new(glyphs: &str) -> Result<Self> {
        if !glyphs.is_ascii() {
            return Err(anyhow!(
                "Ramp contains non-ASCII characters. Glyphs must be ASCII to keep cells monospace."
            ));
        }
        let glyphs: Vec<char> = glyphs.chars().collect();
        if glyphs.len() < 2 {
            return Err(anyhow!(
                "Ramp must contain at least 2 glyphs, got {}",
                glyphs.len()
            ));
        }
        Ok(Self { glyphs })
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Map an 8-bit gray value to a ramp index.
    ///
    /// `index = floor(gray / 255 * (L - 1))`, clamped so floating-point
    /// rounding can never push the result to `L`.
    pub fn quantize(&self, gray: u8) -> usize {
        let last = self.glyphs.len() - 1;
        let index = (gray as f32 / 255.0 * last as f32) as usize;
        index.min(last)
    }

    /// The glyph drawn for a cell of the given gray value.
    pub fn glyph_for(&self, gray: u8) -> char {
        self.glyphs[self.quantize(gray)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_ramps() {
        assert!(BrightnessRamp::new("").is_err());
        assert!(BrightnessRamp::new("$").is_err());
        assert!(BrightnessRamp::new("$.").is_ok());
    }

    #[test]
    fn rejects_non_ascii() {
        assert!(BrightnessRamp::new("█▓▒░").is_err());
    }

    #[test]
    fn quantize_endpoints() {
        for ramp in ["$.", "$#@&%.", DEFAULT_RAMP] {
            let ramp = BrightnessRamp::new(ramp).unwrap();
            assert_eq!(ramp.quantize(0), 0);
            assert_eq!(ramp.quantize(255), ramp.len() - 1);
        }
    }

    #[test]
    fn quantize_in_bounds_and_monotonic() {
        for len in 2..=12 {
            let glyphs: String = DEFAULT_RAMP.chars().take(len).collect();
            let ramp = BrightnessRamp::new(&glyphs).unwrap();
            let mut prev = 0;
            for gray in 0..=255u8 {
                let index = ramp.quantize(gray);
                assert!(index < ramp.len());
                assert!(index >= prev, "quantize must be non-decreasing in gray");
                prev = index;
            }
        }
    }

    #[test]
    fn quantize_midpoint_example() {
        // Six-glyph ramp: gray 127 lands on floor(127/255 * 5) = 2.
        let ramp = BrightnessRamp::new("$#@&%.").unwrap();
        assert_eq!(ramp.quantize(127), 2);
        assert_eq!(ramp.glyph_for(127), '@');
        assert_eq!(ramp.glyph_for(0), '$');
        assert_eq!(ramp.glyph_for(255), '.');
    }

    #[test]
    fn default_ramp_is_valid() {
        let ramp = BrightnessRamp::new(DEFAULT_RAMP).unwrap();
        assert_eq!(ramp.glyph_for(0), '$');
        assert_eq!(ramp.glyph_for(255), '.');
    }
}
