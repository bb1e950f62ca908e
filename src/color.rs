//! Leveled two-channel color encoding of expression values.

use log::debug;

use crate::error::{LineageError, Result};

/// Default lower bound of the expression scale.
pub const LOW_EXPRESSION: f64 = 0.0;
/// Default upper bound of the expression scale.
pub const HIGH_EXPRESSION: f64 = 5000.0;

const MIN_LEVELS: usize = 5;

/// Lightness of the dark end of a perceptual ramp (`#222222`).
const PERCEPTUAL_DARK: f64 = 34.0 / 255.0;
/// Share of the target hue mixed into the dark end of a perceptual ramp.
const PERCEPTUAL_TINT: f64 = 0.15;

/// RGB color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Rgb { r, g, b }
    }

    pub fn gray(level: f64) -> Self {
        Rgb::new(level, level, level)
    }

    /// 8-bit channels, clamped and rounded.
    pub fn to_u8(self) -> (u8, u8, u8) {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        (to_u8(self.r), to_u8(self.g), to_u8(self.b))
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        Rgb::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    fn max_channel(self) -> f64 {
        self.r.max(self.g).max(self.b)
    }
}

pub type Palette = Vec<Rgb>;

/// How a full-resolution gradient is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientSource {
    /// Straight ramp from black to the target hue.
    #[default]
    Linear,
    /// Ramp from a dark gray tinted with the hue, like seaborn's `dark_palette`.
    Perceptual,
}

impl GradientSource {
    /// `n` colors ending exactly at `target`.
    pub fn ramp(self, target: Rgb, n: usize) -> Vec<Rgb> {
        let start = match self {
            GradientSource::Linear => Rgb::BLACK,
            GradientSource::Perceptual => {
                let max = target.max_channel();
                let tint = |c: f64| {
                    let share = if max > 0.0 { c / max } else { 0.0 };
                    PERCEPTUAL_DARK * ((1.0 - PERCEPTUAL_TINT) + PERCEPTUAL_TINT * share)
                };
                Rgb::new(tint(target.r), tint(target.g), tint(target.b))
            }
        };

        match n {
            0 => Vec::new(),
            1 => vec![target],
            _ => (0..n)
                .map(|i| {
                    if i == n - 1 {
                        target
                    } else {
                        start.lerp(target, i as f64 / (n - 1) as f64)
                    }
                })
                .collect(),
        }
    }
}

/// Palette construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteConfig {
    /// Colors per palette.
    pub level_count: usize,
    /// Resolution of the full gradient; 0 means `level_count`.
    pub max_level_count: usize,
    /// 1-based start of the low-brightness window.
    pub low_start: usize,
    /// Colors taken from the low-brightness window.
    pub low_width: usize,
    /// 1-based start of the high-brightness window; 0 derives it.
    pub high_start: usize,
    /// Swap the hues of the reference and comparison channels.
    pub reversed: bool,
    pub gradient: GradientSource,
    /// Max brightness (0..=255) of the first channel.
    pub channel_cap1: u8,
    /// Max brightness (0..=255) of the second channel.
    pub channel_cap2: u8,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        PaletteConfig {
            level_count: 10,
            max_level_count: 0,
            low_start: 1,
            low_width: 1,
            high_start: 0,
            reversed: false,
            gradient: GradientSource::Linear,
            channel_cap1: 255,
            channel_cap2: 255,
        }
    }
}

impl PaletteConfig {
    /// Validated `(max_level_count, high_start)`.
    fn resolve_windows(&self) -> Result<(usize, usize)> {
        let levels = self.level_count;
        if levels < MIN_LEVELS {
            return Err(LineageError::palette(format!(
                "the color level should be at least {}, got {}",
                MIN_LEVELS, levels
            )));
        }

        let max_levels = if self.max_level_count == 0 {
            levels
        } else {
            self.max_level_count
        };
        if max_levels < MIN_LEVELS {
            return Err(LineageError::palette(format!(
                "the max color level should be at least {}, got {}",
                MIN_LEVELS, max_levels
            )));
        }
        if max_levels < levels {
            return Err(LineageError::palette(format!(
                "the max color level ({}) should not be smaller than the color level ({})",
                max_levels, levels
            )));
        }

        if self.low_start < 1 {
            return Err(LineageError::palette("the low window start should be at least 1"));
        }
        if self.low_width < 1 || self.low_width > levels {
            return Err(LineageError::palette(format!(
                "the low window width should be between 1 and {}, got {}",
                levels, self.low_width
            )));
        }
        if self.low_start - 1 + self.low_width > max_levels {
            return Err(LineageError::palette(format!(
                "the low window [{}, {}) exceeds the {} gradient levels",
                self.low_start - 1,
                self.low_start - 1 + self.low_width,
                max_levels
            )));
        }

        let high_bound = max_levels - (levels - self.low_width) + 1;
        let high_start = if self.high_start == 0 {
            high_bound
        } else {
            self.high_start
        };
        if high_start > high_bound {
            return Err(LineageError::palette(format!(
                "the high window start should not be larger than {}, got {}",
                high_bound, high_start
            )));
        }

        Ok((max_levels, high_start))
    }
}

/// Build the reference and comparison palettes, `level_count` colors each.
pub fn build_palettes(config: &PaletteConfig) -> Result<(Palette, Palette)> {
    let (max_levels, high_start) = config.resolve_windows()?;

    let cap1 = config.channel_cap1 as f64 / 255.0;
    let cap2 = config.channel_cap2 as f64 / 255.0;
    let (first, second) = if config.reversed {
        (Rgb::new(0.0, cap1, 0.0), Rgb::new(cap2, 0.0, 0.0))
    } else {
        (Rgb::new(cap1, 0.0, 0.0), Rgb::new(0.0, cap2, 0.0))
    };

    let high_width = config.level_count - config.low_width;
    let low = (config.low_start - 1)..(config.low_start - 1 + config.low_width);
    let high = (high_start - 1)..(high_start - 1 + high_width);

    let window = |full: Vec<Rgb>| -> Palette {
        let mut palette = Vec::with_capacity(config.level_count);
        palette.extend_from_slice(&full[low.clone()]);
        palette.extend_from_slice(&full[high.clone()]);
        palette
    };

    debug!(
        "Palettes: {} of {} levels, low {:?}, high {:?}",
        config.level_count, max_levels, low, high
    );

    Ok((
        window(config.gradient.ramp(first, max_levels)),
        window(config.gradient.ramp(second, max_levels)),
    ))
}

/// Palettes for the channels actually drawn. Without an overlay the last
/// (comparison) palette of the set is dropped.
pub fn channel_palettes(config: &PaletteConfig, overlay: bool) -> Result<Vec<Palette>> {
    let (reference, comparison) = build_palettes(config)?;
    let mut palettes = vec![reference, comparison];
    if !overlay {
        palettes.pop();
    }
    Ok(palettes)
}

/// Map `value` onto `palette` over `[low, high]`.
///
/// The first and last colors are reserved for values at or beyond the bounds.
pub fn map_color(value: f64, palette: &[Rgb], low: f64, high: f64) -> Rgb {
    let Some(&last) = palette.last() else {
        return Rgb::BLACK;
    };
    let rate = (value - low) / (high - low);
    if rate >= 1.0 {
        last
    } else if rate <= 0.0 {
        palette[0]
    } else {
        let bins = palette.len().saturating_sub(2) as f64;
        let idx = (rate * bins).floor() as usize + 1;
        palette[idx.min(palette.len() - 1)]
    }
}

/// Channel-wise maximum of two colors.
pub fn blend(c1: Rgb, c2: Rgb) -> Rgb {
    Rgb::new(c1.r.max(c2.r), c1.g.max(c2.g), c1.b.max(c2.b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(levels: usize) -> PaletteConfig {
        PaletteConfig {
            level_count: levels,
            ..PaletteConfig::default()
        }
    }

    #[test]
    fn default_palettes_have_level_count_colors() {
        let (a, b) = build_palettes(&config(10)).unwrap();
        assert_eq!(a.len(), 10);
        assert_eq!(b.len(), 10);
        assert_eq!(a[0], Rgb::BLACK);
        assert_eq!(a[9], Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(b[9], Rgb::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn reversed_swaps_hues() {
        let cfg = PaletteConfig {
            reversed: true,
            channel_cap1: 200,
            ..config(6)
        };
        let (a, b) = build_palettes(&cfg).unwrap();
        assert_eq!(a[5], Rgb::new(0.0, 200.0 / 255.0, 0.0));
        assert_eq!(b[5], Rgb::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn windows_slice_the_full_gradient() {
        let cfg = PaletteConfig {
            level_count: 5,
            max_level_count: 9,
            low_start: 2,
            low_width: 2,
            high_start: 0,
            ..PaletteConfig::default()
        };
        let full = GradientSource::Linear.ramp(Rgb::new(1.0, 0.0, 0.0), 9);
        let (a, _) = build_palettes(&cfg).unwrap();
        // high start derives to 9 - 3 + 1 = 7
        assert_eq!(a, vec![full[1], full[2], full[6], full[7], full[8]]);
    }

    #[test]
    fn high_start_beyond_bound_is_rejected() {
        let cfg = PaletteConfig {
            high_start: 3,
            ..config(10)
        };
        match build_palettes(&cfg) {
            Err(LineageError::PaletteConfig { message }) => {
                assert!(message.contains("should not be larger than 2"), "{message}")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn too_few_levels_are_rejected() {
        assert!(matches!(
            build_palettes(&config(4)),
            Err(LineageError::PaletteConfig { .. })
        ));
        let cfg = PaletteConfig {
            max_level_count: 8,
            ..config(10)
        };
        assert!(build_palettes(&cfg).is_err());
    }

    #[test]
    fn single_channel_drops_comparison_palette() {
        assert_eq!(channel_palettes(&config(10), false).unwrap().len(), 1);
        assert_eq!(channel_palettes(&config(10), true).unwrap().len(), 2);
    }

    #[test]
    fn map_color_reserves_extreme_bins() {
        let (p, _) = build_palettes(&config(10)).unwrap();
        assert_eq!(map_color(0.0, &p, LOW_EXPRESSION, HIGH_EXPRESSION), p[0]);
        assert_eq!(map_color(-3.0, &p, LOW_EXPRESSION, HIGH_EXPRESSION), p[0]);
        assert_eq!(map_color(5000.0, &p, LOW_EXPRESSION, HIGH_EXPRESSION), p[9]);
        assert_eq!(map_color(9000.0, &p, LOW_EXPRESSION, HIGH_EXPRESSION), p[9]);
        let mid = (0.5f64 * (10 - 2) as f64).floor() as usize + 1;
        assert_eq!(map_color(2500.0, &p, LOW_EXPRESSION, HIGH_EXPRESSION), p[mid]);
        assert_eq!(map_color(1.0, &p, LOW_EXPRESSION, HIGH_EXPRESSION), p[1]);
        assert_eq!(map_color(4999.0, &p, LOW_EXPRESSION, HIGH_EXPRESSION), p[8]);
    }

    #[test]
    fn blend_takes_channel_maximum() {
        assert_eq!(
            blend(Rgb::new(1.0, 0.0, 0.0), Rgb::new(0.0, 1.0, 0.0)),
            Rgb::new(1.0, 1.0, 0.0)
        );
        assert_eq!(
            blend(Rgb::new(0.2, 0.5, 0.1), Rgb::new(0.3, 0.4, 0.0)),
            Rgb::new(0.3, 0.5, 0.1)
        );
    }

    #[test]
    fn perceptual_ramp_starts_dark_and_ends_on_target() {
        let ramp = GradientSource::Perceptual.ramp(Rgb::new(1.0, 0.0, 0.0), 5);
        assert_eq!(ramp.len(), 5);
        assert_eq!(ramp[4], Rgb::new(1.0, 0.0, 0.0));
        assert!(ramp[0].r > ramp[0].g);
        assert!(ramp[0].r < 0.2);
    }
}
