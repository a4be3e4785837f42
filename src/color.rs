use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Continuous colormap: measurement value → Color32
// ---------------------------------------------------------------------------

/// Maps a numeric measurement range onto a blue→red hue gradient for the map
/// view.  Non-finite values and a degenerate range fall back to a neutral
/// color.
#[derive(Debug, Clone, Copy)]
pub struct ValueColorMap {
    min: f64,
    max: f64,
    default_color: Color32,
}

impl ValueColorMap {
    /// Build a colormap spanning the finite values of an iterator.
    pub fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let (min, max) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        ValueColorMap {
            min,
            max,
            default_color: Color32::GRAY,
        }
    }

    /// The mapped (min, max) value range; `None` when no spread was observed
    /// (empty input, all values equal, or nothing finite).
    pub fn domain(&self) -> Option<(f64, f64)> {
        let range = self.max - self.min;
        (range.is_finite() && range > 0.0).then_some((self.min, self.max))
    }

    /// Look up the color for a value.  Cold end is blue (hue 240), warm end
    /// is red (hue 0).
    pub fn color_for(&self, value: f64) -> Color32 {
        match self.domain() {
            Some((min, max)) if value.is_finite() => {
                let t = ((value - min) / (max - min)).clamp(0.0, 1.0);
                gradient_color(t)
            }
            _ => self.default_color,
        }
    }

    pub fn default_color(&self) -> Color32 {
        self.default_color
    }
}

fn gradient_color(t: f64) -> Color32 {
    let hue = 240.0 * (1.0 - t as f32);
    let hsl = Hsl::new(hue, 0.75, 0.55);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_values_get_the_fallback_color() {
        let cm = ValueColorMap::from_values([1.0, 2.0, f64::NAN].into_iter());
        assert_eq!(cm.domain(), Some((1.0, 2.0)));
        assert_eq!(cm.color_for(f64::NAN), Color32::GRAY);
        assert_ne!(cm.color_for(1.5), Color32::GRAY);
    }

    #[test]
    fn degenerate_range_is_stable() {
        let cm = ValueColorMap::from_values([3.0, 3.0].into_iter());
        assert_eq!(cm.domain(), None);
        assert_eq!(cm.color_for(3.0), Color32::GRAY);

        let empty = ValueColorMap::from_values(std::iter::empty());
        assert_eq!(empty.color_for(0.0), Color32::GRAY);
    }

    #[test]
    fn gradient_ends_differ() {
        let cm = ValueColorMap::from_values([0.0, 10.0].into_iter());
        assert_ne!(cm.color_for(0.0), cm.color_for(10.0));
    }
}
