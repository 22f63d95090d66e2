//! Figure themes: colours for the two rendered figures.

use plotters::style::RGBColor;

/// Colour scheme for one figure.
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: RGBColor,
    pub foreground: RGBColor,
    pub outline: RGBColor,
    pub quiver: RGBColor,
    ramp: Ramp,
}

#[derive(Debug, Clone, Copy)]
enum Ramp {
    /// Black → purple → orange → white, for the dark overlay figure.
    Ember,
    /// White → pale blue → deep blue, for the light mode figure.
    Ice,
}

impl Theme {
    /// Dark theme for the combined field/mode overlay.
    pub fn dark() -> Self {
        Self {
            background: RGBColor(10, 10, 14),
            foreground: RGBColor(230, 230, 230),
            outline: RGBColor(200, 200, 200),
            quiver: RGBColor(120, 220, 255),
            ramp: Ramp::Ember,
        }
    }

    /// Light theme for the optical-only figure.
    pub fn light() -> Self {
        Self {
            background: RGBColor(255, 255, 255),
            foreground: RGBColor(20, 20, 20),
            outline: RGBColor(60, 60, 60),
            quiver: RGBColor(30, 60, 200),
            ramp: Ramp::Ice,
        }
    }

    /// Map a normalised intensity in [0, 1] to a heatmap colour.
    pub fn intensity_colour(&self, t: f64) -> RGBColor {
        let t = t.clamp(0.0, 1.0);
        match self.ramp {
            Ramp::Ember => {
                // piecewise black → purple → orange → white
                if t < 1.0 / 3.0 {
                    let s = 3.0 * t;
                    lerp(RGBColor(0, 0, 0), RGBColor(120, 30, 140), s)
                } else if t < 2.0 / 3.0 {
                    let s = 3.0 * t - 1.0;
                    lerp(RGBColor(120, 30, 140), RGBColor(250, 140, 40), s)
                } else {
                    let s = 3.0 * t - 2.0;
                    lerp(RGBColor(250, 140, 40), RGBColor(255, 255, 255), s)
                }
            }
            Ramp::Ice => {
                if t < 0.5 {
                    let s = 2.0 * t;
                    lerp(RGBColor(255, 255, 255), RGBColor(140, 180, 240), s)
                } else {
                    let s = 2.0 * t - 1.0;
                    lerp(RGBColor(140, 180, 240), RGBColor(20, 40, 160), s)
                }
            }
        }
    }
}

fn lerp(a: RGBColor, b: RGBColor, s: f64) -> RGBColor {
    let ch = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * s).round() as u8;
    RGBColor(ch(a.0, b.0), ch(a.1, b.1), ch(a.2, b.2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramps_span_their_endpoints() {
        let dark = Theme::dark();
        assert_eq!(dark.intensity_colour(0.0), RGBColor(0, 0, 0));
        assert_eq!(dark.intensity_colour(1.0), RGBColor(255, 255, 255));

        let light = Theme::light();
        assert_eq!(light.intensity_colour(0.0), RGBColor(255, 255, 255));
        assert_eq!(light.intensity_colour(1.0), RGBColor(20, 40, 160));
    }

    #[test]
    fn out_of_range_intensities_are_clamped() {
        let theme = Theme::light();
        assert_eq!(theme.intensity_colour(-3.0), theme.intensity_colour(0.0));
        assert_eq!(theme.intensity_colour(7.0), theme.intensity_colour(1.0));
    }
}
