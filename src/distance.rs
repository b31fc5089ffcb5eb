//! Precomputed color distances over a palette.

use cached::proc_macro::cached;
use clap::ValueEnum;
use log::debug;
use palette::color_difference::DeltaE;
use palette::{FromColor, Lab, LinSrgb, Srgb};
use rgb::RGBA8;

/// How the difference between two palette colors is measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum DistanceMode {
    /// Sum of absolute channel differences, alpha included.
    Linear,
    /// Euclidean distance in CIE L*a*b*.
    #[default]
    Lab,
    /// Luma-weighted RGB distance ("redmean").
    Redmean,
}

#[cached]
fn srgb_to_lab(rgb: [u8; 3]) -> Lab {
    let srgb: Srgb<f32> = Srgb::new(rgb[0], rgb[1], rgb[2]).into_format();
    let linear: LinSrgb<f32> = srgb.into_linear();
    Lab::from_color(linear)
}

fn linear_distance(color1: RGBA8, color2: RGBA8) -> f32 {
    let r = u32::from(color1.r.abs_diff(color2.r));
    let g = u32::from(color1.g.abs_diff(color2.g));
    let b = u32::from(color1.b.abs_diff(color2.b));
    let a = u32::from(color1.a.abs_diff(color2.a));

    (r + g + b + a) as f32
}

fn lab_distance(color1: RGBA8, color2: RGBA8) -> f32 {
    let lab1 = srgb_to_lab([color1.r, color1.g, color1.b]);
    let lab2 = srgb_to_lab([color2.r, color2.g, color2.b]);

    lab1.delta_e(lab2)
}

fn redmean_distance(color1: RGBA8, color2: RGBA8) -> f32 {
    let rmean = (i32::from(color1.r) + i32::from(color2.r)) / 2;
    let r = i32::from(color1.r) - i32::from(color2.r);
    let g = i32::from(color1.g) - i32::from(color2.g);
    let b = i32::from(color1.b) - i32::from(color2.b);

    let sum = (((512 + rmean) * r * r) >> 8) + 4 * g * g + (((767 - rmean) * b * b) >> 8);

    (sum as f32).sqrt()
}

impl DistanceMode {
    #[must_use]
    pub fn distance(self, color1: RGBA8, color2: RGBA8) -> f32 {
        match self {
            DistanceMode::Linear => linear_distance(color1, color2),
            DistanceMode::Lab => lab_distance(color1, color2),
            DistanceMode::Redmean => redmean_distance(color1, color2),
        }
    }
}

/// An N×N matrix of distances between palette indices, stored row-major.
#[derive(Clone, Debug)]
pub struct ColorDistanceTable {
    size: usize,
    distances: Vec<f32>,
}

impl ColorDistanceTable {
    #[must_use]
    pub fn build(colors: &[RGBA8], mode: DistanceMode) -> Self {
        let size = colors.len();
        let mut distances = vec![0.0; size * size];

        for (i, color) in colors.iter().enumerate() {
            for (j, other_color) in colors.iter().enumerate() {
                // Identical indices are zero even if the metric has rounding noise.
                if i != j {
                    distances[i * size + j] = mode.distance(*color, *other_color);
                }
            }
        }

        debug!("Built {size}x{size} {mode:?} color distance table");

        ColorDistanceTable { size, distances }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn get(&self, a: u8, b: u8) -> f32 {
        self.distances[usize::from(a) * self.size + usize::from(b)]
    }

    #[must_use]
    pub fn entries(&self) -> &[f32] {
        &self.distances
    }
}
