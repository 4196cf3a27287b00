use image::DynamicImage;
use std::path::Path;

use crate::error::CollageResult;

const SAMPLE_SIZE: u32 = 64;
/// Average chroma below which an image counts as grey and has no hue.
const MIN_MEAN_CHROMA: f64 = 0.05;

/// Shortest angular distance between two hues, in 0..=180.
pub fn circular_hue_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

/// Mean direction of a set of hues, `None` when empty or they cancel out.
pub fn circular_mean<I>(hues: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    weighted_circular_mean(hues.into_iter().map(|hue| (hue, 1.0)))
}

fn weighted_circular_mean<I>(samples: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (sin, cos, weight) = samples.into_iter().fold(
        (0.0_f64, 0.0_f64, 0.0_f64),
        |(sin, cos, weight), (hue, w)| {
            let radians = hue.to_radians();
            (sin + radians.sin() * w, cos + radians.cos() * w, weight + w)
        },
    );

    if weight <= 0.0 || sin.hypot(cos) / weight < 1e-6 {
        return None;
    }
    Some(sin.atan2(cos).to_degrees().rem_euclid(360.0))
}

/// RGB (0-255) to hue in degrees, saturation and value in 0..=1.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    (hue, saturation, max)
}

/// Chroma-weighted circular mean of the pixel hues of a downscaled copy.
pub fn dominant_hue(img: &DynamicImage) -> Option<f64> {
    let sample = img.thumbnail(SAMPLE_SIZE, SAMPLE_SIZE).to_rgb8();
    let pixel_count = (sample.width() * sample.height()) as f64;
    if pixel_count == 0.0 {
        return None;
    }

    let weighted: Vec<(f64, f64)> = sample
        .pixels()
        .map(|pixel| {
            let (hue, saturation, value) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
            (hue, saturation * value)
        })
        .collect();

    let mean_chroma = weighted.iter().map(|(_, w)| w).sum::<f64>() / pixel_count;
    if mean_chroma < MIN_MEAN_CHROMA {
        return None;
    }
    weighted_circular_mean(weighted)
}

pub fn dominant_hue_from_path(path: &Path) -> CollageResult<Option<f64>> {
    let img = image::open(path)?;
    Ok(dominant_hue(&img))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_circular_distance_wraps() {
        assert_eq!(circular_hue_distance(10.0, 350.0), 20.0);
        assert_eq!(circular_hue_distance(0.0, 180.0), 180.0);
        assert_eq!(circular_hue_distance(90.0, 90.0), 0.0);
    }

    #[test]
    fn test_circular_mean_across_zero() {
        let mean = circular_mean([350.0, 10.0]).unwrap();
        assert!(circular_hue_distance(mean, 0.0) < 1e-6);
        assert!(circular_mean([0.0, 180.0]).is_none());
        assert!(circular_mean(Vec::<f64>::new()).is_none());
    }

    #[test]
    fn test_rgb_to_hsv_primaries() {
        assert_eq!(rgb_to_hsv(255, 0, 0).0, 0.0);
        assert_eq!(rgb_to_hsv(0, 255, 0).0, 120.0);
        assert_eq!(rgb_to_hsv(0, 0, 255).0, 240.0);
        assert_eq!(rgb_to_hsv(128, 128, 128).1, 0.0);
    }

    #[test]
    fn test_dominant_hue_of_solid_colors() {
        let green = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([0, 200, 0])));
        let hue = dominant_hue(&green).unwrap();
        assert!((hue - 120.0).abs() < 0.5);

        let grey = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([90, 90, 90])));
        assert!(dominant_hue(&grey).is_none());
    }
}
