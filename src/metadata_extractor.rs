use chrono::{DateTime, NaiveDateTime, Utc};
use exif::{In, Reader, Tag, Value};
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::CollageResult;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImageMetadata {
    /// Displayed width, after EXIF rotation
    pub width: u32,
    /// Displayed height, after EXIF rotation
    pub height: u32,
    pub taken_at: Option<DateTime<Utc>>,
    pub orientation: Option<u32>,
}

pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Read pixel dimensions from the image header plus EXIF capture date and
    /// orientation. Missing EXIF is not an error; an unreadable header is.
    pub fn extract(path: &Path, modified: Option<DateTime<Utc>>) -> CollageResult<ImageMetadata> {
        let (stored_width, stored_height) = image::image_dimensions(path)?;

        let mut metadata = ImageMetadata {
            width: stored_width,
            height: stored_height,
            taken_at: None,
            orientation: None,
        };

        match Self::read_exif(path) {
            Ok(exif_reader) => Self::extract_exif(&exif_reader, &mut metadata),
            Err(e) => debug!("No EXIF data for {}: {}", path.display(), e),
        }

        if Self::swaps_axes(metadata.orientation) {
            std::mem::swap(&mut metadata.width, &mut metadata.height);
        }

        if metadata.taken_at.is_none() {
            metadata.taken_at = modified;
        }

        Ok(metadata)
    }

    /// EXIF orientation tag only, `None` when absent or unreadable.
    pub fn read_orientation(path: &Path) -> Option<u32> {
        Self::read_exif(path)
            .ok()
            .and_then(|reader| Self::orientation_of(&reader))
    }

    fn read_exif(path: &Path) -> Result<exif::Exif, String> {
        let mut reader = File::open(path).map(BufReader::new).map_err(|e| e.to_string())?;
        Reader::new()
            .read_from_container(&mut reader)
            .map_err(|e| e.to_string())
    }

    fn orientation_of(reader: &exif::Exif) -> Option<u32> {
        let field = reader.get_field(Tag::Orientation, In::PRIMARY)?;
        match field.value {
            Value::Short(ref v) => v.first().map(|&value| value as u32),
            _ => None,
        }
    }

    fn extract_exif(reader: &exif::Exif, metadata: &mut ImageMetadata) {
        metadata.taken_at = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime]
            .iter()
            .filter_map(|tag| reader.get_field(*tag, In::PRIMARY))
            .filter_map(|field| Self::parse_exif_datetime(&field.display_value().to_string()))
            .next();

        metadata.orientation = Self::orientation_of(reader);
    }

    /// EXIF orientations 5-8 store the image rotated by 90 degrees.
    pub fn swaps_axes(orientation: Option<u32>) -> bool {
        matches!(orientation, Some(5..=8))
    }

    pub fn parse_exif_datetime(datetime_str: &str) -> Option<DateTime<Utc>> {
        let cleaned = datetime_str.replace('"', "");

        // EXIF format: "2023:01:15 10:30:00"
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(&cleaned, "%Y:%m:%d %H:%M:%S") {
            return Some(DateTime::from_naive_utc_and_offset(naive_dt, Utc));
        }

        // Some software normalizes to "2023-01-15 10:30:00"
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(&cleaned, "%F %T") {
            return Some(DateTime::from_naive_utc_and_offset(naive_dt, Utc));
        }

        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use image::codecs::jpeg::JpegEncoder;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    /// Solid JPEG stored as `width x height` with an EXIF orientation tag.
    pub(crate) fn write_oriented_jpeg(
        path: &Path,
        width: u32,
        height: u32,
        color: [u8; 3],
        orientation: u16,
    ) {
        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, 95)
            .encode_image(&RgbImage::from_pixel(width, height, Rgb(color)))
            .unwrap();

        // Little-endian TIFF with a single IFD0 entry: Orientation (SHORT).
        let mut tiff = vec![b'I', b'I', 0x2a, 0x00, 0x08, 0x00, 0x00, 0x00, 0x01, 0x00];
        tiff.extend_from_slice(&[0x12, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00]);
        tiff.extend_from_slice(&orientation.to_le_bytes());
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

        let mut app1 = b"Exif\0\0".to_vec();
        app1.extend_from_slice(&tiff);
        let segment_len = (app1.len() + 2) as u16;

        let mut jpeg = encoded[..2].to_vec();
        jpeg.extend_from_slice(&[0xff, 0xe1]);
        jpeg.extend_from_slice(&segment_len.to_be_bytes());
        jpeg.extend_from_slice(&app1);
        jpeg.extend_from_slice(&encoded[2..]);
        std::fs::write(path, jpeg).unwrap();
    }

    #[test]
    fn test_parse_exif_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2023, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(
            MetadataExtractor::parse_exif_datetime("2023:01:15 10:30:00"),
            Some(expected)
        );
        assert_eq!(
            MetadataExtractor::parse_exif_datetime("\"2023-01-15 10:30:00\""),
            Some(expected)
        );
        assert_eq!(MetadataExtractor::parse_exif_datetime("yesterday"), None);
    }

    #[test]
    fn test_swaps_axes() {
        assert!(!MetadataExtractor::swaps_axes(None));
        assert!(!MetadataExtractor::swaps_axes(Some(1)));
        assert!(!MetadataExtractor::swaps_axes(Some(3)));
        assert!(MetadataExtractor::swaps_axes(Some(6)));
        assert!(MetadataExtractor::swaps_axes(Some(8)));
    }

    #[test]
    fn test_extract_without_exif_uses_fallback_date() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plain.png");
        RgbImage::from_pixel(40, 30, Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let modified = Utc.with_ymd_and_hms(2022, 6, 1, 8, 0, 0).unwrap();
        let metadata = MetadataExtractor::extract(&path, Some(modified)).unwrap();

        assert_eq!((metadata.width, metadata.height), (40, 30));
        assert_eq!(metadata.orientation, None);
        assert_eq!(metadata.taken_at.map(|d| d.year()), Some(2022));
    }

    #[test]
    fn test_rotated_exif_swaps_dimensions() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("phone.jpg");
        write_oriented_jpeg(&path, 40, 20, [200, 30, 30], 6);

        let metadata = MetadataExtractor::extract(&path, None).unwrap();
        assert_eq!(metadata.orientation, Some(6));
        assert_eq!((metadata.width, metadata.height), (20, 40));
        assert_eq!(MetadataExtractor::read_orientation(&path), Some(6));
        assert_eq!(
            MetadataExtractor::read_orientation(&temp_dir.path().join("missing.jpg")),
            None
        );
    }

    #[test]
    fn test_extract_rejects_non_images() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fake.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();
        assert!(MetadataExtractor::extract(&path, None).is_err());
    }
}
