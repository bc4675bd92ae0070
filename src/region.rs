//! Region values and the `minX,minY,maxX,maxY,label` line format.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::geometry::ImageBounds;

const FIELD_DELIMITER: char = ',';
const COORDINATE_FIELDS: [&str; 4] = ["min_x", "min_y", "max_x", "max_y"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionParseError {
    #[error("missing field `{field}`")]
    MissingField { field: &'static str },
    #[error("field `{field}` is not a pixel coordinate: {value:?}")]
    InvalidCoordinate { field: &'static str, value: String },
    #[error("inverted bounds: min ({min_x}, {min_y}) exceeds max ({max_x}, {max_y})")]
    InvertedBounds {
        min_x: u32,
        min_y: u32,
        max_x: u32,
        max_y: u32,
    },
}

/// A labeled rectangle in image pixel space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub label: String,
}

impl Region {
    pub fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32, label: impl Into<String>) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            label: label.into(),
        }
    }

    pub const fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x)
    }

    pub const fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y)
    }

    /// Both corners coincide. Lines of zero width or zero height alone are still valid.
    pub const fn is_degenerate(&self) -> bool {
        self.min_x == self.max_x && self.min_y == self.max_y
    }

    pub const fn is_ordered(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    pub const fn fits_within(&self, bounds: ImageBounds) -> bool {
        self.is_ordered() && self.max_x <= bounds.width && self.max_y <= bounds.height
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.min_x, self.min_y, self.max_x, self.max_y, self.label
        )
    }
}

impl FromStr for Region {
    type Err = RegionParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.splitn(COORDINATE_FIELDS.len() + 1, FIELD_DELIMITER);
        let mut coordinates = [0_u32; 4];
        for (slot, field) in coordinates.iter_mut().zip(COORDINATE_FIELDS) {
            let raw = fields
                .next()
                .ok_or(RegionParseError::MissingField { field })?;
            *slot = raw
                .trim()
                .parse::<u32>()
                .map_err(|_| RegionParseError::InvalidCoordinate {
                    field,
                    value: raw.to_string(),
                })?;
        }
        let label = fields
            .next()
            .ok_or(RegionParseError::MissingField { field: "label" })?;

        let [min_x, min_y, max_x, max_y] = coordinates;
        let region = Region::new(min_x, min_y, max_x, max_y, label);
        if !region.is_ordered() {
            return Err(RegionParseError::InvertedBounds {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok(region)
    }
}

/// Key of an image's region file: the base file name cut at its first dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(String);

impl ImageId {
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let base = match file_name.split('.').next() {
            Some(base) if !base.is_empty() => base,
            _ => path.file_stem()?.to_str()?,
        };
        (!base.is_empty()).then(|| Self(base.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_keeps_delimiters_inside_label() {
        let region: Region = "1,2,30,40,Shirt, blue - SKU1".parse().unwrap();
        assert_eq!(region, Region::new(1, 2, 30, 40, "Shirt, blue - SKU1"));
    }

    #[test]
    fn display_matches_line_format() {
        let region = Region::new(100, 0, 800, 100, "Shirt - SKU1");
        assert_eq!(region.to_string(), "100,0,800,100,Shirt - SKU1");
    }

    #[test]
    fn parse_rejects_non_numeric_coordinate() {
        let err = "abc,1,2,3,tag".parse::<Region>().unwrap_err();
        assert_eq!(
            err,
            RegionParseError::InvalidCoordinate {
                field: "min_x",
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn parse_rejects_negative_coordinate() {
        assert!(matches!(
            "1,-2,3,4,tag".parse::<Region>(),
            Err(RegionParseError::InvalidCoordinate { field: "min_y", .. })
        ));
    }

    #[test]
    fn parse_rejects_missing_label() {
        assert_eq!(
            "1,2,3,4".parse::<Region>().unwrap_err(),
            RegionParseError::MissingField { field: "label" }
        );
    }

    #[test]
    fn parse_rejects_inverted_bounds() {
        assert!(matches!(
            "10,2,3,4,tag".parse::<Region>(),
            Err(RegionParseError::InvertedBounds { .. })
        ));
    }

    #[test]
    fn degenerate_only_when_both_axes_collapse() {
        assert!(Region::new(5, 5, 5, 5, "t").is_degenerate());
        assert!(!Region::new(5, 5, 5, 9, "t").is_degenerate());
        assert!(!Region::new(5, 5, 9, 5, "t").is_degenerate());
    }

    #[test]
    fn image_id_strips_everything_after_first_dot() {
        let id = ImageId::from_path(&PathBuf::from("/photos/shirt.front.png")).unwrap();
        assert_eq!(id.as_str(), "shirt");
    }

    #[test]
    fn image_id_falls_back_to_stem_for_dot_files() {
        let id = ImageId::from_path(&PathBuf::from("/photos/.hidden.png")).unwrap();
        assert_eq!(id.as_str(), ".hidden");
    }

    #[test]
    fn image_id_requires_a_file_name() {
        assert_eq!(ImageId::from_path(&PathBuf::from("/")), None);
    }
}
