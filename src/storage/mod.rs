use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::geometry::ImageBounds;
use crate::region::{ImageId, Region};
use thiserror::Error;

pub const DEFAULT_REGIONS_SUBDIR: &str = "regions";
const REGION_FILE_EXTENSION: &str = "txt";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("region has zero area: {region}")]
    DegenerateRegion { region: Region },
    #[error("region {region} lies outside image bounds {width}x{height}")]
    OutOfBounds {
        region: Region,
        width: u32,
        height: u32,
    },
    #[error("region label must be non-empty and fit on one line: {label:?}")]
    InvalidLabel { label: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Regions read from one region file, plus how many lines were skipped as malformed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub regions: Vec<Region>,
    pub skipped_lines: usize,
}

pub trait RegionStorage {
    fn load_report(&self, image_id: &ImageId) -> StorageResult<LoadReport>;
    fn append(&self, image_id: &ImageId, region: &Region, bounds: ImageBounds)
        -> StorageResult<()>;

    fn load(&self, image_id: &ImageId) -> StorageResult<Vec<Region>> {
        self.load_report(image_id).map(|report| report.regions)
    }
}

/// Append-only region files, one `<image id>.txt` per image under a single directory.
#[derive(Debug, Clone)]
pub struct RegionStore {
    root: PathBuf,
}

impl RegionStore {
    pub const fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// `regions/` under the current working directory.
    pub fn in_working_dir() -> StorageResult<Self> {
        let mut root = std::env::current_dir()?;
        root.push(DEFAULT_REGIONS_SUBDIR);
        Ok(Self::with_root(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, image_id: &ImageId) -> PathBuf {
        let mut path = self.root.clone();
        path.push(format!("{}.{REGION_FILE_EXTENSION}", image_id.as_str()));
        path
    }

    pub fn load_report(&self, image_id: &ImageId) -> StorageResult<LoadReport> {
        let path = self.path_for(image_id);
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(LoadReport::default());
            }
            Err(err) => return Err(StorageError::Io(err)),
        };
        Ok(parse_region_lines(&contents, &path))
    }

    pub fn append(
        &self,
        image_id: &ImageId,
        region: &Region,
        bounds: ImageBounds,
    ) -> StorageResult<()> {
        validate_region(region, bounds)?;

        fs::create_dir_all(&self.root)?;
        let path = self.path_for(image_id);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{region}")?;
        file.flush()?;

        tracing::debug!(path = %path.display(), %region, "appended region line");
        Ok(())
    }
}

impl RegionStorage for RegionStore {
    fn load_report(&self, image_id: &ImageId) -> StorageResult<LoadReport> {
        self.load_report(image_id)
    }

    fn append(
        &self,
        image_id: &ImageId,
        region: &Region,
        bounds: ImageBounds,
    ) -> StorageResult<()> {
        self.append(image_id, region, bounds)
    }
}

fn validate_region(region: &Region, bounds: ImageBounds) -> StorageResult<()> {
    if region.is_degenerate() {
        return Err(StorageError::DegenerateRegion {
            region: region.clone(),
        });
    }
    if !region.fits_within(bounds) {
        return Err(StorageError::OutOfBounds {
            region: region.clone(),
            width: bounds.width,
            height: bounds.height,
        });
    }
    if region.label.is_empty() || region.label.contains(['\n', '\r']) {
        return Err(StorageError::InvalidLabel {
            label: region.label.clone(),
        });
    }
    Ok(())
}

fn parse_region_lines(contents: &[u8], path: &Path) -> LoadReport {
    let mut report = LoadReport::default();
    for (index, raw_line) in contents.split(|byte| *byte == b'\n').enumerate() {
        let raw_line = raw_line.strip_suffix(b"\r").unwrap_or(raw_line);
        if raw_line.is_empty() {
            continue;
        }
        let parsed = std::str::from_utf8(raw_line)
            .map_err(|err| err.to_string())
            .and_then(|line| line.parse::<Region>().map_err(|err| err.to_string()));
        match parsed {
            Ok(region) => report.regions.push(region),
            Err(err) => {
                report.skipped_lines += 1;
                tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    %err,
                    "skipping malformed region line"
                );
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_id(name: &str) -> ImageId {
        ImageId::from_path(Path::new(name)).expect("image id")
    }

    #[test]
    fn path_for_uses_image_id_and_txt_extension() {
        let store = RegionStore::with_root(PathBuf::from("/work/regions"));
        assert_eq!(
            store.path_for(&image_id("/photos/shirt.png")),
            PathBuf::from("/work/regions/shirt.txt")
        );
    }

    #[test]
    fn load_returns_empty_when_region_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::with_root(dir.path().join("regions"));
        assert!(store.load(&image_id("missing.png")).unwrap().is_empty());
    }

    #[test]
    fn load_skips_malformed_lines_and_keeps_valid_ones() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::with_root(dir.path().to_path_buf());
        let id = image_id("shirt.png");
        fs::write(
            store.path_for(&id),
            "1,2,3,4,Shirt - SKU1\nabc,1,2,3,tag\n\n10,20,30,40,Hat - SKU2\r\n",
        )
        .unwrap();

        let report = store.load_report(&id).unwrap();
        assert_eq!(report.skipped_lines, 1);
        assert_eq!(
            report.regions,
            vec![
                Region::new(1, 2, 3, 4, "Shirt - SKU1"),
                Region::new(10, 20, 30, 40, "Hat - SKU2"),
            ]
        );
    }

    #[test]
    fn load_skips_lines_that_are_not_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::with_root(dir.path().to_path_buf());
        let id = image_id("shirt.png");
        fs::write(store.path_for(&id), b"1,2,3,4,ok\n5,6,7,8,\xff\xfe\n").unwrap();

        let report = store.load_report(&id).unwrap();
        assert_eq!(report.regions, vec![Region::new(1, 2, 3, 4, "ok")]);
        assert_eq!(report.skipped_lines, 1);
    }

    #[test]
    fn append_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::with_root(dir.path().join("nested").join("regions"));
        let id = image_id("shirt.png");
        let region = Region::new(100, 0, 800, 100, "Shirt - SKU1");

        store
            .append(&id, &region, ImageBounds::new(800, 600))
            .unwrap();

        assert_eq!(
            fs::read_to_string(store.path_for(&id)).unwrap(),
            "100,0,800,100,Shirt - SKU1\n"
        );
        assert_eq!(store.load(&id).unwrap(), vec![region]);
    }

    #[test]
    fn every_valid_region_in_small_image_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::with_root(dir.path().to_path_buf());
        let id = image_id("tile.png");
        let bounds = ImageBounds::new(4, 3);
        let labels = ["Shirt - SKU1", "Shirt, blue - SKU2", " padded - 3 "];

        let mut expected = Vec::new();
        for min_x in 0..=bounds.width {
            for max_x in min_x..=bounds.width {
                for min_y in 0..=bounds.height {
                    for max_y in min_y..=bounds.height {
                        let label = labels[expected.len() % labels.len()];
                        let region = Region::new(min_x, min_y, max_x, max_y, label);
                        if region.is_degenerate() {
                            continue;
                        }
                        store.append(&id, &region, bounds).unwrap();
                        expected.push(region);
                    }
                }
            }
        }

        let report = store.load_report(&id).unwrap();
        assert_eq!(report.skipped_lines, 0);
        assert_eq!(report.regions, expected);
        let contents = fs::read_to_string(store.path_for(&id)).unwrap();
        for (line, region) in contents.lines().zip(&expected) {
            assert_eq!(line, region.to_string());
        }
    }

    #[test]
    fn append_keeps_duplicates_in_completion_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::with_root(dir.path().to_path_buf());
        let id = image_id("shirt.png");
        let bounds = ImageBounds::new(100, 100);
        let first = Region::new(1, 1, 10, 10, "a - 1");
        let second = Region::new(5, 5, 20, 20, "b - 2");

        for region in [&first, &first, &second] {
            store.append(&id, region, bounds).unwrap();
        }

        assert_eq!(store.load(&id).unwrap(), vec![first.clone(), first, second]);
    }

    #[test]
    fn append_rejects_degenerate_region_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::with_root(dir.path().join("regions"));
        let id = image_id("shirt.png");

        let err = store
            .append(&id, &Region::new(7, 7, 7, 7, "t - 1"), ImageBounds::new(10, 10))
            .unwrap_err();

        assert!(matches!(err, StorageError::DegenerateRegion { .. }));
        assert!(!store.path_for(&id).exists());
    }

    #[test]
    fn append_rejects_region_outside_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::with_root(dir.path().to_path_buf());
        let err = store
            .append(
                &image_id("shirt.png"),
                &Region::new(0, 0, 801, 10, "t - 1"),
                ImageBounds::new(800, 600),
            )
            .unwrap_err();
        assert!(matches!(err, StorageError::OutOfBounds { width: 800, .. }));
    }

    #[test]
    fn append_rejects_multiline_label() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegionStore::with_root(dir.path().to_path_buf());
        let err = store
            .append(
                &image_id("shirt.png"),
                &Region::new(0, 0, 10, 10, "a\nb"),
                ImageBounds::new(800, 600),
            )
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidLabel { .. }));
    }
}
