use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage};
use thiserror::Error;

use crate::geometry::ImageBounds;

pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 2] = ["png", "jpg"];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("not a file: {}", .path.display())]
    NotAFile { path: PathBuf },
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {} has zero width or height", .path.display())]
    EmptyImage { path: PathBuf },
    #[error("failed to read image folder {}: {source}", .path.display())]
    Folder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// An image handed to the session, either still on disk or already decoded.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Decoded { path: PathBuf, image: DynamicImage },
}

impl ImageSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Path(path) | Self::Decoded { path, .. } => path.as_path(),
        }
    }

    /// Decodes (if needed) into RGBA pixels. Done once, when the image is set.
    pub fn resolve(self) -> SourceResult<LoadedImage> {
        let (path, image) = match self {
            Self::Path(path) => {
                if !path.is_file() {
                    return Err(SourceError::NotAFile { path });
                }
                match image::open(&path) {
                    Ok(image) => (path, image),
                    Err(source) => return Err(SourceError::Decode { path, source }),
                }
            }
            Self::Decoded { path, image } => (path, image),
        };
        LoadedImage::new(path, image.to_rgba8())
    }
}

#[derive(Debug, Clone)]
pub struct LoadedImage {
    path: PathBuf,
    pixels: RgbaImage,
}

impl LoadedImage {
    pub fn new(path: PathBuf, pixels: RgbaImage) -> SourceResult<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(SourceError::EmptyImage { path });
        }
        Ok(Self { path, pixels })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn bounds(&self) -> ImageBounds {
        ImageBounds::new(self.width(), self.height())
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Images of one folder, sorted by file name, with wrap-around navigation.
#[derive(Debug, Clone, Default)]
pub struct ImageFolder {
    root: PathBuf,
    images: Vec<PathBuf>,
    cursor: usize,
}

impl ImageFolder {
    pub fn scan(root: &Path, extensions: &[String]) -> SourceResult<Self> {
        let folder_error = |source: io::Error| SourceError::Folder {
            path: root.to_path_buf(),
            source,
        };
        let mut images = Vec::new();
        for entry in fs::read_dir(root).map_err(folder_error)? {
            let path = entry.map_err(folder_error)?.path();
            if path.is_file() && has_image_extension(&path, extensions) {
                images.push(path);
            }
        }
        images.sort();
        tracing::info!(root = %root.display(), count = images.len(), "scanned image folder");
        Ok(Self::from_paths(root.to_path_buf(), images))
    }

    pub fn from_paths(root: PathBuf, images: Vec<PathBuf>) -> Self {
        Self {
            root,
            images,
            cursor: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn current(&self) -> Option<&Path> {
        self.images.get(self.cursor).map(PathBuf::as_path)
    }

    pub fn next(&mut self) -> Option<&Path> {
        self.step(1)
    }

    pub fn previous(&mut self) -> Option<&Path> {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> Option<&Path> {
        let len = isize::try_from(self.images.len()).ok().filter(|len| *len > 0)?;
        let cursor = isize::try_from(self.cursor).unwrap_or(0);
        self.cursor = usize::try_from((cursor + delta).rem_euclid(len)).unwrap_or(0);
        self.current()
    }
}

fn has_image_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(extension))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_extensions() -> Vec<String> {
        DEFAULT_IMAGE_EXTENSIONS
            .iter()
            .map(|extension| extension.to_string())
            .collect()
    }

    #[test]
    fn decoded_source_resolves_without_touching_disk() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(8, 4));
        let loaded = ImageSource::Decoded {
            path: PathBuf::from("/nowhere/frame.png"),
            image,
        }
        .resolve()
        .unwrap();
        assert_eq!(loaded.bounds(), ImageBounds::new(8, 4));
        assert_eq!(loaded.file_name(), "frame.png");
    }

    #[test]
    fn path_source_decodes_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shirt.png");
        RgbaImage::new(5, 3).save(&path).unwrap();

        let loaded = ImageSource::Path(path.clone()).resolve().unwrap();
        assert_eq!(loaded.bounds(), ImageBounds::new(5, 3));
        assert_eq!(loaded.path(), path.as_path());
    }

    #[test]
    fn missing_or_undecodable_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ImageSource::Path(dir.path().join("missing.png")).resolve(),
            Err(SourceError::NotAFile { .. })
        ));

        let garbage = dir.path().join("garbage.png");
        fs::write(&garbage, b"not an image").unwrap();
        assert!(matches!(
            ImageSource::Path(garbage).resolve(),
            Err(SourceError::Decode { .. })
        ));
    }

    #[test]
    fn empty_bitmap_is_rejected() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(0, 4));
        assert!(matches!(
            ImageSource::Decoded {
                path: PathBuf::from("empty.png"),
                image
            }
            .resolve(),
            Err(SourceError::EmptyImage { .. })
        ));
    }

    #[test]
    fn scan_keeps_configured_extensions_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jpg", "a.PNG", "notes.txt", "c.gif"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("d.png")).unwrap();

        let folder = ImageFolder::scan(dir.path(), &default_extensions()).unwrap();

        assert_eq!(folder.len(), 2);
        assert_eq!(folder.current(), Some(dir.path().join("a.PNG").as_path()));
    }

    #[test]
    fn navigation_wraps_in_both_directions() {
        let mut folder = ImageFolder::from_paths(
            PathBuf::from("/photos"),
            vec![
                PathBuf::from("/photos/a.png"),
                PathBuf::from("/photos/b.png"),
                PathBuf::from("/photos/c.png"),
            ],
        );

        assert_eq!(folder.previous(), Some(Path::new("/photos/c.png")));
        assert_eq!(folder.next(), Some(Path::new("/photos/a.png")));
        assert_eq!(folder.next(), Some(Path::new("/photos/b.png")));
    }

    #[test]
    fn navigation_on_empty_folder_yields_nothing() {
        let mut folder = ImageFolder::default();
        assert_eq!(folder.next(), None);
        assert_eq!(folder.previous(), None);
        assert!(folder.is_empty());
    }
}
