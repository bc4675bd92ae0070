//! Per-window annotation state: current image, active label, loaded regions.
//!
//! The session owns the viewport, the selection tool and the region store.
//! Pointer events go through the selection tool first; a completed selection is
//! clamped to the image and appended to the store, after which the region list
//! is re-read from disk so the drawn overlays always mirror the file.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::geometry::{ImageBounds, ImagePoint, ViewPoint, ViewRect, ViewportSize};
use crate::region::{ImageId, Region};
use crate::selection::{GestureOutcome, PointerButton, SelectionCandidate, SelectionTool};
use crate::source::{ImageSource, LoadedImage, SourceError};
use crate::storage::{RegionStorage, StorageError};
use crate::viewport::{AspectMode, ViewportTransform};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("image path has no usable file name: {}", .path.display())]
    InvalidImageName { path: PathBuf },
    #[error(transparent)]
    Source(#[from] SourceError),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Why a completed selection did not produce a stored region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    NoImage,
    NoActiveTag,
    Degenerate,
}

#[derive(Debug)]
pub enum CaptureOutcome {
    Stored(Region),
    Discarded(DiscardReason),
    Failed(StorageError),
}

#[derive(Debug)]
pub enum PointerOutcome {
    Capture(CaptureOutcome),
    Zoom(GestureOutcome),
}

/// Integer pixel bounds of a selection after ordering and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl PixelBounds {
    /// Truncates both points to pixels, orders each axis and clamps into the image.
    pub fn clamped(start: ImagePoint, end: ImagePoint, image: ImageBounds) -> Self {
        let (min_x, max_x) = clamp_axis(start.x, end.x, image.width);
        let (min_y, max_y) = clamp_axis(start.y, end.y, image.height);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub const fn is_degenerate(&self) -> bool {
        self.min_x == self.max_x && self.min_y == self.max_y
    }

    pub fn with_label(self, label: impl Into<String>) -> Region {
        Region::new(self.min_x, self.min_y, self.max_x, self.max_y, label)
    }
}

fn clamp_axis(a: f64, b: f64, limit: u32) -> (u32, u32) {
    let (a, b) = (a as i64, b as i64);
    let clamp = |value: i64| u32::try_from(value.clamp(0, i64::from(limit))).unwrap_or(0);
    (clamp(a.min(b)), clamp(a.max(b)))
}

/// A stored region's outline in image-space, as drawn over the current image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionOverlay {
    pub rect: ViewRect,
}

impl From<&Region> for RegionOverlay {
    fn from(region: &Region) -> Self {
        Self {
            rect: ViewRect::new(
                f64::from(region.min_x),
                f64::from(region.min_y),
                f64::from(region.width()),
                f64::from(region.height()),
            ),
        }
    }
}

#[derive(Debug)]
pub struct AnnotationSession<S> {
    store: S,
    viewport: ViewportTransform,
    selection: SelectionTool,
    image: Option<LoadedImage>,
    image_id: Option<ImageId>,
    active_label: String,
    regions: Vec<Region>,
    overlays: Vec<RegionOverlay>,
}

impl<S: RegionStorage> AnnotationSession<S> {
    pub fn new(store: S, aspect_mode: AspectMode, zoom_enabled: bool) -> Self {
        Self {
            store,
            viewport: ViewportTransform::new(aspect_mode),
            selection: SelectionTool::new(zoom_enabled),
            image: None,
            image_id: None,
            active_label: String::new(),
            regions: Vec::new(),
            overlays: Vec::new(),
        }
    }

    pub fn viewport(&self) -> &ViewportTransform {
        &self.viewport
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    pub fn image_id(&self) -> Option<&ImageId> {
        self.image_id.as_ref()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn overlays(&self) -> &[RegionOverlay] {
        &self.overlays
    }

    pub fn active_label(&self) -> &str {
        &self.active_label
    }

    /// Replaces the current image. On failure the previous image stays in place.
    pub fn set_image(&mut self, source: ImageSource) -> SessionResult<()> {
        let image_id =
            ImageId::from_path(source.path()).ok_or_else(|| SessionError::InvalidImageName {
                path: source.path().to_path_buf(),
            })?;
        let image = source.resolve()?;

        tracing::info!(
            path = %image.path().display(),
            image_id = %image_id,
            width = image.width(),
            height = image.height(),
            "image set"
        );
        self.viewport.set_image(image.bounds());
        self.viewport.reset_zoom();
        self.image = Some(image);
        self.image_id = Some(image_id);
        self.reload_regions();
        Ok(())
    }

    pub fn set_image_path(&mut self, path: &Path) -> SessionResult<()> {
        self.set_image(ImageSource::Path(path.to_path_buf()))
    }

    pub fn set_tag(&mut self, label: impl Into<String>) {
        self.active_label = label.into();
        tracing::debug!(label = %self.active_label, "active tag changed");
    }

    /// Discards the previous overlays, then reads the current image's region file.
    pub fn reload_regions(&mut self) {
        self.regions.clear();
        self.overlays.clear();
        let Some(image_id) = self.image_id.as_ref() else {
            return;
        };
        match self.store.load_report(image_id) {
            Ok(report) => {
                tracing::debug!(
                    image_id = %image_id,
                    regions = report.regions.len(),
                    skipped = report.skipped_lines,
                    "loaded regions"
                );
                self.regions = report.regions;
            }
            Err(err) => {
                tracing::warn!(image_id = %image_id, %err, "failed to load regions; showing none");
            }
        }
        self.redraw();
    }

    fn redraw(&mut self) {
        self.overlays = self.regions.iter().map(RegionOverlay::from).collect();
    }

    pub fn on_selection_completed(&mut self, candidate: SelectionCandidate) -> CaptureOutcome {
        let Some(image_id) = self.image_id.clone() else {
            return CaptureOutcome::Discarded(DiscardReason::NoImage);
        };
        let bounds = PixelBounds::clamped(candidate.start, candidate.end, candidate.image);
        if self.active_label.is_empty() {
            tracing::debug!(?bounds, "no active tag; selection discarded");
            return CaptureOutcome::Discarded(DiscardReason::NoActiveTag);
        }
        if bounds.is_degenerate() {
            tracing::debug!(?bounds, "zero-area selection discarded");
            return CaptureOutcome::Discarded(DiscardReason::Degenerate);
        }

        let region = bounds.with_label(self.active_label.clone());
        if let Err(err) = self.store.append(&image_id, &region, candidate.image) {
            tracing::warn!(image_id = %image_id, %region, %err, "failed to store region");
            return CaptureOutcome::Failed(err);
        }
        tracing::info!(image_id = %image_id, %region, "region stored");
        self.reload_regions();
        CaptureOutcome::Stored(region)
    }

    pub fn press(&mut self, button: PointerButton, point: ViewPoint) -> bool {
        self.selection.press(button, point, &self.viewport)
    }

    pub fn release(&mut self, button: PointerButton, point: ViewPoint) -> Option<PointerOutcome> {
        match self.selection.release(button, point, &mut self.viewport)? {
            GestureOutcome::SelectionCompleted(candidate) => Some(PointerOutcome::Capture(
                self.on_selection_completed(candidate),
            )),
            zoom => Some(PointerOutcome::Zoom(zoom)),
        }
    }

    pub fn double_click(&mut self, button: PointerButton) -> Option<GestureOutcome> {
        self.selection.double_click(button, &mut self.viewport)
    }

    pub fn reset_zoom(&mut self) {
        self.viewport.reset_zoom();
    }

    /// Steps back one zoom level. Returns whether a level was removed.
    pub fn pop_zoom(&mut self) -> bool {
        self.viewport.pop_zoom()
    }

    pub fn resize(&mut self, size: ViewportSize) {
        self.viewport.on_resize(size);
    }

    /// In-progress drag rectangle in image-space, for preview drawing.
    pub fn rubber_band(&self, point: ViewPoint) -> Option<ViewRect> {
        self.selection.rubber_band(point, &self.viewport)
    }
}
