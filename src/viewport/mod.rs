//! View-to-image coordinate mapping and the zoom stack.

use serde::Deserialize;

use crate::geometry::{ImageBounds, ImagePoint, ViewPoint, ViewRect, ViewportSize};

/// How the full image extent is fitted into the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectMode {
    /// Uniform scale, centred, letterboxed on the short axis.
    #[default]
    Keep,
    /// Independent horizontal and vertical scale filling the viewport.
    Ignore,
}

/// Affine mapping `view = image * scale + offset`, per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl FitTransform {
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Fits `rect` into a viewport of `size`, centring it when the aspect ratio is kept.
    pub fn fit(rect: ViewRect, size: ViewportSize, mode: AspectMode) -> Self {
        if !rect.is_valid() {
            return Self::IDENTITY;
        }
        let view_width = size.width.max(1.0);
        let view_height = size.height.max(1.0);
        let (scale_x, scale_y) = match mode {
            AspectMode::Ignore => (view_width / rect.width, view_height / rect.height),
            AspectMode::Keep => {
                let scale = (view_width / rect.width).min(view_height / rect.height);
                (scale, scale)
            }
        };
        let offset_x = (view_width - rect.width * scale_x) / 2.0 - rect.x * scale_x;
        let offset_y = (view_height - rect.height * scale_y) / 2.0 - rect.y * scale_y;
        Self {
            scale_x,
            scale_y,
            offset_x,
            offset_y,
        }
    }

    pub fn to_image(&self, point: ViewPoint) -> ImagePoint {
        ImagePoint::new(
            (point.x - self.offset_x) / self.scale_x,
            (point.y - self.offset_y) / self.scale_y,
        )
    }

    pub fn to_view(&self, point: ImagePoint) -> ViewPoint {
        ViewPoint::new(
            point.x * self.scale_x + self.offset_x,
            point.y * self.scale_y + self.offset_y,
        )
    }
}

#[derive(Debug, Clone)]
pub struct ViewportTransform {
    image: Option<ImageBounds>,
    size: ViewportSize,
    aspect_mode: AspectMode,
    zoom_stack: Vec<ViewRect>,
    transform: FitTransform,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::new(AspectMode::default())
    }
}

impl ViewportTransform {
    pub fn new(aspect_mode: AspectMode) -> Self {
        Self {
            image: None,
            size: ViewportSize::default(),
            aspect_mode,
            zoom_stack: Vec::new(),
            transform: FitTransform::IDENTITY,
        }
    }

    pub fn aspect_mode(&self) -> AspectMode {
        self.aspect_mode
    }

    pub fn image_bounds(&self) -> Option<ImageBounds> {
        self.image
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    pub fn transform(&self) -> FitTransform {
        self.transform
    }

    pub fn zoom_stack(&self) -> &[ViewRect] {
        &self.zoom_stack
    }

    pub fn zoom_depth(&self) -> usize {
        self.zoom_stack.len()
    }

    /// Swaps the image; zoom entries that no longer fit inside it are discarded.
    pub fn set_image(&mut self, bounds: ImageBounds) {
        self.image = Some(bounds);
        self.update();
    }

    /// The extent currently displayed: top of the zoom stack, or the full image.
    pub fn current_view(&self) -> Option<ViewRect> {
        let full = self.image?.full_rect();
        Some(self.zoom_stack.last().copied().unwrap_or(full))
    }

    pub fn map_to_image_space(&self, point: ViewPoint) -> ImagePoint {
        self.transform.to_image(point)
    }

    pub fn map_to_view_space(&self, point: ImagePoint) -> ViewPoint {
        self.transform.to_view(point)
    }

    /// Pushes `rect` clipped to the current view. Returns whether the stack grew.
    pub fn push_zoom(&mut self, rect: ViewRect) -> bool {
        let Some(current) = self.current_view() else {
            return false;
        };
        let Some(clipped) = current.intersected(&rect) else {
            tracing::debug!(?rect, "ignoring degenerate zoom box");
            return false;
        };
        if clipped == current {
            tracing::debug!(?rect, "zoom box equals current view");
            return false;
        }
        self.zoom_stack.push(clipped);
        self.update();
        tracing::debug!(depth = self.zoom_stack.len(), view = ?clipped, "zoomed in");
        true
    }

    /// Steps back one zoom level. Returns whether anything was popped.
    pub fn pop_zoom(&mut self) -> bool {
        let popped = self.zoom_stack.pop().is_some();
        if popped {
            self.update();
        }
        popped
    }

    pub fn reset_zoom(&mut self) {
        self.zoom_stack.clear();
        self.update();
    }

    /// Re-fits the current view into a viewport of `size`; the zoom stack is left as is.
    pub fn on_resize(&mut self, size: ViewportSize) {
        self.size = size;
        self.update();
    }

    fn update(&mut self) {
        let Some(image) = self.image else {
            self.zoom_stack.clear();
            self.transform = FitTransform::IDENTITY;
            return;
        };
        let full = image.full_rect();
        match self.zoom_stack.last().copied() {
            Some(top) if top.is_valid() && full.contains_rect(&top) => {
                self.transform = FitTransform::fit(top, self.size, AspectMode::Ignore);
            }
            stale => {
                if stale.is_some() {
                    tracing::debug!(
                        depth = self.zoom_stack.len(),
                        "discarding zoom stack outside image bounds"
                    );
                }
                self.zoom_stack.clear();
                self.transform = FitTransform::fit(full, self.size, self.aspect_mode);
            }
        }
    }
}
