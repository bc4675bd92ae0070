//! Press-drag-release gestures over the image canvas.
//!
//! The primary button captures a region candidate, the secondary button draws a
//! zoom box, and a secondary double-click resets the zoom. One gesture is
//! active at a time and only the button that started it can finish it.

use crate::geometry::{ImageBounds, ImagePoint, ViewPoint, ViewRect};
use crate::viewport::ViewportTransform;

const GDK_BUTTON_PRIMARY: u32 = 1;
const GDK_BUTTON_SECONDARY: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other(u32),
}

impl PointerButton {
    pub const fn from_button_number(button: u32) -> Self {
        match button {
            GDK_BUTTON_PRIMARY => Self::Primary,
            GDK_BUTTON_SECONDARY => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Selecting {
        start: ImagePoint,
    },
    Zooming {
        start: ImagePoint,
    },
}

/// Raw drag endpoints in image-space plus the image size they were captured against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionCandidate {
    pub start: ImagePoint,
    pub end: ImagePoint,
    pub image: ImageBounds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    SelectionCompleted(SelectionCandidate),
    ZoomPushed(ViewRect),
    ZoomRejected,
    ZoomReset,
}

#[derive(Debug, Clone)]
pub struct SelectionTool {
    state: GestureState,
    zoom_enabled: bool,
}

impl Default for SelectionTool {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SelectionTool {
    pub const fn new(zoom_enabled: bool) -> Self {
        Self {
            state: GestureState::Idle,
            zoom_enabled,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn zoom_enabled(&self) -> bool {
        self.zoom_enabled
    }

    pub fn next_state(
        &self,
        button: PointerButton,
        start: ImagePoint,
        has_image: bool,
    ) -> Option<GestureState> {
        if !has_image {
            return None;
        }
        match (self.state, button) {
            (GestureState::Idle, PointerButton::Primary) => Some(GestureState::Selecting { start }),
            (GestureState::Idle, PointerButton::Secondary) if self.zoom_enabled => {
                Some(GestureState::Zooming { start })
            }
            _ => None,
        }
    }

    /// Starts a gesture. Returns whether the press was accepted.
    pub fn press(
        &mut self,
        button: PointerButton,
        point: ViewPoint,
        viewport: &ViewportTransform,
    ) -> bool {
        let start = viewport.map_to_image_space(point);
        match self.next_state(button, start, viewport.has_image()) {
            Some(next) => {
                tracing::debug!(from = ?self.state, to = ?next, ?button, "gesture started");
                self.state = next;
                true
            }
            None => false,
        }
    }

    /// Finishes the active gesture when `button` is the one that started it.
    pub fn release(
        &mut self,
        button: PointerButton,
        point: ViewPoint,
        viewport: &mut ViewportTransform,
    ) -> Option<GestureOutcome> {
        let end = viewport.map_to_image_space(point);
        match (self.state, button) {
            (GestureState::Selecting { start }, PointerButton::Primary) => {
                self.state = GestureState::Idle;
                let image = viewport.image_bounds()?;
                Some(GestureOutcome::SelectionCompleted(SelectionCandidate {
                    start,
                    end,
                    image,
                }))
            }
            (GestureState::Zooming { start }, PointerButton::Secondary) => {
                self.state = GestureState::Idle;
                let drag = ViewRect::from_corners(start, end);
                let clipped = viewport
                    .current_view()
                    .and_then(|view| view.intersected(&drag));
                match clipped {
                    Some(rect) if viewport.push_zoom(rect) => Some(GestureOutcome::ZoomPushed(rect)),
                    _ => Some(GestureOutcome::ZoomRejected),
                }
            }
            (state, button) => {
                if state != GestureState::Idle {
                    tracing::debug!(?state, ?button, "ignoring release of non-initiating button");
                }
                None
            }
        }
    }

    pub fn double_click(
        &mut self,
        button: PointerButton,
        viewport: &mut ViewportTransform,
    ) -> Option<GestureOutcome> {
        if button != PointerButton::Secondary || !self.zoom_enabled || !viewport.has_image() {
            return None;
        }
        viewport.reset_zoom();
        Some(GestureOutcome::ZoomReset)
    }

    /// The rectangle being dragged, in image-space, while a gesture is active.
    pub fn rubber_band(&self, point: ViewPoint, viewport: &ViewportTransform) -> Option<ViewRect> {
        let start = match self.state {
            GestureState::Idle => return None,
            GestureState::Selecting { start } | GestureState::Zooming { start } => start,
        };
        Some(ViewRect::from_corners(
            start,
            viewport.map_to_image_space(point),
        ))
    }
}
