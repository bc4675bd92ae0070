use gtk4::gdk::prelude::GdkCairoContextExt;
use gtk4::gdk_pixbuf::{Colorspace, Pixbuf};
use gtk4::prelude::*;
use gtk4::{cairo, glib, DrawingArea};

use crate::geometry::{ImagePoint, ViewRect, ViewportSize};
use crate::source::LoadedImage;
use crate::viewport::ViewportTransform;

use super::AnnotationRuntime;

const BACKGROUND_RGB: (f64, f64, f64) = (0.12, 0.12, 0.13);
const OVERLAY_RGB: (f64, f64, f64) = (0.9, 0.1, 0.1);
const RUBBER_BAND_RGB: (f64, f64, f64) = (0.2, 0.6, 1.0);
const OVERLAY_LINE_WIDTH: f64 = 2.0;
const RUBBER_BAND_DASH: [f64; 2] = [6.0, 4.0];

/// Wraps decoded RGBA pixels for cairo painting. `None` for bitmaps wider than `i32::MAX / 4`.
pub(super) fn pixbuf_from_image(image: &LoadedImage) -> Option<Pixbuf> {
    let pixels = image.pixels();
    let width = i32::try_from(pixels.width()).ok()?;
    let height = i32::try_from(pixels.height()).ok()?;
    let rowstride = width.checked_mul(4)?;
    let bytes = glib::Bytes::from_owned(pixels.as_raw().clone());
    Some(Pixbuf::from_bytes(
        &bytes,
        Colorspace::Rgb,
        true,
        8,
        width,
        height,
        rowstride,
    ))
}

pub(super) fn build_image_canvas() -> DrawingArea {
    let canvas = DrawingArea::new();
    canvas.set_hexpand(true);
    canvas.set_vexpand(true);
    canvas.set_focusable(true);
    canvas
}

pub(super) fn configure_canvas(runtime: &AnnotationRuntime) {
    let draw_runtime = runtime.clone();
    runtime
        .canvas
        .set_draw_func(move |_, context, width, height| {
            draw_canvas(&draw_runtime, context, width, height);
        });

    let resize_runtime = runtime.clone();
    runtime.canvas.connect_resize(move |canvas, width, height| {
        resize_runtime
            .session
            .borrow_mut()
            .resize(ViewportSize::new(f64::from(width), f64::from(height)));
        canvas.queue_draw();
    });
}

fn draw_canvas(runtime: &AnnotationRuntime, context: &cairo::Context, width: i32, height: i32) {
    if width <= 0 || height <= 0 {
        return;
    }
    let (r, g, b) = BACKGROUND_RGB;
    context.set_source_rgb(r, g, b);
    context.paint().ok();

    let pixbuf = runtime.pixbuf.borrow();
    let Some(pixbuf) = pixbuf.as_ref() else {
        return;
    };
    let session = runtime.session.borrow();
    let viewport = session.viewport();
    let transform = viewport.transform();

    context.save().ok();
    context.translate(transform.offset_x, transform.offset_y);
    context.scale(transform.scale_x, transform.scale_y);
    context.set_source_pixbuf(pixbuf, 0.0, 0.0);
    context.paint().ok();
    context.restore().ok();

    let (r, g, b) = OVERLAY_RGB;
    context.set_source_rgb(r, g, b);
    context.set_line_width(OVERLAY_LINE_WIDTH);
    for overlay in session.overlays() {
        stroke_view_rect(context, image_rect_to_view(viewport, overlay.rect));
    }

    let band = runtime
        .pointer
        .get()
        .and_then(|point| session.rubber_band(point));
    if let Some(band) = band {
        let (r, g, b) = RUBBER_BAND_RGB;
        context.set_source_rgb(r, g, b);
        context.set_dash(&RUBBER_BAND_DASH, 0.0);
        stroke_view_rect(context, image_rect_to_view(viewport, band));
        context.set_dash(&[], 0.0);
    }
}

fn image_rect_to_view(viewport: &ViewportTransform, rect: ViewRect) -> ViewRect {
    let top_left = viewport.map_to_view_space(ImagePoint::new(rect.x, rect.y));
    let bottom_right = viewport.map_to_view_space(ImagePoint::new(rect.right(), rect.bottom()));
    ViewRect::new(
        top_left.x,
        top_left.y,
        bottom_right.x - top_left.x,
        bottom_right.y - top_left.y,
    )
}

fn stroke_view_rect(context: &cairo::Context, rect: ViewRect) {
    context.rectangle(rect.x, rect.y, rect.width, rect.height);
    context.stroke().ok();
}
