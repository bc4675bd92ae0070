use std::cell::Cell;
use std::rc::Rc;

use gtk4::prelude::*;

use crate::geometry::ViewPoint;
use crate::selection::PointerButton;

use super::AnnotationRuntime;

const ANY_BUTTON: u32 = 0;
const DOUBLE_CLICK: i32 = 2;

#[derive(Clone)]
struct CanvasDragContext {
    runtime: AnnotationRuntime,
    button: Rc<Cell<PointerButton>>,
    origin: Rc<Cell<ViewPoint>>,
}

impl CanvasDragContext {
    fn point_at(&self, offset_x: f64, offset_y: f64) -> ViewPoint {
        let origin = self.origin.get();
        ViewPoint::new(origin.x + offset_x, origin.y + offset_y)
    }
}

pub(super) fn connect_canvas_gestures(runtime: &AnnotationRuntime) {
    let drag_gesture = connect_canvas_drag_gesture(CanvasDragContext {
        runtime: runtime.clone(),
        button: Rc::new(Cell::new(PointerButton::Other(ANY_BUTTON))),
        origin: Rc::new(Cell::new(ViewPoint::new(0.0, 0.0))),
    });
    connect_zoom_reset_gesture(runtime.clone(), &drag_gesture);
}

fn connect_canvas_drag_gesture(context: CanvasDragContext) -> gtk4::GestureDrag {
    let drag_gesture = gtk4::GestureDrag::new();
    drag_gesture.set_button(ANY_BUTTON);

    let begin_context = context.clone();
    drag_gesture.connect_drag_begin(move |gesture, start_x, start_y| {
        handle_drag_begin(&begin_context, gesture, start_x, start_y);
    });

    let update_context = context.clone();
    drag_gesture.connect_drag_update(move |_, offset_x, offset_y| {
        let point = update_context.point_at(offset_x, offset_y);
        update_context.runtime.pointer.set(Some(point));
        update_context.runtime.canvas.queue_draw();
    });

    let end_context = context.clone();
    drag_gesture.connect_drag_end(move |_, offset_x, offset_y| {
        handle_drag_end(&end_context, offset_x, offset_y);
    });

    context.runtime.canvas.add_controller(drag_gesture.clone());
    drag_gesture
}

fn handle_drag_begin(
    context: &CanvasDragContext,
    gesture: &gtk4::GestureDrag,
    start_x: f64,
    start_y: f64,
) {
    let button = PointerButton::from_button_number(gesture.current_button());
    let start = ViewPoint::new(start_x, start_y);
    if !context.runtime.session.borrow_mut().press(button, start) {
        gesture.set_state(gtk4::EventSequenceState::Denied);
        return;
    }
    gesture.set_state(gtk4::EventSequenceState::Claimed);
    context.button.set(button);
    context.origin.set(start);
    context.runtime.pointer.set(Some(start));
    context.runtime.canvas.grab_focus();
}

fn handle_drag_end(context: &CanvasDragContext, offset_x: f64, offset_y: f64) {
    let point = context.point_at(offset_x, offset_y);
    context.runtime.pointer.set(None);
    let outcome = context
        .runtime
        .session
        .borrow_mut()
        .release(context.button.get(), point);
    if let Some(outcome) = outcome {
        context.runtime.report_pointer_outcome(&outcome);
    }
    context.runtime.canvas.queue_draw();
}

/// Grouped with the drag gesture so claimed secondary presses still reach the
/// press counter.
fn connect_zoom_reset_gesture(runtime: AnnotationRuntime, drag_gesture: &gtk4::GestureDrag) {
    let click_gesture = gtk4::GestureClick::new();
    click_gesture.set_button(gtk4::gdk::BUTTON_SECONDARY);
    let canvas = runtime.canvas.clone();
    click_gesture.connect_pressed(move |_, n_press, _, _| {
        if !is_double_click(n_press) {
            return;
        }
        let outcome = runtime
            .session
            .borrow_mut()
            .double_click(PointerButton::Secondary);
        if let Some(outcome) = outcome {
            runtime.report_gesture_outcome(outcome);
            runtime.canvas.queue_draw();
        }
    });
    canvas.add_controller(click_gesture.clone());
    click_gesture.group_with(drag_gesture);
}

fn is_double_click(n_press: i32) -> bool {
    n_press == DOUBLE_CLICK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_second_press_counts_as_double_click() {
        assert!(!is_double_click(1));
        assert!(is_double_click(DOUBLE_CLICK));
        assert!(!is_double_click(3));
    }
}
