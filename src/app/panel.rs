use gtk4::prelude::*;
use gtk4::{Align, Box as GtkBox, Button, Label, ListBox, Orientation, ScrolledWindow, SelectionMode};

use crate::catalog::TagCatalog;

const PANEL_SPACING: i32 = 8;
const PANEL_MARGIN: i32 = 12;
const NO_VALUE: &str = "-";

#[derive(Clone)]
pub(super) struct SidePanelUi {
    pub(super) root: GtkBox,
    pub(super) image_label: Label,
    pub(super) tag_label: Label,
    pub(super) status_label: Label,
    pub(super) previous_button: Button,
    pub(super) next_button: Button,
    pub(super) tag_list: ListBox,
}

impl SidePanelUi {
    pub(super) fn build(folder: Option<&str>, catalog: &TagCatalog) -> Self {
        let root = GtkBox::new(Orientation::Vertical, PANEL_SPACING);
        root.set_margin_top(PANEL_MARGIN);
        root.set_margin_bottom(PANEL_MARGIN);
        root.set_margin_start(PANEL_MARGIN);
        root.set_margin_end(PANEL_MARGIN);
        root.set_width_request(280);

        let folder_label = Label::new(Some(folder.unwrap_or("No folder selected")));
        let image_label = Label::new(Some(NO_VALUE));
        let tag_label = Label::new(Some(NO_VALUE));
        let status_label = Label::new(Some("Ready."));
        status_label.set_wrap(true);
        status_label.set_xalign(0.0);

        root.append(&panel_section_title("Images"));
        root.append(&panel_kv_row("Folder", &folder_label));
        root.append(&panel_kv_row("Image", &image_label));

        let previous_button = Button::with_label("<<");
        let next_button = Button::with_label(">>");
        previous_button.set_tooltip_text(Some("Previous image (Q)"));
        next_button.set_tooltip_text(Some("Next image (E)"));
        let navigation_row = GtkBox::new(Orientation::Horizontal, PANEL_SPACING);
        navigation_row.set_homogeneous(true);
        navigation_row.append(&previous_button);
        navigation_row.append(&next_button);
        root.append(&navigation_row);

        root.append(&panel_section_title("Tags"));
        root.append(&panel_kv_row("Active", &tag_label));

        let tag_list = ListBox::new();
        tag_list.set_selection_mode(SelectionMode::Single);
        for entry in catalog.entries() {
            let row_label = Label::new(Some(&entry.label()));
            row_label.set_halign(Align::Start);
            row_label.set_xalign(0.0);
            tag_list.append(&row_label);
        }
        let tag_scroller = ScrolledWindow::new();
        tag_scroller.set_vexpand(true);
        tag_scroller.set_child(Some(&tag_list));
        root.append(&tag_scroller);

        root.append(&status_label);

        Self {
            root,
            image_label,
            tag_label,
            status_label,
            previous_button,
            next_button,
            tag_list,
        }
    }

    pub(super) fn set_status_text(&self, message: &str) {
        self.status_label.set_text(message);
    }

    pub(super) fn set_image_name(&self, name: &str) {
        self.image_label.set_text(name);
    }

    pub(super) fn set_active_tag(&self, label: &str) {
        self.tag_label
            .set_text(if label.is_empty() { NO_VALUE } else { label });
    }

    pub(super) fn set_navigation_available(&self, available: bool) {
        self.previous_button.set_sensitive(available);
        self.next_button.set_sensitive(available);
    }
}

fn panel_kv_row(key: &str, value_label: &Label) -> GtkBox {
    let key_label = Label::new(Some(key));
    key_label.set_halign(Align::Start);
    key_label.set_xalign(0.0);

    value_label.set_halign(Align::Start);
    value_label.set_xalign(0.0);
    value_label.set_hexpand(true);
    value_label.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);

    let row = GtkBox::new(Orientation::Horizontal, PANEL_SPACING);
    row.append(&key_label);
    row.append(value_label);
    row
}

fn panel_section_title(text: &str) -> Label {
    let label = Label::new(None);
    label.set_markup(&format!("<b>{}</b>", gtk4::glib::markup_escape_text(text)));
    label.set_halign(Align::Start);
    label.set_xalign(0.0);
    label
}
