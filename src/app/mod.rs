//! GTK front-end: one window with the image canvas and a side panel.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use gtk4::gdk_pixbuf::Pixbuf;
use gtk4::prelude::*;
use gtk4::{Application, ApplicationWindow, Box as GtkBox, DrawingArea, Orientation};

use crate::catalog::TagCatalog;
use crate::config::{AppConfig, StartupArgs};
use crate::error::AppResult;
use crate::geometry::ViewPoint;
use crate::selection::GestureOutcome;
use crate::session::{AnnotationSession, CaptureOutcome, PointerOutcome};
use crate::source::ImageFolder;
use crate::storage::RegionStore;

mod canvas;
mod gestures;
mod panel;

use self::canvas::*;
use self::gestures::*;
use self::panel::*;

const APPLICATION_ID: &str = "com.github.regionselector.RegionSelector";
const WINDOW_TITLE: &str = "Image Region Selector";
const WINDOW_WIDTH: i32 = 1024;
const WINDOW_HEIGHT: i32 = 698;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FolderStep {
    Next,
    Previous,
}

impl FolderStep {
    fn from_key(key: gtk4::gdk::Key) -> Option<Self> {
        match key.to_lower() {
            gtk4::gdk::Key::e => Some(Self::Next),
            gtk4::gdk::Key::q => Some(Self::Previous),
            _ => None,
        }
    }
}

/// Widgets and shared state behind every signal handler of the main window.
#[derive(Clone)]
struct AnnotationRuntime {
    session: Rc<RefCell<AnnotationSession<RegionStore>>>,
    folder: Rc<RefCell<ImageFolder>>,
    catalog: Rc<TagCatalog>,
    canvas: DrawingArea,
    panel: SidePanelUi,
    pixbuf: Rc<RefCell<Option<Pixbuf>>>,
    /// Pointer position while a drag is in progress, for the rubber band.
    pointer: Rc<Cell<Option<ViewPoint>>>,
}

impl AnnotationRuntime {
    fn show_current_image(&self) {
        let current = self.folder.borrow().current().map(Path::to_path_buf);
        match current {
            Some(path) => self.show_image(&path),
            None => self.panel.set_status_text("No images to annotate."),
        }
    }

    fn step_image(&self, step: FolderStep) {
        let target = {
            let mut folder = self.folder.borrow_mut();
            let path = match step {
                FolderStep::Next => folder.next(),
                FolderStep::Previous => folder.previous(),
            };
            path.map(Path::to_path_buf)
        };
        if let Some(path) = target {
            self.show_image(&path);
        }
    }

    fn show_image(&self, path: &Path) {
        let result = self.session.borrow_mut().set_image_path(path);
        match result {
            Ok(()) => {
                let session = self.session.borrow();
                if let Some(image) = session.image() {
                    *self.pixbuf.borrow_mut() = pixbuf_from_image(image);
                    self.panel.set_image_name(&image.file_name());
                    self.panel.set_status_text(&format!(
                        "{} regions loaded.",
                        session.regions().len()
                    ));
                }
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "failed to open image; keeping previous");
                self.panel
                    .set_status_text(&format!("Could not open image: {err}"));
            }
        }
        self.canvas.queue_draw();
    }

    fn select_tag(&self, index: usize) {
        let Some(entry) = self.catalog.get(index) else {
            return;
        };
        let label = entry.label();
        self.panel.set_active_tag(&label);
        self.session.borrow_mut().set_tag(label);
    }

    fn pop_zoom(&self) {
        let popped = self.session.borrow_mut().pop_zoom();
        if popped {
            let depth = self.session.borrow().viewport().zoom_depth();
            self.panel.set_status_text(&format!("Zoom level {depth}."));
            self.canvas.queue_draw();
        }
    }

    fn report_pointer_outcome(&self, outcome: &PointerOutcome) {
        match outcome {
            PointerOutcome::Capture(CaptureOutcome::Stored(region)) => {
                self.panel
                    .set_status_text(&format!("Stored region {region}"));
            }
            PointerOutcome::Capture(CaptureOutcome::Failed(err)) => {
                self.panel
                    .set_status_text(&format!("Could not store region: {err}"));
            }
            PointerOutcome::Capture(CaptureOutcome::Discarded(_)) => {}
            PointerOutcome::Zoom(gesture) => self.report_gesture_outcome(*gesture),
        }
    }

    fn report_gesture_outcome(&self, outcome: GestureOutcome) {
        let depth = self.session.borrow().viewport().zoom_depth();
        match outcome {
            GestureOutcome::ZoomPushed(_) => self
                .panel
                .set_status_text(&format!("Zoom level {depth}.")),
            GestureOutcome::ZoomReset => self.panel.set_status_text("Zoom reset."),
            GestureOutcome::ZoomRejected | GestureOutcome::SelectionCompleted(_) => {}
        }
    }
}

pub struct App {
    config: AppConfig,
    args: StartupArgs,
}

impl App {
    pub fn new(config: AppConfig, args: StartupArgs) -> Self {
        Self { config, args }
    }

    pub fn start(&self) -> AppResult<()> {
        let store = self.region_store()?;
        tracing::info!(root = %store.root().display(), "region files directory");
        let catalog = match self.args.tags_file.as_deref() {
            Some(path) => TagCatalog::load(path)?,
            None => TagCatalog::default(),
        };
        let folder = match self.args.image_dir.as_deref() {
            Some(dir) => ImageFolder::scan(dir, &self.config.image_extensions)?,
            None => ImageFolder::default(),
        };

        let session = Rc::new(RefCell::new(AnnotationSession::new(
            store,
            self.config.aspect_mode,
            self.config.zoom_enabled,
        )));
        let folder = Rc::new(RefCell::new(folder));
        let catalog = Rc::new(catalog);

        let application = Application::new(
            Some(APPLICATION_ID),
            gtk4::gio::ApplicationFlags::NON_UNIQUE,
        );
        let activate_once = Rc::new(Cell::new(false));
        application.connect_activate(move |app| {
            if activate_once.replace(true) {
                tracing::debug!("ignoring duplicate gtk activate signal");
                return;
            }
            build_main_window(app, session.clone(), folder.clone(), catalog.clone());
        });

        // Pass only argv[0] to GTK so the folder and flags do not fail GTK parsing.
        let gtk_args = gtk_launch_args();
        application.run_with_args(&gtk_args);
        Ok(())
    }

    fn region_store(&self) -> AppResult<RegionStore> {
        let configured = self
            .args
            .regions_dir
            .clone()
            .or_else(|| self.config.regions_dir.clone());
        Ok(match configured {
            Some(root) => RegionStore::with_root(root),
            None => RegionStore::in_working_dir()?,
        })
    }
}

fn gtk_launch_args() -> Vec<String> {
    std::env::args().take(1).collect()
}

fn build_main_window(
    app: &Application,
    session: Rc<RefCell<AnnotationSession<RegionStore>>>,
    folder: Rc<RefCell<ImageFolder>>,
    catalog: Rc<TagCatalog>,
) {
    let window = ApplicationWindow::new(app);
    window.set_title(Some(WINDOW_TITLE));
    window.set_default_size(WINDOW_WIDTH, WINDOW_HEIGHT);

    let folder_name = folder.borrow().root().display().to_string();
    let has_images = !folder.borrow().is_empty();
    let panel = SidePanelUi::build(
        (!folder_name.is_empty()).then_some(folder_name.as_str()),
        &catalog,
    );
    panel.set_navigation_available(folder.borrow().len() > 1);

    let runtime = AnnotationRuntime {
        session,
        folder,
        catalog,
        canvas: build_image_canvas(),
        panel,
        pixbuf: Rc::new(RefCell::new(None)),
        pointer: Rc::new(Cell::new(None)),
    };
    configure_canvas(&runtime);
    connect_canvas_gestures(&runtime);
    connect_panel_actions(&runtime);
    connect_navigation_keys(&window, &runtime);

    let root = GtkBox::new(Orientation::Horizontal, 0);
    root.append(&runtime.canvas);
    root.append(&runtime.panel.root);
    window.set_child(Some(&root));

    if has_images {
        runtime.show_current_image();
    } else {
        runtime.panel.set_status_text("No images to annotate.");
    }
    tracing::info!("presenting main window");
    window.present();
}

fn connect_panel_actions(runtime: &AnnotationRuntime) {
    let next_runtime = runtime.clone();
    runtime.panel.next_button.connect_clicked(move |_| {
        next_runtime.step_image(FolderStep::Next);
    });

    let previous_runtime = runtime.clone();
    runtime.panel.previous_button.connect_clicked(move |_| {
        previous_runtime.step_image(FolderStep::Previous);
    });

    let tag_runtime = runtime.clone();
    runtime.panel.tag_list.connect_row_selected(move |_, row| {
        let Some(index) = row.and_then(|row| usize::try_from(row.index()).ok()) else {
            return;
        };
        tag_runtime.select_tag(index);
    });
}

fn connect_navigation_keys(window: &ApplicationWindow, runtime: &AnnotationRuntime) {
    let key_controller = gtk4::EventControllerKey::new();
    key_controller.set_propagation_phase(gtk4::PropagationPhase::Capture);
    let runtime = runtime.clone();
    key_controller.connect_key_pressed(move |_, key, _, modifier| {
        if modifier.intersects(
            gtk4::gdk::ModifierType::CONTROL_MASK
                | gtk4::gdk::ModifierType::ALT_MASK
                | gtk4::gdk::ModifierType::SUPER_MASK,
        ) {
            return gtk4::glib::Propagation::Proceed;
        }
        if key == gtk4::gdk::Key::BackSpace {
            runtime.pop_zoom();
            return gtk4::glib::Propagation::Stop;
        }
        let Some(step) = FolderStep::from_key(key) else {
            return gtk4::glib::Propagation::Proceed;
        };
        tracing::debug!(?step, "folder navigation shortcut");
        runtime.step_image(step);
        gtk4::glib::Propagation::Stop
    });
    window.add_controller(key_controller);
}
