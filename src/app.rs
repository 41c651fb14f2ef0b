use std::time::Duration;

use eframe::egui;
use image::DynamicImage;

use crate::catalog::{CatalogStatus, ImageCatalog};
use crate::config::{AspectLock, BackendConfig, EditorOptions};
use crate::editor::{AnnotationEditor, EditorState, SaveOutcome};
use crate::model::{AnnotationSubmission, CropRect, CropUnit, ImageRef};
use crate::worker::{BackendWorker, Job, JobResult};

const EMPTY_CATALOG: &str =
    "Loading images or no images found in /images directory on the backend.";

// ── Notices ─────────────────────────────────────────────────────────────────

enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    fn color(&self) -> egui::Color32 {
        match self {
            Notice::Info(_) => egui::Color32::from_rgb(90, 200, 120),
            Notice::Error(_) => egui::Color32::from_rgb(230, 90, 80),
        }
    }

    fn text(&self) -> &str {
        match self {
            Notice::Info(s) | Notice::Error(s) => s,
        }
    }
}

struct LoadedImage {
    texture: egui::TextureHandle,
    natural: (u32, u32),
}

// ── App ─────────────────────────────────────────────────────────────────────

pub struct AnnotatorApp {
    config: BackendConfig,
    worker: BackendWorker,
    catalog: ImageCatalog,
    editor: AnnotationEditor,
    image: Option<LoadedImage>,
    image_error: Option<String>,
    notice: Option<Notice>,
}

impl AnnotatorApp {
    pub fn new(config: BackendConfig, mut worker: BackendWorker, options: EditorOptions) -> Self {
        worker.submit(Job::ListImages);
        Self {
            config,
            worker,
            catalog: ImageCatalog::new(),
            editor: AnnotationEditor::new(options),
            image: None,
            image_error: None,
            notice: None,
        }
    }

    fn select(&mut self, name: &str) {
        let Some(descriptor) = self.catalog.get(name).cloned() else {
            return;
        };
        let session = self.editor.select_image(&descriptor, &self.config);
        self.image = None;
        self.image_error = None;
        if let Some(s) = self.editor.session() {
            self.worker.submit(Job::LoadImage {
                session,
                url: s.display_url().to_string(),
            });
        }
    }

    fn save(&mut self) {
        match self.editor.begin_save() {
            Ok((session, submission)) => {
                self.worker.submit(Job::SaveAnnotation {
                    session,
                    submission,
                });
            }
            Err(e) => {
                log::warn!("Save refused: {}", e);
                self.notice = Some(Notice::Error(e.to_string()));
            }
        }
    }

    fn drain_results(&mut self, ctx: &egui::Context) {
        while let Some(result) = self.worker.poll() {
            match result {
                JobResult::Images(result) => self.catalog.apply(result),
                JobResult::ImageLoaded { session, result } => {
                    if !self.editor.is_current(session) {
                        log::debug!("Dropping image for replaced session {}", session);
                        continue;
                    }
                    match result {
                        Ok(img) => self.image = Some(load_texture(ctx, &img)),
                        Err(e) => self.image_error = Some(e.to_string()),
                    }
                }
                JobResult::Saved {
                    session,
                    submission,
                    result,
                } => {
                    let outcome = self.editor.finish_save(session, submission, result);
                    self.notice = Some(save_notice(outcome));
                }
            }
        }
    }

    fn catalog_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Select an Image:");
        ui.separator();

        if self.catalog.is_empty() {
            let msg = match self.catalog.status() {
                CatalogStatus::Loading => "Loading images…",
                CatalogStatus::Loaded | CatalogStatus::Failed(_) => EMPTY_CATALOG,
            };
            ui.label(msg);
            return;
        }

        let selected = self.editor.session().map(|s| s.image().name.clone());
        let mut clicked = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for img in self.catalog.images() {
                let is_selected = selected.as_deref() == Some(img.name.as_str());
                if ui.selectable_label(is_selected, &img.name).clicked() {
                    clicked = Some(img.name.clone());
                }
            }
        });
        if let Some(name) = clicked {
            self.select(&name);
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas_rect = response.rect;
        painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

        let placeholder = |text: &str| {
            painter.text(
                canvas_rect.center(),
                egui::Align2::CENTER_CENTER,
                text,
                egui::FontId::proportional(18.0),
                egui::Color32::GRAY,
            );
        };

        if self.editor.session().is_none() {
            placeholder("Select an image to annotate");
            return;
        }
        if let Some(err) = &self.image_error {
            placeholder(&format!("Could not load image: {}", err));
            return;
        }
        let Some(loaded) = &self.image else {
            placeholder("Loading image…");
            return;
        };

        let img_rect = fit_rect(canvas_rect, loaded.natural);
        painter.image(
            loaded.texture.id(),
            img_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let has_ref = self
            .editor
            .session()
            .is_some_and(|s| s.image_ref().is_some());
        if has_ref {
            self.editor
                .on_display_resized(img_rect.width(), img_rect.height());
        } else {
            self.editor.on_image_loaded(ImageRef::new(
                loaded.natural.0,
                loaded.natural.1,
                img_rect.width(),
                img_rect.height(),
            ));
        }

        // Gestures, in display pixels relative to the image's top-left corner
        let local = |p: egui::Pos2| (p.x - img_rect.min.x, p.y - img_rect.min.y);
        let pointer = response
            .interact_pointer_pos()
            .or(ctx.input(|i| i.pointer.latest_pos()));

        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(pos) = pointer.filter(|p| img_rect.contains(*p)) {
                self.editor.drag_start(local(pos));
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = pointer {
                self.editor.drag_move(local(pos));
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            match pointer {
                Some(pos) => self.editor.drag_release(local(pos)),
                None => self.editor.drag_finish(),
            };
        }

        // Overlay
        let Some(session) = self.editor.session() else {
            return;
        };
        let Some(image_ref) = session.image_ref() else {
            return;
        };
        let (crop, color) = match self.editor.state() {
            EditorState::Dragging => (session.live_crop(), egui::Color32::from_rgb(255, 200, 0)),
            EditorState::Completed | EditorState::Submitting => (
                session.completed_crop(),
                egui::Color32::from_rgb(0, 120, 255),
            ),
            EditorState::Viewing | EditorState::NoSelection => (None, egui::Color32::WHITE),
        };
        if let Some(crop) = crop {
            let rect = crop_to_screen(img_rect, &crop.to_pixels(image_ref));
            painter.rect_filled(rect, 0.0, color.gamma_multiply(0.15));
            painter.rect_stroke(
                rect,
                0.0,
                egui::Stroke::new(2.0, color),
                egui::StrokeKind::Middle,
            );
        }
    }

    fn status_panel(&mut self, ui: &mut egui::Ui) {
        if let Some(session) = self.editor.session() {
            if let Some(crop) = session.completed_crop() {
                ui.label(egui::RichText::new("Preview (Cropped Area Coordinates):").strong());
                ui.label(crop_summary(crop));
            }
            if let Some(saved) = session.last_saved() {
                ui.weak(format!("Last saved: {}", box_summary(saved)));
            }
        }

        let mut dismiss = false;
        if let Some(notice) = &self.notice {
            ui.horizontal(|ui| {
                ui.colored_label(notice.color(), notice.text());
                if ui.small_button("Dismiss").clicked() {
                    dismiss = true;
                }
            });
        }
        if dismiss {
            self.notice = None;
        }
    }
}

fn load_texture(ctx: &egui::Context, img: &DynamicImage) -> LoadedImage {
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let pixels = rgba.as_flat_samples();
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
    LoadedImage {
        texture: ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR),
        natural: (rgba.width(), rgba.height()),
    }
}

/// Largest rect with the image's aspect that fits `area`, centered, never
/// upscaled past natural size.
fn fit_rect(area: egui::Rect, natural: (u32, u32)) -> egui::Rect {
    let (nw, nh) = (natural.0.max(1) as f32, natural.1.max(1) as f32);
    let scale = (area.width() / nw).min(area.height() / nh).min(1.0);
    egui::Rect::from_center_size(area.center(), egui::vec2(nw * scale, nh * scale))
}

fn box_summary(s: &AnnotationSubmission) -> String {
    format!(
        "X: {}, Y: {}, Width: {}, Height: {}",
        s.x, s.y, s.width, s.height
    )
}

fn crop_summary(crop: &CropRect) -> String {
    match crop.unit {
        CropUnit::Pixels => format!(
            "X: {}px, Y: {}px  Width: {}px, Height: {}px",
            crop.x.round(),
            crop.y.round(),
            crop.width.round(),
            crop.height.round()
        ),
        CropUnit::Percent => format!(
            "X: {:.1}%, Y: {:.1}%  Width: {:.1}%, Height: {:.1}%",
            crop.x, crop.y, crop.width, crop.height
        ),
    }
}

fn save_notice(outcome: SaveOutcome) -> Notice {
    match outcome {
        SaveOutcome::Saved(s) => Notice::Info(format!(
            "Bounding Box Saved (for {}): {}",
            s.image_name,
            box_summary(&s)
        )),
        SaveOutcome::Failed(e) => Notice::Error(e.to_string()),
        SaveOutcome::Stale { submission, result } => match result {
            Ok(_) => Notice::Info(format!(
                "Bounding Box Saved (for {}): {}",
                submission.image_name,
                box_summary(&submission)
            )),
            Err(e) => Notice::Error(format!(
                "Error saving annotation for {}: {}",
                submission.image_name, e
            )),
        },
    }
}

fn crop_to_screen(img_rect: egui::Rect, crop: &CropRect) -> egui::Rect {
    egui::Rect::from_min_size(
        img_rect.min + egui::vec2(crop.x, crop.y),
        egui::vec2(crop.width, crop.height),
    )
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for AnnotatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_results(ctx);

        let (save_pressed, dismiss_pressed) = ctx.input(|i| {
            (
                i.modifiers.command && i.key_pressed(egui::Key::S),
                i.key_pressed(egui::Key::Escape),
            )
        });
        if save_pressed {
            self.save();
        }
        if dismiss_pressed {
            self.notice = None;
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Image Annotator");
                ui.separator();
                ui.label("Aspect:");
                let mut aspect = self.editor.options().aspect;
                for lock in AspectLock::all() {
                    ui.selectable_value(&mut aspect, *lock, lock.label());
                }
                if aspect != self.editor.options().aspect {
                    self.editor.set_aspect(aspect);
                }
                ui.label("Units:");
                let mut unit = self.editor.options().unit;
                for u in CropUnit::all() {
                    ui.selectable_value(&mut unit, *u, u.label());
                }
                if unit != self.editor.options().unit {
                    self.editor.set_unit(unit);
                }
                ui.separator();
                let submitting = self.editor.state() == EditorState::Submitting;
                let has_selection = self.editor.state() != EditorState::NoSelection;
                if ui
                    .add_enabled(
                        has_selection && !submitting,
                        egui::Button::new("Save Bounding Box"),
                    )
                    .clicked()
                {
                    self.save();
                }
                if submitting {
                    ui.spinner();
                }
            });
        });

        egui::SidePanel::left("catalog")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| self.catalog_panel(ui));

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.canvas(ui, ctx));

        if self.worker.has_pending() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }
}
