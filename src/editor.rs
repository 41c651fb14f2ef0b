//! Annotation editor: one crop rectangle per selected image and the save
//! round-trip that turns it into a natural-pixel bounding box.
//!
//! All per-image state lives in an [`EditorSession`] that is replaced
//! wholesale on every selection, so nothing drawn on one image can leak into
//! the next. Each UI event maps to exactly one method on [`AnnotationEditor`].

use crate::backend::Backend;
use crate::config::{AspectLock, BackendConfig, EditorOptions};
use crate::error::{BackendError, SaveError};
use crate::model::{
    image_file_name, normalize, AnnotationSubmission, CropRect, CropUnit, ImageDescriptor,
    ImageRef,
};

pub type SessionId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorState {
    NoSelection,
    Viewing,
    Dragging,
    Completed,
    Submitting,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Viewing,
    Dragging { origin: (f32, f32) },
    Completed,
    Submitting,
}

/// Everything the editor knows about the currently selected image.
#[derive(Clone, Debug)]
pub struct EditorSession {
    id: SessionId,
    image: ImageDescriptor,
    display_url: String,
    image_ref: Option<ImageRef>,
    live_crop: Option<CropRect>,
    completed_crop: Option<CropRect>,
    phase: Phase,
    last_saved: Option<AnnotationSubmission>,
}

impl EditorSession {
    fn new(id: SessionId, image: ImageDescriptor, display_url: String) -> Self {
        Self {
            id,
            image,
            display_url,
            image_ref: None,
            live_crop: None,
            completed_crop: None,
            phase: Phase::Viewing,
            last_saved: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn image(&self) -> &ImageDescriptor {
        &self.image
    }

    pub fn display_url(&self) -> &str {
        &self.display_url
    }

    pub fn image_ref(&self) -> Option<&ImageRef> {
        self.image_ref.as_ref()
    }

    pub fn live_crop(&self) -> Option<&CropRect> {
        self.live_crop.as_ref()
    }

    pub fn completed_crop(&self) -> Option<&CropRect> {
        self.completed_crop.as_ref()
    }

    pub fn last_saved(&self) -> Option<&AnnotationSubmission> {
        self.last_saved.as_ref()
    }

    fn state(&self) -> EditorState {
        match self.phase {
            Phase::Viewing => EditorState::Viewing,
            Phase::Dragging { .. } => EditorState::Dragging,
            Phase::Completed => EditorState::Completed,
            Phase::Submitting => EditorState::Submitting,
        }
    }

    /// `None` until the image has been drawn; gestures need its bounds.
    fn drag_rect(
        &self,
        origin: (f32, f32),
        pointer: (f32, f32),
        options: &EditorOptions,
    ) -> Option<CropRect> {
        let image = self.image_ref.as_ref().filter(|i| i.is_ready())?;
        let rect = CropRect::from_drag(origin, pointer, options.aspect.ratio(), image);
        Some(rect.in_unit(options.unit, image))
    }
}

/// Result of applying a finished save request.
#[derive(Debug)]
pub enum SaveOutcome {
    Saved(AnnotationSubmission),
    Failed(SaveError),
    /// The request belonged to a session that has since been replaced; the
    /// current session was left untouched.
    Stale {
        submission: AnnotationSubmission,
        result: Result<serde_json::Value, BackendError>,
    },
}

impl SaveOutcome {
    pub fn into_result(self) -> Result<AnnotationSubmission, SaveError> {
        match self {
            SaveOutcome::Saved(submission) => Ok(submission),
            SaveOutcome::Failed(e) => Err(e),
            SaveOutcome::Stale { submission, result } => {
                result.map(|_| submission).map_err(Into::into)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct AnnotationEditor {
    session: Option<EditorSession>,
    next_id: SessionId,
    options: EditorOptions,
}

impl AnnotationEditor {
    pub fn new(options: EditorOptions) -> Self {
        Self {
            session: None,
            next_id: 0,
            options,
        }
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Applies to drags started after the change.
    pub fn set_aspect(&mut self, aspect: AspectLock) {
        self.options.aspect = aspect;
    }

    /// Applies to drags started after the change; an existing crop keeps its
    /// unit and still saves to the same box.
    pub fn set_unit(&mut self, unit: CropUnit) {
        self.options.unit = unit;
    }

    pub fn state(&self) -> EditorState {
        self.session
            .as_ref()
            .map_or(EditorState::NoSelection, EditorSession::state)
    }

    pub fn session(&self) -> Option<&EditorSession> {
        self.session.as_ref()
    }

    pub fn is_current(&self, id: SessionId) -> bool {
        self.session.as_ref().is_some_and(|s| s.id == id)
    }

    // ── Selection & Image ───────────────────────────────────────────────────

    /// Starts a fresh session for `image`, discarding any previous crop
    /// state unconditionally, including a save still in flight.
    pub fn select_image(&mut self, image: &ImageDescriptor, config: &BackendConfig) -> SessionId {
        self.next_id += 1;
        let id = self.next_id;
        let display_url = config.image_url(&image.name);
        log::info!("Selected {} ({})", image.name, display_url);
        self.session = Some(EditorSession::new(id, image.clone(), display_url));
        id
    }

    pub fn on_image_loaded(&mut self, image_ref: ImageRef) {
        if let Some(session) = self.session.as_mut() {
            log::debug!(
                "Image loaded: natural {}x{}, displayed {:.1}x{:.1}",
                image_ref.natural_width,
                image_ref.natural_height,
                image_ref.width,
                image_ref.height
            );
            session.image_ref = Some(image_ref);
        }
    }

    /// The image is now drawn at `width` x `height`; existing crops are scaled
    /// so they keep covering the same part of the image.
    pub fn on_display_resized(&mut self, width: f32, height: f32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(image) = session.image_ref.as_mut() else {
            return;
        };
        if width <= 0.0 || height <= 0.0 || (image.width == width && image.height == height) {
            return;
        }
        let from = (image.width, image.height);
        let to = (width, height);
        image.width = width;
        image.height = height;
        let image = *image;
        let rescale = |c: CropRect| c.rescaled(from, to).clamp_to(&image);
        session.live_crop = session.live_crop.map(rescale);
        session.completed_crop = session.completed_crop.map(rescale);
        if let Phase::Dragging { origin } = session.phase {
            if from.0 > 0.0 && from.1 > 0.0 {
                let origin = (origin.0 * to.0 / from.0, origin.1 * to.1 / from.1);
                session.phase = Phase::Dragging { origin };
            }
        }
    }

    // ── Drag Gesture ────────────────────────────────────────────────────────

    /// Points are in display pixels relative to the image's top-left corner.
    /// Returns false when the gesture is not accepted: no selection, the image
    /// has not been drawn yet, or a save is in flight.
    pub fn drag_start(&mut self, pos: (f32, f32)) -> bool {
        let options = self.options;
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.phase == Phase::Submitting {
            return false;
        }
        let Some(image) = session.image_ref.filter(|i| i.is_ready()) else {
            log::debug!("Ignoring drag on {}: image not loaded", session.image.name);
            return false;
        };
        let origin = (pos.0.clamp(0.0, image.width), pos.1.clamp(0.0, image.height));
        session.completed_crop = None;
        session.live_crop = session.drag_rect(origin, origin, &options);
        session.phase = Phase::Dragging { origin };
        true
    }

    pub fn drag_move(&mut self, pos: (f32, f32)) {
        let options = self.options;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Phase::Dragging { origin } = session.phase {
            if let Some(rect) = session.drag_rect(origin, pos, &options) {
                session.live_crop = Some(rect);
            }
        }
    }

    /// Moves to `pos` and freezes the rectangle there.
    pub fn drag_release(&mut self, pos: (f32, f32)) -> EditorState {
        self.drag_move(pos);
        self.drag_finish()
    }

    /// Freezes the live rectangle as last drawn. A zero-area release counts as
    /// no selection and leaves the editor in `Viewing`.
    pub fn drag_finish(&mut self) -> EditorState {
        let Some(session) = self.session.as_mut() else {
            return EditorState::NoSelection;
        };
        if !matches!(session.phase, Phase::Dragging { .. }) {
            return session.state();
        }
        match session.live_crop.filter(|rect| !rect.is_empty()) {
            Some(rect) => {
                session.completed_crop = Some(rect);
                session.phase = Phase::Completed;
            }
            None => {
                session.live_crop = None;
                session.completed_crop = None;
                session.phase = Phase::Viewing;
            }
        }
        session.state()
    }

    // ── Save ────────────────────────────────────────────────────────────────

    /// Checks the save preconditions, normalizes the completed crop to
    /// natural pixels and enters `Submitting`. Nothing is sent on error.
    ///
    /// The crop is sent exactly as stored; it was confined to the image when
    /// it was drawn or last rescaled.
    pub fn begin_save(&mut self) -> Result<(SessionId, AnnotationSubmission), SaveError> {
        let session = self.session.as_mut().ok_or(SaveError::NoCompletedCrop)?;
        if session.phase == Phase::Submitting {
            return Err(SaveError::SaveInFlight);
        }
        let crop = session.completed_crop.ok_or(SaveError::NoCompletedCrop)?;
        let image = session.image_ref.ok_or(SaveError::ImageNotReady)?;
        let natural = normalize(&crop, &image).ok_or(SaveError::ImageNotReady)?;

        let submission = AnnotationSubmission::new(image_file_name(&session.display_url), natural);
        log::info!(
            "Saving {}: x={} y={} w={} h={}",
            submission.image_name,
            submission.x,
            submission.y,
            submission.width,
            submission.height
        );
        session.phase = Phase::Submitting;
        Ok((session.id, submission))
    }

    pub fn finish_save(
        &mut self,
        id: SessionId,
        submission: AnnotationSubmission,
        result: Result<serde_json::Value, BackendError>,
    ) -> SaveOutcome {
        let session = match self.session.as_mut() {
            Some(session) if session.id == id => session,
            _ => {
                match &result {
                    Ok(_) => log::info!(
                        "Annotation for {} saved after its image was deselected",
                        submission.image_name
                    ),
                    Err(e) => log::warn!(
                        "Save for deselected image {} failed: {}",
                        submission.image_name,
                        e
                    ),
                }
                return SaveOutcome::Stale { submission, result };
            }
        };

        match result {
            Ok(ack) => {
                log::info!("Annotation saved: {}", ack);
                session.live_crop = None;
                session.completed_crop = None;
                session.phase = Phase::Viewing;
                session.last_saved = Some(submission.clone());
                SaveOutcome::Saved(submission)
            }
            Err(e) => {
                log::error!("Error saving annotation: {}", e);
                session.phase = Phase::Completed;
                SaveOutcome::Failed(SaveError::Submission(e))
            }
        }
    }

    /// Synchronous save: preconditions, one request, result applied.
    pub fn save_crop(&mut self, backend: &dyn Backend) -> Result<AnnotationSubmission, SaveError> {
        let (id, submission) = self.begin_save()?;
        let result = backend.save_annotation(&submission);
        self.finish_save(id, submission, result).into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records every save and answers from a queue (success when empty).
    #[derive(Default)]
    struct RecordingBackend {
        saves: Mutex<Vec<AnnotationSubmission>>,
        replies: Mutex<VecDeque<Result<serde_json::Value, BackendError>>>,
    }

    impl RecordingBackend {
        fn failing_once() -> Self {
            let backend = Self::default();
            backend
                .replies
                .lock()
                .unwrap()
                .push_back(Err(BackendError::Status {
                    status: 500,
                    url: "http://localhost:8082/save_annotations".to_string(),
                }));
            backend
        }

        fn saves(&self) -> Vec<AnnotationSubmission> {
            self.saves.lock().unwrap().clone()
        }
    }

    impl Backend for RecordingBackend {
        fn list_images(&self) -> Result<Vec<ImageDescriptor>, BackendError> {
            Ok(Vec::new())
        }

        fn save_annotation(
            &self,
            submission: &AnnotationSubmission,
        ) -> Result<serde_json::Value, BackendError> {
            self.saves.lock().unwrap().push(submission.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(serde_json::json!({"message": "saved"})))
        }

        fn fetch_image(&self, _url: &str) -> Result<Vec<u8>, BackendError> {
            Ok(Vec::new())
        }
    }

    fn descriptor(name: &str) -> ImageDescriptor {
        ImageDescriptor {
            name: name.to_string(),
            url: format!("/images/{}", name),
        }
    }

    fn editor_on(name: &str) -> AnnotationEditor {
        let mut editor = AnnotationEditor::default();
        editor.select_image(&descriptor(name), &BackendConfig::default());
        editor
    }

    fn drag(editor: &mut AnnotationEditor, from: (f32, f32), to: (f32, f32)) -> EditorState {
        assert!(editor.drag_start(from));
        editor.drag_move(to);
        editor.drag_release(to)
    }

    /// 400x225 display of a 1600x900 image with crop {50, 20, 100, 60}.
    fn completed_editor(name: &str) -> AnnotationEditor {
        let mut editor = editor_on(name);
        editor.on_image_loaded(ImageRef::new(1600, 900, 400.0, 225.0));
        assert_eq!(drag(&mut editor, (50.0, 20.0), (150.0, 80.0)), EditorState::Completed);
        editor
    }

    #[test]
    fn test_full_lifecycle() {
        let backend = RecordingBackend::default();
        let mut editor = AnnotationEditor::default();
        assert_eq!(editor.state(), EditorState::NoSelection);

        editor.select_image(&descriptor("cat.jpg"), &BackendConfig::default());
        assert_eq!(editor.state(), EditorState::Viewing);

        editor.on_image_loaded(ImageRef::new(1600, 900, 400.0, 225.0));
        assert!(editor.drag_start((50.0, 20.0)));
        assert_eq!(editor.state(), EditorState::Dragging);
        editor.drag_move((100.0, 50.0));
        assert_eq!(
            editor.session().unwrap().live_crop(),
            Some(&CropRect::pixels(50.0, 20.0, 50.0, 30.0))
        );
        assert!(editor.session().unwrap().completed_crop().is_none());

        assert_eq!(editor.drag_release((150.0, 80.0)), EditorState::Completed);

        let saved = editor.save_crop(&backend).unwrap();
        assert_eq!(editor.state(), EditorState::Viewing);
        assert!(editor.session().unwrap().completed_crop().is_none());
        assert_eq!(editor.session().unwrap().last_saved(), Some(&saved));
        assert_eq!(backend.saves(), vec![saved]);
    }

    #[test]
    fn test_save_normalizes_to_natural_pixels() {
        let backend = RecordingBackend::default();
        let mut editor = completed_editor("cat.jpg");
        let saved = editor.save_crop(&backend).unwrap();
        assert_eq!(
            saved,
            AnnotationSubmission {
                image_name: "cat.jpg".to_string(),
                x: 200,
                y: 80,
                width: 400,
                height: 240,
            }
        );
    }

    #[test]
    fn test_image_name_is_path_stripped() {
        let backend = RecordingBackend::default();
        let mut editor = completed_editor("batch-7/scan-001.png");
        let saved = editor.save_crop(&backend).unwrap();
        assert_eq!(saved.image_name, "scan-001.png");
    }

    #[test]
    fn test_selection_resets_session() {
        let mut editor = completed_editor("a.png");
        let first = editor.session().unwrap().id();

        editor.select_image(&descriptor("b.png"), &BackendConfig::default());
        let session = editor.session().unwrap();
        assert_ne!(session.id(), first);
        assert_eq!(editor.state(), EditorState::Viewing);
        assert!(session.completed_crop().is_none());
        assert!(session.live_crop().is_none());
        assert!(session.image_ref().is_none());
        assert_eq!(session.display_url(), "http://localhost:8082/images/b.png");
    }

    #[test]
    fn test_reselecting_same_image_also_resets() {
        let mut editor = completed_editor("a.png");
        editor.select_image(&descriptor("a.png"), &BackendConfig::default());
        assert_eq!(editor.state(), EditorState::Viewing);
        assert!(editor.session().unwrap().completed_crop().is_none());
    }

    #[test]
    fn test_zero_area_release_is_no_selection() {
        let mut editor = editor_on("a.png");
        editor.on_image_loaded(ImageRef::new(100, 100, 100.0, 100.0));

        assert_eq!(drag(&mut editor, (10.0, 10.0), (10.0, 10.0)), EditorState::Viewing);
        assert!(editor.session().unwrap().completed_crop().is_none());

        assert_eq!(drag(&mut editor, (10.0, 10.0), (10.0, 60.0)), EditorState::Viewing);
        assert!(editor.session().unwrap().completed_crop().is_none());

        assert_eq!(drag(&mut editor, (10.0, 10.0), (60.0, 10.0)), EditorState::Viewing);
        assert!(editor.session().unwrap().completed_crop().is_none());
    }

    #[test]
    fn test_redraw_replaces_completed_crop() {
        let mut editor = completed_editor("a.png");
        assert!(editor.drag_start((0.0, 0.0)));
        assert!(editor.session().unwrap().completed_crop().is_none());
        assert_eq!(editor.drag_release((0.0, 0.0)), EditorState::Viewing);
        assert!(editor.session().unwrap().completed_crop().is_none());
    }

    #[test]
    fn test_drag_without_selection_is_ignored() {
        let mut editor = AnnotationEditor::default();
        assert!(!editor.drag_start((1.0, 1.0)));
        editor.drag_move((5.0, 5.0));
        assert_eq!(editor.drag_release((5.0, 5.0)), EditorState::NoSelection);
    }

    #[test]
    fn test_save_without_crop_sends_nothing() {
        let backend = RecordingBackend::default();

        let mut editor = AnnotationEditor::default();
        let err = editor.save_crop(&backend).unwrap_err();
        assert!(matches!(err, SaveError::NoCompletedCrop));

        let mut editor = editor_on("a.png");
        editor.on_image_loaded(ImageRef::new(100, 100, 100.0, 100.0));
        let err = editor.save_crop(&backend).unwrap_err();
        assert!(matches!(err, SaveError::NoCompletedCrop));
        assert!(err.is_precondition());
        assert_eq!(editor.state(), EditorState::Viewing);

        assert!(backend.saves().is_empty());
    }

    #[test]
    fn test_save_before_image_loaded_sends_nothing() {
        let backend = RecordingBackend::default();
        let mut editor = editor_on("a.png");
        assert!(!editor.drag_start((10.0, 10.0)));
        editor.drag_move((500.0, 300.0));
        assert_eq!(editor.drag_release((500.0, 300.0)), EditorState::Viewing);
        assert!(editor.session().unwrap().live_crop().is_none());

        let err = editor.save_crop(&backend).unwrap_err();
        assert!(matches!(err, SaveError::NoCompletedCrop));
        assert!(backend.saves().is_empty());

        // Loaded but not yet laid out.
        editor.on_image_loaded(ImageRef::new(1600, 900, 0.0, 0.0));
        assert!(!editor.drag_start((10.0, 10.0)));
        assert_eq!(editor.state(), EditorState::Viewing);
    }

    #[test]
    fn test_submitted_box_is_stored_crop_scaled() {
        let backend = RecordingBackend::default();
        let mut editor = editor_on("cat.jpg");
        let image = ImageRef::new(1600, 900, 400.0, 225.0);
        editor.on_image_loaded(image);
        assert_eq!(drag(&mut editor, (10.0, 10.0), (500.0, 300.0)), EditorState::Completed);

        let crop = *editor.session().unwrap().completed_crop().unwrap();
        assert_eq!(crop, CropRect::pixels(10.0, 10.0, 390.0, 215.0));
        let saved = editor.save_crop(&backend).unwrap();
        let scaled = |v: f32, scale: f64| (v as f64 * scale).round() as i32;
        assert_eq!(
            (saved.x, saved.y, saved.width, saved.height),
            (
                scaled(crop.x, image.scale_x()),
                scaled(crop.y, image.scale_y()),
                scaled(crop.width, image.scale_x()),
                scaled(crop.height, image.scale_y()),
            )
        );
        assert_eq!((saved.x, saved.y, saved.width, saved.height), (40, 40, 1560, 860));
    }

    #[test]
    fn test_percent_unit_saves_same_box() {
        let backend = RecordingBackend::default();
        let mut editor = editor_on("cat.jpg");
        editor.set_unit(CropUnit::Percent);
        editor.on_image_loaded(ImageRef::new(1600, 900, 400.0, 225.0));
        assert_eq!(drag(&mut editor, (50.0, 20.0), (150.0, 80.0)), EditorState::Completed);

        let crop = *editor.session().unwrap().completed_crop().unwrap();
        assert_eq!(crop.unit, CropUnit::Percent);
        assert!((crop.x - 12.5).abs() < 1e-3);
        assert!((crop.width - 25.0).abs() < 1e-3);

        editor.on_display_resized(800.0, 450.0);
        assert_eq!(editor.session().unwrap().completed_crop().unwrap().unit, CropUnit::Percent);

        let saved = editor.save_crop(&backend).unwrap();
        assert_eq!((saved.x, saved.y, saved.width, saved.height), (200, 80, 400, 240));
    }

    #[test]
    fn test_finish_without_pointer_keeps_last_rect() {
        let mut editor = editor_on("a.png");
        editor.on_image_loaded(ImageRef::new(100, 100, 100.0, 100.0));
        assert!(editor.drag_start((10.0, 10.0)));
        editor.drag_move((40.0, 30.0));
        assert_eq!(editor.drag_finish(), EditorState::Completed);
        assert_eq!(
            editor.session().unwrap().completed_crop(),
            Some(&CropRect::pixels(10.0, 10.0, 30.0, 20.0))
        );

        assert!(editor.drag_start((10.0, 10.0)));
        assert_eq!(editor.drag_finish(), EditorState::Viewing);
        assert!(editor.session().unwrap().live_crop().is_none());

        assert_eq!(editor.drag_finish(), EditorState::Viewing);
    }

    #[test]
    fn test_failed_save_keeps_crop_and_retry_resends_same_payload() {
        let backend = RecordingBackend::failing_once();
        let mut editor = completed_editor("cat.jpg");
        let before = *editor.session().unwrap().completed_crop().unwrap();

        let err = editor.save_crop(&backend).unwrap_err();
        assert!(matches!(err, SaveError::Submission(BackendError::Status { status: 500, .. })));
        assert!(!err.is_precondition());
        assert_eq!(editor.state(), EditorState::Completed);
        assert_eq!(editor.session().unwrap().completed_crop(), Some(&before));

        editor.save_crop(&backend).unwrap();
        let saves = backend.saves();
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[0], saves[1]);
        assert_eq!(editor.state(), EditorState::Viewing);
    }

    #[test]
    fn test_second_save_while_in_flight_is_refused() {
        let mut editor = completed_editor("a.png");
        let (id, submission) = editor.begin_save().unwrap();
        assert_eq!(editor.state(), EditorState::Submitting);

        assert!(matches!(editor.begin_save(), Err(SaveError::SaveInFlight)));
        assert!(!editor.drag_start((1.0, 1.0)));

        let outcome = editor.finish_save(id, submission, Ok(serde_json::json!({})));
        assert!(matches!(outcome, SaveOutcome::Saved(_)));
    }

    #[test]
    fn test_result_for_replaced_session_is_stale() {
        let mut editor = completed_editor("a.png");
        let (id, submission) = editor.begin_save().unwrap();

        editor.select_image(&descriptor("b.png"), &BackendConfig::default());
        editor.on_image_loaded(ImageRef::new(100, 100, 100.0, 100.0));
        assert_eq!(drag(&mut editor, (1.0, 1.0), (9.0, 9.0)), EditorState::Completed);

        let outcome = editor.finish_save(
            id,
            submission,
            Err(BackendError::Transport("reset".to_string())),
        );
        assert!(matches!(outcome, SaveOutcome::Stale { ref submission, .. } if submission.image_name == "a.png"));
        assert_eq!(editor.state(), EditorState::Completed);
        assert!(editor.session().unwrap().last_saved().is_none());
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn test_resize_keeps_natural_box() {
        let backend = RecordingBackend::default();
        let mut editor = completed_editor("cat.jpg");
        editor.on_display_resized(800.0, 450.0);
        assert_eq!(
            editor.session().unwrap().completed_crop(),
            Some(&CropRect::pixels(100.0, 40.0, 200.0, 120.0))
        );
        let saved = editor.save_crop(&backend).unwrap();
        assert_eq!((saved.x, saved.y, saved.width, saved.height), (200, 80, 400, 240));
    }

    #[test]
    fn test_aspect_lock_shapes_drag() {
        let mut editor = editor_on("wide.png");
        editor.set_aspect(AspectLock::Widescreen);
        editor.on_image_loaded(ImageRef::new(1920, 1080, 480.0, 270.0));
        assert_eq!(drag(&mut editor, (0.0, 0.0), (160.0, 20.0)), EditorState::Completed);
        let crop = editor.session().unwrap().completed_crop().unwrap();
        assert!((crop.width - 160.0).abs() < 1e-3);
        assert!((crop.height - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_drag_clamped_to_displayed_image() {
        let mut editor = editor_on("a.png");
        editor.on_image_loaded(ImageRef::new(200, 200, 100.0, 100.0));
        assert_eq!(drag(&mut editor, (-20.0, 50.0), (140.0, 150.0)), EditorState::Completed);
        assert_eq!(
            editor.session().unwrap().completed_crop(),
            Some(&CropRect::pixels(0.0, 50.0, 100.0, 50.0))
        );
    }
}
