//! The engine context: one per page, owning every piece of tool state.
//!
//! The host forwards page events (`pointer_move`, `pointer_click`,
//! `key_down`), activation messages and timer ticks. Nothing here is
//! global; dropping the engine after `deactivate` leaves the page as it
//! was found.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::annotator::dialog::{self, AnnotationDraft, CommentDialog, DialogTarget, PendingAnnotation};
use crate::annotator::interceptor::{CapturedError, ErrorInterceptor};
use crate::annotator::overlay::HighlightOverlay;
use crate::annotator::pipeline::{self, ClickOutcome, ClickRoute, KeyPress, RouteContext};
use crate::annotator::state::{ToolState, ToolStateMachine};
use crate::annotator::store::{AnnotationStore, MARKER_CLASS};
use crate::annotator::types::{describe, Annotation};
use crate::channel::{self, ChannelError, Request, Response, StatusSource, ToggleStatus};
use crate::config::EngineConfig;
use crate::dom::geometry::to_viewport;
use crate::dom::{rect_of, NodeId, Window};
use crate::export::clipboard::{copy_with_fallback, Clipboard, ClipboardError, CopyPath, NoClipboard};
use crate::i18n::{self, Locale};
use crate::notification::{Clock, Notifier, SystemClock, NOTIFICATION_CLASS};
use crate::panel::{PanelAction, PanelController};

const CROSSHAIR: &str = "crosshair";

pub struct Engine {
    window: Window,
    config: EngineConfig,
    locale: Locale,
    state: ToolStateMachine,
    session: Uuid,
    store: AnnotationStore,
    interceptor: ErrorInterceptor,
    overlay: Option<HighlightOverlay>,
    panel: Option<PanelController>,
    dialog: Option<CommentDialog>,
    notifier: Notifier,
    clock: Box<dyn Clock>,
    clipboard: Box<dyn Clipboard>,
    fallback_clipboard: Box<dyn Clipboard>,
    page_cursor: Option<String>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state.state())
            .field("session", &self.session)
            .field("annotations", &self.store.len())
            .field("dialog_open", &self.dialog.is_some())
            .finish()
    }
}

impl Engine {
    pub fn new(window: Window, config: EngineConfig) -> Self {
        Self {
            window,
            store: AnnotationStore::new(config.marker_offset),
            notifier: Notifier::new(config.notification_timings()),
            locale: config.resolve_locale(None),
            config,
            state: ToolStateMachine::new(),
            session: Uuid::new_v4(),
            interceptor: ErrorInterceptor::new(),
            overlay: None,
            panel: None,
            dialog: None,
            clock: Box::new(SystemClock),
            clipboard: Box::new(NoClipboard),
            fallback_clipboard: Box::new(NoClipboard),
            page_cursor: None,
        }
    }

    /// Use the page's language tag (`navigator.language`) unless the config
    /// fixes a locale.
    pub fn with_host_language(mut self, tag: &str) -> Self {
        self.locale = self.config.resolve_locale(Some(tag));
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Async clipboard API first, legacy copy path second.
    pub fn with_clipboards(
        mut self,
        primary: impl Clipboard + 'static,
        fallback: impl Clipboard + 'static,
    ) -> Self {
        self.clipboard = Box::new(primary);
        self.fallback_clipboard = Box::new(fallback);
        self
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn state(&self) -> ToolState {
        self.state.state()
    }

    /// Active or paused.
    pub fn is_active(&self) -> bool {
        self.state.is_engaged()
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn captured_errors(&self) -> Vec<CapturedError> {
        self.interceptor.errors()
    }

    pub fn panel(&self) -> Option<&PanelController> {
        self.panel.as_ref()
    }

    pub fn overlay(&self) -> Option<&HighlightOverlay> {
        self.overlay.as_ref()
    }

    pub fn dialog(&self) -> Option<&CommentDialog> {
        self.dialog.as_ref()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.notifier.messages(&self.window.document)
    }

    /// Start a session. Returns `false` when one is already running.
    pub fn activate(&mut self) -> bool {
        if self.state.activate().is_err() {
            debug!(state = ?self.state.state(), "activate ignored");
            return false;
        }
        self.session = Uuid::new_v4();
        self.remove_leftover_ui();

        self.overlay = HighlightOverlay::create(&mut self.window);
        let include_errors = self.config.include_errors_default;
        self.panel = PanelController::create(&mut self.window.document, self.locale, include_errors);
        if let Some(panel) = &self.panel {
            panel.render(&mut self.window.document, &self.store);
        }
        self.interceptor.start(&mut self.window.hooks);
        self.set_crosshair(true);
        self.notify(i18n::notify_started(self.locale));
        info!(session = %self.session, "annotation session started");
        true
    }

    /// End the session and put the page back. Returns `false` when nothing
    /// was running.
    pub fn deactivate(&mut self) -> bool {
        if self.state.deactivate().is_err() {
            debug!("deactivate ignored, not active");
            return false;
        }
        if let Some(dialog) = self.dialog.take() {
            dialog.dismiss(&mut self.window.document);
        }
        if let Some(overlay) = self.overlay.take() {
            overlay.remove(&mut self.window);
        }
        if let Some(panel) = self.panel.take() {
            panel.remove(&mut self.window.document);
        }
        self.store.clear(&mut self.window.document);
        self.interceptor.stop(&mut self.window.hooks);
        self.set_crosshair(false);
        info!(session = %self.session, "annotation session stopped");
        true
    }

    pub fn toggle(&mut self) -> ToggleStatus {
        if self.is_active() {
            self.deactivate();
            ToggleStatus::Stopped
        } else {
            self.activate();
            ToggleStatus::Started
        }
    }

    /// Flip between tracking and paused. `None` when inactive.
    pub fn toggle_pause(&mut self) -> Option<ToolState> {
        let next = match self.state.toggle_pause() {
            Ok(next) => next,
            Err(err) => {
                debug!(error = %err, "pause toggle ignored");
                return None;
            }
        };
        let paused = next == ToolState::Paused;
        if paused {
            if let Some(overlay) = &self.overlay {
                overlay.hide(&mut self.window);
            }
        }
        self.set_crosshair(!paused);
        if let Some(panel) = &self.panel {
            panel.show_paused(&mut self.window.document, paused);
        }
        let message = if paused {
            i18n::notify_paused(self.locale)
        } else {
            i18n::notify_resumed(self.locale)
        };
        self.notify(message);
        debug!(?next, "pause toggled");
        Some(next)
    }

    /// Highlight the hovered element while tracking.
    pub fn pointer_move(&mut self, target: NodeId) {
        if !self.state.is_tracking() {
            return;
        }
        let Some(overlay) = &self.overlay else {
            return;
        };
        let ctx = self.route_context();
        if pipeline::is_engine_ui(&ctx, target) {
            overlay.hide(&mut self.window);
        } else {
            overlay.show(&mut self.window, target);
        }
    }

    pub fn pointer_click(&mut self, target: NodeId) -> ClickOutcome {
        let route = pipeline::route_click(&self.route_context(), target);
        match route {
            ClickRoute::Ignore => ClickOutcome::Ignored,
            ClickRoute::Panel(action) => {
                self.apply_panel_action(action);
                ClickOutcome::Panel(action)
            }
            ClickRoute::DismissDialog
            | ClickRoute::Dialog(DialogTarget::Backdrop)
            | ClickRoute::Dialog(DialogTarget::Cancel) => {
                self.cancel_dialog();
                ClickOutcome::DialogDismissed
            }
            ClickRoute::Dialog(DialogTarget::Save) => {
                self.save_dialog();
                ClickOutcome::DialogSaved
            }
            ClickRoute::Dialog(DialogTarget::Content) => ClickOutcome::InsideDialog,
            ClickRoute::Annotate(node) => match self.open_dialog(node) {
                Some(pending) => ClickOutcome::DialogOpened(pending),
                None => ClickOutcome::Ignored,
            },
        }
    }

    /// Keys typed into the comment dialog. Returns whether the key was used.
    pub fn key_down(&mut self, key: KeyPress) -> bool {
        if self.dialog.is_none() {
            return false;
        }
        if key.is_confirm() {
            self.save_dialog()
        } else if key.is_cancel() {
            self.cancel_dialog()
        } else {
            false
        }
    }

    pub fn dialog_input(&mut self, text: &str) -> bool {
        let Some(dialog) = &self.dialog else {
            return false;
        };
        dialog.set_value(&mut self.window.document, text);
        true
    }

    pub fn save_dialog(&mut self) -> bool {
        let Some(dialog) = self.dialog.take() else {
            return false;
        };
        dialog.save(&mut self.window.document);
        true
    }

    pub fn cancel_dialog(&mut self) -> bool {
        let Some(dialog) = self.dialog.take() else {
            return false;
        };
        dialog.dismiss(&mut self.window.document);
        true
    }

    /// Open the comment dialog for `target`. Any dialog already open is
    /// resolved as cancelled first.
    pub fn open_dialog(&mut self, target: NodeId) -> Option<PendingAnnotation> {
        if !self.state.is_tracking() {
            return None;
        }
        let descriptor = describe(&self.window, target, self.config.label_text_limit)?;
        let rect = rect_of(&self.window, target)?;
        self.cancel_dialog();

        let placement = dialog::place(
            &to_viewport(&self.window, &rect),
            self.window.viewport,
            self.config.dialog,
            self.config.dialog_spacing,
        );
        let (dialog, receiver) = CommentDialog::open(
            &mut self.window.document,
            &descriptor,
            placement,
            self.locale,
        )?;
        self.dialog = Some(dialog);
        debug!(selector = %descriptor.selector, "comment dialog opened");
        Some(PendingAnnotation::new(self.session, descriptor, target, rect, receiver))
    }

    /// Store a resolved draft. Drafts from an earlier session are dropped.
    pub fn commit(&mut self, draft: AnnotationDraft) -> Option<usize> {
        if draft.session != self.session || !self.is_active() {
            debug!(draft_session = %draft.session, "stale draft discarded");
            return None;
        }
        let timestamp = self.clock.now_ms();
        let index = self
            .store
            .add(
                &mut self.window.document,
                draft.descriptor,
                &draft.comment,
                draft.element,
                draft.element_rect,
                timestamp,
            )?
            .index;
        self.render_panel();
        Some(index)
    }

    pub fn delete(&mut self, index: usize) -> Option<Annotation> {
        let removed = self.store.remove(&mut self.window.document, index)?;
        self.render_panel();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.store.clear(&mut self.window.document);
        self.render_panel();
    }

    /// The report for the current session, as `finish` would copy it.
    pub fn report(&self) -> String {
        let include_errors = self
            .panel
            .as_ref()
            .map_or(self.config.include_errors_default, |p| {
                p.include_errors(&self.window.document)
            });
        crate::export::format(
            &self.store.snapshot(),
            &self.interceptor.errors(),
            include_errors,
            &self.window.location_path,
            self.window.viewport,
        )
    }

    /// Copy the report to the clipboard.
    pub fn finish(&mut self) -> Result<CopyPath, ClipboardError> {
        let report = self.report();
        let path = copy_with_fallback(
            self.clipboard.as_mut(),
            self.fallback_clipboard.as_mut(),
            &report,
        )?;
        self.notify(i18n::notify_copied(self.locale));
        info!(annotations = self.store.len(), ?path, "report copied");
        Ok(path)
    }

    /// Run notification timers that are due. The host drives this from its
    /// frame or interval timer; toasts only fade and leave the page here.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        self.notifier.tick(&mut self.window.document, now);
    }

    pub fn handle_request(&mut self, request: Request) -> Response {
        match request {
            Request::Toggle => Response::Toggled {
                status: self.toggle(),
            },
            Request::GetStatus => Response::Status {
                is_active: self.is_active(),
            },
        }
    }

    /// Decode a raw channel message, act on it and encode the reply.
    pub fn handle_message(&mut self, json: &str) -> Result<String, ChannelError> {
        let request = channel::parse_request(json)?;
        let response = self.handle_request(request);
        channel::encode_response(&response)
    }

    /// Page-load query: activate when the host says this page should be.
    pub fn sync_on_load(&mut self, source: &dyn StatusSource) -> bool {
        if source.should_be_active() {
            self.activate()
        } else {
            false
        }
    }

    fn apply_panel_action(&mut self, action: PanelAction) {
        match action {
            PanelAction::TogglePause => {
                self.toggle_pause();
            }
            PanelAction::ToggleMinimized => {
                if let Some(panel) = &self.panel {
                    panel.toggle_minimized(&mut self.window.document);
                }
            }
            PanelAction::ToggleIncludeErrors => {
                if let Some(panel) = &self.panel {
                    let include = !panel.include_errors(&self.window.document);
                    panel.set_include_errors(&mut self.window.document, include);
                }
            }
            PanelAction::Clear => self.clear(),
            PanelAction::Finish => {
                if let Err(err) = self.finish() {
                    warn!(error = %err, "report copy failed");
                }
            }
            PanelAction::Delete(index) => {
                self.delete(index);
            }
        }
    }

    fn route_context(&self) -> RouteContext<'_> {
        RouteContext {
            doc: &self.window.document,
            engaged: self.state.is_engaged(),
            tracking: self.state.is_tracking(),
            panel: self.panel.as_ref(),
            dialog: self.dialog.as_ref(),
            overlay: self.overlay.as_ref().map(HighlightOverlay::node),
        }
    }

    fn render_panel(&mut self) {
        if let Some(panel) = &self.panel {
            panel.render(&mut self.window.document, &self.store);
        }
    }

    fn remove_leftover_ui(&mut self) {
        let doc = &mut self.window.document;
        for class in [MARKER_CLASS, dialog::DIALOG_CLASS, NOTIFICATION_CLASS] {
            for node in doc.elements_by_class(class) {
                doc.remove(node);
            }
        }
    }

    fn set_crosshair(&mut self, on: bool) {
        let doc = &mut self.window.document;
        let body = doc.body();
        if on {
            if self.page_cursor.is_none() {
                self.page_cursor = Some(doc.style(body, "cursor").unwrap_or_default().to_string());
            }
            doc.set_style(body, "cursor", CROSSHAIR);
        } else if let Some(cursor) = self.page_cursor.take() {
            doc.set_style(body, "cursor", cursor);
        }
    }

    fn notify(&mut self, message: &str) {
        let now = self.clock.now_ms();
        self.notifier.show(&mut self.window.document, message, now);
    }
}
