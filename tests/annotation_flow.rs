use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::block_on;
use pinpoint::annotator::dialog::DIALOG_CLASS;
use pinpoint::annotator::store::{marker_tags, MARKER_CLASS};
use pinpoint::dom::hooks::{ErrorHandler, LogArg, ScriptError};
use pinpoint::dom::{ClientRect, NodeId, Viewport, Window};
use pinpoint::export::clipboard::{Clipboard, ClipboardError, CopyPath};
use pinpoint::notification::{ManualClock, NOTIFICATION_CLASS};
use pinpoint::panel::{PanelAction, PANEL_ID};
use pinpoint::{ClickOutcome, Engine, EngineConfig, Key, KeyPress, ToolState};

struct Page {
    form: NodeId,
    submit: NodeId,
    cancel: NodeId,
    hero: NodeId,
}

fn page() -> (Window, Page) {
    let mut window = Window::new("/demo", Viewport::new(1200, 800));
    let doc = &mut window.document;
    let body = doc.body();

    let hero = doc.append_element(body, "section").expect("hero");
    doc.set_attribute(hero, "class", "hero wide dark");
    doc.set_client_rect(hero, ClientRect::new(0.0, 0.0, 1200.0, 300.0));

    let form = doc.append_element(body, "form").expect("form");
    doc.set_attribute(form, "id", "form");
    doc.set_client_rect(form, ClientRect::new(100.0, 320.0, 600.0, 200.0));
    let cancel = doc.append_element(form, "button").expect("cancel");
    doc.set_attribute(cancel, "class", "secondary");
    doc.set_client_rect(cancel, ClientRect::new(120.0, 460.0, 80.0, 30.0));
    let submit = doc.append_element(form, "button").expect("submit");
    doc.set_attribute(submit, "class", "submit");
    doc.set_client_rect(submit, ClientRect::new(220.0, 460.0, 80.0, 30.0));

    (window, Page { form, submit, cancel, hero })
}

#[derive(Clone, Default)]
struct SharedClipboard {
    fail: bool,
    written: Rc<RefCell<Vec<String>>>,
}

impl Clipboard for SharedClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Rejected("not focused".into()));
        }
        self.written.borrow_mut().push(text.to_string());
        Ok(())
    }
}

fn engine() -> (Engine, Page, ManualClock) {
    let (window, page) = page();
    let clock = ManualClock::new(1_000);
    let engine = Engine::new(window, EngineConfig::default()).with_clock(clock.clone());
    (engine, page, clock)
}

/// Click, type, confirm and commit one annotation.
fn annotate(engine: &mut Engine, target: NodeId, comment: &str) -> Option<usize> {
    let ClickOutcome::DialogOpened(pending) = engine.pointer_click(target) else {
        panic!("expected a dialog for the click");
    };
    engine.dialog_input(comment);
    assert!(engine.key_down(KeyPress::new(Key::Enter).with_ctrl()));
    let draft = block_on(pending.resolve())?;
    engine.commit(draft)
}

#[test]
fn click_comment_and_export() {
    let (mut engine, page, _clock) = engine();
    assert!(engine.activate());

    engine.pointer_move(page.submit);
    let overlay = engine.overlay().expect("overlay").node();
    let doc = &engine.window().document;
    assert_eq!(doc.style(overlay, "display"), Some("block"));
    assert_eq!(doc.attribute(overlay, "data-label"), Some("button.submit"));
    assert_eq!(doc.style(doc.body(), "cursor"), Some("crosshair"));

    assert_eq!(annotate(&mut engine, page.submit, "  too small  "), Some(1));
    assert!(engine.dialog().is_none());

    let stored = engine.annotations().get(1).expect("annotation");
    assert_eq!(stored.comment, "too small");
    assert_eq!(stored.selector(), "#form > button.submit:nth-child(2)");
    assert_eq!(stored.timestamp, 1_000);
    assert_eq!(marker_tags(&engine.window().document), vec![1]);

    let report = engine.report();
    assert!(report.starts_with("## Page Feedback: /demo\n**Viewport:** 1200×800\n\n"));
    assert!(report.ends_with(
        "### 1. button.submit\n**Location:** #form > button.submit:nth-child(2)\n**Comment:** too small\n\n"
    ));
}

#[test]
fn blank_or_cancelled_comments_are_not_stored() {
    let (mut engine, page, _clock) = engine();
    engine.activate();

    assert_eq!(annotate(&mut engine, page.hero, "   "), None);

    let ClickOutcome::DialogOpened(pending) = engine.pointer_click(page.hero) else {
        panic!("expected a dialog");
    };
    assert!(engine.key_down(KeyPress::new(Key::Escape)));
    assert!(block_on(pending.resolve()).is_none());
    assert!(engine.annotations().is_empty());
}

#[test]
fn only_one_dialog_at_a_time() {
    let (mut engine, page, _clock) = engine();
    engine.activate();

    let first = engine.open_dialog(page.hero).expect("first dialog");
    let second = engine.open_dialog(page.submit).expect("second dialog");
    assert!(block_on(first.resolve()).is_none());
    assert_eq!(engine.window().document.elements_by_class(DIALOG_CLASS).len(), 1);

    // A click elsewhere only closes the dialog.
    let outcome = engine.pointer_click(page.cancel);
    assert!(matches!(outcome, ClickOutcome::DialogDismissed));
    assert!(!outcome.suppresses_default());
    assert!(block_on(second.resolve()).is_none());
    assert!(engine.window().document.elements_by_class(DIALOG_CLASS).is_empty());
}

#[test]
fn dialog_buttons_work_while_paused() {
    let (mut engine, page, _clock) = engine();
    engine.activate();
    let ClickOutcome::DialogOpened(pending) = engine.pointer_click(page.hero) else {
        panic!("expected a dialog");
    };
    engine.dialog_input("contrast too low");
    assert_eq!(engine.toggle_pause(), Some(ToolState::Paused));

    // Outside clicks no longer reach the engine, the dialog's own do.
    assert!(matches!(engine.pointer_click(page.cancel), ClickOutcome::Ignored));
    assert!(engine.dialog().is_some());
    let save = engine
        .window()
        .document
        .element_by_id("pp-save-btn")
        .expect("save");
    assert!(matches!(engine.pointer_click(save), ClickOutcome::DialogSaved));
    assert!(engine.dialog().is_none());
    let draft = block_on(pending.resolve()).expect("draft");
    assert_eq!(draft.comment, "contrast too low");

    let pending = engine.open_dialog(page.submit);
    assert!(pending.is_none());
}

#[test]
fn dialog_cancel_works_while_paused() {
    let (mut engine, page, _clock) = engine();
    engine.activate();
    let pending = engine.open_dialog(page.submit).expect("dialog");
    engine.toggle_pause();
    let cancel = engine
        .window()
        .document
        .element_by_id("pp-cancel-btn")
        .expect("cancel");
    let outcome = engine.pointer_click(cancel);
    assert!(matches!(outcome, ClickOutcome::DialogDismissed));
    assert!(!outcome.suppresses_default());
    assert!(block_on(pending.resolve()).is_none());
    assert!(engine.window().document.elements_by_class(DIALOG_CLASS).is_empty());
}

#[test]
fn clicks_inside_dialog_route_to_its_parts() {
    let (mut engine, page, _clock) = engine();
    engine.activate();
    let ClickOutcome::DialogOpened(pending) = engine.pointer_click(page.form) else {
        panic!("expected a dialog");
    };
    let root = engine.dialog().expect("dialog").root();
    let doc = &engine.window().document;
    let input = doc.element_by_id("pp-comment-input").expect("input");
    let save = doc.element_by_id("pp-save-btn").expect("save");

    assert!(matches!(engine.pointer_click(input), ClickOutcome::InsideDialog));
    assert!(engine.dialog().is_some());
    engine.dialog_input("spacing off");
    assert!(matches!(engine.pointer_click(save), ClickOutcome::DialogSaved));
    assert!(!engine.window().document.is_alive(root));

    let draft = block_on(pending.resolve()).expect("draft");
    assert_eq!(draft.comment, "spacing off");
    assert_eq!(draft.descriptor.selector, "#form");
}

#[test]
fn delete_renumbers_through_panel() {
    let (mut engine, page, _clock) = engine();
    engine.activate();
    annotate(&mut engine, page.hero, "one");
    annotate(&mut engine, page.cancel, "two");
    annotate(&mut engine, page.submit, "three");
    assert_eq!(marker_tags(&engine.window().document), vec![1, 2, 3]);

    let panel = engine.panel().expect("panel");
    let delete_first = panel
        .button(&engine.window().document, PanelAction::Delete(1))
        .expect("delete button");
    let outcome = engine.pointer_click(delete_first);
    assert!(matches!(outcome, ClickOutcome::Panel(PanelAction::Delete(1))));

    let comments: Vec<_> = engine
        .annotations()
        .annotations()
        .map(|a| (a.index, a.comment.clone()))
        .collect();
    assert_eq!(comments, vec![(1, "two".to_string()), (2, "three".to_string())]);
    assert_eq!(marker_tags(&engine.window().document), vec![1, 2]);
    let doc = &engine.window().document;
    assert_eq!(engine.panel().expect("panel").delete_buttons(doc).len(), 2);
}

#[test]
fn pause_blocks_page_clicks_but_not_panel() {
    let (mut engine, page, _clock) = engine();
    engine.activate();
    engine.pointer_move(page.hero);

    assert_eq!(engine.toggle_pause(), Some(ToolState::Paused));
    let doc = &engine.window().document;
    let overlay = engine.overlay().expect("overlay");
    assert!(!overlay.is_visible(engine.window()));
    assert_eq!(doc.style(doc.body(), "cursor"), None);
    assert!(matches!(engine.pointer_click(page.hero), ClickOutcome::Ignored));
    engine.pointer_move(page.submit);
    assert!(!engine.overlay().expect("overlay").is_visible(engine.window()));

    let pause = engine
        .panel()
        .expect("panel")
        .button(&engine.window().document, PanelAction::TogglePause)
        .expect("pause button");
    engine.pointer_click(pause);
    assert_eq!(engine.state(), ToolState::Active);
    assert!(matches!(engine.pointer_click(page.hero), ClickOutcome::DialogOpened(_)));
}

#[test]
fn lifecycle_is_idempotent_and_leaves_no_trace() {
    let (mut engine, page, _clock) = engine();
    assert!(!engine.deactivate());
    assert!(engine.activate());
    assert!(!engine.activate());
    assert_eq!(engine.state(), ToolState::Active);

    annotate(&mut engine, page.hero, "keep");
    let _pending = engine.open_dialog(page.submit).expect("dialog");

    assert!(engine.deactivate());
    assert!(!engine.deactivate());
    let doc = &engine.window().document;
    assert!(doc.element_by_id(PANEL_ID).is_none());
    assert!(doc.elements_by_class(MARKER_CLASS).is_empty());
    assert!(doc.elements_by_class(DIALOG_CLASS).is_empty());
    assert_eq!(doc.style(doc.body(), "cursor"), None);
    assert!(engine.annotations().is_empty());
    assert!(engine.overlay().is_none());
}

#[test]
fn page_cursor_is_restored() {
    let (mut engine, _page, _clock) = engine();
    let body = engine.window().document.body();
    engine.window_mut().document.set_style(body, "cursor", "wait");
    engine.activate();
    engine.toggle_pause();
    assert_eq!(engine.window().document.style(body, "cursor"), Some("wait"));
    engine.toggle_pause();
    assert_eq!(engine.window().document.style(body, "cursor"), Some("crosshair"));
    engine.deactivate();
    assert_eq!(engine.window().document.style(body, "cursor"), Some("wait"));
}

#[test]
fn draft_from_previous_session_is_discarded() {
    let (mut engine, page, _clock) = engine();
    engine.activate();
    let pending = engine.open_dialog(page.hero).expect("dialog");
    engine.dialog_input("late");
    engine.save_dialog();
    let draft = block_on(pending.resolve()).expect("draft");

    engine.deactivate();
    engine.activate();
    assert_eq!(engine.commit(draft), None);
    assert!(engine.annotations().is_empty());
}

#[test]
fn page_error_hooks_are_restored() {
    let (mut engine, _page, _clock) = engine();
    let page_seen = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&page_seen);
    let page_handler: ErrorHandler = Rc::new(move |_: &ScriptError| {
        *counter.borrow_mut() += 1;
        true
    });
    engine.window_mut().hooks.set_on_error(Some(Rc::clone(&page_handler)));
    let page_console = engine.window().hooks.console_error();

    engine.activate();
    engine.activate();
    let hooks = &engine.window().hooks;
    assert!(hooks.raise_error(&ScriptError::new("x is undefined").at("app.js", 3, 9)));
    hooks.log_error(&[LogArg::from("failed:"), LogArg::Error { message: "timeout".into() }]);
    hooks.reject(&LogArg::Error { message: "no route".into() });
    assert_eq!(*page_seen.borrow(), 1);

    let errors = engine.captured_errors();
    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0].source, "app.js");
    assert_eq!(errors[1].message, "failed: timeout");
    assert_eq!(errors[2].source, "unhandledrejection");
    assert!(engine.report().contains("### 🚫 Console Errors (3)"));

    engine.deactivate();
    let hooks = &engine.window().hooks;
    let restored = hooks.on_error().expect("page handler back");
    assert!(Rc::ptr_eq(&restored, &page_handler));
    assert!(Rc::ptr_eq(&hooks.console_error(), &page_console));
    assert_eq!(hooks.rejection_listener_count(), 0);
    assert!(engine.captured_errors().is_empty());
}

#[test]
fn include_errors_follows_checkbox() {
    let (mut engine, _page, _clock) = engine();
    engine.activate();
    engine.window().hooks.log_error(&[LogArg::from("boom")]);
    assert!(engine.report().contains("Console Errors (1)"));

    let checkbox = engine
        .panel()
        .expect("panel")
        .button(&engine.window().document, PanelAction::ToggleIncludeErrors)
        .expect("checkbox");
    engine.pointer_click(checkbox);
    assert!(!engine.report().contains("Console Errors"));
}

#[test]
fn finish_uses_fallback_and_notifies() {
    let (window, page) = page();
    let clock = ManualClock::new(0);
    let primary = SharedClipboard {
        fail: true,
        ..Default::default()
    };
    let fallback = SharedClipboard::default();
    let copied = Rc::clone(&fallback.written);
    let mut engine = Engine::new(window, EngineConfig::default())
        .with_clock(clock.clone())
        .with_clipboards(primary, fallback);

    engine.activate();
    annotate(&mut engine, page.submit, "too small");
    assert_eq!(engine.finish(), Ok(CopyPath::Fallback));
    assert_eq!(*copied.borrow(), vec![engine.report()]);
    assert!(engine
        .notifications()
        .contains(&"✅ Copied to clipboard!".to_string()));

    clock.advance(2_300);
    engine.tick();
    assert!(engine.window().document.elements_by_class(NOTIFICATION_CLASS).is_empty());
}

#[test]
fn finish_without_any_clipboard_fails_quietly() {
    let (mut engine, _page, clock) = engine();
    engine.activate();
    clock.advance(5_000);
    engine.tick();
    assert!(engine.finish().is_err());
    assert!(engine.notifications().is_empty());
    assert!(engine.is_active());
}
