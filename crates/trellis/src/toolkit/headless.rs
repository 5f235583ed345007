//! In-memory reference widgets.
//!
//! These widgets implement the toolkit traits with plain state and signals,
//! no rendering. They back the Trellis test suite, serve as the reference
//! for real toolkit integrations, and are handy for driving a binding layer
//! from scripts.
//!
//! Programmatic setters fire the same change signals interactive edits do,
//! which is exactly what real toolkits do and what the binding layer's
//! suppression machinery exists for. Tests simulate user input by calling
//! the setters directly.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use trellis_core::{ConnectionId, Signal};

use super::{ChoiceWidget, TextWidget, ToggleWidget, ToolkitError, WidgetHandle, WidgetTree};
use crate::validate::FeedbackSurface;

/// Common per-widget state.
struct HandleState {
    visible: bool,
    sensitive: bool,
    tooltip: Option<String>,
}

/// Validation-feedback visuals a real toolkit would render.
#[derive(Default)]
struct FeedbackVisuals {
    tint: bool,
    popup: Option<String>,
    missing: bool,
}

/// Shared base for every headless widget.
struct HandleBase {
    name: String,
    state: Mutex<HandleState>,
    visuals: Mutex<FeedbackVisuals>,
}

impl HandleBase {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(HandleState {
                visible: true,
                sensitive: true,
                tooltip: None,
            }),
            visuals: Mutex::new(FeedbackVisuals::default()),
        }
    }
}

/// Implement `WidgetHandle` state accessors and `FeedbackSurface` by
/// delegating to the widget's `base` field.
macro_rules! impl_handle_base {
    ($ty:ty) => {
        impl $ty {
            /// Whether the error background tint is currently shown.
            pub fn error_tint(&self) -> bool {
                self.base.visuals.lock().tint
            }

            /// The error popup message currently shown, if any.
            pub fn popup_message(&self) -> Option<String> {
                self.base.visuals.lock().popup.clone()
            }

            /// Whether the "missing input" indicator is currently shown.
            pub fn missing_indicator(&self) -> bool {
                self.base.visuals.lock().missing
            }
        }

        impl FeedbackSurface for $ty {
            fn set_error_tint(&self, on: bool) {
                self.base.visuals.lock().tint = on;
            }

            fn show_error_popup(&self, message: &str) {
                self.base.visuals.lock().popup = Some(message.to_string());
            }

            fn hide_error_popup(&self) {
                self.base.visuals.lock().popup = None;
            }

            fn set_missing_indicator(&self, on: bool) {
                self.base.visuals.lock().missing = on;
            }
        }
    };
}

macro_rules! impl_handle_state {
    () => {
        fn name(&self) -> &str {
            &self.base.name
        }

        fn is_visible(&self) -> bool {
            self.base.state.lock().visible
        }

        fn set_visible(&self, visible: bool) {
            self.base.state.lock().visible = visible;
        }

        fn is_sensitive(&self) -> bool {
            self.base.state.lock().sensitive
        }

        fn set_sensitive(&self, sensitive: bool) {
            self.base.state.lock().sensitive = sensitive;
        }

        fn tooltip(&self) -> Option<String> {
            self.base.state.lock().tooltip.clone()
        }

        fn set_tooltip(&self, tooltip: Option<String>) {
            self.base.state.lock().tooltip = tooltip;
        }
    };
}

// =============================================================================
// Entry
// =============================================================================

/// Single-line text input.
///
/// # Signals
///
/// - `text_changed(String)`: the displayed text changed
/// - `activate(())`: editing confirmed (Enter)
pub struct Entry {
    base: HandleBase,
    text: Mutex<String>,
    /// Fired whenever the displayed text changes.
    pub text_changed: Signal<String>,
    /// Fired when editing is confirmed.
    pub activate: Signal<()>,
}

impl Entry {
    /// Create an empty entry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: HandleBase::new(name),
            text: Mutex::new(String::new()),
            text_changed: Signal::new(),
            activate: Signal::new(),
        }
    }

    /// Simulate the user replacing the entry content.
    pub fn type_text(&self, text: &str) {
        self.set_displayed_text(text);
    }

    /// Simulate the user pressing Enter.
    pub fn confirm(&self) {
        self.activate.emit(());
    }
}

impl WidgetHandle for Entry {
    impl_handle_state!();

    fn connect_signal(
        &self,
        signal: &str,
        slot: Box<dyn Fn() + Send + Sync>,
    ) -> Result<ConnectionId, ToolkitError> {
        match signal {
            "changed" => Ok(self.text_changed.connect(move |_| slot())),
            "activate" => Ok(self.activate.connect(move |_| slot())),
            _ => Err(ToolkitError::UnknownSignal {
                widget: self.base.name.clone(),
                signal: signal.to_string(),
            }),
        }
    }
}

impl TextWidget for Entry {
    fn displayed_text(&self) -> String {
        self.text.lock().clone()
    }

    fn set_displayed_text(&self, text: &str) {
        {
            let mut current = self.text.lock();
            if *current == text {
                return;
            }
            *current = text.to_string();
        }
        self.text_changed.emit(text.to_string());
    }

    fn text_changed(&self) -> &Signal<String> {
        &self.text_changed
    }
}

impl_handle_base!(Entry);

// =============================================================================
// TextArea
// =============================================================================

/// Multiline text view.
pub struct TextArea {
    base: HandleBase,
    buffer: Mutex<String>,
    /// Fired whenever the buffer changes.
    pub text_changed: Signal<String>,
}

impl TextArea {
    /// Create an empty text area.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: HandleBase::new(name),
            buffer: Mutex::new(String::new()),
            text_changed: Signal::new(),
        }
    }

    /// Simulate the user replacing the buffer content.
    pub fn type_text(&self, text: &str) {
        self.set_displayed_text(text);
    }
}

impl WidgetHandle for TextArea {
    impl_handle_state!();

    fn connect_signal(
        &self,
        signal: &str,
        slot: Box<dyn Fn() + Send + Sync>,
    ) -> Result<ConnectionId, ToolkitError> {
        match signal {
            "changed" => Ok(self.text_changed.connect(move |_| slot())),
            _ => Err(ToolkitError::UnknownSignal {
                widget: self.base.name.clone(),
                signal: signal.to_string(),
            }),
        }
    }
}

impl TextWidget for TextArea {
    fn displayed_text(&self) -> String {
        self.buffer.lock().clone()
    }

    fn set_displayed_text(&self, text: &str) {
        {
            let mut current = self.buffer.lock();
            if *current == text {
                return;
            }
            *current = text.to_string();
        }
        self.text_changed.emit(text.to_string());
    }

    fn text_changed(&self) -> &Signal<String> {
        &self.text_changed
    }
}

impl_handle_base!(TextArea);

// =============================================================================
// SpinButton
// =============================================================================

/// Numeric entry with step buttons and an optional range.
///
/// The displayed content is still text - the binding layer converts it.
pub struct SpinButton {
    base: HandleBase,
    text: Mutex<String>,
    range: Mutex<Option<(i64, i64)>>,
    step: Mutex<i64>,
    /// Fired whenever the displayed text changes.
    pub text_changed: Signal<String>,
}

impl SpinButton {
    /// Create an empty spin button.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: HandleBase::new(name),
            text: Mutex::new(String::new()),
            range: Mutex::new(None),
            step: Mutex::new(1),
            text_changed: Signal::new(),
        }
    }

    /// Constrain values reached through the step buttons.
    pub fn set_range(&self, minimum: i64, maximum: i64) {
        *self.range.lock() = Some((minimum.min(maximum), minimum.max(maximum)));
    }

    /// Set the step-button increment.
    pub fn set_step(&self, step: i64) {
        *self.step.lock() = step;
    }

    /// Simulate the user replacing the content.
    pub fn type_text(&self, text: &str) {
        self.set_displayed_text(text);
    }

    /// Simulate a click on the up button.
    pub fn step_up(&self) {
        self.step_by(*self.step.lock());
    }

    /// Simulate a click on the down button.
    pub fn step_down(&self) {
        self.step_by(-*self.step.lock());
    }

    fn step_by(&self, delta: i64) {
        let current = self.text.lock().trim().parse::<i64>().unwrap_or(0);
        let mut next = current.saturating_add(delta);
        if let Some((min, max)) = *self.range.lock() {
            next = next.clamp(min, max);
        }
        self.set_displayed_text(&next.to_string());
    }
}

impl WidgetHandle for SpinButton {
    impl_handle_state!();

    fn connect_signal(
        &self,
        signal: &str,
        slot: Box<dyn Fn() + Send + Sync>,
    ) -> Result<ConnectionId, ToolkitError> {
        match signal {
            "changed" => Ok(self.text_changed.connect(move |_| slot())),
            _ => Err(ToolkitError::UnknownSignal {
                widget: self.base.name.clone(),
                signal: signal.to_string(),
            }),
        }
    }
}

impl TextWidget for SpinButton {
    fn displayed_text(&self) -> String {
        self.text.lock().clone()
    }

    fn set_displayed_text(&self, text: &str) {
        {
            let mut current = self.text.lock();
            if *current == text {
                return;
            }
            *current = text.to_string();
        }
        self.text_changed.emit(text.to_string());
    }

    fn text_changed(&self) -> &Signal<String> {
        &self.text_changed
    }
}

impl_handle_base!(SpinButton);

// =============================================================================
// CheckButton / RadioButton
// =============================================================================

/// Two-state check button.
pub struct CheckButton {
    base: HandleBase,
    active: Mutex<bool>,
    /// Fired when the active state changes.
    pub toggled: Signal<bool>,
}

impl CheckButton {
    /// Create an unchecked button.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: HandleBase::new(name),
            active: Mutex::new(false),
            toggled: Signal::new(),
        }
    }

    /// Simulate a user click (invert the state).
    pub fn click(&self) {
        let next = !self.is_active();
        self.set_active(next);
    }
}

impl WidgetHandle for CheckButton {
    impl_handle_state!();

    fn connect_signal(
        &self,
        signal: &str,
        slot: Box<dyn Fn() + Send + Sync>,
    ) -> Result<ConnectionId, ToolkitError> {
        match signal {
            "toggled" | "clicked" => Ok(self.toggled.connect(move |_| slot())),
            _ => Err(ToolkitError::UnknownSignal {
                widget: self.base.name.clone(),
                signal: signal.to_string(),
            }),
        }
    }
}

impl ToggleWidget for CheckButton {
    fn is_active(&self) -> bool {
        *self.active.lock()
    }

    fn set_active(&self, active: bool) {
        {
            let mut current = self.active.lock();
            if *current == active {
                return;
            }
            *current = active;
        }
        self.toggled.emit(active);
    }

    fn toggled(&self) -> &Signal<bool> {
        &self.toggled
    }
}

impl_handle_base!(CheckButton);

/// One member of a radio-button set.
///
/// Exclusivity is managed by whoever groups the buttons (the binding
/// layer's radio-group adapter, here); a lone radio button behaves like a
/// check button.
pub struct RadioButton {
    base: HandleBase,
    active: Mutex<bool>,
    /// Fired when the active state changes.
    pub toggled: Signal<bool>,
}

impl RadioButton {
    /// Create an inactive radio button.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: HandleBase::new(name),
            active: Mutex::new(false),
            toggled: Signal::new(),
        }
    }

    /// Simulate a user click (activate; radios do not self-deactivate).
    pub fn click(&self) {
        self.set_active(true);
    }
}

impl WidgetHandle for RadioButton {
    impl_handle_state!();

    fn connect_signal(
        &self,
        signal: &str,
        slot: Box<dyn Fn() + Send + Sync>,
    ) -> Result<ConnectionId, ToolkitError> {
        match signal {
            "toggled" | "clicked" => Ok(self.toggled.connect(move |_| slot())),
            _ => Err(ToolkitError::UnknownSignal {
                widget: self.base.name.clone(),
                signal: signal.to_string(),
            }),
        }
    }
}

impl ToggleWidget for RadioButton {
    fn is_active(&self) -> bool {
        *self.active.lock()
    }

    fn set_active(&self, active: bool) {
        {
            let mut current = self.active.lock();
            if *current == active {
                return;
            }
            *current = active;
        }
        self.toggled.emit(active);
    }

    fn toggled(&self) -> &Signal<bool> {
        &self.toggled
    }
}

impl_handle_base!(RadioButton);

// =============================================================================
// ChoiceBox
// =============================================================================

/// Pick-one selection widget (combo box / option menu).
pub struct ChoiceBox {
    base: HandleBase,
    items: Mutex<Vec<String>>,
    selected: Mutex<Option<usize>>,
    /// Fired when the selection changes.
    pub selection_changed: Signal<Option<String>>,
}

impl ChoiceBox {
    /// Create an empty choice box.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: HandleBase::new(name),
            items: Mutex::new(Vec::new()),
            selected: Mutex::new(None),
            selection_changed: Signal::new(),
        }
    }

    /// Create a choice box with initial items.
    pub fn with_items(name: impl Into<String>, items: Vec<String>) -> Self {
        let choice = Self::new(name);
        *choice.items.lock() = items;
        choice
    }

    /// Simulate the user picking an item by display text.
    pub fn pick(&self, item: &str) -> bool {
        self.select(item)
    }
}

impl WidgetHandle for ChoiceBox {
    impl_handle_state!();

    fn connect_signal(
        &self,
        signal: &str,
        slot: Box<dyn Fn() + Send + Sync>,
    ) -> Result<ConnectionId, ToolkitError> {
        match signal {
            "changed" => Ok(self.selection_changed.connect(move |_| slot())),
            _ => Err(ToolkitError::UnknownSignal {
                widget: self.base.name.clone(),
                signal: signal.to_string(),
            }),
        }
    }
}

impl ChoiceWidget for ChoiceBox {
    fn items(&self) -> Vec<String> {
        self.items.lock().clone()
    }

    fn set_items(&self, items: Vec<String>) {
        *self.items.lock() = items;
        let had_selection = self.selected.lock().take().is_some();
        if had_selection {
            self.selection_changed.emit(None);
        }
    }

    fn selected(&self) -> Option<String> {
        let index = (*self.selected.lock())?;
        self.items.lock().get(index).cloned()
    }

    fn select(&self, item: &str) -> bool {
        let Some(index) = self.items.lock().iter().position(|i| i == item) else {
            return false;
        };
        {
            let mut selected = self.selected.lock();
            if *selected == Some(index) {
                return true;
            }
            *selected = Some(index);
        }
        self.selection_changed.emit(Some(item.to_string()));
        true
    }

    fn clear_selection(&self) {
        let had_selection = self.selected.lock().take().is_some();
        if had_selection {
            self.selection_changed.emit(None);
        }
    }

    fn selection_changed(&self) -> &Signal<Option<String>> {
        &self.selection_changed
    }
}

impl_handle_base!(ChoiceBox);

// =============================================================================
// Label
// =============================================================================

/// Display-only text widget. Has no interactive signals.
pub struct Label {
    base: HandleBase,
    text: Mutex<String>,
    /// Fired when the displayed text changes (programmatically).
    pub text_changed: Signal<String>,
}

impl Label {
    /// Create an empty label.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: HandleBase::new(name),
            text: Mutex::new(String::new()),
            text_changed: Signal::new(),
        }
    }
}

impl WidgetHandle for Label {
    impl_handle_state!();

    fn connect_signal(
        &self,
        signal: &str,
        _slot: Box<dyn Fn() + Send + Sync>,
    ) -> Result<ConnectionId, ToolkitError> {
        Err(ToolkitError::UnknownSignal {
            widget: self.base.name.clone(),
            signal: signal.to_string(),
        })
    }
}

impl TextWidget for Label {
    fn displayed_text(&self) -> String {
        self.text.lock().clone()
    }

    fn set_displayed_text(&self, text: &str) {
        {
            let mut current = self.text.lock();
            if *current == text {
                return;
            }
            *current = text.to_string();
        }
        self.text_changed.emit(text.to_string());
    }

    fn text_changed(&self) -> &Signal<String> {
        &self.text_changed
    }
}

impl_handle_base!(Label);

// =============================================================================
// HeadlessTree
// =============================================================================

/// A typed handle to one headless widget.
#[derive(Clone)]
pub enum HeadlessWidget {
    /// A single-line entry.
    Entry(Arc<Entry>),
    /// A multiline text area.
    TextArea(Arc<TextArea>),
    /// A numeric spin button.
    SpinButton(Arc<SpinButton>),
    /// A check button.
    CheckButton(Arc<CheckButton>),
    /// A radio button.
    RadioButton(Arc<RadioButton>),
    /// A choice box.
    ChoiceBox(Arc<ChoiceBox>),
    /// A display-only label.
    Label(Arc<Label>),
}

impl HeadlessWidget {
    /// The type-erased widget handle.
    pub fn handle(&self) -> Arc<dyn WidgetHandle> {
        match self {
            Self::Entry(w) => w.clone(),
            Self::TextArea(w) => w.clone(),
            Self::SpinButton(w) => w.clone(),
            Self::CheckButton(w) => w.clone(),
            Self::RadioButton(w) => w.clone(),
            Self::ChoiceBox(w) => w.clone(),
            Self::Label(w) => w.clone(),
        }
    }
}

/// An in-memory widget tree, playing the role of the UI-description loader.
#[derive(Default)]
pub struct HeadlessTree {
    widgets: Mutex<HashMap<String, HeadlessWidget>>,
}

macro_rules! add_widget_fn {
    ($fn_name:ident, $ty:ident, $variant:ident, $doc:literal) => {
        #[doc = $doc]
        pub fn $fn_name(&self, name: impl Into<String>) -> Arc<$ty> {
            let name = name.into();
            let widget = Arc::new($ty::new(name.clone()));
            self.widgets
                .lock()
                .insert(name, HeadlessWidget::$variant(widget.clone()));
            widget
        }
    };
}

impl HeadlessTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    add_widget_fn!(add_entry, Entry, Entry, "Add a single-line entry.");
    add_widget_fn!(add_text_area, TextArea, TextArea, "Add a multiline text area.");
    add_widget_fn!(add_spin_button, SpinButton, SpinButton, "Add a numeric spin button.");
    add_widget_fn!(add_check_button, CheckButton, CheckButton, "Add a check button.");
    add_widget_fn!(add_radio_button, RadioButton, RadioButton, "Add a radio button.");
    add_widget_fn!(add_choice_box, ChoiceBox, ChoiceBox, "Add a choice box.");
    add_widget_fn!(add_label, Label, Label, "Add a display-only label.");

    /// Look up a typed widget by name.
    pub fn get(&self, name: &str) -> Option<HeadlessWidget> {
        self.widgets.lock().get(name).cloned()
    }
}

impl WidgetTree for HeadlessTree {
    fn widget(&self, name: &str) -> Option<Arc<dyn WidgetHandle>> {
        self.widgets.lock().get(name).map(|w| w.handle())
    }

    fn widget_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.widgets.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_entry_set_text_emits_change() {
        let entry = Entry::new("name");
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_clone = fired.clone();
        entry.text_changed.connect(move |_| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        entry.set_displayed_text("hello");
        assert_eq!(entry.displayed_text(), "hello");
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Setting identical text is not a change.
        entry.set_displayed_text("hello");
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_entry_named_signals() {
        let entry = Entry::new("name");
        let fired = Arc::new(AtomicUsize::new(0));

        let fired_clone = fired.clone();
        entry
            .connect_signal("activate", Box::new(move || {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        entry.confirm();
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        let err = entry.connect_signal("no-such", Box::new(|| {})).unwrap_err();
        assert_eq!(
            err,
            ToolkitError::UnknownSignal {
                widget: "name".into(),
                signal: "no-such".into()
            }
        );
    }

    #[test]
    fn test_spin_button_steps_within_range() {
        let spin = SpinButton::new("count");
        spin.set_range(0, 10);
        spin.type_text("9");
        spin.step_up();
        assert_eq!(spin.displayed_text(), "10");
        spin.step_up();
        assert_eq!(spin.displayed_text(), "10");
        spin.step_down();
        assert_eq!(spin.displayed_text(), "9");
    }

    #[test]
    fn test_check_button_click_toggles() {
        let check = CheckButton::new("flag");
        let states = Arc::new(Mutex::new(Vec::new()));

        let states_clone = states.clone();
        check.toggled.connect(move |&on| {
            states_clone.lock().push(on);
        });

        check.click();
        check.click();
        assert_eq!(*states.lock(), vec![true, false]);
    }

    #[test]
    fn test_choice_box_selection() {
        let choice = ChoiceBox::with_items(
            "fruit",
            vec!["apple".to_string(), "banana".to_string()],
        );
        assert_eq!(choice.selected(), None);
        assert!(choice.select("banana"));
        assert_eq!(choice.selected(), Some("banana".to_string()));
        assert!(!choice.select("cherry"));
        assert_eq!(choice.selected(), Some("banana".to_string()));

        choice.clear_selection();
        assert_eq!(choice.selected(), None);
    }

    #[test]
    fn test_choice_box_set_items_clears_selection() {
        let choice = ChoiceBox::with_items("fruit", vec!["apple".to_string()]);
        choice.select("apple");
        let changes = Arc::new(Mutex::new(Vec::new()));

        let changes_clone = changes.clone();
        choice.selection_changed.connect(move |sel| {
            changes_clone.lock().push(sel.clone());
        });

        choice.set_items(vec!["pear".to_string()]);
        assert_eq!(choice.selected(), None);
        assert_eq!(*changes.lock(), vec![None]);
    }

    #[test]
    fn test_feedback_surface_state() {
        let entry = Entry::new("field");
        assert!(!entry.error_tint());
        entry.set_error_tint(true);
        entry.show_error_popup("broken");
        entry.set_missing_indicator(true);
        assert!(entry.error_tint());
        assert_eq!(entry.popup_message().as_deref(), Some("broken"));
        assert!(entry.missing_indicator());
        entry.hide_error_popup();
        assert_eq!(entry.popup_message(), None);
    }

    #[test]
    fn test_tree_lookup() {
        let tree = HeadlessTree::new();
        tree.add_entry("name");
        tree.add_check_button("subscribed");

        assert!(tree.widget("name").is_some());
        assert!(tree.widget("missing").is_none());
        assert_eq!(tree.widget_names(), vec!["name", "subscribed"]);
        assert_eq!(tree.widget("name").unwrap().name(), "name");
    }

    #[test]
    fn test_visibility_and_sensitivity() {
        let entry = Entry::new("field");
        assert!(entry.is_visible());
        assert!(entry.is_sensitive());
        entry.set_visible(false);
        entry.set_sensitive(false);
        assert!(!entry.is_visible());
        assert!(!entry.is_sensitive());
        entry.set_tooltip(Some("help".into()));
        assert_eq!(entry.tooltip().as_deref(), Some("help"));
    }
}
