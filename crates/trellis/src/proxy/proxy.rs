//! The model proxy: one object owning the attribute-to-adapter mapping.
//!
//! A [`Proxy`] mediates every read and write between a model instance and
//! the widgets bound to its attributes:
//!
//! - on construction (and on every model swap) it pulls the model's current
//!   values through the converters and pushes them into the widgets;
//! - thereafter user edits flow widget → adapter `read()` → model write →
//!   the overridable `proxy_updated` hook, in that order, always;
//! - programmatic model changes flow the opposite way through
//!   [`Proxy::notify`] / [`Proxy::update`].
//!
//! Proxies are built with [`ProxyBuilder`]; every declaration - bindings,
//! radio groups, notify hooks, configuration - happens on the builder, so
//! nothing can be declared after construction completes.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::binding::TextAdapter;
//! use trellis::convert::{DataType, Value};
//! use trellis::proxy::{Model, ProxyBuilder, Record, shared_model};
//! use trellis::toolkit::TextWidget;
//! use trellis::toolkit::headless::Entry;
//! use trellis_core::Scheduler;
//!
//! let scheduler = Arc::new(Scheduler::new());
//! let entry = Arc::new(Entry::new("age"));
//! let adapter = TextAdapter::new(entry.clone(), scheduler);
//! adapter.set_data_type(DataType::Int);
//!
//! let mut model = Record::new();
//! model.set("age", Value::Int(40));
//!
//! let proxy = ProxyBuilder::new()
//!     .bind("age", adapter)
//!     .build(Some(shared_model(model)))
//!     .unwrap();
//!
//! assert_eq!(entry.displayed_text(), "40");
//! entry.type_text("41");
//! assert_eq!(
//!     proxy.model().unwrap().lock().get_attribute("age"),
//!     Some(Value::Int(41))
//! );
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::model::{Model, ModelError};
use crate::binding::{Adapter, AdapterExt, BindingError, GroupMember, RadioGroupAdapter};
use crate::convert::{Value, ValueUpdate};

/// Marker prefix that turns a widget-name list entry into a bound attribute.
///
/// Plain widget names must not contain the marker; the name space is
/// reserved for binding declarations.
pub const BIND_MARKER: char = ':';

/// A shared, lockable model instance.
pub type SharedModel = Arc<Mutex<dyn Model>>;

/// Wrap a model for sharing with a proxy.
pub fn shared_model<M: Model + 'static>(model: M) -> SharedModel {
    Arc::new(Mutex::new(model))
}

/// Produces adapters for named widgets, for marker-driven binding.
///
/// Implemented by widget-tree front ends that know their widgets' concrete
/// kinds and can pick the right adapter for each.
pub trait AdapterSource {
    /// Create an adapter binding `attribute` to the widget named
    /// `widget_name`.
    fn adapter(&self, attribute: &str, widget_name: &str)
    -> Result<Arc<dyn Adapter>, BindingError>;
}

/// Per-proxy warning switches.
///
/// Explicit configuration carried by each proxy - there are no process-wide
/// warning toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Warn when an attached model lacks a bound attribute (the captured
    /// widget default is used instead).
    pub warn_missing_attribute: bool,
    /// Warn when `notify` names an attribute this proxy does not bind.
    pub warn_unknown_notify: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            warn_missing_attribute: true,
            warn_unknown_notify: true,
        }
    }
}

/// Lifecycle state of a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    /// No model attached; widgets hold their defaults.
    Unattached,
    /// A model is attached and initialized into the widgets.
    Attached,
    /// Mid-swap inside [`Proxy::new_model`]; updates are suppressed.
    Swapping,
}

type NotifyHook = Arc<dyn Fn(&Proxy, &str, &ValueUpdate) + Send + Sync>;
type UpdatedHook = Arc<dyn Fn(&Proxy, &str, &Value) + Send + Sync>;
type WriteErrorHandler = Arc<dyn Fn(&Proxy, &str, &ModelError) + Send + Sync>;

/// Mediates between one model instance and the widgets bound to it.
///
/// Built by [`ProxyBuilder`]; the attribute-to-adapter mapping is immutable
/// for the proxy's lifetime.
pub struct Proxy {
    adapters: Vec<Arc<dyn Adapter>>,
    by_name: HashMap<String, usize>,
    model: Mutex<Option<SharedModel>>,
    model_type: Mutex<Option<(TypeId, &'static str)>>,
    state: Mutex<ProxyState>,
    notify_hooks: HashMap<String, NotifyHook>,
    updated_hook: Mutex<Option<UpdatedHook>>,
    write_error: Mutex<Option<WriteErrorHandler>>,
    config: ProxyConfig,
}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field("adapters", &self.adapters.len())
            .field("by_name", &self.by_name)
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Proxy {
    /// The current lifecycle state.
    pub fn state(&self) -> ProxyState {
        *self.state.lock()
    }

    /// The attached model, if any.
    pub fn model(&self) -> Option<SharedModel> {
        self.model.lock().clone()
    }

    /// The bound attribute names, in binding order.
    pub fn attributes(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.attribute()).collect()
    }

    fn adapter(&self, name: &str) -> Result<&Arc<dyn Adapter>, BindingError> {
        self.by_name
            .get(name)
            .map(|&index| &self.adapters[index])
            .ok_or_else(|| BindingError::UnknownAttribute(name.to_string()))
    }

    /// Read the current widget value for a bound attribute.
    ///
    /// Same contract as [`Adapter::read`]: `None` means invalid or missing
    /// content, with feedback state updated on the widget.
    pub fn read(&self, name: &str) -> Result<Option<Value>, BindingError> {
        Ok(self.adapter(name)?.read())
    }

    /// Push a value into the widget bound to `name`.
    ///
    /// With [`ValueUpdate::Unset`], the model's current value for `name`
    /// (or the captured default when no model is attached or the attribute
    /// is absent) is pushed instead.
    ///
    /// Adapters suppress model write-back for the duration of the display
    /// update in every case; pass `block = true` when calling from within
    /// that same attribute's own change notification so the suppression
    /// also spans the value fetch.
    pub fn update(&self, name: &str, value: ValueUpdate, block: bool) -> Result<(), BindingError> {
        let adapter = self.adapter(name)?;
        let guard = block.then(|| adapter.block_scope());

        let value = match value {
            ValueUpdate::Unset => {
                let model = self.model.lock().clone();
                let pulled = model.and_then(|m| m.lock().get_attribute(name));
                match pulled.or_else(|| adapter.default_value()) {
                    Some(v) => ValueUpdate::Value(v),
                    None => ValueUpdate::Null,
                }
            }
            other => other,
        };

        adapter.update(value);
        drop(guard);
        Ok(())
    }

    /// Model-side change notification entry point.
    ///
    /// If a notify hook was registered for `name` on the builder, the hook
    /// receives the call instead of the generic update - this is how an
    /// attribute's update logic is overridden (for example a menu that must
    /// repopulate before it can accept a new selection).
    pub fn notify(&self, name: &str, value: ValueUpdate) -> Result<(), BindingError> {
        if let Some(hook) = self.notify_hooks.get(name) {
            hook(self, name, &value);
            return Ok(());
        }
        match self.update(name, value, true) {
            Err(BindingError::UnknownAttribute(attr)) => {
                if self.config.warn_unknown_notify {
                    tracing::warn!(
                        target: "trellis::proxy",
                        attribute = %attr,
                        "notify for unbound attribute"
                    );
                }
                Err(BindingError::UnknownAttribute(attr))
            }
            other => other,
        }
    }

    /// Rebind to a different model instance.
    ///
    /// The new instance's type must match the old one's unless `relax_type`
    /// is set. Every adapter is re-initialized from the new model (absent
    /// attributes fall back to the captured defaults); updates are
    /// suppressed for the whole swap, so the swap is atomic from the
    /// caller's perspective - no transient display of the old model's data,
    /// and zero model writes.
    pub fn new_model(&self, model: SharedModel, relax_type: bool) -> Result<(), BindingError> {
        self.install_model(model, relax_type)
    }

    /// Install the hook invoked after every successful model write.
    pub fn set_updated_hook(
        &self,
        hook: impl Fn(&Proxy, &str, &Value) + Send + Sync + 'static,
    ) {
        *self.updated_hook.lock() = Some(Arc::new(hook));
    }

    /// Install the handler for model setters rejecting a write.
    ///
    /// Without a handler a rejected write is a wiring bug and panics; the
    /// handler makes it recoverable (e.g. by reverting the display).
    pub fn set_write_error_handler(
        &self,
        handler: impl Fn(&Proxy, &str, &ModelError) + Send + Sync + 'static,
    ) {
        *self.write_error.lock() = Some(Arc::new(handler));
    }

    fn install_model(&self, model: SharedModel, relax_type: bool) -> Result<(), BindingError> {
        let (type_id, type_name) = {
            let guard = model.lock();
            (guard.as_any().type_id(), guard.type_name())
        };

        if !relax_type
            && let Some((expected_id, expected_name)) = *self.model_type.lock()
            && expected_id != type_id
        {
            return Err(BindingError::ModelTypeMismatch {
                expected: expected_name.to_string(),
                got: type_name.to_string(),
            });
        }

        *self.state.lock() = ProxyState::Swapping;
        *self.model.lock() = Some(model.clone());
        *self.model_type.lock() = Some((type_id, type_name));

        for adapter in &self.adapters {
            // Held across the whole per-adapter swap, covering the model
            // read as well as the display update.
            let _suppress = adapter.block_scope();
            let attribute = adapter.attribute();
            let pulled = model.lock().get_attribute(&attribute);
            match pulled {
                Some(value) => adapter.update(ValueUpdate::Value(value)),
                None => {
                    if self.config.warn_missing_attribute {
                        tracing::warn!(
                            target: "trellis::proxy",
                            attribute = %attribute,
                            model = type_name,
                            "model lacks bound attribute, using widget default"
                        );
                    }
                    match adapter.default_value() {
                        Some(default) => adapter.update(ValueUpdate::Value(default)),
                        None => adapter.update(ValueUpdate::Null),
                    }
                }
            }
        }

        *self.state.lock() = ProxyState::Attached;
        tracing::debug!(target: "trellis::proxy", model = type_name, "model attached");
        Ok(())
    }

    /// The write half of the edit flow: called by adapter callbacks with a
    /// successfully-read value.
    fn write_model(&self, attribute: &str, value: Value) {
        let Ok(adapter) = self.adapter(attribute) else {
            return;
        };
        // Never write while the driving adapter is suppressed.
        if adapter.is_blocked() {
            return;
        }
        let model = self.model.lock().clone();
        let Some(model) = model else {
            // Unattached: edits accumulate in the widgets until a model
            // arrives.
            return;
        };

        let result = model.lock().set_attribute(attribute, value.clone());
        match result {
            Ok(()) => {
                tracing::trace!(
                    target: "trellis::proxy",
                    attribute,
                    value = ?value,
                    "model updated"
                );
                let hook = self.updated_hook.lock().clone();
                if let Some(hook) = hook {
                    hook(self, attribute, &value);
                }
            }
            Err(err) => {
                let handler = self.write_error.lock().clone();
                match handler {
                    Some(handler) => handler(self, attribute, &err),
                    None => panic!("model write for attribute '{attribute}' failed: {err}"),
                }
            }
        }
    }
}

impl Drop for Proxy {
    fn drop(&mut self) {
        for adapter in &self.adapters {
            adapter.detach();
        }
    }
}

/// Declares a proxy's bindings, groups, hooks, and configuration, then
/// builds it.
///
/// The builder is consumed by [`build`](Self::build); declarations after
/// construction are unrepresentable.
#[derive(Default)]
pub struct ProxyBuilder {
    bindings: Vec<(String, Arc<dyn Adapter>)>,
    notify_hooks: HashMap<String, NotifyHook>,
    updated_hook: Option<UpdatedHook>,
    write_error: Option<WriteErrorHandler>,
    config: ProxyConfig,
}

impl std::fmt::Debug for ProxyBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyBuilder")
            .field("bindings", &self.bindings.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProxyBuilder {
    /// Start an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit warning configuration.
    pub fn with_config(mut self, config: ProxyConfig) -> Self {
        self.config = config;
        self
    }

    /// Bind an attribute to an adapter.
    pub fn bind<A: Adapter + 'static>(
        mut self,
        attribute: impl Into<String>,
        adapter: Arc<A>,
    ) -> Self {
        self.bindings
            .push((attribute.into(), adapter as Arc<dyn Adapter>));
        self
    }

    /// Bind the marker-prefixed entries of a widget-name list.
    ///
    /// Entries starting with [`BIND_MARKER`] declare attributes bound to
    /// the same-named widget, resolved through `source`; other entries are
    /// plain widgets and are ignored here.
    pub fn bind_widgets(
        mut self,
        source: &dyn AdapterSource,
        names: &[&str],
    ) -> Result<Self, BindingError> {
        for name in names {
            let Some(attribute) = name.strip_prefix(BIND_MARKER) else {
                continue;
            };
            let adapter = source.adapter(attribute, attribute)?;
            self.bindings.push((attribute.to_string(), adapter));
        }
        Ok(self)
    }

    /// Declare a radio-button group jointly representing `attribute`.
    pub fn group_radiobuttons<W: GroupMember + 'static>(
        self,
        attribute: impl Into<String>,
        members: Vec<(Arc<W>, Value)>,
    ) -> Self {
        let adapter = RadioGroupAdapter::new(members);
        self.bind(attribute, adapter)
    }

    /// Register a notify hook overriding the generic update for `attribute`.
    pub fn on_notify(
        mut self,
        attribute: impl Into<String>,
        hook: impl Fn(&Proxy, &str, &ValueUpdate) + Send + Sync + 'static,
    ) -> Self {
        self.notify_hooks.insert(attribute.into(), Arc::new(hook));
        self
    }

    /// Register the hook invoked after every successful model write.
    pub fn on_updated(
        mut self,
        hook: impl Fn(&Proxy, &str, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.updated_hook = Some(Arc::new(hook));
        self
    }

    /// Register the handler for model setters rejecting a write.
    pub fn on_write_error(
        mut self,
        handler: impl Fn(&Proxy, &str, &ModelError) + Send + Sync + 'static,
    ) -> Self {
        self.write_error = Some(Arc::new(handler));
        self
    }

    /// Attach every adapter, capture widget defaults, optionally install a
    /// model, and produce the proxy.
    ///
    /// Fails on duplicate attribute names, adapters already attached
    /// elsewhere, or missing converters.
    pub fn build(self, model: Option<SharedModel>) -> Result<Arc<Proxy>, BindingError> {
        let mut by_name = HashMap::new();
        for (index, (name, _)) in self.bindings.iter().enumerate() {
            if by_name.insert(name.clone(), index).is_some() {
                return Err(BindingError::DuplicateAttribute(name.clone()));
            }
        }

        let adapters: Vec<Arc<dyn Adapter>> =
            self.bindings.into_iter().map(|(_, adapter)| adapter).collect();
        for (name, &index) in &by_name {
            adapters[index].attach(name)?;
        }

        // The widget contents at this point are the attribute defaults,
        // used whenever a bound model lacks an attribute.
        for adapter in &adapters {
            adapter.capture_default();
        }

        let proxy = Arc::new(Proxy {
            adapters,
            by_name,
            model: Mutex::new(None),
            model_type: Mutex::new(None),
            state: Mutex::new(ProxyState::Unattached),
            notify_hooks: self.notify_hooks,
            updated_hook: Mutex::new(self.updated_hook),
            write_error: Mutex::new(self.write_error),
            config: self.config,
        });

        for adapter in &proxy.adapters {
            let weak = Arc::downgrade(&proxy);
            adapter.set_user_write_handler(Arc::new(move |attribute, value| {
                if let Some(proxy) = weak.upgrade() {
                    proxy.write_model(attribute, value);
                }
            }));
        }

        if let Some(model) = model {
            proxy.install_model(model, true)?;
        }
        Ok(proxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{ChoiceAdapter, TextAdapter, ToggleAdapter};
    use crate::convert::DataType;
    use crate::proxy::Record;
    use crate::toolkit::ChoiceWidget;
    use crate::toolkit::TextWidget;
    use crate::toolkit::ToggleWidget;
    use crate::toolkit::headless::{CheckButton, ChoiceBox, Entry, RadioButton};
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trellis_core::Scheduler;

    fn int_entry(name: &str) -> (Arc<Entry>, Arc<TextAdapter>) {
        let scheduler = Arc::new(Scheduler::new());
        let entry = Arc::new(Entry::new(name));
        let adapter = TextAdapter::new(entry.clone(), scheduler);
        adapter.set_data_type(DataType::Int);
        (entry, adapter)
    }

    /// Record wrapper that counts writes.
    struct CountingModel {
        inner: Record,
        writes: Arc<AtomicUsize>,
    }

    impl Model for CountingModel {
        fn get_attribute(&self, path: &str) -> Option<Value> {
            self.inner.get_attribute(path)
        }
        fn set_attribute(&mut self, path: &str, value: Value) -> Result<(), ModelError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set_attribute(path, value)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn type_name(&self) -> &'static str {
            "CountingModel"
        }
    }

    /// Model whose setter rejects negative ages.
    struct PickyModel {
        inner: Record,
    }

    impl Model for PickyModel {
        fn get_attribute(&self, path: &str) -> Option<Value> {
            self.inner.get_attribute(path)
        }
        fn set_attribute(&mut self, path: &str, value: Value) -> Result<(), ModelError> {
            if path == "age" && value.as_int().is_some_and(|v| v < 0) {
                return Err(ModelError::Rejected {
                    attribute: path.to_string(),
                    message: "age cannot be negative".to_string(),
                });
            }
            self.inner.set_attribute(path, value)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn type_name(&self) -> &'static str {
            "PickyModel"
        }
    }

    #[test]
    fn test_scenario_bind_before_model_then_attach() {
        // Bind `age` (integer) with no model attached; entering "25" and
        // reading returns 25; attaching a model with age=40 afterwards
        // updates the display to "40".
        let (entry, adapter) = int_entry("age");
        let proxy = ProxyBuilder::new().bind("age", adapter).build(None).unwrap();
        assert_eq!(proxy.state(), ProxyState::Unattached);

        entry.type_text("25");
        assert_eq!(proxy.read("age").unwrap(), Some(Value::Int(25)));

        let mut model = Record::new();
        model.set("age", Value::Int(40));
        proxy.new_model(shared_model(model), true).unwrap();

        assert_eq!(entry.displayed_text(), "40");
        assert_eq!(proxy.state(), ProxyState::Attached);
    }

    #[test]
    fn test_user_edit_writes_model_and_fires_hook() {
        let (entry, adapter) = int_entry("age");
        let mut model = Record::new();
        model.set("age", Value::Int(10));

        let updates = Arc::new(Mutex::new(Vec::new()));
        let updates_clone = updates.clone();
        let proxy = ProxyBuilder::new()
            .bind("age", adapter)
            .on_updated(move |_, attribute, value| {
                updates_clone.lock().push((attribute.to_string(), value.clone()));
            })
            .build(Some(shared_model(model)))
            .unwrap();

        entry.type_text("25");
        assert_eq!(
            proxy.model().unwrap().lock().get_attribute("age"),
            Some(Value::Int(25))
        );
        assert_eq!(*updates.lock(), vec![("age".to_string(), Value::Int(25))]);
    }

    #[test]
    fn test_invalid_edit_never_reaches_model() {
        let (entry, adapter) = int_entry("age");
        let mut model = Record::new();
        model.set("age", Value::Int(10));
        let proxy = ProxyBuilder::new()
            .bind("age", adapter)
            .build(Some(shared_model(model)))
            .unwrap();

        entry.type_text("not a number");
        // The model keeps its last valid value.
        assert_eq!(
            proxy.model().unwrap().lock().get_attribute("age"),
            Some(Value::Int(10))
        );
    }

    #[test]
    fn test_update_triggers_zero_model_writes() {
        let (entry, adapter) = int_entry("age");
        let writes = Arc::new(AtomicUsize::new(0));
        let mut inner = Record::new();
        inner.set("age", Value::Int(1));
        let model = CountingModel {
            inner,
            writes: writes.clone(),
        };

        let proxy = ProxyBuilder::new()
            .bind("age", adapter)
            .build(Some(shared_model(model)))
            .unwrap();
        assert_eq!(writes.load(Ordering::SeqCst), 0);

        proxy
            .update("age", ValueUpdate::Value(Value::Int(77)), false)
            .unwrap();
        assert_eq!(entry.displayed_text(), "77");
        assert_eq!(proxy.read("age").unwrap(), Some(Value::Int(77)));
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_update_unset_pulls_model_value() {
        let (entry, adapter) = int_entry("age");
        let mut model = Record::new();
        model.set("age", Value::Int(30));
        let model = shared_model(model);
        let proxy = ProxyBuilder::new()
            .bind("age", adapter)
            .build(Some(model.clone()))
            .unwrap();

        // The model changes behind the proxy's back...
        model
            .lock()
            .set_attribute("age", Value::Int(31))
            .unwrap();
        assert_eq!(entry.displayed_text(), "30");

        // ...and an unset update pulls the current value in.
        proxy.update("age", ValueUpdate::Unset, false).unwrap();
        assert_eq!(entry.displayed_text(), "31");
    }

    #[test]
    fn test_new_model_swap_is_atomic() {
        let (entry, adapter) = int_entry("age");
        let writes = Arc::new(AtomicUsize::new(0));
        let mut inner = Record::new();
        inner.set("age", Value::Int(1));
        let m1 = CountingModel {
            inner,
            writes: writes.clone(),
        };
        let proxy = ProxyBuilder::new()
            .bind("age", adapter)
            .build(Some(shared_model(m1)))
            .unwrap();
        assert_eq!(entry.displayed_text(), "1");

        // Record every display change during the swap.
        let history = Arc::new(Mutex::new(Vec::new()));
        let history_clone = history.clone();
        entry.text_changed.connect(move |text| {
            history_clone.lock().push(text.clone());
        });

        let mut inner = Record::new();
        inner.set("age", Value::Int(2));
        let m2 = CountingModel {
            inner,
            writes: writes.clone(),
        };
        proxy.new_model(shared_model(m2), false).unwrap();

        assert_eq!(entry.displayed_text(), "2");
        // One transition, straight to the new model's value - no flicker
        // through the old one.
        assert_eq!(*history.lock(), vec!["2".to_string()]);
        // The swap wrote nothing into either model.
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_new_model_type_check() {
        let (_, adapter) = int_entry("age");
        let mut record = Record::new();
        record.set("age", Value::Int(1));
        let proxy = ProxyBuilder::new()
            .bind("age", adapter)
            .build(Some(shared_model(record)))
            .unwrap();

        let mut inner = Record::new();
        inner.set("age", Value::Int(2));
        let other = CountingModel {
            inner,
            writes: Arc::new(AtomicUsize::new(0)),
        };
        let err = proxy
            .new_model(shared_model(other), false)
            .unwrap_err();
        assert_eq!(
            err,
            BindingError::ModelTypeMismatch {
                expected: "Record".into(),
                got: "CountingModel".into()
            }
        );

        // relax_type accepts the different instance type.
        let mut inner = Record::new();
        inner.set("age", Value::Int(2));
        let other = CountingModel {
            inner,
            writes: Arc::new(AtomicUsize::new(0)),
        };
        proxy.new_model(shared_model(other), true).unwrap();
    }

    #[test]
    fn test_model_missing_attribute_falls_back_to_widget_default() {
        let (entry, adapter) = int_entry("age");
        entry.type_text("18");

        let proxy = ProxyBuilder::new()
            .with_config(ProxyConfig {
                warn_missing_attribute: false,
                ..ProxyConfig::default()
            })
            .bind("age", adapter)
            .build(None)
            .unwrap();

        // The model knows nothing about `age`; the captured default wins.
        proxy.new_model(shared_model(Record::new()), true).unwrap();
        assert_eq!(entry.displayed_text(), "18");
        assert_eq!(proxy.read("age").unwrap(), Some(Value::Int(18)));
    }

    #[test]
    fn test_scenario_radio_group_sex() {
        let male = Arc::new(RadioButton::new("sex_male"));
        let female = Arc::new(RadioButton::new("sex_female"));
        let mut model = Record::new();
        model.set("sex", Value::Str("M".into()));

        let proxy = ProxyBuilder::new()
            .group_radiobuttons(
                "sex",
                vec![
                    (male.clone(), Value::Str("M".into())),
                    (female.clone(), Value::Str("F".into())),
                ],
            )
            .build(Some(shared_model(model)))
            .unwrap();
        assert!(male.is_active());

        proxy
            .update("sex", ValueUpdate::Value(Value::Str("F".into())), false)
            .unwrap();
        assert!(female.is_active());
        assert!(!male.is_active());
        assert_eq!(proxy.read("sex").unwrap(), Some(Value::Str("F".into())));

        // A user click flows into the model.
        male.click();
        assert_eq!(
            proxy.model().unwrap().lock().get_attribute("sex"),
            Some(Value::Str("M".into()))
        );
    }

    #[test]
    fn test_notify_updates_display() {
        let (entry, adapter) = int_entry("age");
        let mut model = Record::new();
        model.set("age", Value::Int(5));
        let model = shared_model(model);
        let proxy = ProxyBuilder::new()
            .bind("age", adapter)
            .build(Some(model.clone()))
            .unwrap();

        model.lock().set_attribute("age", Value::Int(6)).unwrap();
        proxy.notify("age", ValueUpdate::Unset).unwrap();
        assert_eq!(entry.displayed_text(), "6");
    }

    #[test]
    fn test_notify_hook_overrides_generic_update() {
        let choice = Arc::new(ChoiceBox::new("city"));
        let adapter = ChoiceAdapter::new(
            choice.clone(),
            DataType::Str,
            vec![("Lisbon".to_string(), Value::Str("Lisbon".into()))],
        );
        let adapter_for_hook = adapter.clone();

        let mut model = Record::new();
        model.set("city", Value::Str("Lisbon".into()));

        // The hook repopulates the menu before accepting the new value.
        let proxy = ProxyBuilder::new()
            .bind("city", adapter)
            .on_notify("city", move |proxy, name, value| {
                if let ValueUpdate::Value(Value::Str(city)) = value {
                    adapter_for_hook
                        .set_choices(vec![(city.clone(), Value::Str(city.clone().into()))]);
                }
                proxy.update(name, value.clone(), true).unwrap();
            })
            .build(Some(shared_model(model)))
            .unwrap();

        proxy
            .notify("city", ValueUpdate::Value(Value::Str("Porto".into())))
            .unwrap();
        assert_eq!(choice.selected().as_deref(), Some("Porto"));
        assert_eq!(proxy.read("city").unwrap(), Some(Value::Str("Porto".into())));
    }

    #[test]
    fn test_write_error_routed_to_handler() {
        let (entry, adapter) = int_entry("age");
        let mut inner = Record::new();
        inner.set("age", Value::Int(3));
        let model = PickyModel { inner };

        let rejections = Arc::new(Mutex::new(Vec::new()));
        let rejections_clone = rejections.clone();
        let proxy = ProxyBuilder::new()
            .bind("age", adapter)
            .on_write_error(move |proxy, attribute, _err| {
                rejections_clone.lock().push(attribute.to_string());
                // Revert the display to the model's value.
                proxy.update(attribute, ValueUpdate::Unset, true).unwrap();
            })
            .build(Some(shared_model(model)))
            .unwrap();

        entry.type_text("-4");
        assert_eq!(*rejections.lock(), vec!["age".to_string()]);
        // The handler reverted the display; the model kept its value.
        assert_eq!(entry.displayed_text(), "3");
        assert_eq!(
            proxy.model().unwrap().lock().get_attribute("age"),
            Some(Value::Int(3))
        );
    }

    #[test]
    fn test_unknown_attribute_errors() {
        let (_, adapter) = int_entry("age");
        let proxy = ProxyBuilder::new().bind("age", adapter).build(None).unwrap();
        assert_eq!(
            proxy.update("height", ValueUpdate::Null, false),
            Err(BindingError::UnknownAttribute("height".into()))
        );
        assert_eq!(
            proxy.read("height").unwrap_err(),
            BindingError::UnknownAttribute("height".into())
        );
    }

    #[test]
    fn test_duplicate_attribute_rejected_at_build() {
        let (_, a1) = int_entry("age");
        let (_, a2) = int_entry("age2");
        let err = ProxyBuilder::new()
            .bind("age", a1)
            .bind("age", a2)
            .build(None)
            .unwrap_err();
        assert_eq!(err, BindingError::DuplicateAttribute("age".into()));
    }

    #[test]
    fn test_adapter_cannot_serve_two_proxies() {
        let (_, adapter) = int_entry("age");
        let _first = ProxyBuilder::new()
            .bind("age", adapter.clone())
            .build(None)
            .unwrap();
        let err = ProxyBuilder::new()
            .bind("age", adapter)
            .build(None)
            .unwrap_err();
        assert_eq!(err, BindingError::AlreadyAttached("age".into()));
    }

    #[test]
    fn test_toggle_binding_through_proxy() {
        let scheduler = Arc::new(Scheduler::new());
        let check = Arc::new(CheckButton::new("subscribed"));
        let adapter = ToggleAdapter::new(check.clone(), scheduler);

        let mut model = Record::new();
        model.set("subscribed", Value::Bool(true));
        let proxy = ProxyBuilder::new()
            .bind("subscribed", adapter)
            .build(Some(shared_model(model)))
            .unwrap();
        assert!(check.is_active());

        check.click();
        assert_eq!(
            proxy.model().unwrap().lock().get_attribute("subscribed"),
            Some(Value::Bool(false))
        );
    }

    #[test]
    fn test_dotted_attribute_paths() {
        let scheduler = Arc::new(Scheduler::new());
        let entry = Arc::new(Entry::new("city"));
        let adapter = TextAdapter::new(entry.clone(), scheduler);

        let mut address = Record::new();
        address.set("city", Value::Str("Berlin".into()));
        let mut person = Record::new();
        person.insert_child("address", address);

        let proxy = ProxyBuilder::new()
            .bind("address.city", adapter)
            .build(Some(shared_model(person)))
            .unwrap();
        assert_eq!(entry.displayed_text(), "Berlin");

        entry.type_text("Hamburg");
        assert_eq!(
            proxy.model().unwrap().lock().get_attribute("address.city"),
            Some(Value::Str("Hamburg".into()))
        );
    }
}
