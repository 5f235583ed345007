//! Model proxies: mediated synchronization between models and widgets.
//!
//! This module owns the attribute-to-adapter mapping and all model traffic:
//!
//! - [`Model`] - the named-attribute seam an application object implements
//! - [`Record`] - a map-backed model with nested children
//! - [`Proxy`] / [`ProxyBuilder`] - the mediator and its declaration API
//! - [`ProxyConfig`] - per-proxy warning switches
//!
//! See the [`proxy`](self) module-level types for the full control flow; in
//! short: construction pulls model values into widgets, user edits push
//! converted values back into the model, and [`Proxy::notify`] is the entry
//! point for programmatic model changes.

mod model;
#[allow(clippy::module_inception)]
mod proxy;

pub use model::{Model, ModelError, Record};
pub use proxy::{
    AdapterSource, BIND_MARKER, Proxy, ProxyBuilder, ProxyConfig, ProxyState, SharedModel,
    shared_model,
};
