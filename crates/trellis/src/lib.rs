//! Trellis - model/widget data binding for Rust GUI toolkits.
//!
//! Trellis keeps a plain data object's attributes synchronized with
//! interactive widgets: locale-aware type conversion in both directions,
//! deferred validation feedback that never loses already-valid state, and
//! feedback-loop suppression separating programmatic updates from user
//! edits. The host toolkit stays external, consumed through narrow traits.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::prelude::*;
//! use trellis_core::Scheduler;
//!
//! let scheduler = Arc::new(Scheduler::new());
//! let entry = Arc::new(trellis::toolkit::headless::Entry::new("age"));
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
//! entry.type_text("41");
//! assert_eq!(
//!     proxy.model().unwrap().lock().get_attribute("age"),
//!     Some(Value::Int(41))
//! );
//! ```

pub use trellis_core::*;

pub mod app;
pub mod binding;
pub mod convert;
pub mod defs;
pub mod prelude;
pub mod proxy;
pub mod toolkit;
pub mod validate;
