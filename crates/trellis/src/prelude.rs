//! Prelude module for Trellis.
//!
//! Re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use trellis::prelude::*;
//! ```

// ============================================================================
// Core (signals, scheduler)
// ============================================================================

pub use trellis_core::{ConnectionId, Scheduler, Signal, TimerId};

// ============================================================================
// Values and conversion
// ============================================================================

pub use crate::convert::{ConversionError, DataType, Value, ValueUpdate};

// ============================================================================
// Validation
// ============================================================================

pub use crate::validate::{
    FeedbackConfig, FeedbackPhase, FnValidator, PatternValidator, ValidationError, Validator,
};

// ============================================================================
// Binding
// ============================================================================

pub use crate::binding::{
    Adapter, AdapterExt, BindingError, ChoiceAdapter, DisplayAdapter, RadioGroupAdapter,
    TextAdapter, ToggleAdapter,
};

// ============================================================================
// Proxy
// ============================================================================

pub use crate::proxy::{
    Model, ModelError, Proxy, ProxyBuilder, ProxyConfig, Record, shared_model,
};

// ============================================================================
// Toolkit seam and composition
// ============================================================================

pub use crate::app::{Controller, Delegate, View};
pub use crate::toolkit::{
    ChoiceWidget, TextWidget, ToggleWidget, WidgetHandle, WidgetTree,
};
pub use crate::validate::FeedbackSurface;
