//! Core systems for Trellis.
//!
//! This crate provides the foundational components of the Trellis binding
//! framework:
//!
//! - **Signal/Slot System**: Type-safe notification with per-signal blocking
//! - **Scheduler**: Cooperative one-shot and repeating timers plus idle tasks
//!
//! Trellis assumes a single logical thread of control: the host toolkit's
//! event loop delivers widget callbacks and pumps the [`Scheduler`]. Nothing
//! here spawns threads or blocks.
//!
//! # Signal/Slot Example
//!
//! ```
//! use trellis_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Scheduler Example
//!
//! ```
//! use std::time::Duration;
//! use trellis_core::Scheduler;
//!
//! let scheduler = Scheduler::new();
//!
//! // Schedule a deferred task
//! scheduler.post(|| println!("idle task executed"));
//!
//! // Schedule a one-shot timer
//! let _timer_id = scheduler.after(Duration::from_secs(1), || {
//!     println!("timer fired");
//! });
//!
//! // The host event loop pumps the scheduler when idle
//! scheduler.pump();
//! ```

mod error;
pub mod logging;
mod scheduler;
pub mod signal;

pub use error::{CoreError, Result, SignalError, TimerError};
pub use scheduler::{Scheduler, TimerId, TimerKind};
pub use signal::{BlockScope, ConnectionGuard, ConnectionId, Signal};
