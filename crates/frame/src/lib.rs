//! Render-on-demand frame scheduling.
//!
//! The viewer draws a frame only when something changed: an input event, a
//! panel edit, a resize, or camera inertia still settling. Everything else
//! is idle time. The scheduler that enforces this lives here, decoupled from
//! windowing and GPU code so its coalescing behavior can be tested directly.
//!
//! # Invariants
//! - At most one deferred wakeup is outstanding at any time; `request_render`
//!   coalesces bursts of requests into a single scheduled frame.
//! - `run_frame` clears the coalescing flag before driving the pipeline, so
//!   changes produced *during* a frame schedule a follow-up frame instead of
//!   being swallowed.
//! - Direct `run_frame` calls (the startup seed, resize) bypass coalescing.

pub mod scheduler;

pub use scheduler::{Deferral, FramePipeline, RenderScheduler, RenderSignal};
