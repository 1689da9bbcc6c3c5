//! Property panel: live editing of scene fields through explicit bindings.
//!
//! Each editable field is a small read/write adapter ([`bindings::FieldBinding`])
//! over the scene, and the egui layer ([`ui::ScenePanel`]) renders one widget
//! per binding. Every successful write emits exactly one render notification;
//! the frame scheduler coalesces them.
//!
//! # Invariants
//! - Writes go through bindings; the panel never reaches into the scene
//!   directly.
//! - A rejected edit (bad hex, missing cube) leaves the scene untouched and
//!   emits no notification.

pub mod bindings;
pub mod ui;

pub use bindings::{ColorField, FieldBinding, PanelError, ScaleXField, format_hex, parse_hex};
pub use ui::ScenePanel;
