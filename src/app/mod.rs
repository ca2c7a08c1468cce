//! Application module for the explorer window.
//!
//! | Sub-module         | Responsibility |
//! | ------------------ | -------------- |
//! | [`orchestrator`]   | Application state, reactions to gestures and backend replies |
//! | [`explorer_app`]   | [`ExplorerApp`] (eframe) wrapper and per-frame driving |
//! | `layout`           | Menu bar, status line and view arrangement |
//! | [`run`]            | Top-level [`run_explorer()`] entry point |

pub mod explorer_app;
mod layout;
pub mod orchestrator;
pub mod run;

pub use explorer_app::ExplorerApp;
pub use orchestrator::{AppState, Orchestrator};
pub use run::{run_explorer, RunError};
