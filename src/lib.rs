//! linkplot crate root: re-exports and module wiring.
//!
//! linkplot is a linked-views explorer built on egui/eframe. A dataset of
//! projected points is shown as a scatterplot (and optionally as a node-link
//! network); drawing a lasso on either view selects points, recolors every
//! view and asks a WebSocket backend for aggregates over the selection.
//!
//! Modules:
//! - `data`: dataset, geometry, lasso capture, selection and network sampling
//! - `views`: renderable views and the registry that fans out updates
//! - `protocol`: request / reply types and their JSON encoding
//! - `client`: the WebSocket message client
//! - `app`: orchestrator, eframe application and `run_explorer`
//! - `config`, `events`, `color_scheme`: settings, event bus and colors

pub mod app;
pub mod client;
pub mod color_scheme;
pub mod config;
pub mod data;
pub mod events;
pub mod protocol;
pub mod views;

pub use app::{run_explorer, ExplorerApp, Orchestrator, RunError};
pub use client::{ClientError, ClientNotice, ConnectionState, MessageClient, SendOutcome};
pub use color_scheme::{ColorScheme, LabelPalette};
pub use config::{ConfigError, ExplorerConfig, ExplorerSettings, FeatureFlags};
pub use data::selection::Selection;
pub use events::{EventController, EventFilter, EventKind, ExplorerEvent};
pub use protocol::{Action, ProtocolError, Reply, Request};
