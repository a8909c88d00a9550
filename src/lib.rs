// Library root
// -----------
// This crate exposes the catalog client as a library. The binary
// (`main.rs`) wires the pieces together and runs the interactive menu.
//
// Module responsibilities:
// - `api`: the `Transport` seam and the reqwest-backed `ApiClient`.
// - `client`: `CatalogClient`, which validates input, calls the backend
//   and renders results through a `View`.
// - `endpoints`: which route serves an action for a given role.
// - `session`: session state and its persistence.
// - `view`, `html`, `terminal`: the view-binding layer and two views.
// - `ui`: the terminal menu that turns choices into client calls.
//
// Request and validation logic never touches a concrete view, so it can be
// exercised against a fake backend and an in-memory view.
pub mod api;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod html;
pub mod isbn;
pub mod models;
pub mod session;
pub mod terminal;
pub mod ui;
pub mod view;

pub use client::CatalogClient;
pub use error::ClientError;
