// UI module - presentation logic for the host surface
//
// This module contains:
// - ResultView / status_message: what the host renders from AppState
// - spawn_presenter: background thread turning state changes into display lines

pub mod presenter;

pub use presenter::{ResultView, render_change, spawn_presenter, status_message};
