//! moodplay client core: turns detected facial emotions into playlist requests.
//!
//! The session loop in [`core`] owns all mutable state. Ticks, detection
//! results, backend responses and user intents arrive as [`core::SessionEvent`]s
//! and the loop answers with [`presentation::SessionUpdate`] broadcasts.

pub mod camera;
pub mod client;
pub mod controls;
pub mod core;
pub mod detection;
pub mod error;
pub mod gate;
pub mod geometry;
pub mod poller;
pub mod presentation;
pub mod replay;
pub mod session;
pub mod state;
