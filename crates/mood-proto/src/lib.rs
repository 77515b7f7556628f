//! Types shared between the playlist daemon and the moodplay client.

pub mod catalog;
pub mod config;
pub mod platform;
pub mod protocol;
