//! Floating-ball launcher core: a grid of app tiles that can be dragged to
//! reorder, held against a neighbour to combine into a group, filtered by
//! name and persisted as JSON. The desktop shell in `main.rs` hosts it in an
//! always-on-top window.

pub mod combine;
pub mod config;
pub mod dock;
pub mod drag;
pub mod easing;
pub mod engine;
pub mod entry;
pub mod error;
pub mod events;
pub mod icons;
pub mod launch;
pub mod layout;
pub mod store;
pub mod transition;
