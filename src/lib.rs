//! Scroll-synchronized section navigation.
//!
//! The core ([`controller`] and the components it drives) is written against
//! [`page::PageDocument`], so the same logic runs over a browser DOM
//! (`web`, wasm32 only) and over the in-memory [`document::MarkdownPage`]
//! used by the terminal viewer.

pub mod active_set;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod document;
pub mod menu;
pub mod navigator;
pub mod page;
pub mod sync;
pub mod timer;
pub mod viewport;

#[cfg(not(target_arch = "wasm32"))]
pub mod viewer;
#[cfg(not(target_arch = "wasm32"))]
pub mod watch;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
mod testing;
