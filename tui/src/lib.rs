//! Scrollstory TUI - Terminal surface for scrollstory
//!
//! Presents a story document as a scrolling terminal page: narration on the
//! left, the active section's chart on the right, and a status line below.
//!
//! # Architecture
//!
//! - **Page**: the terminal page model; every collaborator the story engine needs
//! - **Document**: the JSON story format and its section behaviors
//! - **Chart**: bar-chart graphics driven by triggers and narration state
//! - **Render**: ratatui frame drawing from page snapshots
//! - **App**: crossterm event loop and jump prompt

pub mod app;
pub mod chart;
pub mod document;
pub mod page;
pub mod render;
pub mod scroll;
pub mod theme;
pub mod widgets;

pub use app::App;
pub use document::{DocumentError, StoryDocument};
pub use page::Page;
