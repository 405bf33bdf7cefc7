//! Scrollstory Core - Headless Scrollytelling Engine
//!
//! A story is an ordered list of sections; each section pairs a graphic with
//! narration blocks ("steps") that scroll past it. This crate tracks which
//! step is current, turns narration triggers into graphic state, and offers
//! imperative navigation that cooperates with organic scrolling.
//!
//! It renders nothing itself. Surfaces plug in through the traits in
//! [`surface`] and drive the engine with step events and input.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Surfaces                                │
//! │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────────┐  │
//! │   │ StorySurface │   │ ScrollDriver │   │ StepObserver / Input │  │
//! │   └──────▲───────┘   └──────▲───────┘   └──────────┬───────────┘  │
//! └──────────┼──────────────────┼──────────────────────┼──────────────┘
//!            │ visual state     │ scroll_into_view     │ StepEvent / SurfaceInput
//! ┌──────────┼──────────────────┼──────────────────────┼──────────────┐
//! │          │          SCROLLSTORY CORE               │              │
//! │   ┌──────┴────────────┐  ┌──┴───────────────────┐  │              │
//! │   │ StepEventHandlers │◀─│ NavigationController │◀─┤ (keys)       │
//! │   └──────┬────────────┘  └──────────────────────┘  │              │
//! │          │   ▲                                     │              │
//! │          │   └─────────────────────────────────────┘ (steps)      │
//! │          ▼                                                        │
//! │   TriggerResolver ──▶ SectionBehavior callbacks                   │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Story`] / [`StoryBuilder`]: validate sections and render them
//! - [`RenderedStory`]: owns the running subscriptions
//! - [`NavigationController`]: `scroll_to`, next and previous
//! - [`StepEventHandlers`]: enter/exit/progress handling
//! - [`SectionBehavior`]: author hooks for graphics and callbacks
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod behavior;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod input;
pub mod model;
pub mod naming;
pub mod navigation;
pub mod source;
pub mod state;
pub mod story;
pub mod surface;
pub mod trigger;

pub use behavior::{NoopBehavior, SectionBehavior};
pub use error::{NavigationError, StoryError};
pub use events::{Direction, NarrationPayload, StepEvent, StepProgress, StepTransition};
pub use handlers::{progress_through_trigger, StepEventHandlers};
pub use input::{command_for_key, Focus, StoryKey, SurfaceInput};
pub use model::{Narration, Section, SectionConfig, SectionId, SectionList};
pub use naming::{DefaultNaming, ElementId, NamingStrategy};
pub use navigation::{
    alignment_hint, NarrationTarget, NavigationCommand, NavigationController, NavigationOutcome,
    TargetResolution,
};
pub use source::{NarrationSource, StaticNarration};
pub use state::{NavigationState, Position};
pub use story::{Collaborators, RenderedStory, SectionRuntime, Story, StoryBuilder};
pub use surface::{
    ElementRect, InputSource, ObserverBinding, ObserverHandle, ObserverSetup, ScrollAlign,
    ScrollDriver, ScrollOptions, StepObserver, StorySurface, SurfaceError,
};
pub use trigger::{resolve, ResolvedTrigger, StateMap, Trigger, TriggerContext, TRIGGER_OFFSET};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigSource,
    ScrollstoryToml, StorySettings,
};
