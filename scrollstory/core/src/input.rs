//! Keyboard Navigation
//!
//! Surface-neutral key and focus types, and the mapping from keys to
//! navigation commands. A surface calls [`command_for_key`] synchronously to
//! decide whether to suppress its own default scrolling for a key.

use serde::{Deserialize, Serialize};

use crate::navigation::NavigationCommand;

/// Keys the story reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoryKey {
    /// Space bar
    Space,
    /// Arrow up
    ArrowUp,
    /// Arrow down
    ArrowDown,
    /// Arrow left
    ArrowLeft,
    /// Arrow right
    ArrowRight,
    /// Anything else
    Other,
}

/// Where keyboard focus was when the key was pressed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Focus {
    /// The page itself
    Body,
    /// An interactive element (input, button, ...)
    Element,
}

/// Input forwarded by a surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceInput {
    /// A key was pressed
    Key {
        /// Which key
        key: StoryKey,
        /// Focus at press time
        focus: Focus,
    },
    /// The viewport was resized
    Resized {
        /// New width, in surface units
        width: u32,
        /// New height, in surface units
        height: u32,
    },
}

/// Navigation command for a key press, if any
///
/// `Some(_)` means the story handles the key and the surface must not apply
/// its default scroll.
#[must_use]
pub fn command_for_key(key: StoryKey, focus: Focus) -> Option<NavigationCommand> {
    if focus != Focus::Body {
        return None;
    }
    match key {
        StoryKey::Space | StoryKey::ArrowDown | StoryKey::ArrowRight => {
            Some(NavigationCommand::Next)
        }
        StoryKey::ArrowUp | StoryKey::ArrowLeft => Some(NavigationCommand::Previous),
        StoryKey::Other => None,
    }
}
