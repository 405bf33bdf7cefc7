//! Story widgets

pub mod narration;

pub use narration::NarrationColumn;
