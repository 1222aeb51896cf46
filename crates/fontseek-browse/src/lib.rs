//! Front-end seams for fontseek.
//!
//! The scanner only produces a sorted list of [`FontEntry`] values. This
//! crate holds what a list view needs on top of that ([`FontList`]: fuzzy
//! filtering over the entry names and a selection cursor) and the
//! [`FontPreview`] trait through which a chosen font's path is handed to
//! whatever renders it.

mod list;
mod preview;

pub use list::{FontList, FontMatch};
pub use preview::{FontPreview, PathEcho};

pub use fontseek_core::FontEntry;
