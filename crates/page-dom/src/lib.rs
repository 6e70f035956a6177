//! Page model used by the voice-navigation bridge
//!
//! The bridge never talks to a browser engine directly. Hosts hand it a
//! [`Document`]: an element tree with attributes, text, form values, a focus
//! pointer and an event log. This crate provides:
//! - the arena-backed tree and its read/mutation API
//! - render visibility (`hidden`, `display: none`, hidden inputs)
//! - a small CSS selector engine (compound selectors, attribute operators,
//!   descendant/child combinators, selector lists)
//! - serde fixtures ([`ElementSpec`], [`PageSpec`]) and a builder ([`el`])

pub mod document;
pub mod errors;
pub mod events;
pub mod selector;
pub mod spec;

pub use document::*;
pub use errors::*;
pub use events::*;
pub use selector::{parse_selector, SelectorList};
pub use spec::*;
