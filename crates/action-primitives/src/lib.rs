//! DOM action primitives
//!
//! This crate executes the agent's DOM actions against a [`page_dom::Document`]:
//! - 5 primitives: click, fill, read, focus, scroll
//! - element resolution through [`action_locator::ElementLocator`]
//! - every failure folded into an [`ActionResult`] with `success: false`

pub mod errors;
mod primitives;
pub mod types;

pub use errors::*;
pub use primitives::*;
pub use types::*;
