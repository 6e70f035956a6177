//! Element Locator & Date-Phrase Matcher
//!
//! This crate turns a loosely-typed element query coming from the voice agent
//! into a single rendered element:
//! - an [`ElementQuery`] is expanded into an ordered plan of tagged
//!   [`Locator`]s (id, selector, text, role, name, date)
//! - each locator is served by its own [`Strategy`]
//! - the [`ElementLocator`] walks the plan and stops at the first strategy
//!   returning a rendered element
//! - [`date_phrase`] parses human date phrases and finds report cards whose
//!   text carries the same calendar date in any common written form

pub mod date_phrase;
pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use date_phrase::{
    extract_date_text, find_card_by_date, parse_date_phrase, CardMatch, DatePatterns, DateSource,
};
pub use errors::*;
pub use resolver::*;
pub use strategies::*;
pub use types::*;
