//! Text parsing of recognized card content.

pub mod cleaners;
pub mod normalize;
pub mod parser;

pub use parser::parse_card;
