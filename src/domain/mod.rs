//! Core domain types: the three entities, their column rules and errors.

pub mod error;
pub mod numeric;
pub mod parse;
pub mod price;
pub mod schema;
pub mod stock;
pub mod trade;
