//! Shared foundational types for the Weft hardware construction framework.
//!
//! This crate provides the 4-state scalar [`Logic`], the arbitrary-width
//! [`LogicValue`] vector with its canonical storage representations and full
//! operator algebra, interned identifiers, and the common value error type.

#![warn(missing_docs)]

pub mod error;
pub mod ident;
pub mod logic;
pub mod ops;
pub mod value;

pub use error::ValueError;
pub use ident::{Ident, Interner};
pub use logic::Logic;
pub use value::{LogicValue, W_INT};
