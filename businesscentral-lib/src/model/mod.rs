//! Typed models

mod entity;
mod field;
mod literal;

pub use entity::*;
pub use field::*;
pub use literal::*;
