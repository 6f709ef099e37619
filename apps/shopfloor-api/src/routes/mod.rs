//! API route definitions.

pub mod health;
pub mod pos;
