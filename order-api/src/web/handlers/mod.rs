//! Request handlers

pub mod health;
pub mod orders;
pub mod probe;
