//! Hour-aligned transfer budget.

pub mod tracker;
pub mod window;
