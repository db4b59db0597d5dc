//! Numerical utilities.

pub mod newton;
