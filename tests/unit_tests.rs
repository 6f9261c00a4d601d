//! Unit-level tests for public components.

mod common;
mod unit;
