//! grafito-cli: inspect and maintain a grafito graph store from the shell.
//!
//! Each command renders its result as JSON so output can be piped into
//! other tools.

pub mod commands;
pub mod error;
