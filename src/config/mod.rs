//! Configuration for the parlance core.

mod settings;

pub use settings::*;
