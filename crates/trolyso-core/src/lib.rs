//! # TroLySo Core
//! Shared building blocks for every TroLySo crate: the error type,
//! configuration, plain data types and the traits that sit at the seams
//! between the assistant and its external collaborators.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Result, TroLySoError};
