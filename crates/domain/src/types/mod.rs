//! Common data types used throughout the application

pub mod sync;

pub use sync::*;
