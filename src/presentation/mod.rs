//! Presentation layer: view models handed to the rendering sink.

pub mod views;
