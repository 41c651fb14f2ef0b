//! Native client for a bounding-box annotation backend: browse the images the
//! backend serves, drag one crop rectangle over the selected image, and save
//! it in the image's natural pixel coordinates.

pub mod app;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod editor;
pub mod error;
pub mod model;
pub mod worker;
