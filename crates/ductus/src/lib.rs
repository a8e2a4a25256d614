//! ductus - procedural natural-media brushes
//!
//! This crate draws pencil, ink, marker and watercolor marks onto any host
//! surface that implements [`surface::Canvas`]:
//! - [`pipeline::Renderer`] - brush selection, strokes, shapes, hatching and fills
//! - [`brush`] - brush definitions, pressure curves and the brush catalog
//! - [`field`] - flow fields that bend strokes passing through them
//! - [`plot`] - turtle-style paths and splines
//! - [`hatch`] - parallel hatch lines clipped against polygons
//! - [`fill`] - layered watercolor fills
//! - [`mixer`] - pigment mixing through an offscreen mask
//! - [`raster`] - CPU reference canvas with PNG export

pub mod brush;
pub mod constants;
pub mod error;
pub mod field;
pub mod fill;
pub mod hatch;
pub mod mixer;
pub mod pipeline;
pub mod plot;
pub mod polygon;
pub mod position;
pub mod random;
pub mod raster;
pub mod surface;
pub mod types;
pub mod validation;

#[cfg(test)]
mod testing;

pub use brush::*;
pub use constants::*;
pub use error::*;
pub use field::*;
pub use fill::*;
pub use hatch::*;
pub use mixer::*;
pub use pipeline::*;
pub use plot::*;
pub use polygon::*;
pub use position::*;
pub use random::*;
pub use raster::*;
pub use surface::*;
pub use types::*;
pub use validation::*;
