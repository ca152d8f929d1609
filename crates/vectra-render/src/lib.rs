//! Vectra Render Library
//!
//! Headless implementations of the collaborator traits declared by
//! `vectra-core`: a recording drawing surface, a raster image decoder and
//! an approximate text layout provider.

mod decoder;
mod recorder;
mod text_layout;

pub use decoder::RasterImageDecoder;
pub use recorder::CommandRecorder;
pub use text_layout::ApproximateTextLayout;
