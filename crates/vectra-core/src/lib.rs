//! Vectra Core Library
//!
//! Platform-agnostic scene graph, shape geometry, rich-text runs and tool
//! logic for the Vectra drawing surface. Pixels, fonts and image codecs are
//! reached through the traits in [`render`] and [`resources`].

pub mod clock;
pub mod color;
pub mod config;
pub mod geometry;
pub mod input;
pub mod matrix;
pub mod modifiers;
pub mod render;
pub mod resources;
pub mod scene;
pub mod shapes;
pub mod text_runs;
pub mod tools;

pub use clock::FrameClock;
pub use color::SerializableColor;
pub use config::{ConfigError, EditorConfig};
pub use input::{InputEvent, KeyEvent, PointerEvent};
pub use matrix::Matrix;
pub use modifiers::{Handle, HandlePosition, HandleShape, HandleType, ModifierHandles};
pub use render::{DrawCommand, DrawSurface, Paint, Paragraph, ParagraphRun, RenderContext, Stroke};
pub use resources::{DecodeError, DecodedImage, ImageDecoder, ImageHandle, TextLayoutProvider, TextMetrics};
pub use scene::{NodeId, SceneError, SceneGraph, SceneNode, SceneResult};
pub use shapes::{BoundingRect, Shape, ShapeKind, ShapeProperties, ShapeStyle, ShapeTrait, ShapeTransform};
pub use text_runs::{Span, StyleId, StyleRun, TextRunEditor, TextStyle};
pub use tools::{ToolController, ToolError, ToolKind};
