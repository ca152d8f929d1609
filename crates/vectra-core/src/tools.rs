//! Tool controller: routes input events to the active tool, which mutates
//! the scene graph.
//!
//! Gestures are strictly sequential. A pointer-down while a gesture is in
//! progress is ignored, and switching tools mid-gesture settles the gesture
//! first so no half-created node is left behind.

use crate::config::EditorConfig;
use crate::input::{InputEvent, KeyEvent, PointerEvent};
use crate::matrix::Matrix;
use crate::modifiers::ModifierHandles;
use crate::render::RenderContext;
use crate::resources::{DecodeError, ImageDecoder, TextLayoutProvider};
use crate::scene::{NodeId, SceneError, SceneGraph, SceneResult};
use crate::shapes::{
    BoundingRect, Image, Oval, Polygon, Rectangle, Shape, ShapeKind, ShapeProperties, ShapeStyle, Star, Text,
};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Select,
    Rectangle,
    Oval,
    Polygon,
    Star,
    Text,
}

impl ToolKind {
    /// Kind of shape this tool creates, if any.
    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            ToolKind::Select => None,
            ToolKind::Rectangle => Some(ShapeKind::Rectangle),
            ToolKind::Oval => Some(ShapeKind::Oval),
            ToolKind::Polygon => Some(ShapeKind::Polygon),
            ToolKind::Star => Some(ShapeKind::Star),
            ToolKind::Text => Some(ShapeKind::Text),
        }
    }
}

/// Errors from tool operations that involve external resources.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// The gesture in progress between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Gesture {
    #[default]
    Idle,
    /// A shape tool is sizing a new node.
    Creating { node: NodeId, drag_start: Point },
    /// The selection is being dragged.
    Moving { node: NodeId, last: Point },
    /// A modifier handle is being dragged.
    Handle,
}

/// Owns the scene and turns input events into scene mutations.
pub struct ToolController {
    scene: SceneGraph,
    handles: ModifierHandles,
    config: EditorConfig,
    tool: ToolKind,
    /// Style applied to new shapes.
    pub current_style: ShapeStyle,
    selection: Option<NodeId>,
    editing_text: Option<NodeId>,
    gesture: Gesture,
    text_layout: Option<Box<dyn TextLayoutProvider>>,
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl ToolController {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            scene: SceneGraph::new(),
            handles: ModifierHandles::new(config.handle_size).with_rotation_snap(config.rotation_snap_degrees),
            config,
            tool: ToolKind::default(),
            current_style: ShapeStyle::default(),
            selection: None,
            editing_text: None,
            gesture: Gesture::Idle,
            text_layout: None,
        }
    }

    /// Lay out text shapes with `provider` whenever their content changes.
    pub fn with_text_layout(mut self, provider: Box<dyn TextLayoutProvider>) -> Self {
        self.text_layout = Some(provider);
        self
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn handles(&self) -> &ModifierHandles {
        &self.handles
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selection
    }

    pub fn editing_text(&self) -> Option<NodeId> {
        self.editing_text
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Handle one input event.
    pub fn dispatch(&mut self, event: InputEvent) -> SceneResult<()> {
        match event {
            InputEvent::PointerDown(e) => self.pointer_down(e),
            InputEvent::PointerDrag(e) => self.pointer_drag(e),
            InputEvent::PointerUp(e) => self.pointer_up(e),
            InputEvent::Key(e) => self.key(e),
            InputEvent::SelectTool { tool } => self.select_tool(tool),
        }
    }

    /// Create a zero-sized shape of `kind` at `(x, y)` under the root.
    pub fn create_shape(&mut self, kind: ShapeKind, x: f64, y: f64) -> SceneResult<NodeId> {
        let p = Point::new(x, y);
        let config = &self.config;
        let mut shape = match kind {
            ShapeKind::Rectangle => Shape::Rectangle(Rectangle::new(p, 0.0, 0.0)),
            ShapeKind::Oval => Shape::Oval(Oval::circle(p, 0.0)),
            ShapeKind::Polygon => Shape::Polygon(Polygon::new(p, config.default_polygon_sides, 0.0, 0.0)),
            ShapeKind::Star => Shape::Star(Star::new(
                p,
                config.default_star_spikes,
                0.0,
                0.0,
                config.default_star_ratio,
            )),
            ShapeKind::Image => Shape::Image(Image::new(p, 0.0, 0.0)),
            ShapeKind::Text => {
                let mut text = Text::new(p, "");
                text.set_sizing(config.font_sizing());
                text.set_font_size(config.default_font_size);
                Shape::Text(text)
            }
        };
        *shape.style_mut() = self.current_style.clone();
        let id = self.scene.insert(self.scene.root(), shape)?;
        log::debug!("Created {kind} node {id:?} at ({x}, {y})");
        self.relayout(id)?;
        Ok(id)
    }

    /// Decode `bytes` and place the image with its top-left corner at
    /// `(x, y)`, at natural size. The new node becomes the selection.
    pub fn insert_image(
        &mut self,
        decoder: &mut dyn ImageDecoder,
        bytes: &[u8],
        x: f64,
        y: f64,
    ) -> Result<NodeId, ToolError> {
        let decoded = decoder.decode(bytes)?;
        let mut shape = Shape::Image(Image::from_decoded(Point::new(x, y), decoded));
        *shape.style_mut() = self.current_style.clone();
        let id = self.scene.insert(self.scene.root(), shape)?;
        log::info!("Inserted {}x{} image as {id:?}", decoded.width, decoded.height);
        self.select(id)?;
        Ok(id)
    }

    pub fn select(&mut self, id: NodeId) -> SceneResult<()> {
        self.handles.attach(&self.scene, id)?;
        self.selection = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.handles.detach();
    }

    /// Destroy the selected node.
    pub fn delete_selection(&mut self) -> SceneResult<()> {
        let Some(id) = self.selection.take() else {
            return Ok(());
        };
        self.handles.detach();
        if self.editing_text == Some(id) {
            self.editing_text = None;
        }
        self.scene.destroy(id)
    }

    /// Topmost node under a canvas point.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<NodeId> {
        self.scene.hit_test(Point::new(x, y))
    }

    pub fn bounding_rect(&self, id: NodeId) -> Option<BoundingRect> {
        self.scene.shape(id).map(Shape::bounding_rect)
    }

    pub fn world_matrix(&self, id: NodeId) -> Option<Matrix> {
        self.scene.world_matrix(id)
    }

    /// Style and geometry of the selected shape, for a property panel.
    pub fn selected_properties(&self) -> Option<ShapeProperties> {
        self.selection
            .and_then(|id| self.scene.shape(id))
            .map(Shape::properties)
    }

    fn pointer_down(&mut self, event: PointerEvent) -> SceneResult<()> {
        if self.gesture != Gesture::Idle {
            log::warn!("Ignoring pointer down during an active gesture");
            return Ok(());
        }
        let p = event.point();
        match self.tool {
            ToolKind::Select => {
                if self.handles.begin_drag(&self.scene, p) {
                    self.gesture = Gesture::Handle;
                    return Ok(());
                }
                let hit = self.scene.hit_test(p);
                if self.editing_text.is_some() && hit != self.editing_text {
                    self.stop_editing()?;
                }
                match hit {
                    Some(id) => {
                        self.select(id)?;
                        self.gesture = Gesture::Moving { node: id, last: p };
                    }
                    None => self.clear_selection(),
                }
            }
            ToolKind::Text => {
                self.stop_editing()?;
                let existing = self
                    .scene
                    .hit_test(p)
                    .filter(|id| self.scene.shape(*id).is_some_and(|s| s.kind() == ShapeKind::Text));
                let id = match existing {
                    Some(id) => id,
                    None => self.create_shape(ShapeKind::Text, p.x, p.y)?,
                };
                self.select(id)?;
                self.editing_text = Some(id);
                log::debug!("Editing text node {id:?}");
            }
            tool => {
                self.stop_editing()?;
                self.clear_selection();
                if let Some(kind) = tool.shape_kind() {
                    let node = self.create_shape(kind, p.x, p.y)?;
                    let drag_start = self.scene.world_to_parent_point(node, p);
                    self.gesture = Gesture::Creating { node, drag_start };
                }
            }
        }
        Ok(())
    }

    fn pointer_drag(&mut self, event: PointerEvent) -> SceneResult<()> {
        let p = event.point();
        match self.gesture {
            Gesture::Idle => {}
            Gesture::Creating { node, drag_start } => {
                let current = self.scene.world_to_parent_point(node, p);
                self.scene
                    .modify_shape(node, |s| s.set_size(drag_start, current.x, current.y, event.shift_key))?;
            }
            Gesture::Moving { node, last } => {
                self.scene.move_shape(node, p.x - last.x, p.y - last.y)?;
                self.gesture = Gesture::Moving { node, last: p };
                self.handles.update_resizer_positions(&self.scene);
            }
            Gesture::Handle => self.handles.drag_to(&mut self.scene, p, event.shift_key)?,
        }
        Ok(())
    }

    fn pointer_up(&mut self, event: PointerEvent) -> SceneResult<()> {
        match self.gesture {
            Gesture::Idle => log::debug!("Pointer up without a gesture"),
            Gesture::Creating { .. } | Gesture::Moving { .. } | Gesture::Handle => {
                self.pointer_drag(event)?;
                self.settle_gesture()?;
            }
        }
        Ok(())
    }

    /// End the current gesture, applying the minimum-size policy to a shape
    /// being created.
    fn settle_gesture(&mut self) -> SceneResult<()> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle | Gesture::Moving { .. } => Ok(()),
            Gesture::Handle => {
                self.handles.end_drag(&mut self.scene);
                Ok(())
            }
            Gesture::Creating { node, .. } => self.finish_creation(node),
        }
    }

    fn finish_creation(&mut self, node: NodeId) -> SceneResult<()> {
        let Some(shape) = self.scene.shape(node) else {
            return Ok(());
        };
        let bounds = shape.bounding_rect();
        let min = self.config.min_shape_size;
        if shape.kind() != ShapeKind::Text && (bounds.width() < min || bounds.height() < min) {
            log::debug!(
                "Discarding {} {:.1}x{:.1} below minimum size {min}",
                shape.kind(),
                bounds.width(),
                bounds.height()
            );
            return self.scene.destroy(node);
        }
        self.select(node)
    }

    fn select_tool(&mut self, tool: ToolKind) -> SceneResult<()> {
        if self.gesture != Gesture::Idle {
            log::debug!("Tool switch settles the active gesture");
            self.settle_gesture()?;
        }
        if tool != ToolKind::Text {
            self.stop_editing()?;
        }
        self.tool = tool;
        Ok(())
    }

    fn key(&mut self, event: KeyEvent) -> SceneResult<()> {
        if let Some(id) = self.editing_text {
            return self.edit_text(id, &event.key);
        }
        match event.key.as_str() {
            "Delete" | "Backspace" if self.gesture == Gesture::Idle => self.delete_selection(),
            "Escape" => {
                if self.gesture == Gesture::Handle {
                    self.gesture = Gesture::Idle;
                    self.handles.cancel_drag(&mut self.scene)
                } else {
                    if self.gesture == Gesture::Idle {
                        self.clear_selection();
                    }
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    fn edit_text(&mut self, id: NodeId, key: &str) -> SceneResult<()> {
        if key == "Escape" {
            return self.stop_editing();
        }
        let handled = self.scene.modify_shape(id, |shape| {
            let Some(text) = shape.as_text_mut() else {
                return false;
            };
            match key {
                "Backspace" => text.delete_backward(),
                "Delete" => text.delete_forward(),
                "ArrowLeft" => text.move_cursor_left(),
                "ArrowRight" => text.move_cursor_right(),
                "Home" => text.move_cursor_home(),
                "End" => text.move_cursor_end(),
                "Enter" => text.insert_newline(),
                k if k.chars().count() == 1 => text.insert_at_cursor(k),
                _ => return false,
            }
            true
        })?;
        if handled == Some(true) {
            self.relayout(id)?;
            self.handles.update_resizer_positions(&self.scene);
        }
        Ok(())
    }

    /// Leave text editing. An empty text node is removed.
    fn stop_editing(&mut self) -> SceneResult<()> {
        let Some(id) = self.editing_text.take() else {
            return Ok(());
        };
        let empty = self
            .scene
            .shape(id)
            .and_then(Shape::as_text)
            .is_some_and(|t| t.content().is_empty());
        if empty {
            log::debug!("Removing empty text node {id:?}");
            if self.selection == Some(id) {
                self.clear_selection();
            }
            self.scene.destroy(id)?;
        }
        Ok(())
    }

    fn relayout(&mut self, id: NodeId) -> SceneResult<()> {
        if let Some(provider) = self.text_layout.as_deref() {
            self.scene.modify_shape(id, |shape| {
                if let Some(text) = shape.as_text_mut() {
                    text.layout(provider);
                }
            })?;
        }
        Ok(())
    }

    /// Draw the scene, then the selection outline and its handles.
    pub fn render(&self, ctx: &mut RenderContext<'_>) {
        self.scene.render(ctx);
        let Some(id) = self.selection else {
            return;
        };
        if let (Some(shape), Some(world)) = (self.scene.shape(id), self.scene.world_matrix(id)) {
            let outline = ctx.selection_paint;
            ctx.scoped(|ctx| {
                ctx.surface.concat(&world);
                ctx.surface.draw_rect(shape.bounding_rect().as_rect(), &outline);
            });
        }
        self.handles.draw(ctx);
    }
}
