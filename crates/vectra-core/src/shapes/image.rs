//! Image shape for embedding decoded raster images.

use super::rectangle::Rectangle;
use super::{BoundingRect, ShapeDetails, ShapeId, ShapeKind, ShapeStyle, ShapeTrait, ShapeTransform};
use crate::geometry::{ARC_TOLERANCE, FilletKind, rounded_polygon_path};
use crate::modifiers::HandlePosition;
use crate::render::{Paint, RenderContext};
use crate::resources::DecodedImage;
use kurbo::{BezPath, Point, Rect, RoundedRect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Per-corner border radii.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CornerRadii {
    pub top_left: f64,
    pub top_right: f64,
    pub bottom_right: f64,
    pub bottom_left: f64,
}

impl CornerRadii {
    pub fn uniform(radius: f64) -> Self {
        Self {
            top_left: radius,
            top_right: radius,
            bottom_right: radius,
            bottom_left: radius,
        }
    }

    /// Radius at a corner position; edge positions have none.
    pub fn get(&self, position: HandlePosition) -> f64 {
        match position {
            HandlePosition::TopLeft => self.top_left,
            HandlePosition::TopRight => self.top_right,
            HandlePosition::BottomRight => self.bottom_right,
            HandlePosition::BottomLeft => self.bottom_left,
            _ => 0.0,
        }
    }

    pub fn set(&mut self, position: HandlePosition, radius: f64) {
        match position {
            HandlePosition::TopLeft => self.top_left = radius,
            HandlePosition::TopRight => self.top_right = radius,
            HandlePosition::BottomRight => self.bottom_right = radius,
            HandlePosition::BottomLeft => self.bottom_left = radius,
            _ => {}
        }
    }

    /// Radii in outline order: top-left, top-right, bottom-right, bottom-left.
    pub fn as_array(&self) -> [f64; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    pub fn is_zero(&self) -> bool {
        self.as_array().iter().all(|r| *r <= 0.0)
    }
}

/// A rectangle filled with a decoded image.
#[derive(Debug, Clone, Serialize)]
pub struct Image {
    frame: Rectangle,
    /// Width / height of the source image.
    aspect_ratio: f64,
    /// Keep the aspect ratio while resizing.
    pub preserve_aspect_ratio: bool,
    radii: CornerRadii,
    /// When locked, one radius applies to every corner.
    radius_locked: bool,
    #[serde(skip)]
    resource: Option<DecodedImage>,
}

impl Image {
    /// Create an image placeholder; it draws nothing until a resource is set.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        let aspect_ratio = if width.abs() > f64::EPSILON && height.abs() > f64::EPSILON {
            (width / height).abs()
        } else {
            1.0
        };
        Self {
            frame: Rectangle::new(position, width, height),
            aspect_ratio,
            preserve_aspect_ratio: true,
            radii: CornerRadii::default(),
            radius_locked: true,
            resource: None,
        }
    }

    /// Create an image at its natural size.
    pub fn from_decoded(position: Point, decoded: DecodedImage) -> Self {
        let mut image = Self::new(position, decoded.width as f64, decoded.height as f64);
        image.set_resource(decoded);
        image
    }

    pub fn resource(&self) -> Option<&DecodedImage> {
        self.resource.as_ref()
    }

    /// Attach a decoded image. The aspect ratio follows the image and, when
    /// preserved, the height is adjusted to match the current width.
    pub fn set_resource(&mut self, decoded: DecodedImage) {
        self.aspect_ratio = decoded.aspect_ratio();
        self.resource = Some(decoded);
        if self.preserve_aspect_ratio {
            let width = self.frame.width();
            self.frame.resize(width, width / self.aspect_ratio);
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    pub fn width(&self) -> f64 {
        self.frame.width()
    }

    pub fn height(&self) -> f64 {
        self.frame.height()
    }

    pub fn as_rect(&self) -> Rect {
        self.frame.as_rect()
    }

    pub fn corner_radii(&self) -> CornerRadii {
        self.radii
    }

    pub fn radius_locked(&self) -> bool {
        self.radius_locked
    }

    /// Lock or unlock the corner radii. Locking copies the top-left radius
    /// to every corner.
    pub fn set_radius_locked(&mut self, locked: bool) {
        self.radius_locked = locked;
        if locked {
            self.radii = CornerRadii::uniform(self.radii.top_left);
        }
    }

    pub fn set_corner_radius(&mut self, position: HandlePosition, radius: f64) {
        let radius = radius.max(0.0);
        if self.radius_locked {
            self.radii = CornerRadii::uniform(radius);
        } else {
            self.radii.set(position, radius);
        }
    }

    pub fn set_corner_radii(&mut self, radii: CornerRadii) {
        self.radii = radii;
        self.radius_locked = false;
    }

    fn max_radius(&self) -> f64 {
        self.frame.width().min(self.frame.height()) / 2.0
    }

    /// Uniform radius when the corners are locked and rounded.
    fn locked_radius(&self) -> Option<f64> {
        (self.radius_locked && !self.radii.is_zero()).then(|| self.radii.top_left.min(self.max_radius()))
    }

    /// Outline used for clipping and unlocked stroking, `None` for a plain rect.
    fn outline(&self) -> Option<BezPath> {
        let rect = self.as_rect();
        if self.radii.is_zero() {
            return None;
        }
        if let Some(r) = self.locked_radius() {
            return Some(RoundedRect::from_rect(rect, r).to_path(ARC_TOLERANCE));
        }
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ];
        Some(rounded_polygon_path(FilletKind::Rectangle, &corners, 4, &self.radii.as_array()))
    }
}

impl ShapeTrait for Image {
    fn id(&self) -> ShapeId {
        self.frame.id()
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Image
    }

    fn bounding_rect(&self) -> BoundingRect {
        self.frame.bounding_rect()
    }

    fn calculate_bounding_rect(&mut self) {
        self.frame.calculate_bounding_rect();
    }

    fn point_in_shape(&self, point: Point) -> bool {
        self.frame.point_in_shape(point)
    }

    fn move_shape(&mut self, dx: f64, dy: f64) {
        self.frame.move_shape(dx, dy);
    }

    /// With a preserved aspect ratio the width is `max(|dx|, |dy| * aspect)`
    /// and the frame grows from `drag_start` toward the pointer.
    fn set_size(&mut self, drag_start: Point, current_x: f64, current_y: f64, constrain_square: bool) {
        if !self.preserve_aspect_ratio {
            self.frame.set_size(drag_start, current_x, current_y, constrain_square);
            return;
        }
        let dx = current_x - drag_start.x;
        let dy = current_y - drag_start.y;
        let width = dx.abs().max(dy.abs() * self.aspect_ratio);
        let height = width / self.aspect_ratio;
        let corner_x = if dx < 0.0 { drag_start.x - width } else { drag_start.x + width };
        let corner_y = if dy < 0.0 { drag_start.y - height } else { drag_start.y + height };
        self.frame.set_size(drag_start, corner_x, corner_y, false);
    }

    fn fit_to_rect(&mut self, rect: Rect) {
        self.frame.fit_to_rect(rect);
    }

    fn get_coord(&self) -> Point {
        self.frame.get_coord()
    }

    fn draw(&self, ctx: &mut RenderContext<'_>) {
        let Some(resource) = self.resource else {
            return;
        };
        let rect = self.as_rect();
        let outline = self.outline();
        ctx.scoped(|ctx| {
            if let Some(path) = &outline {
                ctx.surface.clip_path(path);
            } else {
                ctx.surface.clip_rect(rect);
            }
            ctx.surface.draw_image(resource.handle, rect);
        });

        let paint = Paint::from_style(self.style()).outline();
        if !paint.is_visible() {
            return;
        }
        match (self.locked_radius(), outline) {
            (Some(r), _) => ctx.surface.draw_rounded_rect(rect, r, &paint),
            (None, Some(path)) => ctx.surface.draw_path(&path, &paint),
            (None, None) => ctx.surface.draw_rect(rect, &paint),
        }
    }

    fn style(&self) -> &ShapeStyle {
        self.frame.style()
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        self.frame.style_mut()
    }

    fn transform(&self) -> &ShapeTransform {
        self.frame.transform()
    }

    fn transform_mut(&mut self) -> &mut ShapeTransform {
        self.frame.transform_mut()
    }

    fn details(&self) -> ShapeDetails {
        ShapeDetails::Image {
            width: self.frame.width(),
            height: self.frame.height(),
            aspect_ratio: self.aspect_ratio,
            preserve_aspect_ratio: self.preserve_aspect_ratio,
            corner_radii: self.radii,
            radius_locked: self.radius_locked,
            loaded: self.resource.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DrawCommand;
    use crate::resources::ImageHandle;

    fn ops(commands: &[DrawCommand]) -> Vec<&'static str> {
        commands
            .iter()
            .map(|c| match c {
                DrawCommand::Save => "save",
                DrawCommand::Restore => "restore",
                DrawCommand::ClipRect { .. } => "clip_rect",
                DrawCommand::ClipPath { .. } => "clip_path",
                DrawCommand::Image { .. } => "image",
                DrawCommand::Path { .. } => "path",
                DrawCommand::Rect { .. } => "rect",
                DrawCommand::RoundedRect { .. } => "rounded_rect",
                _ => "other",
            })
            .collect()
    }

    fn decoded(width: u32, height: u32) -> DecodedImage {
        DecodedImage {
            width,
            height,
            handle: ImageHandle(7),
        }
    }

    #[test]
    fn test_aspect_locked_set_size() {
        let mut image = Image::from_decoded(Point::ZERO, decoded(200, 100));
        let start = Point::new(10.0, 10.0);
        image.set_size(start, 30.0, 50.0, false);
        // |dy| * aspect = 80 wins over |dx| = 20.
        assert!((image.width() - 80.0).abs() < 1e-9);
        assert!((image.height() - 40.0).abs() < 1e-9);
        assert_eq!(image.get_coord(), start);

        image.set_size(start, -50.0, 5.0, false);
        assert_eq!(image.bounding_rect().as_rect(), Rect::new(-50.0, -20.0, 10.0, 10.0));
        assert!(image.transform().flip_x);
    }

    #[test]
    fn test_free_set_size() {
        let mut image = Image::from_decoded(Point::ZERO, decoded(200, 100));
        image.preserve_aspect_ratio = false;
        image.set_size(Point::ZERO, 30.0, 50.0, false);
        assert!((image.width() - 30.0).abs() < 1e-9);
        assert!((image.height() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_locked_radius_applies_to_all_corners() {
        let mut image = Image::new(Point::ZERO, 100.0, 50.0);
        image.set_corner_radius(HandlePosition::BottomRight, 8.0);
        assert_eq!(image.corner_radii(), CornerRadii::uniform(8.0));

        image.set_radius_locked(false);
        image.set_corner_radius(HandlePosition::TopRight, 3.0);
        assert!((image.corner_radii().top_right - 3.0).abs() < f64::EPSILON);
        assert!((image.corner_radii().top_left - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_draw_without_resource_is_noop() {
        let image = Image::new(Point::ZERO, 10.0, 10.0);
        let mut commands: Vec<DrawCommand> = Vec::new();
        let mut ctx = RenderContext::new(&mut commands);
        image.draw(&mut ctx);
        assert!(commands.is_empty());
    }

    #[test]
    fn test_draw_clips_to_rounded_outline() {
        let mut image = Image::from_decoded(Point::ZERO, decoded(100, 100));
        image.set_radius_locked(false);
        image.set_corner_radius(HandlePosition::TopLeft, 10.0);
        let mut commands: Vec<DrawCommand> = Vec::new();
        let mut ctx = RenderContext::new(&mut commands);
        image.draw(&mut ctx);
        assert_eq!(ops(&commands), vec!["save", "clip_path", "image", "restore", "path"]);
    }

    #[test]
    fn test_locked_radius_strokes_rounded_rect() {
        let mut image = Image::from_decoded(Point::ZERO, decoded(100, 40));
        image.set_corner_radius(HandlePosition::TopLeft, 30.0);
        let mut commands: Vec<DrawCommand> = Vec::new();
        let mut ctx = RenderContext::new(&mut commands);
        image.draw(&mut ctx);
        assert_eq!(ops(&commands), vec!["save", "clip_path", "image", "restore", "rounded_rect"]);
        match commands.last() {
            Some(DrawCommand::RoundedRect { rect, radius, .. }) => {
                assert_eq!(*rect, Rect::new(0.0, 0.0, 100.0, 40.0));
                // Clamped to half the short side.
                assert!((radius - 20.0).abs() < 1e-9);
            }
            other => panic!("expected rounded rect, got {other:?}"),
        }
    }
}
