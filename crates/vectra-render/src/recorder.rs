//! Drawing surface that records commands instead of rasterizing them.

use kurbo::{BezPath, Rect};
use vectra_core::matrix::Matrix;
use vectra_core::render::{DrawCommand, DrawSurface, Paint, Paragraph};
use vectra_core::resources::ImageHandle;

/// Records every drawing call and tracks the transform stack the way a
/// real canvas would.
#[derive(Debug, Clone, Default)]
pub struct CommandRecorder {
    commands: Vec<DrawCommand>,
    transform: Matrix,
    stack: Vec<Matrix>,
    unbalanced_restores: usize,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    /// Transform in effect for the next drawing call.
    pub fn current_transform(&self) -> Matrix {
        self.transform
    }

    /// Number of open `save` calls.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Restores issued with nothing saved.
    pub fn unbalanced_restores(&self) -> usize {
        self.unbalanced_restores
    }

    /// Forget everything recorded and reset the transform.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Recorded commands as a JSON array.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.commands)
    }
}

impl DrawSurface for CommandRecorder {
    fn save(&mut self) {
        self.stack.push(self.transform);
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        match self.stack.pop() {
            Some(transform) => self.transform = transform,
            None => {
                log::warn!("Restore without a matching save");
                self.unbalanced_restores += 1;
            }
        }
        self.commands.push(DrawCommand::Restore);
    }

    fn concat(&mut self, matrix: &Matrix) {
        self.transform = self.transform.multiply(matrix);
        self.commands.push(DrawCommand::Concat { matrix: *matrix });
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::ClipRect { rect });
    }

    fn clip_path(&mut self, path: &BezPath) {
        self.commands.push(DrawCommand::ClipPath { path: path.clone() });
    }

    fn draw_rect(&mut self, rect: Rect, paint: &Paint) {
        self.commands.push(DrawCommand::Rect { rect, paint: *paint });
    }

    fn draw_rounded_rect(&mut self, rect: Rect, radius: f64, paint: &Paint) {
        self.commands.push(DrawCommand::RoundedRect {
            rect,
            radius,
            paint: *paint,
        });
    }

    fn draw_oval(&mut self, rect: Rect, paint: &Paint) {
        self.commands.push(DrawCommand::Oval { rect, paint: *paint });
    }

    fn draw_path(&mut self, path: &BezPath, paint: &Paint) {
        self.commands.push(DrawCommand::Path {
            path: path.clone(),
            paint: *paint,
        });
    }

    fn draw_image(&mut self, image: ImageHandle, rect: Rect) {
        self.commands.push(DrawCommand::Image { image, rect });
    }

    fn draw_paragraph(&mut self, paragraph: &Paragraph) {
        self.commands.push(DrawCommand::Paragraph {
            paragraph: paragraph.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use vectra_core::render::RenderContext;
    use vectra_core::scene::SceneGraph;
    use vectra_core::shapes::{Rectangle, Shape};

    #[test]
    fn test_transform_stack() {
        let mut recorder = CommandRecorder::new();
        recorder.save();
        recorder.concat(&Matrix::translate(10.0, 0.0));
        recorder.concat(&Matrix::scale(2.0, 2.0));
        let p = recorder.current_transform().apply_to_point(1.0, 1.0);
        assert!((p.x - 12.0).abs() < 1e-9);
        assert!((p.y - 2.0).abs() < 1e-9);
        assert_eq!(recorder.depth(), 1);

        recorder.restore();
        assert!(recorder.current_transform().approx_eq(&Matrix::identity(), 1e-12));
        assert_eq!(recorder.depth(), 0);

        recorder.restore();
        assert_eq!(recorder.unbalanced_restores(), 1);
    }

    #[test]
    fn test_records_scene_render() {
        let mut scene = SceneGraph::new();
        scene
            .insert(scene.root(), Shape::Rectangle(Rectangle::new(Point::new(0.0, 0.0), 10.0, 10.0)))
            .unwrap();
        let mut recorder = CommandRecorder::new();
        scene.render(&mut RenderContext::new(&mut recorder));

        assert_eq!(recorder.depth(), 0);
        assert!(matches!(recorder.commands().first(), Some(DrawCommand::Save)));
        assert!(recorder.commands().iter().any(|c| matches!(c, DrawCommand::Rect { .. })));

        let json = recorder.to_json().unwrap();
        assert!(json.contains("\"op\": \"rect\""));

        recorder.clear();
        assert!(recorder.commands().is_empty());
    }
}
