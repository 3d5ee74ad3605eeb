use crate::{
    core::geo::{Point, TileCoord},
    encoding::color::Color,
};

/// Fill and stroke of a circle primitive
#[derive(Debug, Clone, PartialEq)]
pub struct CircleRenderStyle {
    pub fill_color: Color,
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub radius: f32,
}

/// Stroke of a polyline primitive
#[derive(Debug, Clone, PartialEq)]
pub struct LineRenderStyle {
    pub color: Color,
    pub width: f32,
}

/// Commands that can be issued to the render context, all in container
/// pixel coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Circle {
        center: Point,
        style: CircleRenderStyle,
    },
    Line {
        points: Vec<Point>,
        style: LineRenderStyle,
    },
    Tile {
        /// Id of the tile layer the tile belongs to
        source: String,
        coord: TileCoord,
        url: String,
        bounds: (Point, Point),
        opacity: f32,
    },
}

/// Frame-scoped queue of drawing primitives; a backend (egui painter, test,
/// headless summary) consumes it after the layers have rendered
pub struct RenderContext {
    pub width: f64,
    pub height: f64,
    drawing_queue: Vec<DrawCommand>,
}

impl RenderContext {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            drawing_queue: Vec::new(),
        }
    }

    /// Begin a frame
    pub fn begin_frame(&mut self) {
        self.drawing_queue.clear();
    }

    pub fn render_circle(&mut self, center: Point, style: CircleRenderStyle) {
        self.drawing_queue.push(DrawCommand::Circle { center, style });
    }

    pub fn render_line(&mut self, points: Vec<Point>, style: LineRenderStyle) {
        if points.len() >= 2 {
            self.drawing_queue.push(DrawCommand::Line { points, style });
        }
    }

    pub fn render_tile(
        &mut self,
        source: &str,
        coord: TileCoord,
        url: String,
        bounds: (Point, Point),
        opacity: f32,
    ) {
        self.drawing_queue.push(DrawCommand::Tile {
            source: source.to_string(),
            coord,
            url,
            bounds,
            opacity,
        });
    }

    /// Whether a circle at `center` with `radius` touches the visible area
    pub fn is_circle_visible(&self, center: &Point, radius: f64) -> bool {
        center.x + radius >= 0.0
            && center.y + radius >= 0.0
            && center.x - radius <= self.width
            && center.y - radius <= self.height
    }

    pub fn drawing_queue(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.drawing_queue)
    }

    pub fn len(&self) -> usize {
        self.drawing_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawing_queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_and_clear() {
        let mut ctx = RenderContext::new(800.0, 600.0);
        ctx.render_circle(
            Point::new(10.0, 10.0),
            CircleRenderStyle {
                fill_color: Color::rgb(0, 128, 0),
                stroke_color: Color::rgb(0, 128, 0),
                stroke_width: 1.0,
                radius: 4.0,
            },
        );
        ctx.render_line(
            vec![Point::new(0.0, 0.0)],
            LineRenderStyle {
                color: Color::rgb(255, 165, 0),
                width: 2.0,
            },
        );
        assert_eq!(ctx.len(), 1, "single-point lines are dropped");

        ctx.begin_frame();
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_circle_visibility() {
        let ctx = RenderContext::new(100.0, 100.0);
        assert!(ctx.is_circle_visible(&Point::new(50.0, 50.0), 1.0));
        assert!(ctx.is_circle_visible(&Point::new(-5.0, 50.0), 10.0));
        assert!(!ctx.is_circle_visible(&Point::new(-50.0, 50.0), 10.0));
    }
}
