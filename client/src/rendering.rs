//! Draws a [`Scene`] with macroquad.

use crate::scene::{Rgba, Scene, Viewport};
use macroquad::prelude::*;

const OUTLINE_THICKNESS: f32 = 2.0;
const FIELD_THICKNESS: f32 = 3.0;
const GOAL_LINE_THICKNESS: f32 = 2.0;
const SCORE_FONT_SIZE: f32 = 32.0;

pub struct Renderer {
    viewport: Viewport,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(screen_width(), screen_height()),
        }
    }

    pub fn render(&mut self, scene: &Scene) {
        // Follow window resizes.
        self.viewport = Viewport::new(screen_width(), screen_height());

        clear_background(color(scene.background));
        self.draw_field(scene);

        for line in &scene.goal_lines {
            let (x1, y1) = self.viewport.to_screen(line.from);
            let (x2, y2) = self.viewport.to_screen(line.to);
            draw_line(x1, y1, x2, y2, GOAL_LINE_THICKNESS, color(line.color));
        }

        for circle in &scene.circles {
            let (x, y) = self.viewport.to_screen(circle.center);
            let radius = self.viewport.scale(circle.radius);
            draw_circle(x, y, radius, color(circle.fill));
            draw_circle_lines(x, y, radius, OUTLINE_THICKNESS, color(circle.outline));
        }

        self.draw_score(scene);
    }

    fn draw_field(&self, scene: &Scene) {
        let field_color = color(scene.field_color);
        for pair in scene.field.windows(2) {
            let (x1, y1) = self.viewport.to_screen(pair[0]);
            let (x2, y2) = self.viewport.to_screen(pair[1]);
            draw_line(x1, y1, x2, y2, FIELD_THICKNESS, field_color);
        }
    }

    fn draw_score(&self, scene: &Scene) {
        let (x, y) = self.viewport.to_screen(scene.score.pos);
        // Text is anchored at its baseline; push it down into the window.
        draw_text(
            &scene.score.text,
            x,
            y + SCORE_FONT_SIZE,
            SCORE_FONT_SIZE,
            color(scene.score.color),
        );
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn color(rgba: Rgba) -> Color {
    Color::from_rgba(rgba.0, rgba.1, rgba.2, rgba.3)
}
