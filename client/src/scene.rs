//! Per-frame drawing data derived from the replicated world.
//!
//! Everything here is in normalized world coordinates ([-1, 1] on both
//! axes); [`Viewport`] maps them to pixels. Building a scene never touches
//! the window, so it can be checked without one.

use shared::world::{FIELD_BORDERS, LEFT_RIGHT_LINES, TEAMS_GOALS_Y};
use shared::{Vector2, WorldState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const BACKGROUND: Rgba = Rgba(34, 66, 99, 255);
    pub const BLUE: Rgba = Rgba(0, 121, 241, 255);
    pub const RED: Rgba = Rgba(230, 41, 55, 255);
    pub const GREEN: Rgba = Rgba(0, 228, 48, 255);
    pub const YELLOW: Rgba = Rgba(253, 249, 0, 255);
    pub const BLACK: Rgba = Rgba(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba(255, 255, 255, 255);

    pub fn team(team_id: u32) -> Rgba {
        if team_id == 1 {
            Rgba::RED
        } else {
            Rgba::BLUE
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vector2,
    pub radius: f32,
    pub fill: Rgba,
    pub outline: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Vector2,
    pub to: Vector2,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub pos: Vector2,
    pub color: Rgba,
}

pub const FIELD_CORNER_RADIUS: f32 = 0.1;
const CORNER_SEGMENTS: usize = 8;
const SCORE_LABEL_POS: Vector2 = Vector2::new(-0.05, -1.0);

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub background: Rgba,
    /// Closed polyline of the rounded field boundary.
    pub field: Vec<Vector2>,
    pub field_color: Rgba,
    pub goal_lines: [Segment; 2],
    /// Puck first, then players in world order.
    pub circles: Vec<Circle>,
    pub score: Label,
}

impl Scene {
    pub fn build(world: &WorldState, local_player: Option<u32>) -> Self {
        let puck = &world.puck.transform;
        let mut circles = Vec::with_capacity(world.players.len() + 1);
        circles.push(Circle {
            center: puck.pos,
            radius: puck.radius,
            fill: Rgba::GREEN,
            outline: Rgba::YELLOW,
        });

        circles.extend(world.players.iter().map(|player| Circle {
            center: player.transform.pos,
            radius: player.transform.radius,
            fill: Rgba::team(player.team_id),
            outline: if Some(player.id) == local_player {
                Rgba::GREEN
            } else {
                Rgba::BLACK
            },
        }));

        let [left_right, top_bottom] = FIELD_BORDERS;
        Self {
            background: Rgba::BACKGROUND,
            field: rounded_rect(
                Vector2::new(left_right.min, top_bottom.min),
                Vector2::new(left_right.max, top_bottom.max),
                FIELD_CORNER_RADIUS,
            ),
            field_color: Rgba::WHITE,
            goal_lines: [
                goal_line(TEAMS_GOALS_Y.min, Rgba::team(0)),
                goal_line(TEAMS_GOALS_Y.max, Rgba::team(1)),
            ],
            circles,
            score: Label {
                text: world.score_label(),
                pos: SCORE_LABEL_POS,
                color: Rgba::WHITE,
            },
        }
    }
}

fn goal_line(y: f32, color: Rgba) -> Segment {
    Segment {
        from: Vector2::new(LEFT_RIGHT_LINES.min, y),
        to: Vector2::new(LEFT_RIGHT_LINES.max, y),
        color,
    }
}

/// Outline of an axis-aligned rectangle with circular corners. The first
/// point is repeated at the end so consecutive pairs cover every edge.
pub fn rounded_rect(min: Vector2, max: Vector2, radius: f32) -> Vec<Vector2> {
    let radius = radius
        .min((max.x - min.x) / 2.0)
        .min((max.y - min.y) / 2.0)
        .max(0.0);
    let corners = [
        (Vector2::new(max.x - radius, min.y + radius), -90.0f32),
        (Vector2::new(max.x - radius, max.y - radius), 0.0),
        (Vector2::new(min.x + radius, max.y - radius), 90.0),
        (Vector2::new(min.x + radius, min.y + radius), 180.0),
    ];

    let mut points = Vec::with_capacity(corners.len() * (CORNER_SEGMENTS + 1) + 1);
    for (center, start) in corners {
        for step in 0..=CORNER_SEGMENTS {
            let angle = (start + 90.0 * step as f32 / CORNER_SEGMENTS as f32).to_radians();
            points.push(center + Vector2::new(angle.cos(), angle.sin()) * radius);
        }
    }
    if let Some(&first) = points.first() {
        points.push(first);
    }
    points
}

/// Pixel mapping for a window of the given size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn to_screen(&self, v: Vector2) -> (f32, f32) {
        (
            (v.x + 1.0) * self.width / 2.0,
            (v.y + 1.0) * self.height / 2.0,
        )
    }

    /// Radii scale with the width only, so circles stay round.
    pub fn scale(&self, length: f32) -> f32 {
        length * self.width / 2.0
    }
}
