//! Replicated world model: players, puck, score and the rink geometry.
//!
//! `WorldState` is the single unit of replication. The server owns the
//! authoritative copy and broadcasts it whole every tick; clients replace
//! their local copy wholesale on receipt.

use crate::math::Vector2;
use serde::{Deserialize, Serialize};

/// Closed interval along one axis, `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// Rink X bounds (left, right).
pub const LEFT_RIGHT_LINES: Span = Span::new(-0.98, 0.95);

/// Goal-mouth Y lines. Team 0 defends `min`, team 1 defends `max`.
pub const TEAMS_GOALS_Y: Span = Span::new(-0.78, 0.78);

/// Border pairs used for containment: `[left/right, top/bottom]`.
pub const FIELD_BORDERS: [Span; 2] = [LEFT_RIGHT_LINES, Span::new(-0.98, 0.88)];

/// Inner edge of each team's spawn band along Y.
pub const SPAWN_BAND_EDGE: f32 = 0.4;

pub const TEAM_COUNT: usize = 2;

/// Circle/circle overlap test: centres closer than the sum of the radii.
pub fn is_colliding(a_pos: Vector2, a_radius: f32, b_pos: Vector2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    (a_pos - b_pos).length_squared() < reach * reach
}

/// True when the circle lies entirely inside the border pair.
pub fn is_contained(pos: Vector2, radius: f32, left_right: Span, top_bottom: Span) -> bool {
    pos.x - radius >= left_right.min
        && pos.x + radius <= left_right.max
        && pos.y - radius >= top_bottom.min
        && pos.y + radius <= top_bottom.max
}

/// Any physically simulated circular body. `radius > 0`, `mass > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveableObject {
    pub pos: Vector2,
    pub velocity: Vector2,
    pub radius: f32,
    pub mass: f32,
}

impl MoveableObject {
    pub fn new(radius: f32, mass: f32) -> Self {
        debug_assert!(radius > 0.0 && mass > 0.0);
        Self {
            pos: Vector2::ZERO,
            velocity: Vector2::ZERO,
            radius,
            mass,
        }
    }

    pub fn collides_with(&self, other: &MoveableObject) -> bool {
        is_colliding(self.pos, self.radius, other.pos, other.radius)
    }

    pub fn is_within(&self, left_right: Span, top_bottom: Span) -> bool {
        is_contained(self.pos, self.radius, left_right, top_bottom)
    }

    /// Places the body at `pos` and stops it.
    pub fn reset_at(&mut self, pos: Vector2) {
        self.pos = pos;
        self.velocity = Vector2::ZERO;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub team_id: u32,
    pub transform: MoveableObject,
}

impl Player {
    pub const BASE_RADIUS: f32 = 0.05;
    pub const MASS: f32 = 0.025;

    /// Creates a player at the origin. The team is derived from id parity.
    pub fn new(id: u32) -> Self {
        Self {
            id,
            team_id: Self::team_for(id),
            transform: MoveableObject::new(Self::BASE_RADIUS, Self::MASS),
        }
    }

    pub fn team_for(id: u32) -> u32 {
        id % TEAM_COUNT as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Puck {
    pub transform: MoveableObject,
}

impl Puck {
    pub const BASE_RADIUS: f32 = 0.02;
    pub const MASS: f32 = 0.01;
}

impl Default for Puck {
    fn default() -> Self {
        Self {
            transform: MoveableObject::new(Self::BASE_RADIUS, Self::MASS),
        }
    }
}

/// Whole replicated state. Field order is the wire order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// Connection order. Removal reorders (swap with last), so nothing may
    /// depend on the position of a player in this list.
    pub players: Vec<Player>,
    pub puck: Puck,
    pub goals: [u32; TEAM_COUNT],
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_player(&self, id: u32) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn find_player_mut(&mut self, id: u32) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Removes a player by swapping it with the last one and popping.
    /// Absent ids are a no-op.
    pub fn remove_player(&mut self, id: u32) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == id)?;
        Some(self.players.swap_remove(index))
    }

    /// Score as shown to players, `"{teamA}:{teamB}"`.
    pub fn score_label(&self) -> String {
        format!("{}:{}", self.goals[0], self.goals[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(ids: &[u32]) -> WorldState {
        let mut world = WorldState::new();
        world.players = ids.iter().map(|&id| Player::new(id)).collect();
        world
    }

    #[test]
    fn test_player_creation() {
        let player = Player::new(3);
        assert_eq!(player.id, 3);
        assert_eq!(player.team_id, 1);
        assert_eq!(player.transform.radius, Player::BASE_RADIUS);
        assert_eq!(player.transform.mass, Player::MASS);
        assert_eq!(Player::new(4).team_id, 0);
    }

    #[test]
    fn test_collision_detection_overlap() {
        assert!(is_colliding(
            Vector2::new(0.0, 0.0),
            0.05,
            Vector2::new(0.06, 0.0),
            0.02
        ));
    }

    #[test]
    fn test_collision_detection_exact_touch() {
        assert!(!is_colliding(
            Vector2::new(0.0, 0.0),
            0.05,
            Vector2::new(0.1, 0.0),
            0.05
        ));
    }

    #[test]
    fn test_containment() {
        let [lr, tb] = FIELD_BORDERS;
        let mut body = MoveableObject::new(0.05, 0.01);
        assert!(body.is_within(lr, tb));

        body.pos = Vector2::new(lr.max - 0.01, 0.0);
        assert!(!body.is_within(lr, tb));
    }

    #[test]
    fn test_remove_player_from_every_position() {
        let ids = [0, 1, 2, 3, 4];
        for &target in &ids {
            let mut world = world_with(&ids);
            let removed = world.remove_player(target);
            assert_eq!(removed.map(|p| p.id), Some(target));
            assert!(world.find_player(target).is_none());

            for &other in ids.iter().filter(|&&id| id != target) {
                let count = world.players.iter().filter(|p| p.id == other).count();
                assert_eq!(count, 1, "player {} should remain exactly once", other);
            }
        }
    }

    #[test]
    fn test_remove_player_is_idempotent() {
        let mut world = world_with(&[7, 8]);
        assert!(world.remove_player(7).is_some());
        assert!(world.remove_player(7).is_none());
        assert_eq!(world.players.len(), 1);
    }

    #[test]
    fn test_score_label() {
        let mut world = WorldState::new();
        world.goals = [3, 12];
        assert_eq!(world.score_label(), "3:12");
    }
}
