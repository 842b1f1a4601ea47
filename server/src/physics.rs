//! Authoritative rink physics.
//!
//! Tick-based rather than time-based: every step moves bodies by
//! `velocity * BASE_SPEED` no matter how long the tick actually took.

use shared::world::{FIELD_BORDERS, TEAMS_GOALS_Y};
use shared::{MoveableObject, Span, Vector2, WorldState};

/// Distance scale applied to velocity each tick.
pub const BASE_SPEED: f32 = 0.005;
/// Velocity damping applied after integration.
pub const FRICTION_FACTOR: f32 = 0.99;
/// Elasticity of body/body collisions.
pub const RESTITUTION: f32 = 0.9;

/// Team whose score increases, if the puck crossed a goal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Goal {
    pub scoring_team: usize,
}

/// Mass-weighted impulse response between two bodies.
///
/// Bodies already separating along the contact normal are left alone.
/// Interpenetration is not corrected.
pub fn collision_response(a: &mut MoveableObject, b: &mut MoveableObject) {
    let normal = (b.pos - a.pos).normalize();
    let relative_velocity = (b.velocity - a.velocity).dot(normal);
    if relative_velocity > 0.0 {
        return;
    }

    let impulse_magnitude =
        -(1.0 + RESTITUTION) * relative_velocity / (1.0 / a.mass + 1.0 / b.mass);
    let impulse = normal * impulse_magnitude;

    a.velocity -= impulse / a.mass;
    b.velocity += impulse / b.mass;
}

/// Clamps a body inside the border pair, reflecting the velocity component
/// of every edge it was pushed back from.
pub fn handle_border_collision(body: &mut MoveableObject, left_right: Span, top_bottom: Span) {
    if body.pos.x - body.radius < left_right.min {
        body.pos.x = left_right.min + body.radius;
        body.velocity.x = -body.velocity.x;
    } else if body.pos.x + body.radius > left_right.max {
        body.pos.x = left_right.max - body.radius;
        body.velocity.x = -body.velocity.x;
    }

    if body.pos.y - body.radius < top_bottom.min {
        body.pos.y = top_bottom.min + body.radius;
        body.velocity.y = -body.velocity.y;
    } else if body.pos.y + body.radius > top_bottom.max {
        body.pos.y = top_bottom.max - body.radius;
        body.velocity.y = -body.velocity.y;
    }
}

pub fn integrate(body: &mut MoveableObject) {
    body.pos += body.velocity * BASE_SPEED;
}

pub fn apply_friction(body: &mut MoveableObject) {
    body.velocity *= FRICTION_FACTOR;
}

/// Which team scores if the puck is past a goal line. Crossing the low line
/// (team 0's goal) scores for team 1 and vice versa.
pub fn detect_goal(puck: &MoveableObject) -> Option<Goal> {
    if puck.pos.y < TEAMS_GOALS_Y.min {
        Some(Goal { scoring_team: 1 })
    } else if puck.pos.y > TEAMS_GOALS_Y.max {
        Some(Goal { scoring_team: 0 })
    } else {
        None
    }
}

/// Runs collision, containment, integration and friction over the whole
/// world and reports a goal if one was scored. Goal bookkeeping (score,
/// resets) is left to the caller.
pub fn advance(world: &mut WorldState) -> Option<Goal> {
    let [left_right, top_bottom] = FIELD_BORDERS;
    let puck = &mut world.puck.transform;

    for player in world.players.iter_mut() {
        if player.transform.collides_with(puck) {
            collision_response(&mut player.transform, puck);
        }
    }

    // Each unordered pair once, lower id first.
    let count = world.players.len();
    for i in 0..count {
        for j in 0..count {
            if world.players[i].id >= world.players[j].id {
                continue;
            }
            let (first, second) = pair_mut(&mut world.players, i, j);
            if first.transform.collides_with(&second.transform) {
                collision_response(&mut first.transform, &mut second.transform);
            }
        }
    }

    for body in world
        .players
        .iter_mut()
        .map(|p| &mut p.transform)
        .chain(std::iter::once(&mut world.puck.transform))
    {
        handle_border_collision(body, left_right, top_bottom);
        integrate(body);
        apply_friction(body);
    }

    detect_goal(&world.puck.transform)
}

/// Puts the puck back at centre ice, stopped.
pub fn reset_puck(world: &mut WorldState) {
    world.puck.transform.reset_at(Vector2::ZERO);
}

fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert!(i != j);
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::{Player, Puck};

    fn body(pos: Vector2, velocity: Vector2, radius: f32, mass: f32) -> MoveableObject {
        MoveableObject {
            pos,
            velocity,
            radius,
            mass,
        }
    }

    fn momentum(a: &MoveableObject, b: &MoveableObject) -> Vector2 {
        a.velocity * a.mass + b.velocity * b.mass
    }

    #[test]
    fn test_collision_conserves_momentum() {
        let mut a = body(Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.2), 0.05, 0.025);
        let mut b = body(Vector2::new(0.06, 0.02), Vector2::new(-0.5, 0.0), 0.02, 0.01);
        assert!(a.collides_with(&b));

        let before = momentum(&a, &b);
        collision_response(&mut a, &mut b);
        let after = momentum(&a, &b);

        assert_approx_eq!(before.x, after.x, 1e-5);
        assert_approx_eq!(before.y, after.y, 1e-5);
    }

    #[test]
    fn test_collision_flips_relative_normal_velocity() {
        let mut a = body(Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0), 0.05, 0.025);
        let mut b = body(Vector2::new(0.08, 0.0), Vector2::new(-1.0, 0.0), 0.05, 0.025);
        let normal = (b.pos - a.pos).normalize();

        let before = (b.velocity - a.velocity).dot(normal);
        collision_response(&mut a, &mut b);
        let after = (b.velocity - a.velocity).dot(normal);

        assert!(before < 0.0);
        assert_approx_eq!(after, -RESTITUTION * before, 1e-5);
    }

    #[test]
    fn test_separating_bodies_are_untouched() {
        let mut a = body(Vector2::new(0.0, 0.0), Vector2::new(-1.0, 0.0), 0.05, 0.025);
        let mut b = body(Vector2::new(0.05, 0.0), Vector2::new(1.0, 0.0), 0.05, 0.025);
        let (a_before, b_before) = (a, b);

        collision_response(&mut a, &mut b);

        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn test_lighter_puck_leaves_faster_than_players() {
        let mut left = Player::new(0);
        let mut right = Player::new(1);
        let mut puck = Puck::default();
        left.transform.pos = Vector2::new(-0.06, 0.0);
        left.transform.velocity = Vector2::new(1.0, 0.0);
        right.transform.pos = Vector2::new(0.06, 0.0);
        right.transform.velocity = Vector2::new(-1.0, 0.0);
        puck.transform.pos = Vector2::new(0.0, 0.001);

        assert!(left.transform.collides_with(&puck.transform));
        collision_response(&mut left.transform, &mut puck.transform);
        assert!(right.transform.collides_with(&puck.transform));
        collision_response(&mut right.transform, &mut puck.transform);

        let puck_speed = puck.transform.velocity.length();
        assert!(puck_speed > left.transform.velocity.length());
        assert!(puck_speed > right.transform.velocity.length());
    }

    #[test]
    fn test_border_containment_and_reflection() {
        let [lr, tb] = FIELD_BORDERS;
        let cases = [
            Vector2::new(lr.min - 0.1, 0.0),
            Vector2::new(lr.max + 0.1, 0.0),
            Vector2::new(0.0, tb.min - 0.1),
            Vector2::new(0.0, tb.max + 0.1),
            Vector2::new(lr.max, tb.max),
        ];

        for pos in cases {
            let velocity = Vector2::new(0.7, -0.4);
            let mut b = body(pos, velocity, 0.05, 0.025);
            handle_border_collision(&mut b, lr, tb);

            assert!(b.pos.x >= lr.min + b.radius - 1e-6 && b.pos.x <= lr.max - b.radius + 1e-6);
            assert!(b.pos.y >= tb.min + b.radius - 1e-6 && b.pos.y <= tb.max - b.radius + 1e-6);
            assert_approx_eq!(b.velocity.x.abs(), velocity.x.abs());
            assert_approx_eq!(b.velocity.y.abs(), velocity.y.abs());
        }
    }

    #[test]
    fn test_border_reflects_only_penetrating_axis() {
        let [lr, tb] = FIELD_BORDERS;
        let mut b = body(Vector2::new(lr.min, 0.0), Vector2::new(-1.0, 0.5), 0.05, 0.025);
        handle_border_collision(&mut b, lr, tb);
        assert_approx_eq!(b.pos.x, lr.min + 0.05);
        assert_eq!(b.velocity, Vector2::new(1.0, 0.5));
    }

    #[test]
    fn test_integration_and_friction() {
        let mut world = WorldState::new();
        world.puck.transform.velocity = Vector2::new(1.0, 0.0);

        assert!(advance(&mut world).is_none());
        assert_approx_eq!(world.puck.transform.pos.x, BASE_SPEED);
        assert_approx_eq!(world.puck.transform.velocity.x, FRICTION_FACTOR);
    }

    #[test]
    fn test_goal_below_low_line_scores_for_team_one() {
        let mut world = WorldState::new();
        world.puck.transform.pos = Vector2::new(0.0, TEAMS_GOALS_Y.min - 0.01);
        assert_eq!(advance(&mut world), Some(Goal { scoring_team: 1 }));

        let mut world = WorldState::new();
        world.puck.transform.pos = Vector2::new(0.0, TEAMS_GOALS_Y.max + 0.01);
        assert_eq!(advance(&mut world), Some(Goal { scoring_team: 0 }));
    }

    #[test]
    fn test_pair_resolved_once_regardless_of_order() {
        let mut a = Player::new(4);
        let mut b = Player::new(2);
        a.transform.pos = Vector2::new(0.0, 0.5);
        a.transform.velocity = Vector2::new(1.0, 0.0);
        b.transform.pos = Vector2::new(0.09, 0.5);
        b.transform.velocity = Vector2::new(-1.0, 0.0);

        let mut forward = WorldState::new();
        forward.players = vec![a, b];
        let mut backward = WorldState::new();
        backward.players = vec![b, a];

        advance(&mut forward);
        advance(&mut backward);

        let fa = forward.find_player(4).unwrap().transform.velocity;
        let ba = backward.find_player(4).unwrap().transform.velocity;
        assert_approx_eq!(fa.x, ba.x, 1e-6);
        // One exchange reverses the approach; a second would restore it.
        assert!(fa.x < 0.0);
    }

    #[test]
    fn test_reset_puck() {
        let mut world = WorldState::new();
        world.puck.transform.pos = Vector2::new(0.3, 0.3);
        world.puck.transform.velocity = Vector2::new(0.3, 0.3);
        reset_puck(&mut world);
        assert_eq!(world.puck.transform.pos, Vector2::ZERO);
        assert_eq!(world.puck.transform.velocity, Vector2::ZERO);
    }
}
