//! Collision-free spawn placement by rejection sampling.

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::world::{is_colliding, LEFT_RIGHT_LINES, SPAWN_BAND_EDGE, TEAMS_GOALS_Y};
use shared::{Player, Puck, Span, Vector2};

/// Attempts after which slow sampling is reported. Sampling never gives up.
const SLOW_SAMPLING_ATTEMPTS: u64 = 10_000;

/// Rectangle a team's players spawn in: its own half, behind the band edge.
pub fn team_region(team_id: u32) -> (Span, Span) {
    let x = Span::new(
        LEFT_RIGHT_LINES.min + Player::BASE_RADIUS,
        LEFT_RIGHT_LINES.max - Player::BASE_RADIUS,
    );
    let y = if team_id == 0 {
        Span::new(TEAMS_GOALS_Y.min + Player::BASE_RADIUS, -SPAWN_BAND_EDGE)
    } else {
        Span::new(SPAWN_BAND_EDGE, TEAMS_GOALS_Y.max - Player::BASE_RADIUS)
    };
    (x, y)
}

pub struct Spawner {
    rng: StdRng,
}

impl Spawner {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws positions in the team's region until one is clear of every
    /// body in `occupied` (position, radius). The candidate is tested with
    /// the puck's radius as exclusion radius.
    pub fn sample_clear_position<I>(&mut self, team_id: u32, occupied: I) -> Vector2
    where
        I: IntoIterator<Item = (Vector2, f32)>,
        I::IntoIter: Clone,
    {
        let (x, y) = team_region(team_id);
        let occupied = occupied.into_iter();
        let mut attempts: u64 = 0;

        loop {
            attempts += 1;
            if attempts % SLOW_SAMPLING_ATTEMPTS == 0 {
                warn!(
                    "Spawn sampling for team {} still running after {} attempts",
                    team_id, attempts
                );
            }

            let candidate = Vector2::new(
                self.rng.gen_range(x.min..x.max),
                self.rng.gen_range(y.min..y.max),
            );
            let blocked = occupied
                .clone()
                .any(|(pos, radius)| is_colliding(candidate, Puck::BASE_RADIUS, pos, radius));
            if !blocked {
                debug!("Spawn for team {} found after {} attempts", team_id, attempts);
                return candidate;
            }
        }
    }

    /// Moves `players[index]` to a clear spot in its team half and stops it.
    pub fn respawn(&mut self, players: &mut [Player], index: usize) {
        let team_id = players[index].team_id;
        let occupied = players
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index)
            .map(|(_, p)| (p.transform.pos, p.transform.radius));
        let pos = self.sample_clear_position(team_id, occupied);
        players[index].transform.reset_at(pos);
    }

    /// Respawns every player in sequence order, so later players avoid the
    /// new positions of earlier ones.
    pub fn respawn_all(&mut self, players: &mut [Player]) {
        for index in 0..players.len() {
            self.respawn(players, index);
        }
    }
}
