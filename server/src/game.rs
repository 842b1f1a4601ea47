use crate::physics::{self, Goal};
use crate::spawn::Spawner;
use log::{debug, info, warn};
use shared::{Player, WorldState};

/// Authoritative match state: the replicated world plus what only the
/// server needs to advance it.
pub struct GameState {
    pub tick: u64,
    pub world: WorldState,
    spawner: Spawner,
}

impl GameState {
    pub fn new(spawner: Spawner) -> Self {
        Self {
            tick: 0,
            world: WorldState::new(),
            spawner,
        }
    }

    /// Creates the player for a freshly connected peer, places it in its
    /// team half clear of everyone else and appends it to the world.
    pub fn admit_player(&mut self, id: u32) -> Player {
        self.world.players.push(Player::new(id));
        let index = self.world.players.len() - 1;
        self.spawner.respawn(&mut self.world.players, index);

        let player = self.world.players[index];
        info!(
            "Added player {} to team {} at ({:.3}, {:.3})",
            id, player.team_id, player.transform.pos.x, player.transform.pos.y
        );
        player
    }

    pub fn remove_player(&mut self, id: u32) -> Option<Player> {
        let removed = self.world.remove_player(id);
        match removed {
            Some(_) => info!("Removed player {}", id),
            None => debug!("Player {} already removed", id),
        }
        removed
    }

    /// Replaces the addressed player's velocity. Nothing else in the
    /// update is trusted.
    pub fn apply_input(&mut self, update: &Player) {
        match self.world.find_player_mut(update.id) {
            Some(player) => player.transform.velocity = update.transform.velocity,
            None => warn!("Input for unknown player {}", update.id),
        }
    }

    /// One simulation tick, including the post-goal resets.
    pub fn step(&mut self) -> Option<Goal> {
        self.tick += 1;
        let goal = physics::advance(&mut self.world)?;

        self.world.goals[goal.scoring_team] += 1;
        physics::reset_puck(&mut self.world);
        self.spawner.respawn_all(&mut self.world.players);
        info!(
            "Team {} scored on tick {}, score {}",
            goal.scoring_team,
            self.tick,
            self.world.score_label()
        );
        Some(goal)
    }
}

/// Dispatcher handler for `PlayerInputUpdate`.
pub fn on_player_input(game: &mut GameState, update: Player) {
    game.apply_input(&update);
}

/// Dispatcher handler for an explicit `Disconnect` packet.
pub fn on_disconnect(game: &mut GameState, player_id: u32) {
    game.remove_player(player_id);
}
