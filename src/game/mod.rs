//! Gameplay state: the player, the recycled track, the collectible pool and
//! the per-tick update rules. Everything here is plain CPU data driven by
//! [`update`](Game::update); entities reference GPU resources only through
//! registry handles, so the whole module runs headless in tests.

pub mod collectibles;
pub mod rng;
pub mod track;

use cgmath::vec3;
use winit::keyboard::KeyCode;

use crate::data_structures::entity::GameEntity;
use crate::data_structures::registry::{MaterialHandle, MeshHandle};
use crate::input::InputState;
use collectibles::CollectiblePool;
use rng::LaneRng;
use track::Track;

pub const WINDOW_TITLE: &str = "Cyber-Run";
pub const WINDOW_WIDTH: u32 = 800;
pub const WINDOW_HEIGHT: u32 = 600;

/// The three lane x positions, left to right.
pub const LANES: [f32; 3] = [-0.75, 0.0, 0.75];
pub const LANE_STEP: f32 = 0.75;
/// Units per second along +z.
pub const FORWARD_SPEED: f32 = 2.0;
pub const PLAYER_Y: f32 = -1.0;

pub const PLATFORM_LENGTH: f32 = 15.0;
pub const PLATFORM_WIDTH: f32 = 3.0;
pub const PLATFORM_THICKNESS: f32 = 2.0;
/// Platform center height; the top surface sits at PLAYER_Y.
pub const PLATFORM_Y: f32 = -2.0;
/// A fresh segment is appended when the track's end is this close.
pub const PLATFORM_APPEND_DISTANCE: f32 = 2.5;
/// The first segment starts this far behind the player.
pub const TRACK_START: f32 = -5.0;

pub const COLLECTIBLE_POOL_SIZE: usize = 20;
/// Track distance between consecutive spawn slots.
pub const COLLECTIBLE_SPACING: f32 = 2.0;
pub const COLLECTIBLE_Y: f32 = -0.5;
pub const COLLECTIBLE_SCALE: f32 = 0.1;
/// A collectible this far ahead of the player (or closer) on the same lane
/// counts as collected.
pub const CAPTURE_AHEAD: f32 = 0.2;

/// The camera trails the player by this much on the track axis.
pub const CAMERA_TRAIL: f32 = 2.0;

/// Seed for the lane randomization when none is given. Runs are meant to be
/// reproducible, not varied.
pub const DEFAULT_SEED: u64 = 1;

/// Registry handles for everything the game spawns, resolved once at scene
/// setup.
#[derive(Debug, Clone, Copy)]
pub struct SceneHandles {
    pub player_mesh: MeshHandle,
    pub player_material: MaterialHandle,
    pub platform_mesh: MeshHandle,
    pub platform_material: MaterialHandle,
    pub collectible_mesh: MeshHandle,
    pub collectible_material: MaterialHandle,
    pub sky_mesh: MeshHandle,
    pub sky_material: MaterialHandle,
}

pub struct Game {
    pub player: GameEntity,
    pub sky: GameEntity,
    pub track: Track,
    pub collectibles: CollectiblePool,
    pub score: u32,
    pub should_quit: bool,
    left_armed: bool,
    right_armed: bool,
    rng: LaneRng,
}

impl Game {
    pub fn new(handles: &SceneHandles) -> Self {
        Self::with_seed(handles, DEFAULT_SEED)
    }

    pub fn with_seed(handles: &SceneHandles, seed: u64) -> Self {
        let mut rng = LaneRng::new(seed);

        let mut player = GameEntity::new(handles.player_mesh, handles.player_material);
        player.set_position(vec3(LANES[1], PLAYER_Y, 0.0));
        player.set_scale(vec3(0.3, 0.6, 0.3));

        let sky = GameEntity::new(handles.sky_mesh, handles.sky_material);

        let track = Track::new(handles.platform_mesh, handles.platform_material);
        let collectibles = CollectiblePool::new(
            handles.collectible_mesh,
            handles.collectible_material,
            &mut rng,
        );

        Self {
            player,
            sky,
            track,
            collectibles,
            score: 0,
            should_quit: false,
            left_armed: false,
            right_armed: false,
            rng,
        }
    }

    /// One fixed-order gameplay tick: quit check, lane input, forward motion,
    /// track recycling, collectible capture.
    pub fn update(&mut self, dt: f32, input: &InputState) {
        if input.is_held(KeyCode::Escape) {
            self.should_quit = true;
            return;
        }

        self.update_lane(input);
        self.player.translate(vec3(0.0, 0.0, FORWARD_SPEED * dt));

        let player_position = self.player.transform.position;
        self.track.update(player_position.z);
        self.score += self
            .collectibles
            .update(player_position.x, player_position.z, &mut self.rng);
    }

    /// Lane changes commit on key release, not press: holding A or D arms the
    /// step, letting go performs it, clamped to the outer lanes.
    fn update_lane(&mut self, input: &InputState) {
        let left_held = input.is_held(KeyCode::KeyA);
        let right_held = input.is_held(KeyCode::KeyD);

        if left_held {
            self.left_armed = true;
        } else if self.left_armed {
            self.left_armed = false;
            let x = self.player.transform.position.x - LANE_STEP;
            self.player.transform.position.x = x.max(LANES[0]);
        }

        if right_held {
            self.right_armed = true;
        } else if self.right_armed {
            self.right_armed = false;
            let x = self.player.transform.position.x + LANE_STEP;
            self.player.transform.position.x = x.min(LANES[2]);
        }
    }

    /// Recompute every cached world matrix after the tick, right before the
    /// instance buffer is filled.
    pub fn update_world_matrices(&mut self) {
        self.player.update_world_matrix();
        self.sky.update_world_matrix();
        for segment in self.track.segments_mut() {
            segment.update_world_matrix();
        }
        for entry in self.collectibles.iter_mut() {
            entry.update_world_matrix();
        }
    }
}

#[cfg(test)]
pub(crate) fn test_handles() -> SceneHandles {
    SceneHandles {
        player_mesh: MeshHandle(0),
        player_material: MaterialHandle(0),
        platform_mesh: MeshHandle(1),
        platform_material: MaterialHandle(1),
        collectible_mesh: MeshHandle(2),
        collectible_material: MaterialHandle(2),
        sky_mesh: MeshHandle(3),
        sky_material: MaterialHandle(3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> Game {
        Game::with_seed(&test_handles(), 42)
    }

    fn tap(game: &mut Game, input: &mut InputState, key: KeyCode) {
        input.press(key);
        game.update(0.0, input);
        input.release(key);
        game.update(0.0, input);
    }

    #[test]
    fn lane_step_commits_on_release_not_press() {
        let mut game = game();
        let mut input = InputState::new();

        input.press(KeyCode::KeyA);
        game.update(0.0, &input);
        assert_eq!(game.player.transform.position.x, LANES[1]);

        input.release(KeyCode::KeyA);
        game.update(0.0, &input);
        assert_eq!(game.player.transform.position.x, LANES[0]);
    }

    #[test]
    fn lanes_clamp_at_the_outer_edges() {
        let mut game = game();
        let mut input = InputState::new();

        for _ in 0..4 {
            tap(&mut game, &mut input, KeyCode::KeyD);
        }
        assert_eq!(game.player.transform.position.x, LANES[2]);

        for _ in 0..8 {
            tap(&mut game, &mut input, KeyCode::KeyA);
        }
        assert_eq!(game.player.transform.position.x, LANES[0]);
    }

    #[test]
    fn holding_both_keys_arms_both_steps() {
        let mut game = game();
        let mut input = InputState::new();

        input.press(KeyCode::KeyA);
        input.press(KeyCode::KeyD);
        game.update(0.0, &input);
        input.release(KeyCode::KeyA);
        input.release(KeyCode::KeyD);
        game.update(0.0, &input);

        // Left and right cancel out.
        assert_eq!(game.player.transform.position.x, LANES[1]);
    }

    #[test]
    fn forward_motion_integrates_speed_over_dt() {
        let mut game = game();
        let input = InputState::new();

        game.update(0.5, &input);
        assert!((game.player.transform.position.z - FORWARD_SPEED * 0.5).abs() < 1e-6);
        game.update(0.25, &input);
        assert!((game.player.transform.position.z - FORWARD_SPEED * 0.75).abs() < 1e-6);
    }

    #[test]
    fn escape_requests_quit_and_freezes_the_tick() {
        let mut game = game();
        let mut input = InputState::new();
        input.press(KeyCode::Escape);

        game.update(1.0, &input);
        assert!(game.should_quit);
        assert_eq!(game.player.transform.position.z, 0.0);
    }

    #[test]
    fn same_seed_same_lanes() {
        let a = Game::with_seed(&test_handles(), 7);
        let b = Game::with_seed(&test_handles(), 7);
        let lanes_a: Vec<f32> = a.collectibles.iter().map(|e| e.transform.position.x).collect();
        let lanes_b: Vec<f32> = b.collectibles.iter().map(|e| e.transform.position.x).collect();
        assert_eq!(lanes_a, lanes_b);
    }
}
