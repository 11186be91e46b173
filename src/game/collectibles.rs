use cgmath::vec3;

use crate::data_structures::entity::GameEntity;
use crate::data_structures::registry::{MaterialHandle, MeshHandle};
use crate::game::rng::LaneRng;
use crate::game::{
    CAPTURE_AHEAD, COLLECTIBLE_POOL_SIZE, COLLECTIBLE_SCALE, COLLECTIBLE_SPACING, COLLECTIBLE_Y,
};

/// Fixed-size pool of collectible spheres strung along the track.
///
/// Entries keep their forward ordering: a captured or passed entry is removed
/// from where it sits and re-appended at the pool's far end with a fresh
/// spawn slot, so the vector always reads near-to-far and its size never
/// changes during play.
pub struct CollectiblePool {
    entries: Vec<GameEntity>,
    spawned_total: u32,
}

impl CollectiblePool {
    pub fn new(mesh: MeshHandle, material: MaterialHandle, rng: &mut LaneRng) -> Self {
        let mut entries = Vec::with_capacity(COLLECTIBLE_POOL_SIZE);
        for i in 0..COLLECTIBLE_POOL_SIZE {
            let mut entity = GameEntity::new(mesh, material);
            entity.set_position(vec3(
                rng.lane(),
                COLLECTIBLE_Y,
                COLLECTIBLE_SPACING * i as f32,
            ));
            entity.set_scale(vec3(
                COLLECTIBLE_SCALE,
                COLLECTIBLE_SCALE,
                COLLECTIBLE_SCALE,
            ));
            entries.push(entity);
        }
        Self {
            entries,
            spawned_total: COLLECTIBLE_POOL_SIZE as u32,
        }
    }

    /// Capture and recycle entries the player has reached. Returns how many
    /// were scored this tick.
    ///
    /// Lane comparison is exact float equality on purpose: both sides are
    /// assigned from the same lane constants and the lane arithmetic is exact
    /// in binary floating point.
    pub fn update(&mut self, player_x: f32, player_z: f32, rng: &mut LaneRng) -> u32 {
        let mut scored = 0;
        let mut i = 0;
        while i < self.entries.len() {
            let position = self.entries[i].transform.position;
            let ahead = position.z - player_z;
            if ahead <= CAPTURE_AHEAD && position.x == player_x {
                scored += 1;
                self.respawn(i, rng);
            } else if ahead <= 0.0 {
                self.respawn(i, rng);
            } else {
                i += 1;
            }
        }
        scored
    }

    /// Stable remove-and-append. Respawned entries land strictly ahead of the
    /// player, so the sweep in [`update`](Self::update) cannot revisit them.
    fn respawn(&mut self, index: usize, rng: &mut LaneRng) {
        let mut entity = self.entries.remove(index);
        let z = COLLECTIBLE_SPACING * self.spawned_total as f32;
        entity.set_position(vec3(rng.lane(), COLLECTIBLE_Y, z));
        self.spawned_total += 1;
        self.entries.push(entity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every collectible ever placed, including the initial pool.
    pub fn spawned_total(&self) -> u32 {
        self.spawned_total
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEntity> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GameEntity> {
        self.entries.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::LANES;

    fn pool(rng: &mut LaneRng) -> CollectiblePool {
        CollectiblePool::new(MeshHandle(0), MaterialHandle(0), rng)
    }

    #[test]
    fn initial_pool_is_spaced_along_the_track() {
        let mut rng = LaneRng::new(1);
        let pool = pool(&mut rng);
        assert_eq!(pool.len(), COLLECTIBLE_POOL_SIZE);
        assert_eq!(pool.spawned_total(), COLLECTIBLE_POOL_SIZE as u32);
        for (i, entry) in pool.iter().enumerate() {
            assert_eq!(entry.transform.position.z, COLLECTIBLE_SPACING * i as f32);
            assert!(LANES.contains(&entry.transform.position.x));
        }
    }

    #[test]
    fn capture_scores_and_respawns_at_twice_the_spawn_count() {
        let mut rng = LaneRng::new(1);
        let mut pool = pool(&mut rng);
        // Put the first entry on the player's lane at the player's position.
        pool.entries[0].transform.position.x = LANES[1];
        pool.entries[0].transform.position.z = 0.0;

        let scored = pool.update(LANES[1], 0.0, &mut rng);

        assert_eq!(scored, 1);
        assert_eq!(pool.len(), COLLECTIBLE_POOL_SIZE);
        assert_eq!(pool.spawned_total(), COLLECTIBLE_POOL_SIZE as u32 + 1);
        // The recycled entry is now the pool's tail, relocated to
        // spacing * total-spawned-at-respawn-time.
        let tail = pool.iter().last().unwrap();
        assert_eq!(
            tail.transform.position.z,
            COLLECTIBLE_SPACING * COLLECTIBLE_POOL_SIZE as f32
        );
    }

    #[test]
    fn capture_window_only_reaches_slightly_ahead() {
        let mut rng = LaneRng::new(1);
        let mut pool = pool(&mut rng);
        pool.entries[0].transform.position.x = LANES[1];
        pool.entries[0].transform.position.z = CAPTURE_AHEAD + 0.001;

        // Just out of reach.
        assert_eq!(pool.update(LANES[1], 0.0, &mut rng), 0);

        pool.entries[0].transform.position.z = CAPTURE_AHEAD;
        assert_eq!(pool.update(LANES[1], 0.0, &mut rng), 1);
    }

    #[test]
    fn missed_collectibles_recycle_without_scoring() {
        let mut rng = LaneRng::new(1);
        let mut pool = pool(&mut rng);
        pool.entries[0].transform.position.x = LANES[0];
        pool.entries[0].transform.position.z = -0.5;

        let scored = pool.update(LANES[2], 0.0, &mut rng);

        assert_eq!(scored, 0);
        assert_eq!(pool.len(), COLLECTIBLE_POOL_SIZE);
        assert_eq!(pool.spawned_total(), COLLECTIBLE_POOL_SIZE as u32 + 1);
    }

    #[test]
    fn a_collectible_level_with_the_player_on_another_lane_survives() {
        let mut rng = LaneRng::new(1);
        let mut pool = pool(&mut rng);
        pool.entries[0].transform.position.x = LANES[0];
        pool.entries[0].transform.position.z = 0.1;

        let scored = pool.update(LANES[2], 0.0, &mut rng);

        // 0.1 ahead: inside the capture window but the wrong lane, and not
        // yet behind the pass-through boundary.
        assert_eq!(scored, 0);
        assert_eq!(pool.spawned_total(), COLLECTIBLE_POOL_SIZE as u32);
    }

    #[test]
    fn pool_size_is_conserved_over_a_long_run() {
        let mut rng = LaneRng::new(9);
        let mut pool = pool(&mut rng);
        let mut player_z = 0.0;
        for _ in 0..5_000 {
            player_z += 0.05;
            pool.update(LANES[1], player_z, &mut rng);
            assert_eq!(pool.len(), COLLECTIBLE_POOL_SIZE);
        }
        // 250 units of travel at one spawn slot per 2 units; everything the
        // player passed was recycled exactly once.
        assert!(pool.spawned_total() > COLLECTIBLE_POOL_SIZE as u32 + 100);
        for entry in pool.iter() {
            assert!(entry.transform.position.z > player_z);
        }
    }
}
