use std::collections::VecDeque;

use cgmath::vec3;

use crate::data_structures::entity::GameEntity;
use crate::data_structures::registry::{MaterialHandle, MeshHandle};
use crate::game::{
    PLATFORM_APPEND_DISTANCE, PLATFORM_LENGTH, PLATFORM_THICKNESS, PLATFORM_WIDTH, PLATFORM_Y,
    TRACK_START,
};

/// The endless track as a sliding window of at most two platform segments.
///
/// A segment is a stretched cube spanning `PLATFORM_LENGTH` units of track.
/// `next_start` is where the segment after the current tail would begin; it
/// only ever grows, so the track never reuses coordinates.
pub struct Track {
    segments: VecDeque<GameEntity>,
    next_start: f32,
    mesh: MeshHandle,
    material: MaterialHandle,
}

impl Track {
    pub fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        let mut track = Self {
            segments: VecDeque::with_capacity(2),
            next_start: TRACK_START,
            mesh,
            material,
        };
        track.append_segment();
        track
    }

    /// Advance the window: append a segment when the track's end comes within
    /// `PLATFORM_APPEND_DISTANCE` of the player, drop the oldest once the
    /// player has passed the newer segment's start.
    pub fn update(&mut self, player_z: f32) {
        if self.segments.len() < 2 && self.next_start - player_z <= PLATFORM_APPEND_DISTANCE {
            self.append_segment();
        }
        if self.segments.len() == 2 && player_z >= self.next_start - PLATFORM_LENGTH {
            self.segments.pop_front();
        }
    }

    fn append_segment(&mut self) {
        let start = self.next_start;
        let mut segment = GameEntity::new(self.mesh, self.material);
        segment.set_position(vec3(0.0, PLATFORM_Y, start + PLATFORM_LENGTH / 2.0));
        segment.set_scale(vec3(PLATFORM_WIDTH, PLATFORM_THICKNESS, PLATFORM_LENGTH));
        self.segments.push_back(segment);
        self.next_start = start + PLATFORM_LENGTH;
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Where the segment after the current tail would begin.
    pub fn next_start(&self) -> f32 {
        self.next_start
    }

    pub fn segments(&self) -> impl Iterator<Item = &GameEntity> {
        self.segments.iter()
    }

    pub fn segments_mut(&mut self) -> impl Iterator<Item = &mut GameEntity> {
        self.segments.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track::new(MeshHandle(0), MaterialHandle(0))
    }

    #[test]
    fn starts_with_one_segment_behind_the_player() {
        let track = track();
        assert_eq!(track.len(), 1);
        let first = track.segments().next().unwrap();
        // Spans [TRACK_START, TRACK_START + PLATFORM_LENGTH).
        assert_eq!(
            first.transform.position.z,
            TRACK_START + PLATFORM_LENGTH / 2.0
        );
        assert_eq!(track.next_start(), TRACK_START + PLATFORM_LENGTH);
    }

    #[test]
    fn appends_exactly_at_the_threshold() {
        let mut track = track();
        let threshold = track.next_start() - PLATFORM_APPEND_DISTANCE;

        track.update(threshold - 0.01);
        assert_eq!(track.len(), 1);

        track.update(threshold);
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn drops_the_oldest_once_the_player_passes_the_newer_start() {
        let mut track = track();
        track.update(track.next_start() - PLATFORM_APPEND_DISTANCE);
        assert_eq!(track.len(), 2);
        let newer_start = track.next_start() - PLATFORM_LENGTH;

        track.update(newer_start - 0.01);
        assert_eq!(track.len(), 2);

        track.update(newer_start);
        assert_eq!(track.len(), 1);
        assert_eq!(
            track.segments().next().unwrap().transform.position.z,
            newer_start + PLATFORM_LENGTH / 2.0
        );
    }

    #[test]
    fn window_stays_between_one_and_two_over_a_long_run() {
        let mut track = track();
        let mut appended = 0;
        let mut player_z = 0.0;
        for _ in 0..10_000 {
            let before = track.next_start();
            player_z += 0.033;
            track.update(player_z);
            if track.next_start() > before {
                appended += 1;
            }
            assert!((1..=2).contains(&track.len()), "window broke at z={player_z}");
            // The track under the player is always paved.
            assert!(track.next_start() - player_z > 0.0);
        }
        // ~330 units of travel over 15-unit segments.
        assert_eq!(appended, 22);
    }
}
