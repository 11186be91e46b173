//! Long-running gameplay scenarios driven tick by tick, no GPU and no window.

use cyber_run::KeyCode;
use cyber_run::data_structures::registry::{MaterialHandle, MeshHandle};
use cyber_run::game::{COLLECTIBLE_POOL_SIZE, Game, LANES, PLATFORM_LENGTH, SceneHandles};
use cyber_run::input::InputState;

const DT: f32 = 0.016;

/// Handle layout matching the renderer's scene setup: cube mesh shared by
/// player, platforms and sky; sphere mesh for collectibles.
fn handles() -> SceneHandles {
    SceneHandles {
        player_mesh: MeshHandle(0),
        player_material: MaterialHandle(0),
        platform_mesh: MeshHandle(0),
        platform_material: MaterialHandle(1),
        collectible_mesh: MeshHandle(1),
        collectible_material: MaterialHandle(2),
        sky_mesh: MeshHandle(0),
        sky_material: MaterialHandle(3),
    }
}

fn tap(game: &mut Game, input: &mut InputState, key: KeyCode) {
    input.press(key);
    game.update(DT, input);
    input.release(key);
    game.update(DT, input);
}

#[test]
fn platform_window_holds_over_a_long_run() {
    let mut game = Game::new(&handles());
    let input = InputState::new();

    for _ in 0..20_000 {
        game.update(DT, &input);
        let player_z = game.player.transform.position.z;

        let segments = game.track.len();
        assert!(
            (1..=2).contains(&segments),
            "track held {segments} segments at z={player_z}"
        );
        // The player never outruns the paved track in either direction.
        assert!(game.track.next_start() > player_z);
        let front_start = game
            .track
            .segments()
            .next()
            .map(|segment| segment.transform.position.z - PLATFORM_LENGTH / 2.0)
            .unwrap();
        assert!(front_start <= player_z);
    }
}

#[test]
fn collectible_pool_size_is_conserved() {
    let mut game = Game::new(&handles());
    let input = InputState::new();

    for _ in 0..20_000 {
        game.update(DT, &input);
        assert_eq!(game.collectibles.len(), COLLECTIBLE_POOL_SIZE);
        // Anything level with the player or behind was recycled this tick.
        let player_z = game.player.transform.position.z;
        for entry in game.collectibles.iter() {
            assert!(entry.transform.position.z > player_z);
        }
    }

    // 640 units of track passed: plenty of recycles, and captures only for
    // entries that happened to land on the center lane the player stayed on.
    let recycled = game.collectibles.spawned_total() - COLLECTIBLE_POOL_SIZE as u32;
    assert!(recycled > 100);
    assert!(game.score > 0);
    assert!(game.score <= recycled);

    // The newest respawn is the farthest out and sits on its spawn slot.
    let tail = game.collectibles.iter().last().unwrap();
    assert_eq!(
        tail.transform.position.z,
        2.0 * (game.collectibles.spawned_total() - 1) as f32
    );
}

#[test]
fn lane_changes_stay_clamped_to_the_rails() {
    let mut game = Game::new(&handles());
    let mut input = InputState::new();

    let script = [
        KeyCode::KeyA,
        KeyCode::KeyA,
        KeyCode::KeyA,
        KeyCode::KeyD,
        KeyCode::KeyD,
        KeyCode::KeyD,
        KeyCode::KeyD,
        KeyCode::KeyA,
    ];
    for key in script {
        tap(&mut game, &mut input, key);
        assert!(LANES.contains(&game.player.transform.position.x));
    }
    // Three lefts clamp at the left rail, four rights clamp at the right one,
    // and the final left steps back in.
    assert_eq!(game.player.transform.position.x, LANES[1]);
}

#[test]
fn first_center_lane_collectible_scores_and_respawns_on_its_slot() {
    let mut game = Game::new(&handles());
    let input = InputState::new();

    // Park the nearest collectible right in the player's path.
    {
        let entry = game.collectibles.iter_mut().next().unwrap();
        entry.transform.position.x = LANES[1];
        entry.transform.position.z = 0.1;
    }
    let spawned_before = game.collectibles.spawned_total();

    game.update(0.01, &input);

    assert_eq!(game.score, 1);
    assert_eq!(game.collectibles.len(), COLLECTIBLE_POOL_SIZE);
    assert_eq!(game.collectibles.spawned_total(), spawned_before + 1);
    // First respawn of a 20 entry pool lands at z = 2 * 20.
    let tail = game.collectibles.iter().last().unwrap();
    assert_eq!(tail.transform.position.z, 40.0);
}

#[test]
fn escape_requests_quit_and_freezes_the_world() {
    let mut game = Game::new(&handles());
    let mut input = InputState::new();

    game.update(DT, &input);
    let z_before = game.player.transform.position.z;

    input.press(KeyCode::Escape);
    game.update(DT, &input);
    game.update(DT, &input);

    assert!(game.should_quit);
    assert_eq!(game.player.transform.position.z, z_before);
}

#[test]
fn identical_seeds_and_inputs_replay_identically() {
    let mut left = Game::new(&handles());
    let mut right = Game::new(&handles());
    let mut left_input = InputState::new();
    let mut right_input = InputState::new();

    for round in 0..50 {
        let key = if round % 3 == 0 {
            KeyCode::KeyA
        } else {
            KeyCode::KeyD
        };
        tap(&mut left, &mut left_input, key);
        tap(&mut right, &mut right_input, key);
        for _ in 0..20 {
            left.update(DT, &left_input);
            right.update(DT, &right_input);
        }
    }

    assert_eq!(left.score, right.score);
    assert_eq!(
        left.player.transform.position.x,
        right.player.transform.position.x
    );
    assert_eq!(
        left.player.transform.position.z,
        right.player.transform.position.z
    );
    for (a, b) in left.collectibles.iter().zip(right.collectibles.iter()) {
        assert_eq!(a.transform.position.x, b.transform.position.x);
        assert_eq!(a.transform.position.z, b.transform.position.z);
    }
}
