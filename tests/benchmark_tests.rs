//! Performance benchmarks for critical game systems

use server::physics::{advance, collision_response};
use server::spawn::Spawner;
use shared::world::{is_colliding, FIELD_BORDERS};
use shared::{
    decode, encode, MoveableObject, PacketDispatcher, PacketType, Player, Vector2, WorldState,
};
use std::time::Instant;

fn full_rink(players: u32, seed: u64) -> WorldState {
    let mut world = WorldState::new();
    world.players = (0..players).map(Player::new).collect();
    Spawner::seeded(seed).respawn_all(&mut world.players);
    world
}

/// Benchmarks collision detection performance
#[test]
fn benchmark_collision_detection() {
    let a = Vector2::new(0.1, 0.1);
    let b = Vector2::new(0.15, 0.12);

    let iterations = 100_000;
    let start = Instant::now();

    let mut hits = 0;
    for _ in 0..iterations {
        if is_colliding(a, Player::BASE_RADIUS, b, Player::BASE_RADIUS) {
            hits += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "Collision detection: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert_eq!(hits, iterations);
    assert!(duration.as_millis() < 200);
}

/// Benchmarks impulse response between two players
#[test]
fn benchmark_collision_response() {
    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let mut a = MoveableObject::new(Player::BASE_RADIUS, Player::MASS);
        let mut b = MoveableObject::new(Player::BASE_RADIUS, Player::MASS);
        b.pos = Vector2::new(0.08, 0.0);
        a.velocity = Vector2::new(1.0, 0.0);
        b.velocity = Vector2::new(-1.0, 0.0);

        collision_response(&mut a, &mut b);
        assert!(a.velocity.x < 0.0 && b.velocity.x > 0.0);
    }

    let duration = start.elapsed();
    println!(
        "Collision response: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks full physics steps on a crowded rink
#[test]
fn benchmark_physics_step() {
    let mut world = full_rink(10, 3);
    for (i, player) in world.players.iter_mut().enumerate() {
        let angle = i as f32;
        player.transform.velocity = Vector2::new(angle.cos(), angle.sin());
    }

    let steps = 10_000;
    let start = Instant::now();

    for _ in 0..steps {
        if advance(&mut world).is_some() {
            server::physics::reset_puck(&mut world);
        }
    }

    let duration = start.elapsed();
    println!(
        "Physics: {} steps with {} players in {:?} ({:.2} μs/step)",
        steps,
        world.players.len(),
        duration,
        duration.as_micros() as f64 / steps as f64
    );

    // Containment keeps everyone near the rink; one step of drift at most.
    let [left_right, top_bottom] = FIELD_BORDERS;
    for player in &world.players {
        let pos = player.transform.pos;
        assert!(pos.x > left_right.min - 0.1 && pos.x < left_right.max + 0.1);
        assert!(pos.y > top_bottom.min - 0.1 && pos.y < top_bottom.max + 0.1);
    }
    assert!(duration.as_millis() < 3000);
}

/// Benchmarks spawn placement for a full server after a goal
#[test]
fn benchmark_respawn_all() {
    let mut world = full_rink(10, 5);
    let mut spawner = Spawner::seeded(9);

    let rounds = 1_000;
    let start = Instant::now();

    for _ in 0..rounds {
        spawner.respawn_all(&mut world.players);
    }

    let duration = start.elapsed();
    println!(
        "Respawn: {} rounds of {} players in {:?}",
        rounds,
        world.players.len(),
        duration
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks snapshot encoding and decoding
#[test]
fn benchmark_world_state_codec() {
    let mut world = full_rink(10, 7);
    world.goals = [4, 2];

    let iterations = 10_000;
    let start = Instant::now();

    let mut last = None;
    for _ in 0..iterations {
        let bytes = encode(PacketType::WorldState, &world).unwrap();
        let (packet_type, reader) = decode(&bytes).unwrap();
        assert_eq!(packet_type, PacketType::WorldState);
        last = Some(reader.read::<WorldState>().unwrap());
    }

    let duration = start.elapsed();
    let size = bincode::serialized_size(&world).unwrap() + 1;
    println!(
        "Snapshot codec: {} round trips of {} bytes in {:?} ({:.2} μs/iter)",
        iterations,
        size,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(last, Some(world));
    // Ten players plus puck and score fit well inside one datagram.
    assert!(size < 1200);
    assert!(duration.as_millis() < 2000);
}

fn count_input(count: &mut u32, _player: Player) {
    *count += 1;
}

/// Benchmarks tag lookup and payload decoding in the dispatcher
#[test]
fn benchmark_dispatch() {
    let mut dispatcher = PacketDispatcher::<u32>::new();
    dispatcher.register(PacketType::PlayerInputUpdate, count_input);
    let bytes = encode(PacketType::PlayerInputUpdate, &Player::new(3)).unwrap();

    let iterations = 100_000;
    let start = Instant::now();

    let mut count = 0;
    for _ in 0..iterations {
        dispatcher.handle(&mut count, &bytes).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Dispatch: {} packets in {:?} ({:.2} ns/packet)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert_eq!(count, iterations);
    assert!(duration.as_millis() < 2000);
}
