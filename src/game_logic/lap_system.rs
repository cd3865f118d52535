use crate::game_logic::{
    cardinal_heading, Car, CarReset, GameConfig, Kinematics, PreviousPosition, RaceEntity,
    RaceStats, Track,
};
use crate::GameState;
use bevy::prelude::*;

// how close a car must get to a checkpoint center to count it
const CHECKPOINT_RADIUS: f32 = 96.0;

const LAP_SCORE: i32 = 100;
const PENALTY_SCORE: i32 = 10;

#[derive(Component)]
pub struct Checkpoint {
    pub index: usize,
}

/// Per-car checkpoint progress. Checkpoint 0 doubles as the start/finish
/// line; cars must take the checkpoints in order.
#[derive(Component, Clone, Debug, Default)]
pub struct LapProgress {
    pub next_checkpoint: usize,
    /// where a penalty reset puts the car back
    pub last_checkpoint: usize,
    /// total checkpoints taken this race, used for live standings
    pub total_passed: u32,
    /// the opening start-line crossing does not complete a lap
    pub crossed_start: bool,
    pub finished: bool,
}

pub fn spawn_checkpoints(mut commands: Commands, asset_server: Res<AssetServer>, track: Res<Track>) {
    let marker_handle = asset_server.load("checkpoint.png");
    for (index, position) in track.checkpoints.iter().enumerate() {
        commands.spawn((
            Checkpoint { index },
            Sprite::from_image(marker_handle.clone()),
            Transform::from_xyz(position.x, position.y, 2.0),
            RaceEntity,
        ));
    }
}

pub fn update_laps(
    config: Res<GameConfig>,
    track: Res<Track>,
    mut cars: Query<(&Transform, &mut LapProgress, &mut RaceStats), With<Car>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let mut race_over = false;

    for (transform, mut progress, mut stats) in cars.iter_mut() {
        if progress.finished {
            continue;
        }

        let target = progress.next_checkpoint;
        let car_position = transform.translation.truncate();
        if car_position.distance(track.checkpoints[target]) >= CHECKPOINT_RADIUS {
            continue;
        }

        progress.last_checkpoint = target;
        progress.next_checkpoint = (target + 1) % track.checkpoints.len();
        progress.total_passed += 1;

        if target == 0 {
            if progress.crossed_start {
                stats.lap += 1;
                info!("lap {} complete", stats.lap);
                if stats.lap >= config.total_laps {
                    progress.finished = true;
                    race_over = true;
                }
            } else {
                progress.crossed_start = true;
            }
        }
    }

    // the first finisher ends the race; every car's score settles here so
    // the final standings show what each of them actually did
    if race_over {
        for (_, _, mut stats) in cars.iter_mut() {
            stats.score = stats.lap as i32 * LAP_SCORE - stats.penalties as i32 * PENALTY_SCORE;
            info!("final score settled: {}", stats.score);
        }
        next_state.set(GameState::Victory);
    }
}

/// Recompute live standings: most laps first, then checkpoints taken,
/// then distance to the next checkpoint.
pub fn update_places(
    track: Res<Track>,
    mut cars: Query<(Entity, &Transform, &LapProgress, &mut RaceStats), With<Car>>,
) {
    let mut order: Vec<(Entity, u32, u32, f32)> = cars
        .iter()
        .map(|(entity, transform, progress, stats)| {
            let distance = transform
                .translation
                .truncate()
                .distance(track.checkpoints[progress.next_checkpoint]);
            (entity, stats.lap, progress.total_passed, distance)
        })
        .collect();

    order.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then(b.2.cmp(&a.2))
            .then(a.3.total_cmp(&b.3))
    });

    for (place, (entity, _, _, _)) in order.iter().enumerate() {
        if let Ok((_, _, _, mut stats)) = cars.get_mut(*entity) {
            stats.place = place as u32 + 1;
        }
    }
}

/// Penalty resets: put the car back on its last checkpoint, facing the
/// next one. Runs after integration so the whole frame's collision
/// processing has settled first.
pub fn handle_car_resets(
    mut resets: EventReader<CarReset>,
    track: Res<Track>,
    mut cars: Query<
        (&mut Transform, &mut PreviousPosition, &mut Kinematics, &LapProgress),
        With<Car>,
    >,
) {
    for reset in resets.read() {
        let Ok((mut transform, mut previous, mut kinematics, progress)) = cars.get_mut(reset.car)
        else {
            continue;
        };

        let anchor = track.checkpoints[progress.last_checkpoint];
        let toward = track.checkpoints[progress.next_checkpoint];
        info!("resetting car to checkpoint {}", progress.last_checkpoint);

        transform.translation.x = anchor.x;
        transform.translation.y = anchor.y;
        previous.0 = anchor;
        kinematics.current.rotation = cardinal_heading(anchor, toward);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_logic::{CarProfile, KinematicState, Track};
    use bevy::ecs::system::RunSystemOnce;

    const TRACK: &str = r#"{
        "name": "loop",
        "width": 4,
        "height": 4,
        "ground": [0,0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        "road":   [8,8,8,8, 8,-1,-1,8, 8,-1,-1,8, 8,8,8,8],
        "objects":[-1,-1,-1,-1, -1,-1,-1,-1, -1,-1,-1,-1, -1,-1,-1,-1],
        "checkpoints": [[0, 0], [3, 0], [3, 3], [0, 3]]
    }"#;

    fn profile() -> CarProfile {
        CarProfile {
            name: "test".into(),
            max_speed: 200.0,
            acceleration: 3.0,
            braking: 5.0,
            handling: 4.0,
            drag: 1.0,
            tolerance: 30,
            liveries: Vec::new(),
        }
    }

    fn race_world() -> World {
        let mut world = World::new();
        world.insert_resource(Track::from_json(TRACK).unwrap());
        world.insert_resource(GameConfig {
            total_laps: 2,
            ..GameConfig::default()
        });
        world.init_resource::<NextState<GameState>>();
        world
    }

    fn spawn_car_at(world: &mut World, position: Vec2) -> Entity {
        world
            .spawn((
                Car,
                profile(),
                Kinematics::new(90.0),
                Transform::from_xyz(position.x, position.y, 0.0),
                PreviousPosition(position),
                LapProgress::default(),
                RaceStats::default(),
            ))
            .id()
    }

    #[test]
    fn checkpoints_advance_in_order_only() {
        let mut world = race_world();
        let cp = world.resource::<Track>().checkpoints.clone();

        // parked on checkpoint 2, but checkpoint 0 is next: no progress
        let car = spawn_car_at(&mut world, cp[2]);
        world.run_system_once(update_laps).unwrap();
        let progress = world.get::<LapProgress>(car).unwrap();
        assert_eq!(progress.next_checkpoint, 0);
        assert_eq!(progress.total_passed, 0);
    }

    #[test]
    fn opening_start_line_crossing_does_not_count_a_lap() {
        let mut world = race_world();
        let cp = world.resource::<Track>().checkpoints.clone();
        let car = spawn_car_at(&mut world, cp[0]);

        world.run_system_once(update_laps).unwrap();
        let progress = world.get::<LapProgress>(car).unwrap();
        assert!(progress.crossed_start);
        assert_eq!(progress.next_checkpoint, 1);
        assert_eq!(world.get::<RaceStats>(car).unwrap().lap, 0);
    }

    #[test]
    fn full_circuit_completes_a_lap_and_settles_score() {
        let mut world = race_world();
        let cp = world.resource::<Track>().checkpoints.clone();
        let car = spawn_car_at(&mut world, cp[0]);
        world.get_mut::<RaceStats>(car).unwrap().penalties = 3;

        // two full laps around the circuit
        for _ in 0..2 {
            for target in [0usize, 1, 2, 3] {
                let mut transform = world.get_mut::<Transform>(car).unwrap();
                transform.translation.x = cp[target].x;
                transform.translation.y = cp[target].y;
                world.run_system_once(update_laps).unwrap();
            }
        }
        // back over the line to complete lap 2
        let mut transform = world.get_mut::<Transform>(car).unwrap();
        transform.translation.x = cp[0].x;
        transform.translation.y = cp[0].y;
        world.run_system_once(update_laps).unwrap();

        let stats = world.get::<RaceStats>(car).unwrap();
        assert_eq!(stats.lap, 2);
        assert!(world.get::<LapProgress>(car).unwrap().finished);
        assert_eq!(stats.score, 2 * LAP_SCORE - 3 * PENALTY_SCORE);
    }

    #[test]
    fn race_end_settles_every_cars_score() {
        let mut world = race_world();
        world.insert_resource(GameConfig {
            total_laps: 1,
            ..GameConfig::default()
        });
        let cp = world.resource::<Track>().checkpoints.clone();

        let winner = spawn_car_at(&mut world, cp[0]);
        let loser = spawn_car_at(&mut world, Vec2::new(999.0, 999.0));
        {
            let mut stats = world.get_mut::<RaceStats>(loser).unwrap();
            stats.lap = 0;
            stats.penalties = 2;
        }

        // the winner completes its single lap while the loser sits still
        for target in [0usize, 1, 2, 3, 0] {
            let mut transform = world.get_mut::<Transform>(winner).unwrap();
            transform.translation.x = cp[target].x;
            transform.translation.y = cp[target].y;
            world.run_system_once(update_laps).unwrap();
        }

        assert!(world.get::<LapProgress>(winner).unwrap().finished);
        assert_eq!(
            world.get::<RaceStats>(winner).unwrap().score,
            LAP_SCORE
        );
        // the car that never finished still settles from its own stats
        let loser_stats = world.get::<RaceStats>(loser).unwrap();
        assert!(!world.get::<LapProgress>(loser).unwrap().finished);
        assert_eq!(loser_stats.score, -2 * PENALTY_SCORE);
    }

    #[test]
    fn places_order_by_progress() {
        let mut world = race_world();
        let cp = world.resource::<Track>().checkpoints.clone();

        let leader = spawn_car_at(&mut world, cp[1]);
        world.get_mut::<LapProgress>(leader).unwrap().total_passed = 3;
        let chaser = spawn_car_at(&mut world, cp[0]);
        world.get_mut::<LapProgress>(chaser).unwrap().total_passed = 1;

        world.run_system_once(update_places).unwrap();
        assert_eq!(world.get::<RaceStats>(leader).unwrap().place, 1);
        assert_eq!(world.get::<RaceStats>(chaser).unwrap().place, 2);
    }

    #[test]
    fn reset_returns_car_to_its_last_checkpoint() {
        let mut world = race_world();
        world.init_resource::<Events<CarReset>>();
        let cp = world.resource::<Track>().checkpoints.clone();

        let car = spawn_car_at(&mut world, Vec2::new(999.0, 999.0));
        {
            let mut progress = world.get_mut::<LapProgress>(car).unwrap();
            progress.last_checkpoint = 1;
            progress.next_checkpoint = 2;
        }
        world.send_event(CarReset { car });
        world.run_system_once(handle_car_resets).unwrap();

        let transform = world.get::<Transform>(car).unwrap();
        assert_eq!(transform.translation.truncate(), cp[1]);
        // checkpoint 2 is south of checkpoint 1, so the car faces down
        let kin = world.get::<Kinematics>(car).unwrap();
        assert_eq!(kin.current.rotation, 180.0);
        // speed handling happened in the integrator; heading is all the
        // reset touches beyond position
        assert_eq!(kin.current, KinematicState { speed: 0.0, rotation: 180.0, off_track: 0 });
    }
}
