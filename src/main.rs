mod camera;
mod car;
mod game_logic;
mod hud;
mod title_screen;

use bevy::render::camera::{Projection, ScalingMode};
use bevy::{prelude::*, window::PresentMode};

use camera::{move_camera, reset_camera, WIN_H, WIN_W};
use car::{follow_name_labels, spawn_cars};
use game_logic::{
    attach_masks, detect_collisions, handle_car_resets, integrate_motion, load_game_config,
    load_profile_table, load_track_from_file, player_controls, spawn_checkpoints, spawn_track,
    sync_car_rotation, update_laps, update_places, CarDriving, CarReset, CollisionFrame,
    GameConfig, SIM_HZ,
};
use hud::{setup_hud, update_hud};
use title_screen::{
    check_for_title_input, check_for_victory_input, quit_on_escape, setup_title_screen,
    setup_victory_screen,
};

#[derive(States, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    #[default]
    Title,
    Playing,
    Victory,
}

fn main() {
    let config = load_game_config("assets/config.json").unwrap_or_else(|err| {
        eprintln!("config not loaded ({err}), using defaults");
        GameConfig::default()
    });
    let profiles = load_profile_table("assets/profiles.json").expect("invalid car profile table");

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(ImagePlugin::default_nearest())
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Retro Rally".into(),
                        resolution: (WIN_W, WIN_H).into(),
                        present_mode: PresentMode::AutoVsync,
                        resizable: false,
                        ..default()
                    }),
                    ..default()
                }),
        )
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(config)
        .insert_resource(profiles)
        .init_resource::<CollisionFrame>()
        .insert_resource(Time::<Fixed>::from_hz(SIM_HZ))
        .init_state::<GameState>()
        .add_event::<CarDriving>()
        .add_event::<CarReset>()
        .add_systems(Startup, camera_setup)
        .add_systems(OnEnter(GameState::Title), (reset_camera, setup_title_screen))
        .add_systems(OnEnter(GameState::Playing), load_track)
        .add_systems(
            OnEnter(GameState::Playing),
            (spawn_track, spawn_checkpoints, spawn_cars, setup_hud.after(spawn_cars))
                .after(load_track),
        )
        .add_systems(OnEnter(GameState::Victory), (reset_camera, setup_victory_screen))
        .add_systems(
            // detection finishes for every car before any car integrates,
            // and resets are handled after all integration is committed
            FixedUpdate,
            (
                player_controls,
                detect_collisions,
                integrate_motion,
                handle_car_resets,
            )
                .chain()
                .run_if(in_state(GameState::Playing)),
        )
        .add_systems(
            Update,
            (
                attach_masks,
                sync_car_rotation,
                follow_name_labels,
                update_laps,
                update_places,
                update_hud,
                move_camera,
            )
                .run_if(in_state(GameState::Playing)),
        )
        .add_systems(
            Update,
            (
                check_for_title_input.run_if(in_state(GameState::Title)),
                check_for_victory_input.run_if(in_state(GameState::Victory)),
                quit_on_escape,
            ),
        )
        .run();
}

fn camera_setup(mut commands: Commands) {
    let mut projection = OrthographicProjection::default_2d();
    projection.scaling_mode = ScalingMode::WindowSize;
    projection.scale = 1.0;

    commands
        .spawn(Camera2d::default())
        .insert(Projection::Orthographic(projection));
}

fn load_track(mut commands: Commands, config: Res<GameConfig>) {
    let track = load_track_from_file(&config.track).expect("failed to load track file");
    info!("loaded track '{}'", track.name);
    commands.insert_resource(track);
}
