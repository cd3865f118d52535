use crate::game_logic::{CarName, RaceEntity, RaceStats};
use crate::GameState;
use bevy::prelude::*;

#[derive(Component)]
pub struct TitleScreenEntity;

#[derive(Component)]
pub struct VictoryScreenEntity;

pub fn setup_title_screen(mut commands: Commands) {
    commands.spawn((
        TitleScreenEntity,
        Text2d::new("RETRO RALLY"),
        TextFont {
            font_size: 72.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(0., 120., 100.),
    ));

    commands.spawn((
        TitleScreenEntity,
        Text2d::new("Player 1: WASD    Player 2: arrows\n\npress Enter to race"),
        TextFont {
            font_size: 28.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(0., -60., 100.),
    ));
}

pub fn check_for_title_input(
    input: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<GameState>>,
    mut commands: Commands,
    screen: Query<Entity, With<TitleScreenEntity>>,
) {
    if input.just_pressed(KeyCode::Enter) {
        for entity in screen.iter() {
            commands.entity(entity).despawn();
        }
        next_state.set(GameState::Playing);
    }
}

pub fn quit_on_escape(input: Res<ButtonInput<KeyCode>>, mut exit: EventWriter<AppExit>) {
    if input.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
}

pub fn setup_victory_screen(
    mut commands: Commands,
    standings: Query<(&CarName, &RaceStats)>,
) {
    let mut lines: Vec<(&CarName, &RaceStats)> = standings.iter().collect();
    lines.sort_by_key(|(_, stats)| stats.place);

    let mut text = String::from("RACE OVER\n\n");
    for (name, stats) in lines {
        text.push_str(&format!(
            "P{}  {}  laps {}  penalties {}  score {}\n",
            stats.place, name.0, stats.lap, stats.penalties, stats.score
        ));
    }
    text.push_str("\npress Enter for the title screen");

    commands.spawn((
        VictoryScreenEntity,
        Text2d::new(text),
        TextFont {
            font_size: 32.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(0., 0., 200.),
    ));
}

pub fn check_for_victory_input(
    input: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<GameState>>,
    mut commands: Commands,
    screen: Query<Entity, With<VictoryScreenEntity>>,
    race_entities: Query<Entity, With<RaceEntity>>,
) {
    if input.just_pressed(KeyCode::Enter) {
        for entity in screen.iter().chain(race_entities.iter()) {
            commands.entity(entity).despawn();
        }
        next_state.set(GameState::Title);
    }
}
