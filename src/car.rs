use crate::game_logic::{
    Car, CarControls, CarName, GameConfig, Kinematics, MaskSource, PlayerControlled,
    PreviousPosition, ProfileTable, RaceEntity, RaceStats, ThrottleIdle, Track,
};
use crate::game_logic::LapProgress;
use bevy::prelude::*;
use rand::Rng;

pub const NAME_LABEL_OFFSET: f32 = 48.0;

/// Floating name tag, kept above its car without inheriting the car's
/// rotation.
#[derive(Component)]
pub struct NameLabel {
    pub car: Entity,
}

// Car spawning: place both local players on the start grid facing the
// first checkpoint, bind their profiles and key bindings
pub fn spawn_cars(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Res<GameConfig>,
    profiles: Res<ProfileTable>,
    track: Res<Track>,
) {
    let controls = [CarControls::wasd(), CarControls::arrows()];
    let grid = track.start_positions(controls.len(), config.vehicle_scale);
    let mut rng = rand::rng();

    for (index, ((position, heading), controls)) in grid.into_iter().zip(controls).enumerate() {
        let profile = profiles.assign(index).clone();
        let livery = if profile.liveries.is_empty() {
            format!("cars/{}.png", profile.name)
        } else {
            profile.liveries[rng.random_range(0..profile.liveries.len())].clone()
        };
        let image = asset_server.load(livery);
        let name = format!("Player {}", index + 1);

        let car = commands
            .spawn((
                Car,
                PlayerControlled,
                CarName(name.clone()),
                profile,
                controls,
                Kinematics::new(heading),
                ThrottleIdle::default(),
                PreviousPosition(position),
                LapProgress::default(),
                RaceStats::default(),
                Sprite::from_image(image.clone()),
                Transform {
                    translation: Vec3::new(position.x, position.y, 50.0),
                    scale: Vec3::splat(config.vehicle_scale),
                    ..default()
                },
                MaskSource {
                    image,
                    scale: config.vehicle_scale,
                },
                RaceEntity,
            ))
            .id();

        commands.spawn((
            NameLabel { car },
            Text2d::new(name),
            TextFont {
                font_size: 14.0,
                ..default()
            },
            TextColor(Color::WHITE),
            Transform::from_xyz(position.x, position.y + NAME_LABEL_OFFSET, 60.0),
            RaceEntity,
        ));
    }
}

// Keep the name tags hovering over their cars
pub fn follow_name_labels(
    cars: Query<&Transform, (With<Car>, Without<NameLabel>)>,
    mut labels: Query<(&NameLabel, &mut Transform), Without<Car>>,
) {
    for (label, mut transform) in labels.iter_mut() {
        let Ok(car_transform) = cars.get(label.car) else {
            continue;
        };
        transform.translation.x = car_transform.translation.x;
        transform.translation.y = car_transform.translation.y + NAME_LABEL_OFFSET;
    }
}
