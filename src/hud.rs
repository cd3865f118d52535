use crate::camera::{WIN_H, WIN_W};
use crate::game_logic::{Car, CarName, Kinematics, RaceEntity, RaceStats};
use bevy::prelude::*;
use bevy::sprite::Anchor;

#[derive(Component)]
pub struct HudReadout {
    pub car: Entity,
    pub slot: usize,
}

pub fn setup_hud(mut commands: Commands, cars: Query<Entity, With<Car>>) {
    for (slot, car) in cars.iter().enumerate() {
        commands.spawn((
            HudReadout { car, slot },
            Text2d::new(""),
            TextFont {
                font_size: 18.0,
                ..default()
            },
            TextColor(Color::WHITE),
            Anchor::TopLeft,
            Transform::from_xyz(0.0, 0.0, 200.0),
            RaceEntity,
        ));
    }
}

// Pull-based readout of each car's race state; this never mutates the
// simulation
pub fn update_hud(
    cars: Query<(&CarName, &Kinematics, &RaceStats), With<Car>>,
    camera: Single<&Transform, (With<Camera>, Without<HudReadout>)>,
    mut readouts: Query<(&HudReadout, &mut Text2d, &mut Transform), Without<Camera>>,
) {
    for (readout, mut text, mut transform) in readouts.iter_mut() {
        let Ok((name, kinematics, stats)) = cars.get(readout.car) else {
            continue;
        };

        text.0 = format!(
            "{}  P{}  lap {}  penalties {}  {:.0} px/s",
            name.0, stats.place, stats.lap, stats.penalties, kinematics.current.speed
        );

        // pin to the top-left of the view, one row per player
        transform.translation.x = camera.translation.x - WIN_W / 2.0 + 16.0;
        transform.translation.y =
            camera.translation.y + WIN_H / 2.0 - 16.0 - readout.slot as f32 * 24.0;
    }
}
