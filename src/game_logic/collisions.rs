use crate::game_logic::{Car, GameConfig, Kinematics, MaskBody, Obstacle, PixelMask};
use bevy::prelude::*;
use std::collections::HashMap;

/// What a car ran into this frame. Tagged so the integrator can match on
/// the kind instead of inspecting types at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contact {
    Car(Entity),
    Obstacle(Entity),
}

/// Per-frame collision lists, car entity -> everything it overlaps.
/// Cleared and rebuilt by `detect_collisions` every tick; the integrator
/// reads it as a frame-stable snapshot.
#[derive(Resource, Default)]
pub struct CollisionFrame {
    contacts: HashMap<Entity, Vec<Contact>>,
}

impl CollisionFrame {
    pub fn of(&self, car: Entity) -> &[Contact] {
        self.contacts.get(&car).map_or(&[], |list| list.as_slice())
    }

    fn push(&mut self, car: Entity, contact: Contact) {
        if let Some(list) = self.contacts.get_mut(&car) {
            list.push(contact);
        }
    }
}

/// Pixel-exact overlap of two world-placed masks. Positions are the
/// screen-space (y-down) top-left corners of the masks; the relative
/// offset is rounded to whole pixels.
pub fn masks_overlap(a: &PixelMask, a_top_left: Vec2, b: &PixelMask, b_top_left: Vec2) -> bool {
    let offset = (b_top_left - a_top_left).round();
    a.overlap(b, IVec2::new(offset.x as i32, offset.y as i32))
}

// World (y-up, centered) to screen-space top-left of the rotated mask:
// nominal anchor plus the provider's recentering offset.
fn mask_top_left<'a>(
    transform: &Transform,
    rotation: f32,
    body: &'a mut MaskBody,
) -> (&'a PixelMask, Vec2) {
    let size = body.nominal_size();
    let anchor = Vec2::new(
        transform.translation.x - size.x / 2.0,
        -transform.translation.y - size.y / 2.0,
    );
    let (mask, offset) = body.mask_at(rotation);
    (mask, anchor + offset)
}

/// Build this frame's collision lists: every unordered car pair (when
/// enabled), then every car against every static obstacle. Runs to
/// completion before any car integrates, so no car ever observes a
/// partially updated frame. Cars whose mask has not been built yet are
/// skipped for the frame.
pub fn detect_collisions(
    config: Res<GameConfig>,
    mut frame: ResMut<CollisionFrame>,
    mut cars: Query<(Entity, &Transform, &Kinematics, &mut MaskBody), With<Car>>,
    mut obstacles: Query<(Entity, &Transform, &mut MaskBody), (With<Obstacle>, Without<Car>)>,
) {
    frame.contacts.clear();
    for (entity, _, _, _) in cars.iter() {
        frame.contacts.insert(entity, Vec::new());
    }

    if config.car_collision {
        let mut pairs = cars.iter_combinations_mut();
        while let Some([(ea, ta, ka, mut ma), (eb, tb, kb, mut mb)]) = pairs.fetch_next() {
            let (mask_a, tl_a) = mask_top_left(&ta, ka.current.rotation, &mut ma);
            let (mask_b, tl_b) = mask_top_left(&tb, kb.current.rotation, &mut mb);
            if masks_overlap(mask_a, tl_a, mask_b, tl_b) {
                frame.push(ea, Contact::Car(eb));
                frame.push(eb, Contact::Car(ea));
            }
        }
    }

    for (car_entity, car_transform, kinematics, mut car_body) in cars.iter_mut() {
        for (obstacle_entity, obstacle_transform, mut obstacle_body) in obstacles.iter_mut() {
            let (car_mask, car_tl) =
                mask_top_left(car_transform, kinematics.current.rotation, &mut car_body);
            let (obstacle_mask, obstacle_tl) =
                mask_top_left(obstacle_transform, 0.0, &mut obstacle_body);
            if masks_overlap(car_mask, car_tl, obstacle_mask, obstacle_tl) {
                frame.push(car_entity, Contact::Obstacle(obstacle_entity));
            }
        }
    }
}
