use crate::game_logic::{MaskSource, Obstacle, TILE_SIZE};
use bevy::prelude::*;
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;

// object id -> sprite, indexed by the track file's object layer values
const OBJECT_SPRITES: [&str; 4] = [
    "objects/barrel.png",
    "objects/cone.png",
    "objects/tires.png",
    "objects/rock.png",
];

/// Raw track file: flat tile layers in row-major order, -1 = empty, plus
/// the ordered checkpoint tiles (checkpoint 0 is the start/finish line).
#[derive(Deserialize)]
struct TrackFile {
    name: String,
    width: u32,
    height: u32,
    ground: Vec<i16>,
    road: Vec<i16>,
    objects: Vec<i16>,
    checkpoints: Vec<[u32; 2]>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilePlacement {
    pub tile_id: u8,
    pub x: u32,
    pub y: u32,
}

/// The loaded track. Ground and road are visual layers only; objects
/// become collidable obstacle bodies. The drivable road surface is never
/// part of the collision pass.
#[derive(Resource, Clone, Debug)]
pub struct Track {
    pub name: String,
    /// pixel dimensions
    pub width: f32,
    pub height: f32,
    pub ground: Vec<TilePlacement>,
    pub road: Vec<TilePlacement>,
    pub objects: Vec<TilePlacement>,
    /// world-space checkpoint centers, in racing order
    pub checkpoints: Vec<Vec2>,
}

impl Track {
    pub fn from_json(json: &str) -> Result<Track, TrackError> {
        let file: TrackFile = serde_json::from_str(json)?;
        let expected = (file.width * file.height) as usize;
        for (layer, data) in [
            ("ground", &file.ground),
            ("road", &file.road),
            ("objects", &file.objects),
        ] {
            if data.len() != expected {
                return Err(TrackError::LayerSize {
                    layer,
                    expected,
                    actual: data.len(),
                });
            }
        }
        if file.checkpoints.len() < 2 {
            return Err(TrackError::TooFewCheckpoints(file.checkpoints.len()));
        }

        let width = (file.width * TILE_SIZE) as f32;
        let height = (file.height * TILE_SIZE) as f32;

        let placements = |layer: &[i16]| -> Vec<TilePlacement> {
            layer
                .iter()
                .enumerate()
                .filter(|(_, id)| **id >= 0)
                .map(|(index, id)| TilePlacement {
                    tile_id: *id as u8,
                    x: index as u32 % file.width,
                    y: index as u32 / file.width,
                })
                .collect()
        };

        let track = Track {
            name: file.name,
            width,
            height,
            ground: placements(&file.ground),
            road: placements(&file.road),
            objects: placements(&file.objects),
            checkpoints: Vec::new(),
        };
        let checkpoints = file
            .checkpoints
            .iter()
            .map(|[x, y]| track.tile_to_world(*x, *y))
            .collect();
        Ok(Track { checkpoints, ..track })
    }

    /// Center of a tile in world coordinates (origin at the track center,
    /// y up).
    pub fn tile_to_world(&self, tile_x: u32, tile_y: u32) -> Vec2 {
        let tile = TILE_SIZE as f32;
        Vec2::new(
            tile_x as f32 * tile + tile / 2.0 - self.width / 2.0,
            self.height / 2.0 - tile_y as f32 * tile - tile / 2.0,
        )
    }

    /// Heading (degrees, clockwise from up) of the start straight, read
    /// off the first two checkpoints.
    pub fn start_heading(&self) -> f32 {
        cardinal_heading(self.checkpoints[0], self.checkpoints[1])
    }

    /// Grid positions behind the start line: cars in staggered pairs,
    /// facing the first checkpoint. Returns (world position, heading).
    pub fn start_positions(&self, count: usize, vehicle_scale: f32) -> Vec<(Vec2, f32)> {
        let start = self.checkpoints[0];
        let heading = self.start_heading();
        let rad = heading.to_radians();
        let forward = Vec2::new(rad.sin(), rad.cos());
        let side = Vec2::new(forward.y, -forward.x);

        (0..count)
            .map(|i| {
                let lane = if i % 2 == 0 { -1.0 } else { 1.0 };
                let row = (i / 2) as f32;
                let position =
                    start - forward * (40.0 + row * 140.0 * vehicle_scale) + side * lane * 25.0;
                (position, heading)
            })
            .collect()
    }
}

/// Dominant-axis direction from `a` to `b`, quantized to the four
/// cardinal headings.
pub fn cardinal_heading(a: Vec2, b: Vec2) -> f32 {
    let d = b - a;
    if d.x.abs() >= d.y.abs() {
        if d.x >= 0.0 { 90.0 } else { 270.0 }
    } else if d.y >= 0.0 {
        0.0
    } else {
        180.0
    }
}

pub fn load_track_from_file(path: &str) -> Result<Track, TrackError> {
    let text = fs::read_to_string(path)?;
    Track::from_json(&text)
}

#[derive(Debug)]
pub enum TrackError {
    Io(std::io::Error),
    Json(serde_json::Error),
    LayerSize {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },
    TooFewCheckpoints(usize),
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackError::Io(e) => write!(f, "failed to read track file: {e}"),
            TrackError::Json(e) => write!(f, "failed to parse track file: {e}"),
            TrackError::LayerSize {
                layer,
                expected,
                actual,
            } => write!(
                f,
                "track layer '{layer}' has {actual} tiles, expected {expected}"
            ),
            TrackError::TooFewCheckpoints(n) => {
                write!(f, "track needs at least 2 checkpoints, found {n}")
            }
        }
    }
}

impl Error for TrackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrackError::Io(e) => Some(e),
            TrackError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TrackError {
    fn from(e: std::io::Error) -> Self {
        TrackError::Io(e)
    }
}

impl From<serde_json::Error> for TrackError {
    fn from(e: serde_json::Error) -> Self {
        TrackError::Json(e)
    }
}

/// Marker for everything spawned for the current race, so leaving the
/// Playing state can tear it all down.
#[derive(Component)]
pub struct RaceEntity;

/*
    spawn the track: ground and road tiles from the tile atlas, objects as
    collidable obstacle bodies with their own collision masks
*/
pub fn spawn_track(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut atlases: ResMut<Assets<TextureAtlasLayout>>,
    track: Res<Track>,
) {
    let tile_texture = asset_server.load("tiles.png");
    let layout = TextureAtlasLayout::from_grid(UVec2::splat(TILE_SIZE), 8, 8, None, None);
    let layout_handle = atlases.add(layout);

    for (layer, z) in [(&track.ground, 0.0), (&track.road, 1.0)] {
        for placement in layer {
            let position = track.tile_to_world(placement.x, placement.y);
            commands.spawn((
                Sprite::from_atlas_image(
                    tile_texture.clone(),
                    TextureAtlas {
                        layout: layout_handle.clone(),
                        index: placement.tile_id as usize,
                    },
                ),
                Transform::from_xyz(position.x, position.y, z),
                RaceEntity,
            ));
        }
    }

    for placement in &track.objects {
        let sprite_path = OBJECT_SPRITES
            .get(placement.tile_id as usize)
            .copied()
            .unwrap_or_else(|| {
                warn!("unknown object id {} in track, using barrel", placement.tile_id);
                OBJECT_SPRITES[0]
            });
        let image = asset_server.load(sprite_path);
        let position = track.tile_to_world(placement.x, placement.y);
        commands.spawn((
            Obstacle,
            Sprite::from_image(image.clone()),
            Transform::from_xyz(position.x, position.y, 5.0),
            MaskSource { image, scale: 1.0 },
            RaceEntity,
        ));
    }
}
