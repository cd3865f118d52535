// Physics/input run on a fixed timestep
pub const SIM_HZ: f64 = 60.0;

// Rendering constants
pub const TILE_SIZE: u32 = 128;

// Mask pixels with alpha at or above this count as solid
pub const MASK_ALPHA_THRESHOLD: f32 = 0.5;

// Collision damping factors. Hitting another car is a crash, scraping
// static geometry is off-road drag.
pub const CAR_HIT_DAMPING: f32 = 0.2;
pub const OBSTACLE_HIT_DAMPING: f32 = 0.9;
