pub mod collisions;
pub mod components;
pub mod config;
pub mod constants;
pub mod controller;
pub mod integrator;
pub mod kinematics;
pub mod lap_system;
pub mod map;
pub mod mask;
pub mod profile;

pub use collisions::*;
pub use components::*;
pub use config::*;
pub use constants::*;
pub use controller::*;
pub use integrator::*;
pub use kinematics::*;
pub use lap_system::*;
pub use map::*;
pub use mask::*;
pub use profile::*;
