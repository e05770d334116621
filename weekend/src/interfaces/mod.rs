pub mod playback_interface;
pub mod season_interface;
pub mod simulator_interface;
pub mod tire_interface;
