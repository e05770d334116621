pub mod handle_race;
pub mod playback;
pub mod session;
pub mod strategy;
pub mod timer;
pub mod tireset;
pub mod track;
