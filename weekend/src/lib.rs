pub mod core;
pub mod errors;
pub mod interfaces;
pub mod post;
pub mod pre;
