pub mod collision;
pub mod config;
pub mod constants;
pub mod laps;
pub mod math;
pub mod net;
pub mod protocol;
pub mod simulator;
pub mod sync;
pub mod track;
pub mod vehicle;
pub mod world;
