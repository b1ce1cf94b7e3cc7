pub mod advisor;
pub mod arbiter;
pub mod flight;
pub mod frame_rate;
pub mod overlay;
