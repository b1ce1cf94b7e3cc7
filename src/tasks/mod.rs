pub mod control;
pub mod frame_loop;
pub mod periodic;
pub mod status_loop;
