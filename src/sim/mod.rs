pub mod draw;
pub mod event;
pub mod flow;
pub mod step;
pub mod world;
