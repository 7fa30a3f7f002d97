pub mod ai;
pub mod anim;
pub mod combat;
pub mod controls;
pub mod entity;
pub mod timer;
