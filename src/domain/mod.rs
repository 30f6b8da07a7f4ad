pub mod ai;
pub mod collision;
pub mod entity;
pub mod tile;
