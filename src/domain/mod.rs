pub mod entity;
pub mod rules;
pub mod schedule;
pub mod tile;
