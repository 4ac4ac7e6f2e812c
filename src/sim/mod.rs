pub mod event;
pub mod level;
pub mod melody;
pub mod room;
pub mod rooms;
pub mod stage;
pub mod step;
pub mod world;
