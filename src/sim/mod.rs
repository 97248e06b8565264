pub mod event;
pub mod generate;
pub mod step;
pub mod window;
pub mod world;
