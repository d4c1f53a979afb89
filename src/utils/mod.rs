pub mod disk;
pub mod time;
