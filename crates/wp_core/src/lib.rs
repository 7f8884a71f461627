pub mod draw;
pub mod input;
pub mod mailbox;
pub mod pose;
pub mod time;
pub mod video;
