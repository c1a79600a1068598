pub mod clip;
pub mod input;
pub mod pose;
pub mod time;
