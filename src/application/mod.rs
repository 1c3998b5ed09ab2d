pub mod ai_advisor;
pub mod bootstrap;
pub mod commands;
pub mod timer_driver;
