pub mod app_commands;
pub mod dispatcher;
pub mod poll;
