// src/lib.rs
pub mod api_client;
pub mod app;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod event;
pub mod logging;
pub mod podcast;
pub mod presentation;
pub mod terminal_ui;
pub mod ui;
pub mod updater;

pub mod commands;
pub mod widgets;
