pub mod ai;
pub mod app;
pub mod config;
pub mod error;
pub mod ingredients;
pub mod recipes;
pub mod state;
pub mod users;
