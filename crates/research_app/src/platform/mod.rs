mod app;
mod config;
mod effects;
mod input;
pub(crate) mod logging;
mod render;

pub(crate) use app::run_app;
