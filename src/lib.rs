// Skywatch - cloud telemetry polling console
// Library crate: polling engine, collaborator traits, renderers

pub mod cli;
pub mod cloud;
pub mod config;
pub mod history;
pub mod metrics;
pub mod observability;
pub mod poller;
pub mod render;
pub mod session;
pub mod signals;
