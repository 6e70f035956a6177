pub mod app;
mod commands;
mod config;
mod context;
mod dispatch;
mod env;
mod locate;
mod output;
mod replay;
mod runtime;
mod snapshot;
