//! Command handlers
//!
//! Each handler receives a [`HandlerContext`] holding the resolved
//! configuration and the output formatter.

mod common;
mod config;
#[cfg(feature = "postgres")]
mod migrate;
#[cfg(feature = "api")]
mod serve;

pub use common::HandlerContext;
pub use config::handle_config_show;
#[cfg(feature = "postgres")]
pub use migrate::handle_migrate;
#[cfg(feature = "api")]
pub use serve::{ServeOptions, handle_serve};
