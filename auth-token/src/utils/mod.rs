pub mod config;
pub mod consts;

pub use config::Config;
pub use consts::*;
