#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod builtins;
mod config;
mod display;
mod ids;
mod list;
mod random_term;
mod term_store;

pub mod global;
pub mod storage;

pub use builtins::*;
pub use config::*;
pub use display::*;
pub use ids::*;
pub use list::*;
pub use random_term::*;
pub use storage::RootIndex;
pub use storage::RootRange;
pub use term_store::*;
