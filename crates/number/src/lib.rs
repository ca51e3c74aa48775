#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod power_of_two;
mod size_class;

pub use power_of_two::*;
pub use size_class::*;
