#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod slot_table;

pub use slot_table::*;
