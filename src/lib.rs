// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod assemble;
pub mod config;
pub mod convert;
pub mod dump;
pub mod escape;
pub mod pipeline;
pub mod progress;
pub mod writer;
