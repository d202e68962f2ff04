#![doc = include_str!("../README.md")]

mod digest;
mod distributor;
mod error;
mod source;

pub use crate::digest::*;
pub use crate::distributor::*;
pub use crate::error::*;
pub use crate::source::*;
