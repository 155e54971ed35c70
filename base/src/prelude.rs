//! The prelude exports the types which are useful in representing
//! PDP-8 words, addresses and instructions.  Providing this prelude
//! is the main purpose of the base crate.
pub use super::error::*;
pub use super::instruction::*;
pub use super::subword::{join_halves, left_half, right_half, split_halves};
pub use super::types::*;
pub use super::unsigned::*;
pub use super::{u12, u3, u6};
