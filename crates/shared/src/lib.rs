//! Wire and domain types shared between the controller library and its front ends.

pub mod domain;
pub mod error;
pub mod protocol;
