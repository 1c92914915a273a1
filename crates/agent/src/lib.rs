//! The reasoning loop that drives tether conversations.

pub mod react;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use react::{ReactAgent, ReactResult};
