mod analyzer;
mod config;
mod constants;
mod errors;
mod queue;
mod results;
mod scheduler;
mod unit;

pub use analyzer::*;
pub use config::*;
pub use errors::*;
pub use queue::*;
pub use results::*;
pub use scheduler::*;
pub use unit::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
