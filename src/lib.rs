pub mod cli;
pub mod config;
pub mod error;
pub mod parse;
pub mod replicate;
pub mod site;
pub mod tool;
pub mod util;

pub use error::ReplicateError;
