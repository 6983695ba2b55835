pub mod cancel;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod gate;
pub mod io;
pub mod lister;
pub mod outcome;
pub mod rate;
pub mod resolver;
pub mod session;
pub mod types;

pub use error::{PurgeError, Result};
