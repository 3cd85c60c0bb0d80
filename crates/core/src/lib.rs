#![forbid(unsafe_code)]

pub mod error;
pub mod load;
pub mod model;
pub mod progress;
pub mod screen;
pub mod table;
pub mod time;

pub use error::Error;
pub use time::Clock;
