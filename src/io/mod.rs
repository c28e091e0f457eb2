pub mod cache;
pub mod input;
pub mod output;

pub use cache::*;
pub use input::*;
pub use output::*;
