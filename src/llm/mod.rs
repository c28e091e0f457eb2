pub mod classifier;
pub mod client;
pub mod labels;
pub mod prompts;
pub mod retry;
pub mod scripted;
pub mod validation;

pub use classifier::*;
pub use client::*;
pub use labels::*;
pub use prompts::*;
pub use retry::*;
pub use scripted::*;
pub use validation::*;
