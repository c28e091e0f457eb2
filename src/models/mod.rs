pub mod chunk;
pub mod topic;
pub mod transcript;

pub use chunk::*;
pub use topic::*;
pub use transcript::*;
