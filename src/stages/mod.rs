pub mod stage0_clean;
pub mod stage1_chunk;
pub mod stage2_classify;
pub mod stage3_aggregate;
pub mod stage4_render;

pub use stage0_clean::*;
pub use stage1_chunk::*;
pub use stage2_classify::*;
pub use stage3_aggregate::*;
pub use stage4_render::*;
