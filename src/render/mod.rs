pub mod color;
pub mod svg;
pub mod treemap;

pub use color::*;
pub use svg::*;
pub use treemap::*;
