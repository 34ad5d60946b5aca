pub mod blank;
pub mod compose;
pub mod edges;
pub mod geometry;
pub mod normalize;
pub mod padding;
pub mod pipeline;
pub mod resize;
pub mod stats;
