//! Links between triangles of different navigation polygons

mod detection;
mod linker;

pub use detection::{EdgeLinkDetection, EdgeLinkResult};
pub use linker::EdgeLinker;
