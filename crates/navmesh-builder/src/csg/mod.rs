//! Constructive solid geometry on 2D polygons with holes.

mod boolean;
mod polygon;

pub use boolean::{
    apply_operation, intersection, subtract, try_subtract, union, union_polygons, CsgOperation, CsgOptions,
    CsgOutcome, DEFAULT_CSG_MAX_WALK_STEPS, DEFAULT_CSG_TOLERANCE,
};
pub use polygon::CsgPolygon;
