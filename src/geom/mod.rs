mod geom;
mod vector;

pub(crate) use geom::SpatialIndex;
pub(crate) use vector::*;
