mod junction;
mod network;
mod path;
mod section;

pub use junction::{Contribution, Contributions, Junction, JunctionKind};
pub use network::{Detected, Harmonized, RoadNetwork, Sampled, SectionSpec, Smoothed};
pub use path::RoadPath;
pub use section::{CrossSection, EdgeElevations, PathId, SectionId};
