//! Terrain blender: carve the harmonized road surface into the raster and
//! fade it back into the original terrain across a shoulder.

mod falloff;
mod index;
mod mask;

use std::f64::consts::SQRT_2;

use heightfield::{distance_field, Heightfield};
use ndarray::Zip;
use tracing::{debug, info};

use crate::config::BlendConfig;
use crate::network::{Harmonized, RoadNetwork};

pub use falloff::{cosine, quintic, Falloff};

use index::SectionIndex;
use mask::{core_mask, protection_mask};

/// Blend `network` into a copy of `terrain`.
///
/// Cells within a road's half-width take the road surface, cells beyond
/// `half_width + blend_range` keep their height, and the shoulder between is
/// mixed by `config.falloff`. Cells covered by an excluded corridor are never
/// touched.
pub fn blend_terrain(network: &RoadNetwork<Harmonized>, terrain: &Heightfield, config: &BlendConfig) -> Heightfield {
    let index = SectionIndex::new(network);
    if index.is_empty() || terrain.is_empty() {
        debug!("no road surface to blend");
        return terrain.clone()
    }

    let georef = terrain.georef();
    let cell = terrain.cell_size();
    let core = core_mask(network, georef, terrain.dim());
    let distance = distance_field(&core, cell);
    let protect = protection_mask(network, georef, terrain.dim(), config.protect_buffer);

    let cutoff = config.blend_range + cell * SQRT_2;
    let mut out = terrain.data().clone();
    Zip::indexed(&mut out)
        .and(&distance)
        .and(&protect)
        .par_for_each(|(row, col), height, &d, &protected| {
            if protected || d > cutoff { return }
            let Some(hit) = index.project(georef.cell_center(row, col), config.blend_range) else { return };
            if !hit.surface.is_finite() { return }

            if hit.distance <= hit.half_width {
                *height = hit.surface;
            } else if hit.distance < hit.half_width + config.blend_range {
                let blend = config.falloff.apply((hit.distance - hit.half_width) / config.blend_range);
                *height = hit.surface * (1.0 - blend) + *height * blend;
            }
        });

    let changed = out.iter().zip(terrain.data().iter()).filter(|(a, b)| a.to_bits() != b.to_bits()).count();
    info!(
        cells = changed,
        core = core.iter().filter(|&&c| c).count(),
        protected = protect.iter().filter(|&&p| p).count(),
        "blended road surface into terrain"
    );
    terrain.with_data(out)
}
