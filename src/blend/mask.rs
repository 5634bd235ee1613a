use heightfield::{rasterize_capsule, rasterize_polygon, Georef, Mask};

use crate::network::{CrossSection, Harmonized, RoadNetwork};

/// Cross-sections that take part in the road surface.
#[inline]
pub(crate) fn on_surface(s: &CrossSection) -> bool {
    !s.excluded() && s.elevation().is_finite()
}

/// Road core: one quadrilateral per pair of consecutive surface
/// cross-sections, plus a disc at every interior joint to close the outside
/// of bends.
pub(crate) fn core_mask(network: &RoadNetwork<Harmonized>, georef: Georef, shape: (usize, usize)) -> Mask {
    let mut mask = Mask::from_elem(shape, false);
    for path in network.paths() {
        let sections = network.path_sections(path.id()).map(|(_, s)| s).collect::<Vec<_>>();
        for w in sections.windows(2) {
            let (a, b) = (w[0], w[1]);
            if !on_surface(a) || !on_surface(b) { continue }
            let quad = [
                a.position() + a.normal() * a.half_width(),
                b.position() + b.normal() * b.half_width(),
                b.position() - b.normal() * b.half_width(),
                a.position() - a.normal() * a.half_width(),
            ];
            rasterize_polygon(&mut mask, georef, &quad);
        }
        for w in sections.windows(3) {
            let s = w[1];
            if on_surface(w[0]) && on_surface(s) && on_surface(w[2]) {
                rasterize_capsule(&mut mask, georef, s.position(), s.position(), s.half_width());
            }
        }
    }
    mask
}

/// Cells that must keep their original height: a corridor of radius
/// `half_width + buffer` along every maximal run of excluded cross-sections.
pub(crate) fn protection_mask(network: &RoadNetwork<Harmonized>, georef: Georef, shape: (usize, usize), buffer: f64) -> Mask {
    let mut mask = Mask::from_elem(shape, false);
    for path in network.paths() {
        let sections = network.path_sections(path.id()).map(|(_, s)| s).collect::<Vec<_>>();
        for run in sections.split(|s| !s.excluded()).filter(|run| !run.is_empty()) {
            if let [only] = run {
                rasterize_capsule(&mut mask, georef, only.position(), only.position(), only.half_width() + buffer);
                continue;
            }
            for w in run.windows(2) {
                let radius = w[0].half_width().max(w[1].half_width()) + buffer;
                rasterize_capsule(&mut mask, georef, w[0].position(), w[1].position(), radius);
            }
        }
    }
    mask
}
