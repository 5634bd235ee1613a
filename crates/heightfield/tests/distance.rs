// Integration tests for the distance transform against brute force, and for
// the mask helpers feeding it.

use geo::Coord;
use heightfield::{distance_field, rasterize_polygon, Georef, Mask};

fn brute_force(mask: &Mask, cell_size: f64) -> Vec<f64> {
    let sites: Vec<(usize, usize)> = mask.indexed_iter().filter(|&(_, &m)| m).map(|(ix, _)| ix).collect();
    mask.indexed_iter()
        .map(|((r, c), _)| {
            sites.iter()
                .map(|&(sr, sc)| {
                    let (dr, dc) = (r as f64 - sr as f64, c as f64 - sc as f64);
                    (dr * dr + dc * dc).sqrt() * cell_size
                })
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

#[test]
fn matches_brute_force_on_scattered_sites() {
    let mut mask = Mask::from_elem((17, 23), false);
    for ((r, c), m) in mask.indexed_iter_mut() {
        *m = (r * 7 + c * 13) % 29 == 0;
    }
    let field = distance_field(&mask, 0.5);
    let expected = brute_force(&mask, 0.5);
    for (got, want) in field.iter().zip(expected.iter()) {
        assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
    }
}

#[test]
fn matches_brute_force_on_rasterized_strip() {
    let georef = Georef { origin: Coord { x: 0.0, y: 0.0 }, cell_size: 1.0 };
    let mut mask = Mask::from_elem((20, 20), false);
    rasterize_polygon(&mut mask, georef, &[
        Coord { x: 2.0, y: 3.0 },
        Coord { x: 18.0, y: 11.0 },
        Coord { x: 16.0, y: 15.0 },
        Coord { x: 0.0, y: 7.0 },
    ]);
    assert!(mask.iter().any(|&m| m));

    let field = distance_field(&mask, 1.0);
    let expected = brute_force(&mask, 1.0);
    for (got, want) in field.iter().zip(expected.iter()) {
        assert!((got - want).abs() < 1e-9);
    }
}

#[test]
fn straight_band_distance_grows_linearly() {
    let mut mask = Mask::from_elem((12, 6), false);
    for c in 0..6 { mask[(5, c)] = true }
    let field = distance_field(&mask, 2.0);
    for r in 0..12 {
        let expected = (r as f64 - 5.0).abs() * 2.0;
        for c in 0..6 { assert_eq!(field[(r, c)], expected) }
    }
}
