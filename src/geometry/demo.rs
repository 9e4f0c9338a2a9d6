//! Random sphere clouds for the viewer and for tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::instance::InstanceRecord;

/// Colors cycled through by group.
const PALETTE: [[f32; 3]; 8] = [
    [0.90, 0.35, 0.30],
    [0.35, 0.65, 0.90],
    [0.95, 0.80, 0.30],
    [0.45, 0.80, 0.45],
    [0.75, 0.50, 0.85],
    [0.95, 0.60, 0.25],
    [0.40, 0.80, 0.80],
    [0.85, 0.85, 0.85],
];

/// Group id of the octant containing `p` (bit 0: +x, bit 1: +y, bit 2: +z).
#[must_use]
pub fn octant(p: [f32; 3]) -> u32 {
    p.iter()
        .enumerate()
        .map(|(axis, &c)| u32::from(c >= 0.0) << axis)
        .sum()
}

/// `count` spheres scattered through a cube of half-width `extent`,
/// grouped and colored by octant. Indices run from 0 in order.
#[must_use]
pub fn random_spheres(count: u32, extent: f32, seed: u64) -> Vec<InstanceRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|index| {
            let location = [
                rng.random_range(-extent..=extent),
                rng.random_range(-extent..=extent),
                rng.random_range(-extent..=extent),
            ];
            let group = octant(location);
            InstanceRecord::new(
                location,
                rng.random_range(1.0..=1.8),
                PALETTE[group as usize % PALETTE.len()],
                index,
                group,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octants_cover_all_sign_combinations() {
        assert_eq!(octant([-1.0, -1.0, -1.0]), 0);
        assert_eq!(octant([1.0, -1.0, -1.0]), 1);
        assert_eq!(octant([-1.0, 1.0, -1.0]), 2);
        assert_eq!(octant([1.0, 1.0, 1.0]), 7);
    }

    #[test]
    fn spheres_are_grouped_by_octant_and_seeded() {
        let spheres = random_spheres(200, 20.0, 7);
        assert_eq!(spheres.len(), 200);
        for (i, s) in spheres.iter().enumerate() {
            assert_eq!(s.index, i as u32);
            assert_eq!(s.group, octant(s.location));
            assert!(s.location.iter().all(|c| c.abs() <= 20.0));
            assert!((1.0..=1.8).contains(&s.radius));
        }
        assert_eq!(spheres, random_spheres(200, 20.0, 7));
    }
}
