//! Random geometry helpers over a caller-supplied RNG.

use glam::Vec2;
use rand::Rng;

/// Uniformly distributed direction on the unit circle.
pub fn random_unit_vector(rng: &mut impl Rng) -> Vec2 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    Vec2::from_angle(angle)
}

/// Uniformly distributed point inside a disc of the given radius.
pub fn random_in_disc(rng: &mut impl Rng, radius: f32) -> Vec2 {
    // sqrt keeps the density uniform over the area
    let r = radius * rng.gen::<f32>().sqrt();
    random_unit_vector(rng) * r
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn unit_vectors_have_unit_length() {
        let mut rng = Pcg64::seed_from_u64(7);
        for _ in 0..256 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn disc_points_stay_inside() {
        let mut rng = Pcg64::seed_from_u64(7);
        for _ in 0..256 {
            assert!(random_in_disc(&mut rng, 0.5).length() <= 0.5 + 1e-6);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Pcg64::seed_from_u64(99);
        let mut b = Pcg64::seed_from_u64(99);
        for _ in 0..16 {
            assert_eq!(random_unit_vector(&mut a), random_unit_vector(&mut b));
        }
    }
}
