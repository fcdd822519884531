use crate::error::FieldError;
use crate::scene_params::FieldParams;
use rand::Rng;
use std::f32::consts::PI;

/// A generated point cloud, laid out the way the vertex stage consumes it:
/// `positions` holds `count` packed xyz triples and `scales` one value per
/// particle in [0, 1).
#[derive(Debug, Clone)]
pub struct ParticleField {
    pub positions: Vec<f32>,
    pub scales: Vec<f32>,
    pub params: FieldParams,
}

impl ParticleField {
    pub fn count(&self) -> u32 {
        self.scales.len() as u32
    }

    pub fn position(&self, index: usize) -> [f32; 3] {
        let i = index * 3;
        [
            self.positions[i],
            self.positions[i + 1],
            self.positions[i + 2],
        ]
    }
}

/// Samples every particle independently in polar coordinates around the
/// origin's vertical axis.
pub fn generate<R: Rng + ?Sized>(
    params: &FieldParams,
    rng: &mut R,
) -> Result<ParticleField, FieldError> {
    if params.count < 1 {
        return Err(FieldError::InvalidConfiguration {
            count: params.count,
        });
    }
    let count = params.count as usize;
    let mut positions = Vec::with_capacity(count * 3);
    let mut scales = Vec::with_capacity(count);
    let y_min = params.vertical.lower_bound(params.height);

    for _ in 0..count {
        let radial_fraction: f32 = rng.gen();
        let angle: f32 = rng.gen::<f32>() * 2.0 * PI;
        let vertical: f32 = y_min + rng.gen::<f32>() * params.height;
        let distance = radial_fraction * params.radius;

        positions.push(params.origin[0] + distance * angle.cos());
        positions.push(params.origin[1] + vertical);
        positions.push(params.origin[2] + distance * angle.sin());
        scales.push(rng.gen());
    }

    log::trace!("Generated {} particles", count);
    Ok(ParticleField {
        positions,
        scales,
        params: *params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_params::VerticalPolicy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params(count: u32, vertical: VerticalPolicy) -> FieldParams {
        FieldParams {
            count,
            point_size: 100.0,
            radius: 1.0,
            height: 2.0,
            speed_factor: 1.0,
            origin: [0.0, 0.0, 0.0],
            vertical,
        }
    }

    #[test]
    fn buffer_lengths() {
        let mut rng = StdRng::seed_from_u64(7);
        for count in [1, 2, 17, 1000] {
            let field = generate(&params(count, VerticalPolicy::Upward), &mut rng).unwrap();
            assert_eq!(field.positions.len(), 3 * count as usize);
            assert_eq!(field.scales.len(), count as usize);
            assert_eq!(field.count(), count);
        }
    }

    #[test]
    fn zero_count_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = generate(&params(0, VerticalPolicy::Centered), &mut rng).unwrap_err();
        assert_eq!(err, FieldError::InvalidConfiguration { count: 0 });
    }

    #[test]
    fn single_particle() {
        let mut rng = StdRng::seed_from_u64(1);
        let field = generate(&params(1, VerticalPolicy::Centered), &mut rng).unwrap();
        assert_eq!(field.positions.len(), 3);
        assert_eq!(field.scales.len(), 1);
    }

    #[test]
    fn scales_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(3);
        let field = generate(&params(5000, VerticalPolicy::Upward), &mut rng).unwrap();
        assert!(field.scales.iter().all(|s| (0.0..1.0).contains(s)));
    }

    #[test]
    fn centered_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let field = generate(&params(100, VerticalPolicy::Centered), &mut rng).unwrap();
        for i in 0..100 {
            let [x, y, z] = field.position(i);
            assert!(x * x + z * z <= 1.0 + 1e-5);
            assert!((-1.0..1.0).contains(&y), "y = {}", y);
        }
    }

    #[test]
    fn upward_bounds() {
        let mut rng = StdRng::seed_from_u64(12);
        let field = generate(&params(100, VerticalPolicy::Upward), &mut rng).unwrap();
        for i in 0..100 {
            let [x, y, z] = field.position(i);
            assert!(x * x + z * z <= 1.0 + 1e-5);
            assert!((0.0..2.0).contains(&y), "y = {}", y);
        }
    }

    #[test]
    fn offset_origin() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut p = params(500, VerticalPolicy::Upward);
        p.origin = [3.0, -1.0, 2.0];
        p.radius = 0.5;
        let field = generate(&p, &mut rng).unwrap();
        for i in 0..500 {
            let [x, y, z] = field.position(i);
            let (dx, dz) = (x - 3.0, z - 2.0);
            assert!(dx * dx + dz * dz <= 0.25 + 1e-5);
            assert!(y >= -1.0 && y < 1.0);
        }
    }

    #[test]
    fn degenerate_shape() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut p = params(10, VerticalPolicy::Centered);
        p.radius = 0.0;
        p.height = 0.0;
        p.origin = [1.0, 2.0, 3.0];
        let field = generate(&p, &mut rng).unwrap();
        for i in 0..10 {
            assert_eq!(field.position(i), [1.0, 2.0, 3.0]);
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let p = params(64, VerticalPolicy::Centered);
        let a = generate(&p, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = generate(&p, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.scales, b.scales);
    }
}
