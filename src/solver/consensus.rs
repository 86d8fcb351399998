use crate::algebra::*;
use crate::solver::partition::PartitionState;

/// Owner of the global consensus vector `[threshold; a]`.
///
/// Each z-update averages the shared block of `x + u` over all
/// partitions, then projects the weights onto the nonnegative orthant.
/// The threshold entry keeps its sign.
#[derive(Debug, Clone)]
pub(crate) struct ConsensusCoordinator<T> {
    gl: Vec<T>,
    acc: Vec<T>,
}

impl<T> ConsensusCoordinator<T>
where
    T: FloatT,
{
    pub fn new(p: usize) -> Self {
        Self {
            gl: vec![T::zero(); p + 1],
            acc: vec![T::zero(); p + 1],
        }
    }

    pub fn reset(&mut self) {
        self.gl.set(T::zero());
    }

    /// Current consensus value
    pub fn value(&self) -> &[T] {
        &self.gl
    }

    pub fn update(&mut self, partitions: &[PartitionState<T>]) -> &[T] {
        self.acc.set(T::zero());
        for part in partitions {
            part.accumulate_shared(&mut self.acc);
        }
        let npar: T = partitions.len().as_T();
        self.gl.scalarop_from(|v| v / npar, &self.acc);
        self.gl[1..].project_nonneg();
        &self.gl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::partition::PartitionBuilder;
    use crate::solver::{AdmmSettingsBuilder, ProblemData};

    #[test]
    fn test_consensus_average_and_projection() {
        let H = Matrix::from(&[[1., -2., 3., 0.5], [-3., 2., -1., 0.25]]);
        let data = ProblemData::new(&H, 0.5).unwrap();
        let settings = AdmmSettingsBuilder::default().npar(2).build().unwrap();
        let mut parts = PartitionBuilder::new(&data, &settings).build().unwrap();

        let shared = [[-1.0, 2.0, -4.0], [3.0, -6.0, 1.0]];
        for (part, vals) in parts.iter_mut().zip(shared.iter()) {
            let off = part.shared_offset();
            part.x[off..].copy_from_slice(vals);
            part.u[off..].copy_from_slice(&[0.5, 0.5, 0.5]);
        }

        let mut coord = ConsensusCoordinator::new(2);
        let gl = coord.update(&parts).to_vec();

        // (x + u) averages to (1.5, -1.5, -1); weights clipped, threshold kept
        assert_eq!(gl, vec![1.5, 0.0, 0.0]);
    }

    #[test]
    fn test_consensus_weights_stay_nonneg() {
        let H = Matrix::from(&[[1., 2., 3., 0.5, 1.5], [3., 2., 1., 0.25, -1.]]);
        let data = ProblemData::new(&H, 0.3).unwrap();
        let settings = AdmmSettingsBuilder::default().npar(2).build().unwrap();
        let mut parts = PartitionBuilder::new(&data, &settings).build().unwrap();
        let mut coord = ConsensusCoordinator::new(2);

        for _ in 0..50 {
            for part in parts.iter_mut() {
                assert!(part.update_x(1.0));
            }
            let gl = coord.update(&parts).to_vec();
            assert!(gl[1..].iter().all(|&v| v >= -1e-12));
            for part in parts.iter_mut() {
                part.update_zu(&gl);
            }
        }
    }
}
