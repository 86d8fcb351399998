use crate::algebra::*;
use crate::solver::kktsolver::PartitionKKT;
use crate::solver::{AdmmSettings, ProblemData, SolverError};
use rand::seq::SliceRandom;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

/// Splits the data columns into partitions and builds their local problems.
pub(crate) struct PartitionBuilder<'a, T: FloatT> {
    data: &'a ProblemData<T>,
    settings: &'a AdmmSettings<T>,
}

impl<'a, T> PartitionBuilder<'a, T>
where
    T: FloatT,
{
    pub fn new(data: &'a ProblemData<T>, settings: &'a AdmmSettings<T>) -> Self {
        Self { data, settings }
    }

    pub fn build(&self) -> Result<Vec<PartitionState<T>>, SolverError> {
        let (n, npar) = (self.data.n, self.settings.npar);
        if npar > n {
            return Err(SolverError::BadDimensions {
                p: self.data.p,
                n,
                npar,
            });
        }

        assign_columns(n, npar, self.settings.partition_seed)
            .into_iter()
            .enumerate()
            .map(|(i, cols)| {
                PartitionState::new(cols, self.data, self.settings)
                    .map_err(|source| SolverError::Factorization { partition: i, source })
            })
            .collect()
    }
}

/// Seeded shuffle of `0..n`, dealt round robin into `npar` sorted groups
/// whose sizes differ by at most one.
pub(crate) fn assign_columns(n: usize, npar: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut idx: Vec<usize> = (0..n).collect();
    let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
    idx.shuffle(&mut rng);

    (0..npar)
        .map(|i| {
            let mut cols: Vec<usize> = idx.iter().skip(i).step_by(npar).copied().collect();
            cols.sort_unstable();
            cols
        })
        .collect()
}

/// Local state of one partition.
///
/// The local variable vector has length `2nᵢ + p + 1`, ordered as
/// `[ξ; s; threshold; a]`.  The leading `2nᵢ` entries are local slacks and
/// the trailing `p + 1` entries are this partition's copy of the shared
/// consensus block.
#[derive(Debug)]
pub(crate) struct PartitionState<T> {
    pub cols: Vec<usize>,
    pub ni: usize,
    f: Vec<T>,
    kkt: PartitionKKT<T>,
    pub x: Vec<T>,
    pub z: Vec<T>,
    pub u: Vec<T>,
    zprev: Vec<T>,
}

/// Per-partition contributions to the iteration diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PartitionSums<T> {
    pub objective: T,
    pub xsq: T,
    pub zsq: T,
    pub usq: T,
    pub rsq: T,
    pub ssq: T,
}

impl<T: FloatT> std::ops::Add for PartitionSums<T> {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self {
            objective: self.objective + o.objective,
            xsq: self.xsq + o.xsq,
            zsq: self.zsq + o.zsq,
            usq: self.usq + o.usq,
            rsq: self.rsq + o.rsq,
            ssq: self.ssq + o.ssq,
        }
    }
}

impl<T> PartitionState<T>
where
    T: FloatT,
{
    fn new(
        cols: Vec<usize>,
        data: &ProblemData<T>,
        settings: &AdmmSettings<T>,
    ) -> Result<Self, crate::qdldl::QDLDLError> {
        let ni = cols.len();
        let p = data.p;
        let nvars = 2 * ni + p + 1;

        // objective scaled by n so that partition sums combine
        let mut f = vec![T::zero(); nvars];
        let n: T = data.n.as_T();
        let ni_t: T = ni.as_T();
        f[..ni].fill(n * data.D);
        f[2 * ni] = -ni_t;

        let Hi = data.H.select_columns(&cols);
        let kkt = PartitionKKT::new(&Hi, settings)?;

        Ok(Self {
            cols,
            ni,
            f,
            kkt,
            x: vec![T::zero(); nvars],
            z: vec![T::zero(); nvars],
            u: vec![T::zero(); nvars],
            zprev: vec![T::zero(); nvars],
        })
    }

    pub fn nvars(&self) -> usize {
        self.x.len()
    }

    /// Offset of the shared `[threshold; a]` block
    pub fn shared_offset(&self) -> usize {
        2 * self.ni
    }

    pub fn reset(&mut self) {
        self.x.set(T::zero());
        self.z.set(T::zero());
        self.u.set(T::zero());
        self.zprev.set(T::zero());
    }

    /// x-update: solve the local KKT system with rhs `[ρ(z - u) - f; b]`.
    /// Returns false on a non-finite solution.
    pub fn update_x(&mut self, rho: T) -> bool {
        let nvars = self.nvars();
        let rhs = self.kkt.rhs_mut();
        let (r, b) = rhs.split_at_mut(nvars);
        r.waxpby(rho, &self.z, -rho, &self.u);
        r.axpby(-T::one(), &self.f, T::one());
        b.set(T::zero());
        if let Some(last) = b.last_mut() {
            *last = T::one();
        }

        let ok = self.kkt.solve();
        self.x.copy_from(&self.kkt.solution()[..nvars]);
        ok
    }

    /// Add the shared block of `x + u` into `acc`
    pub fn accumulate_shared(&self, acc: &mut [T]) {
        let u = &self.u[self.shared_offset()..];
        for (a, (&x, &u)) in acc.iter_mut().zip(self.shared_x().iter().zip(u)) {
            *a += x + u;
        }
    }

    /// z- and u-updates given the new consensus value
    pub fn update_zu(&mut self, consensus: &[T]) {
        let off = self.shared_offset();
        self.zprev.copy_from(&self.z);

        let (zloc, zshared) = self.z.split_at_mut(off);
        zloc.waxpby(T::one(), &self.x[..off], T::one(), &self.u[..off]);
        zloc.project_nonneg();
        zshared.copy_from(consensus);

        // u ← u + x - z
        self.u.axpby(T::one(), &self.x, T::one());
        self.u.axpby(-T::one(), &self.z, T::one());
    }

    pub fn sums(&self, rho: T) -> PartitionSums<T> {
        PartitionSums {
            objective: self.f.dot(&self.x),
            xsq: self.x.sumsq(),
            zsq: self.z.sumsq(),
            usq: self.u.sumsq(),
            rsq: self.x.distsq(&self.z),
            ssq: rho * rho * self.z.distsq(&self.zprev),
        }
    }

    /// This partition's current view of the shared block
    pub fn shared_x(&self) -> &[T] {
        &self.x[self.shared_offset()..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_columns() {
        let parts = assign_columns(7, 3, 0);
        let mut sizes: Vec<usize> = parts.iter().map(|c| c.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![2, 2, 3]);

        let mut all: Vec<usize> = parts.concat();
        all.sort_unstable();
        assert_eq!(all, (0..7).collect::<Vec<_>>());

        // seeded, so repeatable
        assert_eq!(parts, assign_columns(7, 3, 0));
    }

    #[test]
    fn test_assign_columns_single() {
        let parts = assign_columns(5, 1, 42);
        assert_eq!(parts, vec![vec![0, 1, 2, 3, 4]]);
    }

    #[test]
    fn test_partition_build() {
        let H = Matrix::from(&[[1., 2., 3., 4.], [4., 3., 2., 1.]]);
        let data = ProblemData::new(&H, 0.5).unwrap();
        let settings = crate::solver::AdmmSettingsBuilder::default()
            .npar(2)
            .build()
            .unwrap();
        let parts = PartitionBuilder::new(&data, &settings).build().unwrap();
        assert_eq!(parts.len(), 2);
        for part in parts.iter() {
            assert_eq!(part.ni, 2);
            assert_eq!(part.nvars(), 2 * 2 + 2 + 1);
            // f = [nD; 0; -nᵢ; 0]
            assert_eq!(part.f, vec![2., 2., 0., 0., -2., 0., 0.]);
        }

        let settings = crate::solver::AdmmSettingsBuilder::default()
            .npar(5)
            .build()
            .unwrap();
        assert!(matches!(
            PartitionBuilder::new(&data, &settings).build(),
            Err(SolverError::BadDimensions { .. })
        ));
    }

    #[test]
    fn test_first_x_update_is_feasible() {
        let H = Matrix::from(&[[1., 2., 3.], [3., 2., 1.]]);
        let data = ProblemData::new(&H, 0.5).unwrap();
        let settings = AdmmSettings::<f64>::default();
        let mut parts = PartitionBuilder::new(&data, &settings).build().unwrap();
        let part = &mut parts[0];

        assert!(part.update_x(1.0));
        // weights of the x-update satisfy the normalization row exactly
        let a = &part.shared_x()[1..];
        assert!((a.sum() - 1.0).abs() < 1e-10);
    }
}
