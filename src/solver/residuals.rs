use crate::algebra::*;
use crate::solver::partition::PartitionSums;

/// Residual norms and stopping thresholds of one ADMM iteration
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Residuals<T> {
    /// relaxed ADMM objective `Σᵢ fᵢ'xᵢ / n`
    pub objective: T,
    /// primal residual `‖x - z‖`
    pub r_norm: T,
    /// dual residual `ρ‖z - zprev‖`
    pub s_norm: T,
    pub eps_pri: T,
    pub eps_dual: T,
}

impl<T> Residuals<T>
where
    T: FloatT,
{
    pub(crate) fn from_sums(sums: &PartitionSums<T>, n: usize, p: usize, rho: T, tol: T, reltol: T) -> Self {
        let sqrtp1: T = (p + 1).as_T();
        let base = sqrtp1.sqrt() * tol;
        let n: T = n.as_T();
        Self {
            objective: sums.objective / n,
            r_norm: sums.rsq.sqrt(),
            s_norm: sums.ssq.sqrt(),
            eps_pri: base + reltol * T::max(sums.xsq.sqrt(), sums.zsq.sqrt()),
            eps_dual: base + reltol * rho * sums.usq.sqrt(),
        }
    }

    pub fn is_converged(&self) -> bool {
        self.r_norm < self.eps_pri && self.s_norm < self.eps_dual
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.objective.is_finite() && self.r_norm.is_finite() && self.s_norm.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_residual_thresholds() {
        let sums = PartitionSums::<f64> {
            objective: 6.0,
            xsq: 16.0,
            zsq: 9.0,
            usq: 4.0,
            rsq: 1e-6,
            ssq: 4e-6,
        };
        let res = Residuals::from_sums(&sums, 3, 3, 2.0, 1e-3, 1e-2);
        assert_eq!(res.objective, 2.0);
        assert!((res.r_norm - 1e-3).abs() < 1e-15);
        assert!((res.s_norm - 2e-3).abs() < 1e-15);
        assert!((res.eps_pri - (2e-3 + 4e-2)).abs() < 1e-15);
        assert!((res.eps_dual - (2e-3 + 4e-2)).abs() < 1e-15);
        assert!(res.is_converged());

        let sums = PartitionSums { rsq: 1.0, ..sums };
        assert!(!Residuals::from_sums(&sums, 3, 3, 2.0, 1e-3, 1e-2).is_converged());
    }
}
