#![allow(non_snake_case)]

use crate::algebra::*;
use crate::qdldl::*;
use crate::solver::AdmmSettings;

/// Direct solver for one partition's quasidefinite KKT system
///
/// ```text
/// [ρI   A'] [x]   [r]
/// [A    0 ] [y] = [b]
/// ```
///
/// where `A` is the partition's equality operator.  The matrix is factored
/// once with a `-ϵI` static regularization in its lower right block, and
/// every solve is refined against the unregularized matrix.
#[derive(Debug)]
pub(crate) struct PartitionKKT<T> {
    // upper triangle of the unregularized KKT matrix
    KKT: CscMatrix<T>,
    ldlsolver: QDLDLFactorisation<T>,
    x: Vec<T>,
    b: Vec<T>,
    work1: Vec<T>,
    work2: Vec<T>,
    refine_reltol: T,
    refine_abstol: T,
    refine_max_iter: u32,
}

impl<T> PartitionKKT<T>
where
    T: FloatT,
{
    /// Assemble and factor the KKT system for the local data `Hi` (p x nᵢ).
    pub fn new(Hi: &Matrix<T>, settings: &AdmmSettings<T>) -> Result<Self, QDLDLError> {
        let (p, ni) = Hi.size();
        let nvars = 2 * ni + p + 1;
        let ncons = ni + 1;
        let dim = nvars + ncons;
        let ϵ = settings.kkt_static_reg;

        let mut KKT = assemble_kkt(Hi, settings.rho, -ϵ);

        let mut Dsigns = vec![1_i8; dim];
        Dsigns[nvars..].fill(-1);
        let opts = QDLDLSettingsBuilder::default()
            .Dsigns(Dsigns)
            .build()
            .map_err(|_| QDLDLError::IncompatibleDimension)?;
        let ldlsolver = QDLDLFactorisation::new(&KKT, Some(opts))?;

        // the last entry in each constraint column is its diagonal
        for col in nvars..dim {
            let diag = KKT.colptr[col + 1] - 1;
            KKT.nzval[diag] = T::zero();
        }

        Ok(Self {
            KKT,
            ldlsolver,
            x: vec![T::zero(); dim],
            b: vec![T::zero(); dim],
            work1: vec![T::zero(); dim],
            work2: vec![T::zero(); dim],
            refine_reltol: settings.kkt_refine_reltol,
            refine_abstol: settings.kkt_refine_abstol,
            refine_max_iter: settings.kkt_refine_max_iter,
        })
    }

    /// Mutable access to the right hand side for the next solve
    pub fn rhs_mut(&mut self) -> &mut [T] {
        &mut self.b
    }

    /// Solution of the most recent solve
    pub fn solution(&self) -> &[T] {
        &self.x
    }

    /// Solve against the current right hand side.  Returns false if
    /// the solution is not finite.
    pub fn solve(&mut self) -> bool {
        self.x.copy_from(&self.b);
        self.ldlsolver.solve(&mut self.x);
        self.iterative_refinement()
    }

    fn iterative_refinement(&mut self) -> bool {
        let (x, b) = (&mut self.x, &self.b);
        let (e, dx) = (&mut self.work1, &mut self.work2);
        let K = &self.KKT;

        let normb = b.norm_inf();
        let mut norme = get_refine_error(e, b, K, x);

        for _ in 0..self.refine_max_iter {
            if !norme.is_finite() {
                return false;
            }
            if norme <= self.refine_abstol + self.refine_reltol * normb {
                break;
            }
            let lastnorme = norme;

            dx.copy_from(e);
            self.ldlsolver.solve(dx);
            dx.axpby(T::one(), x, T::one());
            norme = get_refine_error(e, b, K, dx);

            // keep the correction only if it helped
            if norme < lastnorme {
                std::mem::swap(x, dx);
            } else {
                norme = lastnorme;
                break;
            }
        }
        norme.is_finite() && x.is_finite()
    }
}

// Upper triangle of [ρI  A'; A  δI] in CSC form.  Variables are ordered
// [ξ; s; threshold; a] and constraint rows j < nᵢ read
// ξⱼ - sⱼ - threshold + H[:,j]'a = 0, with the final row 1'a = 1.
fn assemble_kkt<T: FloatT>(Hi: &Matrix<T>, rho: T, δ: T) -> CscMatrix<T> {
    let (p, ni) = Hi.size();
    let nvars = 2 * ni + p + 1;
    let dim = nvars + ni + 1;
    let ithresh = 2 * ni;
    let iweights = 2 * ni + 1;

    let nnz = nvars + ni * (4 + p) + (p + 1);
    let mut colptr = Vec::with_capacity(dim + 1);
    let mut rowval = Vec::with_capacity(nnz);
    let mut nzval = Vec::with_capacity(nnz);
    colptr.push(0);

    for i in 0..nvars {
        rowval.push(i);
        nzval.push(rho);
        colptr.push(rowval.len());
    }

    for j in 0..ni {
        rowval.extend([j, ni + j, ithresh]);
        nzval.extend([T::one(), -T::one(), -T::one()]);
        for (k, &h) in Hi.col_slice(j).iter().enumerate() {
            rowval.push(iweights + k);
            nzval.push(h);
        }
        rowval.push(nvars + j);
        nzval.push(δ);
        colptr.push(rowval.len());
    }

    rowval.extend(iweights..nvars);
    nzval.extend(std::iter::repeat(T::one()).take(p));
    rowval.push(dim - 1);
    nzval.push(δ);
    colptr.push(rowval.len());

    CscMatrix::new(dim, dim, colptr, rowval, nzval)
}

// e = b - Kξ, returning its infinity norm
fn get_refine_error<T: FloatT>(e: &mut [T], b: &[T], K: &CscMatrix<T>, ξ: &[T]) -> T {
    e.copy_from(b);
    K.symv(e, ξ, -T::one(), T::one());
    e.norm_inf()
}
