use crate::solver::Residuals;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-iteration record of an ADMM run.
///
/// Appended once per iteration and truncated to the iteration count
/// actually performed.  Consensus snapshots are stored contiguously, one
/// `[threshold; a]` block of length `p + 1` per iteration.  The shared
/// blocks of every partition's local `x` are kept alongside, `npar` blocks
/// per iteration in partition order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct History<T> {
    pub r_norm: Vec<T>,
    pub s_norm: Vec<T>,
    pub eps_pri: Vec<T>,
    pub eps_dual: Vec<T>,
    pub objective: Vec<T>,
    consensus: Vec<T>,
    local: Vec<T>,
    width: usize,
    npar: usize,
}

impl<T> History<T>
where
    T: Copy,
{
    pub(crate) fn new(p: usize, npar: usize, capacity: usize) -> Self {
        // don't reserve the whole iteration limit up front
        let capacity = capacity.min(1024);
        Self {
            r_norm: Vec::with_capacity(capacity),
            s_norm: Vec::with_capacity(capacity),
            eps_pri: Vec::with_capacity(capacity),
            eps_dual: Vec::with_capacity(capacity),
            objective: Vec::with_capacity(capacity),
            consensus: Vec::with_capacity(capacity * (p + 1)),
            local: Vec::with_capacity(capacity * npar * (p + 1)),
            width: p + 1,
            npar,
        }
    }

    pub(crate) fn push<'a, I>(&mut self, res: &Residuals<T>, consensus: &[T], local: I)
    where
        I: IntoIterator<Item = &'a [T]>,
        T: 'a,
    {
        debug_assert_eq!(consensus.len(), self.width);
        let start = self.local.len();
        local
            .into_iter()
            .for_each(|block| self.local.extend_from_slice(block));
        debug_assert_eq!(self.local.len() - start, self.npar * self.width);
        self.r_norm.push(res.r_norm);
        self.s_norm.push(res.s_norm);
        self.eps_pri.push(res.eps_pri);
        self.eps_dual.push(res.eps_dual);
        self.objective.push(res.objective);
        self.consensus.extend_from_slice(consensus);
    }

    /// Number of recorded iterations
    pub fn len(&self) -> usize {
        self.r_norm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r_norm.is_empty()
    }

    /// Consensus vector `[threshold; a]` after iteration `k` (zero based)
    pub fn consensus(&self, k: usize) -> &[T] {
        &self.consensus[k * self.width..(k + 1) * self.width]
    }

    /// Shared block `[threshold; a]` of partition `i` after iteration `k`
    pub fn local(&self, k: usize, i: usize) -> &[T] {
        let start = (k * self.npar + i) * self.width;
        &self.local[start..start + self.width]
    }

    /// Number of partitions recorded per iteration
    pub fn npar(&self) -> usize {
        self.npar
    }

    /// Length of each consensus snapshot
    pub fn consensus_len(&self) -> usize {
        self.width
    }
}
