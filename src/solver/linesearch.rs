use crate::algebra::*;
use crate::solver::problem::objective_from_margins;
use crate::solver::{History, ProblemData};
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// half width of the averaging window around an extremum
const EXTREMUM_HALF_WIDTH: usize = 5;
// longest stretch of history scanned for oscillations
const DEEP_WINDOW_MAX: usize = 500;
// shortest and longest window for the best/worst half split
const SHALLOW_WINDOW_MIN: usize = 5;
const SHALLOW_WINDOW_MAX: usize = 50;
// reference points closer than this are not refined
const MIN_SEGMENT_NORM: f64 = 1e-4;

/// Strategy used to pick the two line search reference points
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LinesearchStrategy {
    /// averages around the latest peak/trough pair of the dual residual
    Deep,
    /// averages over the better and worse halves of a recent window
    Shallow,
}

impl std::fmt::Display for LinesearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Outcome of the post-iteration line search
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinesearchReport<T> {
    pub strategy: LinesearchStrategy,
    /// the oscillation scan ran but found no peak/trough pair
    pub deep_failed: bool,
    /// reference points `[threshold; a]`
    pub begin: Vec<T>,
    pub end: Vec<T>,
    /// bisection result, when the reference points were far enough apart
    pub refined: Option<Vec<T>>,
    /// true objective at `refined`
    pub objective: Option<T>,
    /// whether `refined` improved on the ADMM objective
    pub adopted: bool,
    pub improvement: T,
}

// Extremum of the dual residual history
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub(crate) enum Extremum {
    Peak,
    Trough,
}

// Backward scan for the most recent peak/trough pair
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub(crate) enum DeepScan {
    SearchingFirst,
    SearchingSecond(Extremum, usize),
    Done(usize, usize),
    Failed,
}

impl DeepScan {
    fn observe(self, kind: Extremum, idx: usize) -> Self {
        match self {
            DeepScan::SearchingFirst => DeepScan::SearchingSecond(kind, idx),
            DeepScan::SearchingSecond(first, fidx) if first != kind => DeepScan::Done(fidx, idx),
            state => state,
        }
    }

    /// Scan the first differences of `s` backward over the most recent
    /// `min(2k/3, 500)` iterations.  Zero differences are skipped and an
    /// extremum sits wherever consecutive nonzero differences change sign.
    pub(crate) fn scan<T: FloatT>(s: &[T]) -> Self {
        let k = s.len();
        let window = usize::min(2 * k / 3, DEEP_WINDOW_MAX);
        if k < 3 || window < 2 {
            return DeepScan::Failed;
        }
        let lo = k - window;

        let mut state = DeepScan::SearchingFirst;
        let mut right: Option<bool> = None; // sign of the next nonzero difference

        for i in (lo..=k - 2).rev() {
            let d = s[i + 1] - s[i];
            if d == T::zero() {
                continue;
            }
            let rising = d > T::zero();
            if let Some(right_rising) = right {
                if rising != right_rising {
                    let kind = if rising { Extremum::Peak } else { Extremum::Trough };
                    state = state.observe(kind, i + 1);
                    if let DeepScan::Done(..) = state {
                        return state;
                    }
                }
            }
            right = Some(rising);
        }
        DeepScan::Failed
    }
}

/// Post-iteration line search over the consensus history
pub(crate) struct OscillationLineSearch<'a, T> {
    data: &'a ProblemData<T>,
    deep_min_iter: usize,
    max_bisect: u32,
}

impl<'a, T> OscillationLineSearch<'a, T>
where
    T: FloatT,
{
    pub fn new(data: &'a ProblemData<T>, deep_min_iter: u32, max_bisect: u32) -> Self {
        Self {
            data,
            deep_min_iter: deep_min_iter as usize,
            max_bisect,
        }
    }

    pub fn run(&self, history: &History<T>, fval_admm: T) -> LinesearchReport<T> {
        let k = history.len();

        let mut deep_failed = false;
        let mut points = None;
        if k > self.deep_min_iter {
            match DeepScan::scan(&history.s_norm) {
                DeepScan::Done(first, second) => {
                    points = Some((
                        average_snapshots(history, around(first, k)),
                        average_snapshots(history, around(second, k)),
                    ));
                }
                _ => deep_failed = true,
            }
        }

        let (strategy, (begin, end)) = match points {
            Some(pts) => (LinesearchStrategy::Deep, pts),
            None => (LinesearchStrategy::Shallow, shallow_points(history)),
        };

        let mut report = LinesearchReport {
            strategy,
            deep_failed,
            refined: None,
            objective: None,
            adopted: false,
            improvement: T::zero(),
            begin,
            end,
        };

        if report.begin.dist(&report.end) > MIN_SEGMENT_NORM.as_T() {
            let (point, obj) = self.refine(&report.begin, &report.end);
            if obj < fval_admm {
                report.adopted = true;
                report.improvement = fval_admm - obj;
            }
            report.refined = Some(point);
            report.objective = Some(obj);
        }
        report
    }

    // project both weight blocks onto the simplex, bisect along the segment,
    // then bisect the threshold with the weights held fixed
    fn refine(&self, begin: &[T], end: &[T]) -> (Vec<T>, T) {
        let mut b = begin.to_vec();
        let mut e = end.to_vec();
        project_simplex(&mut b[1..]);
        project_simplex(&mut e[1..]);

        let mut pt = vec![T::zero(); b.len()];
        let t = bisect(T::zero(), T::one(), self.max_bisect, |t| {
            pt.waxpby(T::one() - t, &b, t, &e);
            self.data.true_objective(pt[0], &pt[1..])
        });
        pt.waxpby(T::one() - t, &b, t, &e);

        let margins = self.data.margins(&pt[1..]);
        let (lo, hi) = (margins.minimum(), margins.maximum());
        let D = self.data.D;
        pt[0] = bisect(lo, hi, self.max_bisect, |thr| {
            objective_from_margins(D, thr, &margins)
        });

        let obj = objective_from_margins(D, pt[0], &margins);
        (pt, obj)
    }
}

// Bisection for the minimizer of a convex function on [lo, hi], driven
// by the sign of a central difference.
fn bisect<T: FloatT>(mut lo: T, mut hi: T, maxiter: u32, mut g: impl FnMut(T) -> T) -> T {
    let h = T::epsilon().sqrt();
    let two: T = (2.0).as_T();
    for _ in 0..maxiter {
        if hi - lo <= T::epsilon() * T::max(T::one(), T::abs(lo)) {
            break;
        }
        let m = (lo + hi) / two;
        if g(m + h) > g(m - h) {
            hi = m;
        } else {
            lo = m;
        }
    }
    (lo + hi) / two
}

fn around(idx: usize, k: usize) -> std::ops::Range<usize> {
    idx.saturating_sub(EXTREMUM_HALF_WIDTH)..usize::min(idx + EXTREMUM_HALF_WIDTH + 1, k)
}

fn average_snapshots<T: FloatT>(history: &History<T>, iters: impl IntoIterator<Item = usize>) -> Vec<T> {
    let mut avg = vec![T::zero(); history.consensus_len()];
    let mut count = 0usize;
    for k in iters {
        avg.axpby(T::one(), history.consensus(k), T::one());
        count += 1;
    }
    if count > 0 {
        avg.scale(T::recip(count.as_T()));
    }
    avg
}

// Split the latest clamp(k/5, 5, 50) iterations by dual residual rank and
// average the consensus snapshots of the better and worse halves.
fn shallow_points<T: FloatT>(history: &History<T>) -> (Vec<T>, Vec<T>) {
    let k = history.len();
    let w = (k / 5).clamp(SHALLOW_WINDOW_MIN, SHALLOW_WINDOW_MAX).min(k);

    let mut order: Vec<usize> = (k - w..k).collect();
    order.sort_by(|&i, &j| {
        history.s_norm[i]
            .partial_cmp(&history.s_norm[j])
            .unwrap_or(Ordering::Equal)
    });

    let half = usize::max(w / 2, 1).min(order.len());
    let (better, worse) = order.split_at(half);
    let begin = average_snapshots(history, better.iter().copied());
    let end = if worse.is_empty() {
        begin.clone()
    } else {
        average_snapshots(history, worse.iter().copied())
    };
    (begin, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Residuals;

    fn history_from(s: &[f64], snapshot: impl Fn(usize) -> Vec<f64>) -> History<f64> {
        let mut h = History::new(2, 1, s.len());
        for (k, &sk) in s.iter().enumerate() {
            let res = Residuals {
                s_norm: sk,
                ..Residuals::default()
            };
            let x = snapshot(k);
            h.push(&res, &x, [x.as_slice()]);
        }
        h
    }

    #[test]
    fn test_deep_scan_finds_pair() {
        // peak at 6, then trough at 4 scanning backward
        let s = [5., 4., 3., 2., 1., 2., 3., 2., 1.];
        assert_eq!(DeepScan::scan(&s), DeepScan::Done(6, 4));
    }

    #[test]
    fn test_deep_scan_skips_flat_steps() {
        let s = [9., 8., 7., 6., 5., 4., 3., 2., 1., 1., 2., 3., 3., 2., 1.];
        // window covers indices 5.., the flat steps at 8-9 and 11-12 are ignored
        assert_eq!(DeepScan::scan(&s), DeepScan::Done(11, 8));
    }

    #[test]
    fn test_deep_scan_fails() {
        let s: Vec<f64> = (0..30).map(|k| 1.0 / (k + 1) as f64).collect();
        assert_eq!(DeepScan::scan(&s), DeepScan::Failed);
        assert_eq!(DeepScan::scan(&[1.0, 2.0]), DeepScan::Failed);

        // only a single extremum inside the window
        let s = [9., 8., 7., 6., 5., 4., 3., 2., 1., 2.];
        assert_eq!(DeepScan::scan(&s), DeepScan::Failed);
    }

    #[test]
    fn test_shallow_points() {
        let s: Vec<f64> = (0..10).map(|k| if k % 2 == 0 { 1.0 } else { 2.0 }).collect();
        let h = history_from(&s, |k| vec![k as f64, 0.0, 0.0]);
        let (begin, end) = shallow_points(&h);
        // window 5..10: better half {6, 8}, worse half {5, 7, 9}
        assert_eq!(begin, vec![7.0, 0.0, 0.0]);
        assert_eq!(end, vec![7.0, 0.0, 0.0]);

        let h = history_from(&s, |k| vec![0.0, k as f64, 1.0]);
        let (begin, end) = shallow_points(&h);
        assert_eq!(begin[1], 7.0);
        assert_eq!(end[1], 7.0);
    }

    #[test]
    fn test_linesearch_recovers_midpoint() {
        let H = Matrix::from(&[[1., 2., 3.], [3., 2., 1.]]);
        let data = ProblemData::new(&H, 0.5).unwrap();

        // alternate between two points whose midpoint is optimal
        let s: Vec<f64> = (0..10).map(|k| if k % 2 == 0 { 1.0 } else { 2.0 }).collect();
        let h = history_from(&s, |k| {
            if k % 2 == 0 {
                vec![2.0, 0.9, 0.1]
            } else {
                vec![2.0, 0.1, 0.9]
            }
        });

        let ls = OscillationLineSearch::new(&data, 400, 60);
        let report = ls.run(&h, -1.0);
        assert_eq!(report.strategy, LinesearchStrategy::Shallow);
        assert!(!report.deep_failed);
        assert!(report.adopted);

        let pt = report.refined.unwrap();
        assert!((pt[1] - 0.5).abs() < 1e-6);
        assert!((pt[2] - 0.5).abs() < 1e-6);
        assert!((pt[0] - 2.0).abs() < 1e-6);
        assert!((report.objective.unwrap() + 2.0).abs() < 1e-6);
        assert!((report.improvement - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_linesearch_not_adopted() {
        let H = Matrix::from(&[[1., 2., 3.], [3., 2., 1.]]);
        let data = ProblemData::new(&H, 0.5).unwrap();
        let s: Vec<f64> = (0..10).map(|k| if k % 2 == 0 { 1.0 } else { 2.0 }).collect();
        let h = history_from(&s, |k| {
            if k % 2 == 0 {
                vec![2.0, 0.9, 0.1]
            } else {
                vec![2.0, 0.1, 0.9]
            }
        });

        // already better than anything on the segment
        let report = OscillationLineSearch::new(&data, 400, 60).run(&h, -3.0);
        assert!(!report.adopted);
        assert_eq!(report.improvement, 0.0);
        assert!(report.objective.is_some());

        // identical reference points skip the refinement
        let h = history_from(&s, |_| vec![2.0, 0.5, 0.5]);
        let report = OscillationLineSearch::new(&data, 400, 60).run(&h, -1.0);
        assert!(report.refined.is_none());
        assert!(!report.adopted);
    }

    #[test]
    fn test_deep_strategy_selected() {
        let H = Matrix::from(&[[1., 2., 3.], [3., 2., 1.]]);
        let data = ProblemData::new(&H, 0.5).unwrap();
        // slow oscillation with period 20
        let s: Vec<f64> = (0..60)
            .map(|k| 1.0 + (k as f64 * std::f64::consts::PI / 10.0).sin())
            .collect();
        let h = history_from(&s, |_| vec![2.0, 0.5, 0.5]);

        let report = OscillationLineSearch::new(&data, 40, 60).run(&h, -1.0);
        assert_eq!(report.strategy, LinesearchStrategy::Deep);
        assert!(!report.deep_failed);

        // monotone history past the deep threshold falls back
        let s: Vec<f64> = (0..60).map(|k| 1.0 / (k + 1) as f64).collect();
        let h = history_from(&s, |_| vec![2.0, 0.5, 0.5]);
        let report = OscillationLineSearch::new(&data, 40, 60).run(&h, -1.0);
        assert_eq!(report.strategy, LinesearchStrategy::Shallow);
        assert!(report.deep_failed);
    }
}
