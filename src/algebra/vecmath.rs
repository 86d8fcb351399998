use super::{AsFloatT, FloatT, ScalarMath, VectorMath};
use itertools::izip;
use std::iter::zip;

impl<T: FloatT> ScalarMath for T {
    type T = T;
    fn clip(&self, min_thresh: T, max_thresh: T) -> T {
        if *self < min_thresh {
            min_thresh
        } else if *self > max_thresh {
            max_thresh
        } else {
            *self
        }
    }

    fn pos(&self) -> T {
        T::max(*self, T::zero())
    }
}

impl<T: FloatT> VectorMath for [T] {
    type T = T;
    fn copy_from(&mut self, src: &[T]) -> &mut Self {
        self.copy_from_slice(src);
        self
    }

    fn scalarop(&mut self, op: impl Fn(T) -> T) -> &mut Self {
        for x in &mut *self {
            *x = op(*x);
        }
        self
    }

    fn scalarop_from(&mut self, op: impl Fn(T) -> T, v: &[T]) -> &mut Self {
        for (x, v) in zip(&mut *self, v) {
            *x = op(*v);
        }
        self
    }

    fn set(&mut self, c: T) -> &mut Self {
        self.scalarop(|_x| c)
    }

    fn scale(&mut self, c: T) -> &mut Self {
        self.scalarop(|x| x * c)
    }

    fn project_nonneg(&mut self) -> &mut Self {
        self.scalarop(|x| x.pos())
    }

    fn dot(&self, y: &[T]) -> T {
        assert_eq!(self.len(), y.len());
        let iter = zip(self, y);
        let op = |(&x, &y)| x * y;
        accumulate_pairwise(iter, op)
    }

    fn dist(&self, y: &[T]) -> T {
        T::sqrt(self.distsq(y))
    }

    fn distsq(&self, y: &[T]) -> T {
        assert_eq!(self.len(), y.len());
        let iter = zip(self, y);
        let op = |(&x, &y)| T::powi(x - y, 2);
        accumulate_pairwise(iter, op)
    }

    fn sum(&self) -> T {
        accumulate_pairwise(self.iter(), |&x| x)
    }

    fn sumsq(&self) -> T {
        self.dot(self)
    }

    // Returns infinity norm
    fn norm_inf(&self) -> T {
        let mut out = T::zero();
        for v in self.iter().map(|v| v.abs()) {
            if v.is_nan() {
                return T::nan();
            }
            out = if v > out { v } else { out };
        }
        out
    }

    fn norm_inf_diff(&self, b: &[T]) -> T {
        zip(self, b).fold(T::zero(), |acc, (x, y)| T::max(acc, T::abs(*x - *y)))
    }

    fn minimum(&self) -> T {
        self.iter().fold(T::infinity(), |r, &s| T::min(r, s))
    }

    fn maximum(&self) -> T {
        self.iter().fold(-T::infinity(), |r, &s| T::max(r, s))
    }

    fn is_finite(&self) -> bool {
        self.iter().all(|&x| T::is_finite(x))
    }

    fn axpby(&mut self, a: T, x: &[T], b: T) -> &mut Self {
        assert_eq!(self.len(), x.len());

        zip(&mut *self, x).for_each(|(y, x)| *y = a * (*x) + b * (*y));
        self
    }

    fn waxpby(&mut self, a: T, x: &[T], b: T, y: &[T]) -> &mut Self {
        assert_eq!(self.len(), x.len());
        assert_eq!(self.len(), y.len());

        for (w, u, v) in izip!(&mut *self, x, y) {
            *w = a * (*u) + b * (*v);
        }
        self
    }
}

// ---------------------------------
// utility functions
// ---------------------------------

// Pairwise summation of a mapped iterator.  Sums are formed over
// fixed size blocks so that long residual vectors accumulate with
// less rounding error than a naive running sum.

const PAIRWISE_BLOCK: usize = 32;

fn accumulate_pairwise<T, I, F>(iter: I, op: F) -> T
where
    T: FloatT,
    I: Iterator,
    F: Fn(I::Item) -> T,
{
    let mut blocks: Vec<T> = Vec::new();
    let mut acc = T::zero();
    let mut count = 0;
    for item in iter {
        acc += op(item);
        count += 1;
        if count == PAIRWISE_BLOCK {
            blocks.push(acc);
            acc = T::zero();
            count = 0;
        }
    }
    if blocks.is_empty() {
        return acc;
    }
    blocks.push(acc);

    while blocks.len() > 1 {
        blocks = blocks
            .chunks(2)
            .map(|c| if c.len() == 2 { c[0] + c[1] } else { c[0] })
            .collect();
    }
    blocks[0]
}
