use crate::board::{Stone};
use crate::util::{ceil_power2};

use rand::{Rng};
use std::iter::{repeat};

#[derive(Clone, Debug)]
pub struct BHeap<T> {
  data: Vec<T>,
}

// XXX: Using 0-based binary heap array indexing convention, so the leaves
// start at `ceil_power2(n) - 1`.

impl<T> BHeap<T> where T: Copy {
  pub fn with_capacity(n: usize, init: T) -> BHeap<T> {
    let cap = 2 * ceil_power2(n as u64) as usize - 1;
    let data: Vec<_> = repeat(init).take(cap).collect();
    BHeap{
      data: data,
    }
  }

  #[inline]
  pub fn parent(&self, idx: usize) -> usize {
    (idx + 1) / 2 - 1
  }

  #[inline]
  pub fn left(&self, idx: usize) -> usize {
    2 * (idx + 1) - 1
  }

  #[inline]
  pub fn right(&self, idx: usize) -> usize {
    2 * (idx + 1)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.data.len()
  }
}

/// Per-color sum trees over board vertices. Every interior entry is the sum
/// of its two children, so both updates and weighted draws walk a single
/// root-to-leaf path.
#[derive(Clone, Debug)]
pub struct WeightedSampler {
  n:        usize,
  leaf_idx: usize,
  heaps:    [BHeap<f64>; 2],
}

impl WeightedSampler {
  pub fn new(n: usize) -> WeightedSampler {
    let heap = BHeap::with_capacity(n, 0.0);
    let leaf_idx = ceil_power2(n as u64) as usize - 1;
    WeightedSampler{
      n:        n,
      leaf_idx: leaf_idx,
      heaps:    [heap.clone(), heap],
    }
  }

  pub fn len(&self) -> usize {
    self.n
  }

  pub fn set(&mut self, color: Stone, vertex: usize, weight: f64) {
    assert!(vertex < self.n);
    let heap = &mut self.heaps[color.offset()];
    let mut idx = self.leaf_idx + vertex;
    heap.data[idx] = weight;
    while idx > 0 {
      let parent_idx = heap.parent(idx);
      // XXX: Recompute the parent from both children. Subtracting deltas
      // accumulates roundoff that skews the draws.
      let (left_idx, right_idx) = (heap.left(parent_idx), heap.right(parent_idx));
      heap.data[parent_idx] = heap.data[left_idx] + heap.data[right_idx];
      idx = parent_idx;
    }
  }

  #[inline]
  pub fn get(&self, color: Stone, vertex: usize) -> f64 {
    self.heaps[color.offset()].data[self.leaf_idx + vertex]
  }

  #[inline]
  pub fn total(&self, color: Stone) -> f64 {
    self.heaps[color.offset()].data[0]
  }

  pub fn probability(&self, color: Stone, vertex: usize) -> f64 {
    let total = self.total(color);
    if total > 0.0 {
      self.get(color, vertex) / total
    } else {
      0.0
    }
  }

  pub fn fill(&mut self, color: Stone, weight: f64) {
    let heap = &mut self.heaps[color.offset()];
    for idx in self.leaf_idx .. self.leaf_idx + self.n {
      heap.data[idx] = weight;
    }
    for idx in (0 .. self.leaf_idx).rev() {
      let (left_idx, right_idx) = (heap.left(idx), heap.right(idx));
      heap.data[idx] = heap.data[left_idx] + heap.data[right_idx];
    }
  }

  pub fn draw<R: Rng>(&self, color: Stone, rng: &mut R) -> Option<usize> {
    let heap = &self.heaps[color.offset()];
    if !(heap.data[0] > 0.0) {
      return None;
    }
    let mut idx = 0;
    while idx < self.leaf_idx {
      let left_idx = heap.left(idx);
      let right_idx = heap.right(idx);
      let left_value = heap.data[left_idx];
      let right_value = heap.data[right_idx];
      idx = match (left_value > 0.0, right_value > 0.0) {
        (true, true) => {
          let u: f64 = rng.gen();
          if u * heap.data[idx] < left_value {
            left_idx
          } else {
            right_idx
          }
        }
        (true, false) => left_idx,
        (false, true) => right_idx,
        (false, false) => return None,
      };
    }
    let vertex = idx - self.leaf_idx;
    if vertex < self.n {
      Some(vertex)
    } else {
      None
    }
  }

  /// Weights scaled so that the largest one is 1.
  pub fn normalized(&self, color: Stone) -> Vec<f64> {
    let mut weights: Vec<f64> = (0 .. self.n).map(|v| self.get(color, v)).collect();
    let max = weights.iter().cloned().fold(0.0, f64::max);
    if max > 0.0 {
      for w in weights.iter_mut() {
        *w /= max;
      }
    }
    weights
  }

  /// Checks that every interior entry equals the sum of its children.
  pub fn is_consistent(&self, color: Stone) -> bool {
    let heap = &self.heaps[color.offset()];
    (0 .. self.leaf_idx).all(|idx| {
      let sum = heap.data[heap.left(idx)] + heap.data[heap.right(idx)];
      (heap.data[idx] - sum).abs() <= 1.0e-9 * sum.abs().max(1.0)
    })
  }
}
