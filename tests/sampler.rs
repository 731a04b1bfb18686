extern crate rand;
extern crate watson;

use watson::board::{Stone};
use watson::discrete::{WeightedSampler};
use watson::random::{XorShift128PlusRng};

use rand::{SeedableRng};

#[test]
fn test_frequencies_converge() {
  let n = 10;
  let n_samples = 200_000;
  let mut sampler = WeightedSampler::new(n);
  for v in 0 .. n {
    sampler.set(Stone::Black, v, (v + 1) as f64);
  }
  assert!(sampler.is_consistent(Stone::Black));
  let total = sampler.total(Stone::Black);
  assert!((total - 55.0).abs() < 1.0e-9);

  let mut rng = XorShift128PlusRng::seed_from_u64(7);
  let mut counts = vec![0usize; n];
  for _ in 0 .. n_samples {
    let v = sampler.draw(Stone::Black, &mut rng).unwrap();
    counts[v] += 1;
  }
  for v in 0 .. n {
    let expected = (v + 1) as f64 / total;
    let observed = counts[v] as f64 / n_samples as f64;
    assert!((expected - observed).abs() < 0.01,
        "vertex {}: expected {:.4} observed {:.4}", v, expected, observed);
  }
}

#[test]
fn test_zero_weights_never_drawn() {
  let n = 81;
  let mut sampler = WeightedSampler::new(n);
  sampler.fill(Stone::White, 500.0);
  for v in (0 .. n).filter(|v| v % 3 != 0) {
    sampler.set(Stone::White, v, 0.0);
  }
  let mut rng = XorShift128PlusRng::seed_from_u64(11);
  for _ in 0 .. 10_000 {
    let v = sampler.draw(Stone::White, &mut rng).unwrap();
    assert_eq!(v % 3, 0);
  }
  // The other color is untouched.
  assert_eq!(sampler.total(Stone::Black), 0.0);
}

#[test]
fn test_all_zero_draws_none() {
  let sampler = WeightedSampler::new(25);
  let mut rng = XorShift128PlusRng::seed_from_u64(3);
  assert_eq!(sampler.draw(Stone::Black, &mut rng), None);
  assert_eq!(sampler.probability(Stone::Black, 4), 0.0);
}

#[test]
fn test_heap_sums_consistent_after_updates() {
  let n = 121;
  let mut sampler = WeightedSampler::new(n);
  sampler.fill(Stone::Black, 500.0);
  for i in 0 .. 1000 {
    let v = (i * 37) % n;
    sampler.set(Stone::Black, v, ((i % 7) as f64) * 0.1);
    assert!(sampler.is_consistent(Stone::Black));
  }
  let sum: f64 = (0 .. n).map(|v| sampler.get(Stone::Black, v)).sum();
  assert!((sampler.total(Stone::Black) - sum).abs() < 1.0e-9);
}

#[test]
fn test_normalized() {
  let mut sampler = WeightedSampler::new(4);
  sampler.set(Stone::Black, 0, 2.0);
  sampler.set(Stone::Black, 3, 4.0);
  assert_eq!(sampler.normalized(Stone::Black), vec![0.5, 0.0, 0.0, 1.0]);
  assert_eq!(sampler.probability(Stone::Black, 3), 4.0 / 6.0);
}
