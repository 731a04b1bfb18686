extern crate rand;
extern crate watson;

use watson::array_util::{array_argmax, array_argmax2};
use watson::random::{XorShift128PlusRng};

use rand::{Rng, SeedableRng};
use std::iter::{repeat};

#[test]
fn test_argmax() {
  let trials = 1000;
  let n = 1000;

  let mut rng = XorShift128PlusRng::seed_from_u64(1);
  let mut xs: Vec<_> = repeat(0.0f64).take(n).collect();
  assert_eq!(n, xs.len());

  for _ in 0 .. trials {
    for j in 0 .. n {
      xs[j] = rng.gen_range(0.0 .. 1.0);
    }

    let maybe_max_j = array_argmax(&xs);
    match maybe_max_j {
      Some(max_j) => {
        for j in 0 .. n {
          assert!(xs[max_j] >= xs[j]);
        }
      }
      None => {
        panic!("array_argmax should have found a maximum!");
      }
    }
  }
}

#[test]
fn test_argmax_ties_take_first() {
  assert_eq!(array_argmax(&[1.0, 3.0, 3.0, 2.0]), Some(1));
  assert_eq!(array_argmax(&[0.0, 0.0, 0.0]), Some(0));
  assert_eq!(array_argmax(&[]), None);
}

#[test]
fn test_argmax2() {
  assert_eq!(array_argmax2(&[5.0, 1.0, 7.0, 6.0]), (Some(2), Some(3)));
  assert_eq!(array_argmax2(&[4.0, 4.0]), (Some(0), Some(1)));
  assert_eq!(array_argmax2(&[4.0]), (Some(0), None));
  assert_eq!(array_argmax2(&[]), (None, None));
}
