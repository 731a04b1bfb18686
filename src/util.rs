#[inline]
pub fn ceil_power2(x: u64) -> u64 {
  if x <= 1 {
    return 1;
  }
  let mut v = x;
  v -= 1;
  v |= v >> 1;
  v |= v >> 2;
  v |= v >> 4;
  v |= v >> 8;
  v |= v >> 16;
  v |= v >> 32;
  v += 1;
  v
}

/// Zero stands in for NaN wherever a ratio of counts can be 0/0.
#[inline]
pub fn nan_to_zero(x: f64) -> f64 {
  if x.is_nan() { 0.0 } else { x }
}
