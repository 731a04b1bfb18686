/// Index of the first maximum; later equal elements do not displace it.
pub fn array_argmax(xs: &[f64]) -> Option<usize> {
  let mut argmax: Option<(usize, f64)> = None;
  for (j, &x) in xs.iter().enumerate() {
    match argmax {
      None => argmax = Some((j, x)),
      Some((_, best)) if best < x => argmax = Some((j, x)),
      _ => {}
    }
  }
  argmax.map(|(j, _)| j)
}

pub fn array_argmax2(xs: &[f64]) -> (Option<usize>, Option<usize>) {
  let mut argmax: Option<(usize, f64)> = None;
  let mut argmax2: Option<(usize, f64)> = None;
  for (j, &x) in xs.iter().enumerate() {
    if argmax.map_or(true, |(_, best)| best < x) {
      argmax2 = argmax;
      argmax = Some((j, x));
    } else if argmax2.map_or(true, |(_, second)| second < x) {
      argmax2 = Some((j, x));
    }
  }
  (argmax.map(|(j, _)| j), argmax2.map(|(j, _)| j))
}
