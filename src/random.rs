use rand::{Error, RngCore, SeedableRng};

#[derive(Clone, Debug)]
pub struct XorShift128PlusRng {
  state: [u64; 2],
}

impl XorShift128PlusRng {
  pub fn from_u64_pair(seed: [u64; 2]) -> XorShift128PlusRng {
    // An all-zero state is a fixed point of the generator.
    let state = if seed[0] == 0 && seed[1] == 0 {
      [0x9e3779b97f4a7c15, 0xbf58476d1ce4e5b9]
    } else {
      seed
    };
    XorShift128PlusRng{
      state: state,
    }
  }

  /// Derive an independent generator, e.g. one per search worker.
  pub fn split(&mut self) -> XorShift128PlusRng {
    let seed = [self.next_u64(), self.next_u64()];
    XorShift128PlusRng::from_u64_pair(seed)
  }
}

impl RngCore for XorShift128PlusRng {
  #[inline]
  fn next_u64(&mut self) -> u64 {
    let mut s1 = self.state[0];
    let s0 = self.state[1];
    self.state[0] = s0;
    s1 ^= s1 << 23;
    s1 = s1 ^ s0 ^ (s1 >> 17) ^ (s0 >> 26);
    self.state[1] = s1;
    s1.wrapping_add(s0)
  }

  #[inline]
  fn next_u32(&mut self) -> u32 {
    (self.next_u64() >> 32) as u32
  }

  fn fill_bytes(&mut self, dest: &mut [u8]) {
    for chunk in dest.chunks_mut(8) {
      let bytes = self.next_u64().to_le_bytes();
      let n = chunk.len();
      chunk.copy_from_slice(&bytes[.. n]);
    }
  }

  fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
    self.fill_bytes(dest);
    Ok(())
  }
}

impl SeedableRng for XorShift128PlusRng {
  type Seed = [u8; 16];

  fn from_seed(seed: [u8; 16]) -> XorShift128PlusRng {
    let mut lo = [0u8; 8];
    let mut hi = [0u8; 8];
    lo.copy_from_slice(&seed[0 .. 8]);
    hi.copy_from_slice(&seed[8 .. 16]);
    XorShift128PlusRng::from_u64_pair([u64::from_le_bytes(lo), u64::from_le_bytes(hi)])
  }
}
