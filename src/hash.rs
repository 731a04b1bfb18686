use crate::board::{Stone};
use crate::random::{XorShift128PlusRng};

use rand::{RngCore};

const TABLE_SEED: [u64; 2] = [0x5bd1e9955bd1e995, 0x2545f4914f6cdd1d];

/// Zobrist constants for one board size. Tables are generated from a fixed
/// seed mixed with the size, so two boards of equal size always agree.
#[derive(Debug)]
pub struct HashTable {
  empty:  Vec<u32>,
  stones: [Vec<u32>; 2],
}

impl HashTable {
  pub fn new(num_points: usize) -> HashTable {
    let mut rng = XorShift128PlusRng::from_u64_pair([
        TABLE_SEED[0] ^ num_points as u64,
        TABLE_SEED[1].rotate_left(num_points as u32 % 64),
    ]);
    let mut empty = Vec::with_capacity(num_points);
    let mut black = Vec::with_capacity(num_points);
    let mut white = Vec::with_capacity(num_points);
    for _ in 0 .. num_points {
      empty.push(rng.next_u32());
      black.push(rng.next_u32());
      white.push(rng.next_u32());
    }
    HashTable{
      empty:  empty,
      stones: [black, white],
    }
  }

  pub fn num_points(&self) -> usize {
    self.empty.len()
  }

  #[inline]
  fn key(&self, stone: Stone, vertex: usize) -> u32 {
    match stone {
      Stone::Empty => self.empty[vertex],
      _ => self.stones[stone.offset()][vertex],
    }
  }

  pub fn empty_position(&self) -> PositionHash {
    PositionHash(self.empty.iter().fold(0, |h, &k| h ^ k))
  }

  /// Hash of an arbitrary position, computed from scratch.
  pub fn position(&self, stones: &[Stone]) -> PositionHash {
    assert_eq!(stones.len(), self.num_points());
    let mut h = 0;
    for (v, &stone) in stones.iter().enumerate() {
      h ^= self.key(stone, v);
    }
    PositionHash(h)
  }
}

#[derive(Clone, Copy, Eq, PartialEq, Hash, Default, Debug)]
pub struct PositionHash(pub u32);

impl PositionHash {
  #[inline]
  pub fn update(self, table: &HashTable, old: Stone, new: Stone, vertex: usize) -> PositionHash {
    PositionHash(self.0 ^ table.key(old, vertex) ^ table.key(new, vertex))
  }
}
