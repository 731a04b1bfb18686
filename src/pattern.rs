use crate::board::{Stone};

use std::cmp::{min};

// Neighbour slots, row-major around the center:
//   0 1 2
//   3 . 4
//   5 6 7
static MASK_8_TRANS_MAPS: [[u8; 8]; 8] = [
  [0, 1, 2, 3, 4, 5, 6, 7],
  [2, 1, 0, 4, 3, 7, 6, 5],
  [5, 6, 7, 3, 4, 0, 1, 2],
  [7, 6, 5, 4, 3, 2, 1, 0],
  [0, 3, 5, 1, 6, 2, 4, 7],
  [2, 4, 7, 1, 6, 0, 3, 5],
  [5, 3, 0, 6, 1, 7, 4, 2],
  [7, 4, 2, 6, 1, 5, 3, 0],
];

pub const CELL_EMPTY: u16 = 0;
pub const CELL_OWN:   u16 = 1;
pub const CELL_OPP:   u16 = 2;
pub const CELL_EDGE:  u16 = 3;

/// Cell code of `stone` as seen by `turn`.
#[inline]
pub fn cell_code(turn: Stone, stone: Stone) -> u16 {
  if stone == Stone::Empty {
    CELL_EMPTY
  } else if stone == turn {
    CELL_OWN
  } else {
    CELL_OPP
  }
}

/// Eight neighbour cells around a vertex, 2 bits per slot.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct Pattern3x3(pub u16);

impl Pattern3x3 {
  pub fn from_cells(cells: &[u16; 8]) -> Pattern3x3 {
    let mut mask8 = 0;
    for (i, &c) in cells.iter().enumerate() {
      mask8 |= (c & 0x3) << (2 * i);
    }
    Pattern3x3(mask8)
  }

  pub fn to_invariant(self) -> InvariantPattern3x3 {
    let mut min_mask8: u16 = 0xffff;
    for t in 0 .. 8 {
      let mut mask8: u16 = 0;
      for i in 0 .. 8 {
        let x = (self.0 >> (2 * i)) & 0x3;
        let t_i = MASK_8_TRANS_MAPS[t][i];
        mask8 |= x << (2 * t_i);
      }
      min_mask8 = min(min_mask8, mask8);
    }
    InvariantPattern3x3(min_mask8)
  }
}

/// Smallest code over the eight board symmetries.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct InvariantPattern3x3(u16);

impl InvariantPattern3x3 {
  pub fn idx(self) -> u32 {
    self.0 as u32
  }
}
