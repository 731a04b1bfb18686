extern crate rand;
extern crate watson;

use watson::board::{Stone, Vertex};
use watson::capture::{CaptureBoard};
use watson::engine::{BoardEngine};
use watson::hash::{HashTable};
use watson::random::{XorShift128PlusRng};

use rand::{Rng, SeedableRng};

fn stones(board: &CaptureBoard) -> Vec<Stone> {
  (0 .. board.num_points()).map(|p| board.stone(Vertex::from_idx(p))).collect()
}

#[test]
fn test_incremental_matches_recompute() {
  let mut rng = XorShift128PlusRng::seed_from_u64(31);
  let mut board = CaptureBoard::new(7, 6.5).unwrap();
  assert_eq!(board.position_hash(), board.hash_table().empty_position());
  let mut color = Stone::Black;
  for _ in 0 .. 300 {
    if board.winner().is_some() {
      break;
    }
    let legal: Vec<Vertex> = (0 .. board.num_points())
      .map(Vertex::from_idx)
      .filter(|&v| board.legal(color, v))
      .collect();
    let v = if legal.is_empty() { Vertex::PASS } else { legal[rng.gen_range(0 .. legal.len())] };
    board.play(color, v);
    assert_eq!(board.position_hash(), board.hash_table().position(&stones(&board)));
    color = color.opponent();
  }
}

#[test]
fn test_tables_deterministic() {
  let a = HashTable::new(81);
  let b = HashTable::new(81);
  assert_eq!(a.empty_position(), b.empty_position());
  let mut position = vec![Stone::Empty; 81];
  position[40] = Stone::Black;
  position[3] = Stone::White;
  assert_eq!(a.position(&position), b.position(&position));

  let h = a.empty_position()
    .update(&a, Stone::Empty, Stone::Black, 40)
    .update(&a, Stone::Empty, Stone::White, 3);
  assert_eq!(h, a.position(&position));

  let c = HashTable::new(49);
  assert_ne!(a.empty_position(), c.empty_position());
}

#[test]
fn test_same_position_same_hash_across_boards() {
  let mut x = CaptureBoard::new(9, 6.5).unwrap();
  let mut y = CaptureBoard::new(9, 7.5).unwrap();
  x.play(Stone::Black, Vertex::from_idx(10));
  x.play(Stone::White, Vertex::from_idx(20));
  y.play(Stone::White, Vertex::from_idx(20));
  y.play(Stone::Black, Vertex::from_idx(10));
  assert_eq!(x.position_hash(), y.position_hash());
}
