use crate::board::{MAX_LABEL_COLUMNS, Stone, Vertex, dump_xcoord};
use crate::discrete::{WeightedSampler};
use crate::engine::{BoardEngine, IllegalReason, MoveResult};
use crate::error::{BoardError};
use crate::pattern::{CELL_EDGE, cell_code};
use crate::policy::{MoveWeights, INIT_WEIGHT, adjusted_weight};

use bit_set::{BitSet};
use rand::{Rng};
use std::sync::{Arc};

pub const MIN_SIZE: usize = 1;
// Every column needs a letter label.
pub const MAX_SIZE: usize = MAX_LABEL_COLUMNS;

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Side {
  Up,
  Down,
  Left,
  Right,
}

impl Side {
  /// Union-find node of the side, past the board vertices.
  pub fn node(self, num_points: usize) -> usize {
    num_points + match self {
      Side::Up    => 0,
      Side::Down  => 1,
      Side::Left  => 2,
      Side::Right => 3,
    }
  }

  /// The two sides `color` has to join.
  pub fn goal(color: Stone) -> (Side, Side) {
    match color {
      Stone::Black => (Side::Up, Side::Down),
      Stone::White => (Side::Left, Side::Right),
      Stone::Empty => unreachable!(),
    }
  }
}

/// Hex neighbours on the rhombus in row-major order, as
/// (left, upper-left, upper-right, right, lower-right, lower-left).
pub fn hex_neighbors(size: usize, p: usize) -> [Option<usize>; 6] {
  let (x, y) = (p % size, p / size);
  let upper = size - 1;
  [
    if x >= 1 { Some(p - 1) } else { None },
    if y >= 1 { Some(p - size) } else { None },
    if y >= 1 && x < upper { Some(p - size + 1) } else { None },
    if x < upper { Some(p + 1) } else { None },
    if y < upper { Some(p + size) } else { None },
    if y < upper && x >= 1 { Some(p + size - 1) } else { None },
  ]
}

/// Sides touched by the vertex, in `Side` order.
fn touching_sides(size: usize, p: usize) -> [bool; 4] {
  let (x, y) = (p % size, p / size);
  [y == 0, y == size - 1, x == 0, x == size - 1]
}

/// Hex board. Stones are union-find sets together with the four sides, so a
/// win is a single root comparison.
#[derive(Clone)]
pub struct ConnectionBoard {
  size:         usize,
  num_points:   usize,
  stones:       Vec<Stone>,
  parent:       Vec<u16>,
  rank:         Vec<u16>,
  winner:       Option<Stone>,
  played:       [BitSet; 2],
  moves:        Vec<Vertex>,
  sampler:      WeightedSampler,
  move_weights: Option<Arc<dyn MoveWeights>>,
}

impl ConnectionBoard {
  pub fn new(size: usize) -> Result<ConnectionBoard, BoardError> {
    if size < MIN_SIZE || size > MAX_SIZE {
      return Err(BoardError::UnsupportedSize{size: size, min: MIN_SIZE, max: MAX_SIZE});
    }
    let n = size * size;
    let mut sampler = WeightedSampler::new(n);
    sampler.fill(Stone::Black, INIT_WEIGHT);
    sampler.fill(Stone::White, INIT_WEIGHT);
    Ok(ConnectionBoard{
      size:         size,
      num_points:   n,
      stones:       vec![Stone::Empty; n],
      parent:       (0 .. (n + 4) as u16).collect(),
      rank:         vec![0; n + 4],
      winner:       None,
      played:       [BitSet::with_capacity(n), BitSet::with_capacity(n)],
      moves:        Vec::new(),
      sampler:      sampler,
      move_weights: None,
    })
  }

  pub fn with_move_weights(mut self, move_weights: Arc<dyn MoveWeights>) -> ConnectionBoard {
    self.move_weights = Some(move_weights);
    for p in 0 .. self.num_points {
      self.refresh_weight(p);
    }
    self
  }

  pub fn sampler(&self) -> &WeightedSampler {
    &self.sampler
  }

  fn find(&mut self, p: usize) -> usize {
    let mut root = p;
    while self.parent[root] as usize != root {
      root = self.parent[root] as usize;
    }
    let mut q = p;
    while self.parent[q] as usize != root {
      let up = self.parent[q] as usize;
      self.parent[q] = root as u16;
      q = up;
    }
    root
  }

  fn find_root(&self, p: usize) -> usize {
    let mut root = p;
    while self.parent[root] as usize != root {
      root = self.parent[root] as usize;
    }
    root
  }

  fn union(&mut self, a: usize, b: usize) {
    let (a, b) = (self.find(a), self.find(b));
    if a == b {
      return;
    }
    if self.rank[a] < self.rank[b] {
      self.parent[a] = b as u16;
    } else if self.rank[a] > self.rank[b] {
      self.parent[b] = a as u16;
    } else {
      self.parent[b] = a as u16;
      self.rank[a] += 1;
    }
  }

  /// Whether the vertex belongs to a group touching `side`.
  pub fn connected_to(&self, vertex: Vertex, side: Side) -> bool {
    if vertex.is_pass() || self.stones[vertex.idx()] == Stone::Empty {
      return false;
    }
    self.find_root(vertex.idx()) == self.find_root(side.node(self.num_points))
  }

  /// Neighbour code, 2 bits per direction, from `turn`'s perspective.
  pub fn fingerprint(&self, turn: Stone, p: usize) -> u32 {
    let mut code = 0;
    for (i, q) in hex_neighbors(self.size, p).iter().enumerate() {
      let cell = match *q {
        Some(q) => cell_code(turn, self.stones[q]),
        None => CELL_EDGE,
      };
      code |= (cell as u32) << (2 * i);
    }
    code
  }

  fn refresh_weight(&mut self, p: usize) {
    for &color in &[Stone::Black, Stone::White] {
      let weight = if self.stones[p] != Stone::Empty {
        0.0
      } else {
        match self.move_weights {
          Some(ref move_weights) => adjusted_weight(move_weights.weight(color, self.fingerprint(color, p))),
          None => INIT_WEIGHT,
        }
      };
      self.sampler.set(color, p, weight);
    }
  }
}

impl BoardEngine for ConnectionBoard {
  fn size(&self) -> usize {
    self.size
  }

  fn num_points(&self) -> usize {
    self.num_points
  }

  fn stone(&self, vertex: Vertex) -> Stone {
    if vertex.is_pass() {
      Stone::Empty
    } else {
      self.stones[vertex.idx()]
    }
  }

  fn play(&mut self, color: Stone, vertex: Vertex) {
    self.moves.push(vertex);
    if vertex.is_pass() {
      return;
    }
    let p = vertex.idx();
    self.stones[p] = color;
    for q in hex_neighbors(self.size, p).iter().filter_map(|&q| q) {
      if self.stones[q] == color {
        self.union(p, q);
      }
    }
    let (a, b) = Side::goal(color);
    let sides = touching_sides(self.size, p);
    for &side in &[a, b] {
      if sides[side as usize] {
        self.union(p, side.node(self.num_points));
      }
    }
    if self.winner.is_none()
        && self.find(a.node(self.num_points)) == self.find(b.node(self.num_points))
    {
      self.winner = Some(color);
    }

    self.refresh_weight(p);
    if self.move_weights.is_some() {
      for q in hex_neighbors(self.size, p).iter().filter_map(|&q| q) {
        if self.stones[q] == Stone::Empty {
          self.refresh_weight(q);
        }
      }
    }
    self.played[color.offset()].insert(p);
  }

  fn check_move(&self, _color: Stone, vertex: Vertex) -> MoveResult {
    if self.winner.is_some() {
      return Err(IllegalReason::GameOver);
    }
    if vertex.is_pass() {
      return Err(IllegalReason::NoPass);
    }
    if vertex.idx() >= self.num_points || self.stones[vertex.idx()] != Stone::Empty {
      return Err(IllegalReason::NotEmpty);
    }
    Ok(())
  }

  fn winner(&self) -> Option<Stone> {
    self.winner
  }

  fn decide(&self) -> Option<Stone> {
    self.winner
  }

  fn score(&self, _komi: f64) -> (f64, f64) {
    match self.winner {
      Some(Stone::Black) => (1.0, 0.0),
      Some(Stone::White) => (0.0, 1.0),
      _ => (0.0, 0.0),
    }
  }

  fn playout<R: Rng>(&mut self, color: Stone, rng: &mut R) -> Option<Stone> {
    let mut color = color;
    while self.winner.is_none() {
      let p = match self.sampler.draw(color, rng) {
        Some(p) => p,
        None => break,
      };
      trace!("playout: {} {}", color.code(), Vertex::from_idx(p).to_label(self.size));
      self.play(color, Vertex::from_idx(p));
      color = color.opponent();
    }
    self.winner
  }

  fn was_played(&self, color: Stone, vertex: Vertex) -> bool {
    if vertex.is_pass() || color == Stone::Empty {
      return false;
    }
    self.played[color.offset()].contains(vertex.idx())
  }

  fn territory(&self, color: Stone) -> Vec<f64> {
    self.stones.iter()
      .map(|&s| if s == color { 1.0 } else { 0.0 })
      .collect()
  }

  fn fork(&self) -> ConnectionBoard {
    let mut cp = self.clone();
    cp.played[0].clear();
    cp.played[1].clear();
    cp
  }

  fn moves(&self) -> &[Vertex] {
    &self.moves
  }

  fn to_debug_strings(&self) -> Vec<String> {
    let mut strs = vec![];
    let mut header = String::from("   ");
    for x in 0 .. self.size {
      header.push(dump_xcoord(x as u8));
      header.push(' ');
    }
    strs.push(header);
    for y in 0 .. self.size {
      let mut s = " ".repeat(y);
      s.push_str(&format!("{:>2} ", self.size - y));
      for x in 0 .. self.size {
        s.push(self.stones[y * self.size + x].to_char());
        s.push(' ');
      }
      strs.push(s);
    }
    strs.push(format!("winner: {:?}", self.winner));
    strs
  }
}
