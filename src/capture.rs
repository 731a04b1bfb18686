use crate::board::{Stone, Vertex, dump_xcoord};
use crate::discrete::{WeightedSampler};
use crate::engine::{BoardEngine, IllegalReason, MoveResult};
use crate::error::{BoardError};
use crate::hash::{HashTable, PositionHash};
use crate::pattern::{Pattern3x3, CELL_EDGE, cell_code};
use crate::policy::{MoveWeights, INIT_WEIGHT, adjusted_weight};

use bit_set::{BitSet};
use bit_vec::{BitVec};
use rand::{Rng};
use std::sync::{Arc};
use vec_map::{VecMap};

pub const MIN_SIZE: usize = 2;
// Liberty sets are packed into 128 bits.
pub const MAX_SIZE: usize = 11;

pub fn for_each_adjacent<F>(size: usize, p: usize, mut f: F) where F: FnMut(usize) {
  let (x, y) = (p % size, p / size);
  let upper = size - 1;
  if x >= 1 {
    f(p - 1);
  }
  if y >= 1 {
    f(p - size);
  }
  if x < upper {
    f(p + 1);
  }
  if y < upper {
    f(p + size);
  }
}

pub fn for_each_diagonal<F>(size: usize, p: usize, mut f: F) where F: FnMut(usize) {
  let (x, y) = (p % size, p / size);
  let upper = size - 1;
  if x >= 1 && y >= 1 {
    f(p - 1 - size);
  }
  if x < upper && y >= 1 {
    f(p + 1 - size);
  }
  if x < upper && y < upper {
    f(p + 1 + size);
  }
  if x >= 1 && y < upper {
    f(p - 1 + size);
  }
}

/// Visits the 3x3 neighbourhood in pattern slot order; off-board slots get
/// `None`.
pub fn for_each_x8<F>(size: usize, p: usize, mut f: F) where F: FnMut(u8, Option<usize>) {
  let (x, y) = ((p % size) as isize, (p / size) as isize);
  let s = size as isize;
  let mut slot = 0;
  for dy in -1 .. 2 {
    for dx in -1 .. 2 {
      if dx == 0 && dy == 0 {
        continue;
      }
      let (nx, ny) = (x + dx, y + dy);
      if nx >= 0 && nx < s && ny >= 0 && ny < s {
        f(slot, Some((ny * s + nx) as usize));
      } else {
        f(slot, None);
      }
      slot += 1;
    }
  }
}

/// Same as `for_each_adjacent` but collected, for callers that mutate the
/// board while walking the neighbours.
#[inline]
fn adjacent_points(size: usize, p: usize) -> ([usize; 4], usize) {
  let mut pts = [0; 4];
  let mut n = 0;
  for_each_adjacent(size, p, |q| {
    pts[n] = q;
    n += 1;
  });
  (pts, n)
}

/// Set of vertices packed into two words.
#[derive(Clone, Copy, Default, Eq, PartialEq, Debug)]
pub struct Liberties([u64; 2]);

impl Liberties {
  #[inline]
  pub fn insert(&mut self, p: usize) {
    self.0[p >> 6] |= 1 << (p & 63);
  }

  #[inline]
  pub fn remove(&mut self, p: usize) {
    self.0[p >> 6] &= !(1 << (p & 63));
  }

  #[inline]
  pub fn contains(&self, p: usize) -> bool {
    (self.0[p >> 6] >> (p & 63)) & 1 != 0
  }

  #[inline]
  pub fn union_with(&mut self, other: &Liberties) {
    self.0[0] |= other.0[0];
    self.0[1] |= other.0[1];
  }

  #[inline]
  pub fn count(&self) -> usize {
    (self.0[0].count_ones() + self.0[1].count_ones()) as usize
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.0[0] == 0 && self.0[1] == 0
  }

  pub fn first(&self) -> Option<usize> {
    if self.0[0] != 0 {
      Some(self.0[0].trailing_zeros() as usize)
    } else if self.0[1] != 0 {
      Some(64 + self.0[1].trailing_zeros() as usize)
    } else {
      None
    }
  }

  pub fn to_vec(&self) -> Vec<usize> {
    (0 .. 128).filter(|&p| self.contains(p)).collect()
  }
}

/// Go board. Chains are union-find sets over vertices; only a chain root's
/// liberty set is valid.
#[derive(Clone)]
pub struct CaptureBoard {
  size:         usize,
  num_points:   usize,
  komi:         f64,

  stones:       Vec<Stone>,
  num_stones:   [usize; 2],
  parent:       Vec<u16>,
  rank:         Vec<u16>,
  // Circular list of the stones of each chain.
  next:         Vec<u16>,
  libs:         Vec<Liberties>,
  // Chain root -> last liberty, per color.
  atari:        [VecMap<usize>; 2],

  ko:           Option<(Stone, usize)>,
  passes:       usize,
  closed:       bool,
  final_winner: Option<Stone>,
  played:       [BitSet; 2],
  moves:        Vec<Vertex>,

  table:        Arc<HashTable>,
  hash:         PositionHash,
  history:      Arc<Vec<PositionHash>>,
  track_history: bool,

  sampler:      WeightedSampler,
  move_weights: Option<Arc<dyn MoveWeights>>,
}

impl CaptureBoard {
  pub fn new(size: usize, komi: f64) -> Result<CaptureBoard, BoardError> {
    if size < MIN_SIZE || size > MAX_SIZE {
      return Err(BoardError::UnsupportedSize{size: size, min: MIN_SIZE, max: MAX_SIZE});
    }
    let n = size * size;
    let table = Arc::new(HashTable::new(n));
    let hash = table.empty_position();
    let mut sampler = WeightedSampler::new(n);
    sampler.fill(Stone::Black, INIT_WEIGHT);
    sampler.fill(Stone::White, INIT_WEIGHT);
    Ok(CaptureBoard{
      size:         size,
      num_points:   n,
      komi:         komi,
      stones:       vec![Stone::Empty; n],
      num_stones:   [0, 0],
      parent:       (0 .. n as u16).collect(),
      rank:         vec![1; n],
      next:         (0 .. n as u16).collect(),
      libs:         vec![Liberties::default(); n],
      atari:        [VecMap::new(), VecMap::new()],
      ko:           None,
      passes:       0,
      closed:       false,
      final_winner: None,
      played:       [BitSet::with_capacity(n), BitSet::with_capacity(n)],
      moves:        Vec::new(),
      table:        table,
      hash:         hash,
      history:      Arc::new(vec![hash]),
      track_history: true,
      sampler:      sampler,
      move_weights: None,
    })
  }

  pub fn with_move_weights(mut self, move_weights: Arc<dyn MoveWeights>) -> CaptureBoard {
    self.move_weights = Some(move_weights);
    for p in 0 .. self.num_points {
      self.refresh_weight(p);
    }
    self
  }

  pub fn komi(&self) -> f64 {
    self.komi
  }

  pub fn set_komi(&mut self, komi: f64) {
    self.komi = komi;
  }

  pub fn passes(&self) -> usize {
    self.passes
  }

  pub fn ko(&self) -> Option<(Stone, Vertex)> {
    self.ko.map(|(c, p)| (c, Vertex::from_idx(p)))
  }

  pub fn position_hash(&self) -> PositionHash {
    self.hash
  }

  pub fn history(&self) -> &[PositionHash] {
    &self.history
  }

  pub fn hash_table(&self) -> &HashTable {
    &self.table
  }

  pub fn set_history_tracking(&mut self, track: bool) {
    self.track_history = track;
  }

  pub fn num_stones(&self, color: Stone) -> usize {
    self.num_stones[color.offset()]
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

  /// Unites two chain roots by rank, returning the surviving root.
  fn union(&mut self, a: usize, b: usize) -> usize {
    debug_assert!(a != b);
    let (root, child) = if self.rank[a] > self.rank[b] { (a, b) } else { (b, a) };
    self.parent[child] = root as u16;
    self.rank[root] += self.rank[child];
    self.next.swap(root, child);
    let child_libs = self.libs[child];
    self.libs[root].union_with(&child_libs);
    root
  }

  pub fn stone_at(&self, p: usize) -> Stone {
    self.stones[p]
  }

  pub fn chain_root(&self, vertex: Vertex) -> Option<Vertex> {
    if vertex.is_pass() || self.stones[vertex.idx()] == Stone::Empty {
      return None;
    }
    Some(Vertex::from_idx(self.find_root(vertex.idx())))
  }

  pub fn chain_liberties(&self, vertex: Vertex) -> Option<Liberties> {
    self.chain_root(vertex).map(|r| self.libs[r.idx()])
  }

  pub fn liberty_count(&self, vertex: Vertex) -> usize {
    self.chain_liberties(vertex).map_or(0, |l| l.count())
  }

  pub fn chain_stones(&self, vertex: Vertex) -> Vec<Vertex> {
    let mut stones = vec![];
    if let Some(root) = self.chain_root(vertex) {
      let root = root.idx();
      let mut q = root;
      loop {
        stones.push(Vertex::from_idx(q));
        q = self.next[q] as usize;
        if q == root {
          break;
        }
      }
    }
    stones
  }

  /// Chains of `color` in atari, as (root, last liberty).
  pub fn atari_chains(&self, color: Stone) -> Vec<(Vertex, Vertex)> {
    self.atari[color.offset()].iter()
      .map(|(r, &l)| (Vertex::from_idx(r), Vertex::from_idx(l)))
      .collect()
  }

  fn refresh_atari(&mut self, root: usize) {
    let color = self.stones[root];
    if color == Stone::Empty {
      return;
    }
    let libs = self.libs[root];
    if libs.count() == 1 {
      if let Some(last) = libs.first() {
        self.atari[color.offset()].insert(root, last);
      }
    } else {
      self.atari[color.offset()].remove(root);
    }
  }

  fn capture_chain(&mut self, root: usize, captured: &mut Vec<usize>) {
    let color = self.stones[root];
    let start = captured.len();
    let mut q = root;
    loop {
      captured.push(q);
      q = self.next[q] as usize;
      if q == root {
        break;
      }
    }
    for i in start .. captured.len() {
      let c = captured[i];
      self.stones[c] = Stone::Empty;
      self.hash = self.hash.update(&self.table, color, Stone::Empty, c);
      self.parent[c] = c as u16;
      self.rank[c] = 1;
      self.next[c] = c as u16;
      self.libs[c] = Liberties::default();
    }
    self.num_stones[color.offset()] -= captured.len() - start;
    for i in start .. captured.len() {
      let c = captured[i];
      let (adj, n) = adjacent_points(self.size, c);
      for &q in &adj[.. n] {
        if self.stones[q] != Stone::Empty {
          let r = self.find(q);
          self.libs[r].insert(c);
        }
      }
    }
  }

  fn pattern_at(&self, turn: Stone, p: usize) -> Pattern3x3 {
    let mut cells = [CELL_EDGE; 8];
    for_each_x8(self.size, p, |slot, q| {
      cells[slot as usize] = match q {
        Some(q) => cell_code(turn, self.stones[q]),
        None => CELL_EDGE,
      };
    });
    Pattern3x3::from_cells(&cells)
  }

  /// Symmetry-invariant 3x3 code around `p` from `turn`'s perspective, the
  /// key passed to `MoveWeights`.
  pub fn fingerprint(&self, turn: Stone, p: usize) -> u32 {
    self.pattern_at(turn, p).to_invariant().idx()
  }

  fn refresh_weight(&mut self, p: usize) {
    if self.stones[p] != Stone::Empty {
      self.sampler.set(Stone::Black, p, 0.0);
      self.sampler.set(Stone::White, p, 0.0);
      return;
    }
    for &color in &[Stone::Black, Stone::White] {
      let weight = match self.move_weights {
        Some(ref move_weights) => {
          adjusted_weight(move_weights.weight(color, self.fingerprint(color, p)))
        }
        None => INIT_WEIGHT,
      };
      self.sampler.set(color, p, weight);
    }
  }

  fn refresh_weights_around(&mut self, p: usize) {
    let mut around = [None; 8];
    for_each_x8(self.size, p, |slot, q| {
      around[slot as usize] = q;
    });
    for q in around.iter().filter_map(|&q| q) {
      if self.stones[q] == Stone::Empty {
        self.refresh_weight(q);
      }
    }
  }

  /// A point surrounded by own healthy chains, with at most one hostile
  /// diagonal (none on the edge). Playouts never fill these.
  pub fn is_eyelike(&self, color: Stone, p: usize) -> bool {
    if self.stones[p] != Stone::Empty {
      return false;
    }
    let mut eyeish = true;
    for_each_adjacent(self.size, p, |q| {
      if self.stones[q] != color || self.libs[self.find_root(q)].count() <= 1 {
        eyeish = false;
      }
    });
    if !eyeish {
      return false;
    }
    let opp = color.opponent();
    let mut false_count = if Vertex::from_idx(p).is_edge(self.size) { 1 } else { 0 };
    for_each_diagonal(self.size, p, |q| {
      if self.stones[q] == opp {
        false_count += 1;
      }
    });
    false_count < 2
  }

  /// Hash of the position after `color` plays at `p`, including captures.
  fn hash_after(&self, color: Stone, p: usize) -> PositionHash {
    let opp = color.opponent();
    let mut h = self.hash.update(&self.table, Stone::Empty, color, p);
    let mut seen = [usize::max_value(); 4];
    let mut num_seen = 0;
    let (adj, n) = adjacent_points(self.size, p);
    for &q in &adj[.. n] {
      if self.stones[q] != opp {
        continue;
      }
      let r = self.find_root(q);
      if seen[.. num_seen].contains(&r) || self.libs[r].count() != 1 {
        continue;
      }
      seen[num_seen] = r;
      num_seen += 1;
      let mut s = r;
      loop {
        h = h.update(&self.table, opp, Stone::Empty, s);
        s = self.next[s] as usize;
        if s == r {
          break;
        }
      }
    }
    h
  }

  fn is_over(&self) -> bool {
    self.closed || self.passes >= 2
  }

  /// Owner of every point under area scoring: stones, plus empty regions
  /// that touch only one color.
  pub fn area_owners(&self) -> Vec<Stone> {
    let mut owners = self.stones.clone();
    let mut seen = BitVec::from_elem(self.num_points, false);
    let mut region = vec![];
    let mut stack = vec![];
    for start in 0 .. self.num_points {
      if self.stones[start] != Stone::Empty || seen[start] {
        continue;
      }
      region.clear();
      let mut borders = [false, false];
      seen.set(start, true);
      stack.push(start);
      while let Some(p) = stack.pop() {
        region.push(p);
        for_each_adjacent(self.size, p, |q| {
          match self.stones[q] {
            Stone::Empty => {
              if !seen[q] {
                seen.set(q, true);
                stack.push(q);
              }
            }
            stone => borders[stone.offset()] = true,
          }
        });
      }
      let owner = match borders {
        [true, false] => Stone::Black,
        [false, true] => Stone::White,
        _ => Stone::Empty,
      };
      for &p in region.iter() {
        owners[p] = owner;
      }
    }
    owners
  }

  fn heuristic_move<R: Rng>(&self, color: Stone, rng: &mut R) -> Option<Vertex> {
    let saves: Vec<usize> = self.atari[color.offset()].values()
      .cloned()
      .filter(|&p| self.sampler.get(color, p) > 0.0 && self.legal(color, Vertex::from_idx(p)))
      .collect();
    if !saves.is_empty() {
      return Some(Vertex::from_idx(saves[rng.gen_range(0 .. saves.len())]));
    }
    let captures: Vec<usize> = self.atari[color.opponent().offset()].values()
      .cloned()
      .filter(|&p| self.legal(color, Vertex::from_idx(p)))
      .collect();
    if !captures.is_empty() {
      return Some(Vertex::from_idx(captures[rng.gen_range(0 .. captures.len())]));
    }
    None
  }

  fn random_move<R: Rng>(&mut self, color: Stone, rng: &mut R) -> Vertex {
    if let Some(v) = self.heuristic_move(color, rng) {
      return v;
    }
    let mut rejected = vec![];
    let choice = loop {
      match self.sampler.draw(color, rng) {
        None => break Vertex::PASS,
        Some(p) => {
          let v = Vertex::from_idx(p);
          if self.check_move(color, v).is_ok() && !self.is_eyelike(color, p) {
            break v;
          }
          rejected.push((p, self.sampler.get(color, p)));
          self.sampler.set(color, p, 0.0);
        }
      }
    };
    for &(p, w) in rejected.iter() {
      self.sampler.set(color, p, w);
    }
    choice
  }

  /// Ends the game by scoring the current position.
  pub fn close(&mut self) {
    self.closed = true;
    self.final_winner = self.decide();
  }
}

impl BoardEngine for CaptureBoard {
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
    self.ko = None;
    if vertex.is_pass() {
      self.passes += 1;
      if self.passes >= 2 {
        self.final_winner = self.decide();
      }
      return;
    }
    self.passes = 0;
    self.final_winner = None;

    let p = vertex.idx();
    let opp = color.opponent();

    // Place the stone as a singleton chain.
    self.stones[p] = color;
    self.num_stones[color.offset()] += 1;
    self.hash = self.hash.update(&self.table, Stone::Empty, color, p);
    self.parent[p] = p as u16;
    self.rank[p] = 1;
    self.next[p] = p as u16;
    let mut libs = Liberties::default();
    for_each_adjacent(self.size, p, |q| {
      if self.stones[q] == Stone::Empty {
        libs.insert(q);
      }
    });
    self.libs[p] = libs;

    // Merge friendly chains; take the liberty from enemy chains.
    let (adj, n) = adjacent_points(self.size, p);
    let mut root = p;
    for &q in &adj[.. n] {
      let adj_stone = self.stones[q];
      if adj_stone == color {
        let r = self.find(q);
        if r != root {
          self.atari[color.offset()].remove(r);
          self.atari[color.offset()].remove(root);
          root = self.union(root, r);
        }
      } else if adj_stone == opp {
        let r = self.find(q);
        self.libs[r].remove(p);
      }
    }
    self.libs[root].remove(p);

    // Capture enemy chains left without liberties.
    let mut captured = vec![];
    for &q in &adj[.. n] {
      if self.stones[q] == opp {
        let r = self.find(q);
        if self.libs[r].is_empty() {
          self.atari[opp.offset()].remove(r);
          self.capture_chain(r, &mut captured);
        }
      }
    }
    let root = self.find(root);

    if captured.len() == 1 && self.rank[root] == 1 && self.libs[root].count() == 1 {
      self.ko = Some((opp, captured[0]));
    }

    // Atari bookkeeping for every chain whose liberties changed.
    self.refresh_atari(root);
    for &q in &adj[.. n] {
      if self.stones[q] != Stone::Empty {
        let r = self.find(q);
        self.refresh_atari(r);
      }
    }
    for i in 0 .. captured.len() {
      let (cadj, cn) = adjacent_points(self.size, captured[i]);
      for &q in &cadj[.. cn] {
        if self.stones[q] != Stone::Empty {
          let r = self.find(q);
          self.refresh_atari(r);
        }
      }
    }

    self.refresh_weight(p);
    for &c in captured.iter() {
      self.refresh_weight(c);
    }
    if self.move_weights.is_some() {
      self.refresh_weights_around(p);
      for &c in captured.iter() {
        self.refresh_weights_around(c);
      }
    }

    if !self.played[0].contains(p) && !self.played[1].contains(p) {
      self.played[color.offset()].insert(p);
    }

    if self.track_history {
      Arc::make_mut(&mut self.history).push(self.hash);
    }
  }

  fn check_move(&self, color: Stone, vertex: Vertex) -> MoveResult {
    if self.is_over() {
      return Err(IllegalReason::GameOver);
    }
    if vertex.is_pass() {
      return Ok(());
    }
    let p = vertex.idx();
    if p >= self.num_points || self.stones[p] != Stone::Empty {
      return Err(IllegalReason::NotEmpty);
    }
    if self.ko == Some((color, p)) {
      return Err(IllegalReason::Ko);
    }

    let mut breathes = false;
    for_each_adjacent(self.size, p, |q| {
      let adj_stone = self.stones[q];
      if adj_stone == Stone::Empty {
        breathes = true;
      } else {
        let libs = self.libs[self.find_root(q)].count();
        if (adj_stone == color && libs > 1) || (adj_stone != color && libs == 1) {
          breathes = true;
        }
      }
    });
    if !breathes {
      return Err(IllegalReason::Suicide);
    }

    if self.track_history {
      let h = self.hash_after(color, p);
      if self.history.contains(&h) {
        return Err(IllegalReason::Superko);
      }
    }
    Ok(())
  }

  fn winner(&self) -> Option<Stone> {
    if self.is_over() {
      self.final_winner
    } else {
      None
    }
  }

  fn decide(&self) -> Option<Stone> {
    let (b, w) = self.score(self.komi);
    if b > w {
      Some(Stone::Black)
    } else {
      Some(Stone::White)
    }
  }

  fn score(&self, komi: f64) -> (f64, f64) {
    let mut counts = [0.0, 0.0];
    for owner in self.area_owners() {
      if owner != Stone::Empty {
        counts[owner.offset()] += 1.0;
      }
    }
    (counts[0], counts[1] + komi)
  }

  fn playout<R: Rng>(&mut self, color: Stone, rng: &mut R) -> Option<Stone> {
    let track = self.track_history;
    self.track_history = false;
    let limit = 3 * self.num_points;
    let mut color = color;
    let mut num_moves = 0;
    while !self.is_over() {
      if num_moves >= limit {
        self.close();
        break;
      }
      let vertex = self.random_move(color, rng);
      trace!("playout: {} {}", color.code(), vertex.to_label(self.size));
      self.play(color, vertex);
      color = color.opponent();
      num_moves += 1;
    }
    self.track_history = track;
    self.winner()
  }

  fn was_played(&self, color: Stone, vertex: Vertex) -> bool {
    if vertex.is_pass() || color == Stone::Empty {
      return false;
    }
    self.played[color.offset()].contains(vertex.idx())
  }

  fn territory(&self, color: Stone) -> Vec<f64> {
    self.area_owners().into_iter()
      .map(|owner| if owner == color { 1.0 } else { 0.0 })
      .collect()
  }

  fn fork(&self) -> CaptureBoard {
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
    strs.push(header.clone());
    for y in 0 .. self.size {
      let row = self.size - y;
      let mut s = format!("{:>2} ", row);
      for x in 0 .. self.size {
        s.push(self.stones[y * self.size + x].to_char());
        s.push(' ');
      }
      s.push_str(&format!("{}", row));
      strs.push(s);
    }
    strs.push(header);
    strs.push(format!("stones: {}/{}   ko: {:?}   passes: {}   hash: {:08x}",
        self.num_stones[0], self.num_stones[1],
        self.ko.map(|(c, p)| (c, Vertex::from_idx(p).to_label(self.size))),
        self.passes, self.hash.0,
    ));
    strs
  }
}
