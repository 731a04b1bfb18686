use crate::array_util::{array_argmax, array_argmax2};
use crate::board::{Action, Stone, Vertex};
use crate::config::{Budget, SearchConfig};
use crate::engine::{BoardEngine};
use crate::policy::{Evaluator};
use crate::random::{XorShift128PlusRng};
use crate::util::{nan_to_zero};

use rand::{Rng, SeedableRng, thread_rng};
use std::f64;
use std::fmt::{Write};
use std::mem;
use std::sync::{Arc};
use std::time::{Duration, Instant};

pub mod parallel;

// Root visits required before the cutoff rule may stop a search.
const CUTOFF_MIN_VISITS: f64 = 1000.0;

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug)]
pub struct Node {
  pub color:            Stone,
  pub vertex:           Vertex,
  pub parent:           Option<NodeId>,
  pub first_child:      Option<NodeId>,
  pub last_child:       Option<NodeId>,
  pub next_sibling:     Option<NodeId>,

  pub wins:             f64,
  pub visits:           f64,
  pub mean:             f64,
  pub amaf_wins:        f64,
  pub amaf_visits:      f64,
  pub amaf_mean:        f64,
  pub ancestor_wins:    f64,
  pub ancestor_visits:  f64,
  pub ancestor_mean:    f64,
  pub eval_wins:        f64,
  pub eval_visits:      f64,
  pub eval_mean:        f64,
  pub blended_mean:     f64,
  pub value:            f64,
  pub virtual_visits:   f64,

  pub terminal:         bool,
  pub seeds:            usize,
  pub total_seeds:      usize,

  provisional:          f64,
}

impl Node {
  fn new(parent: Option<NodeId>, color: Stone, vertex: Vertex, provisional: f64) -> Node {
    Node{
      color:            color,
      vertex:           vertex,
      parent:           parent,
      first_child:      None,
      last_child:       None,
      next_sibling:     None,
      wins:             0.0,
      visits:           0.0,
      mean:             0.0,
      amaf_wins:        0.0,
      amaf_visits:      0.0,
      amaf_mean:        0.0,
      ancestor_wins:    0.0,
      ancestor_visits:  0.0,
      ancestor_mean:    0.0,
      eval_wins:        0.0,
      eval_visits:      0.0,
      eval_mean:        0.0,
      blended_mean:     0.0,
      value:            provisional,
      virtual_visits:   0.0,
      terminal:         false,
      seeds:            0,
      total_seeds:      0,
      provisional:      provisional,
    }
  }

  pub fn is_terminal(&self) -> bool {
    self.terminal
  }

  /// Recomputes the blended mean and the selection value. `siblings` are the
  /// summed (wins, visits) over all live children of the parent, this node
  /// included.
  fn recalc(&mut self, cfg: &SearchConfig, parent_visits: f64, siblings: (f64, f64)) {
    if self.terminal {
      self.mean = if self.wins > 0.0 { 1.0 } else { 0.0 };
      self.blended_mean = self.mean;
      self.value = self.mean;
      return;
    }
    // Virtual visits count as losses.
    let visits = self.visits + self.virtual_visits;
    self.mean = nan_to_zero(self.wins / visits);
    self.amaf_mean = nan_to_zero(self.amaf_wins / self.amaf_visits);
    self.ancestor_mean = nan_to_zero(self.ancestor_wins / self.ancestor_visits);
    self.eval_mean = nan_to_zero(self.eval_wins / self.eval_visits);

    let mut estimate = 0.0;
    let mut samples = 0.0;
    if cfg.amaf {
      estimate += self.amaf_mean;
      samples += 1.0;
    }
    if cfg.neighbors {
      let neighbor_wins = siblings.0 - self.wins;
      let neighbor_visits = siblings.1 - self.visits;
      estimate += nan_to_zero(neighbor_wins / neighbor_visits);
      samples += 1.0;
    }
    if cfg.ancestor {
      estimate += self.ancestor_mean;
      samples += 1.0;
    }
    if cfg.eval {
      estimate += self.eval_mean;
      samples += 1.0;
    }
    self.blended_mean = if samples > 0.0 {
      let k = cfg.rave_equiv;
      let beta = nan_to_zero((k / (3.0 * visits + k)).sqrt());
      let estimate = nan_to_zero(estimate / samples);
      beta * estimate + (1.0 - beta) * self.mean
    } else {
      self.mean
    };

    if visits == 0.0 {
      self.value = self.provisional;
      return;
    }
    let b = self.blended_mean;
    let r = parent_visits.ln_1p() / visits;
    let v = if cfg.variance {
      (b - b * b + (2.0 * r).sqrt()).min(0.25)
    } else {
      1.0
    };
    self.value = b + cfg.explore * nan_to_zero((r * v).sqrt());
  }
}

pub struct Children<'a> {
  nodes:  &'a [Node],
  next:   Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
  type Item = NodeId;

  fn next(&mut self) -> Option<NodeId> {
    let id = self.next?;
    self.next = self.nodes[id.0].next_sibling;
    Some(id)
  }
}

/// The path of one simulation, from the first move below the root down to
/// the leaf.
#[derive(Clone, Debug)]
pub struct Trajectory {
  pub path:     Vec<NodeId>,
  /// Whether a rollout runs from the leaf.
  pub rollout:  bool,
  /// Color moving first in the rollout.
  pub first:    Stone,
}

impl Trajectory {
  pub fn new() -> Trajectory {
    Trajectory{
      path:     Vec::with_capacity(64),
      rollout:  false,
      first:    Stone::Black,
    }
  }

  pub fn reset(&mut self, first: Stone) {
    self.path.clear();
    self.rollout = false;
    self.first = first;
  }
}

#[derive(Clone, Copy, Debug)]
pub struct SearchResult {
  pub turn:           Stone,
  pub action:         Action,
  pub visits:         f64,
  pub win_rate:       f64,
  pub root_visits:    f64,
  pub root_win_rate:  f64,
}

#[derive(Clone, Copy, Default, Debug)]
pub struct SearchStats {
  pub playouts:       usize,
  pub elapsed_ms:     usize,
  pub argmax_rank:    Option<usize>,
  pub argmax_visits:  f64,
  pub max_depth:      usize,
  pub num_nodes:      usize,
  pub avg_walk_ns:    u64,
  pub avg_rollout_ns: u64,
  pub avg_backup_ns:  u64,
}

/// Accumulated wall time per simulation phase.
#[derive(Clone, Copy, Default, Debug)]
pub struct PhaseTimings {
  pub walk:     Duration,
  pub rollout:  Duration,
  pub backup:   Duration,
  pub count:    u32,
}

impl PhaseTimings {
  pub fn add(&mut self, other: &PhaseTimings) {
    self.walk += other.walk;
    self.rollout += other.rollout;
    self.backup += other.backup;
    self.count += other.count;
  }

  fn avg_ns(total: Duration, count: u32) -> u64 {
    if count == 0 {
      0
    } else {
      (total / count).as_nanos() as u64
    }
  }
}

pub struct SearchTree<B> where B: BoardEngine {
  cfg:        SearchConfig,
  nodes:      Vec<Node>,
  root:       NodeId,
  to_move:    Stone,
  evaluator:  Option<Arc<dyn Evaluator<B>>>,
  rng:        XorShift128PlusRng,
  territory:  Vec<f64>,
  timings:    PhaseTimings,
}

impl<B> SearchTree<B> where B: BoardEngine {
  /// Creates a tree for `to_move`. The root stands for the last move played,
  /// so its color is the opponent's.
  pub fn new(to_move: Stone, cfg: SearchConfig) -> SearchTree<B> {
    let rng = match cfg.rng_seed {
      Some(seed) => XorShift128PlusRng::seed_from_u64(seed),
      None => {
        let mut seed_rng = thread_rng();
        XorShift128PlusRng::from_u64_pair([seed_rng.gen(), seed_rng.gen()])
      }
    };
    SearchTree::with_root(to_move.opponent(), Vertex::PASS, cfg, rng)
  }

  fn with_root(color: Stone, vertex: Vertex, cfg: SearchConfig, rng: XorShift128PlusRng) -> SearchTree<B> {
    SearchTree{
      cfg:        cfg,
      nodes:      vec![Node::new(None, color, vertex, 0.0)],
      root:       NodeId(0),
      to_move:    color.opponent(),
      evaluator:  None,
      rng:        rng,
      territory:  vec![],
      timings:    PhaseTimings::default(),
    }
  }

  pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator<B>>) -> SearchTree<B> {
    self.evaluator = Some(evaluator);
    self
  }

  pub fn config(&self) -> &SearchConfig {
    &self.cfg
  }

  pub fn to_move(&self) -> Stone {
    self.to_move
  }

  pub fn root(&self) -> NodeId {
    self.root
  }

  pub fn node(&self, id: NodeId) -> &Node {
    &self.nodes[id.0]
  }

  pub fn children(&self, id: NodeId) -> Children {
    Children{
      nodes:  &self.nodes,
      next:   self.nodes[id.0].first_child,
    }
  }

  pub fn num_nodes(&self) -> usize {
    self.nodes.len()
  }

  /// Ownership accumulated for the player to move during the last search,
  /// one sum per vertex; divide by the root visits for a fraction.
  pub fn territory(&self) -> &[f64] {
    &self.territory
  }

  pub fn max_depth(&self) -> usize {
    let mut max_depth = 0;
    let mut stack = vec![(self.root, 0)];
    while let Some((id, depth)) = stack.pop() {
      if depth > max_depth {
        max_depth = depth;
      }
      for child in self.children(id) {
        stack.push((child, depth + 1));
      }
    }
    max_depth
  }

  /// Successful and attempted playout seedings, summed over the tree.
  pub fn seed_stats(&self) -> (usize, usize) {
    self.nodes.iter().fold((0, 0), |(s, t), n| (s + n.seeds, t + n.total_seeds))
  }

  fn push_child(&mut self, parent: NodeId, color: Stone, vertex: Vertex, provisional: f64) -> NodeId {
    let id = NodeId(self.nodes.len());
    self.nodes.push(Node::new(Some(parent), color, vertex, provisional));
    match self.nodes[parent.0].last_child {
      Some(last) => self.nodes[last.0].next_sibling = Some(id),
      None => self.nodes[parent.0].first_child = Some(id),
    }
    self.nodes[parent.0].last_child = Some(id);
    id
  }

  fn find_child(&self, parent: NodeId, color: Stone, vertex: Vertex) -> Option<NodeId> {
    self.children(parent).find(|&c| {
      let node = &self.nodes[c.0];
      node.color == color && node.vertex == vertex
    })
  }

  fn sibling_totals(&self, parent: NodeId) -> (f64, f64) {
    self.children(parent)
      .map(|c| &self.nodes[c.0])
      .filter(|n| !n.terminal)
      .fold((0.0, 0.0), |(w, v), n| (w + n.wins, v + n.visits))
  }

  fn recalc_with(&mut self, id: NodeId, siblings: (f64, f64)) {
    let parent_visits = match self.nodes[id.0].parent {
      Some(p) => self.nodes[p.0].visits + self.nodes[p.0].virtual_visits,
      None => 0.0,
    };
    self.nodes[id.0].recalc(&self.cfg, parent_visits, siblings);
  }

  pub fn recalc(&mut self, id: NodeId) {
    let siblings = match (self.cfg.neighbors, self.nodes[id.0].parent) {
      (true, Some(p)) => self.sibling_totals(p),
      _ => (0.0, 0.0),
    };
    self.recalc_with(id, siblings);
  }

  pub fn recalc_children(&mut self, parent: NodeId) {
    let siblings = if self.cfg.neighbors {
      self.sibling_totals(parent)
    } else {
      (0.0, 0.0)
    };
    let mut cursor = self.nodes[parent.0].first_child;
    while let Some(id) = cursor {
      self.recalc_with(id, siblings);
      cursor = self.nodes[id.0].next_sibling;
    }
  }

  /// Adds one child per legal move of the side to play, vertices in index
  /// order and then pass. A node without legal moves becomes terminal.
  fn expand<R: Rng>(&mut self, id: NodeId, board: &B, rng: &mut R) {
    let color = self.nodes[id.0].color.opponent();
    let mut moves: Vec<Vertex> = (0 .. board.num_points())
      .map(Vertex::from_idx)
      .filter(|&v| board.legal(color, v))
      .collect();
    if board.legal(color, Vertex::PASS) {
      moves.push(Vertex::PASS);
    }
    if moves.is_empty() {
      let won = board.decide() == Some(self.nodes[id.0].color);
      let node = &mut self.nodes[id.0];
      node.terminal = true;
      node.visits = f64::INFINITY;
      node.wins = if won { f64::INFINITY } else { 0.0 };
      self.recalc(id);
      return;
    }

    let grandparent = self.nodes[id.0].parent;
    let great_grandparent = grandparent.and_then(|g| self.nodes[g.0].parent);
    let evaluator = if self.cfg.eval { self.evaluator.clone() } else { None };
    let k = self.cfg.rave_equiv;
    for vertex in moves {
      let child = self.push_child(id, color, vertex, 1.0 + 0.1 * rng.gen::<f64>());
      if self.cfg.ancestor {
        self.seed_from_ancestors(child, grandparent, great_grandparent);
      }
      if let Some(ref evaluator) = evaluator {
        let mut cp = board.clone();
        cp.play(color, vertex);
        let p = evaluator.evaluate(color, &cp);
        let node = &mut self.nodes[child.0];
        node.eval_visits += k;
        node.eval_wins += k * p;
      }
    }
    self.recalc_children(id);
  }

  fn seed_from_ancestors(&mut self, child: NodeId, grandparent: Option<NodeId>, great_grandparent: Option<NodeId>) {
    let (color, vertex) = (self.nodes[child.0].color, self.nodes[child.0].vertex);
    let mut wins = 0.0;
    let mut visits = 0.0;
    // Same mover, two plies up.
    if let Some(ggp) = great_grandparent {
      if let Some(great_uncle) = self.find_child(ggp, color, vertex) {
        let n = &self.nodes[great_uncle.0];
        if !n.terminal {
          wins += n.wins + n.amaf_wins;
          visits += n.visits + n.amaf_visits;
        }
      }
    }
    // Opposite mover one ply up; flip its record to this child's side.
    if let Some(gp) = grandparent {
      if let Some(uncle) = self.find_child(gp, color.opponent(), vertex) {
        let n = &self.nodes[uncle.0];
        if !n.terminal {
          wins += n.visits - n.wins;
          visits += n.visits;
        }
      }
    }
    let node = &mut self.nodes[child.0];
    node.ancestor_wins += wins;
    node.ancestor_visits += visits;
  }

  /// Expands `id` if needed and picks the live child of highest value,
  /// the first one on ties.
  fn select<R: Rng>(&mut self, id: NodeId, board: &B, rng: &mut R) -> Option<NodeId> {
    if self.nodes[id.0].first_child.is_none() && !self.nodes[id.0].terminal {
      self.expand(id, board, rng);
    }
    let mut best: Option<NodeId> = None;
    for child in self.children(id) {
      let node = &self.nodes[child.0];
      if node.terminal {
        continue;
      }
      if best.map_or(true, |b| node.value > self.nodes[b.0].value) {
        best = Some(child);
      }
    }
    best
  }

  /// Selection, expansion and playout seeding. Plays the path on `board`.
  pub fn walk<R: Rng>(&mut self, board: &mut B, traj: &mut Trajectory, rng: &mut R) {
    traj.reset(self.to_move);
    let mut id = self.root;
    loop {
      let child = match self.select(id, board, rng) {
        Some(child) => child,
        None => break,
      };
      let (color, vertex) = (self.nodes[child.0].color, self.nodes[child.0].vertex);
      board.play(color, vertex);
      traj.path.push(child);
      traj.first = color.opponent();
      if self.nodes[child.0].visits <= self.cfg.expand_after {
        traj.rollout = true;
        break;
      }
      id = child;
    }
    if traj.rollout && self.cfg.seed_playouts {
      self.seed_playout(board, traj, rng);
    }
  }

  /// Biases the first rollout moves by the sibling distributions of the
  /// great-grandparent, grandparent and parent levels above the leaf.
  fn seed_playout<R: Rng>(&mut self, board: &mut B, traj: &mut Trajectory, rng: &mut R) {
    let leaf = match traj.path.last() {
      Some(&leaf) => leaf,
      None => return,
    };
    let parent = self.nodes[leaf.0].parent;
    let grandparent = parent.and_then(|p| self.nodes[p.0].parent);
    let great_grandparent = grandparent.and_then(|g| self.nodes[g.0].parent);
    let levels = match (great_grandparent, grandparent, parent) {
      (Some(ggp), Some(gp), Some(p)) => vec![ggp, gp, p],
      (_, _, Some(p)) => vec![p],
      _ => vec![],
    };
    let excluded: Vec<Vertex> = traj.path.iter().map(|&id| self.nodes[id.0].vertex).collect();
    for level in levels {
      if !self.seed_level(level, board, &excluded, rng) {
        break;
      }
      traj.first = traj.first.opponent();
    }
  }

  fn seed_level<R: Rng>(&mut self, level: NodeId, board: &mut B, excluded: &[Vertex], rng: &mut R) -> bool {
    let parent = match self.nodes[level.0].parent {
      Some(parent) => parent,
      None => return false,
    };
    let color = self.nodes[level.0].color;
    self.nodes[level.0].total_seeds += 1;
    let dist: Vec<(Vertex, f64)> = self.children(parent)
      .map(|c| &self.nodes[c.0])
      .filter(|n| !excluded.contains(&n.vertex))
      .map(|n| (n.vertex, n.blended_mean.max(0.0)))
      .collect();
    let sum: f64 = dist.iter().map(|&(_, w)| w).sum();
    if !(sum > 0.0) {
      return false;
    }
    let mut r = rng.gen::<f64>() * sum;
    let mut choice = None;
    for &(vertex, w) in dist.iter() {
      if w <= 0.0 {
        continue;
      }
      choice = Some(vertex);
      if r < w {
        break;
      }
      r -= w;
    }
    match choice {
      Some(vertex) if board.legal(color, vertex) => {
        board.play(color, vertex);
        self.nodes[level.0].seeds += 1;
        true
      }
      _ => false,
    }
  }

  /// Updates the path from leaf to root with the simulation's result.
  pub fn backup(&mut self, board: &B, traj: &Trajectory) {
    let winner = board.winner().or_else(|| board.decide());
    for &id in traj.path.iter().rev() {
      {
        let node = &mut self.nodes[id.0];
        if !node.terminal {
          node.visits += 1.0;
          if winner == Some(node.color) {
            node.wins += 1.0;
          }
        }
      }
      let parent = match self.nodes[id.0].parent {
        Some(parent) => parent,
        None => continue,
      };
      if self.cfg.amaf {
        let mut cursor = self.nodes[parent.0].first_child;
        while let Some(sibling) = cursor {
          let node = &mut self.nodes[sibling.0];
          if board.was_played(node.color, node.vertex) {
            node.amaf_visits += 1.0;
            if winner == Some(node.color) {
              node.amaf_wins += 1.0;
            }
          }
          cursor = node.next_sibling;
        }
        self.recalc_children(parent);
      } else if self.cfg.neighbors {
        self.recalc_children(parent);
      } else {
        self.recalc(id);
      }
    }

    let to_move = self.to_move;
    let root = &mut self.nodes[self.root.0];
    if !root.terminal {
      root.visits += 1.0;
      if winner == Some(to_move) {
        root.wins += 1.0;
      }
      root.mean = nan_to_zero(root.wins / root.visits);
    }

    let owned = board.territory(to_move);
    if self.territory.len() != owned.len() {
      self.territory = vec![0.0; owned.len()];
    }
    for (t, o) in self.territory.iter_mut().zip(owned.iter()) {
      *t += o;
    }
  }

  pub fn apply_virtual_loss(&mut self, traj: &Trajectory) {
    for &id in traj.path.iter() {
      self.nodes[id.0].virtual_visits += 1.0;
      self.recalc(id);
    }
  }

  pub fn revert_virtual_loss(&mut self, traj: &Trajectory) {
    for &id in traj.path.iter() {
      let node = &mut self.nodes[id.0];
      node.virtual_visits = (node.virtual_visits - 1.0).max(0.0);
      self.recalc(id);
    }
  }

  /// One simulation on `board`, which must be a fresh fork of the root
  /// position.
  pub fn step<R: Rng>(&mut self, board: &mut B, traj: &mut Trajectory, rng: &mut R) {
    let walk_start = Instant::now();
    self.walk(board, traj, rng);
    let rollout_start = Instant::now();
    if traj.rollout {
      board.playout(traj.first, rng);
    }
    let backup_start = Instant::now();
    self.backup(board, traj);
    let backup_end = Instant::now();
    self.timings.add(&PhaseTimings{
      walk:     rollout_start - walk_start,
      rollout:  backup_start - rollout_start,
      backup:   backup_end - backup_start,
      count:    1,
    });
  }

  pub fn add_timings(&mut self, timings: &PhaseTimings) {
    self.timings.add(timings);
  }

  fn root_exhausted(&self) -> bool {
    self.nodes[self.root.0].terminal
  }

  fn cutoff_reached(&self) -> bool {
    let root = &self.nodes[self.root.0];
    if self.cfg.cutoff < 0.0 || !(root.visits > CUTOFF_MIN_VISITS) {
      return false;
    }
    let visits: Vec<f64> = self.children(self.root)
      .map(|c| &self.nodes[c.0])
      .map(|n| if n.terminal { 0.0 } else { n.visits })
      .collect();
    match array_argmax2(&visits) {
      (Some(top1), Some(top2)) => (visits[top1] - visits[top2]) / root.visits > self.cfg.cutoff,
      _ => false,
    }
  }

  pub fn should_stop(&self, budget: Budget, playouts: usize, elapsed: Duration) -> bool {
    self.root_exhausted() || budget.exhausted(playouts, elapsed) || self.cutoff_reached()
  }

  /// Clears the per-search accumulators.
  pub fn begin(&mut self, board: &B) {
    self.territory = vec![0.0; board.num_points()];
    self.timings = PhaseTimings::default();
    if self.nodes[self.root.0].color != self.to_move.opponent() {
      warn!("search: root color {:?} does not match player to move {:?}",
          self.nodes[self.root.0].color, self.to_move);
    }
  }

  /// Runs simulations within `budget` and returns the most visited move.
  pub fn compute_move(&mut self, board: &B, budget: Budget) -> (SearchResult, SearchStats) {
    let start = Instant::now();
    self.begin(board);
    let mut playouts = 0;
    if board.winner().is_none() {
      let mut traj = Trajectory::new();
      let mut rng = self.rng.clone();
      while !self.should_stop(budget, playouts, start.elapsed()) {
        let mut sim = board.fork();
        self.step(&mut sim, &mut traj, &mut rng);
        playouts += 1;
      }
      self.rng = rng;
    }
    self.finish(board, playouts, start)
  }

  /// Ranking key of a root child: visits, or +inf/-1 for proven
  /// wins/losses.
  fn rank_key(node: &Node) -> f64 {
    if node.terminal {
      if node.wins > 0.0 { f64::INFINITY } else { -1.0 }
    } else {
      node.visits
    }
  }

  pub fn best_child(&self) -> Option<NodeId> {
    let children: Vec<NodeId> = self.children(self.root).collect();
    let keys: Vec<f64> = children.iter().map(|c| Self::rank_key(&self.nodes[c.0])).collect();
    array_argmax(&keys).map(|j| children[j])
  }

  pub fn finish(&self, board: &B, playouts: usize, start: Instant) -> (SearchResult, SearchStats) {
    let elapsed = start.elapsed();
    let root = &self.nodes[self.root.0];
    let mut stats = SearchStats::default();
    stats.playouts = playouts;
    stats.elapsed_ms = elapsed.as_millis() as usize;
    stats.max_depth = self.max_depth();
    stats.num_nodes = self.num_nodes();
    stats.avg_walk_ns = PhaseTimings::avg_ns(self.timings.walk, self.timings.count);
    stats.avg_rollout_ns = PhaseTimings::avg_ns(self.timings.rollout, self.timings.count);
    stats.avg_backup_ns = PhaseTimings::avg_ns(self.timings.backup, self.timings.count);

    let (action, visits, win_rate) = match self.best_child() {
      Some(best) => {
        stats.argmax_rank = self.children(self.root).position(|c| c == best);
        let node = &self.nodes[best.0];
        stats.argmax_visits = node.visits;
        (Action::from_vertex(node.vertex), node.visits, node.mean)
      }
      None => {
        if board.winner().is_some() || board.decide().is_some() {
          (Action::Pass, 0.0, 0.0)
        } else {
          (Action::Resign, 0.0, 0.0)
        }
      }
    };
    let result = SearchResult{
      turn:           self.to_move,
      action:         action,
      visits:         visits,
      win_rate:       win_rate,
      root_visits:    root.visits,
      root_win_rate:  root.mean,
    };
    if self.cfg.stats {
      self.log_stats(&result, &stats, elapsed);
    }
    (result, stats)
  }

  fn log_stats(&self, result: &SearchResult, stats: &SearchStats, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    info!("search: {} playouts in {:.3} s ({:.0} pps)",
        stats.playouts, secs, nan_to_zero(stats.playouts as f64 / secs));
    if self.cfg.time_limit > 0.0 {
      let left = self.cfg.time_limit - secs;
      if left >= 0.0 {
        info!("search: time left {:.3} s", left);
      } else {
        info!("search: time over {:.3} s", -left);
      }
    }
    info!("search: {:?} to move, best {:?} with {} visits, win rate {:.3}, root win rate {:.3}",
        result.turn, result.action, result.visits, result.win_rate, result.root_win_rate);
    if result.root_visits > 0.0 && !self.territory.is_empty() {
      let n = self.territory.len() as f64;
      let fracs: Vec<f64> = self.territory.iter().map(|&t| t / result.root_visits).collect();
      let mean = fracs.iter().sum::<f64>() / n;
      let var = fracs.iter().map(|&f| (f - mean) * (f - mean)).sum::<f64>() / n;
      info!("search: territory mean {:.3} variance {:.3}", mean, var);
    }
    info!("search: max depth {} nodes {} root visits {}",
        stats.max_depth, stats.num_nodes, result.root_visits);
    let (seeds, total_seeds) = self.seed_stats();
    info!("search: seeds {}/{} ({:.3})",
        seeds, total_seeds, nan_to_zero(seeds as f64 / total_seeds as f64));
    if self.cfg.verbose {
      debug!("search: avg ns walk {} rollout {} backup {}",
          stats.avg_walk_ns, stats.avg_rollout_ns, stats.avg_backup_ns);
    }
  }

  /// Reroots the tree at the played move, keeping its explored subtree if
  /// there is one.
  pub fn advance(mut self, color: Stone, vertex: Vertex) -> SearchTree<B> {
    self.advance_in_place(color, vertex);
    self
  }

  pub fn advance_in_place(&mut self, color: Stone, vertex: Vertex) -> bool {
    if color != self.to_move {
      warn!("advance: tree expects {:?} to move but {:?} played", self.to_move, color);
    }
    let found = self.find_child(self.root, color, vertex);
    let old_nodes = mem::replace(&mut self.nodes, vec![]);
    match found {
      Some(child) => {
        debug!("advance: reusing subtree of {} visits", old_nodes[child.0].visits);
        let mut nodes = Vec::new();
        copy_subtree(&old_nodes, child, None, &mut nodes);
        let root = &mut nodes[0];
        root.next_sibling = None;
        if !root.terminal {
          // Root wins count for the player to move.
          root.wins = root.visits - root.wins;
          root.mean = nan_to_zero(root.wins / root.visits);
        }
        self.nodes = nodes;
      }
      None => {
        warn!("advance: no explored child for {:?} {:?}, starting a fresh tree", color, vertex);
        self.nodes = vec![Node::new(None, color, vertex, 0.0)];
      }
    }
    self.root = NodeId(0);
    self.to_move = color.opponent();
    found.is_some()
  }

  /// Adds another tree's root statistics into this one, pairing root
  /// children by sibling position.
  pub fn merge(&mut self, other: &SearchTree<B>) {
    let mine: Vec<NodeId> = self.children(self.root).collect();
    let theirs: Vec<NodeId> = other.children(other.root).collect();
    for (&a, &b) in mine.iter().zip(theirs.iter()) {
      let src = &other.nodes[b.0];
      let dst = &mut self.nodes[a.0];
      dst.wins += src.wins;
      dst.visits += src.visits;
    }
    {
      let src = &other.nodes[other.root.0];
      let root = &mut self.nodes[self.root.0];
      root.wins += src.wins;
      root.visits += src.visits;
      root.mean = nan_to_zero(root.wins / root.visits);
    }
    let root = self.root;
    self.recalc_children(root);
  }

  /// One line per visited node, indented by depth, down to `max_depth`.
  pub fn dump(&self, size: usize, max_depth: usize) -> String {
    let mut out = String::new();
    let mut stack: Vec<(NodeId, usize)> = self.children(self.root).map(|c| (c, 0)).collect();
    stack.reverse();
    while let Some((id, depth)) = stack.pop() {
      let node = &self.nodes[id.0];
      if !(node.visits > 0.0) {
        continue;
      }
      let _ = write!(out, "{}{} {} mean={:.3} blended={:.3} value={:.3} wins={} visits={}",
          "  ".repeat(depth), node.color.code(), node.vertex.to_label(size),
          node.mean, node.blended_mean, node.value, node.wins, node.visits);
      if self.cfg.amaf {
        let _ = write!(out, " amaf=({:.3}, {})", node.amaf_mean, node.amaf_visits);
      }
      out.push('\n');
      if depth + 1 < max_depth {
        let mut children: Vec<(NodeId, usize)> = self.children(id).map(|c| (c, depth + 1)).collect();
        children.reverse();
        stack.extend(children);
      }
    }
    out
  }
}

/// Copies the subtree at `id` into `dst` in preorder, keeping sibling order.
fn copy_subtree(src: &[Node], id: NodeId, parent: Option<NodeId>, dst: &mut Vec<Node>) -> NodeId {
  let new_id = NodeId(dst.len());
  let mut node = src[id.0].clone();
  node.parent = parent;
  node.first_child = None;
  node.last_child = None;
  node.next_sibling = None;
  node.virtual_visits = 0.0;
  dst.push(node);
  let mut cursor = src[id.0].first_child;
  while let Some(child) = cursor {
    let new_child = copy_subtree(src, child, Some(new_id), dst);
    match dst[new_id.0].last_child {
      Some(last) => dst[last.0].next_sibling = Some(new_child),
      None => dst[new_id.0].first_child = Some(new_child),
    }
    dst[new_id.0].last_child = Some(new_child);
    cursor = src[child.0].next_sibling;
  }
  new_id
}
