extern crate rand;
extern crate watson;

use watson::board::{Action, Coord, Stone, Vertex};
use watson::capture::{CaptureBoard};
use watson::config::{Budget, SearchConfig};
use watson::connection::{ConnectionBoard};
use watson::engine::{BoardEngine};
use watson::policy::{Evaluator};
use watson::random::{XorShift128PlusRng};
use watson::search::{NodeId, SearchTree};
use watson::search::parallel::{ParallelSearch, SharedTree};

use rand::{SeedableRng};
use std::sync::{Arc};
use std::sync::mpsc::{channel};
use std::thread;
use std::time::{Duration};

fn seeded_config(seed: u64) -> SearchConfig {
  let mut cfg = SearchConfig::default();
  cfg.rng_seed = Some(seed);
  cfg
}

fn at(x: u8, y: u8, size: usize) -> Vertex {
  Vertex::from_coord(Coord::new(x, y), size)
}

fn root_children<B: BoardEngine>(tree: &SearchTree<B>) -> Vec<NodeId> {
  tree.children(tree.root()).collect()
}

#[test]
fn test_single_playout_expands_root() {
  let board = CaptureBoard::new(9, 6.5).unwrap();
  let mut tree = SearchTree::new(Stone::Black, seeded_config(1));
  let (result, stats) = tree.compute_move(&board, Budget::playouts(1));
  assert_eq!(stats.playouts, 1);
  assert_eq!(tree.node(tree.root()).visits, 1.0);
  let children = root_children(&tree);
  assert_eq!(children.len(), 82);
  assert_eq!(tree.node(*children.last().unwrap()).vertex, Vertex::PASS);
  let visited: Vec<_> = children.iter().filter(|&&c| tree.node(c).visits > 0.0).collect();
  assert_eq!(visited.len(), 1);
  assert_eq!(tree.node(*visited[0]).visits, 1.0);
  assert_eq!(result.turn, Stone::Black);
  assert_eq!(result.action, Action::from_vertex(tree.node(*visited[0]).vertex));
}

#[test]
fn test_zero_budget_runs_nothing() {
  let board = CaptureBoard::new(9, 6.5).unwrap();
  let mut tree = SearchTree::new(Stone::Black, seeded_config(1));
  let (result, stats) = tree.compute_move(&board, Budget::playouts(0));
  assert_eq!(stats.playouts, 0);
  assert_eq!(tree.num_nodes(), 1);
  assert_eq!(result.action, Action::Pass);
}

#[test]
fn test_seeded_search_is_deterministic_and_accumulates() {
  let board = CaptureBoard::new(7, 6.5).unwrap();
  let mut a = SearchTree::new(Stone::Black, seeded_config(99));
  let mut b = SearchTree::new(Stone::Black, seeded_config(99));
  let (ra, _) = a.compute_move(&board, Budget::playouts(300));
  let (rb, _) = b.compute_move(&board, Budget::playouts(300));
  assert_eq!(ra.action, rb.action);
  assert_eq!(ra.visits, rb.visits);
  assert_eq!(a.num_nodes(), b.num_nodes());

  let mut prev = a.node(a.root()).visits;
  assert_eq!(prev, 300.0);
  for _ in 0 .. 3 {
    a.compute_move(&board, Budget::playouts(100));
    let visits = a.node(a.root()).visits;
    assert_eq!(visits, prev + 100.0);
    prev = visits;
  }
}

#[test]
fn test_more_playouts_never_shrink_best_move() {
  let board = CaptureBoard::new(5, 0.5).unwrap();
  let mut prev_best = 0.0;
  for &budget in &[30, 300, 3000] {
    let mut tree = SearchTree::new(Stone::Black, seeded_config(21));
    let (result, _) = tree.compute_move(&board, Budget::playouts(budget));
    assert!(result.visits >= prev_best, "budget {}: {} < {}", budget, result.visits, prev_best);
    prev_best = result.visits;
  }
}

#[test]
fn test_best_child_has_most_visits() {
  let board = CaptureBoard::new(7, 6.5).unwrap();
  let mut tree = SearchTree::new(Stone::Black, seeded_config(3));
  let (result, stats) = tree.compute_move(&board, Budget::playouts(500));
  let best = tree.best_child().unwrap();
  let best_visits = tree.node(best).visits;
  for c in root_children(&tree) {
    assert!(tree.node(c).visits <= best_visits);
  }
  assert_eq!(result.visits, best_visits);
  assert_eq!(stats.argmax_visits, best_visits);
  assert_eq!(root_children(&tree)[stats.argmax_rank.unwrap()], best);
  let total: f64 = root_children(&tree).iter().map(|&c| tree.node(c).visits).sum();
  assert_eq!(total, 500.0);
}

#[test]
fn test_advance_reuses_subtree() {
  let board = CaptureBoard::new(7, 6.5).unwrap();
  let mut cfg = seeded_config(5);
  cfg.expand_after = 5.0;
  let mut tree = SearchTree::new(Stone::Black, cfg);
  tree.compute_move(&board, Budget::playouts(400));
  let best = tree.best_child().unwrap();
  let vertex = tree.node(best).vertex;
  let visits = tree.node(best).visits;
  let num_children = tree.children(best).count();
  assert!(num_children > 0);

  let tree = tree.advance(Stone::Black, vertex);
  assert_eq!(tree.to_move(), Stone::White);
  let root = tree.node(tree.root());
  assert_eq!(root.vertex, vertex);
  assert_eq!(root.color, Stone::Black);
  assert_eq!(root.parent, None);
  assert_eq!(root.next_sibling, None);
  assert_eq!(root.visits, visits);
  assert_eq!(tree.children(tree.root()).count(), num_children);

  // The reused tree keeps searching from the new position.
  let mut next = board.clone();
  next.play(Stone::Black, vertex);
  let mut tree = tree;
  let (result, _) = tree.compute_move(&next, Budget::playouts(50));
  assert_eq!(result.turn, Stone::White);
  assert_eq!(tree.node(tree.root()).visits, visits + 50.0);
}

#[test]
fn test_advance_falls_back_to_fresh_tree() {
  let board = CaptureBoard::new(7, 6.5).unwrap();
  let mut tree = SearchTree::new(Stone::Black, seeded_config(6));
  tree.compute_move(&board, Budget::playouts(50));
  let vertex = at(3, 3, 7);
  // White never had a move at the root.
  let tree = tree.advance(Stone::White, vertex);
  assert_eq!(tree.num_nodes(), 1);
  assert_eq!(tree.node(tree.root()).vertex, vertex);
  assert_eq!(tree.node(tree.root()).visits, 0.0);
  assert_eq!(tree.to_move(), Stone::Black);
}

#[test]
fn test_decided_position_returns_pass() {
  let mut board = CaptureBoard::new(9, 6.5).unwrap();
  board.play(Stone::Black, Vertex::PASS);
  board.play(Stone::White, Vertex::PASS);
  let mut tree = SearchTree::new(Stone::Black, seeded_config(7));
  let (result, stats) = tree.compute_move(&board, Budget::playouts(100));
  assert_eq!(result.action, Action::Pass);
  assert_eq!(stats.playouts, 0);

  let mut hex = ConnectionBoard::new(3).unwrap();
  for y in 0 .. 3 {
    hex.play(Stone::Black, at(0, y, 3));
  }
  let mut tree = SearchTree::new(Stone::White, seeded_config(7));
  let (result, _) = tree.compute_move(&hex, Budget::playouts(100));
  assert_eq!(result.action, Action::Pass);
}

#[test]
fn test_merge_sums_root_children() {
  let board = CaptureBoard::new(5, 0.5).unwrap();
  let mut a = SearchTree::new(Stone::Black, seeded_config(10));
  let mut b = SearchTree::new(Stone::Black, seeded_config(11));
  a.compute_move(&board, Budget::playouts(60));
  b.compute_move(&board, Budget::playouts(40));
  let before: Vec<(f64, f64)> = root_children(&a).iter()
    .zip(root_children(&b).iter())
    .map(|(&x, &y)| (a.node(x).wins + b.node(y).wins, a.node(x).visits + b.node(y).visits))
    .collect();
  a.merge(&b);
  let after: Vec<(f64, f64)> = root_children(&a).iter()
    .map(|&x| (a.node(x).wins, a.node(x).visits))
    .collect();
  assert_eq!(before, after);
  assert_eq!(a.node(a.root()).visits, 100.0);
}

#[test]
fn test_blended_values_are_finite() {
  let board = CaptureBoard::new(7, 6.5).unwrap();
  let mut cfg = seeded_config(12);
  cfg.amaf = true;
  cfg.neighbors = true;
  cfg.ancestor = true;
  cfg.rave_equiv = 1000.0;
  cfg.expand_after = 3.0;
  let mut tree = SearchTree::new(Stone::Black, cfg);
  tree.compute_move(&board, Budget::playouts(400));
  assert!(tree.max_depth() >= 2);
  for i in 0 .. tree.num_nodes() {
    let node = tree.node(NodeId(i));
    if node.is_terminal() {
      continue;
    }
    assert!(!node.mean.is_nan());
    assert!(!node.blended_mean.is_nan());
    assert!(node.value.is_finite());
    assert!(node.amaf_visits >= 0.0);
    assert!(node.blended_mean >= 0.0 && node.blended_mean <= 1.0);
  }
}

struct ConstantEvaluator(f64);

impl Evaluator<CaptureBoard> for ConstantEvaluator {
  fn evaluate(&self, _color: Stone, _board: &CaptureBoard) -> f64 {
    self.0
  }
}

#[test]
fn test_evaluator_seeds_children() {
  let board = CaptureBoard::new(5, 0.5).unwrap();
  let mut cfg = seeded_config(13);
  cfg.eval = true;
  cfg.rave_equiv = 10.0;
  let mut tree: SearchTree<CaptureBoard> = SearchTree::new(Stone::Black, cfg)
    .with_evaluator(Arc::new(ConstantEvaluator(0.75)));
  tree.compute_move(&board, Budget::playouts(1));
  for c in root_children(&tree) {
    let node = tree.node(c);
    assert_eq!(node.eval_visits, 10.0);
    assert!((node.eval_mean - 0.75).abs() < 1.0e-12);
    if node.visits == 0.0 {
      assert!((node.blended_mean - 0.75).abs() < 1.0e-12);
    }
  }
}

#[test]
fn test_playout_seeding_counts_attempts() {
  let board = CaptureBoard::new(5, 0.5).unwrap();
  let mut cfg = seeded_config(14);
  cfg.seed_playouts = true;
  cfg.expand_after = 1.0;
  let mut tree = SearchTree::new(Stone::Black, cfg);
  tree.compute_move(&board, Budget::playouts(400));
  let (seeds, total) = tree.seed_stats();
  assert!(total > 0);
  assert!(seeds <= total);
}

#[test]
fn test_finds_winning_connection() {
  let size = 5;
  let mut board = ConnectionBoard::new(size).unwrap();
  for &y in &[0, 1, 3, 4] {
    board.play(Stone::Black, at(2, y, size));
  }
  board.play(Stone::White, at(0, 1, size));
  board.play(Stone::White, at(4, 3, size));
  board.play(Stone::White, at(1, 3, size));
  board.play(Stone::White, at(3, 1, size));
  let mut cfg = seeded_config(15);
  cfg.expand_after = 0.0;
  let mut tree = SearchTree::new(Stone::Black, cfg);
  let (result, _) = tree.compute_move(&board, Budget::playouts(2000));
  assert_eq!(result.action, Action::Place{vertex: at(2, 2, size)});
}

#[test]
fn test_territory_accumulates() {
  let board = CaptureBoard::new(5, 0.5).unwrap();
  let mut tree = SearchTree::new(Stone::Black, seeded_config(16));
  tree.compute_move(&board, Budget::playouts(100));
  let territory = tree.territory();
  assert_eq!(territory.len(), 25);
  assert!(territory.iter().all(|&t| t >= 0.0 && t <= 100.0));
  assert!(territory.iter().sum::<f64>() > 0.0);
}

#[test]
fn test_dump_format() {
  let board = CaptureBoard::new(9, 6.5).unwrap();
  let mut cfg = seeded_config(17);
  cfg.amaf = true;
  let mut tree = SearchTree::new(Stone::Black, cfg);
  tree.compute_move(&board, Budget::playouts(1));
  let dump = tree.dump(9, 1);
  let lines: Vec<&str> = dump.lines().collect();
  assert_eq!(lines.len(), 1);
  assert!(lines[0].starts_with("B "));
  assert!(lines[0].contains("visits=1"));
  assert!(lines[0].contains(" mean="));
  assert!(lines[0].contains(" blended="));
  assert!(lines[0].contains("amaf=("));

  tree.compute_move(&board, Budget::playouts(200));
  for line in tree.dump(9, 3).lines() {
    let indent = line.len() - line.trim_start().len();
    assert_eq!(indent % 2, 0);
    assert!(indent / 2 < 3);
  }
}

#[test]
fn test_parallel_search_returns_legal_move() {
  let board = CaptureBoard::new(9, 6.5).unwrap();
  let tree = SharedTree::new(SearchTree::new(Stone::Black, seeded_config(18)));
  let search = ParallelSearch::new(4);
  let mut rng = XorShift128PlusRng::seed_from_u64(18);
  let (result, stats) = search.compute_move(&tree, &board, Budget::playouts(400), &mut rng);
  assert!(stats.playouts >= 400);
  match result.action {
    Action::Place{vertex} => assert!(board.legal(Stone::Black, vertex)),
    Action::Pass => {}
    Action::Resign => panic!("resigned on an empty board"),
  }
  let inner = tree.lock();
  assert_eq!(inner.node(inner.root()).visits, stats.playouts as f64);
  for c in inner.children(inner.root()) {
    assert_eq!(inner.node(c).virtual_visits, 0.0);
  }
  drop(inner);

  // A second search on the same pool reuses the workers.
  assert!(tree.try_advance(Stone::Black, match result.action {
    Action::Place{vertex} => vertex,
    _ => Vertex::PASS,
  }));
  let mut next = board.clone();
  next.play(Stone::Black, match result.action {
    Action::Place{vertex} => vertex,
    _ => Vertex::PASS,
  });
  let (result, _) = search.compute_move(&tree, &next, Budget::playouts(100), &mut rng);
  assert_eq!(result.turn, Stone::White);
}

struct FailingEvaluator;

impl Evaluator<CaptureBoard> for FailingEvaluator {
  fn evaluate(&self, _color: Stone, _board: &CaptureBoard) -> f64 {
    panic!("evaluator failure");
  }
}

#[test]
fn test_parallel_search_returns_when_a_worker_panics() {
  let (tx, rx) = channel();
  thread::spawn(move || {
    let board = CaptureBoard::new(5, 0.5).unwrap();
    let mut cfg = seeded_config(19);
    cfg.eval = true;
    let tree: SearchTree<CaptureBoard> = SearchTree::new(Stone::Black, cfg)
      .with_evaluator(Arc::new(FailingEvaluator));
    let tree = SharedTree::new(tree);
    let search = ParallelSearch::new(2);
    let mut rng = XorShift128PlusRng::seed_from_u64(19);
    let (_, stats) = search.compute_move(&tree, &board, Budget::playouts(10), &mut rng);
    // The tree is still usable after the failed workers.
    let num_nodes = tree.lock().num_nodes();
    tx.send((stats.playouts, num_nodes)).unwrap();
  });
  let (playouts, num_nodes) = rx.recv_timeout(Duration::from_secs(60)).unwrap();
  assert!(playouts <= 10);
  assert!(num_nodes >= 1);
}

#[test]
fn test_parallel_searches_share_one_pool() {
  let search = ParallelSearch::new(2);
  let (tx, rx) = channel();
  for seed in 0 .. 3 {
    let search = search.clone();
    let tx = tx.clone();
    thread::spawn(move || {
      let board = CaptureBoard::new(5, 0.5).unwrap();
      let tree = SharedTree::new(SearchTree::new(Stone::Black, seeded_config(30 + seed)));
      let mut rng = XorShift128PlusRng::seed_from_u64(30 + seed);
      let (_, stats) = search.compute_move(&tree, &board, Budget::playouts(200), &mut rng);
      tx.send(stats.playouts).unwrap();
    });
  }
  for _ in 0 .. 3 {
    let playouts = rx.recv_timeout(Duration::from_secs(60)).unwrap();
    assert!(playouts >= 200);
  }
}
