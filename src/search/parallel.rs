use crate::board::{Stone, Vertex};
use crate::config::{Budget};
use crate::engine::{BoardEngine};
use crate::random::{XorShift128PlusRng};
use crate::search::{PhaseTimings, SearchResult, SearchStats, SearchTree, Trajectory};

use std::sync::{Arc, Mutex, MutexGuard};
use std::sync::mpsc::{Sender, channel};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Instant};
use threadpool::{ThreadPool};

/// A search tree shared by the workers of a `ParallelSearch`.
pub struct SharedTree<B> where B: BoardEngine {
  inner: Arc<Mutex<SearchTree<B>>>,
}

impl<B> Clone for SharedTree<B> where B: BoardEngine {
  fn clone(&self) -> SharedTree<B> {
    SharedTree{inner: self.inner.clone()}
  }
}

impl<B> SharedTree<B> where B: BoardEngine {
  pub fn new(tree: SearchTree<B>) -> SharedTree<B> {
    SharedTree{inner: Arc::new(Mutex::new(tree))}
  }

  /// A worker that panicked mid-update leaves at worst one stale node value,
  /// so a poisoned lock is still usable.
  pub fn lock(&self) -> MutexGuard<SearchTree<B>> {
    self.inner.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Reroots the shared tree between searches. Returns whether the explored
  /// subtree was kept.
  pub fn try_advance(&self, color: Stone, vertex: Vertex) -> bool {
    self.lock().advance_in_place(color, vertex)
  }
}

/// Reports a worker's exit to the caller, also when the worker unwinds.
/// A panicking worker stops the whole search.
struct WorkerExit {
  stop: Arc<AtomicBool>,
  done: Sender<bool>,
}

impl Drop for WorkerExit {
  fn drop(&mut self) {
    let panicked = thread::panicking();
    if panicked {
      self.stop.store(true, Ordering::Release);
    }
    let _ = self.done.send(panicked);
  }
}

/// Tree-parallel search: workers walk and back up under the tree lock and
/// run rollouts outside it, with virtual loss spreading them over the tree.
///
/// Clones share the worker pool. Workers never wait on each other, so
/// searches started from several clones at once queue on the pool and run
/// one after another rather than deadlock.
#[derive(Clone)]
pub struct ParallelSearch {
  pool:         ThreadPool,
  num_workers:  usize,
}

impl ParallelSearch {
  pub fn new(num_workers: usize) -> ParallelSearch {
    let num_workers = num_workers.max(1);
    ParallelSearch{
      pool:         ThreadPool::with_name("watson_search".to_string(), num_workers),
      num_workers:  num_workers,
    }
  }

  pub fn num_workers(&self) -> usize {
    self.num_workers
  }

  pub fn compute_move<B>(&self,
      tree:   &SharedTree<B>,
      board:  &B,
      budget: Budget,
      rng:    &mut XorShift128PlusRng)
      -> (SearchResult, SearchStats)
      where B: BoardEngine
  {
    let start = Instant::now();
    {
      let mut inner = tree.lock();
      inner.begin(board);
      if board.winner().is_some() {
        return inner.finish(board, 0, start);
      }
    }

    let (done_tx, done_rx) = channel();
    let playouts = Arc::new(AtomicUsize::new(0));
    let stop = Arc::new(AtomicBool::new(false));
    for tid in 0 .. self.num_workers {
      let done = done_tx.clone();
      let playouts = playouts.clone();
      let stop = stop.clone();
      let tree = tree.clone();
      let board = board.clone();
      let mut worker_rng = rng.split();
      self.pool.execute(move || {
        let _exit = WorkerExit{stop: stop.clone(), done: done};
        let mut traj = Trajectory::new();
        let mut timings = PhaseTimings::default();
        while !stop.load(Ordering::Acquire) {
          let mut sim = board.fork();
          let walk_start = Instant::now();
          {
            let mut inner = tree.lock();
            if inner.should_stop(budget, playouts.load(Ordering::Acquire), start.elapsed()) {
              stop.store(true, Ordering::Release);
              break;
            }
            inner.walk(&mut sim, &mut traj, &mut worker_rng);
            inner.apply_virtual_loss(&traj);
          }
          let rollout_start = Instant::now();
          if traj.rollout {
            sim.playout(traj.first, &mut worker_rng);
          }
          let backup_start = Instant::now();
          {
            let mut inner = tree.lock();
            inner.revert_virtual_loss(&traj);
            inner.backup(&sim, &traj);
            let n = playouts.fetch_add(1, Ordering::AcqRel) + 1;
            if inner.should_stop(budget, n, start.elapsed()) {
              stop.store(true, Ordering::Release);
            }
          }
          timings.add(&PhaseTimings{
            walk:     rollout_start - walk_start,
            rollout:  backup_start - rollout_start,
            backup:   backup_start.elapsed(),
            count:    1,
          });
        }
        trace!("worker {}: {} simulations", tid, timings.count);
        tree.lock().add_timings(&timings);
      });
    }
    drop(done_tx);
    let mut num_panicked = 0;
    for _ in 0 .. self.num_workers {
      match done_rx.recv() {
        Ok(true) => num_panicked += 1,
        Ok(false) => {}
        Err(_) => break,
      }
    }
    if num_panicked > 0 {
      warn!("search: {} of {} workers panicked", num_panicked, self.num_workers);
    }

    let n = playouts.load(Ordering::Acquire);
    let inner = tree.lock();
    inner.finish(board, n, start)
  }
}
