use crate::board::{DisplayCell, Stone, Vertex};

use rand::{Rng};

pub type MoveResult = Result<(), IllegalReason>;

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum IllegalReason {
  NotEmpty,
  Ko,
  Suicide,
  Superko,
  GameOver,
  // Games without a pass move.
  NoPass,
}

/// Rules engine for one game. Copies are plain values; a search clones a
/// board per simulation and never shares mutable state between copies.
pub trait BoardEngine: Clone + Send + Sync + 'static {
  fn size(&self) -> usize;

  fn num_points(&self) -> usize {
    self.size() * self.size()
  }

  fn stone(&self, vertex: Vertex) -> Stone;

  /// Applies a move without checking it; callers check `legal` first.
  fn play(&mut self, color: Stone, vertex: Vertex);

  /// Pure legality test.
  fn check_move(&self, color: Stone, vertex: Vertex) -> MoveResult;

  fn legal(&self, color: Stone, vertex: Vertex) -> bool {
    self.check_move(color, vertex).is_ok()
  }

  /// The winner once the game has ended, otherwise `None`.
  fn winner(&self) -> Option<Stone>;

  /// The winner if the game were to end in the current position.
  fn decide(&self) -> Option<Stone>;

  fn score(&self, komi: f64) -> (f64, f64);

  /// Plays a randomized game to the end, `color` moving first.
  fn playout<R: Rng>(&mut self, color: Stone, rng: &mut R) -> Option<Stone>;

  /// Whether `color` played `vertex` since this copy was forked.
  fn was_played(&self, color: Stone, vertex: Vertex) -> bool;

  /// Per-vertex ownership of `color`, 1.0 for owned points.
  fn territory(&self, color: Stone) -> Vec<f64>;

  /// Copy for a fresh simulation: all rules state, but no played marks.
  fn fork(&self) -> Self;

  fn moves(&self) -> &[Vertex];

  fn legality_map(&self) -> Vec<DisplayCell> {
    (0 .. self.num_points()).map(|p| {
      let v = Vertex::from_idx(p);
      match self.stone(v) {
        Stone::Black => DisplayCell::Black,
        Stone::White => DisplayCell::White,
        Stone::Empty => {
          match (self.legal(Stone::Black, v), self.legal(Stone::White, v)) {
            (true, true)   => DisplayCell::LegalBoth,
            (true, false)  => DisplayCell::LegalBlack,
            (false, true)  => DisplayCell::LegalWhite,
            (false, false) => DisplayCell::Illegal,
          }
        }
      }
    }).collect()
  }

  fn to_debug_strings(&self) -> Vec<String>;
}
