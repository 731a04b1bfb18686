use crate::error::{BoardError};

use serde::{Deserialize};
use std::fmt;

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum Stone {
  Black = 0,
  White = 1,
  Empty = 2,
}

impl Stone {
  pub fn offset(self) -> usize {
    match self {
      Stone::Black => 0,
      Stone::White => 1,
      Stone::Empty => unreachable!(),
    }
  }

  pub fn opponent(self) -> Stone {
    match self {
      Stone::Black => Stone::White,
      Stone::White => Stone::Black,
      Stone::Empty => unreachable!(),
    }
  }

  pub fn to_char(self) -> char {
    match self {
      Stone::Black => 'X',
      Stone::White => 'O',
      Stone::Empty => '.',
    }
  }

  pub fn code(self) -> &'static str {
    match self {
      Stone::Black => "B",
      Stone::White => "W",
      Stone::Empty => "-",
    }
  }
}

/// Board cell states used only for display. The rules engines never look at
/// these.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum DisplayCell {
  Empty,
  Black,
  White,
  Illegal,
  LegalBlack,
  LegalWhite,
  LegalBoth,
}

impl DisplayCell {
  pub fn to_char(self) -> char {
    match self {
      DisplayCell::Empty      => '.',
      DisplayCell::Black      => 'X',
      DisplayCell::White      => 'O',
      DisplayCell::Illegal    => '#',
      DisplayCell::LegalBlack => 'b',
      DisplayCell::LegalWhite => 'w',
      DisplayCell::LegalBoth  => '+',
    }
  }
}

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct Coord {
  pub x: u8,
  pub y: u8,
}

impl Coord {
  pub fn new(x: u8, y: u8) -> Coord {
    Coord{x: x, y: y}
  }
}

/// Number of columns that have a letter label.
pub const MAX_LABEL_COLUMNS: usize = 25;

/// Column letters skip 'I'.
pub fn dump_xcoord(x: u8) -> char {
  if x < 8 {
    (b'A' + x) as char
  } else {
    (b'J' + x - 8) as char
  }
}

fn parse_xcoord(c: u8) -> Option<u8> {
  match c {
    b'A' ..= b'H' => Some(c - b'A'),
    b'J' ..= b'Z' => Some(c - b'A' - 1),
    _ => None,
  }
}

#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Vertex(pub i16);

impl Vertex {
  pub const PASS: Vertex = Vertex(-1);

  pub fn from_idx(idx: usize) -> Vertex {
    Vertex(idx as i16)
  }

  pub fn from_coord(coord: Coord, size: usize) -> Vertex {
    Vertex(coord.x as i16 + coord.y as i16 * size as i16)
  }

  pub fn to_coord(self, size: usize) -> Coord {
    debug_assert!(!self.is_pass());
    let s = size as i16;
    Coord::new((self.0 % s) as u8, (self.0 / s) as u8)
  }

  #[inline]
  pub fn idx(self) -> usize {
    self.0 as usize
  }

  #[inline]
  pub fn is_pass(self) -> bool {
    self.0 < 0
  }

  #[inline]
  pub fn is_edge(self, size: usize) -> bool {
    let s = size as i16;
    let (x, y) = (self.0 % s, self.0 / s);
    x == 0 || x == s - 1 || y == 0 || y == s - 1
  }

  /// Row 1 is the bottom row, so the top row of the array is labelled `size`.
  pub fn to_label(self, size: usize) -> String {
    if self.is_pass() {
      return "pass".to_string();
    }
    let coord = self.to_coord(size);
    format!("{}{}", dump_xcoord(coord.x), size - coord.y as usize)
  }

  pub fn from_label(label: &str, size: usize) -> Option<Vertex> {
    let upper = label.trim().to_ascii_uppercase();
    if upper == "PASS" {
      return Some(Vertex::PASS);
    }
    let bytes = upper.as_bytes();
    if bytes.len() < 2 {
      return None;
    }
    let x = parse_xcoord(bytes[0])? as usize;
    let row: usize = upper[1 ..].parse().ok()?;
    if x >= size || row == 0 || row > size {
      return None;
    }
    let y = size - row;
    Some(Vertex::from_coord(Coord::new(x as u8, y as u8), size))
  }

  pub fn parse_label(label: &str, size: usize) -> Result<Vertex, BoardError> {
    Vertex::from_label(label, size).ok_or_else(|| BoardError::BadLabel(label.to_string()))
  }
}

#[derive(Clone, Copy, Eq, PartialEq)]
pub enum Action {
  Place{vertex: Vertex},
  Pass,
  Resign,
}

impl fmt::Debug for Action {
  fn fmt(&self, formatter: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match self {
      &Action::Place{vertex} => {
        write!(formatter, "Place({})", vertex.0)
      }
      &Action::Pass => {
        formatter.write_str("Pass")
      }
      &Action::Resign => {
        formatter.write_str("Resign")
      }
    }
  }
}

impl Action {
  pub fn from_vertex(vertex: Vertex) -> Action {
    if vertex.is_pass() {
      Action::Pass
    } else {
      Action::Place{vertex: vertex}
    }
  }

  pub fn to_label(self, size: usize) -> String {
    match self {
      Action::Place{vertex} => vertex.to_label(size),
      Action::Pass => "pass".to_string(),
      Action::Resign => "resign".to_string(),
    }
  }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
  Capture,
  Connection,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct GameConfig {
  pub kind: GameKind,
  pub size: usize,
  pub komi: f64,
}

impl Default for GameConfig {
  fn default() -> GameConfig {
    GameConfig{
      kind: GameKind::Capture,
      size: 9,
      komi: 6.5,
    }
  }
}
