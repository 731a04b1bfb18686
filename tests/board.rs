extern crate watson;

use watson::board::{Action, Coord, Vertex, dump_xcoord};
use watson::capture;
use watson::connection;
use watson::error::{BoardError};

#[test]
fn test_labels_skip_i() {
  assert_eq!(dump_xcoord(7), 'H');
  assert_eq!(dump_xcoord(8), 'J');
  let v = Vertex::from_coord(Coord::new(8, 0), 9);
  assert_eq!(v.to_label(9), "J9");
  assert_eq!(Vertex::from_label("J9", 9), Some(v));
  assert_eq!(Vertex::from_label("I9", 9), None);
}

#[test]
fn test_label_rows_count_from_bottom() {
  let size = 9;
  assert_eq!(Vertex::from_label("A1", size), Some(Vertex::from_coord(Coord::new(0, 8), size)));
  assert_eq!(Vertex::from_label("a9", size), Some(Vertex::from_idx(0)));
  assert_eq!(Vertex::from_label(" pass ", size), Some(Vertex::PASS));
  for p in 0 .. size * size {
    let v = Vertex::from_idx(p);
    assert_eq!(Vertex::from_label(&v.to_label(size), size), Some(v));
  }
  let big = 19;
  let v = Vertex::from_coord(Coord::new(18, 0), big);
  assert_eq!(v.to_label(big), "T19");
  assert_eq!(Vertex::parse_label("T19", big), Ok(v));
}

#[test]
fn test_bad_labels() {
  for &label in &["", "A", "A0", "A10", "K1", "Z", "11", "A1x"] {
    assert_eq!(Vertex::parse_label(label, 9), Err(BoardError::BadLabel(label.to_string())), "{:?}", label);
  }
}

#[test]
fn test_action_labels() {
  assert_eq!(Action::from_vertex(Vertex::PASS), Action::Pass);
  assert_eq!(Action::from_vertex(Vertex::from_idx(0)).to_label(5), "A5");
  assert_eq!(Action::Resign.to_label(5), "resign");
  assert_eq!(format!("{:?}", Action::Place{vertex: Vertex::from_idx(3)}), "Place(3)");
}

#[test]
fn test_every_vertex_label_parses_back() {
  let capture_sizes = capture::MIN_SIZE ..= capture::MAX_SIZE;
  let connection_sizes = connection::MIN_SIZE ..= connection::MAX_SIZE;
  for size in capture_sizes.chain(connection_sizes) {
    for p in 0 .. size * size {
      let v = Vertex::from_idx(p);
      let label = v.to_label(size);
      assert!(label.chars().all(|c| c.is_ascii_alphanumeric()), "size {}: {:?}", size, label);
      assert_eq!(Vertex::parse_label(&label, size), Ok(v), "size {}: {:?}", size, label);
    }
  }
  assert_eq!(dump_xcoord(24), 'Z');
}
