extern crate env_logger;
extern crate getopts;
#[macro_use]
extern crate log;
extern crate rand;
extern crate watson;

use watson::board::{GameKind, Stone, Vertex};
use watson::capture::{CaptureBoard};
use watson::config::{Budget, Config};
use watson::connection::{ConnectionBoard};
use watson::engine::{BoardEngine};
use watson::error::{BoardError};
use watson::random::{XorShift128PlusRng};
use watson::search::{SearchTree};
use watson::search::parallel::{ParallelSearch, SharedTree};

use getopts::{Options};
use rand::{SeedableRng};
use std::env;
use std::error::{Error};
use std::process;
use std::time::{Instant};

fn usage(opts: &Options) -> String {
  opts.usage("usage: watson-genmove [options]")
}

/// Plays a whitespace-separated move list, colors alternating from Black.
/// Returns the side to move next.
fn replay<B: BoardEngine>(board: &mut B, moves: &str) -> Result<Stone, BoardError> {
  let mut color = Stone::Black;
  for label in moves.split_whitespace() {
    let vertex = Vertex::parse_label(label, board.size())?;
    if let Err(reason) = board.check_move(color, vertex) {
      return Err(BoardError::IllegalMove{label: label.to_string(), reason: reason});
    }
    board.play(color, vertex);
    color = color.opponent();
  }
  Ok(color)
}

fn run_genmove<B: BoardEngine>(mut board: B, cfg: &Config, moves: &str, dump_depth: Option<usize>) -> Result<(), BoardError> {
  let to_move = replay(&mut board, moves)?;
  debug!("genmove: {:?} to move after {} moves", to_move, board.moves().len());
  for line in board.to_debug_strings() {
    debug!("{}", line);
  }
  let budget = Budget::from_config(&cfg.search);
  let seed = cfg.search.rng_seed.unwrap_or(0x2545f4914f6cdd1d);
  let tree = SearchTree::new(to_move, cfg.search.clone());
  let (result, stats, dump) = if cfg.search.num_workers > 1 {
    let search = ParallelSearch::new(cfg.search.num_workers);
    let shared = SharedTree::new(tree);
    let mut rng = XorShift128PlusRng::seed_from_u64(seed);
    let (result, stats) = search.compute_move(&shared, &board, budget, &mut rng);
    let dump = dump_depth.map(|d| shared.lock().dump(board.size(), d));
    (result, stats, dump)
  } else {
    let mut tree = tree;
    let (result, stats) = tree.compute_move(&board, budget);
    let dump = dump_depth.map(|d| tree.dump(board.size(), d));
    (result, stats, dump)
  };
  println!("= {}", result.action.to_label(board.size()));
  println!("visits: {} win rate: {:.3} root visits: {} playouts: {} elapsed: {} ms",
      result.visits, result.win_rate, result.root_visits, stats.playouts, stats.elapsed_ms);
  if let Some(dump) = dump {
    print!("{}", dump);
  }
  Ok(())
}

fn run_pps<B: BoardEngine>(board: B, playouts: usize, seed: u64) {
  let mut rng = XorShift128PlusRng::seed_from_u64(seed);
  let mut wins = [0, 0];
  let start = Instant::now();
  for _ in 0 .. playouts {
    let mut sim = board.fork();
    if let Some(winner) = sim.playout(Stone::Black, &mut rng) {
      wins[winner.offset()] += 1;
    }
  }
  let secs = start.elapsed().as_secs_f64();
  println!("{} playouts in {:.3} s: {:.0} pps (black {} white {})",
      playouts, secs, playouts as f64 / secs, wins[0], wins[1]);
}

fn main() -> Result<(), Box<dyn Error>> {
  env_logger::init();

  let args: Vec<_> = env::args().collect();
  let mut opts = Options::new();
  opts.optopt("", "config", "TOML config file (default: $WATSON_CONFIG_PATH)", "PATH");
  opts.optopt("p", "playouts", "max playouts", "N");
  opts.optopt("t", "time", "time limit in seconds", "SECS");
  opts.optopt("", "size", "board size", "N");
  opts.optopt("", "komi", "komi", "KOMI");
  opts.optflag("", "hex", "play the connection game");
  opts.optopt("", "moves", "moves to play first, e.g. \"D4 C3 pass\"", "MOVES");
  opts.optopt("", "workers", "number of search workers", "N");
  opts.optflag("", "pps", "measure pure playout speed");
  opts.optopt("", "dump", "print the tree to depth N", "N");
  opts.optflag("", "stats", "log search statistics");
  opts.optflag("v", "verbose", "log per-phase timings");
  opts.optflag("h", "help", "print this help");
  let matches = match opts.parse(&args[1 ..]) {
    Ok(m) => m,
    Err(e) => {
      eprintln!("{}\n{}", e, usage(&opts));
      process::exit(2);
    }
  };
  if matches.opt_present("h") {
    println!("{}", usage(&opts));
    return Ok(());
  }

  let mut cfg = match matches.opt_str("config") {
    Some(path) => Config::load(path)?,
    None => Config::from_env()?,
  };
  if let Some(p) = matches.opt_str("p") {
    cfg.search.max_playouts = p.parse()?;
  }
  if let Some(t) = matches.opt_str("t") {
    cfg.search.time_limit = t.parse()?;
  }
  if let Some(size) = matches.opt_str("size") {
    cfg.game.size = size.parse()?;
  }
  if let Some(komi) = matches.opt_str("komi") {
    cfg.game.komi = komi.parse()?;
  }
  if matches.opt_present("hex") {
    cfg.game.kind = GameKind::Connection;
  }
  if let Some(workers) = matches.opt_str("workers") {
    cfg.search.num_workers = workers.parse::<usize>()?.max(1);
  }
  if matches.opt_present("stats") {
    cfg.search.stats = true;
  }
  if matches.opt_present("v") {
    cfg.search.verbose = true;
  }
  let dump_depth = match matches.opt_str("dump") {
    Some(d) => Some(d.parse()?),
    None => None,
  };
  let moves = matches.opt_str("moves").unwrap_or_default();
  info!("genmove: {:?}", cfg);

  let seed = cfg.search.rng_seed.unwrap_or(0x5bd1e995);
  match (cfg.game.kind, matches.opt_present("pps")) {
    (GameKind::Capture, false) => {
      run_genmove(CaptureBoard::new(cfg.game.size, cfg.game.komi)?, &cfg, &moves, dump_depth)?;
    }
    (GameKind::Capture, true) => {
      run_pps(CaptureBoard::new(cfg.game.size, cfg.game.komi)?, cfg.search.max_playouts, seed);
    }
    (GameKind::Connection, false) => {
      run_genmove(ConnectionBoard::new(cfg.game.size)?, &cfg, &moves, dump_depth)?;
    }
    (GameKind::Connection, true) => {
      run_pps(ConnectionBoard::new(cfg.game.size)?, cfg.search.max_playouts, seed);
    }
  }
  Ok(())
}
