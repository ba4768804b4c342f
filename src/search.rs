//! Lazy-SMP iterative-deepening alpha-beta search (§4.6): a control thread
//! drives iterative deepening and publishes progress after each completed
//! depth, while N-1 auxiliary workers run the same deepening independently
//! on private root copies, sharing only the transposition table.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::SearchConfig;
use crate::eval::Eval;
use crate::info::SearchInfo;
use crate::ordering::{score_moves, OrderingContext};
use crate::position::Position;
use crate::see::see;
use crate::sync::StopFlag;
use crate::timer::DeadlineTimer;
use crate::transposition_table::{BoundType, TranspositionTable};
use crate::types::{Move, MAX_MOVES, MAX_PLY};

/// Mate score magnitude; a forced mate in `n` plies is reported as
/// `MATE - n` (from the winning side's perspective).
pub const MATE: i32 = 30_000;
pub const WIN: i32 = MATE;
pub const LOSS: i32 = -MATE;

/// Raised by `?` whenever the stop flag is observed mid-recursion, so an
/// aborted iteration unwinds without polluting the transposition table or
/// producing a partial score.
struct Incomplete;

type NResult = Result<i32, Incomplete>;

struct SharedTt(Mutex<TranspositionTable>);

impl SharedTt {
    fn new(size_mb: usize) -> Option<Arc<Self>> {
        if size_mb == 0 {
            None
        } else {
            Some(Arc::new(SharedTt(Mutex::new(TranspositionTable::new(size_mb)))))
        }
    }
}

fn probe_hash_move(tt: Option<&Arc<SharedTt>>, hash: u64) -> Option<Move> {
    tt.and_then(|tt| tt.0.lock().probe(hash).and_then(|e| e.best_move))
}

#[allow(clippy::too_many_arguments)]
fn negamax(
    pos: &mut Position,
    tt: Option<&Arc<SharedTt>>,
    eval: &Eval,
    ctx: &mut OrderingContext,
    stop: &StopFlag,
    nodes: &AtomicU64,
    max_nodes: u64,
    depth: u32,
    mut alpha: i32,
    beta: i32,
    ply: u32,
) -> NResult {
    if stop.is_stopped() {
        return Err(Incomplete);
    }
    if max_nodes != 0 && nodes.load(Ordering::Relaxed) >= max_nodes {
        stop.stop();
        return Err(Incomplete);
    }
    nodes.fetch_add(1, Ordering::Relaxed);

    if pos.is_draw() {
        return Ok(0);
    }

    if depth == 0 {
        return quiesce(pos, tt, eval, ctx, stop, nodes, max_nodes, alpha, beta, ply);
    }

    let original_alpha = alpha;
    let mut beta = beta;
    let hash = pos.hash();
    let mut hash_move = None;

    if let Some(tt) = tt {
        let table = tt.0.lock();
        if let Some(entry) = table.probe(hash) {
            hash_move = entry.best_move;
            if entry.depth >= depth {
                match entry.bound_type {
                    BoundType::Exact => return Ok(entry.score),
                    BoundType::LowerBound => alpha = alpha.max(entry.score),
                    BoundType::UpperBound => beta = beta.min(entry.score),
                }
                if alpha >= beta {
                    return Ok(entry.score);
                }
            }
        }
    }

    let side = pos.side_to_move();
    let moves = pos.pseudolegal_moves();
    let mut scores = [0i32; MAX_MOVES];
    score_moves(ctx, pos.board(), side, &moves, hash_move, &mut scores);
    let mut moves = moves;

    let mut best_score = LOSS - 1;
    let mut best_move = None;
    let mut legal_count = 0u32;

    for i in 0..moves.len() {
        moves.pick_best(i, &mut scores[..moves.len()]);
        let mv = moves.as_slice()[i];
        if !pos.make_move(mv) {
            pos.unmake_move();
            continue;
        }
        legal_count += 1;
        let child = negamax(pos, tt, eval, ctx, stop, nodes, max_nodes, depth - 1, -beta, -alpha, ply + 1);
        pos.unmake_move();
        let score = -child?;

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            if !mv.is_capture() {
                ctx.record_history(side, mv.from(), mv.to(), (depth * depth) as i32);
            }
            break;
        }
    }

    if legal_count == 0 {
        return Ok(if pos.in_check() { LOSS + ply as i32 } else { 0 });
    }

    if let Some(tt) = tt {
        let bound_type = if best_score <= original_alpha {
            BoundType::UpperBound
        } else if best_score >= beta {
            BoundType::LowerBound
        } else {
            BoundType::Exact
        };
        tt.0.lock().store(hash, depth, best_score, bound_type, best_move);
    }

    Ok(best_score)
}

#[allow(clippy::too_many_arguments)]
fn quiesce(
    pos: &mut Position,
    tt: Option<&Arc<SharedTt>>,
    eval: &Eval,
    ctx: &mut OrderingContext,
    stop: &StopFlag,
    nodes: &AtomicU64,
    max_nodes: u64,
    mut alpha: i32,
    beta: i32,
    ply: u32,
) -> NResult {
    if stop.is_stopped() {
        return Err(Incomplete);
    }
    if max_nodes != 0 && nodes.load(Ordering::Relaxed) >= max_nodes {
        stop.stop();
        return Err(Incomplete);
    }
    nodes.fetch_add(1, Ordering::Relaxed);

    let side = pos.side_to_move();
    let stand_pat = eval.evaluate(pos.board(), side);
    if stand_pat >= beta {
        return Ok(stand_pat);
    }
    alpha = alpha.max(stand_pat);

    if ply as usize >= MAX_PLY {
        return Ok(stand_pat);
    }

    let moves = pos.pseudolegal_moves_quiescence();
    let mut scores = [0i32; MAX_MOVES];
    score_moves(ctx, pos.board(), side, &moves, None, &mut scores);
    let mut moves = moves;

    let mut best = stand_pat;
    for i in 0..moves.len() {
        moves.pick_best(i, &mut scores[..moves.len()]);
        let mv = moves.as_slice()[i];
        if mv.is_capture() && see(pos.board(), mv) < 0 {
            continue;
        }
        if !pos.make_move(mv) {
            pos.unmake_move();
            continue;
        }
        let child = quiesce(pos, tt, eval, ctx, stop, nodes, max_nodes, -beta, -alpha, ply + 1);
        pos.unmake_move();
        let score = -child?;

        if score > best {
            best = score;
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            break;
        }
    }

    Ok(best)
}

/// Root-level search: identical recursion to `negamax` but also returns the
/// move that produced the best score, since the root is where a PV first
/// move is read off for the progress callback and the final best-move.
#[allow(clippy::too_many_arguments)]
fn search_root(
    pos: &mut Position,
    tt: Option<&Arc<SharedTt>>,
    eval: &Eval,
    ctx: &mut OrderingContext,
    stop: &StopFlag,
    nodes: &AtomicU64,
    max_nodes: u64,
    depth: u32,
) -> Result<(i32, Option<Move>), Incomplete> {
    if stop.is_stopped() {
        return Err(Incomplete);
    }

    let side = pos.side_to_move();
    let hash_move = probe_hash_move(tt, pos.hash());
    let moves = pos.pseudolegal_moves();
    let mut scores = [0i32; MAX_MOVES];
    score_moves(ctx, pos.board(), side, &moves, hash_move, &mut scores);
    let mut moves = moves;

    let mut alpha = LOSS;
    let beta = WIN;
    let mut best_score = LOSS - 1;
    let mut best_move = None;
    let mut legal_count = 0u32;

    for i in 0..moves.len() {
        moves.pick_best(i, &mut scores[..moves.len()]);
        let mv = moves.as_slice()[i];
        if !pos.make_move(mv) {
            pos.unmake_move();
            continue;
        }
        legal_count += 1;
        let child = negamax(pos, tt, eval, ctx, stop, nodes, max_nodes, depth - 1, -beta, -alpha, 1);
        pos.unmake_move();
        let score = -child?;

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
        }
        if score > alpha {
            alpha = score;
        }
    }

    if legal_count == 0 {
        let score = if pos.in_check() { LOSS } else { 0 };
        return Ok((score, None));
    }

    if let Some(tt) = tt {
        tt.0.lock().store(pos.hash(), depth, best_score, BoundType::Exact, best_move);
    }

    Ok((best_score, best_move))
}

fn collect_pv(root: &Position, tt: Option<&Arc<SharedTt>>, max_len: u32) -> Vec<Move> {
    let mut pv = Vec::new();
    let Some(tt) = tt else { return pv };
    let mut pos = root.clone();
    for _ in 0..max_len {
        let Some(mv) = tt.0.lock().probe(pos.hash()).and_then(|e| e.best_move) else { break };
        if !pos.make_move(mv) {
            pos.unmake_move();
            break;
        }
        pv.push(mv);
    }
    pv
}

fn run_worker(mut root: Position, tt: Option<Arc<SharedTt>>, stop: StopFlag, nodes: Arc<AtomicU64>, max_nodes: u64) {
    let eval = Eval::new();
    let mut ctx = OrderingContext::new();
    for depth in 1..=MAX_PLY as u32 {
        if stop.is_stopped() {
            return;
        }
        if search_root(&mut root, tt.as_ref(), &eval, &mut ctx, &stop, &nodes, max_nodes, depth).is_err() {
            return;
        }
    }
}

/// Depth-limited Lazy-SMP driver (§4.6). One instance is constructed per
/// game, `load`ed with a root position, and `start`ed with a node/time
/// budget; callbacks are invoked from the calling thread.
pub struct AlphaBetaSearch {
    config: SearchConfig,
    tt: Option<Arc<SharedTt>>,
    eval: Eval,
    root: Position,
    stop: StopFlag,
    running: Arc<AtomicBool>,
}

impl AlphaBetaSearch {
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        AlphaBetaSearch {
            tt: SharedTt::new(config.tt_size_mb),
            config,
            eval: Eval::new(),
            root: Position::from_standard(),
            stop: StopFlag::new(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn load(&mut self, position: &Position) {
        self.root = position.clone();
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Runs iterative deepening to completion (or until `stop`/budget is
    /// hit), invoking `info_cb` after every completed depth and
    /// `bestmove_cb` exactly once at the end, from the calling thread.
    pub fn start(
        &mut self,
        max_nodes: u64,
        movetime_ms: Option<u64>,
        mut bestmove_cb: impl FnMut(Move),
        mut info_cb: impl FnMut(SearchInfo),
    ) {
        if self.running.swap(true, Ordering::AcqRel) {
            #[cfg(feature = "logging")]
            log::warn!("AlphaBetaSearch::start called while a search is already running");
            return;
        }

        self.stop.reset();
        let deadline = movetime_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
        let _timer = deadline.and_then(|d| DeadlineTimer::start_at(Some(d), self.stop.clone()));

        let worker_count = self.config.workers.saturating_sub(1);
        let node_counter = Arc::new(AtomicU64::new(0));
        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let root = self.root.clone();
            let stop = self.stop.clone();
            let tt = self.tt.clone();
            let nodes = Arc::clone(&node_counter);
            handles.push(thread::spawn(move || run_worker(root, tt, stop, nodes, max_nodes)));
        }

        let side = self.root.side_to_move();
        let search_start = Instant::now();
        let mut ctx = OrderingContext::new();
        let mut best_move = None;

        for depth in 1..=MAX_PLY as u32 {
            if self.stop.is_stopped() {
                break;
            }
            match search_root(&mut self.root, self.tt.as_ref(), &self.eval, &mut ctx, &self.stop, &node_counter, max_nodes, depth) {
                Ok((score, mv)) => {
                    if mv.is_some() {
                        best_move = mv;
                    }
                    let elapsed_ms = search_start.elapsed().as_millis() as u64;
                    let nodes = node_counter.load(Ordering::Relaxed);
                    let display_score = score * side.sign();
                    let mut info = SearchInfo {
                        depth,
                        nodes,
                        elapsed_ms,
                        nps: SearchInfo::nps_from(nodes, elapsed_ms),
                        side_to_move: Some(side),
                        score_cp: None,
                        mate_score: None,
                        pv: collect_pv(&self.root, self.tt.as_ref(), depth),
                    };
                    if display_score.abs() >= MATE - MAX_PLY as i32 {
                        let plies = MATE - display_score.abs();
                        let moves_to_mate = (plies + 1) / 2;
                        info.mate_score = Some(if display_score > 0 { moves_to_mate } else { -moves_to_mate });
                    } else {
                        info.score_cp = Some(display_score);
                    }
                    info_cb(info);

                    if mv.is_none() {
                        break;
                    }
                }
                Err(Incomplete) => break,
            }

            if max_nodes != 0 && node_counter.load(Ordering::Relaxed) >= max_nodes {
                break;
            }
            if let Some(d) = deadline {
                if Instant::now() >= d {
                    break;
                }
            }
        }

        self.stop.stop();
        for handle in handles {
            let _ = handle.join();
        }
        self.running.store(false, Ordering::Release);

        if let Some(mv) = best_move {
            bestmove_cb(mv);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attacks;
    use crate::zobrist;

    fn init() {
        zobrist::init();
        attacks::init();
    }

    #[test]
    fn finds_mate_in_one() {
        init();
        let pos = Position::from_fen("r1bqkbnr/pp1ppppp/2p5/2n5/2B1P3/5Q2/PPPP1PPP/RNB1K1NR w KQkq - 0 1").unwrap();
        let mut search = AlphaBetaSearch::new(SearchConfig::new(1, 1, 0));
        search.load(&pos);
        let mut found = None;
        let mut last_mate = None;
        search.start(
            60_000,
            None,
            |mv| found = Some(mv),
            |info| {
                if let Some(m) = info.mate_score {
                    last_mate = Some(m);
                }
            },
        );
        let mv = found.expect("search should find a move");
        assert_eq!(mv.to().file(), 5);
        assert_eq!(mv.to().rank(), 6);
        assert_eq!(last_mate, Some(1));
    }

    #[test]
    fn reports_a_legal_move_from_the_standard_opening() {
        init();
        let pos = Position::from_standard();
        let mut search = AlphaBetaSearch::new(SearchConfig::new(2, 1, 0));
        search.load(&pos);
        let mut found = None;
        search.start(50_000, None, |mv| found = Some(mv), |_info| {});
        assert!(found.is_some());
    }
}
