//! Multi-threaded Monte-Carlo tree search (§4.7): each worker owns a private
//! arena and a private copy of the root position; trees share nothing, and
//! the controller (the calling thread) only samples progress, it never
//! touches a worker's tree.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SearchConfig;
use crate::error;
use crate::eval::Eval;
use crate::info::SearchInfo;
use crate::position::Position;
use crate::sync::StopFlag;
use crate::types::{Color, Move};

const EXPLORATION_C: f64 = 1.41;
const EVAL_THRESHOLD: f64 = 1200.0;
const EVAL_MAX: f64 = 0.75;
const NOISE_MAGNITUDE: f64 = 0.08;
const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);
const PUBLISH_EVERY_N_SAMPLES: u32 = 10;

#[derive(Clone, Copy)]
enum ChildSlot {
    Unexpanded,
    Invalid,
    Expanded(u32),
}

struct Node {
    move_from_parent: Move,
    side_to_move: Color,
    visits: u64,
    value: f64,
    /// Cached white-perspective outcome once this node is known terminal
    /// (draw by rule, or no legal reply once every pseudo-legal move from
    /// it has been tried and found illegal).
    terminal: Option<f64>,
    moves: Vec<Move>,
    children: Vec<ChildSlot>,
    expand_cursor: usize,
    legal_children: usize,
    fully_expanded: bool,
}

impl Node {
    fn root(side_to_move: Color, moves: Vec<Move>) -> Self {
        let children = vec![ChildSlot::Unexpanded; moves.len()];
        Node {
            move_from_parent: Move::NULL,
            side_to_move,
            visits: 0,
            value: 0.0,
            terminal: None,
            moves,
            children,
            expand_cursor: 0,
            legal_children: 0,
            fully_expanded: false,
        }
    }
}

enum ExpandOutcome {
    Terminal(f64),
    Expanded(u32),
}

#[derive(Clone, Default)]
struct WorkerSnapshot {
    nodes: u64,
    root_score: f64,
    best_move: Option<Move>,
}

struct Worker {
    arena: Vec<Node>,
    capacity: usize,
    position: Position,
    eval: Eval,
    rng: StdRng,
    root: u32,
    nodes_created: Arc<AtomicU64>,
}

impl Worker {
    fn new(root_position: Position, capacity: usize, nodes_created: Arc<AtomicU64>) -> Self {
        let side = root_position.side_to_move();
        let moves: Vec<Move> = root_position.pseudolegal_moves().iter().copied().collect();
        let mut worker = Worker {
            arena: Vec::with_capacity(1024.min(capacity)),
            capacity,
            position: root_position,
            eval: Eval::new(),
            rng: StdRng::from_entropy(),
            root: 0,
            nodes_created,
        };
        worker.arena.push(Node::root(side, moves));
        worker.nodes_created.fetch_add(1, Ordering::Relaxed);
        worker
    }

    fn alloc(&mut self, node: Node) -> u32 {
        if self.arena.len() >= self.capacity {
            error::node_arena_exhausted(self.capacity);
        }
        let handle = self.arena.len() as u32;
        self.arena.push(node);
        self.nodes_created.fetch_add(1, Ordering::Relaxed);
        handle
    }

    fn new_child(&mut self, mv: Move) -> u32 {
        let side = self.position.side_to_move();
        if self.position.is_draw() {
            let node = Node {
                move_from_parent: mv,
                side_to_move: side,
                visits: 0,
                value: 0.0,
                terminal: Some(0.0),
                moves: Vec::new(),
                children: Vec::new(),
                expand_cursor: 0,
                legal_children: 0,
                fully_expanded: true,
            };
            return self.alloc(node);
        }
        let moves: Vec<Move> = self.position.pseudolegal_moves().iter().copied().collect();
        let children = vec![ChildSlot::Unexpanded; moves.len()];
        let node = Node {
            move_from_parent: mv,
            side_to_move: side,
            visits: 0,
            value: 0.0,
            terminal: None,
            moves,
            children,
            expand_cursor: 0,
            legal_children: 0,
            fully_expanded: false,
        };
        self.alloc(node)
    }

    fn try_expand(&mut self, node: u32) -> ExpandOutcome {
        loop {
            let cursor = self.arena[node as usize].expand_cursor;
            let total = self.arena[node as usize].moves.len();
            if cursor >= total {
                self.arena[node as usize].fully_expanded = true;
                let white_value = if self.position.in_check() {
                    -f64::from(self.position.side_to_move().sign())
                } else {
                    0.0
                };
                self.arena[node as usize].terminal = Some(white_value);
                return ExpandOutcome::Terminal(white_value);
            }
            let mv = self.arena[node as usize].moves[cursor];
            self.arena[node as usize].expand_cursor += 1;
            if self.position.make_move(mv) {
                let child = self.new_child(mv);
                self.arena[node as usize].children[cursor] = ChildSlot::Expanded(child);
                self.arena[node as usize].legal_children += 1;
                if self.arena[node as usize].expand_cursor == total {
                    self.arena[node as usize].fully_expanded = true;
                }
                return ExpandOutcome::Expanded(child);
            }
            self.position.unmake_move();
            self.arena[node as usize].children[cursor] = ChildSlot::Invalid;
        }
    }

    fn select_uct(&self, node: u32) -> u32 {
        let parent_visits = (self.arena[node as usize].visits.max(1)) as f64;
        let ln_parent = parent_visits.ln();
        let mut best = u32::MAX;
        let mut best_score = f64::NEG_INFINITY;
        for slot in &self.arena[node as usize].children {
            if let ChildSlot::Expanded(h) = *slot {
                let c = &self.arena[h as usize];
                let visits = (c.visits.max(1)) as f64;
                let score = c.value / visits + EXPLORATION_C * (ln_parent / visits).sqrt();
                if score > best_score {
                    best_score = score;
                    best = h;
                }
            }
        }
        best
    }

    fn sample_noise(&mut self) -> f64 {
        let sum: f64 = (0..6).map(|_| self.rng.gen::<f64>()).sum();
        (sum - 6.0) / 6.0 * NOISE_MAGNITUDE
    }

    fn evaluate_leaf(&mut self, child: u32) -> f64 {
        let side = self.arena[child as usize].side_to_move;
        let cp = self.eval.evaluate(self.position.board(), side);
        let raw = (f64::from(cp) / EVAL_THRESHOLD).clamp(-EVAL_MAX, EVAL_MAX);
        let noise = self.sample_noise();
        let relative = (raw + noise).clamp(-EVAL_MAX, EVAL_MAX);
        relative * f64::from(side.sign())
    }

    fn backprop(&mut self, path: &[u32], white_value: f64) {
        for &h in path {
            let node = &mut self.arena[h as usize];
            node.visits += 1;
            node.value += 0.5 + f64::from(node.side_to_move.sign()) * white_value / 2.0;
        }
    }

    /// Runs one select-expand-evaluate-backpropagate cycle from the root.
    fn playout(&mut self) {
        let mut path = vec![self.root];
        let mut plies_made = 0usize;
        let mut node = self.root;

        let outcome = loop {
            if let Some(v) = self.arena[node as usize].terminal {
                break v;
            }
            if !self.arena[node as usize].fully_expanded {
                match self.try_expand(node) {
                    ExpandOutcome::Terminal(v) => break v,
                    ExpandOutcome::Expanded(child) => {
                        plies_made += 1;
                        path.push(child);
                        let v = self.evaluate_leaf(child);
                        break v;
                    }
                }
            } else {
                let child = self.select_uct(node);
                let mv = self.arena[child as usize].move_from_parent;
                self.position.make_move(mv);
                plies_made += 1;
                path.push(child);
                node = child;
            }
        };

        self.backprop(&path, outcome);
        for _ in 0..plies_made {
            self.position.unmake_move();
        }
    }

    fn snapshot(&self) -> WorkerSnapshot {
        let root = &self.arena[self.root as usize];
        let mut best_move = None;
        let mut best_visits = 0u64;
        for slot in &root.children {
            if let ChildSlot::Expanded(h) = *slot {
                let c = &self.arena[h as usize];
                if c.visits >= best_visits {
                    best_visits = c.visits;
                    best_move = Some(c.move_from_parent);
                }
            }
        }
        let root_score = if root.visits == 0 { 0.0 } else { root.value / root.visits as f64 };
        WorkerSnapshot { nodes: self.arena.len() as u64, root_score, best_move }
    }
}

fn run_worker(
    root_position: Position,
    capacity: usize,
    stop: StopFlag,
    nodes_created: Arc<AtomicU64>,
    shared: Arc<Mutex<WorkerSnapshot>>,
) {
    let mut worker = Worker::new(root_position, capacity, nodes_created);
    loop {
        if stop.is_stopped() {
            break;
        }
        worker.playout();
        *shared.lock() = worker.snapshot();
    }
    *shared.lock() = worker.snapshot();
}

/// Anytime, value-in-[-1,+1] driver (§4.7). One instance per game; `load`
/// a root, then `start` with a node/time budget.
pub struct MctsSearch {
    config: SearchConfig,
    root: Position,
    stop: StopFlag,
    running: Arc<AtomicBool>,
}

impl MctsSearch {
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        MctsSearch { config, root: Position::from_standard(), stop: StopFlag::new(), running: Arc::new(AtomicBool::new(false)) }
    }

    pub fn load(&mut self, position: &Position) {
        self.root = position.clone();
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn start(
        &mut self,
        max_nodes: u64,
        movetime_ms: Option<u64>,
        mut bestmove_cb: impl FnMut(Move),
        mut info_cb: impl FnMut(SearchInfo),
    ) {
        if self.running.swap(true, Ordering::AcqRel) {
            #[cfg(feature = "logging")]
            log::warn!("MctsSearch::start called while a search is already running");
            return;
        }

        self.stop.reset();
        let deadline = movetime_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
        let nodes_created = Arc::new(AtomicU64::new(0));
        let snapshots: Vec<Arc<Mutex<WorkerSnapshot>>> =
            (0..self.config.workers).map(|_| Arc::new(Mutex::new(WorkerSnapshot::default()))).collect();

        let mut handles = Vec::with_capacity(self.config.workers);
        for shared in &snapshots {
            let root = self.root.clone();
            let stop = self.stop.clone();
            let nodes_created = Arc::clone(&nodes_created);
            let shared = Arc::clone(shared);
            let capacity = self.config.mcts_arena_capacity;
            handles.push(thread::spawn(move || run_worker(root, capacity, stop, nodes_created, shared)));
        }

        let search_start = Instant::now();
        let mut sample_count = 0u32;
        loop {
            thread::sleep(SAMPLE_INTERVAL);
            sample_count += 1;

            let total_nodes = nodes_created.load(Ordering::Relaxed);
            if sample_count % PUBLISH_EVERY_N_SAMPLES == 0 {
                let avg_score: f64 = snapshots.iter().map(|s| s.lock().root_score).sum::<f64>() / snapshots.len().max(1) as f64;
                let elapsed_ms = search_start.elapsed().as_millis() as u64;
                let score_cp = (avg_score * EVAL_THRESHOLD) as i32;
                info_cb(SearchInfo {
                    depth: 0,
                    nodes: total_nodes,
                    elapsed_ms,
                    nps: SearchInfo::nps_from(total_nodes, elapsed_ms),
                    side_to_move: Some(self.root.side_to_move()),
                    score_cp: Some(score_cp * self.root.side_to_move().sign()),
                    mate_score: None,
                    pv: Vec::new(),
                });
            }

            if self.stop.is_stopped() {
                break;
            }
            if max_nodes != 0 && total_nodes >= max_nodes {
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

        let chosen = rand::thread_rng().gen_range(0..snapshots.len().max(1));
        let best_move = snapshots.get(chosen).and_then(|s| s.lock().best_move);
        if let Some(mv) = best_move {
            bestmove_cb(mv);
        }
    }
}
