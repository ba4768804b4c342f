use std::sync::{Arc, Mutex};

use chess_core::config::SearchConfig;
use chess_core::position::Position;
use chess_core::search::AlphaBetaSearch;
use chess_core::types::Move;

fn run_fixed_nodes(max_nodes: u64) -> Option<Move> {
    chess_core::init();
    let pos = Position::from_standard();

    let mut search = AlphaBetaSearch::new(SearchConfig::new(1, 1, 0));
    search.load(&pos);

    let found = Arc::new(Mutex::new(None));
    let found_cb = Arc::clone(&found);
    search.start(max_nodes, None, move |mv| *found_cb.lock().unwrap() = Some(mv), |_info| {});
    found.lock().unwrap().take()
}

#[test]
fn fixed_node_search_returns_a_move_from_the_opening() {
    let mv = run_fixed_nodes(20_000);
    assert!(mv.is_some(), "a single-worker fixed-node search should return a move");
}

#[test]
fn time_limited_search_returns_within_budget() {
    chess_core::init();
    let pos = Position::from_standard();
    let mut search = AlphaBetaSearch::new(SearchConfig::new(1, 1, 0));
    search.load(&pos);

    let start = std::time::Instant::now();
    search.start(u64::MAX, Some(50), |_mv| {}, |_info| {});
    let elapsed = start.elapsed();

    assert!(elapsed.as_millis() < 2000, "a 50ms deadline should not run for seconds: {elapsed:?}");
}
