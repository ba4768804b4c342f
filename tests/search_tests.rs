//! Search tests verifying the engine finds correct moves in various positions.

use chess_core::config::SearchConfig;
use chess_core::eval::Eval;
use chess_core::position::Position;
use chess_core::search::AlphaBetaSearch;
use chess_core::types::Move;

fn init() {
    chess_core::init();
}

/// Exhausts `pseudolegal_moves` through `make_move`/`unmake_move`, the same
/// way `negamax`'s terminal check does (src/search.rs) — the crate itself
/// exposes no standalone `is_checkmate`/`is_stalemate` query.
fn has_legal_move(pos: &mut Position) -> bool {
    for mv in pos.pseudolegal_moves().iter() {
        if pos.make_move(mv) {
            pos.unmake_move();
            return true;
        }
        pos.unmake_move();
    }
    false
}

fn is_checkmate(pos: &mut Position) -> bool {
    pos.in_check() && !has_legal_move(pos)
}

fn is_stalemate(pos: &mut Position) -> bool {
    !pos.in_check() && !has_legal_move(pos)
}

fn best_move(fen: &str, movetime_ms: u64) -> Option<Move> {
    let pos = Position::from_fen(fen).expect("valid fen");
    let mut search = AlphaBetaSearch::new(SearchConfig::new(1, 1, 0));
    search.load(&pos);
    let mut found = None;
    search.start(200_000, Some(movetime_ms), |mv| found = Some(mv), |_info| {});
    found
}

#[test]
fn finds_mate_in_one_back_rank() {
    init();
    // White to move, Qe8# is mate.
    let mv = best_move("6k1/5ppp/8/8/8/8/8/4Q2K w - - 0 1", 5000).expect("should find a move");
    assert_eq!(mv.to_uci(), "e1e8", "should find Qe8# (back rank mate)");
}

#[test]
fn finds_mate_in_one_queen() {
    init();
    // White to move, Qxf7# is mate (scholar's mate pattern).
    let mv = best_move("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 0 4", 5000)
        .expect("should find a move");
    assert_eq!(mv.to_uci(), "h5f7", "should find Qxf7# (scholar's mate)");
}

#[test]
fn avoids_hanging_queen() {
    init();
    let mv = best_move("r1bqkbnr/pppppppp/2n5/8/4P3/5Q2/PPPP1PPP/RNB1KBNR w KQkq - 0 3", 5000)
        .expect("should find a move");
    assert_ne!(mv.to_uci(), "f3c6", "should not hang the queen on c6");
}

#[test]
fn captures_free_piece() {
    init();
    let fen = "rnbqk1nr/pppp1ppp/2b5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 0 4";
    let mv = best_move(fen, 5000).expect("should find a move");
    assert!(
        mv.is_capture() || mv.to_uci() == "c4f7",
        "should capture material or threaten the king"
    );
}

#[test]
fn iterative_deepening_agrees_on_legality() {
    init();
    let pos = Position::from_standard();
    for movetime in [50, 300] {
        let mv = best_move(&pos.to_fen(), movetime).expect("should find a move");
        let mut check = pos.clone();
        assert!(check.make_move(mv), "move returned by search must be legal");
    }
}

#[test]
fn single_legal_move() {
    init();
    // White king on a1 can only escape to a2.
    let mv = best_move("8/8/8/8/8/8/8/K6rk w - - 0 1", 5000).expect("should find a move");
    assert_eq!(mv.to_uci(), "a1a2", "only legal move should be Ka2");
}

#[test]
fn no_move_in_checkmate() {
    init();
    let mut pos = Position::from_fen("rnb1kbnr/pppp1ppp/4p3/8/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 1").unwrap();
    assert!(is_checkmate(&mut pos), "position should be checkmate");
    assert!(best_move(&pos.to_fen(), 5000).is_none(), "should return no move in checkmate");
}

#[test]
fn handles_draw_by_repetition() {
    init();
    let mut pos = Position::from_standard();
    for uci in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
        pos.make_move_uci(uci).expect("legal uci move");
    }
    assert!(pos.is_draw(), "should be a draw by repetition");
}

#[test]
fn evaluation_symmetry() {
    init();
    let pos = Position::from_standard();
    let eval = Eval::new();
    let score = eval.evaluate(pos.board(), pos.side_to_move());
    assert!(score.abs() < 50, "starting position should be roughly equal (eval: {score})");
}

#[test]
fn evaluation_material_advantage() {
    init();
    let eval = Eval::new();

    let white_up = Position::from_fen("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    let score_white_up = eval.evaluate(white_up.board(), white_up.side_to_move());
    assert!(score_white_up > 800, "white up a queen should be very positive (eval: {score_white_up})");

    let black_up = Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB1KBNR w KQkq - 0 1").unwrap();
    let score_black_up = eval.evaluate(black_up.board(), black_up.side_to_move());
    assert!(score_black_up < -800, "black up a queen should be very negative (eval: {score_black_up})");
}

#[test]
fn search_completes_within_a_short_time_budget() {
    init();
    let pos = Position::from_standard();
    let mut search = AlphaBetaSearch::new(SearchConfig::new(1, 1, 0));
    search.load(&pos);
    let start = std::time::Instant::now();
    let mut found = None;
    search.start(u64::MAX, Some(500), |mv| found = Some(mv), |_info| {});
    assert!(found.is_some(), "should find a move within the time budget");
    assert!(start.elapsed().as_secs() < 5, "search overran its time budget");
}

#[test]
fn identifies_stalemate() {
    init();
    // Black to move, king on a8, white queen b6, white king c6: classic stalemate.
    let mut pos = Position::from_fen("k7/8/1QK5/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(is_stalemate(&mut pos), "position should be stalemate");
    assert!(!is_checkmate(&mut pos), "position should not be checkmate");
}

#[test]
fn fifty_move_rule() {
    init();
    let pos = Position::from_fen("8/8/8/8/8/8/8/K1k5 w - - 100 1").unwrap();
    assert!(pos.is_draw(), "position with a 100 halfmove clock should be a draw");
}

#[test]
fn finds_a_move_in_a_sharp_attacking_position() {
    init();
    // Black to move with an exposed white king; search must return some legal move.
    let mv = best_move("6k1/pp4pp/8/8/8/8/PP4PP/1q4K1 b - - 0 1", 5000);
    assert!(mv.is_some(), "should find a move in this position");
}
