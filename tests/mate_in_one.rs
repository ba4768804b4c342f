//! A small mate-in-one suite: each entry is a position with a forced mate,
//! verified two ways — the search driver must find a mating move, and
//! playing that move must leave the opponent checkmated.

use chess_core::config::SearchConfig;
use chess_core::position::Position;
use chess_core::search::AlphaBetaSearch;

fn init() {
    chess_core::init();
}

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

/// (fen, description) pairs, each with a forced mate in one for the side to move.
const MATE_IN_ONE: &[(&str, &str)] = &[
    ("6k1/5ppp/8/8/8/8/8/4Q2K w - - 0 1", "queen back-rank mate"),
    ("6k1/5ppp/8/8/8/8/8/R6K w - - 0 1", "rook back-rank mate"),
    ("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 0 4", "scholar's mate"),
    ("4k3/R7/4K3/8/8/8/8/8 w - - 0 1", "king-supported rook ladder mate"),
];

#[test]
fn mate_in_one_suite() {
    init();
    for &(fen, description) in MATE_IN_ONE {
        let pos = Position::from_fen(fen).expect("valid fen");
        let mut search = AlphaBetaSearch::new(SearchConfig::new(1, 1, 0));
        search.load(&pos);

        let mut found = None;
        search.start(200_000, Some(3000), |mv| found = Some(mv), |_info| {});
        let mv = found.unwrap_or_else(|| panic!("{description}: search found no move for {fen}"));

        let mut after = pos.clone();
        assert!(after.make_move(mv), "{description}: search returned an illegal move");
        assert!(
            is_checkmate(&mut after),
            "{description}: {} is not checkmate after {} from {fen}",
            after.to_fen(),
            mv.to_uci(),
        );
    }
}

#[test]
fn mate_in_one_positions_are_not_already_mate() {
    init();
    for &(fen, description) in MATE_IN_ONE {
        let mut pos = Position::from_fen(fen).expect("valid fen");
        assert!(!is_checkmate(&mut pos), "{description}: {fen} should not already be checkmate");
    }
}
