//! Minimal demonstration binary: loads the standard opening position and
//! runs a short, bounded alpha-beta search, printing the result. The
//! line-oriented protocol frontend that would normally drive this core is
//! out of scope here.

use chess_core::config::SearchConfig;
use chess_core::position::Position;
use chess_core::search::AlphaBetaSearch;

fn main() {
    chess_core::init();

    let position = Position::from_standard();
    let mut search = AlphaBetaSearch::new(SearchConfig::default());
    search.load(&position);

    search.start(
        200_000,
        Some(2000),
        |mv| println!("bestmove {}", mv.to_uci()),
        |info| {
            let score = info
                .mate_score
                .map(|m| format!("mate {m}"))
                .unwrap_or_else(|| format!("cp {}", info.score_cp.unwrap_or(0)));
            println!(
                "info depth {} nodes {} nps {} score {}",
                info.depth, info.nodes, info.nps, score
            );
        },
    );
}
