//! Property-based tests covering the invariants a hand-picked example
//! cannot exhaustively probe: make/unmake reversibility, hash/FEN
//! round-tripping, legality of generated moves, and bounds on SEE and
//! static evaluation.

use proptest::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;

use chess_core::eval::Eval;
use chess_core::position::Position;
use chess_core::see;

fn init() {
    chess_core::init();
}

fn random_walk(pos: &mut Position, rng: &mut StdRng, max_moves: usize) -> Vec<chess_core::types::Move> {
    let mut played = Vec::new();
    for _ in 0..max_moves {
        let moves = pos.pseudolegal_moves();
        if moves.len() == 0 {
            break;
        }
        let mut order: Vec<usize> = (0..moves.len()).collect();
        order.shuffle(rng);
        let mut made = false;
        for idx in order {
            let mv = moves.as_slice()[idx];
            if pos.make_move(mv) {
                played.push(mv);
                made = true;
                break;
            }
            pos.unmake_move();
        }
        if !made {
            break;
        }
    }
    played
}

proptest! {
    /// make_move followed by unmake_move restores hash and FEN exactly,
    /// for any random legal walk from the opening.
    #[test]
    fn prop_make_unmake_restores_state(seed in any::<u64>(), num_moves in 1usize..20) {
        init();
        let mut pos = Position::from_standard();
        let initial_hash = pos.hash();
        let initial_fen = pos.to_fen();

        let mut rng = StdRng::seed_from_u64(seed);
        let played = random_walk(&mut pos, &mut rng, num_moves);

        for _ in &played {
            pos.unmake_move();
        }

        prop_assert_eq!(pos.hash(), initial_hash);
        prop_assert_eq!(pos.to_fen(), initial_fen);
    }

    /// A FEN printed from a reached position and re-parsed describes the
    /// same position (hash, side to move, castling rights all agree).
    #[test]
    fn prop_fen_roundtrip(seed in any::<u64>(), num_moves in 0usize..20) {
        init();
        let mut pos = Position::from_standard();
        let mut rng = StdRng::seed_from_u64(seed);
        random_walk(&mut pos, &mut rng, num_moves);

        let fen = pos.to_fen();
        let restored = Position::from_fen(&fen).expect("round-tripped fen must reparse");

        prop_assert_eq!(pos.hash(), restored.hash());
        prop_assert_eq!(pos.side_to_move(), restored.side_to_move());
        prop_assert_eq!(pos.castling_rights(), restored.castling_rights());
        prop_assert_eq!(pos.en_passant_target(), restored.en_passant_target());
    }

    /// Every move make_move accepts must leave the mover's own king safe -
    /// that is exactly what the boolean return promises.
    #[test]
    fn prop_accepted_moves_never_self_check(seed in any::<u64>()) {
        init();
        let mut pos = Position::from_standard();
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..15 {
            let moves = pos.pseudolegal_moves();
            if moves.len() == 0 {
                break;
            }
            let mover = pos.side_to_move();
            let mut legal_found = false;
            for mv in moves.iter() {
                if pos.make_move(*mv) {
                    let king = pos.board().king_square(mover);
                    prop_assert!(!pos.board().is_attacked(king, mover.opponent()));
                    pos.unmake_move();
                    legal_found = true;
                } else {
                    pos.unmake_move();
                }
            }
            if !legal_found {
                break;
            }
            let idx = rng.gen_range(0..moves.len());
            if !pos.make_move(moves.as_slice()[idx]) {
                pos.unmake_move();
            }
        }
    }

    /// SEE on a capture never exceeds the material value of the captured
    /// piece - the best a side can do is win exactly what is standing there.
    #[test]
    fn prop_see_bounded_by_victim_value(seed in any::<u64>(), num_moves in 0usize..15) {
        init();
        let mut pos = Position::from_standard();
        let mut rng = StdRng::seed_from_u64(seed);
        random_walk(&mut pos, &mut rng, num_moves);

        for mv in pos.pseudolegal_moves().iter() {
            if !mv.is_capture() {
                continue;
            }
            if let Some((_, victim)) = pos.board().piece_at(mv.to()) {
                let score = see::see(pos.board(), *mv);
                prop_assert!(
                    score <= victim.value(),
                    "see {score} exceeds victim value for {mv:?}"
                );
            }
        }
    }

    /// Static evaluation stays within a material-plausible range; it should
    /// never blow up regardless of how the random walk shuffled material.
    #[test]
    fn prop_eval_is_bounded(seed in any::<u64>(), num_moves in 0usize..30) {
        init();
        let mut pos = Position::from_standard();
        let mut rng = StdRng::seed_from_u64(seed);
        random_walk(&mut pos, &mut rng, num_moves);

        let eval = Eval::new();
        let score = eval.evaluate(pos.board(), pos.side_to_move());
        prop_assert!(score.abs() < 10_000, "evaluation {score} is unreasonably large");
    }
}
