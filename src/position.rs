//! `Position`: a `Board` plus side-to-move, castling rights, en-passant
//! target, and a full move-history stack, with reversible `make_move` /
//! `unmake_move`.

use crate::board::Board;
use crate::error::{FenError, MoveParseError};
use crate::movegen;
use crate::types::{CastlingRights, Color, Move, MoveList, Piece, Square};
use crate::zobrist;

/// One history frame: everything needed to undo a single `make_move`, plus
/// enough state to answer repetition/draw queries without re-deriving it
/// from the board.
#[derive(Clone, Copy, Debug)]
pub struct Ply {
    pub mv: Move,
    pub captured: Option<(Color, Piece)>,
    pub captured_square: Option<Square>,
    pub castling_rights: CastlingRights,
    pub en_passant_target: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    pub in_check: bool,
    pub was_castle: bool,
    pub was_en_passant: bool,
    /// Full position key: board placement XOR side-to-move XOR castle XOR ep.
    pub key: u64,
}

impl Ply {
    fn root(castling_rights: CastlingRights, en_passant_target: Option<Square>, key: u64) -> Self {
        Ply {
            mv: Move::NULL,
            captured: None,
            captured_square: None,
            castling_rights,
            en_passant_target,
            halfmove_clock: 0,
            fullmove_number: 1,
            in_check: false,
            was_castle: false,
            was_en_passant: false,
            key,
        }
    }
}

#[derive(Clone)]
pub struct Position {
    board: Board,
    side_to_move: Color,
    history: Vec<Ply>,
}

fn compose_key(board_hash: u64, side_to_move: Color, castling_rights: CastlingRights, ep: Option<Square>) -> u64 {
    let mut key = board_hash;
    if side_to_move == Color::Black {
        key ^= zobrist::black_to_move_key();
    }
    for &color in &[Color::White, Color::Black] {
        for &kingside in &[true, false] {
            if castling_rights.has(color, kingside) {
                key ^= zobrist::castling_key(color, kingside);
            }
        }
    }
    if let Some(sq) = ep {
        key ^= zobrist::en_passant_key(sq.file());
    }
    key
}

impl Position {
    #[must_use]
    pub fn from_standard() -> Self {
        let board = Board::starting_position();
        let castling_rights = CastlingRights::all();
        let key = compose_key(board.hash(), Color::White, castling_rights, None);
        Position { board, side_to_move: Color::White, history: vec![Ply::root(castling_rights, None, key)] }
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    #[must_use]
    fn top(&self) -> &Ply {
        self.history.last().expect("Position always carries at least the root frame")
    }

    #[inline]
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.top().key
    }

    #[inline]
    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.top().halfmove_clock
    }

    #[inline]
    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.top().fullmove_number
    }

    #[inline]
    #[must_use]
    pub fn en_passant_target(&self) -> Option<Square> {
        self.top().en_passant_target
    }

    #[inline]
    #[must_use]
    pub fn castling_rights(&self) -> CastlingRights {
        self.top().castling_rights
    }

    #[inline]
    #[must_use]
    pub fn in_check(&self) -> bool {
        self.top().in_check
    }

    #[inline]
    #[must_use]
    pub fn ply_count(&self) -> usize {
        self.history.len() - 1
    }

    /// Count of frames in the whole history whose key matches the
    /// top-of-stack key (three such matches is the draw threshold).
    #[must_use]
    pub fn num_repetitions(&self) -> u32 {
        let top_key = self.top().key;
        self.history.iter().filter(|frame| frame.key == top_key).count() as u32
    }

    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.halfmove_clock() >= 50 || self.num_repetitions() >= 3
    }

    /// Makes `m` on the board, per the eighteen-step algorithm. Returns
    /// `false` if the move leaves the mover's king in check - the frame is
    /// still pushed, so the caller must pair this with `unmake_move`
    /// regardless of the return value.
    #[allow(clippy::too_many_lines)]
    pub fn make_move(&mut self, m: Move) -> bool {
        let mover_color = self.side_to_move;
        let mut frame = *self.top();

        frame.mv = m;
        frame.captured = None;
        frame.captured_square = None;
        frame.was_castle = false;
        frame.was_en_passant = false;
        frame.en_passant_target = None;

        if mover_color == Color::Black {
            frame.fullmove_number += 1;
        }
        frame.halfmove_clock += 1;

        let src = m.from();
        let dst = m.to();
        let (removed_color, mover_piece) = self.board.remove(src);
        debug_assert_eq!(removed_color, mover_color);

        if mover_piece == Piece::Pawn {
            frame.halfmove_clock = 0;
        }

        let prior_ep = self.top().en_passant_target;
        if mover_piece == Piece::Pawn && prior_ep == Some(dst) {
            let captured_square = captured_pawn_square(mover_color, dst);
            let (cap_color, cap_piece) = self.board.remove(captured_square);
            frame.captured = Some((cap_color, cap_piece));
            frame.captured_square = Some(captured_square);
            frame.was_en_passant = true;
            frame.halfmove_clock = 0;
        }

        if mover_piece == Piece::King && dst.file().abs_diff(src.file()) > 1 {
            let kingside = dst.file() > src.file();
            let (rook_from, rook_to) = movegen::castle_rook_squares(mover_color, kingside);
            let (rook_color, rook_piece) = self.board.remove(rook_from);
            self.board.place(rook_to, rook_color, rook_piece);
            frame.was_castle = true;
        }

        if let Some((cap_color, cap_piece)) = self.board.replace(dst, mover_color, mover_piece) {
            frame.captured = Some((cap_color, cap_piece));
            frame.captured_square = Some(dst);
            frame.halfmove_clock = 0;
        }

        if let Some(promotion) = m.promotion() {
            self.board.remove(dst);
            self.board.place(dst, mover_color, promotion);
        }

        if mover_piece == Piece::King {
            frame.castling_rights.remove(crate::types::castle_bit(mover_color, 'K'));
            frame.castling_rights.remove(crate::types::castle_bit(mover_color, 'Q'));
        }
        for sq in [src, dst] {
            revoke_castle_right_for_corner(&mut frame.castling_rights, sq);
        }

        if mover_piece == Piece::Pawn && dst.rank().abs_diff(src.rank()) > 1 {
            frame.en_passant_target = captured_pawn_square(mover_color, dst).into();
            // captured_pawn_square(mover, dst) is one rank behind dst from
            // mover's perspective, which is exactly the square "behind" the
            // double-pushed pawn - the en-passant target.
        }

        frame.key =
            compose_key(self.board.hash(), mover_color.opponent(), frame.castling_rights, frame.en_passant_target);

        self.side_to_move = mover_color.opponent();
        self.history.push(frame);

        let mover_king = self.board.king_square(mover_color);
        if self.board.is_attacked(mover_king, mover_color.opponent()) {
            return false;
        }

        let new_stm_king = self.board.king_square(self.side_to_move);
        self.history.last_mut().unwrap().in_check = self.board.is_attacked(new_stm_king, mover_color);
        true
    }

    /// Exact inverse of `make_move`, including for the illegal-move case
    /// (a `make_move` that returned `false`).
    pub fn unmake_move(&mut self) {
        self.side_to_move = self.side_to_move.opponent();
        let mover_color = self.side_to_move;
        let frame = self.history.pop().expect("unmake_move called on the root frame");

        let src = frame.mv.from();
        let dst = frame.mv.to();

        let (_, piece_at_dst) = self.board.remove(dst);
        if frame.mv.is_promotion() {
            self.board.place(src, mover_color, Piece::Pawn);
        } else {
            self.board.place(src, mover_color, piece_at_dst);
        }

        if frame.was_castle {
            let kingside = dst.file() > src.file();
            let (rook_from, rook_to) = movegen::castle_rook_squares(mover_color, kingside);
            let (rook_color, rook_piece) = self.board.remove(rook_to);
            self.board.place(rook_from, rook_color, rook_piece);
        }

        if let (Some((cap_color, cap_piece)), Some(cap_sq)) = (frame.captured, frame.captured_square) {
            self.board.place(cap_sq, cap_color, cap_piece);
        }
    }

    /// Full pseudo-legal move set (evasion-aware when in check).
    #[must_use]
    pub fn pseudolegal_moves(&self) -> MoveList {
        let mut out = MoveList::new();
        movegen::generate(
            &self.board,
            self.side_to_move,
            self.top().en_passant_target,
            self.top().castling_rights,
            &mut out,
        );
        out
    }

    /// Narrower move set used by quiescence search: captures, queen/knight
    /// promotions, and (if in check) the full evasion set.
    #[must_use]
    pub fn pseudolegal_moves_quiescence(&self) -> MoveList {
        let mut out = MoveList::new();
        movegen::generate_quiescence(&self.board, self.side_to_move, self.top().en_passant_target, &mut out);
        out
    }

    /// Generates pseudo-legal moves and make/unmakes each to count only
    /// those that don't leave the mover's king in check. No depth-1
    /// bulk-counting shortcut, so make/unmake is exercised at every node.
    #[must_use]
    pub fn perft(&mut self, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = self.pseudolegal_moves();
        let mut nodes = 0u64;
        for &m in moves.iter() {
            let legal = self.make_move(m);
            if legal {
                nodes += self.perft(depth - 1);
            }
            self.unmake_move();
        }
        nodes
    }

    /// Parses a 4- or 5-character UCI move, matches it against the
    /// generated pseudo-legal moves (including promotion kind), makes it if
    /// legal, and returns whether it was legal (unmaking and restoring the
    /// position otherwise).
    pub fn make_move_uci(&mut self, text: &str) -> Result<bool, MoveParseError> {
        if text.len() < 4 || text.len() > 5 {
            return Err(MoveParseError::InvalidLength { len: text.len() });
        }
        let from: Square = text[0..2]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare { notation: text.to_string() })?;
        let to: Square = text[2..4]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare { notation: text.to_string() })?;
        let promotion = if text.len() == 5 {
            let c = text.as_bytes()[4] as char;
            Some(Piece::from_char(c).ok_or(MoveParseError::InvalidPromotion { char: c })?)
        } else {
            None
        };

        let candidates = self.pseudolegal_moves();
        let matched = candidates
            .iter()
            .find(|m| m.from() == from && m.to() == to && m.promotion() == promotion)
            .copied();

        let Some(m) = matched else {
            return Err(MoveParseError::IllegalMove { notation: text.to_string() });
        };

        let legal = self.make_move(m);
        if !legal {
            self.unmake_move();
        }
        Ok(legal)
    }

    /// Parses the standard six-field Forsyth-Edwards form.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::TooFewParts { found: parts.len() });
        }

        let mut board = Board::empty();
        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidRank { rank: ranks.len() });
        }
        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top;
            let mut file = 0usize;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    if file >= 8 {
                        return Err(FenError::TooManyFiles { rank, files: file + 1 });
                    }
                    let piece = Piece::from_char(c).ok_or(FenError::InvalidPiece { char: c })?;
                    let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
                    board.place(Square::new(rank, file), color, piece);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::TooManyFiles { rank, files: file });
            }
        }

        let side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidSideToMove { found: other.to_string() }),
        };

        let mut castling_rights = CastlingRights::none();
        if parts[2] != "-" {
            for c in parts[2].chars() {
                let bit = crate::types::castle_bit(
                    if c.is_ascii_uppercase() { Color::White } else { Color::Black },
                    c.to_ascii_uppercase(),
                );
                if bit == 0 {
                    return Err(FenError::InvalidCastling { char: c });
                }
                castling_rights.set_bit(bit);
            }
        }

        let en_passant_target = if parts[3] == "-" {
            None
        } else {
            Some(parts[3].parse::<Square>().map_err(|_| FenError::InvalidEnPassant { found: parts[3].to_string() })?)
        };

        let halfmove_clock = parts.get(4).and_then(|s| s.parse().ok()).unwrap_or(0);
        let fullmove_number = parts.get(5).and_then(|s| s.parse().ok()).unwrap_or(1);

        let key = compose_key(board.hash(), side_to_move, castling_rights, en_passant_target);
        let mut root = Ply::root(castling_rights, en_passant_target, key);
        root.halfmove_clock = halfmove_clock;
        root.fullmove_number = fullmove_number;
        root.in_check = board.is_attacked(board.king_square(side_to_move), side_to_move.opponent());

        Ok(Position { board, side_to_move, history: vec![root] })
    }

    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut ranks = Vec::with_capacity(8);
        for rank in (0..8).rev() {
            let mut rank_str = String::new();
            let mut empty_run = 0;
            for file in 0..8 {
                match self.board.piece_at(Square::new(rank, file)) {
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            rank_str.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        rank_str.push(piece.to_fen_char(color));
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                rank_str.push_str(&empty_run.to_string());
            }
            ranks.push(rank_str);
        }
        let placement = ranks.join("/");

        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };

        let rights = self.castling_rights();
        let mut castle_str = String::new();
        for (color, kingside, ch) in [
            (Color::White, true, 'K'),
            (Color::White, false, 'Q'),
            (Color::Black, true, 'k'),
            (Color::Black, false, 'q'),
        ] {
            if rights.has(color, kingside) {
                castle_str.push(ch);
            }
        }
        if castle_str.is_empty() {
            castle_str.push('-');
        }

        let ep = match self.en_passant_target() {
            Some(sq) => sq.to_string(),
            None => "-".to_string(),
        };

        format!(
            "{} {} {} {} {} {}",
            placement,
            side,
            castle_str,
            ep,
            self.halfmove_clock(),
            self.fullmove_number()
        )
    }
}

/// The captured pawn's square given the capturing pawn's destination: one
/// rank behind `dst` in the moving side's direction of travel.
fn captured_pawn_square(mover_color: Color, dst: Square) -> Square {
    match mover_color {
        Color::White => Square::new(dst.rank() - 1, dst.file()),
        Color::Black => Square::new(dst.rank() + 1, dst.file()),
    }
}

fn revoke_castle_right_for_corner(rights: &mut CastlingRights, sq: Square) {
    match (sq.rank(), sq.file()) {
        (0, 0) => rights.remove(crate::types::castle_bit(Color::White, 'Q')),
        (0, 7) => rights.remove(crate::types::castle_bit(Color::White, 'K')),
        (0, 4) => {
            rights.remove(crate::types::castle_bit(Color::White, 'K'));
            rights.remove(crate::types::castle_bit(Color::White, 'Q'));
        }
        (7, 0) => rights.remove(crate::types::castle_bit(Color::Black, 'Q')),
        (7, 7) => rights.remove(crate::types::castle_bit(Color::Black, 'K')),
        (7, 4) => {
            rights.remove(crate::types::castle_bit(Color::Black, 'K'));
            rights.remove(crate::types::castle_bit(Color::Black, 'Q'));
        }
        _ => {}
    }
}
