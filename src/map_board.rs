//! The map-backed reference engine.
//!
//! Occupancy is a `BTreeMap` from square to piece and every rule is resolved by stepping over
//! squares, one at a time. Nothing here is fast; it is the auditable definition of the semantics
//! the bitboard engine must reproduce, and the ordered map keeps enumeration deterministic.

use std::collections::BTreeMap;

use crate::board::{Board, Setup};
use crate::coordinates::{CoordinatesResult, File, Rank, Square};
use crate::moves::{CastlingRights, CastlingSide, Move};
use crate::piece::{Color, Piece, PieceType};

type Step = fn(Square) -> CoordinatesResult<Square>;

const ROOK_DIRECTIONS: [Step; 4] =
    [|sq| sq.up(1), |sq| sq.down(1), |sq| sq.left(1), |sq| sq.right(1)];

const BISHOP_DIRECTIONS: [Step; 4] = [
    |sq| sq.up(1).and_then(|sq| sq.right(1)),
    |sq| sq.up(1).and_then(|sq| sq.left(1)),
    |sq| sq.down(1).and_then(|sq| sq.right(1)),
    |sq| sq.down(1).and_then(|sq| sq.left(1)),
];

const KNIGHT_JUMPS: [Step; 8] = [
    |sq| sq.up(2).and_then(|sq| sq.left(1)),
    |sq| sq.up(2).and_then(|sq| sq.right(1)),
    |sq| sq.down(2).and_then(|sq| sq.left(1)),
    |sq| sq.down(2).and_then(|sq| sq.right(1)),
    |sq| sq.left(2).and_then(|sq| sq.up(1)),
    |sq| sq.left(2).and_then(|sq| sq.down(1)),
    |sq| sq.right(2).and_then(|sq| sq.up(1)),
    |sq| sq.right(2).and_then(|sq| sq.down(1)),
];

const KING_STEPS: [Step; 8] = [
    |sq| sq.up(1),
    |sq| sq.down(1),
    |sq| sq.left(1),
    |sq| sq.right(1),
    |sq| sq.up(1).and_then(|sq| sq.left(1)),
    |sq| sq.up(1).and_then(|sq| sq.right(1)),
    |sq| sq.down(1).and_then(|sq| sq.left(1)),
    |sq| sq.down(1).and_then(|sq| sq.right(1)),
];

/// A chess board backed by an ordered square-to-piece map.
#[derive(Clone, Debug, PartialEq)]
pub struct MapBoard {
    pieces: BTreeMap<Square, Piece>,
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant_square: Option<Square>,
}

impl MapBoard {
    /// Walks each direction from `from`, collecting every square up to and including the first
    /// occupied one.
    fn slider_attacks(&self, from: Square, directions: &[Step]) -> Vec<Square> {
        let mut attacks = Vec::new();
        for step in directions {
            let mut current = from;
            while let Ok(next) = step(current) {
                attacks.push(next);
                if self.pieces.contains_key(&next) {
                    break;
                }
                current = next;
            }
        }
        attacks
    }

    /// Returns the on-board squares reached by a set of single jumps.
    fn leap_attacks(&self, from: Square, jumps: &[Step]) -> Vec<Square> {
        jumps.iter().filter_map(|jump| jump(from).ok()).collect()
    }

    /// Returns the two diagonal squares a pawn on `from` attacks, occupancy aside.
    fn pawn_attack_squares(&self, from: Square, color: Color) -> Vec<Square> {
        [-1, 1]
            .iter()
            .filter_map(|side| from.up(color.forward()).and_then(|sq| sq.right(*side)).ok())
            .collect()
    }

    /// Returns the squares a piece on `from` attacks: occupied squares of either color are
    /// included, since a defended piece still denies the square to the enemy king.
    fn attack_squares(&self, from: Square, piece: Piece) -> Vec<Square> {
        match piece.piece_type() {
            PieceType::Pawn => self.pawn_attack_squares(from, piece.color()),
            PieceType::Knight => self.leap_attacks(from, &KNIGHT_JUMPS),
            PieceType::Bishop => self.slider_attacks(from, &BISHOP_DIRECTIONS),
            PieceType::Rook => self.slider_attacks(from, &ROOK_DIRECTIONS),
            PieceType::Queen => {
                let mut attacks = self.slider_attacks(from, &ROOK_DIRECTIONS);
                attacks.extend(self.slider_attacks(from, &BISHOP_DIRECTIONS));
                attacks
            }
            PieceType::King => self.leap_attacks(from, &KING_STEPS),
        }
    }

    /// Returns the pseudo-legal destination squares of a pawn: pushes onto empty squares, the
    /// double push from the starting rank, and diagonal captures onto enemy pieces or the
    /// en-passant target.
    fn pawn_targets(&self, from: Square, color: Color) -> Vec<Square> {
        let mut targets = Vec::new();

        if let Ok(single) = from.up(color.forward()) {
            if !self.pieces.contains_key(&single) {
                targets.push(single);
                if from.rank() == Rank::R2.relative_to_color(color) {
                    if let Ok(double) = single.up(color.forward()) {
                        if !self.pieces.contains_key(&double) {
                            targets.push(double);
                        }
                    }
                }
            }
        }

        for diagonal in self.pawn_attack_squares(from, color) {
            let captures_enemy = self.pieces.get(&diagonal).is_some_and(|piece| piece.color() != color);
            if captures_enemy || Some(diagonal) == self.en_passant_square {
                targets.push(diagonal);
            }
        }

        targets
    }

    /// Returns the pseudo-legal destination squares of any piece on `from`.
    fn targets(&self, from: Square, piece: Piece) -> Vec<Square> {
        if piece.piece_type() == PieceType::Pawn {
            return self.pawn_targets(from, piece.color());
        }

        self.attack_squares(from, piece)
            .into_iter()
            .filter(|to| !self.pieces.get(to).is_some_and(|other| other.color() == piece.color()))
            .collect()
    }

    /// Checks if any piece of `by` attacks `target`.
    fn is_attacked(&self, target: Square, by: Color) -> bool {
        self.pieces
            .iter()
            .filter(|(_, piece)| piece.color() == by)
            .any(|(&from, &piece)| self.attack_squares(from, piece).contains(&target))
    }

    /// Returns the square of the king of `color`, if one is on the board.
    fn king_square(&self, color: Color) -> Option<Square> {
        let king = Piece::new(color, PieceType::King);
        self.pieces.iter().find(|(_, &piece)| piece == king).map(|(&square, _)| square)
    }

    fn can_castle(&self, side: CastlingSide) -> bool {
        let color = self.side_to_move;
        if !self.castling_rights.contains(CastlingRights::new(color, side)) {
            return false;
        }

        let rank = Rank::R1.relative_to_color(color);
        let king_from = Square::new(File::E, rank);
        let rook_file = match side {
            CastlingSide::Kingside => File::H,
            CastlingSide::Queenside => File::A,
        };
        if self.pieces.get(&king_from) != Some(&Piece::new(color, PieceType::King))
            || self.pieces.get(&Square::new(rook_file, rank)) != Some(&Piece::new(color, PieceType::Rook))
        {
            return false;
        }

        let between: &[File] = match side {
            CastlingSide::Kingside => &[File::F, File::G],
            CastlingSide::Queenside => &[File::B, File::C, File::D],
        };
        if between.iter().any(|file| self.pieces.contains_key(&Square::new(*file, rank))) {
            return false;
        }

        // The king may not castle out of, through, or into check.
        let king_path: &[File] = match side {
            CastlingSide::Kingside => &[File::E, File::F, File::G],
            CastlingSide::Queenside => &[File::E, File::D, File::C],
        };
        !king_path.iter().any(|file| self.is_attacked(Square::new(*file, rank), !color))
    }

    fn execute_standard(&mut self, from: Square, to: Square) {
        let Some(piece) = self.pieces.remove(&from) else {
            return;
        };
        let color = piece.color();
        let is_pawn = piece.piece_type() == PieceType::Pawn;

        // An en-passant capture removes the pawn one rank behind the target square.
        if is_pawn && Some(to) == self.en_passant_square {
            if let Ok(behind) = to.down(color.forward()) {
                self.pieces.remove(&behind);
            }
        }

        let placed = if is_pawn && to.rank() == Rank::R8.relative_to_color(color) {
            Piece::new(color, PieceType::Queen)
        } else {
            piece
        };
        self.pieces.insert(to, placed);

        self.en_passant_square = if is_pawn
            && (u8::from(from.rank()) as i8 - u8::from(to.rank()) as i8).abs() == 2
        {
            to.down(color.forward()).ok()
        } else {
            None
        };

        self.castling_rights &= !(CastlingRights::home_mask(from) | CastlingRights::home_mask(to));
    }

    fn execute_castle(&mut self, side: CastlingSide) {
        let color = self.side_to_move;
        let rank = Rank::R1.relative_to_color(color);
        let king_from = Square::new(File::E, rank);
        let (rook_from_file, rook_to_file, king_to_file) = match side {
            CastlingSide::Kingside => (File::H, File::F, File::G),
            CastlingSide::Queenside => (File::A, File::D, File::C),
        };

        // Rook first, then king.
        if let Some(rook) = self.pieces.remove(&Square::new(rook_from_file, rank)) {
            self.pieces.insert(Square::new(rook_to_file, rank), rook);
        }
        if let Some(king) = self.pieces.remove(&king_from) {
            self.pieces.insert(Square::new(king_to_file, rank), king);
        }

        self.en_passant_square = None;
        self.castling_rights &= !CastlingRights::home_mask(king_from);
    }
}

impl Board for MapBoard {
    fn from_setup(setup: &Setup) -> Self {
        MapBoard {
            pieces: setup.pieces.iter().copied().collect(),
            side_to_move: setup.side_to_move,
            castling_rights: setup.castling_rights,
            en_passant_square: setup.en_passant_square,
        }
    }

    fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_square
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pieces.get(&square).copied()
    }

    fn all_pieces(&self) -> Vec<(Square, Piece)> {
        self.pieces.iter().map(|(&square, &piece)| (square, piece)).collect()
    }

    fn is_valid(&self, mv: Move) -> bool {
        match mv {
            Move::Standard { from, to } => self.pieces.get(&from).is_some_and(|&piece| {
                piece.color() == self.side_to_move && self.targets(from, piece).contains(&to)
            }),
            Move::Castle(side) => self.can_castle(side),
        }
    }

    fn play(&self, mv: Move) -> Option<Self> {
        if !self.is_valid(mv) {
            return None;
        }

        let mut next = self.clone();
        match mv {
            Move::Standard { from, to } => next.execute_standard(from, to),
            Move::Castle(side) => next.execute_castle(side),
        }

        let mover = self.side_to_move;
        if let Some(king) = next.king_square(mover) {
            if next.is_attacked(king, !mover) {
                return None;
            }
        }

        next.side_to_move = !mover;
        Some(next)
    }

    fn all_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        for (&from, &piece) in self.pieces.iter().filter(|(_, piece)| piece.color() == self.side_to_move) {
            for to in self.targets(from, piece) {
                moves.push(Move::standard(from, to));
            }
        }
        for side in CastlingSide::ALL {
            moves.push(Move::Castle(side));
        }
        moves.retain(|&mv| self.play(mv).is_some());
        moves
    }

    fn in_check(&self) -> bool {
        match self.king_square(self.side_to_move) {
            Some(king) => self.is_attacked(king, !self.side_to_move),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos_has_twenty_moves() {
        assert_eq!(MapBoard::startpos().all_moves().len(), 20);
    }

    #[test]
    fn test_wrong_color_is_rejected() {
        let board = MapBoard::startpos();
        assert_eq!(board.play(Move::standard(Square::E7, Square::E5)), None);
    }

    #[test]
    fn test_empty_source_is_rejected() {
        let board = MapBoard::startpos();
        assert_eq!(board.play(Move::standard(Square::E4, Square::E5)), None);
    }

    #[test]
    fn test_play_does_not_mutate_the_input() {
        let board = MapBoard::startpos();
        let copy = board.clone();
        let _ = board.play(Move::standard(Square::E2, Square::E4));
        assert_eq!(board, copy);
    }

    #[test]
    fn test_double_push_sets_en_passant_square() {
        let board = MapBoard::startpos();
        let next = board.play(Move::standard(Square::E2, Square::E4)).unwrap();
        assert_eq!(next.en_passant_square(), Some(Square::E3));
        assert_eq!(next.side_to_move(), Color::Black);

        let after = next.play(Move::standard(Square::G8, Square::F6)).unwrap();
        assert_eq!(after.en_passant_square(), None);
    }

    #[test]
    fn test_pinned_piece_cannot_move_away() {
        // The e-file knight shields the king from the enemy rook.
        let board = MapBoard::from_fen("4k3/4r3/8/8/8/4N3/8/4K3 w - -").unwrap();
        assert_eq!(board.play(Move::standard(Square::E3, Square::C4)), None);
    }

    #[test]
    fn test_rook_move_clears_one_right() {
        let board = MapBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq -").unwrap();
        let next = board.play(Move::standard(Square::H1, Square::H5)).unwrap();
        assert!(!next.castling_rights().contains(CastlingRights::WHITE_KINGSIDE));
        assert!(next.castling_rights().contains(CastlingRights::WHITE_QUEENSIDE));
        assert!(next.castling_rights().contains(CastlingRights::BLACK_KINGSIDE));
    }

    #[test]
    fn test_king_move_clears_both_rights() {
        let board = MapBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq -").unwrap();
        let next = board.play(Move::standard(Square::E1, Square::E2)).unwrap();
        assert!(!next.castling_rights().contains(CastlingRights::WHITE_KINGSIDE));
        assert!(!next.castling_rights().contains(CastlingRights::WHITE_QUEENSIDE));
    }

    #[test]
    fn test_rook_capture_clears_the_victims_right() {
        let board = MapBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq -").unwrap();
        let next = board.play(Move::standard(Square::A1, Square::A8)).unwrap();
        assert!(!next.castling_rights().contains(CastlingRights::BLACK_QUEENSIDE));
        assert!(next.castling_rights().contains(CastlingRights::BLACK_KINGSIDE));
        assert!(!next.castling_rights().contains(CastlingRights::WHITE_QUEENSIDE));
    }

    #[test]
    fn test_kingside_castle_executes_rook_and_king() {
        let board = MapBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq -").unwrap();
        let next = board.play(Move::Castle(CastlingSide::Kingside)).unwrap();
        assert_eq!(next.piece_at(Square::G1), Some(Piece::WHITE_KING));
        assert_eq!(next.piece_at(Square::F1), Some(Piece::WHITE_ROOK));
        assert_eq!(next.piece_at(Square::E1), None);
        assert_eq!(next.piece_at(Square::H1), None);
    }

    #[test]
    fn test_queenside_castle_executes_rook_and_king() {
        let board = MapBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R b KQkq -").unwrap();
        let next = board.play(Move::Castle(CastlingSide::Queenside)).unwrap();
        assert_eq!(next.piece_at(Square::C8), Some(Piece::BLACK_KING));
        assert_eq!(next.piece_at(Square::D8), Some(Piece::BLACK_ROOK));
        assert_eq!(next.piece_at(Square::E8), None);
        assert_eq!(next.piece_at(Square::A8), None);
    }

    #[test]
    fn test_castle_blocked_by_a_piece_between() {
        let board = MapBoard::from_fen("r3k2r/8/8/8/8/8/8/RN2K2R w KQkq -").unwrap();
        assert_eq!(board.play(Move::Castle(CastlingSide::Queenside)), None);
        assert!(board.play(Move::Castle(CastlingSide::Kingside)).is_some());
    }
}
