//! The bitboard engine.
//!
//! Occupancy is twelve piece bitboards plus two color aggregates. Target sets come from the
//! `attacks` module, check detection is the reverse-attack scan from the king square, and move
//! execution is a handful of XORs on the affected masks.

use crate::attacks::{
    bishop_targets, king_targets, knight_targets, pawn_attacks, pawn_pushes, queen_targets, rook_targets,
};
use crate::bitboard::Bitboard;
use crate::board::{Board, Setup};
use crate::coordinates::{File, Rank, Square};
use crate::moves::{CastlingRights, CastlingSide, Move};
use crate::piece::{Color, Piece, PieceType};

/// A chess board backed by piece bitboards.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskBoard {
    by_piece: [Bitboard; Piece::COUNT],
    by_color: [Bitboard; Color::COUNT],
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant_square: Option<Square>,
}

impl MaskBoard {
    fn bb_piece(&self, piece: Piece) -> Bitboard {
        self.by_piece[usize::from(piece)]
    }

    fn bb_color(&self, color: Color) -> Bitboard {
        self.by_color[usize::from(color)]
    }

    fn occupied(&self) -> Bitboard {
        self.bb_color(Color::White) | self.bb_color(Color::Black)
    }

    fn put_piece(&mut self, piece: Piece, square: Square) {
        debug_assert!(!self.occupied().get(square));
        self.by_piece[usize::from(piece)] |= square;
        self.by_color[usize::from(piece.color())] |= square;
    }

    fn remove_piece(&mut self, piece: Piece, square: Square) {
        debug_assert!(self.bb_piece(piece).get(square));
        self.by_piece[usize::from(piece)] ^= square;
        self.by_color[usize::from(piece.color())] ^= square;
    }

    /// Returns the pseudo-legal destination set of a piece on `from`.
    fn targets(&self, from: Square, piece: Piece) -> Bitboard {
        let occupied = self.occupied();
        let own = self.bb_color(piece.color());

        match piece.piece_type() {
            PieceType::Pawn => {
                let enemy = self.bb_color(!piece.color());
                let capturable = match self.en_passant_square {
                    Some(en_passant) => enemy | en_passant,
                    None => enemy,
                };
                pawn_pushes(piece.color(), from, occupied) | (pawn_attacks(piece.color(), from) & capturable)
            }
            PieceType::Knight => knight_targets(from) & !own,
            PieceType::Bishop => bishop_targets(occupied, from) & !own,
            PieceType::Rook => rook_targets(occupied, from) & !own,
            PieceType::Queen => queen_targets(occupied, from) & !own,
            PieceType::King => king_targets(from) & !own,
        }
    }

    /// Checks if any piece of `by` attacks `target`, by projecting each piece kind's attack
    /// pattern backward from the target square.
    fn is_attacked(&self, target: Square, by: Color) -> bool {
        let occupied = self.occupied();
        let queens = self.bb_piece(Piece::new(by, PieceType::Queen));

        (rook_targets(occupied, target) & (self.bb_piece(Piece::new(by, PieceType::Rook)) | queens)).has_any()
            || (bishop_targets(occupied, target) & (self.bb_piece(Piece::new(by, PieceType::Bishop)) | queens))
                .has_any()
            || (knight_targets(target) & self.bb_piece(Piece::new(by, PieceType::Knight))).has_any()
            || (king_targets(target) & self.bb_piece(Piece::new(by, PieceType::King))).has_any()
            || (pawn_attacks(!by, target) & self.bb_piece(Piece::new(by, PieceType::Pawn))).has_any()
    }

    fn king_square(&self, color: Color) -> Option<Square> {
        self.bb_piece(Piece::new(color, PieceType::King)).lsb()
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
        if !self.bb_piece(Piece::new(color, PieceType::King)).get(king_from)
            || !self.bb_piece(Piece::new(color, PieceType::Rook)).get(Square::new(rook_file, rank))
        {
            return false;
        }

        let between = match side {
            CastlingSide::Kingside => Square::new(File::F, rank) | Square::new(File::G, rank),
            CastlingSide::Queenside => {
                Square::new(File::B, rank) | Square::new(File::C, rank) | Square::new(File::D, rank)
            }
        };
        if (between & self.occupied()).has_any() {
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
        let Some(piece) = self.piece_at(from) else {
            return;
        };
        let color = piece.color();
        let is_pawn = piece.piece_type() == PieceType::Pawn;

        if let Some(captured) = self.piece_at(to) {
            self.remove_piece(captured, to);
        }

        // An en-passant capture removes the pawn one rank behind the target square.
        if is_pawn && Some(to) == self.en_passant_square {
            if let Ok(behind) = to.down(color.forward()) {
                if let Some(captured) = self.piece_at(behind) {
                    self.remove_piece(captured, behind);
                }
            }
        }

        self.remove_piece(piece, from);
        if is_pawn && to.rank() == Rank::R8.relative_to_color(color) {
            self.put_piece(Piece::new(color, PieceType::Queen), to);
        } else {
            self.put_piece(piece, to);
        }

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
        let king = Piece::new(color, PieceType::King);
        let rook = Piece::new(color, PieceType::Rook);
        let king_from = Square::new(File::E, rank);
        let (rook_from_file, rook_to_file, king_to_file) = match side {
            CastlingSide::Kingside => (File::H, File::F, File::G),
            CastlingSide::Queenside => (File::A, File::D, File::C),
        };

        // Rook first, then king.
        self.remove_piece(rook, Square::new(rook_from_file, rank));
        self.put_piece(rook, Square::new(rook_to_file, rank));
        self.remove_piece(king, king_from);
        self.put_piece(king, Square::new(king_to_file, rank));

        self.en_passant_square = None;
        self.castling_rights &= !CastlingRights::home_mask(king_from);
    }
}

impl Board for MaskBoard {
    fn from_setup(setup: &Setup) -> Self {
        let mut board = MaskBoard {
            by_piece: [Bitboard::EMPTY; Piece::COUNT],
            by_color: [Bitboard::EMPTY; Color::COUNT],
            side_to_move: setup.side_to_move,
            castling_rights: setup.castling_rights,
            en_passant_square: setup.en_passant_square,
        };
        for (square, piece) in &setup.pieces {
            board.put_piece(*piece, *square);
        }
        board
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
        if !self.occupied().get(square) {
            return None;
        }
        Piece::ALL.into_iter().find(|piece| self.bb_piece(*piece).get(square))
    }

    fn all_pieces(&self) -> Vec<(Square, Piece)> {
        let mut pieces = Vec::with_capacity(self.occupied().popcnt() as usize);
        for piece in Piece::ALL {
            for square in self.bb_piece(piece) {
                pieces.push((square, piece));
            }
        }
        pieces.sort_by_key(|(square, _)| *square);
        pieces
    }

    fn is_valid(&self, mv: Move) -> bool {
        match mv {
            Move::Standard { from, to } => self.piece_at(from).is_some_and(|piece| {
                piece.color() == self.side_to_move && self.targets(from, piece).get(to)
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
        for piece_type in PieceType::ALL {
            let piece = Piece::new(self.side_to_move, piece_type);
            for from in self.bb_piece(piece) {
                for to in self.targets(from, piece) {
                    moves.push(Move::standard(from, to));
                }
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
