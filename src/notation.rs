use thiserror::Error;

use crate::board::Board;
use crate::coordinates::{File, Square};
use crate::moves::{CastlingSide, Move};
use crate::piece::PieceType;

/// Errors that can occur when parsing a move written in coordinate notation.
#[derive(Error, Debug, PartialEq)]
pub enum NotationError {
    #[error("invalid move notation: {0}")]
    InvalidNotation(String),

    #[error("there is no piece on the from square: {0}")]
    NoPieceAtFromSquare(Square),

    #[error("unsupported promotion piece: {0} (only queen promotion is produced)")]
    UnsupportedPromotion(char),
}

/// Parses a move in coordinate notation (`e2e4`, optionally suffixed with `q` for a promotion)
/// against a position.
///
/// A king moving from the e-file to the g- or c-file is translated to the castling variant. The
/// only accepted promotion suffix is a queen, since that is the only promotion the engine
/// produces.
pub fn parse_coordinate_notation<B: Board>(board: &B, notation: &str) -> Result<Move, NotationError> {
    let invalid = || NotationError::InvalidNotation(notation.to_string());

    if !notation.is_ascii() || notation.len() < 4 || notation.len() > 5 {
        return Err(invalid());
    }

    let from = Square::try_from(&notation[0..2]).map_err(|_| invalid())?;
    let to = Square::try_from(&notation[2..4]).map_err(|_| invalid())?;

    if let Some(promotion) = notation.chars().nth(4) {
        if promotion.to_ascii_lowercase() != 'q' {
            return Err(NotationError::UnsupportedPromotion(promotion));
        }
    }

    let piece = board.piece_at(from).ok_or(NotationError::NoPieceAtFromSquare(from))?;

    if piece.piece_type() == PieceType::King && from.file() == File::E {
        if to.file() == File::G && from.rank() == to.rank() {
            return Ok(Move::Castle(CastlingSide::Kingside));
        }
        if to.file() == File::C && from.rank() == to.rank() {
            return Ok(Move::Castle(CastlingSide::Queenside));
        }
    }

    Ok(Move::standard(from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask_board::MaskBoard;

    #[test]
    fn test_parse_standard_move() {
        let board = MaskBoard::startpos();
        assert_eq!(
            parse_coordinate_notation(&board, "e2e4"),
            Ok(Move::standard(Square::E2, Square::E4))
        );
    }

    #[test]
    fn test_parse_castling_moves() {
        let board = MaskBoard::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq -").unwrap();
        assert_eq!(parse_coordinate_notation(&board, "e1g1"), Ok(Move::Castle(CastlingSide::Kingside)));
        assert_eq!(parse_coordinate_notation(&board, "e1c1"), Ok(Move::Castle(CastlingSide::Queenside)));
        // A rook sliding along the first rank is not a castle.
        assert_eq!(
            parse_coordinate_notation(&board, "a1c1"),
            Ok(Move::standard(Square::A1, Square::C1))
        );
    }

    #[test]
    fn test_parse_promotion_suffix() {
        let board = MaskBoard::from_fen("8/P7/8/8/8/8/8/k6K w - -").unwrap();
        assert_eq!(
            parse_coordinate_notation(&board, "a7a8q"),
            Ok(Move::standard(Square::A7, Square::A8))
        );
        assert_eq!(
            parse_coordinate_notation(&board, "a7a8r"),
            Err(NotationError::UnsupportedPromotion('r'))
        );
    }

    #[test]
    fn test_parse_rejects_malformed_notation() {
        let board = MaskBoard::startpos();
        assert_eq!(
            parse_coordinate_notation(&board, "e2"),
            Err(NotationError::InvalidNotation("e2".to_string()))
        );
        assert_eq!(
            parse_coordinate_notation(&board, "x9y9"),
            Err(NotationError::InvalidNotation("x9y9".to_string()))
        );
        assert_eq!(
            parse_coordinate_notation(&board, "e4e5"),
            Err(NotationError::NoPieceAtFromSquare(Square::E4))
        );
    }
}
