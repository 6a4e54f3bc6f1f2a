//! Parse and write the four-field FEN dialect used by the engine.
//!
//! Only piece placement, side to move, castling availability and the en-passant target square
//! are modeled; halfmove and fullmove counters are not part of a board value, and a string
//! carrying them is rejected.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::board::Setup;
use crate::coordinates::{File, Rank, Square};
use crate::moves::{CastlingRights, CastlingSide};
use crate::piece::{Color, Piece};

/// The FEN of the standard starting position.
pub const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -";

/// Error type for parsing a FEN string.
#[derive(Error, Debug, PartialEq)]
pub enum FenError {
    #[error("the string does not match the FEN grammar")]
    InvalidSyntax,

    #[error("invalid piece placement field")]
    InvalidPiecePlacement,

    #[error("invalid active color field")]
    InvalidActiveColor,

    #[error("invalid castling availability field")]
    InvalidCastlingAvailability,

    #[error("invalid en passant square field")]
    InvalidEnPassantSquare,
}

fn grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^[pnbrqkPNBRQK1-8]+(?:/[pnbrqkPNBRQK1-8]+)+\s+[wb]\s+(?:[KQkq]+|-)\s+(?:[a-h][1-8]|-)$")
            .expect("the FEN grammar is a valid regular expression")
    })
}

fn read_piece_placement(placement: &str) -> Result<Vec<(Square, Piece)>, FenError> {
    let mut pieces = Vec::with_capacity(32);
    let mut rank = Some(Rank::R8);
    let mut file = Some(File::A);

    for c in placement.chars() {
        if c == '/' {
            rank = rank.ok_or(FenError::InvalidPiecePlacement)?.down(1).ok();
            file = Some(File::A);
        } else if let Some(count) = c.to_digit(10) {
            file = file.ok_or(FenError::InvalidPiecePlacement)?.right(count as i8).ok();
        } else {
            let piece = Piece::try_from(c).map_err(|_| FenError::InvalidPiecePlacement)?;
            let rank_value = rank.ok_or(FenError::InvalidPiecePlacement)?;
            let file_value = file.ok_or(FenError::InvalidPiecePlacement)?;
            pieces.push((Square::new(file_value, rank_value), piece));
            file = file_value.right(1).ok();
        }
    }

    Ok(pieces)
}

fn read_active_color(active_color: &str) -> Result<Color, FenError> {
    match active_color {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(FenError::InvalidActiveColor),
    }
}

fn read_castling(castling: &str) -> Result<CastlingRights, FenError> {
    if castling == "-" {
        return Ok(CastlingRights::empty());
    }

    let mut rights = CastlingRights::empty();
    for c in castling.chars() {
        rights |= match c {
            'K' => CastlingRights::WHITE_KINGSIDE,
            'Q' => CastlingRights::WHITE_QUEENSIDE,
            'k' => CastlingRights::BLACK_KINGSIDE,
            'q' => CastlingRights::BLACK_QUEENSIDE,
            _ => return Err(FenError::InvalidCastlingAvailability),
        };
    }
    Ok(rights)
}

fn read_en_passant(en_passant: &str) -> Result<Option<Square>, FenError> {
    match en_passant {
        "-" => Ok(None),
        _ => Ok(Some(Square::try_from(en_passant).map_err(|_| FenError::InvalidEnPassantSquare)?)),
    }
}

/// Parses a FEN string into a `Setup`.
///
/// The string must match the anchored grammar: a piece placement of at least two `/`-separated
/// rank groups, a side to move, a castling availability field and an en-passant field, separated
/// by whitespace. Structural overflows in the placement (a ninth piece in a rank, a piece in a
/// ninth rank) are rejected during the scan. Acceptance is lenient about piece counts: positions
/// without exactly one king per color parse, but play on them is undefined.
pub fn parse(fen: &str) -> Result<Setup, FenError> {
    if !grammar().is_match(fen) {
        return Err(FenError::InvalidSyntax);
    }

    let mut fields = fen.split_whitespace();
    let pieces = read_piece_placement(fields.next().ok_or(FenError::InvalidSyntax)?)?;
    let side_to_move = read_active_color(fields.next().ok_or(FenError::InvalidSyntax)?)?;
    let castling_rights = read_castling(fields.next().ok_or(FenError::InvalidSyntax)?)?;
    let en_passant_square = read_en_passant(fields.next().ok_or(FenError::InvalidSyntax)?)?;

    Ok(Setup { pieces, side_to_move, castling_rights, en_passant_square })
}

fn write_piece_placement(setup: &Setup) -> String {
    let mut board: [Option<Piece>; Square::COUNT] = [None; Square::COUNT];
    for (square, piece) in &setup.pieces {
        board[usize::from(*square)] = Some(*piece);
    }

    let mut result = String::with_capacity(70);
    for rank in Rank::ALL.iter().rev() {
        let mut empty_count = 0;
        for file in File::ALL {
            let square = Square::new(file, *rank);
            if let Some(piece) = board[usize::from(square)] {
                if empty_count > 0 {
                    result.push_str(&empty_count.to_string());
                    empty_count = 0;
                }
                result.push(piece.into());
            } else {
                empty_count += 1;
            }
        }
        if empty_count > 0 {
            result.push_str(&empty_count.to_string());
        }
        if rank != &Rank::R1 {
            result.push('/');
        }
    }
    result
}

fn write_castling(rights: CastlingRights) -> String {
    if rights.is_empty() {
        return String::from("-");
    }

    let mut result = String::with_capacity(4);
    for color in Color::ALL {
        for side in CastlingSide::ALL {
            if rights.contains(CastlingRights::new(color, side)) {
                let letter = match side {
                    CastlingSide::Kingside => 'k',
                    CastlingSide::Queenside => 'q',
                };
                result.push(if color == Color::White { letter.to_ascii_uppercase() } else { letter });
            }
        }
    }
    result
}

fn write_en_passant(en_passant: Option<Square>) -> String {
    en_passant.map_or(String::from("-"), |square| format!("{}", square))
}

/// Renders a `Setup` as a FEN string, with empty-square runs coalesced and the castling letters
/// in `KQkq` order.
pub fn render(setup: &Setup) -> String {
    format!(
        "{} {} {} {}",
        write_piece_placement(setup),
        char::from(setup.side_to_move),
        write_castling(setup.castling_rights),
        write_en_passant(setup.en_passant_square)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_startpos() {
        let setup = parse(STARTPOS).unwrap();

        assert_eq!(setup.pieces.len(), 32);
        assert_eq!(setup.side_to_move, Color::White);
        assert_eq!(setup.castling_rights, CastlingRights::all());
        assert_eq!(setup.en_passant_square, None);

        let at = |square| setup.pieces.iter().find(|(sq, _)| *sq == square).map(|(_, piece)| *piece);
        assert_eq!(at(Square::A8), Some(Piece::BLACK_ROOK));
        assert_eq!(at(Square::E8), Some(Piece::BLACK_KING));
        assert_eq!(at(Square::D1), Some(Piece::WHITE_QUEEN));
        assert_eq!(at(Square::E2), Some(Piece::WHITE_PAWN));
        assert_eq!(at(Square::E4), None);
    }

    #[test]
    fn test_parse_side_to_move() {
        assert_eq!(parse("4k3/8/8/8/8/8/8/4K3 w - -").unwrap().side_to_move, Color::White);
        assert_eq!(parse("4k3/8/8/8/8/8/8/4K3 b - -").unwrap().side_to_move, Color::Black);
    }

    #[test]
    fn test_parse_partial_castling() {
        let setup = parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w Qk -").unwrap();
        assert_eq!(setup.castling_rights, CastlingRights::WHITE_QUEENSIDE | CastlingRights::BLACK_KINGSIDE);
    }

    #[test]
    fn test_parse_en_passant_square() {
        let setup = parse("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6").unwrap();
        assert_eq!(setup.en_passant_square, Some(Square::F6));
    }

    #[test]
    fn test_parse_tolerates_repeated_whitespace() {
        assert!(parse("4k3/8/8/8/8/8/8/4K3  w  -  -").is_ok());
    }

    #[test]
    fn test_parse_rejects_malformed_strings() {
        assert_eq!(parse(""), Err(FenError::InvalidSyntax));
        assert_eq!(parse("hello"), Err(FenError::InvalidSyntax));
        // A lone placement field.
        assert_eq!(parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"), Err(FenError::InvalidSyntax));
        // An invalid side to move.
        assert_eq!(parse("4k3/8/8/8/8/8/8/4K3 x - -"), Err(FenError::InvalidSyntax));
        // A digit 9 in the placement.
        assert_eq!(parse("9/8/8/8/8/8/8/4K3 w - -"), Err(FenError::InvalidSyntax));
        // An invalid en passant square.
        assert_eq!(parse("4k3/8/8/8/8/8/8/4K3 w - e9"), Err(FenError::InvalidSyntax));
        // An invalid castling field.
        assert_eq!(parse("4k3/8/8/8/8/8/8/4K3 w KX -"), Err(FenError::InvalidSyntax));
    }

    #[test]
    fn test_parse_rejects_extra_fields() {
        // The traditional six-field form is not part of this dialect.
        assert_eq!(parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"), Err(FenError::InvalidSyntax));
    }

    #[test]
    fn test_parse_rejects_overfull_ranks() {
        assert_eq!(parse("ppppppppp/8/8/8/8/8/8/4K3 w - -"), Err(FenError::InvalidPiecePlacement));
        assert_eq!(parse("4k3/88/8/8/8/8/8/4K3 w - -"), Err(FenError::InvalidPiecePlacement));
    }

    #[test]
    fn test_parse_rejects_too_many_ranks() {
        assert_eq!(parse("4k3/8/8/8/8/8/8/8/4K3 w - -"), Err(FenError::InvalidPiecePlacement));
    }

    #[test]
    fn test_render_round_trips() {
        let fens = [
            STARTPOS,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6",
            "8/P7/8/8/8/8/8/k6K w - -",
            "7k/5Q2/6K1/8/8/8/8/8 b - -",
            "4k3/8/8/8/8/8/8/4K3 w - -",
        ];

        for fen in fens {
            assert_eq!(render(&parse(fen).unwrap()), fen);
        }
    }

    #[test]
    fn test_render_normalizes_castling_order() {
        assert_eq!(render(&parse("4k3/8/8/8/8/8/8/4K3 w qK -").unwrap()), "4k3/8/8/8/8/8/8/4K3 w Kq -");
    }
}
