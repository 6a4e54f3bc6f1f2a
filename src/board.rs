use crate::coordinates::Square;
use crate::fen::{self, FenError};
use crate::moves::{CastlingRights, Move};
use crate::piece::{Color, Piece};

/// An engine-neutral description of a position: the contents of the four FEN fields.
///
/// `Setup` is the interchange value between the FEN codec and the board engines. It carries no
/// legality knowledge of its own.
#[derive(Clone, Debug, PartialEq)]
pub struct Setup {
    pub pieces: Vec<(Square, Piece)>,
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_square: Option<Square>,
}

/// The public operations of a chess board value.
///
/// Boards are immutable: `play` returns a new board and never mutates its receiver. Both engines
/// implement this trait and must be indistinguishable through it, apart from the unspecified
/// (but per-engine deterministic) order of `all_pieces` and `all_moves`.
pub trait Board: Sized + Clone {
    /// Builds a board holding the described position.
    fn from_setup(setup: &Setup) -> Self;

    /// Returns the color of the side to move.
    fn side_to_move(&self) -> Color;

    /// Returns the castling rights still granted.
    fn castling_rights(&self) -> CastlingRights;

    /// Returns the en-passant target square, set only immediately after a two-square pawn
    /// advance.
    fn en_passant_square(&self) -> Option<Square>;

    /// Returns the piece occupying a square, if any.
    fn piece_at(&self, square: Square) -> Option<Piece>;

    /// Returns every occupied square with its piece.
    fn all_pieces(&self) -> Vec<(Square, Piece)>;

    /// Checks if a move is pseudo-legal: a piece of the side to move stands on the source square
    /// and reaches the destination, or the castling preconditions hold. A pseudo-legal move may
    /// still leave the own king attacked and be rejected by `play`.
    fn is_valid(&self, mv: Move) -> bool;

    /// Plays a move, returning the resulting board with the side to move flipped, or `None` if
    /// the move is not pseudo-legal or would leave the mover's king attacked.
    fn play(&self, mv: Move) -> Option<Self>;

    /// Enumerates every legal move of the side to move.
    fn all_moves(&self) -> Vec<Move>;

    /// Checks if the side to move is in check.
    fn in_check(&self) -> bool;

    /// Builds the standard starting position.
    fn startpos() -> Self {
        let setup = fen::parse(fen::STARTPOS).expect("the starting position FEN always parses");
        Self::from_setup(&setup)
    }

    /// Builds a board from a FEN string.
    fn from_fen(text: &str) -> Result<Self, FenError> {
        Ok(Self::from_setup(&fen::parse(text)?))
    }

    /// Returns the FEN of the position.
    fn to_fen(&self) -> String {
        fen::render(&self.to_setup())
    }

    /// Describes the position as an engine-neutral `Setup`.
    fn to_setup(&self) -> Setup {
        Setup {
            pieces: self.all_pieces(),
            side_to_move: self.side_to_move(),
            castling_rights: self.castling_rights(),
            en_passant_square: self.en_passant_square(),
        }
    }

    /// Checks if the side to move is checkmated: in check with no legal move.
    fn is_checkmate(&self) -> bool {
        self.in_check() && self.all_moves().is_empty()
    }
}
