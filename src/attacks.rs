//! Pseudo-legal target generation over bitboards.
//!
//! Sliding pieces are resolved ray by ray: the ray is the intersection of the source square's
//! line projection (file, rank, diagonal or antidiagonal) with the prefix mask on one side of the
//! square, and the first blocker is found with a single `lsb` or `msb` scan. The returned sets
//! are blocker-inclusive; callers mask out their own pieces.

use crate::bitboard::Bitboard;
use crate::coordinates::{File, Rank, Square};
use crate::piece::Color;

/// Truncates a ray that runs toward H8 at its first blocker, blocker included.
fn ray_toward_msb(ray: Bitboard, occupied: Bitboard) -> Bitboard {
    match (ray & occupied).lsb() {
        Some(blocker) => ray & Bitboard::at_or_below(blocker),
        None => ray,
    }
}

/// Truncates a ray that runs toward A1 at its first blocker, blocker included.
fn ray_toward_lsb(ray: Bitboard, occupied: Bitboard) -> Bitboard {
    match (ray & occupied).msb() {
        Some(blocker) => ray & Bitboard::at_or_above(blocker),
        None => ray,
    }
}

/// Returns all squares a rook on `from` attacks, up to and including the first occupied square
/// in each direction.
pub fn rook_targets(occupied: Bitboard, from: Square) -> Bitboard {
    let file = Bitboard::from(from.file());
    let rank = Bitboard::from(from.rank());
    let above = Bitboard::at_or_above(from) ^ from;
    let below = Bitboard::at_or_below(from) ^ from;

    ray_toward_msb(file & above, occupied)
        | ray_toward_lsb(file & below, occupied)
        | ray_toward_msb(rank & above, occupied)
        | ray_toward_lsb(rank & below, occupied)
}

/// Returns all squares a bishop on `from` attacks, up to and including the first occupied square
/// in each direction.
pub fn bishop_targets(occupied: Bitboard, from: Square) -> Bitboard {
    let diagonal = Bitboard::from(from.diagonal());
    let antidiagonal = Bitboard::from(from.antidiagonal());
    let above = Bitboard::at_or_above(from) ^ from;
    let below = Bitboard::at_or_below(from) ^ from;

    ray_toward_msb(diagonal & above, occupied)
        | ray_toward_lsb(diagonal & below, occupied)
        | ray_toward_msb(antidiagonal & above, occupied)
        | ray_toward_lsb(antidiagonal & below, occupied)
}

/// Returns all squares a queen on `from` attacks.
pub fn queen_targets(occupied: Bitboard, from: Square) -> Bitboard {
    rook_targets(occupied, from) | bishop_targets(occupied, from)
}

/// Shifts a pattern centered on `center` so that it is centered on `square` instead.
fn spread_pattern(pattern: u64, center: u8, square: Square) -> Bitboard {
    let index = u8::from(square);
    if index >= center {
        Bitboard::new(pattern << u32::from(index - center))
    } else {
        Bitboard::new(pattern >> u32::from(center - index))
    }
}

/// Returns all squares a knight on `from` attacks.
///
/// The eight L-shapes are encoded as a pattern constant centered on C3 and shifted into place.
/// The shift wraps moves across the board edge, so the result is masked with one of three wrap
/// masks selected by the source file region.
pub fn knight_targets(from: Square) -> Bitboard {
    const PATTERN: u64 = 0x0000_000a_1100_110a;
    const CENTER: u8 = 18; // C3

    let targets = spread_pattern(PATTERN, CENTER, from);
    match from.file() {
        File::A | File::B => targets & !(File::G | File::H),
        File::G | File::H => targets & !(File::A | File::B),
        _ => targets,
    }
}

/// Returns all squares a king on `from` attacks. Same pattern-shift scheme as the knight, with
/// the 3x3 neighborhood centered on B2.
pub fn king_targets(from: Square) -> Bitboard {
    const PATTERN: u64 = 0x0000_0000_0007_0507;
    const CENTER: u8 = 9; // B2

    let targets = spread_pattern(PATTERN, CENTER, from);
    match from.file() {
        File::A => targets & !Bitboard::from(File::H),
        File::H => targets & !Bitboard::from(File::A),
        _ => targets,
    }
}

/// Returns the two diagonal squares a pawn of `color` on `from` attacks.
///
/// This is the attack-only set used for check detection; forward pushes are not attacks. The
/// capture shifts are masked against the A and H files so that no capture wraps around the board
/// edge.
pub fn pawn_attacks(color: Color, from: Square) -> Bitboard {
    let bb = Bitboard::from(from);
    match color {
        Color::White => ((bb & !Bitboard::from(File::A)) << 7) | ((bb & !Bitboard::from(File::H)) << 9),
        Color::Black => ((bb & !Bitboard::from(File::A)) >> 9) | ((bb & !Bitboard::from(File::H)) >> 7),
    }
}

/// Returns the forward pushes of a pawn of `color` on `from`: one step onto an empty square, and
/// a second step from the starting rank when both squares ahead are empty.
pub fn pawn_pushes(color: Color, from: Square, occupied: Bitboard) -> Bitboard {
    let bb = Bitboard::from(from);
    let single = match color {
        Color::White => bb << 8,
        Color::Black => bb >> 8,
    } & !occupied;

    if from.rank() != Rank::R2.relative_to_color(color) {
        return single;
    }

    let double = match color {
        Color::White => single << 8,
        Color::Black => single >> 8,
    } & !occupied;

    single | double
}
