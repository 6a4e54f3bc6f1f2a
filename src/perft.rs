//! Node counting over the legal move tree.
//!
//! Perft is the standard cross-check for a move generator: the number of leaf nodes at a fixed
//! depth has a single correct value for a position, so any generation or execution bug shows up
//! as a count mismatch.

use crate::board::Board;
use crate::moves::Move;

/// Counts the leaf nodes of the legal move tree rooted at `board`, `depth` plies deep.
pub fn perft<B: Board>(board: &B, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = board.all_moves();
    if depth == 1 {
        return moves.len() as u64;
    }

    moves
        .into_iter()
        .filter_map(|mv| board.play(mv))
        .map(|next| perft(&next, depth - 1))
        .sum()
}

/// Returns the perft count behind each root move, in the engine's enumeration order. The total
/// of the returned counts equals `perft(board, depth)`.
pub fn divide<B: Board>(board: &B, depth: u32) -> Vec<(Move, u64)> {
    board
        .all_moves()
        .into_iter()
        .map(|mv| {
            let nodes = match board.play(mv) {
                Some(next) => perft(&next, depth.saturating_sub(1)),
                None => 0,
            };
            (mv, nodes)
        })
        .collect()
}
