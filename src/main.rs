use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use human_repr::{HumanDuration, HumanThroughput};
use thiserror::Error;

use tabia::notation::parse_coordinate_notation;
use tabia::perft::divide;
use tabia::{fen, Board, FenError, MapBoard, MaskBoard};

#[derive(Error, Debug)]
enum TabiaError {
    #[error("invalid FEN: {0}")]
    Fen(#[from] FenError),

    #[error("{0}")]
    Notation(#[from] tabia::notation::NotationError),

    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// Command-line interface for the tabia chess engine.
#[derive(Parser)]
#[command(name = "tabia", version, about = "A chess board and legal-move engine")]
struct TabiaArgs {
    #[command(subcommand)]
    command: Commands,
}

/// Which board engine to run a command against.
#[derive(Copy, Clone, Debug, ValueEnum)]
enum Engine {
    /// The map-backed reference engine
    Map,
    /// The bitboard engine (default)
    Mask,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// List every legal move of a position
    Moves {
        /// FEN of the position
        #[arg(short, long, default_value = fen::STARTPOS)]
        fen: String,

        /// Board engine to use
        #[arg(short, long, value_enum, default_value_t = Engine::Mask)]
        engine: Engine,
    },

    /// Play a sequence of moves in coordinate notation and print the resulting position
    Play {
        /// FEN of the starting position
        #[arg(short, long, default_value = fen::STARTPOS)]
        fen: String,

        /// Moves in coordinate notation, e.g. e2e4 e7e5
        #[arg(required = true)]
        moves: Vec<String>,

        /// Board engine to use
        #[arg(short, long, value_enum, default_value_t = Engine::Mask)]
        engine: Engine,
    },

    /// Count the leaf nodes of the legal move tree of a position
    Perft {
        /// The depth to count to
        #[arg(short, long)]
        depth: u32,

        /// FEN of the position
        #[arg(short, long, default_value = fen::STARTPOS)]
        fen: String,

        /// Board engine to use
        #[arg(short, long, value_enum, default_value_t = Engine::Mask)]
        engine: Engine,
    },
}

fn run_moves<B: Board>(fen: &str) -> Result<(), TabiaError> {
    let board = B::from_fen(fen)?;
    let moves = board.all_moves();
    for mv in &moves {
        println!("{}", mv);
    }
    println!("{} legal moves", moves.len().to_string().bold());
    Ok(())
}

fn run_play<B: Board>(fen: &str, moves: &[String]) -> Result<(), TabiaError> {
    let mut board = B::from_fen(fen)?;

    for notation in moves {
        let mv = parse_coordinate_notation(&board, notation)?;
        board = board.play(mv).ok_or_else(|| TabiaError::IllegalMove(notation.clone()))?;
        println!("{}  {}", mv, board.to_fen());
    }

    if board.is_checkmate() {
        println!("{}", "checkmate".red().bold());
    } else if board.in_check() {
        println!("{}", "check".yellow().bold());
    } else if board.all_moves().is_empty() {
        println!("{}", "stalemate".yellow().bold());
    }

    Ok(())
}

fn run_perft<B: Board>(fen: &str, depth: u32) -> Result<(), TabiaError> {
    let board = B::from_fen(fen)?;

    let start = Instant::now();
    let mut total = 0u64;
    for (mv, nodes) in divide(&board, depth) {
        println!("{}\t{}", mv, nodes);
        total += nodes;
    }
    let seconds = start.elapsed().as_secs_f64();

    println!("\nNodes: {}", total.to_string().bold());
    println!("Time: {}", seconds.human_duration());
    println!("Speed: {}", (total as f64 / seconds).human_throughput("nodes"));
    Ok(())
}

fn run() -> Result<(), TabiaError> {
    let args = TabiaArgs::parse();

    match args.command {
        Commands::Moves { fen, engine } => match engine {
            Engine::Map => run_moves::<MapBoard>(&fen),
            Engine::Mask => run_moves::<MaskBoard>(&fen),
        },
        Commands::Play { fen, moves, engine } => match engine {
            Engine::Map => run_play::<MapBoard>(&fen, &moves),
            Engine::Mask => run_play::<MaskBoard>(&fen, &moves),
        },
        Commands::Perft { depth, fen, engine } => match engine {
            Engine::Map => run_perft::<MapBoard>(&fen, depth),
            Engine::Mask => run_perft::<MaskBoard>(&fen, depth),
        },
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
