//! Surakarta-MCTS: play Surakarta against a Monte Carlo Tree Search engine.
//!
//! ## Usage
//!
//! - `surakarta-mcts` - Show a demo
//! - `surakarta-mcts play` - Play against the engine on the console
//! - `surakarta-mcts selfplay` - Let the engine play against itself
//!
//! Set `RUST_LOG=debug` to see search summaries.

use std::io;

use anyhow::Result;
use clap::builder::TypedValueParser;
use clap::{Args, Parser, Subcommand};
use fastrand::Rng;

use surakarta_mcts::board::Board;
use surakarta_mcts::console::{GameSession, print_board, self_play};
use surakarta_mcts::constants::{DEFAULT_BREADTH, DEFAULT_ITERATIONS};
use surakarta_mcts::mcts::SearchTree;
use surakarta_mcts::rules::Color;

/// Surakarta-MCTS: a Surakarta engine driven by Monte Carlo Tree Search
#[derive(Parser)]
#[command(name = "surakarta-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Search parameters shared by every command.
#[derive(Args, Clone, Copy)]
struct SearchArgs {
    /// Search cycles per engine move
    #[arg(
        short = 'd',
        long,
        default_value_t = DEFAULT_ITERATIONS,
        value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize)
    )]
    iterations: usize,

    /// Distinct actions drawn when a node is expanded
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_BREADTH,
        value_parser = clap::value_parser!(u64).range(1..).map(|v| v as usize)
    )]
    breadth: usize,

    /// Seed for reproducible engine moves
    #[arg(long)]
    seed: Option<u64>,
}

impl SearchArgs {
    fn rng(&self) -> Rng {
        self.seed.map(Rng::with_seed).unwrap_or_else(Rng::new)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play against the engine on the console
    Play {
        #[command(flatten)]
        search: SearchArgs,

        /// Let the engine play Red and move first
        #[arg(long)]
        ai_first: bool,

        /// Also write each engine action to this file
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
    /// Let the engine play against itself
    Selfplay {
        #[command(flatten)]
        search: SearchArgs,

        /// Stop after this many actions
        #[arg(long, default_value_t = 200)]
        max_plies: usize,
    },
    /// Run a short demo of the engine
    Demo {
        #[command(flatten)]
        search: SearchArgs,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Play {
            search,
            ai_first,
            output,
        }) => {
            let ai_color = if ai_first { Color::Red } else { Color::Black };
            let mut session =
                GameSession::new(ai_color).with_search(search.iterations, search.breadth);
            if let Some(seed) = search.seed {
                session = session.with_seed(seed);
            }
            if let Some(path) = output {
                session = session.with_action_file(path);
            }
            let stdin = io::stdin();
            session.run(stdin.lock(), io::stdout())
        }
        Some(Commands::Selfplay { search, max_plies }) => {
            let mut board = Board::new();
            let mut rng = search.rng();
            let mut stdout = io::stdout();
            let phase = self_play(
                &mut board,
                search.iterations,
                search.breadth,
                max_plies,
                &mut rng,
                &mut stdout,
            )?;
            print_board(&board, &mut stdout)?;
            println!("final status: {phase}");
            Ok(())
        }
        Some(Commands::Demo { search }) => run_demo(search),
        None => run_demo(SearchArgs {
            iterations: DEFAULT_ITERATIONS,
            breadth: DEFAULT_BREADTH,
            seed: None,
        }),
    }
}

fn run_demo(search: SearchArgs) -> Result<()> {
    println!("Surakarta-MCTS: Monte Carlo Tree Search for Surakarta\n");

    let board = Board::new();
    let mut stdout = io::stdout();
    print_board(&board, &mut stdout)?;

    println!(
        "Running {} search cycles (breadth {})...",
        search.iterations, search.breadth
    );
    let mut tree = SearchTree::with_rng(&board, search.rng());
    match tree.search(search.iterations, search.breadth) {
        Some(action) => println!("Best action: {action}"),
        None => println!("No legal action"),
    }
    println!(
        "Root winrate: {:.1}%",
        tree.winrate().unwrap_or(0.0) * 100.0
    );
    tree.dump_children();
    Ok(())
}
