use minesweeper_engine::{
    Board, DifficultySettings, GameError, GameState, MoveAction, Position, Solver,
};
use std::time::Instant;

// Safety limit so a stuck game can't spin forever.
const MAX_MOVES: u32 = 500;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), GameError> {
    let settings = match args.first() {
        Some(name) => name.parse::<DifficultySettings>()?,
        None => DifficultySettings::BEGINNER,
    };
    let games: u32 = args
        .get(1)
        .and_then(|s| s.parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1);

    let mut wins = 0;
    for game in 1..=games {
        if games > 1 {
            println!("--- Game {}/{} ---", game, games);
        }
        if play_game(settings)? {
            wins += 1;
        }
    }

    if games > 1 {
        println!(
            "SUMMARY: {} wins, {} losses ({:.1}% win rate)",
            wins,
            games - wins,
            wins as f64 / games as f64 * 100.0
        );
    }
    Ok(())
}

fn play_game(settings: DifficultySettings) -> Result<bool, GameError> {
    println!(
        "Starting {} game ({}x{}, {} mines)",
        settings.label(),
        settings.rows,
        settings.cols,
        settings.mines
    );

    let board = Board::from_difficulty(settings)?;
    let mut solver = Solver::new(&board);
    let start = Instant::now();

    // The center is the statistically best opener.
    let center = Position::new(settings.rows as i32 / 2, settings.cols as i32 / 2);
    println!("First move: center ({}, {})", center.row, center.col);
    board.reveal(center);

    let mut moves = 0;
    while !board.state().is_terminal() && moves < MAX_MOVES {
        let mv = match solver.next_move() {
            Some(mv) => mv,
            None => break,
        };
        moves += 1;

        let action = match mv.action {
            MoveAction::Reveal => "CLICK",
            MoveAction::Flag => "FLAG",
        };
        println!(
            "Move {}: {} ({}, {}) - {}",
            moves, action, mv.pos.row, mv.pos.col, mv.rationale
        );

        match mv.action {
            MoveAction::Reveal => board.reveal(mv.pos),
            MoveAction::Flag => board.toggle_flag(mv.pos),
        };
    }

    print_board(&board);
    match board.state() {
        GameState::Won => {
            println!(
                "*** WON after {} moves in {:.1}s ***",
                moves,
                start.elapsed().as_secs_f64()
            );
            Ok(true)
        }
        GameState::Lost => {
            println!("*** LOST after {} moves ***", moves);
            Ok(false)
        }
        _ => {
            println!(
                "Stopped after {} moves ({} known mines, no move available)",
                moves,
                solver.known_mines().len()
            );
            Ok(false)
        }
    }
}

fn print_board(board: &Board) {
    let (rows, cols) = board.dimensions();

    print!("   ");
    for col in 0..cols {
        print!("{} ", col % 10);
    }
    println!();

    for row in 0..rows {
        print!("{:2} ", row);
        for col in 0..cols {
            let cell = board.cell(Position::new(row as i32, col as i32)).unwrap();
            if cell.is_triggered() {
                print!("X ");
            } else if cell.is_revealed() && cell.is_mine() {
                print!("* ");
            } else if cell.is_revealed() && cell.adjacent_mines() == 0 {
                print!("  ");
            } else if cell.is_revealed() {
                print!("{} ", cell.adjacent_mines());
            } else if cell.is_flagged() {
                print!("⚑ ");
            } else {
                print!("□ ");
            }
        }
        println!();
    }
}
