use criterion::{criterion_group, criterion_main, Criterion};
use minesweeper_engine::{Board, DifficultySettings, GameState, MoveAction, Position, Solver};

const MOVE_LIMIT: u32 = 500;

#[derive(Debug, Default)]
struct GameStats {
    won: bool,
    moves_made: u32,
    cells_revealed: u32,
}

#[derive(Debug, Default)]
struct AggregateStats {
    games: Vec<GameStats>,
}

impl AggregateStats {
    fn games_played(&self) -> usize {
        self.games.len()
    }

    fn success_rate(&self) -> f64 {
        if self.games_played() == 0 {
            return 0.0;
        }
        self.games.iter().filter(|g| g.won).count() as f64 / self.games_played() as f64 * 100.0
    }

    fn average_completion(&self, safe_cells: u32) -> f64 {
        if self.games_played() == 0 {
            return 0.0;
        }
        self.games
            .iter()
            .map(|g| g.cells_revealed as f64 / safe_cells as f64 * 100.0)
            .sum::<f64>()
            / self.games_played() as f64
    }

    fn average_moves(&self) -> f64 {
        if self.games_played() == 0 {
            return 0.0;
        }
        self.games.iter().map(|g| g.moves_made as f64).sum::<f64>() / self.games_played() as f64
    }
}

fn solve_single_game(board: &Board) -> GameStats {
    let mut stats = GameStats::default();
    let mut solver = Solver::new(board);
    let (rows, cols) = board.dimensions();

    board.reveal(Position::new(rows as i32 / 2, cols as i32 / 2));

    while !board.state().is_terminal() && stats.moves_made < MOVE_LIMIT {
        let mv = match solver.next_move() {
            Some(mv) => mv,
            None => break,
        };
        stats.moves_made += 1;
        match mv.action {
            MoveAction::Reveal => board.reveal(mv.pos),
            MoveAction::Flag => board.toggle_flag(mv.pos),
        };
    }

    stats.won = board.state() == GameState::Won;
    stats.cells_revealed = board.revealed_count();
    stats
}

fn benchmark_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("Solver");

    let difficulties = [
        DifficultySettings::BEGINNER,
        DifficultySettings::INTERMEDIATE,
        DifficultySettings::EXPERT,
    ];

    for settings in difficulties {
        group.bench_function(
            format!("{} {}x{}", settings.label(), settings.rows, settings.cols),
            |b| {
                b.iter_with_setup(
                    || Board::from_difficulty(settings).unwrap(),
                    |board| criterion::black_box(solve_single_game(&board)),
                );
            },
        );

        // Effectiveness stats (50 games)
        let mut aggregate = AggregateStats::default();
        for _ in 0..50 {
            let board = Board::from_difficulty(settings).unwrap();
            aggregate.games.push(solve_single_game(&board));
        }

        let safe_cells = settings.total_cells() - settings.mines;
        println!(
            "\n{} ({}x{}, {} mines):",
            settings.label(),
            settings.rows,
            settings.cols,
            settings.mines
        );
        println!("Success rate: {:.1}%", aggregate.success_rate());
        println!(
            "Average board completion: {:.1}%",
            aggregate.average_completion(safe_cells)
        );
        println!("Average moves per game: {:.1}", aggregate.average_moves());
        println!("Games played: {}", aggregate.games_played());
    }

    group.finish();
}

criterion_group!(benches, benchmark_solver);
criterion_main!(benches);
