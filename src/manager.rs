use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::board::{Board, Surface};
use crate::direction::Direction;
use crate::food::Food;
use crate::settings::Settings;
use crate::snake::Snake;
use crate::util::format_time;

pub const CLOCK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Configuring,
    AwaitingFirstMove,
    Running,
    GameOver,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameOverReason {
    Wall,
    SelfCollision,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSummary {
    pub score: u32,
    pub elapsed_seconds: u64,
    pub reason: GameOverReason,
}

impl GameSummary {
    pub fn time(&self) -> String {
        format_time(self.elapsed_seconds)
    }
}

/// Everything that lives for exactly one game.
struct Session {
    snake: Snake,
    food: Food,
    board: Board,
}

pub struct GameManager {
    phase: Phase,
    speed: u32,
    score: u32,
    elapsed_seconds: u64,
    rng: StdRng,
    session: Option<Session>,
    summary: Option<GameSummary>,
}

impl GameManager {
    pub fn new(rng: StdRng) -> Self {
        GameManager {
            phase: Phase::Configuring,
            speed: 0,
            score: 0,
            elapsed_seconds: 0,
            rng,
            session: None,
            summary: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[cfg(test)]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn summary(&self) -> Option<&GameSummary> {
        self.summary.as_ref()
    }

    /// Period of the movement tick, truncated to whole milliseconds.
    pub fn movement_period(&self) -> Duration {
        Duration::from_millis(1000 / self.speed.max(1) as u64)
    }

    /// Builds a fresh session from already validated settings. Any previous
    /// session is dropped.
    pub fn init_game<S: Surface>(&mut self, settings: &Settings, surface: &mut S) -> Result<()> {
        let (width, height) = (settings.width as i32, settings.height as i32);

        let snake = Snake::new(width, height);
        let food = Food::new(width, height, &mut self.rng);
        let (board, changes) = Board::initialize(width, height, snake.body(), food.position());

        surface.draw_cells(&changes, snake.direction())?;

        self.speed = settings.speed;
        self.score = 0;
        self.elapsed_seconds = 0;
        self.summary = None;
        self.session = Some(Session { snake, food, board });
        self.phase = Phase::AwaitingFirstMove;

        info!(width, height, speed = self.speed, "game initialized");

        surface.show_score(self.score)?;
        surface.show_time(&format_time(self.elapsed_seconds))?;
        surface.show_ready()
    }

    /// First directional input: orients the snake and starts the game.
    pub fn start_game(&mut self, direction: Direction) {
        if self.phase != Phase::AwaitingFirstMove {
            return;
        }

        if let Some(session) = self.session.as_mut() {
            session.snake.set_initial_direction(direction);
            self.phase = Phase::Running;
            info!(?direction, "game started");
        }
    }

    pub fn handle_direction(&mut self, direction: Direction) {
        match self.phase {
            Phase::AwaitingFirstMove => self.start_game(direction),
            Phase::Running => {
                if let Some(session) = self.session.as_mut() {
                    if !session.snake.queue_direction(direction) {
                        debug!(?direction, "reversal ignored");
                    }
                }
            }
            Phase::Configuring | Phase::GameOver => {}
        }
    }

    pub fn on_movement_tick<S: Surface>(&mut self, surface: &mut S) -> Result<()> {
        if self.phase != Phase::Running {
            return Ok(());
        }

        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return Ok(()),
        };

        // Checked against where the previous tick left the head
        if session.food.position() == Some(session.snake.head()) {
            session.snake.grow();
            session.food.generate(&mut self.rng);
            self.score += 1;
            debug!(score = self.score, length = session.snake.len(), "food eaten");
        }

        session.snake.advance();
        session.food.refresh_if_absent(&mut self.rng);

        let head = session.snake.head();
        let reason = if !session.board.contains(head) {
            Some(GameOverReason::Wall)
        } else if session.snake.head_collides_with_body() {
            Some(GameOverReason::SelfCollision)
        } else {
            None
        };

        if let Some(reason) = reason {
            self.end_game(reason, surface)?;
        } else {
            let changes = session.board.update(session.snake.body(), session.food.position());
            surface.draw_cells(&changes, session.snake.direction())?;
        }

        surface.show_score(self.score)
    }

    pub fn on_clock_tick<S: Surface>(&mut self, surface: &mut S) -> Result<()> {
        if self.phase != Phase::Running {
            return Ok(());
        }

        self.elapsed_seconds += 1;
        surface.show_time(&format_time(self.elapsed_seconds))
    }

    ///////////////////////////////////////////////////////////////////////////

    fn end_game<S: Surface>(&mut self, reason: GameOverReason, surface: &mut S) -> Result<()> {
        self.phase = Phase::GameOver;

        let summary = GameSummary { score: self.score, elapsed_seconds: self.elapsed_seconds, reason };
        info!(?reason, score = summary.score, time = %summary.time(), "game over");

        surface.show_game_over(&summary)?;
        self.summary = Some(summary);
        Ok(())
    }

    #[cfg(test)]
    fn session_mut(&mut self) -> &mut Session {
        self.session.as_mut().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CellChange, Label};
    use crate::direction::Direction::*;
    use crate::util::Position;
    use rand::SeedableRng;

    #[derive(Default)]
    struct RecordingSurface {
        changes: Vec<Vec<CellChange>>,
        scores: Vec<u32>,
        times: Vec<String>,
        ready_shown: bool,
        game_over: Option<GameSummary>,
    }

    impl Surface for RecordingSurface {
        fn draw_cells(&mut self, changes: &[CellChange], _heading: Direction) -> Result<()> {
            self.changes.push(changes.to_vec());
            Ok(())
        }

        fn show_score(&mut self, score: u32) -> Result<()> {
            self.scores.push(score);
            Ok(())
        }

        fn show_time(&mut self, time: &str) -> Result<()> {
            self.times.push(time.to_string());
            Ok(())
        }

        fn show_ready(&mut self) -> Result<()> {
            self.ready_shown = true;
            Ok(())
        }

        fn show_game_over(&mut self, summary: &GameSummary) -> Result<()> {
            self.game_over = Some(summary.clone());
            Ok(())
        }
    }

    fn settings(width: u32, height: u32, speed: u32) -> Settings {
        Settings { width, height, speed }
    }

    /// A 10x10 game with the food parked in a corner away from the snake.
    fn new_game(surface: &mut RecordingSurface) -> GameManager {
        let mut manager = GameManager::new(StdRng::seed_from_u64(3));
        manager.init_game(&settings(10, 10, 10), surface).unwrap();
        manager.session_mut().food.place(Position::new(0, 0));
        manager
    }

    #[test]
    fn test_phases() {
        let mut surface = RecordingSurface::default();
        let mut manager = GameManager::new(StdRng::seed_from_u64(3));
        assert_eq!(manager.phase(), Phase::Configuring);

        manager.init_game(&settings(10, 10, 10), &mut surface).unwrap();
        assert_eq!(manager.phase(), Phase::AwaitingFirstMove);
        assert!(surface.ready_shown);
        assert_eq!(surface.times, vec!["00 : 00"]);
        assert_eq!(surface.changes[0].len(), manager.session_mut().board.marked_cells().len());

        manager.on_movement_tick(&mut surface).unwrap();
        manager.on_clock_tick(&mut surface).unwrap();
        assert_eq!(manager.elapsed_seconds(), 0);

        manager.handle_direction(Up);
        assert_eq!(manager.phase(), Phase::Running);
    }

    #[test]
    fn test_movement_period_truncates() {
        let mut surface = RecordingSurface::default();
        let mut manager = GameManager::new(StdRng::seed_from_u64(3));

        manager.init_game(&settings(10, 10, 7), &mut surface).unwrap();
        assert_eq!(manager.movement_period(), Duration::from_millis(142));

        manager.init_game(&settings(10, 10, 30), &mut surface).unwrap();
        assert_eq!(manager.movement_period(), Duration::from_millis(33));
    }

    #[test]
    fn test_one_tick_right() {
        let mut surface = RecordingSurface::default();
        let mut manager = new_game(&mut surface);
        let head = manager.session_mut().snake.head();
        let tail = manager.session_mut().snake.tail();

        manager.handle_direction(Right);
        manager.on_movement_tick(&mut surface).unwrap();

        let snake = &manager.session_mut().snake;
        assert_eq!(snake.head(), Position::new(head.row, head.col + 1));
        assert!(!snake.body().contains(&tail));
        assert_eq!(snake.len(), 3);
        assert_eq!(manager.score(), 0);
        assert_eq!(surface.scores.last(), Some(&0));
    }

    #[test]
    fn test_food_under_head_grows_on_next_tick() {
        let mut surface = RecordingSurface::default();
        let mut manager = new_game(&mut surface);
        manager.handle_direction(Right);

        let head = manager.session_mut().snake.head();
        manager.session_mut().food.place(head);
        manager.on_movement_tick(&mut surface).unwrap();

        assert_eq!(manager.session_mut().snake.len(), 4);
        assert_eq!(manager.score(), 1);
        assert_eq!(surface.scores.last(), Some(&1));
    }

    #[test]
    fn test_growth_lags_one_tick() {
        let mut surface = RecordingSurface::default();
        let mut manager = new_game(&mut surface);
        manager.handle_direction(Right);

        let head = manager.session_mut().snake.head();
        manager.session_mut().food.place(head.offset(0, 1));

        manager.on_movement_tick(&mut surface).unwrap();
        assert_eq!(manager.session_mut().snake.len(), 3);
        assert_eq!(manager.score(), 0);

        let removed = manager.session_mut().snake.removed_tail().unwrap();
        manager.on_movement_tick(&mut surface).unwrap();
        assert_eq!(manager.session_mut().snake.len(), 4);
        assert_eq!(manager.score(), 1);
        // The segment grown below the vacated tail is the one this move drops.
        assert_eq!(manager.session_mut().snake.removed_tail(), Some(removed.offset(1, 0)));
    }

    #[test]
    fn test_wall_collision_ends_game() {
        let mut surface = RecordingSurface::default();
        let mut manager = new_game(&mut surface);
        manager.handle_direction(Up);

        // Head starts on row 4 of 10, so the fifth move leaves the board.
        for _ in 0..4 {
            manager.on_movement_tick(&mut surface).unwrap();
            assert_eq!(manager.phase(), Phase::Running);
        }
        let draws = surface.changes.len();

        manager.on_movement_tick(&mut surface).unwrap();
        assert_eq!(manager.phase(), Phase::GameOver);
        assert_eq!(surface.changes.len(), draws);

        let summary = surface.game_over.clone().unwrap();
        assert_eq!(summary.reason, GameOverReason::Wall);
        assert_eq!(manager.summary(), Some(&summary));
    }

    #[test]
    fn test_wall_collision_on_each_side() {
        for (dir, moves) in &[(Down, 4), (Left, 6), (Right, 5)] {
            let mut surface = RecordingSurface::default();
            let mut manager = new_game(&mut surface);
            manager.handle_direction(*dir);

            for _ in 0..*moves {
                manager.on_movement_tick(&mut surface).unwrap();
            }

            assert_eq!(manager.phase(), Phase::GameOver, "{:?}", dir);
            assert_eq!(manager.summary().unwrap().reason, GameOverReason::Wall);
        }
    }

    #[test]
    fn test_self_collision_ends_game() {
        let mut surface = RecordingSurface::default();
        let mut manager = new_game(&mut surface);
        manager.handle_direction(Right);

        let session = manager.session_mut();
        let head = session.snake.head();
        for _ in 0..2 {
            session.food.place(session.snake.head());
            session.snake.grow();
            session.snake.advance();
        }
        session.food.place(Position::new(9, 9));
        assert!(session.snake.len() >= 5);
        assert_ne!(session.snake.head(), head);

        manager.handle_direction(Down);
        manager.handle_direction(Left);
        manager.handle_direction(Up);
        for _ in 0..3 {
            manager.on_movement_tick(&mut surface).unwrap();
        }

        assert_eq!(manager.phase(), Phase::GameOver);
        assert_eq!(manager.summary().unwrap().reason, GameOverReason::SelfCollision);
    }

    #[test]
    fn test_no_ticks_after_game_over() {
        let mut surface = RecordingSurface::default();
        let mut manager = new_game(&mut surface);
        manager.handle_direction(Up);

        for _ in 0..5 {
            manager.on_movement_tick(&mut surface).unwrap();
        }
        assert_eq!(manager.phase(), Phase::GameOver);

        let scores = surface.scores.len();
        manager.on_movement_tick(&mut surface).unwrap();
        manager.on_clock_tick(&mut surface).unwrap();
        manager.handle_direction(Left);

        assert_eq!(surface.scores.len(), scores);
        assert_eq!(manager.phase(), Phase::GameOver);
    }

    #[test]
    fn test_clock_ticks_format_time() {
        let mut surface = RecordingSurface::default();
        let mut manager = new_game(&mut surface);
        manager.handle_direction(Left);

        for _ in 0..65 {
            manager.on_clock_tick(&mut surface).unwrap();
        }

        assert_eq!(manager.elapsed_seconds(), 65);
        assert_eq!(surface.times.last().map(String::as_str), Some("01 : 05"));
    }

    #[test]
    fn test_board_tracks_snake_after_ticks() {
        let mut surface = RecordingSurface::default();
        let mut manager = new_game(&mut surface);
        manager.handle_direction(Left);
        manager.on_movement_tick(&mut surface).unwrap();
        manager.on_movement_tick(&mut surface).unwrap();

        let session = manager.session_mut();
        assert_eq!(session.board.marked_cells().len(), session.snake.len() + 1);
        let head_labels = session.board.labels_at(session.snake.head());
        assert_eq!(head_labels.visible(), Some(Label::Head));
    }

    #[test]
    fn test_restart_resets_counters() {
        let mut surface = RecordingSurface::default();
        let mut manager = new_game(&mut surface);
        manager.handle_direction(Up);
        manager.on_clock_tick(&mut surface).unwrap();
        for _ in 0..5 {
            manager.on_movement_tick(&mut surface).unwrap();
        }
        assert_eq!(manager.phase(), Phase::GameOver);

        manager.init_game(&settings(12, 14, 5), &mut surface).unwrap();
        assert_eq!(manager.phase(), Phase::AwaitingFirstMove);
        assert_eq!(manager.elapsed_seconds(), 0);
        assert_eq!(manager.score(), 0);
        assert!(manager.summary().is_none());
    }
}
