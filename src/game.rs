use std::time::{Duration, Instant};

use anyhow::Result;
use rand::rngs::StdRng;
use tracing::info;

use crate::board::Surface;
use crate::clock::{Scheduler, Tick};
use crate::direction::Direction;
use crate::input::{key_action, KeyAction};
use crate::manager::{GameManager, Phase, CLOCK_PERIOD};
use crate::settings::Settings;
use crate::term::TermManager;

/// How long to wait for input when no tick is scheduled.
const IDLE_POLL_MS: u64 = 250;

pub struct SnakeGame {
    settings: Settings,
    term: TermManager,
    manager: GameManager,
    scheduler: Scheduler,
}

impl SnakeGame {
    pub fn new(settings: Settings, rng: StdRng) -> Result<Self> {
        let term = TermManager::new()?;
        term.check_fits(settings.width, settings.height)?;

        Ok(SnakeGame { settings, term, manager: GameManager::new(rng), scheduler: Scheduler::new() })
    }

    /// Plays until the user quits. The terminal is restored even when the
    /// game loop fails.
    pub fn run(&mut self) -> Result<()> {
        self.term.setup()?;
        let result = self.play();
        let restored = self.term.restore();
        result.and(restored)
    }

    ///////////////////////////////////////////////////////////////////////////

    fn play(&mut self) -> Result<()> {
        self.new_session()?;

        loop {
            let timeout = self.time_until_next_tick(Instant::now());

            for key_ev in self.term.read_key_events(timeout)? {
                match key_action(&key_ev) {
                    KeyAction::Quit => {
                        info!("quit requested");
                        return Ok(());
                    }
                    KeyAction::Restart if self.manager.phase() == Phase::GameOver => self.new_session()?,
                    KeyAction::Turn(dir) => {
                        if turn(&mut self.manager, &mut self.scheduler, dir, Instant::now()) {
                            self.term.hide_message()?;
                        }
                    }
                    KeyAction::Restart | KeyAction::None => {}
                }
            }

            fire_due_ticks(&mut self.manager, &mut self.scheduler, &mut self.term, Instant::now())?;
        }
    }

    fn new_session(&mut self) -> Result<()> {
        self.scheduler = Scheduler::new();

        self.term.prepare_board(self.settings.width, self.settings.height)?;
        self.manager.init_game(&self.settings, &mut self.term)
    }

    fn time_until_next_tick(&self, now: Instant) -> Duration {
        self.scheduler
            .next_due()
            .map(|due| due.saturating_duration_since(now))
            .unwrap_or(Duration::from_millis(IDLE_POLL_MS))
    }
}

/// Hands a turn to the manager. Returns true when it was the move that
/// started the game, in which case both intervals now run from `now`.
fn turn(manager: &mut GameManager, scheduler: &mut Scheduler, dir: Direction, now: Instant) -> bool {
    let was_waiting = manager.phase() == Phase::AwaitingFirstMove;
    manager.handle_direction(dir);

    if was_waiting && manager.phase() == Phase::Running {
        scheduler.start(manager.movement_period(), CLOCK_PERIOD, now);
        return true;
    }

    false
}

/// Runs every tick that has come due, oldest first, one at a time. The
/// intervals are stopped as soon as a tick ends the game.
fn fire_due_ticks<S: Surface>(
    manager: &mut GameManager,
    scheduler: &mut Scheduler,
    surface: &mut S,
    now: Instant,
) -> Result<()> {
    while let Some(tick) = scheduler.poll(now) {
        match tick {
            Tick::Movement => manager.on_movement_tick(surface)?,
            Tick::Clock => manager.on_clock_tick(surface)?,
        }

        if manager.phase() == Phase::GameOver {
            if scheduler.stop() {
                if let Some(summary) = manager.summary() {
                    info!(score = summary.score, time = %summary.time(), "intervals stopped");
                }
            }
            break;
        }
    }

    Ok(())
}
