use crate::{Coords, TermInt};
use crate::board::{CellChange, Label, Surface};
use crate::direction::Direction;
use crate::manager::{GameOverReason, GameSummary};
use std::{io::{Stdout, Write, stdout}, time::Duration};

use anyhow::{bail, Context, Result};
use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{Event, KeyEvent, read, poll};

const SNAKE_BODY_CHAR: char = '█';
const FOOD_CHAR: char = 'O';

/// Board cells are two terminal columns wide so they come out roughly square.
const CELL_WIDTH: TermInt = 2;

pub struct TermManager {
    width: TermInt,
    height: TermInt,
    stdout: Stdout,
    screen: Vec<char>,
    current_msg: Option<Message>,
    origin: Coords,
    board_size: Coords,
    score: u32,
    time: String,
}

struct Message {
    top_left: Coords,
    width: TermInt,
    height: TermInt,
}

impl TermManager {
    pub fn new() -> Result<Self> {
        let (width, height) = terminal::size().context("Error reading terminal size")?;
        let stdout = stdout();
        let screen = vec![' '; width as usize * height as usize];
        Ok(TermManager {
            width,
            height,
            stdout,
            screen,
            current_msg: None,
            origin: (0, 0),
            board_size: (0, 0),
            score: 0,
            time: String::new(),
        })
    }

    /// Terminal area needed for a board: the cells, a border and a status line.
    pub fn required_size(board_width: u32, board_height: u32) -> (u32, u32) {
        (board_width * CELL_WIDTH as u32 + 2, board_height + 3)
    }

    pub fn check_fits(&self, board_width: u32, board_height: u32) -> Result<()> {
        let (need_w, need_h) = Self::required_size(board_width, board_height);
        if (self.width as u32) < need_w || (self.height as u32) < need_h {
            bail!(
                "terminal is {}x{}, a {}x{} board needs at least {}x{}",
                self.width, self.height, board_width, board_height, need_w, need_h
            );
        }
        Ok(())
    }

    pub fn setup(&mut self) -> Result<()> {
        execute!(self.stdout, EnterAlternateScreen).context("Error entering alt screen")?;
        terminal::enable_raw_mode().context("Error setting raw mode")?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking).context("Error hiding cursor")?;
        Ok(())
    }

    pub fn restore(&mut self) -> Result<()> {
        terminal::disable_raw_mode().context("Error setting raw mode")?;
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking).context("Error showing cursor")?;
        execute!(self.stdout, LeaveAlternateScreen).context("Error leaving alt screen")?;
        Ok(())
    }

    /// Key events arriving within `timeout`. Returns as soon as one is
    /// available, or empty once the timeout runs out.
    pub fn read_key_events(&self, timeout: Duration) -> Result<Vec<KeyEvent>> {
        let mut events = vec![];
        let mut wait = timeout;

        while poll(wait)? {
            if let Event::Key(ev) = read()? {
                events.push(ev);
            }
            wait = Duration::from_millis(0);
        }

        Ok(events)
    }

    /// Clears the screen and frames a board of the given size, centered.
    pub fn prepare_board(&mut self, board_width: u32, board_height: u32) -> Result<()> {
        self.clear()?;
        self.hide_message()?;

        let (outer_w, outer_h) = Self::required_size(board_width, board_height);
        let (outer_w, outer_h) = (outer_w as TermInt, outer_h as TermInt);
        let left = (self.width - outer_w) / 2;
        let top = (self.height - outer_h) / 2;

        self.origin = (left + 1, top + 1);
        self.board_size = (board_width as TermInt, board_height as TermInt);
        self.draw_borders(left, top, outer_w, outer_h - 1)?;
        self.flush()
    }

    pub fn show_message(&mut self, lines: &[&str]) -> Result<()> {
        if self.has_message() {
            self.hide_message()?;
        }

        let msg_height = (lines.len() + 2) as TermInt;
        let msg_width = (lines.iter().map(|x| x.chars().count()).max().unwrap_or(0) + 2) as TermInt;
        let msg_width = msg_width.min(self.width);
        let center = (self.width / 2, self.height / 2);
        let top_left = (center.0.saturating_sub(msg_width / 2), center.1.saturating_sub(msg_height / 2));

        // Print the top and bottom empty lines
        for y in [top_left.1, top_left.1 + msg_height - 1].iter() {
            for x_diff in 0..msg_width {
                self.print_at_no_save((top_left.0 + x_diff, *y), ' ')?;
            }
        }

        // Print the message lines
        for (i, line) in lines.iter().enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as TermInt + 1;
            for (x_diff, ch) in padded_line.chars().take(msg_width as usize).enumerate() {
                self.print_at_no_save((top_left.0 + x_diff as TermInt, y), ch)?;
            }
        }

        self.current_msg = Some(Message::new(msg_width, msg_height, top_left));
        self.flush()
    }

    pub fn hide_message(&mut self) -> Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };
        let top_left = msg.top_left();

        // Restore the content from the screen buffer
        for y_diff in 0..msg.height() {
            for x_diff in 0..msg.width() {
                let (x, y) = (top_left.0 + x_diff, top_left.1 + y_diff);
                let ch = self.screen[self.width as usize * y as usize + x as usize];
                self.print_at_no_save((x, y), ch)?;
            }
        }

        self.flush()
    }

    pub fn print_at(&mut self, pos: Coords, ch: char) -> Result<()> {
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(ch))?;
        self.screen[self.width as usize * pos.1 as usize + pos.0 as usize] = ch;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        execute!(self.stdout, terminal::Clear(ClearType::All)).context("Error clearing")?;
        self.screen = vec![' '; self.width as usize * self.height as usize];
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.stdout.flush().context("Error flushing")
    }

    pub fn has_message(&self) -> bool {
        self.current_msg.is_some()
    }

    ///////////////////////////////////////////////////////////////////////////

    fn draw_borders(&mut self, left: TermInt, top: TermInt, width: TermInt, height: TermInt) -> Result<()> {
        let end_x = left + width - 1;
        let end_y = top + height - 1;

        for x in left..=end_x {
            let ch = if x == left || x == end_x {'+'} else {'-'};
            self.print_at((x, top), ch)?;
            self.print_at((x, end_y), ch)?;
        }

        for y in top + 1..end_y {
            self.print_at((left, y), '|')?;
            self.print_at((end_x, y), '|')?;
        }

        Ok(())
    }

    fn draw_status(&mut self) -> Result<()> {
        let y = self.origin.1 + self.board_size.1 + 1;
        let line_width = (self.board_size.0 * CELL_WIDTH + 2) as usize;
        let text = format!("Score: {}   Time: {}", self.score, self.time);
        let padded = format!("{: <width$}", text, width = line_width);

        for (i, ch) in padded.chars().take(line_width).enumerate() {
            self.print_at((self.origin.0 - 1 + i as TermInt, y), ch)?;
        }

        self.flush()
    }

    fn cell_coords(&self, change: &CellChange) -> Option<Coords> {
        let (row, col) = (change.position.row, change.position.col);
        if row < 0 || col < 0 || row >= self.board_size.1 as i32 || col >= self.board_size.0 as i32 {
            return None;
        }

        Some((self.origin.0 + col as TermInt * CELL_WIDTH, self.origin.1 + row as TermInt))
    }

    fn print_at_no_save(&mut self, pos: Coords, ch: char) -> Result<()> {
        // To be used for printing messages, where we don't wanna overwrite our
        // local buffer to restore it when the message is hidden
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(ch))?;
        Ok(())
    }
}

fn cell_char(change: &CellChange, heading: Direction) -> char {
    match change.labels.visible() {
        Some(Label::Head) => heading.head_char(),
        Some(Label::Food) => FOOD_CHAR,
        Some(Label::Body) => SNAKE_BODY_CHAR,
        None => ' ',
    }
}

/// The game-over panel. Board size and speed are fixed for a run, so the
/// panel points at the launch flags for changing them.
fn game_over_lines(summary: &GameSummary) -> Vec<String> {
    let cause = match summary.reason {
        GameOverReason::Wall => "Hit the wall",
        GameOverReason::SelfCollision => "Bit itself",
    };

    vec![
        "G A M E O V E R".to_string(),
        cause.to_string(),
        format!("Score: {}", summary.score),
        format!("Time: {}", summary.time()),
        String::new(),
        "R to restart".to_string(),
        "Q to quit".to_string(),
        "New size or speed:".to_string(),
        "relaunch with".to_string(),
        "--width --height".to_string(),
        "or --speed".to_string(),
    ]
}

impl Surface for TermManager {
    fn draw_cells(&mut self, changes: &[CellChange], heading: Direction) -> Result<()> {
        for change in changes {
            if let Some((x, y)) = self.cell_coords(change) {
                let ch = cell_char(change, heading);
                let fill = if ch == SNAKE_BODY_CHAR { ch } else { ' ' };
                self.print_at((x, y), ch)?;
                self.print_at((x + 1, y), fill)?;
            }
        }

        self.flush()
    }

    fn show_score(&mut self, score: u32) -> Result<()> {
        self.score = score;
        self.draw_status()
    }

    fn show_time(&mut self, time: &str) -> Result<()> {
        self.time = time.to_string();
        self.draw_status()
    }

    fn show_ready(&mut self) -> Result<()> {
        self.show_message(&["Arrow keys to move", "Press one to start", "Q to quit"])
    }

    fn show_game_over(&mut self, summary: &GameSummary) -> Result<()> {
        let lines = game_over_lines(summary);
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        self.show_message(&lines)
    }
}

impl Message {
    pub fn new(width: TermInt, height: TermInt, top_left: Coords) -> Self {
        Message { width, height, top_left }
    }

    pub fn width(&self) -> TermInt {
        self.width
    }

    pub fn height(&self) -> TermInt {
        self.height
    }

    pub fn top_left(&self) -> Coords {
        self.top_left
    }
}
