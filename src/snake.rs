use std::collections::VecDeque;

use crate::direction::Direction::{self, *};
use crate::util::Position;

pub const INITIAL_SNAKE_LENGTH: usize = 3;

pub struct Snake {
    body: VecDeque<Position>,
    direction: Direction,
    next_directions: VecDeque<Direction>,
    removed_tail: Option<Position>,
}

impl Snake {
    /// Lays the snake out as a vertical strip centered on the board, topmost
    /// segment first.
    pub fn new(width: i32, height: i32) -> Self {
        let len = INITIAL_SNAKE_LENGTH as i32;
        let head_row = height / 2 - len / 2;
        let head_col = width / 2;

        let body = (0..len)
            .map(|i| Position::new(head_row + i, head_col))
            .collect();

        Snake { body, direction: Up, next_directions: VecDeque::new(), removed_tail: None }
    }

    /// Only a downward start flips the body, so the bottom segment leads.
    pub fn set_initial_direction(&mut self, direction: Direction) {
        self.direction = direction;

        if direction == Down {
            self.body.make_contiguous().reverse();
        }
    }

    pub fn body(&self) -> &VecDeque<Position> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[cfg(test)]
    pub fn queued_directions(&self) -> &VecDeque<Direction> {
        &self.next_directions
    }

    #[cfg(test)]
    pub fn removed_tail(&self) -> Option<Position> {
        self.removed_tail
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn tail(&self) -> Position {
        self.body[self.body.len() - 1]
    }

    pub fn advance(&mut self) {
        if let Some(dir) = self.next_directions.pop_front() {
            self.direction = dir;
        }

        let (dr, dc) = self.direction.delta();
        let new_head = self.head().offset(dr, dc);

        self.body.push_front(new_head);
        self.removed_tail = self.body.pop_back();
    }

    /// Rejects a turn straight back against the most recent intent, whether
    /// that is still queued or already live.
    pub fn queue_direction(&mut self, direction: Direction) -> bool {
        let last = self.next_directions.back().copied().unwrap_or(self.direction);

        if last.is_opposite(direction) {
            return false;
        }

        self.next_directions.push_back(direction);
        true
    }

    /// Extends one row below the cell the tail last vacated, whatever way the
    /// snake is heading. Before any move has happened the current tail is the anchor.
    pub fn grow(&mut self) {
        let anchor = self.removed_tail.unwrap_or_else(|| self.tail());
        self.body.push_back(anchor.offset(1, 0));
    }

    pub fn head_collides_with_body(&self) -> bool {
        let head = self.head();
        self.body.iter().skip(1).any(|pos| *pos == head)
    }
}
