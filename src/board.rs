use std::collections::{BTreeMap, BTreeSet};

use crate::direction::Direction;
use crate::manager::GameSummary;
use crate::util::Position;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Label {
    Food,
    Head,
    Body,
}

/// The set of labels carried by one cell. Marking only ever adds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Labels(u8);

impl Labels {
    pub const EMPTY: Labels = Labels(0);

    fn bit(label: Label) -> u8 {
        match label {
            Label::Food => 0b001,
            Label::Head => 0b010,
            Label::Body => 0b100,
        }
    }

    pub fn insert(&mut self, label: Label) {
        self.0 |= Self::bit(label);
    }

    pub fn contains(self, label: Label) -> bool {
        self.0 & Self::bit(label) != 0
    }

    #[cfg(test)]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The label to display when several share a cell.
    pub fn visible(self) -> Option<Label> {
        [Label::Head, Label::Food, Label::Body].iter().copied().find(|l| self.contains(*l))
    }
}

impl From<Label> for Labels {
    fn from(label: Label) -> Self {
        let mut labels = Labels::EMPTY;
        labels.insert(label);
        labels
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellChange {
    pub position: Position,
    pub labels: Labels,
}

/// Where the game draws itself.
pub trait Surface {
    fn draw_cells(&mut self, changes: &[CellChange], heading: Direction) -> anyhow::Result<()>;
    fn show_score(&mut self, score: u32) -> anyhow::Result<()>;
    fn show_time(&mut self, time: &str) -> anyhow::Result<()>;
    fn show_ready(&mut self) -> anyhow::Result<()>;
    fn show_game_over(&mut self, summary: &GameSummary) -> anyhow::Result<()>;
}

pub struct Board {
    width: i32,
    height: i32,
    cells: Vec<Labels>,
    marked: BTreeSet<usize>,
}

impl Board {
    /// Allocates an empty board and draws the first state onto it. Returns the
    /// board with the changes needed to show that state.
    pub fn initialize<'a, I>(width: i32, height: i32, body: I, food: Option<Position>) -> (Self, Vec<CellChange>)
    where
        I: IntoIterator<Item = &'a Position>,
    {
        let mut board = Board {
            width,
            height,
            cells: vec![Labels::EMPTY; (width * height) as usize],
            marked: BTreeSet::new(),
        };

        let changes = board.update(body, food);
        (board, changes)
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.row < self.height && pos.col >= 0 && pos.col < self.width
    }

    /// Row-major index, or `None` off the board.
    pub fn cell_index(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some((pos.row * self.width + pos.col) as usize)
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn labels_at(&self, pos: Position) -> Labels {
        self.cell_index(pos).map(|idx| self.cells[idx]).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn marked_cells(&self) -> &BTreeSet<usize> {
        &self.marked
    }

    /// Clears every marked cell, then marks food, head and body in that order.
    /// Returns only the cells whose labels ended up different.
    pub fn update<'a, I>(&mut self, body: I, food: Option<Position>) -> Vec<CellChange>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        let previous: BTreeMap<usize, Labels> = self.marked.iter().map(|idx| (*idx, self.cells[*idx])).collect();
        self.clear();

        if let Some(pos) = food {
            self.mark(pos, Label::Food);
        }

        for (i, pos) in body.into_iter().enumerate() {
            let label = if i == 0 { Label::Head } else { Label::Body };
            self.mark(*pos, label);
        }

        let touched: BTreeSet<usize> = previous.keys().chain(self.marked.iter()).copied().collect();

        touched
            .into_iter()
            .filter(|idx| previous.get(idx).copied().unwrap_or_default() != self.cells[*idx])
            .map(|idx| CellChange { position: self.position_of(idx), labels: self.cells[idx] })
            .collect()
    }

    ///////////////////////////////////////////////////////////////////////////

    fn clear(&mut self) {
        for idx in std::mem::take(&mut self.marked) {
            self.cells[idx] = Labels::EMPTY;
        }
    }

    fn mark(&mut self, pos: Position, label: Label) {
        if let Some(idx) = self.cell_index(pos) {
            self.cells[idx].insert(label);
            self.marked.insert(idx);
        }
    }

    fn position_of(&self, idx: usize) -> Position {
        let idx = idx as i32;
        Position::new(idx / self.width, idx % self.width)
    }
}
