use rand::Rng;

use crate::util::{random_int, Position};

pub struct Food {
    row_max: i32,
    col_max: i32,
    position: Option<Position>,
}

impl Food {
    pub fn new<R: Rng + ?Sized>(width: i32, height: i32, rng: &mut R) -> Self {
        let mut food = Food { row_max: height - 1, col_max: width - 1, position: None };
        food.generate(rng);
        food
    }

    /// Picks any cell on the board. Cells under the snake are not excluded.
    pub fn generate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let row = random_int(rng, 0, self.row_max);
        let col = random_int(rng, 0, self.col_max);
        self.position = Some(Position::new(row, col));
    }

    pub fn refresh_if_absent<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if !self.exists() {
            self.generate(rng);
        }
    }

    pub fn exists(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    #[cfg(test)]
    pub fn place(&mut self, pos: Position) {
        self.position = Some(pos);
    }
}
