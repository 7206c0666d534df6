use rand::Rng;

/// A cell on the board. Rows and columns are signed so a head that has just
/// left the board can still be represented.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Position { row, col }
    }

    pub fn offset(self, dr: i32, dc: i32) -> Self {
        Position { row: self.row + dr, col: self.col + dc }
    }
}

/// Uniform integer in `[min, max]`, both ends included.
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    rng.gen_range(min..=max)
}

/// Formats a number of seconds as `mm : ss`.
pub fn format_time(raw_seconds: u64) -> String {
    let min = raw_seconds / 60;
    let sec = raw_seconds % 60;
    format!("{:02} : {:02}", min, sec)
}
