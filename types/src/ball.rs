use serde::{Deserialize, Serialize};

/// Session-unique identifier of a ball.
pub type BallId = u64;

/// Session-unique identifier of a drop (one play action).
pub type DropId = u64;

/// Direction a ball takes at one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Step {
    Left = 0,
    Right = 1,
}

impl Step {
    /// Horizontal offset contributed by this step (Left = 0, Right = 1).
    pub const fn offset(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Step {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Step::Left),
            1 => Ok(Step::Right),
            i => Err(i),
        }
    }
}

/// Row-by-row left/right sequence of one ball.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    steps: Vec<Step>,
}

impl Path {
    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Direction taken at `row` (0-based).
    pub fn step(&self, row: usize) -> Option<Step> {
        self.steps.get(row).copied()
    }

    /// Horizontal offset after the first `rows` rows.
    pub fn column_at(&self, rows: usize) -> u8 {
        self.steps
            .iter()
            .take(rows)
            .map(|step| step.offset())
            .sum()
    }

    /// Slot the ball lands in: the number of right steps.
    pub fn terminal_index(&self) -> u8 {
        self.column_at(self.steps.len())
    }
}

/// Win/loss classification of a settled ball.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
}

/// Lifecycle state of a ball.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BallState {
    /// Path is known, waiting for its start delay.
    Spawned,
    /// Revealing rows; `row` rows have been revealed so far.
    Falling { row: u8 },
    /// In its slot, paid out, resting for the settle pause.
    Settling,
    /// Finished and reported back to the session.
    Done,
}

/// What a renderer needs to place a ball.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallView {
    pub id: BallId,
    pub drop: DropId,
    pub state: BallState,
    /// Rows revealed so far (0..=rows).
    pub row: u8,
    /// Right steps among the revealed rows.
    pub column: u8,
    pub terminal: u8,
    pub last_step: Option<Step>,
}
