//! Shape Sorter: place seeded random shapes on a 6×6 grid and clear lines.

pub mod config;
pub mod error;
pub mod game;
pub mod rng;
pub mod shapes;

pub use config::{Cli, GameConfig, LineScoring};
pub use error::{Error, Result, ShapeError};
pub use game::{Cell, ClearOutcome, Game, GameEvent, GameSnapshot, GameState, Position};
pub use shapes::{generate_shape, Shape, ShapeColor};
