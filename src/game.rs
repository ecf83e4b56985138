use std::collections::BTreeSet;

use log::{debug, info, trace};
use serde::Serialize;

use crate::config::{GameConfig, LineScoring};
use crate::rng::{generate_seed, ShapeRng};
use crate::shapes::{generate_shape, Shape, ShapeColor};

// ============================================================================
// Configuration
// ============================================================================

pub const GRID_SIZE: usize = 6;

// Scoring
pub const POINTS_PER_LINE: u32 = 100;
pub const GRID_CLEAR_BONUS: u32 = 500;

// ============================================================================
// Types
// ============================================================================

/// Anchor of a shape's bounding box, or a single grid coordinate.
///
/// Signed so that drop targets off the grid can be represented and rejected.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

impl Position {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// `(x, y)` as grid indices, if inside the grid.
    pub fn to_grid(self) -> Option<(usize, usize)> {
        grid_index(i32::from(self.x), i32::from(self.y))
    }
}

fn grid_index(x: i32, y: i32) -> Option<(usize, usize)> {
    let size = GRID_SIZE as i32;
    if (0..size).contains(&x) && (0..size).contains(&y) {
        Some((x as usize, y as usize))
    } else {
        None
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(into = "CellRepr")]
pub enum Cell {
    #[default]
    Empty,
    Filled(ShapeColor),
}

impl Cell {
    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled(_))
    }

    pub fn color(&self) -> Option<ShapeColor> {
        match self {
            Cell::Empty => None,
            Cell::Filled(color) => Some(*color),
        }
    }
}

/// Wire form of a cell: `{"filled": bool, "color": "#RRGGBB" | ""}`.
#[derive(Serialize)]
struct CellRepr {
    filled: bool,
    color: &'static str,
}

impl From<Cell> for CellRepr {
    fn from(cell: Cell) -> Self {
        Self {
            filled: cell.is_filled(),
            color: cell.color().map_or("", |c| c.hex()),
        }
    }
}

/// Row-major, indexed `[y][x]`.
pub type Grid = [[Cell; GRID_SIZE]; GRID_SIZE];

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum GameState {
    Playing,
    GameOver,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub enum GameEvent {
    ShapePlaced { at: Position, cells: usize },
    LinesCleared { rows: u32, columns: u32, points: u32 },
    GridCleared { bonus: u32 },
    TurnAdvanced,
    GameOver,
}

/// Result of a single `clear_lines` call.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct ClearOutcome {
    /// Complete rows fully covered by the cleared cells.
    pub rows: u32,
    /// Complete columns fully covered by the cleared cells.
    pub columns: u32,
    /// Distinct filled cells that were emptied.
    pub cells: u32,
    pub points: u32,
    pub bonus: u32,
}

impl ClearOutcome {
    pub fn lines(&self) -> u32 {
        self.rows + self.columns
    }

    pub fn total(&self) -> u32 {
        self.points + self.bonus
    }
}

/// Owned, render-facing copy of everything a front end displays.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct GameSnapshot {
    pub grid: Grid,
    pub score: u32,
    pub current_shape: Shape,
    pub next_shape: Shape,
    pub last_shape: Option<Shape>,
    pub state: GameState,
    pub seed: String,
}

// ============================================================================
// Game
// ============================================================================

/// One game from first draw to game over.
///
/// "New game" builds a fresh `Game`; the old one and its random stream are
/// dropped whole.
#[derive(Debug)]
pub struct Game {
    grid: Grid,
    score: u32,
    current_shape: Shape,
    next_shape: Shape,
    last_shape: Option<Shape>,
    state: GameState,
    seed: String,
    config: GameConfig,
    rng: ShapeRng,
    events: Vec<GameEvent>,
}

impl Game {
    /// Start a game. Blank or missing seeds are replaced by a generated one.
    pub fn new(seed: Option<&str>) -> Self {
        Self::with_config(seed, GameConfig::default())
    }

    pub fn with_config(seed: Option<&str>, config: GameConfig) -> Self {
        let seed = match seed.filter(|s| !s.is_empty()) {
            Some(seed) => seed.to_string(),
            None => generate_seed(),
        };
        let mut rng = ShapeRng::from_seed_str(&seed);
        let current_shape = generate_shape(&mut rng, 0);
        let next_shape = generate_shape(&mut rng, 0);
        info!("new game seed={seed} scoring={:?}", config.scoring);

        Self {
            grid: empty_grid(),
            score: 0,
            current_shape,
            next_shape,
            last_shape: None,
            state: GameState::Playing,
            seed,
            config,
            rng,
            events: Vec::new(),
        }
    }

    /// Start from an arbitrary grid and shape pair.
    ///
    /// The random stream is seeded from `seed` but starts unconsumed, so later
    /// draws differ from a game that generated its own first two shapes.
    pub fn with_shapes(
        seed: &str,
        config: GameConfig,
        grid: Grid,
        current_shape: Shape,
        next_shape: Shape,
    ) -> Self {
        Self {
            grid,
            score: 0,
            current_shape,
            next_shape,
            last_shape: None,
            state: GameState::Playing,
            seed: seed.to_string(),
            config,
            rng: ShapeRng::from_seed_str(seed),
            events: Vec::new(),
        }
    }

    /// A fresh game on the same seed and scoring rule.
    pub fn restart(&self) -> Self {
        Self::with_config(Some(&self.seed), self.config)
    }

    /// A fresh game on a newly generated seed.
    pub fn new_game(&self) -> Self {
        Self::with_config(None, self.config)
    }

    // ------------------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------------------

    pub fn can_place_shape_at(&self, shape: &Shape, x: i16, y: i16) -> bool {
        shape.filled_cells().all(|(sx, sy)| {
            match grid_index(i32::from(x) + sx as i32, i32::from(y) + sy as i32) {
                Some((gx, gy)) => !self.grid[gy][gx].is_filled(),
                None => false,
            }
        })
    }

    pub fn can_place_shape(&self, x: i16, y: i16) -> bool {
        self.can_place_shape_at(&self.current_shape, x, y)
    }

    /// Every anchor on the grid where `shape` fits, row-major.
    ///
    /// Only the 36 on-grid anchors are scanned. `Shape::new` requires a filled
    /// cell in the first row and first column, so no off-grid anchor can fit.
    pub fn valid_placements(&self, shape: &Shape) -> Vec<Position> {
        anchors()
            .filter(|p| self.can_place_shape_at(shape, p.x, p.y))
            .collect()
    }

    /// Whether any of the 36 on-grid anchors fits `shape`.
    pub fn can_place_anywhere(&self, shape: &Shape) -> bool {
        anchors().any(|p| self.can_place_shape_at(shape, p.x, p.y))
    }

    /// Copy the current shape onto the grid with its top-left at `(x, y)`.
    ///
    /// Returns false, leaving everything untouched, if any filled cell would
    /// fall off the grid or onto a filled cell, or the game is over.
    pub fn place_shape(&mut self, x: i16, y: i16) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        if !self.can_place_shape(x, y) {
            trace!("rejected placement at ({x}, {y})");
            return false;
        }

        let color = self.current_shape.color();
        let mut placed = 0;
        for (sx, sy) in self.current_shape.filled_cells() {
            let gx = (i32::from(x) + sx as i32) as usize;
            let gy = (i32::from(y) + sy as i32) as usize;
            self.grid[gy][gx] = Cell::Filled(color);
            placed += 1;
        }

        debug!("placed {placed} cells at ({x}, {y})");
        self.events.push(GameEvent::ShapePlaced {
            at: Position::new(x, y),
            cells: placed,
        });
        true
    }

    // ------------------------------------------------------------------------
    // Line Clearing
    // ------------------------------------------------------------------------

    pub fn is_row_complete(&self, y: usize) -> bool {
        self.grid[y].iter().all(Cell::is_filled)
    }

    pub fn is_column_complete(&self, x: usize) -> bool {
        self.grid.iter().all(|row| row[x].is_filled())
    }

    pub fn complete_rows(&self) -> Vec<usize> {
        (0..GRID_SIZE).filter(|&y| self.is_row_complete(y)).collect()
    }

    pub fn complete_columns(&self) -> Vec<usize> {
        (0..GRID_SIZE).filter(|&x| self.is_column_complete(x)).collect()
    }

    /// Cells of every complete row and column, each coordinate once, row-major.
    pub fn find_lines_to_clear(&self) -> Vec<Position> {
        let rows = self.complete_rows();
        let columns = self.complete_columns();
        anchors()
            .filter(|p| rows.contains(&(p.y as usize)) || columns.contains(&(p.x as usize)))
            .collect()
    }

    /// Empty the given cells and score the lines they complete.
    ///
    /// Lines are re-derived from the grid before anything is emptied: a row or
    /// column scores only if it is full and all six of its cells are listed.
    /// Clearing an already-empty set therefore scores nothing. Coordinates off
    /// the grid are ignored.
    pub fn clear_lines(&mut self, cells: &[Position]) -> ClearOutcome {
        if self.state != GameState::Playing {
            return ClearOutcome::default();
        }

        let targets: BTreeSet<(usize, usize)> =
            cells.iter().filter_map(|p| p.to_grid()).collect();

        let rows = (0..GRID_SIZE)
            .filter(|&y| {
                self.is_row_complete(y) && (0..GRID_SIZE).all(|x| targets.contains(&(x, y)))
            })
            .count() as u32;
        let columns = (0..GRID_SIZE)
            .filter(|&x| {
                self.is_column_complete(x) && (0..GRID_SIZE).all(|y| targets.contains(&(x, y)))
            })
            .count() as u32;
        let filled = targets
            .iter()
            .filter(|&&(x, y)| self.grid[y][x].is_filled())
            .count() as u32;

        for &(x, y) in &targets {
            self.grid[y][x] = Cell::Empty;
        }

        let scored = match self.config.scoring {
            LineScoring::PerLine => rows + columns,
            LineScoring::PerCell => filled,
        };
        let points = scored * POINTS_PER_LINE;
        let bonus = if scored > 0 && self.is_grid_empty() {
            GRID_CLEAR_BONUS
        } else {
            0
        };
        self.score += points + bonus;

        if scored > 0 {
            debug!("cleared {rows} rows, {columns} columns for {points} points");
            self.events.push(GameEvent::LinesCleared {
                rows,
                columns,
                points,
            });
        }
        if bonus > 0 {
            debug!("grid cleared, bonus {bonus}");
            self.events.push(GameEvent::GridCleared { bonus });
        }

        ClearOutcome {
            rows,
            columns,
            cells: filled,
            points,
            bonus,
        }
    }

    // ------------------------------------------------------------------------
    // Turns
    // ------------------------------------------------------------------------

    /// Promote the next shape, or end the game if it fits nowhere.
    ///
    /// On promotion a new next shape is drawn with the current score.
    pub fn next_turn(&mut self) {
        if self.state != GameState::Playing {
            return;
        }

        if !self.can_place_anywhere(&self.next_shape) {
            self.last_shape = Some(self.next_shape.clone());
            self.state = GameState::GameOver;
            self.events.push(GameEvent::GameOver);
            info!("game over seed={} score={}", self.seed, self.score);
            return;
        }

        let fresh = generate_shape(&mut self.rng, self.score);
        self.current_shape = std::mem::replace(&mut self.next_shape, fresh);
        self.events.push(GameEvent::TurnAdvanced);
        debug!("turn advanced, score={}", self.score);
    }

    /// Place, clear whatever completed, and advance, with no pause in between.
    ///
    /// Returns `None` if the placement was rejected.
    pub fn play(&mut self, x: i16, y: i16) -> Option<ClearOutcome> {
        if !self.place_shape(x, y) {
            return None;
        }
        let lines = self.find_lines_to_clear();
        let outcome = if lines.is_empty() {
            ClearOutcome::default()
        } else {
            self.clear_lines(&lines)
        };
        self.next_turn();
        Some(outcome)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cell(&self, x: i16, y: i16) -> Option<Cell> {
        Position::new(x, y).to_grid().map(|(x, y)| self.grid[y][x])
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn current_shape(&self) -> &Shape {
        &self.current_shape
    }

    pub fn next_shape(&self) -> &Shape {
        &self.next_shape
    }

    /// The shape that could not be placed, once the game is over.
    pub fn last_shape(&self) -> Option<&Shape> {
        self.last_shape.as_ref()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    /// Random draws consumed so far.
    pub fn draws(&self) -> u64 {
        self.rng.draws()
    }

    pub fn is_grid_empty(&self) -> bool {
        self.grid.iter().flatten().all(|cell| !cell.is_filled())
    }

    pub fn total_filled_cells(&self) -> usize {
        self.grid.iter().flatten().filter(|cell| cell.is_filled()).count()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            grid: self.grid,
            score: self.score,
            current_shape: self.current_shape.clone(),
            next_shape: self.next_shape.clone(),
            last_shape: self.last_shape.clone(),
            state: self.state,
            seed: self.seed.clone(),
        }
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(None)
    }
}

pub fn empty_grid() -> Grid {
    [[Cell::Empty; GRID_SIZE]; GRID_SIZE]
}

/// All 36 anchors, row-major.
fn anchors() -> impl Iterator<Item = Position> {
    (0..GRID_SIZE as i16).flat_map(|y| (0..GRID_SIZE as i16).map(move |x| Position::new(x, y)))
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;
    use crate::shapes::template_by_name;

    pub const TEST_SEED: &str = "test";

    pub fn fill_row(grid: &mut Grid, y: usize) {
        for x in 0..GRID_SIZE {
            grid[y][x] = Cell::Filled(ShapeColor::Red);
        }
    }

    pub fn fill_column(grid: &mut Grid, x: usize) {
        for row in grid.iter_mut() {
            row[x] = Cell::Filled(ShapeColor::Red);
        }
    }

    pub fn fill_row_with_gap(grid: &mut Grid, y: usize, gap_x: usize) {
        for x in 0..GRID_SIZE {
            if x != gap_x {
                grid[y][x] = Cell::Filled(ShapeColor::Red);
            }
        }
    }

    pub fn full_grid() -> Grid {
        [[Cell::Filled(ShapeColor::Red); GRID_SIZE]; GRID_SIZE]
    }

    /// Catalog shape by name, in blue.
    ///
    /// Panics on unknown names.
    pub fn shape(name: &str) -> Shape {
        let template = template_by_name(name).unwrap_or_else(|| panic!("no template {name}"));
        Shape::from_template(template, ShapeColor::Blue)
    }

    pub fn single() -> Shape {
        shape("single")
    }

    pub fn game_with(grid: Grid, current: Shape, next: Shape) -> Game {
        Game::with_shapes(TEST_SEED, GameConfig::default(), grid, current, next)
    }

    pub fn game_with_scoring(grid: Grid, scoring: LineScoring) -> Game {
        Game::with_shapes(TEST_SEED, GameConfig { scoring }, grid, single(), single())
    }
}
