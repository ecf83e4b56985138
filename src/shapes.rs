use serde::{Serialize, Serializer};

use crate::error::ShapeError;
use crate::rng::ShapeRng;

// ============================================================================
// Colors
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ShapeColor {
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Cyan,
    Orange,
    Purple,
}

/// Fixed palette, in draw order.
pub const PALETTE: [ShapeColor; 8] = [
    ShapeColor::Red,
    ShapeColor::Green,
    ShapeColor::Blue,
    ShapeColor::Yellow,
    ShapeColor::Magenta,
    ShapeColor::Cyan,
    ShapeColor::Orange,
    ShapeColor::Purple,
];

impl ShapeColor {
    pub fn hex(&self) -> &'static str {
        match self {
            ShapeColor::Red => "#FF0000",
            ShapeColor::Green => "#00FF00",
            ShapeColor::Blue => "#0000FF",
            ShapeColor::Yellow => "#FFFF00",
            ShapeColor::Magenta => "#FF00FF",
            ShapeColor::Cyan => "#00FFFF",
            ShapeColor::Orange => "#FFA500",
            ShapeColor::Purple => "#800080",
        }
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            ShapeColor::Red => (0xFF, 0x00, 0x00),
            ShapeColor::Green => (0x00, 0xFF, 0x00),
            ShapeColor::Blue => (0x00, 0x00, 0xFF),
            ShapeColor::Yellow => (0xFF, 0xFF, 0x00),
            ShapeColor::Magenta => (0xFF, 0x00, 0xFF),
            ShapeColor::Cyan => (0x00, 0xFF, 0xFF),
            ShapeColor::Orange => (0xFF, 0xA5, 0x00),
            ShapeColor::Purple => (0x80, 0x00, 0x80),
        }
    }
}

impl Serialize for ShapeColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.hex())
    }
}

// ============================================================================
// Template Catalog
// ============================================================================

/// Score needed to unlock each tier, indexed by tier.
pub const TIER_THRESHOLDS: [u32; 3] = [0, 1000, 2000];

#[derive(Debug, PartialEq, Eq)]
pub struct ShapeTemplate {
    pub name: &'static str,
    pub tier: usize,
    pub rows: &'static [&'static [bool]],
}

impl ShapeTemplate {
    pub fn is_unlocked(&self, score: u32) -> bool {
        score >= TIER_THRESHOLDS[self.tier]
    }
}

/// Every template, ordered by tier.
pub static CATALOG: [ShapeTemplate; 12] = [
    ShapeTemplate { name: "single", tier: 0, rows: &[&[true]] },
    ShapeTemplate { name: "domino", tier: 0, rows: &[&[true, true]] },
    ShapeTemplate { name: "line-3", tier: 0, rows: &[&[true, true, true]] },
    ShapeTemplate {
        name: "corner-3",
        tier: 0,
        rows: &[&[true, true], &[true, false]],
    },
    ShapeTemplate { name: "line-4", tier: 0, rows: &[&[true, true, true, true]] },
    ShapeTemplate {
        name: "square",
        tier: 0,
        rows: &[&[true, true], &[true, true]],
    },
    ShapeTemplate {
        name: "tee",
        tier: 0,
        rows: &[&[true, true, true], &[false, true, false]],
    },
    ShapeTemplate { name: "line-5", tier: 0, rows: &[&[true, true, true, true, true]] },
    ShapeTemplate {
        name: "p-wide",
        tier: 0,
        rows: &[&[true, true, true], &[true, true, false]],
    },
    ShapeTemplate {
        name: "p-tall",
        tier: 0,
        rows: &[&[true, true], &[true, true], &[true, false]],
    },
    ShapeTemplate {
        name: "diagonal-down",
        tier: 1,
        rows: &[
            &[true, false, false],
            &[false, true, false],
            &[false, false, true],
        ],
    },
    ShapeTemplate {
        name: "diagonal-up",
        tier: 2,
        rows: &[
            &[false, false, true],
            &[false, true, false],
            &[true, false, false],
        ],
    },
];

/// Templates unlocked at `score`, tier 0 first.
pub fn available_templates(score: u32) -> Vec<&'static ShapeTemplate> {
    CATALOG.iter().filter(|t| t.is_unlocked(score)).collect()
}

pub fn template_by_name(name: &str) -> Option<&'static ShapeTemplate> {
    CATALOG.iter().find(|t| t.name == name)
}

// ============================================================================
// Shape
// ============================================================================

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Shape {
    rows: Vec<Vec<bool>>,
    color: ShapeColor,
}

impl Shape {
    /// Build a shape from a rectangular matrix with at least one filled cell.
    ///
    /// The first row and first column must each contain a filled cell, so the
    /// shape's top-left anchor is never off the grid when it fits.
    pub fn new(rows: Vec<Vec<bool>>, color: ShapeColor) -> Result<Self, ShapeError> {
        let width = rows.first().map(Vec::len).ok_or(ShapeError::Empty)?;
        if width == 0 {
            return Err(ShapeError::Empty);
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != width {
                return Err(ShapeError::Ragged {
                    row,
                    expected: width,
                    found: cells.len(),
                });
            }
        }
        if !rows.iter().flatten().any(|filled| *filled) {
            return Err(ShapeError::NoFilledCells);
        }
        let top = rows[0].iter().any(|filled| *filled);
        let left = rows.iter().any(|row| row[0]);
        if !top || !left {
            return Err(ShapeError::NotTrimmed);
        }
        Ok(Self { rows, color })
    }

    pub fn from_template(template: &ShapeTemplate, color: ShapeColor) -> Self {
        Self {
            rows: template.rows.iter().map(|row| row.to_vec()).collect(),
            color,
        }
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    pub fn color(&self) -> ShapeColor {
        self.color
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_filled(&self, sx: usize, sy: usize) -> bool {
        self.rows
            .get(sy)
            .and_then(|row| row.get(sx))
            .copied()
            .unwrap_or(false)
    }

    /// Shape-local `(sx, sy)` offsets of the filled cells, row-major.
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(sy, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(sx, _)| (sx, sy))
        })
    }

    pub fn cell_count(&self) -> usize {
        self.filled_cells().count()
    }

    pub fn matches_template(&self, template: &ShapeTemplate) -> bool {
        self.rows.len() == template.rows.len()
            && self
                .rows
                .iter()
                .zip(template.rows.iter())
                .all(|(a, b)| a.as_slice() == *b)
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Draw one shape from the pool unlocked at `score`.
///
/// Consumes exactly two draws: template index, then palette index.
pub fn generate_shape(rng: &mut ShapeRng, score: u32) -> Shape {
    let pool = available_templates(score);
    let template = pool[rng.pick(pool.len())];
    let color = PALETTE[rng.pick(PALETTE.len())];
    Shape::from_template(template, color)
}
