//! Board geometry: cells, quadrants, quadrant swaps and win-line masks
//!
//! Cells are numbered row-major, `index = row * 6 + col`, with row 0 at the
//! top and column 0 at the left. Bit `index` of a piece mask is set when the
//! cell is occupied.

use serde::{Deserialize, Serialize};

/// Side length of the board
pub const BOARD_SIZE: usize = 6;

/// Total number of cells
pub const NUM_CELLS: usize = BOARD_SIZE * BOARD_SIZE;

/// A game ends in a draw once every cell is filled
pub const MAX_PLIES: u8 = NUM_CELLS as u8;

/// Side length of a quadrant
pub const QUAD_SIZE: usize = 3;

/// Mask with every cell of the board set
pub const FULL_BOARD: u64 = (1u64 << NUM_CELLS) - 1;

/// Top-left quadrant, used as the template for the others
const BASE_QUADRANT: u64 = 0b111 | (0b111 << 6) | (0b111 << 12);

/// Bit offset of each quadrant's top-left cell
pub const QUADRANT_OFFSETS: [u32; 4] = [0, 3, 18, 21];

/// Cell mask of each quadrant
pub const QUADRANT_MASKS: [u64; 4] = [
    BASE_QUADRANT << QUADRANT_OFFSETS[0],
    BASE_QUADRANT << QUADRANT_OFFSETS[1],
    BASE_QUADRANT << QUADRANT_OFFSETS[2],
    BASE_QUADRANT << QUADRANT_OFFSETS[3],
];

/// Every unordered pair of distinct quadrants, smaller index first
pub const QUAD_SWAPS: [(u8, u8); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

/// Number of five-in-a-row patterns
pub const NUM_WIN_MASKS: usize = 32;

/// All five-in-a-row patterns
pub const WIN_MASKS: [u64; NUM_WIN_MASKS] = build_win_masks();

// ============================================================================
// QUADRANTS
// ============================================================================

/// One of the four 3x3 sub-boards
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quadrant {
    TopLeft = 0,
    TopRight = 1,
    BottomLeft = 2,
    BottomRight = 3,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn mask(self) -> u64 {
        QUADRANT_MASKS[self as usize]
    }

    /// Quadrant containing a cell
    pub fn of_cell(row: usize, col: usize) -> Self {
        let index = (row / QUAD_SIZE) * 2 + col / QUAD_SIZE;
        Self::ALL[index]
    }
}

/// Exchange the contents of quadrants `a` and `b` in a piece mask.
///
/// Swapping is an involution: applying the same swap twice restores the mask.
#[inline]
pub fn swap_quadrants(bits: u64, a: u8, b: u8) -> u64 {
    let (lo, hi) = if a < b { (a as usize, b as usize) } else { (b as usize, a as usize) };
    let shift = QUADRANT_OFFSETS[hi] - QUADRANT_OFFSETS[lo];
    let untouched = bits & !(QUADRANT_MASKS[lo] | QUADRANT_MASKS[hi]);
    let lo_to_hi = (bits & QUADRANT_MASKS[lo]) << shift;
    let hi_to_lo = (bits & QUADRANT_MASKS[hi]) >> shift;
    untouched | lo_to_hi | hi_to_lo
}

/// Contents of a quadrant shifted down to the top-left position
#[inline]
pub fn quadrant_bits(bits: u64, quadrant: usize) -> u64 {
    (bits & QUADRANT_MASKS[quadrant]) >> QUADRANT_OFFSETS[quadrant]
}

// ============================================================================
// CELLS
// ============================================================================

/// Bit index of a cell
#[inline]
pub const fn cell_index(row: usize, col: usize) -> usize {
    row * BOARD_SIZE + col
}

/// One-hot mask of a cell
#[inline]
pub const fn cell_bit(row: usize, col: usize) -> u64 {
    1u64 << cell_index(row, col)
}

/// (row, col) of a one-hot mask
#[inline]
pub fn bit_to_row_col(bit: u64) -> (usize, usize) {
    let index = bit.trailing_zeros() as usize;
    (index / BOARD_SIZE, index % BOARD_SIZE)
}

/// Iterate over the one-hot masks of all set bits, lowest first
pub fn iter_bits(mut bits: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        if bits == 0 {
            None
        } else {
            let lowest = bits & bits.wrapping_neg();
            bits &= bits - 1;
            Some(lowest)
        }
    })
}

/// One-hot mask of the `n`-th set bit (0-based), if it exists
pub fn nth_bit(mut bits: u64, n: u32) -> Option<u64> {
    for _ in 0..n {
        if bits == 0 {
            return None;
        }
        bits &= bits - 1;
    }
    if bits == 0 {
        None
    } else {
        Some(bits & bits.wrapping_neg())
    }
}

/// True if any win line is fully covered by `pieces`
#[inline]
pub fn has_line(pieces: u64) -> bool {
    WIN_MASKS.iter().any(|&mask| pieces & mask == mask)
}

// ============================================================================
// WIN MASK GENERATION
// ============================================================================

const fn line_mask(row: i32, col: i32, d_row: i32, d_col: i32) -> u64 {
    let mut mask = 0u64;
    let mut k = 0;
    while k < 5 {
        let r = row + d_row * k;
        let c = col + d_col * k;
        mask |= 1u64 << (r * BOARD_SIZE as i32 + c);
        k += 1;
    }
    mask
}

const fn build_win_masks() -> [u64; NUM_WIN_MASKS] {
    let mut masks = [0u64; NUM_WIN_MASKS];
    let mut i = 0;

    // Rows and columns, two alignments each
    let mut line = 0;
    while line < BOARD_SIZE as i32 {
        let mut start = 0;
        while start < 2 {
            masks[i] = line_mask(line, start, 0, 1);
            masks[i + 1] = line_mask(start, line, 1, 0);
            i += 2;
            start += 1;
        }
        line += 1;
    }

    // Down-right diagonals: the long one twice, then the two short ones
    masks[i] = line_mask(0, 0, 1, 1);
    masks[i + 1] = line_mask(1, 1, 1, 1);
    masks[i + 2] = line_mask(0, 1, 1, 1);
    masks[i + 3] = line_mask(1, 0, 1, 1);

    // Down-left diagonals
    masks[i + 4] = line_mask(0, 5, 1, -1);
    masks[i + 5] = line_mask(1, 4, 1, -1);
    masks[i + 6] = line_mask(0, 4, 1, -1);
    masks[i + 7] = line_mask(1, 5, 1, -1);

    masks
}
