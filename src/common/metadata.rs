use std::fmt::{Debug, Display, Error, Formatter};
use std::ops::{Deref, Not};

use super::codec::Mode;
use super::error::{QRError, QRResult};
use super::mask::MaskPattern;

// Color
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Color {
    Light,
    Dark,
}

impl Not for Color {
    type Output = Self;
    fn not(self) -> Self::Output {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    /// The 2-bit code carried in the format information. Not the ordinal:
    /// L/M and Q/H are swapped pairwise.
    pub fn format_bits(self) -> u32 {
        self as u32 ^ 1
    }
}

impl Display for ECLevel {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        Debug::fmt(self, f)
    }
}

// Version
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct Version(usize);

impl Deref for Version {
    type Target = usize;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Version {
    pub const MIN: Self = Version(1);
    pub const MAX: Self = Version(40);

    pub fn new(version: usize) -> QRResult<Self> {
        if (1..=40).contains(&version) {
            Ok(Self(version))
        } else {
            Err(QRError::InvalidVersion)
        }
    }

    pub(crate) const fn new_unchecked(version: usize) -> Self {
        debug_assert!(1 <= version && version <= 40, "Invalid version");
        Self(version)
    }

    pub const fn width(self) -> usize {
        self.0 * 4 + 17
    }

    pub fn alignment_pattern(self) -> &'static [i16] {
        ALIGNMENT_PATTERN_POSITIONS[self.0 - 1]
    }

    pub fn char_count_bits(self, mode: Mode) -> usize {
        match self.0 {
            1..=9 => match mode {
                Mode::Numeric => 10,
                Mode::Alphanumeric => 9,
                Mode::Byte => 8,
                Mode::Gb2312 => 8,
                Mode::Eci => 0,
            },
            10..=26 => match mode {
                Mode::Numeric => 12,
                Mode::Alphanumeric => 11,
                Mode::Byte => 16,
                Mode::Gb2312 => 10,
                Mode::Eci => 0,
            },
            _ => match mode {
                Mode::Numeric => 14,
                Mode::Alphanumeric => 13,
                Mode::Byte => 16,
                Mode::Gb2312 => 12,
                Mode::Eci => 0,
            },
        }
    }

    // Modules left for codeword and remainder bits once finders, separators,
    // timing, alignment, format and version areas are excluded.
    pub(crate) fn num_raw_data_modules(self) -> usize {
        let v = self.0;
        let mut result = (16 * v + 128) * v + 64;
        if v >= 2 {
            let num_align = v / 7 + 2;
            result -= (25 * num_align - 10) * num_align - 55;
            if v >= 7 {
                result -= 36;
            }
        }
        result
    }

    pub fn total_codewords(self) -> usize {
        self.num_raw_data_modules() >> 3
    }

    pub fn ecc_per_block(self, ec_level: ECLevel) -> usize {
        ECC_PER_BLOCK[self.0 - 1][ec_level as usize]
    }

    pub fn num_ec_blocks(self, ec_level: ECLevel) -> usize {
        NUM_EC_BLOCKS[self.0 - 1][ec_level as usize]
    }

    pub fn data_codewords(self, ec_level: ECLevel) -> usize {
        self.total_codewords() - self.ecc_per_block(ec_level) * self.num_ec_blocks(ec_level)
    }

    pub fn data_bit_capacity(self, ec_level: ECLevel) -> usize {
        self.data_codewords(ec_level) << 3
    }

    /// Block layout as (short block data len, short block count, long block
    /// data len, long block count). Long blocks carry one extra data codeword
    /// and come after all short blocks.
    pub fn data_codewords_per_block(self, ec_level: ECLevel) -> (usize, usize, usize, usize) {
        let total = self.total_codewords();
        let num_blocks = self.num_ec_blocks(ec_level);
        let short_size = total / num_blocks - self.ecc_per_block(ec_level);
        let num_long = total % num_blocks;
        if num_long == 0 {
            (short_size, num_blocks, 0, 0)
        } else {
            (short_size, num_blocks - num_long, short_size + 1, num_long)
        }
    }

    /// 18-bit version information: the 6-bit version number followed by its
    /// 12-bit BCH remainder over the generator 0x1F25.
    pub fn version_info(self) -> u32 {
        debug_assert!(self.0 >= 7, "Version info only exists for version 7 and up");

        let v = self.0 as u32;
        let mut rem = v;
        for _ in 0..12 {
            rem = (rem << 1) ^ ((rem >> 11) * VERSION_INFO_POLY);
        }
        (v << 12) | rem
    }
}

// Format information
//------------------------------------------------------------------------------

/// 15-bit format information: ec level and mask pattern, the 10-bit BCH
/// remainder over the generator 0x537, all XORed with the fixed mask 0x5412.
pub fn format_info(ec_level: ECLevel, pattern: MaskPattern) -> u32 {
    let data = ec_level.format_bits() << 3 | *pattern as u32;
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * FORMAT_INFO_POLY);
    }
    ((data << 10) | rem) ^ FORMAT_INFO_MASK
}


// Global constants
//------------------------------------------------------------------------------

pub const FORMAT_INFO_BIT_LEN: usize = 15;

pub const VERSION_INFO_BIT_LEN: usize = 18;

const FORMAT_INFO_POLY: u32 = 0x537;

const FORMAT_INFO_MASK: u32 = 0x5412;

const VERSION_INFO_POLY: u32 = 0x1F25;

// Format info placement, most significant bit first. Main runs around the
// top left finder, side is split between the other two finders.
pub static FORMAT_INFO_COORDS_MAIN: [(i16, i16); 15] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

pub static FORMAT_INFO_COORDS_SIDE: [(i16, i16); 15] = [
    (-1, 8),
    (-2, 8),
    (-3, 8),
    (-4, 8),
    (-5, 8),
    (-6, 8),
    (-7, 8),
    (8, -8),
    (8, -7),
    (8, -6),
    (8, -5),
    (8, -4),
    (8, -3),
    (8, -2),
    (8, -1),
];

// Version info placement, most significant bit first. The blocks sit above
// the bottom left finder and beside the top right finder.
pub static VERSION_INFO_COORDS_BL: [(i16, i16); 18] = [
    (-9, 5),
    (-10, 5),
    (-11, 5),
    (-9, 4),
    (-10, 4),
    (-11, 4),
    (-9, 3),
    (-10, 3),
    (-11, 3),
    (-9, 2),
    (-10, 2),
    (-11, 2),
    (-9, 1),
    (-10, 1),
    (-11, 1),
    (-9, 0),
    (-10, 0),
    (-11, 0),
];

pub static VERSION_INFO_COORDS_TR: [(i16, i16); 18] = [
    (5, -9),
    (5, -10),
    (5, -11),
    (4, -9),
    (4, -10),
    (4, -11),
    (3, -9),
    (3, -10),
    (3, -11),
    (2, -9),
    (2, -10),
    (2, -11),
    (1, -9),
    (1, -10),
    (1, -11),
    (0, -9),
    (0, -10),
    (0, -11),
];

static ALIGNMENT_PATTERN_POSITIONS: [&[i16]; 40] = [
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
    &[6, 26, 46],
    &[6, 28, 50],
    &[6, 30, 54],
    &[6, 32, 58],
    &[6, 34, 62],
    &[6, 26, 46, 66],
    &[6, 26, 48, 70],
    &[6, 26, 50, 74],
    &[6, 30, 54, 78],
    &[6, 30, 56, 82],
    &[6, 30, 58, 86],
    &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94],
    &[6, 26, 50, 74, 98],
    &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106],
    &[6, 32, 58, 84, 110],
    &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122],
    &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130],
    &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138],
    &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150],
    &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158],
    &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166],
    &[6, 30, 58, 86, 114, 142, 170],
];

// Error correction codewords per block, from the ISO/IEC 18004 tables,
// indexed by version then ec level.
static ECC_PER_BLOCK: [[usize; 4]; 40] = [
    [7, 10, 13, 17],
    [10, 16, 22, 28],
    [15, 26, 18, 22],
    [20, 18, 26, 16],
    [26, 24, 18, 22],
    [18, 16, 24, 28],
    [20, 18, 18, 26],
    [24, 22, 22, 26],
    [30, 22, 20, 24],
    [18, 26, 24, 28],
    [20, 30, 28, 24],
    [24, 22, 26, 28],
    [26, 22, 24, 22],
    [30, 24, 20, 24],
    [22, 24, 30, 24],
    [24, 28, 24, 30],
    [28, 28, 28, 28],
    [30, 26, 28, 28],
    [28, 26, 26, 26],
    [28, 26, 30, 28],
    [28, 26, 28, 30],
    [28, 28, 30, 24],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [26, 28, 30, 30],
    [28, 28, 28, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
    [30, 28, 30, 30],
];

// Error correction block count, from the ISO/IEC 18004 tables, indexed by
// version then ec level.
static NUM_EC_BLOCKS: [[usize; 4]; 40] = [
    [1, 1, 1, 1],
    [1, 1, 1, 1],
    [1, 1, 2, 2],
    [1, 2, 2, 4],
    [1, 2, 4, 4],
    [2, 4, 4, 4],
    [2, 4, 6, 5],
    [2, 4, 6, 6],
    [2, 5, 8, 8],
    [4, 5, 8, 8],
    [4, 5, 8, 11],
    [4, 8, 10, 11],
    [4, 9, 12, 16],
    [4, 9, 16, 16],
    [6, 10, 12, 18],
    [6, 10, 17, 16],
    [6, 11, 16, 19],
    [6, 13, 18, 21],
    [7, 14, 21, 25],
    [8, 16, 20, 25],
    [8, 17, 23, 25],
    [9, 17, 23, 34],
    [9, 18, 25, 30],
    [10, 20, 27, 32],
    [12, 21, 29, 35],
    [12, 23, 34, 37],
    [12, 25, 34, 40],
    [13, 26, 35, 42],
    [14, 28, 38, 45],
    [15, 29, 40, 48],
    [16, 31, 43, 51],
    [17, 33, 45, 54],
    [18, 35, 48, 57],
    [19, 37, 51, 60],
    [19, 38, 53, 63],
    [20, 40, 56, 66],
    [21, 43, 59, 70],
    [22, 45, 62, 74],
    [24, 47, 65, 77],
    [25, 49, 68, 81],
];
