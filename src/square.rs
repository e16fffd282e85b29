// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

//! Board geometry: an 11-file x 12-rank grid (132 squares), terrain masks,
//! and the ray/offset machinery move generation builds on.
//!
//! `Square` is a small integer (spec: "a representation choice, not a
//! contract"). Internally, ray construction walks a 16-file-wide mailbox
//! (an 0x88-style guard: `file < FILES` marks on-board) so off-board steps
//! are detected without per-direction range checks.

use std::fmt;
use std::ops::{Add, BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub};

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

pub const FILES: usize = 11;
pub const RANKS: usize = 12;
pub const SQUARES: usize = FILES * RANKS;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
pub enum File {
    FileA,
    FileB,
    FileC,
    FileD,
    FileE,
    FileF,
    FileG,
    FileH,
    FileI,
    FileJ,
    FileK,
}
use File::*;

impl File {
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        const VALUES: [File; FILES] = [
            FileA, FileB, FileC, FileD, FileE, FileF, FileG, FileH, FileI, FileJ, FileK,
        ];
        debug_assert!(index < FILES);
        VALUES[index]
    }
    #[inline]
    pub const fn to_index(self) -> usize {
        self as usize
    }
    #[inline]
    pub const fn try_from_char(c: char) -> Option<Self> {
        match c {
            'a' => Some(FileA),
            'b' => Some(FileB),
            'c' => Some(FileC),
            'd' => Some(FileD),
            'e' => Some(FileE),
            'f' => Some(FileF),
            'g' => Some(FileG),
            'h' => Some(FileH),
            'i' => Some(FileI),
            'j' => Some(FileJ),
            'k' => Some(FileK),
            _ => None,
        }
    }
    #[inline]
    pub const fn to_char(self) -> char {
        const VALUES: [char; FILES] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k'];
        VALUES[self.to_index()]
    }
    /// True for the pure-water family (files a-b).
    #[inline]
    pub const fn is_pure_water(self) -> bool {
        matches!(self, FileA | FileB)
    }
    /// True for the transitional mixed zone (file c), legal for both
    /// land and water families.
    #[inline]
    pub const fn is_mixed(self) -> bool {
        matches!(self, FileC)
    }
    #[inline]
    pub const fn is_pure_land(self) -> bool {
        !self.is_pure_water() && !self.is_mixed()
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl Add<isize> for File {
    type Output = Option<Self>;
    fn add(self, rhs: isize) -> Self::Output {
        match self.to_index().checked_add_signed(rhs) {
            Some(i) if i < FILES => Some(Self::from_index(i)),
            _ => None,
        }
    }
}
impl Sub for File {
    type Output = isize;
    fn sub(self, rhs: Self) -> Self::Output {
        self.to_index() as isize - rhs.to_index() as isize
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
pub enum Rank {
    Rank1,
    Rank2,
    Rank3,
    Rank4,
    Rank5,
    Rank6,
    Rank7,
    Rank8,
    Rank9,
    Rank10,
    Rank11,
    Rank12,
}
use Rank::*;

impl Rank {
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        const VALUES: [Rank; RANKS] = [
            Rank1, Rank2, Rank3, Rank4, Rank5, Rank6, Rank7, Rank8, Rank9, Rank10, Rank11, Rank12,
        ];
        debug_assert!(index < RANKS);
        VALUES[index]
    }
    #[inline]
    pub const fn to_index(self) -> usize {
        self as usize
    }
    /// Parses the 1-based rank number (`"1"`..`"12"`) following a file letter.
    pub fn try_from_str(s: &str) -> Option<Self> {
        let n: usize = s.parse().ok()?;
        if (1..=RANKS).contains(&n) {
            Some(Self::from_index(n - 1))
        } else {
            None
        }
    }
    #[inline]
    pub const fn to_number(self) -> usize {
        self.to_index() + 1
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_number())
    }
}

impl Add<isize> for Rank {
    type Output = Option<Self>;
    fn add(self, rhs: isize) -> Self::Output {
        match self.to_index().checked_add_signed(rhs) {
            Some(i) if i < RANKS => Some(Self::from_index(i)),
            _ => None,
        }
    }
}
impl Sub for Rank {
    type Output = isize;
    fn sub(self, rhs: Self) -> Self::Output {
        self.to_index() as isize - rhs.to_index() as isize
    }
}

/// One of the 132 legal board squares, stored as a small integer
/// (`rank_index * FILES + file_index`).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square(u8);

impl Square {
    #[inline]
    pub const fn new(file: File, rank: Rank) -> Self {
        Self::from_index(rank.to_index() * FILES + file.to_index())
    }
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        debug_assert!(index < SQUARES);
        Self(index as u8)
    }
    #[inline]
    pub const fn to_index(self) -> usize {
        self.0 as usize
    }
    #[inline]
    pub const fn file(self) -> File {
        File::from_index(self.to_index() % FILES)
    }
    #[inline]
    pub const fn rank(self) -> Rank {
        Rank::from_index(self.to_index() / FILES)
    }
    pub fn try_from_str(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let file = File::try_from_char(chars.next()?)?;
        let rank_str: String = chars.collect();
        let rank = Rank::try_from_str(&rank_str)?;
        Some(Self::new(file, rank))
    }
    pub fn iter_all() -> impl Iterator<Item = Square> {
        (0..SQUARES).map(Square::from_index)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
    pub df: isize,
    pub dr: isize,
}

impl Offset {
    pub const fn new(df: isize, dr: isize) -> Self {
        Self { df, dr }
    }
}

impl Add<Offset> for Square {
    type Output = Option<Square>;
    fn add(self, rhs: Offset) -> Self::Output {
        let file = (self.file() + rhs.df)?;
        let rank = (self.rank() + rhs.dr)?;
        Some(Square::new(file, rank))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}
use Direction::*;

impl Direction {
    #[inline]
    pub fn is_orthogonal(self) -> bool {
        matches!(self, Up | Down | Left | Right)
    }
    #[inline]
    pub fn is_diagonal(self) -> bool {
        matches!(self, UpLeft | UpRight | DownLeft | DownRight)
    }
    pub fn orthogonals() -> impl Iterator<Item = Self> {
        [Up, Down, Left, Right].into_iter()
    }
    pub fn diagonals() -> impl Iterator<Item = Self> {
        [UpLeft, UpRight, DownLeft, DownRight].into_iter()
    }
    pub fn all() -> impl Iterator<Item = Self> {
        [Up, Down, Left, Right, UpLeft, UpRight, DownLeft, DownRight].into_iter()
    }
}

impl From<Direction> for Offset {
    fn from(value: Direction) -> Self {
        match value {
            Up => Offset::new(0, 1),
            Down => Offset::new(0, -1),
            Left => Offset::new(-1, 0),
            Right => Offset::new(1, 0),
            UpLeft => Offset::new(-1, 1),
            UpRight => Offset::new(1, 1),
            DownLeft => Offset::new(-1, -1),
            DownRight => Offset::new(1, -1),
        }
    }
}

impl Add<Direction> for Square {
    type Output = Option<Square>;
    fn add(self, rhs: Direction) -> Self::Output {
        let offset: Offset = rhs.into();
        self + offset
    }
}

/// A 132-bit set of squares, backed by three `u64` words (spec: masks are
/// "a representation choice"; a single machine word isn't wide enough
/// here, so the teacher's single-word `Mask` generalizes to a small array).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Mask([u64; 3]);

const WORD_BITS: usize = 64;

impl Mask {
    pub const fn empty() -> Self {
        Self([0; 3])
    }
    pub fn from_squares<I: IntoIterator<Item = Square>>(squares: I) -> Self {
        let mut mask = Self::empty();
        for sq in squares {
            mask.set(sq);
        }
        mask
    }
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0[0] == 0 && self.0[1] == 0 && self.0[2] == 0
    }
    pub const fn len(&self) -> usize {
        (self.0[0].count_ones() + self.0[1].count_ones() + self.0[2].count_ones()) as usize
    }
    #[inline]
    pub const fn get(&self, square: Square) -> bool {
        let idx = square.to_index();
        (self.0[idx / WORD_BITS] & (1u64 << (idx % WORD_BITS))) != 0
    }
    #[inline]
    pub fn set(&mut self, square: Square) {
        let idx = square.to_index();
        self.0[idx / WORD_BITS] |= 1u64 << (idx % WORD_BITS);
    }
    #[inline]
    pub fn reset(&mut self, square: Square) {
        let idx = square.to_index();
        self.0[idx / WORD_BITS] &= !(1u64 << (idx % WORD_BITS));
    }
    #[inline]
    pub fn contains(&self, square: Square) -> bool {
        self.get(square)
    }
    pub fn iter(&self) -> MaskIter {
        MaskIter { mask: *self, word: 0, bits: self.0[0] }
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..RANKS).rev() {
            for file in 0..FILES {
                let sq = Square::new(File::from_index(file), Rank::from_index(rank));
                write!(f, "{}", if self.get(sq) { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl BitOr for Mask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self([self.0[0] | rhs.0[0], self.0[1] | rhs.0[1], self.0[2] | rhs.0[2]])
    }
}
impl BitOrAssign for Mask {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}
impl BitOr<Square> for Mask {
    type Output = Self;
    fn bitor(self, rhs: Square) -> Self {
        let mut m = self;
        m.set(rhs);
        m
    }
}
impl BitOrAssign<Square> for Mask {
    fn bitor_assign(&mut self, rhs: Square) {
        self.set(rhs);
    }
}
impl BitAnd for Mask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self([self.0[0] & rhs.0[0], self.0[1] & rhs.0[1], self.0[2] & rhs.0[2]])
    }
}
impl BitAndAssign for Mask {
    fn bitand_assign(&mut self, rhs: Self) {
        *self = *self & rhs;
    }
}
impl Not for Mask {
    type Output = Self;
    fn not(self) -> Self {
        // Mask off bits beyond SQUARES so `!mask` never claims off-board
        // squares.
        let mut words = [!self.0[0], !self.0[1], !self.0[2]];
        let total_bits = 3 * WORD_BITS;
        let overhang = total_bits - SQUARES;
        words[2] &= !0u64 >> overhang;
        Self(words)
    }
}
impl Sub for Mask {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self & !rhs
    }
}
impl Sub<Square> for Mask {
    type Output = Self;
    fn sub(self, rhs: Square) -> Self {
        let mut m = self;
        m.reset(rhs);
        m
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MaskIter {
    mask: Mask,
    word: usize,
    bits: u64,
}

impl Iterator for MaskIter {
    type Item = Square;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.bits != 0 {
                let bit = self.bits.trailing_zeros() as usize;
                self.bits &= self.bits - 1;
                return Some(Square::from_index(self.word * WORD_BITS + bit));
            }
            self.word += 1;
            if self.word >= 3 {
                return None;
            }
            self.bits = self.mask.0[self.word];
        }
    }
}

/// Terrain family of a square, derived from its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terrain {
    Land,
    Water,
    Mixed,
}

impl Terrain {
    pub fn of(square: Square) -> Self {
        let file = square.file();
        if file.is_mixed() {
            Terrain::Mixed
        } else if file.is_pure_water() {
            Terrain::Water
        } else {
            Terrain::Land
        }
    }
}

static WATER_MASK: once_cell::sync::Lazy<Mask> = once_cell::sync::Lazy::new(|| {
    Mask::from_squares(Square::iter_all().filter(|s| matches!(Terrain::of(*s), Terrain::Water | Terrain::Mixed)))
});

static LAND_MASK: once_cell::sync::Lazy<Mask> = once_cell::sync::Lazy::new(|| {
    Mask::from_squares(Square::iter_all().filter(|s| matches!(Terrain::of(*s), Terrain::Land | Terrain::Mixed)))
});

/// Squares a Navy may ever occupy (pure water + the mixed c-file zone).
pub fn water_mask() -> Mask {
    *WATER_MASK
}
/// Squares a land piece may ever occupy (pure land + the mixed c-file zone).
pub fn land_mask() -> Mask {
    *LAND_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_round_trips_algebraic() {
        for sq in Square::iter_all() {
            let s = sq.to_string();
            assert_eq!(Square::try_from_str(&s), Some(sq));
        }
    }

    #[test]
    fn square_count_is_132() {
        assert_eq!(Square::iter_all().count(), SQUARES);
        assert_eq!(SQUARES, 132);
    }

    #[test]
    fn mask_set_get_reset() {
        let mut m = Mask::empty();
        let sq = Square::try_from_str("g7").unwrap();
        assert!(!m.get(sq));
        m.set(sq);
        assert!(m.get(sq));
        m.reset(sq);
        assert!(!m.get(sq));
    }

    #[test]
    fn mask_iter_matches_len() {
        let mask = Mask::from_squares([
            Square::try_from_str("a1").unwrap(),
            Square::try_from_str("k12").unwrap(),
            Square::try_from_str("f6").unwrap(),
        ]);
        assert_eq!(mask.len(), 3);
        assert_eq!(mask.iter().count(), 3);
    }

    #[test]
    fn not_mask_stays_within_board() {
        let all = !Mask::empty();
        assert_eq!(all.len(), SQUARES);
    }

    #[test]
    fn terrain_families_partition_files() {
        assert_eq!(Terrain::of(Square::try_from_str("a5").unwrap()), Terrain::Water);
        assert_eq!(Terrain::of(Square::try_from_str("c5").unwrap()), Terrain::Mixed);
        assert_eq!(Terrain::of(Square::try_from_str("k5").unwrap()), Terrain::Land);
    }
}
