// Copyright 2026 Tobin Edwards
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

use std::fmt;
use std::ops::{Index, IndexMut, Not};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Color {
    Red,
    Blue,
}
use Color::*;

impl Color {
    #[inline]
    pub const fn to_index(self) -> usize {
        self as usize
    }
}

impl Not for Color {
    type Output = Self;
    #[inline]
    fn not(self) -> Self {
        match self {
            Red => Blue,
            Blue => Red,
        }
    }
}

/// A value keyed by color, same shape as the teacher's `Pair<T>`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pair<T>(T, T);

impl<T> Pair<T> {
    pub const fn new(red: T, blue: T) -> Self {
        Self(red, blue)
    }
    pub fn red(&self) -> &T {
        &self.0
    }
    pub fn red_mut(&mut self) -> &mut T {
        &mut self.0
    }
    pub fn blue(&self) -> &T {
        &self.1
    }
    pub fn blue_mut(&mut self) -> &mut T {
        &mut self.1
    }
}

impl<T> Index<Color> for Pair<T> {
    type Output = T;
    fn index(&self, color: Color) -> &T {
        match color {
            Red => self.red(),
            Blue => self.blue(),
        }
    }
}
impl<T> IndexMut<Color> for Pair<T> {
    fn index_mut(&mut self, color: Color) -> &mut T {
        match color {
            Red => self.red_mut(),
            Blue => self.blue_mut(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum PieceType {
    Commander,
    Infantry,
    Tank,
    Militia,
    Engineer,
    Artillery,
    AntiAir,
    Missile,
    AirForce,
    Navy,
    Headquarters,
}
use PieceType::*;

impl PieceType {
    /// Letters per spec §6: Red uppercase, Blue lowercase handled by
    /// `Piece::letter`; this is the bare uppercase letter.
    pub const fn letter(self) -> char {
        match self {
            Commander => 'C',
            Infantry => 'I',
            Tank => 'T',
            Militia => 'M',
            Engineer => 'E',
            Artillery => 'A',
            AntiAir => 'G',
            Missile => 'S',
            AirForce => 'F',
            Navy => 'N',
            Headquarters => 'H',
        }
    }
    pub fn try_from_letter(c: char) -> Option<Self> {
        let upper = c.to_ascii_uppercase();
        PieceType::iter_all().find(|p| p.letter() == upper)
    }
    pub fn iter_all() -> impl Iterator<Item = PieceType> {
        use strum::IntoEnumIterator;
        PieceType::iter()
    }
    pub fn is_navy(self) -> bool {
        matches!(self, Navy)
    }
}

/// A piece on the board: its type, color, heroic-promotion flag, and the
/// (possibly empty) ordered sequence of pieces it carries as a stack.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Piece {
    piece_type: PieceType,
    color: Color,
    heroic: bool,
    carrying: Vec<Piece>,
}

impl Piece {
    pub fn new(piece_type: PieceType, color: Color) -> Self {
        Self {
            piece_type,
            color,
            heroic: false,
            carrying: Vec::new(),
        }
    }

    #[inline]
    pub fn piece_type(&self) -> PieceType {
        self.piece_type
    }
    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }
    #[inline]
    pub fn is_heroic(&self) -> bool {
        self.heroic
    }
    #[inline]
    pub fn set_heroic(&mut self, heroic: bool) {
        self.heroic = heroic;
    }
    #[inline]
    pub fn carrying(&self) -> &[Piece] {
        &self.carrying
    }
    #[inline]
    pub fn carrying_mut(&mut self) -> &mut Vec<Piece> {
        &mut self.carrying
    }
    #[inline]
    pub fn is_stack(&self) -> bool {
        !self.carrying.is_empty()
    }

    /// Piece letter per spec §6: uppercase for Red, lowercase for Blue.
    pub fn letter(&self) -> char {
        let c = self.piece_type.letter();
        match self.color {
            Red => c,
            Blue => c.to_ascii_lowercase(),
        }
    }

    /// Every member of this stack (the carrier first, then each carried
    /// piece, depth-first) — used to total up a stack's multiset for the
    /// no-ghost-pieces invariant.
    pub fn members(&self) -> Vec<&Piece> {
        let mut out = vec![self];
        for p in &self.carrying {
            out.extend(p.members());
        }
        out
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.heroic {
            write!(f, "+")?;
        }
        write!(f, "{}", self.letter())?;
        if self.is_stack() {
            write!(f, "(")?;
            for carried in &self.carrying {
                write!(f, "{}", carried)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_are_case_by_color() {
        let red = Piece::new(Commander, Red);
        let blue = Piece::new(Commander, Blue);
        assert_eq!(red.letter(), 'C');
        assert_eq!(blue.letter(), 'c');
    }

    #[test]
    fn heroic_piece_displays_with_plus_prefix() {
        let mut p = Piece::new(Infantry, Red);
        p.set_heroic(true);
        assert_eq!(p.to_string(), "+I");
    }

    #[test]
    fn members_includes_carried_pieces() {
        let mut navy = Piece::new(Navy, Red);
        navy.carrying_mut().push(Piece::new(AirForce, Red));
        navy.carrying_mut().push(Piece::new(Tank, Red));
        assert_eq!(navy.members().len(), 3);
    }
}
