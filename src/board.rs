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

//! Board & piece model (spec §4.1): square occupancy, terrain legality on
//! placement, and the commander-position cache.

use serde::{Deserialize, Serialize};

use crate::material::{Color, Pair, Piece, PieceType};
use crate::square::{Mask, Square, Terrain, SQUARES};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    squares: Vec<Option<Piece>>,
    occupied: Mask,
    by_color: Pair<Mask>,
    commanders: Pair<Option<Square>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            squares: vec![None; SQUARES],
            occupied: Mask::empty(),
            by_color: Pair::new(Mask::empty(), Mask::empty()),
            commanders: Pair::new(None, None),
        }
    }

    #[inline]
    pub fn is_on_board(&self, square: Square) -> bool {
        square.to_index() < SQUARES
    }

    #[inline]
    pub fn terrain_of(&self, square: Square) -> Terrain {
        Terrain::of(square)
    }

    #[inline]
    pub fn get(&self, square: Square) -> Option<&Piece> {
        self.squares[square.to_index()].as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, square: Square) -> Option<&mut Piece> {
        self.squares[square.to_index()].as_mut()
    }

    #[inline]
    pub fn occupied(&self) -> Mask {
        self.occupied
    }

    #[inline]
    pub fn occupied_by(&self, color: Color) -> Mask {
        self.by_color[color]
    }

    #[inline]
    pub fn commander_square(&self, color: Color) -> Option<Square> {
        self.commanders[color]
    }

    pub fn iter_occupied(&self) -> impl Iterator<Item = (Square, &Piece)> {
        self.occupied.iter().map(move |sq| (sq, self.get(sq).expect("occupied mask out of sync")))
    }

    pub fn iter_color(&self, color: Color) -> impl Iterator<Item = (Square, &Piece)> {
        self.by_color[color]
            .iter()
            .map(move |sq| (sq, self.get(sq).expect("color mask out of sync")))
    }

    /// Places `piece` on `square`, enforcing terrain legality and commander
    /// uniqueness (spec §4.1). A Commander carried inside a Headquarters
    /// still counts for the commander-square cache and the uniqueness
    /// check. Returns `false` on any violation, leaving the board
    /// untouched.
    pub fn put(&mut self, piece: Piece, square: Square) -> bool {
        if !self.is_on_board(square) {
            return false;
        }
        if !terrain_allows(self.terrain_of(square), piece.piece_type()) {
            return false;
        }
        let color = piece.color();
        let carries_commander = has_commander(&piece);
        if carries_commander {
            if let Some(existing) = self.commanders[color] {
                if existing != square {
                    return false;
                }
            }
        }
        self.clear_index(square);
        if carries_commander {
            self.commanders[color] = Some(square);
        }
        self.occupied |= square;
        self.by_color[color] |= square;
        self.squares[square.to_index()] = Some(piece);
        true
    }

    /// Removes and returns whatever piece (including its full carrying
    /// substructure) occupies `square`.
    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        let piece = self.squares[square.to_index()].take()?;
        self.clear_index(square);
        Some(piece)
    }

    fn clear_index(&mut self, square: Square) {
        if let Some(existing) = self.squares[square.to_index()].take() {
            self.occupied.reset(square);
            self.by_color[existing.color()].reset(square);
            if has_commander(&existing) && self.commanders[existing.color()] == Some(square) {
                self.commanders[existing.color()] = None;
            }
        }
    }

    /// Raw commander-cache setter, used by the applier's `SetCommander`
    /// atomic action when a stack recombination changes which square
    /// carries the commander without otherwise touching occupancy.
    pub fn set_commander_square(&mut self, color: Color, square: Option<Square>) {
        self.commanders[color] = square;
    }
}

/// True if `piece`, or anything it carries (recursively), is a Commander —
/// a Headquarters carrying the Commander still occupies the commander cache.
fn has_commander(piece: &Piece) -> bool {
    piece.piece_type() == PieceType::Commander || piece.carrying().iter().any(has_commander)
}

/// Land-only pieces cannot be placed on pure water; Navy cannot be placed
/// on pure land; the mixed c-file zone accepts both families.
fn terrain_allows(terrain: Terrain, piece_type: PieceType) -> bool {
    match terrain {
        Terrain::Mixed => true,
        Terrain::Water => piece_type == PieceType::Navy,
        Terrain::Land => piece_type != PieceType::Navy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::File::*;
    use crate::square::Rank::*;

    #[test]
    fn put_rejects_navy_on_pure_land() {
        let mut board = Board::empty();
        let navy = Piece::new(PieceType::Navy, Color::Red);
        let land_sq = Square::new(FileK, Rank1);
        assert!(!board.put(navy, land_sq));
    }

    #[test]
    fn put_rejects_infantry_on_pure_water() {
        let mut board = Board::empty();
        let infantry = Piece::new(PieceType::Infantry, Color::Red);
        let water_sq = Square::new(FileA, Rank1);
        assert!(!board.put(infantry, water_sq));
    }

    #[test]
    fn mixed_file_accepts_both_families() {
        let mut board = Board::empty();
        let mixed_sq = Square::new(FileC, Rank5);
        assert!(board.put(Piece::new(PieceType::Navy, Color::Red), mixed_sq));
        board.remove(mixed_sq);
        assert!(board.put(Piece::new(PieceType::Infantry, Color::Red), mixed_sq));
    }

    #[test]
    fn put_second_commander_at_different_square_fails() {
        let mut board = Board::empty();
        let sq1 = Square::new(FileK, Rank1);
        let sq2 = Square::new(FileK, Rank2);
        assert!(board.put(Piece::new(PieceType::Commander, Color::Red), sq1));
        assert!(!board.put(Piece::new(PieceType::Commander, Color::Red), sq2));
        assert_eq!(board.commander_square(Color::Red), Some(sq1));
    }

    #[test]
    fn put_same_commander_square_is_replacement() {
        let mut board = Board::empty();
        let sq = Square::new(FileK, Rank1);
        assert!(board.put(Piece::new(PieceType::Commander, Color::Red), sq));
        assert!(board.put(Piece::new(PieceType::Commander, Color::Red), sq));
        assert_eq!(board.commander_square(Color::Red), Some(sq));
    }

    #[test]
    fn remove_returns_full_stack() {
        let mut board = Board::empty();
        let sq = Square::new(FileC, Rank5);
        let mut navy = Piece::new(PieceType::Navy, Color::Red);
        navy.carrying_mut().push(Piece::new(PieceType::Tank, Color::Red));
        board.put(navy, sq);
        let removed = board.remove(sq).unwrap();
        assert_eq!(removed.carrying().len(), 1);
        assert!(board.get(sq).is_none());
    }

    /// Round-trip property (spec §8): a board snapshot must deep-equal
    /// itself after a serialize/deserialize cycle, including a stack and
    /// the commander cache.
    #[test]
    fn board_snapshot_round_trips_through_serde_json() {
        let mut board = Board::empty();
        board.put(Piece::new(PieceType::Commander, Color::Red), Square::new(FileK, Rank1));
        board.put(Piece::new(PieceType::Commander, Color::Blue), Square::new(FileK, Rank12));
        let mut navy = Piece::new(PieceType::Navy, Color::Red);
        navy.carrying_mut().push(Piece::new(PieceType::Tank, Color::Red));
        board.put(navy, Square::new(FileC, Rank5));

        let json = serde_json::to_string(&board).unwrap();
        let restored: Board = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.commander_square(Color::Red), board.commander_square(Color::Red));
        assert_eq!(restored.commander_square(Color::Blue), board.commander_square(Color::Blue));
        let original_stack = board.get(Square::new(FileC, Rank5)).unwrap();
        let restored_stack = restored.get(Square::new(FileC, Rank5)).unwrap();
        assert_eq!(restored_stack, original_stack);
    }
}
