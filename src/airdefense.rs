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

//! Per-color air-defense influence zones (spec §4.3). Treated as derived
//! state: `recompute_all` is the ground truth, `update_on_place`/
//! `update_on_remove` are an optional incremental fast path that must
//! agree with it.

use std::collections::HashMap;

use crate::board::Board;
use crate::material::{Color, Pair, Piece, PieceType};
use crate::rays::ray;
use crate::square::{Direction, Mask, Square};

/// Air-defense strength tiers (spec §4.3): level 1 projects two
/// orthogonal and one diagonal step; level 2 three and two; level 3 four
/// and three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    orthogonal_steps: usize,
    diagonal_steps: usize,
}

impl Level {
    const L1: Level = Level { orthogonal_steps: 2, diagonal_steps: 1 };
    const L2: Level = Level { orthogonal_steps: 3, diagonal_steps: 2 };
    const L3: Level = Level { orthogonal_steps: 4, diagonal_steps: 3 };
}

/// Which pieces radiate an air-defense zone, and at what level. AntiAir is
/// the baseline source (heroic AntiAir steps up a tier); a heroic Missile
/// also projects a (the strongest) zone, per spec §4.3's "any other piece
/// granted anti-air semantics... e.g. heroic Missile".
fn level_of(piece: &Piece) -> Option<Level> {
    match piece.piece_type() {
        PieceType::AntiAir => Some(if piece.is_heroic() { Level::L2 } else { Level::L1 }),
        PieceType::Missile if piece.is_heroic() => Some(Level::L3),
        _ => None,
    }
}

fn footprint(origin: Square, level: Level) -> Mask {
    let mut mask = Mask::empty();
    for dir in Direction::orthogonals() {
        for &sq in ray(origin, dir).iter().take(level.orthogonal_steps) {
            mask.set(sq);
        }
    }
    for dir in Direction::diagonals() {
        for &sq in ray(origin, dir).iter().take(level.diagonal_steps) {
            mask.set(sq);
        }
    }
    mask
}

/// For each color, a map from an influenced square to the set of that
/// color's air-defense source squares reaching it.
#[derive(Debug, Clone, Default)]
pub struct AirDefenseMap {
    influence: Pair<HashMap<Square, Mask>>,
}

impl AirDefenseMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full pass over the board; ground truth for `update_on_place`/
    /// `update_on_remove`.
    pub fn recompute_all(board: &Board) -> Self {
        let mut map = Self::new();
        for (square, piece) in board.iter_occupied() {
            map.update_on_place(square, piece);
            for carried in piece.carrying() {
                map.update_on_place(square, carried);
            }
        }
        map
    }

    pub fn update_on_place(&mut self, square: Square, piece: &Piece) {
        let Some(level) = level_of(piece) else { return };
        let color = piece.color();
        for target in footprint(square, level).iter() {
            self.influence[color].entry(target).or_insert_with(Mask::empty).set(square);
        }
    }

    pub fn update_on_remove(&mut self, square: Square, piece: &Piece) {
        let Some(level) = level_of(piece) else { return };
        let color = piece.color();
        for target in footprint(square, level).iter() {
            if let Some(mask) = self.influence[color].get_mut(&target) {
                mask.reset(square);
            }
        }
    }

    /// True if `square` is within `color`'s air-defense influence.
    pub fn is_defended(&self, square: Square, color: Color) -> bool {
        self.influence[color]
            .get(&square)
            .map(|m| !m.is_empty())
            .unwrap_or(false)
    }

    pub fn sources(&self, square: Square, color: Color) -> Mask {
        self.influence[color].get(&square).copied().unwrap_or_else(Mask::empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::File::*;
    use crate::square::Rank::*;

    #[test]
    fn antiair_projects_level_one_zone() {
        let mut board = Board::empty();
        let origin = Square::new(FileF, Rank6);
        board.put(Piece::new(PieceType::AntiAir, Color::Red), origin);
        let map = AirDefenseMap::recompute_all(&board);
        assert!(map.is_defended(Square::new(FileF, Rank8), Color::Red));
        assert!(!map.is_defended(Square::new(FileF, Rank9), Color::Red));
    }

    #[test]
    fn incremental_place_and_remove_match_full_recompute() {
        let mut board = Board::empty();
        let origin = Square::new(FileF, Rank6);
        let piece = Piece::new(PieceType::AntiAir, Color::Red);
        board.put(piece.clone(), origin);
        let mut incremental = AirDefenseMap::new();
        incremental.update_on_place(origin, &piece);
        let full = AirDefenseMap::recompute_all(&board);
        for sq in Square::iter_all() {
            assert_eq!(incremental.is_defended(sq, Color::Red), full.is_defended(sq, Color::Red));
        }
        incremental.update_on_remove(origin, &piece);
        for sq in Square::iter_all() {
            assert!(!incremental.is_defended(sq, Color::Red));
        }
    }

    #[test]
    fn non_air_defense_piece_contributes_nothing() {
        let mut board = Board::empty();
        let origin = Square::new(FileF, Rank6);
        board.put(Piece::new(PieceType::Tank, Color::Red), origin);
        let map = AirDefenseMap::recompute_all(&board);
        for sq in Square::iter_all() {
            assert!(!map.is_defended(sq, Color::Red));
        }
    }
}
