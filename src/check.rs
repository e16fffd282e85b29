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

//! Check, exposure, and attacker enumeration (spec §4.7). A carried piece
//! contributes its own attack pattern from its carrier's square, so every
//! query here walks `Piece::members()` rather than just the top-level
//! occupant.

use crate::airdefense::AirDefenseMap;
use crate::board::Board;
use crate::material::{Color, PieceType};
use crate::moves::{destinations, GenContext, MoveKind};
use crate::rays::ray;
use crate::square::{Direction, Square};

/// One attacker of a square: its square, and the effective piece type
/// doing the attacking (a carried piece's type, not necessarily its
/// carrier's).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attacker {
    pub square: Square,
    pub piece_type: PieceType,
}

pub(crate) fn is_attacking_kind(kind: MoveKind) -> bool {
    matches!(kind, MoveKind::CaptureReplace | MoveKind::StayCapture | MoveKind::SuicideCapture)
}

/// Every attacker of `color` that can land a capturing move on `square`.
pub fn get_attackers(board: &Board, air_defense: &AirDefenseMap, square: Square, color: Color) -> Vec<Attacker> {
    let ctx = GenContext { board, air_defense, turn: color };
    let mut out = Vec::new();
    for (origin, stack) in board.iter_color(color) {
        for member in stack.members() {
            for (kind, to) in destinations(&ctx, origin, member) {
                if to == square && is_attacking_kind(kind) {
                    out.push(Attacker { square: origin, piece_type: member.piece_type() });
                }
            }
        }
    }
    out
}

/// True iff any piece of `by_color` has a capturing move landing on `square`.
pub fn is_square_attacked(board: &Board, air_defense: &AirDefenseMap, square: Square, by_color: Color) -> bool {
    let ctx = GenContext { board, air_defense, turn: by_color };
    for (origin, stack) in board.iter_color(by_color) {
        for member in stack.members() {
            for (kind, to) in destinations(&ctx, origin, member) {
                if to == square && is_attacking_kind(kind) {
                    return true;
                }
            }
        }
    }
    false
}

/// True iff `color`'s Commander is missing from the board, or attacked by
/// the opponent.
pub fn is_commander_attacked(board: &Board, air_defense: &AirDefenseMap, color: Color) -> bool {
    match board.commander_square(color) {
        None => true,
        Some(sq) => is_square_attacked(board, air_defense, sq, !color),
    }
}

/// True iff both Commanders share a file or rank with no piece standing
/// between them (the flying-general exposure rule).
pub fn is_commander_exposed(board: &Board, color: Color) -> bool {
    let (Some(a), Some(b)) = (board.commander_square(color), board.commander_square(!color)) else {
        return false;
    };
    let dir = if a.file() == b.file() {
        if b.rank().to_index() > a.rank().to_index() { Direction::Up } else { Direction::Down }
    } else if a.rank() == b.rank() {
        if b.file().to_index() > a.file().to_index() { Direction::Right } else { Direction::Left }
    } else {
        return false;
    };
    ray(a, dir).iter().take_while(|&&sq| sq != b).all(|&sq| board.get(sq).is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Color::*, Piece, PieceType::*};
    use crate::square::{File::*, Rank::*};

    #[test]
    fn missing_commander_counts_as_attacked() {
        let board = Board::empty();
        let air = AirDefenseMap::recompute_all(&board);
        assert!(is_commander_attacked(&board, &air, Red));
    }

    #[test]
    fn commander_attacked_by_adjacent_enemy_infantry() {
        let mut board = Board::empty();
        board.put(Piece::new(Commander, Red), Square::new(FileF, Rank6));
        board.put(Piece::new(Infantry, Blue), Square::new(FileF, Rank7));
        let air = AirDefenseMap::recompute_all(&board);
        assert!(is_commander_attacked(&board, &air, Red));
    }

    #[test]
    fn commanders_on_clear_file_are_exposed() {
        let mut board = Board::empty();
        board.put(Piece::new(Commander, Red), Square::new(FileG, Rank1));
        board.put(Piece::new(Commander, Blue), Square::new(FileG, Rank12));
        assert!(is_commander_exposed(&board, Red));
    }

    #[test]
    fn commanders_blocked_by_a_piece_are_not_exposed() {
        let mut board = Board::empty();
        board.put(Piece::new(Commander, Red), Square::new(FileG, Rank1));
        board.put(Piece::new(Commander, Blue), Square::new(FileG, Rank12));
        board.put(Piece::new(Infantry, Red), Square::new(FileG, Rank6));
        assert!(!is_commander_exposed(&board, Red));
    }

    #[test]
    fn carried_piece_attacks_from_carrier_square() {
        let mut board = Board::empty();
        let mut navy = Piece::new(Navy, Blue);
        navy.carrying_mut().push(Piece::new(Tank, Blue));
        board.put(navy, Square::new(FileC, Rank5));
        board.put(Piece::new(Commander, Red), Square::new(FileC, Rank6));
        let air = AirDefenseMap::recompute_all(&board);
        let attackers = get_attackers(&board, &air, Square::new(FileC, Rank6), Blue);
        assert!(attackers.iter().any(|a| a.piece_type == Tank));
    }
}
