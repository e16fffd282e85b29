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

//! Move generation (spec §4.4): per-piece pseudo-legal moves, data-driven
//! over `PieceType` (spec §9's "flatten deep inheritance" redesign flag)
//! rather than one trait impl per piece.

use crate::airdefense::AirDefenseMap;
use crate::board::Board;
use crate::material::{Color, Piece, PieceType};
use crate::rays::ray;
use crate::square::{Direction, Square, Terrain};

use PieceType::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Normal,
    CaptureReplace,
    StayCapture,
    SuicideCapture,
    Combination,
}

/// Every move kind the generator emits (spec §4.4's table).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Move {
    Play { kind: MoveKind, from: Square, to: Square },
    DeployStep { from: Square, piece_type: PieceType, kind: MoveKind, to: Square },
    Recombine { from: Square, to: Square, piece_type: PieceType },
}

impl Move {
    pub fn from_square(&self) -> Square {
        match self {
            Move::Play { from, .. } => *from,
            Move::DeployStep { from, .. } => *from,
            Move::Recombine { from, .. } => *from,
        }
    }
    pub fn to_square(&self) -> Square {
        match self {
            Move::Play { to, .. } => *to,
            Move::DeployStep { to, .. } => *to,
            Move::Recombine { to, .. } => *to,
        }
    }
    pub fn is_capture(&self) -> bool {
        matches!(
            self,
            Move::Play { kind: MoveKind::CaptureReplace | MoveKind::StayCapture | MoveKind::SuicideCapture, .. }
                | Move::DeployStep { kind: MoveKind::CaptureReplace | MoveKind::StayCapture | MoveKind::SuicideCapture, .. }
        )
    }
}

/// Restricts move generation by origin square and/or piece type (spec §4.4).
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveFilter {
    pub square: Option<Square>,
    pub piece_type: Option<PieceType>,
}

impl MoveFilter {
    pub fn square(square: Square) -> Self {
        Self { square: Some(square), piece_type: None }
    }
    fn matches(&self, square: Square, piece_type: PieceType) -> bool {
        self.square.map(|s| s == square).unwrap_or(true)
            && self.piece_type.map(|t| t == piece_type).unwrap_or(true)
    }
}

/// Read-only context move generation consults: the board, the mover's
/// own air-defense exposure, and whose turn it is.
pub struct GenContext<'a> {
    pub board: &'a Board,
    pub air_defense: &'a AirDefenseMap,
    pub turn: Color,
}

/// All pseudo-legal moves for `turn`, optionally narrowed by `filter`.
/// Only a stack's carrier moves here; carried pieces move only through
/// deploy steps (`deploy_options`).
pub fn pseudo_legal(ctx: &GenContext, filter: MoveFilter) -> Vec<Move> {
    let mut moves = Vec::new();
    for (square, piece) in ctx.board.iter_color(ctx.turn) {
        if !filter.matches(square, piece.piece_type()) {
            continue;
        }
        moves.extend(piece_moves(ctx, square, piece));
    }
    moves
}

fn piece_moves(ctx: &GenContext, from: Square, piece: &Piece) -> Vec<Move> {
    destinations(ctx, from, piece)
        .into_iter()
        .map(|(kind, to)| Move::Play { kind, from, to })
        .collect()
}

/// Destination squares (with the kind of move that reaches them) for a
/// single piece acting alone from `from` — used both for ordinary moves
/// and, by the deploy session, for one piece separating from a stack.
pub fn destinations(ctx: &GenContext, from: Square, piece: &Piece) -> Vec<(MoveKind, Square)> {
    let color = piece.color();
    let ours = ctx.board.occupied_by(color);
    let theirs = ctx.board.occupied_by(!color);
    let heroic = piece.is_heroic();

    let mut out = Vec::new();
    let mut land_on = |to: Square, out: &mut Vec<(MoveKind, Square)>| {
        if !terrain_allows(ctx.board.terrain_of(to), piece.piece_type()) {
            return;
        }
        if ours.contains(to) {
            if let Some(occupant) = ctx.board.get(to) {
                if crate::stack::is_compatible(piece.piece_type(), occupant.piece_type())
                    && !occupant.is_stack()
                {
                    out.push((MoveKind::Combination, to));
                }
            }
        } else if theirs.contains(to) {
            out.push((MoveKind::CaptureReplace, to));
        } else {
            out.push((MoveKind::Normal, to));
        }
    };

    match piece.piece_type() {
        Commander => {
            for dir in Direction::all() {
                if let Some(to) = from + dir {
                    land_on(to, &mut out);
                }
            }
            flying_general(ctx, from, color, &mut out);
        }
        Infantry => {
            let dirs: Vec<Direction> = if heroic {
                Direction::all().collect()
            } else {
                Direction::orthogonals().collect()
            };
            for dir in dirs {
                if let Some(to) = from + dir {
                    land_on(to, &mut out);
                }
            }
        }
        Militia => {
            for dir in Direction::all() {
                if let Some(to) = from + dir {
                    land_on(to, &mut out);
                }
            }
        }
        Headquarters => {
            if heroic {
                for dir in Direction::all() {
                    if let Some(to) = from + dir {
                        land_on(to, &mut out);
                    }
                }
            }
        }
        Tank => {
            let range = if heroic { 3 } else { 2 };
            blocked_slide(ctx, from, piece, Direction::orthogonals(), range, &mut out);
        }
        Engineer => {
            let range = if heroic { 2 } else { 1 };
            blocked_slide(ctx, from, piece, Direction::orthogonals(), range, &mut out);
        }
        AntiAir => {
            let dirs: Vec<Direction> = if heroic {
                Direction::all().collect()
            } else {
                Direction::orthogonals().collect()
            };
            for dir in dirs {
                if let Some(to) = from + dir {
                    land_on(to, &mut out);
                }
            }
        }
        Artillery => artillery_moves(ctx, from, piece, &mut out),
        Missile => missile_moves(ctx, from, piece, &mut out),
        AirForce => air_force_moves(ctx, from, piece, &mut out),
        Navy => navy_moves(ctx, from, piece, &mut out),
    }
    out
}

fn terrain_allows(terrain: Terrain, piece_type: PieceType) -> bool {
    match terrain {
        Terrain::Mixed => true,
        Terrain::Water => piece_type == Navy,
        Terrain::Land => piece_type != Navy,
    }
}

/// Standard bounded-range slider: stops before a friendly blocker, ends
/// on (captures) the first enemy blocker, cannot pass through either.
fn blocked_slide(
    ctx: &GenContext,
    from: Square,
    piece: &Piece,
    dirs: impl Iterator<Item = Direction>,
    range: usize,
    out: &mut Vec<(MoveKind, Square)>,
) {
    let color = piece.color();
    let ours = ctx.board.occupied_by(color);
    let theirs = ctx.board.occupied_by(!color);
    for dir in dirs {
        for &to in ray(from, dir).iter().take(range) {
            if !terrain_allows(ctx.board.terrain_of(to), piece.piece_type()) {
                break;
            }
            if ours.contains(to) {
                if let Some(occupant) = ctx.board.get(to) {
                    if crate::stack::is_compatible(piece.piece_type(), occupant.piece_type())
                        && !occupant.is_stack()
                    {
                        out.push((MoveKind::Combination, to));
                    }
                }
                break;
            }
            if theirs.contains(to) {
                out.push((MoveKind::CaptureReplace, to));
                break;
            }
            out.push((MoveKind::Normal, to));
        }
    }
}

/// Artillery: 3-square orthogonal range. Quiet movement is blocked by any
/// piece in the way; capture ignores blockers entirely and is a
/// stay-capture (the gun never leaves its square).
fn artillery_moves(ctx: &GenContext, from: Square, piece: &Piece, out: &mut Vec<(MoveKind, Square)>) {
    const RANGE: usize = 3;
    let ours = ctx.board.occupied_by(piece.color());
    let theirs = ctx.board.occupied_by(!piece.color());
    for dir in Direction::orthogonals() {
        let full_ray = ray(from, dir);
        for &to in full_ray.iter().take(RANGE) {
            if !terrain_allows(ctx.board.terrain_of(to), piece.piece_type()) {
                break;
            }
            if theirs.contains(to) {
                out.push((MoveKind::StayCapture, to));
            }
        }
        for &to in full_ray.iter().take(RANGE) {
            if !terrain_allows(ctx.board.terrain_of(to), piece.piece_type()) || ours.contains(to) || theirs.contains(to) {
                break;
            }
            out.push((MoveKind::Normal, to));
        }
    }
}

/// Missile: long-range slider, blocked normally, but any destination
/// inside the opponent's air-defense zone is pruned.
fn missile_moves(ctx: &GenContext, from: Square, piece: &Piece, out: &mut Vec<(MoveKind, Square)>) {
    const RANGE: usize = 11;
    blocked_slide(ctx, from, piece, Direction::all(), RANGE, out);
    out.retain(|(_, to)| !ctx.air_defense.is_defended(*to, !piece.color()));
}

/// AirForce: ignores friendly pieces when flying over them (they don't
/// block its path, but it cannot land on one without a valid
/// combination); stops at the first enemy piece, which it either
/// captures normally or, if it's a Navy, suicide-captures. Non-suicide
/// destinations inside the opponent's air-defense zone are pruned;
/// kamikaze runs into defended airspace are allowed (spec §9 open
/// question, resolved here).
fn air_force_moves(ctx: &GenContext, from: Square, piece: &Piece, out: &mut Vec<(MoveKind, Square)>) {
    const RANGE: usize = 11;
    let ours = ctx.board.occupied_by(piece.color());
    let theirs = ctx.board.occupied_by(!piece.color());
    for dir in Direction::all() {
        for &to in ray(from, dir).iter().take(RANGE) {
            if ours.contains(to) {
                if let Some(occupant) = ctx.board.get(to) {
                    if crate::stack::is_compatible(piece.piece_type(), occupant.piece_type())
                        && !occupant.is_stack()
                    {
                        out.push((MoveKind::Combination, to));
                    }
                }
                // friendly pieces don't block flight; keep flying past.
                continue;
            }
            if theirs.contains(to) {
                let occupant = ctx.board.get(to).expect("theirs mask implies occupant");
                if occupant.piece_type() == Navy {
                    out.push((MoveKind::SuicideCapture, to));
                } else {
                    out.push((MoveKind::CaptureReplace, to));
                }
                break;
            }
            out.push((MoveKind::Normal, to));
        }
    }
    out.retain(|(kind, to)| {
        *kind == MoveKind::SuicideCapture || !ctx.air_defense.is_defended(*to, !piece.color())
    });
}

/// Navy: slides along ranks/files through water/mixed squares only. It
/// cannot enter a pure-land square, but can attack an occupant of one
/// via stay-capture within 3 squares; it can move onto (capture-replace)
/// a water/mixed occupant within 4 squares.
fn navy_moves(ctx: &GenContext, from: Square, piece: &Piece, out: &mut Vec<(MoveKind, Square)>) {
    const LAND_TARGET_RANGE: usize = 3;
    const WATER_TARGET_RANGE: usize = 4;
    let ours = ctx.board.occupied_by(piece.color());
    let theirs = ctx.board.occupied_by(!piece.color());
    for dir in Direction::orthogonals() {
        for (step, &to) in ray(from, dir).iter().enumerate() {
            let step = step + 1;
            let terrain = ctx.board.terrain_of(to);
            match terrain {
                Terrain::Land => {
                    if theirs.contains(to) && step <= LAND_TARGET_RANGE {
                        out.push((MoveKind::StayCapture, to));
                    }
                    break;
                }
                Terrain::Water | Terrain::Mixed => {
                    if ours.contains(to) {
                        if let Some(occupant) = ctx.board.get(to) {
                            if crate::stack::is_compatible(piece.piece_type(), occupant.piece_type())
                                && !occupant.is_stack()
                            {
                                out.push((MoveKind::Combination, to));
                            }
                        }
                        break;
                    }
                    if theirs.contains(to) {
                        if step <= WATER_TARGET_RANGE {
                            out.push((MoveKind::CaptureReplace, to));
                        }
                        break;
                    }
                    out.push((MoveKind::Normal, to));
                }
            }
        }
    }
}

/// Flying-general rule: a Commander may capture the enemy Commander along
/// any clear file/rank.
fn flying_general(ctx: &GenContext, from: Square, color: Color, out: &mut Vec<(MoveKind, Square)>) {
    let Some(enemy_sq) = ctx.board.commander_square(!color) else { return };
    if enemy_sq.file() != from.file() && enemy_sq.rank() != from.rank() {
        return;
    }
    let dir = if enemy_sq.file() == from.file() {
        if enemy_sq.rank().to_index() > from.rank().to_index() { Direction::Up } else { Direction::Down }
    } else if enemy_sq.file().to_index() > from.file().to_index() {
        Direction::Right
    } else {
        Direction::Left
    };
    let clear = ray(from, dir)
        .iter()
        .take_while(|&&sq| sq != enemy_sq)
        .all(|&sq| ctx.board.get(sq).is_none());
    if clear {
        out.push((MoveKind::CaptureReplace, enemy_sq));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::File::*;
    use crate::square::Rank::*;

    fn ctx<'a>(board: &'a Board, air: &'a AirDefenseMap, turn: Color) -> GenContext<'a> {
        GenContext { board, air_defense: air, turn }
    }

    #[test]
    fn flying_general_capture_available_on_clear_file() {
        let mut board = Board::empty();
        board.put(Piece::new(Commander, Color::Red), Square::new(FileG, Rank7));
        board.put(Piece::new(Commander, Color::Blue), Square::new(FileG, Rank12));
        let air = AirDefenseMap::recompute_all(&board);
        let c = ctx(&board, &air, Color::Red);
        let moves = pseudo_legal(&c, MoveFilter::square(Square::new(FileG, Rank7)));
        assert!(moves.iter().any(|m| m.to_square() == Square::new(FileG, Rank12) && m.is_capture()));
    }

    #[test]
    fn navy_attacks_land_target_within_three_not_four() {
        let mut board = Board::empty();
        let navy_sq = Square::new(FileC, Rank12);
        board.put(Piece::new(Navy, Color::Red), navy_sq);
        // g12 is 4 files away from c12 -- a land target beyond range 3.
        board.put(Piece::new(Commander, Color::Blue), Square::new(FileG, Rank12));
        let air = AirDefenseMap::recompute_all(&board);
        let c = ctx(&board, &air, Color::Red);
        let dests = destinations(&c, navy_sq, board.get(navy_sq).unwrap());
        assert!(!dests.iter().any(|(_, to)| *to == Square::new(FileG, Rank12)));
    }

    #[test]
    fn navy_attacks_water_target_within_four() {
        let mut board = Board::empty();
        let navy_sq = Square::new(FileC, Rank12);
        board.put(Piece::new(Navy, Color::Red), navy_sq);
        board.put(Piece::new(Infantry, Color::Blue), Square::new(FileA, Rank10));
        let air = AirDefenseMap::recompute_all(&board);
        let c = ctx(&board, &air, Color::Red);
        let dests = destinations(&c, navy_sq, board.get(navy_sq).unwrap());
        assert!(dests.iter().any(|(kind, to)| *to == Square::new(FileA, Rank10) && *kind == MoveKind::CaptureReplace));
    }

    #[test]
    fn air_force_suicide_captures_navy() {
        let mut board = Board::empty();
        let af_sq = Square::new(FileF, Rank1);
        board.put(Piece::new(AirForce, Color::Red), af_sq);
        board.put(Piece::new(Navy, Color::Blue), Square::new(FileC, Rank1));
        let air = AirDefenseMap::recompute_all(&board);
        let c = ctx(&board, &air, Color::Red);
        let dests = destinations(&c, af_sq, board.get(af_sq).unwrap());
        assert!(dests
            .iter()
            .any(|(kind, to)| *to == Square::new(FileC, Rank1) && *kind == MoveKind::SuicideCapture));
    }

    #[test]
    fn air_force_move_into_defended_square_is_pruned() {
        let mut board = Board::empty();
        let af_sq = Square::new(FileF, Rank1);
        board.put(Piece::new(AirForce, Color::Red), af_sq);
        board.put(Piece::new(PieceType::AntiAir, Color::Blue), Square::new(FileF, Rank3));
        let air = AirDefenseMap::recompute_all(&board);
        let c = ctx(&board, &air, Color::Red);
        let dests = destinations(&c, af_sq, board.get(af_sq).unwrap());
        assert!(!dests.iter().any(|(_, to)| *to == Square::new(FileF, Rank4)));
    }

    #[test]
    fn artillery_captures_through_blocker_but_cannot_move_through_it() {
        let mut board = Board::empty();
        let art_sq = Square::new(FileF, Rank1);
        board.put(Piece::new(Artillery, Color::Red), art_sq);
        board.put(Piece::new(Infantry, Color::Red), Square::new(FileF, Rank2));
        board.put(Piece::new(Infantry, Color::Blue), Square::new(FileF, Rank3));
        let air = AirDefenseMap::recompute_all(&board);
        let c = ctx(&board, &air, Color::Red);
        let dests = destinations(&c, art_sq, board.get(art_sq).unwrap());
        assert!(dests
            .iter()
            .any(|(kind, to)| *to == Square::new(FileF, Rank3) && *kind == MoveKind::StayCapture));
        assert!(!dests.iter().any(|(_, to)| *to == Square::new(FileF, Rank2)));
    }

    #[test]
    fn artillery_quiet_move_reaches_full_range_when_unblocked() {
        let mut board = Board::empty();
        let art_sq = Square::new(FileF, Rank1);
        board.put(Piece::new(Artillery, Color::Red), art_sq);
        let air = AirDefenseMap::recompute_all(&board);
        let c = ctx(&board, &air, Color::Red);
        let dests = destinations(&c, art_sq, board.get(art_sq).unwrap());
        for rank in [Rank2, Rank3, Rank4] {
            assert!(
                dests
                    .iter()
                    .any(|(kind, to)| *to == Square::new(FileF, rank) && *kind == MoveKind::Normal),
                "expected a quiet move onto f{:?}",
                rank
            );
        }
        assert!(!dests.iter().any(|(_, to)| *to == Square::new(FileF, Rank5)));
    }

    #[test]
    fn artillery_quiet_move_stops_before_first_blocker() {
        let mut board = Board::empty();
        let art_sq = Square::new(FileF, Rank1);
        board.put(Piece::new(Artillery, Color::Red), art_sq);
        board.put(Piece::new(Infantry, Color::Blue), Square::new(FileF, Rank3));
        let air = AirDefenseMap::recompute_all(&board);
        let c = ctx(&board, &air, Color::Red);
        let dests = destinations(&c, art_sq, board.get(art_sq).unwrap());
        assert!(dests
            .iter()
            .any(|(kind, to)| *to == Square::new(FileF, Rank2) && *kind == MoveKind::Normal));
        assert!(!dests.iter().any(|(_, to)| *to == Square::new(FileF, Rank4)));
    }

    #[test]
    fn tank_blocked_by_friendly_cannot_pass_or_capture_beyond() {
        let mut board = Board::empty();
        let tank_sq = Square::new(FileF, Rank1);
        board.put(Piece::new(Tank, Color::Red), tank_sq);
        board.put(Piece::new(Infantry, Color::Red), Square::new(FileF, Rank2));
        let air = AirDefenseMap::recompute_all(&board);
        let c = ctx(&board, &air, Color::Red);
        let dests = destinations(&c, tank_sq, board.get(tank_sq).unwrap());
        assert!(dests.is_empty());
    }
}
