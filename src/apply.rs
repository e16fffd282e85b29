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

//! Move applier (spec §4.5): the six atomic actions, a transactional
//! executor that rolls back on mid-sequence failure, and the legality
//! filter built on top of it.
//!
//! Two undo levels, kept deliberately distinct (spec §9): a
//! [`MinimalUndoRecord`] reverses one compound move (used by the legality
//! filter and by deploy-session cancel/sub-move undo); a `HistoryEntry`
//! (in `game.rs`) is a full state snapshot used for the public `undo()`.

use crate::airdefense::AirDefenseMap;
use crate::board::Board;
use crate::check::is_attacking_kind;
use crate::error::{EngineError, Result};
use crate::material::{Color, Piece, PieceType};
use crate::moves::{destinations, GenContext, Move, MoveKind};
use crate::square::Square;
use crate::stack;

/// A single reversal step: the exact content `square` held, or the exact
/// commander-cache / heroic-flag value, immediately before an atomic
/// action ran.
#[derive(Debug, Clone)]
enum UndoStep {
    Square(Square, Option<Piece>),
    Commander(Color, Option<Square>),
    Heroic(Square, PieceType, bool),
}

/// The reversal of one compound move (spec §3's `MinimalUndoRecord`):
/// an ordered list of atomic-action reversals, applied LIFO.
#[derive(Debug, Clone, Default)]
pub struct MinimalUndoRecord(Vec<UndoStep>);

impl MinimalUndoRecord {
    fn push(&mut self, step: UndoStep) {
        self.0.push(step);
    }
    pub(crate) fn extend(&mut self, other: MinimalUndoRecord) {
        self.0.extend(other.0);
    }
    /// Reverses every recorded step, most recent first.
    pub fn undo(self, board: &mut Board) {
        for step in self.0.into_iter().rev() {
            match step {
                UndoStep::Square(sq, prior) => {
                    board.remove(sq);
                    if let Some(piece) = prior {
                        board.put(piece, sq);
                    }
                }
                UndoStep::Commander(color, sq) => board.set_commander_square(color, sq),
                UndoStep::Heroic(sq, piece_type, heroic) => {
                    if let Some(piece) = piece_mut_by_type(board, sq, piece_type) {
                        piece.set_heroic(heroic);
                    }
                }
            }
        }
    }
}

fn piece_mut_by_type(board: &mut Board, square: Square, piece_type: PieceType) -> Option<&mut Piece> {
    let top = board.get_mut(square)?;
    if top.piece_type() == piece_type {
        return Some(top);
    }
    top.carrying_mut().iter_mut().find(|p| p.piece_type() == piece_type)
}

/// A sequence of atomic actions (spec §4.5) executing against one board,
/// collecting the matching [`UndoStep`] for each so the whole sequence can
/// be rolled back on failure or reversed later via [`MinimalUndoRecord`].
struct Transaction<'a> {
    board: &'a mut Board,
    undo: MinimalUndoRecord,
}

impl<'a> Transaction<'a> {
    fn new(board: &'a mut Board) -> Self {
        Self { board, undo: MinimalUndoRecord::default() }
    }

    /// Rolls back every step applied so far, in reverse order.
    fn rollback(self) {
        self.undo.undo(self.board);
    }

    fn finish(self) -> MinimalUndoRecord {
        self.undo
    }

    /// `RemovePiece(sq)`: removes and returns whatever occupies `square`.
    fn remove_piece(&mut self, square: Square) -> Result<Piece> {
        let prior = self
            .board
            .remove(square)
            .ok_or_else(|| EngineError::IllegalState(format!("no piece at {square} to remove")))?;
        self.undo.push(UndoStep::Square(square, Some(prior.clone())));
        Ok(prior)
    }

    /// `PlacePiece(piece, sq)`: places onto an empty square.
    fn place_piece(&mut self, piece: Piece, square: Square) -> Result<()> {
        if self.board.get(square).is_some() {
            return Err(EngineError::IllegalState(format!("{square} is already occupied")));
        }
        if !self.board.put(piece, square) {
            return Err(EngineError::IllegalState(format!("cannot place piece on {square}")));
        }
        self.undo.push(UndoStep::Square(square, None));
        Ok(())
    }

    /// `AddToStack(piece, sq)`: appends `extra` onto the stack at `square`.
    fn add_to_stack(&mut self, square: Square, extra: Piece) -> Result<()> {
        let prior = self
            .board
            .remove(square)
            .ok_or_else(|| EngineError::IllegalState(format!("no stack at {square} to add to")))?;
        let combined = stack::add_to_stack(&prior, extra)?;
        if !self.board.put(combined, square) {
            self.board.put(prior.clone(), square);
            return Err(EngineError::IllegalState(format!("cannot place combined stack on {square}")));
        }
        self.undo.push(UndoStep::Square(square, Some(prior)));
        Ok(())
    }

    /// `RemoveFromStack(sq, piece_type)`: detaches one member, returning it
    /// and leaving any (possibly degraded) remainder on the square.
    fn remove_from_stack(&mut self, square: Square, piece_type: PieceType) -> Result<Piece> {
        let prior = self
            .board
            .remove(square)
            .ok_or_else(|| EngineError::IllegalState(format!("no stack at {square}")))?;
        let (removed, remainder) = match stack::remove_from_stack(&prior, piece_type) {
            Ok(r) => r,
            Err(e) => {
                self.board.put(prior, square);
                return Err(e);
            }
        };
        if let Some(rem) = remainder.clone() {
            self.board.put(rem, square);
        }
        self.undo.push(UndoStep::Square(square, Some(prior)));
        Ok(removed)
    }

    /// `SetCommander(color, sq)`: raw commander-cache override, used when a
    /// recombination moves the commander to a different carrier square
    /// without an ordinary placement.
    fn set_commander(&mut self, color: Color, square: Option<Square>) {
        let prior = self.board.commander_square(color);
        self.board.set_commander_square(color, square);
        self.undo.push(UndoStep::Commander(color, prior));
    }

    /// `SetHeroic(sq, piece_type, bool)`.
    fn set_heroic(&mut self, square: Square, piece_type: PieceType, heroic: bool) -> Result<()> {
        let piece = piece_mut_by_type(self.board, square, piece_type)
            .ok_or_else(|| EngineError::IllegalState(format!("{piece_type:?} not present at {square}")))?;
        let prior = piece.is_heroic();
        piece.set_heroic(heroic);
        self.undo.push(UndoStep::Heroic(square, piece_type, prior));
        Ok(())
    }
}

/// Outcome of applying one compound move: its undo record and whatever
/// piece it captured (if any), for the move descriptor / half-move clock.
pub struct ApplyOutcome {
    pub undo: MinimalUndoRecord,
    pub captured: Option<Piece>,
}

/// Applies one compound move atomically. On any mid-sequence failure,
/// previously applied atomic actions are rolled back before the error
/// propagates, so the board is never left in a torn state (spec §7).
pub fn apply_move(board: &mut Board, mv: &Move) -> Result<ApplyOutcome> {
    let mut tx = Transaction::new(board);
    match try_apply(&mut tx, mv) {
        Ok(captured) => Ok(ApplyOutcome { undo: tx.finish(), captured }),
        Err(e) => {
            tx.rollback();
            Err(e)
        }
    }
}

fn try_apply(tx: &mut Transaction, mv: &Move) -> Result<Option<Piece>> {
    match *mv {
        Move::Play { kind, from, to } => apply_shaped(tx, from, to, kind, |tx| tx.remove_piece(from)),
        Move::DeployStep { from, piece_type, kind, to } => {
            apply_shaped(tx, from, to, kind, |tx| tx.remove_from_stack(from, piece_type))
        }
        Move::Recombine { from, to, piece_type } => {
            let piece = tx.remove_from_stack(from, piece_type)?;
            tx.add_to_stack(to, piece)?;
            Ok(None)
        }
    }
}

/// Shared shape for `Play`/`DeployStep`: detach the moving piece (either
/// the whole stack for `Play`, or one member for `DeployStep`), then place
/// it per `kind`. `StayCapture` leaves the piece back where it detached
/// from; `SuicideCapture` consumes it entirely.
fn apply_shaped(
    tx: &mut Transaction,
    from: Square,
    to: Square,
    kind: MoveKind,
    detach: impl FnOnce(&mut Transaction) -> Result<Piece>,
) -> Result<Option<Piece>> {
    match kind {
        MoveKind::Normal => {
            let piece = detach(tx)?;
            tx.place_piece(piece, to)?;
            Ok(None)
        }
        MoveKind::CaptureReplace => {
            let captured = tx.remove_piece(to)?;
            let piece = detach(tx)?;
            tx.place_piece(piece, to)?;
            Ok(Some(captured))
        }
        MoveKind::StayCapture => {
            let captured = tx.remove_piece(to)?;
            let piece = detach(tx)?;
            tx.place_piece(piece, from)?;
            Ok(Some(captured))
        }
        MoveKind::SuicideCapture => {
            let captured = tx.remove_piece(to)?;
            detach(tx)?;
            Ok(Some(captured))
        }
        MoveKind::Combination => {
            let piece = detach(tx)?;
            tx.add_to_stack(to, piece)?;
            Ok(None)
        }
    }
}

/// Re-entrant legality check (spec §4.5): tentatively applies `mv`, tests
/// that the mover's Commander is neither attacked nor exposed, then
/// reverses the tentative application. Leaves no observable side effects.
pub fn is_legal(board: &mut Board, mover: Color, mv: &Move) -> bool {
    let outcome = match apply_move(board, mv) {
        Ok(o) => o,
        Err(_) => return false,
    };
    // A capture/placement can invalidate the air-defense map the probe
    // reads; recompute so the Commander-safety check sees the post-move
    // world accurately.
    let probe_air = AirDefenseMap::recompute_all(board);
    let safe = !crate::check::is_commander_attacked(board, &probe_air, mover)
        && !crate::check::is_commander_exposed(board, mover);
    outcome.undo.undo(board);
    safe
}

/// Heroic promotion (spec §4.4/§4.5): a piece gains `heroic = true` the
/// instant it — or any other `mover`-colored piece standing at the same
/// square — threatens the enemy Commander's square. Scans once per
/// completed move (never mid deploy-step); returns the undo steps (folded
/// by the caller into that move's `MinimalUndoRecord`) plus the list of
/// newly-heroic `(square, piece_type)` pairs for the move descriptor.
pub fn promote_heroics(
    board: &mut Board,
    air_defense: &AirDefenseMap,
    mover: Color,
) -> (MinimalUndoRecord, Vec<(Square, PieceType)>) {
    let mut promoted = Vec::new();
    if let Some(enemy_sq) = board.commander_square(!mover) {
        let ctx = GenContext { board, air_defense, turn: mover };
        for (origin, stack) in board.iter_color(mover) {
            for member in stack.members() {
                if member.is_heroic() {
                    continue;
                }
                let reaches = destinations(&ctx, origin, member)
                    .into_iter()
                    .any(|(kind, to)| to == enemy_sq && is_attacking_kind(kind));
                if reaches {
                    promoted.push((origin, member.piece_type()));
                }
            }
        }
    }
    let mut tx = Transaction::new(board);
    for &(square, piece_type) in &promoted {
        let _ = tx.set_heroic(square, piece_type, true);
    }
    (tx.finish(), promoted)
}

/// Attaches/detaches a single board-level [`GenContext`] built from the
/// current board + a freshly computed air-defense map — a small
/// convenience the legality filter and deploy-option generator share.
pub fn fresh_context(board: &Board, air_defense: &AirDefenseMap, turn: Color) -> GenContext<'_> {
    GenContext { board, air_defense, turn }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Color::*, PieceType::*};
    use crate::square::{File::*, Rank::*};

    #[test]
    fn normal_move_reverses_exactly() {
        let mut board = Board::empty();
        let from = Square::new(FileF, Rank1);
        let to = Square::new(FileF, Rank2);
        board.put(Piece::new(Infantry, Red), from);
        let before = board.clone();
        let outcome = apply_move(&mut board, &Move::Play { kind: MoveKind::Normal, from, to }).unwrap();
        assert!(board.get(to).is_some());
        outcome.undo.undo(&mut board);
        assert_eq!(format!("{before:?}"), format!("{board:?}"));
    }

    #[test]
    fn capture_replace_restores_captured_piece_on_undo() {
        let mut board = Board::empty();
        let from = Square::new(FileF, Rank1);
        let to = Square::new(FileF, Rank2);
        board.put(Piece::new(Infantry, Red), from);
        board.put(Piece::new(Infantry, Blue), to);
        let outcome =
            apply_move(&mut board, &Move::Play { kind: MoveKind::CaptureReplace, from, to }).unwrap();
        assert!(outcome.captured.is_some());
        outcome.undo.undo(&mut board);
        assert_eq!(board.get(to).unwrap().color(), Blue);
        assert_eq!(board.get(from).unwrap().color(), Red);
    }

    #[test]
    fn stay_capture_leaves_attacker_at_origin() {
        let mut board = Board::empty();
        let from = Square::new(FileF, Rank1);
        let to = Square::new(FileF, Rank3);
        board.put(Piece::new(Artillery, Red), from);
        board.put(Piece::new(Infantry, Blue), to);
        let outcome =
            apply_move(&mut board, &Move::Play { kind: MoveKind::StayCapture, from, to }).unwrap();
        assert!(outcome.captured.is_some());
        assert!(board.get(to).is_none());
        assert_eq!(board.get(from).unwrap().piece_type(), Artillery);
    }

    #[test]
    fn deploy_step_detaches_one_member_and_leaves_remainder() {
        let mut board = Board::empty();
        let origin = Square::new(FileC, Rank3);
        let dest = Square::new(FileC, Rank4);
        let stack = stack::combine(&[
            Piece::new(Navy, Red),
            Piece::new(AirForce, Red),
            Piece::new(Tank, Red),
        ])
        .unwrap();
        board.put(stack, origin);
        let outcome = apply_move(
            &mut board,
            &Move::DeployStep { from: origin, piece_type: AirForce, kind: MoveKind::Normal, to: dest },
        )
        .unwrap();
        assert_eq!(board.get(dest).unwrap().piece_type(), AirForce);
        let remainder = board.get(origin).unwrap();
        assert_eq!(remainder.piece_type(), Navy);
        assert_eq!(remainder.carrying().len(), 1);
        outcome.undo.undo(&mut board);
        assert!(board.get(dest).is_none());
        assert_eq!(board.get(origin).unwrap().carrying().len(), 2);
    }

    #[test]
    fn legality_filter_rejects_move_that_leaves_commander_attacked() {
        let mut board = Board::empty();
        board.put(Piece::new(Commander, Red), Square::new(FileF, Rank1));
        board.put(Piece::new(Infantry, Red), Square::new(FileF, Rank2));
        board.put(Piece::new(Missile, Blue), Square::new(FileF, Rank6));
        // Moving the infantry away from f2 would expose the commander on f1
        // to the missile's file.
        let mv = Move::Play {
            kind: MoveKind::Normal,
            from: Square::new(FileF, Rank2),
            to: Square::new(FileG, Rank2),
        };
        assert!(!is_legal(&mut board, Red, &mv));
        // The board must be untouched after a rejected legality probe.
        assert!(board.get(Square::new(FileF, Rank2)).is_some());
    }

    #[test]
    fn promote_heroics_flags_pieces_newly_attacking_the_enemy_commander() {
        let mut board = Board::empty();
        board.put(Piece::new(Commander, Blue), Square::new(FileF, Rank6));
        board.put(Piece::new(Infantry, Red), Square::new(FileF, Rank5));
        let air = AirDefenseMap::recompute_all(&board);
        let (undo, promoted) = promote_heroics(&mut board, &air, Red);
        assert_eq!(promoted, vec![(Square::new(FileF, Rank5), Infantry)]);
        assert!(board.get(Square::new(FileF, Rank5)).unwrap().is_heroic());
        undo.undo(&mut board);
        assert!(!board.get(Square::new(FileF, Rank5)).unwrap().is_heroic());
    }
}
