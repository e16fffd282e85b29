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

//! Deploy-session state (spec §4.6). This module holds the session's data
//! and its pure bookkeeping queries; `Game` (in `game.rs`) owns the state
//! machine transitions since committing/cancelling touches the board,
//! turn, and history that this module has no business reaching into
//! (spec §9: "invert the cyclic reference -- the session holds the origin
//! square and a reference-by-value to the starting snapshot").

use crate::apply::MinimalUndoRecord;
use crate::material::{Piece, PieceType};
use crate::moves::Move;
use crate::square::Square;

/// One applied sub-move and the undo record needed to reverse it alone
/// (used by `cancel`, which unwinds sub-moves LIFO).
pub struct DeployCommand {
    pub mv: Move,
    pub undo: MinimalUndoRecord,
}

/// A deferred recombine instruction: merge `piece_type`, still sitting at
/// the session's origin, into whichever square a prior sub-move deployed
/// to. Not reflected on the board until commit.
#[derive(Debug, Clone, Copy)]
pub struct RecombineInstruction {
    pub piece_type: PieceType,
    pub to: Square,
    /// Index into `commands` after which this instruction was recorded;
    /// recombines are applied at commit in this order.
    pub recorded_after: usize,
}

pub struct DeploySession {
    pub stack_square: Square,
    pub original_piece: Piece,
    pub commands: Vec<DeployCommand>,
    pub recombine_instructions: Vec<RecombineInstruction>,
    /// Full game-state snapshot from immediately before the first
    /// sub-move, used for `undo()`'s single history entry and stored
    /// separately from the per-sub-move `MinimalUndoRecord`s.
    pub start_fingerprint: String,
}

impl DeploySession {
    pub fn start(stack_square: Square, original_piece: Piece, start_fingerprint: String) -> Self {
        Self {
            stack_square,
            original_piece,
            commands: Vec::new(),
            recombine_instructions: Vec::new(),
            start_fingerprint,
        }
    }

    /// Piece types that have already separated via a `DeployStep` command.
    fn deployed_types(&self) -> Vec<PieceType> {
        self.commands
            .iter()
            .filter_map(|c| match c.mv {
                Move::DeployStep { piece_type, .. } => Some(piece_type),
                _ => None,
            })
            .collect()
    }

    /// Piece types claimed by a pending (unapplied) recombine instruction.
    fn recombined_types(&self) -> Vec<PieceType> {
        self.recombine_instructions.iter().map(|r| r.piece_type).collect()
    }

    /// Members of the original stack still physically at `stack_square`
    /// (i.e. not yet sent away by a `DeployStep`), including any claimed by
    /// a pending recombine -- used by the serializer's "remaining" field
    /// and by commit's implicit-residue computation.
    pub fn still_at_origin(&self) -> Vec<Piece> {
        let mut members: Vec<Piece> = self.original_piece.members().into_iter().cloned().collect();
        for deployed in self.deployed_types() {
            if let Some(pos) = members.iter().position(|p| p.piece_type() == deployed) {
                members.remove(pos);
            }
        }
        members
    }

    /// Members at the origin with no deploy-step AND no pending recombine
    /// claim -- these form the implicit residue left behind on commit.
    pub fn unclaimed_residue(&self) -> Vec<Piece> {
        let mut members = self.still_at_origin();
        for claimed in self.recombined_types() {
            if let Some(pos) = members.iter().position(|p| p.piece_type() == claimed) {
                members.remove(pos);
            }
        }
        members
    }

    /// Auto-commit fires once nothing remains unaccounted for: every
    /// member has either deployed or been claimed by a recombine, and no
    /// recombine is still pending application (spec §4.6).
    pub fn is_fully_resolved(&self) -> bool {
        self.unclaimed_residue().is_empty() && self.recombine_instructions.is_empty()
    }

    /// Whether `piece_type` is still available to deploy or recombine
    /// (present at origin, not already claimed).
    pub fn is_available(&self, piece_type: PieceType) -> bool {
        self.unclaimed_residue().iter().any(|p| p.piece_type() == piece_type)
    }

    pub fn record_command(&mut self, mv: Move, undo: MinimalUndoRecord) {
        self.commands.push(DeployCommand { mv, undo });
    }

    pub fn record_recombine(&mut self, piece_type: PieceType, to: Square) {
        self.recombine_instructions.push(RecombineInstruction {
            piece_type,
            to,
            recorded_after: self.commands.len(),
        });
    }

    /// Removes the most recently recorded recombine instruction.
    pub fn undo_last_recombine(&mut self) -> bool {
        self.recombine_instructions.pop().is_some()
    }

    /// Squares a prior sub-move has already deployed to -- valid
    /// recombine targets.
    pub fn deployed_destinations(&self) -> Vec<Square> {
        self.commands
            .iter()
            .filter_map(|c| match c.mv {
                Move::DeployStep { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Color::*, PieceType::*};
    use crate::square::{File::*, Rank::*};
    use crate::stack;

    fn sample_stack() -> Piece {
        stack::combine(&[Piece::new(Navy, Red), Piece::new(AirForce, Red), Piece::new(Tank, Red)]).unwrap()
    }

    #[test]
    fn fresh_session_has_every_member_unclaimed() {
        let session = DeploySession::start(Square::new(FileC, Rank3), sample_stack(), "fp".into());
        assert_eq!(session.unclaimed_residue().len(), 3);
        assert!(!session.is_fully_resolved());
    }

    #[test]
    fn recombine_claims_a_member_without_deploying_it() {
        let mut session = DeploySession::start(Square::new(FileC, Rank3), sample_stack(), "fp".into());
        session.record_recombine(AirForce, Square::new(FileC, Rank5));
        assert_eq!(session.still_at_origin().len(), 3);
        assert_eq!(session.unclaimed_residue().len(), 2);
        assert!(!session.is_available(AirForce));
    }

    #[test]
    fn fully_deployed_with_no_recombines_is_resolved() {
        let mut session = DeploySession::start(Square::new(FileC, Rank3), sample_stack(), "fp".into());
        for piece_type in [Navy, AirForce, Tank] {
            session.record_command(
                Move::DeployStep {
                    from: Square::new(FileC, Rank3),
                    piece_type,
                    kind: crate::moves::MoveKind::Normal,
                    to: Square::new(FileC, Rank4),
                },
                MinimalUndoRecord::default(),
            );
        }
        assert!(session.is_fully_resolved());
    }
}
