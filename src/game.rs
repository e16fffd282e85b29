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

//! The public `Game` value (spec §6): position I/O, the move/deploy/undo
//! API, and state queries. This is where the deploy-session state machine
//! (spec §4.6) actually lives — `deploy.rs` only holds the session's data
//! and pure bookkeeping; committing, cancelling, and resetting all touch
//! the board, turn, and history that `Game` owns.

use std::collections::HashMap;

use crate::airdefense::AirDefenseMap;
use crate::apply::{self, MinimalUndoRecord};
use crate::board::Board;
use crate::check::{self, is_attacking_kind};
use crate::deploy::DeploySession;
use crate::error::{CommitOutcome, EngineError, Result};
use crate::fen;
use crate::material::{Color, Piece, PieceType};
use crate::moves::{self, destinations, Move, MoveFilter, MoveKind};
use crate::square::{File, Rank, Square, FILES, RANKS};
use crate::stack;

/// The outcome of one user-visible action: a whole move, one deploy
/// sub-move, a recombine instruction, or a session commit (spec §4.5's
/// "move descriptor").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDescriptor {
    pub from: Square,
    pub to: Square,
    pub piece_type: PieceType,
    pub color: Color,
    pub captured: Option<Piece>,
    pub heroic_deltas: Vec<(Square, PieceType)>,
    pub notation: String,
}

#[derive(Clone)]
struct StateSnapshot {
    board: Board,
    turn: Color,
    half_move_clock: u32,
    move_number: u32,
    position_counts: HashMap<String, u32>,
}

struct HistoryEntry {
    snapshot: StateSnapshot,
    descriptor: MoveDescriptor,
}

pub struct Game {
    board: Board,
    air_defense: AirDefenseMap,
    turn: Color,
    half_move_clock: u32,
    move_number: u32,
    position_counts: HashMap<String, u32>,
    deploy_session: Option<DeploySession>,
    /// State immediately before the in-flight deploy session's first
    /// sub-move; becomes the `HistoryEntry`'s snapshot at commit.
    pending_snapshot: Option<StateSnapshot>,
    /// Whether any sub-move so far in the active session captured or
    /// produced a heroic promotion (half-move clock reset at commit).
    deploy_clock_reset: bool,
    history: Vec<HistoryEntry>,
}

impl Game {
    fn empty() -> Self {
        Self {
            board: Board::empty(),
            air_defense: AirDefenseMap::new(),
            turn: Color::Red,
            half_move_clock: 0,
            move_number: 1,
            position_counts: HashMap::new(),
            deploy_session: None,
            pending_snapshot: None,
            deploy_clock_reset: false,
            history: Vec::new(),
        }
    }

    /// Loads `fen`, or the default starting position when `fen` is absent.
    pub fn new(fen_str: Option<&str>) -> Result<Self> {
        let mut game = Self::empty();
        match fen_str {
            Some(text) => game.load(text)?,
            None => {
                default_position(&mut game.board);
                game.air_defense = AirDefenseMap::recompute_all(&game.board);
                game.position_counts.insert(game.fingerprint(), 1);
            }
        }
        Ok(game)
    }

    pub fn clear(&mut self) {
        *self = Self::empty();
    }

    /// Replaces the entire game state with the position (and, if present,
    /// the active deploy session) encoded by `fen_str`.
    pub fn load(&mut self, fen_str: &str) -> Result<()> {
        let fields = fen::parse_fen(fen_str)?;
        self.board = fields.board;
        self.turn = fields.turn;
        self.half_move_clock = fields.half_move_clock;
        self.move_number = fields.move_number;
        self.air_defense = AirDefenseMap::recompute_all(&self.board);
        self.position_counts = HashMap::new();
        self.history.clear();
        self.deploy_session = None;
        self.pending_snapshot = None;
        self.deploy_clock_reset = false;
        self.position_counts.insert(self.fingerprint(), 1);

        if let Some(suffix) = fields.deploy {
            let original_piece = self.reconstruct_deploy_original(&suffix)?;
            self.pending_snapshot = Some(self.snapshot());
            self.deploy_session =
                Some(DeploySession::start(suffix.origin, original_piece, self.fingerprint()));
        }
        Ok(())
    }

    /// Best-effort reconstruction of a reloaded session's pre-session
    /// stack from the placement field alone: the union of whatever sits
    /// at the origin now with whatever sits at each already-deployed
    /// destination. Sub-move history (the per-command `MinimalUndoRecord`
    /// chain) cannot be recovered from text, so a session rebuilt this
    /// way supports further sub-moves, recombine, and commit, but
    /// `cancel_deploy_session` on it clears the session without replaying
    /// a LIFO undo (see DESIGN.md).
    fn reconstruct_deploy_original(&self, suffix: &fen::DeploySuffix) -> Result<Piece> {
        let mut members: Vec<Piece> = Vec::new();
        if let Some(piece) = self.board.get(suffix.origin) {
            members.extend(piece.members().into_iter().cloned());
        }
        for (square, _) in &suffix.virtual_changes {
            if let Some(piece) = self.board.get(*square) {
                members.extend(piece.members().into_iter().cloned());
            }
        }
        if members.is_empty() {
            return Err(EngineError::InvalidInput("DEPLOY suffix names an empty origin".into()));
        }
        members.sort_by_key(|p| !matches!(p.piece_type(), PieceType::Navy | PieceType::Tank | PieceType::Headquarters));
        stack::combine(&members).or_else(|_| {
            self.board
                .get(suffix.origin)
                .cloned()
                .ok_or_else(|| EngineError::InvalidInput("DEPLOY origin is empty".into()))
        })
    }

    /// Renders the current position, including the `DEPLOY` suffix when a
    /// session is active.
    pub fn fen(&self) -> String {
        let suffix = self.deploy_session.as_ref().map(|session| {
            let remaining_letters: String =
                session.unclaimed_residue().iter().map(|p| p.piece_type().letter()).collect();
            let virtual_changes = session
                .deployed_destinations()
                .into_iter()
                .map(|sq| (sq, self.board.get(sq).cloned()))
                .collect();
            fen::DeploySuffix {
                origin: session.stack_square,
                remaining_letters,
                move_count: session.commands.len() as u32,
                virtual_changes,
            }
        });
        fen::write_fen(&self.board, self.turn, self.half_move_clock, self.move_number, suffix.as_ref())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// A rank-major (rank 1 first) snapshot grid, for hosts that want a
    /// plain 2D array rather than the sparse `Board` type.
    pub fn board_grid(&self) -> Vec<Vec<Option<Piece>>> {
        (0..RANKS)
            .map(|r| {
                (0..FILES)
                    .map(|f| self.board.get(Square::new(File::from_index(f), Rank::from_index(r))).cloned())
                    .collect()
            })
            .collect()
    }

    pub fn put(&mut self, piece: Piece, square: Square) -> bool {
        let placed = self.board.put(piece, square);
        if placed {
            self.air_defense = AirDefenseMap::recompute_all(&self.board);
        }
        placed
    }

    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        let removed = self.board.remove(square);
        if removed.is_some() {
            self.air_defense = AirDefenseMap::recompute_all(&self.board);
        }
        removed
    }

    pub fn get(&self, square: Square) -> Option<&Piece> {
        self.board.get(square)
    }

    /// Heroic status of `square`'s top-level occupant, or of a named
    /// carried member when `piece_type` is given.
    pub fn get_heroic_status(&self, square: Square, piece_type: Option<PieceType>) -> bool {
        let Some(piece) = self.board.get(square) else { return false };
        match piece_type {
            Some(pt) => piece.members().into_iter().find(|p| p.piece_type() == pt).map(|p| p.is_heroic()).unwrap_or(false),
            None => piece.is_heroic(),
        }
    }

    pub fn set_heroic_status(&mut self, square: Square, piece_type: PieceType, heroic: bool) -> bool {
        let changed = match self.board.get_mut(square) {
            None => false,
            Some(piece) => {
                let target = if piece.piece_type() == piece_type {
                    Some(piece)
                } else {
                    piece.carrying_mut().iter_mut().find(|p| p.piece_type() == piece_type)
                };
                match target {
                    Some(p) => {
                        p.set_heroic(heroic);
                        true
                    }
                    None => false,
                }
            }
        };
        if changed {
            self.air_defense = AirDefenseMap::recompute_all(&self.board);
        }
        changed
    }

    // ---- Move API ----------------------------------------------------

    /// Every legal move for the side to move, narrowed by `filter`. Mid
    /// deploy-session, this restricts to sub-moves from the session's
    /// stack square plus Commander emergency moves (spec §4.6).
    pub fn legal(&self, filter: MoveFilter) -> Vec<Move> {
        match &self.deploy_session {
            None => self.legal_normal(filter),
            Some(session) => self.legal_deploy(session, filter),
        }
    }

    pub fn legal_from_square(&self, square: Square) -> Vec<Move> {
        self.legal(MoveFilter::square(square))
    }

    /// SAN-like textual form of every legal move matching `filter`.
    pub fn moves(&self, filter: MoveFilter) -> Vec<String> {
        self.legal(filter).iter().map(|mv| self.render_move_text(mv)).collect()
    }

    fn legal_normal(&self, filter: MoveFilter) -> Vec<Move> {
        let ctx = apply::fresh_context(&self.board, &self.air_defense, self.turn);
        let mut candidates = moves::pseudo_legal(&ctx, filter);

        // A stack offers, in addition to moving as one carrier-led unit
        // (already covered by `pseudo_legal` above), a deploy-step for
        // each individual member separating from it.
        for (origin, piece) in self.board.iter_color(self.turn) {
            if !piece.is_stack() {
                continue;
            }
            if filter.square.map(|s| s == origin).unwrap_or(true) {
                for member in piece.members() {
                    if let Some(pt) = filter.piece_type {
                        if pt != member.piece_type() {
                            continue;
                        }
                    }
                    for (kind, to) in destinations(&ctx, origin, member) {
                        candidates.push(Move::DeployStep { from: origin, piece_type: member.piece_type(), kind, to });
                    }
                }
            }
        }

        candidates.retain(|mv| {
            let mut probe = self.board.clone();
            apply::is_legal(&mut probe, self.turn, mv)
        });
        candidates
    }

    fn legal_deploy(&self, session: &DeploySession, filter: MoveFilter) -> Vec<Move> {
        let ctx = apply::fresh_context(&self.board, &self.air_defense, self.turn);
        let mut candidates = Vec::new();

        if let Some(stack) = self.board.get(session.stack_square) {
            if filter.square.map(|s| s == session.stack_square).unwrap_or(true) {
                for member in stack.members() {
                    if !session.is_available(member.piece_type()) {
                        continue;
                    }
                    if let Some(pt) = filter.piece_type {
                        if pt != member.piece_type() {
                            continue;
                        }
                    }
                    for (kind, to) in destinations(&ctx, session.stack_square, member) {
                        candidates.push(Move::DeployStep {
                            from: session.stack_square,
                            piece_type: member.piece_type(),
                            kind,
                            to,
                        });
                    }
                }
                for dest in session.deployed_destinations() {
                    let Some(occupant) = self.board.get(dest) else { continue };
                    for member in stack.members() {
                        if !session.is_available(member.piece_type()) {
                            continue;
                        }
                        if let Some(pt) = filter.piece_type {
                            if pt != member.piece_type() {
                                continue;
                            }
                        }
                        if stack::is_compatible(occupant.piece_type(), member.piece_type()) {
                            candidates.push(Move::Recombine { from: session.stack_square, to: dest, piece_type: member.piece_type() });
                        }
                    }
                }
            }
        }

        // Commander emergency moves remain available even though their
        // origin differs from the session's stack square.
        if let Some(commander_sq) = self.board.commander_square(self.turn) {
            let matches_square = filter.square.map(|s| s == commander_sq).unwrap_or(true);
            let matches_type = filter.piece_type.map(|t| t == PieceType::Commander).unwrap_or(true);
            if matches_square && matches_type {
                if let Some(piece) = self.board.get(commander_sq) {
                    for (kind, to) in destinations(&ctx, commander_sq, piece) {
                        candidates.push(Move::Play { kind, from: commander_sq, to });
                    }
                }
            }
        }

        candidates.retain(|mv| {
            let mut probe = self.board.clone();
            apply::is_legal(&mut probe, self.turn, mv)
        });
        candidates
    }

    fn render_move_text(&self, mv: &Move) -> String {
        match *mv {
            Move::Play { kind, from, to } => {
                let letter = self.board.get(from).map(|p| p.piece_type().letter()).unwrap_or('?');
                if is_attacking_kind(kind) { format!("{letter}{from}x{to}") } else { format!("{letter}{from}{to}") }
            }
            Move::DeployStep { from, piece_type, kind, to } => {
                let letter = piece_type.letter();
                if is_attacking_kind(kind) { format!("{from}:{letter}x{to}") } else { format!("{from}:{letter}{to}") }
            }
            Move::Recombine { from, to, piece_type } => format!("{from}:{}@{to}", piece_type.letter()),
        }
    }

    /// Plays a move already produced by [`Game::legal`]. Returns `None`
    /// when `mv` is not currently legal.
    pub fn play_move(&mut self, mv: &Move) -> Option<MoveDescriptor> {
        if !self.legal(MoveFilter::default()).contains(mv) {
            return None;
        }
        match *mv {
            Move::Play { kind, from, to } => Some(self.play_normal_move(kind, from, to)),
            Move::DeployStep { from, piece_type, kind, to } => self.play_deploy_step(from, piece_type, kind, to),
            Move::Recombine { from, to, piece_type } => {
                if self.recombine(from, to, piece_type) {
                    Some(MoveDescriptor {
                        from,
                        to,
                        piece_type,
                        color: self.turn,
                        captured: None,
                        heroic_deltas: Vec::new(),
                        notation: format!("{from}:{}@{to}", piece_type.letter()),
                    })
                } else {
                    None
                }
            }
        }
    }

    /// Looks up a legal move by its [`Game::moves`] rendering and plays
    /// it — the crate's stand-in for spec §6's `move(move_or_san)`.
    pub fn play_san(&mut self, text: &str) -> Option<MoveDescriptor> {
        let mv = self.legal(MoveFilter::default()).into_iter().find(|mv| self.render_move_text(mv) == text)?;
        self.play_move(&mv)
    }

    fn play_normal_move(&mut self, kind: MoveKind, from: Square, to: Square) -> MoveDescriptor {
        let piece_type = self.board.get(from).expect("legal move origin must be occupied").piece_type();
        let pending = self.snapshot();
        let mv = Move::Play { kind, from, to };
        let outcome = apply::apply_move(&mut self.board, &mv).expect("legal move must apply cleanly");
        self.air_defense = AirDefenseMap::recompute_all(&self.board);
        let (_heroic_undo, heroic_deltas) = apply::promote_heroics(&mut self.board, &self.air_defense, self.turn);
        let reset_clock = outcome.captured.is_some() || !heroic_deltas.is_empty();
        let notation = self.render_move_text(&mv);
        let descriptor = MoveDescriptor {
            from,
            to,
            piece_type,
            color: self.turn,
            captured: outcome.captured,
            heroic_deltas,
            notation,
        };
        self.finish_turn(pending, descriptor.clone(), reset_clock);
        descriptor
    }

    fn play_deploy_step(&mut self, from: Square, piece_type: PieceType, kind: MoveKind, to: Square) -> Option<MoveDescriptor> {
        if self.deploy_session.is_none() {
            let original_piece = self.board.get(from)?.clone();
            self.pending_snapshot = Some(self.snapshot());
            self.deploy_clock_reset = false;
            self.deploy_session = Some(DeploySession::start(from, original_piece, self.fingerprint()));
        }
        let mv = Move::DeployStep { from, piece_type, kind, to };
        let outcome = apply::apply_move(&mut self.board, &mv).ok()?;
        self.air_defense = AirDefenseMap::recompute_all(&self.board);
        let (heroic_undo, heroic_deltas) = apply::promote_heroics(&mut self.board, &self.air_defense, self.turn);

        self.deploy_clock_reset = self.deploy_clock_reset || outcome.captured.is_some() || !heroic_deltas.is_empty();
        let captured = outcome.captured;
        let mut undo = outcome.undo;
        undo.extend(heroic_undo);
        let notation = self.render_move_text(&mv);

        let session = self.deploy_session.as_mut().unwrap();
        session.record_command(mv, undo);
        let fully_resolved = session.is_fully_resolved();

        let descriptor = MoveDescriptor { from, to, piece_type, color: self.turn, captured, heroic_deltas, notation };
        if fully_resolved {
            let _ = self.do_commit_deploy();
        }
        Some(descriptor)
    }

    // ---- Deploy API ----------------------------------------------------

    pub fn get_deploy_session(&self) -> Option<&DeploySession> {
        self.deploy_session.as_ref()
    }

    pub fn can_commit_deploy(&self) -> bool {
        self.deploy_session.is_some()
    }

    pub fn commit_deploy_session(&mut self) -> CommitOutcome {
        if self.deploy_session.is_none() {
            return CommitOutcome::failed("no active deploy session");
        }
        match self.do_commit_deploy() {
            Ok(_) => CommitOutcome::ok(),
            Err(e) => CommitOutcome::failed(e.to_string()),
        }
    }

    fn do_commit_deploy(&mut self) -> Result<MoveDescriptor> {
        let session = self
            .deploy_session
            .take()
            .ok_or_else(|| EngineError::SessionViolation("no active deploy session".into()))?;
        let pending = self
            .pending_snapshot
            .take()
            .expect("an active deploy session always has a pending snapshot");

        // Every piece not yet deployed is, by construction, still sitting
        // at `stack_square` exactly as `RemoveFromStack` left it after
        // each sub-move — the "implicit residue" of spec §4.6 requires no
        // extra action here. Only the deferred recombines still need
        // applying, in the order they were recorded.
        let mut recombines = session.recombine_instructions.clone();
        recombines.sort_by_key(|r| r.recorded_after);
        for instruction in recombines {
            let piece = self.detach_from_origin(session.stack_square, instruction.piece_type)?;
            self.merge_onto(instruction.to, piece)?;
        }

        self.air_defense = AirDefenseMap::recompute_all(&self.board);
        let (_heroic_undo, heroic_deltas) = apply::promote_heroics(&mut self.board, &self.air_defense, self.turn);
        let reset_clock = self.deploy_clock_reset || !heroic_deltas.is_empty();
        let notation = self.render_deploy_notation(&session);

        let descriptor = MoveDescriptor {
            from: session.stack_square,
            to: session.stack_square,
            piece_type: session.original_piece.piece_type(),
            color: session.original_piece.color(),
            captured: None,
            heroic_deltas,
            notation,
        };
        self.deploy_clock_reset = false;
        self.finish_turn(pending, descriptor.clone(), reset_clock);
        Ok(descriptor)
    }

    fn detach_from_origin(&mut self, origin: Square, piece_type: PieceType) -> Result<Piece> {
        let current = self
            .board
            .remove(origin)
            .ok_or_else(|| EngineError::SessionViolation(format!("nothing remains at {origin}")))?;
        match stack::remove_from_stack(&current, piece_type) {
            Ok((removed, remainder)) => {
                if let Some(rem) = remainder {
                    self.board.put(rem, origin);
                }
                Ok(removed)
            }
            Err(e) => {
                self.board.put(current, origin);
                Err(EngineError::SessionViolation(e.to_string()))
            }
        }
    }

    fn merge_onto(&mut self, square: Square, piece: Piece) -> Result<()> {
        let existing = self
            .board
            .remove(square)
            .ok_or_else(|| EngineError::SessionViolation(format!("no piece at {square} to recombine onto")))?;
        match stack::add_to_stack(&existing, piece) {
            Ok(combined) => {
                self.board.put(combined, square);
                Ok(())
            }
            Err(e) => {
                self.board.put(existing, square);
                Err(EngineError::SessionViolation(e.to_string()))
            }
        }
    }

    fn render_deploy_notation(&self, session: &DeploySession) -> String {
        let mut tokens: Vec<String> = Vec::new();
        for command in &session.commands {
            if let Move::DeployStep { piece_type, to, kind, .. } = command.mv {
                let sep = if is_attacking_kind(kind) { "x" } else { "" };
                tokens.push(format!("{}{sep}{to}", piece_type.letter()));
            }
        }
        for instruction in &session.recombine_instructions {
            tokens.push(format!("{}@{}", instruction.piece_type.letter(), instruction.to));
        }
        format!("{}:{}", session.stack_square, tokens.join(","))
    }

    /// Cancels the active session: undoes every applied sub-move (LIFO),
    /// restoring `original_piece`, and clears the session without
    /// touching history.
    pub fn cancel_deploy_session(&mut self) {
        if let Some(session) = self.deploy_session.take() {
            for command in session.commands.into_iter().rev() {
                command.undo.undo(&mut self.board);
            }
            self.air_defense = AirDefenseMap::recompute_all(&self.board);
        }
        self.pending_snapshot = None;
        self.deploy_clock_reset = false;
    }

    /// Unwinds every sub-move and pending recombine but keeps a session
    /// active at the same origin (distinct from `cancel`, which returns
    /// to `Inactive`) — lets a caller restart a deploy without losing
    /// their place in the user-visible move sequence.
    pub fn reset_deploy_session(&mut self) {
        if let Some(session) = self.deploy_session.take() {
            let origin = session.stack_square;
            let original_piece = session.original_piece.clone();
            let start_fingerprint = session.start_fingerprint.clone();
            for command in session.commands.into_iter().rev() {
                command.undo.undo(&mut self.board);
            }
            self.air_defense = AirDefenseMap::recompute_all(&self.board);
            self.deploy_clock_reset = false;
            self.deploy_session = Some(DeploySession::start(origin, original_piece, start_fingerprint));
        }
    }

    /// Records a deferred recombine instruction, auto-committing if it
    /// leaves the session fully resolved.
    pub fn recombine(&mut self, from: Square, to: Square, piece_type: PieceType) -> bool {
        let valid = match &self.deploy_session {
            Some(session) => {
                from == session.stack_square
                    && session.is_available(piece_type)
                    && session.deployed_destinations().contains(&to)
                    && self.board.get(to).map(|p| stack::is_compatible(p.piece_type(), piece_type)).unwrap_or(false)
            }
            None => false,
        };
        if !valid {
            return false;
        }
        let session = self.deploy_session.as_mut().unwrap();
        session.record_recombine(piece_type, to);
        if session.is_fully_resolved() {
            let _ = self.do_commit_deploy();
        }
        true
    }

    pub fn get_recombine_options(&self, square: Square) -> Vec<Square> {
        let Some(session) = &self.deploy_session else { return Vec::new() };
        if square != session.stack_square {
            return Vec::new();
        }
        session
            .deployed_destinations()
            .into_iter()
            .filter(|&dest| {
                self.board
                    .get(dest)
                    .map(|occupant| session.unclaimed_residue().iter().any(|p| stack::is_compatible(occupant.piece_type(), p.piece_type())))
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn undo_recombine_instruction(&mut self) -> bool {
        match &mut self.deploy_session {
            Some(session) => session.undo_last_recombine(),
            None => false,
        }
    }

    // ---- Undo / bookkeeping --------------------------------------------

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            board: self.board.clone(),
            turn: self.turn,
            half_move_clock: self.half_move_clock,
            move_number: self.move_number,
            position_counts: self.position_counts.clone(),
        }
    }

    fn fingerprint(&self) -> String {
        format!("{}|{}", fen::write_placement(&self.board), fen::color_field(self.turn))
    }

    fn finish_turn(&mut self, pending: StateSnapshot, descriptor: MoveDescriptor, reset_clock: bool) {
        if reset_clock {
            self.half_move_clock = 0;
        } else {
            self.half_move_clock += 1;
        }
        if self.turn == Color::Blue {
            self.move_number += 1;
        }
        self.turn = !self.turn;
        let fp = self.fingerprint();
        *self.position_counts.entry(fp).or_insert(0) += 1;
        self.history.push(HistoryEntry { snapshot: pending, descriptor });
    }

    /// Pops the last `HistoryEntry` and restores the full pre-move state,
    /// implicitly reverting an entire deploy session as one atomic step.
    pub fn undo(&mut self) -> Option<MoveDescriptor> {
        let entry = self.history.pop()?;
        self.board = entry.snapshot.board;
        self.turn = entry.snapshot.turn;
        self.half_move_clock = entry.snapshot.half_move_clock;
        self.move_number = entry.snapshot.move_number;
        self.position_counts = entry.snapshot.position_counts;
        self.air_defense = AirDefenseMap::recompute_all(&self.board);
        self.deploy_session = None;
        self.pending_snapshot = None;
        self.deploy_clock_reset = false;
        Some(entry.descriptor)
    }

    // ---- State queries --------------------------------------------------

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn move_number(&self) -> u32 {
        self.move_number
    }

    pub fn is_check(&self) -> bool {
        check::is_commander_attacked(&self.board, &self.air_defense, self.turn)
            || check::is_commander_exposed(&self.board, self.turn)
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_check() && self.legal(MoveFilter::default()).is_empty()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_check() && self.legal(MoveFilter::default()).is_empty()
    }

    pub fn is_draw_by_fifty_moves(&self) -> bool {
        self.half_move_clock >= 100
    }

    pub fn is_threefold_repetition(&self) -> bool {
        self.position_counts.get(&self.fingerprint()).copied().unwrap_or(0) >= 3
    }

    pub fn is_draw(&self) -> bool {
        self.is_stalemate() || self.is_draw_by_fifty_moves() || self.is_threefold_repetition()
    }

    pub fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw()
    }

    pub fn get_commander_square(&self, color: Color) -> Option<Square> {
        self.board.commander_square(color)
    }

    pub fn get_attackers(&self, square: Square, color: Color) -> Vec<check::Attacker> {
        check::get_attackers(&self.board, &self.air_defense, square, color)
    }
}

/// A best-effort, terrain-legal, mirrored starting layout. No authoritative
/// source for CoTuLenh's canonical opening array was available to this
/// implementation (see DESIGN.md); every piece placed here is legal for its
/// terrain and exactly one Commander exists per side, but the exact
/// arrangement is not verified against any reference game.
fn default_position(board: &mut Board) {
    use PieceType::*;

    let back_rank = [
        (File::FileA, Navy),
        (File::FileB, Navy),
        (File::FileC, Headquarters),
        (File::FileD, Tank),
        (File::FileE, Infantry),
        (File::FileF, Commander),
        (File::FileG, Infantry),
        (File::FileH, Tank),
        (File::FileI, Headquarters),
        (File::FileJ, Engineer),
        (File::FileK, Engineer),
    ];
    for &(file, piece_type) in &back_rank {
        board.put(Piece::new(piece_type, Color::Red), Square::new(file, Rank::Rank1));
        board.put(Piece::new(piece_type, Color::Blue), Square::new(file, Rank::Rank12));
    }

    let support_rank = [
        (File::FileC, AirForce),
        (File::FileD, Militia),
        (File::FileE, Artillery),
        (File::FileF, AntiAir),
        (File::FileG, Artillery),
        (File::FileH, Militia),
        (File::FileI, AirForce),
    ];
    for &(file, piece_type) in &support_rank {
        board.put(Piece::new(piece_type, Color::Red), Square::new(file, Rank::Rank2));
        board.put(Piece::new(piece_type, Color::Blue), Square::new(file, Rank::Rank11));
    }

    board.put(Piece::new(Missile, Color::Red), Square::new(File::FileF, Rank::Rank3));
    board.put(Piece::new(Missile, Color::Blue), Square::new(File::FileF, Rank::Rank10));
}
