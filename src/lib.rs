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

//! CoTuLenh board-game engine core.
//!
//! An 11-file by 12-rank board with mixed land/water terrain, piece
//! stacks that carry other pieces, multi-step "deploy" sub-turns, and
//! heroic-promotion semantics. The engine represents a position,
//! generates every legal move (including deploy sequences and stack
//! recombinations), applies and reverses moves, detects check/mate/
//! stalemate/draws, and round-trips positions through a FEN-style
//! textual form.
//!
//! Some of the key abstractions include:
//!
//! * A `Square` is one of the 132 legal board positions, identified by
//!   a `File` (`a`..`k`) and `Rank` (`1`..`12`). A `Mask` is a 132-bit
//!   set of squares, combined with the usual `|`, `&`, `!` operators.
//!
//! * A `Piece` has a `PieceType`, a `Color`, a `heroic` flag, and an
//!   ordered list of pieces it `carrying`s — a "stack". `stack`
//!   enforces the carrier/carried compatibility table on every
//!   operation that produces one.
//!
//! * `AirDefenseMap` tracks, per color, which squares are covered by
//!   that side's AntiAir (and heroic Missile) influence zones; the
//!   move generator consults it when a Missile or AirForce tries to
//!   enter defended airspace.
//!
//! * `moves` generates pseudo-legal candidates per piece; `apply` turns
//!   one into board mutations via a small transactional executor and
//!   provides the re-entrant legality filter built on top of it;
//!   `check` answers attacker/exposure/mate queries.
//!
//! * `Game` is the public, single-threaded entry point: position I/O
//!   (`new`/`load`/`fen`/`put`/`remove`), the move API (`legal`/
//!   `moves`/`play_move`/`undo`), the deploy-session API (`recombine`/
//!   `commit_deploy_session`/`cancel_deploy_session`), and state
//!   queries (`is_check`/`is_checkmate`/`is_draw`/...). A `Game` owns
//!   an optional `DeploySession` for the multi-step sub-turn a stack
//!   deploy opens; committing or cancelling it appends at most one
//!   `HistoryEntry` to `undo`'s stack, never one per sub-move.

pub mod airdefense;
pub mod apply;
pub mod board;
pub mod check;
pub mod deploy;
pub mod error;
pub mod fen;
pub mod game;
pub mod material;
pub mod moves;
pub mod rays;
pub mod square;
pub mod stack;

pub use airdefense::AirDefenseMap;
pub use board::Board;
pub use check::Attacker;
pub use deploy::DeploySession;
pub use error::{CommitOutcome, EngineError, Result};
pub use game::{Game, MoveDescriptor};
pub use material::{Color, Piece, PieceType};
pub use moves::{Move, MoveFilter, MoveKind};
pub use square::{Direction, File, Mask, Rank, Square, Terrain, FILES, RANKS, SQUARES};
