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

//! Error taxonomy (spec §7). `InvalidInput`/`IllegalState`/`IllegalMove`/
//! `SessionViolation` are the "expected failure" categories user-facing
//! calls convert to a return value; `InvariantFailure` is the one category
//! that propagates.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("illegal state: {0}")]
    IllegalState(String),
    #[error("illegal move: {0}")]
    IllegalMove(String),
    #[error("deploy session violation: {0}")]
    SessionViolation(String),
    #[error("internal invariant violated: {0}")]
    InvariantFailure(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Outcome of a deploy-session commit/cancel per spec §6's
/// `{success, error?}` contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl CommitOutcome {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }
    pub fn failed(msg: impl Into<String>) -> Self {
        Self { success: false, error: Some(msg.into()) }
    }
}
