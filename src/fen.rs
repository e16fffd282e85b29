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

//! Textual position serialization (spec §4.8): the six-field FEN-style
//! line, stack/heroic syntax, and the extended `DEPLOY` suffix for an
//! active deploy session. Parsing tolerates the suffix's absence and
//! rebuilds the session when it is present.

use crate::board::Board;
use crate::error::{EngineError, Result};
use crate::material::{Color, Piece, PieceType};
use crate::square::{File, Rank, Square, FILES, RANKS};

/// Renders the piece-placement field: twelve `/`-separated rows, rank 12
/// down to rank 1, empty runs as decimal digits, a stack as
/// `(carrier carried...)` with no separators, heroic pieces `+`-prefixed.
pub fn write_placement(board: &Board) -> String {
    let mut rows = Vec::with_capacity(RANKS);
    for rank_idx in (0..RANKS).rev() {
        let rank = Rank::from_index(rank_idx);
        let mut row = String::new();
        let mut empty_run = 0usize;
        for file_idx in 0..FILES {
            let square = Square::new(File::from_index(file_idx), rank);
            match board.get(square) {
                None => empty_run += 1,
                Some(piece) => {
                    if empty_run > 0 {
                        row.push_str(&empty_run.to_string());
                        empty_run = 0;
                    }
                    write_piece(&mut row, piece);
                }
            }
        }
        if empty_run > 0 {
            row.push_str(&empty_run.to_string());
        }
        rows.push(row);
    }
    rows.join("/")
}

fn write_piece(out: &mut String, piece: &Piece) {
    if piece.is_heroic() {
        out.push('+');
    }
    out.push(piece.letter());
    if piece.is_stack() {
        out.push('(');
        for carried in piece.carrying() {
            write_piece(out, carried);
        }
        out.push(')');
    }
}

/// Parses the piece-placement field into a fresh [`Board`].
pub fn parse_placement(field: &str) -> Result<Board> {
    let rows: Vec<&str> = field.split('/').collect();
    if rows.len() != RANKS {
        return Err(EngineError::InvalidInput(format!(
            "expected {RANKS} ranks, found {}",
            rows.len()
        )));
    }
    let mut board = Board::empty();
    for (row_idx, row) in rows.iter().enumerate() {
        let rank = Rank::from_index(RANKS - 1 - row_idx);
        let mut file_idx = 0usize;
        let mut chars = row.chars().peekable();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                let mut digits = String::new();
                while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                    digits.push(chars.next().unwrap());
                }
                file_idx += digits.parse::<usize>().map_err(|_| {
                    EngineError::InvalidInput(format!("bad empty-run digits {digits:?}"))
                })?;
                continue;
            }
            if file_idx >= FILES {
                return Err(EngineError::InvalidInput("rank overflows board width".into()));
            }
            let square = Square::new(File::from_index(file_idx), rank);
            let piece = parse_piece(&mut chars)?;
            if !board.put(piece, square) {
                return Err(EngineError::IllegalState(format!("cannot place piece on {square}")));
            }
            file_idx += 1;
        }
    }
    Ok(board)
}

fn parse_piece(chars: &mut std::iter::Peekable<std::str::Chars>) -> Result<Piece> {
    let heroic = chars.next_if_eq(&'+').is_some();
    let letter = chars
        .next()
        .ok_or_else(|| EngineError::InvalidInput("expected a piece letter".into()))?;
    let piece_type = PieceType::try_from_letter(letter)
        .ok_or_else(|| EngineError::InvalidInput(format!("unknown piece letter {letter:?}")))?;
    let color = if letter.is_ascii_uppercase() { Color::Red } else { Color::Blue };
    let mut piece = Piece::new(piece_type, color);
    piece.set_heroic(heroic);
    if chars.next_if_eq(&'(').is_some() {
        while chars.peek() != Some(&')') {
            let carried = parse_piece(chars)?;
            piece.carrying_mut().push(carried);
        }
        chars.next();
    }
    Ok(piece)
}

pub fn color_field(color: Color) -> &'static str {
    match color {
        Color::Red => "r",
        Color::Blue => "b",
    }
}

pub fn parse_color_field(field: &str) -> Result<Color> {
    match field {
        "r" => Ok(Color::Red),
        "b" => Ok(Color::Blue),
        other => Err(EngineError::InvalidInput(format!("unknown active color {other:?}"))),
    }
}

/// The extended `DEPLOY` suffix (spec §4.8): an active session's origin,
/// which of the original stack's members are still unclaimed, how many
/// sub-moves have run, and the squares a session's sub-moves have
/// touched so far (for a reader that wants to reconstruct the mid-session
/// board without replaying the session from scratch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySuffix {
    pub origin: Square,
    pub remaining_letters: String,
    pub move_count: u32,
    pub virtual_changes: Vec<(Square, Option<Piece>)>,
}

/// The six whitespace-separated fields plus the optional `DEPLOY` suffix.
#[derive(Debug, Clone)]
pub struct PositionFields {
    pub board: Board,
    pub turn: Color,
    pub half_move_clock: u32,
    pub move_number: u32,
    pub deploy: Option<DeploySuffix>,
}

/// Renders the full position line. Fields 3 and 4 (castling/en-passant
/// equivalents) are always `-`; CoTuLenh has neither concept, but the
/// slots are reserved per spec §4.8 so the line stays six-field-shaped.
pub fn write_fen(
    board: &Board,
    turn: Color,
    half_move_clock: u32,
    move_number: u32,
    deploy: Option<&DeploySuffix>,
) -> String {
    let mut line = format!(
        "{} {} - - {} {}",
        write_placement(board),
        color_field(turn),
        half_move_clock,
        move_number
    );
    if let Some(suffix) = deploy {
        line.push(' ');
        line.push_str(&write_deploy_suffix(suffix));
    }
    line
}

fn write_deploy_suffix(suffix: &DeploySuffix) -> String {
    let mut out = format!("DEPLOY {}:{}{}", suffix.origin, suffix.remaining_letters, suffix.move_count);
    if !suffix.virtual_changes.is_empty() {
        out.push(' ');
        let terms: Vec<String> = suffix
            .virtual_changes
            .iter()
            .map(|(sq, piece)| match piece {
                Some(p) => format!("{sq}={p}"),
                None => format!("{sq}=-"),
            })
            .collect();
        out.push_str(&terms.join(","));
    }
    out
}

/// Parses a full position line. Tolerates the `DEPLOY` suffix's absence;
/// when present, rebuilds its data so the caller can reconstruct the
/// session.
pub fn parse_fen(text: &str) -> Result<PositionFields> {
    let mut fields = text.split_whitespace();
    let placement = fields.next().ok_or_else(|| EngineError::InvalidInput("empty FEN".into()))?;
    let color = fields
        .next()
        .ok_or_else(|| EngineError::InvalidInput("missing active-color field".into()))?;
    fields.next(); // reserved castling-like field, always '-'
    fields.next(); // reserved en-passant-like field, always '-'
    let half_move_clock: u32 = fields
        .next()
        .ok_or_else(|| EngineError::InvalidInput("missing half-move clock".into()))?
        .parse()
        .map_err(|_| EngineError::InvalidInput("half-move clock is not a number".into()))?;
    let move_number: u32 = fields
        .next()
        .ok_or_else(|| EngineError::InvalidInput("missing move number".into()))?
        .parse()
        .map_err(|_| EngineError::InvalidInput("move number is not a number".into()))?;

    let board = parse_placement(placement)?;
    let turn = parse_color_field(color)?;

    let rest: Vec<&str> = fields.collect();
    let deploy = if rest.first() == Some(&"DEPLOY") {
        Some(parse_deploy_suffix(&rest[1..].join(" "))?)
    } else {
        None
    };

    Ok(PositionFields { board, turn, half_move_clock, move_number, deploy })
}

fn parse_deploy_suffix(rest: &str) -> Result<DeploySuffix> {
    let mut parts = rest.splitn(2, ' ');
    let head = parts.next().unwrap_or("");
    let tail = parts.next().unwrap_or("");

    let (origin_str, remainder) = head
        .split_once(':')
        .ok_or_else(|| EngineError::InvalidInput(format!("malformed DEPLOY head {head:?}")))?;
    let origin = Square::try_from_str(origin_str)
        .ok_or_else(|| EngineError::InvalidInput(format!("bad DEPLOY origin {origin_str:?}")))?;
    let digit_start = remainder.find(|c: char| c.is_ascii_digit()).unwrap_or(remainder.len());
    let remaining_letters = remainder[..digit_start].to_string();
    let move_count: u32 = remainder[digit_start..]
        .parse()
        .map_err(|_| EngineError::InvalidInput(format!("bad DEPLOY move count in {remainder:?}")))?;

    let mut virtual_changes = Vec::new();
    if !tail.is_empty() {
        for term in tail.split(',') {
            let (sq_str, value) = term
                .split_once('=')
                .ok_or_else(|| EngineError::InvalidInput(format!("malformed DEPLOY change {term:?}")))?;
            let sq = Square::try_from_str(sq_str)
                .ok_or_else(|| EngineError::InvalidInput(format!("bad DEPLOY change square {sq_str:?}")))?;
            let piece = if value == "-" {
                None
            } else {
                Some(parse_piece(&mut value.chars().peekable())?)
            };
            virtual_changes.push((sq, piece));
        }
    }

    Ok(DeploySuffix { origin, remaining_letters, move_count, virtual_changes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::PieceType::*;
    use crate::square::{File::*, Rank::*};
    use crate::stack;

    #[test]
    fn placement_round_trips_simple_position() {
        let mut board = Board::empty();
        board.put(Piece::new(Commander, Color::Red), Square::new(FileG, Rank1));
        board.put(Piece::new(Commander, Color::Blue), Square::new(FileG, Rank12));
        let text = write_placement(&board);
        let parsed = parse_placement(&text).unwrap();
        assert_eq!(write_placement(&parsed), text);
    }

    #[test]
    fn placement_round_trips_heroic_stack() {
        let mut board = Board::empty();
        let mut stack = stack::combine(&[Piece::new(Navy, Color::Red), Piece::new(Tank, Color::Red)]).unwrap();
        stack.set_heroic(true);
        board.put(stack, Square::new(FileC, Rank5));
        let text = write_placement(&board);
        assert!(text.contains("+N(T)"));
        let parsed = parse_placement(&text).unwrap();
        let roundtrip = parsed.get(Square::new(FileC, Rank5)).unwrap();
        assert!(roundtrip.is_heroic());
        assert_eq!(roundtrip.carrying().len(), 1);
    }

    #[test]
    fn empty_rank_is_digit_11() {
        let board = Board::empty();
        let text = write_placement(&board);
        assert!(text.split('/').all(|row| row == "11"));
    }

    #[test]
    fn full_fen_round_trips_without_deploy_suffix() {
        let mut board = Board::empty();
        board.put(Piece::new(Commander, Color::Red), Square::new(FileG, Rank1));
        board.put(Piece::new(Commander, Color::Blue), Square::new(FileG, Rank12));
        let line = write_fen(&board, Color::Red, 3, 17, None);
        let parsed = parse_fen(&line).unwrap();
        assert_eq!(parsed.turn, Color::Red);
        assert_eq!(parsed.half_move_clock, 3);
        assert_eq!(parsed.move_number, 17);
        assert!(parsed.deploy.is_none());
        assert_eq!(write_placement(&parsed.board), write_placement(&board));
    }

    #[test]
    fn deploy_suffix_round_trips_with_virtual_changes() {
        let suffix = DeploySuffix {
            origin: Square::new(FileC, Rank3),
            remaining_letters: "NT".to_string(),
            move_count: 1,
            virtual_changes: vec![
                (Square::new(FileC, Rank4), Some(Piece::new(AirForce, Color::Red))),
                (Square::new(FileC, Rank3), None),
            ],
        };
        let board = Board::empty();
        let line = write_fen(&board, Color::Red, 0, 1, Some(&suffix));
        let parsed = parse_fen(&line).unwrap();
        let parsed_suffix = parsed.deploy.unwrap();
        assert_eq!(parsed_suffix.origin, suffix.origin);
        assert_eq!(parsed_suffix.remaining_letters, "NT");
        assert_eq!(parsed_suffix.move_count, 1);
        assert_eq!(parsed_suffix.virtual_changes.len(), 2);
        assert_eq!(parsed_suffix.virtual_changes[0].1.as_ref().unwrap().piece_type(), AirForce);
        assert!(parsed_suffix.virtual_changes[1].1.is_none());
    }
}
