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

//! Precomputed per-square, per-direction rays. Sliding pieces (Tank,
//! Engineer, Artillery, Missile, Navy, AirForce, the Commander's
//! flying-general capture) all walk an ordered ray of squares outward
//! from their origin until the board edge; this table generalizes the
//! teacher's per-square `ALL_LINES`/`HORIZONTALS`/`DIAGONALS` statics to
//! arbitrary, bounded-or-unbounded ray walks.

use once_cell::sync::Lazy;

use crate::square::{Direction, Square, SQUARES};

fn direction_index(dir: Direction) -> usize {
    Direction::all().position(|d| d == dir).expect("exhaustive Direction enum")
}

/// `RAYS[square][direction]` is the ordered list of squares starting
/// adjacent to `square` and walking outward in `direction` until the
/// board edge.
static RAYS: Lazy<Vec<[Vec<Square>; 8]>> = Lazy::new(|| {
    let mut table: Vec<[Vec<Square>; 8]> = Vec::with_capacity(SQUARES);
    for origin in Square::iter_all() {
        let mut dirs: [Vec<Square>; 8] = Default::default();
        for dir in Direction::all() {
            let mut ray = Vec::new();
            let mut cur = origin;
            while let Some(next) = cur + dir {
                ray.push(next);
                cur = next;
            }
            dirs[direction_index(dir)] = ray;
        }
        table.push(dirs);
    }
    table
});

pub fn ray(origin: Square, dir: Direction) -> &'static [Square] {
    &RAYS[origin.to_index()][direction_index(dir)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::File::*;
    use crate::square::Rank::*;

    #[test]
    fn ray_stops_at_board_edge() {
        let corner = Square::new(FileA, Rank1);
        let up = ray(corner, Direction::Up);
        assert_eq!(up.len(), 11);
        let left = ray(corner, Direction::Left);
        assert!(left.is_empty());
    }
}
