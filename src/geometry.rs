// CrossMin - Rust library for point-set embedding optimisation
//            by straight-line crossing minimisation
// Copyright (C) 2024 - the CrossMin developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Geometric primitives for straight-line drawings.
//!
//! Everything operates on `f64` positions with the absolute tolerance
//! [`EPS`]. Comparisons inside the kernel are exact: every strategy scores
//! a drawing through this module, so tie behaviour must be identical no
//! matter who asks.

/// Absolute tolerance for endpoint coincidence tests.
pub const EPS: f64 = 1e-9;

/// A position in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Position {
        Position { x, y }
    }
}

/// Euclidean length of the vector `(dx, dy)`. NaN propagates.
pub fn len(dx: f64, dy: f64) -> f64 {
    (dx * dx + dy * dy).sqrt()
}

/// Euclidean distance between two positions.
pub fn dist(a: Position, b: Position) -> f64 {
    len(a.x - b.x, a.y - b.y)
}

/// Signum of twice the signed area of the triangle `abc`.
///
/// Returns -1, 0 or +1; collinear triples give exactly 0, as does NaN
/// input (which then fails every side-of-line test downstream).
pub fn orient(a: Position, b: Position, c: Position) -> f64 {
    let area = (b.x * c.y - c.x * b.y) + (c.x * a.y - a.x * c.y) + (a.x * b.y - b.x * a.y);
    if area > 0.0 {
        1.0
    } else if area < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// True iff `pos` lies on the segment from `start` to `end`.
pub fn on_segment(pos: Position, start: Position, end: Position) -> bool {
    // Check x interval
    if start.x < pos.x && end.x < pos.x {
        return false;
    }
    if start.x > pos.x && end.x > pos.x {
        return false;
    }

    // Check y interval
    if start.y < pos.y && end.y < pos.y {
        return false;
    }
    if start.y > pos.y && end.y > pos.y {
        return false;
    }

    // Vertical line case
    if start.x == pos.x {
        return end.x == pos.x;
    }

    // Horizontal line case
    if start.y == pos.y {
        return end.y == pos.y;
    }

    // Match the gradients
    (start.x - pos.x) * (end.y - pos.y) == (pos.x - end.x) * (pos.y - start.y)
}

/// Proper intersection test for the segments `a1-a2` and `b1-b2`.
pub fn do_cross(a1: Position, a2: Position, b1: Position, b2: Position) -> bool {
    // Check for coinciding vertices
    if (a1 == b1 && a2 == b2) || (a1 == b2 && a2 == b1) {
        return false;
    }

    // Check if b1 and b2 are on the same side of the line a1-a2
    let orient_abc = orient(a1, a2, b1);
    let orient_abd = orient(a1, a2, b2);
    if orient_abc == orient_abd {
        return false;
    }

    // Check if a1 and a2 are on the same side of the line b1-b2
    let orient_cda = orient(b1, b2, a1);
    let orient_cdb = orient(b1, b2, a2);
    if orient_cda == orient_cdb {
        return false;
    }

    true
}

/// Crossing contribution of one pair of drawn edges.
///
/// Ordinary crossings count 1. Degenerate incidences count `penalty`: an
/// endpoint resting on the other segment, or overlap continuing through a
/// shared endpoint. A pair forming the same undirected edge counts 0.
pub fn eval_segments(
    a_start: Position,
    a_end: Position,
    b_start: Position,
    b_end: Position,
    penalty: i64,
) -> i64 {
    if (a_start == b_start && a_end == b_end) || (a_start == b_end && a_end == b_start) {
        return 0;
    }

    // Do the segments share no common endpoint?
    if dist(a_start, b_start) > EPS
        && dist(a_end, b_end) > EPS
        && dist(a_start, b_end) > EPS
        && dist(a_end, b_start) > EPS
    {
        // Is an endpoint of one segment on the other, or vice versa?
        if on_segment(a_start, b_start, b_end)
            || on_segment(a_end, b_start, b_end)
            || on_segment(b_start, a_start, a_end)
            || on_segment(b_end, a_start, a_end)
        {
            return penalty;
        }

        // Do the segments intersect?
        if do_cross(a_start, a_end, b_start, b_end) {
            return 1;
        }
    } else {
        // Is the unshared endpoint of one segment on the other, or vice versa?
        if dist(a_start, b_start) < EPS
            && (on_segment(a_end, b_start, b_end) || on_segment(b_end, a_start, a_end))
        {
            return penalty;
        }

        if dist(a_end, b_start) < EPS
            && (on_segment(a_start, b_start, b_end) || on_segment(b_end, a_start, a_end))
        {
            return penalty;
        }

        if dist(a_start, b_end) < EPS
            && (on_segment(a_end, b_start, b_end) || on_segment(b_start, a_start, a_end))
        {
            return penalty;
        }

        if dist(a_end, b_end) < EPS
            && (on_segment(a_start, b_start, b_end) || on_segment(b_start, a_start, a_end))
        {
            return penalty;
        }
    }

    0
}
