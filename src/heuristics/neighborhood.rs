//! Neighborhoods of a schedule: every schedule one move away from a base.
//!
//! Three move families are available, plus a wrapper that walks any of them
//! in the opposite direction:
//!
//! - **Consecutive swap** (`cssn`): swap positions `(i, i + 1)`, `n - 1` neighbors.
//!
//! ```text
//! 1|2|3|4|5|6
//!      X->
//! 1|2|4|3|5|6
//! ```
//!
//! - **Reverse** (`rn`): reverse the subrange `[start, end)`, for `start`
//!   ascending and then `end` ascending from `start + 2` to `n`.
//!   `n (n - 1) / 2` neighbors.
//!
//! ```text
//! 1|2|3|4|5|6
//!    \|/
//!     X
//!    /|\
//! 1|4|3|2|5|6
//! ```
//!
//! - **Sliding reverse** (`srn{k}`): the same move restricted to windows of
//!   length `2..=k`; the window slides over every start position before it
//!   grows by one.
//! - **Backward** (`b` prefix): the same neighbor set, enumerated in the
//!   opposite order.
//!
//! A [`NeighborCursor`] owns one copy of the base schedule and moves from
//! one neighbor to the next by editing that buffer in place: a swap for the
//! consecutive family, a one- or two-element rotation of the reversed window
//! for the reverse families. Only when a window has to be reset is the
//! previous move undone and the next one applied, which costs the window
//! length, never a rebuild of the whole schedule.

use crate::error::{Result, SchedError};
use crate::solution::Schedule;
use std::fmt;
use std::str::FromStr;

/// The move family of a neighborhood, and the direction it is walked in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NeighborhoodKind {
    ConsecutiveSwap,
    Reverse,
    SlidingReverse { max_window: usize },
    /// Same neighbors as the wrapped kind, forward and backward swapped.
    Backward(Box<NeighborhoodKind>),
}

impl NeighborhoodKind {
    pub fn sliding(max_window: usize) -> Self {
        NeighborhoodKind::SlidingReverse { max_window }
    }

    /// Wrap `self` so it is enumerated from the other end.
    pub fn backward(self) -> Self {
        NeighborhoodKind::Backward(Box::new(self))
    }

    /// Whether the move family is walked from its last move to its first.
    fn walks_backward(&self) -> bool {
        match self {
            NeighborhoodKind::Backward(inner) => !inner.walks_backward(),
            _ => false,
        }
    }

    pub fn name(&self) -> String {
        match self {
            NeighborhoodKind::ConsecutiveSwap => "Consecutive swap".to_string(),
            NeighborhoodKind::Reverse => "Reverse".to_string(),
            NeighborhoodKind::SlidingReverse { max_window } => {
                format!("Sliding reverse<{}>", max_window)
            }
            NeighborhoodKind::Backward(inner) => format!("Backward {}", inner.name()),
        }
    }

    pub fn short_name(&self) -> String {
        match self {
            NeighborhoodKind::ConsecutiveSwap => "cssn".to_string(),
            NeighborhoodKind::Reverse => "rn".to_string(),
            NeighborhoodKind::SlidingReverse { max_window } => format!("srn{}", max_window),
            NeighborhoodKind::Backward(inner) => format!("b{}", inner.short_name()),
        }
    }
}

impl fmt::Display for NeighborhoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

impl FromStr for NeighborhoodKind {
    type Err = SchedError;

    /// Parse a short name: `cssn`, `rn`, `srn10`, optionally prefixed by `b`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "cssn" => Ok(NeighborhoodKind::ConsecutiveSwap),
            "rn" => Ok(NeighborhoodKind::Reverse),
            _ => {
                if let Some(k) = s.strip_prefix("srn") {
                    let max_window = k.parse().map_err(|_| {
                        SchedError::InvalidParameter(format!("invalid window size in '{}'", s))
                    })?;
                    Ok(NeighborhoodKind::SlidingReverse { max_window })
                } else if let Some(inner) = s.strip_prefix('b') {
                    Ok(inner.parse::<NeighborhoodKind>()?.backward())
                } else {
                    Err(SchedError::InvalidParameter(format!(
                        "unknown neighborhood '{}'",
                        s
                    )))
                }
            }
        }
    }
}

/// A single edit of a schedule.
///
/// Both moves are involutions: applying a move twice restores the buffer,
/// so the same call undoes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Swap positions `i` and `i + 1`.
    Swap(usize),
    /// Reverse positions `start..end`.
    Reverse { start: usize, end: usize },
}

impl Move {
    #[inline]
    pub fn apply(&self, schedule: &mut [usize]) {
        match *self {
            Move::Swap(i) => schedule.swap(i, i + 1),
            Move::Reverse { start, end } => schedule[start..end].reverse(),
        }
    }

    #[inline]
    pub fn undo(&self, schedule: &mut [usize]) {
        self.apply(schedule);
    }
}

/// Move family with the window size clamped to the job count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    ConsecutiveSwap,
    Reverse,
    SlidingReverse { k: usize },
}

impl Family {
    fn new(kind: &NeighborhoodKind, n: usize) -> Result<Self> {
        match kind {
            NeighborhoodKind::ConsecutiveSwap => Ok(Family::ConsecutiveSwap),
            NeighborhoodKind::Reverse => Ok(Family::Reverse),
            NeighborhoodKind::SlidingReverse { max_window } => {
                if *max_window < 2 {
                    return Err(SchedError::InvalidParameter(format!(
                        "sliding reverse window must be at least 2, got {}",
                        max_window
                    )));
                }
                Ok(Family::SlidingReverse {
                    k: (*max_window).min(n),
                })
            }
            NeighborhoodKind::Backward(inner) => Family::new(inner, n),
        }
    }

    fn size(&self, n: usize) -> usize {
        match *self {
            Family::ConsecutiveSwap => n - 1,
            Family::Reverse => n * (n - 1) / 2,
            Family::SlidingReverse { k } => n * (n - 1) / 2 - (n - k) * (n - k + 1) / 2,
        }
    }

    /// Move number `index` in forward order.
    fn move_at(&self, n: usize, mut index: usize) -> Move {
        match *self {
            Family::ConsecutiveSwap => Move::Swap(index),
            Family::Reverse => {
                // row `start` holds the ends start+2..=n
                let mut start = 0;
                while index >= n - 1 - start {
                    index -= n - 1 - start;
                    start += 1;
                }
                Move::Reverse {
                    start,
                    end: start + 2 + index,
                }
            }
            Family::SlidingReverse { .. } => {
                // row `len` holds the starts 0..=n-len
                let mut len = 2;
                while index >= n - len + 1 {
                    index -= n - len + 1;
                    len += 1;
                }
                Move::Reverse {
                    start: index,
                    end: index + len,
                }
            }
        }
    }

    /// Replace the applied move `mv` by its successor in forward order.
    ///
    /// Returns `None` and leaves `buf` equal to the base schedule when `mv`
    /// was the last move.
    fn step_forward(&self, buf: &mut [usize], mv: Move) -> Option<Move> {
        let n = buf.len();
        match (*self, mv) {
            (Family::ConsecutiveSwap, Move::Swap(i)) => {
                mv.undo(buf);
                if i + 2 < n {
                    let next = Move::Swap(i + 1);
                    next.apply(buf);
                    Some(next)
                } else {
                    None
                }
            }
            (Family::Reverse, Move::Reverse { start, end }) => {
                if end < n {
                    // grow the reversed window by the element on its right
                    buf[start..=end].rotate_right(1);
                    Some(Move::Reverse { start, end: end + 1 })
                } else {
                    mv.undo(buf);
                    if start + 3 <= n {
                        let next = Move::Reverse {
                            start: start + 1,
                            end: start + 3,
                        };
                        next.apply(buf);
                        Some(next)
                    } else {
                        None
                    }
                }
            }
            (Family::SlidingReverse { k }, Move::Reverse { start, end }) => {
                if end < n {
                    // slide the reversed window one position to the right
                    buf[start..=end].rotate_right(2);
                    Some(Move::Reverse {
                        start: start + 1,
                        end: end + 1,
                    })
                } else {
                    mv.undo(buf);
                    let len = end - start + 1;
                    if len <= k {
                        let next = Move::Reverse { start: 0, end: len };
                        next.apply(buf);
                        Some(next)
                    } else {
                        None
                    }
                }
            }
            _ => unreachable!("move does not belong to this family"),
        }
    }

    /// Replace the applied move `mv` by its predecessor in forward order.
    ///
    /// Returns `None` and leaves `buf` equal to the base schedule when `mv`
    /// was the first move.
    fn step_backward(&self, buf: &mut [usize], mv: Move) -> Option<Move> {
        let n = buf.len();
        match (*self, mv) {
            (Family::ConsecutiveSwap, Move::Swap(i)) => {
                mv.undo(buf);
                if i > 0 {
                    let prev = Move::Swap(i - 1);
                    prev.apply(buf);
                    Some(prev)
                } else {
                    None
                }
            }
            (Family::Reverse, Move::Reverse { start, end }) => {
                if end > start + 2 {
                    // shrink the reversed window, giving back its right element
                    buf[start..end].rotate_left(1);
                    Some(Move::Reverse { start, end: end - 1 })
                } else {
                    mv.undo(buf);
                    if start > 0 {
                        let prev = Move::Reverse { start: start - 1, end: n };
                        prev.apply(buf);
                        Some(prev)
                    } else {
                        None
                    }
                }
            }
            (Family::SlidingReverse { .. }, Move::Reverse { start, end }) => {
                if start > 0 {
                    // slide the reversed window one position to the left
                    buf[start - 1..end].rotate_left(2);
                    Some(Move::Reverse {
                        start: start - 1,
                        end: end - 1,
                    })
                } else {
                    mv.undo(buf);
                    let len = end - start;
                    if len > 2 {
                        let prev = Move::Reverse {
                            start: n - len + 1,
                            end: n,
                        };
                        prev.apply(buf);
                        Some(prev)
                    } else {
                        None
                    }
                }
            }
            _ => unreachable!("move does not belong to this family"),
        }
    }
}

/// All schedules one move away from a base schedule.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    kind: NeighborhoodKind,
    family: Family,
    reversed: bool,
    base: Schedule,
    size: usize,
}

impl Neighborhood {
    /// Build the neighborhood of `base`.
    ///
    /// Fails with [`SchedError::TooFewJobs`] when `base` has fewer than two
    /// jobs, since no move exists.
    pub fn new(kind: NeighborhoodKind, base: Schedule) -> Result<Self> {
        let n = base.len();
        if n < 2 {
            return Err(SchedError::TooFewJobs { jobs: n });
        }
        let family = Family::new(&kind, n)?;
        let reversed = kind.walks_backward();
        let size = family.size(n);
        Ok(Neighborhood {
            kind,
            family,
            reversed,
            base,
            size,
        })
    }

    pub fn kind(&self) -> &NeighborhoodKind {
        &self.kind
    }

    pub fn base(&self) -> &[usize] {
        &self.base
    }

    /// Exact number of neighbors.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Cursor on the first neighbor in iteration order.
    pub fn cursor(&self) -> NeighborCursor {
        NeighborCursor::new(self, self.reversed)
    }

    /// Cursor on the last neighbor; advancing it walks towards the first.
    pub fn cursor_rev(&self) -> NeighborCursor {
        NeighborCursor::new(self, !self.reversed)
    }

    /// Neighbor number `index` in iteration order, `None` past the end.
    pub fn at(&self, index: usize) -> Option<Schedule> {
        let mv = self.move_at(index)?;
        let mut schedule = self.base.clone();
        mv.apply(&mut schedule);
        Some(schedule)
    }

    /// Consume the neighborhood, turning its base into neighbor number `index`.
    pub fn into_neighbor(self, index: usize) -> Option<Schedule> {
        let mv = self.move_at(index)?;
        let mut schedule = self.base;
        mv.apply(&mut schedule);
        Some(schedule)
    }

    /// Move producing neighbor number `index` in iteration order.
    pub fn move_at(&self, index: usize) -> Option<Move> {
        if index >= self.size {
            return None;
        }
        let family_index = if self.reversed {
            self.size - 1 - index
        } else {
            index
        };
        Some(self.family.move_at(self.base.len(), family_index))
    }

    /// Owned neighbors in iteration order.
    pub fn iter(&self) -> Neighbors {
        Neighbors::new(self.cursor())
    }

    /// Owned neighbors in reverse iteration order.
    pub fn iter_rev(&self) -> Neighbors {
        Neighbors::new(self.cursor_rev())
    }
}

/// Resumable, randomly addressable walk over a neighborhood.
///
/// The cursor holds the current neighbor in its own buffer. Once it has
/// walked off either end it is exhausted: [`NeighborCursor::current`]
/// returns `None` until [`NeighborCursor::seek`] repositions it.
#[derive(Debug, Clone)]
pub struct NeighborCursor {
    family: Family,
    /// Walk the family from its last move to its first.
    reversed: bool,
    buf: Schedule,
    current: Option<Move>,
    /// Forward-order index of `current` within the family
    family_index: usize,
    size: usize,
}

impl NeighborCursor {
    fn new(neighborhood: &Neighborhood, reversed: bool) -> Self {
        let size = neighborhood.size;
        let family_index = if reversed { size - 1 } else { 0 };
        let mut buf = neighborhood.base.clone();
        let mv = neighborhood.family.move_at(buf.len(), family_index);
        mv.apply(&mut buf);
        NeighborCursor {
            family: neighborhood.family,
            reversed,
            buf,
            current: Some(mv),
            family_index,
            size,
        }
    }

    /// The current neighbor.
    #[inline]
    pub fn current(&self) -> Option<&[usize]> {
        self.current.map(|_| self.buf.as_slice())
    }

    pub fn current_move(&self) -> Option<Move> {
        self.current
    }

    /// Index of the current neighbor in this cursor's walking order.
    pub fn position(&self) -> Option<usize> {
        self.current.map(|_| {
            if self.reversed {
                self.size - 1 - self.family_index
            } else {
                self.family_index
            }
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Move to the next neighbor. Returns `false` once past the last one.
    pub fn advance(&mut self) -> bool {
        self.step(!self.reversed)
    }

    /// Move to the previous neighbor. Returns `false` once before the first one.
    pub fn go_back(&mut self) -> bool {
        self.step(self.reversed)
    }

    fn step(&mut self, family_forward: bool) -> bool {
        let Some(mv) = self.current else {
            return false;
        };
        self.current = if family_forward {
            self.family.step_forward(&mut self.buf, mv)
        } else {
            self.family.step_backward(&mut self.buf, mv)
        };
        match self.current {
            Some(_) if family_forward => self.family_index += 1,
            Some(_) => self.family_index -= 1,
            None => {}
        }
        self.current.is_some()
    }

    /// Jump to neighbor number `position` in this cursor's walking order.
    ///
    /// Costs the length of the undone and applied windows plus, for the
    /// reverse families, a walk over the range boundaries.
    pub fn seek(&mut self, position: usize) -> bool {
        if let Some(mv) = self.current.take() {
            mv.undo(&mut self.buf);
        }
        if position >= self.size {
            return false;
        }
        let family_index = if self.reversed {
            self.size - 1 - position
        } else {
            position
        };
        let mv = self.family.move_at(self.buf.len(), family_index);
        mv.apply(&mut self.buf);
        self.current = Some(mv);
        self.family_index = family_index;
        true
    }
}

/// Iterator over owned copies of the neighbors of a cursor.
#[derive(Debug, Clone)]
pub struct Neighbors {
    cursor: NeighborCursor,
    started: bool,
}

impl Neighbors {
    fn new(cursor: NeighborCursor) -> Self {
        Neighbors {
            cursor,
            started: false,
        }
    }
}

impl Iterator for Neighbors {
    type Item = Schedule;

    fn next(&mut self) -> Option<Schedule> {
        if self.started {
            self.cursor.advance();
        } else {
            self.started = true;
        }
        self.cursor.current().map(|s| s.to_vec())
    }
}
