//! Sequence of twists and marks with an undo/redo cursor.
//!
//! Nodes live in an arena and link to each other by index, forming a doubly
//! linked list. The cursor (`current`) is the index of the node just after
//! the cursor position, or [`NOT_CURRENT`] when the cursor is after the last
//! node.
//!
//! - Twists and rotations are called "moves". A rotation is a twist whose
//!   slice mask covers every slice.
//! - Marks are single characters that can be inserted between moves like
//!   bookmarks. There can be any number of marks between two moves.
//! - Macros are bracketed by [`MARK_MACRO_OPEN`] and [`MARK_MACRO_CLOSE`].

use std::fmt;
use std::str::FromStr;

use ndcube_puzzle::{Grip, Twist};

use crate::HistoryParseError;

/// Matches any mark when searching.
pub const MARK_ANY: char = '\0';
/// Start of a macro.
pub const MARK_MACRO_OPEN: char = '[';
/// End of a macro.
pub const MARK_MACRO_CLOSE: char = ']';
/// End of the scramble.
pub const MARK_SCRAMBLE_BOUNDARY: char = '|';
/// Start of setup moves.
pub const MARK_SETUP_MOVES: char = 'S';

/// Node index meaning "no node". As the cursor, it means the cursor is after
/// the last node.
pub const NOT_CURRENT: usize = usize::MAX;
const NONE: usize = NOT_CURRENT;

/// Number of nodes per line when serializing.
const NODES_PER_LINE: usize = 10;

/// Entry in a [`History`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HistoryNode {
    /// Twist or rotation.
    Move(Twist),
    /// Zero-width bookmark.
    Mark(char),
}
impl HistoryNode {
    fn as_move(self) -> Option<Twist> {
        match self {
            HistoryNode::Move(twist) => Some(twist),
            HistoryNode::Mark(_) => None,
        }
    }
    fn is_move(self) -> bool {
        matches!(self, HistoryNode::Move(_))
    }
    /// Returns whether the node is a mark matching `mark`, which may be
    /// [`MARK_ANY`].
    fn is_mark(self, mark: char) -> bool {
        match self {
            HistoryNode::Move(_) => false,
            HistoryNode::Mark(m) => mark == MARK_ANY || m == mark,
        }
    }
}
impl fmt::Display for HistoryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryNode::Move(twist) => {
                write!(f, "{},{},{}", twist.grip, twist.dir, twist.slice_mask)
            }
            HistoryNode::Mark(mark) => write!(f, "m{mark}"),
        }
    }
}

/// Settings for a [`History`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Whether to log the whole history at debug level after every change.
    pub debug: bool,
}

#[derive(Debug, Clone)]
struct Slot {
    node: HistoryNode,
    prev: usize,
    next: usize,
}

/// Sequence of moves and marks with an undo/redo cursor.
#[derive(Debug, Clone)]
pub struct History {
    config: HistoryConfig,
    edge_length: u32,

    slots: Vec<Slot>,
    free: Vec<usize>,

    first: usize,
    last: usize,
    current: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(crate::DEFAULT_LENGTH, HistoryConfig::default())
    }
}

/// Histories are equal if they have the same nodes and cursor position,
/// regardless of how their nodes are stored.
impl PartialEq for History {
    fn eq(&self, other: &Self) -> bool {
        self.edge_length == other.edge_length
            && self.position() == other.position()
            && self.iter().eq(other.iter())
    }
}
impl Eq for History {}

impl History {
    /// Constructs an empty history for a puzzle with the given edge length.
    pub fn new(edge_length: u32, config: HistoryConfig) -> Self {
        Self {
            config,
            edge_length,

            slots: vec![],
            free: vec![],

            first: NONE,
            last: NONE,
            current: NONE,
        }
    }

    /// Returns the edge length of the puzzle, which determines which slice
    /// masks are rotations.
    pub fn edge_length(&self) -> u32 {
        self.edge_length
    }

    fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }
    fn node(&self, index: usize) -> HistoryNode {
        self.slots[index].node
    }
    fn prev(&self, index: usize) -> usize {
        self.slots[index].prev
    }
    fn next(&self, index: usize) -> usize {
        self.slots[index].next
    }

    /// Returns the index of the node just before the cursor, or [`NONE`].
    fn previous_index(&self) -> usize {
        if self.current == NONE {
            self.last
        } else {
            self.prev(self.current)
        }
    }

    /// Iterates over node indices starting from `start` in one direction.
    fn walk(&self, start: usize, backwards: bool) -> impl '_ + Iterator<Item = usize> {
        std::iter::successors((start != NONE).then_some(start), move |&i| {
            let j = if backwards {
                self.prev(i)
            } else {
                self.next(i)
            };
            (j != NONE).then_some(j)
        })
    }

    /// Returns every node, in order.
    pub fn iter(&self) -> impl '_ + Iterator<Item = HistoryNode> {
        self.walk(self.first, false).map(|i| self.node(i))
    }
    /// Returns the number of nodes, including marks.
    pub fn len(&self) -> usize {
        self.walk(self.first, false).count()
    }
    /// Returns whether there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.first == NONE
    }
    /// Returns the index of the node after the cursor, or [`NOT_CURRENT`] if
    /// the cursor is at the end. The index is only meaningful until the next
    /// change to the history.
    pub fn current(&self) -> usize {
        self.current
    }
    /// Returns the node after the cursor, if any.
    pub fn current_node(&self) -> Option<HistoryNode> {
        (self.current != NONE).then(|| self.node(self.current))
    }
    /// Returns the number of nodes before the cursor.
    pub fn position(&self) -> usize {
        self.walk(self.previous_index(), true).count()
    }

    /// Returns every move before the cursor, in order.
    pub fn moves(&self) -> Vec<Twist> {
        self.walk(self.first, false)
            .take_while(|&i| i != self.current)
            .filter_map(|i| self.node(i).as_move())
            .collect()
    }

    /// Returns the nearest mark before the cursor.
    pub fn last_mark(&self) -> Option<char> {
        self.walk(self.previous_index(), true)
            .find_map(|i| match self.node(i) {
                HistoryNode::Mark(m) => Some(m),
                HistoryNode::Move(_) => None,
            })
    }
    /// Returns the nearest mark after the cursor.
    pub fn next_mark(&self) -> Option<char> {
        self.walk(self.current, false)
            .find_map(|i| match self.node(i) {
                HistoryNode::Mark(m) => Some(m),
                HistoryNode::Move(_) => None,
            })
    }

    /// Returns the moves between the nearest `mark` at or before the node
    /// after the cursor and the cursor, or `None` if there is no such mark.
    pub fn moves_from_mark(&self, mark: char) -> Option<Vec<Twist>> {
        let start = self.find_mark(mark, true);
        if start == NONE {
            return None;
        }
        Some(
            self.walk(self.next(start), false)
                .take_while(|&i| i != self.current)
                .filter_map(|i| self.node(i).as_move())
                .collect(),
        )
    }

    /// Removes a node from the list. Returns whether the cursor moved.
    fn delete_node(&mut self, index: usize) -> bool {
        if index == NONE {
            return false;
        }
        let Slot { prev, next, .. } = *self.slot(index);
        let cursor_moved = self.current == index;
        if cursor_moved {
            self.current = next;
        }

        if prev == NONE {
            assert_eq!(self.first, index, "history list is corrupt");
            self.first = next;
        } else {
            self.slots[prev].next = next;
        }
        if next == NONE {
            assert_eq!(self.last, index, "history list is corrupt");
            self.last = prev;
        } else {
            self.slots[next].prev = prev;
        }

        self.slots[index].prev = NONE;
        self.slots[index].next = NONE;
        self.free.push(index);
        cursor_moved
    }

    /// Inserts a node before `before`, or at the end if `before` is
    /// [`NONE`].
    fn insert_node(&mut self, before: usize, node: HistoryNode) {
        let prev = if before == NONE {
            self.last
        } else {
            self.prev(before)
        };
        let slot = Slot {
            node,
            prev,
            next: before,
        };
        let index = match self.free.pop() {
            Some(i) => {
                self.slots[i] = slot;
                i
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };

        if before == NONE {
            self.last = index;
        } else {
            self.slots[before].prev = index;
        }
        if prev == NONE {
            self.first = index;
        } else {
            self.slots[prev].next = index;
        }
    }

    fn changed(&self) {
        if self.config.debug {
            log::debug!("history: {self}");
        }
    }

    fn delete_last(&mut self) {
        self.delete_node(self.last);
    }

    /// Removes every node.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.first = NONE;
        self.last = NONE;
        self.current = NONE;
        self.changed();
    }
    /// Removes every node and changes the edge length.
    pub fn clear_with_edge_length(&mut self, edge_length: u32) {
        self.edge_length = edge_length;
        self.clear();
    }

    /// Inserts a move before the cursor.
    ///
    /// If the node just before the cursor is the inverse of this move, that
    /// node is removed instead, along with everything after the cursor.
    pub fn append(&mut self, mut twist: Twist) {
        if twist.slice_mask == 0 {
            twist.slice_mask = 1;
        }
        let prev = self.previous_index();
        let cancels = prev != NONE && self.node(prev) == HistoryNode::Move(twist.rev());
        if cancels {
            self.undo();
            self.truncate();
        } else {
            self.insert_node(self.current, HistoryNode::Move(twist));
            self.changed();
        }
    }
    /// Appends each move in order.
    pub fn append_all(&mut self, twists: impl IntoIterator<Item = Twist>) {
        for twist in twists {
            self.append(twist);
        }
    }

    /// Deletes the node after the cursor and everything after it.
    pub fn truncate(&mut self) {
        while self.current != NONE {
            self.delete_last();
        }
        self.changed();
    }

    /// Discards everything after the cursor and then appends a move, so that
    /// redo is impossible afterward.
    pub fn apply(&mut self, twist: Twist) {
        self.truncate();
        self.append(twist);
    }
    /// Applies each move in order.
    pub fn apply_all(&mut self, twists: impl IntoIterator<Item = Twist>) {
        for twist in twists {
            self.apply(twist);
        }
    }

    /// Returns whether a slice mask affects every slice of the puzzle.
    fn is_rotation(&self, slice_mask: i32) -> bool {
        (0..self.edge_length).all(|i| i < 32 && slice_mask & (1 << i) != 0)
    }

    /// Returns the number of twists before the cursor, not counting moves
    /// before the scramble boundary or rotations.
    pub fn count_twists(&self) -> usize {
        self.count_moves(true)
    }
    /// Returns the number of moves before the cursor, not counting moves
    /// before the scramble boundary.
    pub fn count_moves(&self, exclude_rotations: bool) -> usize {
        let mut count = 0;
        let mut hit_scramble_boundary = false;
        for i in self
            .walk(self.first, false)
            .take_while(|&i| i != self.current)
        {
            match self.node(i) {
                HistoryNode::Move(twist) => {
                    if !(exclude_rotations && self.is_rotation(twist.slice_mask)) {
                        count += 1;
                    }
                }
                HistoryNode::Mark(MARK_SCRAMBLE_BOUNDARY) if !hit_scramble_boundary => {
                    hit_scramble_boundary = true;
                    count = 0;
                }
                HistoryNode::Mark(_) => (),
            }
        }
        count
    }

    /// Moves the cursor before the first node.
    pub fn go_to_beginning(&mut self) {
        self.current = self.first;
        self.changed();
    }
    /// Moves the cursor after the last node.
    pub fn go_to_end(&mut self) {
        self.current = NONE;
        self.changed();
    }
    /// Moves the cursor back one node. Does nothing and returns `false` if
    /// the cursor is at the end.
    pub fn go_to_previous(&mut self) -> bool {
        if self.current == NONE {
            return false;
        }
        self.current = self.prev(self.current);
        self.changed();
        true
    }
    /// Moves the cursor forward one node. Returns `false` if the cursor is
    /// already at the end.
    pub fn go_to_next(&mut self) -> bool {
        if self.current == NONE {
            return false;
        }
        self.current = self.next(self.current);
        self.changed();
        true
    }

    /// Moves the cursor back past the nearest move, and returns the twist
    /// that undoes it.
    pub fn undo(&mut self) -> Option<Twist> {
        let index = self
            .walk(self.previous_index(), true)
            .find(|&i| self.node(i).is_move())?;
        self.current = index;
        self.changed();
        Some(self.node(index).as_move()?.rev())
    }

    /// Moves the cursor forward past the nearest move and any marks after
    /// it, and returns the move to redo.
    pub fn redo(&mut self) -> Option<Twist> {
        let index = self
            .walk(self.current, false)
            .find(|&i| self.node(i).is_move())?;
        let twist = self.node(index).as_move()?;
        let current = self
            .walk(self.next(index), false)
            .find(|&i| self.node(i).is_move())
            .unwrap_or(NONE);
        self.current = current;
        self.changed();
        Some(twist)
    }

    /// Returns whether there is a move before the cursor.
    pub fn has_previous_move(&self) -> bool {
        self.walk(self.previous_index(), true)
            .any(|i| self.node(i).is_move())
    }
    /// Returns whether there is a move after the cursor.
    pub fn has_next_move(&self) -> bool {
        self.walk(self.current, false)
            .any(|i| self.node(i).is_move())
    }

    /// Inserts a mark before the cursor.
    pub fn mark(&mut self, mark: char) {
        self.insert_node(self.current, HistoryNode::Mark(mark));
        self.changed();
    }

    /// Returns the nearest node matching `mark`, starting from the node after
    /// the cursor and searching in one direction.
    fn find_mark(&self, mark: char, backwards: bool) -> usize {
        let start = if self.current == NONE {
            self.last
        } else {
            self.current
        };
        self.walk(start, backwards)
            .find(|&i| self.node(i).is_mark(mark))
            .unwrap_or(NONE)
    }

    /// Deletes the nearest `mark` at or before the node after the cursor.
    /// Returns whether one was found.
    pub fn remove_last_mark(&mut self, mark: char) -> bool {
        let index = self.find_mark(mark, true);
        self.remove_mark_at(index)
    }
    /// Deletes the nearest `mark` at or after the node after the cursor.
    /// Returns whether one was found.
    pub fn remove_next_mark(&mut self, mark: char) -> bool {
        let index = self.find_mark(mark, false);
        self.remove_mark_at(index)
    }
    fn remove_mark_at(&mut self, index: usize) -> bool {
        if index == NONE {
            return false;
        }
        self.delete_node(index);
        self.changed();
        true
    }
    /// Deletes every `mark`, or every mark if `mark` is [`MARK_ANY`].
    pub fn remove_all_marks(&mut self, mark: char) {
        let marks = self
            .walk(self.first, false)
            .filter(|&i| self.node(i).is_mark(mark))
            .collect::<Vec<_>>();
        for index in marks {
            self.delete_node(index);
        }
        self.changed();
    }

    /// Returns whether the cursor is at `mark`: either the node after the
    /// cursor is that mark, or it is among the marks just before the cursor.
    pub fn at_mark(&self, mark: char) -> bool {
        if self.current_node().is_some_and(|node| node.is_mark(mark)) {
            return true;
        }
        self.walk(self.previous_index(), true)
            .map(|i| self.node(i))
            .take_while(|node| !node.is_move())
            .any(|node| node.is_mark(mark))
    }

    fn step_backwards_towards_mark(&mut self, mark: char) -> Option<Twist> {
        let found = self
            .walk(self.previous_index(), true)
            .any(|i| self.node(i).is_mark(mark));
        if found { self.undo() } else { None }
    }
    fn step_forwards_towards_mark(&mut self, mark: char) -> Option<Twist> {
        let found = self
            .walk(self.current, false)
            .any(|i| self.node(i).is_mark(mark));
        if found { self.redo() } else { None }
    }

    /// Undoes or redoes one move towards `mark`, and returns the twist to
    /// apply to the puzzle.
    ///
    /// Searches forward first if `forward_first` is set, and backward first
    /// otherwise. Being able to choose makes it useful to have multiple marks
    /// with the same character. Returns `None` if already at the mark or
    /// there is no such mark.
    pub fn step_towards_mark(&mut self, mark: char, forward_first: bool) -> Option<Twist> {
        if self.at_mark(mark) {
            return None;
        }
        if forward_first {
            self.step_forwards_towards_mark(mark)
                .or_else(|| self.step_backwards_towards_mark(mark))
        } else {
            self.step_backwards_towards_mark(mark)
                .or_else(|| self.step_forwards_towards_mark(mark))
        }
    }

    /// Undoes moves until the cursor is at the nearest `mark` before it, and
    /// returns the twists to apply to the puzzle. Returns `None` without
    /// changing anything if there is no such mark.
    pub fn undo_to_mark(&mut self, mark: char) -> Option<Vec<Twist>> {
        let has_mark = self
            .walk(self.previous_index(), true)
            .any(|i| self.node(i).is_mark(mark));
        has_mark.then(|| {
            let mut twists = vec![];
            while !self.at_mark(mark) {
                match self.undo() {
                    Some(twist) => twists.push(twist),
                    None => break,
                }
            }
            twists
        })
    }

    /// Reverses the order of the nodes and the direction of every move, so
    /// that the moves undo the original moves. Moves the cursor to the end.
    pub fn reverse(&mut self) {
        let nodes = self.iter().collect::<Vec<_>>();
        self.clear();
        for node in nodes.into_iter().rev() {
            let node = match node {
                HistoryNode::Move(twist) => HistoryNode::Move(twist.rev()),
                mark @ HistoryNode::Mark(_) => mark,
            };
            self.insert_node(NONE, node);
        }
        self.changed();
    }

    /// Would merge redundant moves into an equivalent shorter sequence.
    /// This is currently a no-op.
    pub fn compress(&mut self, _sweep_rotations_forward: bool) {}

    /// Returns whether the links between nodes are consistent.
    pub fn is_sane(&self) -> bool {
        if (self.first == NONE) != (self.last == NONE) {
            return false;
        }
        let mut found_current = self.current == NONE;
        let mut count = 0;
        let mut prev = NONE;
        let mut i = self.first;
        while i != NONE {
            count += 1;
            if count > self.slots.len() || self.prev(i) != prev {
                return false;
            }
            found_current |= i == self.current;
            prev = i;
            i = self.next(i);
        }
        prev == self.last && found_current && count + self.free.len() == self.slots.len()
    }

    /// Reads a serialized history, replacing the contents of this one.
    /// Returns the number of bytes read, through the terminating `.`.
    ///
    /// On failure the history is left empty.
    pub fn read(&mut self, s: &str) -> Result<usize, HistoryParseError> {
        self.clear();
        let result = self.read_nodes(s);
        if result.is_err() {
            self.clear();
        }
        self.changed();
        result
    }

    fn read_nodes(&mut self, s: &str) -> Result<usize, HistoryParseError> {
        let mut chars = s.char_indices().peekable();
        let mut current_position = None;
        let mut count = 0;

        let bytes_read = loop {
            let (offset, ch) = chars
                .by_ref()
                .find(|(_, c)| !c.is_whitespace())
                .ok_or(HistoryParseError::UnexpectedEnd)?;
            match ch {
                '.' => break offset + ch.len_utf8(),
                'm' => {
                    let (_, mark) = chars.next().ok_or(HistoryParseError::UnexpectedEnd)?;
                    self.insert_node(NONE, HistoryNode::Mark(mark));
                    count += 1;
                }
                'c' => current_position = Some(count),
                '0'..='9' => {
                    let mut fields = [0_i64; 3];
                    let mut field_offset = offset;
                    let mut text = ch.to_string();
                    for (i, field) in fields.iter_mut().enumerate() {
                        if i > 0 {
                            match chars.next() {
                                Some((_, ',')) => (),
                                Some((offset, ch)) => {
                                    return Err(HistoryParseError::UnexpectedChar { ch, offset });
                                }
                                None => return Err(HistoryParseError::UnexpectedEnd),
                            }
                            text.clear();
                            field_offset = chars.peek().map_or(s.len(), |&(o, _)| o);
                            if let Some((_, '-')) = chars.peek() {
                                text.push('-');
                                chars.next();
                            }
                        }
                        while let Some(&(_, c)) = chars.peek()
                            && c.is_ascii_digit()
                        {
                            text.push(c);
                            chars.next();
                        }
                        *field = text.parse().map_err(|_| HistoryParseError::BadNumber {
                            text: text.clone(),
                            offset: field_offset,
                        })?;
                    }
                    let [grip, dir, slice_mask] = fields;
                    let bad_number = |value: i64| HistoryParseError::BadNumber {
                        text: value.to_string(),
                        offset,
                    };
                    let twist = Twist {
                        grip: Grip(u32::try_from(grip).map_err(|_| bad_number(grip))?),
                        dir: i32::try_from(dir).map_err(|_| bad_number(dir))?,
                        slice_mask: match i32::try_from(slice_mask) {
                            Ok(0) => 1,
                            Ok(m) => m,
                            Err(_) => return Err(bad_number(slice_mask)),
                        },
                    };
                    self.insert_node(NONE, HistoryNode::Move(twist));
                    count += 1;
                }
                _ => return Err(HistoryParseError::UnexpectedChar { ch, offset }),
            }
        };

        if let Some(n) = current_position {
            let current = self.walk(self.first, false).nth(n).unwrap_or(NONE);
            self.current = current;
        }
        Ok(bytes_read)
    }
}

impl fmt::Display for History {
    /// Writes every node separated by spaces, with `c` before the node after
    /// the cursor and a line break after every 10 nodes, followed by `.`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        assert!(self.is_sane(), "history list is corrupt");
        for (n, i) in self.walk(self.first, false).enumerate() {
            if i == self.current {
                write!(f, "c ")?;
            }
            write!(f, "{}", self.node(i))?;
            if self.next(i) != NONE {
                if (n + 1) % NODES_PER_LINE == 0 {
                    writeln!(f)?;
                } else {
                    write!(f, " ")?;
                }
            }
        }
        write!(f, ".")
    }
}

impl FromStr for History {
    type Err = HistoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ret = History::default();
        ret.read(s)?;
        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::{CCW, CW};

    fn t(grip: u32, dir: i32, slice_mask: i32) -> Twist {
        Twist::new(Grip(grip), dir, slice_mask)
    }

    #[test]
    fn test_undo_redo_scenario() {
        let mut h = History::new(3, HistoryConfig::default());
        h.append(t(1, 1, -1));
        h.append(t(30, -1, 2));
        h.append(t(100, 1, 1));
        let original = h.moves();
        assert_eq!(original, [t(1, 1, -1), t(30, -1, 2), t(100, 1, 1)]);

        assert_eq!(h.undo(), Some(t(100, -1, 1)));
        assert_eq!(h.undo(), Some(t(30, 1, 2)));
        assert_eq!(h.undo(), Some(t(1, -1, -1)));
        assert_eq!(h.undo(), None);
        assert_eq!(h.moves(), []);

        assert_eq!(h.redo(), Some(t(1, 1, -1)));
        assert_eq!(h.redo(), Some(t(30, -1, 2)));
        assert_eq!(h.redo(), Some(t(100, 1, 1)));
        assert_eq!(h.redo(), None);
        assert_eq!(h.moves(), original);
        assert_eq!(h.current(), NOT_CURRENT);
    }

    #[test]
    fn test_serialization() {
        let mut h = History::new(3, HistoryConfig::default());
        h.append(t(1, 1, -1));
        h.mark(MARK_SCRAMBLE_BOUNDARY);
        h.append(t(30, -1, 2));
        h.append(t(100, 1, 0));
        assert_eq!(h.to_string(), "1,1,-1 m| 30,-1,2 100,1,1.");

        h.undo();
        assert_eq!(h.to_string(), "1,1,-1 m| 30,-1,2 c 100,1,1.");
        assert_eq!(h.to_string().parse::<History>(), Ok(h.clone()));

        let mut long = History::new(3, HistoryConfig::default());
        for i in 0..12 {
            long.append(t(i, 1, 1));
        }
        assert_eq!(
            long.to_string(),
            "0,1,1 1,1,1 2,1,1 3,1,1 4,1,1 5,1,1 6,1,1 7,1,1 8,1,1 9,1,1\n10,1,1 11,1,1.",
        );
    }

    #[test]
    fn test_read_errors() {
        let mut h = History::default();
        h.append(t(1, 1, 1));
        assert_eq!(h.read("1,1,1 2,1"), Err(HistoryParseError::UnexpectedEnd));
        assert!(h.is_empty());
        assert_eq!(
            h.read("1,1,1 x."),
            Err(HistoryParseError::UnexpectedChar { ch: 'x', offset: 6 }),
        );
        assert!(h.is_empty());
        assert!(matches!(
            h.read("1,,1."),
            Err(HistoryParseError::BadNumber { .. })
        ));
        assert!(matches!(
            h.read("99999999999,1,1."),
            Err(HistoryParseError::BadNumber { .. }),
        ));

        assert_eq!(h.read("  3,1,4 m[ c 5,-1,1 .trailing"), Ok(21));
        assert_eq!(h.len(), 3);
        assert_eq!(h.position(), 2);
        assert_eq!(h.current_node(), Some(HistoryNode::Move(t(5, -1, 1))));
    }

    #[test]
    fn test_append_cancels_inverse() {
        let mut h = History::default();
        h.append(t(4, CCW, 1));
        h.append(t(7, CCW, 2));
        h.append(t(7, CW, 2));
        assert_eq!(h.moves(), [t(4, CCW, 1)]);
        assert!(!h.has_next_move());

        // Slice mask 0 means 1.
        h.append(t(4, CW, 0));
        assert!(h.is_empty());

        // A mark in between prevents cancellation.
        h.append(t(4, CCW, 1));
        h.mark('x');
        h.append(t(4, CW, 1));
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn test_cancellation_forfeits_redo() {
        let mut h = History::default();
        h.append(t(1, CCW, 1));
        h.append(t(2, CCW, 1));
        h.undo();
        assert!(h.has_next_move());
        h.append(t(1, CW, 1));
        assert!(h.is_empty());
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn test_apply_truncates() {
        let mut h = History::default();
        h.apply_all([t(1, CCW, 1), t(2, CCW, 1), t(3, CCW, 1)]);
        h.undo();
        h.undo();
        h.apply(t(4, CCW, 1));
        assert_eq!(h.moves(), [t(1, CCW, 1), t(4, CCW, 1)]);
        assert!(!h.has_next_move());
    }

    #[test]
    fn test_marks() {
        let mut h = History::default();
        h.mark(MARK_SETUP_MOVES);
        assert!(h.at_mark(MARK_SETUP_MOVES));
        h.append(t(1, CCW, 1));
        h.append(t(2, CW, 1));
        assert!(!h.at_mark(MARK_SETUP_MOVES));
        assert_eq!(h.last_mark(), Some(MARK_SETUP_MOVES));
        assert_eq!(
            h.moves_from_mark(MARK_SETUP_MOVES),
            Some(vec![t(1, CCW, 1), t(2, CW, 1)])
        );
        assert_eq!(h.moves_from_mark(MARK_MACRO_OPEN), None);

        h.remove_all_marks(MARK_SETUP_MOVES);
        assert_eq!(
            h.iter().collect::<Vec<_>>(),
            [
                HistoryNode::Move(t(1, CCW, 1)),
                HistoryNode::Move(t(2, CW, 1))
            ],
        );
        h.go_to_beginning();
        for _ in 0..3 {
            assert!(!h.at_mark(MARK_SETUP_MOVES));
            h.go_to_next();
        }
    }

    #[test]
    fn test_remove_marks() {
        let mut h = History::default();
        h.mark('a');
        h.append(t(1, CCW, 1));
        h.mark('b');
        h.append(t(2, CCW, 1));
        h.mark('a');
        h.undo();
        assert_eq!(h.next_mark(), Some('a'));
        assert_eq!(h.last_mark(), Some('b'));

        assert!(h.remove_last_mark('a'));
        assert_eq!(h.to_string(), "1,1,1 mb c 2,1,1 ma.");
        assert!(h.remove_next_mark('a'));
        assert!(!h.remove_next_mark('a'));
        assert!(h.remove_last_mark(MARK_ANY));
        assert_eq!(h.to_string(), "1,1,1 c 2,1,1.");
    }

    #[test]
    fn test_step_towards_mark() {
        let mut h = History::default();
        h.append(t(1, CCW, 1));
        h.mark(MARK_MACRO_OPEN);
        h.append(t(2, CCW, 1));
        h.append(t(3, CCW, 1));
        h.mark(MARK_MACRO_CLOSE);

        assert!(h.at_mark(MARK_MACRO_CLOSE));
        assert_eq!(
            h.step_towards_mark(MARK_MACRO_OPEN, false),
            Some(t(3, CW, 1))
        );
        assert_eq!(
            h.step_towards_mark(MARK_MACRO_OPEN, false),
            Some(t(2, CW, 1))
        );
        assert_eq!(h.step_towards_mark(MARK_MACRO_OPEN, false), None);
        assert!(h.at_mark(MARK_MACRO_OPEN));
        assert_eq!(h.moves(), [t(1, CCW, 1)]);

        // The close mark is only ahead, so forward_first does not matter.
        assert_eq!(
            h.step_towards_mark(MARK_MACRO_CLOSE, false),
            Some(t(2, CCW, 1))
        );
        assert_eq!(
            h.step_towards_mark(MARK_MACRO_CLOSE, true),
            Some(t(3, CCW, 1))
        );
        assert_eq!(h.step_towards_mark(MARK_MACRO_CLOSE, true), None);
        assert_eq!(h.current(), NOT_CURRENT);
    }

    #[test]
    fn test_undo_to_mark() {
        let mut h = History::default();
        h.append(t(1, CCW, 1));
        h.mark(MARK_SCRAMBLE_BOUNDARY);
        h.append(t(2, CCW, 1));
        h.append(t(3, CW, 1));
        assert_eq!(h.undo_to_mark(MARK_SETUP_MOVES), None);
        assert_eq!(
            h.undo_to_mark(MARK_SCRAMBLE_BOUNDARY),
            Some(vec![t(3, CCW, 1), t(2, CW, 1)])
        );
        assert_eq!(h.moves(), [t(1, CCW, 1)]);
        assert_eq!(h.undo_to_mark(MARK_SCRAMBLE_BOUNDARY), Some(vec![]));
    }

    #[test]
    fn test_count_moves() {
        let mut h = History::new(3, HistoryConfig::default());
        h.append(t(1, CCW, 1));
        h.append(t(2, CCW, 1));
        h.mark(MARK_SCRAMBLE_BOUNDARY);
        h.append(t(3, CCW, 1));
        h.append(t(4, CCW, 0b111));
        h.append(t(5, CCW, -1));
        h.append(t(6, CCW, 0b011));
        assert_eq!(h.count_moves(false), 4);
        assert_eq!(h.count_twists(), 2);
        h.undo();
        assert_eq!(h.count_twists(), 1);
    }

    #[test]
    fn test_reverse() {
        let mut h = History::default();
        h.append(t(1, CCW, 1));
        h.mark('x');
        h.append(t(2, CW, 4));
        h.undo();
        h.reverse();
        assert_eq!(h.to_string(), "2,1,4 mx 1,-1,1.");
        h.reverse();
        assert_eq!(h.to_string(), "1,1,1 mx 2,-1,4.");
    }

    #[derive(Debug, Clone, proptest_derive::Arbitrary)]
    enum Op {
        Append(
            #[proptest(strategy = "0..4_u32")] u32,
            bool,
            #[proptest(strategy = "-1..4_i32")] i32,
        ),
        Apply(#[proptest(strategy = "0..4_u32")] u32, bool),
        Mark(#[proptest(strategy = "prop::sample::select(vec!['[', ']', '|', 'S', 'x'])")] char),
        Undo,
        Redo,
        GoToPrevious,
        GoToNext,
        StepTowardsMark(
            #[proptest(strategy = "prop::sample::select(vec!['[', ']', '|', 'S', 'x'])")] char,
            bool,
        ),
    }

    fn build(ops: &[Op]) -> History {
        let mut h = History::new(3, HistoryConfig::default());
        for op in ops {
            match *op {
                Op::Append(grip, ccw, mask) => h.append(t(grip, if ccw { CCW } else { CW }, mask)),
                Op::Apply(grip, ccw) => h.apply(t(grip, if ccw { CCW } else { CW }, 1)),
                Op::Mark(mark) => h.mark(mark),
                Op::Undo => {
                    h.undo();
                }
                Op::Redo => {
                    h.redo();
                }
                Op::GoToPrevious => {
                    h.go_to_previous();
                }
                Op::GoToNext => {
                    h.go_to_next();
                }
                Op::StepTowardsMark(mark, forward_first) => {
                    h.step_towards_mark(mark, forward_first);
                }
            }
            assert!(h.is_sane());
        }
        h
    }

    proptest! {
        #[test]
        fn proptest_history_roundtrip(ops in any::<Vec<Op>>()) {
            let h = build(&ops);
            let s = h.to_string();
            let parsed = s.parse::<History>();
            prop_assert_eq!(parsed.as_ref(), Ok(&h));
            prop_assert_eq!(parsed.map(|p| p.to_string()), Ok(s));
        }

        #[test]
        fn proptest_undo_redo_symmetry(ops in any::<Vec<Op>>(), n in 0..8_usize) {
            let mut h = build(&ops);
            let position = h.position();
            let moves = h.moves();

            let starts_on_mark = h.current_node().is_some_and(|node| !node.is_move());

            let undone = (0..n).filter_map(|_| h.undo()).count();
            for _ in 0..undone {
                prop_assert!(h.redo().is_some());
            }
            prop_assert_eq!(h.moves(), moves);
            // Redo also skips the marks after the move it redoes.
            if undone == 0 || !starts_on_mark {
                prop_assert_eq!(h.position(), position);
            }
        }

        #[test]
        fn proptest_step_towards_mark(
            ops in any::<Vec<Op>>(),
            mark in prop::sample::select(vec!['[', ']', '|', 'S', 'x']),
            forward_first in any::<bool>(),
        ) {
            let mut h = build(&ops);
            let has_mark = h.iter().any(|node| node.is_mark(mark));
            let mut moves = h.moves();

            let mut steps = 0;
            while let Some(twist) = h.step_towards_mark(mark, forward_first) {
                steps += 1;
                prop_assert!(steps <= h.len() + 1, "stepping towards a mark never stops");
                prop_assert!(h.is_sane());
                let now = h.moves();
                if now.len() < moves.len() {
                    prop_assert_eq!(moves.pop().map(Twist::rev), Some(twist));
                } else {
                    moves.push(twist);
                }
                prop_assert_eq!(&now, &moves);
            }

            if has_mark {
                prop_assert!(h.at_mark(mark) || !h.has_next_move());
            } else {
                prop_assert_eq!(steps, 0);
            }
        }
    }
}
