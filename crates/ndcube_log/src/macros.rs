//! Macros: recorded move sequences that can be replayed relative to a
//! different set of reference grips.
//!
//! A macro file starts with a `MagicCube4D 2` header line, followed by one
//! macro per line:
//!
//! ```text
//! @name@@{4,3,3} 3@(g 12 40 97) 12,1,1 40,-1,1.
//! ```

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use ndcube_math::prelude::*;
use ndcube_puzzle::{Grip, Prescription, PuzzleDescription, Twist};

use crate::{
    DEFAULT_LENGTH, History, HistoryConfig, HistoryNode, MACRO_FILE_VERSION, MAGIC_NUMBER,
    MacroError,
};

/// Number of reference grips that define the orientation of a macro.
pub const MAX_REFS: usize = 3;

/// Maximum difference between corresponding distances of the definition and
/// application reference points.
const REF_DISTANCE_TOLERANCE: Float = 0.01;

/// Recorded move sequence, relative to three reference grips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    /// Display name. May not contain `@`.
    pub name: String,
    /// Puzzle that the macro was recorded on, such as `{4,3,3} 3`.
    pub puzzle_string: String,
    /// Grips the macro was recorded relative to.
    pub refs: [Grip; MAX_REFS],
    /// Recorded moves.
    pub moves: History,
}

impl Macro {
    /// Constructs an empty macro.
    pub fn new(
        name: impl Into<String>,
        puzzle_string: impl Into<String>,
        refs: [Grip; MAX_REFS],
    ) -> Self {
        let puzzle_string = puzzle_string.into();
        let edge_length = edge_length_of_puzzle_string(&puzzle_string);
        Self {
            name: name.into(),
            puzzle_string,
            refs,
            moves: History::new(edge_length, HistoryConfig::default()),
        }
    }

    /// Returns the number of moves in the macro.
    pub fn num_moves(&self) -> usize {
        self.twists().count()
    }
    fn twists(&self) -> impl '_ + Iterator<Item = Twist> {
        self.moves.iter().filter_map(|node| match node {
            HistoryNode::Move(twist) => Some(twist),
            HistoryNode::Mark(_) => None,
        })
    }

    /// Records a move.
    pub fn add_move(&mut self, twist: Twist) {
        self.moves.apply(twist);
    }
    /// Removes the last move, and returns the twist that undoes it.
    pub fn remove_move(&mut self) -> Option<Twist> {
        let ret = self.moves.undo();
        self.moves.truncate();
        ret
    }

    /// Returns whether `candidate` can be the next reference grip after
    /// `refs`, which requires that the references so far plus the candidate
    /// pin down a unique orientation of the puzzle.
    pub fn is_valid_ref(puzzle: &PuzzleDescription, refs: &[Grip], candidate: Grip) -> bool {
        let eps = EPSILON;
        if refs.len() >= MAX_REFS || refs.contains(&candidate) {
            return false;
        }
        let (Ok(p), Ok(face)) = (
            ref_coords(puzzle, candidate),
            ref_face_coords(puzzle, candidate),
        ) else {
            return false;
        };
        let Ok(ref_points) = refs
            .iter()
            .map(|&r| ref_coords(puzzle, r))
            .collect::<Result<Vec<_>, _>>()
        else {
            return false;
        };

        let Some(&first) = refs.first() else {
            // The first grip must not be the center of its face.
            return !face.approx_eq(&p, eps);
        };
        let Ok(face0) = ref_face_coords(puzzle, first) else {
            return false;
        };
        if face0.approx_eq(&p, eps) {
            return false;
        }
        if ref_points.iter().any(|r| is_colinear(&face0, r, &p)) {
            return false;
        }
        if let [r0, r1] = ref_points.as_slice() {
            if is_colinear(r0, r1, &p) {
                return false;
            }
            if puzzle.ndim() >= 4 {
                let det = Matrix::from_cols([&face0, r0, r1, &p]).determinant();
                if det.abs() < eps {
                    return false;
                }
            }
        }
        true
    }

    /// Returns the macro's twists transformed to apply relative to
    /// `app_refs` instead of the grips the macro was recorded with.
    ///
    /// The transformation is the one taking each definition reference grip
    /// (plus the center of the first one's face) to the corresponding
    /// application one. If it is a reflection, the sequence is reversed and
    /// every twist inverted, so that the result is still a valid macro for
    /// the mirrored references.
    pub fn get_twists(
        &self,
        app_refs: &[Grip; MAX_REFS],
        puzzle: &PuzzleDescription,
    ) -> Result<Vec<Twist>, MacroError> {
        let def_points = tie_points(puzzle, &self.refs)?;
        let app_points = tie_points(puzzle, app_refs)?;

        let mismatch = |a: Float, b: Float| (a - b).abs() >= REF_DISTANCE_TOLERANCE;
        for (d, a) in std::iter::zip(&def_points, &app_points) {
            if mismatch(d.mag(), a.mag()) {
                return Err(MacroError::ReferenceMismatch);
            }
        }
        for (i, j) in (0..def_points.len()).tuple_combinations() {
            let d = (&def_points[j] - &def_points[i]).mag();
            let a = (&app_points[j] - &app_points[i]).mag();
            if mismatch(d, a) {
                return Err(MacroError::ReferenceMismatch);
            }
        }

        let transform = transform_between(puzzle.ndim(), &def_points, &app_points)?;

        let mut twists = self
            .twists()
            .map(|twist| -> Result<Twist, MacroError> {
                let center = &puzzle
                    .grips()
                    .get(twist.grip)
                    .map_err(|_| MacroError::BadReference(twist.grip.0))?
                    .center;
                let grip = puzzle
                    .nearest_grip(&transform * center)
                    .ok_or(MacroError::ReferenceMismatch)?;
                Ok(Twist { grip, ..twist })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if transform.determinant() < 0.0 {
            log::debug!("macro {:?} applied to mirrored references", self.name);
            twists.reverse();
            for twist in &mut twists {
                *twist = twist.rev();
            }
        }
        Ok(twists)
    }

    /// Reads one macro from the start of `s`, skipping leading whitespace.
    /// Returns the macro and the number of bytes read.
    pub fn read(s: &str) -> Result<(Self, usize), MacroError> {
        let mut p = MacroParser { s, pos: 0 };
        p.skip_whitespace();
        let name = p.delimited('@', "expected '@' before name")?;
        let puzzle_string = p.delimited('@', "expected '@' before puzzle")?;
        p.expect('(', "expected '(' before references")?;
        match p.bump() {
            Some('g') => (),
            Some('s') => return Err(p.malformed("sticker-based macros are not supported")),
            _ => return Err(p.malformed("expected 'g'")),
        }
        let mut refs = [Grip(0); MAX_REFS];
        for r in &mut refs {
            p.skip_whitespace();
            *r = Grip(p.number()?);
        }
        p.skip_whitespace();
        p.expect(')', "expected ')' after references")?;

        let mut ret = Self::new(name, puzzle_string, refs);
        let len = ret
            .moves
            .read(&s[p.pos..])
            .map_err(|error| MacroError::History {
                name: ret.name.clone(),
                error,
            })?;
        Ok((ret, p.pos + len))
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            name,
            puzzle_string,
            refs,
            moves,
        } = self;
        write!(
            f,
            "@{name}@@{puzzle_string}@(g {}) {moves}",
            refs.iter().join(" ")
        )
    }
}

/// Contents of a macro file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MacroFile {
    /// Macros, in the order they were defined.
    pub macros: Vec<Macro>,
}

impl MacroFile {
    /// Returns the macros recorded on a puzzle.
    pub fn macros_for_puzzle<'a>(
        &'a self,
        puzzle_string: &'a str,
    ) -> impl 'a + Iterator<Item = &'a Macro> {
        self.macros
            .iter()
            .filter(move |m| m.puzzle_string == puzzle_string)
    }
}

impl fmt::Display for MacroFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{MAGIC_NUMBER} {MACRO_FILE_VERSION}")?;
        for m in &self.macros {
            writeln!(f, "{m}")?;
        }
        Ok(())
    }
}

impl FromStr for MacroFile {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start();
        let (header, mut rest) = s.split_once('\n').unwrap_or((s, ""));
        if header.trim().is_empty() {
            return Err(MacroError::Empty);
        }
        let &[magic, version] = header.split_whitespace().collect_vec().as_slice() else {
            return Err(MacroError::BadHeader(header.trim().to_owned()));
        };
        if magic != MAGIC_NUMBER {
            return Err(MacroError::BadHeader(header.trim().to_owned()));
        }
        if version.parse::<u32>().ok() != Some(MACRO_FILE_VERSION) {
            return Err(MacroError::UnsupportedVersion(version.to_owned()));
        }

        let mut macros = vec![];
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            let offset = s.len() - rest.len();
            let (m, len) = Macro::read(rest).map_err(|e| match e {
                MacroError::Malformed { offset: o, reason } => MacroError::Malformed {
                    offset: offset + o,
                    reason,
                },
                e => e,
            })?;
            macros.push(m);
            rest = &rest[len..];
        }
        log::debug!("read {} macros", macros.len());
        Ok(Self { macros })
    }
}

fn edge_length_of_puzzle_string(puzzle_string: &str) -> u32 {
    puzzle_string
        .parse::<Prescription>()
        .map_or(DEFAULT_LENGTH, |p| p.int_length)
}

fn ref_coords(puzzle: &PuzzleDescription, grip: Grip) -> Result<Vector, MacroError> {
    match puzzle.grips().get(grip) {
        Ok(info) => Ok(info.center.clone()),
        Err(_) => Err(MacroError::BadReference(grip.0)),
    }
}
fn ref_face_coords(puzzle: &PuzzleDescription, grip: Grip) -> Result<Vector, MacroError> {
    match puzzle.grips().get(grip) {
        Ok(info) => Ok(puzzle.faces()[info.face].center.clone()),
        Err(_) => Err(MacroError::BadReference(grip.0)),
    }
}

/// Returns the three reference grip centers followed by the center of the
/// first one's face.
fn tie_points(
    puzzle: &PuzzleDescription,
    refs: &[Grip; MAX_REFS],
) -> Result<Vec<Vector>, MacroError> {
    let mut ret = refs
        .iter()
        .map(|&r| ref_coords(puzzle, r))
        .collect::<Result<Vec<_>, _>>()?;
    ret.push(ref_face_coords(puzzle, refs[0])?);
    Ok(ret)
}

/// Returns the linear transformation taking each of `from` to the
/// corresponding point of `to`, using whichever `ndim` of the points are most
/// independent.
fn transform_between(ndim: u8, from: &[Vector], to: &[Vector]) -> Result<Matrix, MacroError> {
    let best = (0..from.len())
        .combinations(ndim as usize)
        .map(|indices| {
            let det = Matrix::from_cols(indices.iter().map(|&i| &from[i])).determinant();
            (indices, det.abs())
        })
        .max_by(|(_, a), (_, b)| a.total_cmp(b));
    let Some((indices, det)) = best else {
        return Err(MacroError::ReferenceMismatch);
    };
    if det < EPSILON {
        return Err(MacroError::ReferenceMismatch);
    }

    let pick = |points: &[Vector]| indices.iter().map(|&i| points[i].pad(ndim)).collect_vec();
    let transform =
        Matrix::from_tie_points(&pick(from), &pick(to)).ok_or(MacroError::ReferenceMismatch)?;

    for (f, t) in std::iter::zip(from, to) {
        if !(&transform * f).approx_eq(t, REF_DISTANCE_TOLERANCE) {
            return Err(MacroError::ReferenceMismatch);
        }
    }
    Ok(transform)
}

fn is_colinear(p1: &Vector, p2: &Vector, p3: &Vector) -> bool {
    let (Some(v1), Some(v2)) = ((p2 - p1).normalize(), (p3 - p1).normalize()) else {
        return true;
    };
    let angle = v1.dot(&v2).clamp(-1.0, 1.0).acos();
    angle.abs() < EPSILON || (std::f64::consts::PI - angle).abs() < EPSILON
}

struct MacroParser<'a> {
    s: &'a str,
    pos: usize,
}
impl MacroParser<'_> {
    fn peek(&self) -> Option<char> {
        self.s[self.pos..].chars().next()
    }
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }
    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }
    }
    fn malformed(&self, reason: &'static str) -> MacroError {
        MacroError::Malformed {
            offset: self.pos,
            reason,
        }
    }
    fn expect(&mut self, c: char, reason: &'static str) -> Result<(), MacroError> {
        match self.peek() {
            Some(next) if next == c => {
                self.bump();
                Ok(())
            }
            _ => Err(self.malformed(reason)),
        }
    }
    /// Reads text between two `delim` characters.
    fn delimited(&mut self, delim: char, reason: &'static str) -> Result<String, MacroError> {
        self.expect(delim, reason)?;
        let start = self.pos;
        let len = self.s[start..]
            .find(delim)
            .ok_or_else(|| self.malformed("unterminated string"))?;
        self.pos += len + delim.len_utf8();
        Ok(self.s[start..start + len].to_owned())
    }
    fn number(&mut self) -> Result<u32, MacroError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        self.s[start..self.pos]
            .parse()
            .map_err(|_| MacroError::Malformed {
                offset: start,
                reason: "expected reference grip number",
            })
    }
}
