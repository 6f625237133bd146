//! Shape notation: Schläfli symbols, Wythoff diagrams, products, and joins.
//!
//! ```text
//! symbol  := product ('v' product)*
//! product := factor (('x' | '*') factor)*
//! factor  := '{' [index (',' index)*] '}' | node (link node)*
//! index   := int ['/' int]
//! node    := '(' float ')'
//! link    := '-'* [int] '-'*
//! ```
//!
//! Whitespace between tokens is ignored. A link with no number is a `3`, so
//! `(1)---(1)-5-(0)` and `(1)3(1)5(0)` are the same diagram.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use ndcube_math::Float;

use crate::SchlafliError;

/// Single entry of a Schläfli symbol: `p` for a convex polygon or `p/q` for a
/// star polygon.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SchlafliIndex {
    /// Number of sides.
    pub p: usize,
    /// Number of times the polygon winds around its center.
    pub q: usize,
}
impl SchlafliIndex {
    /// Returns the angle between adjacent mirrors, as a fraction of a half
    /// turn.
    pub fn mirror_angle(self) -> Float {
        self.q as Float / self.p as Float
    }
}
impl fmt::Display for SchlafliIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.q {
            1 => write!(f, "{}", self.p),
            q => write!(f, "{}/{q}", self.p),
        }
    }
}
impl FromStr for SchlafliIndex {
    type Err = SchlafliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad_index = || SchlafliError::BadIndex(s.to_owned());
        let (p, q) = match s.split_once('/') {
            Some((p, q)) => (p.trim(), q.trim()),
            None => (s, "1"),
        };
        let p: usize = p.parse().map_err(|_| bad_index())?;
        let q: usize = q.parse().map_err(|_| bad_index())?;
        // `{5/3}` is `{5/2}` traced backwards, and `{6/2}` is a compound.
        if p < 3 || q == 0 || p <= 2 * q || gcd(p, q) != 1 {
            return Err(bad_index());
        }
        Ok(Self { p, q })
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Schläfli symbol for a single regular polytope, such as `{4,3,3}` or
/// `{5/2,5}`.
///
/// The empty symbol `{}` is a line segment.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct SchlafliFactor {
    indices: Vec<SchlafliIndex>,
}
impl SchlafliFactor {
    /// Constructs a Schläfli symbol for a convex polytope from its indices.
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self {
            indices: indices.into_iter().map(|p| SchlafliIndex { p, q: 1 }).collect(),
        }
    }
    /// Returns the indices of the symbol.
    pub fn indices(&self) -> &[SchlafliIndex] {
        &self.indices
    }
    /// Returns the number of dimensions of the polytope.
    pub fn ndim(&self) -> u8 {
        self.indices.len() as u8 + 1
    }
}
impl fmt::Display for SchlafliFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.indices.iter().join(","))
    }
}

/// Linear Coxeter-Dynkin diagram with a distance on each node, describing a
/// uniform polytope by Wythoff's construction.
///
/// The base vertex is `nodes[i]` away from mirror `i`, so mirror `i` produces
/// edges of length `2 * nodes[i]`. A link of `2` means the mirrors on either
/// side are perpendicular.
#[derive(Debug, Clone, PartialEq)]
pub struct WythoffDiagram {
    nodes: Vec<Float>,
    links: Vec<usize>,
}
impl WythoffDiagram {
    /// Returns the distance of the base vertex from each mirror.
    pub fn nodes(&self) -> &[Float] {
        &self.nodes
    }
    /// Returns the link between each pair of adjacent nodes.
    pub fn links(&self) -> &[usize] {
        &self.links
    }
    /// Returns the number of dimensions of the polytope.
    pub fn ndim(&self) -> u8 {
        self.nodes.len() as u8
    }

    /// Returns whether removing node `k` leaves every connected part of the
    /// diagram with a nonzero node. Only then does the mirror of node `k`
    /// bound a full-rank facet.
    pub fn is_facet_node(&self, k: usize) -> bool {
        components_after_removing(&self.links, Some(k))
            .all(|range| self.nodes[range].iter().any(|&x| x > 0.0))
    }
}
impl fmt::Display for WythoffDiagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", self.links[i - 1])?;
            }
            write!(f, "({node})")?;
        }
        Ok(())
    }
}

/// Returns the ranges of nodes that stay connected when links of `2` and the
/// node `removed` are taken out of a linear diagram.
pub(crate) fn components_after_removing(
    links: &[usize],
    removed: Option<usize>,
) -> impl Iterator<Item = std::ops::Range<usize>> {
    let node_count = links.len() + 1;
    let mut start = 0;
    let mut ret = vec![];
    for i in 0..node_count {
        if Some(i) == removed {
            if start < i {
                ret.push(start..i);
            }
            start = i + 1;
        } else if i + 1 == node_count || links[i] == 2 {
            ret.push(start..i + 1);
            start = i + 1;
        }
    }
    ret.into_iter()
}

/// Factor of a product: either a regular polytope or a Wythoff diagram.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeFactor {
    /// Schläfli symbol such as `{4,3}`.
    Regular(SchlafliFactor),
    /// Wythoff diagram such as `(1)3(1)4(0)`.
    Wythoff(WythoffDiagram),
}
impl ShapeFactor {
    /// Returns the number of dimensions of the factor.
    pub fn ndim(&self) -> u8 {
        match self {
            Self::Regular(f) => f.ndim(),
            Self::Wythoff(d) => d.ndim(),
        }
    }
}
impl fmt::Display for ShapeFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular(factor) => write!(f, "{factor}"),
            Self::Wythoff(diagram) => write!(f, "{diagram}"),
        }
    }
}

/// Join of products of shape factors, such as `{5}x{4}` or `{3}v{}`.
///
/// The original text is kept so that it can be shown exactly as the user
/// typed it.
#[derive(Debug, Clone, PartialEq)]
pub struct SchlafliProduct {
    operands: Vec<Vec<ShapeFactor>>,
    string: String,
}
impl SchlafliProduct {
    /// Returns the operands of the join, each of which is a product of
    /// factors. Symbols without `v` have a single operand.
    pub fn join_operands(&self) -> &[Vec<ShapeFactor>] {
        &self.operands
    }
    /// Returns every factor in every operand.
    pub fn factors(&self) -> impl Iterator<Item = &ShapeFactor> {
        self.operands.iter().flatten()
    }
    /// Returns the number of dimensions of the shape. Factors of a product add
    /// their dimensions, and each join adds one more.
    pub fn ndim(&self) -> usize {
        let factor_dims: usize = self.factors().map(|f| f.ndim() as usize).sum();
        factor_dims + self.operands.len() - 1
    }
    /// Returns the string that the shape was parsed from.
    pub fn as_str(&self) -> &str {
        &self.string
    }
    /// Returns the canonical form of the shape, with no whitespace.
    pub fn canonical(&self) -> String {
        self.operands
            .iter()
            .map(|product| product.iter().join("x"))
            .join("v")
    }
}
impl fmt::Display for SchlafliProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.string)
    }
}
impl FromStr for SchlafliProduct {
    type Err = SchlafliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let string = s.trim().to_owned();
        if string.is_empty() {
            return Err(SchlafliError::Empty);
        }

        let mut parser = Parser { rest: &string };
        let mut operands = vec![parser.product()?];
        while parser.eat('v') {
            operands.push(parser.product()?);
        }
        if !parser.rest.is_empty() {
            return Err(SchlafliError::TrailingInput(parser.rest.to_owned()));
        }

        Ok(Self { operands, string })
    }
}

/// Recursive descent parser over the unparsed remainder of the input, which
/// never starts with whitespace.
struct Parser<'a> {
    rest: &'a str,
}
impl<'a> Parser<'a> {
    fn advance(&mut self, byte_count: usize) -> &'a str {
        let (taken, rest) = self.rest.split_at(byte_count);
        self.rest = rest.trim_start();
        taken
    }
    fn eat(&mut self, c: char) -> bool {
        let ate = self.rest.starts_with(c);
        if ate {
            self.advance(c.len_utf8());
        }
        ate
    }
    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let len = self.rest.find(|c| !f(c)).unwrap_or(self.rest.len());
        self.advance(len)
    }

    fn product(&mut self) -> Result<Vec<ShapeFactor>, SchlafliError> {
        let mut factors = vec![self.factor()?];
        while self.eat('x') || self.eat('*') {
            factors.push(self.factor()?);
        }
        Ok(factors)
    }

    fn factor(&mut self) -> Result<ShapeFactor, SchlafliError> {
        match self.rest.chars().next() {
            Some('{') => self.regular().map(ShapeFactor::Regular),
            Some('(') => self.diagram().map(ShapeFactor::Wythoff),
            Some(c) if c.is_alphabetic() || c == '[' || c == '<' => {
                Err(SchlafliError::Unsupported(self.rest.to_owned()))
            }
            Some(_) => Err(SchlafliError::ExpectedFactor(self.rest.to_owned())),
            None => Err(SchlafliError::TrailingInput(String::new())),
        }
    }

    fn regular(&mut self) -> Result<SchlafliFactor, SchlafliError> {
        let rest = self.rest;
        let unclosed = || SchlafliError::UnclosedBrace(rest.to_owned());
        let end = rest.find('}').ok_or_else(unclosed)?;
        let inner = &rest[1..end];
        if inner.contains('{') {
            return Err(unclosed());
        }
        let indices = if inner.trim().is_empty() {
            vec![]
        } else {
            inner.split(',').map(str::parse::<SchlafliIndex>).try_collect()?
        };
        self.advance(end + 1);
        Ok(SchlafliFactor { indices })
    }

    fn diagram(&mut self) -> Result<WythoffDiagram, SchlafliError> {
        let start = self.rest;
        let mut nodes = vec![self.node()?];
        let mut links = vec![];
        loop {
            let before_link = self.rest;
            let dashes_before = self.take_while(|c| c == '-');
            let number = self.take_while(|c| c.is_ascii_digit());
            let dashes_after = self.take_while(|c| c == '-');
            if dashes_before.is_empty() && number.is_empty() && dashes_after.is_empty() {
                break;
            }
            let link_text = &before_link[..before_link.len() - self.rest.len()];
            let bad_link = || SchlafliError::BadLink(link_text.trim().to_owned());
            if !self.rest.starts_with('(') {
                return Err(bad_link());
            }
            let link = match number {
                "" => 3,
                n => n.parse().map_err(|_| bad_link())?,
            };
            if link < 2 {
                return Err(bad_link());
            }
            links.push(link);
            nodes.push(self.node()?);
        }

        let diagram = WythoffDiagram { nodes, links };
        let is_flat = components_after_removing(&diagram.links, None)
            .any(|range| diagram.nodes[range].iter().all(|&x| x == 0.0));
        if is_flat {
            let text = &start[..start.len() - self.rest.len()];
            return Err(SchlafliError::FlatDiagram(text.trim().to_owned()));
        }
        Ok(diagram)
    }

    fn node(&mut self) -> Result<Float, SchlafliError> {
        let rest = self.rest;
        let end = rest
            .find(')')
            .ok_or_else(|| SchlafliError::UnclosedParen(rest.to_owned()))?;
        let text = rest[1..end].trim();
        let value = text
            .parse::<Float>()
            .ok()
            .filter(|x| x.is_finite() && *x >= 0.0)
            .ok_or_else(|| SchlafliError::BadNodeValue(text.to_owned()))?;
        self.advance(end + 1);
        Ok(value)
    }
}
