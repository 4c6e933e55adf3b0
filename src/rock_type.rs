//! Rule based rock-type labelling.
//!
//! A rule file holds one rule per line:
//!
//! ```text
//! # depth 3, two strips along x
//! z == 3 : x < 4 or 10 <= x <= 12 => oxide
//! z == 4 : y == 7 => sulphide
//! ```
//!
//! The depth on the left is written in the depth-down convention of the block
//! file. Every range of a rule must use the same horizontal axis. Rules are
//! parsed once; classification is a linear scan where the first match wins.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::block::{BlockIndex, RockType};
use crate::error::{Result, UplError};

pub const DEFAULT_BASELINE: &str = "undefined";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    fn coordinate(&self, ind: &BlockIndex) -> i64 {
        match self {
            Axis::X => ind.x,
            Axis::Y => ind.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub value: i64,
    pub inclusive: bool,
}

impl Endpoint {
    fn new(value: i64, inclusive: bool) -> Self {
        Self { value, inclusive }
    }
}

/// Interval of grid coordinates along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordRange {
    Point(i64),
    Bounded { low: Endpoint, high: Endpoint },
    Below(Endpoint),
    Above(Endpoint),
}

impl CoordRange {
    pub fn contains(&self, value: i64) -> bool {
        fn above(low: &Endpoint, value: i64) -> bool {
            if low.inclusive {
                value >= low.value
            } else {
                value > low.value
            }
        }
        fn below(high: &Endpoint, value: i64) -> bool {
            if high.inclusive {
                value <= high.value
            } else {
                value < high.value
            }
        }

        match self {
            CoordRange::Point(p) => value == *p,
            CoordRange::Bounded { low, high } => above(low, value) && below(high, value),
            CoordRange::Below(high) => below(high, value),
            CoordRange::Above(low) => above(low, value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RockTypeRule {
    pub depth_index: i64,
    pub axis: Axis,
    pub ranges: Vec<CoordRange>,
    pub rock_type: RockType,
}

impl RockTypeRule {
    pub fn matches(&self, ind: &BlockIndex) -> bool {
        ind.depth() == self.depth_index
            && self
                .ranges
                .iter()
                .any(|range| range.contains(self.axis.coordinate(ind)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RockTypeClassifier {
    rules: Vec<RockTypeRule>,
    baseline: RockType,
}

impl RockTypeClassifier {
    pub fn new(rules: Vec<RockTypeRule>, baseline: RockType) -> Self {
        Self { rules, baseline }
    }

    pub fn parse(text: &str, baseline: RockType) -> Result<Self> {
        let mut rules = Vec::new();
        for (line_idx, line) in text.lines().enumerate() {
            let line = match line.find('#') {
                Some(pos) => &line[..pos],
                None => line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }
            let rule = parse_rule(line).map_err(|message| {
                UplError::invalid_input(format!(
                    "rock type rule line {}: {}",
                    line_idx + 1,
                    message
                ))
            })?;
            rules.push(rule);
        }
        Ok(Self::new(rules, baseline))
    }

    pub fn load(path: impl AsRef<Path>, baseline: RockType) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let classifier = Self::parse(&text, baseline)?;
        info!(
            rules = classifier.rules.len(),
            file = %path.display(),
            "loaded rock type rules"
        );
        Ok(classifier)
    }

    pub fn rules(&self) -> &[RockTypeRule] {
        &self.rules
    }

    pub fn baseline(&self) -> &RockType {
        &self.baseline
    }

    /// First matching rule in declared order, else the baseline.
    pub fn classify(&self, ind: &BlockIndex) -> &RockType {
        self.rules
            .iter()
            .find(|rule| rule.matches(ind))
            .map(|rule| &rule.rock_type)
            .unwrap_or(&self.baseline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Int(i64),
    Op(CmpOp),
}

fn tokenize(text: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit()
            || (c == '-' && chars.get(i + 1).map_or(false, |n| n.is_ascii_digit()))
        {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let literal: String = chars[start..i].iter().collect();
            let value = literal
                .parse::<i64>()
                .map_err(|_| format!("integer out of range: {}", literal))?;
            tokens.push(Token::Int(value));
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Word(chars[start..i].iter().collect()));
        } else {
            let next = chars.get(i + 1).copied();
            let (op, width) = match (c, next) {
                ('<', Some('=')) => (CmpOp::Le, 2),
                ('>', Some('=')) => (CmpOp::Ge, 2),
                ('=', Some('=')) => (CmpOp::Eq, 2),
                ('<', _) => (CmpOp::Lt, 1),
                ('>', _) => (CmpOp::Gt, 1),
                ('=', _) => (CmpOp::Eq, 1),
                _ => return Err(format!("unexpected character '{}'", c)),
            };
            tokens.push(Token::Op(op));
            i += width;
        }
    }
    Ok(tokens)
}

fn parse_rule(line: &str) -> std::result::Result<RockTypeRule, String> {
    let (condition, rock_type) = line
        .split_once("=>")
        .ok_or_else(|| "missing '=> <rock type>'".to_string())?;
    let rock_type = rock_type.trim();
    if rock_type.is_empty() {
        return Err("empty rock type".to_string());
    }

    let (depth_clause, ranges_clause) = condition
        .split_once(':')
        .ok_or_else(|| "missing ':' between depth and ranges".to_string())?;

    let depth_index = match tokenize(depth_clause)?.as_slice() {
        [Token::Word(w), Token::Op(CmpOp::Eq), Token::Int(d)] if w.eq_ignore_ascii_case("z") => *d,
        _ => return Err(format!("expected 'z == <depth>', got '{}'", depth_clause.trim())),
    };

    let tokens = tokenize(ranges_clause)?;
    let mut axis: Option<Axis> = None;
    let mut ranges = Vec::new();
    for term in tokens.split(|t| matches!(t, Token::Word(w) if w.eq_ignore_ascii_case("or"))) {
        let (term_axis, range) = parse_range(term)?;
        match axis {
            Some(a) if a != term_axis => {
                return Err("all ranges of a rule must use the same axis".to_string())
            }
            _ => axis = Some(term_axis),
        }
        ranges.push(range);
    }

    let axis = axis.ok_or_else(|| "no coordinate ranges".to_string())?;
    Ok(RockTypeRule {
        depth_index,
        axis,
        ranges,
        rock_type: RockType::new(rock_type),
    })
}

fn parse_axis(word: &str) -> std::result::Result<Axis, String> {
    match word {
        "x" | "X" => Ok(Axis::X),
        "y" | "Y" => Ok(Axis::Y),
        other => Err(format!("unknown horizontal axis '{}'", other)),
    }
}

fn parse_range(term: &[Token]) -> std::result::Result<(Axis, CoordRange), String> {
    use CmpOp::*;

    match term {
        [Token::Word(w), Token::Op(op), Token::Int(n)] => {
            let axis = parse_axis(w)?;
            let range = match op {
                Lt => CoordRange::Below(Endpoint::new(*n, false)),
                Le => CoordRange::Below(Endpoint::new(*n, true)),
                Gt => CoordRange::Above(Endpoint::new(*n, false)),
                Ge => CoordRange::Above(Endpoint::new(*n, true)),
                Eq => CoordRange::Point(*n),
            };
            Ok((axis, range))
        }
        [Token::Int(n), Token::Op(op), Token::Word(w)] => {
            let axis = parse_axis(w)?;
            let range = match op {
                Lt => CoordRange::Above(Endpoint::new(*n, false)),
                Le => CoordRange::Above(Endpoint::new(*n, true)),
                Gt => CoordRange::Below(Endpoint::new(*n, false)),
                Ge => CoordRange::Below(Endpoint::new(*n, true)),
                Eq => CoordRange::Point(*n),
            };
            Ok((axis, range))
        }
        [Token::Int(a), Token::Op(op1), Token::Word(w), Token::Op(op2), Token::Int(b)] => {
            let axis = parse_axis(w)?;
            let (low, high) = match (op1, op2) {
                (Lt | Le, Lt | Le) => (
                    Endpoint::new(*a, *op1 == Le),
                    Endpoint::new(*b, *op2 == Le),
                ),
                (Gt | Ge, Gt | Ge) => (
                    Endpoint::new(*b, *op2 == Ge),
                    Endpoint::new(*a, *op1 == Ge),
                ),
                _ => return Err(format!("mixed comparison direction '{} x {}'", op1, op2)),
            };
            let empty = low.value > high.value
                || (low.value == high.value && !(low.inclusive && high.inclusive));
            if empty {
                return Err(format!("empty range {} .. {}", low.value, high.value));
            }
            Ok((axis, CoordRange::Bounded { low, high }))
        }
        [] => Err("empty range".to_string()),
        _ => Err("expected '<axis> <op> <int>' or '<int> < <axis> < <int>'".to_string()),
    }
}
