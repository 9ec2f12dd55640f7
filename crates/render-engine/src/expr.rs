//! Time-varying numeric expressions for the transcoder's filter graph.
//!
//! An [`Expr`] renders to the transcoder's expression syntax (`t` is the
//! frame timestamp in seconds) and also evaluates in-process, so the
//! exact tree handed to the transcoder can be checked without running it.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use recast_project_model::event::TimestampMs;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    /// Current frame time in seconds.
    Time,
    /// `inside` while `start_secs <= t <= end_secs`, else `outside`.
    Window {
        start_secs: f64,
        end_secs: f64,
        inside: Box<Expr>,
        outside: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
}

/// One constant value held over a closed millisecond interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Piece {
    pub start_ms: TimestampMs,
    pub end_ms: TimestampMs,
    pub value: f64,
}

impl Expr {
    pub fn window(start_ms: TimestampMs, end_ms: TimestampMs, inside: Expr, outside: Expr) -> Self {
        Expr::Window {
            start_secs: ms_to_secs(start_ms),
            end_secs: ms_to_secs(end_ms),
            inside: Box::new(inside),
            outside: Box::new(outside),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn min_of(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Min, lhs, rhs)
    }

    pub fn max_of(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Max, lhs, rhs)
    }

    /// Value at `t_secs`.
    pub fn eval(&self, t_secs: f64) -> f64 {
        match self {
            Expr::Const(value) => *value,
            Expr::Time => t_secs,
            Expr::Window {
                start_secs,
                end_secs,
                inside,
                outside,
            } => {
                if *start_secs <= t_secs && t_secs <= *end_secs {
                    inside.eval(t_secs)
                } else {
                    outside.eval(t_secs)
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let (a, b) = (lhs.eval(t_secs), rhs.eval(t_secs));
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Min => a.min(b),
                    BinaryOp::Max => a.max(b),
                }
            }
        }
    }

    /// Value at a millisecond timestamp.
    pub fn eval_at_ms(&self, t_ms: TimestampMs) -> f64 {
        self.eval(ms_to_secs(t_ms))
    }

    /// Transcoder syntax.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(value) => f.write_str(&format_number(*value)),
            Expr::Time => f.write_str("t"),
            Expr::Window {
                start_secs,
                end_secs,
                inside,
                outside,
            } => write!(
                f,
                "if(between(t,{},{}),{inside},{outside})",
                format_number(*start_secs),
                format_number(*end_secs)
            ),
            Expr::Binary { op, lhs, rhs } => match op {
                BinaryOp::Add => write!(f, "({lhs}+{rhs})"),
                BinaryOp::Sub => write!(f, "({lhs}-{rhs})"),
                BinaryOp::Mul => write!(f, "({lhs}*{rhs})"),
                BinaryOp::Div => write!(f, "({lhs}/{rhs})"),
                BinaryOp::Min => write!(f, "min({lhs},{rhs})"),
                BinaryOp::Max => write!(f, "max({lhs},{rhs})"),
            },
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Const(value)
    }
}

impl Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Add, self, rhs)
    }
}

impl Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Sub, self, rhs)
    }
}

impl Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Mul, self, rhs)
    }
}

impl Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Div, self, rhs)
    }
}

/// Fold pieces right to left onto `fallback`.
///
/// Where pieces overlap, the one listed first wins: each earlier piece
/// wraps everything after it and only defers outside its own interval.
pub fn piecewise(pieces: &[Piece], fallback: f64) -> Expr {
    pieces
        .iter()
        .rev()
        .fold(Expr::Const(fallback), |rest, piece| {
            Expr::window(piece.start_ms, piece.end_ms, Expr::Const(piece.value), rest)
        })
}

/// Top-left of a `frame`-sized window inside a frame magnified by
/// `zoom`, centered on `target` (normalized) and kept inside
/// `[0, frame * zoom - frame]`. Divided by `zoom` this is the view
/// transform's offset.
pub fn magnified_offset(target: Expr, frame: f64, zoom: Expr) -> Expr {
    let magnified = Expr::Const(frame) * zoom;
    let centered = target * magnified.clone() - Expr::Const(frame / 2.0);
    Expr::max_of(
        Expr::Const(0.0),
        Expr::min_of(centered, magnified - Expr::Const(frame)),
    )
}

pub fn ms_to_secs(ms: TimestampMs) -> f64 {
    ms as f64 / 1000.0
}

/// Shortest decimal form with at most six fractional digits.
pub fn format_number(value: f64) -> String {
    let text = format!("{value:.6}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
