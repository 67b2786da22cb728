//! Gate parameters.
//!
//! Angles are either concrete values or expressions over named symbols.
//! Passes that reason about Clifford content need to know whether an
//! angle is an exact multiple of a quarter turn, which is what
//! [`ParameterExpression::quarter_turns`] answers.

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::f64::consts::PI;
use std::fmt;

/// Tolerance used when snapping an angle onto the quarter-turn lattice.
const QUARTER_TURN_TOLERANCE: f64 = 1e-10;

/// A symbolic or concrete angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A constant value in radians.
    Constant(f64),
    /// A named, unbound symbol.
    Symbol(String),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression>),
    /// Sum of two expressions.
    Add(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Product of two expressions.
    Mul(Box<ParameterExpression>, Box<ParameterExpression>),
}

impl ParameterExpression {
    /// Create a constant angle.
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    /// Create a symbolic angle.
    pub fn symbol(name: impl Into<String>) -> Self {
        ParameterExpression::Symbol(name.into())
    }

    /// The constant π.
    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// `k` quarter turns, i.e. `k·π/2`.
    pub fn quarter_turns_of(k: i64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        ParameterExpression::Constant(k as f64 * FRAC_PI_2)
    }

    /// Whether the expression still contains an unbound symbol.
    pub fn is_symbolic(&self) -> bool {
        match self {
            ParameterExpression::Symbol(_) => true,
            ParameterExpression::Constant(_) | ParameterExpression::Pi => false,
            ParameterExpression::Neg(e) => e.is_symbolic(),
            ParameterExpression::Add(a, b) | ParameterExpression::Mul(a, b) => {
                a.is_symbolic() || b.is_symbolic()
            }
        }
    }

    /// Evaluate to radians, or `None` while a symbol is unbound.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterExpression::Constant(v) => Some(*v),
            ParameterExpression::Symbol(_) => None,
            ParameterExpression::Pi => Some(PI),
            ParameterExpression::Neg(e) => e.as_f64().map(|v| -v),
            ParameterExpression::Add(a, b) => Some(a.as_f64()? + b.as_f64()?),
            ParameterExpression::Mul(a, b) => Some(a.as_f64()? * b.as_f64()?),
        }
    }

    /// The angle as a number of quarter turns reduced modulo 8 (a full
    /// period of `Rz` including its phase), or `None` if the angle is
    /// symbolic or not on the quarter-turn lattice.
    #[allow(clippy::cast_possible_truncation)]
    pub fn quarter_turns(&self) -> Option<u8> {
        let value = self.as_f64()?;
        if !value.is_finite() {
            return None;
        }
        let turns = value / FRAC_PI_2;
        let nearest = turns.round();
        if (turns - nearest).abs() > QUARTER_TURN_TOLERANCE {
            return None;
        }
        Some((nearest as i64).rem_euclid(8) as u8)
    }

    /// Substitute a value for a named symbol.
    #[must_use]
    pub fn bind(&self, name: &str, value: f64) -> Self {
        match self {
            ParameterExpression::Symbol(s) if s == name => ParameterExpression::Constant(value),
            ParameterExpression::Neg(e) => ParameterExpression::Neg(Box::new(e.bind(name, value))),
            ParameterExpression::Add(a, b) => ParameterExpression::Add(
                Box::new(a.bind(name, value)),
                Box::new(b.bind(name, value)),
            ),
            ParameterExpression::Mul(a, b) => ParameterExpression::Mul(
                Box::new(a.bind(name, value)),
                Box::new(b.bind(name, value)),
            ),
            other => other.clone(),
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(v) => write!(f, "{v}"),
            ParameterExpression::Symbol(s) => write!(f, "{s}"),
            ParameterExpression::Pi => write!(f, "pi"),
            ParameterExpression::Neg(e) => write!(f, "-({e})"),
            ParameterExpression::Add(a, b) => write!(f, "({a} + {b})"),
            ParameterExpression::Mul(a, b) => write!(f, "({a} * {b})"),
        }
    }
}
