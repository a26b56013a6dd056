//! Property values and value expressions.
//!
//! Values stay in expression form (`Binary`, `Var`, `Call`, `IncludeRef`)
//! until the evaluation stage reduces them. [`Value::needs_evaluation`] is
//! the structural test that drives the reduce-to-fixpoint loop.

use std::fmt;

use crate::color::Rgba;
use crate::selector::Selector;
use crate::unit::Unit;

/// Binary operator in a value expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    /// `??` — left side unless it reduces to `Excluded`.
    Coalesce,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Coalesce => "??",
        }
    }

    /// Higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Mul | BinOp::Div | BinOp::Mod => 3,
            BinOp::Add | BinOp::Sub => 2,
            BinOp::Coalesce => 1,
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A property value, possibly still containing unevaluated expressions.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A number with an optional unit, e.g. `12px` or `1.5`.
    Number { value: f64, unit: Option<Unit> },
    Color(Rgba),
    /// A bare identifier or keyword, e.g. `solid`.
    Ident(String),
    /// A quoted string, kept with its original quote character.
    Str { text: String, quote: char },
    /// `url(...)` with the inner text verbatim.
    Url(String),
    /// Space-separated values, e.g. `1px solid red`.
    Compound(Vec<Value>),
    /// Comma-separated values, e.g. font family lists.
    List(Vec<Value>),
    Binary {
        op: BinOp,
        lhs: Box<Value>,
        rhs: Box<Value>,
    },
    /// Function call, e.g. `rgb(1, 2, 3)` or `calc(...)`.
    Call { name: String, args: Vec<Value> },
    /// `@name` — a variable reference awaiting resolution.
    Var(String),
    /// `@(selector)` in value position — the same property's value inside
    /// the referenced rule.
    IncludeRef(Selector),
    /// Result of coalescing past a missing value. Declarations whose value
    /// reduces to this are dropped after evaluation.
    Excluded,
}

impl Value {
    pub fn number(value: f64) -> Value {
        Value::Number { value, unit: None }
    }

    pub fn dimension(value: f64, unit: Unit) -> Value {
        Value::Number {
            value,
            unit: Some(unit),
        }
    }

    pub fn ident(text: impl Into<String>) -> Value {
        Value::Ident(text.into())
    }

    pub fn is_excluded(&self) -> bool {
        matches!(self, Value::Excluded)
    }

    /// True while the value still contains anything the evaluation stage
    /// can reduce. Color constructors count because they fold to [`Rgba`].
    pub fn needs_evaluation(&self) -> bool {
        match self {
            Value::Var(_) | Value::Binary { .. } | Value::IncludeRef(_) => true,
            Value::Call { name, args } => {
                matches!(name.as_str(), "rgb" | "rgba" | "hsl")
                    || args.iter().any(Value::needs_evaluation)
            }
            Value::Compound(items) | Value::List(items) => {
                items.iter().any(Value::needs_evaluation)
            }
            Value::Number { .. }
            | Value::Color(_)
            | Value::Ident(_)
            | Value::Str { .. }
            | Value::Url(_)
            | Value::Excluded => false,
        }
    }

    /// Rebuild bottom-up: children are mapped first, then `f` sees the
    /// rebuilt node. Identity on leaves `f` returns unchanged.
    #[must_use]
    pub fn map(self, f: &mut impl FnMut(Value) -> Value) -> Value {
        let rebuilt = match self {
            Value::Compound(items) => {
                Value::Compound(items.into_iter().map(|v| v.map(f)).collect())
            }
            Value::List(items) => Value::List(items.into_iter().map(|v| v.map(f)).collect()),
            Value::Binary { op, lhs, rhs } => Value::Binary {
                op,
                lhs: Box::new(lhs.map(f)),
                rhs: Box::new(rhs.map(f)),
            },
            Value::Call { name, args } => Value::Call {
                name,
                args: args.into_iter().map(|v| v.map(f)).collect(),
            },
            leaf => leaf,
        };
        f(rebuilt)
    }

    /// Pre-order read-only walk over the node and all children.
    pub fn visit(&self, f: &mut impl FnMut(&Value)) {
        f(self);
        match self {
            Value::Compound(items) | Value::List(items) => {
                for item in items {
                    item.visit(f);
                }
            }
            Value::Binary { lhs, rhs, .. } => {
                lhs.visit(f);
                rhs.visit(f);
            }
            Value::Call { args, .. } => {
                for arg in args {
                    arg.visit(f);
                }
            }
            _ => {}
        }
    }

    /// Variable names referenced anywhere inside this value.
    pub fn collect_vars<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Value::Var(name) => out.push(name),
            Value::Binary { lhs, rhs, .. } => {
                lhs.collect_vars(out);
                rhs.collect_vars(out);
            }
            Value::Call { args, .. } => {
                for arg in args {
                    arg.collect_vars(out);
                }
            }
            Value::Compound(items) | Value::List(items) => {
                for item in items {
                    item.collect_vars(out);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number { value, unit } => {
                f.write_str(&format_number(*value))?;
                if let Some(unit) = unit {
                    write!(f, "{unit}")?;
                }
                Ok(())
            }
            Value::Color(color) => write!(f, "{color}"),
            Value::Ident(text) => f.write_str(text),
            Value::Str { text, quote } => write!(f, "{quote}{text}{quote}"),
            Value::Url(inner) => write!(f, "url({inner})"),
            Value::Compound(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Binary { op, lhs, rhs } => write!(f, "{lhs} {op} {rhs}"),
            Value::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Value::Var(name) => write!(f, "@{name}"),
            Value::IncludeRef(selector) => write!(f, "@({selector})"),
            // Dropped before write; serializing to nothing keeps the
            // emitter total.
            Value::Excluded => Ok(()),
        }
    }
}

/// CSS-style number formatting: no exponent, no trailing zeros, at most
/// five decimal places.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = value.round();
    if (value - rounded).abs() < 1e-9 && rounded.abs() < 1e15 {
        let as_int = rounded as i64;
        if as_int == 0 {
            return "0".to_string();
        }
        return as_int.to_string();
    }
    let mut text = format!("{value:.5}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_format_without_noise() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.25), "1.25");
        assert_eq!(format_number(1.0 / 3.0), "0.33333");
    }

    #[test]
    fn display_round_trips_shape() {
        let v = Value::Compound(vec![
            Value::dimension(1.0, Unit::Px),
            Value::ident("solid"),
            Value::Color(Rgba::rgb(255, 0, 0)),
        ]);
        assert_eq!(v.to_string(), "1px solid #ff0000");
    }

    #[test]
    fn expression_shapes_need_evaluation() {
        assert!(Value::Var("base".into()).needs_evaluation());
        assert!(Value::Binary {
            op: BinOp::Add,
            lhs: Box::new(Value::number(1.0)),
            rhs: Box::new(Value::number(2.0)),
        }
        .needs_evaluation());
        assert!(Value::Call {
            name: "rgb".into(),
            args: vec![Value::number(0.0), Value::number(0.0), Value::number(0.0)],
        }
        .needs_evaluation());
        assert!(!Value::Call {
            name: "calc".into(),
            args: vec![Value::ident("100%")],
        }
        .needs_evaluation());
        assert!(!Value::Excluded.needs_evaluation());
    }

    #[test]
    fn nested_vars_are_collected() {
        let v = Value::List(vec![
            Value::Var("a".into()),
            Value::Binary {
                op: BinOp::Mul,
                lhs: Box::new(Value::Var("b".into())),
                rhs: Box::new(Value::number(2.0)),
            },
        ]);
        let mut names = Vec::new();
        v.collect_vars(&mut names);
        assert_eq!(names, vec!["a", "b"]);
    }
}
