//! The expression reduction engine.
//!
//! [`evaluate`] performs one bottom-up rewrite of every reducible node. The
//! evaluation stage loops `while value.needs_evaluation()` because a single
//! step is not always enough: a substituted variable can expose another
//! expression. On an `Ok` result every reducible node the operands allowed
//! has been folded, so the loop terminates; errors break it.

use indigo_ir::{Rgba, Unit, Value};
use indigo_stack::ensure_sufficient_stack;

use crate::operators::{apply_binary, EvalError};

/// One reduction step over a whole value tree.
pub fn evaluate(value: Value) -> Result<Value, EvalError> {
    match value {
        Value::Binary { op, lhs, rhs } => ensure_sufficient_stack(|| {
            let lhs = evaluate(*lhs)?;
            let rhs = evaluate(*rhs)?;
            apply_binary(op, lhs, rhs)
        }),
        Value::Call { name, args } => ensure_sufficient_stack(|| {
            let mut reduced = Vec::with_capacity(args.len());
            for arg in args {
                let arg = evaluate(arg)?;
                if !arg.is_excluded() {
                    reduced.push(arg);
                }
            }
            fold_call(name, reduced)
        }),
        Value::Compound(items) => reduce_sequence(items, Value::Compound),
        Value::List(items) => reduce_sequence(items, Value::List),
        Value::Var(name) => Err(EvalError::new(format!("@{name} has not been defined"))),
        Value::IncludeRef(selector) => Err(EvalError::new(format!(
            "@({selector}) could not be resolved"
        ))),
        leaf => Ok(leaf),
    }
}

/// Members reduce independently; `Excluded` members vanish. An emptied
/// sequence is itself `Excluded` and a singleton collapses to its member.
fn reduce_sequence(
    items: Vec<Value>,
    rebuild: impl FnOnce(Vec<Value>) -> Value,
) -> Result<Value, EvalError> {
    let mut reduced = Vec::with_capacity(items.len());
    for item in items {
        let item = ensure_sufficient_stack(|| evaluate(item))?;
        if !item.is_excluded() {
            reduced.push(item);
        }
    }
    match reduced.len() {
        0 => Ok(Value::Excluded),
        1 => Ok(reduced.swap_remove(0)),
        _ => Ok(rebuild(reduced)),
    }
}

/// Fold the color constructors; every other call is carried through.
fn fold_call(name: String, args: Vec<Value>) -> Result<Value, EvalError> {
    match name.as_str() {
        "rgb" => {
            let [r, g, b] = take_args(&name, args)?;
            Ok(Value::Color(Rgba::rgb(
                channel(&name, &r)?,
                channel(&name, &g)?,
                channel(&name, &b)?,
            )))
        }
        "rgba" => {
            let [r, g, b, a] = take_args(&name, args)?;
            Ok(Value::Color(Rgba::rgba(
                channel(&name, &r)?,
                channel(&name, &g)?,
                channel(&name, &b)?,
                fraction(&name, &a)? as f32,
            )))
        }
        "hsl" => {
            let [h, s, l] = take_args(&name, args)?;
            let hue = match h {
                Value::Number { value, unit: None } => value,
                Value::Number {
                    value,
                    unit: Some(Unit::Deg),
                } => value,
                other => {
                    return Err(EvalError::new(format!(
                        "hsl() expects a hue angle, got `{other}`"
                    )))
                }
            };
            Ok(Value::Color(Rgba::from_hsl(
                hue,
                fraction(&name, &s)?,
                fraction(&name, &l)?,
            )))
        }
        _ => Ok(Value::Call { name, args }),
    }
}

fn take_args<const N: usize>(name: &str, args: Vec<Value>) -> Result<[Value; N], EvalError> {
    <[Value; N]>::try_from(args).map_err(|args| {
        EvalError::new(format!(
            "{name}() expects {N} arguments, got {}",
            args.len()
        ))
    })
}

/// A color channel: a plain number 0..=255, or a percentage of 255.
fn channel(name: &str, value: &Value) -> Result<u8, EvalError> {
    let scaled = match value {
        Value::Number { value, unit: None } => *value,
        Value::Number {
            value,
            unit: Some(Unit::Percent),
        } => value * 255.0 / 100.0,
        other => {
            return Err(EvalError::new(format!(
                "{name}() expects numeric channels, got `{other}`"
            )))
        }
    };
    Ok(scaled.round().clamp(0.0, 255.0) as u8)
}

/// An alpha/saturation/lightness fraction: 0..=1, or a percentage.
fn fraction(name: &str, value: &Value) -> Result<f64, EvalError> {
    match value {
        Value::Number { value, unit: None } => Ok(value.clamp(0.0, 1.0)),
        Value::Number {
            value,
            unit: Some(Unit::Percent),
        } => Ok((value / 100.0).clamp(0.0, 1.0)),
        other => Err(EvalError::new(format!(
            "{name}() expects a number or percentage, got `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indigo_ir::BinOp;
    use pretty_assertions::assert_eq;

    fn binary(op: BinOp, lhs: Value, rhs: Value) -> Value {
        Value::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[test]
    fn nested_arithmetic_folds_in_one_step() {
        let v = binary(
            BinOp::Add,
            binary(
                BinOp::Mul,
                Value::number(2.0),
                Value::dimension(3.0, Unit::Px),
            ),
            Value::dimension(4.0, Unit::Px),
        );
        assert_eq!(evaluate(v), Ok(Value::dimension(10.0, Unit::Px)));
    }

    #[test]
    fn rgb_folds_to_a_color() {
        let v = Value::Call {
            name: "rgb".to_string(),
            args: vec![
                Value::number(255.0),
                Value::number(0.0),
                Value::dimension(100.0, Unit::Percent),
            ],
        };
        assert_eq!(evaluate(v), Ok(Value::Color(Rgba::rgb(255, 0, 255))));
    }

    #[test]
    fn rgba_keeps_alpha() {
        let v = Value::Call {
            name: "rgba".to_string(),
            args: vec![
                Value::number(0.0),
                Value::number(0.0),
                Value::number(0.0),
                Value::number(0.5),
            ],
        };
        assert_eq!(
            evaluate(v),
            Ok(Value::Color(Rgba::rgba(0, 0, 0, 0.5)))
        );
    }

    #[test]
    fn hsl_uses_percent_saturation_and_lightness() {
        let v = Value::Call {
            name: "hsl".to_string(),
            args: vec![
                Value::number(0.0),
                Value::dimension(100.0, Unit::Percent),
                Value::dimension(50.0, Unit::Percent),
            ],
        };
        assert_eq!(evaluate(v), Ok(Value::Color(Rgba::rgb(255, 0, 0))));
    }

    #[test]
    fn unknown_calls_are_carried_through() {
        let v = Value::Call {
            name: "calc".to_string(),
            args: vec![Value::ident("100%")],
        };
        let out = evaluate(v.clone());
        assert_eq!(out, Ok(v));
    }

    #[test]
    fn excluded_members_vanish_from_compounds() {
        let v = Value::Compound(vec![
            Value::dimension(1.0, Unit::Px),
            Value::Excluded,
            Value::ident("solid"),
        ]);
        assert_eq!(
            evaluate(v),
            Ok(Value::Compound(vec![
                Value::dimension(1.0, Unit::Px),
                Value::ident("solid"),
            ]))
        );
    }

    #[test]
    fn emptied_compound_is_excluded() {
        let v = Value::Compound(vec![Value::Excluded, Value::Excluded]);
        assert_eq!(evaluate(v), Ok(Value::Excluded));
    }

    #[test]
    fn singleton_compound_collapses() {
        let v = Value::Compound(vec![binary(
            BinOp::Coalesce,
            Value::Excluded,
            Value::ident("auto"),
        )]);
        assert_eq!(evaluate(v), Ok(Value::ident("auto")));
    }

    #[test]
    fn unresolved_variable_is_an_error() {
        let err = evaluate(Value::Var("missing".to_string()));
        assert_eq!(
            err,
            Err(EvalError::new("@missing has not been defined"))
        );
    }

    #[test]
    fn wrong_arity_is_reported() {
        let v = Value::Call {
            name: "rgb".to_string(),
            args: vec![Value::number(1.0)],
        };
        assert!(evaluate(v).is_err());
    }
}
