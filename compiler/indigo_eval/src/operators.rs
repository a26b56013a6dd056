//! Binary operator semantics.
//!
//! Dispatch is by operand shape: numbers carry unit algebra, colors do
//! saturating channel math, strings and identifiers concatenate under `+`.
//! `??` never inspects its operands beyond the `Excluded` test, and
//! `Excluded` poisons every other operator so a dropped optional argument
//! drops the declarations computed from it.

use indigo_ir::{keyword_color, BinOp, Rgba, Unit, UnitGroup, Value};
use thiserror::Error;

/// Failure inside value evaluation. The evaluation stage reports these as
/// Compiler diagnostics at the owning declaration's origin.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EvalError {
    message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> EvalError {
        EvalError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Apply `op` to two fully reduced operands.
pub fn apply_binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    if op == BinOp::Coalesce {
        return Ok(if lhs.is_excluded() { rhs } else { lhs });
    }
    if lhs.is_excluded() || rhs.is_excluded() {
        return Ok(Value::Excluded);
    }
    match (lhs, rhs) {
        (
            Value::Number { value: a, unit: ua },
            Value::Number { value: b, unit: ub },
        ) => eval_number_binary(op, a, ua, b, ub),
        (Value::Color(a), Value::Color(b)) => eval_color_binary(op, a, b),
        (Value::Color(color), Value::Number { value, unit: None }) => {
            eval_color_scalar(op, color, value)
        }
        (Value::Ident(name), rhs @ Value::Color(_)) if keyword_color(&name).is_some() => {
            let color = keyword_color(&name).unwrap_or(Rgba::rgb(0, 0, 0));
            apply_binary(op, Value::Color(color), rhs)
        }
        (lhs @ Value::Color(_), Value::Ident(name)) if keyword_color(&name).is_some() => {
            let color = keyword_color(&name).unwrap_or(Rgba::rgb(0, 0, 0));
            apply_binary(op, lhs, Value::Color(color))
        }
        (Value::Str { text, quote }, rhs) if op == BinOp::Add => Ok(Value::Str {
            text: format!("{text}{}", plain_text(&rhs)),
            quote,
        }),
        (lhs, Value::Str { text, quote }) if op == BinOp::Add => Ok(Value::Str {
            text: format!("{}{text}", plain_text(&lhs)),
            quote,
        }),
        (Value::Ident(a), Value::Ident(b)) if op == BinOp::Add => {
            Ok(Value::Ident(format!("{a}{b}")))
        }
        (lhs, rhs) => Err(invalid_binary_op(op, &lhs, &rhs)),
    }
}

fn eval_number_binary(
    op: BinOp,
    a: f64,
    unit_a: Option<Unit>,
    b: f64,
    unit_b: Option<Unit>,
) -> Result<Value, EvalError> {
    match op {
        BinOp::Add | BinOp::Sub => {
            let (b, unit) = align_units(a, &unit_a, b, &unit_b, op)?;
            let value = if op == BinOp::Add { a + b } else { a - b };
            Ok(Value::Number { value, unit })
        }
        BinOp::Mul => {
            let unit = match (unit_a, unit_b) {
                (Some(u), None) | (None, Some(u)) => Some(u),
                (None, None) => None,
                (Some(ua), Some(ub)) => {
                    return Err(EvalError::new(format!("cannot multiply `{ua}` by `{ub}`")));
                }
            };
            Ok(Value::Number { value: a * b, unit })
        }
        BinOp::Div => {
            if b == 0.0 {
                return Err(EvalError::new("division by zero"));
            }
            match (unit_a, unit_b) {
                (unit, None) => Ok(Value::Number { value: a / b, unit }),
                (None, Some(u)) => {
                    Err(EvalError::new(format!("cannot divide a number by `{u}`")))
                }
                (Some(ua), Some(ub)) => {
                    let converted = ub.convert(b, &ua).ok_or_else(|| {
                        EvalError::new(format!("incompatible units `{ua}` and `{ub}`"))
                    })?;
                    if converted == 0.0 {
                        return Err(EvalError::new("division by zero"));
                    }
                    // Same quantity over same quantity leaves a plain ratio.
                    Ok(Value::number(a / converted))
                }
            }
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::new("modulo by zero"));
            }
            match (unit_a, unit_b) {
                (unit, None) => Ok(Value::Number { value: a % b, unit }),
                (None, Some(u)) => {
                    Err(EvalError::new(format!("cannot take a number modulo `{u}`")))
                }
                (Some(ua), Some(ub)) => {
                    let converted = ub.convert(b, &ua).ok_or_else(|| {
                        EvalError::new(format!("incompatible units `{ua}` and `{ub}`"))
                    })?;
                    if converted == 0.0 {
                        return Err(EvalError::new("modulo by zero"));
                    }
                    Ok(Value::Number {
                        value: a % converted,
                        unit: Some(ua),
                    })
                }
            }
        }
        BinOp::Coalesce => Ok(Value::Number { value: a, unit: unit_a }),
    }
}

/// Bring `b` into `a`'s unit for additive operators. A unitless side adopts
/// the united side's unit; two united sides must share a conversion group.
fn align_units(
    _a: f64,
    unit_a: &Option<Unit>,
    b: f64,
    unit_b: &Option<Unit>,
    op: BinOp,
) -> Result<(f64, Option<Unit>), EvalError> {
    match (unit_a, unit_b) {
        (None, None) => Ok((b, None)),
        (Some(u), None) => Ok((b, Some(u.clone()))),
        (None, Some(u)) => Ok((b, Some(u.clone()))),
        (Some(ua), Some(ub)) => {
            if ua == ub {
                return Ok((b, Some(ua.clone())));
            }
            if ua.group() == UnitGroup::Opaque || ua.group() != ub.group() {
                return Err(EvalError::new(format!(
                    "cannot apply `{}` to `{ua}` and `{ub}`",
                    op.symbol()
                )));
            }
            let converted = ub.convert(b, ua).ok_or_else(|| {
                EvalError::new(format!("incompatible units `{ua}` and `{ub}`"))
            })?;
            Ok((converted, Some(ua.clone())))
        }
    }
}

fn eval_color_binary(op: BinOp, a: Rgba, b: Rgba) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => Ok(Value::Color(a.saturating_add(&b))),
        BinOp::Sub => Ok(Value::Color(a.saturating_sub(&b))),
        _ => Err(EvalError::new(format!(
            "cannot apply `{}` to colors",
            op.symbol()
        ))),
    }
}

/// `color ± n` shifts every channel by `n`.
fn eval_color_scalar(op: BinOp, color: Rgba, scalar: f64) -> Result<Value, EvalError> {
    let amount = scalar.round().clamp(0.0, 255.0) as u8;
    let grey = Rgba::rgb(amount, amount, amount);
    match op {
        BinOp::Add => Ok(Value::Color(color.saturating_add(&grey))),
        BinOp::Sub => Ok(Value::Color(color.saturating_sub(&grey))),
        _ => Err(EvalError::new(format!(
            "cannot apply `{}` to a color and a number",
            op.symbol()
        ))),
    }
}

/// Unquoted rendering for string concatenation.
fn plain_text(value: &Value) -> String {
    match value {
        Value::Str { text, .. } => text.clone(),
        other => other.to_string(),
    }
}

fn invalid_binary_op(op: BinOp, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::new(format!(
        "cannot apply `{}` to `{lhs}` and `{rhs}`",
        op.symbol()
    ))
}
