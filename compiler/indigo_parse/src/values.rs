//! Value expression parsing.
//!
//! Handed the delimited right-hand side of a declaration (or a directive
//! argument), this builds the `Value` tree. Precedence, tightest first:
//! `*` `/` `%`, then `+` `-`, then `??`; space-joined compounds sit above
//! the operators and comma lists above compounds.
//!
//! A `+`/`-` that follows whitespace but touches its operand starts a new
//! compound item instead of acting as an operator, so `margin: 10px -5px`
//! is two values while `10px - 5px` and `10px-5px` subtract.

use std::path::PathBuf;
use std::sync::Arc;

use indigo_diagnostic::Phase;
use indigo_ir::{BinOp, Origin, Rgba, Selector, Span, Unit, Value};
use indigo_session::CompileContext;
use indigo_stack::ensure_sufficient_stack;

use crate::reader::{is_ident_byte, Reader};
use crate::{Abort, PResult};

/// Parse `text` as one value expression. `base` is the file offset of
/// `text`'s first byte, so recorded spans stay absolute.
pub(crate) fn parse_value(
    text: &str,
    base: u32,
    file: &Arc<PathBuf>,
    ctx: &mut CompileContext,
) -> PResult<Value> {
    ValueParser {
        reader: Reader::with_base(text, base),
        file: Arc::clone(file),
        ctx,
    }
    .parse()
}

struct ValueParser<'src, 'ctx> {
    reader: Reader<'src>,
    file: Arc<PathBuf>,
    ctx: &'ctx mut CompileContext,
}

impl ValueParser<'_, '_> {
    fn parse(mut self) -> PResult<Value> {
        let value = self.parse_list()?;
        if !self.reader.at_end() {
            let at = self.reader.offset();
            let rest = self.reader.rest().trim().to_string();
            return Err(self.error(at, format!("unexpected `{rest}` after value")));
        }
        Ok(value)
    }

    fn error(&mut self, at: u32, message: String) -> Abort {
        let origin = Origin::new(
            Arc::clone(&self.file),
            Span::new(at, self.reader.offset().max(at)),
        );
        self.ctx.error(Phase::Parser, message, origin);
        Abort
    }

    fn parse_list(&mut self) -> PResult<Value> {
        let mut items = vec![self.parse_compound()?];
        while self.reader.eat(b',') {
            items.push(self.parse_compound()?);
        }
        Ok(match items.len() {
            1 => items.remove(0),
            _ => Value::List(items),
        })
    }

    fn parse_compound(&mut self) -> PResult<Value> {
        let mut items = vec![self.parse_coalesce()?];
        loop {
            self.reader.skip_trivia();
            match self.reader.peek() {
                None | Some(b',') | Some(b')') => break,
                _ => items.push(self.parse_coalesce()?),
            }
        }
        Ok(match items.len() {
            1 => items.remove(0),
            _ => Value::Compound(items),
        })
    }

    fn parse_coalesce(&mut self) -> PResult<Value> {
        let mut lhs = self.parse_additive()?;
        loop {
            self.reader.skip_trivia();
            if !self.reader.rest().starts_with("??") {
                break;
            }
            self.reader.bump();
            self.reader.bump();
            let rhs = self.parse_additive()?;
            lhs = binary(BinOp::Coalesce, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> PResult<Value> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let had_space = self.reader.skip_trivia();
            let op = match self.reader.peek() {
                Some(b'+') => BinOp::Add,
                Some(b'-') => BinOp::Sub,
                _ => break,
            };
            // ` -5px`: the sign belongs to the next compound item.
            let touches_operand = self
                .reader
                .rest()
                .as_bytes()
                .get(1)
                .is_some_and(|b| !b.is_ascii_whitespace());
            if had_space && touches_operand {
                break;
            }
            self.reader.bump();
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> PResult<Value> {
        let mut lhs = self.parse_primary()?;
        loop {
            self.reader.skip_trivia();
            let op = match self.reader.peek() {
                Some(b'*') => BinOp::Mul,
                Some(b'/') => BinOp::Div,
                Some(b'%') => BinOp::Mod,
                _ => break,
            };
            self.reader.bump();
            let rhs = self.parse_primary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> PResult<Value> {
        ensure_sufficient_stack(|| self.parse_primary_inner())
    }

    fn parse_primary_inner(&mut self) -> PResult<Value> {
        self.reader.skip_trivia();
        let start = self.reader.offset();
        let Some(next) = self.reader.peek() else {
            return Err(self.error(start, "expected a value".to_string()));
        };
        match next {
            b'"' | b'\'' => {
                self.reader.bump();
                match self.reader.read_quoted(next) {
                    Some(text) => Ok(Value::Str {
                        text: text.to_string(),
                        quote: next as char,
                    }),
                    None => Err(self.error(start, "unterminated string".to_string())),
                }
            }
            b'#' => {
                self.reader.bump();
                let hex = self.reader.read_ident();
                match Rgba::parse_hex(hex) {
                    Some(color) => Ok(Value::Color(color)),
                    None => {
                        let hex = hex.to_string();
                        Err(self.error(start, format!("`#{hex}` is not a valid color")))
                    }
                }
            }
            b'(' => {
                self.reader.bump();
                let value = self.parse_list()?;
                if !self.reader.eat(b')') {
                    return Err(self.error(start, "unbalanced `(`".to_string()));
                }
                Ok(value)
            }
            b'@' => self.parse_reference(start),
            b'0'..=b'9' | b'.' => self.parse_number(start),
            b'+' | b'-' => match self.reader.rest().as_bytes().get(1) {
                Some(b'0'..=b'9' | b'.') => self.parse_number(start),
                Some(&b) if is_ident_byte(b) => self.parse_ident_like(start),
                _ => Err(self.error(start, format!("dangling `{}`", next as char))),
            },
            b if is_ident_byte(b) => self.parse_ident_like(start),
            other => Err(self.error(start, format!("unexpected `{}` in value", other as char))),
        }
    }

    fn parse_number(&mut self, start: u32) -> PResult<Value> {
        let mut text = String::new();
        if let Some(sign @ (b'+' | b'-')) = self.reader.peek() {
            if sign == b'-' {
                text.push('-');
            }
            self.reader.bump();
        }
        while let Some(b) = self.reader.peek() {
            if b.is_ascii_digit() || b == b'.' {
                text.push(b as char);
                self.reader.bump();
            } else {
                break;
            }
        }
        let Ok(value) = text.parse::<f64>() else {
            return Err(self.error(start, format!("`{text}` is not a number")));
        };

        let unit = if self.reader.peek() == Some(b'%') {
            self.reader.bump();
            Some(Unit::Percent)
        } else {
            let mut unit_text = String::new();
            while let Some(b) = self.reader.peek() {
                if b.is_ascii_alphabetic() {
                    unit_text.push(b.to_ascii_lowercase() as char);
                    self.reader.bump();
                } else {
                    break;
                }
            }
            if unit_text.is_empty() {
                None
            } else {
                Some(Unit::parse(&unit_text))
            }
        };
        Ok(Value::Number { value, unit })
    }

    fn parse_ident_like(&mut self, start: u32) -> PResult<Value> {
        let name = self.reader.read_ident().to_string();
        if self.reader.peek() != Some(b'(') {
            return Ok(Value::Ident(name));
        }
        self.reader.bump();
        if name.eq_ignore_ascii_case("url") {
            return match self.reader.scan_parenthesized() {
                Some(inner) => Ok(Value::Url(inner.trim().to_string())),
                None => Err(self.error(start, "unterminated `url(`".to_string())),
            };
        }
        let args = self.parse_call_args(start)?;
        Ok(Value::Call { name, args })
    }

    fn parse_call_args(&mut self, start: u32) -> PResult<Vec<Value>> {
        let mut args = Vec::new();
        if self.reader.eat(b')') {
            return Ok(args);
        }
        args.push(self.parse_compound()?);
        while self.reader.eat(b',') {
            args.push(self.parse_compound()?);
        }
        if !self.reader.eat(b')') {
            return Err(self.error(start, "unbalanced `(` in call".to_string()));
        }
        Ok(args)
    }

    fn parse_reference(&mut self, start: u32) -> PResult<Value> {
        self.reader.bump();
        if self.reader.peek() == Some(b'(') {
            self.reader.bump();
            return match self.reader.scan_parenthesized() {
                Some(selector) => Ok(Value::IncludeRef(Selector::parse(selector))),
                None => Err(self.error(start, "unterminated `@(`".to_string())),
            };
        }
        let name = self.reader.read_ident();
        if name.is_empty() {
            return Err(self.error(start, "expected a name after `@`".to_string()));
        }
        Ok(Value::Var(name.to_string()))
    }
}

fn binary(op: BinOp, lhs: Value, rhs: Value) -> Value {
    Value::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
