//! Media query parsing.
//!
//! Handles the predicate text between `@media` and `{`, and the optional
//! trailing query on `@using "file" <query>;`.

use std::path::PathBuf;
use std::sync::Arc;

use indigo_diagnostic::Phase;
use indigo_ir::{MediaFeature, MediaQuery, MediaQueryTerm, Origin, Qualifier, Span, Value};
use indigo_session::CompileContext;

use crate::reader::Reader;
use crate::values::parse_value;
use crate::{Abort, PResult};

/// Parse `text` as a comma-list of media query terms. `base` is the file
/// offset of `text`'s first byte.
pub(crate) fn parse_media_query(
    text: &str,
    base: u32,
    file: &Arc<PathBuf>,
    ctx: &mut CompileContext,
) -> PResult<MediaQuery> {
    let mut parser = MediaParser {
        reader: Reader::with_base(text, base),
        file,
        ctx,
    };
    let mut terms = vec![parser.parse_term()?];
    while parser.reader.eat(b',') {
        terms.push(parser.parse_term()?);
    }
    parser.reader.skip_trivia();
    if !parser.reader.at_end() {
        let at = parser.reader.offset();
        let rest = parser.reader.rest().trim().to_string();
        return Err(parser.error(at, format!("unexpected `{rest}` in media query")));
    }
    Ok(MediaQuery::new(terms))
}

struct MediaParser<'src, 'a> {
    reader: Reader<'src>,
    file: &'a Arc<PathBuf>,
    ctx: &'a mut CompileContext,
}

impl MediaParser<'_, '_> {
    fn error(&mut self, at: u32, message: String) -> Abort {
        let origin = Origin::new(
            Arc::clone(self.file),
            Span::new(at, self.reader.offset().max(at)),
        );
        self.ctx.error(Phase::Parser, message, origin);
        Abort
    }

    fn parse_term(&mut self) -> PResult<MediaQueryTerm> {
        self.reader.skip_trivia();
        let start = self.reader.offset();

        let mut term = MediaQueryTerm {
            qualifier: None,
            media_type: None,
            features: Vec::new(),
        };

        if self.reader.peek() == Some(b'(') {
            term.features.push(self.parse_feature(start)?);
        } else {
            let word = self.reader.read_ident();
            if word.is_empty() {
                return Err(self.error(start, "expected a media type".to_string()));
            }
            if word.eq_ignore_ascii_case("only") {
                term.qualifier = Some(Qualifier::Only);
            } else if word.eq_ignore_ascii_case("not") {
                term.qualifier = Some(Qualifier::Not);
            } else {
                term.media_type = Some(word.to_string());
            }
            if term.media_type.is_none() {
                self.reader.skip_trivia();
                let at = self.reader.offset();
                let media_type = self.reader.read_ident();
                if media_type.is_empty() {
                    return Err(self.error(at, "expected a media type".to_string()));
                }
                term.media_type = Some(media_type.to_string());
            }
        }

        loop {
            self.reader.skip_trivia();
            if !self.reader.peek_keyword_ci("and") {
                break;
            }
            self.reader.read_ident();
            self.reader.skip_trivia();
            let at = self.reader.offset();
            if self.reader.peek() != Some(b'(') {
                return Err(self.error(at, "expected `(` after `and`".to_string()));
            }
            term.features.push(self.parse_feature(at)?);
        }

        Ok(term)
    }

    /// Parse a `(name)` or `(name: value)` clause. The reader sits on `(`.
    fn parse_feature(&mut self, start: u32) -> PResult<MediaFeature> {
        self.reader.bump();
        let inner_base = self.reader.offset();
        let Some(inner) = self.reader.scan_parenthesized() else {
            return Err(self.error(start, "unbalanced `(` in media query".to_string()));
        };
        match inner.find(':') {
            Some(colon) => {
                let name = inner[..colon].trim();
                if name.is_empty() {
                    return Err(self.error(start, "expected a feature name".to_string()));
                }
                let value_text = &inner[colon + 1..];
                // `16/9` is a ratio here, not a division.
                if let Some(ratio) = as_ratio(value_text) {
                    return Ok(MediaFeature {
                        name: name.to_string(),
                        value: Some(Value::Ident(ratio)),
                    });
                }
                let value_base = inner_base + colon as u32 + 1;
                let value = parse_value(value_text, value_base, self.file, self.ctx)?;
                Ok(MediaFeature {
                    name: name.to_string(),
                    value: Some(value),
                })
            }
            None => {
                let name = inner.trim();
                if name.is_empty() {
                    return Err(self.error(start, "expected a feature name".to_string()));
                }
                Ok(MediaFeature {
                    name: name.to_string(),
                    value: None,
                })
            }
        }
    }
}

fn as_ratio(text: &str) -> Option<String> {
    let (num, den) = text.trim().split_once('/')?;
    let num = num.trim();
    let den = den.trim();
    let integral = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if integral(num) && integral(den) {
        Some(format!("{num}/{den}"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use indigo_ir::Unit;
    use indigo_session::{CompileOptions, FileCache, MemoryLookup};

    use super::*;

    fn parse(text: &str) -> Result<MediaQuery, Abort> {
        let mut ctx = CompileContext::new(
            PathBuf::from("test.icss"),
            CompileOptions::empty(),
            Arc::new(FileCache::new()),
            Arc::new(MemoryLookup::new()),
        );
        let file = Arc::new(PathBuf::from("test.icss"));
        parse_media_query(text, 0, &file, &mut ctx)
    }

    #[test]
    fn full_terms_parse() {
        let query = parse("only screen and (min-width: 768px)").unwrap();
        assert_eq!(query.terms.len(), 1);
        let term = &query.terms[0];
        assert_eq!(term.qualifier, Some(Qualifier::Only));
        assert_eq!(term.media_type.as_deref(), Some("screen"));
        assert_eq!(term.features.len(), 1);
        assert_eq!(term.features[0].name, "min-width");
        assert_eq!(
            term.features[0].value,
            Some(Value::dimension(768.0, Unit::Px))
        );
    }

    #[test]
    fn feature_only_terms_need_no_type() {
        let query = parse("(max-width: 480px)").unwrap();
        assert_eq!(query.terms[0].media_type, None);
        assert_eq!(query.terms[0].features.len(), 1);
    }

    #[test]
    fn comma_splits_terms() {
        let query = parse("screen, print and (color)").unwrap();
        assert_eq!(query.terms.len(), 2);
        assert_eq!(query.terms[1].features[0].name, "color");
        assert_eq!(query.terms[1].features[0].value, None);
    }

    #[test]
    fn spelling_variants_compare_equal() {
        let a = parse("only   SCREEN and (min-width: 768px)").unwrap();
        let b = parse("only screen and (min-width:768px)").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn ratios_survive_verbatim() {
        let query = parse("screen and (aspect-ratio: 16 / 9)").unwrap();
        assert_eq!(
            query.terms[0].features[0].value,
            Some(Value::ident("16/9"))
        );
    }

    #[test]
    fn malformed_queries_abort() {
        assert!(parse("").is_err());
        assert!(parse("screen and").is_err());
        assert!(parse("only").is_err());
        assert!(parse("screen and (").is_err());
    }
}
