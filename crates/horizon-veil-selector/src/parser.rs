//! Selector syntax parser using the `cssparser` crate.
//!
//! Parses comma-separated selector lists into [`SelectorList`] values. Unlike
//! stylesheet parsing, a selector list either parses completely or fails: a
//! list that matched only some of its alternatives would silently resolve
//! the wrong nodes.

use cssparser::{
    BasicParseErrorKind, ParseError, ParseErrorKind, Parser, ParserInput, SourceLocation, Token,
};

use crate::types::{
    AttributeSelector, Combinator, NthExpr, PseudoClass, Selector, SelectorList, SelectorPart,
    TypeSelector,
};
use crate::{Result, SelectorError};

type ParseResult<'i, T> = std::result::Result<T, ParseError<'i, String>>;

/// Parse a selector list such as `"#target, #target-2"`.
///
/// # Errors
///
/// Returns [`SelectorError::Empty`] for blank input and
/// [`SelectorError::Invalid`] for anything that is not a well-formed list.
///
/// # Example
///
/// ```
/// use horizon_veil_selector::{parse_selector_list, Combinator};
///
/// let list = parse_selector_list("#family > .item").unwrap();
/// assert_eq!(list.selectors[0].combinators, vec![Combinator::Child]);
/// ```
pub fn parse_selector_list(text: &str) -> Result<SelectorList> {
    if text.trim().is_empty() {
        return Err(SelectorError::Empty);
    }

    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let selectors = parser
        .parse_entirely(|p| p.parse_comma_separated(|p| parse_complex_selector(p)))
        .map_err(|err| to_selector_error(text, err))?;

    tracing::trace!(
        target: "horizon_veil_selector::parser",
        selector = text,
        alternatives = selectors.len(),
        "parsed selector list"
    );

    Ok(SelectorList { selectors })
}

/// Parse one complex selector: compounds joined by combinators.
fn parse_complex_selector<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Selector> {
    let mut parts = vec![];
    let mut combinators = vec![];
    let mut current = SelectorPart::default();
    let mut pending_descendant = false;

    parser.skip_whitespace();

    loop {
        let location = parser.current_source_location();
        let token = match parser.next_including_whitespace() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) => {
                // Whitespace only becomes a descendant combinator if another
                // compound follows it.
                if !current.is_empty() {
                    pending_descendant = true;
                }
            }

            Token::Delim(c @ ('>' | '+' | '~')) => {
                if current.is_empty() {
                    return Err(location
                        .new_custom_error(format!("Combinator '{c}' has no left-hand selector")));
                }
                parts.push(std::mem::take(&mut current));
                combinators.push(match c {
                    '>' => Combinator::Child,
                    '+' => Combinator::AdjacentSibling,
                    _ => Combinator::GeneralSibling,
                });
                pending_descendant = false;
            }

            other => {
                if pending_descendant {
                    parts.push(std::mem::take(&mut current));
                    combinators.push(Combinator::Descendant);
                    pending_descendant = false;
                }
                parse_simple_selector(parser, &mut current, other, location)?;
            }
        }
    }

    if current.is_empty() {
        let message = if parts.is_empty() {
            "Empty selector"
        } else {
            "Combinator has no right-hand selector"
        };
        return Err(parser.new_custom_error(message));
    }
    parts.push(current);

    Ok(Selector { parts, combinators })
}

/// Apply one simple selector token to the compound being built.
fn parse_simple_selector<'i>(
    parser: &mut Parser<'i, '_>,
    part: &mut SelectorPart,
    token: Token<'i>,
    location: SourceLocation,
) -> ParseResult<'i, ()> {
    match token {
        Token::Ident(name) => {
            if !part.is_empty() {
                return Err(location.new_custom_error(format!(
                    "Type selector '{name}' must come first in a compound selector"
                )));
            }
            part.type_selector = Some(TypeSelector::Type(name.to_ascii_lowercase()));
        }

        Token::Delim('*') => {
            if !part.is_empty() {
                return Err(location.new_custom_error("'*' must come first in a compound selector"));
            }
            part.type_selector = Some(TypeSelector::Universal);
        }

        Token::IDHash(id) | Token::Hash(id) => {
            if part.id.is_some() {
                return Err(location.new_custom_error(format!("Duplicate ID selector '#{id}'")));
            }
            part.id = Some(id.to_string());
        }

        Token::Delim('.') => {
            let class_location = parser.current_source_location();
            match parser.next_including_whitespace() {
                Ok(Token::Ident(class)) => part.classes.push(class.to_string()),
                Ok(other) => {
                    let other = other.clone();
                    return Err(class_location.new_unexpected_token_error(other));
                }
                Err(_) => {
                    return Err(class_location.new_custom_error("Expected class name after '.'"));
                }
            }
        }

        Token::SquareBracketBlock => {
            let attribute = parser.parse_nested_block(|p| parse_attribute_selector(p))?;
            part.attributes.push(attribute);
        }

        Token::Colon => {
            let pseudo_location = parser.current_source_location();
            let pseudo_token = match parser.next_including_whitespace() {
                Ok(t) => t.clone(),
                Err(_) => {
                    return Err(
                        pseudo_location.new_custom_error("Expected pseudo-class name after ':'")
                    );
                }
            };

            let pseudo = match pseudo_token {
                Token::Ident(name) => PseudoClass::from_css(&name).ok_or_else(|| {
                    pseudo_location.new_custom_error(format!("Unknown pseudo-class ':{name}'"))
                })?,
                Token::Function(name) if name.eq_ignore_ascii_case("nth-child") => {
                    let expr = parser.parse_nested_block(|p| parse_nth_expr(p))?;
                    PseudoClass::NthChild(expr)
                }
                Token::Function(name) if name.eq_ignore_ascii_case("not") => {
                    let inner = parser.parse_nested_block(|p| parse_compound_selector(p))?;
                    PseudoClass::Not(Box::new(inner))
                }
                Token::Function(name) => {
                    return Err(pseudo_location
                        .new_custom_error(format!("Unsupported functional pseudo-class ':{name}()'")));
                }
                other => return Err(pseudo_location.new_unexpected_token_error(other)),
            };
            part.pseudo_classes.push(pseudo);
        }

        other => return Err(location.new_unexpected_token_error(other)),
    }

    Ok(())
}

/// Parse a single compound selector (the argument of `:not()`).
fn parse_compound_selector<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, SelectorPart> {
    let mut part = SelectorPart::default();

    parser.skip_whitespace();

    loop {
        let location = parser.current_source_location();
        let token = match parser.next_including_whitespace() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };

        if let Token::WhiteSpace(_) = token {
            parser.expect_exhausted()?;
            break;
        }
        parse_simple_selector(parser, &mut part, token, location)?;
    }

    if part.is_empty() {
        return Err(parser.new_custom_error("Empty :not() argument"));
    }

    Ok(part)
}

/// Parse the inside of an attribute selector: `name` or `name=value`.
fn parse_attribute_selector<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, AttributeSelector> {
    let name = parser.expect_ident()?.to_ascii_lowercase();

    if parser.is_exhausted() {
        return Ok(AttributeSelector::Exists(name));
    }

    parser.expect_delim('=')?;
    let value = parser.expect_ident_or_string()?.to_string();
    parser.expect_exhausted()?;

    Ok(AttributeSelector::Equals(name, value))
}

/// Parse an `:nth-child()` argument (e.g., "odd", "even", "3", "2n+1").
fn parse_nth_expr<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, NthExpr> {
    let location = parser.current_source_location();
    let start = parser.position();
    while parser.next().is_ok() {}
    let text = parser.slice_from(start);

    parse_an_plus_b(text)
        .ok_or_else(|| location.new_custom_error(format!("Invalid nth-child expression '{text}'")))
}

/// Parse the An+B microsyntax from raw text.
fn parse_an_plus_b(text: &str) -> Option<NthExpr> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    match compact.as_str() {
        "odd" => return Some(NthExpr::odd()),
        "even" => return Some(NthExpr::even()),
        "" => return None,
        _ => {}
    }

    let Some(n_pos) = compact.find('n') else {
        return compact.parse().ok().map(|b| NthExpr::new(0, b));
    };

    let (a_text, rest) = compact.split_at(n_pos);
    let a = match a_text {
        "" | "+" => 1,
        "-" => -1,
        other => other.parse().ok()?,
    };

    let b_text = &rest[1..];
    let b = if b_text.is_empty() {
        0
    } else if b_text.starts_with('+') || b_text.starts_with('-') {
        b_text.parse().ok()?
    } else {
        return None;
    };

    Some(NthExpr::new(a, b))
}

fn to_selector_error(text: &str, err: ParseError<'_, String>) -> SelectorError {
    let message = match err.kind {
        ParseErrorKind::Custom(message) => message,
        ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => {
            format!("Unexpected token {:?}", token)
        }
        ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
            "Unexpected end of input".to_string()
        }
        ParseErrorKind::Basic(other) => format!("{:?}", other),
    };

    SelectorError::invalid(text, message, err.location.line + 1, err.location.column)
}
