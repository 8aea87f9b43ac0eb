use std::{fmt, vec};

use derive_more::Display;
use itertools::Itertools;
use tracing::trace;

use crate::{AND, CLOSER, ESCAPE, OR, QUOTE};

/// A parsed query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    /// Files directly in a directory.
    Dir(String),
    /// Files in every child.
    And(Vec<Node>),
    /// Files in any child.
    Or(Vec<Node>),
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Operator {
    #[display(fmt = "AND")]
    And,
    #[display(fmt = "OR")]
    Or,
}

impl Operator {
    fn node(self, children: Vec<Node>) -> Node {
        match self {
            Operator::And => Node::And(children),
            Operator::Or => Node::Or(children),
        }
    }
}

/// Offsets are byte offsets into the query.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Query is empty")]
    Empty,
    #[error("Quote at {0} is never closed")]
    UnclosedQuote(usize),
    #[error("`{CLOSER}` at {0} does not close an `{AND}` or `{OR}`")]
    UnexpectedCloser(usize),
    #[error("`{operator}` at {offset} is never closed by `{CLOSER}`")]
    Unterminated { operator: Operator, offset: usize },
    #[error("`{operator}` at {offset} has no terms")]
    EmptyGroup { operator: Operator, offset: usize },
    #[error("Query has {count} terms starting at {offset}. Combine them with `{AND}` or `{OR}`.")]
    MultipleTerms { count: usize, offset: usize },
}

/// Parse a query like `AND foo OR bar baz ) )`.
pub fn parse_query(query: &str) -> Result<Node, ParseError> {
    let mut tokens = tokenize(query)?.into_iter();
    let terms = parse_terms(&mut tokens, None)?;
    let count = terms.len();
    let mut terms = terms.into_iter();
    match (terms.next(), terms.next()) {
        (None, _) => Err(ParseError::Empty),
        (Some((_, node)), None) => {
            trace!("Parsed `{query}` as `{node}`");
            Ok(node)
        }
        (Some(_), Some((offset, _))) => Err(ParseError::MultipleTerms { count, offset }),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Token {
    text: String,
    offset: usize,
}

/// Split `query` on whitespace.
///
/// Quoted text is taken literally,
/// including whitespace,
/// and joins any text it touches.
fn tokenize(query: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = query.char_indices().peekable();
    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut text = String::new();
        while let Some((i, c)) = chars.next_if(|(_, c)| !c.is_whitespace()) {
            if c == QUOTE {
                loop {
                    match chars.next() {
                        Some((_, QUOTE)) => break,
                        Some((_, c)) => text.push(c),
                        None => return Err(ParseError::UnclosedQuote(i)),
                    }
                }
            } else {
                text.push(c);
            }
        }
        tokens.push(Token { text, offset });
    }
    Ok(tokens)
}

fn parse_terms(
    tokens: &mut vec::IntoIter<Token>,
    group: Option<(Operator, usize)>,
) -> Result<Vec<(usize, Node)>, ParseError> {
    let mut terms = Vec::new();
    loop {
        let Some(Token { text, offset }) = tokens.next() else {
            return match group {
                None => Ok(terms),
                Some((operator, offset)) => Err(ParseError::Unterminated { operator, offset }),
            };
        };
        let node = match text.as_str() {
            CLOSER => {
                return match group {
                    None => Err(ParseError::UnexpectedCloser(offset)),
                    Some((operator, offset)) if terms.is_empty() => {
                        Err(ParseError::EmptyGroup { operator, offset })
                    }
                    Some(_) => Ok(terms),
                }
            }
            AND => parse_group(tokens, Operator::And, offset)?,
            OR => parse_group(tokens, Operator::Or, offset)?,
            _ => Node::Dir(unescape(&text).to_owned()),
        };
        terms.push((offset, node));
    }
}

fn parse_group(
    tokens: &mut vec::IntoIter<Token>,
    operator: Operator,
    offset: usize,
) -> Result<Node, ParseError> {
    // Queries can nest arbitrarily deep.
    let children = stacker::maybe_grow(32 * 1024, 1024 * 1024, || {
        parse_terms(tokens, Some((operator, offset)))
    })?;
    Ok(operator.node(children.into_iter().map(|(_, node)| node).collect()))
}

/// Remove exactly one leading escape,
/// if present.
fn unescape(word: &str) -> &str {
    word.strip_prefix(ESCAPE).unwrap_or(word)
}

/// Escape and quote `name`
/// so it parses back to a `Dir` of `name`.
///
/// Names containing quotes cannot be written in a query.
fn escape(name: &str) -> String {
    let escaped = if [AND, OR, CLOSER].contains(&name) || name.starts_with(ESCAPE) {
        format!("{ESCAPE}{name}")
    } else {
        name.to_owned()
    };
    if escaped.is_empty() || escaped.contains(char::is_whitespace) {
        format!("{QUOTE}{escaped}{QUOTE}")
    } else {
        escaped
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Dir(name) => write!(f, "{}", escape(name)),
            Node::And(children) => write!(f, "{AND} {} {CLOSER}", children.iter().format(" ")),
            Node::Or(children) => write!(f, "{OR} {} {CLOSER}", children.iter().format(" ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::{prelude::*, test_runner::FileFailurePersistence};
    use test_strategy::proptest;

    use super::*;

    fn dir(name: &str) -> Node {
        Node::Dir(name.to_owned())
    }

    #[test]
    fn parse_query_parses_and() {
        assert_eq!(
            parse_query("AND A B C )").unwrap(),
            Node::And(vec![dir("A"), dir("B"), dir("C")])
        );
    }

    #[test]
    fn parse_query_parses_or() {
        assert_eq!(
            parse_query("OR A B C )").unwrap(),
            Node::Or(vec![dir("A"), dir("B"), dir("C")])
        );
    }

    #[test]
    fn parse_query_parses_a_single_dir() {
        assert_eq!(parse_query("  A ").unwrap(), dir("A"));
    }

    #[test]
    fn parse_query_removes_one_escape() {
        assert_eq!(
            parse_query(r"AND '\AND' '\\AND' '\\\AND' )").unwrap(),
            Node::And(vec![dir("AND"), dir(r"\AND"), dir(r"\\AND")])
        );
        assert_eq!(
            parse_query(r"OR \OR \) \\ )").unwrap(),
            Node::Or(vec![dir("OR"), dir(")"), dir(r"\")])
        );
    }

    #[test]
    fn parse_query_parses_nested_groups() {
        assert_eq!(
            parse_query("AND A B C OR spam eggs ) )").unwrap(),
            Node::And(vec![
                dir("A"),
                dir("B"),
                dir("C"),
                Node::Or(vec![dir("spam"), dir("eggs")])
            ])
        );
    }

    #[test]
    fn parse_query_parses_quoted_whitespace() {
        assert_eq!(
            parse_query("OR 'foo bar' //baz' 'qux '' )").unwrap(),
            Node::Or(vec![dir("foo bar"), dir("//baz qux"), dir("")])
        );
    }

    #[test]
    fn parse_query_recognizes_quoted_keywords() {
        assert_eq!(parse_query("'AND' A ')'").unwrap(), Node::And(vec![dir("A")]));
    }

    #[test]
    fn parse_query_parses_deeply_nested_groups() {
        let depth = 1_000;
        let query = format!("{}A{}", "AND ".repeat(depth), " )".repeat(depth));
        let mut node = &parse_query(&query).unwrap();
        for _ in 0..depth {
            match node {
                Node::And(children) => node = &children[0],
                _ => panic!("expected `AND`"),
            }
        }
        assert_eq!(node, &dir("A"));
    }

    #[test]
    fn parse_query_errors_on_empty_query() {
        assert_eq!(parse_query(""), Err(ParseError::Empty));
        assert_eq!(parse_query(" \t\n"), Err(ParseError::Empty));
    }

    #[test]
    fn parse_query_errors_on_unexpected_closer() {
        assert_eq!(parse_query(")"), Err(ParseError::UnexpectedCloser(0)));
        assert_eq!(
            parse_query("AND A ) )"),
            Err(ParseError::UnexpectedCloser(8))
        );
    }

    #[test]
    fn parse_query_errors_on_unterminated_group() {
        assert_eq!(
            parse_query("AND A OR B )"),
            Err(ParseError::Unterminated {
                operator: Operator::And,
                offset: 0
            })
        );
        assert_eq!(
            parse_query("AND A OR B"),
            Err(ParseError::Unterminated {
                operator: Operator::Or,
                offset: 6
            })
        );
    }

    #[test]
    fn parse_query_errors_on_empty_group() {
        assert_eq!(
            parse_query("OR )"),
            Err(ParseError::EmptyGroup {
                operator: Operator::Or,
                offset: 0
            })
        );
    }

    #[test]
    fn parse_query_errors_on_multiple_terms() {
        assert_eq!(
            parse_query("A B C"),
            Err(ParseError::MultipleTerms {
                count: 3,
                offset: 2
            })
        );
        assert_eq!(
            parse_query("AND A ) B"),
            Err(ParseError::MultipleTerms {
                count: 2,
                offset: 8
            })
        );
    }

    #[test]
    fn parse_query_errors_on_unclosed_quote() {
        assert_eq!(
            parse_query("OR A 'B )"),
            Err(ParseError::UnclosedQuote(5))
        );
    }

    #[test]
    fn display_writes_query() {
        assert_eq!(
            Node::And(vec![
                dir("A"),
                dir("AND"),
                dir(r"\B"),
                dir("foo bar"),
                Node::Or(vec![dir(")"), dir("")])
            ])
            .to_string(),
            r"AND A \AND \\B 'foo bar' OR \) '' ) )"
        );
    }

    #[proptest(failure_persistence = Some(Box::new(FileFailurePersistence::Off)))]
    fn parse_query_removes_exactly_one_escape(#[strategy(r"\\{0,3}[A-Za-z )\\]{0,8}")] name: String) {
        prop_assert_eq!(
            parse_query(&format!("OR '{ESCAPE}{name}' )")).unwrap(),
            Node::Or(vec![Node::Dir(name)])
        );
    }

    #[proptest(failure_persistence = Some(Box::new(FileFailurePersistence::Off)))]
    fn parse_query_parses_display(node: ArbitraryNode) {
        let node = node.0;
        prop_assert_eq!(parse_query(&node.to_string()).unwrap(), node);
    }

    #[derive(Debug)]
    struct ArbitraryNode(Node);

    impl Arbitrary for ArbitraryNode {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            "[A-Za-z )\\\\]{0,8}"
                .prop_map(Node::Dir)
                .prop_recursive(4, 32, 4, |inner| {
                    prop_oneof![
                        prop::collection::vec(inner.clone(), 1..4).prop_map(Node::And),
                        prop::collection::vec(inner, 1..4).prop_map(Node::Or),
                    ]
                })
                .prop_map(ArbitraryNode)
                .boxed()
        }
    }
}
