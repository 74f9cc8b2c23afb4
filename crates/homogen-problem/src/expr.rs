//! Term expression syntax.
//!
//! A lexer turns the source into spanned tokens and a parser over those
//! tokens builds the [`Expr`] tree:
//!
//! ```text
//! sum     := product (('+' | '-') product)*
//! product := unary (('*' | '/') unary)*
//! unary   := '-'* atom
//! atom    := NUMBER | IDENT | IDENT '(' [sum (',' sum)*] ')' | '(' sum ')'
//! ```

use std::fmt;

use chumsky::{input::ValueInput, prelude::*};

use homogen_core::TermError;

pub type Span = SimpleSpan;
type Spanned<T> = (T, Span);
type ParseError<'src, T> = Rich<'src, T, Span>;

/// Deepest accepted expression, counting parentheses and tree levels.
pub const MAX_DEPTH: usize = 256;

/// Longest accepted expression, in tokens.
pub const MAX_TOKENS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
        }
    }
}

/// Parsed term expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Ident(String),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Number of levels of the tree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((expr, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            match expr {
                Self::Number(_) | Self::Ident(_) => {}
                Self::Neg(inner) => stack.push((inner, depth + 1)),
                Self::Binary { lhs, rhs, .. } => {
                    stack.push((lhs, depth + 1));
                    stack.push((rhs, depth + 1));
                }
                Self::Call { args, .. } => stack.extend(args.iter().map(|arg| (arg, depth + 1))),
            }
        }
        deepest
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'src> {
    Number(f64),
    Identifier(&'src str),
    Plus,
    Minus,
    Asterisk,
    Slash,
    BracketRoundOpen,
    BracketRoundClose,
    Comma,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{}", number),
            Self::Identifier(identifier) => f.write_str(identifier),
            Self::Plus => f.write_str("+"),
            Self::Minus => f.write_str("-"),
            Self::Asterisk => f.write_str("*"),
            Self::Slash => f.write_str("/"),
            Self::BracketRoundOpen => f.write_str("("),
            Self::BracketRoundClose => f.write_str(")"),
            Self::Comma => f.write_str(","),
        }
    }
}

/// Parse a term expression.
pub fn parse(source: &str) -> Result<Expr, TermError> {
    if source.trim().is_empty() {
        return Err(TermError::parse(source, "empty expression"));
    }

    let tokens = lexer()
        .parse(source)
        .into_result()
        .map_err(|errors| parse_error(source, errors))?;
    check_size(source, &tokens)?;

    let eoi = Span::from(source.len()..source.len());
    let expr = parser()
        .parse(tokens.as_slice().map(eoi, |(token, span)| (token, span)))
        .into_result()
        .map_err(|errors| parse_error(source, errors))?;
    if expr.depth() > MAX_DEPTH {
        return Err(too_deep(source));
    }
    Ok(expr)
}

pub fn lexer<'src>()
-> impl Parser<'src, &'src str, Vec<Spanned<Token<'src>>>, extra::Err<ParseError<'src, char>>> {
    let exponent = one_of("eE")
        .then(one_of("+-").or_not())
        .then(text::digits(10));

    // 1, 1., 1.5, .5, each with an optional exponent
    let number = choice((
        text::digits(10)
            .then(just('.').then(text::digits(10).or_not()).or_not())
            .ignored(),
        just('.').then(text::digits(10)).ignored(),
    ))
    .then(exponent.or_not())
    .to_slice()
    .try_map(|number: &str, span| {
        number
            .parse()
            .map(Token::Number)
            .map_err(|_| ParseError::custom(span, format!("invalid number '{number}'")))
    });

    let identifier = text::ascii::ident().map(Token::Identifier);

    let operator = choice((
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Asterisk),
        just('/').to(Token::Slash),
    ));

    let control = choice((
        just('(').to(Token::BracketRoundOpen),
        just(')').to(Token::BracketRoundClose),
        just(',').to(Token::Comma),
    ));

    choice((number, identifier, operator, control))
        .map_with(|token, extra| (token, extra.span()))
        .padded()
        .repeated()
        .collect()
}

pub fn parser<'src, I>() -> impl Parser<'src, I, Expr, extra::Err<ParseError<'src, Token<'src>>>>
where
    I: ValueInput<'src, Token = Token<'src>, Span = Span>,
{
    recursive(|sum| {
        let bracket_round_open = just(Token::BracketRoundOpen);
        let bracket_round_close = just(Token::BracketRoundClose);

        let number = select! { Token::Number(number) => Expr::Number(number) };
        let identifier = select! { Token::Identifier(identifier) => identifier };

        let arguments = sum
            .clone()
            .separated_by(just(Token::Comma))
            .collect::<Vec<_>>()
            .delimited_by(bracket_round_open.clone(), bracket_round_close.clone());

        let call_or_variable = identifier
            .then(arguments.or_not())
            .map(|(name, arguments)| match arguments {
                Some(args) => Expr::Call {
                    function: name.to_string(),
                    args,
                },
                None => Expr::Ident(name.to_string()),
            });

        let atom = choice((
            number,
            call_or_variable,
            sum.delimited_by(bracket_round_open, bracket_round_close),
        ))
        .boxed();

        let unary = just(Token::Minus)
            .repeated()
            .foldr(atom, |_, operand| Expr::Neg(Box::new(operand)))
            .boxed();

        let product_operator = choice((
            just(Token::Asterisk).to(BinOp::Mul),
            just(Token::Slash).to(BinOp::Div),
        ));
        let product = unary
            .clone()
            .foldl(product_operator.then(unary).repeated(), |lhs, (op, rhs)| {
                Expr::binary(op, lhs, rhs)
            })
            .boxed();

        let sum_operator = choice((
            just(Token::Plus).to(BinOp::Add),
            just(Token::Minus).to(BinOp::Sub),
        ));
        product
            .clone()
            .foldl(sum_operator.then(product).repeated(), |lhs, (op, rhs)| {
                Expr::binary(op, lhs, rhs)
            })
    })
}

/// Reject token streams that would build an unreasonably deep or large tree.
fn check_size(source: &str, tokens: &[Spanned<Token<'_>>]) -> Result<(), TermError> {
    let mut depth = 0usize;
    for (token, _) in tokens {
        match token {
            Token::BracketRoundOpen => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(too_deep(source));
                }
            }
            Token::BracketRoundClose => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    if tokens.len() > MAX_TOKENS {
        return Err(TermError::parse(
            source,
            format!("expression is longer than {} tokens", MAX_TOKENS),
        ));
    }
    Ok(())
}

fn too_deep(source: &str) -> TermError {
    TermError::parse(source, "expression nested too deeply")
}

fn parse_error<T: fmt::Display>(source: &str, errors: Vec<ParseError<'_, T>>) -> TermError {
    let reason = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    TermError::parse(source, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.into()))
    }

    fn parse_reason(source: &str) -> String {
        match parse(source) {
            Err(TermError::Parse { reason, .. }) => reason,
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn lexes_tokens_with_spans() {
        let tokens = lexer().parse("integrate(u) / 2").into_result().unwrap();
        let kinds: Vec<Token> = tokens.iter().map(|(token, _)| *token).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Identifier("integrate"),
                Token::BracketRoundOpen,
                Token::Identifier("u"),
                Token::BracketRoundClose,
                Token::Slash,
                Token::Number(2.0),
            ]
        );
        assert_eq!(tokens[4].1, Span::from(13..14));
    }

    #[test]
    fn number_forms() {
        for (source, value) in [("2", 2.0), ("1.", 1.0), (".5", 0.5), ("2.5e-1", 0.25), ("1E3", 1000.0)] {
            assert_eq!(parse(source).unwrap(), Expr::Number(value), "{source}");
        }
    }

    #[test]
    fn precedence() {
        let e = parse("a + b * c").unwrap();
        assert_eq!(
            e,
            Expr::Binary {
                op: BinOp::Add,
                lhs: ident("a"),
                rhs: Box::new(Expr::Binary {
                    op: BinOp::Mul,
                    lhs: ident("b"),
                    rhs: ident("c"),
                }),
            }
        );
    }

    #[test]
    fn left_associative() {
        let e = parse("a - b - c").unwrap();
        let Expr::Binary { op, lhs, rhs } = e else {
            panic!("expected binary");
        };
        assert_eq!(op, BinOp::Sub);
        assert_eq!(rhs, ident("c"));
        assert!(matches!(*lhs, Expr::Binary { op: BinOp::Sub, .. }));
    }

    #[test]
    fn calls_and_numbers() {
        let e = parse("integrate(2.5e-1 * u) / volume").unwrap();
        let Expr::Binary { op, lhs, rhs } = e else {
            panic!("expected binary");
        };
        assert_eq!(op, BinOp::Div);
        assert_eq!(rhs, ident("volume"));
        let Expr::Call { function, args } = *lhs else {
            panic!("expected call");
        };
        assert_eq!(function, "integrate");
        assert_eq!(
            args,
            vec![Expr::Binary {
                op: BinOp::Mul,
                lhs: Box::new(Expr::Number(0.25)),
                rhs: ident("u"),
            }]
        );
    }

    #[test]
    fn unary_minus_and_parens() {
        assert_eq!(
            parse("-(a + 1)").unwrap(),
            Expr::Neg(Box::new(Expr::Binary {
                op: BinOp::Add,
                lhs: ident("a"),
                rhs: Box::new(Expr::Number(1.0)),
            }))
        );
        assert_eq!(parse("--a").unwrap(), Expr::Neg(Box::new(Expr::Neg(ident("a")))));
    }

    #[test]
    fn multi_argument_call() {
        let e = parse("dot(a, outer(b, c))").unwrap();
        let Expr::Call { function, args } = e else {
            panic!("expected call");
        };
        assert_eq!(function, "dot");
        assert_eq!(args.len(), 2);
        assert!(matches!(&args[1], Expr::Call { function, .. } if function == "outer"));
        assert_eq!(parse("f()").unwrap(), Expr::Call { function: "f".into(), args: vec![] });
    }

    #[test]
    fn errors_are_reported() {
        assert_eq!(parse_reason("   "), "empty expression");
        for source in ["a +", "f(a b)", "(a", "a $ b", "a b", "1 2", ")"] {
            assert!(parse(source).is_err(), "{source} should not parse");
        }
    }

    #[test]
    fn depth_counts_tree_levels() {
        assert_eq!(parse("a").unwrap().depth(), 1);
        assert_eq!(parse("((a))").unwrap().depth(), 1);
        assert_eq!(parse("-a * b").unwrap().depth(), 3);
        assert_eq!(parse("f(g(h(x)))").unwrap().depth(), 4);
    }

    #[test]
    fn deep_parentheses_rejected() {
        let source = format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000));
        assert_eq!(parse_reason(&source), "expression nested too deeply");

        let at_limit = format!("{}1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(parse(&at_limit).unwrap(), Expr::Number(1.0));
    }

    #[test]
    fn deep_trees_rejected() {
        let negations = format!("{}x", "-".repeat(MAX_DEPTH + 1));
        assert_eq!(parse_reason(&negations), "expression nested too deeply");

        let chain = vec!["1"; 300].join(" + ");
        assert_eq!(parse_reason(&chain), "expression nested too deeply");

        let long = vec!["1"; MAX_TOKENS].join("+");
        assert_eq!(
            parse_reason(&long),
            format!("expression is longer than {} tokens", MAX_TOKENS)
        );
    }
}
