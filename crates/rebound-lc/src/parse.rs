use crate::syntax::Term;
use logos::{Lexer, Logos};
use rebound_core::Fin;
use std::fmt;
use std::num::ParseIntError;
use std::ops::Range;
use std::rc::Rc;

#[derive(Default, Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid token at {0:?}")]
    InvalidToken(Range<usize>),
    #[error("invalid integer: {0}")]
    InvalidInteger(String),
    #[error("expected `)`")]
    MissingRParen,
    #[error("expected `→`")]
    MissingArrow,
    #[error("expected `=`")]
    MissingEquals,
    #[error("expected `in`")]
    MissingIn,
    #[error("expected a variable")]
    MissingVariable,
    #[error("expected a term")]
    MissingTerm,
    #[error("unknown variable %{0}")]
    UnknownVariable(String),
    #[error("free variable !{index} is outside of the scope of {scope} variables")]
    FreeVariableOutOfScope { index: usize, scope: usize },
    #[error("unexpected {0} after the end of the term")]
    TrailingInput(String),
    #[default]
    #[error("parse error")]
    Other,
}

impl Error {
    fn from_lexer(lex: &mut Lexer<'_, Token>) -> Self {
        Error::InvalidToken(lex.span())
    }
}

impl From<ParseIntError> for Error {
    fn from(err: ParseIntError) -> Self {
        use std::num::IntErrorKind::{NegOverflow, PosOverflow};
        match err.kind() {
            PosOverflow | NegOverflow => Error::InvalidInteger("overflow error".to_owned()),
            _ => Error::InvalidInteger("other error".to_owned()),
        }
    }
}

type ParseResult<T> = std::result::Result<T, Error>;

#[derive(Logos, Clone, Debug, Eq, PartialEq, Hash)]
#[logos(error(Error, Error::from_lexer))]
// Whitespace
#[logos(skip r"\p{Whitespace}+")]
// Comments
#[logos(skip r"//[^\r\n]*")]
// Ids
#[logos(subpattern id = r"[^\p{gc=Separator}\p{gc=Control}():;,=!?%→λ\\]+")]
pub enum Token {
    #[token("λ", priority = 4)]
    #[token("\\", priority = 4)]
    Lambda,
    #[token("(", priority = 10)]
    LParen,
    #[token(")", priority = 10)]
    RParen,
    #[token("→", priority = 5)]
    #[token("->", priority = 5)]
    Arrow,
    #[token(",", priority = 10)]
    Comma,
    #[token("=", priority = 10)]
    Equals,
    #[token("let", priority = 4)]
    Let,
    #[token("in", priority = 4)]
    In,
    #[regex(r"%(?&id)", priority = 4, callback = |lex| lex.slice()["%".len()..].to_owned())]
    Variable(String),
    #[regex(r"![0-9]+", priority = 4, callback = |lex| lex.slice()["!".len()..].parse())]
    FreeVariable(usize),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

struct State<'input> {
    /// The number of free variables the term may refer to.
    scope: usize,
    /// The names in scope. Each new name is pushed on the end.
    names: Vec<String>,
    /// The main lexer.
    lexer: Lexer<'input, Token>,
    /// The current token. We support single token peeking.
    token: Option<ParseResult<Token>>,
}

impl<'input> State<'input> {
    fn new(input: &'input str, scope: usize) -> State<'input> {
        let mut lexer = Token::lexer(input);
        let token = lexer.next();
        State {
            scope,
            names: Vec::new(),
            lexer,
            token,
        }
    }

    /// Peek at the current token.
    fn peek_token(&self) -> Option<ParseResult<Token>> {
        self.token.clone()
    }

    /// Advance to the next token.
    fn advance_token(&mut self) {
        self.token = self.lexer.next();
    }

    fn push_name(&mut self, name: String) {
        self.names.push(name);
    }

    /// Find a name in the environment, as an index into the current scope.
    fn find_name(&self, name: &str) -> Option<Fin> {
        let scope = self.current_scope();
        self.names
            .iter()
            .rev()
            .position(|n| n == name)
            .map(|i| Fin::new(i, scope))
    }

    fn names_depth(&self) -> usize {
        self.names.len()
    }

    fn reset_names(&mut self, depth: usize) {
        self.names.truncate(depth);
    }

    /// The free variables plus every name bound so far.
    fn current_scope(&self) -> usize {
        self.scope + self.names.len()
    }
}

fn p_token_opt(state: &mut State<'_>, token: Token) -> ParseResult<Option<()>> {
    match state.peek_token() {
        Some(Err(err)) => Err(err),
        Some(Ok(t)) if t == token => {
            state.advance_token();
            Ok(Some(()))
        }
        _ => Ok(None),
    }
}

fn p_token(state: &mut State<'_>, token: Token, err: Error) -> ParseResult<()> {
    match state.peek_token() {
        Some(Err(e)) => Err(e),
        Some(Ok(t)) if t == token => {
            state.advance_token();
            Ok(())
        }
        _ => Err(err),
    }
}

fn p_lparen_opt(state: &mut State) -> ParseResult<Option<()>> {
    p_token_opt(state, Token::LParen)
}

fn p_rparen_opt(state: &mut State) -> ParseResult<Option<()>> {
    p_token_opt(state, Token::RParen)
}

fn p_rparen(state: &mut State) -> ParseResult<()> {
    p_token(state, Token::RParen, Error::MissingRParen)
}

fn p_comma_opt(state: &mut State) -> ParseResult<Option<()>> {
    p_token_opt(state, Token::Comma)
}

fn p_arrow(state: &mut State) -> ParseResult<()> {
    p_token(state, Token::Arrow, Error::MissingArrow)
}

fn p_equals(state: &mut State) -> ParseResult<()> {
    p_token(state, Token::Equals, Error::MissingEquals)
}

fn p_in(state: &mut State) -> ParseResult<()> {
    p_token(state, Token::In, Error::MissingIn)
}

fn p_variable_opt(state: &mut State) -> ParseResult<Option<String>> {
    match state.peek_token() {
        Some(Err(err)) => Err(err),
        Some(Ok(Token::Variable(name))) => {
            state.advance_token();
            Ok(Some(name))
        }
        _ => Ok(None),
    }
}

fn p_variable(state: &mut State) -> ParseResult<String> {
    match p_variable_opt(state) {
        Err(e) => Err(e),
        Ok(Some(n)) => Ok(n),
        Ok(None) => Err(Error::MissingVariable),
    }
}

/// Parse the rest of a parenthesized term or a tuple, after the `(`.
fn p_parens(state: &mut State) -> ParseResult<Term> {
    if p_rparen_opt(state)?.is_some() {
        return Ok(Term::tuple(Vec::new()));
    }
    let first = p_term(state)?;
    if p_comma_opt(state)?.is_none() {
        p_rparen(state)?;
        return Ok(first);
    }
    let mut elements = vec![Rc::new(first)];
    while let Some(term) = p_term_opt(state)? {
        elements.push(Rc::new(term));
        if p_comma_opt(state)?.is_none() {
            break;
        }
    }
    p_rparen(state)?;
    Ok(Term::tuple(elements))
}

fn p_lambda(state: &mut State) -> ParseResult<Term> {
    let depth = state.names_depth();
    let mut i = 0;
    while let Some(var) = p_variable_opt(state)? {
        i += 1;
        state.push_name(var);
    }
    if i == 0 {
        return Err(Error::MissingVariable);
    }
    p_arrow(state)?;
    let body = p_term(state)?;
    state.reset_names(depth);
    // Build nested lambdas from right to left
    let outer = state.current_scope();
    let mut result = body;
    for j in (0..i).rev() {
        result = Term::lambda(result, outer + j);
    }
    Ok(result)
}

/// Parse the rest of a `let`, either a plain one or a tuple split.
fn p_let(state: &mut State) -> ParseResult<Term> {
    let scope = state.current_scope();
    let depth = state.names_depth();
    if p_lparen_opt(state)?.is_some() {
        let mut names = Vec::new();
        if p_rparen_opt(state)?.is_none() {
            loop {
                names.push(p_variable(state)?);
                if p_comma_opt(state)?.is_none() {
                    break;
                }
            }
            p_rparen(state)?;
        }
        p_equals(state)?;
        let scrutinee = p_term(state)?;
        p_in(state)?;
        let arity = names.len();
        // The first component is the innermost variable of the body.
        for name in names.into_iter().rev() {
            state.push_name(name);
        }
        let body = p_term(state)?;
        state.reset_names(depth);
        Ok(Term::split(Rc::new(scrutinee), arity, body, scope))
    } else {
        let name = p_variable(state)?;
        p_equals(state)?;
        let value = p_term(state)?;
        p_in(state)?;
        state.push_name(name);
        let body = p_term(state)?;
        state.reset_names(depth);
        Ok(Term::let_in(Rc::new(value), body, scope))
    }
}

// Parse an atomic term (no operators)
fn p_atom_opt(state: &mut State) -> ParseResult<Option<Term>> {
    match state.peek_token() {
        Some(Err(err)) => Err(err),
        Some(Ok(token)) => match token {
            Token::LParen => {
                state.advance_token();
                p_parens(state).map(Some)
            }
            Token::Lambda => {
                state.advance_token();
                p_lambda(state).map(Some)
            }
            Token::Let => {
                state.advance_token();
                p_let(state).map(Some)
            }
            Token::Variable(name) => {
                state.advance_token();
                match state.find_name(&name) {
                    Some(index) => Ok(Some(Term::variable(index))),
                    None => Err(Error::UnknownVariable(name)),
                }
            }
            Token::FreeVariable(n) => {
                state.advance_token();
                // Free variables are counted past every bound name.
                if n >= state.scope {
                    return Err(Error::FreeVariableOutOfScope {
                        index: n,
                        scope: state.scope,
                    });
                }
                let index = Fin::new(state.names_depth() + n, state.current_scope());
                Ok(Some(Term::variable(index)))
            }
            _ => Ok(None),
        },
        None => Ok(None),
    }
}

// Parse application (left-associative): a b c => (a b) c
fn p_application_opt(state: &mut State) -> ParseResult<Option<Term>> {
    let Some(mut result) = p_atom_opt(state)? else {
        return Ok(None);
    };

    // Keep parsing atoms and building left-associative applications
    while let Some(arg) = p_atom_opt(state)? {
        result = Term::application(Rc::new(result), Rc::new(arg));
    }

    Ok(Some(result))
}

fn p_term_opt(state: &mut State) -> ParseResult<Option<Term>> {
    p_application_opt(state)
}

fn p_term(state: &mut State) -> ParseResult<Term> {
    match p_term_opt(state) {
        Err(err) => Err(err),
        Ok(None) => Err(Error::MissingTerm),
        Ok(Some(term)) => Ok(term),
    }
}

/// Parse a term with `scope` free variables, written `!0` to `!{scope - 1}`.
pub fn parse_term(input: &str, scope: usize) -> ParseResult<Term> {
    let mut state = State::new(input, scope);
    let term = p_term(&mut state)?;
    match state.peek_token() {
        None => Ok(term),
        Some(Err(err)) => Err(err),
        Some(Ok(token)) => Err(Error::TrailingInput(token.to_string())),
    }
}
