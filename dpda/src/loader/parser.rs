use crate::loader::log::LogSink;
use crate::loader::{Context, Span};

use super::lexer::Token as T;
use crate::loader::Spanned as S;

use super::ast::*;
use super::lexer::Lexer;

pub const TRANSITION_FUNCTION: &str = "transition_function";

/// One non-blank, non-comment line of the definition.
#[derive(Clone, Debug)]
struct Line<'a> {
    /// Leading whitespace measured in characters.
    indent: usize,
    tokens: Vec<S<T<'a>>>,
}

impl<'a> Line<'a> {
    fn span(&self) -> Span {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => first.1.join(last.1),
            _ => Span(0, 0),
        }
    }

    fn end(&self) -> Span {
        let end = self.span().1;
        Span(end, end)
    }
}

/// Groups the token stream into lines and turns them into sections.
///
/// Nesting inside `transition_function` is decided purely by comparing the
/// indentation depth of each line with the section label and with the first
/// state header of the block: headers sit deeper than the label, transition
/// lines sit deeper than their header.
pub struct Parser<'a, 'b> {
    lines: std::iter::Peekable<std::vec::IntoIter<Line<'a>>>,
    ctx: &'b mut Context<'a>,
}

impl<'a, 'b> Iterator for Parser<'a, 'b> {
    type Item = S<TopLevel<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_element()
    }
}

impl<'a, 'b> Parser<'a, 'b> {
    pub fn new(ctx: &'b mut Context<'a>) -> Self {
        let src = ctx.src();
        let mut lines = Vec::new();
        let mut line_begin = 0;
        let mut tokens = Vec::new();

        for S(tok, span) in Lexer::new(src) {
            match tok {
                Ok(T::Comment(_)) => {}
                Ok(T::LineEnd) => {
                    Self::push_line(src, &mut lines, line_begin, std::mem::take(&mut tokens));
                    line_begin = span.1;
                }
                Ok(tok) => tokens.push(S(tok, span)),
                Err(err) => _ = ctx.emit_error(format!("lexer: {err:?}"), span),
            }
        }
        Self::push_line(src, &mut lines, line_begin, tokens);

        Parser {
            lines: lines.into_iter().peekable(),
            ctx,
        }
    }

    fn push_line(src: &'a str, lines: &mut Vec<Line<'a>>, line_begin: usize, tokens: Vec<S<T<'a>>>) {
        let Some(S(_, first)) = tokens.first() else {
            return;
        };
        let indent = src.get(line_begin..first.0).unwrap_or("").chars().count();
        lines.push(Line { indent, tokens });
    }

    fn parse_idents(&mut self, tokens: &[S<T<'a>>], end: Span) -> Option<Vec<S<&'a str>>> {
        let mut items = Vec::new();
        if tokens.is_empty() {
            return Some(items);
        }

        let mut expect_ident = true;
        for &S(tok, span) in tokens {
            match (expect_ident, tok) {
                (true, T::Ident(ident)) => items.push(S(ident, span)),
                (false, T::Comma) => {}
                (true, got) => {
                    self.ctx.emit_error(
                        format!("unexpected {:#} expected {:}", got, T::Ident("")),
                        span,
                    );
                    return None;
                }
                (false, got) => {
                    self.ctx.emit_error(
                        format!("unexpected {:#} expected {:}", got, T::Comma),
                        span,
                    );
                    return None;
                }
            }
            expect_ident = !expect_ident;
        }

        if expect_ident {
            self.ctx
                .emit_error(format!("unexpected eol expected {:}", T::Ident("")), end);
            return None;
        }
        Some(items)
    }

    fn parse_transition(&mut self, line: &Line<'a>) -> Option<S<Transition<'a>>> {
        let span = line.span();
        match &line.tokens[..] {
            [
                S(T::LPar, _),
                S(T::Ident(letter), letter_span),
                S(T::Comma, _),
                S(T::Ident(top), top_span),
                S(T::RPar, _),
                S(T::Arrow, _),
                S(T::Ident(next), next_span),
                S(T::LBracket, push_start),
                rest @ ..,
            ] => {
                let Some(close) = rest.iter().position(|tok| tok.0 == T::RBracket) else {
                    self.ctx.emit_error(
                        format!("unexpected eol expected list close ( {:} )", T::RBracket),
                        line.end(),
                    );
                    return None;
                };
                if let Some(S(got, extra)) = rest.get(close + 1) {
                    self.ctx.emit_error(format!("unexpected {got:#} expected eol"), *extra);
                    return None;
                }
                let push_end = rest[close].1;
                let push = self.parse_idents(&rest[..close], Span(push_end.0, push_end.0))?;

                Some(S(
                    Transition {
                        letter: S(*letter, *letter_span),
                        top: S(*top, *top_span),
                        next: S(*next, *next_span),
                        push: S(push, push_start.join(push_end)),
                    },
                    span,
                ))
            }
            _ => {
                self.ctx
                    .emit_error(
                        "expected transition (<letter>, <stack top>) -> <state> [<symbol>, ...]",
                        span,
                    )
                    .emit_help_locless("an empty replacement is written as []");
                None
            }
        }
    }

    fn parse_transition_block(&mut self, label: S<&'a str>, label_indent: usize) -> S<TopLevel<'a>> {
        let mut groups: Vec<S<StateGroup<'a>>> = Vec::new();
        let mut header_indent = None;
        // false while the lines under a broken header are being skipped
        let mut in_group = false;
        let mut span = label.1;

        while let Some(line) = self.lines.next_if(|line| line.indent > label_indent) {
            span = span.join(line.span());
            match header_indent {
                Some(header) if line.indent > header => {
                    let Some(transition) = self.parse_transition(&line) else {
                        continue;
                    };
                    if let Some(S(group, group_span)) = groups.last_mut().filter(|_| in_group) {
                        *group_span = group_span.join(transition.1);
                        group.transitions.push(transition);
                    }
                }
                Some(header) if line.indent < header => {
                    self.ctx.emit_error(
                        "state header is indented less than the previous state headers",
                        line.span(),
                    );
                    in_group = false;
                }
                _ => {
                    header_indent = Some(line.indent);
                    match &line.tokens[..] {
                        [S(T::Ident(state), state_span), S(T::Colon, colon)] => {
                            groups.push(S(
                                StateGroup {
                                    state: S(*state, *state_span),
                                    transitions: Vec::new(),
                                },
                                state_span.join(*colon),
                            ));
                            in_group = true;
                        }
                        _ => {
                            self.ctx
                                .emit_error("expected state header '<state>:'", line.span())
                                .emit_help_locless(
                                    "transition lines must be indented under a state header",
                                );
                            in_group = false;
                        }
                    }
                }
            }
        }

        S(TopLevel::TransitionFunction(label, groups), span)
    }

    pub fn next_element(&mut self) -> Option<S<TopLevel<'a>>> {
        loop {
            let line = self.lines.next()?;
            match &line.tokens[..] {
                [S(T::Ident(TRANSITION_FUNCTION), label), S(T::Colon, _), rest @ ..] => {
                    if let Some(S(got, span)) = rest.first() {
                        self.ctx.emit_error(format!("unexpected {got:#} expected eol"), *span);
                    }
                    return Some(self.parse_transition_block(S(TRANSITION_FUNCTION, *label), line.indent));
                }
                [S(T::Ident(name), label), S(T::Colon, colon), rest @ ..] => {
                    let end = line.end();
                    let Some(items) = self.parse_idents(rest, end) else {
                        continue;
                    };
                    let list_span = match (items.first(), items.last()) {
                        (Some(first), Some(last)) => first.1.join(last.1),
                        _ => Span(colon.1, colon.1),
                    };
                    return Some(S(
                        TopLevel::List(S(*name, *label), S(items, list_span)),
                        line.span(),
                    ));
                }
                _ => {
                    self.ctx
                        .emit_error("expected section '<label>: ...'", line.span());
                }
            }
        }
    }
}
