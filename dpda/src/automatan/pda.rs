use std::collections::HashMap;
use std::fmt::Display;

use indexmap::IndexMap;

use super::*;

use crate::loader::{
    ALPHABET, Context, FINAL_STATES, INITIAL_STATE, REJECTING_STATES, STACK_ALPHABET, STATES,
    Spanned, TRANSITION_FUNCTION,
    ast::{self, TopLevel},
    log::LogSink,
    parser::Parser,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TransitionFrom<'a> {
    pub state: State<'a>,
    pub letter: Letter,
    pub top: StackSymbol<'a>,
}

/// Where a transition leads and what replaces the popped stack top, listed
/// bottom to top. A leading [`StackSymbol::End`] only restates the sentinel.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TransitionTo<'a> {
    pub state: State<'a>,
    pub push: Vec<StackSymbol<'a>>,
}

/// A loaded deterministic pushdown automaton.
///
/// Borrows every identifier from the definition text it was loaded from and
/// is never mutated afterwards, so one value can back any number of runs.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", serde_with::serde_as)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AutomatonSpec<'a> {
    pub states: IndexMap<State<'a>, StateInfo>,

    #[cfg(feature = "serde")]
    #[serde_as(as = "serde_with::Seq<(_, _)>")]
    pub alphabet: IndexMap<Letter, LetterInfo>,

    #[cfg(not(feature = "serde"))]
    pub alphabet: IndexMap<Letter, LetterInfo>,

    /// The `stack_alphabet` section if the definition has one. Without it
    /// stack symbols are the single character letters of `alphabet`.
    pub stack_alphabet: Option<IndexMap<Symbol<'a>, SymbolInfo>>,
    pub initial_state: State<'a>,
    pub final_states: IndexMap<State<'a>, StateInfo>,
    pub rejecting_states: IndexMap<State<'a>, StateInfo>,

    #[cfg(feature = "serde")]
    #[serde_as(as = "serde_with::Seq<(_, _)>")]
    pub transitions: IndexMap<TransitionFrom<'a>, TransitionTo<'a>>,

    #[cfg(not(feature = "serde"))]
    pub transitions: IndexMap<TransitionFrom<'a>, TransitionTo<'a>>,
}

type List<'a> = Spanned<Vec<Spanned<&'a str>>>;

fn set_once<T>(slot: &mut Option<T>, value: T, label: Spanned<&str>, ctx: &mut Context<'_>) {
    if slot.is_some() {
        ctx.emit_error(format!("{} already set", label.0), label.1);
    }
    *slot = Some(value);
}

fn reserved(ident: &str) -> bool {
    ident == STACK_END || ident == INPUT_END
}

impl<'a> AutomatonSpec<'a> {
    /// Parses and checks the definition held by `ctx`. Every problem is
    /// reported to `ctx`; `None` is returned if any of them is an error.
    pub fn compile(ctx: &mut Context<'a>) -> Option<AutomatonSpec<'a>> {
        let items = Parser::new(ctx).collect::<Vec<_>>();
        Self::compile_items(items, ctx)
    }

    pub fn compile_items(
        items: impl IntoIterator<Item = Spanned<TopLevel<'a>>>,
        ctx: &mut Context<'a>,
    ) -> Option<AutomatonSpec<'a>> {
        let mut states_list: Option<List<'a>> = None;
        let mut alphabet_list: Option<List<'a>> = None;
        let mut stack_list: Option<List<'a>> = None;
        let mut initial_list: Option<List<'a>> = None;
        let mut final_list: Option<List<'a>> = None;
        let mut rejecting_list: Option<List<'a>> = None;
        let mut groups: Option<Vec<Spanned<ast::StateGroup<'a>>>> = None;

        for Spanned(element, _) in items {
            let label = element.label();
            match element {
                TopLevel::List(Spanned(STATES, _), list) => {
                    set_once(&mut states_list, list, label, ctx)
                }
                TopLevel::List(Spanned(ALPHABET, _), list) => {
                    set_once(&mut alphabet_list, list, label, ctx)
                }
                TopLevel::List(Spanned(STACK_ALPHABET, _), list) => {
                    set_once(&mut stack_list, list, label, ctx)
                }
                TopLevel::List(Spanned(INITIAL_STATE, _), list) => {
                    set_once(&mut initial_list, list, label, ctx)
                }
                TopLevel::List(Spanned(FINAL_STATES, _), list) => {
                    set_once(&mut final_list, list, label, ctx)
                }
                TopLevel::List(Spanned(REJECTING_STATES, _), list) => {
                    set_once(&mut rejecting_list, list, label, ctx)
                }
                TopLevel::TransitionFunction(_, list) => set_once(&mut groups, list, label, ctx),
                TopLevel::List(Spanned(name, span), _) => {
                    ctx.emit_error(
                        format!(
                            "unknown section {name:?}, expected '{STATES}' | '{ALPHABET}' | '{STACK_ALPHABET}' | '{INITIAL_STATE}' | '{FINAL_STATES}' | '{REJECTING_STATES}' | '{TRANSITION_FUNCTION}'"
                        ),
                        span,
                    );
                }
            }
        }

        let mut states = IndexMap::new();
        match &states_list {
            Some(Spanned(list, span)) => {
                for item in list {
                    if reserved(item.0) {
                        ctx.emit_error(format!("'{}' is reserved and cannot name a state", item.0), item.1);
                    } else if states
                        .insert(State(item.0), StateInfo { definition: item.1 })
                        .is_some()
                    {
                        ctx.emit_error("state redefined", item.1);
                    }
                }
                if list.is_empty() {
                    ctx.emit_error("states cannot be empty", *span);
                }
            }
            None => _ = ctx.emit_error_locless("states never defined"),
        }

        let mut alphabet = IndexMap::new();
        let mut letter_symbols = IndexMap::new();
        match &alphabet_list {
            Some(Spanned(list, span)) => {
                for item in list {
                    let Some(letter) = Letter::parse(item.0) else {
                        if item.0 == STACK_END {
                            ctx.emit_error("STACK_END is reserved for the stack and cannot be a letter", item.1);
                        } else {
                            ctx.emit_error("letter cannot be longer than one char", item.1);
                        }
                        continue;
                    };
                    if alphabet
                        .insert(letter, LetterInfo { definition: item.1 })
                        .is_some()
                    {
                        ctx.emit_error("letter redefined", item.1);
                    }
                    if let Letter::Char(_) = letter {
                        letter_symbols.insert(Symbol(item.0), SymbolInfo { definition: item.1 });
                    }
                }
                if list.is_empty() {
                    ctx.emit_error("alphabet cannot be empty", *span);
                }
            }
            None => _ = ctx.emit_error_locless("alphabet never defined"),
        }

        let stack_alphabet = stack_list.as_ref().map(|Spanned(list, _)| {
            let mut map = IndexMap::new();
            for item in list {
                if reserved(item.0) {
                    ctx.emit_error(
                        format!("'{}' is reserved and cannot be declared as a stack symbol", item.0),
                        item.1,
                    );
                } else if map
                    .insert(Symbol(item.0), SymbolInfo { definition: item.1 })
                    .is_some()
                {
                    ctx.emit_error("stack symbol redefined", item.1);
                }
            }
            map
        });

        let initial_state = match initial_list.as_ref().map(|Spanned(list, span)| (&list[..], *span)) {
            Some(([item], _)) => {
                if states.contains_key(&State(item.0)) {
                    Some(State(item.0))
                } else {
                    ctx.emit_error("initial state not defined as a state", item.1);
                    None
                }
            }
            Some((_, span)) => {
                ctx.emit_error("initial state must be exactly one state", span);
                None
            }
            None => {
                ctx.emit_error_locless("initial state never defined");
                None
            }
        };

        let final_states = match &final_list {
            Some(list) => Self::state_subset(&states, list, "final state", ctx),
            None => {
                ctx.emit_error_locless("final states never defined");
                IndexMap::new()
            }
        };

        let rejecting_states = match &rejecting_list {
            Some(list) => Self::state_subset(&states, list, "rejecting state", ctx),
            None => {
                ctx.emit_warning_locless(
                    "rejecting states never defined, inputs can only be rejected by getting stuck",
                );
                IndexMap::new()
            }
        };

        for (state, info) in &rejecting_states {
            if final_states.contains_key(state) {
                ctx.emit_warning(
                    "state is both final and rejecting, reaching it accepts",
                    info.definition,
                );
            }
        }

        let stack_symbols = stack_alphabet.as_ref().unwrap_or(&letter_symbols);
        let mut transitions = IndexMap::new();
        let mut defined_at = HashMap::new();

        let Some(groups) = groups else {
            ctx.emit_error_locless("transition function never defined");
            return None;
        };

        for Spanned(group, _) in groups {
            let state = State(group.state.0);
            if !states.contains_key(&state) {
                ctx.emit_error("transition state not defined as state", group.state.1);
                continue;
            }

            for Spanned(transition, span) in group.transitions {
                let Some((from, to)) = Self::resolve_transition(
                    state,
                    &transition,
                    &states,
                    &alphabet,
                    stack_symbols,
                    stack_alphabet.is_some(),
                    ctx,
                ) else {
                    continue;
                };

                if let Some(previous) = defined_at.get(&from) {
                    ctx.emit_error(
                        "transition already defined for this starting point (non determinism not permitted)",
                        span,
                    )
                    .emit_info("previously defined here", *previous);
                    continue;
                }
                defined_at.insert(from, span);
                transitions.insert(from, to);
            }
        }

        if ctx.contains_errors() {
            return None;
        }

        ::log::debug!(
            "loaded automaton: {} states, {} letters, {} transitions",
            states.len(),
            alphabet.len(),
            transitions.len()
        );

        Some(AutomatonSpec {
            states,
            alphabet,
            stack_alphabet,
            initial_state: initial_state?,
            final_states,
            rejecting_states,
            transitions,
        })
    }

    fn state_subset(
        states: &IndexMap<State<'a>, StateInfo>,
        Spanned(list, _): &List<'a>,
        what: &str,
        ctx: &mut Context<'a>,
    ) -> IndexMap<State<'a>, StateInfo> {
        let mut map = IndexMap::new();
        for item in list {
            if !states.contains_key(&State(item.0)) {
                ctx.emit_error(format!("{what} not defined in set of states"), item.1);
            } else if map
                .insert(State(item.0), StateInfo { definition: item.1 })
                .is_some()
            {
                ctx.emit_error(format!("{what} redefined"), item.1);
            }
        }
        map
    }

    fn resolve_transition(
        state: State<'a>,
        transition: &ast::Transition<'a>,
        states: &IndexMap<State<'a>, StateInfo>,
        alphabet: &IndexMap<Letter, LetterInfo>,
        stack_symbols: &IndexMap<Symbol<'a>, SymbolInfo>,
        stack_alphabet_declared: bool,
        ctx: &mut Context<'a>,
    ) -> Option<(TransitionFrom<'a>, TransitionTo<'a>)> {
        let errors_before = ctx.logs().entries().len();

        let stack_symbol = |ident: Spanned<&'a str>, ctx: &mut Context<'a>| {
            if ident.0 == INPUT_END {
                ctx.emit_error("INPUT_END cannot be a stack symbol", ident.1);
                return None;
            }
            let symbol = StackSymbol::parse(ident.0);
            if let StackSymbol::Symbol(s) = symbol
                && !stack_symbols.contains_key(&s)
            {
                let entry = ctx.emit_error("transition stack symbol not defined", ident.1);
                if !stack_alphabet_declared {
                    entry.emit_help_locless(
                        "without a stack_alphabet section stack symbols must be letters of the alphabet",
                    );
                }
                return None;
            }
            Some(symbol)
        };

        let letter = match Letter::parse(transition.letter.0) {
            Some(letter) if alphabet.contains_key(&letter) => Some(letter),
            Some(_) => {
                ctx.emit_error("transition letter not defined in alphabet", transition.letter.1);
                None
            }
            None => {
                ctx.emit_error(
                    "transition letter must be a single char or INPUT_END",
                    transition.letter.1,
                );
                None
            }
        };

        let top = stack_symbol(transition.top, ctx);

        let next = State(transition.next.0);
        if !states.contains_key(&next) {
            ctx.emit_error("transition state not defined as state", transition.next.1);
        }

        let mut push = Vec::with_capacity(transition.push.0.len());
        for (i, item) in transition.push.0.iter().enumerate() {
            match stack_symbol(*item, ctx) {
                Some(StackSymbol::End) if i != 0 || top != Some(StackSymbol::End) => {
                    ctx.emit_error(
                        "STACK_END can only be pushed first, in place of a STACK_END stack top",
                        item.1,
                    );
                }
                Some(symbol) => push.push(symbol),
                None => {}
            }
        }

        if ctx.logs().entries().len() != errors_before {
            return None;
        }

        Some((
            TransitionFrom {
                state,
                letter: letter?,
                top: top?,
            },
            TransitionTo { state: next, push },
        ))
    }

    pub fn transition(&self, from: &TransitionFrom<'a>) -> Option<&TransitionTo<'a>> {
        self.transitions.get(from)
    }

    pub fn is_final(&self, state: State<'a>) -> bool {
        self.final_states.contains_key(&state)
    }

    pub fn is_rejecting(&self, state: State<'a>) -> bool {
        self.rejecting_states.contains_key(&state)
    }
}

impl<'a> Display for TransitionFrom<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.letter, self.top)
    }
}

impl<'a> Display for TransitionTo<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [", self.state)?;
        for (i, symbol) in self.push.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{symbol}")?;
        }
        write!(f, "]")
    }
}

fn write_list<T: Display>(
    f: &mut std::fmt::Formatter<'_>,
    label: &str,
    items: impl IntoIterator<Item = T>,
) -> std::fmt::Result {
    write!(f, "{label}:")?;
    for (i, item) in items.into_iter().enumerate() {
        let sep = if i == 0 { " " } else { ", " };
        write!(f, "{sep}{item}")?;
    }
    writeln!(f)
}

/// Writes the definition back in its canonical text form, which loads into
/// an identical automaton.
impl<'a> Display for AutomatonSpec<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_list(f, STATES, self.states.keys())?;
        write_list(f, ALPHABET, self.alphabet.keys())?;
        if let Some(stack_alphabet) = &self.stack_alphabet {
            write_list(f, STACK_ALPHABET, stack_alphabet.keys())?;
        }
        write_list(f, INITIAL_STATE, [self.initial_state])?;
        write_list(f, FINAL_STATES, self.final_states.keys())?;
        write_list(f, REJECTING_STATES, self.rejecting_states.keys())?;
        writeln!(f, "{TRANSITION_FUNCTION}:")?;
        for state in self.states.keys() {
            let mut group = self
                .transitions
                .iter()
                .filter(|(from, _)| from.state == *state)
                .peekable();
            if group.peek().is_none() {
                continue;
            }
            writeln!(f, "    {state}:")?;
            for (from, to) in group {
                writeln!(f, "        {from} -> {to}")?;
            }
        }
        Ok(())
    }
}
