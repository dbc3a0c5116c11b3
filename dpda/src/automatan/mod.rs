use std::fmt::Display;

use crate::loader::Span;

pub mod pda;
pub mod sim;

/// Bottom of stack sentinel. Never declared, always present under every
/// real stack symbol.
pub const STACK_END: &str = "STACK_END";
/// End of input sentinel, read once every input character is consumed.
pub const INPUT_END: &str = "INPUT_END";

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct State<'a>(pub &'a str);

/// A real stack symbol, never the bottom sentinel.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Symbol<'a>(pub &'a str);

/// What the machine reads from its input. Serializes as the character
/// itself or `INPUT_END`, the same tokens the definition format uses.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Letter {
    #[cfg_attr(feature = "serde", serde(rename = "INPUT_END"))]
    End,
    #[cfg_attr(feature = "serde", serde(untagged))]
    Char(char),
}

/// What the machine can see on top of the stack, or push back onto it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum StackSymbol<'a> {
    #[cfg_attr(feature = "serde", serde(rename = "STACK_END"))]
    End,
    #[cfg_attr(feature = "serde", serde(untagged))]
    Symbol(Symbol<'a>),
}

impl Letter {
    /// Parses an alphabet entry: `INPUT_END` or exactly one character.
    pub fn parse(ident: &str) -> Option<Letter> {
        if ident == INPUT_END {
            return Some(Letter::End);
        }
        let mut chars = ident.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Letter::Char(c)),
            _ => None,
        }
    }
}

impl<'a> StackSymbol<'a> {
    pub fn parse(ident: &'a str) -> StackSymbol<'a> {
        if ident == STACK_END {
            StackSymbol::End
        } else {
            StackSymbol::Symbol(Symbol(ident))
        }
    }
}

impl<'a> Display for State<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl<'a> Display for Symbol<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl Display for Letter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Letter::Char(c) => write!(f, "{c}"),
            Letter::End => f.write_str(INPUT_END),
        }
    }
}

impl<'a> Display for StackSymbol<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StackSymbol::End => f.write_str(STACK_END),
            StackSymbol::Symbol(symbol) => symbol.fmt(f),
        }
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StateInfo {
    pub definition: Span,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SymbolInfo {
    pub definition: Span,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LetterInfo {
    pub definition: Span,
}
