use crate::{
    automatan::pda::AutomatonSpec,
    loader::log::{LogEntry, LogLevel, LogSink},
};

pub mod ast;
pub mod lexer;
pub mod log;
pub mod parser;

pub const STATES: &str = "states";
pub const ALPHABET: &str = "alphabet";
pub const STACK_ALPHABET: &str = "stack_alphabet";
pub const INITIAL_STATE: &str = "initial_state";
pub const FINAL_STATES: &str = "final_states";
pub const REJECTING_STATES: &str = "rejecting_states";
pub use parser::TRANSITION_FUNCTION;

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Span(pub usize, pub usize);
impl Span {
    pub fn join(&self, end: Span) -> Span {
        Span(self.0.min(end.0), self.1.max(end.1))
    }
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub struct Spanned<T>(pub T, pub Span);

pub struct Context<'a> {
    logs: log::Logs,
    src: &'a str,
}

impl<'a> LogSink for Context<'a> {
    fn emit(&mut self, entry: LogEntry) -> &mut LogEntry {
        self.logs.emit(entry)
    }
}

impl<'a> Context<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            logs: log::Logs::new(),
            src,
        }
    }

    pub fn src(&self) -> &'a str {
        self.src
    }

    pub fn logs(&self) -> &log::Logs {
        &self.logs
    }

    pub fn logs_display(&self) -> impl Iterator<Item = log::LogEntryDisplay<'_>> {
        self.logs.displayable_with(self.src)
    }

    pub fn contains_errors(&self) -> bool {
        self.logs.contains_errors()
    }

    pub fn into_logs(self) -> log::Logs {
        self.logs
    }
}

/// A load error reduced to what a caller without the source text can show.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    /// 1-based line of the offending construct, `None` when the problem
    /// concerns the definition as a whole (a missing section, for example).
    pub line: Option<usize>,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum LoadError {
    #[error("malformed definition: {}", .0.first().map(ToString::to_string).unwrap_or_default())]
    MalformedDefinition(Vec<Diagnostic>),
}

impl LoadError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            LoadError::MalformedDefinition(diagnostics) => diagnostics,
        }
    }
}

/// Builds an [`AutomatonSpec`] from definition text.
///
/// Every problem found is reported, in source order of discovery, through
/// [`LoadError::MalformedDefinition`]; warnings are dropped. Use
/// [`AutomatonSpec::compile`] with a [`Context`] to keep the full report.
pub fn load(src: &str) -> Result<AutomatonSpec<'_>, LoadError> {
    let mut ctx = Context::new(src);
    match AutomatonSpec::compile(&mut ctx) {
        Some(spec) => Ok(spec),
        None => {
            let diagnostics = ctx
                .into_logs()
                .into_entries()
                .filter(|entry| entry.level == LogLevel::Error)
                .map(|entry| Diagnostic {
                    line: entry.span.map(|span| log::line_of(src, span.0)),
                    message: entry.message,
                })
                .collect();
            Err(LoadError::MalformedDefinition(diagnostics))
        }
    }
}
