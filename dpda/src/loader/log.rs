use std::fmt::Display;

use crate::loader::Span;

#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Logs {
    logs: Vec<LogEntry>,
    has_error: bool,
}

pub trait LogSink {
    fn emit(&mut self, entry: LogEntry) -> &mut LogEntry;

    fn emit_error_locless(&mut self, msg: impl Into<String>) -> &mut LogEntry {
        self.emit(LogEntry::new(LogLevel::Error, msg, None))
    }

    fn emit_error(&mut self, msg: impl Into<String>, span: Span) -> &mut LogEntry {
        self.emit(LogEntry::new(LogLevel::Error, msg, Some(span)))
    }

    fn emit_warning(&mut self, msg: impl Into<String>, span: Span) -> &mut LogEntry {
        self.emit(LogEntry::new(LogLevel::Warning, msg, Some(span)))
    }

    fn emit_warning_locless(&mut self, msg: impl Into<String>) -> &mut LogEntry {
        self.emit(LogEntry::new(LogLevel::Warning, msg, None))
    }

    fn emit_info(&mut self, msg: impl Into<String>, span: Span) -> &mut LogEntry {
        self.emit(LogEntry::new(LogLevel::Info, msg, Some(span)))
    }

    fn emit_help_locless(&mut self, msg: impl Into<String>) -> &mut LogEntry {
        self.emit(LogEntry::new(LogLevel::Help, msg, None))
    }
}

impl LogSink for Logs {
    fn emit(&mut self, entry: LogEntry) -> &mut LogEntry {
        match entry.level {
            LogLevel::Error => ::log::debug!("definition error: {}", entry.message),
            LogLevel::Warning => ::log::debug!("definition warning: {}", entry.message),
            LogLevel::Info | LogLevel::Help => {}
        }
        self.has_error |= matches!(entry.level, LogLevel::Error);
        self.logs.push(entry);
        let last = self.logs.len() - 1;
        &mut self.logs[last]
    }
}

impl Logs {
    pub fn new() -> Self {
        Self {
            logs: Vec::new(),
            has_error: false,
        }
    }

    pub fn contains_errors(&self) -> bool {
        self.has_error
    }

    pub fn displayable_with<'a>(
        &'a self,
        src: &'a str,
    ) -> impl Iterator<Item = LogEntryDisplay<'a>> {
        self.logs.iter().map(|entry| LogEntryDisplay { src, entry })
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn into_entries(self) -> impl Iterator<Item = LogEntry> {
        self.logs.into_iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Help,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LogEntry {
    pub message: String,
    pub span: Option<Span>,
    pub level: LogLevel,
    pub child: Option<Box<LogEntry>>,
}

impl LogEntry {
    fn new(level: LogLevel, msg: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            message: msg.into(),
            span,
            level,
            child: None,
        }
    }
}

impl LogSink for LogEntry {
    fn emit(&mut self, entry: LogEntry) -> &mut LogEntry {
        &mut **self.child.insert(Box::new(entry))
    }
}

/// 1-based line number of the byte offset `pos` in `src`.
pub fn line_of(src: &str, pos: usize) -> usize {
    src.get(..pos)
        .unwrap_or(src)
        .bytes()
        .filter(|b| *b == b'\n')
        .count()
        + 1
}

pub struct LogEntryDisplay<'a> {
    src: &'a str,
    entry: &'a LogEntry,
}

impl<'a> Display for LogEntryDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        pub const RESET: &str = "\x1b[0;22m";
        pub const BOLD: &str = "\x1b[1m";
        pub const RED: &str = "\x1b[31m";
        pub const GREEN: &str = "\x1b[32m";
        pub const YELLOW: &str = "\x1b[33m";
        pub const CYAN: &str = "\x1b[36m";

        let mut next_entry = Some(self.entry);

        while let Some(entry) = next_entry {
            match entry.level {
                LogLevel::Help => write!(f, "{BOLD}{GREEN}help{RESET}{BOLD}: ")?,
                LogLevel::Info => write!(f, "{BOLD}{CYAN}info{RESET}{BOLD}: ")?,
                LogLevel::Warning => write!(f, "{BOLD}{YELLOW}warning{RESET}{BOLD}: ")?,
                LogLevel::Error => write!(f, "{BOLD}{RED}error{RESET}{BOLD}: ")?,
            }
            writeln!(f, "{}{RESET}", entry.message)?;

            if let Some(span) = entry.span {
                let line_start = line_of(self.src, span.0);
                let line_end = line_of(self.src, span.1);
                let padding = line_end.ilog10() as usize + 1;

                let start = self
                    .src
                    .get(..span.0)
                    .and_then(|s| s.rfind('\n'))
                    .map(|v| v + 1)
                    .unwrap_or(0);

                let end = self
                    .src
                    .get(span.1..)
                    .and_then(|s| s.find('\n'))
                    .map(|v| v + span.1)
                    .unwrap_or(self.src.len());

                let mut line_index = start;
                let lines = self.src.get(start..end).unwrap_or("").split_inclusive('\n');
                for (i, line) in lines.enumerate() {
                    let text = line.trim_end_matches(['\n', '\r']);
                    writeln!(f, "{BOLD}{CYAN}{:>padding$} | {RESET}{text}", i + line_start)?;
                    write!(f, "{BOLD}{CYAN}")?;
                    for _ in 0..padding + 3 {
                        write!(f, " ")?;
                    }
                    let mut index = line_index;
                    for char in text.chars() {
                        if (span.0..span.1).contains(&index) {
                            write!(f, "~")?;
                        } else if char == '\t' {
                            write!(f, "\t")?;
                        } else {
                            write!(f, " ")?;
                        }
                        index += char.len_utf8();
                    }
                    // CRLF terminators are two bytes
                    line_index += line.len();
                    writeln!(f, "{RESET}")?;
                }
            }
            next_entry = entry.child.as_deref()
        }

        Ok(())
    }
}
