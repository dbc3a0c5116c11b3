use std::fmt::Display;

use super::pda::{AutomatonSpec, TransitionFrom, TransitionTo};
use super::*;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Verdict {
    /// A final state was entered.
    Accepted,
    /// A rejecting state was entered.
    Rejected,
    /// No transition matched the current state, letter and stack top.
    Stuck,
}

/// The real symbols above the bottom sentinel, bottom first. The sentinel
/// itself is never stored, so nothing can pop it.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Stack<'a>(Vec<Symbol<'a>>);

impl<'a> Stack<'a> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn top(&self) -> StackSymbol<'a> {
        self.0
            .last()
            .copied()
            .map_or(StackSymbol::End, StackSymbol::Symbol)
    }

    pub fn symbols(&self) -> &[Symbol<'a>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pops the top and pushes `push` in order. A sentinel top is read but
    /// not popped, and a sentinel in `push` is already in place.
    pub fn replace_top(&mut self, push: &[StackSymbol<'a>]) {
        self.0.pop();
        self.0.extend(push.iter().filter_map(|symbol| match symbol {
            StackSymbol::Symbol(symbol) => Some(*symbol),
            StackSymbol::End => None,
        }));
    }
}

impl<'a> Display for Stack<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{STACK_END}")?;
        for symbol in &self.0 {
            write!(f, ", {symbol}")?;
        }
        write!(f, "]")
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Configuration<'a> {
    pub state: State<'a>,
    pub stack: Stack<'a>,
    /// Byte offset of the next unread input character.
    pub position: usize,
}

/// One transition taken during a run.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Step<'a> {
    pub from: TransitionFrom<'a>,
    pub to: TransitionTo<'a>,
}

impl<'a> Display for Step<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} -> {}", self.from.state, self.from, self.to)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Run<'a> {
    pub verdict: Verdict,
    pub trace: Vec<Step<'a>>,
    pub configuration: Configuration<'a>,
}

impl<'a> Display for Run<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for step in &self.trace {
            writeln!(f, "{step}")?;
        }
        write!(
            f,
            "{:?} in {} with stack {}",
            self.verdict, self.configuration.state, self.configuration.stack
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no verdict after {max_steps} steps")]
pub struct StepLimitExceeded {
    pub max_steps: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorResult {
    Pending,
    Halted(Verdict),
}

/// Steps one input through an [`AutomatonSpec`]. The spec is only read, so
/// any number of simulators can share it.
pub struct Simulator<'a, 's> {
    spec: &'s AutomatonSpec<'a>,
    input: &'s str,
    config: Configuration<'a>,
    trace: Vec<Step<'a>>,
    verdict: Option<Verdict>,
}

impl<'a, 's> Simulator<'a, 's> {
    pub fn begin(spec: &'s AutomatonSpec<'a>, input: &'s str) -> Self {
        Self {
            spec,
            input,
            config: Configuration {
                state: spec.initial_state,
                stack: Stack::new(),
                position: 0,
            },
            trace: Vec::new(),
            verdict: None,
        }
    }

    pub fn configuration(&self) -> &Configuration<'a> {
        &self.config
    }

    pub fn trace(&self) -> &[Step<'a>] {
        &self.trace
    }

    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    /// The letter the next step reads, [`Letter::End`] once the input is
    /// consumed.
    pub fn letter(&self) -> Letter {
        self.input
            .get(self.config.position..)
            .and_then(|rest| rest.chars().next())
            .map_or(Letter::End, Letter::Char)
    }

    fn lookup(&self) -> (TransitionFrom<'a>, Option<&'s TransitionTo<'a>>) {
        let from = TransitionFrom {
            state: self.config.state,
            letter: self.letter(),
            top: self.config.stack.top(),
        };
        (from, self.spec.transition(&from))
    }

    fn halt(&mut self, verdict: Verdict) -> SimulatorResult {
        ::log::debug!(
            "{verdict:?} in {} after {} steps",
            self.config.state,
            self.trace.len()
        );
        self.verdict = Some(verdict);
        SimulatorResult::Halted(verdict)
    }

    pub fn step(&mut self) -> SimulatorResult {
        if let Some(verdict) = self.verdict {
            return SimulatorResult::Halted(verdict);
        }

        let (from, to) = self.lookup();
        let Some(to) = to else {
            ::log::trace!("{}: no transition for {from}", from.state);
            return self.halt(Verdict::Stuck);
        };
        ::log::trace!("{}: {from} -> {to}", from.state);

        self.config.stack.replace_top(&to.push);
        self.config.state = to.state;
        if let Letter::Char(c) = from.letter {
            self.config.position += c.len_utf8();
        }
        self.trace.push(Step {
            from,
            to: to.clone(),
        });

        if self.spec.is_final(to.state) {
            self.halt(Verdict::Accepted)
        } else if self.spec.is_rejecting(to.state) {
            self.halt(Verdict::Rejected)
        } else {
            SimulatorResult::Pending
        }
    }

    /// Consumes a halted simulator. `None` while the run is still pending.
    pub fn finish(self) -> Option<Run<'a>> {
        Some(Run {
            verdict: self.verdict?,
            trace: self.trace,
            configuration: self.config,
        })
    }
}

/// Runs `input` to a verdict.
///
/// A definition that keeps taking `INPUT_END` transitions without ever
/// entering a final or rejecting state never returns; use [`run_bounded`]
/// when the definition is not trusted.
pub fn run<'a>(spec: &AutomatonSpec<'a>, input: &str) -> Run<'a> {
    let mut simulator = Simulator::begin(spec, input);
    loop {
        if let SimulatorResult::Halted(verdict) = simulator.step() {
            return Run {
                verdict,
                trace: simulator.trace,
                configuration: simulator.config,
            };
        }
    }
}

/// Like [`run`], but gives up once `max_steps` transitions have been taken
/// and another one is still available.
pub fn run_bounded<'a>(
    spec: &AutomatonSpec<'a>,
    input: &str,
    max_steps: usize,
) -> Result<Run<'a>, StepLimitExceeded> {
    let mut simulator = Simulator::begin(spec, input);
    loop {
        if simulator.trace.len() >= max_steps && simulator.lookup().1.is_some() {
            return Err(StepLimitExceeded { max_steps });
        }
        if let SimulatorResult::Halted(verdict) = simulator.step() {
            return Ok(Run {
                verdict,
                trace: simulator.trace,
                configuration: simulator.config,
            });
        }
    }
}
