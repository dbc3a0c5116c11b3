use dpda::automatan::pda::{AutomatonSpec, TransitionFrom, TransitionTo};
use dpda::automatan::{Letter, StackSymbol, State, Symbol};
use dpda::loader::Context;
use dpda::loader::log::LogLevel;
use dpda::{Diagnostic, LoadError};

const EQUAL_ZEROS_ONES: &str = include_str!("../../demos/equal_zeros_ones.dpda");

const A_N_B_N: &str = "\
states: p, q, acc, rej
alphabet: a, b, INPUT_END
stack_alphabet: Ax
initial_state: p
final_states: acc
rejecting_states: rej
transition_function:
    p:
        (a, STACK_END) -> p [STACK_END, Ax]
        (a, Ax) -> p [Ax, Ax]
        (b, Ax) -> q []
        (INPUT_END, STACK_END) -> acc []
    q:
        (b, Ax) -> q []
        (INPUT_END, STACK_END) -> acc []
        (INPUT_END, Ax) -> rej [Ax]
";

fn errors(src: &str) -> Vec<(Option<usize>, String)> {
    match dpda::load(src) {
        Ok(spec) => panic!("expected an error, loaded {spec:?}"),
        Err(err) => err
            .diagnostics()
            .iter()
            .map(|d| (d.line, d.message.clone()))
            .collect(),
    }
}

#[test]
fn load_sample() {
    let spec = dpda::load(EQUAL_ZEROS_ONES).unwrap();
    assert_eq!(
        spec.states.keys().copied().collect::<Vec<_>>(),
        [State("q0"), State("q1"), State("qA"), State("qR")]
    );
    assert_eq!(
        spec.alphabet.keys().copied().collect::<Vec<_>>(),
        [Letter::Char('0'), Letter::Char('1'), Letter::End]
    );
    assert_eq!(spec.initial_state, State("q0"));
    assert!(spec.is_final(State("qA")));
    assert!(spec.is_rejecting(State("qR")));
    assert!(spec.stack_alphabet.is_none());
    assert_eq!(spec.transitions.len(), 18);

    let from = TransitionFrom {
        state: State("q0"),
        letter: Letter::Char('0'),
        top: StackSymbol::End,
    };
    assert_eq!(
        spec.transition(&from),
        Some(&TransitionTo {
            state: State("q1"),
            push: vec![StackSymbol::End, StackSymbol::Symbol(Symbol("0"))],
        })
    );
}

#[test]
fn canonical_form_reloads_identically() {
    for src in [EQUAL_ZEROS_ONES, A_N_B_N] {
        let spec = dpda::load(src).unwrap();
        let canonical = spec.to_string();
        let reloaded = dpda::load(&canonical).unwrap();

        assert_eq!(reloaded.transitions, spec.transitions);
        assert!(reloaded.states.keys().eq(spec.states.keys()));
        assert!(reloaded.alphabet.keys().eq(spec.alphabet.keys()));
        assert!(reloaded.final_states.keys().eq(spec.final_states.keys()));
        assert!(reloaded.rejecting_states.keys().eq(spec.rejecting_states.keys()));
        assert_eq!(reloaded.initial_state, spec.initial_state);
        assert_eq!(reloaded.to_string(), canonical);
    }
}

#[test]
fn canonical_definition_prints_unchanged() {
    let spec = dpda::load(A_N_B_N).unwrap();
    assert_eq!(spec.to_string(), A_N_B_N);
}

#[test]
fn canonical_form_normalizes_layout() {
    let src = "\
# sections in any order, odd spacing
transition_function:
  q0:
      (0,STACK_END)->q1 [STACK_END,0]

      # comment inside a group
      (INPUT_END,   STACK_END) -> qA [ STACK_END ]
  q1:
      (1, 0) -> q0 []
final_states:qA
states:   q0,q1,qA
initial_state: q0
alphabet: 0,1,INPUT_END
";
    let spec = dpda::load(src).unwrap();
    insta::assert_snapshot!(spec.to_string(), @r"
    states: q0, q1, qA
    alphabet: 0, 1, INPUT_END
    initial_state: q0
    final_states: qA
    rejecting_states:
    transition_function:
        q0:
            (0, STACK_END) -> q1 [STACK_END, 0]
            (INPUT_END, STACK_END) -> qA [STACK_END]
        q1:
            (1, 0) -> q0 []
    ");
}

#[test]
fn duplicate_transition_is_rejected() {
    let src = "\
states: q0, qA
alphabet: a, INPUT_END
initial_state: q0
final_states: qA
rejecting_states:
transition_function:
    q0:
        (a, STACK_END) -> q0 []
        (a, STACK_END) -> qA []
";
    let err = dpda::load(src).unwrap_err();
    let message = "transition already defined for this starting point (non determinism not permitted)";
    assert_eq!(
        err.diagnostics(),
        [Diagnostic {
            line: Some(9),
            message: message.into(),
        }]
    );
    assert_eq!(err.to_string(), format!("malformed definition: line 9: {message}"));

    let mut ctx = Context::new(src);
    assert!(AutomatonSpec::compile(&mut ctx).is_none());
    let report: String = ctx.logs_display().map(|log| log.to_string()).collect();
    assert!(report.contains("previously defined here"));
    assert!(report.contains("(a, STACK_END) -> qA []"));
}

#[test]
fn duplicate_across_repeated_headers() {
    let src = "\
states: q0, qA
alphabet: a, INPUT_END
initial_state: q0
final_states: qA
rejecting_states:
transition_function:
    q0:
        (a, STACK_END) -> q0 []
    q0:
        (a, STACK_END) -> qA []
";
    assert_eq!(errors(src).len(), 1);
}

#[test]
fn reports_every_problem() {
    let src = "\
states: q0, qA
alphabet: a, bb, INPUT_END
initial_state: q9
final_states: qA
transition_function:
    q0:
        (a, STACK_END) -> qZ []
        (c, STACK_END) -> q0 []
        (a, a) -> q0 [a, STACK_END]
        (INPUT_END, INPUT_END) -> qA []
        (a STACK_END) -> q0 []
";
    let expected = [
        (11, "expected transition (<letter>, <stack top>) -> <state> [<symbol>, ...]"),
        (2, "letter cannot be longer than one char"),
        (3, "initial state not defined as a state"),
        (7, "transition state not defined as state"),
        (8, "transition letter not defined in alphabet"),
        (9, "STACK_END can only be pushed first, in place of a STACK_END stack top"),
        (10, "INPUT_END cannot be a stack symbol"),
    ]
    .map(|(line, message)| (Some(line), message.to_string()));
    assert_eq!(errors(src), expected);
}

#[test]
fn undeclared_states_in_subsets_and_groups() {
    let src = "\
states: q0, qA
alphabet: a, INPUT_END
initial_state: q0
final_states: qZ
rejecting_states: qY
transition_function:
    qQ:
        (a, STACK_END) -> q0 []
    q0:
        (a, STACK_END) -> qA []
";
    let expected = [
        (4, "final state not defined in set of states"),
        (5, "rejecting state not defined in set of states"),
        (7, "transition state not defined as state"),
    ]
    .map(|(line, message)| (Some(line), message.to_string()));
    assert_eq!(errors(src), expected);
}

#[test]
fn repeated_subset_entries() {
    let src = "\
states: q0, qA
alphabet: a
initial_state: q0
final_states: qA, qA
rejecting_states: q0, q0
transition_function:
";
    let messages: Vec<_> = errors(src).into_iter().map(|(_, m)| m).collect();
    assert_eq!(messages, ["final state redefined", "rejecting state redefined"]);
}

#[test]
fn missing_sections() {
    let expected = [
        "alphabet never defined",
        "initial state never defined",
        "final states never defined",
        "transition function never defined",
    ]
    .map(|message| (None, message.to_string()));
    assert_eq!(errors("states: q0\n"), expected);

    let err = dpda::load("states: q0\n").unwrap_err();
    assert_eq!(err.to_string(), "malformed definition: alphabet never defined");
}

#[test]
fn undeclared_stack_symbol() {
    let src = "\
states: q0
alphabet: a, INPUT_END
stack_alphabet: X
initial_state: q0
final_states: q0
rejecting_states:
transition_function:
    q0:
        (a, STACK_END) -> q0 [STACK_END, a]
";
    assert_eq!(
        errors(src),
        [(Some(9), "transition stack symbol not defined".to_string())]
    );
}

#[test]
fn section_problems() {
    let messages = |src| errors(src).into_iter().map(|(_, m)| m).collect::<Vec<_>>();

    let duplicated = messages("states: q0\nstates: q1\nalphabet: a\ninitial_state: q1\nfinal_states:\ntransition_function:\n");
    assert_eq!(duplicated, ["states already set"]);

    let unknown = messages("colours: red\nstates: q0\nalphabet: a\ninitial_state: q0\nfinal_states:\ntransition_function:\n");
    assert_eq!(unknown.len(), 1);
    assert!(unknown[0].starts_with("unknown section \"colours\""));

    let empty = errors("states:\nalphabet: a\ninitial_state: q0\nfinal_states:\ntransition_function:\n");
    assert_eq!(
        empty,
        [
            (Some(1), "states cannot be empty".to_string()),
            (Some(3), "initial state not defined as a state".to_string()),
        ]
    );

    let reserved = messages("states: q0, STACK_END\nalphabet: a, STACK_END\ninitial_state: q0\nfinal_states:\ntransition_function:\n");
    assert_eq!(
        reserved,
        [
            "'STACK_END' is reserved and cannot name a state",
            "STACK_END is reserved for the stack and cannot be a letter",
        ]
    );

    let two_initial = messages("states: q0, q1\nalphabet: a\ninitial_state: q0, q1\nfinal_states:\ntransition_function:\n");
    assert_eq!(two_initial, ["initial state must be exactly one state"]);
}

#[test]
fn warnings_do_not_fail_loading() {
    let src = "\
states: q0
alphabet: a
initial_state: q0
final_states: q0
transition_function:
";
    let mut ctx = Context::new(src);
    let spec = AutomatonSpec::compile(&mut ctx).unwrap();
    assert!(spec.transitions.is_empty());
    assert!(spec.rejecting_states.is_empty());
    let levels: Vec<_> = ctx.logs().entries().iter().map(|e| e.level).collect();
    assert_eq!(levels, [LogLevel::Warning]);
}

#[test]
fn load_error_is_an_error() {
    fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
    let err: LoadError = dpda::load("").unwrap_err();
    assert_error(&err);
    assert_eq!(err.diagnostics().len(), 5);
}
