use super::Spanned;

/// `(<letter>, <stack top>) -> <next state> [<push>, ...]`
#[derive(Clone, Debug)]
pub struct Transition<'a> {
    pub letter: Spanned<&'a str>,
    pub top: Spanned<&'a str>,
    pub next: Spanned<&'a str>,
    pub push: Spanned<Vec<Spanned<&'a str>>>,
}

/// A source state header and the transition lines nested under it.
#[derive(Clone, Debug)]
pub struct StateGroup<'a> {
    pub state: Spanned<&'a str>,
    pub transitions: Vec<Spanned<Transition<'a>>>,
}

#[derive(Clone, Debug)]
pub enum TopLevel<'a> {
    /// `label: a, b, c` on a single line, the list may be empty.
    List(Spanned<&'a str>, Spanned<Vec<Spanned<&'a str>>>),
    /// `transition_function:` followed by its indented block.
    TransitionFunction(Spanned<&'a str>, Vec<Spanned<StateGroup<'a>>>),
}

impl<'a> TopLevel<'a> {
    pub fn label(&self) -> Spanned<&'a str> {
        match self {
            TopLevel::List(label, _) | TopLevel::TransitionFunction(label, _) => *label,
        }
    }
}
