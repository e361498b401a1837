use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use sp_core::{ChoiceItem, DebugLocation, PreviewError};

use crate::story::{NoticeObserver, Story, StoryValue};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MockNode {
    Content {
        line: usize,
        file: Option<String>,
        sets: Vec<(String, StoryValue)>,
        fails: bool,
    },
    Choice(Vec<MockNode>),
    Branch {
        start_line: Option<usize>,
        body: Vec<MockNode>,
    },
    /// Content that puts itself back after running.
    Forever { line: usize },
}

impl MockNode {
    pub(crate) fn with_set(mut self, name: &str, value: StoryValue) -> Self {
        if let Self::Content { sets, .. } = &mut self {
            sets.push((name.to_string(), value));
        }
        self
    }

    pub(crate) fn in_file(mut self, name: &str) -> Self {
        if let Self::Content { file, .. } = &mut self {
            *file = Some(name.to_string());
        }
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        if let Self::Content { fails, .. } = &mut self {
            *fails = true;
        }
        self
    }
}

pub(crate) fn content(line: usize) -> MockNode {
    MockNode::Content {
        line,
        file: None,
        sets: Vec::new(),
        fails: false,
    }
}

pub(crate) fn branch(start_line: usize, body: Vec<MockNode>) -> MockNode {
    MockNode::Branch {
        start_line: Some(start_line),
        body,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MockState {
    remaining: VecDeque<MockNode>,
    vars: BTreeMap<String, StoryValue>,
    location: Option<DebugLocation>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockCounters {
    pub(crate) saved: usize,
    pub(crate) restored: usize,
    pub(crate) chosen: usize,
    pub(crate) continued: usize,
}

/// Hand-driven story used to pin down driver behavior.
pub(crate) struct MockStory {
    state: MockState,
    counters: Cell<MockCounters>,
    failing_choice: Option<usize>,
    unreadable: BTreeSet<String>,
    names_unavailable: bool,
    observer: Option<Rc<dyn NoticeObserver>>,
}

impl MockStory {
    pub(crate) fn new(nodes: Vec<MockNode>) -> Self {
        Self {
            state: MockState {
                remaining: nodes.into(),
                vars: BTreeMap::new(),
                location: None,
            },
            counters: Cell::new(MockCounters::default()),
            failing_choice: None,
            unreadable: BTreeSet::new(),
            names_unavailable: false,
            observer: None,
        }
    }

    pub(crate) fn with_var(mut self, name: &str, value: StoryValue) -> Self {
        self.state.vars.insert(name.to_string(), value);
        self
    }

    pub(crate) fn failing_choice(mut self, index: usize) -> Self {
        self.failing_choice = Some(index);
        self
    }

    pub(crate) fn unreadable(mut self, name: &str) -> Self {
        self.unreadable.insert(name.to_string());
        self
    }

    pub(crate) fn names_unavailable(mut self) -> Self {
        self.names_unavailable = true;
        self
    }

    pub(crate) fn counters(&self) -> MockCounters {
        self.counters.get()
    }

    pub(crate) fn has_observer(&self) -> bool {
        self.observer.is_some()
    }

    fn bump(&self, update: impl FnOnce(&mut MockCounters)) {
        let mut counters = self.counters.get();
        update(&mut counters);
        self.counters.set(counters);
    }
}

impl Story for MockStory {
    type State = MockState;

    fn can_continue(&self) -> bool {
        matches!(
            self.state.remaining.front(),
            Some(MockNode::Content { .. } | MockNode::Forever { .. })
        )
    }

    fn continue_step(&mut self) -> Result<(), PreviewError> {
        self.bump(|counters| counters.continued += 1);
        match self.state.remaining.pop_front() {
            Some(MockNode::Content {
                line,
                file,
                sets,
                fails,
            }) => {
                if fails {
                    return Err(PreviewError::new(
                        "STORY_RUNTIME",
                        format!("line {} failed", line),
                    ));
                }
                for (name, value) in sets {
                    self.state.vars.insert(name, value);
                }
                self.state.location = Some(DebugLocation::new(line, line, file));
                Ok(())
            }
            Some(MockNode::Forever { line }) => {
                self.state.remaining.push_front(MockNode::Forever { line });
                self.state.location = Some(DebugLocation::new(line, line, None));
                Ok(())
            }
            other => {
                if let Some(node) = other {
                    self.state.remaining.push_front(node);
                }
                Err(PreviewError::new("STORY_RUNTIME", "no content to continue"))
            }
        }
    }

    fn current_choices(&self) -> Vec<ChoiceItem> {
        match self.state.remaining.front() {
            Some(MockNode::Choice(branches)) => (0..branches.len())
                .map(|index| ChoiceItem {
                    index,
                    text: format!("option {}", index),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn choose_choice(&mut self, index: usize) -> Result<(), PreviewError> {
        self.bump(|counters| counters.chosen += 1);
        if self.failing_choice == Some(index) {
            return Err(PreviewError::new(
                "STORY_RUNTIME",
                format!("choice {} failed", index),
            ));
        }
        let Some(MockNode::Choice(branches)) = self.state.remaining.front() else {
            return Err(PreviewError::new(
                "STORY_NO_PENDING_CHOICE",
                "No pending choice is available.",
            ));
        };
        let Some(MockNode::Branch { start_line, body }) = branches.get(index).cloned() else {
            return Err(PreviewError::new(
                "STORY_CHOICE_INDEX",
                format!("Choice index \"{}\" is out of range.", index),
            ));
        };
        self.state.remaining.pop_front();
        for node in body.into_iter().rev() {
            self.state.remaining.push_front(node);
        }
        self.state.location = start_line.map(|line| DebugLocation::new(line, line, None));
        Ok(())
    }

    fn current_debug_location(&self) -> Option<DebugLocation> {
        self.state.location.clone()
    }

    fn save_state(&self) -> Result<Self::State, PreviewError> {
        self.bump(|counters| counters.saved += 1);
        Ok(self.state.clone())
    }

    fn restore_state(&mut self, state: &Self::State) -> Result<(), PreviewError> {
        self.bump(|counters| counters.restored += 1);
        self.state = state.clone();
        Ok(())
    }

    fn variable_names(&self) -> Result<Vec<String>, PreviewError> {
        if self.names_unavailable {
            return Err(PreviewError::new(
                "STORY_VAR_UNREADABLE",
                "Variable state is unavailable.",
            ));
        }
        Ok(self.state.vars.keys().cloned().collect())
    }

    fn read_variable(&self, name: &str) -> Result<StoryValue, PreviewError> {
        if self.unreadable.contains(name) {
            return Err(PreviewError::new(
                "STORY_VAR_UNREADABLE",
                format!("Variable \"{}\" cannot be read.", name),
            ));
        }
        self.state.vars.get(name).cloned().ok_or_else(|| {
            PreviewError::new(
                "STORY_VAR_UNREADABLE",
                format!("Variable \"{}\" is not declared.", name),
            )
        })
    }

    fn set_notice_observer(&mut self, observer: Rc<dyn NoticeObserver>) {
        self.observer = Some(observer);
    }
}
