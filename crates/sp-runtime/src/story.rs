use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use sp_core::{ChoiceItem, CompileFailure, DebugLocation, PreviewError};

/// A variable value as the engine stores it.
#[derive(Debug, Clone, PartialEq)]
pub enum StoryValue {
    Unset,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<StoryValue>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Warning,
    Error,
}

/// A warning or recoverable error the engine reports while stepping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeNotice {
    pub severity: NoticeSeverity,
    pub message: String,
    pub location: Option<DebugLocation>,
}

pub trait NoticeObserver {
    fn notice(&self, notice: &RuntimeNotice);
}

/// Absorbs every notice. Only keeps a count.
#[derive(Debug, Default)]
pub struct SilentNoticeObserver {
    absorbed: Cell<usize>,
}

impl SilentNoticeObserver {
    pub fn absorbed(&self) -> usize {
        self.absorbed.get()
    }
}

impl NoticeObserver for SilentNoticeObserver {
    fn notice(&self, _notice: &RuntimeNotice) {
        self.absorbed.set(self.absorbed.get() + 1);
    }
}

/// A compiled, running story.
///
/// Stepping is split in two: `continue_step` consumes one unit of linear
/// content, `choose_choice` resolves a pending choice point. The engine owns
/// its state; callers only save and restore it as an opaque value.
pub trait Story {
    type State: Clone;

    fn can_continue(&self) -> bool;

    fn continue_step(&mut self) -> Result<(), PreviewError>;

    /// Empty when the story is not waiting at a choice point.
    fn current_choices(&self) -> Vec<ChoiceItem>;

    fn choose_choice(&mut self, index: usize) -> Result<(), PreviewError>;

    fn current_debug_location(&self) -> Option<DebugLocation>;

    fn save_state(&self) -> Result<Self::State, PreviewError>;

    fn restore_state(&mut self, state: &Self::State) -> Result<(), PreviewError>;

    /// Fails only when the variable state as a whole cannot be read.
    fn variable_names(&self) -> Result<Vec<String>, PreviewError>;

    fn read_variable(&self, name: &str) -> Result<StoryValue, PreviewError>;

    fn set_notice_observer(&mut self, observer: Rc<dyn NoticeObserver>);
}

pub trait FileResolver {
    fn resolve(&self, path: &str) -> Option<String>;
}

impl FileResolver for BTreeMap<String, String> {
    fn resolve(&self, path: &str) -> Option<String> {
        self.get(path).cloned()
    }
}

#[derive(Debug)]
pub struct CompiledStory<S> {
    pub story: S,
    /// Non-fatal compiler messages.
    pub diagnostics: Vec<String>,
}

pub trait StoryCompiler {
    type Story: Story;

    fn compile(
        &self,
        main_file: &str,
        resolver: &dyn FileResolver,
    ) -> Result<CompiledStory<Self::Story>, CompileFailure>;
}
