use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;
use rhai::{Dynamic, Engine, Scope};
use serde::{Deserialize, Serialize};
use sp_core::{ChoiceItem, DebugLocation, PreviewError};
use sp_runtime::{NoticeObserver, NoticeSeverity, RuntimeNotice, Story, StoryValue};

use crate::compile::{StoryNode, StoryProgram, ROOT_GROUP};
use crate::value::{dynamic_to_xml_value, xml_value_to_dynamic, XmlValue};

/// Nodes a single step may run before it yields without emitting text.
const NODES_PER_STEP: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Frame {
    group: usize,
    index: usize,
    repeat: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeState {
    frames: Vec<Frame>,
    vars: BTreeMap<String, XmlValue>,
    location: Option<DebugLocation>,
    last_text: Option<String>,
}

/// A running XML story. Saved states are JSON strings.
pub struct XmlStory {
    groups: Vec<Vec<StoryNode>>,
    engine: Engine,
    state: RuntimeState,
    observer: Option<Rc<dyn NoticeObserver>>,
}

impl fmt::Debug for XmlStory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlStory")
            .field("groups", &self.groups.len())
            .field("state", &self.state)
            .field("observed", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl XmlStory {
    pub(crate) fn start(program: StoryProgram) -> Result<Self, PreviewError> {
        let mut story = Self {
            groups: program.groups,
            engine: new_engine(),
            state: RuntimeState {
                frames: vec![Frame {
                    group: ROOT_GROUP,
                    index: 0,
                    repeat: false,
                }],
                vars: BTreeMap::new(),
                location: None,
                last_text: None,
            },
            observer: None,
        };

        for declaration in program.declarations {
            let value = story
                .eval(&declaration.expr)
                .map_err(|error| located(error, &declaration.location))?;
            story.state.vars.insert(declaration.name, value);
        }
        story.settle();
        Ok(story)
    }

    /// Text produced by the most recent step.
    pub fn last_text(&self) -> Option<&str> {
        self.state.last_text.as_deref()
    }

    fn current_node(&self) -> Option<&StoryNode> {
        let frame = self.state.frames.last()?;
        self.groups.get(frame.group)?.get(frame.index)
    }

    fn advance(&mut self) {
        if let Some(frame) = self.state.frames.last_mut() {
            frame.index += 1;
        }
    }

    /// Unwinds finished groups and enters loops until the top frame points
    /// at a text, set or choice node, or no frames remain.
    fn settle(&mut self) {
        loop {
            let Some(frame) = self.state.frames.last_mut() else {
                return;
            };
            let group_len = self.groups.get(frame.group).map_or(0, Vec::len);
            if frame.index >= group_len {
                if frame.repeat && group_len > 0 {
                    frame.index = 0;
                } else {
                    self.state.frames.pop();
                }
                continue;
            }
            let Some(StoryNode::Loop { body_group, .. }) = self.current_node() else {
                return;
            };
            let body_group = *body_group;
            self.advance();
            self.state.frames.push(Frame {
                group: body_group,
                index: 0,
                repeat: true,
            });
        }
    }

    fn eval(&self, expr: &str) -> Result<XmlValue, PreviewError> {
        let mut scope = Scope::new();
        for (name, value) in &self.state.vars {
            scope.push_dynamic(name.to_string(), xml_value_to_dynamic(value));
        }
        let value = self
            .engine
            .eval_expression_with_scope::<Dynamic>(&mut scope, expr)
            .map_err(|error| {
                PreviewError::new(
                    "STORY_RUNTIME",
                    format!("Expression \"{}\" failed: {}", expr, error),
                )
            })?;
        dynamic_to_xml_value(value)
    }

    fn assign(
        &mut self,
        var: &str,
        expr: &str,
        location: &DebugLocation,
    ) -> Result<(), PreviewError> {
        let Some(current) = self.state.vars.get(var) else {
            return Err(PreviewError::with_location(
                "STORY_RUNTIME",
                format!("Variable \"{}\" is not declared.", var),
                location.clone(),
            ));
        };
        let previous_type = current.type_name();
        let value = self.eval(expr).map_err(|error| located(error, location))?;
        if previous_type != "unit" && value.type_name() != previous_type {
            self.notify(
                NoticeSeverity::Warning,
                format!(
                    "Variable \"{}\" changes type from {} to {}.",
                    var,
                    previous_type,
                    value.type_name()
                ),
                location,
            )?;
        }
        self.state.vars.insert(var.to_string(), value);
        Ok(())
    }

    fn render(&self, template: &str, location: &DebugLocation) -> Result<String, PreviewError> {
        let mut output = String::new();
        let mut last_index = 0usize;
        for captures in interpolation_regex().captures_iter(template) {
            let (Some(full), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            output.push_str(&template[last_index..full.start()]);
            match self.state.vars.get(name.as_str()) {
                Some(value) => output.push_str(&value.to_text()),
                None => self.notify(
                    NoticeSeverity::Error,
                    format!("Unknown variable \"{}\" in text.", name.as_str()),
                    location,
                )?,
            }
            last_index = full.end();
        }
        output.push_str(&template[last_index..]);
        Ok(output)
    }

    /// Without an observer a notice is fatal.
    fn notify(
        &self,
        severity: NoticeSeverity,
        message: String,
        location: &DebugLocation,
    ) -> Result<(), PreviewError> {
        let Some(observer) = &self.observer else {
            return Err(PreviewError::with_location(
                "STORY_RUNTIME",
                format!("Unhandled notice: {}", message),
                location.clone(),
            ));
        };
        observer.notice(&RuntimeNotice {
            severity,
            message,
            location: Some(location.clone()),
        });
        Ok(())
    }
}

impl Story for XmlStory {
    type State = String;

    fn can_continue(&self) -> bool {
        matches!(
            self.current_node(),
            Some(StoryNode::Text { .. } | StoryNode::Set { .. })
        )
    }

    /// Runs nodes until one text is emitted, a choice is pending, the story
    /// ends or `NODES_PER_STEP` nodes have run. In the last case the step
    /// ends on the last executed node and the caller's ceiling decides.
    fn continue_step(&mut self) -> Result<(), PreviewError> {
        let mut executed = false;
        for _ in 0..NODES_PER_STEP {
            self.settle();
            let node = self
                .current_node()
                .filter(|node| matches!(node, StoryNode::Text { .. } | StoryNode::Set { .. }))
                .cloned();
            match node {
                Some(StoryNode::Set {
                    var,
                    expr,
                    location,
                }) => {
                    self.assign(&var, &expr, &location)?;
                    self.advance();
                    self.state.location = Some(location);
                    executed = true;
                }
                Some(StoryNode::Text { template, location }) => {
                    let text = self.render(&template, &location)?;
                    self.advance();
                    self.settle();
                    self.state.location = Some(location);
                    self.state.last_text = Some(text);
                    return Ok(());
                }
                _ if executed => return Ok(()),
                _ => {
                    return Err(PreviewError::new(
                        "STORY_RUNTIME",
                        "Story cannot continue here.",
                    ))
                }
            }
        }

        self.settle();
        Ok(())
    }

    fn current_choices(&self) -> Vec<ChoiceItem> {
        match self.current_node() {
            Some(StoryNode::Choice { options, .. }) => options
                .iter()
                .enumerate()
                .map(|(index, option)| ChoiceItem {
                    index,
                    text: option.text.clone(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn choose_choice(&mut self, index: usize) -> Result<(), PreviewError> {
        let Some(StoryNode::Choice { options, .. }) = self.current_node() else {
            return Err(PreviewError::new(
                "STORY_NO_PENDING_CHOICE",
                "No pending choice is available.",
            ));
        };
        let Some(option) = options.get(index).cloned() else {
            return Err(PreviewError::new(
                "STORY_CHOICE_INDEX",
                format!("Choice index \"{}\" is out of range.", index),
            ));
        };

        self.advance();
        self.state.frames.push(Frame {
            group: option.body_group,
            index: 0,
            repeat: false,
        });
        self.state.location = Some(option.location);
        self.settle();
        Ok(())
    }

    fn current_debug_location(&self) -> Option<DebugLocation> {
        self.state.location.clone()
    }

    fn save_state(&self) -> Result<String, PreviewError> {
        serde_json::to_string(&self.state)
            .map_err(|error| PreviewError::new("STORY_STATE_SAVE", error.to_string()))
    }

    fn restore_state(&mut self, state: &String) -> Result<(), PreviewError> {
        let restored: RuntimeState = serde_json::from_str(state)
            .map_err(|error| PreviewError::new("STORY_STATE_RESTORE", error.to_string()))?;
        let in_range = restored.frames.iter().all(|frame| {
            self.groups
                .get(frame.group)
                .is_some_and(|group| frame.index <= group.len())
        });
        if !in_range {
            return Err(PreviewError::new(
                "STORY_STATE_RESTORE",
                "Saved state does not belong to this story.",
            ));
        }
        self.state = restored;
        self.settle();
        Ok(())
    }

    fn variable_names(&self) -> Result<Vec<String>, PreviewError> {
        Ok(self.state.vars.keys().cloned().collect())
    }

    fn read_variable(&self, name: &str) -> Result<StoryValue, PreviewError> {
        let value = self.state.vars.get(name).ok_or_else(|| {
            PreviewError::new(
                "STORY_VAR_UNREADABLE",
                format!("Variable \"{}\" is not declared.", name),
            )
        })?;
        value.to_story_value().ok_or_else(|| {
            PreviewError::new(
                "STORY_VAR_UNREADABLE",
                format!("Variable \"{}\" holds a {}.", name, value.type_name()),
            )
        })
    }

    fn set_notice_observer(&mut self, observer: Rc<dyn NoticeObserver>) {
        self.observer = Some(observer);
    }
}

fn new_engine() -> Engine {
    let mut engine = Engine::new();
    engine.set_strict_variables(true);
    engine
}

fn interpolation_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\$\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}")
            .expect("interpolation regex must compile")
    })
}

fn located(error: PreviewError, location: &DebugLocation) -> PreviewError {
    PreviewError {
        location: error.location.or_else(|| Some(location.clone())),
        ..error
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
