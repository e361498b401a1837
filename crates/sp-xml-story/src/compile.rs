use roxmltree::{Document, Node};
use sp_core::{CompileFailure, DebugLocation};
use sp_runtime::{CompiledStory, FileResolver, StoryCompiler};

use crate::runtime::XmlStory;

pub(crate) const ROOT_GROUP: usize = 0;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StoryNode {
    Text {
        template: String,
        location: DebugLocation,
    },
    Set {
        var: String,
        expr: String,
        location: DebugLocation,
    },
    Choice {
        options: Vec<ChoiceOption>,
        location: DebugLocation,
    },
    Loop {
        body_group: usize,
        location: DebugLocation,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChoiceOption {
    pub(crate) text: String,
    pub(crate) body_group: usize,
    pub(crate) location: DebugLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VarDeclaration {
    pub(crate) name: String,
    pub(crate) expr: String,
    pub(crate) location: DebugLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoryProgram {
    pub(crate) groups: Vec<Vec<StoryNode>>,
    pub(crate) declarations: Vec<VarDeclaration>,
}

/// Compiles `<story>` XML files into an [`XmlStory`] positioned at the start.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlStoryCompiler;

impl StoryCompiler for XmlStoryCompiler {
    type Story = XmlStory;

    fn compile(
        &self,
        main_file: &str,
        resolver: &dyn FileResolver,
    ) -> Result<CompiledStory<XmlStory>, CompileFailure> {
        let mut builder = ProgramBuilder::new(resolver);
        builder.build_file(main_file, ROOT_GROUP, None);
        if !builder.errors.is_empty() {
            return Err(CompileFailure {
                messages: builder.errors,
            });
        }

        let program = StoryProgram {
            groups: builder.groups,
            declarations: builder.declarations,
        };
        let story = XmlStory::start(program).map_err(CompileFailure::from)?;
        Ok(CompiledStory {
            story,
            diagnostics: builder.diagnostics,
        })
    }
}

struct ProgramBuilder<'r> {
    resolver: &'r dyn FileResolver,
    groups: Vec<Vec<StoryNode>>,
    declarations: Vec<VarDeclaration>,
    include_stack: Vec<String>,
    errors: Vec<String>,
    diagnostics: Vec<String>,
}

impl<'r> ProgramBuilder<'r> {
    fn new(resolver: &'r dyn FileResolver) -> Self {
        Self {
            resolver,
            groups: vec![Vec::new()],
            declarations: Vec::new(),
            include_stack: Vec::new(),
            errors: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn build_file(&mut self, file: &str, group: usize, included_at: Option<&DebugLocation>) {
        let prefix = match included_at {
            Some(location) => format!(
                "{}:{}: ",
                location.file_identity.as_deref().unwrap_or_default(),
                location.start_line
            ),
            None => String::new(),
        };

        if self.include_stack.iter().any(|open| open == file) {
            self.errors
                .push(format!("{}Include cycle through \"{}\".", prefix, file));
            return;
        }
        let Some(source) = self.resolver.resolve(file) else {
            self.errors
                .push(format!("{}File \"{}\" was not found.", prefix, file));
            return;
        };
        let document = match Document::parse(&source) {
            Ok(document) => document,
            Err(error) => {
                self.errors.push(format!("{}: XML_PARSE_ERROR: {}", file, error));
                return;
            }
        };
        let root = document.root_element();
        if root.tag_name().name() != "story" {
            self.error(file, &document, root, "Root element must be <story>.");
            return;
        }

        self.include_stack.push(file.to_string());
        self.build_children(file, &document, root, group);
        self.include_stack.pop();
    }

    fn build_children(
        &mut self,
        file: &str,
        document: &Document<'_>,
        parent: Node<'_, '_>,
        group: usize,
    ) {
        for child in parent.children().filter(|node| node.is_element()) {
            self.build_element(file, document, child, group);
        }
    }

    fn build_element(
        &mut self,
        file: &str,
        document: &Document<'_>,
        element: Node<'_, '_>,
        group: usize,
    ) {
        let location = node_location(file, document, element);
        match element.tag_name().name() {
            "var" => {
                let Some(name) = self.required(file, document, element, "name") else {
                    return;
                };
                if self.declarations.iter().any(|decl| decl.name == name) {
                    self.error(
                        file,
                        document,
                        element,
                        &format!("Variable \"{}\" is declared twice.", name),
                    );
                    return;
                }
                self.declarations.push(VarDeclaration {
                    name,
                    expr: element.attribute("value").unwrap_or("()").to_string(),
                    location,
                });
            }
            "set" => {
                let (Some(var), Some(expr)) = (
                    self.required(file, document, element, "var"),
                    self.required(file, document, element, "value"),
                ) else {
                    return;
                };
                self.groups[group].push(StoryNode::Set {
                    var,
                    expr,
                    location,
                });
            }
            "text" => {
                let template = element
                    .descendants()
                    .filter(|node| node.is_text())
                    .filter_map(|node| node.text())
                    .collect::<String>()
                    .trim()
                    .to_string();
                self.groups[group].push(StoryNode::Text { template, location });
            }
            "choice" => {
                let mut options = Vec::new();
                for child in element.children().filter(|node| node.is_element()) {
                    if child.tag_name().name() != "option" {
                        self.error(file, document, child, "<choice> may only contain <option>.");
                        continue;
                    }
                    let Some(text) = self.required(file, document, child, "text") else {
                        continue;
                    };
                    let body_group = self.new_group();
                    self.build_children(file, document, child, body_group);
                    options.push(ChoiceOption {
                        text,
                        body_group,
                        location: node_location(file, document, child),
                    });
                }
                if options.is_empty() {
                    self.diagnostics.push(format!(
                        "{}:{}: <choice> has no options and is skipped.",
                        file, location.start_line
                    ));
                    return;
                }
                self.groups[group].push(StoryNode::Choice { options, location });
            }
            "loop" => {
                let body_group = self.new_group();
                self.build_children(file, document, element, body_group);
                if self.groups[body_group].is_empty() {
                    self.error(file, document, element, "<loop> body must not be empty.");
                    return;
                }
                self.groups[group].push(StoryNode::Loop {
                    body_group,
                    location,
                });
            }
            "include" => {
                let Some(path) = self.required(file, document, element, "path") else {
                    return;
                };
                self.build_file(&path, group, Some(&location));
            }
            other => {
                self.error(
                    file,
                    document,
                    element,
                    &format!("Unknown element <{}>.", other),
                );
            }
        }
    }

    fn new_group(&mut self) -> usize {
        self.groups.push(Vec::new());
        self.groups.len() - 1
    }

    fn required(
        &mut self,
        file: &str,
        document: &Document<'_>,
        element: Node<'_, '_>,
        attribute: &str,
    ) -> Option<String> {
        match element.attribute(attribute) {
            Some(value) => Some(value.to_string()),
            None => {
                self.error(
                    file,
                    document,
                    element,
                    &format!(
                        "<{}> requires attribute \"{}\".",
                        element.tag_name().name(),
                        attribute
                    ),
                );
                None
            }
        }
    }

    fn error(&mut self, file: &str, document: &Document<'_>, node: Node<'_, '_>, message: &str) {
        let line = document.text_pos_at(node.range().start).row;
        self.errors.push(format!("{}:{}: {}", file, line, message));
    }
}

fn node_location(file: &str, document: &Document<'_>, node: Node<'_, '_>) -> DebugLocation {
    let range = node.range();
    DebugLocation::new(
        document.text_pos_at(range.start).row as usize,
        document.text_pos_at(range.end).row as usize,
        Some(file.to_string()),
    )
}
