use std::cell::RefCell;

use super::*;
use crate::compile::XmlStoryCompiler;
use sp_runtime::{SilentNoticeObserver, StoryCompiler};

fn files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(name, source)| ((*name).to_string(), (*source).to_string()))
        .collect()
}

fn story_from(entries: &[(&str, &str)]) -> XmlStory {
    XmlStoryCompiler
        .compile(entries[0].0, &files(entries))
        .expect("story should compile")
        .story
}

fn story(source: &str) -> XmlStory {
    story_from(&[("main.xml", source)])
}

fn start_line(story: &XmlStory) -> Option<usize> {
    story
        .current_debug_location()
        .map(|location| location.start_line)
}

const BRANCHING: &str = r#"<story>
  <var name="bg" value='"a"'/>
  <text>Intro</text>
  <choice>
    <option text="X">
      <set var="bg" value='"b"'/>
      <text>went X</text>
    </option>
    <option text="Y">
      <set var="bg" value='"c"'/>
      <text>went Y</text>
    </option>
  </choice>
  <text>Outro</text>
</story>"#;

#[test]
fn continue_step_emits_one_text_with_its_line() {
    let mut story = story(BRANCHING);
    assert!(story.can_continue());
    story.continue_step().expect("step should pass");
    assert_eq!(story.last_text(), Some("Intro"));
    assert_eq!(start_line(&story), Some(3));
    assert!(!story.can_continue());
    assert_eq!(
        story
            .current_choices()
            .into_iter()
            .map(|choice| choice.text)
            .collect::<Vec<_>>(),
        vec!["X".to_string(), "Y".to_string()]
    );
}

#[test]
fn choose_choice_points_at_the_option_then_runs_its_body() {
    let mut story = story(BRANCHING);
    story.continue_step().expect("step should pass");
    story.choose_choice(1).expect("choice should pass");
    assert_eq!(start_line(&story), Some(9));

    story.continue_step().expect("step should pass");
    assert_eq!(story.last_text(), Some("went Y"));
    assert_eq!(
        story.read_variable("bg").expect("bg should read"),
        StoryValue::String("c".to_string())
    );

    story.continue_step().expect("step should pass");
    assert_eq!(story.last_text(), Some("Outro"));
    assert_eq!(start_line(&story), Some(14));
    assert!(!story.can_continue());
    assert!(story.current_choices().is_empty());
}

#[test]
fn choose_choice_rejects_bad_requests() {
    let mut story = story(BRANCHING);
    let error = story.choose_choice(0).expect_err("no choice is pending yet");
    assert_eq!(error.code, "STORY_NO_PENDING_CHOICE");
    story.continue_step().expect("step should pass");
    let error = story.choose_choice(5).expect_err("index is out of range");
    assert_eq!(error.code, "STORY_CHOICE_INDEX");
}

#[test]
fn restore_state_undoes_a_choice() {
    let mut story = story(BRANCHING);
    story.continue_step().expect("step should pass");
    let saved = story.save_state().expect("save should pass");

    story.choose_choice(0).expect("choice should pass");
    story.continue_step().expect("step should pass");
    assert_eq!(
        story.read_variable("bg").expect("bg should read"),
        StoryValue::String("b".to_string())
    );

    story.restore_state(&saved).expect("restore should pass");
    assert_eq!(story.save_state().expect("save should pass"), saved);
    assert_eq!(story.current_choices().len(), 2);
    assert_eq!(
        story.read_variable("bg").expect("bg should read"),
        StoryValue::String("a".to_string())
    );
}

#[test]
fn restore_state_rejects_foreign_state() {
    let mut small = story("<story><text>Only</text></story>");
    let mut big = story(BRANCHING);
    big.continue_step().expect("step should pass");
    big.choose_choice(0).expect("choice should pass");
    let foreign = big.save_state().expect("save should pass");

    let error = small
        .restore_state(&foreign)
        .expect_err("foreign frames should be rejected");
    assert_eq!(error.code, "STORY_STATE_RESTORE");
    let error = small
        .restore_state(&"not json".to_string())
        .expect_err("garbage should be rejected");
    assert_eq!(error.code, "STORY_STATE_RESTORE");
}

#[test]
fn set_runs_together_with_following_text() {
    let mut story = story(
        "<story>\n<var name=\"n\" value=\"1\"/>\n<set var=\"n\" value=\"n + 1\"/>\n<set var=\"n\" value=\"n * 10\"/>\n<text>n=${n}</text>\n</story>",
    );
    story.continue_step().expect("step should pass");
    assert_eq!(story.last_text(), Some("n=20"));
    assert_eq!(start_line(&story), Some(5));
    assert_eq!(
        story.read_variable("n").expect("n should read"),
        StoryValue::Number(20.0)
    );
}

#[test]
fn trailing_sets_form_a_final_step() {
    let mut story = story(
        "<story>\n<var name=\"done\" value=\"false\"/>\n<text>Hi</text>\n<set var=\"done\" value=\"true\"/>\n</story>",
    );
    story.continue_step().expect("step should pass");
    assert!(story.can_continue());
    story.continue_step().expect("trailing set should run");
    assert_eq!(start_line(&story), Some(4));
    assert!(!story.can_continue());
    assert_eq!(
        story.read_variable("done").expect("done should read"),
        StoryValue::Bool(true)
    );
}

#[test]
fn assigning_undeclared_variable_is_a_runtime_error() {
    let mut story = story("<story>\n<set var=\"ghost\" value=\"1\"/>\n<text>x</text>\n</story>");
    let error = story.continue_step().expect_err("undeclared set should fail");
    assert_eq!(error.code, "STORY_RUNTIME");
    assert_eq!(error.location.map(|location| location.start_line), Some(2));
}

#[test]
fn notices_are_fatal_until_an_observer_is_installed() {
    let source = "<story><text>Hello ${nobody}</text></story>";
    let mut unobserved = story(source);
    let error = unobserved
        .continue_step()
        .expect_err("unhandled notice should fail");
    assert!(error.message.starts_with("Unhandled notice"));

    let observer = Rc::new(SilentNoticeObserver::default());
    let mut observed = story(source);
    observed.set_notice_observer(observer.clone());
    observed.continue_step().expect("observed notice should pass");
    assert_eq!(observed.last_text(), Some("Hello "));
    assert_eq!(observer.absorbed(), 1);
}

#[test]
fn type_change_is_reported_as_notice() {
    let observer = Rc::new(SilentNoticeObserver::default());
    let mut story = story(
        "<story><var name=\"gold\" value=\"3\"/><set var=\"gold\" value='\"lots\"'/><text>t</text></story>",
    );
    story.set_notice_observer(observer.clone());
    story.continue_step().expect("step should pass");
    assert_eq!(observer.absorbed(), 1);
    assert_eq!(
        story.read_variable("gold").expect("gold should read"),
        StoryValue::String("lots".to_string())
    );
}

#[derive(Default)]
struct RecordingObserver {
    seen: RefCell<Vec<NoticeSeverity>>,
}

impl NoticeObserver for RecordingObserver {
    fn notice(&self, notice: &RuntimeNotice) {
        self.seen.borrow_mut().push(notice.severity);
    }
}

#[test]
fn unknown_interpolation_is_an_error_notice_and_type_change_a_warning() {
    let observer = Rc::new(RecordingObserver::default());
    let mut story = story(
        "<story><var name=\"gold\" value=\"3\"/><set var=\"gold\" value='\"lots\"'/><text>${nobody}</text></story>",
    );
    story.set_notice_observer(observer.clone());
    story.continue_step().expect("step should pass");
    assert_eq!(
        *observer.seen.borrow(),
        vec![NoticeSeverity::Warning, NoticeSeverity::Error]
    );
}

#[test]
fn map_variables_are_unreadable_and_arrays_are_lists() {
    let story = story(
        "<story><var name=\"hero\" value=\"#{hp: 3}\"/><var name=\"bag\" value='[1, \"key\"]'/><var name=\"empty\"/></story>",
    );
    let error = story.read_variable("hero").expect_err("map should not read");
    assert_eq!(error.code, "STORY_VAR_UNREADABLE");
    assert_eq!(
        story.read_variable("bag").expect("array should read"),
        StoryValue::List(vec![
            StoryValue::Number(1.0),
            StoryValue::String("key".to_string())
        ])
    );
    assert_eq!(
        story.read_variable("empty").expect("unit should read"),
        StoryValue::Unset
    );
    assert_eq!(
        story.variable_names().expect("names should list"),
        vec!["bag".to_string(), "empty".to_string(), "hero".to_string()]
    );
}

#[test]
fn loop_repeats_its_body_forever() {
    let mut story = story(
        "<story>\n<var name=\"n\" value=\"0\"/>\n<loop>\n<set var=\"n\" value=\"n + 1\"/>\n<text>tick</text>\n</loop>\n</story>",
    );
    for _ in 0..5 {
        assert!(story.can_continue());
        story.continue_step().expect("step should pass");
    }
    assert_eq!(
        story.read_variable("n").expect("n should read"),
        StoryValue::Number(5.0)
    );
    assert_eq!(start_line(&story), Some(5));
}

#[test]
fn loop_without_text_yields_after_the_node_budget() {
    let mut story = story(
        "<story><var name=\"n\" value=\"0\"/><loop><set var=\"n\" value=\"n + 1\"/></loop></story>",
    );
    story.continue_step().expect("textless loop should still end the step");
    assert_eq!(
        story.read_variable("n").expect("n should read"),
        StoryValue::Number(NODES_PER_STEP as f64)
    );
    assert!(story.can_continue());
    assert_eq!(start_line(&story), Some(1));
}

#[test]
fn included_content_keeps_its_own_file_identity() {
    let mut story = story_from(&[
        (
            "main.xml",
            "<story>\n<text>Main</text>\n<include path=\"act1.xml\"/>\n<text>Back</text>\n</story>",
        ),
        ("act1.xml", "<story>\n\n<text>Act one</text>\n</story>"),
    ]);
    story.continue_step().expect("step should pass");
    story.continue_step().expect("step should pass");
    assert_eq!(story.last_text(), Some("Act one"));
    assert_eq!(
        story.current_debug_location(),
        Some(DebugLocation::new(3, 3, Some("act1.xml".to_string())))
    );
    story.continue_step().expect("step should pass");
    assert_eq!(
        story
            .current_debug_location()
            .and_then(|location| location.file_identity),
        Some("main.xml".to_string())
    );
}
