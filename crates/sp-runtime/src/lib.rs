mod branch;
mod driver;
mod position;
mod project;
mod story;
mod variables;

#[cfg(test)]
mod test_support;

pub use branch::{pick_branch, select_branch, StateGuard};
pub use driver::{CursorDriver, DriverFailure, DriverRun, DriverState, StopReason};
pub use position::{is_at_cursor, matches_file, reached, same_file};
pub use project::ProjectSource;
pub use story::{
    CompiledStory, FileResolver, NoticeObserver, NoticeSeverity, RuntimeNotice,
    SilentNoticeObserver, Story, StoryCompiler, StoryValue,
};
pub use variables::{coerce_value, snapshot_variables};
