use sp_core::{ChoiceItem, Cursor, PreviewError};
use tracing::trace;

use crate::story::Story;

/// Holds a saved story state and puts it back when dropped, so speculative
/// choices never leak into the committed path. `finish` restores explicitly
/// and reports a failed restore; the drop path can only ignore one.
pub struct StateGuard<'a, S: Story> {
    story: &'a mut S,
    saved: S::State,
    armed: bool,
}

impl<'a, S: Story> StateGuard<'a, S> {
    pub fn save(story: &'a mut S) -> Result<Self, PreviewError> {
        let saved = story.save_state()?;
        Ok(Self {
            story,
            saved,
            armed: true,
        })
    }

    pub fn story(&self) -> &S {
        &*self.story
    }

    pub fn story_mut(&mut self) -> &mut S {
        &mut *self.story
    }

    /// Back to the saved state, keeping the guard armed.
    pub fn rewind(&mut self) -> Result<(), PreviewError> {
        self.story.restore_state(&self.saved)
    }

    pub fn finish(mut self) -> Result<(), PreviewError> {
        self.armed = false;
        self.story.restore_state(&self.saved)
    }
}

impl<S: Story> Drop for StateGuard<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.story.restore_state(&self.saved);
        }
    }
}

/// Picks the choice whose branch contains the cursor.
///
/// With more than one choice, every branch is entered once from the saved
/// pre-choice state to learn the line it starts on; the story is left exactly
/// as it was found. Returns the `ChoiceItem::index` to commit.
pub fn select_branch<S: Story>(
    story: &mut S,
    choices: &[ChoiceItem],
    cursor: &Cursor,
) -> Result<usize, PreviewError> {
    let Some(first) = choices.first() else {
        return Err(PreviewError::new(
            "STORY_NO_PENDING_CHOICE",
            "Branch selection needs at least one choice.",
        ));
    };
    if choices.len() == 1 {
        return Ok(first.index);
    }

    let mut probe = StateGuard::save(story)?;
    let mut start_lines = Vec::with_capacity(choices.len());
    for (position, choice) in choices.iter().enumerate() {
        if position > 0 {
            probe.rewind()?;
        }
        probe.story_mut().choose_choice(choice.index)?;
        let start_line = probe
            .story()
            .current_debug_location()
            .map(|location| location.start_line)
            .unwrap_or(usize::MAX);
        trace!(choice = choice.index, start_line, "probed branch");
        start_lines.push(start_line);
    }
    probe.finish()?;

    Ok(choices[pick_branch(&start_lines, cursor.line)].index)
}

/// Position of the last branch starting at or before `cursor_line`, or 0
/// when the cursor precedes them all. Branches are in ascending source order.
pub fn pick_branch(start_lines: &[usize], cursor_line: usize) -> usize {
    start_lines
        .iter()
        .rposition(|&line| line <= cursor_line)
        .unwrap_or(0)
}
