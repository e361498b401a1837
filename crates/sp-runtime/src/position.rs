use sp_core::{Cursor, DebugLocation};

/// Whether executed content belongs to the file the cursor is in.
///
/// A location without file identity is a single-file project and always
/// matches, as does a cursor without a file. Otherwise paths match exactly or
/// by their final component, so an absolute editor path still meets the
/// relative id the compiler assigned.
pub fn matches_file(location: &DebugLocation, cursor: &Cursor) -> bool {
    let Some(identity) = location.file_identity.as_deref() else {
        return true;
    };
    let Some(path) = cursor.file_path.as_deref() else {
        return true;
    };
    same_file(identity, path)
}

/// Reached or passed: a single step can cover several source lines.
pub fn reached(location: &DebugLocation, cursor: &Cursor) -> bool {
    location.start_line >= cursor.line
}

pub fn is_at_cursor(location: &DebugLocation, cursor: &Cursor) -> bool {
    matches_file(location, cursor) && reached(location, cursor)
}

pub fn same_file(left: &str, right: &str) -> bool {
    left == right || basename(left) == basename(right)
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
