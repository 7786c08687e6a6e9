//! Editor window state

/// Selection range in characters, as reported by the window's `addr` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

/// Snapshot of the window the user invoked agodoc from.
#[derive(Debug, Clone)]
pub struct WindowState {
    /// File name from the window tag.
    pub file_name: String,
    pub selection: Selection,
    /// Full body text, possibly with unsaved edits.
    pub body: String,
}
