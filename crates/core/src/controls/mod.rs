/// Commands behind the documented keyboard shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    PreviousTrack,
    NextTrack,
    TogglePlayback,
    /// Mapped here for completeness; acting on it is the UI layer's job.
    ToggleFullscreen,
}

/// Fixed key-to-command table, one key per command.
pub fn command_for_key(key: char) -> Option<ControlCommand> {
    match key.to_ascii_lowercase() {
        'z' => Some(ControlCommand::PreviousTrack),
        'x' => Some(ControlCommand::NextTrack),
        'c' => Some(ControlCommand::TogglePlayback),
        'f' => Some(ControlCommand::ToggleFullscreen),
        _ => None,
    }
}
