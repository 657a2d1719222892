//! Scene transcript.
//!
//! One line per dialog event, `"<Name>: <text>\n"`, in the order the
//! director observed them. Newlines inside dialogue fold to spaces so that
//! every event stays on one line of the rendered file.

use writers_room_types::dialog::DialogEvent;
use writers_room_types::production::SceneStatistics;

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    scene: String,
    lines: Vec<DialogEvent>,
}

impl Transcript {
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            lines: Vec::new(),
        }
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn push(&mut self, event: DialogEvent) {
        self.lines.push(event);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[DialogEvent] {
        &self.lines
    }

    /// Line counts computed from the recorded events.
    pub fn statistics(&self) -> SceneStatistics {
        self.lines.iter().map(|e| e.from.as_str()).collect()
    }

    pub fn render(&self) -> String {
        self.lines.iter().map(format_line).collect()
    }
}

pub fn format_line(event: &DialogEvent) -> String {
    let text = event
        .content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}: {}\n", event.from, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::envelope::dialog_event;

    #[test]
    fn test_render_one_line_per_event() {
        let mut transcript = Transcript::new("s1");
        transcript.push(dialog_event("Alice", "s1", "Hello, how are you?", None, None));
        transcript.push(dialog_event("Bob", "s1", "I'm doing well,\nthanks!", None, None));

        assert_eq!(
            transcript.render(),
            "Alice: Hello, how are you?\nBob: I'm doing well, thanks!\n"
        );
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_statistics_from_lines() {
        let mut transcript = Transcript::new("s1");
        for speaker in ["Alice", "Bob", "Alice"] {
            transcript.push(dialog_event(speaker, "s1", "...", None, None));
        }
        let stats = transcript.statistics();
        assert_eq!(stats.total_lines, 3);
        assert_eq!(stats.lines_for("Alice"), 2);
        assert_eq!(stats.lines_for("Bob"), 1);
    }

    #[test]
    fn test_empty_transcript() {
        let transcript = Transcript::new("s1");
        assert!(transcript.is_empty());
        assert_eq!(transcript.render(), "");
        assert_eq!(transcript.statistics().total_lines, 0);
    }
}
