//! Helper constructors for `ChannelEvent` envelopes.
//!
//! Reduces boilerplate when building dialog lines and control commands.

use chrono::Utc;
use writers_room_types::dialog::{ChannelEvent, ControlCommand, ControlEvent, DialogEvent};

/// Build a dialog line stamped with the current time.
pub fn dialog_event(
    from: impl Into<String>,
    scene: impl Into<String>,
    content: impl Into<String>,
    emotion: Option<String>,
    addressing: Option<String>,
) -> DialogEvent {
    DialogEvent {
        from: from.into(),
        content: content.into(),
        scene: scene.into(),
        timestamp: Utc::now(),
        emotion,
        addressing,
    }
}

/// Build a dialog line already wrapped for the channel.
pub fn dialog(
    from: impl Into<String>,
    scene: impl Into<String>,
    content: impl Into<String>,
    emotion: Option<String>,
    addressing: Option<String>,
) -> ChannelEvent {
    ChannelEvent::Dialog(dialog_event(from, scene, content, emotion, addressing))
}

/// Build a `start` command for a scene.
pub fn start(scene: impl Into<String>) -> ChannelEvent {
    control(scene, ControlCommand::Start)
}

/// Build a `stop` command for a scene.
pub fn stop(scene: impl Into<String>) -> ChannelEvent {
    control(scene, ControlCommand::Stop)
}

fn control(scene: impl Into<String>, command: ControlCommand) -> ChannelEvent {
    ChannelEvent::Control(ControlEvent {
        scene: scene.into(),
        command,
    })
}
