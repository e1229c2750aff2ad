//! Terminal renderer for the run command.

use console::style;

use fleetmap::render::{MapRenderer, RedrawReason, RenderFrame};

/// Prints a line per frame and a callout line per selected marker.
pub struct ConsoleRenderer {
    /// Only print frames caused by taps.
    quiet: bool,
}

impl ConsoleRenderer {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl MapRenderer for ConsoleRenderer {
    fn redraw(&mut self, frame: &RenderFrame<'_>) {
        if self.quiet && frame.reason != RedrawReason::Selection {
            return;
        }
        for line in frame_lines(frame) {
            println!("{}", line);
        }
    }
}

fn reason_label(reason: RedrawReason) -> &'static str {
    match reason {
        RedrawReason::Initial => "initial",
        RedrawReason::Refresh => "refresh",
        RedrawReason::Selection => "select",
    }
}

/// Lines describing one frame.
fn frame_lines(frame: &RenderFrame<'_>) -> Vec<String> {
    let selected = frame.callouts().count();
    let mut lines = vec![format!(
        "{} {} markers, {} selected",
        style(format!("[{:>7}]", reason_label(frame.reason))).dim(),
        frame.entities.len(),
        selected
    )];

    for entity in frame.callouts() {
        lines.push(format!(
            "          {} {} {}",
            style("▸").yellow(),
            style(entity.label()).bold(),
            style(entity.position).dim()
        ));
    }
    lines
}
