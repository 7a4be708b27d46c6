use std::path::PathBuf;

use chrono::NaiveDate;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::io::board_io::{Board, default_config};
use crate::io::store::{BoardData, default_order};
use crate::model::{GroupId, ItemId, Priority, Task};
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

fn task(id: u64, course: &str, title: &str, due: Option<&str>, priority: Priority, status: &str) -> Task {
    Task {
        id: ItemId(id),
        course: course.into(),
        title: title.into(),
        due: due.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
        weight: None,
        est_hours: None,
        priority,
        status: GroupId::new(status),
    }
}

/// Two cards in To Do, one in In Progress
pub fn sample_tasks() -> Vec<Task> {
    vec![
        task(1, "CS101", "Lab 2", Some("2025-03-01"), Priority::High, "todo"),
        task(2, "MATH2", "Problem set 4", None, Priority::Low, "todo"),
        task(3, "HIST1", "Essay draft", Some("2025-03-20"), Priority::Low, "in_progress"),
    ]
}

pub fn sample_board() -> Board {
    Board {
        root: PathBuf::from("/tmp/test-board"),
        dir: PathBuf::from("/tmp/test-board/.tileboard"),
        config: default_config("study"),
    }
}

/// An App over the default board with [`sample_tasks`]. Its outbox holds
/// the initial order fetch.
pub fn sample_app() -> App {
    App::new(
        sample_board(),
        BoardData {
            order: default_order(),
            tasks: sample_tasks(),
        },
    )
    .unwrap()
}
