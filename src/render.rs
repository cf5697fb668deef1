use crate::api::Task;

pub const EMPTY_PLACEHOLDER: &str = "📭 No tasks yet. Add one to get started!";

/// View model for one rendered task line. Built fresh from the fetched
/// collection on every refresh; holds no reference back into app state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: u64,
    pub title: String,
    pub done: bool,
    pub fading: bool,
}

impl TaskRow {
    /// Label of the per-item action control.
    pub fn action_label(&self) -> &'static str {
        if self.done {
            "undo"
        } else {
            "done"
        }
    }
}

/// Strip control characters from a title so a crafted task can't inject
/// terminal escape sequences into the rendered list.
pub fn sanitize_title(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Map the fetched collection to row view models. `fading` marks the task
/// currently animating out ahead of its delete request.
pub fn rows(tasks: &[Task], fading: Option<u64>) -> Vec<TaskRow> {
    tasks
        .iter()
        .map(|task| TaskRow {
            id: task.id,
            title: sanitize_title(&task.title),
            done: task.done,
            fading: fading == Some(task.id),
        })
        .collect()
}

pub fn format_row(row: &TaskRow) -> String {
    let marker = if row.done { "✅" } else { "⬜" };
    let suffix = if row.fading { "  (deleting…)" } else { "" };
    format!("{:>4}. {} {}{}", row.id, marker, row.title, suffix)
}

/// Plain display lines for the whole list. An empty collection renders the
/// placeholder line, never nothing.
pub fn list_lines(rows: &[TaskRow]) -> Vec<String> {
    if rows.is_empty() {
        return vec![EMPTY_PLACEHOLDER.to_string()];
    }

    rows.iter().map(format_row).collect()
}
