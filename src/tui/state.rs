use crate::api::Task;
use crate::theme::Theme;

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub tasks: Vec<Task>,
    pub selected_index: usize,
    pub mode: AppMode,
    pub message: Option<String>,
    pub new_task: NewTaskInput,
    pub theme: Theme,
    /// Task currently animating out ahead of its delete request.
    pub fading: Option<u64>,
    refresh_seq: u64,
    applied_seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    AddingTask,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewTaskInput {
    pub id: String,
    pub title: String,
    pub current_field: usize, // 0 = id, 1 = title
}

impl NewTaskInput {
    pub fn handle_char(&mut self, c: char) {
        match self.current_field {
            0 => {
                if c.is_ascii_digit() {
                    self.id.push(c);
                }
            }
            1 => self.title.push(c),
            _ => {}
        }
    }

    pub fn handle_backspace(&mut self) {
        match self.current_field {
            0 => {
                self.id.pop();
            }
            1 => {
                self.title.pop();
            }
            _ => {}
        }
    }

    /// Enter in the id field moves focus to the title field.
    pub fn focus_title(&mut self) {
        self.current_field = 1;
    }

    /// Build the task to submit, or `None` when either field fails the
    /// presence check. A zero id counts as absent.
    pub fn create_task(&self) -> Option<Task> {
        let id = self.id.trim().parse::<u64>().ok()?;
        let title = self.title.trim();

        if id == 0 || title.is_empty() {
            return None;
        }

        Some(Task {
            id,
            title: title.to_string(),
            done: false,
        })
    }

    pub fn clear(&mut self) {
        *self = NewTaskInput::default();
    }
}

impl AppState {
    pub fn new(theme: Theme) -> Self {
        Self {
            tasks: vec![],
            selected_index: 0,
            mode: AppMode::Normal,
            message: None,
            new_task: NewTaskInput::default(),
            theme,
            fading: None,
            refresh_seq: 0,
            applied_seq: 0,
        }
    }

    /// Hand out the sequence number for a new refresh request.
    pub fn begin_refresh(&mut self) -> u64 {
        self.refresh_seq += 1;
        self.refresh_seq
    }

    /// Apply a refresh response. Returns false (and leaves state untouched)
    /// when a newer response has already been applied, so a late-resolving
    /// refresh can never overwrite fresher data.
    pub fn apply_refresh(&mut self, seq: u64, tasks: Vec<Task>) -> bool {
        if seq <= self.applied_seq {
            return false;
        }

        self.applied_seq = seq;
        self.tasks = tasks;

        if self.selected_index >= self.tasks.len() {
            self.selected_index = self.tasks.len().saturating_sub(1);
        }

        true
    }

    /// Apply the outcome of a create request. Only success clears the add
    /// form and leaves add mode; a rejection keeps the typed fields so the
    /// user can correct and resubmit. Returns true when the list should be
    /// refreshed.
    pub fn apply_create_result(&mut self, result: anyhow::Result<()>) -> bool {
        match result {
            Ok(()) => {
                self.new_task.clear();
                self.mode = AppMode::Normal;
                true
            }
            Err(e) => {
                self.message = Some(e.to_string());
                false
            }
        }
    }

    pub fn get_selected_task(&self) -> Option<&Task> {
        self.tasks.get(self.selected_index)
    }

    pub fn move_selection_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index < self.tasks.len().saturating_sub(1) {
            self.selected_index += 1;
        }
    }
}
