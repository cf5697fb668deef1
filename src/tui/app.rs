use std::io::Write;
use std::sync::mpsc::{self, Sender};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal::{self, Clear, ClearType},
};

use crate::api::{ApiClient, Task};
use crate::render;
use crate::theme::{Theme, ThemeStore};

use super::state::{AppMode, AppState};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long a row fades before its delete request fires.
const DELETE_FADE_DELAY: Duration = Duration::from_millis(300);

/// Completion of a background API call, delivered to the event loop.
pub enum AppEvent {
    RefreshDone {
        seq: u64,
        result: Result<Vec<Task>>,
    },
    MutationDone {
        result: Result<()>,
    },
    CreateDone {
        result: Result<()>,
    },
    DeleteDone {
        id: u64,
        result: Result<()>,
    },
}

pub async fn run_app(out: &mut impl Write, client: ApiClient, store: ThemeStore) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut state = AppState::new(store.load().await);

    spawn_refresh(&client, &mut state, &tx);

    loop {
        while let Ok(app_event) = rx.try_recv() {
            handle_app_event(app_event, &mut state, &client, &tx);
        }

        draw(out, &state)?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(key, &mut state, &client, &store, &tx).await? {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn spawn_refresh(client: &ApiClient, state: &mut AppState, tx: &Sender<AppEvent>) {
    let seq = state.begin_refresh();
    let client = client.clone();
    let tx = tx.clone();

    tokio::spawn(async move {
        let result = client.list().await;
        let _ = tx.send(AppEvent::RefreshDone { seq, result });
    });
}

fn handle_app_event(
    app_event: AppEvent,
    state: &mut AppState,
    client: &ApiClient,
    tx: &Sender<AppEvent>,
) {
    match app_event {
        AppEvent::RefreshDone { seq, result } => match result {
            // apply_refresh drops responses that lost the race to a newer one
            Ok(tasks) => {
                state.apply_refresh(seq, tasks);
            }
            Err(e) => {
                log::warn!("refresh failed: {e}");
                state.message = Some(format!("Failed to fetch tasks: {e}"));
            }
        },
        AppEvent::MutationDone { result } => match result {
            Ok(()) => spawn_refresh(client, state, tx),
            Err(e) => state.message = Some(e.to_string()),
        },
        AppEvent::CreateDone { result } => {
            if state.apply_create_result(result) {
                spawn_refresh(client, state, tx);
            }
        }
        AppEvent::DeleteDone { id, result } => {
            // Reverse the fade either way; on success the row disappears with
            // the next refresh, on failure it snaps back.
            if state.fading == Some(id) {
                state.fading = None;
            }
            match result {
                Ok(()) => spawn_refresh(client, state, tx),
                Err(e) => state.message = Some(format!("Failed to delete task {id}: {e}")),
            }
        }
    }
}

/// Returns true when the app should quit.
async fn handle_key(
    key: KeyEvent,
    state: &mut AppState,
    client: &ApiClient,
    store: &ThemeStore,
    tx: &Sender<AppEvent>,
) -> Result<bool> {
    // The message bar blocks until acknowledged by a keypress.
    if state.message.take().is_some() {
        return Ok(false);
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Ok(true);
    }

    match state.mode {
        AppMode::Normal => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up | KeyCode::Char('k') => state.move_selection_up(),
            KeyCode::Down | KeyCode::Char('j') => state.move_selection_down(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(task) = state.get_selected_task() {
                    let id = task.id;
                    let done = !task.done;
                    let client = client.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let result = client.set_done(id, done).await;
                        let _ = tx.send(AppEvent::MutationDone { result });
                    });
                }
            }
            KeyCode::Char('a') => {
                state.new_task.clear();
                state.mode = AppMode::AddingTask;
            }
            KeyCode::Char('d') => {
                if state.fading.is_none() {
                    if let Some(id) = state.get_selected_task().map(|t| t.id) {
                        state.fading = Some(id);
                        let client = client.clone();
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(DELETE_FADE_DELAY).await;
                            let result = client.remove(id).await;
                            let _ = tx.send(AppEvent::DeleteDone { id, result });
                        });
                    }
                }
            }
            KeyCode::Char('t') => {
                state.theme = store.toggle().await?;
            }
            KeyCode::Char('r') => spawn_refresh(client, state, tx),
            _ => {}
        },
        AppMode::AddingTask => match key.code {
            KeyCode::Esc => {
                state.new_task.clear();
                state.mode = AppMode::Normal;
            }
            KeyCode::Tab => {
                state.new_task.current_field ^= 1;
            }
            KeyCode::Enter => {
                if state.new_task.current_field == 0 {
                    state.new_task.focus_title();
                } else {
                    match state.new_task.create_task() {
                        None => {
                            state.message = Some("Please enter both ID and title".to_string());
                        }
                        // The form stays populated until the server accepts
                        // the create, so a rejection leaves the typed id and
                        // title in place for correction.
                        Some(task) => {
                            let client = client.clone();
                            let tx = tx.clone();
                            tokio::spawn(async move {
                                let result = client.create(&task).await;
                                let _ = tx.send(AppEvent::CreateDone { result });
                            });
                        }
                    }
                }
            }
            KeyCode::Backspace => state.new_task.handle_backspace(),
            KeyCode::Char(c) => state.new_task.handle_char(c),
            _ => {}
        },
    }

    Ok(false)
}

fn theme_colors(theme: Theme) -> (Color, Color) {
    match theme {
        Theme::Dark => (Color::White, Color::Black),
        Theme::Light => (Color::Black, Color::White),
    }
}

fn draw(out: &mut impl Write, state: &AppState) -> Result<()> {
    let (fg, bg) = theme_colors(state.theme);
    let (_, height) = terminal::size()?;

    queue!(
        out,
        cursor::Hide,
        SetForegroundColor(fg),
        SetBackgroundColor(bg),
        Clear(ClearType::All),
        cursor::MoveTo(0, 0),
        SetAttribute(Attribute::Bold),
        Print(format!(
            "📝 Task Tracker — {} mode  {}",
            state.theme.as_str(),
            state.theme.toggle_label()
        )),
        SetAttribute(Attribute::Reset),
        SetForegroundColor(fg),
        SetBackgroundColor(bg),
    )?;

    let rows = render::rows(&state.tasks, state.fading);
    let max_rows = height.saturating_sub(6) as usize;

    if rows.is_empty() {
        queue!(out, cursor::MoveTo(0, 2), Print(render::EMPTY_PLACEHOLDER))?;
    } else {
        for (i, row) in rows.iter().take(max_rows).enumerate() {
            queue!(out, cursor::MoveTo(0, 2 + i as u16))?;

            if i == state.selected_index {
                queue!(out, SetAttribute(Attribute::Reverse))?;
            }
            if row.fading || row.done {
                queue!(out, SetAttribute(Attribute::Dim))?;
            }
            if row.done {
                queue!(out, SetAttribute(Attribute::CrossedOut))?;
            }

            queue!(
                out,
                Print(format!("{}   [⏎ {}]", render::format_row(row), row.action_label())),
                SetAttribute(Attribute::Reset),
                SetForegroundColor(fg),
                SetBackgroundColor(bg),
            )?;
        }
    }

    if state.mode == AppMode::AddingTask {
        let y = 3 + rows.len().min(max_rows) as u16;
        let input = &state.new_task;
        let id_cursor = if input.current_field == 0 { "█" } else { "" };
        let title_cursor = if input.current_field == 1 { "█" } else { "" };

        queue!(
            out,
            cursor::MoveTo(0, y),
            SetAttribute(Attribute::Bold),
            Print("➕ New task"),
            SetAttribute(Attribute::Reset),
            SetForegroundColor(fg),
            SetBackgroundColor(bg),
            cursor::MoveTo(0, y + 1),
            Print(format!("  id:    {}{}", input.id, id_cursor)),
            cursor::MoveTo(0, y + 2),
            Print(format!("  title: {}{}", input.title, title_cursor)),
        )?;
    }

    if let Some(message) = &state.message {
        queue!(
            out,
            cursor::MoveTo(0, height.saturating_sub(2)),
            SetForegroundColor(Color::Yellow),
            Print(format!("⚠ {message} — press any key")),
            SetForegroundColor(fg),
        )?;
    }

    let help = match state.mode {
        AppMode::Normal => "a add · ⏎/space toggle · d delete · t theme · r refresh · q quit",
        AppMode::AddingTask => "⏎ next field / submit · Tab switch field · Esc cancel",
    };
    queue!(
        out,
        cursor::MoveTo(0, height.saturating_sub(1)),
        SetAttribute(Attribute::Dim),
        Print(help),
        SetAttribute(Attribute::Reset),
        ResetColor,
    )?;

    out.flush()?;
    Ok(())
}
