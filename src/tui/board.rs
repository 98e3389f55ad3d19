//! Kanban board interface.
//!
//! This module implements the interactive board view: tasks are organized
//! into one column per status, and cards are moved between and within
//! columns with the keyboard. Every move runs through the pure reorder
//! engine in [`crate::board`] and persists exactly the position updates the
//! engine reports.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::board::{Board, MoveOutcome};
use crate::db::{format_due_relative, format_priority, format_status, short_id, Database};
use crate::fields::TaskStatus;
use crate::filter::{filter_tasks, FilterSpec};
use crate::task::Task;
use crate::tui::colors::{priority_color, ACCENT};
use crate::workspace::Workspace;

const COLUMN_COUNT: usize = TaskStatus::ALL.len();

/// Main board application state.
pub struct BoardApp {
    db: Database,
    db_path: PathBuf,
    board: Board,
    selected_column: usize, // Index into TaskStatus::ALL
    selected_card: usize,   // Selected card within the column
    column_scroll_offsets: [usize; COLUMN_COUNT],
    status_message: String,
    show_task_detail: bool, // Whether to show the task detail popup
    show_done: bool,        // Whether to show cards in the Done column
    filter_active: bool,    // Whether filter input mode is active
    filter_spec: FilterSpec,
}

impl BoardApp {
    /// Create a new BoardApp instance for the given board file.
    pub fn new(db_path: &Path) -> Self {
        let db = Database::load(db_path);

        let mut app = BoardApp {
            db,
            db_path: db_path.to_path_buf(),
            board: Board::from_tasks(&[]),
            selected_column: 1, // Todo
            selected_card: 0,
            column_scroll_offsets: [0; COLUMN_COUNT],
            status_message: String::new(),
            show_task_detail: false,
            show_done: false, // Hide done cards by default
            filter_active: false,
            filter_spec: FilterSpec::default(),
        };

        app.rebuild_board();
        app
    }

    /// Status of the currently selected column.
    fn selected_status(&self) -> TaskStatus {
        TaskStatus::ALL[self.selected_column]
    }

    /// Workspace display name derived from the board file path.
    fn workspace_name(&self) -> String {
        Workspace::from_file(self.db_path.clone())
            .map(|ws| ws.display_name)
            .unwrap_or_else(|| "Default".to_string())
    }

    /// Rebuild the column partition from the stored tasks and active filter.
    fn rebuild_board(&mut self) {
        let visible: Vec<Task> = filter_tasks(&self.db.tasks, &self.filter_spec)
            .filtered
            .into_iter()
            .filter(|t| self.show_done || t.status != TaskStatus::Done)
            .cloned()
            .collect();
        self.board = Board::from_tasks(&visible);
        // Columns may have shrunk; stale offsets would point past the end.
        self.column_scroll_offsets = [0; COLUMN_COUNT];
        self.clamp_selection();
    }

    /// Ensure selected column and card indices are valid.
    fn clamp_selection(&mut self) {
        if self.selected_column >= COLUMN_COUNT {
            self.selected_column = 0;
        }

        let column_len = self.board.column(self.selected_status()).len();
        if column_len == 0 {
            self.selected_card = 0;
            self.column_scroll_offsets[self.selected_column] = 0;
        } else if self.selected_card >= column_len {
            self.selected_card = column_len - 1;
        }
    }

    /// Persist the outcome of a board move and follow the moved card.
    fn apply_move(&mut self, outcome: MoveOutcome, moved_id: &str, dest_status: TaskStatus) {
        if outcome.updates.is_empty() {
            return;
        }

        let applied = self
            .db
            .apply_updates(&outcome.updates, Utc::now().timestamp());
        if let Err(e) = self.db.save(&self.db_path) {
            self.set_status_message(format!("Error saving: {}", e));
            return;
        }
        self.rebuild_board();

        // Keep the moved card selected in its new slot.
        if let Some(column_index) = TaskStatus::ALL.iter().position(|&s| s == dest_status) {
            self.selected_column = column_index;
        }
        if let Some(card_index) = self
            .board
            .column(dest_status)
            .iter()
            .position(|t| t.id == moved_id)
        {
            self.selected_card = card_index;
        } else {
            self.clamp_selection();
        }

        self.set_status_message(format!(
            "Moved to {} ({} update{})",
            format_status(dest_status),
            applied,
            if applied == 1 { "" } else { "s" }
        ));
    }

    /// Move the selected card one column left or right, keeping its row.
    fn move_card_horizontal(&mut self, right: bool) {
        let src_status = self.selected_status();
        let column = self.board.column(src_status);
        if column.is_empty() {
            return;
        }
        let dest_column_index = if right {
            if self.selected_column + 1 >= COLUMN_COUNT {
                return;
            }
            self.selected_column + 1
        } else {
            if self.selected_column == 0 {
                return;
            }
            self.selected_column - 1
        };

        let moved_id = column[self.selected_card].id.clone();
        let dest_status = TaskStatus::ALL[dest_column_index];
        let dest_index = self
            .selected_card
            .min(self.board.column(dest_status).len());
        let outcome = self
            .board
            .move_task(src_status, self.selected_card, dest_status, dest_index);
        self.apply_move(outcome, &moved_id, dest_status);
    }

    /// Move the selected card one slot up or down within its column.
    fn move_card_vertical(&mut self, down: bool) {
        let status = self.selected_status();
        let column = self.board.column(status);
        if column.is_empty() {
            return;
        }
        let dest_index = if down {
            if self.selected_card + 1 >= column.len() {
                return;
            }
            self.selected_card + 1
        } else {
            if self.selected_card == 0 {
                return;
            }
            self.selected_card - 1
        };

        let moved_id = column[self.selected_card].id.clone();
        let outcome = self
            .board
            .move_task(status, self.selected_card, status, dest_index);
        self.apply_move(outcome, &moved_id, status);
    }

    /// Set a status message.
    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    /// Clear the status message.
    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Handle keyboard input. Returns true when the app should exit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                // Handle filter mode input
                if self.filter_active {
                    match key.code {
                        KeyCode::Esc => {
                            self.filter_active = false;
                            self.filter_spec.clear();
                            self.rebuild_board();
                            self.clear_status_message();
                        }
                        KeyCode::Enter => {
                            self.filter_active = false;
                            if self.filter_spec.is_active() {
                                self.set_status_message(format!(
                                    "Filter: '{}' ({} tasks shown)",
                                    self.filter_spec.search_term,
                                    self.board.len()
                                ));
                            } else {
                                self.set_status_message("Filter cleared".to_string());
                            }
                        }
                        KeyCode::Backspace => {
                            if !self.filter_spec.search_term.is_empty() {
                                self.filter_spec.search_term.pop();
                                self.rebuild_board();
                            }
                        }
                        KeyCode::Char(c) => {
                            self.filter_spec.search_term.push(c);
                            self.rebuild_board();
                        }
                        _ => {}
                    }
                    return Ok(false);
                }

                self.clear_status_message();

                match key.code {
                    KeyCode::Char('q') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(true)
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(true)
                    }
                    KeyCode::Esc => {
                        if self.show_task_detail {
                            self.show_task_detail = false;
                        } else {
                            return Ok(true);
                        }
                    }

                    // Task detail popup
                    KeyCode::Enter => {
                        self.show_task_detail = !self.show_task_detail;
                    }

                    // Card movement (check first, before regular navigation)
                    KeyCode::Left if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.move_card_horizontal(false);
                    }
                    KeyCode::Right if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.move_card_horizontal(true);
                    }
                    KeyCode::Up if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.move_card_vertical(false);
                    }
                    KeyCode::Down if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.move_card_vertical(true);
                    }

                    // Column navigation
                    KeyCode::Left => {
                        if self.selected_column > 0 {
                            self.selected_column -= 1;
                            self.clamp_selection();
                        }
                    }
                    KeyCode::Right => {
                        if self.selected_column < COLUMN_COUNT - 1 {
                            self.selected_column += 1;
                            self.clamp_selection();
                        }
                    }

                    // Card navigation within column
                    KeyCode::Up => {
                        if self.selected_card > 0 {
                            self.selected_card -= 1;
                        }
                    }
                    KeyCode::Down => {
                        let column_len = self.board.column(self.selected_status()).len();
                        if column_len > 0 && self.selected_card < column_len - 1 {
                            self.selected_card += 1;
                        }
                    }

                    // Toggle showing done cards
                    KeyCode::Char('t') => {
                        self.show_done = !self.show_done;
                        self.rebuild_board();
                        let status = if self.show_done {
                            "Showing done tasks"
                        } else {
                            "Hiding done tasks"
                        };
                        self.set_status_message(status.to_string());
                    }

                    // Filter mode
                    KeyCode::Char('/') => {
                        self.filter_active = true;
                        self.set_status_message(
                            "Filter: Type to search title/description/project, Enter to apply, Esc to cancel"
                                .to_string(),
                        );
                    }

                    // Help
                    KeyCode::Char('h') => {
                        self.set_status_message(
                            "Help: Enter: Details | Ctrl+arrows: Move card | t: Toggle done | /: Filter | Esc: Exit"
                                .to_string(),
                        );
                    }

                    _ => {}
                }
            }
        }
        Ok(false)
    }

    /// Render the kanban board.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Board
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_board(f, chunks[1]);
        self.render_status_bar(f, chunks[2]);

        if self.show_task_detail {
            self.render_task_detail_popup(f);
        }
    }

    /// Render the header.
    fn render_header(&self, f: &mut Frame, area: Rect) {
        let header_text = vec![Line::from(vec![
            Span::styled("TASK BOARD", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("Workspace: {}", self.workspace_name()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ])];

        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, area);
    }

    /// Render the five status columns.
    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let constraints: Vec<Constraint> = (0..COLUMN_COUNT)
            .map(|_| Constraint::Percentage(100 / COLUMN_COUNT as u16))
            .collect();

        let columns_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for (i, &column_area) in columns_layout.iter().enumerate() {
            self.render_column(f, column_area, i);
        }
    }

    /// Render a single column.
    fn render_column(&mut self, f: &mut Frame, area: Rect, column_index: usize) {
        let status = TaskStatus::ALL[column_index];
        let is_selected = column_index == self.selected_column;

        let border_style = if is_selected {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let count = self.board.column(status).len();
        let title = if status == TaskStatus::Done && !self.show_done {
            format!("{} (hidden)", format_status(status))
        } else {
            format!("{} ({})", format_status(status), count)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style);

        let inner = block.inner(area);
        f.render_widget(block, area);

        let cards = self.board.column(status);
        if cards.is_empty() {
            return;
        }

        let card_height = 5;
        let available_height = inner.height as usize;
        let visible_cards = available_height / card_height;

        // Calculate scroll offset so the selected card stays visible.
        let scroll_offset = if is_selected {
            let start_visible = self.column_scroll_offsets[column_index];
            let end_visible = start_visible + visible_cards;

            if self.selected_card < start_visible {
                self.column_scroll_offsets[column_index] = self.selected_card;
                self.selected_card
            } else if self.selected_card >= end_visible && end_visible > 0 {
                let new_offset = self.selected_card - visible_cards + 1;
                self.column_scroll_offsets[column_index] = new_offset;
                new_offset
            } else {
                start_visible
            }
        } else {
            self.column_scroll_offsets[column_index]
        };

        let mut current_y = 0;
        let mut rendered_cards = 0;

        for (card_index, task) in cards.iter().enumerate().skip(scroll_offset) {
            if current_y + card_height > available_height {
                break;
            }

            let is_this_card_selected = is_selected && card_index == self.selected_card;

            let card_area = Rect {
                x: inner.x,
                y: inner.y + current_y as u16,
                width: inner.width,
                height: card_height as u16,
            };

            render_card(f, card_area, task, is_this_card_selected);

            current_y += card_height;
            rendered_cards += 1;
        }

        // Scroll indicators
        if scroll_offset > 0 {
            let indicator = Paragraph::new(format!("▲ +{} above", scroll_offset))
                .style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect {
                    x: inner.x,
                    y: inner.y,
                    width: inner.width,
                    height: 1,
                },
            );
        }

        let remaining = cards.len() - scroll_offset - rendered_cards;
        if remaining > 0 {
            let indicator = Paragraph::new(format!("▼ +{} below", remaining))
                .style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect {
                    x: inner.x,
                    y: inner.y + inner.height - 1,
                    width: inner.width,
                    height: 1,
                },
            );
        }
    }

    /// Render the status bar.
    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if self.filter_active {
            format!(
                "Filter: {} | Type to search, Enter to apply, Esc to cancel",
                self.filter_spec.search_term
            )
        } else if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            let done_indicator = if self.show_done { " [+Done]" } else { "" };
            let filter_indicator = if self.filter_spec.is_active() {
                format!(" [Filter: {}]", self.filter_spec.search_term)
            } else {
                String::new()
            };
            format!(
                "Tasks: {}{}{} | Ctrl+arrows: Move | /: Filter | t: Toggle done | h: Help",
                self.board.len(),
                done_indicator,
                filter_indicator
            )
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(ACCENT).fg(Color::White))
            .alignment(Alignment::Left);

        f.render_widget(status, area);
    }

    /// Render the task detail popup.
    fn render_task_detail_popup(&self, f: &mut Frame) {
        let column = self.board.column(self.selected_status());
        let Some(task) = column.get(self.selected_card) else {
            return;
        };

        // Centered popup, 80% of the screen.
        let popup_area = {
            let area = f.area();
            let popup_width = (area.width * 80) / 100;
            let popup_height = (area.height * 80) / 100;
            let x = (area.width - popup_width) / 2;
            let y = (area.height - popup_height) / 2;
            Rect::new(x, y, popup_width, popup_height)
        };

        f.render_widget(Clear, popup_area);

        let today = Local::now().date_naive();
        let assignee_str = task
            .assignee
            .as_ref()
            .map_or("-".to_string(), |a| format!("{} <{}>", a.display_name(), a.email));

        let detail_lines = vec![
            Line::from(vec![Span::styled(
                format!("{}: {}", short_id(&task.id), task.title),
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(format!("Status:    {}", format_status(task.status))),
            Line::from(format!("Priority:  {}", format_priority(task.priority))),
            Line::from(format!(
                "Due:       {}",
                format_due_relative(task.due, today)
            )),
            Line::from(format!("Position:  {}", task.position)),
            Line::from(format!(
                "Project:   {} ({})",
                task.project.name, task.project.workspace_name
            )),
            Line::from(format!("Assignee:  {}", assignee_str)),
            Line::from(""),
            Line::from("Description:"),
            Line::from(task.description.as_deref().unwrap_or("-")),
        ];

        let popup_block = Block::default()
            .borders(Borders::ALL)
            .title("Task Details (Press Enter to close)")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));

        let popup_paragraph = Paragraph::new(detail_lines)
            .block(popup_block)
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(Color::Black));

        f.render_widget(popup_paragraph, popup_area);
    }

    /// Main event loop.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

/// Render a single task card.
fn render_card(f: &mut Frame, area: Rect, task: &Task, is_selected: bool) {
    let style = if is_selected {
        Style::default()
            .bg(ACCENT)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(Color::DarkGray)
    };

    let mut card_text = vec![];

    // Title wrapped over at most 2 lines (accounting for borders).
    let available_width = area.width.saturating_sub(2) as usize;
    let mut current_line = String::new();
    let mut lines = Vec::new();

    for word in task.title.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= available_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line.clone());
            current_line = word.to_string();
            if lines.len() >= 2 {
                break;
            }
        }
    }
    if !current_line.is_empty() && lines.len() < 2 {
        lines.push(current_line);
    }

    for line in lines {
        card_text.push(Line::from(line));
    }

    let today = Local::now().date_naive();
    let meta_style = if is_selected {
        Style::default()
    } else {
        Style::default().fg(priority_color(task.priority))
    };
    card_text.push(Line::from(vec![
        Span::styled(format_priority(task.priority), meta_style),
        Span::raw(format!(
            " | {} | {}",
            format_due_relative(task.due, today),
            task.project.name
        )),
    ]));

    let card_block = Paragraph::new(card_text)
        .block(Block::default().borders(Borders::ALL))
        .style(style)
        .wrap(Wrap { trim: true });

    f.render_widget(card_block, area);
}
