use std::mem;
use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::KeyCode;
use log::{info, warn};
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap,
};
use ratatui::Frame;

use crate::db::{delete_student, fetch_all_students, Session};
use crate::export::{export_students, timestamp_now, ExportFormat};
use crate::search::{run_search, SearchMode};
use crate::validation::{add_student, department_choices, edit_student};

use super::forms::{ConfirmStudentDelete, SearchState, StudentField, StudentForm};
use super::helpers::{centered_rect, grade_color, key_hint, surface_error};
use super::screens::{RosterScreen, StatisticsScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE_SIZE: isize = 10;

/// Which view fills the content area.
enum Screen {
    Roster,
    Statistics(StatisticsScreen),
}

/// Input modes layered over the current screen.
enum Mode {
    Normal,
    Searching(SearchState),
    AddingStudent(StudentForm),
    EditingStudent { roll_no: String, form: StudentForm },
    ConfirmDelete(ConfirmStudentDelete),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    session: Session,
    export_dir: PathBuf,
    roster: RosterScreen,
    departments: Vec<String>,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    last_search_mode: SearchMode,
    last_export: Option<PathBuf>,
}

impl App {
    /// Load the full roster and the department list from `session`.
    pub fn new(session: Session, export_dir: PathBuf) -> Result<Self> {
        let students = fetch_all_students(session.conn())?;
        let departments = department_choices(session.conn())?;
        info!("loaded {} student(s)", students.len());

        Ok(Self {
            session,
            export_dir,
            roster: RosterScreen::new(students),
            departments,
            screen: Screen::Roster,
            mode: Mode::Normal,
            status: None,
            last_search_mode: SearchMode::default(),
            last_export: None,
        })
    }

    /// Hand the store back so the caller can close it.
    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Searching(state) => self.handle_search(code, state)?,
            Mode::AddingStudent(form) => self.handle_add_student(code, form)?,
            Mode::EditingStudent { roll_no, form } => {
                self.handle_edit_student(code, roll_no, form)?
            }
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        if let Screen::Statistics(_) = self.screen {
            match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Esc | KeyCode::Char('s') => {
                    self.screen = Screen::Roster;
                    self.clear_status();
                }
                KeyCode::Char('c') => self.export(ExportFormat::Csv),
                KeyCode::Char('r') => self.export(ExportFormat::Report),
                KeyCode::Char('o') => self.open_last_export(),
                _ => {}
            }
            return Ok(Mode::Normal);
        }

        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if self.roster.applied.is_some() {
                    self.show_all()?;
                } else {
                    *exit = true;
                }
            }
            KeyCode::Up => self.roster.move_selection(-1),
            KeyCode::Down => self.roster.move_selection(1),
            KeyCode::PageUp => self.roster.move_selection(-PAGE_SIZE),
            KeyCode::PageDown => self.roster.move_selection(PAGE_SIZE),
            KeyCode::Home => self.roster.select_first(),
            KeyCode::End => self.roster.select_last(),
            KeyCode::Char('/') | KeyCode::Char('f') => {
                let query = match &self.roster.applied {
                    Some((_, text)) => text.clone(),
                    None => String::new(),
                };
                self.clear_status();
                return Ok(Mode::Searching(SearchState {
                    mode: self.last_search_mode,
                    query,
                }));
            }
            KeyCode::Char('x') => self.show_all()?,
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                let mut form = StudentForm::default();
                form.update_suggestion(&self.departments);
                return Ok(Mode::AddingStudent(form));
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(student) = self.roster.current_student() {
                    let roll_no = student.roll_no().to_string();
                    let form = StudentForm::from_student(student);
                    self.clear_status();
                    return Ok(Mode::EditingStudent { roll_no, form });
                }
                self.set_status("Please select a student to update.", StatusKind::Error);
            }
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(student) = self.roster.current_student() {
                    return Ok(Mode::ConfirmDelete(ConfirmStudentDelete::from(student)));
                }
                self.set_status("Please select a student to delete.", StatusKind::Error);
            }
            KeyCode::Char('s') => {
                self.screen = Screen::Statistics(StatisticsScreen::from_roster(&self.roster));
                self.clear_status();
            }
            KeyCode::Char('c') => self.export(ExportFormat::Csv),
            KeyCode::Char('r') => self.export(ExportFormat::Report),
            KeyCode::Char('o') => self.open_last_export(),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Search cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab => state.mode = state.mode.next(),
            KeyCode::Up => self.roster.move_selection(-1),
            KeyCode::Down => self.roster.move_selection(1),
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Enter => {
                self.last_search_mode = state.mode;
                match self.apply_search(state.mode, &state.query) {
                    Ok(()) => return Ok(Mode::Normal),
                    Err(err) => {
                        warn!("search failed: {err:#}");
                        self.set_status(surface_error(&err), StatusKind::Error);
                    }
                }
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => {}
        }
        Ok(Mode::Searching(state))
    }

    fn handle_add_student(&mut self, code: KeyCode, mut form: StudentForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add student cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Enter => match self.save_new_student(&form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            other => self.edit_form(other, &mut form),
        }

        if keep_open {
            Ok(Mode::AddingStudent(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_student(
        &mut self,
        code: KeyCode,
        roll_no: String,
        mut form: StudentForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Enter => match self.save_existing_student(&roll_no, &form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            other => self.edit_form(other, &mut form),
        }

        if keep_open {
            Ok(Mode::EditingStudent { roll_no, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    /// Keys shared by the add and edit forms.
    fn edit_form(&self, code: KeyCode, form: &mut StudentForm) {
        match code {
            KeyCode::Tab => {
                if !(form.active == StudentField::Department && form.accept_suggestion()) {
                    form.cycle_field(1);
                }
            }
            KeyCode::BackTab => form.cycle_field(-1),
            KeyCode::Down => form.cycle_field(1),
            KeyCode::Up => form.cycle_field(-1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => return,
        }
        form.update_suggestion(&self.departments);
    }

    fn handle_confirm_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmStudentDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::ConfirmDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Roster => self.draw_roster(frame, content_area),
            Screen::Statistics(stats) => self.draw_statistics(frame, content_area, stats),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::AddingStudent(form) => self.draw_student_form(frame, area, "Add Student", form),
            Mode::EditingStudent { form, .. } => {
                self.draw_student_form(frame, area, "Update Student", form)
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_roster(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.roster.title());

        if self.roster.students.is_empty() {
            let text = if self.roster.applied.is_some() {
                "No students match this search. Press x to show everyone."
            } else {
                "No students yet. Press + to add one."
            };
            let message = Paragraph::new(text)
                .block(block)
                .alignment(Alignment::Center);
            frame.render_widget(message, area);
            return;
        }

        let header = Row::new(
            ["ID", "Name", "Roll No", "Department", "Email", "Phone", "Marks", "Grade", "Status"]
                .map(Cell::from),
        )
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(1);

        let rows = self.roster.students.iter().map(|student| {
            let color = grade_color(student.grade());
            Row::new(vec![
                Cell::from(student.id().to_string()),
                Cell::from(student.name().to_string()),
                Cell::from(student.roll_no().to_string()),
                Cell::from(student.department().to_string()),
                Cell::from(student.email().to_string()),
                Cell::from(student.phone().to_string()),
                Cell::from(format!("{:.2}", student.marks())),
                Cell::from(student.grade().label()).style(Style::default().fg(color)),
                Cell::from(student.status_label()).style(Style::default().fg(if student.passed() {
                    Color::Green
                } else {
                    Color::Red
                })),
            ])
        });

        let widths = [
            Constraint::Length(5),
            Constraint::Percentage(20),
            Constraint::Length(10),
            Constraint::Percentage(18),
            Constraint::Percentage(22),
            Constraint::Length(15),
            Constraint::Length(7),
            Constraint::Length(5),
            Constraint::Length(6),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = TableState::default().with_selected(Some(self.roster.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_statistics(&self, frame: &mut Frame, area: Rect, screen: &StatisticsScreen) {
        let stats = &screen.stats;
        let title = if screen.filtered {
            "Statistics • current search results"
        } else {
            "Statistics • all students"
        };

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let label_style = Style::default().fg(Color::Gray);
        let summary_line = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("{label:<18}"), label_style),
                Span::raw(value),
            ])
        };

        let mut lines = vec![
            summary_line("Total students", stats.total_count.to_string()),
            summary_line(
                "Passed",
                format!("{} ({:.2}%)", stats.passed_count, stats.pass_percentage),
            ),
            summary_line(
                "Failed",
                format!("{} ({:.2}%)", stats.failed_count, stats.fail_percentage),
            ),
            Line::from(""),
            summary_line("Average marks", format!("{:.2}", stats.average_marks)),
            summary_line("Highest marks", format!("{:.2}", stats.highest_marks)),
            summary_line("Lowest marks", format!("{:.2}", stats.lowest_marks)),
        ];

        if !stats.department_counts.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Departments",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for (department, count) in &stats.department_counts {
                lines.push(summary_line(department.as_str(), count.to_string()));
            }
        }

        let summary = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(summary, columns[0]);

        let bars: Vec<Bar> = stats
            .grade_distribution()
            .into_iter()
            .map(|(grade, count)| {
                Bar::default()
                    .label(Line::from(grade.label()))
                    .value(count as u64)
                    .style(Style::default().fg(grade_color(grade)))
            })
            .collect();

        let chart = BarChart::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Grade Distribution"),
            )
            .bar_width(5)
            .bar_gap(2)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, columns[1]);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let hints: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::Searching(_)) => &[
                ("Tab", "Search By"),
                ("Enter", "Search"),
                ("Esc", "Cancel"),
            ],
            (_, Mode::AddingStudent(_)) | (_, Mode::EditingStudent { .. }) => &[
                ("Tab", "Next / Accept"),
                ("Shift+Tab", "Previous"),
                ("Enter", "Save"),
                ("Esc", "Cancel"),
            ],
            (_, Mode::ConfirmDelete(_)) => &[("Y", "Delete"), ("N", "Keep")],
            (Screen::Statistics(_), _) => &[
                ("c", "Export CSV"),
                ("r", "Export Report"),
                ("o", "Open Export"),
                ("Esc", "Back"),
                ("q", "Quit"),
            ],
            (Screen::Roster, _) => &[
                ("↑↓", "Navigate"),
                ("+", "Add"),
                ("e", "Update"),
                ("-", "Delete"),
                ("/", "Search"),
                ("x", "Show All"),
                ("s", "Statistics"),
                ("c", "CSV"),
                ("r", "Report"),
                ("q", "Quit"),
            ],
        };

        Line::from(
            hints
                .iter()
                .flat_map(|(key, action)| key_hint(key, action))
                .collect::<Vec<_>>(),
        )
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let prompt = state.prompt();
        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Line::from(vec![
            Span::styled(prompt.clone(), Style::default().fg(Color::Cyan)),
            Span::raw(state.query.clone()),
        ]))
        .block(block.clone());
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + prompt.chars().count() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_student_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &StudentForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = form.fields().map(|field| form.build_line(field)).collect();
        lines.push(form.grade_preview());
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to accept/switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        frame.set_cursor_position((
            inner.x + form.cursor_offset(),
            inner.y + form.cursor_row(),
        ));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmStudentDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Delete")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Delete {} ({})?",
                confirm.name, confirm.roll_no
            )),
            Line::from("This cannot be undone."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    /// An `Err` means nothing was written; a failed refresh afterwards is
    /// reported on the status line instead.
    fn save_new_student(&mut self, form: &StudentForm) -> Result<()> {
        let student = add_student(self.session.conn(), &form.input)?;
        self.refresh_after_write(
            Some(student.roll_no()),
            format!("Student {} added successfully.", student.name()),
        );
        Ok(())
    }

    fn save_existing_student(&mut self, roll_no: &str, form: &StudentForm) -> Result<()> {
        let student = edit_student(self.session.conn(), roll_no, &form.input)?;
        self.refresh_after_write(
            Some(roll_no),
            format!("Student {} updated successfully.", student.name()),
        );
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmStudentDelete) -> Result<()> {
        delete_student(self.session.conn(), &confirm.roll_no)?;
        self.refresh_after_write(None, format!("Student {} deleted.", confirm.name));
        Ok(())
    }

    fn refresh_after_write(&mut self, focus: Option<&str>, done: String) {
        match self.reload_roster(focus) {
            Ok(()) => self.set_status(done, StatusKind::Info),
            Err(err) => {
                warn!("roster reload failed after a write: {err:#}");
                self.set_status(
                    format!("{done} Refreshing the list failed: {}", surface_error(&err)),
                    StatusKind::Error,
                );
            }
        }
    }

    /// Re-run whatever query the roster is showing and refresh the department
    /// list used for autocomplete.
    fn reload_roster(&mut self, focus: Option<&str>) -> Result<()> {
        let students = match &self.roster.applied {
            Some((mode, text)) => run_search(self.session.conn(), *mode, text)?,
            None => fetch_all_students(self.session.conn())?,
        };
        self.roster.set_students(students, focus);
        self.departments = department_choices(self.session.conn())?;
        Ok(())
    }

    /// Run a search and make its results the roster. On error the roster is
    /// left untouched.
    fn apply_search(&mut self, mode: SearchMode, query: &str) -> Result<()> {
        let students = run_search(self.session.conn(), mode, query)?;
        let text = query.trim();
        let count = students.len();
        self.roster.applied = if text.is_empty() || mode == SearchMode::All {
            None
        } else {
            Some((mode, text.to_string()))
        };
        let focus = self
            .roster
            .current_student()
            .map(|student| student.roll_no().to_string());
        self.roster.set_students(students, focus.as_deref());
        self.set_status(format!("{count} student(s) found."), StatusKind::Info);
        Ok(())
    }

    fn show_all(&mut self) -> Result<()> {
        self.roster.applied = None;
        self.reload_roster(None)?;
        self.set_status(
            format!("Showing all {} student(s).", self.roster.students.len()),
            StatusKind::Info,
        );
        Ok(())
    }

    /// Exports always cover every stored student, regardless of any search.
    fn export(&mut self, format: ExportFormat) {
        let result = fetch_all_students(self.session.conn()).and_then(|students| {
            export_students(&self.export_dir, format, &students, timestamp_now())
        });
        match result {
            Ok(path) => {
                self.set_status(
                    format!("Data exported to {}. Press o to open it.", path.display()),
                    StatusKind::Info,
                );
                self.last_export = Some(path);
            }
            Err(err) => {
                warn!("export failed: {err}");
                self.set_status(err.to_string(), StatusKind::Error);
            }
        }
    }

    fn open_last_export(&mut self) {
        let Some(path) = self.last_export.clone() else {
            self.set_status("Nothing has been exported yet.", StatusKind::Error);
            return;
        };
        match open_path(&path) {
            Ok(()) => self.set_status(format!("Opened {}.", path.display()), StatusKind::Info),
            Err(err) => self.set_status(
                format!("Failed to open {}: {err}", path.display()),
                StatusKind::Error,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tempfile::TempDir;

    use super::*;
    use crate::config::StoreConfig;
    use crate::db::insert_student;
    use crate::models::StudentDetails;

    fn app_with(records: &[(&str, &str, &str, f64)]) -> (App, TempDir) {
        let session = Session::open(&StoreConfig::in_memory()).unwrap();
        for (roll, name, department, marks) in records {
            insert_student(
                session.conn(),
                &StudentDetails::new(*name, *roll, *department, "", "", *marks),
            )
            .unwrap();
        }
        let dir = TempDir::new().unwrap();
        let app = App::new(session, dir.path().join("exports")).unwrap();
        (app, dir)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn status_text(app: &App) -> &str {
        app.status.as_ref().map(|s| s.text.as_str()).unwrap_or("")
    }

    #[test]
    fn adding_through_the_form_refreshes_the_roster() {
        let (mut app, _dir) = app_with(&[]);
        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "Asha");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "R1");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "Physics");
        // Email and phone stay empty.
        for _ in 0..3 {
            app.handle_key(KeyCode::Tab).unwrap();
        }
        type_text(&mut app, "85");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.roster.students.len(), 1);
        assert_eq!(app.roster.current_student().unwrap().roll_no(), "R1");
        assert!(app.departments.iter().any(|d| d == "Physics"));
    }

    #[test]
    fn duplicate_roll_number_keeps_the_form_open() {
        let (mut app, _dir) = app_with(&[("R1", "Asha", "Physics", 85.0)]);
        app.handle_key(KeyCode::Char('a')).unwrap();
        type_text(&mut app, "Ben");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "R1");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "Physics");
        for _ in 0..3 {
            app.handle_key(KeyCode::Tab).unwrap();
        }
        type_text(&mut app, "40");
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.mode {
            Mode::AddingStudent(form) => {
                assert_eq!(form.error.as_deref(), Some("Roll number 'R1' already exists."));
            }
            _ => panic!("form should stay open"),
        }
        assert_eq!(app.roster.students.len(), 1);
    }

    #[test]
    fn failed_refresh_after_add_still_closes_the_form() {
        let (mut app, _dir) = app_with(&[]);
        app.roster.applied = Some((SearchMode::MarksRange, "abc-90".to_string()));

        app.handle_key(KeyCode::Char('+')).unwrap();
        type_text(&mut app, "Asha");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "R1");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "Physics");
        for _ in 0..3 {
            app.handle_key(KeyCode::Tab).unwrap();
        }
        type_text(&mut app, "85");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Normal));
        assert!(matches!(
            app.status.as_ref().map(|s| &s.kind),
            Some(StatusKind::Error)
        ));
        assert!(status_text(&app).starts_with("Student Asha added successfully."));
        assert!(status_text(&app).contains("Malformed"));
        assert_eq!(fetch_all_students(app.session.conn()).unwrap().len(), 1);
    }

    #[test]
    fn malformed_range_keeps_previous_results() {
        let (mut app, _dir) = app_with(&[
            ("R1", "Asha", "Physics", 85.0),
            ("R2", "Ben", "Chemistry", 40.0),
        ]);
        app.handle_key(KeyCode::Char('/')).unwrap();
        for _ in 0..4 {
            app.handle_key(KeyCode::Tab).unwrap();
        }
        type_text(&mut app, "abc-90");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.mode, Mode::Searching(_)));
        assert_eq!(app.roster.students.len(), 2);
        assert!(status_text(&app).contains("Malformed"));

        for _ in 0.."abc".len() + 3 {
            app.handle_key(KeyCode::Backspace).unwrap();
        }
        type_text(&mut app, "80-90");
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.roster.students.len(), 1);
        assert_eq!(status_text(&app), "1 student(s) found.");

        app.handle_key(KeyCode::Char('x')).unwrap();
        assert_eq!(app.roster.students.len(), 2);
        assert!(app.roster.applied.is_none());
    }

    #[test]
    fn delete_needs_confirmation() {
        let (mut app, _dir) = app_with(&[("R1", "Asha", "Physics", 85.0)]);
        app.handle_key(KeyCode::Char('d')).unwrap();
        app.handle_key(KeyCode::Char('n')).unwrap();
        assert_eq!(app.roster.students.len(), 1);

        app.handle_key(KeyCode::Char('d')).unwrap();
        app.handle_key(KeyCode::Char('y')).unwrap();
        assert!(app.roster.students.is_empty());
        assert_eq!(status_text(&app), "Student Asha deleted.");
    }

    #[test]
    fn export_writes_into_the_configured_directory() {
        let (mut app, _dir) = app_with(&[("R1", "Asha", "Physics", 85.0)]);
        app.handle_key(KeyCode::Char('c')).unwrap();
        let path = app.last_export.clone().expect("export path");
        assert!(path.starts_with(&app.export_dir));
        assert!(path.extension().is_some_and(|ext| ext == "csv"));
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("R1"));
    }

    #[test]
    fn screens_render_without_panicking() {
        let (mut app, _dir) = app_with(&[
            ("R1", "Asha", "Physics", 85.0),
            ("R2", "Ben", "Chemistry", 40.0),
        ]);
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();

        app.handle_key(KeyCode::Char('e')).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        app.handle_key(KeyCode::Esc).unwrap();

        app.handle_key(KeyCode::Char('s')).unwrap();
        assert!(matches!(app.screen, Screen::Statistics(_)));
        terminal.draw(|frame| app.draw(frame)).unwrap();

        app.handle_key(KeyCode::Esc).unwrap();
        assert!(matches!(app.screen, Screen::Roster));
        assert!(!app.handle_key(KeyCode::Char('z')).unwrap());
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }
}
