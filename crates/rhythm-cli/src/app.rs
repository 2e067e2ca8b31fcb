use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rhythm_engine::{Agent, Cmd, Outbound, Session, SuggestionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Editor,
    Prompt,
}

pub struct App {
    pub session: Session,
    pub focus: Focus,
    pub prompt: String,
    /// Index into the live suggestion list
    pub highlighted: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            focus: Focus::Editor,
            prompt: String::new(),
            highlighted: 0,
            should_quit: false,
        }
    }

    /// Handle one key press; returns the model call it triggered, if any
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Option<Outbound> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return self.handle_command(key.code);
        }

        match key.code {
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Editor => Focus::Prompt,
                    Focus::Prompt => Focus::Editor,
                };
                None
            }
            KeyCode::F(n @ 1..=3) => {
                self.session.select_agent(Agent::ALL[usize::from(n) - 1]);
                None
            }
            KeyCode::Esc => {
                self.session.clear_notice();
                None
            }
            code => match self.focus {
                Focus::Editor => {
                    self.handle_editor_key(code, now);
                    None
                }
                Focus::Prompt => self.handle_prompt_key(code),
            },
        }
    }

    fn handle_command(&mut self, code: KeyCode) -> Option<Outbound> {
        match code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('n') => {
                self.move_highlight(1);
                None
            }
            KeyCode::Char('p') => {
                self.move_highlight(-1);
                None
            }
            KeyCode::Char('y') => {
                let id = self.highlighted_suggestion()?;
                self.session.apply_one(id)
            }
            KeyCode::Char('a') => self.session.apply_all(),
            KeyCode::Char('d') => {
                let id = self.highlighted_suggestion()?;
                self.session.dismiss(id);
                None
            }
            _ => None,
        }
    }

    fn handle_editor_key(&mut self, code: KeyCode, now: Instant) {
        let text = self.session.document().text();
        let cursor = self.session.document().cursor();

        match code {
            KeyCode::Char(c) => self.insert(cursor, c.to_string(), now),
            KeyCode::Enter => self.insert(cursor, "\n".to_string(), now),
            KeyCode::Backspace if cursor > 0 => {
                let start = prev_boundary(&text, cursor);
                self.session.edit(
                    Cmd::DeleteRange {
                        range: start..cursor,
                    },
                    now,
                );
            }
            KeyCode::Delete if cursor < text.len() => {
                let end = next_boundary(&text, cursor);
                self.session.edit(
                    Cmd::DeleteRange {
                        range: cursor..end,
                    },
                    now,
                );
            }
            KeyCode::Left => self.session.set_cursor(prev_boundary(&text, cursor)),
            KeyCode::Right => self.session.set_cursor(next_boundary(&text, cursor)),
            KeyCode::Home => self.session.set_cursor(line_start(&text, cursor)),
            KeyCode::End => self.session.set_cursor(line_end(&text, cursor)),
            KeyCode::Up => self.session.set_cursor(line_above(&text, cursor)),
            KeyCode::Down => self.session.set_cursor(line_below(&text, cursor)),
            _ => {}
        }
    }

    fn insert(&mut self, at: usize, text: String, now: Instant) {
        self.session.edit(Cmd::InsertText { at, text }, now);
    }

    fn handle_prompt_key(&mut self, code: KeyCode) -> Option<Outbound> {
        match code {
            KeyCode::Char(c) => self.prompt.push(c),
            KeyCode::Backspace => {
                self.prompt.pop();
            }
            KeyCode::Enter => {
                let outbound = self.session.send_prompt(&self.prompt)?;
                self.prompt.clear();
                return Some(outbound);
            }
            _ => {}
        }
        None
    }

    fn move_highlight(&mut self, step: isize) {
        let count = self.session.feedback().suggestions().len();
        if count == 0 {
            self.highlighted = 0;
            return;
        }
        let current = self.highlighted.min(count - 1) as isize;
        self.highlighted = (current + step).rem_euclid(count as isize) as usize;
    }

    /// Highlight index clamped to the current batch
    pub fn highlight_index(&self) -> Option<usize> {
        let count = self.session.feedback().suggestions().len();
        (count > 0).then(|| self.highlighted.min(count - 1))
    }

    pub fn highlighted_suggestion(&self) -> Option<SuggestionId> {
        let index = self.highlight_index()?;
        self.session
            .feedback()
            .suggestions()
            .get(index)
            .map(|suggestion| suggestion.id)
    }

    /// Zero-based (line, column) of the editor cursor
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let text = self.session.document().text();
        let cursor = self.session.document().cursor().min(text.len());
        let line = text[..cursor].matches('\n').count();
        let column = text[line_start(&text, cursor)..cursor].chars().count();
        (line, column)
    }
}

fn prev_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(pos)
}

fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map(|i| pos + i).unwrap_or(text.len())
}

/// Byte offset `column` characters into the line `start..end`, or its end
fn column_offset(text: &str, start: usize, end: usize, column: usize) -> usize {
    text[start..end]
        .char_indices()
        .nth(column)
        .map(|(i, _)| start + i)
        .unwrap_or(end)
}

fn line_above(text: &str, pos: usize) -> usize {
    let start = line_start(text, pos);
    if start == 0 {
        return 0;
    }
    let column = text[start..pos].chars().count();
    let above_end = start - 1;
    column_offset(text, line_start(text, above_end), above_end, column)
}

fn line_below(text: &str, pos: usize) -> usize {
    let end = line_end(text, pos);
    if end == text.len() {
        return end;
    }
    let column = text[line_start(text, pos)..pos].chars().count();
    let below_start = end + 1;
    column_offset(text, below_start, line_end(text, below_start), column)
}
