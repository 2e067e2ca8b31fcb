use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use rhythm_engine::{Agent, Role};

use crate::app::{App, Focus};

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(rows[0]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(8)].as_ref())
        .split(columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(columns[1]);

    draw_editor(f, app, left[0]);
    draw_feedback(f, app, left[1]);
    draw_agent_tabs(f, app, right[0]);
    draw_chat(f, app, right[1]);
    draw_prompt(f, app, right[2]);
    draw_notice(f, app, right[3]);

    let help = Line::from(vec![Span::raw(
        "Tab: Focus | F1-F3: Agent | ^N/^P: Select | ^Y: Apply | ^A: Apply all | ^D: Dismiss | Esc: Clear notice | ^Q: Quit",
    )]);
    f.render_widget(Paragraph::new(vec![help]), rows[1]);
}

fn focused_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn draw_editor(f: &mut Frame, app: &App, area: Rect) {
    let text = app.session.document().text();
    let (line, column) = app.cursor_line_col();

    // Keep the cursor line in view
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = line.saturating_sub(visible.saturating_sub(1));

    let lines: Vec<Line> = text.split('\n').map(|l| Line::from(l.to_string())).collect();
    let editor = Paragraph::new(lines)
        .block(focused_block("Document", app.focus == Focus::Editor))
        .scroll((scroll as u16, 0));
    f.render_widget(editor, area);

    if app.focus == Focus::Editor {
        let x = area.x + 1 + column as u16;
        let y = area.y + 1 + (line - scroll) as u16;
        if x < area.right().saturating_sub(1) && y < area.bottom().saturating_sub(1) {
            f.set_cursor_position(Position::new(x, y));
        }
    }
}

fn draw_feedback(f: &mut Frame, app: &App, area: Rect) {
    let feedback = app.session.feedback();
    let block = Block::default().borders(Borders::ALL).title("Feedback");

    if !app.session.is_online() {
        let offline = Paragraph::new(
            "Offline: set api_key in ~/.config/rhythm/config.toml or GEMINI_API_KEY to get feedback.",
        )
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true })
        .block(block);
        f.render_widget(offline, area);
        return;
    }

    if feedback.suggestions().is_empty() {
        let status = if feedback.is_analyzing() {
            "Analyzing paragraph..."
        } else if app.session.is_applying() {
            "Applying..."
        } else {
            "No suggestions for this paragraph."
        };
        let idle = Paragraph::new(status)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(idle, area);
        return;
    }

    let items: Vec<ListItem> = feedback
        .suggestions()
        .iter()
        .map(|suggestion| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("[{}] ", suggestion.category),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(suggestion.description.clone()),
            ]))
        })
        .collect();

    let title = if app.session.is_applying() {
        "Feedback (applying...)"
    } else {
        "Feedback"
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    let mut state = ListState::default();
    state.select(app.highlight_index());
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_agent_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Agent::ALL
        .iter()
        .enumerate()
        .map(|(i, agent)| Line::from(format!("F{} {}", i + 1, agent.name())))
        .collect();
    let selected = Agent::ALL
        .iter()
        .position(|agent| *agent == app.session.agent())
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("Assistant"))
        .select(selected)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow));
    f.render_widget(tabs, area);
}

fn draw_chat(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    for message in app.session.chat().messages() {
        let style = match message.role {
            Role::User => Style::default().fg(Color::Green),
            Role::Model => Style::default().fg(Color::Magenta),
        };
        lines.push(Line::from(Span::styled(
            format!("{}:", message.author()),
            style.add_modifier(Modifier::BOLD),
        )));
        lines.extend(message.text.lines().map(|l| Line::from(l.to_string())));
        for suggestion in &message.suggestions {
            lines.push(Line::from(format!(
                "  - [{}] {}",
                suggestion.category, suggestion.description
            )));
        }
        lines.push(Line::from(""));
    }
    if app.session.is_chatting() {
        lines.push(Line::from(Span::styled(
            "Thinking...",
            Style::default().fg(Color::DarkGray),
        )));
    }

    // Approximate: ignores wrapping
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(visible);

    let chat = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Chat"))
        .wrap(Wrap { trim: false })
        .scroll((scroll as u16, 0));
    f.render_widget(chat, area);
}

fn draw_prompt(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Prompt;
    let title = format!("Ask the {}", app.session.agent().name());
    let prompt = Paragraph::new(app.prompt.as_str()).block(focused_block(&title, focused));
    f.render_widget(prompt, area);

    if focused {
        let x = area.x + 1 + app.prompt.chars().count() as u16;
        if x < area.right().saturating_sub(1) {
            f.set_cursor_position(Position::new(x, area.y + 1));
        }
    }
}

fn draw_notice(f: &mut Frame, app: &App, area: Rect) {
    let notice = Paragraph::new(app.session.notice().unwrap_or(""))
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Notice"));
    f.render_widget(notice, area);
}
