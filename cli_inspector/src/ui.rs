use std::collections::VecDeque;

use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use zappy_core::{AnimationEvent, AnimationKind, ConnectionPhase, MessageCategory, WorldSnapshot};
use zappy_proto::ResourceKind;

pub struct UiState {
    pub peer: String,
    pub snapshot: Option<WorldSnapshot>,
    pub events: VecDeque<AnimationEvent>,
    pub max_events: usize,
    pub logs: VecDeque<String>,
    pub max_logs: usize,
}

impl UiState {
    pub fn new(peer: String) -> Self {
        Self {
            peer,
            snapshot: None,
            events: VecDeque::new(),
            max_events: 16,
            logs: VecDeque::new(),
            max_logs: 8,
        }
    }

    pub fn push_event(&mut self, event: AnimationEvent) {
        self.events.push_front(event);
        while self.events.len() > self.max_events {
            self.events.pop_back();
        }
    }

    pub fn push_log<S: Into<String>>(&mut self, line: S) {
        let mut text: String = line.into();
        while text.ends_with('\n') || text.ends_with('\r') {
            text.pop();
        }
        if text.is_empty() {
            return;
        }
        self.logs.push_front(text);
        while self.logs.len() > self.max_logs {
            self.logs.pop_back();
        }
    }
}

pub fn draw_ui(frame: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(10),
            Constraint::Min(6),
            Constraint::Length(8),
        ])
        .split(frame.size());
    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[3]);

    draw_header(frame, chunks[0], state);
    draw_teams(frame, middle[0], state);
    draw_resources(frame, middle[1], state);
    draw_messages(frame, chunks[2], state);
    draw_events(frame, bottom[0], state);
    draw_logs(frame, bottom[1], state);
}

fn render_panel(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn draw_header(frame: &mut Frame, area: Rect, state: &UiState) {
    let mut status = vec![Span::raw(format!("{} ", state.peer))];
    match state.snapshot.as_ref() {
        Some(snapshot) => {
            let (label, color) = match snapshot.phase {
                ConnectionPhase::Streaming => ("streaming", Color::Green),
                ConnectionPhase::Handshaking => ("handshaking", Color::Yellow),
                ConnectionPhase::Disconnected => ("disconnected", Color::Red),
            };
            status.push(Span::styled(label, Style::default().fg(color)));
            status.push(Span::raw(format!(
                " | map {}x{} | time unit {} | living {} | dead {}",
                snapshot.width,
                snapshot.height,
                snapshot
                    .frequency
                    .map_or_else(|| "?".to_string(), |f| f.to_string()),
                snapshot.counts.living,
                snapshot.counts.dead,
            )));
            if snapshot.game_ended {
                let winner = snapshot
                    .winner
                    .as_ref()
                    .map_or("unknown team", |team| team.name.as_str());
                status.push(Span::styled(
                    format!(" | won by {}", winner),
                    Style::default().fg(Color::Magenta),
                ));
            }
        }
        None => status.push(Span::raw("waiting for data")),
    }
    let keys = Line::from(vec![
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit  "),
        Span::styled("+/-", Style::default().fg(Color::Yellow)),
        Span::raw(" faster/slower  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" refresh map"),
    ]);
    render_panel(frame, area, "Zappy Spectator", vec![Line::from(status), keys]);
}

fn draw_teams(frame: &mut Frame, area: Rect, state: &UiState) {
    let lines: Vec<Line> = state
        .snapshot
        .iter()
        .flat_map(|snapshot| snapshot.teams.iter())
        .map(|team| {
            let color = Color::Rgb(team.color.r, team.color.g, team.color.b);
            Line::from(vec![
                Span::styled(format!("{:<16}", team.name), Style::default().fg(color)),
                Span::raw(format!(
                    " living {:>3} | dead {:>3} | max level {}",
                    team.living_count(),
                    team.dead_count(),
                    team.max_level()
                )),
            ])
        })
        .collect();
    render_panel(frame, area, "Teams", lines);
}

fn draw_resources(frame: &mut Frame, area: Rect, state: &UiState) {
    let lines: Vec<Line> = match state.snapshot.as_ref() {
        Some(snapshot) => ResourceKind::ALL
            .iter()
            .map(|kind| (kind.as_str(), u64::from(snapshot.total_resources.get(*kind))))
            .chain(std::iter::once(("total", snapshot.total_resources.total())))
            .map(|(label, count)| {
                Line::from(vec![
                    Span::styled(format!("{:<10}", label), Style::default().fg(Color::Cyan)),
                    Span::raw(format!("{:>8}", count)),
                ])
            })
            .collect(),
        None => Vec::new(),
    };
    render_panel(frame, area, "Resources on map", lines);
}

fn category_color(category: MessageCategory) -> Color {
    match category {
        MessageCategory::Broadcast => Color::White,
        MessageCategory::Egg => Color::LightYellow,
        MessageCategory::Event => Color::Cyan,
        MessageCategory::Incantation => Color::Magenta,
        MessageCategory::Resource => Color::Gray,
        MessageCategory::Death => Color::Red,
        MessageCategory::Victory => Color::Green,
        MessageCategory::Info => Color::Blue,
        MessageCategory::Error => Color::LightRed,
    }
}

fn draw_messages(frame: &mut Frame, area: Rect, state: &UiState) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .snapshot
        .as_ref()
        .map(|snapshot| {
            let skip = snapshot.messages.len().saturating_sub(visible);
            snapshot
                .messages
                .iter()
                .skip(skip)
                .map(|message| {
                    Line::from(Span::styled(
                        message.to_string(),
                        Style::default().fg(category_color(message.category)),
                    ))
                })
                .collect()
        })
        .unwrap_or_default();
    render_panel(frame, area, "Messages", lines);
}

fn draw_events(frame: &mut Frame, area: Rect, state: &UiState) {
    let lines: Vec<Line> = state
        .events
        .iter()
        .map(|event| {
            let label = match event.kind {
                AnimationKind::Broadcast => "broadcast",
                AnimationKind::IncantationStart => "incantation",
                AnimationKind::IncantationSuccess => "elevated",
                AnimationKind::IncantationFailure => "fizzled",
            };
            Line::from(vec![
                Span::styled(format!("{:<12}", label), Style::default().fg(Color::Yellow)),
                Span::raw(format!(
                    "({:>3}, {:>3}) {}",
                    event.x,
                    event.y,
                    event.team.as_deref().unwrap_or("")
                )),
            ])
        })
        .collect();
    render_panel(frame, area, "Recent Events", lines);
}

fn draw_logs(frame: &mut Frame, area: Rect, state: &UiState) {
    let lines: Vec<Line> = state
        .logs
        .iter()
        .map(|entry| Line::from(Span::raw(entry.as_str())))
        .collect();
    render_panel(frame, area, "Logs", lines);
}
