use crate::game::{Cell, GameOutcome, SIDE};
use crate::ui::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(9),    // Board
            Constraint::Length(3), // Stats
            Constraint::Length(3), // Message
            Constraint::Length(3), // Controls
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_board(frame, app, chunks[1]);
    render_stats(frame, app, chunks[2]);
    render_message(frame, app.message(), chunks[3]);
    render_controls(frame, chunks[4]);
}

fn mark_color(cell: Cell) -> Color {
    match cell {
        Cell::X => Color::Cyan,
        Cell::O => Color::Magenta,
        Cell::Empty => Color::DarkGray,
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.episode().state();
    let agent_mark = app.episode().agent_mark();

    let (status, color) = match state.outcome() {
        Some(GameOutcome::Winner(p)) if p == agent_mark => ("Agent wins".to_string(), Color::Red),
        Some(GameOutcome::Winner(_)) => ("You win".to_string(), Color::Green),
        Some(GameOutcome::Draw) => ("Draw".to_string(), Color::Yellow),
        None if app.agent_thinking() => ("Agent is thinking...".to_string(), Color::Gray),
        None => {
            let player = state.current_player();
            let who = if player == agent_mark { "Agent" } else { "You" };
            (
                format!("{} to move ({})", who, player.name()),
                mark_color(player.to_cell()),
            )
        }
    };

    let header = Paragraph::new(status)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Tic-Tac-Toe"));

    frame.render_widget(header, area);
}

fn render_board(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.episode().state();
    let board = state.board();
    let win_line = state.winning_line();
    let show_cursor = !state.is_terminal();

    let mut lines = Vec::new();
    lines.push(Line::from("╔═══╦═══╦═══╗"));
    for row in 0..SIDE {
        let mut spans = vec![Span::raw("║")];
        for col in 0..SIDE {
            let pos = row * SIDE + col;
            let cell = board.get(pos);
            let symbol = match cell {
                Cell::Empty => format!(" {} ", pos + 1),
                mark => format!(" {} ", mark.symbol()),
            };
            let mut style = Style::default().fg(mark_color(cell));
            if cell != Cell::Empty {
                style = style.add_modifier(Modifier::BOLD);
            }
            if win_line.is_some_and(|line| line.contains(&pos)) {
                style = style.fg(Color::Black).bg(Color::Green);
            } else if show_cursor && pos == app.cursor() {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(symbol, style));
            spans.push(Span::raw("║"));
        }
        lines.push(Line::from(spans));
        if row + 1 < SIDE {
            lines.push(Line::from("╠═══╬═══╬═══╣"));
        }
    }
    lines.push(Line::from("╚═══╩═══╩═══╝"));

    let board_widget = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(board_widget, area);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let tally = app.tally();
    let agent = app.agent();
    let text = format!(
        "Games: {}  |  Agent W/D/L: {}/{}/{}  |  States: {}  |  eps: {:.3}  alpha: {:.3}",
        app.games_played(),
        tally.wins,
        tally.draws,
        tally.losses,
        agent.store().len(),
        agent.effective_epsilon(),
        agent.effective_alpha(),
    );
    let stats = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Agent"));
    frame.render_widget(stats, area);
}

fn render_message(frame: &mut Frame, message: Option<&str>, area: Rect) {
    let msg_widget = Paragraph::new(message.unwrap_or(""))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(msg_widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let controls = Paragraph::new("Arrows/1-9: Select  |  Enter: Place  |  R: Restart  |  Q: Quit")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));

    frame.render_widget(controls, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AgentConfig, TdAgent};
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn rendered(app: &App) -> String {
        let backend = TestBackend::new(90, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_renders_empty_board_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(
            TdAgent::new(AgentConfig::default()),
            dir.path().join("values.json"),
            Duration::ZERO,
        );
        let screen = rendered(&app);
        assert!(screen.contains("Tic-Tac-Toe"));
        assert!(screen.contains("You to move (X)"));
        assert!(screen.contains("Games: 0"));
    }
}
