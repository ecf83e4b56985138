use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    io::{self, stdout, Stdout},
    time::{Duration, Instant},
};

use shape_sorter::config::{init_logging, Cli};
use shape_sorter::game::{Cell, Game, GameEvent, Position, GRID_SIZE};
use shape_sorter::shapes::{Shape, ShapeColor};

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const GHOST_CHAR: &str = "▒▒";
const BLOCKED_CHAR: &str = "░░";
const EMPTY_CHAR: &str = "· ";
const POLL_MS: u64 = 50;

fn shape_color(color: ShapeColor) -> Color {
    let (r, g, b) = color.rgb();
    Color::Rgb(r, g, b)
}

// ============================================================================
// App
// ============================================================================

/// Where the caller is in the place → settle → clear → advance sequence.
enum Phase {
    Aiming,
    Settling { until: Instant },
    Clearing { cells: Vec<Position>, until: Instant },
}

struct App {
    game: Game,
    cursor: Position,
    phase: Phase,
    settle_delay: Duration,
    clear_delay: Duration,
    status: String,
}

impl App {
    fn new(game: Game, cli: &Cli) -> Self {
        let status = format!("Seed {}", game.seed());
        Self {
            game,
            cursor: Position::new(0, 0),
            phase: Phase::Aiming,
            settle_delay: cli.settle_delay(),
            clear_delay: cli.clear_delay(),
            status,
        }
    }

    fn replace_game(&mut self, game: Game) {
        self.status = format!("Seed {}", game.seed());
        self.game = game;
        self.cursor = Position::new(0, 0);
        self.phase = Phase::Aiming;
    }

    fn move_cursor(&mut self, dx: i16, dy: i16) {
        let max = GRID_SIZE as i16 - 1;
        self.cursor.x = (self.cursor.x + dx).clamp(0, max);
        self.cursor.y = (self.cursor.y + dy).clamp(0, max);
    }

    fn place(&mut self) {
        if !matches!(self.phase, Phase::Aiming) {
            return;
        }
        if self.game.place_shape(self.cursor.x, self.cursor.y) {
            self.phase = Phase::Settling {
                until: Instant::now() + self.settle_delay,
            };
        } else {
            self.status = "Doesn't fit there".to_string();
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        match &self.phase {
            Phase::Aiming => {}
            Phase::Settling { until } if now >= *until => {
                let cells = self.game.find_lines_to_clear();
                if cells.is_empty() {
                    self.game.next_turn();
                    self.phase = Phase::Aiming;
                } else {
                    self.phase = Phase::Clearing {
                        cells,
                        until: now + self.clear_delay,
                    };
                }
            }
            Phase::Clearing { cells, until } if now >= *until => {
                let cells = cells.clone();
                self.game.clear_lines(&cells);
                self.game.next_turn();
                self.phase = Phase::Aiming;
            }
            _ => {}
        }

        for event in self.game.take_events() {
            match event {
                GameEvent::LinesCleared { rows, columns, points } => {
                    self.status = format!("{} lines  +{points}", rows + columns);
                }
                GameEvent::GridCleared { bonus } => {
                    self.status = format!("Grid cleared!  +{bonus}");
                }
                GameEvent::ShapePlaced { .. } => self.status.clear(),
                GameEvent::TurnAdvanced | GameEvent::GameOver => {}
            }
        }
    }

    fn clearing_cells(&self) -> &[Position] {
        match &self.phase {
            Phase::Clearing { cells, .. } => cells,
            _ => &[],
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, app: &App) {
    let area = frame.size();
    render_game(frame, app, area);
    if app.game.is_game_over() {
        render_game_over(frame, app, area);
    }
}

fn render_game(frame: &mut Frame, app: &App, area: Rect) {
    let grid_display_width = (GRID_SIZE as u16 * CELL_WIDTH) + 2;
    let grid_display_height = GRID_SIZE as u16 + 2;
    let shapes_width = 14;
    let info_width = 16;
    let total_width = grid_display_width + shapes_width + info_width + 4;
    let total_height = grid_display_height.max(14) + 3;

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height.max(14)),
        Constraint::Fill(1),
    ])
    .split(main_area);

    let game_row = vertical[0];

    // Layout: [Grid][Shapes][Info]
    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(shapes_width),
        Constraint::Length(info_width),
    ])
    .split(game_row);

    let grid_area = Rect {
        height: grid_display_height,
        ..horizontal[0]
    };
    render_grid(frame, app, grid_area);
    render_shapes(frame, app, horizontal[1]);
    render_info(frame, app, horizontal[2]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 2,
    };

    if controls_area.y + 1 < area.height {
        let controls = Paragraph::new(vec![
            Line::from(app.status.clone()),
            Line::from("Arrows/WASD: Aim | Enter/Space: Place | N: New | R: Retry seed | Q/ESC: Quit"),
        ])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Grid ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let game = &app.game;
    let shape = game.current_shape();
    let aiming = matches!(app.phase, Phase::Aiming) && !game.is_game_over();
    let fits = game.can_place_shape(app.cursor.x, app.cursor.y);
    let clearing = app.clearing_cells();

    let mut lines: Vec<Line> = Vec::new();

    for y in 0..GRID_SIZE {
        let mut spans: Vec<Span> = Vec::new();

        for x in 0..GRID_SIZE {
            let pos = Position::new(x as i16, y as i16);
            let sx = pos.x - app.cursor.x;
            let sy = pos.y - app.cursor.y;
            let under_ghost = aiming
                && sx >= 0
                && sy >= 0
                && shape.is_filled(sx as usize, sy as usize);

            let (symbol, style) = match game.grid()[y][x] {
                Cell::Filled(color) if clearing.contains(&pos) => (
                    BLOCK_CHAR,
                    Style::default()
                        .fg(shape_color(color))
                        .add_modifier(Modifier::SLOW_BLINK),
                ),
                Cell::Filled(_) if under_ghost => (BLOCKED_CHAR, Style::default().fg(Color::Red)),
                Cell::Filled(color) => (BLOCK_CHAR, Style::default().fg(shape_color(color))),
                Cell::Empty if under_ghost && fits => {
                    (GHOST_CHAR, Style::default().fg(shape_color(shape.color())))
                }
                Cell::Empty if under_ghost => (BLOCKED_CHAR, Style::default().fg(Color::DarkGray)),
                Cell::Empty => (EMPTY_CHAR, Style::default().fg(Color::DarkGray)),
            };

            spans.push(Span::styled(symbol, style));
        }

        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn shape_lines(shape: &Shape) -> Vec<Line<'static>> {
    let style = Style::default().fg(shape_color(shape.color()));
    shape
        .rows()
        .iter()
        .map(|row| {
            let mut spans = vec![Span::raw(" ")];
            for filled in row {
                if *filled {
                    spans.push(Span::styled(BLOCK_CHAR, style));
                } else {
                    spans.push(Span::raw("  "));
                }
            }
            Line::from(spans)
        })
        .collect()
}

fn render_shapes(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Shapes ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::from(Span::styled(
        "Current",
        Style::default().fg(Color::Yellow),
    ))];
    lines.extend(shape_lines(app.game.current_shape()));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Next",
        Style::default().fg(Color::DarkGray),
    )));
    lines.extend(shape_lines(app.game.next_shape()));

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", app.game.score())),
        Line::from(""),
        Line::from(Span::styled("Seed", Style::default().fg(Color::Cyan))),
        Line::from(app.game.seed().to_string()),
    ];

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_game_over(frame: &mut Frame, app: &App, area: Rect) {
    let mut text = vec![
        Line::from(""),
        Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(format!("Final score: {}", app.game.score())),
        Line::from(""),
    ];

    if let Some(shape) = app.game.last_shape() {
        text.push(Line::from("This shape couldn't be placed:"));
        text.extend(shape_lines(shape));
        text.push(Line::from(""));
    }

    text.push(Line::from(Span::styled(
        "N: new game  R: retry seed",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Game Over ")
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    let popup_area = centered_rect(34, 14, area);
    frame.render_widget(paragraph, popup_area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Main Loop
// ============================================================================

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        if event::poll(Duration::from_millis(POLL_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => break,
                        KeyCode::Char('n') | KeyCode::Char('N') => {
                            let game = app.game.new_game();
                            app.replace_game(game);
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            let game = app.game.restart();
                            app.replace_game(game);
                        }
                        _ if app.game.is_game_over() => {}
                        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
                            app.move_cursor(-1, 0);
                        }
                        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
                            app.move_cursor(1, 0);
                        }
                        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => {
                            app.move_cursor(0, -1);
                        }
                        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
                            app.move_cursor(0, 1);
                        }
                        KeyCode::Enter | KeyCode::Char(' ') => app.place(),
                        _ => {}
                    }
                }
            }
        }

        app.update();
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref()).context("failed to set up logging")?;

    let game = Game::with_config(cli.seed(), cli.game_config());
    let mut app = App::new(game, &cli);

    enable_raw_mode().context("failed to enable raw mode")?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result.context("terminal i/o failed")?;
    println!(
        "seed {}  score {}  (replay with --seed {})",
        app.game.seed(),
        app.game.score(),
        app.game.seed()
    );
    Ok(())
}
