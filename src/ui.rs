use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use sales_crossfilter::{CrossFilterController, InputEvent, MapDataset, PieDataset, RegionTotal};
use std::io;

pub struct App {
    pub controller: CrossFilterController,
    pub map: MapDataset,
    /// Map regions, highest sales first
    pub map_rows: Vec<RegionTotal>,
    pub pie: PieDataset,
    pub map_state: TableState,
    pub last_error: Option<String>,
}

impl App {
    pub fn new(controller: CrossFilterController) -> Self {
        let map = controller.current_map();
        let pie = controller.current_pie();
        let map_rows = map.ranked().into_iter().cloned().collect::<Vec<_>>();

        let mut map_state = TableState::default();
        if !map_rows.is_empty() {
            map_state.select(Some(0));
        }

        Self {
            controller,
            map,
            map_rows,
            pie,
            map_state,
            last_error: None,
        }
    }

    pub fn apply(&mut self, event: InputEvent) {
        match self.controller.apply(event) {
            Ok(transition) => {
                self.last_error = None;
                if transition.map_changed {
                    self.refresh_map();
                }
                if transition.pie_changed {
                    self.pie = self.controller.current_pie();
                }
            }
            Err(e) => self.last_error = Some(e.to_string()),
        }
    }

    fn refresh_map(&mut self) {
        self.map = self.controller.current_map();
        self.map_rows = self.map.ranked().into_iter().cloned().collect();

        let selected = match self.map_state.selected() {
            _ if self.map_rows.is_empty() => None,
            Some(i) => Some(i.min(self.map_rows.len() - 1)),
            None => Some(0),
        };
        self.map_state.select(selected);
    }

    /// Slider moves one mark left or right
    pub fn step_slider(&mut self, forward: bool) {
        let current = self.controller.controls().slider;
        let year = self.controller.dashboard().domain().step(current, forward);
        if year != current {
            self.apply(InputEvent::YearFromSlider(year));
        }
    }

    /// Dropdown picks the previous or next option
    pub fn step_dropdown(&mut self, forward: bool) {
        let current = self.controller.controls().dropdown;
        let year = self.controller.dashboard().domain().step(current, forward);
        if year != current {
            self.apply(InputEvent::YearFromDropdown(year));
        }
    }

    /// Enter on the highlighted region acts as a map click
    pub fn click_selected_region(&mut self) {
        let region = self
            .map_state
            .selected()
            .and_then(|i| self.map_rows.get(i))
            .map(|row| row.region.clone());

        if let Some(region) = region {
            self.apply(InputEvent::RegionFromMapClick(region));
        }
    }

    pub fn next(&mut self) {
        let len = self.map_rows.len();
        if len == 0 {
            return;
        }
        let i = match self.map_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.map_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.map_rows.len();
        if len == 0 {
            return;
        }
        let i = match self.map_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.map_state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Left | KeyCode::Char('h') => app.step_slider(false),
                KeyCode::Right | KeyCode::Char('l') => app.step_slider(true),
                KeyCode::Char('[') => app.step_dropdown(false),
                KeyCode::Char(']') => app.step_dropdown(true),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Enter => app.click_selected_region(),
                KeyCode::Home => {
                    if !app.map_rows.is_empty() {
                        app.map_state.select(Some(0));
                    }
                }
                KeyCode::End => {
                    if !app.map_rows.is_empty() {
                        app.map_state.select(Some(app.map_rows.len() - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Title + year controls
            Constraint::Min(0),    // Map and pie
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_map(f, content[0], app);
    render_pie(f, content[1], app);

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let controls = app.controller.controls();
    let domain = app.controller.dashboard().domain();

    let mut slider_spans = vec![Span::raw(" Slider: ")];
    for (i, year) in domain.years().iter().enumerate() {
        if i > 0 {
            slider_spans.push(Span::raw("──"));
        }
        let style = if *year == controls.slider {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        slider_spans.push(Span::styled(year.to_string(), style));
    }

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {}", app.controller.dashboard().title()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  |  "),
            Span::raw("Dropdown: "),
            Span::styled(format!("[{} ▾]", controls.dropdown), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(slider_spans),
    ];

    let header = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_map(f: &mut Frame, area: Rect, app: &mut App) {
    let region_label = app.controller.dashboard().scope().region_label().to_string();
    let max_sales = app.map_rows.first().map(|r| r.total_sales).unwrap_or(0.0);
    let clicked = app.controller.state().region.clone();

    let header_cells = [region_label.as_str(), "Total Sales ($)", ""].into_iter().map(|h| {
        Cell::from(h.to_string()).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.map_rows.iter().map(|r| {
        let color = heat_color(r.total_sales, max_sales);
        let marker = if clicked.as_deref() == Some(r.region.as_str()) { " ●" } else { "" };

        Row::new(vec![
            Cell::from(format!("{}{}", truncate(&r.region, 22), marker)),
            Cell::from(format!("{:.2}", r.total_sales)).style(Style::default().fg(color)),
            Cell::from(bar(r.total_sales, max_sales, 20)).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [Constraint::Length(26), Constraint::Length(16), Constraint::Min(10)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ", app.map.title)),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.map_state);
}

fn render_pie(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", app.pie.title));

    if app.pie.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "  No sales for this region and year",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(["Product Line", "Share", ""].into_iter().map(|h| {
        Cell::from(h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = app.pie.slices.iter().map(|s| {
        Row::new(vec![
            Cell::from(truncate(&s.product_line, 18)),
            Cell::from(format!("{:>6.2}%", s.percentage)),
            Cell::from(bar(s.percentage, 100.0, 25)).style(Style::default().fg(Color::Magenta)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [Constraint::Length(20), Constraint::Length(9), Constraint::Min(10)],
    )
    .header(header)
    .block(block);

    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if let Some(err) = &app.last_error {
        status_spans.push(Span::styled(format!(" {} ", err), Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" | "));
    } else if app.pie.fallback_region {
        status_spans.push(Span::styled(
            format!(" Showing default {} ", app.pie.region),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" | "));
    }

    status_spans.push(Span::styled("←/→", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Slider | "));
    status_spans.push(Span::styled("[/]", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Dropdown | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Select region | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * width as f64).round() as usize;
    "█".repeat(filled.min(width))
}

/// Rough Viridis ramp for terminal colors
fn heat_color(value: f64, max: f64) -> Color {
    let ratio = if max > 0.0 { value / max } else { 0.0 };
    match ratio {
        r if r >= 0.75 => Color::Yellow,
        r if r >= 0.5 => Color::Green,
        r if r >= 0.25 => Color::Cyan,
        _ => Color::Blue,
    }
}
