use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use richdoc::{Decoded, Document, Format, RichTextConfig, render::render_document};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Convert and preview HTML and Markdown documents", long_about = None)]
struct Cli {
    /// Input file; `.md` and `.markdown` are read as Markdown, anything else as HTML
    input: PathBuf,

    /// Output format (html or markdown); defaults to the input format
    #[arg(long)]
    to: Option<Format>,

    /// Write the converted document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the span tree instead of converting
    #[arg(long)]
    tree: bool,

    /// Preview the document in the terminal
    #[arg(long)]
    view: bool,

    /// Indentation of list items, in terminal cells
    #[arg(long)]
    list_indent: Option<u16>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RICHDOC_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.list_indent {
        Some(indent) => RichTextConfig::default().with_list_indent(indent),
        None => RichTextConfig::default(),
    };
    let source_format = Format::from_path(&cli.input);
    let decoded = load_document(&cli.input, source_format, &config)?;
    for issue in &decoded.issues {
        tracing::warn!(path = %cli.input.display(), %issue, "input problem");
    }

    if cli.tree {
        print!("{}", decoded.document.outline());
        return Ok(());
    }
    if cli.view {
        return view(decoded, &cli.input);
    }

    let target = cli.to.unwrap_or(source_format);
    let encoded = target.codec(config).encode(&decoded.document);
    match &cli.output {
        Some(path) => fs::write(path, encoded)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{encoded}"),
    }
    Ok(())
}

fn load_document(path: &Path, format: Format, config: &RichTextConfig) -> Result<Decoded> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let decoded = format.codec(config.clone()).decode(&content);
    tracing::info!(
        path = %path.display(),
        %format,
        paragraphs = decoded.document.paragraphs.len(),
        "decoded"
    );
    Ok(decoded)
}

fn view(decoded: Decoded, path: &Path) -> Result<()> {
    let mut viewer = Viewer::new(decoded, path);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_viewer(&mut terminal, &mut viewer).context("viewer error");

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    res
}

fn run_viewer<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    viewer: &mut Viewer,
) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    while !viewer.quit {
        terminal
            .draw(|frame| viewer.draw(frame))
            .context("failed to draw frame")?;
        if event::poll(tick_rate).context("event poll failed")? {
            if let Event::Key(key) = event::read().context("failed to read event")? {
                viewer.handle_key(key);
            }
        }
    }
    Ok(())
}

/// Read-only, scrollable preview of a decoded document.
struct Viewer {
    document: Document,
    title: String,
    issue_count: usize,
    scroll_top: usize,
    total_lines: usize,
    view_height: usize,
    quit: bool,
}

impl Viewer {
    fn new(decoded: Decoded, path: &Path) -> Self {
        Self {
            document: decoded.document,
            title: path.display().to_string(),
            issue_count: decoded.issues.len(),
            scroll_top: 0,
            total_lines: 0,
            view_height: 1,
            quit: false,
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let status_height = if area.height > 1 { 2 } else { 1 };
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(status_height)])
            .split(area);
        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(vertical[0]);
        let text_area = horizontal[0];
        let scrollbar_area = horizontal[1];

        let lines = render_document(&self.document, text_area.width.max(1) as usize);
        self.total_lines = lines.len();
        self.view_height = (text_area.height as usize).max(1);
        self.scroll_top = self.scroll_top.min(self.max_scroll());

        let paragraph = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::NONE))
            .scroll((self.scroll_top as u16, 0));
        frame.render_widget(paragraph, text_area);

        let mut scrollbar_state = ScrollbarState::new(self.total_lines).position(self.scroll_top);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);

        let status = format!(
            "{} | {} paragraphs | {} issues | line {}/{} | q to quit",
            self.title,
            self.document.paragraphs.len(),
            self.issue_count,
            (self.scroll_top + 1).min(self.total_lines),
            self.total_lines
        );
        let status_widget = Paragraph::new(Line::from(Span::styled(status, Style::default())))
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(status_widget, vertical[1]);
    }

    fn max_scroll(&self) -> usize {
        self.total_lines.saturating_sub(self.view_height)
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let page = self.view_height.saturating_sub(1).max(1);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.scroll_top += 1,
            KeyCode::Up | KeyCode::Char('k') => self.scroll_top = self.scroll_top.saturating_sub(1),
            KeyCode::PageDown | KeyCode::Char(' ') => self.scroll_top += page,
            KeyCode::PageUp => self.scroll_top = self.scroll_top.saturating_sub(page),
            KeyCode::Home | KeyCode::Char('g') => self.scroll_top = 0,
            KeyCode::End | KeyCode::Char('G') => self.scroll_top = self.max_scroll(),
            _ => {}
        }
        self.scroll_top = self.scroll_top.min(self.max_scroll());
    }
}
