use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use conf_hero_core::{FrameClock, HeroBanner};
use conf_hero_protocol::{HeroAction, HeroSnapshot, ScrollMetrics, ThemeToken};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::executor::LocalPool;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

const FRAME: Duration = Duration::from_millis(33);
/// Longest step fed to the clock per frame, so resuming a suspended
/// process does not replay a burst of rotations.
const MAX_FRAME_STEP: Duration = Duration::from_millis(250);
const TICKER_SEPARATOR: &str = "   •   ";

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::Background => Color::Black,
        ThemeToken::Surface => Color::Black,
        ThemeToken::Border => Color::DarkGray,
        ThemeToken::CopyBoxFill => Color::Rgb(8, 60, 56),
        ThemeToken::CopyTitle => Color::Rgb(153, 246, 228),
        ThemeToken::CopyBody => Color::White,
        ThemeToken::ButtonFill => Color::White,
        ThemeToken::ButtonText => Color::Rgb(19, 78, 74),
        ThemeToken::ArrowFill => Color::DarkGray,
        ThemeToken::ArrowIcon => Color::White,
        ThemeToken::DotActive => Color::Rgb(94, 234, 212),
        ThemeToken::DotInactive => Color::DarkGray,
        ThemeToken::SlidePlaceholder => Color::Rgb(19, 78, 74),
        ThemeToken::TickerBackground => Color::Rgb(17, 94, 89),
        ThemeToken::TickerBorder => Color::Rgb(19, 78, 74),
        ThemeToken::TickerText => Color::Rgb(240, 253, 250),
        ThemeToken::LinkBarBackground => Color::Black,
        ThemeToken::LinkBarText => Color::Gray,
        ThemeToken::LinkFill => Color::White,
        ThemeToken::LinkText => Color::Rgb(17, 94, 89),
    }
}

fn style(fg: ThemeToken, bg: ThemeToken) -> Style {
    Style::default().fg(theme_to_color(fg)).bg(theme_to_color(bg))
}

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Quit,
    Hero(HeroAction),
}

pub fn input_for(code: KeyCode) -> Option<Input> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Input::Quit),
        KeyCode::Left | KeyCode::Char('h') => Some(Input::Hero(HeroAction::Previous)),
        KeyCode::Right | KeyCode::Char('l') => Some(Input::Hero(HeroAction::Next)),
        KeyCode::Char(c @ '1'..='9') => {
            let index = c.to_digit(10)? as usize - 1;
            Some(Input::Hero(HeroAction::JumpTo(index)))
        }
        _ => None,
    }
}

/// The slice of `text` visible at `offset` cells in a strip `width` wide.
pub fn ticker_window(text: &str, offset: f32, width: usize) -> String {
    let skip = offset.max(0.0).floor() as usize;
    text.chars().skip(skip).take(width).collect()
}

/// Clock step for a frame that took `elapsed`.
pub fn frame_step(elapsed: Duration) -> Duration {
    elapsed.min(MAX_FRAME_STEP)
}

/// Progress dots, the current slide filled.
pub fn dots(count: usize, current: usize) -> String {
    (0..count)
        .map(|i| if i == current { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn run(banner: &HeroBanner, clock: &FrameClock, pool: &mut LocalPool) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, banner, clock, pool);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    banner: &HeroBanner,
    clock: &FrameClock,
    pool: &mut LocalPool,
) -> Result<()> {
    let mut last = Instant::now();
    loop {
        let now = Instant::now();
        clock.tick(frame_step(now - last));
        last = now;
        pool.run_until_stalled();

        let snapshot = banner.snapshot();
        let mut metrics = ScrollMetrics::default();
        terminal.draw(|frame| metrics = draw(frame, &snapshot))?;
        banner.set_ticker_metrics(metrics);

        if event::poll(FRAME)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match input_for(key.code) {
                Some(Input::Quit) => break,
                Some(Input::Hero(action)) => {
                    banner.apply(action);
                }
                None => {}
            }
        }
    }
    Ok(())
}

/// Draw one frame and return the ticker geometry in cells.
fn draw(frame: &mut Frame<'_>, snapshot: &HeroSnapshot) -> ScrollMetrics {
    let [header, hero, dots_area, ticker, links, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(8),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let slide_label = format!(" Slide {}/{} ", snapshot.current + 1, snapshot.slide_count);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(" conf-hero ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(slide_label),
        ]))
        .style(Style::default().fg(Color::White).bg(Color::DarkGray)),
        header,
    );

    draw_hero(frame, hero, snapshot);

    frame.render_widget(
        Paragraph::new(dots(snapshot.slide_count, snapshot.current))
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme_to_color(ThemeToken::DotActive))),
        dots_area,
    );

    let metrics = draw_ticker(frame, ticker, snapshot);

    let mut link_spans = Vec::new();
    for link in &snapshot.links {
        if !link_spans.is_empty() {
            link_spans.push(Span::raw("   "));
        }
        link_spans.push(Span::styled(
            format!(" {} ", link.label),
            style(ThemeToken::LinkText, ThemeToken::LinkFill).add_modifier(Modifier::BOLD),
        ));
    }
    frame.render_widget(
        Paragraph::new(vec![
            Line::styled(
                snapshot.organizer.as_str(),
                Style::default().fg(theme_to_color(ThemeToken::LinkBarText)),
            ),
            Line::default(),
            Line::from(link_spans),
        ])
        .alignment(Alignment::Center),
        links,
    );

    frame.render_widget(
        Paragraph::new(" ←/→ previous/next | 1-9 jump | q quit ")
            .style(Style::default().fg(Color::Gray).bg(Color::DarkGray)),
        footer,
    );

    metrics
}

fn draw_hero(frame: &mut Frame<'_>, area: Rect, snapshot: &HeroSnapshot) {
    let slide_title = match &snapshot.slide {
        Some(slide) => format!(" {} ", slide.alt),
        None => " Loading images… ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme_to_color(ThemeToken::Border)))
        .title(slide_title)
        .title_bottom(Line::from(" ‹  › ").right_aligned())
        .style(style(ThemeToken::CopyBody, ThemeToken::SlidePlaceholder));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let copy = &snapshot.copy;
    let mut lines = vec![
        Line::styled(
            copy.title.as_str(),
            Style::default()
                .fg(theme_to_color(ThemeToken::CopyTitle))
                .add_modifier(Modifier::BOLD),
        ),
        Line::default(),
        Line::raw(copy.subtitle.as_str()),
        Line::default(),
        Line::from(Span::styled(
            format!(" {} ", copy.register.label),
            style(ThemeToken::ButtonText, ThemeToken::ButtonFill),
        )),
    ];
    if let Some(slide) = &snapshot.slide {
        lines.push(Line::default());
        lines.push(Line::styled(
            slide.uri.as_str(),
            Style::default().fg(Color::Gray),
        ));
    }
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }),
        inner.inner(ratatui::layout::Margin::new(2, 1)),
    );
}

fn draw_ticker(frame: &mut Frame<'_>, area: Rect, snapshot: &HeroSnapshot) -> ScrollMetrics {
    let text = snapshot.ticker.headlines.join(TICKER_SEPARATOR);
    let width = usize::from(area.width);
    frame.render_widget(
        Paragraph::new(ticker_window(&text, snapshot.ticker.offset, width))
            .style(style(ThemeToken::TickerText, ThemeToken::TickerBackground)),
        area,
    );
    ScrollMetrics::new(f32::from(area.width), text.chars().count() as f32)
}
