use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use eyre::Result;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::config::Config;
use crate::env::Environment;
use crate::html::HtmlPage;
use crate::location;
use crate::logging;
use crate::page::{Affordance, PageController, PageEvent, PageOptions};
use crate::parser::{self, TextStructure};
use crate::settings::{Action, Settings};
use crate::toast::ToastKind;
use crate::toc::{NavContainer, build_toc};
use crate::ui::board::Board;
use crate::ui::terminal_env::{Navigation, TerminalEnv};
use crate::ui::windows::help::HelpWindow;
use crate::ui::windows::toc::TocWindow;

/// Where and how a document is opened.
#[derive(Debug, Clone, Default)]
pub struct ViewerOptions {
    pub root_selector: Option<String>,
    pub url: Option<String>,
    pub fallback_back_url: Option<String>,
}

/// A document laid out for the terminal, plus the controller options that
/// match its layout.
pub struct PreparedDocument {
    pub title: String,
    pub structure: TextStructure,
    pub page_options: PageOptions,
}

/// Anchor the headings under the root, lay the anchored markup out as text
/// and describe the page to the controller. The sidebar is the navigation
/// container, so one is always present.
pub fn prepare_document(
    source: &str,
    root_selector: &str,
    settings: &Settings,
    fallback_back_url: Option<String>,
    text_width: usize,
) -> Result<PreparedDocument> {
    let page = HtmlPage::parse(source);
    let mut root = page.document_root(root_selector)?;
    if root.is_none() {
        logging::warn(format!("no element matches document root `{}`", root_selector));
    }
    build_toc(root.as_mut(), Some(&mut NavContainer::new()));

    let markup = match root.as_ref() {
        Some(root) => page.anchored_html(root_selector, &root.headings)?,
        None => None,
    };
    let structure = parser::parse_html(&markup.unwrap_or_else(|| page.html()), Some(text_width))?;

    let fallback_back_url = fallback_back_url.or_else(|| {
        Some(settings.fallback_back_url.clone()).filter(|url| !url.is_empty())
    });
    let page_options = PageOptions {
        nav_container: Some(NavContainer::new()),
        document_root: root,
        back_top: Some(Affordance::default()),
        copy_page_link: Some(Affordance::default()),
        back: Some(Affordance::default()),
        fallback_back_url,
        back_top_threshold: Some(settings.back_top_threshold),
        toast_duration_ms: Some(settings.toast_duration_ms),
    };

    Ok(PreparedDocument {
        title: page.title().unwrap_or_default(),
        structure,
        page_options,
    })
}

/// Name of a key as written in the keymap.
pub fn key_name(key: &KeyEvent) -> Option<String> {
    let name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        _ => return None,
    };
    Some(name)
}

/// Whether text laid out at `laid_out` columns must be laid out again for
/// `available` columns. A configured width never changes.
pub fn needs_relayout(configured: Option<usize>, laid_out: usize, available: usize) -> bool {
    configured.is_none() && laid_out != available
}

struct HistoryEntry {
    path: PathBuf,
    url: String,
}

pub struct Viewer {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
    options: ViewerOptions,
    env: TerminalEnv,
    page: PageController,
    board: Board,
    toc: TocWindow,
    title: String,
    layout_width: usize,
    current: PathBuf,
    stack: Vec<HistoryEntry>,
    show_help: bool,
    help_scroll: u16,
    should_quit: bool,
}

impl Viewer {
    pub fn new(config: Config, options: ViewerOptions, path: &Path) -> Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        let mut env = TerminalEnv::new(String::new());
        let page = PageController::init(PageOptions::default(), &mut env);
        let toc = TocWindow::new(config.settings.show_toc);

        let mut viewer = Self {
            terminal,
            config,
            env,
            page,
            board: Board::new(),
            toc,
            title: String::new(),
            layout_width: 0,
            current: path.to_path_buf(),
            stack: Vec::new(),
            show_help: false,
            help_scroll: 0,
            should_quit: false,
            options,
        };
        let url = viewer.options.url.clone();
        viewer.load(path.to_path_buf(), url)?;
        Ok(viewer)
    }

    fn text_width(&self) -> usize {
        if let Some(width) = self.config.settings.text_width {
            return width;
        }
        let columns = crossterm::terminal::size().map(|(w, _)| w as usize).unwrap_or(100);
        let sidebar = if self.toc.visible {
            self.config.settings.toc_width as usize
        } else {
            0
        };
        columns.saturating_sub(sidebar + 4).max(20)
    }

    fn load(&mut self, path: PathBuf, url: Option<String>) -> Result<()> {
        let source = fs::read_to_string(&path)?;
        let url = url
            .or_else(|| location::file_url(&path))
            .unwrap_or_else(|| path.display().to_string());
        let root_selector = self
            .options
            .root_selector
            .clone()
            .unwrap_or_else(|| self.config.settings.root_selector.clone());

        let layout_width = self.text_width();
        let prepared = prepare_document(
            &source,
            &root_selector,
            &self.config.settings,
            self.options.fallback_back_url.clone(),
            layout_width,
        )?;

        self.page.destroy();
        self.env.load(
            url,
            prepared.structure.text_lines.len(),
            prepared.structure.sections.clone(),
            self.stack.len(),
        );
        self.board.update_text_structure(prepared.structure);
        self.page = PageController::init(prepared.page_options, &mut self.env);
        self.title = if prepared.title.is_empty() {
            path.display().to_string()
        } else {
            prepared.title
        };
        self.layout_width = layout_width;
        self.current = path;
        self.toc.selected_index = 0;
        logging::info(format!("opened {}", self.current.display()));
        Ok(())
    }

    /// Lay the current page out again at the new width, staying on the
    /// section being read.
    fn relayout(&mut self) -> Result<()> {
        let active = self.page.active().map(str::to_string);
        let url = self.env.location();
        self.load(self.current.clone(), Some(url))?;
        self.update_viewport()?;
        for id in self.env.take_due_timers() {
            self.page.handle(PageEvent::TimerFired(id), &mut self.env);
        }
        if let Some(id) = active {
            self.env.scroll_into_view(&id);
        }
        Ok(())
    }

    fn update_viewport(&mut self) -> Result<()> {
        let (_, rows) = crossterm::terminal::size()?;
        // Board borders and the status line.
        self.env.set_viewport_rows((rows as usize).saturating_sub(3));
        Ok(())
    }

    pub fn run(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
        if self.config.settings.mouse_support {
            crossterm::execute!(io::stdout(), crossterm::event::EnableMouseCapture)?;
        }
        self.terminal.clear()?;
        self.terminal.hide_cursor()?;
        self.update_viewport()?;
        self.dispatch(PageEvent::Scrolled)?;

        let result = self.event_loop();

        self.page.destroy();
        self.terminal.clear()?;
        self.terminal.show_cursor()?;
        if self.config.settings.mouse_support {
            crossterm::execute!(io::stdout(), crossterm::event::DisableMouseCapture)?;
        }
        crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
        crossterm::terminal::disable_raw_mode()?;

        result
    }

    fn event_loop(&mut self) -> Result<()> {
        loop {
            if self.should_quit {
                break;
            }

            for id in self.env.take_due_timers() {
                self.dispatch(PageEvent::TimerFired(id))?;
            }

            self.board.set_row(self.env.scroll_row());
            self.board.set_active_section(self.page.active());
            self.terminal.draw(|f| {
                Self::render_static(
                    f,
                    &self.board,
                    &self.toc,
                    &self.page,
                    &self.title,
                    &self.config,
                    self.show_help,
                    self.help_scroll,
                );
            })?;

            let poll_timeout = self
                .env
                .time_to_next_timer()
                .unwrap_or(Duration::from_secs(60))
                .min(Duration::from_secs(60));
            if !crossterm::event::poll(poll_timeout)? {
                continue;
            }

            match crossterm::event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key)?,
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollDown => self.scroll(3)?,
                    MouseEventKind::ScrollUp => self.scroll(-3)?,
                    _ => {}
                },
                Event::Resize(_, _) => {
                    if needs_relayout(self.config.settings.text_width, self.layout_width, self.text_width()) {
                        self.relayout()?;
                    }
                    self.update_viewport()?;
                    self.dispatch(PageEvent::Scrolled)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Hand an event to the controller, then carry out any navigation it
    /// asked for.
    fn dispatch(&mut self, event: PageEvent) -> Result<()> {
        self.page.handle(event, &mut self.env);
        match self.env.take_navigation() {
            Some(Navigation::Back) => {
                if let Some(previous) = self.stack.pop() {
                    self.load(previous.path, Some(previous.url))?;
                    self.dispatch(PageEvent::Scrolled)?;
                }
            }
            Some(Navigation::Open(url)) => self.open(&url)?,
            None => {}
        }
        Ok(())
    }

    fn open(&mut self, url: &str) -> Result<()> {
        let local = location::local_path(url).map(|path| {
            if path.is_relative() {
                self.current
                    .parent()
                    .map(|dir| dir.join(&path))
                    .unwrap_or(path)
            } else {
                path
            }
        });

        match local.filter(|path| path.is_file()) {
            Some(path) => {
                self.stack.push(HistoryEntry {
                    path: self.current.clone(),
                    url: self.env.location(),
                });
                let url = location::file_url(&path).map(|base| match location::fragment(url) {
                    Some(id) => location::with_fragment(&base, &id),
                    None => base,
                });
                self.load(path, url)?;
                self.dispatch(PageEvent::Scrolled)?;
            }
            None => {
                if !self.open_external_link(url)? {
                    logging::warn(format!("could not open {}", url));
                }
            }
        }
        Ok(())
    }

    fn open_external_link(&self, url: &str) -> Result<bool> {
        let status = std::process::Command::new("xdg-open").arg(url).status();
        match status {
            Ok(status) => Ok(status.success()),
            Err(err) => Err(err.into()),
        }
    }

    fn scroll(&mut self, delta: isize) -> Result<()> {
        if self.env.scroll_by(delta) {
            self.dispatch(PageEvent::Scrolled)?;
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }
        let Some(action) = key_name(&key).and_then(|name| self.config.keymap.action(&name)) else {
            return Ok(());
        };

        if self.show_help {
            self.handle_help_keys(action);
            return Ok(());
        }
        if self.toc.focused {
            return self.handle_toc_keys(action);
        }
        self.handle_normal_keys(action)
    }

    fn handle_help_keys(&mut self, action: Action) {
        match action {
            Action::ScrollDown => self.help_scroll = self.help_scroll.saturating_add(1),
            Action::ScrollUp => self.help_scroll = self.help_scroll.saturating_sub(1),
            Action::Help | Action::Quit => {
                self.show_help = false;
                self.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_toc_keys(&mut self, action: Action) -> Result<()> {
        match action {
            Action::ScrollDown => self.toc.next_entry(self.page.links().len()),
            Action::ScrollUp => self.toc.previous_entry(),
            Action::Follow => {
                let index = self.toc.selected_index;
                self.toc.focused = false;
                self.dispatch(PageEvent::TocLinkClicked(index))?;
                self.dispatch(PageEvent::Scrolled)?;
            }
            Action::TableOfContents | Action::Quit => self.toc.focused = false,
            Action::Help => self.show_help = true,
            _ => {}
        }
        Ok(())
    }

    fn handle_normal_keys(&mut self, action: Action) -> Result<()> {
        let page_rows = self.env.viewport_rows() as isize;
        match action {
            Action::ScrollDown => self.scroll(1)?,
            Action::ScrollUp => self.scroll(-1)?,
            Action::PageDown => self.scroll(page_rows)?,
            Action::PageUp => self.scroll(-page_rows)?,
            Action::BackToTop => {
                if self.page.back_top_visible() {
                    self.dispatch(PageEvent::BackTopClicked)?;
                    self.dispatch(PageEvent::Scrolled)?;
                }
            }
            Action::End => {
                let last = self.env.max_scroll();
                if self.env.scroll_to_row(last) {
                    self.dispatch(PageEvent::Scrolled)?;
                }
            }
            Action::TableOfContents => self.toc.toggle_focus(self.page.active_index()),
            Action::Follow => {}
            Action::CopySectionLink => {
                let index = self.page.active_index().unwrap_or(0);
                self.dispatch(PageEvent::HeadingAnchorClicked(index))?;
            }
            Action::CopyPageLink => self.dispatch(PageEvent::CopyPageLinkClicked)?,
            Action::Back => self.dispatch(PageEvent::BackClicked)?,
            Action::Help => self.show_help = true,
            Action::Quit => self.should_quit = true,
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn render_static(
        frame: &mut Frame,
        board: &Board,
        toc: &TocWindow,
        page: &PageController,
        title: &str,
        config: &Config,
        show_help: bool,
        help_scroll: u16,
    ) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let sidebar_width = if toc.visible { config.settings.toc_width } else { 0 };
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(sidebar_width), Constraint::Min(0)])
            .split(rows[0]);

        toc.render(frame, columns[0], page.links());
        board.render(frame, columns[1], title);

        let status = Self::build_status_line(board, page, rows[1].width);
        frame.render_widget(Paragraph::new(Line::from(status)), rows[1]);

        if page.toast().is_visible() {
            Self::render_message_static(frame, page.toast().message(), page.toast().kind());
        }
        if show_help {
            HelpWindow::render(frame, frame.area(), config.keymap_user_dict(), help_scroll);
        }
    }

    fn build_status_line(board: &Board, page: &PageController, width: u16) -> String {
        let width = width as usize;
        let section = page
            .nav_container()
            .and_then(|nav| nav.active())
            .map(|link| format!("{} {}", link.level.badge(), link.label))
            .unwrap_or_default();

        let total = board.total_lines();
        let percent = if total > 0 {
            (board.row().saturating_mul(100) / total).min(100)
        } else {
            0
        };
        let mut right = format!("{}%", percent);
        if page.back_top_visible() {
            right = format!("[top: g] {}", right);
        }

        let left: String = section.chars().take(width.saturating_sub(right.len() + 1)).collect();
        let gap = width.saturating_sub(left.chars().count() + right.len());
        format!("{}{}{}", left, " ".repeat(gap), right)
    }

    fn render_message_static(frame: &mut Frame, message: &str, kind: ToastKind) {
        let color = match kind {
            ToastKind::Info => Color::Blue,
            ToastKind::Error => Color::Red,
        };

        let frame_area = frame.area();
        let width = frame_area.width.saturating_sub(4);
        let lines = textwrap::wrap(message, (width.saturating_sub(2) as usize).max(1)).len() as u16;
        let area = Rect {
            x: frame_area.x + 2,
            y: frame_area.y + 2,
            width,
            height: (lines + 2).min(frame_area.height),
        };

        let message_paragraph = Paragraph::new(message)
            .style(Style::default().fg(color))
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true });

        frame.render_widget(Clear, area);
        frame.render_widget(message_paragraph, area);
    }
}
