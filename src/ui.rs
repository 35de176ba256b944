use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use zimam_delivery::animation::CountUp;
use zimam_delivery::app::SubmitError;
use zimam_delivery::export::export_to_dir;
use zimam_delivery::forms::{DeliveryForm, TransactionForm};
use zimam_delivery::i18n::{self, format_amount, Text};
use zimam_delivery::logbook::{total_fee, DeliveryRecord, PlatformFilter};
use zimam_delivery::wallet::{Transaction, TransactionType};
use zimam_delivery::{AppContext, DeliveryFilter};

const GOLD: Color = Color::Rgb(212, 175, 55);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Map,
    Logbook,
    Wallet,
    Settings,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Home,
        Page::Map,
        Page::Logbook,
        Page::Wallet,
        Page::Settings,
    ];

    pub fn next(&self) -> Self {
        match self {
            Page::Home => Page::Map,
            Page::Map => Page::Logbook,
            Page::Logbook => Page::Wallet,
            Page::Wallet => Page::Settings,
            Page::Settings => Page::Home,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Home => Page::Settings,
            Page::Map => Page::Home,
            Page::Logbook => Page::Map,
            Page::Wallet => Page::Logbook,
            Page::Settings => Page::Wallet,
        }
    }

    pub fn index(&self) -> usize {
        Page::ALL.iter().position(|p| p == self).unwrap_or(0)
    }

    pub fn title(&self) -> Text {
        match self {
            Page::Home => Text::NavHome,
            Page::Map => Text::NavMap,
            Page::Logbook => Text::NavLogbook,
            Page::Wallet => Text::NavWallet,
            Page::Settings => Text::NavSettings,
        }
    }
}

// ============================================================================
// FORMS
// ============================================================================

/// Entry form shown over the current page
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    /// Fields: customer, platform, fee, area, notes
    Delivery { form: DeliveryForm, field: usize },
    /// Fields: amount, category, description
    Transaction { form: TransactionForm, field: usize },
}

impl Modal {
    fn field_count(&self) -> usize {
        match self {
            Modal::Delivery { .. } => 5,
            Modal::Transaction { .. } => 3,
        }
    }

    fn field(&self) -> usize {
        match self {
            Modal::Delivery { field, .. } | Modal::Transaction { field, .. } => *field,
        }
    }

    fn set_field(&mut self, index: usize) {
        match self {
            Modal::Delivery { field, .. } | Modal::Transaction { field, .. } => *field = index,
        }
    }

    fn next_field(&mut self) {
        let next = (self.field() + 1) % self.field_count();
        self.set_field(next);
    }

    fn previous_field(&mut self) {
        let count = self.field_count();
        let prev = (self.field() + count - 1) % count;
        self.set_field(prev);
    }

    /// Text buffer behind the focused field; None for choice fields
    fn text_mut(&mut self) -> Option<&mut String> {
        match self {
            Modal::Delivery { form, field } => match field {
                0 => Some(&mut form.customer),
                2 => Some(&mut form.fee),
                3 => Some(&mut form.area),
                4 => Some(&mut form.notes),
                _ => None,
            },
            Modal::Transaction { form, field } => match field {
                0 => Some(&mut form.amount),
                2 => Some(&mut form.description),
                _ => None,
            },
        }
    }

    /// Step a choice field (platform / category)
    fn cycle(&mut self, forward: bool) {
        match self {
            Modal::Delivery { form, field: 1 } => {
                form.platform = if forward {
                    form.platform.next()
                } else {
                    form.platform.previous()
                };
            }
            Modal::Transaction { form, field: 1 } => form.category = form.category.cycle(),
            _ => {}
        }
    }

    fn title(&self) -> Text {
        match self {
            Modal::Delivery { .. } => Text::AddNewDelivery,
            Modal::Transaction { form, .. } => match form.kind {
                TransactionType::Income => Text::AddIncome,
                TransactionType::Expense => Text::AddExpense,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,
    Search,
    Form(Modal),
}

// ============================================================================
// APP
// ============================================================================

pub struct App {
    pub ctx: AppContext,
    pub page: Page,
    pub mode: Mode,
    pub filter: DeliveryFilter,
    pub logbook_state: TableState,
    pub wallet_state: TableState,
    pub dark_mode: bool,
    pub notifications: bool,
    pub status: Option<String>,
    pub form_error: Option<String>,
    pub export_dir: PathBuf,
    pub pending_clear: bool,
    pub should_quit: bool,
    animation_start: Instant,
}

impl App {
    pub fn new(ctx: AppContext, export_dir: PathBuf) -> Self {
        let mut logbook_state = TableState::default();
        if !ctx.logbook.is_empty() {
            logbook_state.select(Some(0));
        }

        Self {
            ctx,
            page: Page::Home,
            mode: Mode::Normal,
            filter: DeliveryFilter::default(),
            logbook_state,
            wallet_state: TableState::default(),
            dark_mode: true,
            notifications: true,
            status: None,
            form_error: None,
            export_dir,
            pending_clear: false,
            should_quit: false,
            animation_start: Instant::now(),
        }
    }

    fn t(&self, text: Text) -> &'static str {
        self.ctx.language.t(text)
    }

    pub fn set_page(&mut self, page: Page) {
        if self.page != page {
            self.page = page;
            self.restart_animation();
        }
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page.next());
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.page.previous());
    }

    fn restart_animation(&mut self) {
        self.animation_start = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.animation_start.elapsed()
    }

    /// True while any count-up on screen is still moving
    pub fn is_animating(&self) -> bool {
        !CountUp::slow(1.0).is_finished(self.elapsed())
    }

    pub fn visible_deliveries(&self) -> Vec<&DeliveryRecord> {
        self.ctx.logbook.filtered(&self.filter).collect()
    }

    pub fn today_transactions(&self) -> Vec<&Transaction> {
        self.ctx.wallet.today_transactions().collect()
    }

    // ========================================================================
    // Keyboard
    // ========================================================================

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Search => self.handle_search_key(key),
            Mode::Form(_) => self.handle_form_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        let confirming_clear = std::mem::take(&mut self.pending_clear);

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::BackTab => self.previous_page(),
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.previous_page();
                } else {
                    self.next_page();
                }
            }
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                self.set_page(Page::ALL[index]);
            }
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Char('a') if matches!(self.page, Page::Home | Page::Logbook) => {
                self.open_delivery_form()
            }
            KeyCode::Char('/') if self.page == Page::Logbook => self.mode = Mode::Search,
            KeyCode::Char('p') if self.page == Page::Logbook => {
                self.filter.platform = self.filter.platform.next();
                self.reset_logbook_selection();
            }
            KeyCode::Char('i') if self.page == Page::Wallet => {
                self.open_transaction_form(TransactionType::Income)
            }
            KeyCode::Char('e') if self.page == Page::Wallet => {
                self.open_transaction_form(TransactionType::Expense)
            }
            KeyCode::Char('d') if matches!(self.page, Page::Logbook | Page::Wallet) => {
                self.delete_selected()
            }
            KeyCode::Char('l') if self.page == Page::Settings => self.toggle_language(),
            KeyCode::Char('m') if self.page == Page::Settings => self.dark_mode = !self.dark_mode,
            KeyCode::Char('n') if self.page == Page::Settings => {
                self.notifications = !self.notifications
            }
            KeyCode::Char('x') if self.page == Page::Settings => self.export_data(),
            KeyCode::Char('C') if self.page == Page::Settings => {
                if confirming_clear {
                    self.clear_data();
                } else {
                    self.pending_clear = true;
                    self.status = Some(self.t(Text::ConfirmClear).to_string());
                }
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.mode = Mode::Normal,
            KeyCode::Esc => {
                self.filter.search.clear();
                self.mode = Mode::Normal;
            }
            KeyCode::Backspace => {
                self.filter.search.pop();
            }
            KeyCode::Char(c) => self.filter.search.push(c),
            _ => return,
        }
        self.reset_logbook_selection();
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Enter {
            self.submit_form();
            return;
        }
        if key.code == KeyCode::Esc {
            self.close_form();
            return;
        }

        let Mode::Form(modal) = &mut self.mode else {
            return;
        };

        match key.code {
            KeyCode::Tab | KeyCode::Down => modal.next_field(),
            KeyCode::BackTab | KeyCode::Up => modal.previous_field(),
            KeyCode::Right => modal.cycle(true),
            KeyCode::Left => modal.cycle(false),
            KeyCode::Backspace => {
                if let Some(text) = modal.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = modal.text_mut() {
                    text.push(c);
                } else if c == ' ' {
                    modal.cycle(true);
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // Actions
    // ========================================================================

    pub fn open_delivery_form(&mut self) {
        self.form_error = None;
        self.mode = Mode::Form(Modal::Delivery {
            form: DeliveryForm::default(),
            field: 0,
        });
    }

    pub fn open_transaction_form(&mut self, kind: TransactionType) {
        self.form_error = None;
        self.mode = Mode::Form(Modal::Transaction {
            form: TransactionForm::new(kind),
            field: 0,
        });
    }

    fn close_form(&mut self) {
        self.form_error = None;
        self.mode = Mode::Normal;
    }

    pub fn submit_form(&mut self) {
        let result = match &self.mode {
            Mode::Form(Modal::Delivery { form, .. }) => self
                .ctx
                .submit_delivery(form)
                .map(|_| Text::DeliverySaved),
            Mode::Form(Modal::Transaction { form, .. }) => self
                .ctx
                .submit_transaction(form)
                .map(|_| Text::TransactionSaved),
            _ => return,
        };

        match result {
            Ok(saved) => {
                self.close_form();
                self.status = Some(self.t(saved).to_string());
                self.reset_logbook_selection();
                self.restart_animation();
            }
            Err(SubmitError::Invalid(err)) => self.form_error = Some(err.to_string()),
            Err(SubmitError::Storage(err)) => {
                tracing::error!("failed to save record: {err:#}");
                self.close_form();
                self.status = Some(self.error_status(&err));
            }
        }
    }

    pub fn delete_selected(&mut self) {
        let result = match self.page {
            Page::Logbook => {
                let id = self
                    .logbook_state
                    .selected()
                    .and_then(|i| self.visible_deliveries().get(i).map(|d| d.id.clone()));
                match id {
                    Some(id) => self.ctx.remove_delivery(&id).map(|r| r.is_some()),
                    None => return,
                }
            }
            Page::Wallet => {
                let id = self
                    .wallet_state
                    .selected()
                    .and_then(|i| self.today_transactions().get(i).map(|tx| tx.id.clone()));
                match id {
                    Some(id) => self.ctx.remove_transaction(&id).map(|r| r.is_some()),
                    None => return,
                }
            }
            _ => return,
        };

        match result {
            Ok(true) => self.status = Some(self.t(Text::RecordDeleted).to_string()),
            Ok(false) => {}
            Err(err) => {
                tracing::error!("failed to delete record: {err:#}");
                self.status = Some(self.error_status(&err));
            }
        }

        let deliveries = self.visible_deliveries().len();
        let transactions = self.today_transactions().len();
        clamp_selection(&mut self.logbook_state, deliveries);
        clamp_selection(&mut self.wallet_state, transactions);
    }

    pub fn toggle_language(&mut self) {
        if let Err(err) = self.ctx.toggle_language() {
            tracing::error!("failed to save language: {err:#}");
            self.status = Some(self.error_status(&err));
        }
    }

    pub fn export_data(&mut self) {
        match export_to_dir(&self.export_dir, &self.ctx) {
            Ok(_) => {
                self.status = Some(format!(
                    "{} {}",
                    self.t(Text::DataExported),
                    self.export_dir.display()
                ))
            }
            Err(err) => {
                tracing::error!("export failed: {err:#}");
                self.status = Some(self.error_status(&err));
            }
        }
    }

    pub fn clear_data(&mut self) {
        match self.ctx.clear_all() {
            Ok(_) => self.status = Some(self.t(Text::DataCleared).to_string()),
            Err(err) => {
                tracing::error!("clear failed: {err:#}");
                self.status = Some(self.error_status(&err));
            }
        }
        self.logbook_state.select(None);
        self.wallet_state.select(None);
    }

    fn reset_logbook_selection(&mut self) {
        let len = self.visible_deliveries().len();
        self.logbook_state.select(if len == 0 { None } else { Some(0) });
    }

    pub fn select_next(&mut self) {
        match self.page {
            Page::Logbook => {
                let len = self.visible_deliveries().len();
                step_selection(&mut self.logbook_state, len, true);
            }
            Page::Wallet => {
                let len = self.today_transactions().len();
                step_selection(&mut self.wallet_state, len, true);
            }
            _ => {}
        }
    }

    pub fn select_previous(&mut self) {
        match self.page {
            Page::Logbook => {
                let len = self.visible_deliveries().len();
                step_selection(&mut self.logbook_state, len, false);
            }
            Page::Wallet => {
                let len = self.today_transactions().len();
                step_selection(&mut self.wallet_state, len, false);
            }
            _ => {}
        }
    }

    fn error_status(&self, err: &anyhow::Error) -> String {
        format!("{}: {}", self.t(Text::ErrorPrefix), err)
    }

    fn alignment(&self) -> Alignment {
        if self.ctx.language.is_rtl() {
            Alignment::Right
        } else {
            Alignment::Left
        }
    }

    fn base_style(&self) -> Style {
        if self.dark_mode {
            Style::default().fg(Color::White).bg(Color::Black)
        } else {
            Style::default().fg(Color::Black).bg(Color::White)
        }
    }
}

/// Move the selection one row, wrapping at both ends
fn step_selection(state: &mut TableState, len: usize, forward: bool) {
    if len == 0 {
        state.select(None);
        return;
    }
    let i = match state.selected() {
        Some(i) if forward => {
            if i >= len - 1 {
                0
            } else {
                i + 1
            }
        }
        Some(i) => {
            if i == 0 {
                len - 1
            } else {
                i - 1
            }
        }
        None => 0,
    };
    state.select(Some(i));
}

fn clamp_selection(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        _ => {}
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

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // Redraw at the count-up frame rate while figures are moving
        let timeout = if app.is_animating() {
            CountUp::new(1.0).frame_interval()
        } else {
            Duration::from_millis(250)
        };

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    f.render_widget(Block::default().style(app.base_style()), f.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Page
            Constraint::Length(1), // Status line
            Constraint::Length(3), // Bottom navigation
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.page {
        Page::Home => render_home(f, chunks[1], app),
        Page::Map => render_map(f, chunks[1], app),
        Page::Logbook => render_logbook(f, chunks[1], app),
        Page::Wallet => render_wallet(f, chunks[1], app),
        Page::Settings => render_settings(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
    render_bottom_nav(f, chunks[3], app);

    if let Mode::Form(modal) = &app.mode {
        render_form(f, modal, app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("🏍  {}", app.t(Text::AppName)),
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(app.t(Text::Location), Style::default().fg(Color::Gray)),
    ]))
    .alignment(app.alignment())
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(GOLD)),
    );

    f.render_widget(header, area);
}

fn render_bottom_nav(f: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = Page::ALL
        .iter()
        .enumerate()
        .map(|(i, page)| Line::from(format!("{} {}", i + 1, app.t(page.title()))))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.page.index())
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD))
        .divider(" │ ");

    f.render_widget(tabs, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let text = match (&app.status, &app.mode) {
        (Some(status), Mode::Normal) => status.as_str(),
        (_, Mode::Search) => app.t(Text::HintSearch),
        (_, Mode::Form(_)) => app.t(Text::HintForm),
        (None, Mode::Normal) => app.t(match app.page {
            Page::Home => Text::HintHome,
            Page::Map => Text::HintMap,
            Page::Logbook => Text::HintLogbook,
            Page::Wallet => Text::HintWallet,
            Page::Settings => Text::HintSettings,
        }),
    };

    let status = Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray)))
        .alignment(app.alignment());
    f.render_widget(status, area);
}

/// Bordered figure card used on Home and Wallet
fn stat_card<'a>(title: &'a str, value: String, color: Color) -> Paragraph<'a> {
    Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(format!(" {} ", title)),
    )
}

fn render_home(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(chunks[0]);

    let elapsed = app.elapsed();
    let summary = app.ctx.logbook.summary();
    let profit = app.ctx.wallet.today_summary().today_profit;

    let count = CountUp::new(summary.today_count as f64).value_at(elapsed);
    let earnings = CountUp::new(summary.today_earnings).value_at(elapsed);
    let profit = CountUp::slow(profit).value_at(elapsed);

    f.render_widget(
        stat_card(app.t(Text::TodayDeliveries), format!("{}", count as u64), GOLD),
        cards[0],
    );
    f.render_widget(
        stat_card(app.t(Text::TodayEarnings), format_amount(earnings), Color::Green),
        cards[1],
    );
    f.render_widget(
        stat_card(
            app.t(Text::TodayProfit),
            format_amount(profit),
            if profit < 0.0 { Color::Red } else { Color::Cyan },
        ),
        cards[2],
    );

    let language = app.ctx.language.language();
    let mut lines = vec![
        Line::from(Span::styled(
            app.t(Text::ReadyForAction),
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if summary.today_deliveries.is_empty() {
        lines.push(Line::from(Span::styled(
            app.t(Text::NoDeliveries),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }
    for record in summary.today_deliveries.iter().rev().take(8) {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<10}", i18n::platform_name(record.platform, language)),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(format!("{:<20} {:<18} ", truncate(&record.customer, 20), truncate(&record.area, 18))),
            Span::styled(format_amount(record.fee), Style::default().fg(Color::Green)),
        ]));
    }

    let recent = Paragraph::new(lines)
        .alignment(app.alignment())
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", app.t(Text::TodayDeliveries))));
    f.render_widget(recent, chunks[1]);
}

fn render_map(f: &mut Frame, area: Rect, app: &App) {
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("🗺  {}", app.t(Text::MapTitle)),
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            app.t(Text::ComingSoon),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            app.t(Text::MapDescription),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let map = Paragraph::new(content)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(map, area);
}

fn render_logbook(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search
            Constraint::Length(1), // Platform chips
            Constraint::Min(0),    // Table
        ])
        .split(area);

    // Search box
    let searching = app.mode == Mode::Search;
    let search_text = if app.filter.search.is_empty() && !searching {
        Span::styled(app.t(Text::SearchDeliveries), Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(format!("{}{}", app.filter.search, if searching { "▏" } else { "" }))
    };
    let search = Paragraph::new(Line::from(vec![Span::raw("🔍 "), search_text]))
        .alignment(app.alignment())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if searching {
                    Style::default().fg(GOLD)
                } else {
                    Style::default()
                }),
        );
    f.render_widget(search, chunks[0]);

    // Platform chips with per-platform counts
    let language = app.ctx.language.language();
    let mut chip_filters = vec![PlatformFilter::All];
    chip_filters.extend(
        zimam_delivery::logbook::Platform::ALL
            .iter()
            .map(|p| PlatformFilter::Only(*p)),
    );
    let mut chips = vec![];
    for (i, chip) in chip_filters.iter().enumerate() {
        if i > 0 {
            chips.push(Span::raw("  "));
        }
        let label = match chip {
            PlatformFilter::All => app.t(Text::FilterAll),
            PlatformFilter::Only(p) => i18n::platform_name(*p, language),
        };
        let style = if *chip == app.filter.platform {
            Style::default().fg(Color::Black).bg(GOLD).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        chips.push(Span::styled(
            format!(" {} ({}) ", label, app.ctx.logbook.count_for(*chip)),
            style,
        ));
    }
    f.render_widget(Paragraph::new(Line::from(chips)).alignment(app.alignment()), chunks[1]);

    // Table
    let (rows, count, earnings) = {
        let visible = app.visible_deliveries();
        let clock = app.ctx.logbook.clock();
        let rows: Vec<Row> = visible
            .iter()
            .map(|record| {
                Row::new(vec![
                    Cell::from(clock.local_date(record.timestamp).format("%Y-%m-%d").to_string()),
                    Cell::from(truncate(&record.customer, 24)),
                    Cell::from(i18n::platform_name(record.platform, language)),
                    Cell::from(truncate(&record.area, 20)),
                    Cell::from(format_amount(record.fee)).style(Style::default().fg(Color::Green)),
                    Cell::from(truncate(record.notes.as_deref().unwrap_or(""), 30)),
                ])
            })
            .collect();
        let earnings = total_fee(visible.iter().copied());
        (rows, visible.len(), earnings)
    };

    let header = Row::new(vec![
        app.t(Text::DateLabel),
        app.t(Text::CustomerName),
        app.t(Text::PlatformLabel),
        app.t(Text::AreaLabel),
        app.t(Text::FeeLabel),
        app.t(Text::NotesLabel),
    ])
    .style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let title = if count == 0 {
        format!(" {} • {} ", app.t(Text::LogbookTitle), app.t(Text::NoDeliveries))
    } else {
        format!(
            " {} • {} {} • {}: {} ",
            app.t(Text::LogbookTitle),
            count,
            app.t(Text::RecordedMissions),
            app.t(Text::TotalEarnings),
            format_amount(earnings),
        )
    };

    let widths = [
        Constraint::Length(11),
        Constraint::Length(24),
        Constraint::Length(10),
        Constraint::Length(20),
        Constraint::Length(14),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");

    f.render_stateful_widget(table, chunks[2], &mut app.logbook_state);
}

fn render_wallet(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Cards
            Constraint::Length(1), // Profit margin
            Constraint::Min(0),    // Today's transactions
        ])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(chunks[0]);

    let elapsed = app.elapsed();
    let summary = app.ctx.wallet.today_summary();

    let income = CountUp::slow(summary.today_income).value_at(elapsed);
    let expense = CountUp::slow(summary.today_expense).value_at(elapsed);
    let profit = CountUp::slow(summary.today_profit).value_at(elapsed);

    f.render_widget(stat_card(app.t(Text::Income), format_amount(income), Color::Green), cards[0]);
    f.render_widget(stat_card(app.t(Text::Expenses), format_amount(expense), Color::Red), cards[1]);
    f.render_widget(
        stat_card(
            app.t(Text::Profit),
            format_amount(profit),
            if summary.today_profit < 0.0 { Color::Red } else { GOLD },
        ),
        cards[2],
    );

    let margin = match summary.profit_margin() {
        Some(m) => format!("{}: {:.1}%", app.t(Text::ProfitMargin), m),
        None => format!("{}: -", app.t(Text::ProfitMargin)),
    };
    f.render_widget(
        Paragraph::new(Span::styled(margin, Style::default().fg(Color::Gray))).alignment(app.alignment()),
        chunks[1],
    );

    let language = app.ctx.language.language();
    let rows: Vec<Row> = summary
        .today_transactions
        .iter()
        .map(|tx| {
            let color = if tx.is_income() { Color::Green } else { Color::Red };
            let sign = if tx.is_income() { "+" } else { "-" };
            Row::new(vec![
                Cell::from(i18n::transaction_type_name(tx.kind, language)),
                Cell::from(i18n::category_name(tx.category, language)),
                Cell::from(truncate(&tx.description, 32)),
                Cell::from(format!("{}{}", sign, format_amount(tx.amount))).style(Style::default().fg(color)),
            ])
        })
        .collect();

    let header = Row::new(vec![
        "",
        app.t(Text::CategoryLabel),
        app.t(Text::DescriptionLabel),
        app.t(Text::AmountLabel),
    ])
    .style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let title = if rows.is_empty() {
        format!(" {} • {} ", app.t(Text::WalletTitle), app.t(Text::NoTransactions))
    } else {
        format!(" {} • {} {} ", app.t(Text::WalletTitle), rows.len(), app.t(Text::Transactions))
    };

    let widths = [
        Constraint::Length(12),
        Constraint::Length(14),
        Constraint::Min(20),
        Constraint::Length(16),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");

    f.render_stateful_widget(table, chunks[2], &mut app.wallet_state);
}

fn render_settings(f: &mut Frame, area: Rect, app: &App) {
    let on_off = |flag: bool| if flag { app.t(Text::On) } else { app.t(Text::Off) };
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let hint = Style::default().fg(Color::DarkGray);
    let section = Style::default()
        .fg(GOLD)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let content = vec![
        Line::from(Span::styled(app.t(Text::AppSettings), section)),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("[l] {}: ", app.t(Text::LanguageLabel)), label),
            Span::raw(app.ctx.language.language().native_name()),
            Span::styled(format!("  {}", app.t(Text::LanguageSubtitle)), hint),
        ]),
        Line::from(vec![
            Span::styled(format!("[m] {}: ", app.t(Text::DarkMode)), label),
            Span::raw(on_off(app.dark_mode)),
            Span::styled(format!("  {}", app.t(Text::DarkModeSubtitle)), hint),
        ]),
        Line::from(vec![
            Span::styled(format!("[n] {}: ", app.t(Text::Notifications)), label),
            Span::raw(on_off(app.notifications)),
            Span::styled(format!("  {}", app.t(Text::NotificationsSubtitle)), hint),
        ]),
        Line::from(""),
        Line::from(Span::styled(app.t(Text::DataManagement), section)),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("[x] {}", app.t(Text::ExportData)), label),
            Span::styled(format!("  {} ({})", app.t(Text::ExportDataSubtitle), app.export_dir.display()), hint),
        ]),
        Line::from(vec![
            Span::styled(format!("[C] {}", app.t(Text::ClearData)), Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled(format!("  {}", app.t(Text::ClearDataSubtitle)), hint),
        ]),
        Line::from(""),
        Line::from(Span::styled(app.t(Text::DataProtection), section)),
        Line::from(""),
        Line::from(Span::raw(app.t(Text::StoredLocally))),
        Line::from(vec![
            Span::styled(format!("{}: ", app.t(Text::SavedDeliveries)), label),
            Span::raw(app.ctx.logbook.len().to_string()),
        ]),
        Line::from(vec![
            Span::styled(format!("{}: ", app.t(Text::TotalTransactions)), label),
            Span::raw(app.ctx.wallet.len().to_string()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} v{}", app.t(Text::Tagline), zimam_delivery::VERSION),
            hint.add_modifier(Modifier::ITALIC),
        )),
    ];

    let settings = Paragraph::new(content).alignment(app.alignment()).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} • {} ", app.t(Text::SettingsTitle), app.t(Text::SettingsSubtitle))),
    );
    f.render_widget(settings, area);
}

fn render_form(f: &mut Frame, modal: &Modal, app: &App) {
    let area = centered_rect(60, 60, f.size());
    let language = app.ctx.language.language();

    let fields: Vec<(&str, String)> = match modal {
        Modal::Delivery { form, .. } => vec![
            (app.t(Text::CustomerName), form.customer.clone()),
            (app.t(Text::PlatformLabel), format!("◀ {} ▶", i18n::platform_name(form.platform, language))),
            (app.t(Text::FeeLabel), form.fee.clone()),
            (app.t(Text::AreaLabel), form.area.clone()),
            (app.t(Text::NotesLabel), form.notes.clone()),
        ],
        Modal::Transaction { form, .. } => vec![
            (app.t(Text::AmountLabel), form.amount.clone()),
            (app.t(Text::CategoryLabel), format!("◀ {} ▶", i18n::category_name(form.category, language))),
            (app.t(Text::DescriptionLabel), form.description.clone()),
        ],
    };

    let mut content = vec![Line::from("")];
    for (i, (label, value)) in fields.into_iter().enumerate() {
        let focused = i == modal.field();
        let marker = if focused { "▶ " } else { "  " };
        let value_style = if focused {
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        content.push(Line::from(vec![
            Span::styled(format!("{}{}: ", marker, label), Style::default().fg(Color::Cyan)),
            Span::styled(value, value_style),
        ]));
        content.push(Line::from(""));
    }

    if let Some(err) = &app.form_error {
        content.push(Line::from(Span::styled(
            format!("  ⚠ {}", err),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        content.push(Line::from(""));
    }

    content.push(Line::from(Span::styled(
        format!("  Enter: {} • Esc: {}", app.t(Text::Save), app.t(Text::Cancel)),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    let form = Paragraph::new(content).alignment(app.alignment()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(GOLD))
            .title(format!(" {} ", app.t(modal.title())))
            .style(app.base_style()),
    );

    f.render_widget(Clear, area);
    f.render_widget(form, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
