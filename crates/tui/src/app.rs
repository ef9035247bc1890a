use std::{io, str::FromStr, thread, time::Duration};

use anyhow::{Context, Result};
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
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use rentcar_core::{
    AppConfig, Car, EntityId, JsonStore, Rental, RentalStatus, RentalSystem, Session,
};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_FIELD_LEN: usize = 64;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    selection_fg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Cars,
    MyRentals,
    AllRentals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Login,
    Register,
    AvailableCars,
    RentCar,
    MyRentals,
    CancelRental,
    Logout,
    AddCar,
    AllRentals,
    Quit,
}

impl MenuAction {
    fn label(self) -> &'static str {
        match self {
            Self::Login => "Log in",
            Self::Register => "Register",
            Self::AvailableCars => "Available cars",
            Self::RentCar => "Rent a car",
            Self::MyRentals => "My rentals",
            Self::CancelRental => "Cancel a rental",
            Self::Logout => "Log out",
            Self::AddCar => "Add a car",
            Self::AllRentals => "All rentals",
            Self::Quit => "Quit",
        }
    }
}

/// Menu entries offered for the current session, in display order.
fn menu_actions(session: &Session) -> Vec<MenuAction> {
    let mut actions = vec![
        MenuAction::Login,
        MenuAction::Register,
        MenuAction::AvailableCars,
    ];
    if session.is_authenticated() {
        actions.extend([
            MenuAction::RentCar,
            MenuAction::MyRentals,
            MenuAction::CancelRental,
            MenuAction::Logout,
        ]);
    }
    if session.is_admin() {
        actions.extend([MenuAction::AddCar, MenuAction::AllRentals]);
    }
    actions.push(MenuAction::Quit);
    actions
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormKind {
    Login,
    Register,
    RentCar,
    CancelRental,
    AddCar,
}

impl FormKind {
    fn title(self) -> &'static str {
        match self {
            Self::Login => "Log in",
            Self::Register => "Register",
            Self::RentCar => "Rent a car",
            Self::CancelRental => "Cancel a rental",
            Self::AddCar => "Add a car",
        }
    }

    fn fields(self) -> Vec<FormField> {
        match self {
            Self::Login | Self::Register => vec![
                FormField::new("Username", false),
                FormField::new("Password", true),
            ],
            Self::RentCar => vec![
                FormField::new("Car ID", false),
                FormField::new("Start date (YYYY-MM-DD)", false),
                FormField::new("End date (YYYY-MM-DD)", false),
            ],
            Self::CancelRental => vec![FormField::new("Rental ID", false)],
            Self::AddCar => vec![
                FormField::new("Brand", false),
                FormField::new("Model", false),
                FormField::new("Year", false),
                FormField::new("Daily price", false),
            ],
        }
    }
}

#[derive(Debug, Clone)]
struct FormField {
    label: &'static str,
    input: String,
    cursor: usize,
    secret: bool,
}

impl FormField {
    fn new(label: &'static str, secret: bool) -> Self {
        Self {
            label,
            input: String::new(),
            cursor: 0,
            secret,
        }
    }

    fn set(&mut self, value: String) {
        self.cursor = value.chars().count();
        self.input = value;
    }

    fn char_len(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.input
            .char_indices()
            .nth(cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.input.len())
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.char_len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    fn insert(&mut self, ch: char) {
        if self.char_len() >= MAX_FIELD_LEN || ch.is_control() {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.input.insert(at, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.input.remove(at);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.input.remove(at);
        }
    }

    fn display(&self) -> String {
        if self.secret {
            "•".repeat(self.char_len())
        } else {
            self.input.clone()
        }
    }
}

#[derive(Debug, Clone)]
struct FormModal {
    kind: FormKind,
    fields: Vec<FormField>,
    focus: usize,
}

impl FormModal {
    fn new(kind: FormKind) -> Self {
        Self {
            kind,
            fields: kind.fields(),
            focus: 0,
        }
    }

    /// Pre-fill the first field and move focus past it.
    fn with_first(mut self, value: String) -> Self {
        if let Some(field) = self.fields.first_mut() {
            field.set(value);
        }
        if self.fields.len() > 1 {
            self.focus = 1;
        }
        self
    }

    fn focused_mut(&mut self) -> &mut FormField {
        &mut self.fields[self.focus]
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    fn prev_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    fn on_last_field(&self) -> bool {
        self.focus + 1 == self.fields.len()
    }

    fn value(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|field| field.input.trim())
            .unwrap_or_default()
    }

    /// Raw value for fields whose whitespace is significant.
    fn raw(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|field| field.input.as_str())
            .unwrap_or_default()
    }
}

/// What to do with an open form after a submit attempt.
enum Submit {
    Close(String),
    KeepOpen(String),
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal front end for the rental desk.
pub struct RentalApp {
    system: RentalSystem<JsonStore>,
    config: AppConfig,
    state: UiState,
    screen: Screen,
    form: Option<FormModal>,
    theme: Theme,
}

impl RentalApp {
    pub fn new(system: RentalSystem<JsonStore>, config: AppConfig) -> Self {
        Self {
            system,
            config,
            state: UiState::default(),
            screen: Screen::Menu,
            form: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.state.set_status(format!(
            "Loaded {} cars • data in {}",
            self.system.cars().len(),
            self.config.data_dir.display()
        ));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let result = async {
            loop {
                terminal.draw(|frame| self.draw(frame))?;
                if self.state.should_quit {
                    break;
                }
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }
            Ok::<(), anyhow::Error>(())
        }
        .await;

        restore_terminal(&mut terminal)?;
        info!("Session closed");
        result
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                if let Err(err) = self.handle_key(key) {
                    error!(?err, "Input handling failed");
                    self.state.set_status(format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return Ok(());
        }
        if self.form.is_some() {
            return self.handle_form_key(key);
        }
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Cars => self.handle_cars_key(key),
            Screen::MyRentals => self.handle_my_rentals_key(key),
            Screen::AllRentals => {
                let total = self.system.all_rentals().map(<[Rental]>::len).unwrap_or(0);
                self.handle_list_navigation(key, total);
                Ok(())
            }
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Result<()> {
        let actions = menu_actions(self.system.session());
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.state.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.move_menu_cursor(1, actions.len());
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.move_menu_cursor(-1, actions.len());
            }
            KeyCode::Enter => {
                if let Some(action) = actions.get(self.state.menu_cursor).copied() {
                    self.activate(action);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn activate(&mut self, action: MenuAction) {
        debug!(?action, "Menu action");
        match action {
            MenuAction::Login => self.open_form(FormModal::new(FormKind::Login)),
            MenuAction::Register => self.open_form(FormModal::new(FormKind::Register)),
            MenuAction::AvailableCars => {
                self.enter_list(Screen::Cars);
                if self.system.available_cars().is_empty() {
                    self.state.set_status("No cars available".to_string());
                } else if self.system.session().is_authenticated() {
                    self.state
                        .set_status("Enter: rent the selected car • Esc: back".to_string());
                } else {
                    self.state.set_status("Log in to rent a car".to_string());
                }
            }
            MenuAction::RentCar => {
                if self.system.available_cars().is_empty() {
                    self.state
                        .set_status("No cars available for rent".to_string());
                } else {
                    self.enter_list(Screen::Cars);
                    self.state
                        .set_status("Select a car and press Enter".to_string());
                }
            }
            MenuAction::MyRentals => {
                self.enter_list(Screen::MyRentals);
                if self.system.user_rentals().is_empty() {
                    self.state.set_status("You have no rentals".to_string());
                } else {
                    self.state
                        .set_status("c: cancel the selected rental • Esc: back".to_string());
                }
            }
            MenuAction::CancelRental => self.open_form(FormModal::new(FormKind::CancelRental)),
            MenuAction::Logout => {
                self.system.logout();
                self.state.menu_cursor = 0;
                self.state.set_status("You have logged out".to_string());
            }
            MenuAction::AddCar => self.open_form(FormModal::new(FormKind::AddCar)),
            MenuAction::AllRentals => match self.system.all_rentals() {
                Ok(rentals) => {
                    let status = format!("{} rentals on record", rentals.len());
                    self.enter_list(Screen::AllRentals);
                    self.state.set_status(status);
                }
                Err(err) => self.state.set_status(err.to_string()),
            },
            MenuAction::Quit => self.state.should_quit = true,
        }
    }

    fn open_form(&mut self, form: FormModal) {
        self.form = Some(form);
    }

    fn enter_list(&mut self, screen: Screen) {
        self.screen = screen;
        self.state.list_cursor = 0;
    }

    fn back_to_menu(&mut self) {
        self.screen = Screen::Menu;
        self.state.set_status("Ready".to_string());
    }

    /// Shared navigation for list screens. Returns `true` if the key was used.
    fn handle_list_navigation(&mut self, key: KeyEvent, total: usize) -> bool {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => self.back_to_menu(),
            KeyCode::Char('j') | KeyCode::Down => self.state.move_list_cursor(1, total),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_list_cursor(-1, total),
            KeyCode::Home | KeyCode::Char('g') => self.state.list_cursor = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.state.list_cursor = total.saturating_sub(1);
            }
            _ => return false,
        }
        true
    }

    fn handle_cars_key(&mut self, key: KeyEvent) -> Result<()> {
        let selected = self
            .system
            .available_cars()
            .get(self.state.list_cursor)
            .map(|car| car.id);
        let total = self.system.available_cars().len();
        if self.handle_list_navigation(key, total) {
            return Ok(());
        }
        if matches!(key.code, KeyCode::Enter | KeyCode::Char('r')) {
            match selected {
                Some(_) if !self.system.session().is_authenticated() => {
                    self.state.set_status("Log in to rent a car".to_string());
                }
                Some(car_id) => {
                    self.open_form(FormModal::new(FormKind::RentCar).with_first(car_id.to_string()));
                }
                None => self.state.set_status("No cars available".to_string()),
            }
        }
        Ok(())
    }

    fn handle_my_rentals_key(&mut self, key: KeyEvent) -> Result<()> {
        let selected = self
            .system
            .user_rentals()
            .get(self.state.list_cursor)
            .map(|rental| rental.id);
        let total = self.system.user_rentals().len();
        if self.handle_list_navigation(key, total) {
            return Ok(());
        }
        if let (KeyCode::Char('c'), Some(rental_id)) = (key.code, selected) {
            let status = self.cancel_rental(rental_id);
            self.state.set_status(status);
        }
        Ok(())
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(form) = self.form.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.form = None;
                self.state.set_status("Cancelled".to_string());
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Enter if !form.on_last_field() => form.next_field(),
            KeyCode::Enter => {
                if let Some(form) = self.form.take() {
                    match self.submit_form(&form) {
                        Submit::Close(status) => self.state.set_status(status),
                        Submit::KeepOpen(status) => {
                            self.state.set_status(status);
                            self.form = Some(form);
                        }
                    }
                }
            }
            KeyCode::Left => form.focused_mut().move_cursor(-1),
            KeyCode::Right => form.focused_mut().move_cursor(1),
            KeyCode::Home => form.focused_mut().move_home(),
            KeyCode::End => form.focused_mut().move_end(),
            KeyCode::Backspace => form.focused_mut().backspace(),
            KeyCode::Delete => form.focused_mut().delete(),
            KeyCode::Char(ch) => form.focused_mut().insert(ch),
            _ => {}
        }
        Ok(())
    }

    fn submit_form(&mut self, form: &FormModal) -> Submit {
        match form.kind {
            FormKind::Login => {
                match self.system.login(form.value(0), form.raw(1)) {
                    Ok(user) => {
                        let status = format!("Welcome, {}!", user.username);
                        self.state.menu_cursor = 0;
                        Submit::Close(status)
                    }
                    Err(err) => Submit::Close(err.to_string()),
                }
            }
            FormKind::Register => {
                let username = form.value(0);
                if username.is_empty() {
                    return Submit::KeepOpen("Username must not be empty".to_string());
                }
                match self.system.register_user(username, form.raw(1)) {
                    Ok(()) => Submit::Close("Registration complete. You can now log in.".to_string()),
                    Err(err) => Submit::Close(err.to_string()),
                }
            }
            FormKind::RentCar => {
                let Some(car_id) = parse_id(form.value(0)) else {
                    return Submit::KeepOpen("Car ID must be a number".to_string());
                };
                match self.system.rent_car(car_id, form.value(1), form.value(2)) {
                    Ok(total) => {
                        self.state.list_cursor = 0;
                        Submit::Close(format!(
                            "Rental confirmed. Total: {}",
                            format_money(total, &self.config.currency)
                        ))
                    }
                    Err(err) => Submit::Close(format!("Booking failed: {err}")),
                }
            }
            FormKind::CancelRental => match parse_id(form.value(0)) {
                Some(rental_id) => Submit::Close(self.cancel_rental(rental_id)),
                None => Submit::KeepOpen("Rental ID must be a number".to_string()),
            },
            FormKind::AddCar => {
                let Ok(year) = form.value(2).parse::<i32>() else {
                    return Submit::KeepOpen("Year must be a whole number".to_string());
                };
                let daily_price = match Decimal::from_str(form.value(3)) {
                    Ok(price) if price.is_sign_negative() => {
                        return Submit::KeepOpen("Daily price must not be negative".to_string())
                    }
                    Ok(price) => price,
                    Err(_) => return Submit::KeepOpen("Daily price must be a number".to_string()),
                };
                match self
                    .system
                    .add_car(form.value(0), form.value(1), year, daily_price)
                {
                    Ok(car) => Submit::Close(format!("Added car #{}: {car}", car.id)),
                    Err(err) => Submit::Close(err.to_string()),
                }
            }
        }
    }

    fn cancel_rental(&mut self, rental_id: EntityId) -> String {
        match self.system.cancel_rental(rental_id) {
            Ok(()) => format!("Rental #{rental_id} cancelled"),
            Err(err) => err.to_string(),
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        match self.screen {
            Screen::Menu => self.render_menu(frame, chunks[1]),
            Screen::Cars => self.render_cars(frame, chunks[1]),
            Screen::MyRentals => {
                let rentals = self.system.user_rentals();
                self.render_rentals(frame, chunks[1], "My rentals", &rentals, false);
            }
            Screen::AllRentals => {
                let rentals: Vec<&Rental> = self
                    .system
                    .all_rentals()
                    .map(|rentals| rentals.iter().collect())
                    .unwrap_or_default();
                self.render_rentals(frame, chunks[1], "All rentals", &rentals, true);
            }
        }
        self.render_status(frame, chunks[2]);
        if let Some(form) = &self.form {
            self.render_form(frame, form);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let title = Span::styled(
            "Car Rental",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        );
        let date = Span::styled(
            format!("  •  {}", self.system.today()),
            Style::default().fg(self.theme.muted),
        );
        let paragraph = Paragraph::new(Line::from(vec![title, date]))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_menu(&mut self, frame: &mut Frame, area: Rect) {
        let actions = menu_actions(self.system.session());
        self.state.move_menu_cursor(0, actions.len());

        let menu_height = (actions.len() as u16).saturating_add(2).min(area.height);
        let menu_width = 32.min(area.width.max(1));
        let menu_area = centered_rect(menu_width, menu_height, area);

        let menu_lines: Vec<Line> = actions
            .iter()
            .enumerate()
            .map(|(idx, action)| {
                let style = match action {
                    MenuAction::AddCar | MenuAction::AllRentals => {
                        Style::default().fg(self.theme.warning)
                    }
                    _ => Style::default().fg(self.theme.primary_fg),
                };
                if idx == self.state.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {}", action.label()),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(format!("  {}", action.label()), style))
                }
            })
            .collect();

        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"));
        frame.render_widget(menu, menu_area);
    }

    fn render_cars(&self, frame: &mut Frame, area: Rect) {
        let cars = self.system.available_cars();
        let items: Vec<ListItem> = cars
            .iter()
            .map(|car| ListItem::new(car_line(car, &self.config.currency)))
            .collect();
        self.render_list(frame, area, "Available cars", items, "No cars available.");
    }

    fn render_rentals(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        rentals: &[&Rental],
        show_owner: bool,
    ) {
        let items: Vec<ListItem> = rentals
            .iter()
            .map(|rental| {
                let car = self
                    .system
                    .car(rental.car_id)
                    .map(|car| format!("{} {}", car.brand, car.model))
                    .unwrap_or_else(|| format!("car #{}", rental.car_id));
                let status_style = match rental.status {
                    RentalStatus::Active => Style::default().fg(self.theme.success),
                    RentalStatus::Cancelled => Style::default().fg(self.theme.danger),
                };
                let mut spans = vec![Span::raw(format!(
                    "#{:<4} {:<20} {} → {}  {:>14}  ",
                    rental.id,
                    car,
                    rental.start_date,
                    rental.end_date,
                    format_money(rental.total_price, &self.config.currency),
                ))];
                spans.push(Span::styled(rental.status.to_string(), status_style));
                if show_owner {
                    spans.push(Span::styled(
                        format!("  {}", rental.username),
                        Style::default().fg(self.theme.muted),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        self.render_list(frame, area, title, items, "No rentals.");
    }

    fn render_list(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        items: Vec<ListItem>,
        empty: &str,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title.to_string());
        if items.is_empty() {
            let paragraph = Paragraph::new(Line::from(Span::styled(
                empty.to_string(),
                Style::default().fg(self.theme.muted),
            )))
            .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let mut list_state = ListState::default();
        list_state.select(Some(self.state.list_cursor.min(items.len() - 1)));
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .fg(self.theme.selection_fg)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_form(&self, frame: &mut Frame, form: &FormModal) {
        let area = frame.size();
        let width = 60.min(area.width);
        let height = (form.fields.len() as u16 + 4).min(area.height);
        let popup = centered_rect(width, height, area);
        frame.render_widget(Clear, popup);

        let label_width = form
            .fields
            .iter()
            .map(|field| field.label.chars().count())
            .max()
            .unwrap_or(0);
        let mut lines: Vec<Line> = form
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let label_style = if idx == form.focus {
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.muted)
                };
                Line::from(vec![
                    Span::styled(format!("{:<label_width$}: ", field.label), label_style),
                    Span::styled(field.display(), Style::default().fg(self.theme.primary_fg)),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter: next/submit • Tab: switch field • Esc: cancel",
            Style::default().fg(self.theme.muted),
        )));

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(form.kind.title()),
        );
        frame.render_widget(paragraph, popup);

        if let Some(field) = form.fields.get(form.focus) {
            let x = popup.x + 1 + (label_width + 2 + field.cursor) as u16;
            let y = popup.y + 1 + form.focus as u16;
            if x < popup.x + popup.width.saturating_sub(1) {
                frame.set_cursor(x, y);
            }
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let secondary = match self.system.current_user() {
            Some(user) => format!("Logged in as {} ({})", user.username, user.role),
            None => "Not logged in".to_string(),
        };
        let paragraph = Paragraph::new(vec![
            Line::from(self.state.status.clone()),
            Line::from(Span::styled(
                secondary,
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    status: String,
    should_quit: bool,
    menu_cursor: usize,
    list_cursor: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            should_quit: false,
            menu_cursor: 0,
            list_cursor: 0,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn move_menu_cursor(&mut self, delta: isize, options: usize) {
        self.menu_cursor = step_cursor(self.menu_cursor, delta, options);
    }

    fn move_list_cursor(&mut self, delta: isize, total: usize) {
        self.list_cursor = step_cursor(self.list_cursor, delta, total);
    }
}

fn step_cursor(current: usize, delta: isize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let idx = current as isize + delta;
    idx.clamp(0, total as isize - 1) as usize
}

fn parse_id(text: &str) -> Option<EntityId> {
    text.parse().ok()
}

fn car_line(car: &Car, currency: &str) -> String {
    format!(
        "{:>3}. {} {} ({})  {}/day",
        car.id,
        car.brand,
        car.model,
        car.year,
        format_money(car.daily_price, currency)
    )
}

fn format_money(amount: Decimal, currency: &str) -> String {
    format!("{amount:.2} {currency}")
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentcar_core::{Role, User};

    #[test]
    fn menu_grows_with_role() {
        let mut session = Session::default();
        assert_eq!(menu_actions(&session).len(), 4);

        session = Session::Authenticated(User::new("user1", "pass1", Role::Customer));
        let actions = menu_actions(&session);
        assert!(actions.contains(&MenuAction::RentCar));
        assert!(!actions.contains(&MenuAction::AddCar));

        session = Session::Authenticated(User::new("admin", "admin123", Role::Admin));
        let actions = menu_actions(&session);
        assert!(actions.contains(&MenuAction::AllRentals));
        assert_eq!(actions.last(), Some(&MenuAction::Quit));
    }

    #[test]
    fn form_field_edits_unicode_at_cursor() {
        let mut field = FormField::new("Username", false);
        for ch in "иван".chars() {
            field.insert(ch);
        }
        field.move_cursor(-2);
        field.backspace();
        field.insert('X');
        assert_eq!(field.input, "иXан");
        field.move_end();
        field.delete();
        assert_eq!(field.cursor, 4);
    }

    #[test]
    fn secret_field_is_masked() {
        let mut field = FormField::new("Password", true);
        field.set("pass1".to_string());
        assert_eq!(field.display(), "•••••");
    }

    #[test]
    fn prefilled_form_focuses_second_field() {
        let form = FormModal::new(FormKind::RentCar).with_first("3".to_string());
        assert_eq!(form.focus, 1);
        assert_eq!(form.value(0), "3");
    }

    #[test]
    fn cursor_stays_in_bounds() {
        assert_eq!(step_cursor(0, -1, 3), 0);
        assert_eq!(step_cursor(2, 1, 3), 2);
        assert_eq!(step_cursor(5, 0, 0), 0);
    }

    #[test]
    fn money_has_two_decimals() {
        assert_eq!(format_money(Decimal::from(15000), "RUB"), "15000.00 RUB");
        assert_eq!(format_money(Decimal::new(25005, 1), "EUR"), "2500.50 EUR");
    }
}
