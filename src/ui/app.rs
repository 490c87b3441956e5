use chrono::{Duration, Local, NaiveDate};
use eframe::egui;
use egui::{Color32, RichText};
use std::sync::mpsc::{channel, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::api::{
    end_from_slots, slots_between, timestamp_at, wire_id, ApiError, AttendanceClient, ClientDto,
    TaskDto, TaskRequest,
};
use crate::config::Config;
use crate::layout::{format_time, parse_time, try_parse_time, LayoutMode};
use crate::roster::{Roster, Task};
use crate::selection::{Selection, SelectionHub};
use crate::session::{Session, SessionStore};
use super::views;

pub struct DashboardApp {
    config: Config,
    state: AppState,

    session: Option<Session>,
    session_store: Option<SessionStore>,

    // Data
    roster: Roster,
    selection: SelectionHub,
    page: Page,
    clients: Vec<ClientDto>,
    clients_loaded: bool,

    // Login form
    login_origin: String,
    login_email: String,
    login_key: String,
    login_remember: bool,

    // Dialog for add/edit
    dialog: Option<TaskForm>,

    // Delete confirmation
    pending_delete: Option<Task>,

    // Client dialogs
    client_dialog: Option<ClientForm>,
    pending_client_delete: Option<ClientDto>,

    // Status
    status_message: Option<(String, bool)>, // (message, is_error)
    loading: bool,
    is_offline: bool,

    // Async communication
    runtime: Option<tokio::runtime::Runtime>,
    result_rx: Receiver<AsyncResult>,
    result_tx: Sender<AsyncResult>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AppState {
    Login,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Page {
    Schedule,
    Clients,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DialogMode {
    Add,
    Edit,
}

enum AsyncResult {
    LoggedIn(Session),
    RosterLoaded(Roster),
    TaskSaved { task: Option<Task>, is_edit: bool },
    TaskDeleted(String),
    ClientsLoaded(Vec<ClientDto>),
    ClientSaved(String),  // message
    SelectionChanged(Selection),
    Unauthorized,
    Error(String),
    Offline,
}

/// Editable copy of a task while the dialog is open
struct TaskForm {
    mode: DialogMode,
    task_id: String,
    title: String,
    description: String,
    date: String,
    start_time: String,
    slots: u32,
    department_id: Option<String>,
    assignee: Option<String>,

    // Validation errors (true = has error)
    error_title: bool,
    error_date: bool,
    error_time: bool,
}

impl TaskForm {
    fn for_new(date: NaiveDate, start_time: String, department_id: Option<String>, assignee: Option<String>) -> Self {
        Self {
            mode: DialogMode::Add,
            task_id: String::new(),
            title: String::new(),
            description: String::new(),
            date: date.format("%Y-%m-%d").to_string(),
            start_time,
            slots: 3,
            department_id,
            assignee,
            error_title: false,
            error_date: false,
            error_time: false,
        }
    }

    fn for_task(task: &Task, slot_minutes: u32, default_duration: u32) -> Self {
        let start = parse_time(&task.time);
        let end = task
            .end_time
            .as_deref()
            .and_then(try_parse_time)
            .filter(|end| *end > start)
            .unwrap_or(start.saturating_add(default_duration));

        Self {
            mode: DialogMode::Edit,
            task_id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            date: task.date.format("%Y-%m-%d").to_string(),
            start_time: task.time.clone(),
            slots: slots_between(start, end, slot_minutes),
            department_id: task.department_id.clone(),
            assignee: task.assigned_to_employee_id.clone(),
            error_title: false,
            error_date: false,
            error_time: false,
        }
    }

    /// Validate the form into a wire request; flags the offending fields on failure
    fn to_request(&mut self, slot_minutes: u32) -> Option<TaskRequest> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok();
        let start = try_parse_time(self.start_time.trim());

        self.error_title = self.title.trim().is_empty();
        self.error_date = date.is_none();
        self.error_time = start.is_none();

        let (date, start) = match (date, start) {
            (Some(date), Some(start)) if !self.error_title => (date, start),
            _ => return None,
        };
        let end = end_from_slots(start, self.slots, slot_minutes);

        Some(TaskRequest {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            start_time: timestamp_at(date, start),
            end_time: timestamp_at(date, end),
            department_id: self.department_id.as_deref().map(wire_id),
            assigned_to_employee_id: self.assignee.as_deref().map(wire_id),
        })
    }
}

/// Name and code of a client being added or edited
struct ClientForm {
    client_id: Option<String>,
    name: String,
    code: String,

    // Validation errors (true = has error)
    error_name: bool,
    error_code: bool,
}

impl ClientForm {
    fn for_new() -> Self {
        Self {
            client_id: None,
            name: String::new(),
            code: String::new(),
            error_name: false,
            error_code: false,
        }
    }

    fn for_client(client: &ClientDto) -> Self {
        Self {
            client_id: Some(client.id.clone()),
            name: client.name.clone(),
            code: client.client_code.clone(),
            error_name: false,
            error_code: false,
        }
    }

    /// Both fields are required; returns trimmed (name, code)
    fn validate(&mut self) -> Option<(String, String)> {
        let name = self.name.trim();
        let code = self.code.trim();
        self.error_name = name.is_empty();
        self.error_code = code.is_empty();
        if self.error_name || self.error_code {
            return None;
        }
        Some((name.to_string(), code.to_string()))
    }
}

/// Route an API failure to the right UI state
fn failure(e: ApiError, context: &str) -> AsyncResult {
    match &e {
        ApiError::Http { status, .. } if status.as_u16() == 401 => {
            warn!(error = %e, "{}", context);
            AsyncResult::Unauthorized
        }
        _ if e.is_offline() => {
            warn!(error = %e, "{} (offline)", context);
            AsyncResult::Offline
        }
        _ => {
            error!(error = %e, "{}", context);
            AsyncResult::Error(format!("{}: {}", context, e))
        }
    }
}

impl DashboardApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default config");
            Config::default()
        });
        super::setup_fonts(&cc.egui_ctx);
        super::setup_theme(&cc.egui_ctx);

        let session_store = match SessionStore::default_location() {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(error = %e, "Session persistence unavailable");
                None
            }
        };
        let session = session_store.as_ref().and_then(|store| match store.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session file");
                None
            }
        });

        let (result_tx, result_rx) = channel();
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => Some(runtime),
            Err(e) => {
                error!(error = %e, "Failed to create tokio runtime");
                None
            }
        };

        let today = Local::now().date_naive();
        let mut selection = SelectionHub::new(today);
        {
            let tx = result_tx.clone();
            let ctx = cc.egui_ctx.clone();
            selection.subscribe(move |current| {
                let _ = tx.send(AsyncResult::SelectionChanged(current.clone()));
                ctx.request_repaint();
            });
        }

        let state = if session.is_some() { AppState::Main } else { AppState::Login };
        let status_message = if runtime.is_none() {
            Some(("Background tasks are unavailable; restart the app".to_string(), true))
        } else {
            None
        };

        let mut app = Self {
            login_origin: config.backend_origin.clone(),
            login_email: config.email.clone(),
            login_key: String::new(),
            login_remember: true,
            config,
            state,
            session,
            session_store,
            roster: Roster::default(),
            selection,
            page: Page::Schedule,
            clients: Vec::new(),
            clients_loaded: false,
            dialog: None,
            pending_delete: None,
            client_dialog: None,
            pending_client_delete: None,
            status_message,
            loading: false,
            is_offline: false,
            runtime,
            result_rx,
            result_tx,
        };

        if app.state == AppState::Main {
            app.refresh_data();
        }

        app
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        match &self.runtime {
            Some(runtime) => {
                self.loading = true;
                runtime.spawn(task);
            }
            None => {
                self.status_message = Some(("Background tasks are unavailable; restart the app".to_string(), true));
            }
        }
    }

    fn check_async_results(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            match result {
                AsyncResult::LoggedIn(session) => {
                    self.loading = false;
                    self.is_offline = false;
                    self.status_message = None;
                    info!(?session, "Signed in");

                    if let Some(store) = &self.session_store {
                        if let Err(e) = store.save(&session) {
                            warn!(error = %e, "Failed to persist session");
                        }
                    }
                    self.config.email = session.email.clone();
                    if let Err(e) = self.config.save() {
                        warn!(error = %e, "Failed to save config");
                    }

                    self.login_key.clear();
                    self.session = Some(session);
                    self.state = AppState::Main;
                    self.refresh_data();
                }
                AsyncResult::RosterLoaded(roster) => {
                    self.loading = false;
                    self.is_offline = false;
                    self.status_message = None;
                    self.roster = roster;
                    self.drop_stale_selection();
                }
                AsyncResult::TaskSaved { task, is_edit } => {
                    self.loading = false;
                    self.dialog = None;
                    match task {
                        // Update local data instead of a full refresh
                        Some(task) => {
                            let verb = if is_edit { "Updated" } else { "Created" };
                            self.status_message = Some((format!("{} \"{}\"", verb, task.title), false));
                            self.roster.upsert_task(task);
                        }
                        None => self.refresh_data(),
                    }
                }
                AsyncResult::TaskDeleted(task_id) => {
                    self.loading = false;
                    self.roster.remove_task(&task_id);
                }
                AsyncResult::ClientsLoaded(clients) => {
                    self.loading = false;
                    self.is_offline = false;
                    self.clients = clients;
                    self.clients_loaded = true;
                }
                AsyncResult::ClientSaved(message) => {
                    self.loading = false;
                    self.client_dialog = None;
                    self.status_message = Some((message, false));
                    self.load_clients();
                }
                AsyncResult::SelectionChanged(selection) => {
                    debug!(?selection, "Board follows selection");
                    self.status_message = None;
                    let creating = self.dialog.as_ref().is_some_and(|d| d.mode == DialogMode::Add);
                    if creating && !selection.allows_task_creation() {
                        self.dialog = None;
                    }
                }
                AsyncResult::Unauthorized => {
                    self.logout();
                    self.status_message = Some(("Your session has expired, please sign in again".to_string(), true));
                }
                AsyncResult::Error(msg) => {
                    self.loading = false;
                    self.is_offline = false;
                    self.status_message = Some((msg, true));
                }
                AsyncResult::Offline => {
                    self.loading = false;
                    self.is_offline = true;
                    self.status_message = None;
                }
            }
        }
    }

    /// Forget a selected department or employee that the fresh roster no longer has
    fn drop_stale_selection(&mut self) {
        let current = self.selection.current().clone();
        let Some(department_id) = current.department_id.as_deref() else {
            return;
        };
        match (self.roster.department(department_id), current.employee_id.as_deref()) {
            (None, _) => {
                self.selection.clear();
            }
            (Some(_), Some(employee_id)) if self.roster.employee(department_id, employee_id).is_none() => {
                self.selection.select_department(department_id);
            }
            _ => {}
        }
    }

    fn client(&self) -> Result<AttendanceClient, ApiError> {
        AttendanceClient::new(&self.config, self.session.as_ref())
    }

    fn refresh_data(&mut self) {
        if self.session.is_none() || self.loading {
            return;
        }

        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                self.status_message = Some((format!("Failed to set up HTTP client: {}", e), true));
                return;
            }
        };
        let tx = self.result_tx.clone();

        self.spawn(async move {
            match client.fetch_roster().await {
                Ok(roster) => {
                    let _ = tx.send(AsyncResult::RosterLoaded(roster));
                }
                Err(e) => {
                    let _ = tx.send(failure(e, "Failed to load tasks"));
                }
            }
        });
    }

    fn login(&mut self) {
        let email = self.login_email.trim().to_string();
        let key = self.login_key.trim().to_string();
        if self.login_origin.trim().is_empty() || email.is_empty() || key.is_empty() {
            self.status_message = Some(("Fill in the server, email and key".to_string(), true));
            return;
        }

        self.config.backend_origin = self.login_origin.trim().to_string();
        let client = match AttendanceClient::new(&self.config, None) {
            Ok(client) => client,
            Err(e) => {
                self.status_message = Some((format!("Failed to set up HTTP client: {}", e), true));
                return;
            }
        };
        let remember = self.login_remember;
        let tx = self.result_tx.clone();

        self.spawn(async move {
            match client.login(&email, &key).await {
                Ok(response) => {
                    let session = Session::from_login(response, &email, remember);
                    let _ = tx.send(AsyncResult::LoggedIn(session));
                }
                Err(ApiError::Http { status, .. }) if status.is_client_error() => {
                    warn!(%status, "Login rejected");
                    let _ = tx.send(AsyncResult::Error("Invalid email or key".to_string()));
                }
                Err(e) => {
                    let _ = tx.send(failure(e, "Login failed"));
                }
            }
        });
    }

    fn logout(&mut self) {
        info!("Signing out");
        if let Some(store) = &self.session_store {
            if let Err(e) = store.clear() {
                warn!(error = %e, "Failed to clear stored session");
            }
        }
        self.session = None;
        self.roster = Roster::default();
        self.selection.clear();
        self.dialog = None;
        self.pending_delete = None;
        self.clients.clear();
        self.clients_loaded = false;
        self.client_dialog = None;
        self.pending_client_delete = None;
        self.page = Page::Schedule;
        self.loading = false;
        self.is_offline = false;
        self.state = AppState::Login;
    }

    fn open_add_dialog(&mut self, date: NaiveDate, start_time: String, assignee: Option<String>) {
        let selection = self.selection.current();
        if !selection.allows_task_creation() {
            return;
        }
        self.dialog = Some(TaskForm::for_new(date, start_time, selection.department_id.clone(), assignee));
    }

    fn open_edit_dialog(&mut self, task: &Task) {
        self.dialog = Some(TaskForm::for_task(
            task,
            self.config.slot_minutes(),
            self.config.default_duration_minutes(),
        ));
    }

    fn save_dialog(&mut self) {
        let slot_minutes = self.config.slot_minutes();
        let Some(form) = self.dialog.as_mut() else {
            return;
        };
        let Some(request) = form.to_request(slot_minutes) else {
            return;
        };
        let is_edit = form.mode == DialogMode::Edit;
        let task_id = form.task_id.clone();

        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                self.status_message = Some((format!("Failed to set up HTTP client: {}", e), true));
                return;
            }
        };
        let tx = self.result_tx.clone();

        self.spawn(async move {
            let result = if is_edit {
                client.update_task(&task_id, &request).await.map(|_| {
                    // The backend doesn't echo updates; rebuild the task from what we sent
                    Task::from_dto(TaskDto {
                        id: task_id.clone(),
                        title: request.title.clone(),
                        description: Some(request.description.clone()),
                        start_time: Some(request.start_time.clone()),
                        end_time: Some(request.end_time.clone()),
                        department_id: request.department_id.as_ref().map(value_id),
                        assigned_to_employee_id: request.assigned_to_employee_id.as_ref().map(value_id),
                    })
                })
            } else {
                client.create_task(&request).await.map(|created| created.and_then(Task::from_dto))
            };

            match result {
                Ok(task) => {
                    let _ = tx.send(AsyncResult::TaskSaved { task, is_edit });
                }
                Err(e) => {
                    let _ = tx.send(failure(e, "Failed to save task"));
                }
            }
        });
    }

    fn delete_task(&mut self, task: &Task) {
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                self.status_message = Some((format!("Failed to set up HTTP client: {}", e), true));
                return;
            }
        };
        let task_id = task.id.clone();
        let tx = self.result_tx.clone();

        self.spawn(async move {
            match client.delete_task(&task_id).await {
                Ok(()) => {
                    info!(%task_id, "Deleted task");
                    let _ = tx.send(AsyncResult::TaskDeleted(task_id));
                }
                Err(e) => {
                    let _ = tx.send(failure(e, "Failed to delete task"));
                }
            }
        });
    }

    fn load_clients(&mut self) {
        if self.loading {
            return;
        }
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                self.status_message = Some((format!("Failed to set up HTTP client: {}", e), true));
                return;
            }
        };
        let tx = self.result_tx.clone();

        self.spawn(async move {
            match client.get_clients().await {
                Ok(clients) => {
                    info!(count = clients.len(), "Fetched clients");
                    let _ = tx.send(AsyncResult::ClientsLoaded(clients));
                }
                Err(e) => {
                    let _ = tx.send(failure(e, "Failed to load clients"));
                }
            }
        });
    }

    fn save_client_dialog(&mut self) {
        let Some(form) = self.client_dialog.as_mut() else {
            return;
        };
        let Some((name, code)) = form.validate() else {
            return;
        };
        let client_id = form.client_id.clone();

        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                self.status_message = Some((format!("Failed to set up HTTP client: {}", e), true));
                return;
            }
        };
        let tx = self.result_tx.clone();

        self.spawn(async move {
            let result = match &client_id {
                Some(id) => client.update_client(id, &name, &code).await.map(|_| "Client updated"),
                None => client.create_client(&name, &code).await.map(|_| "Client added"),
            };
            match result {
                Ok(message) => {
                    let _ = tx.send(AsyncResult::ClientSaved(message.to_string()));
                }
                Err(e) => {
                    let _ = tx.send(failure(e, "Failed to save client"));
                }
            }
        });
    }

    fn delete_client(&mut self, target: &ClientDto) {
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                self.status_message = Some((format!("Failed to set up HTTP client: {}", e), true));
                return;
            }
        };
        let client_id = target.id.clone();
        let tx = self.result_tx.clone();

        self.spawn(async move {
            match client.delete_client(&client_id).await {
                Ok(()) => {
                    info!(%client_id, "Deleted client");
                    let _ = tx.send(AsyncResult::ClientSaved("Client deleted".to_string()));
                }
                Err(e) => {
                    let _ = tx.send(failure(e, "Failed to delete client"));
                }
            }
        });
    }

    fn render_login(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("Shiftboard");
            ui.add_space(8.0);
            ui.label(RichText::new("Sign in with your dashboard email and key").color(super::theme::muted_text()));
            ui.add_space(20.0);
        });

        egui::Grid::new("login_grid")
            .num_columns(2)
            .spacing([20.0, 10.0])
            .show(ui, |ui| {
                ui.label("Server:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.login_origin)
                        .hint_text("http://attendance.example.com")
                        .desired_width(350.0)
                );
                ui.end_row();

                ui.label("Email:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.login_email)
                        .hint_text("you@company.com")
                        .desired_width(350.0)
                );
                ui.end_row();

                ui.label("Key:");
                let key_response = ui.add(
                    egui::TextEdit::singleline(&mut self.login_key)
                        .password(true)
                        .hint_text("Your dashboard key")
                        .desired_width(350.0)
                );
                if key_response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    self.login();
                }
                ui.end_row();

                ui.label("");
                ui.checkbox(&mut self.login_remember, "Remember me");
                ui.end_row();
            });

        ui.add_space(20.0);

        ui.add_enabled_ui(!self.loading, |ui| {
            ui.horizontal(|ui| {
                if ui.button(format!("{} Sign in", egui_phosphor::regular::SIGN_IN)).clicked() {
                    self.login();
                }
                if self.loading {
                    ui.spinner();
                }
            });
        });
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        let selection = self.selection.current().clone();
        let (title, subtitle) = views::board_title(&self.roster, &selection);

        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.heading(title);
                ui.label(RichText::new(subtitle).color(super::theme::muted_text()));
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button(format!("{} Sign out", egui_phosphor::regular::SIGN_OUT)).clicked() {
                    self.logout();
                    return;
                }
                if let Some(session) = &self.session {
                    let who = if session.is_hr() {
                        format!("{} (HR)", session.email)
                    } else {
                        session.email.clone()
                    };
                    ui.label(RichText::new(who).color(super::theme::muted_text()));
                }
                let refresh = ui.add_enabled(
                    !self.loading,
                    egui::Button::new(egui_phosphor::regular::ARROWS_CLOCKWISE.to_string()),
                );
                if refresh.on_hover_text("Reload").clicked() {
                    self.refresh_data();
                }
                if self.loading {
                    ui.spinner();
                }
                if self.is_offline {
                    ui.label(
                        RichText::new(format!("{} Offline", egui_phosphor::regular::WIFI_SLASH))
                            .color(super::theme::error_color()),
                    );
                }

                ui.add_space(16.0);

                let can_add = selection.department_id.is_some() && selection.allows_task_creation();
                let add = ui.add_enabled(
                    can_add,
                    egui::Button::new(format!("{} Add task", egui_phosphor::regular::PLUS)),
                );
                let add = if selection.allows_task_creation() {
                    add
                } else {
                    add.on_disabled_hover_text("Tasks can't be added to past weeks")
                };
                if add.clicked() {
                    let now = Local::now().naive_local();
                    let slot = self.config.slot_minutes();
                    let start = views::minutes_of(now).div_ceil(slot) * slot;
                    let window = self.config.layout_window();
                    let latest = window.end.saturating_sub(slot).max(window.start);
                    let start = start.max(window.start).min(latest);
                    let date = match selection.mode() {
                        LayoutMode::SingleDay => selection.date,
                        LayoutMode::WeekGrid => selection
                            .visible_days()
                            .into_iter()
                            .find(|d| *d >= now.date())
                            .unwrap_or(selection.date),
                    };
                    self.open_add_dialog(date, format_time(start), selection.employee_id.clone());
                }

                ui.add_space(16.0);
                self.render_navigation(ui, &selection);
            });
        });
    }

    /// Previous/next arrows around a "today" button; weeks in the grid, days otherwise
    fn render_navigation(&mut self, ui: &mut egui::Ui, selection: &Selection) {
        let week_grid = selection.mode() == LayoutMode::WeekGrid;
        let (button_bg, button_text) = (ui.visuals().faint_bg_color, ui.visuals().text_color());

        egui::Frame::none()
            .fill(button_bg)
            .rounding(egui::Rounding::same(12.0))
            .inner_margin(egui::Margin::symmetric(8.0, 4.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let left_arrow = ui.add(egui::Label::new(
                        RichText::new(egui_phosphor::regular::CARET_LEFT).size(14.0).color(button_text)
                    ).sense(egui::Sense::click()));
                    if left_arrow.hovered() {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                    }
                    if left_arrow.clicked() {
                        if week_grid {
                            self.selection.previous_week();
                        } else {
                            self.selection.select_date(selection.date - Duration::days(1));
                        }
                    }

                    let label = if week_grid { "This week" } else { "Today" };
                    let today = ui.add(egui::Label::new(
                        RichText::new(label).size(14.0).color(button_text)
                    ).sense(egui::Sense::click()));
                    if today.hovered() {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                    }
                    if today.clicked() {
                        if week_grid {
                            self.selection.current_week();
                        } else {
                            self.selection.select_date(Local::now().date_naive());
                        }
                    }

                    let right_arrow = ui.add(egui::Label::new(
                        RichText::new(egui_phosphor::regular::CARET_RIGHT).size(14.0).color(button_text)
                    ).sense(egui::Sense::click()));
                    if right_arrow.hovered() {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                    }
                    if right_arrow.clicked() {
                        if week_grid {
                            self.selection.next_week();
                        } else {
                            self.selection.select_date(selection.date + Duration::days(1));
                        }
                    }
                });
            });
    }

    fn render_main(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("departments")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    ui.selectable_value(
                        &mut self.page,
                        Page::Schedule,
                        format!("{} Schedule", egui_phosphor::regular::CALENDAR),
                    );
                    let clients = ui.selectable_value(
                        &mut self.page,
                        Page::Clients,
                        format!("{} Clients", egui_phosphor::regular::BRIEFCASE),
                    );
                    if clients.clicked() && !self.clients_loaded {
                        self.load_clients();
                    }
                });
                ui.add_space(8.0);
                ui.heading("Departments");
                ui.add_space(8.0);
                if self.roster.is_empty() && !self.loading {
                    ui.label(RichText::new("No departments loaded").color(super::theme::muted_text()));
                }
                let clicked = views::render_sidebar(ui, &self.roster, self.selection.current());
                if let Some((department_id, employee_id)) = clicked.select_employee {
                    self.page = Page::Schedule;
                    self.selection.select_employee(&department_id, &employee_id);
                } else if let Some(department_id) = clicked.select_department {
                    self.page = Page::Schedule;
                    self.selection.select_department(&department_id);
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.page == Page::Clients {
                self.render_status(ui);
                let result = views::render_clients(ui, &self.clients, self.clients_loaded);
                if self.loading {
                    ui.spinner();
                }
                if result.reload {
                    self.load_clients();
                }
                if result.add {
                    self.client_dialog = Some(ClientForm::for_new());
                }
                if let Some(client) = result.edit {
                    self.client_dialog = Some(ClientForm::for_client(&client));
                }
                if let Some(client) = result.delete {
                    self.pending_client_delete = Some(client);
                }
                return;
            }

            self.render_status(ui);
            self.render_header(ui);
            if self.state != AppState::Main {
                return;
            }
            ui.separator();

            let now = Local::now().naive_local();
            let selection = self.selection.current().clone();
            let result = views::render_board(ui, &self.roster, &selection, &self.config, now);

            if let Some(task) = result.edit_task {
                self.open_edit_dialog(&task);
            }
            if let Some(task) = result.delete_task {
                self.pending_delete = Some(task);
            }
            if let Some((date, start_time, employee_id)) = result.add_at {
                if selection.allows_task_creation() {
                    self.open_add_dialog(date, start_time, employee_id);
                }
            }
        });
    }

    fn render_status(&mut self, ui: &mut egui::Ui) {
        let mut dismiss_message = false;
        if let Some((msg, is_error)) = &self.status_message {
            let color = if *is_error {
                super::theme::error_color()
            } else {
                Color32::from_rgb(22, 163, 74)
            };
            ui.horizontal(|ui| {
                ui.add(egui::Label::new(RichText::new(msg).color(color)));
                ui.add_space(8.0);
                let close_btn = ui.add(egui::Label::new(
                    RichText::new(egui_phosphor::regular::X).size(14.0).color(super::theme::muted_text())
                ).sense(egui::Sense::click()));
                if close_btn.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                }
                if close_btn.clicked() {
                    dismiss_message = true;
                }
            });
            ui.add_space(8.0);
        }
        if dismiss_message {
            self.status_message = None;
        }
    }

    fn dialog_frame() -> egui::Frame {
        let (content_bg, frame_color) = super::theme::dialog_colors();
        egui::Frame::none()
            .fill(content_bg)
            .stroke(egui::Stroke::new(2.0, frame_color))
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(egui::Margin::same(20.0))
    }

    fn render_task_dialog(&mut self, ctx: &egui::Context) {
        let slot_minutes = self.config.slot_minutes();
        let loading = self.loading;
        let employees: Vec<(String, String)> = self
            .dialog
            .as_ref()
            .and_then(|form| form.department_id.as_deref())
            .and_then(|id| self.roster.department(id))
            .map(|dept| dept.employees.iter().map(|e| (e.id.clone(), e.name.clone())).collect())
            .unwrap_or_default();

        let Some(form) = self.dialog.as_mut() else {
            return;
        };
        let title = match form.mode {
            DialogMode::Add => "New task",
            DialogMode::Edit => "Edit task",
        };

        let mut save_requested = false;
        let mut close_requested = false;
        let error_color = super::theme::error_color();
        let error_frame = |has_error: bool| {
            if has_error {
                egui::Frame::none()
                    .stroke(egui::Stroke::new(2.0, error_color))
                    .rounding(4.0)
                    .inner_margin(2.0)
            } else {
                egui::Frame::none()
            }
        };

        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .default_width(480.0)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .frame(Self::dialog_frame())
            .show(ctx, |ui| {
                egui::Grid::new("task_grid")
                    .num_columns(2)
                    .spacing([12.0, 10.0])
                    .show(ui, |ui| {
                        ui.label("Title");
                        let response = error_frame(form.error_title).show(ui, |ui| {
                            ui.add(egui::TextEdit::singleline(&mut form.title).desired_width(320.0))
                        }).inner;
                        if response.changed() {
                            form.error_title = false;
                        }
                        ui.end_row();

                        ui.label("Description");
                        ui.add(
                            egui::TextEdit::multiline(&mut form.description)
                                .desired_rows(3)
                                .desired_width(320.0)
                        );
                        ui.end_row();

                        ui.label("Date");
                        let response = error_frame(form.error_date).show(ui, |ui| {
                            ui.add(
                                egui::TextEdit::singleline(&mut form.date)
                                    .hint_text("2025-05-20")
                                    .desired_width(150.0)
                            )
                        }).inner;
                        if response.changed() {
                            form.error_date = false;
                        }
                        ui.end_row();

                        ui.label("Start");
                        let response = error_frame(form.error_time).show(ui, |ui| {
                            ui.add(
                                egui::TextEdit::singleline(&mut form.start_time)
                                    .hint_text("10:00 AM")
                                    .desired_width(150.0)
                            )
                        }).inner;
                        if response.changed() {
                            form.error_time = false;
                        }
                        ui.end_row();

                        ui.label("Duration");
                        ui.horizontal(|ui| {
                            ui.add(egui::DragValue::new(&mut form.slots).range(1..=36).suffix(" slots"));
                            let minutes = form.slots.saturating_mul(slot_minutes);
                            let until = try_parse_time(form.start_time.trim())
                                .map(|start| format!(" until {}", format_time(end_from_slots(start, form.slots, slot_minutes))))
                                .unwrap_or_default();
                            ui.label(
                                RichText::new(format!("{} min{}", minutes, until)).color(super::theme::muted_text())
                            );
                        });
                        ui.end_row();

                        if !employees.is_empty() {
                            ui.label("Assignee");
                            let selected_name = form
                                .assignee
                                .as_deref()
                                .and_then(|id| employees.iter().find(|(eid, _)| eid == id))
                                .map(|(_, name)| name.clone())
                                .unwrap_or_else(|| "Unassigned".to_string());
                            egui::ComboBox::from_id_salt("assignee")
                                .selected_text(selected_name)
                                .width(320.0)
                                .show_ui(ui, |ui| {
                                    ui.selectable_value(&mut form.assignee, None, "Unassigned");
                                    for (id, name) in &employees {
                                        ui.selectable_value(&mut form.assignee, Some(id.clone()), name);
                                    }
                                });
                            ui.end_row();
                        }
                    });

                ui.add_space(14.0);

                ui.add_enabled_ui(!loading, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("Save").clicked() {
                            save_requested = true;
                        }
                        if ui.button("Cancel").clicked() {
                            close_requested = true;
                        }
                        if loading {
                            ui.spinner();
                        }
                    });
                });
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            close_requested = true;
        }
        if save_requested {
            self.save_dialog();
        }
        if close_requested {
            self.dialog = None;
        }
    }

    fn render_delete_confirm(&mut self, ctx: &egui::Context) {
        let Some(task) = &self.pending_delete else {
            return;
        };
        let mut do_delete = false;
        let mut cancel_delete = false;

        egui::Window::new("Confirm Delete")
            .collapsible(false)
            .resizable(false)
            .default_width(400.0)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .frame(Self::dialog_frame())
            .show(ctx, |ui| {
                ui.label(RichText::new("Delete this task?").size(14.0));
                ui.add_space(10.0);
                ui.label(RichText::new(&task.title).strong());
                let when = match &task.end_time {
                    Some(end) => format!("{} {} - {}", task.date.format("%a, %b %-d"), task.time, end),
                    None => format!("{} {}", task.date.format("%a, %b %-d"), task.time),
                };
                ui.label(RichText::new(when).color(super::theme::muted_text()));
                ui.add_space(20.0);

                ui.horizontal(|ui| {
                    let delete = egui::Button::new(RichText::new("Delete").color(Color32::WHITE))
                        .fill(super::theme::error_color());
                    if ui.add(delete).clicked() {
                        do_delete = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel_delete = true;
                    }
                });
            });

        if do_delete {
            if let Some(task) = self.pending_delete.take() {
                self.delete_task(&task);
            }
        }
        if cancel_delete {
            self.pending_delete = None;
        }
    }
}

impl DashboardApp {
    fn render_client_dialog(&mut self, ctx: &egui::Context) {
        let loading = self.loading;
        let Some(form) = self.client_dialog.as_mut() else {
            return;
        };
        let title = if form.client_id.is_some() { "Edit client" } else { "Add client" };

        let mut save_requested = false;
        let mut close_requested = false;
        let error_color = super::theme::error_color();
        let error_frame = |has_error: bool| {
            if has_error {
                egui::Frame::none()
                    .stroke(egui::Stroke::new(2.0, error_color))
                    .rounding(4.0)
                    .inner_margin(2.0)
            } else {
                egui::Frame::none()
            }
        };

        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .default_width(400.0)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .frame(Self::dialog_frame())
            .show(ctx, |ui| {
                egui::Grid::new("client_grid")
                    .num_columns(2)
                    .spacing([12.0, 10.0])
                    .show(ui, |ui| {
                        ui.label("Name");
                        let response = error_frame(form.error_name).show(ui, |ui| {
                            ui.add(
                                egui::TextEdit::singleline(&mut form.name)
                                    .hint_text("Client name")
                                    .desired_width(260.0)
                            )
                        }).inner;
                        if response.changed() {
                            form.error_name = false;
                        }
                        ui.end_row();

                        ui.label("Code");
                        let response = error_frame(form.error_code).show(ui, |ui| {
                            ui.add(
                                egui::TextEdit::singleline(&mut form.code)
                                    .hint_text("Client code")
                                    .desired_width(260.0)
                            )
                        }).inner;
                        if response.changed() {
                            form.error_code = false;
                        }
                        ui.end_row();
                    });

                ui.add_space(14.0);

                ui.add_enabled_ui(!loading, |ui| {
                    ui.horizontal(|ui| {
                        let label = if form.client_id.is_some() { "Update" } else { "Add" };
                        if ui.button(label).clicked() {
                            save_requested = true;
                        }
                        if ui.button("Cancel").clicked() {
                            close_requested = true;
                        }
                        if loading {
                            ui.spinner();
                        }
                    });
                });
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            close_requested = true;
        }
        if save_requested {
            self.save_client_dialog();
        }
        if close_requested {
            self.client_dialog = None;
        }
    }

    fn render_client_delete_confirm(&mut self, ctx: &egui::Context) {
        let Some(client) = &self.pending_client_delete else {
            return;
        };
        let mut do_delete = false;
        let mut cancel_delete = false;

        egui::Window::new("Confirm Delete")
            .collapsible(false)
            .resizable(false)
            .default_width(400.0)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .frame(Self::dialog_frame())
            .show(ctx, |ui| {
                ui.label(RichText::new("Delete this client?").size(14.0));
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&client.name).strong());
                    if !client.client_code.is_empty() {
                        ui.label(RichText::new(&client.client_code).color(super::theme::muted_text()));
                    }
                });
                ui.add_space(20.0);

                ui.horizontal(|ui| {
                    let delete = egui::Button::new(RichText::new("Delete").color(Color32::WHITE))
                        .fill(super::theme::error_color());
                    if ui.add(delete).clicked() {
                        do_delete = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel_delete = true;
                    }
                });
            });

        if do_delete {
            if let Some(client) = self.pending_client_delete.take() {
                self.delete_client(&client);
            }
        }
        if cancel_delete {
            self.pending_client_delete = None;
        }
    }
}

/// Wire ids serialize as numbers when numeric; read them back as strings
fn value_id(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle pinch-to-zoom (trackpad pinch or Ctrl+scroll)
        let zoom_delta = ctx.input(|i| i.zoom_delta());
        if zoom_delta != 1.0 {
            self.config.font_scale = (self.config.font_scale * zoom_delta).clamp(0.75, 2.5);
            if (zoom_delta - 1.0).abs() > 0.01 {
                let _ = self.config.save();
            }
        }
        ctx.set_pixels_per_point(self.config.font_scale);

        self.check_async_results();

        match self.state {
            AppState::Login => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    self.render_status(ui);
                    self.render_login(ui);
                });
            }
            AppState::Main => {
                self.render_task_dialog(ctx);
                self.render_delete_confirm(ctx);
                self.render_client_dialog(ctx);
                self.render_client_delete_confirm(ctx);
                self.render_main(ctx);

                // Keep the current time line moving
                ctx.request_repaint_after(std::time::Duration::from_secs(1));
            }
        }

        if self.loading {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::TaskColor;

    fn task() -> Task {
        Task {
            id: "42".to_string(),
            title: "Inventory".to_string(),
            description: "Back room".to_string(),
            time: "10:00 AM".to_string(),
            end_time: Some("10:50 AM".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 5, 20).unwrap(),
            assigned_to_employee_id: Some("160".to_string()),
            employee_name: Some("Mona".to_string()),
            department_id: Some("1".to_string()),
            color: TaskColor::for_id("42"),
        }
    }

    #[test]
    fn edit_form_rounds_duration_up_to_slots() {
        let form = TaskForm::for_task(&task(), 20, 60);
        assert_eq!(form.mode, DialogMode::Edit);
        assert_eq!(form.slots, 3);
        assert_eq!(form.date, "2025-05-20");
        assert_eq!(form.assignee.as_deref(), Some("160"));
    }

    #[test]
    fn edit_form_without_end_uses_default_duration() {
        let mut t = task();
        t.end_time = None;
        let form = TaskForm::for_task(&t, 20, 60);
        assert_eq!(form.slots, 3);
    }

    #[test]
    fn form_builds_wire_request() {
        let mut form = TaskForm::for_task(&task(), 20, 60);
        let request = form.to_request(20).unwrap();
        assert_eq!(request.start_time, "2025-05-20T10:00:00");
        assert_eq!(request.end_time, "2025-05-20T11:00:00");
        assert_eq!(request.assigned_to_employee_id, Some(serde_json::json!(160)));
    }

    #[test]
    fn invalid_form_flags_fields() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        let mut form = TaskForm::for_new(date, "25:00 PM".to_string(), None, None);
        form.date = "tomorrow".to_string();
        assert!(form.to_request(20).is_none());
        assert!(form.error_title);
        assert!(form.error_date);
        assert!(form.error_time);
    }

    #[test]
    fn huge_default_duration_does_not_overflow() {
        let mut t = task();
        t.end_time = None;
        let form = TaskForm::for_task(&t, 20, u32::MAX);
        assert!(form.slots >= 1);
    }

    #[test]
    fn client_form_requires_name_and_code() {
        let mut form = ClientForm::for_new();
        form.name = "  ".to_string();
        form.code = "ACM".to_string();
        assert!(form.validate().is_none());
        assert!(form.error_name);
        assert!(!form.error_code);

        let mut form = ClientForm::for_client(&ClientDto {
            id: "9".to_string(),
            name: " Acme ".to_string(),
            client_code: "ACM".to_string(),
        });
        assert_eq!(form.client_id.as_deref(), Some("9"));
        assert_eq!(form.validate(), Some(("Acme".to_string(), "ACM".to_string())));
    }

    #[test]
    fn numeric_and_string_ids_read_back() {
        assert_eq!(value_id(&serde_json::json!(160)), "160");
        assert_eq!(value_id(&serde_json::json!("abc")), "abc");
    }
}
