use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::arrange::{Arrangement, TaskBoard, TileGrid};
use crate::io::board_io::{Board, open_board};
use crate::io::state::{UiState, read_ui_state, write_ui_state};
use crate::io::store::{BoardData, FileStore, Store};
use crate::menu::{ContextMenu, EditForm, MenuAction};
use crate::model::{BoardConfig, Collection, GroupId, ItemId, ModelError, Task};
use crate::sync::worker::SyncWorker;
use crate::sync::{Resolution, SyncError, SyncRequest, SyncResponse};

use super::input;
use super::render;
use super::theme::Theme;

/// Which view is currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Application tile grid
    Grid,
    /// Kanban task board
    Board,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            View::Grid => "grid",
            View::Board => "board",
        }
    }

    pub fn parse(s: &str) -> Option<View> {
        match s {
            "grid" => Some(View::Grid),
            "board" => Some(View::Board),
            _ => None,
        }
    }

    pub fn toggled(self) -> View {
        match self {
            View::Grid => View::Board,
            View::Board => View::Grid,
        }
    }
}

/// Screen rectangles recorded while drawing, used to hit-test mouse events
#[derive(Debug, Clone, Default)]
pub struct HitMap {
    pub tabs: Vec<(View, Rect)>,
    pub tiles: Vec<(ItemId, Rect)>,
    pub cards: Vec<(ItemId, Rect)>,
    pub columns: Vec<(GroupId, Rect)>,
    pub menu: Vec<(MenuAction, Rect)>,
}

fn find_at<T: Clone>(entries: &[(T, Rect)], col: u16, row: u16) -> Option<T> {
    entries
        .iter()
        .find(|(_, r)| col >= r.x && col < r.right() && row >= r.y && row < r.bottom())
        .map(|(t, _)| t.clone())
}

impl HitMap {
    pub fn clear(&mut self) {
        *self = HitMap::default();
    }

    pub fn tab_at(&self, col: u16, row: u16) -> Option<View> {
        find_at(&self.tabs, col, row)
    }

    pub fn tile_at(&self, col: u16, row: u16) -> Option<ItemId> {
        find_at(&self.tiles, col, row)
    }

    pub fn card_at(&self, col: u16, row: u16) -> Option<ItemId> {
        find_at(&self.cards, col, row)
    }

    pub fn column_at(&self, col: u16, row: u16) -> Option<GroupId> {
        find_at(&self.columns, col, row)
    }

    pub fn menu_at(&self, col: u16, row: u16) -> Option<MenuAction> {
        find_at(&self.menu, col, row)
    }
}

/// Main application state
pub struct App {
    pub board: Board,
    pub view: View,
    pub grid: TileGrid,
    pub tasks: TaskBoard,
    /// Card payloads by id; the board's order lives in `tasks`
    pub task_data: HashMap<ItemId, Task>,
    pub menu: ContextMenu,
    pub form: Option<EditForm>,
    pub theme: Theme,
    pub hits: HitMap,
    /// Requests waiting to be handed to the sync worker
    pub outbox: Vec<SyncRequest>,
    /// Latest message for the status row
    pub notice: Option<String>,
    pub reload_requested: bool,
    pub should_quit: bool,
}

/// Build the task board collection from loaded tasks. Tasks whose status is
/// not a configured group are skipped.
pub fn task_collection(
    config: &BoardConfig,
    tasks: &[Task],
) -> Result<(Collection, HashMap<ItemId, Task>), ModelError> {
    let mut data = HashMap::new();
    let mut assignments = Vec::new();
    for task in tasks {
        if config.group(&task.status).is_none() {
            warn!(task = %task.id, status = %task.status, "task in unknown group skipped");
            continue;
        }
        assignments.push((task.id, task.status.clone()));
        data.insert(task.id, task.clone());
    }
    let collection = Collection::bucketed(config.group_ids(), assignments)?;
    Ok((collection, data))
}

impl App {
    /// Tiles start in configured order; the saved order is requested from
    /// the store right away and applied when it arrives.
    pub fn new(board: Board, data: BoardData) -> Result<Self, ModelError> {
        let grid = Arrangement::new(Collection::flat(board.config.tile_ids())?);
        let (tasks, task_data) = task_collection(&board.config, &data.tasks)?;
        let theme = Theme::from_config(&board.config.ui);

        let mut app = App {
            board,
            view: View::Grid,
            grid,
            tasks: Arrangement::new(tasks),
            task_data,
            menu: ContextMenu::new(),
            form: None,
            theme,
            hits: HitMap::default(),
            outbox: Vec::new(),
            notice: None,
            reload_requested: false,
            should_quit: false,
        };
        let fetch = app.grid.request_order();
        app.outbox.push(fetch);
        Ok(app)
    }

    /// Full reload: rebuild both views from fresh store data. Responses to
    /// requests issued before the reload are ignored.
    pub fn reload(&mut self, data: BoardData) -> Result<(), ModelError> {
        let (tasks, task_data) = task_collection(&self.board.config, &data.tasks)?;
        self.grid
            .reload(Collection::flat(self.board.config.tile_ids())?);
        self.tasks.reload(tasks);
        self.task_data = task_data;
        self.menu.dismiss();
        self.form = None;
        self.notice = None;
        self.reload_requested = false;
        let fetch = self.grid.request_order();
        self.outbox.push(fetch);
        info!(tasks = self.task_data.len(), "board reloaded");
        Ok(())
    }

    pub fn in_flight(&self) -> usize {
        self.grid.in_flight() + self.tasks.in_flight()
    }

    pub fn switch_view(&mut self, view: View) {
        if self.view == view {
            return;
        }
        self.grid.cancel();
        self.tasks.cancel();
        self.menu.dismiss();
        self.view = view;
    }

    /// Route a store response to the arrangement that issued it
    pub fn handle_response(&mut self, response: SyncResponse) {
        let ticket = response.ticket;
        if self.grid.owns(ticket) {
            self.grid.resolve(response);
        } else if self.tasks.owns(ticket) {
            match self.tasks.resolve(response) {
                Resolution::Deleted(id) => {
                    self.task_data.remove(&id);
                }
                Resolution::Edited(task) => {
                    self.task_data.insert(task.id, task);
                }
                _ => {}
            }
        } else {
            debug!(ticket, "response after reload ignored");
        }
        if let Some(notice) = self.grid.take_notice().or_else(|| self.tasks.take_notice()) {
            self.notice = Some(notice);
        }
    }

    pub fn open_menu(&mut self, item: ItemId, anchor: (u16, u16)) {
        if self.tasks.collection().contains(item) {
            self.menu.open(item, anchor);
        }
    }

    /// Run a context menu entry against the item the menu is bound to
    pub fn choose(&mut self, action: MenuAction) {
        let Some((action, item)) = self.menu.choose(action) else {
            return;
        };
        match action {
            MenuAction::Delete => {
                if let Some(request) = self.tasks.request_delete(item) {
                    self.outbox.push(request);
                }
            }
            MenuAction::Edit => {
                self.form = self.task_data.get(&item).map(EditForm::for_task);
            }
        }
    }

    /// Validate the open form and send the edit. Invalid input keeps the
    /// form open with its error shown.
    pub fn submit_form(&mut self) {
        let Some(form) = &mut self.form else {
            return;
        };
        let Ok(fields) = form.submit() else {
            return;
        };
        let item = form.item;
        if let Some(request) = self.tasks.request_edit(item, fields) {
            self.outbox.push(request);
        }
        self.form = None;
    }

    pub fn take_outbox(&mut self) -> Vec<SyncRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Hand queued requests to `submit`. A request that cannot be submitted
    /// resolves as a failed response, so its drop is rolled back.
    pub fn send_outbox(&mut self, mut submit: impl FnMut(SyncRequest) -> Result<(), SyncError>) {
        for request in self.take_outbox() {
            let ticket = request.ticket;
            if let Err(err) = submit(request) {
                warn!(ticket, %err, "request not submitted");
                self.handle_response(SyncResponse {
                    ticket,
                    result: Err(err),
                });
            }
        }
    }

    pub fn task(&self, id: ItemId) -> Option<&Task> {
        self.task_data.get(&id)
    }

    pub fn tile_label(&self, id: ItemId) -> &str {
        self.board.config.tile(id).map_or("?", |t| t.label.as_str())
    }
}

fn restore_ui_state(app: &mut App) {
    if let Some(view) = read_ui_state(&app.board.dir).and_then(|s| View::parse(&s.view)) {
        app.view = view;
    }
}

fn save_ui_state(app: &App) {
    let state = UiState {
        view: app.view.as_str().to_string(),
    };
    if let Err(err) = write_ui_state(&app.board.dir, &state) {
        warn!(%err, "could not save UI state");
    }
}

/// Run the TUI application
pub fn run(board_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let board = open_board(board_dir)?;
    let mut loader = FileStore::new(&board.dir, board.config.clone());
    let data = loader.load()?;
    let latency = Duration::from_millis(board.config.sync.latency_ms);
    let worker = SyncWorker::start(Box::new(loader.clone()), latency)?;

    let mut app = App::new(board, data)?;
    restore_ui_state(&mut app);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, &worker, &mut loader);

    save_ui_state(&app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    worker: &SyncWorker,
    loader: &mut FileStore,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.send_outbox(|request| worker.submit(request));

        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key(app, key),
                Event::Mouse(mouse) => input::handle_mouse(app, mouse),
                _ => {}
            }
        }

        for response in worker.poll() {
            app.handle_response(response);
        }

        if app.reload_requested {
            match loader.load() {
                Ok(data) => app.reload(data)?,
                Err(err) => {
                    app.reload_requested = false;
                    app.notice = Some(err.to_string());
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
