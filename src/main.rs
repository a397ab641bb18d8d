use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::{sync::Arc, time::Duration};
use tracing::info;

use crust_browser::{
    app::App,
    cache::FileCache,
    cli::Cli,
    config,
    gateway::GatewayClient,
    index::IndexClient,
    listing::ListingController,
    logging,
    prefs::Prefs,
    preview::RetryPolicy,
    store::DirStore,
    tabs::{global_keybind, Tab, TabId, UiCommand},
    tabs::{BrowseTab, HistoryTab, LogsTab},
    ui::{draw_footer, draw_tab_bar, layout, tab_at},
    worker::Workers,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("current_dir")?;
    let config = config::load(&cwd)?;

    let (_log_guard, log_rx) = logging::init(&config.logs_dir())?;
    info!(
        root = %config.root.display(),
        index = %config.index_url,
        gateway = %config.gateway_url,
        "starting"
    );

    let store = DirStore::open(config.files_dir())?;
    let cache = FileCache::new(Arc::new(store));
    let prefs = Prefs::load(config.prefs_path());

    let index = IndexClient::new(&config.index_url, config.request_timeout);
    let gateway = GatewayClient::new(&config.gateway_url, config.request_timeout);
    let workers = Workers::new(Arc::new(index), Arc::new(gateway), RetryPolicy::default());

    let mut app = App::new(ListingController::new(cache, prefs), workers);
    match cli.address.as_deref() {
        Some(addr) => {
            app.submit(addr);
        }
        None => {
            app.restore();
        }
    }

    let mut browse_tab = BrowseTab::new();
    let mut history_tab = HistoryTab::new();
    let mut logs_tab = LogsTab::new();

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(50);

    loop {
        while let Ok(entry) = log_rx.try_recv() {
            app.push_log(entry);
        }
        app.poll_workers();

        terminal.draw(|f| {
            let areas = layout(f.area());
            draw_tab_bar(f, areas.tab_bar, &mut app);

            match app.active_tab {
                TabId::Browse => browse_tab.draw(f, areas.content, &mut app),
                TabId::History => history_tab.draw(f, areas.content, &mut app),
                TabId::Logs => logs_tab.draw(f, areas.content, &mut app),
            }

            draw_footer(f, areas.footer, &mut app);
        })?;

        if app.active_tab == TabId::Browse {
            browse_tab.sync_visibility(&mut app);
        }

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match global_keybind(key, app.ui.editing) {
                        UiCommand::Quit => app.should_quit = true,
                        UiCommand::SwitchTab(t) => app.set_active_tab(t),
                        UiCommand::None => {
                            let cmd = match app.active_tab {
                                TabId::Browse => browse_tab.on_key(key, &mut app),
                                TabId::History => history_tab.on_key(key, &mut app),
                                TabId::Logs => logs_tab.on_key(key, &mut app),
                            };
                            apply_command(cmd, &mut app);
                        }
                    }
                }

                Event::Mouse(m) => {
                    let size = terminal.size()?;
                    let areas = layout(Rect::new(0, 0, size.width, size.height));

                    if let MouseEventKind::Down(MouseButton::Left) = m.kind {
                        if let Some(tab) = tab_at(&app, m.column, m.row) {
                            app.set_active_tab(tab);
                        }
                    }

                    let cmd = match app.active_tab {
                        TabId::Browse => browse_tab.on_mouse(m, areas.content, &mut app),
                        TabId::History => history_tab.on_mouse(m, areas.content, &mut app),
                        TabId::Logs => logs_tab.on_mouse(m, areas.content, &mut app),
                    };
                    apply_command(cmd, &mut app);
                }

                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    info!("exiting");
    Ok(())
}

fn apply_command(cmd: UiCommand, app: &mut App) {
    match cmd {
        UiCommand::None => {}
        UiCommand::Quit => app.should_quit = true,
        UiCommand::SwitchTab(t) => {
            // Leaving the Browse tab drops input focus.
            app.ui.editing = false;
            app.set_active_tab(t);
        }
    }
}
