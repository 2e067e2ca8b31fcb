mod app;
mod ui;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use rhythm_config::Config;
use rhythm_engine::{Assistant, Document, GeminiModel, Inbound, Outbound, Session};
use std::{
    env,
    io::{Stdout, stdout},
    process,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{
    runtime::Runtime,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};

use crate::app::App;

/// Upper bound on how long the loop blocks waiting for a key
const TICK: Duration = Duration::from_millis(100);

const WELCOME: &str = "Welcome to Rhythm.\n\nStart writing here. Pause for a moment after typing and the paragraph under your cursor will be read and critiqued in the feedback panel below.\n\nPress Tab to talk to one of the assistants on the right.";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let document = match args.len() {
        1 => Document::from_text(WELCOME),
        2 => {
            let bytes = std::fs::read(&args[1])
                .with_context(|| format!("Failed to read {}", args[1]))?;
            Document::from_bytes(&bytes)
                .with_context(|| format!("{} is not valid UTF-8", args[1]))?
        }
        _ => {
            eprintln!("Usage: {} [file]", args[0]);
            process::exit(1);
        }
    };

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    init_logging()?;
    log::info!("Starting rhythm-cli");

    let assistant = build_assistant(&config);
    let session = Session::new(document, assistant.is_some())
        .with_quiet_period(config.debounce());
    let runtime = Runtime::new()?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    let res = run_app(&mut terminal, &mut app, assistant.as_ref(), &runtime);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // In-flight calls are abandoned
    runtime.shutdown_background();

    if let Err(err) = res {
        log::error!("{err:?}");
        println!("{err:?}");
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    let log_path = Config::log_path();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn build_assistant(config: &Config) -> Option<Assistant> {
    let Some(api_key) = config.resolve_api_key() else {
        log::info!("No API key configured; running offline");
        return None;
    };

    match GeminiModel::new(
        api_key,
        &config.model,
        &config.endpoint,
        config.request_timeout(),
    ) {
        Ok(model) => {
            log::info!("Using model {}", config.model);
            Some(Assistant::new(Arc::new(model)))
        }
        Err(e) => {
            log::warn!("Could not create model client: {e}; running offline");
            None
        }
    }
}

struct Dispatcher<'a> {
    assistant: Option<&'a Assistant>,
    runtime: &'a Runtime,
    tx: UnboundedSender<Inbound>,
}

impl Dispatcher<'_> {
    /// Run the call on the runtime; its result comes back through the channel
    fn dispatch(&self, outbound: Outbound) {
        let Some(assistant) = self.assistant else {
            log::warn!("Dropping model call issued without a client");
            return;
        };
        let assistant = assistant.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let inbound = assistant.execute(outbound).await;
            // The receiver is gone only once the UI has exited
            let _ = tx.send(inbound);
        });
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    assistant: Option<&Assistant>,
    runtime: &Runtime,
) -> Result<()> {
    let (tx, mut rx): (UnboundedSender<Inbound>, UnboundedReceiver<Inbound>) =
        unbounded_channel();
    let dispatcher = Dispatcher {
        assistant,
        runtime,
        tx,
    };

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = app
            .session
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .map_or(TICK, |until| until.min(TICK));

        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(outbound) = app.handle_key(key, Instant::now())
        {
            dispatcher.dispatch(outbound);
        }

        if app.should_quit {
            return Ok(());
        }

        if let Some(outbound) = app.session.poll(Instant::now()) {
            dispatcher.dispatch(outbound);
        }

        while let Ok(inbound) = rx.try_recv() {
            app.session.resolve(inbound);
        }
    }
}
