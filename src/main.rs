use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use arboard::Clipboard;
use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{error, info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vt::cli::{self, CliArgs, TABLE_SELECTOR};
use vt::controller::Controller;
use vt::loader;
use vt::ui::TableUI;
use vt::{Model, Status, TableConfig, VTError};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(args) {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_tracing(log_file: Option<&Path>, interactive: bool) -> Result<(), VTError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(ErrorLayer::default());
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            registry
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_line_number(true)
                        .with_filter(filter),
                )
                .init();
        }
        // Anything on the terminal would tear the TUI.
        None if interactive => registry.init(),
        None => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
            .init(),
    }
    Ok(())
}

fn run(args: CliArgs) -> Result<(), VTError> {
    let interactive = args.is_interactive();
    let log_file = args.log_file.as_deref().map(cli::expand_path).transpose()?;
    init_tracing(log_file.as_deref(), interactive)?;

    let dataset = loader::load_file(cli::expand_path(&args.path)?)?;
    let document = cli::document_for(&dataset.columns);
    let options = args.table_options().data(dataset.records);
    let mut model = Model::new(document, TABLE_SELECTOR, options)?;

    if !args.sort.is_empty() {
        let keys: Vec<_> = args
            .sort
            .iter()
            .filter_map(|spec| {
                let key = cli::parse_sort(spec, model.columns());
                if key.is_none() {
                    warn!("Unknown sort column {spec}");
                }
                key
            })
            .collect();
        model.set_sort(keys);
    }
    if let Some(query) = &args.search {
        model.input(cli::SEARCH_SELECTOR, query);
    }

    if interactive {
        return run_tui(&mut model, &dataset.name);
    }

    let scope = args.scope();
    if let Some(path) = &args.export_csv {
        model.export_csv(cli::expand_path(path)?, scope)?;
    }
    if let Some(path) = &args.export_json {
        model.export_json(cli::expand_path(path)?, scope)?;
    }
    if args.print {
        println!("{}", model.to_csv(scope));
    }
    if args.copy {
        let mut clipboard = Clipboard::new().map_err(|e| VTError::invalid_data(e.to_string()))?;
        match clipboard.set_text(model.to_csv(scope)) {
            Ok(_) => info!("Copied table to clipboard."),
            Err(e) => return Err(VTError::invalid_data(format!("Error copying to clipboard: {e}"))),
        }
    }
    Ok(())
}

fn run_tui(model: &mut Model, name: &str) -> Result<(), VTError> {
    let cfg = TableConfig::default();
    let ui = TableUI::new(&cfg, name);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, model, &ui, &controller);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    ui: &TableUI,
    controller: &Controller,
) -> Result<(), VTError> {
    while model.status != Status::QUITTING {
        terminal.draw(|f| ui.draw(model, f))?;
        model.after_paint();

        if let Some(message) = controller.handle_event(model)? {
            model.update(Some(message))?;
        };
    }
    Ok(())
}
