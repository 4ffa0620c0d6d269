use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use upload_logging::{upload_error, upload_info};
use uploader_core::{UploadStatus, UploadViewModel};
use uploader_engine::{load_local_file, EngineHandle, UploadField};

use super::config::{AppConfig, DEFAULT_CONFIG_FILENAME};
use super::{logging, persistence, ui};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const USAGE: &str = "usage: uploader_app [--config <file.ron>] <image-file>";

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    config_path: PathBuf,
    file_path: PathBuf,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut config_path = PathBuf::from(DEFAULT_CONFIG_FILENAME);
        let mut file_path = None;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let value = args.next().context(USAGE)?;
                    config_path = PathBuf::from(value);
                }
                "--help" | "-h" => bail!(USAGE),
                _ if file_path.is_none() => file_path = Some(PathBuf::from(arg)),
                _ => bail!("unexpected argument {arg:?}\n{USAGE}"),
            }
        }
        Ok(Self {
            config_path,
            file_path: file_path.context(USAGE)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Upload,
    Retry,
    Dismiss,
    Cancel,
    Quit,
    Unknown,
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('u') | Some('y') => Command::Upload,
            Some('r') => Command::Retry,
            Some('d') => Command::Dismiss,
            Some('c') => Command::Cancel,
            Some('q') => Command::Quit,
            _ => Command::Unknown,
        }
    }
}

pub fn run_app() -> anyhow::Result<()> {
    let args = CliArgs::parse(std::env::args().skip(1))?;
    let config = AppConfig::load(&args.config_path)?;
    logging::initialize(config.log);

    let metadata = config.metadata();
    let initial_url = persistence::load_last_good_url(&config.state_dir, &metadata);
    let engine = EngineHandle::new(config.transport_settings())?;

    let state_dir = config.state_dir.clone();
    let mut field = UploadField::new(config.uploader_config(initial_url), engine)
        .on_upload_complete(move |url| {
            if let Err(err) = persistence::save_last_good_url(&state_dir, &metadata, url) {
                upload_error!("Failed to record uploaded image {}: {}", url, err);
            }
        });

    let file = load_local_file(&args.file_path)?;
    upload_info!("Loaded {:?} ({} bytes)", args.file_path, file.len());
    field.select(file);

    let commands = spawn_command_reader()?;
    loop {
        field.pump();
        if field.consume_dirty() {
            print_view(&field.view())?;
            prompt()?;
        }

        let view = field.view();
        match view.status {
            UploadStatus::Uploading => match commands.try_recv() {
                Ok(Command::Cancel) => field.cancel(),
                // Closed input leaves an unattended upload running.
                Ok(_) | Err(TryRecvError::Empty | TryRecvError::Disconnected) => {
                    thread::sleep(POLL_INTERVAL)
                }
            },
            UploadStatus::Selected | UploadStatus::Succeeded => thread::sleep(POLL_INTERVAL),
            UploadStatus::AwaitingConfirm | UploadStatus::Failed => {
                match commands.recv().unwrap_or(Command::Quit) {
                    Command::Upload => field.confirm(),
                    Command::Retry => field.retry(),
                    Command::Dismiss => field.dismiss(),
                    Command::Quit => break,
                    Command::Cancel | Command::Unknown => {}
                }
            }
            UploadStatus::Idle => {
                if let Some(error) = view.error {
                    bail!("{}", error.message);
                }
                break;
            }
        }
    }

    Ok(())
}

/// Reads commands from stdin on a dedicated thread so the loop can poll
/// while an upload is running. The channel closes at end of input.
fn spawn_command_reader() -> io::Result<mpsc::Receiver<Command>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || forward_commands(io::stdin().lock(), &tx))?;
    Ok(rx)
}

fn forward_commands(input: impl BufRead, tx: &mpsc::Sender<Command>) {
    for line in input.lines() {
        let Ok(line) = line else { break };
        if tx.send(Command::parse(&line)).is_err() {
            break;
        }
    }
}

fn prompt() -> io::Result<()> {
    let mut out = io::stdout().lock();
    write!(out, "> ")?;
    out.flush()
}

fn print_view(view: &UploadViewModel) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for line in ui::render::render(view) {
        writeln!(out, "{line}")?;
    }
    out.flush()
}
