mod command;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use ivory_audio::NullToneEngine;
use ivory_domain::{decode_content, ContentFormat};
use ivory_services::{ContentProvider, HttpContentProvider, StaticCatalog};
use ivory_tutor::{MidiManager, SessionOrchestrator, TutorConfig};
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::command::Command;

#[derive(Parser, Debug)]
#[command(author, version, about = "Practice lessons, exams and quizzes from the terminal")]
struct Args {
    /// Lesson, exam or quiz file (JSON or YAML) to start right away
    #[arg(long)]
    content: Option<PathBuf>,
    /// Catalog file serving `lesson`, `exam` and `quiz` requests
    #[arg(long, conflicts_with = "endpoint")]
    catalog: Option<PathBuf>,
    /// Remote content generator serving `lesson`, `exam` and `quiz` requests
    #[arg(long)]
    endpoint: Option<String>,
    /// Language for content requests
    #[arg(long, default_value = "en")]
    lang: String,
    /// Tutor settings (JSON or YAML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Read commands from this file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,
    /// Play along on this MIDI input port
    #[arg(long)]
    midi: Option<String>,
    /// List MIDI input ports and exit
    #[arg(long)]
    list_midi: bool,
}

/// Wall clock that `wait` can fast-forward, so scripts never sleep.
struct Clock {
    skipped: Duration,
}

impl Clock {
    fn now(&self) -> Instant {
        Instant::now() + self.skipped
    }

    fn skip(&mut self, by: Duration) -> Instant {
        self.skipped += by;
        self.now()
    }
}

struct Practice {
    session: SessionOrchestrator,
    provider: Option<Box<dyn ContentProvider>>,
    runtime: Runtime,
    clock: Clock,
    midi: Option<Receiver<Vec<u8>>>,
}

impl Practice {
    fn poll_midi(&mut self) {
        let Some(rx) = &self.midi else {
            return;
        };
        let messages: Vec<Vec<u8>> = rx.try_iter().collect();
        for message in messages {
            self.session.midi_message(&message, self.clock.now());
        }
    }

    fn run(&mut self, command: Command) -> Result<()> {
        self.poll_midi();
        let now = self.clock.now();
        match command {
            Command::KeyDown(key) => self.session.key_down(key, now),
            Command::KeyUp(key) => self.session.key_up(key, now),
            Command::Tap(key) => {
                self.session.key_down(key, now);
                self.session.key_up(key, now);
            }
            Command::NoteOn(midi) => self.session.note_on(midi, None, now),
            Command::NoteOff(midi) => self.session.note_off(midi, now),
            Command::Enter => self.session.advance(now),
            Command::Hint => {
                if !self.session.request_hint(now) {
                    println!("no hint available yet");
                }
            }
            Command::Override => {
                if !self.session.manual_override() {
                    println!("override not available yet");
                }
            }
            Command::Choose(index) => {
                if self.session.select_option(index, now).is_none() {
                    println!("nothing to choose");
                }
            }
            Command::Previous => self.session.previous_step(now),
            Command::Step(index) => {
                if !self.session.go_to_step(index, now) {
                    println!("no step {index}");
                }
            }
            Command::Wait(duration) => {
                let now = self.clock.skip(duration);
                self.session.tick(now);
            }
            Command::Menu => self.session.return_to_menu(),
            Command::State => {
                println!("{}", serde_json::to_string_pretty(&self.session.snapshot())?);
            }
            Command::Cancel => {
                self.session.cancel_request();
            }
            Command::Request(request) => {
                let Some(provider) = &self.provider else {
                    println!("no content provider configured; use --catalog or --endpoint");
                    return Ok(());
                };
                let ticket = self.session.begin_request(&request);
                let result = self.runtime.block_on(provider.fulfil(&request));
                let outcome = self.session.resolve_request(ticket, result, self.clock.now());
                println!("{outcome:?}");
            }
        }
        self.session.tick(self.clock.now());
        for event in self.session.drain_events() {
            println!("{}", serde_json::to_string(&event)?);
        }
        Ok(())
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<TutorConfig> {
    match path {
        Some(path) => TutorConfig::from_path(path)
            .with_context(|| format!("load config {}", path.display())),
        None => Ok(TutorConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if args.list_midi {
        for device in MidiManager::list_inputs()? {
            println!("{}", device.name);
        }
        return Ok(());
    }

    let config = load_config(args.config.as_ref())?;
    let runtime = Runtime::new()?;
    let provider: Option<Box<dyn ContentProvider>> = match (&args.catalog, &args.endpoint) {
        (Some(path), _) => Some(Box::new(StaticCatalog::from_path(path)?)),
        (None, Some(endpoint)) => Some(Box::new(HttpContentProvider::new(endpoint.as_str()))),
        (None, None) => None,
    };

    let mut session = SessionOrchestrator::new(config, Box::new(NullToneEngine::default()));
    runtime.block_on(session.initialize_audio());

    let (_connection, midi) = match &args.midi {
        Some(port) => {
            let (connection, rx) = MidiManager::connect(port)?;
            (Some(connection), Some(rx))
        }
        None => (None, None),
    };

    let mut practice = Practice {
        session,
        provider,
        runtime,
        clock: Clock {
            skipped: Duration::ZERO,
        },
        midi,
    };

    if let Some(path) = &args.content {
        let bytes =
            std::fs::read(path).with_context(|| format!("read content {}", path.display()))?;
        let content = decode_content(&bytes, ContentFormat::from_path(path))?;
        let title = content.title().to_string();
        if !practice.session.start_content(content, practice.clock.now()) {
            warn!(title = %title, "content has nothing to practise");
        }
    }

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("open script {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    for line in input.lines() {
        let line = line?;
        match Command::parse(&line, &args.lang) {
            Ok(Some(command)) => practice.run(command)?,
            Ok(None) => {}
            Err(err) => println!("error: {err:#}"),
        }
    }
    info!("input finished");
    Ok(())
}
