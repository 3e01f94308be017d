use std::{
    env, fs,
    io::Write,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use miette::Report;
use rustyline::{config::BellStyle, error::ReadlineError, Config, DefaultEditor};
use tracing::{debug, error, warn};

pub mod builtins;
pub mod history;
pub mod parser;
pub mod path;
pub mod process;
pub mod stream;

use history::History;
use parser::Parser;
use process::Outcome;
use stream::{FdWriter, Inherited};

const PROMPT: &str = "$ ";
const HISTORY_SIZE: usize = 1000;
/// Status of a line that failed to parse.
const SYNTAX_ERROR_STATUS: i32 = 2;

/// State that outlives every pipeline. The working directory is not stored
/// here, it lives in the process itself.
#[derive(Debug, Default)]
pub struct ShellState {
    pub history: History,
}

pub struct Shell {
    state: ShellState,
    status: i32,
}

impl Shell {
    pub fn new() -> Self {
        Shell {
            state: ShellState::default(),
            status: 0,
        }
    }

    /// Reads lines until `exit` or end of input and returns the exit status.
    pub fn run(&mut self) -> i32 {
        let mut editor = match editor() {
            Ok(editor) => editor,
            Err(err) => {
                error!(%err, "could not start line editor");
                eprintln!("Error: {err}");
                return 1;
            }
        };

        let history_file = history_file();
        if let Some(path) = &history_file {
            if let Err(err) = editor.load_history(path) {
                debug!(%err, path = %path.display(), "no history loaded");
            }
        }

        let status = loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    if let Outcome::Exit(status) = self.run_src(line, Inherited::standard()) {
                        break status;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break 0,
                Err(err) => {
                    eprintln!("Error: {err}");
                    break 1;
                }
            }
        };

        if let Some(path) = &history_file {
            save_history(&mut editor, path);
        }
        status
    }

    /// Records, parses and runs one line of input.
    pub fn run_src(&mut self, src: String, inherited: Inherited) -> Outcome {
        if !src.trim().is_empty() {
            self.state.history.push(src.as_str());
        }

        let pipeline = match Parser::new(String::from("shell"), src).parse() {
            Ok(pipeline) => pipeline,
            Err(error) => {
                let _ = writeln!(FdWriter::new(inherited.stderr), "{:?}", Report::new(error));
                self.status = SYNTAX_ERROR_STATUS;
                return Outcome::Status(self.status);
            }
        };

        let outcome = process::execute(&pipeline, &self.state, inherited);
        match outcome {
            Outcome::Status(status) | Outcome::Exit(status) => self.status = status,
        }
        debug!(status = self.status, "line finished");
        outcome
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

fn editor() -> rustyline::Result<DefaultEditor> {
    let config = Config::builder()
        .max_history_size(HISTORY_SIZE)?
        .history_ignore_dups(true)?
        .history_ignore_space(true)
        .auto_add_history(false)
        .bell_style(BellStyle::None)
        .build();
    DefaultEditor::with_config(config)
}

/// `KRILL_HISTFILE` or `history.txt` in the user's data directory.
fn history_file() -> Option<PathBuf> {
    match env::var_os("KRILL_HISTFILE") {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => ProjectDirs::from("", "", "krill").map(|dirs| dirs.data_dir().join("history.txt")),
    }
}

fn save_history(editor: &mut DefaultEditor, path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            warn!(%err, path = %parent.display(), "could not create history directory");
            return;
        }
    }
    if let Err(err) = editor.save_history(path) {
        warn!(%err, path = %path.display(), "could not save history");
    }
}
