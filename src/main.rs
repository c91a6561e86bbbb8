//! The `zen` binary: a CLI wrapper around [`zen::run`]. With a positional
//! path argument, the file is evaluated once; without one, a `rustyline`
//! REPL reads statements from stdin against a single persistent global
//! scope until EOF.

use std::{path::PathBuf, process::ExitCode, rc::Rc};

use clap::Parser as ClapParser;
use rustyline::{error::ReadlineError, DefaultEditor};

use zen::{Scope, Source};

#[derive(ClapParser)]
#[command(name = "zen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A small dynamically-typed scripting language", long_about = None)]
struct Args {
    /// Source file to run. Omit to start an interactive REPL.
    path: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match args.path {
        Some(path) => run_file(&path),
        None => run_repl(),
    }
}

fn run_file(path: &std::path::Path) -> ExitCode {
    let source = match Source::path(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("zen: could not read '{}': {}", path.display(), e);
            return ExitCode::from(3);
        }
    };

    let scope = Scope::global();
    match zen::run(source, &scope) {
        Ok(value) => {
            if let zen::Value::Error(_) = &*value.borrow() {
                eprintln!("{}", value.borrow());
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(syntax) => {
            eprintln!("{}", syntax);
            ExitCode::from(2)
        }
    }
}

fn run_repl() -> ExitCode {
    let scope = Scope::global();
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("zen: could not start the line editor: {}", e);
            return ExitCode::from(3);
        }
    };

    loop {
        match editor.readline("zen> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                if line.trim() == ":quit" {
                    break;
                }
                let _ = editor.add_history_entry(line.as_str());
                let source = Source::source(&line);
                match zen::run(Rc::clone(&source), &scope) {
                    Ok(value) => println!("{}", value.borrow()),
                    Err(syntax) => eprintln!("{}", syntax),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("zen: {}", e);
                return ExitCode::from(3);
            }
        }
    }
    ExitCode::SUCCESS
}
