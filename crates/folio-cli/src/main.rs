// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio: local document toolbox.
//
// Entry point. Initialises logging, opens a session and runs one command.

mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use folio_core::error::{FolioError, Result};
use folio_core::human_errors::humanize_error;
use folio_core::{EditorMode, PipelineConfig, StagedFile};
use folio_pipeline::{OptionValue, RunStatus, Workbench};

use services::config_dir::config_dir;
use services::session::{Overrides, Session};

#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Local document toolbox")]
struct Cli {
    /// Directory holding folio.json (defaults to the XDG config directory).
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the tool catalog.
    Tools,
    /// Stage files into a tool and run it.
    Run(RunArgs),
    /// Show the effective configuration.
    Config {
        /// Write the default configuration to folio.json.
        #[arg(long)]
        write_default: bool,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Tool id, as listed by `folio tools`.
    tool: String,

    /// Files to stage, in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Set a text option, e.g. `--set angle=90`.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    set: Vec<(String, String)>,

    /// Set a binary option from a file, e.g. `--set-file signature=sig.png`.
    #[arg(long = "set-file", value_name = "KEY=PATH", value_parser = parse_key_value)]
    set_file: Vec<(String, String)>,

    /// Organizer: move the thumbnail at one position to another (zero-based).
    #[arg(long = "move", value_name = "FROM:TO", value_parser = parse_move)]
    moves: Vec<(usize, usize)>,

    /// Organizer: delete the thumbnail with this id (the page's original number).
    #[arg(long = "delete", value_name = "ID")]
    deletes: Vec<u32>,

    /// Editor: add a text object to a page, e.g. `--text 2:Approved`.
    #[arg(long = "text", value_name = "PAGE:TEXT", value_parser = parse_page_text)]
    texts: Vec<(u32, String)>,

    /// Save outputs here instead of the configured output directory.
    #[arg(short, long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Ask where to save each output.
    #[arg(long)]
    save_dialog: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let dir = cli.config_dir.unwrap_or_else(config_dir);

    let outcome = match cli.command {
        Command::Tools => list_tools(&dir),
        Command::Run(args) => run_tool(&dir, args).await,
        Command::Config { write_default } => show_config(&dir, write_default),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            let human = humanize_error(&err);
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

// -- Commands -----------------------------------------------------------------

fn list_tools(dir: &Path) -> Result<()> {
    let session = Session::open(dir, Overrides::default())?;
    for tool in session.workbench.tools().iter() {
        let marker = if tool.is_new { " (new)" } else { "" };
        println!("{:<22} {}{}", tool.id, tool.title, marker);
        println!("{:<22} {}", "", tool.description);
        println!("{:<22} accepts {}", "", tool.accept);
        if let Some(editor) = tool.options {
            let keys: Vec<&str> = editor.fields.iter().map(|field| field.key).collect();
            println!("{:<22} options {}", "", keys.join(", "));
        }
    }
    Ok(())
}

fn show_config(dir: &Path, write_default: bool) -> Result<()> {
    if write_default {
        let path = PipelineConfig::default().persist(dir)?;
        println!("{}", path.display());
        return Ok(());
    }
    let config = PipelineConfig::load_or_default(dir)?;
    let json = serde_json::to_string_pretty(&config)?;
    println!("{json}");
    Ok(())
}

async fn run_tool(dir: &Path, args: RunArgs) -> Result<()> {
    let overrides = Overrides {
        output_dir: args.output_dir.clone(),
        save_dialog: args.save_dialog,
    };
    let mut session = Session::open(dir, overrides)?;
    let workbench = &mut session.workbench;
    workbench.wait_until_ready().await?;

    workbench.select_tool(&args.tool)?;
    let files = args.files.iter().map(|path| read_staged(path)).collect::<Result<Vec<_>>>()?;
    workbench.stage(files)?;

    for (key, value) in &args.set {
        workbench.set_option(key, OptionValue::Text(value.clone()))?;
    }
    for (key, path) in &args.set_file {
        let bytes = std::fs::read(path)
            .map_err(|err| FolioError::precondition(format!("Could not read {path}: {}", err)))?;
        workbench.set_option(key, OptionValue::Bytes(Arc::from(bytes)))?;
    }
    apply_page_edits(workbench, &args)?;

    match workbench.run().await? {
        RunStatus::Produced(_) => {
            for path in workbench.materialize_all()? {
                println!("{}", path.display());
            }
        }
        RunStatus::Saved(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
        }
        RunStatus::Discarded => {}
    }
    Ok(())
}

/// Organizer and editor instructions only make sense in their own mode.
fn apply_page_edits(workbench: &mut Workbench, args: &RunArgs) -> Result<()> {
    let wants_organize = !args.moves.is_empty() || !args.deletes.is_empty();
    if wants_organize && workbench.mode() != EditorMode::Organize {
        return Err(FolioError::precondition("--move and --delete need the organize-pdf tool."));
    }
    if !args.texts.is_empty() && workbench.mode() != EditorMode::Edit {
        return Err(FolioError::precondition("--text needs the edit-pdf tool with a single file."));
    }

    if workbench.mode() == EditorMode::Organize {
        let organizer = workbench.organizer_mut()?;
        for &(from, to) in &args.moves {
            organizer.reorder(from, to);
        }
        for &id in &args.deletes {
            if !organizer.delete(id) {
                return Err(FolioError::precondition(format!("There is no page {id} to delete.")));
            }
        }
    }

    if workbench.mode() == EditorMode::Edit {
        let editor = workbench.annotator_mut()?;
        for (page, text) in &args.texts {
            let delta = *page as i64 - editor.current_page() as i64;
            editor.navigate(delta as i32)?;
            if editor.current_page() != *page {
                return Err(FolioError::precondition(format!("There is no page {page} in this document.")));
            }
            editor.add_text(Some(text));
        }
    }
    Ok(())
}

fn read_staged(path: &Path) -> Result<StagedFile> {
    let bytes = std::fs::read(path)
        .map_err(|err| FolioError::precondition(format!("Could not read {}: {}", path.display(), err)))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(StagedFile::from_name(name, bytes))
}

// -- Argument parsing ---------------------------------------------------------

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got \"{raw}\""))?;
    if key.trim().is_empty() {
        return Err(format!("missing key in \"{raw}\""));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

fn parse_move(raw: &str) -> std::result::Result<(usize, usize), String> {
    let (from, to) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected FROM:TO, got \"{raw}\""))?;
    let parse = |part: &str| part.trim().parse::<usize>().map_err(|err| format!("{part}: {err}"));
    Ok((parse(from)?, parse(to)?))
}

fn parse_page_text(raw: &str) -> std::result::Result<(u32, String), String> {
    let (page, text) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected PAGE:TEXT, got \"{raw}\""))?;
    let page = page.trim().parse::<u32>().map_err(|err| format!("{page}: {err}"))?;
    if page == 0 {
        return Err("pages are numbered from 1".to_string());
    }
    Ok((page, text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_splits_on_first_equals() {
        assert_eq!(
            parse_key_value("text=a=b").unwrap(),
            ("text".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("=x").is_err());
        assert!(parse_key_value("novalue").is_err());
    }

    #[test]
    fn moves_and_page_text_parse() {
        assert_eq!(parse_move("2:0").unwrap(), (2, 0));
        assert!(parse_move("2-0").is_err());
        assert_eq!(parse_page_text("3:Hello: world").unwrap(), (3, "Hello: world".to_string()));
        assert!(parse_page_text("0:x").is_err());
    }

    #[test]
    fn cli_parses_a_run() {
        let cli = Cli::try_parse_from([
            "folio", "run", "rotate-pdf", "a.pdf", "--set", "angle=180", "-o", "/tmp/out",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.tool, "rotate-pdf");
        assert_eq!(args.set, vec![("angle".to_string(), "180".to_string())]);
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn run_requires_files() {
        assert!(Cli::try_parse_from(["folio", "run", "merge-pdf"]).is_err());
    }
}
