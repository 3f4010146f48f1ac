use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser};

use fgsheet::render::{RenderTarget, TextRenderer};
use fgsheet::session::{load_character, CommitOutcome, ViewState};
use fgsheet::sheet::describe::Descriptions;
use fgsheet::sheet::tree::read_sheet_text;
use fgsheet::status::StatusLine;

#[derive(Parser, Debug)]
#[command(name = "fgsheet")]
#[command(about = "Fantasy Grounds character XML viewer (text render)", long_about = None)]
struct Args {
    /// Exported character XML file
    #[arg(value_name = "XML")]
    input: Option<PathBuf>,

    /// Description override TOML (default: built-in table)
    #[arg(long, value_name = "TOML")]
    descriptions: Option<PathBuf>,

    /// Dump the built view-model as JSON instead of rendering text
    #[arg(long)]
    json: bool,

    /// Expand every interactive row (resolves all detail text)
    #[arg(long)]
    expand: bool,

    /// Suppress status lines on stderr
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let status = StatusLine::new(!args.quiet);

    let input = match args.input {
        Some(p) => p,
        None => {
            let mut cmd = Args::command();
            cmd.print_help().context("print help")?;
            eprintln!("\n\nUSAGE:\n  fgsheet <character.xml>\n");
            return Ok(());
        }
    };

    let descriptions = match args.descriptions.as_ref() {
        Some(path) => Descriptions::from_toml_path(path)?,
        None => Descriptions::builtin(),
    };

    status.info(format!("loading {}", input.display()));

    let mut state = ViewState::default();
    let ticket = state.begin_load();
    let result = read_sheet_text(&input).and_then(|text| load_character(&text));

    match state.commit(ticket, result) {
        CommitOutcome::Applied => {
            status.info(format!("loaded {}", input.display()));
        }
        CommitOutcome::Failed(err) => {
            status.info(format!("{err}"));
            return Err(err.into());
        }
        CommitOutcome::Superseded => {}
    }

    let Some(view) = state.current() else {
        return Ok(());
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&view.sheet).context("serialize view-model json")?;
        println!("{json}");
        return Ok(());
    }

    let stdout = std::io::stdout().lock();
    let mut renderer = TextRenderer::new(stdout, descriptions, args.expand);
    renderer.render_sheet(view);
    Ok(())
}
