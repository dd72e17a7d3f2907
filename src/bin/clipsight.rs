use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use clipsight::logging::LoggingConfig;
use clipsight::{
    Asset, DispatchOutcome, DynAssetStore, DynContentGenerator, FunctionCall, GeminiClient,
    GenerationResponse, Mode, ModeCatalog, ModeInput, Pipeline, PipelineConfig, ProcessingState,
    ScriptedBackend, ToolKind, ToolRegistry,
};
use serde_json::json;

#[derive(Parser)]
#[command(name = "clipsight", version, about = "Video analysis via remote tool calls", author)]
struct Cli {
    /// JSON config file; environment variables override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a video, wait for processing and run one analysis mode
    Analyze {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        mode: String,
        /// Free-text prompt for custom modes or the custom sub-mode field
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long)]
        sub_mode: Option<String>,
        /// Focus the custom input field so the free text wins over the sub-mode
        #[arg(long)]
        custom: bool,
        /// Override the media type inferred from the file extension
        #[arg(long)]
        mime: Option<String>,
        /// Use the local scripted backend instead of the remote service
        #[arg(long)]
        dry_run: bool,
    },
    Modes {
        #[command(subcommand)]
        command: ModesCommand,
    },
    Tools {
        #[command(subcommand)]
        command: ToolsCommand,
    },
}

#[derive(Subcommand)]
enum ModesCommand {
    List,
}

#[derive(Subcommand)]
enum ToolsCommand {
    Schema {
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        compact: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    LoggingConfig::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Analyze {
            file,
            mode,
            prompt,
            sub_mode,
            custom,
            mime,
            dry_run,
        } => {
            let mut input = ModeInput::new();
            if let Some(text) = prompt {
                input.set_custom_text(text);
            }
            if let Some(name) = sub_mode {
                input.select_sub_mode(name);
            }
            if custom {
                input.focus_custom();
            }
            handle_analyze(&config, &file, &mode, &input, mime.as_deref(), dry_run).await?
        }
        Command::Modes { command } => match command {
            ModesCommand::List => handle_modes_list(&config)?,
        },
        Command::Tools { command } => match command {
            ToolsCommand::Schema { output, compact } => handle_tools_schema(output, compact)?,
        },
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn load_modes(config: &PipelineConfig) -> anyhow::Result<ModeCatalog> {
    Ok(match &config.modes_file {
        Some(path) => ModeCatalog::load(path)?,
        None => ModeCatalog::builtin().clone(),
    })
}

async fn handle_analyze(
    config: &PipelineConfig,
    file: &Path,
    mode_name: &str,
    input: &ModeInput,
    mime: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let modes = load_modes(config)?;
    let tools = ToolRegistry::builtin()?;
    modes.check_tools(&tools)?;
    let mode = modes.require(mode_name)?;

    let (store, generator) = if dry_run {
        let backend = Arc::new(
            ScriptedBackend::new()
                .with_statuses([ProcessingState::Ready])
                .with_response(sample_response(mode)),
        );
        let store: DynAssetStore = backend.clone();
        let generator: DynContentGenerator = backend;
        (store, generator)
    } else {
        let client = Arc::new(GeminiClient::from_config(config)?);
        let store: DynAssetStore = client.clone();
        let generator: DynContentGenerator = client;
        (store, generator)
    };

    let pipeline = Pipeline::from_config(store, generator, tools, config);
    let asset = Asset::from_path(file, mime).await?;
    let outcome = pipeline.run(asset, mode, input).await?;

    let snapshot = pipeline.session().snapshot();
    let output = match outcome {
        DispatchOutcome::Items(items) => json!({
            "mode": snapshot.active_mode,
            "label": snapshot.label,
            "is_list": mode.is_list,
            "results": items,
        }),
        DispatchOutcome::NoOp => json!({
            "mode": snapshot.active_mode,
            "results": null,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn sample_response(mode: &Mode) -> GenerationResponse {
    let timecodes = match mode.tool {
        ToolKind::SetTimecodes => json!([
            { "time": "00:00", "text": "Opening shot" },
            { "time": "00:05", "text": "Closing shot" }
        ]),
        ToolKind::SetTimecodesWithObjects => json!([
            { "time": "00:00", "text": "Opening shot", "objects": ["🎬 clapperboard"] }
        ]),
        ToolKind::SetTimecodesWithNumericValues => json!([
            { "time": "00:00", "value": 3 },
            { "time": "00:05", "value": 7 }
        ]),
    };
    GenerationResponse::with_calls(vec![FunctionCall::new(
        mode.tool.name(),
        json!({ "timecodes": timecodes }),
    )])
}

fn handle_modes_list(config: &PipelineConfig) -> anyhow::Result<()> {
    let modes = load_modes(config)?;
    println!("{:<20} {:<36} {}", "Mode", "Tool", "Sub-modes");
    for mode in modes.iter() {
        let sub_modes = mode
            .sub_modes
            .iter()
            .map(|sub| sub.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!("{:<20} {:<36} {}", mode.name, mode.tool.name(), sub_modes);
    }
    Ok(())
}

fn handle_tools_schema(output: Option<PathBuf>, compact: bool) -> anyhow::Result<()> {
    let value = json!(ToolRegistry::builtin()?.declarations());

    let content = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };

    if let Some(path) = output {
        fs::write(&path, content)?;
        println!("Tool declarations exported to `{}`", path.display());
    } else {
        println!("{content}");
    }
    Ok(())
}
