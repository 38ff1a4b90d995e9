use std::{path::PathBuf, sync::Arc};

use clap::{Args, Parser, Subcommand};
use music_sandbox_core::{
    default_state, AudioBus, BusEngineFactory, CompositionRoot, Descriptor, Frame, Note,
    OscillatorKind, SandboxConfig, SandboxError, SurfaceInput,
};
use tracing_subscriber::EnvFilter;

fn main() -> music_sandbox_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SandboxConfig::load(path)?,
        None => SandboxConfig::default(),
    };

    match cli.command {
        Commands::List => run_list(&config),
        Commands::Play(args) => run_play(&config, args),
    }
}

fn run_list(config: &SandboxConfig) -> music_sandbox_core::Result<()> {
    let bus = AudioBus::new(&config.audio);
    let state = default_state(config, &bus)?;

    print_names("instruments", state.instruments().map(|list| list.iter().map(Descriptor::name)));
    print_names("visualizers", state.visualizers().map(|list| list.iter().map(Descriptor::name)));
    Ok(())
}

fn print_names<'a>(label: &str, names: Option<impl Iterator<Item = &'a str>>) {
    println!("{label}:");
    for (index, name) in names.into_iter().flatten().enumerate() {
        println!("  {index}: {name}");
    }
}

fn run_play(config: &SandboxConfig, args: PlayArgs) -> music_sandbox_core::Result<()> {
    tracing::info!(
        instrument = args.instrument.as_deref(),
        visualizer = args.visualizer.as_deref(),
        notes = args.notes.len(),
        "starting session"
    );

    let bus = AudioBus::new(&config.audio);
    let engines = Arc::new(BusEngineFactory::new(bus.clone(), config.audio.block_size));
    let mut root = CompositionRoot::new(default_state(config, &bus)?, engines)?;

    if let Some(name) = &args.instrument {
        root.select_instrument_by_name(name)?;
    }
    if let Some(name) = &args.visualizer {
        root.select_visualizer_by_name(name)?;
    }
    if let Some(kind) = args.oscillator {
        root.dispatch(&SurfaceInput::Select(kind.label().to_string()))?;
    }

    for note in &args.notes {
        root.dispatch(&SurfaceInput::Press(*note))?;
        root.dispatch(&SurfaceInput::Release(*note))?;
    }

    let frame = root.render()?;
    if args.json {
        let json = serde_json::to_string_pretty(&frame)
            .map_err(|err| SandboxError::msg(format!("failed to encode frame: {err}")))?;
        println!("{json}");
    } else {
        print_frame(&frame);
    }
    Ok(())
}

fn print_frame(frame: &Frame) {
    let choosers = [
        ("instruments", &frame.instruments),
        ("visualizers", &frame.visualizers),
    ];
    for (label, chooser) in choosers {
        let options: Vec<String> = chooser
            .options
            .iter()
            .enumerate()
            .map(|(index, name)| {
                if chooser.active == Some(index) {
                    format!("<{name}>")
                } else {
                    name.clone()
                }
            })
            .collect();
        println!("{label}: {}", options.join(" | "));
    }
    if let Some(view) = &frame.instrument {
        print!("{view}");
    }
    if let Some(view) = &frame.visualizer {
        print!("{view}");
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Pluggable instruments and visualizers", long_about = None)]
struct Cli {
    /// Optional JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the registered instruments and visualizers.
    List,
    /// Play a sequence of notes and render one frame.
    Play(PlayArgs),
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// Instrument to mount instead of the first registered one.
    #[arg(short, long)]
    instrument: Option<String>,
    /// Visualizer to mount instead of the first registered one.
    #[arg(short, long)]
    visualizer: Option<String>,
    /// Oscillator type to select on the instrument before playing.
    #[arg(short, long)]
    oscillator: Option<OscillatorKind>,
    /// Print the rendered frame as JSON.
    #[arg(long)]
    json: bool,
    /// Notes to play, e.g. `C4 E4 G4`.
    notes: Vec<Note>,
}
