//! logicsim CLI - run, inspect and tabulate logic circuits from the command line.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use logicsim::{
    CircuitLibrary, ConnectorType, IntegratedCircuit, Pin, Simulation, SimulationConfig,
    TruthTable,
};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::Level;

#[derive(Parser)]
#[command(name = "logicsim")]
#[command(about = "Digital logic circuit simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Simulation config file (JSON)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive input pins, settle the circuit and print the pin states
    Run {
        /// Circuit record (.json)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Set an input pin, e.g. --set 0=1
        #[arg(long = "set", value_name = "INDEX=0|1", value_parser = parse_assignment)]
        assignments: Vec<(usize, bool)>,

        /// Simulation ticks to run after settling
        #[arg(long, default_value_t = 0)]
        ticks: u64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Print the structure and statistics of a circuit
    Inspect {
        /// Circuit record (.json)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Print the truth table of a circuit
    TruthTable {
        /// Circuit record (.json)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Manage a library of saved circuits
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },
}

#[derive(Subcommand)]
enum LibraryAction {
    /// List saved circuits, most recent first
    List {
        /// Library file
        #[arg(long, value_name = "FILE")]
        store: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Save a circuit record under a name
    Save {
        /// Circuit record (.json)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Name to save under (defaults to the circuit label)
        #[arg(long)]
        name: Option<String>,

        /// Library file
        #[arg(long, value_name = "FILE")]
        store: PathBuf,
    },

    /// Remove a saved circuit
    Remove {
        /// Saved circuit name
        #[arg(value_name = "NAME")]
        name: String,

        /// Library file
        #[arg(long, value_name = "FILE")]
        store: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => SimulationConfig::from_path(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => SimulationConfig::default(),
    };

    match cli.command {
        Commands::Run {
            file,
            assignments,
            ticks,
            format,
        } => handle_run(&file, &assignments, ticks, format, config),
        Commands::Inspect { file, format } => handle_inspect(&file, format),
        Commands::TruthTable { file, format } => handle_truth_table(&file, format),
        Commands::Library { action } => handle_library(action, &config),
    }
}

fn parse_assignment(s: &str) -> std::result::Result<(usize, bool), String> {
    let (index, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=0|1, got '{}'", s))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid pin index '{}'", index))?;
    let value = match value.trim() {
        "1" | "true" | "high" => true,
        "0" | "false" | "low" => false,
        other => return Err(format!("invalid pin level '{}'", other)),
    };
    Ok((index, value))
}

fn load(path: &Path) -> Result<IntegratedCircuit> {
    logicsim::load_circuit(path).with_context(|| format!("failed to load {}", path.display()))
}

fn handle_run(
    file: &Path,
    assignments: &[(usize, bool)],
    ticks: u64,
    format: OutputFormat,
    config: SimulationConfig,
) -> Result<()> {
    let circuit = load(file)?;
    let max_passes = circuit.elements().len() + 2;
    let mut sim = Simulation::new(circuit, config);

    for &(index, state) in assignments {
        let pin = sim.current().pin_by_index(index)?;
        if pin.pin_type != ConnectorType::Input {
            bail!("pin {} is {}, only INPUT pins can be set", index, pin.pin_type);
        }
        sim.set_input(index, state)?;
    }
    sim.current_mut()?.settle(max_passes);

    if ticks > 0 {
        sim.run_ticks(Duration::ZERO, ticks)?;
        sim.stop();
    }

    let circuit = sim.current();
    match format {
        OutputFormat::Human => {
            println!("Circuit: {}", circuit.label);
            println!("{}", "─".repeat(40));
            for pin in circuit.pins() {
                println!(
                    "  {:<8} {:<6} {}",
                    pin.label(),
                    pin.pin_type.to_string(),
                    level(pin.state())
                );
            }
            if ticks > 0 {
                println!("\n  Ticks: {}", sim.tick_count());
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "circuit": circuit.label,
                "ticks": sim.tick_count(),
                "pins": circuit.pins().iter().map(|p| pin_json(p)).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn pin_json(pin: &Pin) -> serde_json::Value {
    serde_json::json!({
        "label": pin.label(),
        "index": pin.index,
        "type": pin.pin_type,
        "state": pin.state(),
    })
}

fn level(state: bool) -> &'static str {
    if state {
        "1"
    } else {
        "0"
    }
}

fn handle_inspect(file: &Path, format: OutputFormat) -> Result<()> {
    let circuit = load(file)?;
    let stats = circuit.stats();
    let loops = circuit.feedback_loops();
    let dangling = circuit.dangling_wires();

    match format {
        OutputFormat::Human => {
            println!("Circuit: {}", circuit.label);
            println!("{}", "─".repeat(40));
            println!("  Elements:     {}", stats.element_count);
            println!("    Gates:      {}", stats.gate_count);
            println!("    Pins:       {}", stats.pin_count);
            println!("    Circuits:   {}", stats.subcircuit_count);
            println!("  Wires:        {}", stats.wire_count);
            println!("  Depth:        {}", stats.depth);
            println!("  Feedback:     {}", if stats.has_feedback { "yes" } else { "no" });

            println!("\n  Elements:");
            for element in circuit.elements() {
                let (w, h) = element.dimensions();
                println!(
                    "    #{:<3} {:<5} {:<12} at {} ({}x{})",
                    element.id(),
                    element.kind().to_string(),
                    element.label(),
                    element.position().to_string(),
                    w,
                    h
                );
            }
            if !loops.is_empty() {
                println!("\n  Feedback loops:");
                for group in &loops {
                    println!("    {:?}", group);
                }
            }
            if !dangling.is_empty() {
                println!("\n  Dangling wires: {:?}", dangling);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "circuit": circuit.label,
                "stats": stats,
                "feedback_loops": loops,
                "dangling_wires": dangling,
                "pins": circuit.pins().iter().map(|p| pin_json(p)).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn handle_truth_table(file: &Path, format: OutputFormat) -> Result<()> {
    let circuit = load(file)?;
    let table = circuit.truth_table()?;

    match format {
        OutputFormat::Human => print_table(&table),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
    }
    Ok(())
}

fn print_table(table: &TruthTable) {
    let header: Vec<String> = table
        .inputs
        .iter()
        .chain(std::iter::once(&"|".to_string()))
        .chain(table.outputs.iter())
        .map(|s| s.to_string())
        .collect();
    println!("{}", header.join(" "));

    for row in &table.rows {
        let cells: Vec<String> = table
            .inputs
            .iter()
            .zip(&row.inputs)
            .map(|(name, &v)| format!("{:<w$}", level(v), w = name.len()))
            .chain(std::iter::once("|".to_string()))
            .chain(
                table
                    .outputs
                    .iter()
                    .zip(&row.outputs)
                    .map(|(name, &v)| format!("{:<w$}", level(v), w = name.len())),
            )
            .collect();
        println!("{}", cells.join(" ").trim_end());
    }
}

fn handle_library(action: LibraryAction, config: &SimulationConfig) -> Result<()> {
    let capacity = config.max_saved_circuits;
    match action {
        LibraryAction::List { store, format } => {
            let library = open_library(&store, capacity)?;
            match format {
                OutputFormat::Human => {
                    if library.is_empty() {
                        println!("No saved circuits");
                    }
                    for entry in library.entries() {
                        let pins = entry.circuit.pins().len();
                        println!(
                            "  {:<16} {} pins  saved {}",
                            entry.name,
                            pins,
                            entry.saved_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
                OutputFormat::Json => {
                    let output = serde_json::json!({
                        "capacity": library.capacity(),
                        "names": library.names(),
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
            }
        }
        LibraryAction::Save { file, name, store } => {
            let circuit = load(&file)?;
            let name = name.unwrap_or_else(|| circuit.label.clone());
            let mut library = open_library(&store, capacity)?;
            library.save(&circuit, &name)?;
            library
                .save_to_path(&store)
                .with_context(|| format!("failed to write {}", store.display()))?;
            println!("Saved '{}' ({}/{})", name, library.len(), library.capacity());
        }
        LibraryAction::Remove { name, store } => {
            let mut library = open_library(&store, capacity)?;
            library.remove(&name)?;
            library
                .save_to_path(&store)
                .with_context(|| format!("failed to write {}", store.display()))?;
            println!("Removed '{}'", name);
        }
    }
    Ok(())
}

fn open_library(store: &Path, capacity: usize) -> Result<CircuitLibrary> {
    CircuitLibrary::load_from_path(store, capacity)
        .with_context(|| format!("failed to read library {}", store.display()))
}
