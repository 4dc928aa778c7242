use std::path::PathBuf;

use clap::Parser;
use eclio::ecl::restart::report_from_path;
use eclio::{ArrayFile, ByteOrder, OpenOptions, RestartFile, UnitSystemTables};
use log::LevelFilter;

/// Lists the arrays of an ECLIPSE keyword file and summarizes restart steps.
#[derive(Parser)]
#[command(name = "ecl-dump")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Keyword file to inspect (.UNRST, .X0001, .EGRID, .FUNRST, ...)
    path: PathBuf,

    /// Treat the file as formatted text regardless of its extension
    #[arg(long)]
    formatted: bool,

    /// Read binary record markers as little-endian instead of detecting
    #[arg(long)]
    little_endian: bool,

    /// Report step to decode (restart files only)
    #[arg(long)]
    step: Option<i32>,

    /// Print the wells of the selected step
    #[arg(long, requires = "step")]
    wells: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env().filter_level(level).init();

    let options = OpenOptions {
        formatted: cli.formatted.then_some(true),
        byte_order: cli.little_endian.then_some(ByteOrder::Little),
    };

    if let Err(e) = run(&cli, options) {
        eprintln!("\nERROR: Failed to read {}", cli.path.display());
        eprintln!("  {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, options: OpenOptions) -> eclio::Result<()> {
    let file = ArrayFile::open_with(&cli.path, options)?;

    println!("Reading keyword file: {}", cli.path.display());
    println!("{}", "=".repeat(60));
    println!("  Encoding: {}", if file.is_formatted() { "formatted" } else { "binary" });
    if !file.is_formatted() {
        println!("  Byte order: {:?}", file.byte_order());
    }
    println!("  Arrays: {}", file.len());
    println!();
    for (i, (name, array_type, count)) in file.list().iter().enumerate() {
        println!("  {:>5}. {:<8} {:<4} {:>10}", i + 1, name, array_type.name(), count);
    }

    let Some(report) = cli.step else {
        return Ok(());
    };
    let restart = RestartFile::from_array_file(file, report_from_path(&cli.path))?;
    println!("\nReport steps: {:?}", restart.report_steps());

    let tables = UnitSystemTables::standard();
    let state = restart.load_state(report, tables)?;
    let header = &state.header;
    println!("\nStep {} ({}-{:02}-{:02}, {} days)", report, header.year, header.month, header.day, header.sim_days);
    println!("{}", "=".repeat(60));
    println!("  Unit system: {:?}", state.unit_system);
    println!("  Grid: {} x {} x {} ({} active)", header.nx, header.ny, header.nz, header.nactive);
    println!("  Wells: {}", state.wells.len());
    println!("  Groups: {}", state.groups.len());
    println!("  UDQs: {}", state.udqs.len());
    println!("  Actions: {}", state.actions.len());
    if let Some(network) = &state.network {
        println!("  Network: {} nodes, {} branches", network.nodes.len(), network.branches.len());
    }

    if cli.wells {
        println!("\nWells:");
        for well in restart.well_states(report, tables)? {
            println!(
                "  {:<8} {:<14} {:<6} connections={:<4} segments={}",
                well.name,
                format!("{:?}", well.well_type),
                if well.open { "OPEN" } else { "SHUT" },
                well.num_connections(),
                well.segments().len()
            );
        }
    }
    Ok(())
}
