//! patchwork CLI - multipatch spline model preprocessor
//!
//! Reads one or more patch stream files, stitches their topology, writes the
//! global numbering file, and collects property codes from a file or an
//! interactive prompt.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use patchwork_model::SplineModel;

#[derive(Parser)]
#[command(name = "patchwork")]
#[command(
    about = "Topology stitching and global numbering for multipatch spline models",
    long_about = None
)]
struct Cli {
    /// Input patch stream files, concatenated in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print a topology summary
    #[arg(short, long)]
    verbose: bool,

    /// Read property records from a file instead of standard input
    #[arg(long, value_name = "FILE")]
    props: Option<PathBuf>,

    /// Output file for the global numbering
    #[arg(short, long, default_value = "model.gno")]
    output: PathBuf,

    /// Matching tolerance for topology stitching
    #[arg(long, default_value_t = 1e-4)]
    tolerance: f64,
}

fn main() -> Result<()> {
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    let mut input = String::new();
    for file in &cli.files {
        let text = fs::read_to_string(file)
            .with_context(|| format!("reading input file \"{}\"", file.display()))?;
        input.push_str(&text);
    }

    let mut model = SplineModel::read(&input).context("parsing patch stream")?;
    model.set_tolerance(cli.tolerance);

    // A left-handed model is rewritten in place; the solver needs the
    // numbering of the rewritten patches, so they are dumped alongside it.
    if model.enforce_right_hand_system() {
        eprintln!("warning: model reparameterized to a strict right-hand system");
        eprintln!("         rewritten patches stored in \"reparameterized.g2\"");
        let mut out =
            fs::File::create("reparameterized.g2").context("writing reparameterized.g2")?;
        model.write(&mut out)?;
    }

    model.build_topology().context("stitching topology")?;

    if cli.verbose {
        if let Some(topo) = model.topology() {
            println!("Total number of vertices: {}", topo.num_vertices());
            println!(
                "Total number of lines   : {} ({} non-degenerate)",
                topo.num_lines(),
                topo.num_nondegenerate_lines()
            );
            println!(
                "Total number of faces   : {} ({} non-degenerate)",
                topo.num_faces(),
                topo.num_nondegenerate_faces()
            );
            if model.is_volumetric() {
                println!("Total number of volumes : {}", topo.num_volumes());
            } else {
                println!("Total number of patches : {}", topo.num_surface_patches());
            }
        }
    }

    let numbering = model.generate_global_numbers()?;
    let mut gno = fs::File::create(&cli.output)
        .with_context(|| format!("writing numbering file \"{}\"", cli.output.display()))?;
    numbering.write_gno(&mut gno)?;
    if cli.verbose {
        println!(
            "Numbering written to \"{}\" ({} indices)",
            cli.output.display(),
            numbering.total()
        );
    }

    if let Some(path) = &cli.props {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading property file \"{}\"", path.display()))?;
        model.read_properties(&text)?;
    } else {
        read_properties_interactive(&mut model)?;
    }

    model.write_properties(&mut io::stdout())?;
    Ok(())
}

/// Prompt for property records on standard input until a blank line or EOF.
fn read_properties_interactive(model: &mut SplineModel) -> Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            break;
        }
        model.read_properties(&line)?;
    }
    Ok(())
}
