use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use std::process::{exit, Command};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "stage_sync_lambda";
const LAMBDA_BIN: &str = "sync_lambda";

#[derive(Parser)]
#[command(name = "xtask", about = "Task runner for the stage sync workspace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI jobs
    Ci {
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Cross-compile the sync Lambda and zip it as `bootstrap`
    LambdaPackage {
        /// Target triple; must be installed with `rustup target add`
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        #[arg(long, default_value = "dist")]
        dist_dir: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// fmt, clippy and tests
    Check,
    /// Release build of the Lambda binary for the host
    Package,
    All,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Ci { job } => run_ci(job),
        Commands::LambdaPackage { target, dist_dir } => package_lambda(&target, &dist_dir),
    };
    if let Err(message) = result {
        eprintln!("xtask: {message}");
        exit(1);
    }
}

fn run_ci(job: CiJob) -> Result<(), String> {
    if matches!(job, CiJob::Check | CiJob::All) {
        cargo(&["fmt", "--all", "--", "--check"])?;
        cargo(&[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ])?;
        cargo(&["test", "--workspace"])?;
    }
    if matches!(job, CiJob::Package | CiJob::All) {
        cargo(&[
            "build",
            "--release",
            "-p",
            LAMBDA_PACKAGE,
            "--bin",
            LAMBDA_BIN,
        ])?;
    }
    Ok(())
}

fn package_lambda(target: &str, dist_dir: &Path) -> Result<(), String> {
    require_installed_target(target)?;
    cargo(&[
        "build",
        "--release",
        "-p",
        LAMBDA_PACKAGE,
        "--bin",
        LAMBDA_BIN,
        "--target",
        target,
    ])?;

    let binary_path = Path::new("target")
        .join(target)
        .join("release")
        .join(LAMBDA_BIN);
    let binary = fs::read(&binary_path)
        .map_err(|error| format!("cannot read {}: {error}", binary_path.display()))?;

    fs::create_dir_all(dist_dir)
        .map_err(|error| format!("cannot create {}: {error}", dist_dir.display()))?;
    let zip_path = dist_dir.join(format!("{LAMBDA_BIN}.zip"));
    let file = File::create(&zip_path)
        .map_err(|error| format!("cannot create {}: {error}", zip_path.display()))?;
    write_bootstrap_zip(&binary, file)?;

    println!("wrote {}", zip_path.display());
    Ok(())
}

fn require_installed_target(target: &str) -> Result<(), String> {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
        .map_err(|error| format!("rustup is required for --target {target}: {error}"))?;
    let installed = String::from_utf8_lossy(&output.stdout);
    if installed.lines().any(|line| line.trim() == target) {
        Ok(())
    } else {
        Err(format!(
            "target {target} is not installed; run `rustup target add {target}`"
        ))
    }
}

/// The `provided.al2023` runtime executes a file named `bootstrap` at the zip root.
fn write_bootstrap_zip(binary: &[u8], out: impl Write + Seek) -> Result<(), String> {
    let mut zip = ZipWriter::new(out);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .map_err(|error| format!("cannot start bootstrap entry: {error}"))?;
    zip.write_all(binary)
        .map_err(|error| format!("cannot write bootstrap entry: {error}"))?;
    zip.finish()
        .map_err(|error| format!("cannot finish zip: {error}"))?;
    Ok(())
}

fn cargo(args: &[&str]) -> Result<(), String> {
    println!("$ cargo {}", args.join(" "));
    let status = Command::new(env!("CARGO"))
        .args(args)
        .status()
        .map_err(|error| format!("cannot run cargo: {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("`cargo {}` failed with {status}", args.join(" ")))
    }
}
