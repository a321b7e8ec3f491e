use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use json2excel::convert::{convert_json_to_excel, excel_path_for};
use json2excel::flatten::DEFAULT_SHEET_NAME;
use json2excel::web::{self, ServerConfig};
use json2excel::{Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose)?;
    match cli.command {
        Command::Convert(args) => execute_convert(args),
        Command::Serve(args) => execute_serve(args),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn execute_convert(args: ConvertArgs) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| excel_path_for(&args.input, None));
    let summary = convert_json_to_excel(&args.input, &output, &args.sheet_name)?;
    println!(
        "wrote {} rows x {} columns from {} groups to {}",
        summary.rows,
        summary.columns,
        summary.groups,
        summary.output.display()
    );
    Ok(())
}

fn execute_serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        bind: args.bind,
        upload_dir: args.upload_dir,
        processed_dir: args.processed_dir,
        sheet_name: args.sheet_name,
        max_upload_bytes: args.max_upload_bytes,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(web::serve(config))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Flatten JSON breach dumps into formatted Excel workbooks."
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a single JSON file into an Excel workbook.
    Convert(ConvertArgs),
    /// Run the upload/download web server.
    Serve(ServeArgs),
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Input JSON file path.
    #[arg(long)]
    input: PathBuf,

    /// Output workbook path. Defaults to the input path with an .xlsx extension.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Name of the worksheet holding the data.
    #[arg(long, default_value = DEFAULT_SHEET_NAME)]
    sheet_name: String,
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Directory receiving uploaded JSON files.
    #[arg(long, default_value = "uploads")]
    upload_dir: PathBuf,

    /// Directory receiving converted workbooks.
    #[arg(long, default_value = "processed")]
    processed_dir: PathBuf,

    /// Name of the worksheet holding the data.
    #[arg(long, default_value = DEFAULT_SHEET_NAME)]
    sheet_name: String,

    /// Largest accepted upload, in bytes.
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    max_upload_bytes: usize,
}
