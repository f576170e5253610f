//! xml2csv CLI: convert XML files from the shell or serve the upload page.

mod browser;
mod server;

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Read, Write};
use tracing_subscriber::{fmt, EnvFilter};
use xml2csv_core::config::{ConvertConfig, ServeConfig};
use xml2csv_core::summary::ConvertSummary;
use xml2csv_io::{SpreadsheetWriter, StreamingRowConverter};

#[derive(Parser)]
#[command(name = "xml2csv")]
#[command(about = "Turn repeated XML elements into CSV rows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one XML document to CSV
    Convert {
        /// Input XML file (`-` for stdin)
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Output CSV file (`-` for stdout)
        #[arg(short, long, default_value = "-")]
        output: String,

        /// Element name that marks one row (overrides config)
        #[arg(short, long)]
        row_tag: Option<String>,

        /// Input buffer size in bytes (overrides config)
        #[arg(long)]
        read_buffer_bytes: Option<usize>,

        /// Prefix a UTF-8 BOM and use CRLF line endings for Excel
        #[arg(long)]
        excel: bool,
    },

    /// Serve the upload page and conversion endpoint over HTTP
    Serve {
        /// Interface to listen on (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// HTTP port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Open the upload page in the default browser on start
        #[arg(long)]
        open_browser: bool,

        /// Maximum upload size in bytes (overrides config)
        #[arg(long)]
        max_upload_bytes: Option<usize>,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            output,
            row_tag,
            read_buffer_bytes,
            excel,
        } => {
            let mut config = ConvertConfig::from_env();
            apply_convert_overrides(&mut config, row_tag, read_buffer_bytes);
            if let Err(e) = run_convert(&input, &output, config, excel) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Serve {
            host,
            port,
            open_browser,
            max_upload_bytes,
        } => {
            let mut config = ServeConfig::from_env();
            apply_serve_overrides(&mut config, host, port, open_browser, max_upload_bytes);
            if let Err(e) = run_serve(config) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn init_logging() {
    // stdout may carry CSV, so logs go to stderr
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();
}

fn run_convert(
    input: &str,
    output: &str,
    config: ConvertConfig,
    excel: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn Read> = if input == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(input)?)
    };
    let mut writer: Box<dyn Write> = if output == "-" {
        Box::new(io::stdout().lock())
    } else {
        Box::new(File::create(output)?)
    };
    if excel {
        writer = Box::new(SpreadsheetWriter::with_bom(writer)?);
    }

    let converter = StreamingRowConverter::new(config.clone());
    let summary = converter.convert(reader, writer)?;

    eprintln!("{}", describe_summary(&summary, &config.row_tag));
    if summary.rows_skipped > 0 {
        eprintln!("  Skipped {} empty row element(s)", summary.rows_skipped);
    }
    Ok(())
}

fn describe_summary(summary: &ConvertSummary, row_tag: &str) -> String {
    if summary.is_empty() {
        return format!("✓ no <{row_tag}> rows with columns found; output is empty");
    }
    format!(
        "✓ {} rows, {} columns, {} bytes",
        summary.rows_written,
        summary.columns.len(),
        summary.bytes_written
    )
}

fn run_serve(config: ServeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::run(config))
}

fn apply_convert_overrides(
    cfg: &mut ConvertConfig,
    row_tag: Option<String>,
    read_buffer_bytes: Option<usize>,
) {
    if let Some(tag) = row_tag {
        *cfg = cfg.clone().with_row_tag(tag);
    }
    if let Some(bytes) = read_buffer_bytes {
        *cfg = cfg.clone().with_read_buffer_bytes(bytes);
    }
}

fn apply_serve_overrides(
    cfg: &mut ServeConfig,
    host: Option<String>,
    port: Option<u16>,
    open_browser: bool,
    max_upload_bytes: Option<usize>,
) {
    if let Some(host) = host {
        cfg.host = host;
    }
    if let Some(port) = port {
        cfg.port = port;
    }
    if open_browser {
        cfg.open_browser = true;
    }
    if let Some(max) = max_upload_bytes {
        cfg.max_upload_bytes = max;
    }
}
