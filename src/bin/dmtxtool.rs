use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rust_dmtx::tools::{load_image, module_grid_ascii, save_image};
use rust_dmtx::{
    DecodeOptions, EncodeOptions, Scheme, SizeRequest, decode, decode_mosaic, encode,
    encode_codewords, encode_modules, encode_mosaic,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "dmtxtool", version, about = "Data Matrix encode/decode tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a message into a PNG or BMP image
    Encode {
        /// Message to encode
        message: String,
        /// Output image (.png or .bmp)
        #[arg(long, short)]
        out: PathBuf,
        /// Compaction scheme: ascii, c40, text, x12, edifact, base256, auto, gs1
        #[arg(long, default_value = "ascii")]
        scheme: Scheme,
        /// Symbol size: square, rect, auto or ROWSxCOLS
        #[arg(long, default_value = "square")]
        size: SizeRequest,
        /// Pixels per module
        #[arg(long, default_value_t = 5)]
        module: usize,
        /// Quiet zone in pixels
        #[arg(long, default_value_t = 10)]
        margin: usize,
        /// Encode as a three-layer colour mosaic
        #[arg(long)]
        mosaic: bool,
    },
    /// Decode every symbol found in an image
    Decode {
        image: PathBuf,
        /// Decode colour mosaic symbols
        #[arg(long)]
        mosaic: bool,
        /// Expected symbol size: auto, square, rect or ROWSxCOLS
        #[arg(long, default_value = "auto")]
        size: SizeRequest,
        /// Stop after this many symbols
        #[arg(long)]
        max_results: Option<usize>,
        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Shrink factor applied before scanning
        #[arg(long, default_value_t = 1)]
        shrink: i32,
    },
    /// Print codewords and the module layout for a message
    Inspect {
        message: String,
        #[arg(long, default_value = "ascii")]
        scheme: Scheme,
        #[arg(long, default_value = "square")]
        size: SizeRequest,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Encode {
            message,
            out,
            scheme,
            size,
            module,
            margin,
            mosaic,
        } => {
            let options = EncodeOptions::default()
                .with_scheme(scheme)
                .with_size_request(size)
                .with_module_size(module, margin);
            encode_cmd(message.as_bytes(), &out, &options, mosaic)
        }
        Command::Decode {
            image,
            mosaic,
            size,
            max_results,
            timeout_ms,
            shrink,
        } => {
            let mut options = DecodeOptions::default()
                .with_size_request(size)
                .with_scale(shrink);
            if let Some(max_results) = max_results {
                options = options.with_max_results(max_results);
            }
            if let Some(timeout_ms) = timeout_ms {
                options = options.with_timeout(Duration::from_millis(timeout_ms));
            }
            decode_cmd(&image, &options, mosaic)
        }
        Command::Inspect {
            message,
            scheme,
            size,
        } => inspect_cmd(message.as_bytes(), scheme, size),
    }
}

fn encode_cmd(data: &[u8], out: &Path, options: &EncodeOptions, mosaic: bool) -> Result<()> {
    let symbol = if mosaic {
        encode_mosaic(data, options)
    } else {
        encode(data, options)
    }
    .context("encoding failed")?;

    save_image(&symbol, out)?;
    println!(
        "Wrote {} ({} symbol, {} codewords, {}x{} px)",
        out.display(),
        symbol.size,
        symbol.codewords.len(),
        symbol.image.width(),
        symbol.image.height()
    );
    Ok(())
}

fn decode_cmd(path: &Path, options: &DecodeOptions, mosaic: bool) -> Result<()> {
    let buffer = load_image(path)?;
    let view = buffer.view();

    let start = Instant::now();
    let results = if mosaic {
        decode_mosaic(&view, options)
    } else {
        decode(&view, options)
    }
    .with_context(|| format!("decoding {} failed", path.display()))?;
    let elapsed = start.elapsed();

    println!(
        "Image: {} ({}x{})",
        path.display(),
        buffer.width(),
        buffer.height()
    );
    println!("Found {} symbols in {:.1?}", results.len(), elapsed);
    for (i, message) in results.iter().enumerate() {
        println!("  {}: {}", i, String::from_utf8_lossy(message));
    }

    if results.is_empty() {
        bail!("no symbol found");
    }
    Ok(())
}

fn inspect_cmd(data: &[u8], scheme: Scheme, size: SizeRequest) -> Result<()> {
    let (symbol_size, codewords) =
        encode_codewords(data, scheme, size).context("encoding failed")?;
    let options = EncodeOptions::default()
        .with_scheme(scheme)
        .with_size_request(size);
    let grid = encode_modules(data, &options)?;

    println!("Scheme:     {scheme}");
    println!("Size:       {symbol_size}");
    println!(
        "Codewords:  {} data + {} error",
        symbol_size.data_words(),
        symbol_size.error_words()
    );
    println!("{codewords:?}");
    println!();
    print!("{}", module_grid_ascii(&grid));
    Ok(())
}
