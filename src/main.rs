use amltex::{Archive, Config};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug)]
#[command(about = "Extract ETC1 textures from AML_Arciver archives")]
struct Arguments {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode every texture in an archive and save it as PNG
    Unpack {
        archive: PathBuf,

        #[command(flatten)]
        args: UnpackArgs,
    },

    /// List the entries of an archive together with their texture info
    Info { archive: PathBuf },

    /// Decode a standalone texture without texture info
    Raw {
        input: PathBuf,
        width: u32,
        height: u32,

        #[command(flatten)]
        args: RawArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct UnpackArgs {
    /// The output directory, defaults to `<archive>_unpack`
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Overwrite the output directory if it already exists
    #[arg(long)]
    force: bool,

    /// TOML file with decode and unpack settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reject entries whose texture info does not match the payload size
    #[arg(long)]
    strict: bool,

    /// Stop at the first entry that fails to decode
    #[arg(long)]
    fail_fast: bool,
}

#[derive(Args, Debug, Clone)]
struct RawArgs {
    /// The texture is ETC1A4 (ETC1 with 4 bit alpha)
    #[arg(short, long)]
    alpha: bool,

    /// The file is marker-escape compressed
    #[arg(short, long)]
    compressed: bool,

    /// The output PNG, defaults to `<input>.png`
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    colog::init();

    match args.command {
        Commands::Unpack { archive, args } => unpack(&archive, args),
        Commands::Info { archive } => info(&archive),
        Commands::Raw {
            input,
            width,
            height,
            args,
        } => raw(&input, width, height, args),
    }
}

fn read_archive(path: &Path) -> anyhow::Result<Vec<u8>> {
    let data =
        fs::read(path).with_context(|| format!("Failed to read archive {}", path.display()))?;
    log::info!(
        "Loaded archive '{}' with CRC: {:#010x}",
        path.display(),
        crc32fast::hash(&data)
    );

    Ok(data)
}

fn load_config(args: &UnpackArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            Config::parse(&source)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => Config::default(),
    };

    config.decode.strict_size |= args.strict;
    config.unpack.fail_fast |= args.fail_fast;

    Ok(config)
}

fn unpack(archive_path: &Path, args: UnpackArgs) -> anyhow::Result<()> {
    use indicatif::ProgressBar;

    let config = load_config(&args)?;

    let data = read_archive(archive_path)?;
    let archive = Archive::parse(&data)
        .with_context(|| format!("Failed to parse archive {}", archive_path.display()))?;
    log::info!("File count: {}", archive.len());

    let out_dir = args.out_dir.clone().unwrap_or_else(|| {
        let mut dir = archive_path.as_os_str().to_owned();
        dir.push("_unpack");
        dir.into()
    });

    if args.force && out_dir.exists() {
        fs::remove_dir_all(&out_dir).with_context(|| "Failed to clean up old output directory")?;
    }
    fs::create_dir_all(&out_dir).with_context(|| "Failed to create output directory")?;

    let progress = ProgressBar::new(archive.len() as u64);
    let report = amltex::unpack::unpack_entries(archive.entries(), &out_dir, &config, &progress)?;

    if report.mismatched() > 0 {
        log::warn!(
            "{} textures had a mismatched data size and were decoded anyway",
            report.mismatched()
        );
    }
    for (name, err) in report.failures {
        log::error!("{}: {:#}", name, anyhow::Error::new(err));
    }

    log::info!(
        "Done! Exported {} of {} textures to '{}'",
        report.exported.len(),
        archive.len(),
        out_dir.display()
    );

    Ok(())
}

fn info(archive_path: &Path) -> anyhow::Result<()> {
    let data = read_archive(archive_path)?;
    let archive = Archive::parse(&data)
        .with_context(|| format!("Failed to parse archive {}", archive_path.display()))?;

    println!("File count: {}", archive.len());
    for entry in archive.entries() {
        println!();
        println!("{} ({} bytes compressed)", entry.name(), entry.data.len());

        let decompressed = match amltex::decompress(entry.data) {
            Ok(decompressed) => decompressed,
            Err(err) => {
                log::error!("{}: {}", entry.name(), err);
                continue;
            }
        };
        println!(
            "Decompressed: {} bytes, CRC: {:#010x}",
            decompressed.len(),
            crc32fast::hash(&decompressed)
        );

        match amltex::TextureInfo::parse(&decompressed, None) {
            Ok(texture_info) => {
                println!("{}", texture_info);
                if let Err(mismatch) = texture_info.check_data_size(decompressed.len()) {
                    log::warn!("{}: {}", entry.name(), mismatch);
                }
            }
            Err(err) => log::error!("{}: {}", entry.name(), err),
        }
    }

    Ok(())
}

fn raw(input: &Path, width: u32, height: u32, args: RawArgs) -> anyhow::Result<()> {
    let data = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;

    let image = if args.compressed {
        amltex::decode_raw_compressed(&data, width, height, args.alpha)
    } else {
        amltex::decode_raw(&data, width, height, args.alpha)
    }
    .with_context(|| format!("Failed to decode {}", input.display()))?;

    let output = args.output.unwrap_or_else(|| {
        let mut path = input.as_os_str().to_owned();
        path.push(".png");
        path.into()
    });

    image
        .save(&output)
        .with_context(|| format!("Failed to save {}", output.display()))?;
    log::info!("Exported texture: {}", output.display());

    Ok(())
}
