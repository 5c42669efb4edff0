use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thumbnail_works::config;
use thumbnail_works::imaging::RustProcessor;
use thumbnail_works::storage::{FileSystemStorage, Storage};
use thumbnail_works::types::{ImageSummary, ThumbnailSummary};
use thumbnail_works::{ImageField, SourceImage};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "thumbnail-works")]
#[command(about = "Store images and manage their thumbnails")]
#[command(long_about = "\
Store images and manage their thumbnails

Images live under a storage root. Every thumbnail declared in the field
config is stored next to its source, in a subdirectory:

  media/
  ├── photos/
  │   ├── cat.jpeg                 # Source image
  │   └── thumbs/                  # settings.dirname
  │       ├── cat.jpeg.small.jpeg  # <source file>.<identifier>.<ext>
  │       └── cat.jpeg.big.jpeg
  └── avatar.png

With settings.delayed_generation = true (the default), 'save' stores only
the source and each thumbnail is generated the first time it is shown.

Run 'thumbnail-works gen-config' to generate a documented thumbnails.toml.")]
#[command(version)]
struct Cli {
    /// Storage root directory
    #[arg(long, default_value = "media", global = true)]
    storage: PathBuf,

    /// Field config with settings and thumbnail definitions
    #[arg(long, default_value = "thumbnails.toml", global = true)]
    config: PathBuf,

    /// Threads used to render thumbnails (default: all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store an image file and generate its thumbnails
    Save {
        /// Local image file to store
        file: PathBuf,
        /// Storage name (default: the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Print a stored image as JSON, or one thumbnail (generated if missing)
    Show {
        name: String,
        identifier: Option<String>,
    },
    /// Delete a stored image and all its thumbnails
    Delete { name: String },
    /// Remove thumbnails whose source image is gone
    Sweep,
    /// Print a stock thumbnails.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    init_thread_pool(cli.threads);
    let storage = Arc::new(FileSystemStorage::new(&cli.storage));

    match cli.command {
        Command::Save { file, name } => {
            let field = load_field(&cli.config, &storage)?;
            let name = match name {
                Some(name) => name,
                None => file_name(&file)?,
            };
            let content = std::fs::read(&file)?;
            let mut image = field.new_image();
            image.save(&name, &content)?;
            print_json(&ImageSummary::from_source(&image)?)?;
        }
        Command::Show { name, identifier } => {
            let field = load_field(&cli.config, &storage)?;
            let image = open_existing(&field, &storage, &name)?;
            match identifier {
                Some(identifier) => {
                    let record = image.get(&identifier)?;
                    print_json(&ThumbnailSummary::from_record(&record)?)?;
                }
                None => print_json(&ImageSummary::from_source(&image)?)?,
            }
        }
        Command::Delete { name } => {
            let field = load_field(&cli.config, &storage)?;
            let mut image = open_existing(&field, &storage, &name)?;
            image.delete()?;
            println!("Deleted {name}");
        }
        Command::Sweep => {
            let field = load_field(&cli.config, &storage)?;
            let identifiers: Vec<&str> = field.thumbnails().keys().map(String::as_str).collect();
            let removed = storage.sweep_orphans(&field.settings().dirname, &identifiers)?;
            for path in &removed {
                println!("{path}");
            }
            println!("Removed {} orphaned thumbnail(s)", removed.len());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the default `info` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize the rayon thread pool used for eager rendering.
///
/// Caps at the number of available CPU cores.
fn init_thread_pool(threads: Option<usize>) {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let threads = threads.map_or(cores, |t| t.clamp(1, cores));
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn load_field(
    config_path: &Path,
    storage: &Arc<FileSystemStorage>,
) -> Result<Arc<ImageField>, Box<dyn std::error::Error>> {
    let field_config = config::load_config(config_path)?;
    Ok(ImageField::from_config(
        &field_config,
        storage.clone(),
        Arc::new(RustProcessor::new()),
    )?)
}

fn open_existing(
    field: &Arc<ImageField>,
    storage: &FileSystemStorage,
    name: &str,
) -> Result<SourceImage, Box<dyn std::error::Error>> {
    if !storage.exists(name)? {
        return Err(format!("no stored image named \"{name}\"").into());
    }
    Ok(field.open(name)?)
}

fn file_name(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("cannot derive a storage name from {}", path.display()).into())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
