use clap::{Parser, Subcommand};
use shutterbox::config::AppConfig;
use shutterbox::export::ExportRequest;
use shutterbox::ledger::Ledger;
use shutterbox::store::{GallerySource, Store};
use shutterbox::{export, output, themes};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shutterbox")]
#[command(about = "Photo gallery organizer with static site export")]
#[command(long_about = "\
Photo gallery organizer with static site export

Galleries, image metadata, and watermark settings live in a single SQLite
database inside the data directory. Image files are stored per gallery:

  <data-dir>/
  ├── shutterbox.toml              # Optional config (db/storage/exports paths)
  ├── shutterbox.db                # Galleries, images, settings, export ledger
  ├── storage/
  │   ├── gallery_1/
  │   │   ├── 001-dawn.jpg
  │   │   └── 002-dusk.jpg
  │   └── gallery_2/
  │       └── rome.jpg
  └── exports/
      └── gallery_export_20260825_143012.tar.gz

'export' turns a selection of galleries into a themed, self-contained
static site packaged as one .tar.gz archive, optionally stamping a text
watermark on every image. Every export is recorded in a ledger you can
list, delete from, and reconcile against the exports directory.")]
#[command(version)]
struct Cli {
    /// Data directory (database, image storage, exports)
    #[arg(long, default_value = ".", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage galleries
    Gallery {
        #[command(subcommand)]
        command: GalleryCommand,
    },
    /// Manage images within a gallery
    Image {
        #[command(subcommand)]
        command: ImageCommand,
    },
    /// Set a setting (watermark_enabled, watermark_text, ...)
    Set { key: String, value: String },
    /// Print a setting's current value
    Get { key: String },
    /// Export galleries as a packaged static site
    Export {
        /// Gallery ids to export, in page order (comma-separated or repeated)
        #[arg(long = "gallery", required = true, value_delimiter = ',')]
        galleries: Vec<i64>,
        /// Site title
        #[arg(long)]
        title: String,
        /// Site description (markdown)
        #[arg(long)]
        description: Option<String>,
        /// Theme name (unknown names fall back to the default)
        #[arg(long, default_value = themes::DEFAULT_THEME)]
        theme: String,
    },
    /// Inspect and maintain the export ledger
    Exports {
        #[command(subcommand)]
        command: ExportsCommand,
    },
}

#[derive(Subcommand)]
enum GalleryCommand {
    /// Create a gallery
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List galleries with their image counts
    List,
}

#[derive(Subcommand)]
enum ImageCommand {
    /// Copy an image file into a gallery's storage and register it
    Add {
        /// Gallery to add the image to
        #[arg(long = "gallery")]
        gallery_id: i64,
        /// Path to the image file to import
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        camera: Option<String>,
        #[arg(long)]
        lens: Option<String>,
        /// Exposure settings, e.g. "f/8 1/250s ISO 200"
        #[arg(long)]
        settings: Option<String>,
        /// Position within the gallery (lower sorts first)
        #[arg(long = "sort", default_value_t = 0)]
        sort_key: i64,
        /// Register the image but leave it out of exports
        #[arg(long)]
        disabled: bool,
    },
    /// List a gallery's images in display order, disabled ones included
    List { gallery_id: i64 },
    /// Include an image in future exports
    Enable { image_id: i64 },
    /// Exclude an image from future exports without deleting it
    Disable { image_id: i64 },
    /// Change an image's position within its gallery
    Sort { image_id: i64, sort_key: i64 },
}

#[derive(Subcommand)]
enum ExportsCommand {
    /// List recorded exports, newest first
    List {
        /// Print records as JSON instead of the human-readable listing
        #[arg(long)]
        json: bool,
    },
    /// Delete an export: its archive file and its record
    Delete { id: i64 },
    /// Align the ledger with the exports directory
    Reconcile,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    std::fs::create_dir_all(&cli.data_dir)?;
    let config = AppConfig::load(&cli.data_dir)?;
    let store = Store::open(&config.db_path)?;

    match cli.command {
        Command::Gallery { command } => match command {
            GalleryCommand::Add { title, description } => {
                let id = store.add_gallery(&title, description.as_deref())?;
                println!("Created gallery #{id} {title}");
            }
            GalleryCommand::List => {
                let mut listed = Vec::new();
                for gallery in store.galleries()? {
                    let count = store.images(gallery.id)?.len();
                    listed.push((gallery, count));
                }
                output::print_gallery_list(&listed);
            }
        },
        Command::Image { command } => match command {
            ImageCommand::Add {
                gallery_id,
                file,
                title,
                description,
                camera,
                lens,
                settings,
                sort_key,
                disabled,
            } => {
                let filename = file
                    .file_name()
                    .ok_or("image path has no filename")?
                    .to_string_lossy()
                    .into_owned();
                let id = store.add_image(
                    gallery_id,
                    &filename,
                    title.as_deref(),
                    description.as_deref(),
                    camera.as_deref(),
                    lens.as_deref(),
                    settings.as_deref(),
                    sort_key,
                    !disabled,
                )?;
                let dest_dir = config.gallery_dir(gallery_id);
                std::fs::create_dir_all(&dest_dir)?;
                std::fs::copy(&file, dest_dir.join(&filename))?;
                println!("Added image #{id} {filename} to gallery #{gallery_id}");
            }
            ImageCommand::List { gallery_id } => {
                if store.gallery(gallery_id)?.is_none() {
                    return Err(format!("gallery {gallery_id} not found").into());
                }
                output::print_image_list(&store.images(gallery_id)?);
            }
            ImageCommand::Enable { image_id } => {
                store.set_image_enabled(image_id, true)?;
                println!("Enabled image #{image_id}");
            }
            ImageCommand::Disable { image_id } => {
                store.set_image_enabled(image_id, false)?;
                println!("Disabled image #{image_id}");
            }
            ImageCommand::Sort { image_id, sort_key } => {
                store.set_image_sort_key(image_id, sort_key)?;
                println!("Moved image #{image_id} to position {sort_key}");
            }
        },
        Command::Set { key, value } => {
            store.set_setting(&key, &value)?;
            println!("{key} = {value}");
        }
        Command::Get { key } => match store.setting(&key)? {
            Some(value) => println!("{value}"),
            None => println!("{key} is not set"),
        },
        Command::Export {
            galleries,
            title,
            description,
            theme,
        } => {
            let ledger = Ledger::open(&config.db_path)?;
            let watermark_config = store.watermark_config()?;
            let request = ExportRequest {
                gallery_ids: galleries,
                title,
                description,
                theme,
            };
            let outcome = export::run(
                &store,
                &ledger,
                &request,
                &watermark_config,
                &config.storage_dir,
                &config.exports_dir,
            )?;
            output::print_export_outcome(&outcome);
        }
        Command::Exports { command } => {
            let ledger = Ledger::open(&config.db_path)?;
            match command {
                ExportsCommand::List { json } => {
                    let records = ledger.list()?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&records)?);
                    } else {
                        output::print_artifact_list(&records);
                    }
                }
                ExportsCommand::Delete { id } => {
                    if ledger.delete(id, &config.exports_dir)? {
                        println!("Deleted export #{id}");
                    } else {
                        return Err(format!("export {id} not found").into());
                    }
                }
                ExportsCommand::Reconcile => {
                    output::print_reconcile_report(&ledger.reconcile(&config.exports_dir)?);
                }
            }
        }
    }

    Ok(())
}
