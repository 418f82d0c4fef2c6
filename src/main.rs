use clap::{Parser, Subcommand};
use pocket_gal::gallery::{Gallery, Prompter};
use pocket_gal::ingest;
use pocket_gal::reorder::DropOutcome;
use pocket_gal::viewer::Key;
use pocket_gal::{config, output};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Shared flag for commands that can insert after a tile.
#[derive(clap::Args, Clone)]
struct InsertArgs {
    /// Insert the batch right after the tile at this position (as listed)
    #[arg(long, value_name = "N")]
    after: Option<usize>,
}

#[derive(Parser)]
#[command(name = "pocket-gal")]
#[command(about = "A small, ordered, persistent image gallery")]
#[command(long_about = "\
A small, ordered, persistent image gallery

Images are added from local files, folders or URLs, kept in the order you
give them, captioned, reordered and browsed one at a time. The gallery is
stored as a single JSON record in the data directory.

Data directory:

  .pocket-gal/
  ├── pocket-gal.toml     # Optional config (see 'pocket-gal gen-config')
  └── galleryImages.json  # The gallery record

Local files larger than the configured limit (10 MB by default) or that
are not images are skipped.")]
#[command(version)]
struct Cli {
    /// Directory holding the gallery record and config
    #[arg(long, default_value = ".pocket-gal", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the gallery
    List,
    /// Add image files as one batch
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        insert: InsertArgs,
    },
    /// Add every image in a folder as one batch
    AddFolder {
        dir: PathBuf,
        #[command(flatten)]
        insert: InsertArgs,
    },
    /// Append an image by URL
    AddUrl { url: String },
    /// Move an entry onto another entry's tile
    Move { dragged: String, target: String },
    /// Set an entry's caption
    Caption { id: String, text: String },
    /// Delete an entry
    Delete {
        id: String,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Browse the gallery one image at a time (n: next, p: previous, q: quit)
    View {
        /// Position to start at (as listed)
        #[arg(default_value_t = 1)]
        index: usize,
    },
    /// Capture an image from a camera
    Camera,
    /// Print a stock pocket-gal.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    std::fs::create_dir_all(&cli.data_dir)?;
    let assume_yes = matches!(cli.command, Command::Delete { yes: true, .. });

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_ingest_event(&event) {
                println!("{}", line);
            }
        }
    });

    let (mut gallery, config) = Gallery::open(
        &cli.data_dir,
        Box::new(output::TextRenderer),
        Box::new(StdinPrompter { assume_yes }),
        Some(tx),
    )?;
    init_thread_pool(&config.ingest);

    let result = run(&mut gallery, cli.command);
    drop(gallery);
    printer.join().ok();
    result
}

fn run<S, R, P>(gallery: &mut Gallery<S, R, P>, command: Command) -> Result<(), Box<dyn std::error::Error>>
where
    S: pocket_gal::store::KeyValueStore,
    R: pocket_gal::ingest::SourceReader,
    P: pocket_gal::ingest::UrlProbe,
{
    match command {
        Command::List => gallery.render(),
        Command::Add { files, insert } => {
            request_position(gallery, &insert)?;
            if let Some(report) = gallery.add_files(ingest::local_files(&files))? {
                output::print_ingest_report(&report);
            }
        }
        Command::AddFolder { dir, insert } => {
            request_position(gallery, &insert)?;
            if let Some(report) = gallery.add_folder(&dir)? {
                output::print_ingest_report(&report);
            }
        }
        Command::AddUrl { url } => {
            if let Some(report) = gallery.add_url(&url)? {
                output::print_ingest_report(&report);
            }
        }
        Command::Move { dragged, target } => match gallery.move_entry(&dragged, &target)? {
            DropOutcome::Moved { from, to } => println!("Moved {:0>3} → {:0>3}", from + 1, to + 1),
            DropOutcome::DroppedOnSelf => println!("Nothing to move"),
            DropOutcome::Stale | DropOutcome::NoDrag => {
                return Err(format!("no entry with id {dragged} or {target}").into());
            }
        },
        Command::Caption { id, text } => {
            if gallery.caption(&id, &text)?.is_none() {
                return Err(format!("no entry with id {id}").into());
            }
        }
        Command::Delete { id, .. } => {
            if !gallery.collection().contains(&id) {
                return Err(format!("no entry with id {id}").into());
            }
            if !gallery.delete(&id)? {
                println!("Nothing deleted");
            }
        }
        Command::View { index } => {
            if !index
                .checked_sub(1)
                .is_some_and(|i| gallery.open_viewer(i))
            {
                return Err(format!("no image at position {index}").into());
            }
            browse(gallery)?;
        }
        Command::Camera => {
            gallery.camera_upload()?;
        }
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }
    Ok(())
}

/// Point the pending insert position after the listed tile `--after N`.
fn request_position<S, R, P>(
    gallery: &mut Gallery<S, R, P>,
    insert: &InsertArgs,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: pocket_gal::store::KeyValueStore,
    R: pocket_gal::ingest::SourceReader,
    P: pocket_gal::ingest::UrlProbe,
{
    let Some(n) = insert.after else {
        return Ok(());
    };
    if n.checked_sub(1)
        .is_some_and(|i| gallery.request_insert_after(i))
    {
        Ok(())
    } else {
        Err(format!("no tile at position {n}").into())
    }
}

/// Read viewer commands from stdin until the viewer closes.
fn browse<S, R, P>(gallery: &mut Gallery<S, R, P>) -> Result<(), Box<dyn std::error::Error>>
where
    S: pocket_gal::store::KeyValueStore,
    R: pocket_gal::ingest::SourceReader,
    P: pocket_gal::ingest::UrlProbe,
{
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while gallery.viewer().is_open() {
        let key = match lines.next().transpose()? {
            None => Key::Escape,
            Some(line) => match line.trim() {
                "n" | "l" => Key::ArrowRight,
                "p" | "h" => Key::ArrowLeft,
                "q" => Key::Escape,
                _ => Key::Other,
            },
        };
        gallery.key(key)?;
    }
    Ok(())
}

/// Questions answered on the terminal.
struct StdinPrompter {
    assume_yes: bool,
}

impl StdinPrompter {
    fn read_answer(message: &str) -> Option<String> {
        print!("{} ", message);
        io::stdout().flush().ok()?;
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Prompter for StdinPrompter {
    fn confirm(&mut self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        Self::read_answer(&format!("{message} [y/N]"))
            .is_some_and(|a| matches!(a.as_str(), "y" | "Y" | "yes"))
    }

    fn ask(&mut self, message: &str) -> Option<String> {
        Self::read_answer(message).filter(|a| !a.is_empty())
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Initialize the rayon thread pool based on ingest config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(ingest: &config::IngestConfig) {
    let threads = config::effective_threads(ingest);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
