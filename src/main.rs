use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use twig::areas::repository::Repository;
use twig::builders::{CheckoutBuilder, CommitBuilder, IndexBuilder};

#[derive(Parser)]
#[command(
    name = "twig",
    version = "0.1.0",
    about = "A minimal git working-tree synchronization engine",
    long_about = "Maintains a staged file index, writes content-addressed objects, \
    restores working-tree files from a revision, and decides which files are \
    excluded from version control via gitignore-style rules.",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "Initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<String>,
    },
    #[command(name = "add", about = "Stage files into the index")]
    Add {
        #[arg(required = true, help = "Files or directories to stage")]
        paths: Vec<PathBuf>,
    },
    #[command(name = "rm", about = "Remove files from the index")]
    Rm {
        #[arg(required = true, help = "Files to unstage")]
        paths: Vec<PathBuf>,
    },
    #[command(
        name = "mv",
        about = "Record a rename in the index",
        long_about = "Updates index bookkeeping for a rename the caller already performed on disk."
    )]
    Mv {
        #[arg(index = 1)]
        from: PathBuf,
        #[arg(index = 2)]
        to: PathBuf,
    },
    #[command(name = "commit", about = "Record a commit from the current index")]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "checkout",
        about = "Restore files from a revision",
        long_about = "Restores the listed files from the given revision into the working tree, \
        optionally keeping displaced files as .orig backups."
    )]
    Checkout {
        #[arg(index = 1, help = "The revision to restore from")]
        revision: String,
        #[arg(index = 2, required = true, help = "Files to restore")]
        paths: Vec<PathBuf>,
        #[arg(short, long, help = "Keep displaced files as .orig backups")]
        backup: bool,
    },
    #[command(
        name = "check-ignore",
        about = "Report which of the given paths are excluded"
    )]
    CheckIgnore {
        #[arg(required = true, help = "Paths to test against the exclusion rules")]
        paths: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path } => {
            let path = PathBuf::from(path.unwrap_or_else(|| ".".to_string()));
            let repository = Repository::open(&path)?;
            repository.init()?;
            println!(
                "Initialized empty repository in {}",
                repository.path().display()
            );
        }
        Commands::Add { paths } => {
            let repository = Repository::open(std::path::Path::new("."))?;
            IndexBuilder::new(&repository).add_all(paths).write()?;
        }
        Commands::Rm { paths } => {
            let repository = Repository::open(std::path::Path::new("."))?;
            IndexBuilder::new(&repository).delete_all(paths).write()?;
        }
        Commands::Mv { from, to } => {
            let repository = Repository::open(std::path::Path::new("."))?;
            IndexBuilder::new(&repository).move_file(from, to).write()?;
        }
        Commands::Commit { message } => {
            let repository = Repository::open(std::path::Path::new("."))?;
            CommitBuilder::new(&repository)
                .message(message)
                .log(Box::new(std::io::stdout()))
                .write()?;
        }
        Commands::Checkout {
            revision,
            paths,
            backup,
        } => {
            let repository = Repository::open(std::path::Path::new("."))?;
            CheckoutBuilder::new(&repository)
                .revision(&revision)?
                .files(paths.into_iter().map(|path| (path.clone(), path)))?
                .backup(backup)
                .checkout()?;
            println!("{}", format!("Restored files from {}", revision).green());
        }
        Commands::CheckIgnore { paths } => {
            let repository = Repository::open(std::path::Path::new("."))?;
            for path in paths {
                if repository.excludes().is_excluded(&path) {
                    println!("{}", path.display());
                }
            }
        }
    }

    Ok(())
}
