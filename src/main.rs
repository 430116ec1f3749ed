use clap::{Parser, Subcommand};
use colored::Colorize;
use compose_sync::commands;
use compose_sync::commands::generate::GenerateOptions;
use compose_sync::commands::sync::SyncEdit;

#[derive(Parser)]
#[command(name = "compose-sync")]
#[command(about = "Parse, generate and edit Jetpack Compose source", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a .kt file (or every .kt file under a directory) and print its UI tree
    Parse {
        /// Path to a .kt file or directory (defaults to current directory)
        #[arg(default_value = ".")]
        target: String,
        /// Path to compose-sync.toml
        #[arg(long)]
        config: Option<String>,
    },
    /// Generate a composable from a TOML block tree
    Generate {
        /// Path to the block tree (.toml)
        blocks: String,
        /// Function name (default: GeneratedScreen)
        #[arg(long)]
        name: Option<String>,
        /// Package declaration for the generated file
        #[arg(long)]
        package: Option<String>,
        /// Omit the @Preview function
        #[arg(long)]
        no_preview: bool,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<String>,
        #[arg(long)]
        config: Option<String>,
    },
    /// Check brace/paren balance and @Composable presence
    Validate {
        /// Path to a .kt file
        file: String,
    },
    /// Apply one edit to a composable and show the diff
    Sync {
        /// Path to a .kt file
        file: String,
        /// Name of the composable function
        function: String,
        #[command(subcommand)]
        edit: SyncEdit,
        /// Write the result back instead of printing a diff
        #[arg(long, global = true)]
        write: bool,
        #[arg(long, global = true)]
        config: Option<String>,
    },
    /// Re-parse files as they change
    Watch {
        /// Path to a .kt file or directory (defaults to current directory)
        #[arg(default_value = ".")]
        target: String,
        #[arg(long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { target, config } => commands::parse::execute(&target, config.as_deref()),
        Commands::Generate { blocks, name, package, no_preview, output, config } => {
            let options = GenerateOptions {
                name: name.as_deref(),
                package: package.as_deref(),
                no_preview,
                output: output.as_deref(),
                config: config.as_deref(),
            };
            commands::generate::execute(&blocks, &options)
        }
        Commands::Validate { file } => commands::validate::execute(&file),
        Commands::Sync { file, function, edit, write, config } => {
            commands::sync::execute(&file, &function, &edit, write, config.as_deref())
        }
        Commands::Watch { target, config } => commands::watch::execute(&target, config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
