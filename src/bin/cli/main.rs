//! CLI tool for rezip archive operations.

mod commands;
mod exit_codes;
mod output;

use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use exit_codes::ExitCode;

/// In-place ZIP archive tool
#[derive(Parser)]
#[command(name = "rezip")]
#[command(author, version, about = "In-place ZIP archive tool", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress result output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Do not take the `<archive>.lock` file while mutating
    #[arg(long, env = "REZIP_NO_LOCK", global = true)]
    no_lock: bool,

    /// Keep `<archive>.tmp` when a mutation fails
    #[arg(long, global = true)]
    keep_temp: bool,

    /// Copy unchanged entries without recompressing them
    #[arg(long, global = true)]
    raw: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an archive holding one file (alias: createzip)
    #[command(alias = "createzip")]
    Create {
        /// Archive file to create (replaced if it exists)
        archive: PathBuf,

        /// File to store under its base name
        file: PathBuf,
    },

    /// Append a file to an archive (alias: addtozip)
    #[command(alias = "addtozip")]
    Add {
        /// Archive to modify
        archive: PathBuf,

        /// File to append under its base name
        file: PathBuf,

        /// Replace an existing entry with the same name instead of failing
        #[arg(long)]
        replace_existing: bool,
    },

    /// Remove an entry from an archive (alias: removefromzip)
    #[command(alias = "removefromzip")]
    Remove {
        /// Archive to modify
        archive: PathBuf,

        /// Entry name to remove
        name: String,

        /// Fail if the entry does not exist
        #[arg(long)]
        strict: bool,
    },

    /// Replace the contents of an entry, keeping its position
    Replace {
        /// Archive to modify
        archive: PathBuf,

        /// Entry name to replace
        name: String,

        /// File holding the new contents
        file: PathBuf,

        /// Fail if the entry does not exist
        #[arg(long)]
        strict: bool,
    },

    /// Unpack an archive into a directory (aliases: unzip, x)
    #[command(alias = "unzip", alias = "x")]
    Unpack {
        /// Archive to unpack
        archive: PathBuf,

        /// Output directory
        #[arg(short = 'o', long, default_value = ".")]
        output: PathBuf,

        /// What to do with files that already exist
        #[arg(long, value_enum, default_value = "always")]
        overwrite: OverwriteMode,

        /// Entry name validation
        #[arg(long, value_enum, default_value = "strict", env = "REZIP_PATH_SAFETY")]
        path_safety: PathSafetyMode,
    },

    /// List archive contents (alias: l)
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Show compressed size and CRC
        #[arg(long)]
        technical: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OverwriteMode {
    Always,
    Never,
    Error,
}

impl From<OverwriteMode> for rezip::OverwritePolicy {
    fn from(mode: OverwriteMode) -> Self {
        match mode {
            OverwriteMode::Always => rezip::OverwritePolicy::Overwrite,
            OverwriteMode::Never => rezip::OverwritePolicy::Skip,
            OverwriteMode::Error => rezip::OverwritePolicy::Error,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum PathSafetyMode {
    Strict,
    Relaxed,
    Disabled,
}

impl From<PathSafetyMode> for rezip::PathSafety {
    fn from(mode: PathSafetyMode) -> Self {
        match mode {
            PathSafetyMode::Strict => rezip::PathSafety::Strict,
            PathSafetyMode::Relaxed => rezip::PathSafety::Relaxed,
            PathSafetyMode::Disabled => rezip::PathSafety::Disabled,
        }
    }
}

impl Cli {
    /// Mutation options from the global flags.
    fn mutate_options(&self) -> rezip::MutateOptions {
        rezip::MutateOptions::new()
            .lock(if self.no_lock {
                rezip::LockPolicy::None
            } else {
                rezip::LockPolicy::LockFile
            })
            .copy_mode(if self.raw {
                rezip::CopyMode::Raw
            } else {
                rezip::CopyMode::Stream
            })
            .keep_temp_on_failure(self.keep_temp)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = cli.mutate_options();
    let out = commands::Output {
        format: cli.format,
        quiet: cli.quiet,
    };

    let exit_code = match cli.command {
        Commands::Create { archive, file } => commands::create(&archive, &file, &options, &out),

        Commands::Add {
            archive,
            file,
            replace_existing,
        } => {
            let options = if replace_existing {
                options.on_duplicate(rezip::DuplicatePolicy::Replace)
            } else {
                options
            };
            commands::add(&archive, &file, &options, &out)
        }

        Commands::Remove {
            archive,
            name,
            strict,
        } => commands::remove(&archive, &name, &commands::missing(options, strict), &out),

        Commands::Replace {
            archive,
            name,
            file,
            strict,
        } => commands::replace(
            &archive,
            &name,
            &file,
            &commands::missing(options, strict),
            &out,
        ),

        Commands::Unpack {
            archive,
            output,
            overwrite,
            path_safety,
        } => {
            let options = rezip::UnpackOptions::new()
                .overwrite(overwrite.into())
                .path_safety(path_safety.into());
            commands::unpack(&archive, &output, &options, &out)
        }

        Commands::List { archive, technical } => commands::list(&archive, technical, &out),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_legacy_aliases() {
        for args in [
            ["rezip", "createzip", "a.zip", "x.txt"].as_slice(),
            &["rezip", "addtozip", "a.zip", "y.txt"],
            &["rezip", "removefromzip", "a.zip", "x.txt"],
            &["rezip", "unzip", "a.zip"],
            &["rezip", "x", "a.zip", "-o", "out"],
            &["rezip", "l", "a.zip"],
        ] {
            assert!(Cli::try_parse_from(args).is_ok(), "{args:?}");
        }
    }

    #[test]
    fn test_global_flags_map_to_options() {
        let cli = Cli::try_parse_from(["rezip", "add", "a.zip", "y.txt", "--no-lock", "--raw"]).unwrap();
        let options = cli.mutate_options();
        assert_eq!(options.lock, rezip::LockPolicy::None);
        assert_eq!(options.copy_mode, rezip::CopyMode::Raw);
        assert!(!options.keep_temp_on_failure);
    }
}
