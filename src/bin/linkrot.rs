use clap::{CommandFactory, Parser};
use linkrot::config::{CliConfig, Config};
use linkrot::core::constants::output_formats;
use linkrot::core::error::{LinkrotError, Result};
use linkrot::discovery::expand_root;
use linkrot::reporting::logging;
use linkrot::ui::ProgressReporter;
use linkrot::ui::completion::{install_completion, print_completions};
use linkrot::ui::output;
use linkrot::ui::{Cli, Commands, cli_to_config};

use std::path::Path;

/// No broken or undecided links
const EXIT_PASS: i32 = 0;
/// The report contains `BROKEN` or `ERROR` outcomes
const EXIT_FAILURES: i32 = 1;
/// The run could not be carried out
const EXIT_FATAL: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Handle completion commands first
    if let Some(exit_code) = handle_completion_commands(&cli) {
        std::process::exit(exit_code);
    }

    let Some(ref root) = cli.root else {
        eprintln!("Error: No root directory provided");
        eprintln!("\nFor more information, try '--help'.");
        std::process::exit(EXIT_FATAL);
    };

    match run_linkrot(&cli, Path::new(root)).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_FATAL);
        }
    }
}

/// Handle completion commands and return exit code if a completion command was processed
fn handle_completion_commands(cli: &Cli) -> Option<i32> {
    match cli.command {
        Some(Commands::CompletionGenerate { shell }) => {
            let mut app = Cli::command();
            print_completions(shell, &mut app);
            Some(EXIT_PASS)
        }
        Some(Commands::CompletionInstall { shell }) => match install_completion(shell) {
            Ok(message) => {
                println!("{message}");
                Some(EXIT_PASS)
            }
            Err(e) => {
                eprintln!("Error: {e}");
                Some(EXIT_FATAL)
            }
        },
        None => None,
    }
}

async fn run_linkrot(cli: &Cli, root: &Path) -> Result<i32> {
    let cli_config = cli_to_config(cli)?;
    let config = load_and_merge_config(&cli_config)?;

    let output_settings = setup_output_settings(&cli_config, &config);
    logging::init_logger(output_settings.verbose, output_settings.quiet);

    config.validate().inspect_err(|e| {
        logging::log_error("Invalid configuration", Some(e));
    })?;

    if output_settings.should_show_config_info() {
        display_configuration_info(&config, root);
    }

    let progress = create_progress_reporter(&output_settings);
    let report = linkrot::run(&config, root, progress.as_ref()).await?;
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    output::display_report(&report, &output_settings.output_format, output_settings.quiet)?;

    Ok(if report.is_failure() {
        EXIT_FAILURES
    } else {
        EXIT_PASS
    })
}

/// Load configuration from file or standard locations and merge with CLI config
fn load_and_merge_config(cli_config: &CliConfig) -> Result<Config> {
    let mut config = if cli_config.no_config {
        Config::default()
    } else if let Some(ref config_file) = cli_config.config_file {
        Config::load_from_file(config_file).inspect_err(|e| {
            logging::log_error(
                &format!("Could not load config file '{config_file}'"),
                Some(e),
            );
        })?
    } else {
        Config::load_from_standard_locations()
    };

    // CLI takes precedence
    config.merge_with_cli(cli_config);
    Ok(config)
}

/// Settings for output formatting and display
struct OutputSettings {
    quiet: bool,
    verbose: bool,
    output_format: String,
    show_progress: bool,
}

impl OutputSettings {
    fn should_show_config_info(&self) -> bool {
        self.verbose && !self.quiet && self.output_format == output_formats::TEXT
    }
}

fn setup_output_settings(cli_config: &CliConfig, config: &Config) -> OutputSettings {
    let quiet = cli_config.quiet;
    let verbose = config.verbose.unwrap_or(false);
    let output_format = config
        .output_format
        .as_deref()
        .unwrap_or(output_formats::DEFAULT)
        .to_string();
    let show_progress = !quiet && !cli_config.no_progress;

    OutputSettings {
        quiet,
        verbose,
        output_format,
        show_progress,
    }
}

fn display_configuration_info(config: &Config, root: &Path) {
    let concurrency = config.concurrency_limit();
    logging::log_config_info(config, concurrency);

    match expand_root(root, &config.file_types_as_set()) {
        Ok(documents) => output::display_config_info(config, concurrency, &documents),
        // The run itself reports an unreadable root
        Err(LinkrotError::RootUnreadable(_)) => {}
        Err(e) => logging::log_warning(&e.to_string()),
    }
}

fn create_progress_reporter(output_settings: &OutputSettings) -> Option<ProgressReporter> {
    if output_settings.show_progress && output_settings.output_format == output_formats::TEXT {
        Some(ProgressReporter::new(true))
    } else {
        None
    }
}
