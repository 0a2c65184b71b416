#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::io::Read;
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};
    use clap::{Parser, Subcommand};
    use log::info;

    use navspy::config::{self, CliOverrides};
    use navspy::document::outline;
    use navspy::page::SectionQuery;
    use navspy::viewer::{self, ViewerOptions};
    use navspy::viewport::Containment;

    const VERSION: &str = concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("NAVSPY_BUILD_GIT_HASH"),
        " ",
        env!("NAVSPY_BUILD_PROFILE"),
        ")"
    );

    #[derive(Parser)]
    #[command(
        name = "navspy",
        version = VERSION,
        about = "Markdown viewer with a scroll-synchronized section menu"
    )]
    struct Cli {
        #[command(subcommand)]
        command: Option<Command>,

        /// Input Markdown file (for view mode)
        #[arg(global = true)]
        input: Option<PathBuf>,

        /// Attribute that marks a heading as a navigation target
        #[arg(long, global = true)]
        marker: Option<String>,

        /// How much of a section must be on screen to count as visible
        #[arg(long, global = true)]
        containment: Option<Containment>,

        /// Disable automatic file watching (viewer reloads on file change by default)
        #[arg(long, global = true)]
        no_watch: bool,

        /// Open the viewer at this section id
        #[arg(long)]
        section: Option<String>,

        /// Log output file path (enables logging when specified)
        #[arg(long, global = true)]
        log: Option<PathBuf>,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Print the navigation entries of a document (`#id<TAB>label`)
        Outline {
            /// Input Markdown file (use `-` for stdin)
            input: PathBuf,
        },
    }

    pub fn main() {
        let cli = Cli::parse();

        if let Some(log_path) = &cli.log {
            let file = match std::fs::File::create(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Error: failed to open log file {}: {e}", log_path.display());
                    std::process::exit(1);
                }
            };
            env_logger::Builder::from_default_env()
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        } else if cli.command.is_some() {
            env_logger::init();
        }
        // viewer mode + no --log: logger not initialized (the screen is ours)

        let mut cfg = match config::load_config() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
        };
        cfg.merge_cli(&CliOverrides {
            marker_attribute: cli.marker.clone(),
            containment: cli.containment,
        });
        let config = cfg.resolve();

        let result = match cli.command {
            Some(Command::Outline { input }) => {
                cmd_outline(&input, &SectionQuery::new(config.navigation.marker_attribute.clone()))
            }
            None => match cli.input {
                Some(input) => viewer::run(
                    input,
                    config,
                    ViewerOptions {
                        watch: !cli.no_watch,
                        start_section: cli.section,
                    },
                ),
                None => {
                    eprintln!("Error: input file required");
                    std::process::exit(1);
                }
            },
        };

        if let Err(e) = result {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }

    fn read_input(input: &Path) -> Result<String> {
        if input == Path::new("-") {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            return Ok(text);
        }
        std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
    }

    fn cmd_outline(input: &Path, query: &SectionQuery) -> Result<()> {
        let markdown = read_input(input)?;
        let items = outline(&markdown, query);
        info!("outline: {} entries marked with {}", items.len(), query.marker_attribute);
        for item in items {
            println!("#{}\t{}", item.id, item.label);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    cli::main();
}

// The browser build is a library loaded by the page; `navspy::web::install`
// is its entry point.
#[cfg(target_arch = "wasm32")]
fn main() {}
