use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use truffle_build::ClasspathMode;

mod commands;

/// Build wiring for Graal/Truffle language projects.
///
/// Reads truffle.toml, wires the Graal compiler into the project's targets
/// and runs them: compiler preparation, launcher scripts, language
/// component archives, native images and distribution installs.
///
/// EXAMPLES:
///     truffle classpath --mode archived   Print the distribution classpath
///     truffle prepare-compiler            Copy the compiler into the build
///     truffle component                   Build the language component
///     truffle install                     Install the application
///     truffle tasks                       List the project's tasks
///
/// ENVIRONMENT VARIABLES:
///     TRUFFLE_GRAAL_VERSION  Override the graalVersion property
///     TRUFFLE_REPOSITORY     Override the artifact repository
///     TRUFFLE_JSON           Set to '1' for JSON output by default
///     RUST_LOG               Log filter (e.g. 'truffle_build=debug')
#[derive(Parser)]
#[command(name = "truffle")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(long, short = 'C', global = true)]
    project_dir: Option<PathBuf>,

    /// Graal version, overriding truffle.toml and the environment
    #[arg(long, global = true)]
    graal_version: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dynamic-load classpath
    ///
    /// The live classpath points at the files where the build keeps them;
    /// the archived classpath points at where an installed distribution
    /// keeps them.
    ///
    /// EXAMPLES:
    ///     truffle classpath                           Live classpath
    ///     truffle classpath --mode archived           With the <HOME> placeholder
    ///     truffle classpath --install-root /opt/app   Archived under /opt/app
    Classpath {
        /// Projection to print
        #[arg(long, value_enum, default_value_t = Mode::Live)]
        mode: Mode,
        /// Install root for the archived projection
        #[arg(long)]
        install_root: Option<PathBuf>,
        /// Output as JSON
        #[arg(long, env = "TRUFFLE_JSON")]
        json: bool,
    },

    /// Copy the Graal compiler into the compiler directory
    PrepareCompiler {
        /// Output as JSON
        #[arg(long, env = "TRUFFLE_JSON")]
        json: bool,
    },

    /// Generate and patch the application start scripts
    PatchScripts {
        /// Output as JSON
        #[arg(long, env = "TRUFFLE_JSON")]
        json: bool,
    },

    /// Build the language component archive
    Component {
        /// Output as JSON
        #[arg(long, env = "TRUFFLE_JSON")]
        json: bool,
    },

    /// Build native images
    ///
    /// EXAMPLES:
    ///     truffle native-image              Build every native image target
    ///     truffle native-image myBinary     Build one target
    NativeImage {
        /// Native image targets (default: all)
        names: Vec<String>,
        /// Output as JSON
        #[arg(long, env = "TRUFFLE_JSON")]
        json: bool,
    },

    /// Install the application distribution
    Install {
        /// Output as JSON
        #[arg(long, env = "TRUFFLE_JSON")]
        json: bool,
    },

    /// Run tasks and their dependencies
    ///
    /// A failing task does not stop unrelated tasks.
    ///
    /// EXAMPLES:
    ///     truffle run prepareCompiler installDist
    Run {
        /// Task names
        #[arg(required = true)]
        tasks: Vec<String>,
        /// Output as JSON
        #[arg(long, env = "TRUFFLE_JSON")]
        json: bool,
    },

    /// List the project's tasks in execution order
    Tasks {
        /// Output as JSON
        #[arg(long, env = "TRUFFLE_JSON")]
        json: bool,
    },
}

/// Classpath projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Live,
    Archived,
}

impl From<Mode> for ClasspathMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Live => ClasspathMode::Live,
            Mode::Archived => ClasspathMode::Archived,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = commands::ProjectOptions {
        project_dir: cli.project_dir,
        graal_version: cli.graal_version,
    };

    match cli.command {
        Commands::Classpath {
            mode,
            install_root,
            json,
        } => commands::classpath::run(&options, mode.into(), install_root, json),
        Commands::PrepareCompiler { json } => {
            commands::targets::run(&options, &[truffle_build::targets::PREPARE_COMPILER_TASK], json)
        }
        Commands::PatchScripts { json } => {
            commands::targets::run(&options, &[truffle_build::targets::START_SCRIPTS_TASK], json)
        }
        Commands::Component { json } => {
            commands::targets::run(&options, &[truffle_build::targets::GRAAL_COMPONENT_TASK], json)
        }
        Commands::NativeImage { names, json } => {
            commands::targets::native_images(&options, names, json)
        }
        Commands::Install { json } => {
            commands::targets::run(&options, &[truffle_build::targets::INSTALL_DIST_TASK], json)
        }
        Commands::Run { tasks, json } => commands::targets::run(&options, tasks.as_slice(), json),
        Commands::Tasks { json } => commands::tasks::run(&options, json),
    }
}
