mod cmd;
mod output;
mod root;
mod session;

use clap::{Parser, Subcommand};
use cmd::{
    comment::CommentSubcommand, company::CompanySubcommand, config::ConfigSubcommand,
    file::FileSubcommand, hook::HookSubcommand, init::InitOptions, notebook::NotebookSubcommand,
    page::PageSubcommand, project::ProjectSubcommand, task::TaskSubcommand,
    user::UserSubcommand,
};
use session::Session;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "actlab",
    about = "Work with Active Collab projects, tasks and notebooks from the terminal",
    version,
    propagate_version = true
)]
struct Cli {
    /// Repository root (default: auto-detect from .actlab/ or .git/)
    #[arg(long, global = true, env = "ACTLAB_ROOT")]
    root: Option<PathBuf>,

    /// Active Collab host, overrides the config file
    #[arg(long, global = true, env = "ACTLAB_HOST")]
    host: Option<String>,

    /// API key, overrides the config file
    #[arg(long, global = true, env = "ACTLAB_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Password for the configured email, when no key is set
    #[arg(long, global = true, env = "ACTLAB_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write .actlab/config.yaml for this repository
    Init {
        /// Path Active Collab is served under
        #[arg(long, default_value = "/")]
        base_path: String,
        /// Account email, used with --password when no key is stored
        #[arg(long)]
        email: Option<String>,
        /// Upload markdown files as-is instead of rendering them
        #[arg(long)]
        no_markdown: bool,
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Companies
    Company {
        #[command(subcommand)]
        subcommand: CompanySubcommand,
    },

    /// User accounts
    User {
        #[command(subcommand)]
        subcommand: UserSubcommand,
    },

    /// Projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Tasks of a project
    Task {
        #[command(subcommand)]
        subcommand: TaskSubcommand,
    },

    /// Notebooks of a project
    Notebook {
        #[command(subcommand)]
        subcommand: NotebookSubcommand,
    },

    /// Notebook pages
    Page {
        #[command(subcommand)]
        subcommand: PageSubcommand,
    },

    /// Comments on projects, tasks, notebooks and pages
    Comment {
        #[command(subcommand)]
        subcommand: CommentSubcommand,
    },

    /// Project files
    File {
        #[command(subcommand)]
        subcommand: FileSubcommand,
    },

    /// Render a markdown file to the HTML actlab uploads
    Render {
        file: PathBuf,
        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Git post-commit integration
    Hook {
        #[command(subcommand)]
        subcommand: HookSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Hook {
            subcommand: HookSubcommand::PostCommit,
        } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let session = Session {
        root: root::resolve_root(cli.root.as_deref()),
        host: cli.host,
        key: cli.key,
        password: cli.password,
    };
    let json = cli.json;

    let result = match cli.command {
        Commands::Init {
            base_path,
            email,
            no_markdown,
            force,
        } => cmd::init::run(
            &session,
            InitOptions {
                base_path,
                email,
                no_markdown,
                force,
            },
        ),
        Commands::Config { subcommand } => cmd::config::run(&session, subcommand, json),
        Commands::Company { subcommand } => cmd::company::run(&session, subcommand, json),
        Commands::User { subcommand } => cmd::user::run(&session, subcommand, json),
        Commands::Project { subcommand } => cmd::project::run(&session, subcommand, json),
        Commands::Task { subcommand } => cmd::task::run(&session, subcommand, json),
        Commands::Notebook { subcommand } => cmd::notebook::run(&session, subcommand, json),
        Commands::Page { subcommand } => cmd::page::run(&session, subcommand, json),
        Commands::Comment { subcommand } => cmd::comment::run(&session, subcommand, json),
        Commands::File { subcommand } => cmd::file::run(&session, subcommand, json),
        Commands::Render { file, output } => cmd::render::run(&file, output.as_deref()),
        Commands::Hook { subcommand } => cmd::hook::run(&session, subcommand, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
