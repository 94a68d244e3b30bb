use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mst",
    about = "Merge-tree planning for merge-and-shrink",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the merge driver on a synthetic task
    Run(RunArgs),
    /// Show a merge tree and the merge order it plans
    Plan(PlanArgs),
    /// Fold a sequence of merges into a merge tree
    Reconcile(ReconcileArgs),
}

/// Synthetic task every variable of which has the same domain size.
#[derive(Args, Clone)]
pub struct TaskArgs {
    /// Number of task variables
    #[arg(short = 'n', long, default_value = "4")]
    pub variables: usize,
    /// Domain size of every variable
    #[arg(short, long, default_value = "2")]
    pub domain: usize,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub task: TaskArgs,
    /// TOML configuration file; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// use_first, use_second or use_random
    #[arg(long)]
    pub tie_break: Option<String>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// linear or balanced
    #[arg(long)]
    pub shape: Option<String>,
    /// tree or smallest_first
    #[arg(long)]
    pub selector: Option<String>,
    /// Log the merge tree after every step
    #[arg(long)]
    pub dump: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    #[arg(short = 'n', long, default_value = "4")]
    pub variables: usize,
    #[arg(long, default_value = "linear")]
    pub shape: String,
    /// Spaces per tree level
    #[arg(long, default_value = "2")]
    pub indent: usize,
}

#[derive(Args)]
pub struct ReconcileArgs {
    #[arg(short = 'n', long, default_value = "4")]
    pub variables: usize,
    #[arg(long, default_value = "linear")]
    pub shape: String,
    #[arg(long, default_value = "use_random")]
    pub tie_break: String,
    #[arg(long, default_value = "2016")]
    pub seed: u64,
    /// Realized merges as `a,b`, in order
    #[arg(required = true)]
    pub merges: Vec<String>,
}
