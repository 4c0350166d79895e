//! CLI argument parsing

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stiletto")]
#[command(author, version, about = "Run declarative task manifests as sequential container jobs", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubCommand,

    /// Log filter directive (e.g. info, debug, stiletto=trace)
    #[arg(long, global = true, env = "STILETTO_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log format: text or json
    #[arg(long, global = true, env = "STILETTO_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (sets the log level to debug unless --log-level is given)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Build and run jobs
    #[command(subcommand)]
    Job(JobCommand),

    /// Work with task manifests
    #[command(subcommand)]
    Manifest(ManifestCommand),
}

#[derive(Subcommand, Debug)]
pub enum JobCommand {
    /// Run one job per task manifest on the container engine
    Dagger(DaggerArgs),
}

#[derive(ClapArgs, Debug)]
pub struct DaggerArgs {
    /// Task manifest files, comma separated
    #[arg(long, value_delimiter = ',', required = true, num_args = 1..)]
    pub task_files: Vec<PathBuf>,

    /// Override the workdir of every task
    #[arg(long)]
    pub workdir: Option<String>,

    /// Override the mount directory of every task
    #[arg(long)]
    pub mountdir: Option<String>,

    /// Log every env var set in a task container
    #[arg(long)]
    pub show_env_vars: bool,

    /// Dotfiles loaded as job env vars, comma separated
    #[arg(long, value_delimiter = ',')]
    pub dotfiles: Vec<String>,

    /// Path of the docker binary
    #[arg(long, env = "STILETTO_DOCKER_BIN", default_value = "docker")]
    pub docker_bin: PathBuf,

    /// Run every stage against a recording engine instead of docker
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum ManifestCommand {
    /// Load and validate task manifests without running them
    Validate {
        /// Manifest files to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dagger() {
        let args = Args::try_parse_from([
            "stiletto",
            "job",
            "dagger",
            "--task-files",
            "a.yml,b.yml",
            "--workdir",
            "app",
            "--dotfiles",
            ".env",
            "--dry-run",
        ])
        .unwrap();

        match args.command {
            SubCommand::Job(JobCommand::Dagger(dagger)) => {
                assert_eq!(dagger.task_files, vec![PathBuf::from("a.yml"), PathBuf::from("b.yml")]);
                assert_eq!(dagger.workdir.as_deref(), Some("app"));
                assert_eq!(dagger.mountdir, None);
                assert_eq!(dagger.dotfiles, vec![".env"]);
                assert!(dagger.dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_task_files_required() {
        assert!(Args::try_parse_from(["stiletto", "job", "dagger"]).is_err());
        assert!(Args::try_parse_from(["stiletto", "manifest", "validate"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args =
            Args::try_parse_from(["stiletto", "manifest", "validate", "t.yml", "--json", "-v"]).unwrap();
        assert!(args.json);
        assert!(args.verbose);
    }
}
