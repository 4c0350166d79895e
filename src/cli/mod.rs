//! Command line interface

mod args;
mod commands;

pub use args::{Args, DaggerArgs, JobCommand, ManifestCommand, SubCommand};
pub use commands::{
    build_jobs, convert_task_files, job_name, run_dagger, validate_manifests, DaggerSettings,
};

impl From<&DaggerArgs> for DaggerSettings {
    fn from(args: &DaggerArgs) -> Self {
        Self {
            task_files: args.task_files.clone(),
            workdir: args.workdir.clone(),
            mountdir: args.mountdir.clone(),
            dotfiles: args.dotfiles.clone(),
            show_env_vars: args.show_env_vars,
        }
    }
}
