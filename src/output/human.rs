//! Human-readable output formatting

use crate::engine::RunReport;

pub fn format_human(report: &RunReport) -> String {
    let mut output = format!(
        "Run {}\n\
         ----------------------------------------\n\
         Started:  {}\n\
         Finished: {}\n\
         Duration: {} ms\n",
        report.run_id,
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.duration().num_milliseconds()
    );

    for job in &report.jobs {
        if job.skipped {
            output.push_str(&format!("\nJob {} (skipped, no tasks)\n", job.name));
            continue;
        }

        output.push_str(&format!("\nJob {}\n", job.name));
        for task in &job.tasks {
            output.push_str(&format!(
                "  Task {} [{}] workdir {} ({} env vars)\n",
                task.name, task.image, task.workdir, task.env_var_count
            ));
            for cmd in &task.commands {
                output.push_str(&format!("    [exit {}] {}\n", cmd.exit_code, cmd.command));
            }
        }
    }

    output.push_str(&format!("\n{} command(s) executed\n", report.commands_executed()));
    output
}
