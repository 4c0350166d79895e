//! Run reports

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub jobs: Vec<JobReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub id: String,
    pub name: String,
    /// The job had no tasks
    pub skipped: bool,
    pub tasks: Vec<TaskReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub id: String,
    pub name: String,
    pub image: String,
    /// Working directory inside the container
    pub workdir: String,
    pub env_var_count: usize,
    pub commands: Vec<CommandReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub exit_code: i32,
}

impl RunReport {
    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }

    pub fn commands_executed(&self) -> usize {
        self.jobs
            .iter()
            .flat_map(|j| j.tasks.iter())
            .map(|t| t.commands.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{format_report, OutputFormat};

    fn report() -> RunReport {
        let started_at = Utc::now();
        RunReport {
            run_id: "run-1".to_string(),
            started_at,
            finished_at: started_at + Duration::milliseconds(1500),
            jobs: vec![
                JobReport {
                    id: "j1".to_string(),
                    name: "job-task-plan".to_string(),
                    skipped: false,
                    tasks: vec![TaskReport {
                        id: "t1".to_string(),
                        name: "plan".to_string(),
                        image: "alpine:3.19".to_string(),
                        workdir: "/mnt/app".to_string(),
                        env_var_count: 2,
                        commands: vec![
                            CommandReport { command: "terraform init".to_string(), exit_code: 0 },
                            CommandReport { command: "terraform plan".to_string(), exit_code: 0 },
                        ],
                    }],
                },
                JobReport { id: "j2".to_string(), name: "job-empty".to_string(), skipped: true, tasks: Vec::new() },
            ],
        }
    }

    #[test]
    fn test_counts() {
        let report = report();
        assert_eq!(report.commands_executed(), 2);
        assert_eq!(report.duration().num_milliseconds(), 1500);
    }

    #[test]
    fn test_human_format() {
        let text = format_report(&report(), &OutputFormat::Human);
        assert!(text.contains("Run run-1"));
        assert!(text.contains("Task plan [alpine:3.19] workdir /mnt/app (2 env vars)"));
        assert!(text.contains("[exit 0] terraform plan"));
        assert!(text.contains("Job job-empty (skipped, no tasks)"));
        assert!(text.contains("2 command(s) executed"));
    }

    #[test]
    fn test_json_format() {
        let text = format_report(&report(), &OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["run_id"], "run-1");
        assert_eq!(value["duration_ms"], 1500);
        assert_eq!(value["commands_executed"], 2);
        assert_eq!(value["jobs"][0]["tasks"][0]["commands"][1]["command"], "terraform plan");
    }
}
