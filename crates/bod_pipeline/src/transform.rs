//! crates/bod_pipeline/src/transform.rs
//! The SQL transformation engine, seen as an opaque plan → apply → run commit.
//!
//! `SqlMeshCli` drives the `sqlmesh` command line against the project directory.
//! The draft's config path reaches the project through the child's environment
//! (`CONFIG_PATH`); this process's own environment is left alone.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use bod_io::{DraftConfig, S3Credentials};
use tracing::{debug, info};

use crate::PipelineError;

/// Stderr lines kept in a failure message.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformStep {
    Plan,
    Apply,
    Run,
}

impl fmt::Display for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransformStep::Plan => "plan",
            TransformStep::Apply => "apply",
            TransformStep::Run => "run",
        })
    }
}

/// What `plan` produced. The pipeline does not look inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformPlan {
    pub project: PathBuf,
    pub summary: String,
}

pub trait TransformEngine {
    fn plan(&mut self) -> Result<TransformPlan, PipelineError>;
    fn apply(&mut self, plan: &TransformPlan) -> Result<(), PipelineError>;
    fn run(&mut self) -> Result<(), PipelineError>;

    /// The full commit, in order. The first failing step stops it.
    fn plan_apply_run(&mut self) -> Result<(), PipelineError> {
        let plan = self.plan()?;
        self.apply(&plan)?;
        self.run()
    }
}

impl<T: TransformEngine + ?Sized> TransformEngine for &mut T {
    fn plan(&mut self) -> Result<TransformPlan, PipelineError> {
        (**self).plan()
    }

    fn apply(&mut self, plan: &TransformPlan) -> Result<(), PipelineError> {
        (**self).apply(plan)
    }

    fn run(&mut self) -> Result<(), PipelineError> {
        (**self).run()
    }
}

#[derive(Clone, Debug)]
pub struct SqlMeshCli {
    program: OsString,
    project: PathBuf,
    config_path: PathBuf,
}

impl SqlMeshCli {
    pub fn new(project: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        Self { program: OsString::from("sqlmesh"), project: project.into(), config_path: config_path.into() }
    }

    /// Engine for one draft. Object-storage drafts need their keys present
    /// before the engine pulls raw data; a missing key fails here, by name.
    pub fn for_config(cfg: &DraftConfig) -> Result<Self, PipelineError> {
        if let Some(s3) = S3Credentials::resolve(&cfg.update_type)? {
            debug!(bucket = %s3.bucket, "object storage credentials resolved");
        }
        Ok(Self::new(&cfg.transform_project, &cfg.path))
    }

    /// Use another executable (a wrapper script, or a stand-in under test).
    pub fn with_program(mut self, program: impl AsRef<OsStr>) -> Self {
        self.program = program.as_ref().to_os_string();
        self
    }

    pub fn project(&self) -> &Path {
        &self.project
    }

    /// Command-line arguments for one step.
    pub fn args(&self, step: TransformStep) -> Vec<OsString> {
        let tail: &[&str] = match step {
            TransformStep::Plan => &["plan", "--no-prompts"],
            TransformStep::Apply => &["plan", "--no-prompts", "--auto-apply"],
            TransformStep::Run => &["run"],
        };
        let mut args = vec![OsString::from("-p"), self.project.clone().into_os_string()];
        args.extend(tail.iter().map(OsString::from));
        args
    }

    fn exec(&self, step: TransformStep) -> Result<String, PipelineError> {
        info!(step = %step, project = %self.project.display(), "transform");
        let output = Command::new(&self.program)
            .args(self.args(step))
            .env("CONFIG_PATH", &self.config_path)
            .output()
            .map_err(|e| {
                PipelineError::Transform(format!("cannot start {}: {e}", self.program.to_string_lossy()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            return Err(PipelineError::Transform(format!("{step} failed ({}): {tail}", output.status)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TransformEngine for SqlMeshCli {
    fn plan(&mut self) -> Result<TransformPlan, PipelineError> {
        let summary = self.exec(TransformStep::Plan)?;
        Ok(TransformPlan { project: self.project.clone(), summary })
    }

    fn apply(&mut self, plan: &TransformPlan) -> Result<(), PipelineError> {
        if plan.project != self.project {
            return Err(PipelineError::Transform(format!(
                "plan for {} cannot be applied to {}",
                plan.project.display(),
                self.project.display()
            )));
        }
        self.exec(TransformStep::Apply).map(drop)
    }

    fn run(&mut self) -> Result<(), PipelineError> {
        self.exec(TransformStep::Run).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn each_step_targets_the_project() {
        let cli = SqlMeshCli::new("/srv/transform", "/srv/configs/friends.yml");
        assert_eq!(strs(cli.args(TransformStep::Plan)), ["-p", "/srv/transform", "plan", "--no-prompts"]);
        assert_eq!(
            strs(cli.args(TransformStep::Apply)),
            ["-p", "/srv/transform", "plan", "--no-prompts", "--auto-apply"]
        );
        assert_eq!(strs(cli.args(TransformStep::Run)), ["-p", "/srv/transform", "run"]);
    }

    #[test]
    fn unknown_program_is_a_transform_error() {
        let mut cli = SqlMeshCli::new("p", "c.yml").with_program("bod-no-such-binary");
        assert!(matches!(cli.plan(), Err(PipelineError::Transform(m)) if m.contains("cannot start")));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_decides_success() {
        let mut ok = SqlMeshCli::new("p", "c.yml").with_program("true");
        assert!(ok.plan_apply_run().is_ok());

        let mut failing = SqlMeshCli::new("p", "c.yml").with_program("false");
        match failing.plan_apply_run() {
            Err(PipelineError::Transform(m)) => assert!(m.starts_with("plan failed")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn plans_do_not_cross_projects() {
        let mut cli = SqlMeshCli::new("a", "c.yml").with_program("true");
        let foreign = TransformPlan { project: PathBuf::from("b"), summary: String::new() };
        assert!(matches!(cli.apply(&foreign), Err(PipelineError::Transform(_))));
    }
}
