//! Declarative sweep definitions. A job template is expanded over methods, tasks and seeds into
//! one job description per combination; a [`Launcher`] hands the descriptions to whatever
//! allocates the machines.

pub mod tasks;

use crate::experiments::AgentKind;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, io::Write, ops::Range, path::Path};

/// Run directory relative to the experiment directory. `{experiment}` and `{random}` are filled
/// in by the launcher, the rest during expansion.
pub const RUN_DIR: &str = "{random}-{task}-{method}-{seed}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executable {
    pub buildroot: String,
    pub dockerfile: String,
    pub entrypoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    pub location: String,
    pub priority: u32,
    pub chips: String,
}

impl Default for Requirements {
    fn default() -> Self {
        Self {
            location: "us-central1".to_owned(),
            priority: 200,
            chips: "a100=1".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTemplate {
    pub executable: Executable,
    pub requirements: Requirements,
    pub flags: BTreeMap<String, String>,
}

impl JobTemplate {
    pub fn for_agent(agent: AgentKind, repo: &Path, bucket: &str) -> Self {
        let repo = repo.display();
        let mut flags = BTreeMap::new();
        flags.insert(
            "logdir".to_owned(),
            format!("{bucket}/{{experiment}}/{RUN_DIR}"),
        );
        Self {
            executable: Executable {
                buildroot: format!("{repo}"),
                dockerfile: format!("{repo}/Dockerfile"),
                entrypoint: format!("ccrl run --agent {agent}"),
            },
            requirements: Requirements::default(),
            flags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescription {
    pub method: String,
    pub task: String,
    pub seed: u64,
    pub job: JobTemplate,
}

/// Named job templates, expanded in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Runs {
    methods: Vec<(String, JobTemplate)>,
}

impl Runs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the template for `method`.
    pub fn set(&mut self, method: impl Into<String>, template: JobTemplate) -> &mut Self {
        let method = method.into();
        match self.methods.iter_mut().find(|(name, _)| *name == method) {
            Some((_, existing)) => *existing = template,
            None => self.methods.push((method, template)),
        }
        self
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|(name, _)| name.as_str())
    }

    /// Cartesian product of methods, tasks and seeds.
    pub fn times(&self, tasks: &[String], seeds: Range<u64>) -> Vec<JobDescription> {
        let mut jobs = vec![];
        for (method, template) in &self.methods {
            for task in tasks {
                for seed in seeds.clone() {
                    jobs.push(expand(method, template, task, seed));
                }
            }
        }
        tracing::info!(
            methods = self.methods.len(),
            tasks = tasks.len(),
            jobs = jobs.len(),
            "expanded job matrix"
        );
        jobs
    }
}

fn expand(method: &str, template: &JobTemplate, task: &str, seed: u64) -> JobDescription {
    let seed_str = seed.to_string();
    let mut job = template.clone();
    for value in job.flags.values_mut() {
        *value = value
            .replace("{task}", task)
            .replace("{method}", method)
            .replace("{seed}", &seed_str);
    }
    job.flags.insert("env_name".to_owned(), task.to_owned());
    job.flags.insert("seed".to_owned(), seed_str);
    job.flags.insert("method".to_owned(), method.to_owned());
    JobDescription {
        method: method.to_owned(),
        task: task.to_owned(),
        seed,
        job,
    }
}

/// Hands job descriptions to an allocation system. Nothing about the submission is observable
/// locally beyond success or failure.
pub trait Launcher {
    fn launch(&mut self, jobs: &[JobDescription], experiment: &str, alloc: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct LaunchRecord<'a> {
    experiment: &'a str,
    alloc: &'a str,
    #[serde(flatten)]
    job: &'a JobDescription,
}

/// Writes one JSON object per job, for an external submission tool to consume.
pub struct JsonLinesLauncher<W> {
    writer: W,
}

impl<W: Write> JsonLinesLauncher<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Launcher for JsonLinesLauncher<W> {
    fn launch(&mut self, jobs: &[JobDescription], experiment: &str, alloc: &str) -> Result<()> {
        for job in jobs {
            let record = LaunchRecord {
                experiment,
                alloc,
                job,
            };
            serde_json::to_writer(&mut self.writer, &record)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        tracing::info!(experiment, alloc, jobs = jobs.len(), "jobs submitted");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{JobTemplate, JsonLinesLauncher, Launcher, Runs};
    use crate::experiments::AgentKind;
    use anyhow::Result;
    use std::path::Path;

    fn runs() -> Runs {
        let mut runs = Runs::new();
        for agent in AgentKind::all() {
            runs.set(
                agent.as_str(),
                JobTemplate::for_agent(agent, Path::new("/src/ccrl"), "gs://bucket/logdir"),
            );
        }
        runs
    }

    #[test]
    fn template_points_at_the_runner() {
        let template = JobTemplate::for_agent(AgentKind::Dmpo, Path::new("/src/ccrl"), "gs://b");
        assert_eq!(template.executable.dockerfile, "/src/ccrl/Dockerfile");
        assert_eq!(template.executable.entrypoint, "ccrl run --agent dmpo");
        assert_eq!(
            template.flags["logdir"],
            "gs://b/{experiment}/{random}-{task}-{method}-{seed}"
        );
        assert_eq!(template.requirements.priority, 200);
    }

    #[test]
    fn expansion_is_the_full_product() {
        let tasks = vec!["control:walker:walk".to_owned(), "gym:Hopper-v4".to_owned()];
        let jobs = runs().times(&tasks, 0..3);
        assert_eq!(jobs.len(), 3 * 2 * 3);
        assert_eq!(jobs[0].method, "d4pg");
        assert_eq!(jobs[0].task, "control:walker:walk");
        assert_eq!(jobs[0].seed, 0);
        assert_eq!(jobs[17].method, "ppo");
        assert_eq!(jobs[17].seed, 2);

        let flags = &jobs[4].job.flags;
        assert_eq!(flags["env_name"], "gym:Hopper-v4");
        assert_eq!(flags["seed"], "1");
        assert_eq!(flags["method"], "d4pg");
        assert_eq!(
            flags["logdir"],
            "gs://bucket/logdir/{experiment}/{random}-gym:Hopper-v4-d4pg-1"
        );
    }

    #[test]
    fn setting_a_method_twice_replaces_it() {
        let mut runs = runs();
        runs.set(
            "ppo",
            JobTemplate::for_agent(AgentKind::Ppo, Path::new("/elsewhere"), "gs://other"),
        );
        assert_eq!(runs.methods().collect::<Vec<_>>(), vec!["d4pg", "dmpo", "ppo"]);
    }

    #[test]
    fn json_lines_launcher_writes_one_line_per_job() -> Result<()> {
        let jobs = runs().times(&["control:cartpole:swingup".to_owned()], 0..2);
        let mut launcher = JsonLinesLauncher::new(Vec::new());
        launcher.launch(&jobs, "acme", "dm/alloc")?;
        let text = String::from_utf8(launcher.into_inner())?;
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        let first: serde_json::Value = serde_json::from_str(lines[0])?;
        assert_eq!(first["experiment"], "acme");
        assert_eq!(first["alloc"], "dm/alloc");
        assert_eq!(first["method"], "d4pg");
        assert_eq!(first["job"]["flags"]["seed"], "0");
        Ok(())
    }
}
