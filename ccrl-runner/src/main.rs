use anyhow::Result;
use ccrl_api::{
    EnvRequest,
    driver::{RandomActor, RunOutcome, run_episodes},
    experiments::{AgentKind, EnvName, ExperimentConfig},
    launch::{JobTemplate, JsonLinesLauncher, Launcher, Runs, tasks},
};
use ccrl_core::{Env, logger::claim_process_license, rng::seed_rng};
use ccrl_gym::PythonSuites;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one experiment against a scored environment
    Run(RunArgs),
    /// Print the job matrix for a sweep, one JSON object per line
    Jobs(JobsArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long, default_value = "ppo")]
    agent: AgentKind,
    /// `<gym|control>:<task>`, control tasks as `control:<domain>:<task>`
    #[arg(long, alias = "env_name", default_value = "control:walker:walk")]
    env_name: EnvName,
    #[arg(long)]
    logdir: PathBuf,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Actor steps, defaults to the agent's budget
    #[arg(long)]
    num_steps: Option<u64>,
    /// Total environment calls before the process stops
    #[arg(long)]
    step_budget: Option<u64>,
    #[arg(long)]
    run_distributed: bool,
    // launcher-supplied, recorded in the job flags only
    #[arg(long, hide = true)]
    method: Option<String>,
}

#[derive(Args, Debug)]
struct JobsArgs {
    /// Restrict the sweep to one agent
    #[arg(long)]
    agent: Option<AgentKind>,
    #[arg(long, default_value = ".")]
    repo: PathBuf,
    #[arg(long, default_value = "gs://ccrl/logdir")]
    bucket: String,
    #[arg(long, default_value = "ccrl")]
    experiment: String,
    #[arg(long, default_value = "")]
    alloc: String,
    #[arg(long, default_value_t = 3)]
    seeds: u64,
    /// Use DMC18 instead of DMC20
    #[arg(long)]
    dmc18: bool,
}

fn run(args: RunArgs) -> Result<()> {
    if let Some(method) = &args.method {
        tracing::info!(method = method.as_str(), "started by the job launcher");
    }
    let mut config = ExperimentConfig::new(args.agent, args.env_name, args.logdir)
        .with_seed(args.seed)
        .with_run_distributed(args.run_distributed);
    if let Some(num_steps) = args.num_steps {
        config = config.with_max_num_actor_steps(num_steps);
    }
    config.validate()?;
    tracing::info!(config = %serde_json::to_string(&config)?, "experiment");
    if config.run_distributed {
        tracing::warn!(
            actors = config.num_distributed_actors,
            "distributed runs are not available, running a single actor"
        );
    }

    seed_rng(config.seed);
    let mut request = EnvRequest::parse(
        config.env_name.suite.as_str(),
        &config.env_name.task,
        &config.logdir,
    )?;
    if let Some(step_budget) = args.step_budget {
        request = request.with_step_budget(step_budget);
    }
    let mut env = request.build(PythonSuites, claim_process_license()?)?;
    let mut actor = RandomActor::new(&env.env_description(), config.seed);
    match run_episodes(&mut env, &mut actor, config.max_num_actor_steps)? {
        RunOutcome::StepLimit {
            actor_steps,
            episodes,
        } => {
            tracing::info!(
                actor_steps,
                episodes,
                minutes = env.elapsed_minutes(),
                "actor step limit reached"
            );
            env.close()
        }
        RunOutcome::BudgetExhausted(exhausted) => exhausted.halt(),
    }
}

fn jobs(args: JobsArgs) -> Result<()> {
    let agents = match args.agent {
        Some(agent) => vec![agent],
        None => AgentKind::all().to_vec(),
    };
    let mut runs = Runs::new();
    for agent in agents {
        runs.set(
            agent.as_str(),
            JobTemplate::for_agent(agent, &args.repo, &args.bucket),
        );
    }
    let task_names: &[&str] = if args.dmc18 {
        &tasks::DMC18
    } else {
        &tasks::DMC20
    };
    let jobs = runs.times(&tasks::control_tasks(task_names), 0..args.seeds);
    let mut launcher = JsonLinesLauncher::new(std::io::stdout().lock());
    launcher.launch(&jobs, &args.experiment, &args.alloc)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args),
        Command::Jobs(args) => jobs(args),
    }
}
