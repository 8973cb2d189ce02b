//! goap-sim - run GOAP scenarios from YAML.
//!
//! - `goap-sim run <scenario>` - tick the orchestrator and log agent lifecycle events
//! - `goap-sim plan <scenario> --agent NAME` - print one agent's first plan

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use goap_agent::ThinkOutcome;
use goap_core::{AgentEvent, TickContext};
use goap_sim::Scenario;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "goap-sim")]
#[command(about = "Goal-oriented action planning scenario runner", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario for a number of ticks
    Run {
        /// Scenario file
        scenario: PathBuf,

        /// Number of ticks to run
        #[arg(long, default_value_t = 100)]
        ticks: u64,

        /// Simulated seconds per tick
        #[arg(long, default_value_t = 0.1)]
        dt: f32,
    },

    /// Plan for one agent without running anything
    Plan {
        /// Scenario file
        scenario: PathBuf,

        /// Agent name from the scenario
        #[arg(long)]
        agent: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Run { scenario, ticks, dt } => run(&scenario, ticks, dt),
        Commands::Plan { scenario, agent } => plan(&scenario, &agent),
    }
}

fn run(path: &PathBuf, ticks: u64, dt: f32) -> Result<()> {
    tracing::info!(scenario = %path.display(), ticks, dt, "starting run");
    let scenario = Scenario::load(path)?;
    let mut session = scenario.build()?;

    for _ in 0..ticks {
        let report = session.orchestrator.tick(dt, &mut session.world);
        tracing::debug!(
            tick = report.tick,
            thought = report.thought,
            skipped = report.skipped,
            deferred = report.deferred,
            performed = report.performed,
            think_us = report.think_time.as_micros() as u64,
            "tick"
        );

        for event in session.events.take() {
            log_event(&session, &event);
        }
    }

    for agent in session.orchestrator.agents() {
        tracing::info!(
            agent = session.agent_name(agent.id()).unwrap_or("?"),
            state = ?agent.state(),
            beliefs = %agent.beliefs().facts(),
            "final state"
        );
    }
    tracing::info!(world = %session.world.snapshot(), "final world");
    Ok(())
}

fn log_event(session: &goap_sim::Session, event: &AgentEvent) {
    let agent = session.agent_name(event.agent()).unwrap_or("?");
    match event {
        AgentEvent::GoalSelected { goal, priority, .. } => {
            tracing::info!(agent, goal = %goal, priority, "goal selected");
        }
        AgentEvent::PlanCreated {
            goal, actions, cost, ..
        } => {
            tracing::info!(agent, goal = %goal, cost, plan = ?actions, "plan created");
        }
        AgentEvent::PlanFailed { goal, reason, .. } => {
            tracing::info!(agent, goal = %goal, ?reason, "plan failed");
        }
        AgentEvent::PlanCompleted { goal, .. } => {
            tracing::info!(agent, goal = %goal, "plan completed");
        }
        AgentEvent::PlanAborted { goal, .. } => {
            tracing::info!(agent, ?goal, "plan aborted");
        }
        AgentEvent::ActionStarted { .. }
        | AgentEvent::ActionEnded { .. }
        | AgentEvent::BeliefChanged { .. } => {}
    }
}

fn plan(path: &PathBuf, name: &str) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let mut session = scenario.build()?;
    let id = session
        .agent_id(name)
        .with_context(|| format!("scenario has no agent named {name:?}"))?;
    let agent = session
        .orchestrator
        .get_mut(id)
        .with_context(|| format!("agent {name:?} is not registered"))?;

    match agent.think(&TickContext::new(0, 0.0), &mut session.world) {
        ThinkOutcome::Planned { steps, cost } => {
            println!("{name}: goal {} ({steps} steps, cost {cost})", agent.active_goal().unwrap_or("?"));
            if let Some(plan) = agent.current_plan() {
                for (i, step) in plan.steps().iter().enumerate() {
                    println!("  {}. {}", i + 1, step.name);
                }
            }
        }
        ThinkOutcome::Satisfied => println!("{name}: selected goal already holds"),
        ThinkOutcome::NoGoal => println!("{name}: no relevant goal"),
        ThinkOutcome::NoPlan => println!("{name}: no plan found"),
        ThinkOutcome::Busy => println!("{name}: busy"),
    }
    Ok(())
}
