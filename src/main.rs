use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use liftrs::analytics::{
    AnalyticsService, FrequencyAnalysis, StrengthProgress, VolumeAnalysis, WorkoutComparison,
};
use liftrs::clock::{Clock, SystemClock};
use liftrs::config::AppConfig;
use liftrs::error::{ErrorSeverity, LiftError};
use liftrs::goals::{Goal, GoalManager, GoalType, GoalUpdate, NewGoal, SweepReport};
use liftrs::logging::init_logging;
use liftrs::models::{DateRange, WorkoutType};
use liftrs::store::{Dataset, DatasetStores};

/// liftrs - Workout Analytics CLI
///
/// Strength trends, volume and frequency reports, workout comparisons and
/// goal tracking over a JSON workout dataset.
#[derive(Parser)]
#[command(name = "liftrs")]
#[command(author = "liftrs Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Workout Analytics & Goal Progress CLI", long_about = None)]
struct Cli {
    /// Workout dataset (JSON); defaults to the configured dataset path
    #[arg(short, long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RangeArgs {
    /// User to analyze
    #[arg(short, long)]
    user: String,

    /// Range start (YYYY-MM-DD), default 90 days before --to
    #[arg(short, long)]
    from: Option<NaiveDate>,

    /// Range end (YYYY-MM-DD), default today
    #[arg(short, long)]
    to: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Strength progression of one exercise
    Strength {
        #[command(flatten)]
        range: RangeArgs,

        /// Exercise id
        #[arg(short, long)]
        exercise: Uuid,
    },

    /// Volume distribution and trend
    Volume {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Training frequency patterns
    Frequency {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Compare two workouts of the same type
    Compare {
        #[arg(short, long)]
        user: String,

        /// Baseline workout id
        first: Uuid,

        second: Uuid,
    },

    /// Manage goals
    #[command(subcommand)]
    Goal(GoalCommands),

    /// Batch jobs over all users
    #[command(subcommand)]
    Sweep(SweepCommands),
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Create a goal
    Create {
        #[arg(short, long)]
        user: String,

        #[arg(long)]
        title: String,

        /// strength, volume, frequency or custom
        #[arg(long = "type")]
        goal_type: GoalType,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        exercise: Option<Uuid>,

        #[arg(long)]
        weight: Option<Decimal>,

        #[arg(long)]
        reps: Option<i32>,

        #[arg(long)]
        volume: Option<Decimal>,

        /// Sessions per calendar month
        #[arg(long)]
        frequency: Option<i32>,

        #[arg(long)]
        workout_type: Option<WorkoutType>,

        /// Defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        target_date: NaiveDate,
    },

    /// List a user's goals
    List {
        #[arg(short, long)]
        user: String,
    },

    /// Show one goal
    Show {
        #[arg(short, long)]
        user: String,

        id: Uuid,
    },

    /// Recalculate progress of one goal, a user's goals, or every user's goals
    Recalculate {
        #[arg(short, long, required_unless_present = "all")]
        user: Option<String>,

        /// Single goal id
        #[arg(long, requires = "user")]
        id: Option<Uuid>,

        #[arg(long, conflicts_with_all = ["user", "id"])]
        all: bool,
    },

    /// Mark a goal complete
    Complete {
        #[arg(short, long)]
        user: String,

        id: Uuid,
    },

    /// Edit title, description or target date
    Update {
        #[arg(short, long)]
        user: String,

        id: Uuid,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        target_date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum SweepCommands {
    /// Remind users of goals whose target date is near
    Deadlines,
}

/// Loaded dataset plus the services built over it
struct Workspace {
    dataset_path: PathBuf,
    stores: DatasetStores,
    analytics: AnalyticsService,
    goals: GoalManager,
    clock: Arc<dyn Clock>,
}

impl Workspace {
    fn open(config: &AppConfig, dataset_path: PathBuf) -> Result<Self> {
        let dataset = Dataset::load_from_file(&dataset_path)
            .with_context(|| format!("Failed to load dataset: {}", dataset_path.display()))?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let stores = dataset.into_stores(clock.clone());

        let analytics =
            AnalyticsService::with_settings(stores.workouts.clone(), config.analytics.clone());
        let goals = GoalManager::with_settings(
            stores.workouts.clone(),
            stores.goals.clone(),
            stores.notifications.clone(),
            clock.clone(),
            config.goals.clone(),
        );

        Ok(Workspace {
            dataset_path,
            stores,
            analytics,
            goals,
            clock,
        })
    }

    fn range(&self, args: &RangeArgs) -> Result<DateRange> {
        let end = args.to.unwrap_or_else(|| self.clock.today());
        let start = args.from.unwrap_or(end - Duration::days(90));
        Ok(DateRange::new(start, end)?)
    }

    /// Persist goal and notification changes back to the dataset file
    fn save(&self) -> Result<()> {
        self.stores.to_dataset()?.save_to_file(&self.dataset_path)?;
        tracing::debug!(path = %self.dataset_path.display(), "Dataset saved");
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<LiftError>() {
            Some(lift_error) => {
                match lift_error.severity() {
                    ErrorSeverity::Critical | ErrorSeverity::Error => {
                        tracing::error!(error = %lift_error, "Command failed")
                    }
                    ErrorSeverity::Warning | ErrorSeverity::Info => {
                        tracing::warn!(error = %lift_error, "Command rejected")
                    }
                }
                eprintln!("{} {}", "Error:".red().bold(), lift_error.user_message());
            }
            None => eprintln!("{} {:#}", "Error:".red().bold(), e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };
    init_logging(&config.logging.clone().with_verbosity(cli.verbose))?;

    let dataset_path = cli
        .data
        .clone()
        .unwrap_or_else(|| config.data.dataset_path.clone());
    let workspace = Workspace::open(&config, dataset_path)?;
    let json = cli.json;

    match cli.command {
        Commands::Strength { range, exercise } => {
            let date_range = workspace.range(&range)?;
            let progress = workspace
                .analytics
                .strength_progress(&range.user, exercise, date_range)?;
            output(json, &progress, print_strength)?;
        }

        Commands::Volume { range } => {
            let date_range = workspace.range(&range)?;
            let analysis = workspace.analytics.volume_analysis(&range.user, date_range)?;
            output(json, &analysis, print_volume)?;
        }

        Commands::Frequency { range } => {
            let date_range = workspace.range(&range)?;
            let analysis = workspace.analytics.frequency_analysis(&range.user, date_range)?;
            output(json, &analysis, print_frequency)?;
        }

        Commands::Compare { user, first, second } => {
            let comparison = workspace.analytics.compare_workouts(&user, first, second)?;
            output(json, &comparison, print_comparison)?;
        }

        Commands::Goal(command) => run_goal_command(&workspace, command, json)?,

        Commands::Sweep(SweepCommands::Deadlines) => {
            let report = workspace.goals.send_deadline_reminders()?;
            workspace.save()?;
            output(json, &report, print_sweep_report)?;
        }
    }

    Ok(())
}

fn run_goal_command(workspace: &Workspace, command: GoalCommands, json: bool) -> Result<()> {
    let manager = &workspace.goals;

    match command {
        GoalCommands::Create {
            user,
            title,
            goal_type,
            description,
            exercise,
            weight,
            reps,
            volume,
            frequency,
            workout_type,
            start,
            target_date,
        } => {
            let goal = manager.create_goal(
                &user,
                NewGoal {
                    title,
                    description,
                    goal_type: Some(goal_type),
                    exercise_id: exercise,
                    target_weight: weight,
                    target_reps: reps,
                    target_volume: volume,
                    target_frequency: frequency,
                    target_workout_type: workout_type,
                    start_date: start,
                    target_date: Some(target_date),
                },
            )?;
            workspace.save()?;
            output(json, &goal, |g| {
                println!("{}", "✓ Goal created".green().bold());
                print_goal(g);
            })?;
        }

        GoalCommands::List { user } => {
            let goals = manager.list_goals(&user)?;
            output(json, &goals, |goals| {
                if goals.is_empty() {
                    println!("{}", "No goals".dimmed());
                }
                for goal in goals {
                    print_goal(goal);
                }
            })?;
        }

        GoalCommands::Show { user, id } => {
            let goal = manager.get_goal(&user, id)?;
            output(json, &goal, print_goal)?;
        }

        GoalCommands::Recalculate { user, id, all } => {
            match (user, id) {
                (Some(user), Some(id)) => {
                    let goal = manager.recalculate_goal(&user, id)?;
                    workspace.save()?;
                    output(json, &goal, print_goal)?;
                }
                (Some(user), None) if !all => {
                    let report = manager.recalculate_user_goals(&user)?;
                    workspace.save()?;
                    output(json, &report, print_sweep_report)?;
                }
                _ => {
                    let report = manager.recalculate_all_goals()?;
                    workspace.save()?;
                    output(json, &report, print_sweep_report)?;
                }
            }
        }

        GoalCommands::Complete { user, id } => {
            let goal = manager.complete_goal(&user, id)?;
            workspace.save()?;
            output(json, &goal, print_goal)?;
        }

        GoalCommands::Update {
            user,
            id,
            title,
            description,
            target_date,
        } => {
            let goal = manager.update_goal(
                &user,
                id,
                GoalUpdate {
                    title,
                    description,
                    target_date,
                },
            )?;
            workspace.save()?;
            output(json, &goal, print_goal)?;
        }
    }

    Ok(())
}

fn output<T: Serialize + ?Sized>(json: bool, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text(value);
    }
    Ok(())
}

fn print_range(title: &str, range: &DateRange) {
    println!(
        "{} {}",
        title.cyan().bold(),
        format!("({} to {})", range.start, range.end).dimmed()
    );
}

fn signed(value: Decimal) -> ColoredString {
    if value > Decimal::ZERO {
        format!("+{}", value).green()
    } else if value < Decimal::ZERO {
        value.to_string().red()
    } else {
        value.to_string().normal()
    }
}

fn print_strength(progress: &StrengthProgress) {
    print_range(&format!("Strength: {}", progress.exercise_name), &progress.range);

    if progress.points.is_empty() {
        println!("{}", "No sessions with this exercise in range".dimmed());
        return;
    }

    for point in &progress.points {
        println!(
            "  {}  {:>8} x {:<3} 1RM {:>8}  vol {:>10}  RPE {}",
            point.date,
            point.max_weight,
            point.reps_at_max_weight,
            point.estimated_one_rep_max,
            point.total_volume,
            point.average_rpe
        );
    }

    let summary = &progress.summary;
    println!(
        "  Weight {} -> {} ({}, {}%)",
        summary.starting_weight,
        summary.current_weight,
        signed(summary.weight_gain),
        signed(summary.weight_gain_percentage)
    );
    println!(
        "  1RM    {} -> {} ({}, {}%)",
        summary.starting_one_rep_max,
        summary.current_one_rep_max,
        signed(summary.one_rep_max_gain),
        signed(summary.one_rep_max_gain_percentage)
    );
}

fn print_volume(analysis: &VolumeAnalysis) {
    print_range("Volume", &analysis.range);
    println!(
        "  Total {} over {} workouts (avg {})",
        analysis.total_volume.to_string().bold(),
        analysis.workout_count,
        analysis.average_volume_per_workout
    );

    for exercise in &analysis.exercises {
        println!(
            "  {:<24} {:>12} {:>7}%  in {} sessions",
            exercise.exercise_name,
            exercise.total_volume,
            exercise.percentage,
            exercise.session_count
        );
    }
}

fn print_frequency(analysis: &FrequencyAnalysis) {
    print_range("Frequency", &analysis.range);
    println!(
        "  {} workouts, {} per month, every {} days on average",
        analysis.total_workouts.to_string().bold(),
        analysis.workouts_per_month,
        analysis.average_days_between_workouts
    );

    for entry in &analysis.by_type {
        println!("  {:<16} {:>4} {:>7}%", entry.workout_type, entry.count, entry.percentage);
    }
    for month in &analysis.by_month {
        println!("  {}-{:02}  {}", month.year, month.month, month.workout_count);
    }
}

fn print_comparison(comparison: &WorkoutComparison) {
    println!(
        "{} {} vs {} ({})",
        "Comparison".cyan().bold(),
        comparison.first.date,
        comparison.second.date,
        comparison.first.workout_type
    );
    println!(
        "  Volume {} -> {} ({}, {}%)",
        comparison.first.total_volume,
        comparison.second.total_volume,
        signed(comparison.volume_change),
        signed(comparison.volume_change_percentage)
    );
    println!(
        "  RPE    {} -> {} ({}, {}%)",
        comparison.first.average_rpe,
        comparison.second.average_rpe,
        signed(comparison.intensity_change),
        signed(comparison.intensity_change_percentage)
    );

    for exercise in &comparison.exercises {
        println!(
            "  {:<24} {:>10} -> {:<10} {}%",
            exercise.exercise_name,
            exercise.first_volume,
            exercise.second_volume,
            signed(exercise.volume_change_percentage)
        );
    }
}

fn print_goal(goal: &Goal) {
    let status = if goal.completed {
        "completed".green()
    } else {
        "active".yellow()
    };
    println!(
        "{} [{}] {} {}%  due {}  {}",
        goal.title.bold(),
        goal.goal_type(),
        status,
        goal.completion_percentage,
        goal.target_date,
        goal.id.to_string().dimmed()
    );
}

fn print_sweep_report(report: &SweepReport) {
    println!(
        "{} users {}, goals {}, updated {}, completed {}, notified {}, suppressed {}",
        "Sweep".cyan().bold(),
        report.users_processed,
        report.goals_processed,
        report.goals_updated,
        report.goals_completed,
        report.notifications_sent,
        report.notifications_suppressed
    );
    for failure in &report.failures {
        println!(
            "  {} {} {}: {}{}",
            "failed".red(),
            failure.user_id,
            failure
                .goal_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            failure.error,
            if failure.retryable { " (retry later)" } else { "" }
        );
    }
}
