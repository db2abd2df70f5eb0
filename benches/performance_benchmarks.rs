use criterion::{criterion_group, criterion_main, Criterion, BenchmarkId, Throughput, black_box};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;
use liftrs::analytics::{ComparisonAnalyzer, FrequencyAnalyzer, StrengthProgressAnalyzer, VolumeAnalyzer};
use liftrs::goals::{GoalTarget, ProgressContext};
use liftrs::models::{
    DateRange, Exercise, ExerciseSet, SetType, WorkoutExercise, WorkoutSession, WorkoutType,
};

/// Performance benchmarks for the workout analyzers
///
/// Each analyzer runs over histories of increasing length to check that
/// per-session aggregation scales linearly.

fn bench_strength_progress(c: &mut Criterion) {
    let exercises = create_exercise_catalog();
    let analyzer = StrengthProgressAnalyzer::new();

    let mut group = c.benchmark_group("Strength Progress");

    for &size in &[10, 100, 1000] {
        let sessions = create_session_history(size, &exercises);
        let range = full_range(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("analyze", size), &sessions, |b, sessions| {
            b.iter(|| analyzer.analyze(black_box(&exercises[0]), range, sessions));
        });
    }

    group.finish();
}

fn bench_volume_analysis(c: &mut Criterion) {
    let exercises = create_exercise_catalog();
    let analyzer = VolumeAnalyzer::new();

    let mut group = c.benchmark_group("Volume Analysis");

    for &size in &[10, 100, 1000] {
        let sessions = create_session_history(size, &exercises);
        let range = full_range(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("analyze", size), &sessions, |b, sessions| {
            b.iter(|| analyzer.analyze(black_box(sessions), range));
        });
    }

    group.finish();
}

fn bench_frequency_analysis(c: &mut Criterion) {
    let exercises = create_exercise_catalog();
    let analyzer = FrequencyAnalyzer::new();

    let mut group = c.benchmark_group("Frequency Analysis");

    for &size in &[100, 1000] {
        let sessions = create_session_history(size, &exercises);
        let range = full_range(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("analyze", size), &sessions, |b, sessions| {
            b.iter(|| analyzer.analyze(black_box(sessions), range));
        });
    }

    group.finish();
}

fn bench_workout_comparison(c: &mut Criterion) {
    let exercises = create_exercise_catalog();
    let sessions = create_session_history(2, &exercises);
    let mut second = sessions[0].clone();
    second.date += Duration::days(7);

    c.bench_function("compare_workouts", |b| {
        b.iter(|| ComparisonAnalyzer::new().compare(black_box(&sessions[0]), black_box(&second)))
    });
}

fn bench_goal_progress(c: &mut Criterion) {
    let exercises = create_exercise_catalog();
    let sessions = create_session_history(1000, &exercises);
    let context = ProgressContext {
        start_date: start_date(),
        today: start_date() + Duration::days(1000),
    };

    let targets = [
        ("strength", GoalTarget::Strength {
            exercise_id: exercises[0].id,
            target_weight: dec!(500),
            target_reps: 5,
        }),
        ("volume", GoalTarget::Volume {
            exercise_id: exercises[1].id,
            target_volume: dec!(100000),
        }),
        ("frequency", GoalTarget::Frequency {
            target_frequency: 16,
            workout_type: None,
        }),
    ];

    let mut group = c.benchmark_group("Goal Progress");
    for (name, target) in &targets {
        group.bench_with_input(BenchmarkId::new("compute_progress", name), target, |b, target| {
            b.iter(|| target.compute_progress(black_box(&sessions), &context));
        });
    }
    group.finish();
}

// Helper functions for creating benchmark data

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
}

fn full_range(days: usize) -> DateRange {
    DateRange::new(start_date(), start_date() + Duration::days(days as i64)).unwrap()
}

fn create_exercise_catalog() -> Vec<Exercise> {
    ["Squat", "Bench Press", "Deadlift", "Row", "Overhead Press", "Pull Up"]
        .iter()
        .map(|name| Exercise {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: None,
        })
        .collect()
}

fn create_session_history(count: usize, exercises: &[Exercise]) -> Vec<WorkoutSession> {
    let workout_types = [WorkoutType::Push, WorkoutType::Pull, WorkoutType::Legs];

    (0..count)
        .map(|i| {
            let load = dec!(60) + Decimal::from((i % 40) as u32);
            WorkoutSession {
                id: Uuid::new_v4(),
                user_id: "bench-user".to_string(),
                date: start_date() + Duration::days(i as i64),
                workout_type: workout_types[i % workout_types.len()].clone(),
                completed: i % 10 != 0,
                exercises: exercises
                    .iter()
                    .take(4)
                    .enumerate()
                    .map(|(order, exercise)| WorkoutExercise {
                        exercise: exercise.clone(),
                        order: order as u32,
                        sets: (0..4)
                            .map(|set| ExerciseSet {
                                set_type: SetType::Working,
                                weight: load,
                                reps: 5 + set,
                                rpe: dec!(7.5),
                                completed: true,
                                order: set as u32,
                            })
                            .collect(),
                    })
                    .collect(),
                notes: None,
            }
        })
        .collect()
}

criterion_group!(
    benches,
    bench_strength_progress,
    bench_volume_analysis,
    bench_frequency_analysis,
    bench_workout_comparison,
    bench_goal_progress
);

criterion_main!(benches);
