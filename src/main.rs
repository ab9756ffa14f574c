use anyhow::Context;
use clap::{Parser, Subcommand};
use sow_criticality::config::Config;
use sow_criticality::data::{generate, load_dataset, write_dataset};
use sow_criticality::ml::{
    stratified_split, validate_critical_cases, CriticalityTrainer, DatasetPreparer,
    ForestParams,
};
use sow_criticality::models::Criticality;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sow-criticality")]
#[command(about = "SOW criticality classification pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic SOW dataset
    Generate {
        /// Output CSV path (defaults to the configured dataset path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of records, gold cases included
        #[arg(short, long)]
        count: Option<usize>,

        /// Fixed seed for a reproducible dataset
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Train the criticality classifier and persist the artifact
    Train {
        /// Dataset CSV path (defaults to the configured dataset path)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Artifact output path (defaults to the configured model path)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Re-score the gold critical cases through a persisted model
    Validate {
        /// Artifact path (defaults to the configured model path)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Dataset CSV holding the gold cases (SOW IDs containing "CRIT")
        #[arg(short, long)]
        dataset: Option<PathBuf>,
    },

    /// Classify a dataset with a persisted model
    Predict {
        /// Artifact path (defaults to the configured model path)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Dataset CSV path to classify
        #[arg(short, long)]
        dataset: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sow_criticality=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("failed to load configuration")?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            output,
            count,
            seed,
        } => {
            let output = output.unwrap_or_else(|| config.data.dataset_path.clone());
            let count = count.unwrap_or(config.generator.total_records);
            let seed = seed.or(config.generator.seed);

            let today = chrono::Local::now().date_naive();
            let records = generate(count, seed, today);
            write_dataset(&output, &records)?;
            println!("Generated {} records -> {}", records.len(), output.display());
        }

        Commands::Train { dataset, model } => {
            let dataset = dataset.unwrap_or_else(|| config.data.dataset_path.clone());
            let model = model.unwrap_or_else(|| config.model.artifact_path.clone());

            let records = load_dataset(&dataset)?;

            let mut preparer = DatasetPreparer::new();
            let prepared = preparer.prepare(&records)?;

            println!("Class distribution:");
            for (class, count) in prepared.class_distribution() {
                println!("  {class:<8} {count}");
            }

            let split = stratified_split(
                &prepared.features,
                &prepared.labels,
                config.training.test_fraction,
                config.training.seed,
            )?;

            let params = ForestParams {
                n_trees: config.training.n_trees,
                max_depth: config.training.max_depth,
                min_samples_split: config.training.min_samples_split,
                min_samples_leaf: config.training.min_samples_leaf,
                seed: config.training.seed,
            };
            let mut trainer = CriticalityTrainer::new(preparer.into_engineer(), params)?;
            trainer.train(&split.x_train, &split.y_train)?;
            let metrics = trainer.evaluate(&split.x_test, &split.y_test)?;

            println!();
            println!("Train accuracy: {:.2}%", metrics.train_accuracy * 100.0);
            println!("Test accuracy:  {:.2}%", metrics.test_accuracy * 100.0);

            println!();
            println!("Per-class metrics (test set):");
            println!("  {:<8} {:>9} {:>9} {:>9} {:>8}", "class", "precision", "recall", "f1", "support");
            for class in Criticality::ALL {
                if let Some(m) = metrics.per_class.get(&class.to_string()) {
                    println!(
                        "  {:<8} {:>9.3} {:>9.3} {:>9.3} {:>8}",
                        class.to_string(),
                        m.precision,
                        m.recall,
                        m.f1_score,
                        m.support
                    );
                }
            }

            println!();
            println!("Confusion matrix (rows = truth):");
            print!("  {:<8}", "");
            for class in Criticality::ALL {
                print!(" {:>8}", class.to_string());
            }
            println!();
            for truth in Criticality::ALL {
                print!("  {:<8}", truth.to_string());
                for pred in Criticality::ALL {
                    print!(
                        " {:>8}",
                        metrics.confusion_matrix[[truth.as_index(), pred.as_index()]]
                    );
                }
                println!();
            }

            println!();
            println!("Top feature importances:");
            for (rank, (name, score)) in
                trainer.feature_importance()?.iter().take(10).enumerate()
            {
                println!("  {:>2}. {name:<24} {score:.4}", rank + 1);
            }

            let gold: Vec<_> = records
                .iter()
                .filter(|r| r.sow_id.contains("CRIT"))
                .cloned()
                .collect();
            if gold.is_empty() {
                println!("\nNo gold critical cases in the dataset; skipping validation");
            } else {
                let report = validate_critical_cases(
                    &trainer,
                    &gold,
                    config.validation.accuracy_threshold,
                )?;
                print_validation(&report);
            }

            trainer.save(&model)?;
            println!("\nModel saved -> {}", model.display());
        }

        Commands::Validate { model, dataset } => {
            let model = model.unwrap_or_else(|| config.model.artifact_path.clone());
            let dataset = dataset.unwrap_or_else(|| config.data.dataset_path.clone());

            let trainer = CriticalityTrainer::load(&model)?;
            let records = load_dataset(&dataset)?;
            let gold: Vec<_> = records
                .into_iter()
                .filter(|r| r.sow_id.contains("CRIT"))
                .collect();

            let report = validate_critical_cases(
                &trainer,
                &gold,
                config.validation.accuracy_threshold,
            )?;
            print_validation(&report);
        }

        Commands::Predict { model, dataset } => {
            let model = model.unwrap_or_else(|| config.model.artifact_path.clone());
            let dataset = dataset.unwrap_or_else(|| config.data.dataset_path.clone());

            let trainer = CriticalityTrainer::load(&model)?;
            let records = load_dataset(&dataset)?;

            let features = trainer.engineer().transform(&records)?;
            let predictions = trainer.predict(&features)?;
            let probabilities = trainer.predict_proba(&features)?;

            println!(
                "{:<20} {:>6} {:>8} {:>9}  probabilities (BAJO/MEDIO/ALTO/CRÍTICO)",
                "SOW ID", "days", "workers", "predicted"
            );
            for (i, (record, predicted)) in
                records.iter().zip(predictions.iter()).enumerate()
            {
                let proba: Vec<String> = Criticality::ALL
                    .iter()
                    .map(|c| format!("{:.2}", probabilities[[i, c.as_index()]]))
                    .collect();
                println!(
                    "{:<20} {:>6} {:>8} {:>9}  [{}]",
                    record.sow_id,
                    record.days_before_expiration,
                    record.active_sow_workers,
                    predicted.to_string(),
                    proba.join(", ")
                );
            }
        }
    }

    Ok(())
}

fn print_validation(report: &sow_criticality::ml::ValidationReport) {
    println!();
    println!("Gold-case validation:");
    println!(
        "  {:<20} {:>6} {:>8} {:>9} {:>10}  ok",
        "SOW ID", "days", "workers", "expected", "predicted"
    );
    for case in &report.cases {
        println!(
            "  {:<20} {:>6} {:>8} {:>9} {:>10}  {}",
            case.sow_id,
            case.days_before_expiration,
            case.active_sow_workers,
            case.expected.to_string(),
            case.predicted.to_string(),
            if case.correct { "✓" } else { "✗" }
        );
    }
    println!("  Accuracy: {:.1}%", report.accuracy * 100.0);
    if report.below_threshold {
        println!("  WARNING: the model is not identifying the critical cases reliably");
    }
}
