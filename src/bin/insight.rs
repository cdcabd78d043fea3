//! Insight CLI - Command-line interface for Exam Insight
//!
//! Commands:
//! - student: Build one student's report from a course snapshot
//! - class: Build the educator report for a course or one exam
//! - validate: Validate snapshot records
//! - doctor: Diagnose configuration and input wiring
//! - schema: Describe the input record schema

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use exam_insight::pipeline::load_snapshot;
use exam_insight::schema::{SnapshotAdapter, SCHEMA_VERSION};
use exam_insight::{AnalyticsConfig, InsightProcessor, INSIGHT_VERSION, PRODUCER_NAME};

/// Insight - Deterministic compute engine for exam analytics
#[derive(Parser)]
#[command(name = "insight")]
#[command(version = INSIGHT_VERSION)]
#[command(about = "Turn evaluated exam answers into student and class analytics", long_about = None)]
struct Cli {
    /// Log engine stages at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build one student's report
    Student {
        /// Snapshot file: document, record array or NDJSON (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Student to analyse
        #[arg(long)]
        student_id: u64,

        /// Analytics configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Build the educator report
    Class {
        /// Snapshot file: document, record array or NDJSON (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Restrict to one exam (adds item analysis and calibration)
        #[arg(long)]
        exam_id: Option<u64>,

        /// Analytics configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Validate snapshot records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and input wiring
    Doctor {
        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Describe the input record schema
    Schema {
        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), InsightCliError> {
    match cli.command {
        Commands::Student {
            input,
            student_id,
            config,
            output,
            output_format,
        } => {
            let processor = processor(config.as_deref())?;
            let snapshot = load_snapshot(&read_input(&input)?)?;
            let report = processor.student_report(&snapshot, student_id);
            write_output(&output, &format_output(&report, &output_format)?)
        }

        Commands::Class {
            input,
            exam_id,
            config,
            output,
            output_format,
        } => {
            let processor = processor(config.as_deref())?;
            let snapshot = load_snapshot(&read_input(&input)?)?;
            let report = processor.class_report(&snapshot, exam_id);
            write_output(&output, &format_output(&report, &output_format)?)
        }

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema { json_schema } => cmd_schema(json_schema),
    }
}

fn processor(config: Option<&Path>) -> Result<InsightProcessor, InsightCliError> {
    match config {
        Some(path) => {
            let config = AnalyticsConfig::from_json(&fs::read_to_string(path)?)?;
            Ok(InsightProcessor::with_config(config))
        }
        None => Ok(InsightProcessor::new()),
    }
}

fn read_input(input: &Path) -> Result<String, InsightCliError> {
    let data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };
    if data.trim().is_empty() {
        return Err(InsightCliError::EmptyInput);
    }
    Ok(data)
}

fn write_output(output: &Path, content: &str) -> Result<(), InsightCliError> {
    if output.to_string_lossy() == "-" {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", content)?;
        stdout.flush()?;
    } else {
        fs::write(output, format!("{}\n", content))?;
    }
    Ok(())
}

fn format_output<T: Serialize>(report: &T, format: &OutputFormat) -> Result<String, InsightCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(report)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)?),
    }
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), InsightCliError> {
    let snapshot = SnapshotAdapter::parse(&read_input(input)?)?;
    let results = SnapshotAdapter::validate_snapshot(&snapshot);

    let total_records =
        snapshot.attempts.len() + snapshot.answers.len() + snapshot.prior_chapter_accuracy.len();
    let report = ValidationReport {
        course_id: snapshot.course_id,
        total_records,
        valid_records: total_records - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                record: r.record.as_str().to_string(),
                index: r.index,
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Course:          {}", report.course_id);
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {} #{}: {}", err.record, err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(InsightCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), InsightCliError> {
    let mut checks: Vec<DoctorCheck> = vec![
        DoctorCheck {
            name: "insight_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Insight version {}", INSIGHT_VERSION),
        },
        DoctorCheck {
            name: "schema_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Input schema: {}", SCHEMA_VERSION),
        },
    ];

    if let Some(path) = config {
        let check = match fs::read_to_string(path) {
            Ok(content) => match AnalyticsConfig::from_json(&content) {
                Ok(config) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config valid (pass threshold {}, window {})",
                        config.pass_threshold, config.moving_average_window
                    ),
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read config file: {}", e),
            },
        };
        checks.push(check);
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (pass --input <file>)"
    } else {
        "stdin is a pipe (--input - ready)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: INSIGHT_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Insight Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    if report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error))
    {
        Err(InsightCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(json_schema: bool) -> Result<(), InsightCliError> {
    if json_schema {
        println!("{}", input_json_schema());
        return Ok(());
    }

    println!("Input Schema: {}", SCHEMA_VERSION);
    println!();
    println!("A snapshot is either one JSON document with the keys");
    println!("course_id, chapters, concepts, students, attempts, answers and");
    println!("prior_chapter_accuracy, or a stream of records (JSON array or NDJSON)");
    println!("tagged by record_type:");
    println!();
    println!("1. course - {{ course_id, schema_version? }}, exactly one course per stream");
    println!("2. chapter - {{ id, name, sequence_order?, prerequisites? }}");
    println!("3. concept - {{ id, name, chapter_id, prerequisites? }}");
    println!("4. student - {{ id, name }}");
    println!("5. attempt - {{ attempt_id, student_id, exam_id, percentage, submitted_at }}");
    println!("6. answer - {{ attempt_id, student_id, exam_id, question_id, is_correct,");
    println!("   is_skipped?, time_spent_seconds?, chapter_id, concept_ids?, difficulty,");
    println!("   question_type?, selected_option_id?, submitted_at }}");
    println!("7. prior_accuracy - {{ student_id, chapter_id, accuracy }}");
    println!();
    println!("Difficulty: easy, medium, hard, expert");
    println!("Question types: mcq, true_false (recall); short_answer, long_answer, coding (application)");
    Ok(())
}

fn input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": SCHEMA_VERSION,
        "description": "Exam Insight snapshot record",
        "type": "object",
        "required": ["record_type"],
        "properties": {
            "record_type": {
                "type": "string",
                "enum": ["course", "chapter", "concept", "student", "attempt", "answer", "prior_accuracy"]
            },
            "schema_version": { "type": "string", "const": SCHEMA_VERSION },
            "percentage": { "type": "number", "minimum": 0, "maximum": 100 },
            "accuracy": { "type": "number", "minimum": 0, "maximum": 100 },
            "time_spent_seconds": { "type": "number", "minimum": 0 },
            "difficulty": { "type": "string", "enum": ["easy", "medium", "hard", "expert"] },
            "question_type": {
                "type": "string",
                "enum": ["mcq", "true_false", "short_answer", "long_answer", "coding"]
            },
            "concept_ids": { "type": "array", "items": { "type": "integer" } },
            "prerequisites": { "type": "array", "items": { "type": "integer" } },
            "submitted_at": { "type": "string", "format": "date-time" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum InsightCliError {
    Io(io::Error),
    Analytics(exam_insight::AnalyticsError),
    Json(serde_json::Error),
    EmptyInput,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for InsightCliError {
    fn from(e: io::Error) -> Self {
        InsightCliError::Io(e)
    }
}

impl From<exam_insight::AnalyticsError> for InsightCliError {
    fn from(e: exam_insight::AnalyticsError) -> Self {
        InsightCliError::Analytics(e)
    }
}

impl From<serde_json::Error> for InsightCliError {
    fn from(e: serde_json::Error) -> Self {
        InsightCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<InsightCliError> for CliError {
    fn from(e: InsightCliError) -> Self {
        match e {
            InsightCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            InsightCliError::Analytics(e @ exam_insight::AnalyticsError::InvalidConfig(_)) => {
                CliError {
                    code: "CONFIG_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some("Run 'insight doctor --config <file>' for details".to_string()),
                }
            }
            InsightCliError::Analytics(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!("Ensure input matches the {} schema", SCHEMA_VERSION)),
            },
            InsightCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            InsightCliError::EmptyInput => CliError {
                code: "EMPTY_INPUT".to_string(),
                message: "No snapshot found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            InsightCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Invalid records are dropped before analysis".to_string()),
            },
            InsightCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct ValidationReport {
    course_id: u64,
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    record: String,
    index: usize,
    error: String,
}

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Error,
}
