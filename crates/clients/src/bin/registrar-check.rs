use clap::{Parser, Subcommand};
use registrar_breaker::{CallContext, CanonicalError};
use registrar_clients::{ClientsConfig, Dependencies, NewStudentProfile, load_config, logging};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "registrar-check")]
#[command(about = "Call the course catalog and student registry through the resilient client layer", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults plus environment overrides when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trace id forwarded to the dependencies (a new UUID when omitted)
    #[arg(short, long)]
    trace_id: Option<String>,

    /// Bearer token forwarded to the dependencies
    #[arg(long)]
    token: Option<String>,

    /// Overall deadline for the call, in seconds
    #[arg(long)]
    deadline_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a course by id
    Course { id: i64 },
    /// Check that a course exists
    ValidateCourse { id: i64 },
    /// Check whether a student is enrolled in a course
    Enrolled { student: i64, course: i64 },
    /// Fetch a student by id or student number
    Student { id: String },
    /// Check that a student exists
    ValidateStudent { id: String },
    /// Look up a student number by email
    StudentNumber { email: String },
    /// Student number for a user, creating a first-year profile if needed
    EnsureProfile {
        user_id: u64,
        email: String,
        username: String,
    },
    /// Breaker and connection state of every dependency
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientsConfig::from_env()?,
    };
    logging::init(&config.logging)?;

    let deps = Dependencies::from_config(&config);
    deps.startup().await;

    // This binary is the ingress here, so it owns trace id creation
    let trace_id = cli.trace_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut ctx = CallContext::traced(trace_id);
    if let Some(secs) = cli.deadline_secs {
        ctx = ctx.with_timeout(Duration::from_secs(secs));
    }
    if let Some(token) = cli.token {
        ctx = ctx.with_bearer_token(token);
    }

    match run(&deps, &ctx, cli.command).await {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(error) => {
            eprintln!("{}", serde_json::to_string_pretty(&error)?);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn run(deps: &Dependencies, ctx: &CallContext, command: Commands) -> Result<Value, CanonicalError> {
    Ok(match command {
        Commands::Course { id } => json!(deps.courses.get_course(ctx, id).await?),
        Commands::ValidateCourse { id } => {
            json!({ "courseId": id, "exists": deps.courses.validate_course(ctx, id).await? })
        }
        Commands::Enrolled { student, course } => json!({
            "studentId": student,
            "courseId": course,
            "enrolled": deps.courses.check_enrollment(ctx, student, course).await?,
        }),
        Commands::Student { id } => json!(deps.students.get_student(ctx, &id).await?),
        Commands::ValidateStudent { id } => {
            let exists = deps.students.validate_student(ctx, &id).await?;
            json!({ "studentId": id, "exists": exists })
        }
        Commands::StudentNumber { email } => {
            let number = deps.students.find_student_number_by_email(ctx, &email).await?;
            json!({ "email": email, "studentNumber": number })
        }
        Commands::EnsureProfile { user_id, email, username } => {
            let profile = NewStudentProfile::for_user(user_id, email, username);
            let number = deps.students.get_or_create_student_profile(ctx, &profile).await?;
            json!({ "userId": user_id, "studentNumber": number })
        }
        Commands::Health => json!(deps.health()),
    })
}
