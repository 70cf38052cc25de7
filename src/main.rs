use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use hiretrack::config::Config;
use hiretrack::lookup::Labels;
use hiretrack::models::{
    Candidate, CandidatePatch, CandidateStage, Interview, InterviewPatch, Job, JobPatch, JobStatus,
};
use hiretrack::screens::{self, InterviewBoard};
use hiretrack::validation::{CandidateDraft, InterviewDraft, JobDraft, SkillSet};
use hiretrack::view::{ListView, PageSlice};
use hiretrack::{Record, RecordStore, Screen, Store};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hiretrack")]
#[command(about = "HireTrack CLI - jobs, candidates and interviews")]
#[command(version)]
struct Cli {
    /// Path to the store directory (default: from config, else current directory)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Config file (default: ~/.config/hiretrack/hiretrack.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage job postings
    #[command(subcommand)]
    Jobs(JobsCommand),

    /// Manage candidates
    #[command(subcommand)]
    Candidates(CandidatesCommand),

    /// Schedule and evaluate interviews
    #[command(subcommand)]
    Interviews(InterviewsCommand),

    /// Rebuild the SQLite cache from JSONL files
    Sync,
}

#[derive(Args)]
struct PageArgs {
    /// Page to show (clamped to the available pages)
    #[arg(short, long, default_value_t = 1)]
    page: usize,
}

#[derive(Args)]
struct DeleteArgs {
    id: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

#[derive(Subcommand)]
enum JobsCommand {
    /// List jobs
    List {
        /// Title contains (case-insensitive)
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<JobStatus>,
        #[arg(long)]
        department: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one job
    Show { id: String },
    /// Post a new job
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        department: String,
        #[arg(long, default_value_t = String::new())]
        description: String,
        #[arg(long, default_value_t = JobStatus::Open)]
        status: JobStatus,
        /// Required skill (repeatable)
        #[arg(long = "skill")]
        skills: Vec<String>,
    },
    /// Change fields of a job
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<JobStatus>,
        /// Replace required skills (repeatable)
        #[arg(long = "skill")]
        skills: Option<Vec<String>>,
    },
    /// Delete a job
    Delete(DeleteArgs),
}

#[derive(Subcommand)]
enum CandidatesCommand {
    /// List candidates
    List {
        /// Name contains (case-insensitive)
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        stage: Option<CandidateStage>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one candidate
    Show { id: String },
    /// Add a candidate to a job
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Id of the job applied for
        #[arg(long)]
        job: String,
        #[arg(long, default_value_t = String::new())]
        resume_url: String,
        #[arg(long, default_value_t = String::new())]
        source: String,
        #[arg(long, default_value_t = CandidateStage::Applied)]
        stage: CandidateStage,
        /// Skill tag (repeatable)
        #[arg(long = "skill")]
        skills: Vec<String>,
    },
    /// Change fields of a candidate
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        job: Option<String>,
        #[arg(long)]
        resume_url: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        stage: Option<CandidateStage>,
        /// Replace skill tags (repeatable)
        #[arg(long = "skill")]
        skills: Option<Vec<String>>,
    },
    /// Delete a candidate
    Delete(DeleteArgs),
}

#[derive(Subcommand)]
enum InterviewsCommand {
    /// List interviews
    List {
        /// Candidate name contains (case-insensitive)
        #[arg(long)]
        search: Option<String>,
        /// Job id
        #[arg(long)]
        job: Option<String>,
        /// Candidate id
        #[arg(long)]
        candidate: Option<String>,
        /// Day of the interview (YYYY-MM-DD, UTC)
        #[arg(long)]
        date: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one interview
    Show { id: String },
    /// Schedule an interview
    Add {
        #[arg(long)]
        job: String,
        #[arg(long)]
        candidate: String,
        /// Start time, RFC 3339 or "YYYY-MM-DD HH:MM" (UTC)
        #[arg(long, value_parser = parse_time)]
        at: DateTime<Utc>,
        /// Interview type, e.g. phone or onsite
        #[arg(long = "type", default_value_t = String::new())]
        kind: String,
    },
    /// Reschedule or annotate an interview
    Edit {
        id: String,
        #[arg(long, value_parser = parse_time)]
        at: Option<DateTime<Utc>>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Record a score (1-5) and notes after the interview
    Evaluate {
        id: String,
        #[arg(long)]
        score: f64,
        #[arg(long, default_value_t = String::new())]
        notes: String,
    },
    /// Delete an interview
    Delete(DeleteArgs),
}

fn parse_time(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .map(|t| t.and_utc())
        .map_err(|_| format!("invalid time '{}': expected RFC 3339 or YYYY-MM-DD HH:MM", s))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    // Open store
    let store_path = cli.store_path.unwrap_or_else(|| config.store_path.clone());
    let mut store = Store::open(&store_path)?;

    match cli.command {
        Commands::Jobs(cmd) => run_jobs(cmd, &mut store, &config),
        Commands::Candidates(cmd) => run_candidates(cmd, &mut store, &config),
        Commands::Interviews(cmd) => run_interviews(cmd, &mut store, &config),
        Commands::Sync => {
            println!("Syncing database from JSONL files...");
            store.sync()?;
            println!("Sync complete");
            Ok(())
        }
    }
}

// ============================================================================
// Jobs
// ============================================================================

fn run_jobs(cmd: JobsCommand, store: &mut Store, config: &Config) -> Result<()> {
    match cmd {
        JobsCommand::List {
            search,
            status,
            department,
            page,
        } => {
            let mut screen = Screen::enter(&*store, screens::job_filters(), config.page_size()?)?;
            let view = screen.view_mut();
            set_filters(
                view,
                [
                    (screens::SEARCH, search),
                    (screens::STATUS, status.map(|s| s.to_string())),
                    (screens::DEPARTMENT, department),
                ],
            );
            view.set_page(page.page);

            print_facet("Departments", &view.facet(screens::DEPARTMENT));
            print_filters(view);
            print_page(&view.current_slice(), "jobs", |job| {
                format!(
                    "{}  {}  {}  {}",
                    job.id.dimmed(),
                    job.title.bold(),
                    job.department,
                    status_label(job.status)
                )
            });
        }
        JobsCommand::Show { id } => {
            let job = Screen::<Job>::detail(&*store, &id)?;
            println!("{} {}", job.title.bold(), status_label(job.status));
            field("ID", &job.id);
            field("Department", &job.department);
            field("Skills", &job.required_skills.join(", "));
            if let Some(posted) = job.created_at {
                field("Posted", &format_time(posted, config));
            }
            if let Some(description) = &job.description {
                println!("\n{}", description);
            }
        }
        JobsCommand::Add {
            title,
            department,
            description,
            status,
            skills,
        } => {
            let mut screen = Screen::enter(&*store, screens::job_filters(), config.page_size()?)?;
            let draft = JobDraft {
                title,
                department,
                description,
                status,
                skills: skills.iter().collect::<SkillSet>(),
            };
            let id = screen.create(store, draft, Utc::now())?;
            println!("{} {}", "Created job".green(), id);
        }
        JobsCommand::Edit {
            id,
            title,
            department,
            description,
            status,
            skills,
        } => {
            let patch = JobPatch {
                title,
                department,
                description,
                status,
                required_skills: skills.map(|s| s.iter().collect::<SkillSet>().into_vec()),
            };
            if patch == JobPatch::default() {
                return Err(eyre!("Nothing to change"));
            }
            let mut screen = Screen::enter(&*store, screens::job_filters(), config.page_size()?)?;
            screen.update(store, &id, &patch, Utc::now())?;
            println!("{} {}", "Updated job".green(), id);
        }
        JobsCommand::Delete(args) => delete::<Job>(store, screens::job_filters(), args, config)?,
    }
    Ok(())
}

fn status_label(status: JobStatus) -> colored::ColoredString {
    match status {
        JobStatus::Open => status.to_string().green(),
        JobStatus::Closed => status.to_string().red(),
    }
}

// ============================================================================
// Candidates
// ============================================================================

fn run_candidates(cmd: CandidatesCommand, store: &mut Store, config: &Config) -> Result<()> {
    match cmd {
        CandidatesCommand::List { search, stage, page } => {
            let jobs = store.list::<Job>()?;
            let job_titles = Labels::build(&jobs, |j| j.title.as_str());

            let mut screen = Screen::enter(&*store, screens::candidate_filters(), config.page_size()?)?;
            let view = screen.view_mut();
            set_filters(
                view,
                [
                    (screens::SEARCH, search),
                    (screens::STAGE, stage.map(|s| s.to_string())),
                ],
            );
            view.set_page(page.page);

            print_filters(view);
            print_page(&view.current_slice(), "candidates", |c| {
                format!(
                    "{}  {}  {}  {}  {}",
                    c.id.dimmed(),
                    c.name.bold(),
                    c.email,
                    job_titles.get(&c.applied_job_id),
                    c.stage.to_string().cyan()
                )
            });
        }
        CandidatesCommand::Show { id } => {
            let candidate = Screen::<Candidate>::detail(&*store, &id)?;
            let jobs = store.list::<Job>()?;

            println!("{} {}", candidate.name.bold(), candidate.stage.to_string().cyan());
            field("ID", &candidate.id);
            field("Email", &candidate.email);
            field(
                "Applied for",
                &hiretrack::lookup(&jobs, &candidate.applied_job_id, |j| j.title.as_str()),
            );
            field("Skills", &candidate.skills.join(", "));
            if let Some(source) = &candidate.source {
                field("Source", source);
            }
            if let Some(resume) = &candidate.resume_url {
                field("Resume", resume);
            }
            if let Some(applied) = candidate.created_at {
                field("Applied", &format_time(applied, config));
            }
        }
        CandidatesCommand::Add {
            name,
            email,
            job,
            resume_url,
            source,
            stage,
            skills,
        } => {
            Screen::<Job>::detail(&*store, &job)?;

            let mut screen = Screen::enter(&*store, screens::candidate_filters(), config.page_size()?)?;
            let draft = CandidateDraft {
                name,
                email,
                applied_job_id: job,
                resume_url,
                stage,
                source,
                skills: skills.iter().collect::<SkillSet>(),
            };
            let id = screen.create(store, draft, Utc::now())?;
            println!("{} {}", "Created candidate".green(), id);
        }
        CandidatesCommand::Edit {
            id,
            name,
            email,
            job,
            resume_url,
            source,
            stage,
            skills,
        } => {
            if let Some(job) = &job {
                Screen::<Job>::detail(&*store, job)?;
            }
            let patch = CandidatePatch {
                name,
                email,
                applied_job_id: job,
                resume_url,
                stage,
                source,
                skills: skills.map(|s| s.iter().collect::<SkillSet>().into_vec()),
            };
            if patch == CandidatePatch::default() {
                return Err(eyre!("Nothing to change"));
            }
            let mut screen = Screen::enter(&*store, screens::candidate_filters(), config.page_size()?)?;
            screen.update(store, &id, &patch, Utc::now())?;
            println!("{} {}", "Updated candidate".green(), id);
        }
        CandidatesCommand::Delete(args) => delete::<Candidate>(store, screens::candidate_filters(), args, config)?,
    }
    Ok(())
}

// ============================================================================
// Interviews
// ============================================================================

fn run_interviews(cmd: InterviewsCommand, store: &mut Store, config: &Config) -> Result<()> {
    match cmd {
        InterviewsCommand::List {
            search,
            job,
            candidate,
            date,
            page,
        } => {
            let mut board = InterviewBoard::enter(&*store, config.page_size()?)?;
            let view = board.screen.view_mut();
            set_filters(
                view,
                [
                    (screens::SEARCH, search),
                    (screens::JOB, job),
                    (screens::CANDIDATE, candidate),
                    (screens::DATE, date),
                ],
            );
            view.set_page(page.page);
            print_filters(view);

            let board = &board;
            print_page(&board.screen.view().current_slice(), "interviews", |i| {
                format!(
                    "{}  {}  {}  {}  {}",
                    i.id.dimmed(),
                    format_time(i.scheduled_at.unwrap_or(i.date), config),
                    board.candidate_name(&i.candidate_id).bold(),
                    board.job_title(&i.job_id),
                    score_label(i.score)
                )
            });
        }
        InterviewsCommand::Show { id } => {
            let interview = Screen::<Interview>::detail(&*store, &id)?;
            let board = InterviewBoard::enter(&*store, config.page_size()?)?;

            println!(
                "{} / {}",
                board.candidate_name(&interview.candidate_id).bold(),
                board.job_title(&interview.job_id)
            );
            field("ID", &interview.id);
            field("Date", &format_time(interview.date, config));
            if let Some(at) = interview.scheduled_at {
                field("Scheduled", &format_time(at, config));
            }
            if let Some(kind) = &interview.kind {
                field("Type", kind);
            }
            field("Score", &score_label(interview.score).to_string());
            if let Some(notes) = &interview.notes {
                println!("\n{}", notes);
            }
        }
        InterviewsCommand::Add {
            job,
            candidate,
            at,
            kind,
        } => {
            Screen::<Job>::detail(&*store, &job)?;
            Screen::<Candidate>::detail(&*store, &candidate)?;

            let mut board = InterviewBoard::enter(&*store, config.page_size()?)?;
            let draft = InterviewDraft {
                job_id: job,
                candidate_id: candidate,
                date: Some(at),
                scheduled_at: Some(at),
                kind,
                score: None,
            };
            let id = board.screen.create(store, draft, Utc::now())?;
            println!("{} {}", "Scheduled interview".green(), id);
        }
        InterviewsCommand::Edit { id, at, kind, notes } => {
            let patch = InterviewPatch {
                date: at,
                scheduled_at: at,
                notes,
                kind,
                score: None,
            };
            if patch == InterviewPatch::default() {
                return Err(eyre!("Nothing to change"));
            }
            let mut board = InterviewBoard::enter(&*store, config.page_size()?)?;
            board.screen.update(store, &id, &patch, Utc::now())?;
            println!("{} {}", "Updated interview".green(), id);
        }
        InterviewsCommand::Evaluate { id, score, notes } => {
            let mut board = InterviewBoard::enter(&*store, config.page_size()?)?;
            board
                .screen
                .update(store, &id, &InterviewPatch::evaluation(score, notes), Utc::now())?;
            println!("{} {}", "Evaluation saved for".green(), id);
        }
        InterviewsCommand::Delete(args) => {
            let candidates = store.list::<Candidate>()?;
            delete::<Interview>(store, screens::interview_filters(&candidates), args, config)?
        }
    }
    Ok(())
}

fn score_label(score: Option<f64>) -> colored::ColoredString {
    match score {
        Some(s) => format!("{:.1}/5", s).yellow(),
        None => "not scored".dimmed(),
    }
}

// ============================================================================
// Shared
// ============================================================================

fn set_filters<R: Record, const N: usize>(view: &mut ListView<R>, filters: [(&str, Option<String>); N]) {
    for (name, value) in filters {
        if let Some(value) = value {
            view.set_filter(name, value);
        }
    }
}

fn delete<R: Record>(
    store: &mut Store,
    defs: Vec<hiretrack::FilterDef<R>>,
    args: DeleteArgs,
    config: &Config,
) -> Result<()> {
    let collection = R::collection_name();
    if !args.yes && !confirm(&format!("Delete {} {}?", collection, args.id))? {
        println!("Cancelled");
        return Ok(());
    }

    let mut screen = Screen::enter(&*store, defs, config.page_size()?)?;
    screen.delete(store, &args.id)?;
    println!("{} {} {}", "Deleted".green(), collection, args.id);
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_page<R, F>(slice: &PageSlice<'_, R>, noun: &str, row: F)
where
    F: Fn(&R) -> String,
{
    if slice.items.is_empty() {
        println!("No {} found.", noun);
        return;
    }

    for item in &slice.items {
        println!("{}", row(item));
    }

    if slice.show_pagination() {
        println!(
            "{}",
            format!(
                "Page {} of {} ({} {})",
                slice.page, slice.total_pages, slice.total_items, noun
            )
            .dimmed()
        );
    }
}

fn print_filters<R: Record>(view: &ListView<R>) {
    let active: Vec<String> = view
        .active_filters()
        .into_iter()
        .map(|(name, kind, value)| format!("{} {} {}", name, kind, value))
        .collect();
    if !active.is_empty() {
        println!("{}", format!("Filters: {}", active.join(", ")).dimmed());
    }
}

fn print_facet(label: &str, values: &[String]) {
    if !values.is_empty() {
        println!("{}", format!("{}: {}", label, values.join(", ")).dimmed());
    }
}

fn field(label: &str, value: &str) {
    println!("  {:<12} {}", format!("{}:", label).dimmed(), value);
}

fn format_time(t: DateTime<Utc>, config: &Config) -> String {
    t.format(&config.date_format).to_string()
}
