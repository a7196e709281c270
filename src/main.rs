use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use studyrag::config::Config;
use studyrag::courses::CourseRegistry;
use studyrag::embedder::mock::MockEmbedder;
use studyrag::embedder::openai::OpenAiEmbedder;
use studyrag::embedder::Embedder;
use studyrag::generator::mock::MockGenerator;
use studyrag::generator::openai::OpenAiGenerator;
use studyrag::generator::Generator;
use studyrag::qa::QaEngine;
use studyrag::server::{self, AppState};
use studyrag::store::VectorStore;

/// Exit code for "not found" outcomes.
const EXIT_NOT_FOUND: u8 = 1;
/// Exit code for build/load failures.
const EXIT_FAILED: u8 = 2;

#[derive(Parser)]
#[command(name = "studyrag")]
#[command(about = "Index course notes and answer questions grounded in them")]
#[command(version)]
struct Cli {
    /// Path to the JSON config file (defaults to config.json)
    #[arg(long, global = true, default_value = "")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or rebuild) the index for a course from its notes folder
    Build {
        /// Course code (default: the configured default course)
        #[arg(long)]
        course: Option<String>,
        /// Folder with notes (default: <notes_base_dir>/<COURSE>)
        #[arg(long)]
        notes: Option<String>,
        /// Path prefix for index files (default: <index_base_dir>/<course>)
        #[arg(long)]
        index_path: Option<String>,
        /// Remove existing index files before building
        #[arg(long)]
        force: bool,
    },
    /// Load an existing index and print its stats
    Load {
        #[arg(long)]
        course: Option<String>,
    },
    /// Check whether index files exist for a course
    Status {
        #[arg(long)]
        course: Option<String>,
    },
    /// List all available courses
    List,
    /// Start the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::from(EXIT_FAILED);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e:#}");
        return ExitCode::from(EXIT_FAILED);
    }

    let registry = Arc::new(CourseRegistry::new(config.clone()));
    let embedder = make_embedder(&config);

    match cli.command {
        Commands::Build {
            course,
            notes,
            index_path,
            force,
        } => cmd_build(&registry, embedder.as_ref(), course, notes, index_path, force),
        Commands::Load { course } => cmd_load(&registry, course),
        Commands::Status { course } => cmd_status(&registry, course),
        Commands::List => cmd_list(&registry),
        Commands::Serve { addr } => {
            let generator = make_generator(&config);
            let engine = Arc::new(QaEngine::new(registry, embedder, generator));
            // The engine itself is blocking; only the HTTP surface needs a
            // runtime, and handlers push engine calls onto the blocking pool.
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Failed to start runtime: {e}");
                    return ExitCode::from(EXIT_FAILED);
                }
            };
            match runtime.block_on(server::serve(AppState { engine }, &addr)) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Server error: {e:#}");
                    ExitCode::from(EXIT_FAILED)
                }
            }
        }
    }
}

/// Use the real API when a key is configured, the mock otherwise.
fn make_embedder(config: &Config) -> Arc<dyn Embedder> {
    if config.api_key.is_empty() {
        tracing::warn!("no API key configured; using mock embedder");
        return Arc::new(MockEmbedder::default());
    }
    let timeout = Duration::from_secs(config.request_timeout_secs);
    match OpenAiEmbedder::new(&config.api_base, &config.api_key, timeout) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::warn!("failed to build API embedder ({e}); using mock");
            Arc::new(MockEmbedder::default())
        }
    }
}

fn make_generator(config: &Config) -> Arc<dyn Generator> {
    if config.api_key.is_empty() {
        tracing::warn!("no API key configured; using mock generator");
        return Arc::new(MockGenerator::default());
    }
    let timeout = Duration::from_secs(config.request_timeout_secs);
    match OpenAiGenerator::new(
        &config.api_base,
        &config.api_key,
        &config.generation_model,
        timeout,
    ) {
        Ok(g) => Arc::new(g),
        Err(e) => {
            tracing::warn!("failed to build API generator ({e}); using mock");
            Arc::new(MockGenerator::default())
        }
    }
}

fn cmd_build(
    registry: &CourseRegistry,
    embedder: &dyn Embedder,
    course: Option<String>,
    notes: Option<String>,
    index_path: Option<String>,
    force: bool,
) -> ExitCode {
    let code = registry.canonical_course(course.as_deref());
    let notes_dir = notes
        .map(Into::into)
        .unwrap_or_else(|| registry.notes_path(&code));
    let prefix = match index_path {
        Some(p) => p.into(),
        None => match registry.index_path(&code) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("✗ Build failed: {e}");
                return ExitCode::from(EXIT_FAILED);
            }
        },
    };

    if !notes_dir.exists() {
        eprintln!("Error: notes folder not found: {}", notes_dir.display());
        return ExitCode::from(EXIT_NOT_FOUND);
    }

    if force {
        registry.evict(Some(&code));
        match VectorStore::remove_files(&prefix) {
            Ok(removed) if !removed.is_empty() => {
                let names: Vec<String> =
                    removed.iter().map(|p| p.display().to_string()).collect();
                println!("Removed existing files: {}", names.join(", "));
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("✗ Build failed: {e}");
                return ExitCode::from(EXIT_FAILED);
            }
        }
    }

    println!("Building index for course: {code}");
    println!("  Notes folder: {}", notes_dir.display());
    println!("  Index path: {}", prefix.display());

    match registry.build_or_load(&notes_dir, &prefix, &code, embedder) {
        Ok(store) => {
            println!(
                "✓ Build completed: {} chunks, dim {}. Index saved at: {}",
                store.len(),
                store.dim(),
                prefix.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Build failed: {e}");
            ExitCode::from(EXIT_FAILED)
        }
    }
}

fn cmd_load(registry: &CourseRegistry, course: Option<String>) -> ExitCode {
    let code = registry.canonical_course(course.as_deref());

    match registry.resolve(&code) {
        Ok(Some(store)) => {
            println!("✓ Loaded index for course: {code}");
            println!("  Chunks: {}", store.len());
            println!("  Dimension: {}", store.dim());
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("✗ No index found for course {code}");
            eprintln!("  Run: studyrag build --course {code}");
            ExitCode::from(EXIT_NOT_FOUND)
        }
        Err(e) => {
            eprintln!("✗ Failed to load index: {e}");
            ExitCode::from(EXIT_FAILED)
        }
    }
}

fn cmd_status(registry: &CourseRegistry, course: Option<String>) -> ExitCode {
    let code = registry.canonical_course(course.as_deref());
    let info = registry.course_info(&code);

    println!("Course: {}", info.course_code);
    println!("  Indexed: {}", if info.indexed { "Yes" } else { "No" });
    println!("  Loaded: {}", if info.loaded { "Yes" } else { "No" });
    if let Some(count) = info.chunk_count {
        println!("  Chunks: {count}");
    }
    println!(
        "  Notes exist: {}",
        if info.notes_exist { "Yes" } else { "No" }
    );
    if info.notes_exist {
        println!("  Notes path: {}", info.notes_path);
    }
    ExitCode::SUCCESS
}

fn cmd_list(registry: &CourseRegistry) -> ExitCode {
    let courses = registry.list_available();
    let default = registry.canonical_course(None);

    println!("Available courses ({}):", courses.len());
    if courses.is_empty() {
        println!("  (no courses found in {})", registry.config().notes_base_dir);
    } else {
        for course in &courses {
            let indexed = if registry.is_indexed(course) { "✓" } else { " " };
            let tag = if registry.canonical_course(Some(course)) == default {
                " (default)"
            } else {
                ""
            };
            println!("  [{indexed}] {course}{tag}");
        }
    }
    ExitCode::SUCCESS
}
