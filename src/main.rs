//! `skill-activation` - UserPromptSubmit hook binary
//!
//! ```text
//! skill-activation [hook flags]        read hook JSON from stdin, print report
//! skill-activation tfidf [--test]      rank {prompt, candidates} from stdin
//! skill-activation check [--cwd DIR]   load and compile rule files
//! ```
//!
//! Exit code is 0 whenever the run completed, matched or not, and 1 on
//! malformed input, malformed rules, or any other failure.

use std::env;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, error, info, warn};

use skill_activator::activity_log::ActivityLog;
use skill_activator::check::summarize;
use skill_activator::config::{Settings, SKIP_ENHANCE_ENV};
use skill_activator::matcher::tfidf::{match_candidates, sample_request, TfIdfRequest};
use skill_activator::matcher::MatchType;
use skill_activator::{
    load_rules, Activation, ActivatorError, CommandRewriter, EnhanceGuard, HookInput,
    PromptRewriter, Result, RulesLocator, RunOptions,
};

// ============================================================================
// CLI
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "skill-activation", version, about, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    hook: HookArgs,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the UserPromptSubmit hook (default)
    Hook(HookArgs),

    /// Rank candidates read from stdin with TF-IDF
    Tfidf {
        /// Rank a built-in sample instead of reading stdin
        #[arg(long)]
        test: bool,
    },

    /// Load and compile rule files, report problems
    Check(CheckArgs),
}

#[derive(Debug, Clone, Default, Args)]
struct HookArgs {
    /// Running inside a rewriter call: print nothing
    #[arg(long)]
    skip_enhance: bool,

    /// Never call the prompt rewriter
    #[arg(long)]
    no_enhance: bool,

    /// Rewriter program
    #[arg(long, value_name = "PROG")]
    rewriter: Option<String>,

    /// Rewriter argument placed before the instruction (repeatable)
    #[arg(long = "rewriter-arg", value_name = "ARG", allow_hyphen_values = true)]
    rewriter_args: Vec<String>,

    /// Rewriter timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Also list skills ranked by TF-IDF
    #[arg(long)]
    tfidf: bool,

    /// Append JSONL activity logs to this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Skill rules file, bypassing discovery
    #[arg(long, value_name = "PATH")]
    rules: Option<PathBuf>,

    /// Enhancement rules file, bypassing discovery
    #[arg(long, value_name = "PATH")]
    enhancement_rules: Option<PathBuf>,
}

impl HookArgs {
    fn settings(&self) -> Settings {
        let mut settings = Settings {
            enhance: !self.no_enhance,
            tfidf: self.tfidf,
            log_dir: self.log_dir.clone(),
            rules_path: self.rules.clone(),
            enhancement_rules_path: self.enhancement_rules.clone(),
            ..Settings::default()
        };
        if let Some(program) = &self.rewriter {
            settings.rewriter.program = program.clone();
        }
        if !self.rewriter_args.is_empty() {
            settings.rewriter.args = self.rewriter_args.clone();
        }
        if let Some(secs) = self.timeout {
            settings.rewriter.timeout = Duration::from_secs(secs);
        }
        settings
    }

    /// Recursion guard, read once here at the process boundary.
    fn guard(&self) -> EnhanceGuard {
        let env_flag = env::var(SKIP_ENHANCE_ENV).is_ok_and(|v| v == "1");
        EnhanceGuard::from_flag(self.skip_enhance || env_flag)
    }
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Project directory to discover rules from (default: current directory)
    #[arg(long, value_name = "DIR")]
    cwd: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    rules: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    enhancement_rules: Option<PathBuf>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    // Initialize tracing if RUST_LOG is set
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => run_hook(&cli.hook),
        Some(Commands::Hook(args)) => run_hook(&args),
        Some(Commands::Tfidf { test }) => run_tfidf(test),
        Some(Commands::Check(args)) => run_check(&args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("Error in skill-activation hook: {}", e);
            eprintln!("Error in skill-activation hook: {e}");
            ExitCode::FAILURE
        }
    }
}

fn read_stdin() -> Result<String> {
    let mut raw = String::new();
    io::stdin().read_to_string(&mut raw)?;
    Ok(raw)
}

fn preview(prompt: &str) -> String {
    prompt.chars().take(50).collect()
}

// ============================================================================
// hook
// ============================================================================

fn run_hook(args: &HookArgs) -> Result<ExitCode> {
    let settings = args.settings();
    let guard = args.guard();

    let raw = read_stdin()?;
    debug!("Received input: {}", raw);
    let input = HookInput::from_json(&raw)?;

    if guard.suppresses(&input.prompt) {
        debug!("Skipping guarded prompt: {}", preview(&input.prompt));
        return Ok(ExitCode::SUCCESS);
    }

    info!("Processing prompt: {}", preview(&input.prompt));

    let locator = RulesLocator::from_cwd(&input.cwd);
    let Some(rules) = load_rules(
        &locator,
        settings.rules_path.as_deref(),
        settings.enhancement_rules_path.as_deref(),
    )?
    else {
        debug!("No skill rules found, nothing to do");
        return Ok(ExitCode::SUCCESS);
    };

    info!(
        "Loaded {} skills from {:?}",
        rules.skills.skills.len(),
        rules.skills_path
    );
    if let Some(path) = &rules.enhancement_path {
        debug!("Enhancement rules from {:?}", path);
    }

    let activation = Activation::new(&rules)?;
    let rewriter = CommandRewriter::from_settings(&settings.rewriter);
    let options = RunOptions {
        guard,
        tfidf: settings.tfidf,
        rewriter: settings
            .enhance
            .then_some(&rewriter as &dyn PromptRewriter),
        timeout: settings.rewriter.timeout,
    };

    let outcome = activation.run(&input, &options);

    // Log matches to stderr for debugging
    for skill in outcome.skills.iter().chain(&outcome.related) {
        let kind = match skill.match_type {
            MatchType::Keyword => skill.match_type.as_str().green(),
            MatchType::Intent => skill.match_type.as_str().yellow(),
            MatchType::TfIdf => skill.match_type.as_str().blue(),
        };
        info!(
            "📚 {} [{}] priority={} score={:.2}",
            skill.name.bold(),
            kind,
            skill.priority.as_str(),
            skill.score.unwrap_or_default()
        );
    }

    if let Some(report) = &outcome.report {
        println!("{}", report);
    }

    if let Some(dir) = &settings.log_dir {
        match ActivityLog::new(dir).append(&input, &outcome) {
            Ok(Some(path)) => debug!("Activity logged to {:?}", path),
            Ok(None) => {}
            Err(e) => warn!("Activity log skipped: {}", e),
        }
    }

    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// tfidf
// ============================================================================

fn run_tfidf(test: bool) -> Result<ExitCode> {
    let (prompt, candidates) = if test {
        println!("TF-IDF Matcher Test Mode");
        sample_request()
    } else {
        let request: TfIdfRequest = serde_json::from_str(&read_stdin()?)?;
        match (request.prompt, request.candidates) {
            (Some(prompt), Some(candidates)) if !prompt.is_empty() => (prompt, candidates),
            _ => return Err(ActivatorError::MissingFields("prompt, candidates")),
        }
    };

    let result = match_candidates(&prompt, &candidates);
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// check
// ============================================================================

fn run_check(args: &CheckArgs) -> Result<ExitCode> {
    let cwd = match &args.cwd {
        Some(dir) => dir.clone(),
        None => env::current_dir().map_err(ActivatorError::CurrentDir)?,
    };
    let locator = RulesLocator::new(cwd, dirs::home_dir());

    let Some(rules) = load_rules(
        &locator,
        args.rules.as_deref(),
        args.enhancement_rules.as_deref(),
    )?
    else {
        println!("{} no skill rules found", "✗".red());
        return Ok(ExitCode::FAILURE);
    };

    let summary = summarize(&rules)?;

    println!(
        "{} {}: {} skills ({} triggered, {} keywords, {} intent patterns)",
        "✓".green(),
        rules.skills_path.display(),
        summary.skills,
        summary.triggered,
        summary.keywords,
        summary.intent_patterns
    );
    if let Some(path) = &rules.enhancement_path {
        println!(
            "{} {}: {} enhancement rules",
            "✓".green(),
            path.display(),
            summary.enhancement_rules
        );
    }
    for (rule, skill) in &summary.dangling_references {
        println!(
            "{} enhancement rule '{}' references unknown skill '{}'",
            "⚠".yellow(),
            rule,
            skill
        );
    }

    Ok(ExitCode::SUCCESS)
}
