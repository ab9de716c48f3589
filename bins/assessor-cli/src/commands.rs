// CLI commands for judging solutions locally
use anyhow::{bail, Context, Result};
use assessor_common::config::{JudgeConfig, DEFAULT_CONFIG_PATH};
use assessor_common::types::{AdHocRunResponse, CaseOutcome};
use assessor_judge::questions::DEFAULT_QUESTIONS_PATH;
use assessor_judge::{CaseRunner, JudgeClient, QuestionBank, QuestionSource, ResultCache, Simulator};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const JUDGE_TEMPLATE: &str = include_str!("../../../config/judge.json");
const QUESTIONS_TEMPLATE: &str = include_str!("../../../config/questions.json");

/// Runner over the judge backend with simulator fallback, or the simulator alone
fn build_runner(offline: bool) -> Result<CaseRunner> {
    let config = JudgeConfig::load_default()?;
    let cache = Arc::new(ResultCache::new(config.cache_ttl()));
    debug!(offline, api_url = %config.api_url, "Building case runner");

    if offline {
        return Ok(CaseRunner::new(cache, Arc::new(Simulator::new())));
    }

    let client = Arc::new(JudgeClient::new(config)?);
    Ok(CaseRunner::with_fallback(cache, client))
}

fn load_source(path: &Path) -> Result<String> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read source file {}", path.display()))?;
    if source.trim().is_empty() {
        bail!("Source file {} is empty", path.display());
    }
    Ok(source)
}

fn find_question(bank_path: &Path, id: &str) -> Result<assessor_common::types::Question> {
    let bank = QuestionBank::load_from_file(bank_path)?;
    match bank.question(id) {
        Some(question) => Ok(question),
        None => bail!(
            "Question '{}' not found in {} (available: {})",
            id,
            bank_path.display(),
            bank.ids().join(", ")
        ),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_outcomes(outcomes: &[CaseOutcome]) {
    for (idx, outcome) in outcomes.iter().enumerate() {
        let mark = if outcome.passed { "✅" } else { "❌" };
        let kind = if outcome.is_hidden { "hidden" } else { "example" };
        println!(
            "  {} Case {} ({}) - {} ms",
            mark,
            idx + 1,
            kind,
            outcome.execution_time_ms
        );
        if outcome.passed || outcome.is_hidden {
            continue;
        }
        println!("      expected: {:?}", outcome.expected_output);
        println!("      actual:   {:?}", outcome.actual_output);
        if let Some(error) = &outcome.error {
            println!("      error:    {}", error);
        }
    }
}

/// Run against custom input, or against the examples of a question
pub async fn run(
    source_path: &Path,
    question_id: Option<&str>,
    input: Option<&str>,
    offline: bool,
    bank_path: &Path,
    json: bool,
) -> Result<()> {
    let source = load_source(source_path)?;
    let runner = build_runner(offline)?;

    if let Some(input) = input {
        let result = runner.run_custom(&source, input).await?;
        if json {
            return print_json(&AdHocRunResponse::from(result));
        }

        println!("▶️  Ran {} ({} ms)", source_path.display(), result.execution_time_ms);
        if let Some(error) = &result.error {
            println!("❌ {}", error);
        }
        println!("{}", result.output);
        return Ok(());
    }

    let Some(question_id) = question_id else {
        bail!("Either --question or --input is required");
    };
    let question = find_question(bank_path, question_id)?;
    let response = runner.run_examples(&question, &source).await?;

    if json {
        return print_json(&response);
    }

    println!("▶️  Running examples for '{}'", question.id);
    print_outcomes(&response.results);
    println!("\n{}", response.message);
    Ok(())
}

/// Judge examples and hidden cases and report the score
pub async fn submit(
    source_path: &Path,
    question_id: &str,
    offline: bool,
    bank_path: &Path,
    json: bool,
) -> Result<()> {
    let source = load_source(source_path)?;
    let question = find_question(bank_path, question_id)?;
    let runner = build_runner(offline)?;

    let response = runner.submit(&question, &source).await?;

    if json {
        return print_json(&response);
    }

    println!("📤 Submitting to '{}'", question.id);
    print_outcomes(&response.results);
    println!("\n{}", response.message);
    println!("🏆 Score: {}/{}", response.score, response.max_score);
    Ok(())
}

/// Write starter configuration, leaving existing files alone
pub fn init_project(path: &str) -> Result<()> {
    println!("🚀 Initializing assessor project at: {}", path);

    let project_path = Path::new(path);
    fs::create_dir_all(project_path.join("config"))
        .context("Failed to create directory: config")?;

    for (relative, content) in [
        (DEFAULT_CONFIG_PATH, JUDGE_TEMPLATE),
        (DEFAULT_QUESTIONS_PATH, QUESTIONS_TEMPLATE),
    ] {
        let target = project_path.join(relative);
        if target.exists() {
            println!("  ⏭️  Kept existing: {}", relative);
            continue;
        }
        fs::write(&target, content).with_context(|| format!("Failed to write {}", relative))?;
        println!("  ✅ Created: {}", relative);
    }

    println!("✅ Project initialized successfully!");
    println!("\n📋 Next steps:");
    println!("  1. Set JUDGE_API_KEY for the hosted judge backend");
    println!("  2. Add questions to config/questions.json");
    println!("  3. Try it: assessor-cli run solution.cpp --question hello-world");

    Ok(())
}
