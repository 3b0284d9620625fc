mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use prdgen_core::{
    audit, export_json, session_file_path, Extractor, GenerateOutcome, IterationController,
    PipelineConfig, ProjectExporter, Requirement, RequirementCategory, RequirementPriority,
    RequirementStatus, RequirementUpdate, Storage,
};

use crate::cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = PipelineConfig::load(cli.config.as_deref())?;
    let storage = Storage::new(session_file_path(cli.file.as_deref()));
    debug!(session = %storage.path().display(), max_iterations = config.max_iterations, "resolved session");

    match &cli.command {
        Command::Analyze { doc, stdin } => analyze(&storage, &config, doc.as_deref(), *stdin)?,
        Command::List {
            category,
            priority,
            status,
        } => list_requirements(&storage, category, priority, status)?,
        Command::Add {
            category,
            priority,
            description,
            interactive,
        } => {
            let category = category.as_deref().map(parse_category).transpose()?;
            let priority = priority.as_deref().map(parse_priority).transpose()?;

            // Default to interactive mode if no description is provided
            match description {
                Some(description) if !*interactive => add_requirement(
                    &storage,
                    category.unwrap_or(RequirementCategory::Functional),
                    description,
                    priority.unwrap_or(RequirementPriority::Medium),
                )?,
                _ => {
                    let (category, description, priority) =
                        prompts::prompt_new_requirement(category, priority)?;
                    add_requirement(&storage, category, &description, priority)?;
                }
            }
        }
        Command::Edit {
            id,
            category,
            priority,
            description,
            status,
        } => {
            let update = RequirementUpdate {
                category: category.as_deref().map(parse_category).transpose()?,
                description: description.clone(),
                priority: priority.as_deref().map(parse_priority).transpose()?,
                status: status.as_deref().map(parse_status).transpose()?,
            };
            edit_requirement(&storage, id, update)?;
        }
        Command::Del { id, yes } => delete_requirement(&storage, id, *yes)?,
        Command::Meta {
            name,
            description,
            tech,
        } => handle_meta(&storage, name, description, tech)?,
        Command::Generate => generate(&storage, &config)?,
        Command::Coverage => show_coverage(&storage)?,
        Command::Artifacts { show, test } => show_artifacts(&storage, show.as_deref(), *test)?,
        Command::Export { out, json } => {
            if let Some(dir) = out {
                export_project(&storage, dir)?;
            }
            if let Some(path) = json {
                let store = storage.load()?;
                export_json(&store, path)?;
                println!("Exported to JSON: {}", path.display());
            }
        }
        Command::Reset { yes } => reset(&storage, *yes)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn analyze(
    storage: &Storage,
    config: &PipelineConfig,
    doc: Option<&Path>,
    from_stdin: bool,
) -> Result<()> {
    let text = if from_stdin {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read document from stdin")?;
        text
    } else {
        let path = doc.context("No document given")?;
        fs::read_to_string(path).with_context(|| format!("Failed to read document: {:?}", path))?
    };

    let result = Extractor::new(config).extract(&text);
    let metadata = result.metadata();
    let count = result.requirements.len();

    let (store, ()) = storage.update_atomically(|store| {
        store.set_analysis(metadata, result.requirements);
    })?;

    println!("{}", "Document analyzed successfully!".green());
    println!("  Name: {}", store.metadata.name.bold());
    println!("  Description: {}", store.metadata.description);
    println!("  Technologies: {}", store.metadata.technology_set.join(", "));
    println!("  Requirements: {}", count);
    Ok(())
}

fn list_requirements(
    storage: &Storage,
    category: &Option<String>,
    priority: &Option<String>,
    status: &Option<String>,
) -> Result<()> {
    let store = storage.load()?;
    let mut requirements = store.requirements;

    if let Some(category_str) = category {
        let category_filter = parse_category(category_str)?;
        requirements.retain(|r| r.category == category_filter);
    }

    if let Some(priority_str) = priority {
        let priority_filter = parse_priority(priority_str)?;
        requirements.retain(|r| r.priority == priority_filter);
    }

    if let Some(status_str) = status {
        let status_filter = parse_status(status_str)?;
        requirements.retain(|r| r.status == status_filter);
    }

    if requirements.is_empty() {
        println!("{}", "No requirements found.".yellow());
        return Ok(());
    }

    println!(
        "{:<18} | {:<11} | {:<8} | {:<11} | {}",
        "ID", "Category", "Priority", "Status", "Description"
    );
    println!("{}", "-".repeat(100));

    for req in &requirements {
        print_requirement_row(req);
    }

    Ok(())
}

fn print_requirement_row(req: &Requirement) {
    let priority_str = match req.priority {
        RequirementPriority::High => "high".red(),
        RequirementPriority::Medium => "medium".yellow(),
        RequirementPriority::Low => "low".green(),
    };

    let status_str = match req.status {
        RequirementStatus::Pending => "pending".yellow(),
        RequirementStatus::Analyzed => "analyzed".blue(),
        RequirementStatus::Implemented => "implemented".green(),
        RequirementStatus::Tested => "tested".cyan(),
    };

    println!(
        "{:<18} | {:<11} | {:<8} | {:<11} | {}",
        req.id,
        req.category.to_string(),
        priority_str,
        status_str,
        req.description
    );
}

fn add_requirement(
    storage: &Storage,
    category: RequirementCategory,
    description: &str,
    priority: RequirementPriority,
) -> Result<()> {
    let (_, added) = storage.update_atomically(|store| {
        store
            .add_requirement(category, description, priority)
            .map(|r| r.clone())
    })?;
    let req = added?;

    println!("{}", "Requirement added successfully!".green());
    println!("ID: {}", req.id.green());
    Ok(())
}

fn edit_requirement(storage: &Storage, id: &str, update: RequirementUpdate) -> Result<()> {
    let update = if update.is_empty() {
        let store = storage.load()?;
        let req = store
            .get_requirement(id)
            .with_context(|| format!("Requirement not found: {}", id))?;
        prompts::prompt_requirement_update(req)?
    } else {
        update
    };

    let (_, updated) = storage
        .update_atomically(|store| store.update_requirement(id, update).map(|r| r.clone()))?;
    let req = updated?;

    println!("{}", "Requirement updated successfully!".green());
    print_requirement_row(&req);
    Ok(())
}

fn delete_requirement(storage: &Storage, id: &str, skip_confirm: bool) -> Result<()> {
    let store = storage.load()?;
    let req = store
        .get_requirement(id)
        .with_context(|| format!("Requirement not found: {}", id))?;

    println!("{}", "Requirement to delete:".yellow());
    println!("  ID: {}", req.id);
    println!("  Description: {}", req.description);

    // Confirm deletion unless --yes flag is used
    if !skip_confirm && !prompts::confirm("Are you sure you want to delete this requirement?")? {
        println!("{}", "Deletion cancelled.".yellow());
        return Ok(());
    }

    let (_, removed) = storage.update_atomically(|store| store.remove_requirement(id))?;
    removed?;

    println!("{}", "Requirement deleted successfully!".green());
    Ok(())
}

fn handle_meta(
    storage: &Storage,
    name: &Option<String>,
    description: &Option<String>,
    tech: &Option<String>,
) -> Result<()> {
    let technologies = tech.as_ref().map(|list| {
        list.split(',')
            .map(|t| t.trim().to_string())
            .collect::<Vec<_>>()
    });

    let store = if name.is_none() && description.is_none() && technologies.is_none() {
        storage.load()?
    } else {
        let (store, ()) = storage.update_atomically(|store| {
            store.set_metadata(name.clone(), description.clone(), technologies);
        })?;
        println!("{}", "Metadata updated successfully!".green());
        store
    };

    println!("{}: {}", "Name".green(), store.metadata.name);
    println!("{}: {}", "Description".green(), store.metadata.description);
    println!("{}:", "Technologies".green());
    for tech in &store.metadata.technology_set {
        println!("  - {}", tech);
    }
    Ok(())
}

fn generate(storage: &Storage, config: &PipelineConfig) -> Result<()> {
    let controller = IterationController::from_config(config);

    let (store, (outcome, promoted)) = storage.update_atomically(|store| {
        let outcome = controller.generate(store);
        let promoted = if outcome.is_refused() {
            0
        } else {
            store.mark_implemented()
        };
        (outcome, promoted)
    })?;

    match outcome {
        GenerateOutcome::Generated {
            iteration,
            artifacts,
        } => {
            println!(
                "{}",
                format!("Iteration {}/{} generated.", iteration, controller.max_iterations())
                    .green()
            );
            for artifact in &artifacts {
                println!(
                    "  {:<18} {:<28} {} requirement(s)",
                    artifact.id,
                    artifact.path,
                    artifact.satisfied_requirement_ids.len()
                );
            }
            if promoted > 0 {
                println!("{} requirement(s) marked implemented", promoted);
            }
            println!("{}", audit(&store.requirements, &store.artifacts));
        }
        GenerateOutcome::Refused { iteration, max } => {
            println!(
                "{}",
                format!(
                    "Maximum iterations reached ({}/{}); run `prdgen analyze` to start over.",
                    iteration, max
                )
                .yellow()
            );
        }
    }
    Ok(())
}

fn show_coverage(storage: &Storage) -> Result<()> {
    let store = storage.load()?;
    let report = audit(&store.requirements, &store.artifacts);

    let summary = report.summary();
    if report.is_complete() {
        println!("{}", summary.green());
    } else if report.covered_requirements == 0 {
        println!("{}", summary.red());
    } else {
        println!("{}", summary.yellow());
    }

    if !report.uncovered_descriptions.is_empty() {
        println!("\n{}:", "Uncovered".yellow());
        for description in &report.uncovered_descriptions {
            println!("  - {}", description);
        }
    }
    Ok(())
}

fn show_artifacts(storage: &Storage, show: Option<&str>, test: bool) -> Result<()> {
    let store = storage.load()?;

    if let Some(id) = show {
        let artifact = store
            .get_artifact(id)
            .with_context(|| format!("Artifact not found: {}", id))?;
        if test {
            let code = artifact
                .test_code
                .as_deref()
                .with_context(|| format!("Artifact {} has no test", id))?;
            println!("{}", format!("// {}", artifact.test_path()).green());
            println!("{}", code);
        } else {
            println!("{}", format!("// {}", artifact.path).green());
            println!("{}", artifact.source_code);
        }
        return Ok(());
    }

    if store.artifacts.is_empty() {
        println!("{}", "No artifacts yet. Run `prdgen generate`.".yellow());
        return Ok(());
    }

    println!("Iteration {}", store.current_iteration);
    for artifact in &store.artifacts {
        let ids: Vec<&str> = artifact
            .satisfied_requirement_ids
            .iter()
            .map(String::as_str)
            .collect();
        println!("  {:<18} {:<28} [{}]", artifact.id, artifact.path, ids.join(", "));
    }
    Ok(())
}

fn export_project(storage: &Storage, dir: &Path) -> Result<()> {
    let store = storage.load()?;
    if store.artifacts.is_empty() {
        println!(
            "{}",
            "No artifacts to export yet; writing project skeleton only.".yellow()
        );
    }

    let exporter = ProjectExporter::new();
    let preview = exporter.preview(&store, dir)?;
    if !preview.overwrites.is_empty() {
        println!(
            "{}",
            format!("Overwriting {} existing file(s)", preview.overwrites.len()).yellow()
        );
    }
    let written = exporter.apply(&preview)?;

    println!(
        "{}",
        format!("Exported {} file(s) to {}", written.len(), dir.display()).green()
    );
    Ok(())
}

fn reset(storage: &Storage, skip_confirm: bool) -> Result<()> {
    if !skip_confirm && !prompts::confirm("Clear all requirements and artifacts?")? {
        println!("{}", "Reset cancelled.".yellow());
        return Ok(());
    }
    storage.update_atomically(|store| store.reset())?;
    println!("{}", "Session cleared.".green());
    Ok(())
}

fn parse_category(category_str: &str) -> Result<RequirementCategory> {
    category_str.parse().map_err(anyhow::Error::msg)
}

fn parse_priority(priority_str: &str) -> Result<RequirementPriority> {
    priority_str.parse().map_err(anyhow::Error::msg)
}

fn parse_status(status_str: &str) -> Result<RequirementStatus> {
    status_str.parse().map_err(anyhow::Error::msg)
}
