//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cf_core::config::load_config;
use cf_core::generation::adapters::MockOperation;
use cf_core::generation::{GenerationError, MockProvider};
use cf_core::init::{generate_clipforge_structure, InitOptions};
use cf_core::script;
use cf_core::PipelineManager;
use cf_protocol::{ClipStatus, Product, ProjectDefinition, ProjectSnapshot, ProjectStatus};
use color_eyre::eyre::{bail, WrapErr};
use colored::Colorize;
use tokio_stream::StreamExt;
use tracing::debug;

pub async fn init(root: &Path, force: bool, minimal: bool) -> color_eyre::Result<()> {
    let written = generate_clipforge_structure(InitOptions {
        target_dir: root.to_path_buf(),
        force,
        minimal,
    })
    .await?;

    println!("{} {}", "Initialized".green().bold(), root.join(".clipforge").display());
    for path in written {
        println!("  {path}");
    }
    Ok(())
}

pub fn script(
    style: &str,
    product: &str,
    audience: &str,
    avatar: &str,
    json: bool,
) -> color_eyre::Result<()> {
    let product = Product {
        name: product.to_string(),
        target_audience: audience.to_string(),
    };
    let clips = script::generate_script(style, &product, avatar)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&clips)?);
        return Ok(());
    }

    for clip in clips {
        println!(
            "{} {} {}",
            format!("Clip {}", clip.clip_number).bold(),
            format!("[{}]", clip.timestamp).dimmed(),
            clip.section.cyan()
        );
        println!("  {} {}", "image:".dimmed(), clip.image_prompt);
        println!("  {} {}", "video:".dimmed(), clip.video_prompt);
        println!("  {} {}", "voice:".dimmed(), clip.voice_line);
        println!();
    }
    Ok(())
}

pub async fn simulate(
    root: &Path,
    project_path: &Path,
    latency_ms: u64,
    fail_image: Option<String>,
) -> color_eyre::Result<()> {
    let config = load_config(root).await?;
    let content = std::fs::read_to_string(project_path)
        .wrap_err_with(|| format!("failed to read {}", project_path.display()))?;
    let definition: ProjectDefinition = serde_yaml::from_str(&content)
        .wrap_err_with(|| format!("invalid project definition {}", project_path.display()))?;

    let scripted = match &definition.script {
        Some(request) => script::generate_for_style(
            request.style,
            &request.product,
            &request.avatar_description,
        )
        .into_iter()
        .map(Into::into)
        .collect(),
        None => Vec::new(),
    };

    let mut provider = MockProvider::new();
    if latency_ms > 0 {
        provider = provider.with_latency(Duration::from_millis(latency_ms));
    }
    if let Some(pattern) = fail_image {
        provider = provider.fail_always(
            MockOperation::Image,
            pattern,
            GenerationError::Timeout("simulated timeout".to_string()),
        );
    }

    // Simulations never touch the configured store.
    let manager = PipelineManager::in_memory(Arc::new(provider), &config.global);
    let id = manager
        .create_project(definition.into_new_project(scripted))
        .await?;
    debug!(project_id = %id, "Simulating project");

    let mut snapshots = manager.subscribe(id).await?;
    manager.start_generation(id).await?;
    while let Some(snapshot) = snapshots.next().await {
        print_snapshot(&snapshot);
    }

    let project = manager.wait_for(id).await?;
    println!();
    for clip in &project.clips {
        let detail = match (&clip.video_ref, &clip.failure) {
            (Some(video), _) => video.to_string(),
            (None, Some(failure)) => failure.message.clone(),
            (None, None) => String::new(),
        };
        println!(
            "  clip {} {} retries={} {}",
            clip.index + 1,
            colored_clip_status(clip.status),
            clip.retry_count,
            detail.dimmed()
        );
    }

    match (project.status, project.final_video) {
        (ProjectStatus::Completed, Some(video)) => {
            println!("{} {video}", "Final video:".green().bold());
            Ok(())
        }
        (status, _) => bail!(
            "project ended in {status}: {}",
            project.error.unwrap_or_default()
        ),
    }
}

pub async fn projects(root: &Path) -> color_eyre::Result<()> {
    let config = load_config(root).await?;
    if config.projects.is_empty() {
        println!("No projects found in {}", root.join(".clipforge/projects").display());
        return Ok(());
    }

    for project in &config.projects {
        let source = match &project.script {
            Some(request) if project.clips.is_empty() => format!("script: {}", request.style),
            Some(request) => format!("script: {} + {} clips", request.style, project.clips.len()),
            None => format!("{} clips", project.clips.len()),
        };
        println!("{} {}", project.name.bold(), source.dimmed());
    }
    Ok(())
}

fn print_snapshot(snapshot: &ProjectSnapshot) {
    let clips: Vec<String> = snapshot
        .clips
        .iter()
        .map(|clip| colored_clip_status(clip.status).to_string())
        .collect();
    println!(
        "[rev {:>3}] {} {}/{} done  {}",
        snapshot.revision,
        colored_project_status(snapshot.status),
        snapshot.completed_clips,
        snapshot.clip_count,
        clips.join(" ")
    );
}

fn colored_project_status(status: ProjectStatus) -> colored::ColoredString {
    let label = status.to_string();
    match status {
        ProjectStatus::Completed => label.green(),
        ProjectStatus::Error => label.red(),
        ProjectStatus::Cancelled => label.yellow(),
        ProjectStatus::Draft => label.dimmed(),
        ProjectStatus::Generating | ProjectStatus::Compiling => label.cyan(),
    }
}

fn colored_clip_status(status: ClipStatus) -> colored::ColoredString {
    let label = status.to_string();
    match status {
        ClipStatus::Done => label.green(),
        ClipStatus::Failed => label.red(),
        ClipStatus::Cancelled => label.yellow(),
        ClipStatus::Pending => label.dimmed(),
        ClipStatus::ImageGenerating | ClipStatus::VideoGenerating => label.cyan(),
    }
}
