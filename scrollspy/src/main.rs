//! scrollspy - scroll-spy navigation for long single-page articles
//!
//! A CLI tool for scaffolding, checking, rendering and simulating pages whose
//! sidebar and popover navigation follow the section being read.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![allow(clippy::module_name_repetitions)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use itertools::Itertools;
use scrollspy::active_section::ActiveSection;
use scrollspy::html_exporter;
use scrollspy::page_config::{PageConfig, PAGE_CONFIG_FILE};
use scrollspy::presenter::NavigationPresenter;
use scrollspy::section_registry::SectionId;
use scrollspy::simulation::{self, Layout, Step};
use scrollspy::templates;
use std::path::{Path, PathBuf};

/// Main entry point for the scrollspy CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            path,
            template,
            title,
            force,
        } => {
            handle_init_command(template, path, force, title)?;
        }

        Commands::ListTemplates => {
            handle_list_templates_command();
        }

        Commands::Validate { input, verbose } => {
            init_logging(verbose);
            handle_validate_command(&input, verbose)?;
        }

        Commands::Render {
            input,
            output,
            verbose,
        } => {
            init_logging(verbose);
            handle_render_command(&input, &output)?;
        }

        Commands::Simulate {
            input,
            steps,
            viewport_height,
            section_height,
            tie_break,
            missing,
            verbose,
        } => {
            init_logging(verbose);
            let mut page = load_page(&input)?;
            if let Some(tie_break) = tie_break {
                page.observer.tie_break = tie_break;
            }
            let layout = Layout {
                viewport_height,
                section_height,
                missing: missing.into_iter().map(SectionId::new).collect(),
            };
            handle_simulate_command(&page, &layout, &steps)?;
        }
    }

    Ok(())
}

/// Initialize logging if verbose
fn init_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

/// Resolve a page directory or file argument to the page.toml path
fn config_path(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.join(PAGE_CONFIG_FILE)
    } else {
        input.to_path_buf()
    }
}

/// Load a page configuration from a directory or file argument
fn load_page(input: &Path) -> Result<PageConfig> {
    let path = config_path(input);
    PageConfig::load(&path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Handle the init command
fn handle_init_command(
    template: String,
    path: Option<PathBuf>,
    force: bool,
    title: Option<String>,
) -> Result<()> {
    let target_path = path.unwrap_or_else(|| PathBuf::from("."));

    // Look up the template
    let template_info = templates::get_template(&template).with_context(|| {
        format!(
            "Template '{}' not found. Run 'scrollspy list-templates' to see available templates",
            template
        )
    })?;

    let mut page = templates::parse_template(&template_info)
        .with_context(|| format!("Failed to parse template '{}'", template))?;

    if let Some(title_text) = title {
        page.page_id = slugify(&title_text);
        page.title = title_text;
    }

    println!("Initializing page from template: {}", template_info.id);
    println!("Target path: {}", target_path.display());
    println!("Title: {}", page.title);

    if !target_path.exists() {
        std::fs::create_dir_all(&target_path)
            .with_context(|| format!("Failed to create directory {}", target_path.display()))?;
    }

    let config_file = target_path.join(PAGE_CONFIG_FILE);
    if config_file.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it",
            config_file.display()
        );
    }

    page.save(&config_file)
        .with_context(|| format!("Failed to write {}", config_file.display()))?;

    println!("\n✓ Successfully wrote: {}", config_file.display());
    println!("\nNext steps:");
    println!("  1. Edit {} to describe your sections", PAGE_CONFIG_FILE);
    println!("  2. Run 'scrollspy validate' to check it");
    println!("  3. Run 'scrollspy render -o index.html' to export the page");

    Ok(())
}

/// Handle the list-templates command
fn handle_list_templates_command() {
    println!("Available page templates:\n");

    for template in templates::get_all_templates() {
        println!("  {} - {}", template.id, template.description);
        println!("    Aliases: {}, {}", template.kind, template.kind.to_uppercase());
        println!();
    }

    println!("Usage: scrollspy init [path] --template <template>");
    println!("Example: scrollspy init ./fasting --template article");
}

/// Handle the validate command
fn handle_validate_command(input: &Path, verbose: bool) -> Result<()> {
    println!("Validating page configuration...");
    println!("Input: {}", config_path(input).display());

    let page = load_page(input)?;
    let registry = page.validate().context("Page configuration is invalid")?;

    println!("✓ {} sections: {}", registry.len(), registry.ids().join(", "));
    println!(
        "✓ Observer: threshold {}, root margin {}, tie-break {}",
        page.observer.threshold, page.observer.root_margin, page.observer.tie_break
    );
    if let Some(ref cta) = page.call_to_action {
        println!("✓ Call-to-action '{}' targets '{}'", cta.label, cta.target);
    }

    if verbose {
        for section in &registry {
            println!("  - {} ({}) [{}]", section.id, section.label, section.icon.name());
            if let Some(summary) = page.summary(section.id.as_str()) {
                println!("      {}", summary);
            }
        }
    }

    Ok(())
}

/// Handle the render command
fn handle_render_command(input: &Path, output: &Path) -> Result<()> {
    let page = load_page(input)?;
    let registry = page.validate().context("Page configuration is invalid")?;

    println!("Rendering page '{}'...", page.page_id);
    println!("Output: {}", output.display());

    let active = ActiveSection::new(registry.first().id.clone());
    let presenter = NavigationPresenter::new(registry, active.handle())
        .with_call_to_action(page.call_to_action.clone());

    html_exporter::to_html(&page, &presenter, output)
        .with_context(|| format!("Failed to export HTML to {}", output.display()))?;

    println!("✓ Successfully wrote: {}", output.display());
    Ok(())
}

/// Handle the simulate command
fn handle_simulate_command(page: &PageConfig, layout: &Layout, steps: &[String]) -> Result<()> {
    let steps: Vec<Step> = steps
        .iter()
        .map(|s| s.parse())
        .collect::<Result<_, _>>()
        .context("Failed to parse simulation steps")?;

    let timeline = simulation::run(page, layout, &steps).context("Simulation failed")?;

    println!(
        "Observing {} sections (tie-break {})",
        timeline.observed_sections, page.observer.tie_break
    );
    println!("  start            active={}", timeline.initial);
    for entry in &timeline.entries {
        let scroll = entry
            .scroll_requested
            .as_ref()
            .map(|id| format!("  scroll-> {}", id))
            .unwrap_or_default();
        println!(
            "  {:<16} y={:<7} active={}{}",
            entry.step.to_string(),
            entry.scroll_top,
            entry.active,
            scroll
        );
    }

    Ok(())
}

/// Turn a title into a page identifier
fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .join("-")
}
