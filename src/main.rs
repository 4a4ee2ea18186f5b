//! promptweave - hierarchical weighted prompt composition
//!
//! Command-line front end over the category store and both generators.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use promptweave::category::{control_choices, Category, PromptPriority, Selector};
use promptweave::generator::{GeekGenerator, PromptGenerator, PromptRequest, RewriteRules};
use promptweave::{CategoryStore, GeneratorConfig, PromptError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "promptweave")]
#[command(version)]
#[command(about = "Compose image-generation prompts from a tree of category files", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (.toml or .json); discovered when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data root, overriding the configured one
    #[arg(short, long, global = true)]
    data_root: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a prompt from per-category selectors
    Generate {
        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Fragment ordering preset
        #[arg(short, long, value_enum, default_value = "subject-scene")]
        priority: PromptPriority,

        /// Subject placed in the subject slot
        #[arg(long, default_value = "")]
        subject: String,

        /// Selector applied to every category before --set overrides
        #[arg(long, value_name = "SELECTOR")]
        all: Option<String>,

        /// Selector for one category, e.g. `scene=random` or `camera=use image 1`
        #[arg(short, long = "set", value_name = "CATEGORY=SELECTOR", value_parser = parse_pair)]
        selectors: Vec<(Category, String)>,

        /// Custom text for one category, e.g. `lighting=candle light`
        #[arg(long = "custom", value_name = "CATEGORY=TEXT", value_parser = parse_pair)]
        customs: Vec<(Category, String)>,
    },

    /// Expand a Geek template of `[tag]`s
    Geek {
        /// Template text, e.g. "[scene], [all lighting]"
        template: String,

        /// Subject prepended to the expanded template
        #[arg(long, default_value = "")]
        subject: String,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Rewrite rules (JSON), overriding the configured ones
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Print prompt and system prompt as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the Geek menu for a category
    Menu {
        /// Category name, e.g. scene or facial_action
        category: Category,

        /// Also list the selector control values
        #[arg(long)]
        controls: bool,
    },

    /// List Geek tags with their file counts
    Tags {
        /// Only tags containing this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the resolved configuration as JSON
    Show,

    /// Validate the configuration and the data root
    Validate,
}

fn parse_pair(raw: &str) -> Result<(Category, String), String> {
    let (category, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=VALUE, got '{}'", raw))?;
    let category = category.parse::<Category>().map_err(|e| e.to_string())?;
    Ok((category, value.to_string()))
}

fn load_config(cli: &Cli) -> promptweave::Result<GeneratorConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                return Err(PromptError::config_with_path(
                    "config file not found",
                    path.clone(),
                ));
            }
            GeneratorConfig::load(path)?
        }
        None => GeneratorConfig::discover()?,
    };
    if let Some(root) = &cli.data_root {
        config.data_root = root.clone();
    }
    Ok(config)
}

fn exit_with(err: &PromptError) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);
    std::process::exit(err.exit_code());
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "promptweave=debug,info"
    } else {
        "promptweave=info,warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli).unwrap_or_else(|e| exit_with(&e));

    if let Commands::Config { action } = &cli.command {
        match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::Validate => {
                if let Err(e) = config.validate() {
                    exit_with(&e);
                }
                let store = CategoryStore::open(config).unwrap_or_else(|e| exit_with(&e));
                let mapping = store.category_mapping();
                println!(
                    "{} configuration valid, {} tags under {}",
                    "✓".green(),
                    mapping.len(),
                    store.config().data_root.display()
                );
            }
        }
        return Ok(());
    }

    let store = CategoryStore::open(config).unwrap_or_else(|e| exit_with(&e));

    match cli.command {
        Commands::Generate {
            seed,
            priority,
            subject,
            all,
            selectors,
            customs,
        } => {
            let images = store.config().ref_image_count;
            let mut request = PromptRequest::new(seed)
                .with_priority(priority)
                .with_subject(subject);
            if let Some(all) = all {
                request = request.with_all(Selector::parse(&all, images));
            }
            for (category, value) in selectors {
                let custom = request.field(category).custom;
                request = request.with_field(category, Selector::parse(&value, images), custom);
            }
            for (category, text) in customs {
                let selector = request.field(category).selector;
                request = request.with_field(category, selector, text);
            }

            println!("{}", PromptGenerator::new(&store).generate_prompt(&request));
        }

        Commands::Geek {
            template,
            subject,
            seed,
            rules,
            json,
        } => {
            let rules_path = rules.or_else(|| store.config().rewrite_rules.clone());
            let geek = GeekGenerator::new(&store);
            let output = match rules_path {
                Some(path) => {
                    let rules = RewriteRules::load(&path).unwrap_or_else(|e| exit_with(&e));
                    geek.generate_with_rewrites(seed, &template, &subject, &rules)
                }
                None => geek.generate_prompt(seed, &template, &subject),
            };

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output).context("serializing output")?
                );
            } else {
                println!("{}", output.prompt);
            }
        }

        Commands::Menu { category, controls } => {
            let primary = Category::primary().contains(&category);
            if controls {
                for choice in control_choices(store.config().ref_image_count) {
                    println!("{}", choice.dimmed());
                }
            }
            for entry in store.load_geek_category_options(category, primary) {
                println!("{}", entry);
            }
        }

        Commands::Tags { filter } => {
            let mapping = store.category_mapping();
            let needle = filter.map(|f| f.to_lowercase());
            for (tag, source) in mapping.iter() {
                if needle
                    .as_deref()
                    .is_some_and(|n| !tag.to_lowercase().contains(n))
                {
                    continue;
                }
                println!(
                    "{:<32} {:>4} file(s)  {}",
                    format!("[{}]", tag).cyan(),
                    source.files.len(),
                    source.category.to_string().dimmed()
                );
            }
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}
