use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hcls_research::agents::{bind_agents, Router, WorkflowStage, WorkflowState};
use hcls_research::config::{
    default_config_path, find_config_file, get_config, load_config, write_default_config, Config,
};
use hcls_research::mcp::{McpServer, ToolRegistry};
use hcls_research::models::{ArticleEntry, FailureReport, RetrievalQuery};
use hcls_research::retrieval::Retriever;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// HCLS Research - PubMed retrieval tool and agent configuration for hypothesis generation
#[derive(Parser, Debug)]
#[command(name = "hcls-research")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "PubMed retrieval tool and agent configuration for hypothesis generation", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the configuration file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        if self == OutputFormat::Auto {
            if std::io::stdout().is_terminal() {
                OutputFormat::Table
            } else {
                OutputFormat::Json
            }
        } else {
            self
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search PubMed and fetch each matching record
    #[command(alias = "s")]
    Search {
        /// Search string in PubMed query syntax
        query: String,

        /// Contact email sent to NCBI with every request
        #[arg(long, short)]
        email: String,

        /// Maximum number of articles to fetch
        #[arg(long, short, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        limit: u64,
    },

    /// Serve the search_pubmed tool over MCP (stdio)
    Serve,

    /// Print the agent table
    Agents,

    /// Show which agent handles the next step for a given session state
    Route {
        /// Validated research question, if one exists
        #[arg(long)]
        question: Option<String>,

        /// PubMed results are already available
        #[arg(long)]
        has_results: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Destination (default: the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print the effective configuration
    Show,
}

fn init_tracing(cli: &Cli, config: &Config) {
    let log_level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    // Logs go to stderr; stdout carries results and the MCP stdio stream.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("hcls_research={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        get_config()?
    };

    if let Some(timeout) = cli.timeout {
        config.entrez.timeout_secs = timeout;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_tracing(&cli, &config);

    match &cli.command {
        Commands::Search {
            query,
            email,
            limit,
        } => {
            let retriever = Retriever::pubmed(&config.entrez)?;
            let query = RetrievalQuery::new(query.as_str(), email.as_str())
                .limit(usize::try_from(*limit).context("limit is too large")?);

            match retriever.retrieve(&query).await {
                Ok(articles) => output_articles(&articles, cli.output),
                Err(err) => {
                    output_failure(&FailureReport::from(&err), cli.output);
                    std::process::exit(1);
                }
            }
        }

        Commands::Serve => {
            let retriever = Retriever::pubmed(&config.entrez)?;
            let server = McpServer::new(ToolRegistry::new(retriever))?;
            server.run().await?;
        }

        Commands::Agents => output_agents(&config, cli.output),

        Commands::Route {
            question,
            has_results,
        } => {
            let mut state = WorkflowState::new();
            if let Some(question) = question {
                state = state.with_question(question.as_str());
            }
            if *has_results {
                state = state.with_results(serde_json::Value::Bool(true));
            }

            let stage = WorkflowStage::from_state(&state);
            let agent = Router::new().route(&state);
            match cli.output.resolve() {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "stage": stage,
                        "agent": agent.name,
                    }))?
                ),
                _ => println!("{:?} -> {}", stage, agent.name),
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Init { path } => {
                let path = match path.clone().or_else(default_config_path) {
                    Some(path) => path,
                    None => anyhow::bail!("No config directory found; pass --path"),
                };
                write_default_config(&path)?;
                if !cli.quiet {
                    println!("Wrote {}", path.display());
                }
            }
            ConfigAction::Show => print!("{}", config.to_toml()?),
        },
    }

    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

fn output_articles(articles: &[ArticleEntry], format: OutputFormat) {
    match format.resolve() {
        OutputFormat::Json => match serde_json::to_string_pretty(articles) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize results: {}", e),
        },
        OutputFormat::Plain => {
            for entry in articles {
                let record = &entry.article;
                println!(
                    "{} - {}",
                    entry.pmid,
                    record.title().unwrap_or_else(|| "(no title)".to_string())
                );
                let authors = record.authors();
                if !authors.is_empty() {
                    println!("  Authors: {}", authors.join(", "));
                }
                if let Some(journal) = record.text("JT").or_else(|| record.text("TA")) {
                    println!("  Journal: {}", journal);
                }
                if let Some(abstract_text) = record.abstract_text() {
                    println!("  Abstract: {}", abstract_text);
                }
                println!("  URL: https://pubmed.ncbi.nlm.nih.gov/{}/", entry.pmid);
                println!();
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["PMID", "Title", "Authors", "Date"]);

            for entry in articles {
                let record = &entry.article;
                table.add_row(vec![
                    Cell::new(&entry.pmid),
                    Cell::new(truncate(&record.title().unwrap_or_default(), 60))
                        .add_attribute(Attribute::Bold),
                    Cell::new(truncate(&record.authors().join(", "), 30)),
                    Cell::new(record.text("DP").unwrap_or_default()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Auto => unreachable!(),
    }
}

fn output_failure(report: &FailureReport, format: OutputFormat) {
    match format.resolve() {
        OutputFormat::Json => match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize error: {}", e),
        },
        _ => eprintln!("{} [{}]", report.message, report.error),
    }
}

fn output_agents(config: &Config, format: OutputFormat) {
    let bound = bind_agents(&config.agents.model);
    match format.resolve() {
        OutputFormat::Json => match serde_json::to_string_pretty(&bound) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize agents: {}", e),
        },
        OutputFormat::Plain => {
            for agent in &bound {
                println!("{} ({})", agent.spec.name, agent.model);
                println!("  {}", agent.spec.description);
                if !agent.spec.tools.is_empty() {
                    println!("  Tools: {}", agent.spec.tools.join(", "));
                }
                if let Some(key) = agent.spec.output_key {
                    println!("  Output key: {}", key);
                }
                if !agent.spec.sub_agents.is_empty() {
                    println!("  Sub-agents: {}", agent.spec.sub_agents.join(", "));
                }
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Agent", "Model", "Tools", "Output key", "Sub-agents"]);

            for agent in &bound {
                table.add_row(vec![
                    Cell::new(agent.spec.name),
                    Cell::new(&agent.model),
                    Cell::new(agent.spec.tools.join(", ")),
                    Cell::new(agent.spec.output_key.unwrap_or("-")),
                    Cell::new(agent.spec.sub_agents.join(", ")),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Auto => unreachable!(),
    }
}
