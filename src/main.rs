use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use bdij_tables::output;
use bdij_tables::pipeline::{Pipeline, Table};
use bdij_tables::results::ResultSet;
use bdij_tables::settings::{Overrides, Profile, Settings};

#[derive(Parser)]
#[command(
    name = "bdij_tables",
    about = "Turn the SPARQL query on a BDIJ wiki page into a wikitext table"
)]
struct Cli {
    /// Config file (default: ./bdij_tables.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Wiki page holding the query
    #[arg(long, global = true)]
    page_url: Option<String>,
    /// SPARQL endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// CSS selector of the element holding the query
    #[arg(long, global = true)]
    selector: Option<String>,
    /// Output file for the table
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
    /// Formatting profile
    #[arg(short, long, global = true, value_enum)]
    profile: Option<Profile>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Commands {
    /// Fetch, query, format and write the table (default)
    Run {
        /// Print the table instead of writing the output file
        #[arg(long)]
        stdout: bool,
    },
    /// Print the query extracted from the wiki page
    Query,
    /// Format a saved SPARQL JSON result without any network access
    Render {
        /// SPARQL JSON results file
        input: PathBuf,
        /// Print the table instead of writing the output file
        #[arg(long)]
        stdout: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    // Failures are reported, not turned into an exit status.
    match execute(cli).await {
        Ok(()) => println!("Processo concluído com sucesso."),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Erro durante a execução: {:#}", e);
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    Ok(())
}

impl Cli {
    /// Config file, command-line overrides and the command (`run` when omitted).
    fn into_parts(self) -> (Option<PathBuf>, Overrides, Commands) {
        let overrides = Overrides {
            page_url: self.page_url,
            endpoint: self.endpoint,
            selector: self.selector,
            output: self.output,
            profile: self.profile,
        };
        let command = self.command.unwrap_or(Commands::Run { stdout: false });
        (self.config, overrides, command)
    }
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    let (config, overrides, command) = cli.into_parts();
    let settings =
        Settings::load(config.as_deref(), overrides).context("Failed to load settings")?;
    info!(settings_loaded = ?settings, msg = "Starting table export");

    let pipeline = Pipeline::new(settings)?;

    match command {
        Commands::Run { stdout: false } => {
            let report = pipeline.run().await?;
            match report.rows {
                Some(rows) => println!("Wrote {} rows to {}", rows, report.output.display()),
                None => println!("No results; wrote placeholder to {}", report.output.display()),
            }
        }
        Commands::Run { stdout: true } => {
            let table = pipeline.build_table().await?;
            println!("{}", table.text);
        }
        Commands::Query => {
            let query = pipeline.extract().await?;
            println!("{}", query);
        }
        Commands::Render { input, stdout } => {
            let table = render_file(&pipeline, &input)?;
            if stdout {
                println!("{}", table.text);
            } else {
                let path = &pipeline.settings().output;
                output::write_table(path, &table.text)?;
                println!("Wrote {} bytes to {}", table.text.len(), path.display());
            }
        }
    }

    Ok(())
}

/// Format a saved SPARQL JSON result; a file holding `null` gives the
/// no-results placeholder.
fn render_file(pipeline: &Pipeline, input: &Path) -> anyhow::Result<Table> {
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {:?}", input))?;
    let results = ResultSet::from_json(&json)
        .with_context(|| format!("{:?} is not a SPARQL JSON result", input))?;
    Ok(pipeline.render(results.as_ref()))
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdij_tables::wikitext::NO_RESULTS;

    fn parse(args: &[&str]) -> (Option<PathBuf>, Overrides, Commands) {
        Cli::try_parse_from(args).unwrap().into_parts()
    }

    fn offline_pipeline(profile: Profile) -> Pipeline {
        Pipeline::new(Settings {
            page_url: "http://127.0.0.1:9/wiki".to_string(),
            endpoint: "http://127.0.0.1:9/sparql".to_string(),
            selector: "pre".to_string(),
            output: PathBuf::from("dump.txt"),
            profile,
            entity_base: "https://web.bdij.com.br/entity/".to_string(),
            link_namespace: "Item".to_string(),
            user_agent: "bdij_tables-tests".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn run_is_the_default_command() {
        let (config, overrides, command) = parse(&["bdij_tables"]);
        assert_eq!(command, Commands::Run { stdout: false });
        assert!(config.is_none());
        assert!(overrides.endpoint.is_none());
        assert!(overrides.profile.is_none());
    }

    #[test]
    fn global_flags_work_before_and_after_the_command() {
        let (config, overrides, command) = parse(&[
            "bdij_tables",
            "--config",
            "local.toml",
            "-p",
            "linked",
            "run",
            "--stdout",
            "--endpoint",
            "http://localhost/sparql",
            "-o",
            "out/table.txt",
        ]);
        assert_eq!(command, Commands::Run { stdout: true });
        assert_eq!(config, Some(PathBuf::from("local.toml")));
        assert_eq!(overrides.profile, Some(Profile::Linked));
        assert_eq!(overrides.endpoint.as_deref(), Some("http://localhost/sparql"));
        assert_eq!(overrides.output, Some(PathBuf::from("out/table.txt")));
    }

    #[test]
    fn query_and_render_commands() {
        let (_, overrides, command) = parse(&["bdij_tables", "query", "--selector", "pre.sparql"]);
        assert_eq!(command, Commands::Query);
        assert_eq!(overrides.selector.as_deref(), Some("pre.sparql"));

        let (_, _, command) = parse(&["bdij_tables", "render", "saved.json", "--stdout"]);
        assert_eq!(
            command,
            Commands::Render {
                input: PathBuf::from("saved.json"),
                stdout: true
            }
        );
    }

    #[test]
    fn bad_profile_is_rejected() {
        assert!(Cli::try_parse_from(["bdij_tables", "--profile", "fancy"]).is_err());
        assert!(Cli::try_parse_from(["bdij_tables", "render"]).is_err());
    }

    #[test]
    fn render_accepts_null_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("saved.json");
        std::fs::write(&input, "null").unwrap();

        let table = render_file(&offline_pipeline(Profile::Plain), &input).unwrap();
        assert_eq!(table.text, NO_RESULTS);
        assert_eq!(table.rows, None);
    }

    #[test]
    fn render_applies_profile() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("saved.json");
        std::fs::write(
            &input,
            r#"{"results":{"bindings":[{"item":{"value":"https://web.bdij.com.br/entity/Q1"},"itemLabel":{"value":"Foo"}}]}}"#,
        )
        .unwrap();

        let table = render_file(&offline_pipeline(Profile::Linked), &input).unwrap();
        assert_eq!(table.rows, Some(1));
        assert!(table.text.ends_with("|-\n| [[Item:Q1|Q1]]\n| Foo\n| \n| \n|}"));

        std::fs::write(&input, "not json").unwrap();
        assert!(render_file(&offline_pipeline(Profile::Plain), &input).is_err());
    }
}
