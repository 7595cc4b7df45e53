use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
use reqwest::Client;
use tracing::{debug, info};

use crate::output;
use crate::page;
use crate::results::ResultSet;
use crate::settings::{Profile, Settings};
use crate::sparql::SparqlClient;
use crate::transform::EntityLinker;
use crate::wikitext::{self, TableFormat};

/// A rendered table and how many data rows it holds (`None` for the
/// no-results placeholder).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub text: String,
    pub rows: Option<usize>,
}

/// Outcome of a full run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub rows: Option<usize>,
    pub bytes: usize,
    pub output: PathBuf,
}

/// fetch → extract → query → transform → format → write, configured once.
pub struct Pipeline {
    settings: Settings,
    client: Client,
    sparql: SparqlClient,
    format: TableFormat,
    linker: Option<EntityLinker>,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        let linker = match settings.profile {
            Profile::Plain => None,
            Profile::Linked => Some(
                EntityLinker::new(&settings.entity_base, &settings.link_namespace)
                    .context("Invalid entity base")?,
            ),
        };

        Ok(Self {
            sparql: SparqlClient::new(client.clone(), settings.endpoint.clone()),
            format: TableFormat::for_profile(settings.profile),
            client,
            linker,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Stage 1: the query text embedded in the wiki page.
    pub async fn extract(&self) -> Result<String> {
        let query =
            page::fetch_query(&self.client, &self.settings.page_url, &self.settings.selector).await?;
        Ok(query)
    }

    /// Stages 1-2: results of the query embedded in the page.
    pub async fn fetch_results(&self) -> Result<ResultSet> {
        let query = self.extract().await?;
        debug!(query = %query, "dispatching extracted query");
        let results = self.sparql.query(&query).await?;
        Ok(results)
    }

    /// Stages 3-4: profile post-processing and table markup.
    pub fn render(&self, results: Option<&ResultSet>) -> Table {
        let linked = match (&self.linker, results) {
            (Some(linker), Some(rs)) => Some(linker.apply(rs)),
            _ => None,
        };
        let results = linked.as_ref().or(results);

        Table {
            text: wikitext::render(results, &self.format),
            rows: results.and_then(ResultSet::bindings).map(<[_]>::len),
        }
    }

    /// Stages 1-4 without touching the filesystem.
    pub async fn build_table(&self) -> Result<Table> {
        let results = self.fetch_results().await?;
        Ok(self.render(Some(&results)))
    }

    /// Every stage, ending with the output file being replaced.
    pub async fn run(&self) -> Result<RunReport> {
        let pb = spinner()?;

        pb.set_message(format!("Fetching {}", self.settings.page_url));
        let query = self.extract().await?;

        pb.set_message(format!("Querying {}", self.sparql.endpoint()));
        let results = self.sparql.query(&query).await?;

        pb.set_message("Formatting table");
        let table = self.render(Some(&results));
        info!(
            profile = self.settings.profile.as_str(),
            rows = ?table.rows,
            "Formatted table"
        );

        pb.set_message(format!("Writing {}", self.settings.output.display()));
        output::write_table(&self.settings.output, &table.text)?;
        pb.finish_and_clear();

        Ok(RunReport {
            rows: table.rows,
            bytes: table.text.len(),
            output: self.settings.output.clone(),
        })
    }
}

fn spinner() -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner().with_finish(ProgressFinish::AndClear);
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}
