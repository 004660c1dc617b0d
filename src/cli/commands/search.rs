//! Search and compare commands.

use console::style;

use crate::cli::icons::{dim_arrow, info};
use crate::config::Settings;
use crate::models::SearchableRecord;
use crate::search::{create_tokenizer, CorpusSource, SearchRequest, SearchService};

/// Match and output options shared by search commands.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub title_only: bool,
    pub use_tokenizer: bool,
    pub aggregate: bool,
    pub json: bool,
}

impl OutputOptions {
    fn request(&self, query: &str) -> SearchRequest {
        SearchRequest {
            query: query.to_string(),
            title_only: self.title_only,
            use_tokenizer: self.use_tokenizer,
            aggregate: self.aggregate,
        }
    }
}

fn build_service(settings: &Settings) -> anyhow::Result<SearchService> {
    let tokenizer = create_tokenizer(&settings.search)?;
    Ok(SearchService::new(
        &settings.text_dir,
        settings.consolidated_store(),
        tokenizer,
        settings.search.compare.clone(),
    ))
}

/// Shorten text for one-line display.
fn snippet(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        format!("{}…", flat.chars().take(max_chars).collect::<String>())
    }
}

fn print_records(records: &[SearchableRecord]) {
    for record in records {
        let location = if record.relative_path.is_empty() {
            record.filename.clone()
        } else {
            format!("{}/{}", record.relative_path, record.filename)
        };
        println!("  {} {} p{}", dim_arrow(), style(location).bold(), record.page);
        if !record.text.is_empty() {
            println!("      {}", style(snippet(&record.text, 100)).dim());
        }
    }
}

/// Search one corpus.
pub async fn cmd_search(
    settings: &Settings,
    query: &str,
    engine: Option<&str>,
    lang: Option<&str>,
    options: OutputOptions,
) -> anyhow::Result<()> {
    let engine = engine.unwrap_or(settings.search.default_engine.as_str());
    let lang = lang.unwrap_or(settings.search.default_lang.as_str());
    let source = CorpusSource::resolve(engine, lang)?;
    let service = build_service(settings)?;

    let results = service.search(&source, &options.request(query)).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("{} {} matches in {}", info(), results.len(), source);
    print_records(&results);
    Ok(())
}

/// Run one query across the configured engine/language pairs.
pub async fn cmd_compare(settings: &Settings, query: &str, options: OutputOptions) -> anyhow::Result<()> {
    let service = build_service(settings)?;
    let results = service.compare_engines(&options.request(query)).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for (label, records) in &results {
        println!("{} {}: {} matches", info(), style(label).cyan(), records.len());
        print_records(records);
    }
    Ok(())
}
