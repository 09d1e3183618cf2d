//! Match document formatting
//!
//! One document per CSV row. The text layout is what the summary parser
//! reads back, so field prefixes here and there must stay in step.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use serde::Deserialize;

use crate::{ensure_parent, IngestError, Result};

/// One row of the combined seasons CSV (football-data.co.uk column names)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatchRecord {
    #[serde(rename = "Date")]
    pub date: String,
    pub season: String,
    #[serde(rename = "HomeTeam")]
    pub home_team: String,
    #[serde(rename = "AwayTeam")]
    pub away_team: String,
    /// Full-time home goals
    #[serde(rename = "FTHG")]
    pub full_time_home_goals: String,
    #[serde(rename = "FTAG")]
    pub full_time_away_goals: String,
    /// H, D or A
    #[serde(rename = "FTR")]
    pub full_time_result: String,
    #[serde(rename = "HTHG")]
    pub half_time_home_goals: String,
    #[serde(rename = "HTAG")]
    pub half_time_away_goals: String,
    #[serde(rename = "HTR")]
    pub half_time_result: String,
    #[serde(rename = "Referee")]
    pub referee: String,
    #[serde(rename = "HS")]
    pub home_shots: String,
    #[serde(rename = "AS")]
    pub away_shots: String,
    #[serde(rename = "HST")]
    pub home_shots_on_target: String,
    #[serde(rename = "AST")]
    pub away_shots_on_target: String,
    #[serde(rename = "HF")]
    pub home_fouls: String,
    #[serde(rename = "AF")]
    pub away_fouls: String,
    #[serde(rename = "HC")]
    pub home_corners: String,
    #[serde(rename = "AC")]
    pub away_corners: String,
    #[serde(rename = "HY")]
    pub home_yellow_cards: String,
    #[serde(rename = "AY")]
    pub away_yellow_cards: String,
    #[serde(rename = "HR")]
    pub home_red_cards: String,
    #[serde(rename = "AR")]
    pub away_red_cards: String,
}

fn or_na(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

/// Render one match as a line-oriented document
pub fn format_match(record: &MatchRecord) -> String {
    let home = or_na(&record.home_team);
    let away = or_na(&record.away_team);

    let mut text = String::new();
    // Writing to a String cannot fail
    let _ = write!(
        text,
        "Match played on {} in {} season.\n\
         \n\
         Home team: {home}\n\
         Away team: {away}\n\
         \n\
         Final score: {home} {} - {} {away}\n\
         Full-time result: {}\n\
         \n\
         Half-time score: {} - {}\n\
         Half-time result: {}\n\
         \n\
         Referee: {}\n\
         \n\
         Match statistics:\n\
         - Home shots: {} (on target: {})\n\
         - Away shots: {} (on target: {})\n\
         - Fouls: Home {}, Away {}\n\
         - Corners: Home {}, Away {}\n\
         - Yellow cards: Home {}, Away {}\n\
         - Red cards: Home {}, Away {}",
        or_na(&record.date),
        or_na(&record.season),
        or_na(&record.full_time_home_goals),
        or_na(&record.full_time_away_goals),
        or_na(&record.full_time_result),
        or_na(&record.half_time_home_goals),
        or_na(&record.half_time_away_goals),
        or_na(&record.half_time_result),
        or_na(&record.referee),
        or_na(&record.home_shots),
        or_na(&record.home_shots_on_target),
        or_na(&record.away_shots),
        or_na(&record.away_shots_on_target),
        or_na(&record.home_fouls),
        or_na(&record.away_fouls),
        or_na(&record.home_corners),
        or_na(&record.away_corners),
        or_na(&record.home_yellow_cards),
        or_na(&record.away_yellow_cards),
        or_na(&record.home_red_cards),
        or_na(&record.away_red_cards),
    );
    text
}

/// Read the combined CSV and format every row, in file order
pub fn load_match_documents(csv_path: impl AsRef<Path>) -> Result<Vec<String>> {
    let csv_path = csv_path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .map_err(|e| IngestError::csv(csv_path, e))?;

    let documents = reader
        .deserialize::<MatchRecord>()
        .map(|row| {
            row.map(|record| format_match(&record))
                .map_err(|e| IngestError::csv(csv_path, e))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(documents = documents.len(), csv = %csv_path.display(), "Formatted match documents");
    Ok(documents)
}

/// Write all documents as `### MATCH n` blocks, returning the count
pub fn build_documents(csv_path: impl AsRef<Path>, out_path: impl AsRef<Path>) -> Result<usize> {
    let out_path = out_path.as_ref();
    let documents = load_match_documents(csv_path)?;

    ensure_parent(out_path)?;
    let file = std::fs::File::create(out_path).map_err(|e| IngestError::io(out_path, e))?;
    let mut out = std::io::BufWriter::new(file);
    for (i, document) in documents.iter().enumerate() {
        write!(out, "### MATCH {}\n{document}\n\n", i + 1)
            .map_err(|e| IngestError::io(out_path, e))?;
    }
    out.flush().map_err(|e| IngestError::io(out_path, e))?;

    tracing::info!(documents = documents.len(), out = %out_path.display(), "Saved match documents");
    Ok(documents.len())
}
