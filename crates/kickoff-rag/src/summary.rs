//! Match report rendering
//!
//! Documents are line-oriented, with one `Key: value` fact per line. A
//! fixed rule table maps line prefixes to report fields; lines that match
//! no rule are ignored and any field left unset renders as a placeholder.

/// Returned when there is nothing to summarize
pub const NO_MATCHES: &str = "No matches found.";

const SEPARATOR_WIDTH: usize = 60;

/// A value the report knows how to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    HomeTeam,
    AwayTeam,
    Score,
    HomeShots,
    AwayShots,
    Fouls,
    Corners,
    YellowCards,
    RedCards,
}

const FIELD_COUNT: usize = 10;

/// What part of a matching line becomes the field value
#[derive(Debug, Clone, Copy)]
enum Capture {
    /// The whole (trimmed) line
    Line,
    /// Everything after the prefix
    Value,
}

struct FieldRule {
    field: Field,
    prefix: &'static str,
    capture: Capture,
    placeholder: &'static str,
}

const FIELD_RULES: [FieldRule; FIELD_COUNT] = [
    FieldRule {
        field: Field::Date,
        prefix: "Match played on",
        capture: Capture::Line,
        placeholder: "Date: N/A",
    },
    FieldRule {
        field: Field::HomeTeam,
        prefix: "Home team:",
        capture: Capture::Value,
        placeholder: "N/A",
    },
    FieldRule {
        field: Field::AwayTeam,
        prefix: "Away team:",
        capture: Capture::Value,
        placeholder: "N/A",
    },
    FieldRule {
        field: Field::Score,
        prefix: "Final score:",
        capture: Capture::Value,
        placeholder: "N/A",
    },
    FieldRule {
        field: Field::HomeShots,
        prefix: "Home shots:",
        capture: Capture::Line,
        placeholder: "Home shots: N/A",
    },
    FieldRule {
        field: Field::AwayShots,
        prefix: "Away shots:",
        capture: Capture::Line,
        placeholder: "Away shots: N/A",
    },
    FieldRule {
        field: Field::Fouls,
        prefix: "Fouls:",
        capture: Capture::Line,
        placeholder: "Fouls: N/A",
    },
    FieldRule {
        field: Field::Corners,
        prefix: "Corners:",
        capture: Capture::Line,
        placeholder: "Corners: N/A",
    },
    FieldRule {
        field: Field::YellowCards,
        prefix: "Yellow cards:",
        capture: Capture::Line,
        placeholder: "Yellow cards: N/A",
    },
    FieldRule {
        field: Field::RedCards,
        prefix: "Red cards:",
        capture: Capture::Line,
        placeholder: "Red cards: N/A",
    },
];

/// Fields pulled out of one document, borrowed from its text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFields<'a> {
    values: [Option<&'a str>; FIELD_COUNT],
}

impl<'a> MatchFields<'a> {
    /// Scan `text` once; the first line matching a field wins
    pub fn extract(text: &'a str) -> Self {
        let mut fields = Self::default();

        for line in text.lines() {
            let line = line.trim();
            let line = line.strip_prefix("- ").unwrap_or(line);

            for rule in &FIELD_RULES {
                let Some(rest) = line.strip_prefix(rule.prefix) else {
                    continue;
                };
                let value = match rule.capture {
                    Capture::Line => line,
                    Capture::Value => rest.trim(),
                };

                let slot = &mut fields.values[rule.field as usize];
                if slot.is_none() && !value.is_empty() {
                    *slot = Some(value);
                }
                break;
            }
        }

        fields
    }

    /// Extracted value, if the document had one
    pub fn get(&self, field: Field) -> Option<&'a str> {
        self.values[field as usize]
    }

    fn render(&self, field: Field) -> &'a str {
        let rule = &FIELD_RULES[field as usize];
        self.get(field).unwrap_or(rule.placeholder)
    }
}

/// Renders matched documents into a plain-text report.
///
/// Stateless; the same input always yields byte-identical output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Summarizer;

impl Summarizer {
    pub fn new() -> Self {
        Self
    }

    /// Report for `matches`, in the order given
    pub fn summarize<T: AsRef<str>>(&self, matches: &[T]) -> String {
        if matches.is_empty() {
            return NO_MATCHES.to_string();
        }

        let separator = "=".repeat(SEPARATOR_WIDTH);
        let mut lines = vec![
            format!("Found {} relevant matches:", matches.len()),
            String::new(),
        ];

        for (i, document) in matches.iter().enumerate() {
            let fields = MatchFields::extract(document.as_ref());

            lines.push(String::new());
            lines.push(separator.clone());
            lines.push(format!("MATCH {}:", i + 1));
            lines.push(separator.clone());
            lines.push(fields.render(Field::Date).to_string());
            lines.push(format!(
                "{} vs {}",
                fields.render(Field::HomeTeam),
                fields.render(Field::AwayTeam)
            ));
            lines.push(format!("Score: {}", fields.render(Field::Score)));
            lines.push(String::new());
            lines.push("Statistics:".to_string());
            for field in [
                Field::HomeShots,
                Field::AwayShots,
                Field::Fouls,
                Field::Corners,
                Field::YellowCards,
                Field::RedCards,
            ] {
                lines.push(format!("  {}", fields.render(field)));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DERBY: &str = "Match played on 10/08/2019 in 2019-20 season.

Home team: Liverpool
Away team: Norwich

Final score: Liverpool 4 - 1 Norwich
Full-time result: H

Half-time score: 4 - 0
Half-time result: H

Referee: M Oliver

Match statistics:
- Home shots: 15 (on target: 7)
- Away shots: 12 (on target: 5)
- Fouls: Home 9, Away 9
- Corners: Home 11, Away 2
- Yellow cards: Home 0, Away 2
- Red cards: Home 0, Away 0";

    #[test]
    fn test_rule_table_is_indexed_by_field() {
        for (i, rule) in FIELD_RULES.iter().enumerate() {
            assert_eq!(rule.field as usize, i);
        }
    }

    #[test]
    fn test_empty_input() {
        let empty: [&str; 0] = [];
        assert_eq!(Summarizer::new().summarize(&empty), NO_MATCHES);
    }

    #[test]
    fn test_extract_all_fields() {
        let fields = MatchFields::extract(DERBY);
        assert_eq!(
            fields.get(Field::Date),
            Some("Match played on 10/08/2019 in 2019-20 season.")
        );
        assert_eq!(fields.get(Field::HomeTeam), Some("Liverpool"));
        assert_eq!(fields.get(Field::AwayTeam), Some("Norwich"));
        assert_eq!(fields.get(Field::Score), Some("Liverpool 4 - 1 Norwich"));
        assert_eq!(
            fields.get(Field::HomeShots),
            Some("Home shots: 15 (on target: 7)")
        );
        assert_eq!(fields.get(Field::RedCards), Some("Red cards: Home 0, Away 0"));
    }

    #[test]
    fn test_full_report_layout() {
        let report = Summarizer::new().summarize(&[DERBY]);
        let expected = format!(
            "Found 1 relevant matches:\n\n\n{sep}\nMATCH 1:\n{sep}\n\
             Match played on 10/08/2019 in 2019-20 season.\n\
             Liverpool vs Norwich\n\
             Score: Liverpool 4 - 1 Norwich\n\
             \n\
             Statistics:\n\
             \x20 Home shots: 15 (on target: 7)\n\
             \x20 Away shots: 12 (on target: 5)\n\
             \x20 Fouls: Home 9, Away 9\n\
             \x20 Corners: Home 11, Away 2\n\
             \x20 Yellow cards: Home 0, Away 2\n\
             \x20 Red cards: Home 0, Away 0",
            sep = "=".repeat(60)
        );
        assert_eq!(report, expected);
    }

    #[test]
    fn test_missing_fields_render_placeholders() {
        let partial = "Home team: Leeds\nReferee: A Taylor\n- Fouls: Home 12, Away 8";
        let report = Summarizer::new().summarize(&[partial]);

        assert!(report.contains("Date: N/A"));
        assert!(report.contains("Leeds vs N/A"));
        assert!(report.contains("Score: N/A"));
        assert!(report.contains("  Fouls: Home 12, Away 8"));
        assert!(report.contains("  Yellow cards: N/A"));
        assert!(report.contains("  Red cards: N/A"));
        assert!(!report.contains("Referee"));
    }

    #[test]
    fn test_unknown_lines_do_not_disturb_other_fields() {
        let with_noise = DERBY.replace("Referee: M Oliver", "Attendance: 53,333\nReferee:");
        assert_eq!(
            MatchFields::extract(&with_noise),
            MatchFields::extract(DERBY)
        );
    }

    #[test]
    fn test_one_bad_match_does_not_affect_another() {
        let report = Summarizer::new().summarize(&["garbage\n\n:::", DERBY]);
        let sections: Vec<_> = report.split("MATCH ").collect();
        assert_eq!(sections.len(), 3);
        assert!(sections[1].contains("N/A vs N/A"));
        assert!(sections[2].contains("Liverpool vs Norwich"));
        assert!(sections[2].contains("  Corners: Home 11, Away 2"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let doubled = "Home team: Arsenal\nHome team: Spurs";
        assert_eq!(
            MatchFields::extract(doubled).get(Field::HomeTeam),
            Some("Arsenal")
        );
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let summarizer = Summarizer::new();
        let docs = [DERBY, "Home team: Leeds", ""];
        assert_eq!(summarizer.summarize(&docs), summarizer.summarize(&docs));
    }
}
