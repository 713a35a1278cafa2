use std::collections::HashMap;

use crate::chart::error::ChartError;

/// A `tick = TYPE data` event inside a chart section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartEvent {
    pub position: u32,
    pub event_type: String,
    pub data: String,
}

/// One `[Name] { ... }` block.
#[derive(Debug, Clone, Default)]
pub struct ChartSection {
    pub name: String,
    pub key_value_pairs: HashMap<String, String>,
    pub events: Vec<ChartEvent>,
}

/// A parsed `.chart` file, uninterpreted.
#[derive(Debug, Clone, Default)]
pub struct Chart {
    pub sections: Vec<ChartSection>,
}

impl Chart {
    pub fn section(&self, name: &str) -> Option<&ChartSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Ticks per quarter note, defaulting to 192 when `[Song]` omits it.
    pub fn resolution(&self) -> u32 {
        self.song_value("Resolution").unwrap_or(192)
    }

    /// Audio offset in milliseconds, defaulting to 0.
    pub fn offset(&self) -> f64 {
        self.section("Song")
            .and_then(|s| s.key_value_pairs.get("Offset"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0)
    }

    fn song_value<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.section("Song")
            .and_then(|s| s.key_value_pairs.get(key))
            .and_then(|v| v.parse().ok())
    }
}

/// Parse the generic section structure of a `.chart` file.
///
/// Sections are `[Name]` headers followed by a braced block of entries. An
/// entry whose left-hand side is a tick number becomes an event; anything
/// else becomes a key/value pair. Entry lines with no `=` are skipped, since
/// charts in the wild contain them.
pub fn parse_chart(text: &str) -> Result<Chart, ChartError> {
    let mut sections = Vec::new();
    let mut lines = text
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, l)| !l.is_empty());

    while let Some((line_no, line)) = lines.next() {
        let name = line
            .strip_prefix('[')
            .and_then(|l| l.strip_suffix(']'))
            .ok_or_else(|| ChartError::ExpectedSectionHeader {
                line: line_no + 1,
                found: line.to_owned(),
            })?;
        let mut section = ChartSection {
            name: name.to_owned(),
            ..ChartSection::default()
        };

        match lines.next() {
            Some((_, "{")) => {}
            _ => {
                return Err(ChartError::UnopenedSection {
                    line: line_no + 1,
                    section: section.name,
                });
            }
        }

        let mut closed = false;
        for (_, entry) in lines.by_ref() {
            if entry == "}" {
                closed = true;
                break;
            }
            let Some((lhs, rhs)) = entry.split_once('=') else {
                continue;
            };
            let lhs = lhs.trim();
            let rhs = rhs.trim();
            if let Ok(position) = lhs.parse::<u32>() {
                let mut tokens = rhs.splitn(2, char::is_whitespace);
                let event_type = tokens.next().unwrap_or_default().to_owned();
                let data = tokens.next().unwrap_or_default().trim().to_owned();
                section.events.push(ChartEvent {
                    position,
                    event_type,
                    data,
                });
            } else {
                let value = rhs.trim_matches('"').to_owned();
                section.key_value_pairs.insert(lhs.to_owned(), value);
            }
        }
        if !closed {
            return Err(ChartError::UnclosedSection {
                section: section.name,
            });
        }
        sections.push(section);
    }

    Ok(Chart { sections })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_192_resolution_and_zero_offset() {
        let text = "[Song]\n{\n}\n[SyncTrack]\n{\n}\n[Events]\n{\n}\n";
        let chart = parse_chart(text).unwrap();

        assert_eq!(chart.resolution(), 192);
        assert_eq!(chart.offset(), 0.0);
    }

    #[test]
    fn defaults_are_overridden_by_specified_values() {
        let text = "[Song]\n{\nResolution = 200\nOffset = 100\n}\n[SyncTrack]\n{\n}\n";
        let chart = parse_chart(text).unwrap();

        assert_eq!(chart.resolution(), 200);
        assert_eq!(chart.offset(), 100.0);
    }

    #[test]
    fn events_and_key_values_are_separated() {
        let text = "[Song]\n{\nName = \"Test Song\"\n}\n[ExpertSingle]\n{\n768 = N 0 0\n768 = S 2 100\n}\n";
        let chart = parse_chart(text).unwrap();

        assert_eq!(
            chart.section("Song").unwrap().key_value_pairs["Name"],
            "Test Song"
        );
        let track = chart.section("ExpertSingle").unwrap();
        assert_eq!(
            track.events,
            vec![
                ChartEvent {
                    position: 768,
                    event_type: "N".to_owned(),
                    data: "0 0".to_owned(),
                },
                ChartEvent {
                    position: 768,
                    event_type: "S".to_owned(),
                    data: "2 100".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn missing_header_is_an_error() {
        let text = "Resolution = 200\n";
        assert!(matches!(
            parse_chart(text),
            Err(ChartError::ExpectedSectionHeader { line: 1, .. })
        ));
    }

    #[test]
    fn unclosed_section_is_an_error() {
        let text = "[Song]\n{\nResolution = 200\n";
        assert!(matches!(
            parse_chart(text),
            Err(ChartError::UnclosedSection { .. })
        ));
    }
}
