use crate::board::*;

use std::time::Duration;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    pub title: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub mode: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "unknownNameLabel")]
    pub unknown_name_label: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionSettings {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    pub deadline: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AdminSettings {
    pub passcode: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PointValueSettings {
    pub shift: Option<i64>,
    pub alcohol: Option<i64>,
    pub average: Option<i64>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    pub source: Option<FileSource>,
    pub competition: Option<CompetitionSettings>,
    pub admin: Option<AdminSettings>,
    #[serde(rename = "pointValues")]
    pub point_values: Option<PointValueSettings>,
    #[serde(rename = "refreshIntervalSeconds")]
    pub refresh_interval_seconds: Option<u64>,
}

pub fn read_config(path: &str) -> BoardResult<BoardConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: BoardConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    info!("config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> BoardResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_summary: {:?}", js["results"]);
    Ok(js)
}

/// Everything a command needs, after merging the configuration file and the
/// command line.
#[derive(PartialEq, Debug, Clone)]
pub struct Settings {
    pub title: String,
    pub output_path: Option<String>,
    pub feed: DataFeed,
    pub window: CompetitionWindow,
    pub passcode: Option<String>,
    pub point_values: PointValues,
    pub refresh_interval: Duration,
}

pub const DEFAULT_TITLE: &str = "Leaderboard";
pub const DEFAULT_REFRESH_SECONDS: u64 = 300;

impl Settings {
    /// Merges the configuration with the command line. Relative paths coming
    /// from the configuration are resolved from `root`.
    pub fn resolve(
        config: Option<BoardConfig>,
        root: &Path,
        overrides: &Overrides,
    ) -> BoardResult<Settings> {
        let config = config.unwrap_or(BoardConfig {
            output_settings: None,
            source: None,
            competition: None,
            admin: None,
            point_values: None,
            refresh_interval_seconds: None,
        });

        let file_source = config.source.clone();
        let provider = overrides
            .input_type
            .clone()
            .or_else(|| file_source.as_ref().map(|fs| fs.provider.clone()));
        let path = match (&overrides.input, &file_source) {
            (Some(p), _) => p.clone(),
            (None, Some(fs)) => io_common::resolve_path(root, &fs.file_path),
            (None, None) => return MissingSourceSnafu {}.fail(),
        };
        // Without an explicit provider, the extension decides.
        let provider = provider.unwrap_or_else(|| guess_provider(&path).to_string());
        let worksheet = overrides
            .excel_worksheet_name
            .clone()
            .or_else(|| file_source.as_ref().and_then(|fs| fs.excel_worksheet_name.clone()));
        let source = match provider.as_str() {
            "excel" | "xlsx" => DataSource::Excel { path, worksheet },
            "csv" => DataSource::Csv { path },
            "json" => DataSource::Json { path },
            x => {
                return UnsupportedSourceSnafu {
                    provider: x.to_string(),
                }
                .fail()
            }
        };

        let mode = overrides
            .mode
            .clone()
            .or_else(|| file_source.as_ref().and_then(|fs| fs.mode.clone()));
        let ingestion = match mode.as_deref() {
            None | Some("aggregate") => Ingestion::Aggregate,
            Some("snapshot") => Ingestion::Snapshot,
            Some(x) => {
                return UnsupportedModeSnafu {
                    mode: x.to_string(),
                }
                .fail()
            }
        };

        let mut rules = AggregationRules::default();
        if let Some(label) = file_source.as_ref().and_then(|fs| fs.unknown_name_label.clone()) {
            rules.unknown_name = label;
        }

        let window = match &config.competition {
            Some(c) => {
                let default = CompetitionWindow::default();
                let start = match &c.start_date {
                    Some(s) => parse_date("startDate", s)?,
                    None => default.start,
                };
                let deadline = match &c.deadline {
                    Some(s) => parse_date("deadline", s)?,
                    None => default.deadline,
                };
                CompetitionWindow::new(start, deadline)
            }
            None => CompetitionWindow::default(),
        };

        let point_values = match &config.point_values {
            Some(pv) => {
                let d = PointValues::DEFAULT_VALUES;
                PointValues {
                    shift: pv.shift.unwrap_or(d.shift),
                    alcohol: pv.alcohol.unwrap_or(d.alcohol),
                    average: pv.average.unwrap_or(d.average),
                }
            }
            None => PointValues::default(),
        };

        let output = config.output_settings.clone();
        let title = output
            .as_ref()
            .and_then(|o| o.title.clone())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let output_path = output
            .and_then(|o| o.output_path)
            .map(|p| io_common::resolve_path(root, &p));

        let passcode = config.admin.and_then(|a| a.passcode);
        let refresh_interval = Duration::from_secs(
            config
                .refresh_interval_seconds
                .unwrap_or(DEFAULT_REFRESH_SECONDS)
                .max(1),
        );

        Ok(Settings {
            title,
            output_path,
            feed: DataFeed {
                source,
                ingestion,
                rules,
            },
            window,
            passcode,
            point_values,
            refresh_interval,
        })
    }
}

fn guess_provider(path: &str) -> &'static str {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("csv") => "csv",
        Some("json") => "json",
        _ => "excel",
    }
}

fn parse_date(field: &str, value: &str) -> BoardResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M:%S").context(ParsingDateSnafu {
        field,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> BoardConfig {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn full_config() {
        let config = parse(
            r#"{
            "outputSettings": { "title": "Team Challenge", "outputPath": "board.json" },
            "source": { "provider": "csv", "filePath": "data/ranking.csv", "mode": "snapshot",
                        "unknownNameLabel": "?" },
            "competition": { "startDate": "2026-03-01T00:00:00", "deadline": "2026-03-31T23:59:59" },
            "admin": { "passcode": "1234" },
            "pointValues": { "shift": 2 },
            "refreshIntervalSeconds": 60
        }"#,
        );
        let s = Settings::resolve(Some(config), Path::new("/srv/board"), &Overrides::default())
            .unwrap();
        assert_eq!(s.title, "Team Challenge");
        assert_eq!(s.output_path, Some("/srv/board/board.json".to_string()));
        assert_eq!(
            s.feed.source,
            DataSource::Csv {
                path: "/srv/board/data/ranking.csv".to_string()
            }
        );
        assert_eq!(s.feed.ingestion, Ingestion::Snapshot);
        assert_eq!(s.feed.rules.unknown_name, "?");
        assert_eq!(s.passcode, Some("1234".to_string()));
        assert_eq!(s.point_values.shift, 2);
        assert_eq!(s.point_values.alcohol, 6);
        assert_eq!(s.refresh_interval, Duration::from_secs(60));
        assert_eq!(
            s.window.deadline,
            NaiveDateTime::parse_from_str("2026-03-31T23:59:59", "%Y-%m-%dT%H:%M:%S").unwrap()
        );
    }

    #[test]
    fn command_line_overrides_config() {
        let config = parse(r#"{ "source": { "provider": "csv", "filePath": "a.csv" } }"#);
        let overrides = Overrides {
            input: Some("/tmp/b.xlsx".to_string()),
            input_type: Some("excel".to_string()),
            mode: None,
            excel_worksheet_name: Some("Sheet2".to_string()),
        };
        let s = Settings::resolve(Some(config), Path::new("/srv"), &overrides).unwrap();
        assert_eq!(
            s.feed.source,
            DataSource::Excel {
                path: "/tmp/b.xlsx".to_string(),
                worksheet: Some("Sheet2".to_string())
            }
        );
        assert_eq!(s.feed.ingestion, Ingestion::Aggregate);
    }

    #[test]
    fn defaults_without_config() {
        let overrides = Overrides {
            input: Some("state.json".to_string()),
            ..Overrides::default()
        };
        let s = Settings::resolve(None, Path::new("."), &overrides).unwrap();
        assert_eq!(
            s.feed.source,
            DataSource::Json {
                path: "state.json".to_string()
            }
        );
        assert_eq!(s.title, DEFAULT_TITLE);
        assert_eq!(s.window, CompetitionWindow::default());
        assert_eq!(s.passcode, None);
        assert_eq!(s.refresh_interval, Duration::from_secs(300));
        assert_eq!(s.feed.rules.unknown_name, UNKNOWN_NAME);
    }

    #[test]
    fn errors() {
        let res = Settings::resolve(None, Path::new("."), &Overrides::default());
        assert!(matches!(res, Err(BoardError::MissingSource {})));

        let config = parse(r#"{ "source": { "provider": "dominion", "filePath": "a" } }"#);
        let res = Settings::resolve(Some(config), Path::new("."), &Overrides::default());
        assert!(matches!(res, Err(BoardError::UnsupportedSource { .. })));

        let config = parse(
            r#"{ "source": { "provider": "csv", "filePath": "a" },
                 "competition": { "deadline": "next friday" } }"#,
        );
        let res = Settings::resolve(Some(config), Path::new("."), &Overrides::default());
        assert!(matches!(res, Err(BoardError::ParsingDate { .. })));

        let overrides = Overrides {
            input: Some("a.csv".to_string()),
            mode: Some("sum".to_string()),
            ..Overrides::default()
        };
        let res = Settings::resolve(None, Path::new("."), &overrides);
        assert!(matches!(res, Err(BoardError::UnsupportedMode { .. })));
    }
}
