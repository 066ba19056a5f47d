//! Table writers for annotated records.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

use crate::errors::ExportError;
use crate::processor::AnnotatedMessage;

pub const CSV_COLUMNS: [&str; 12] = [
    "conversation_id",
    "message_id",
    "sender_id",
    "text",
    "is_answered",
    "sentiment",
    "category",
    "intent",
    "type",
    "is_internal",
    "timestamp",
    "response_time",
];

const BYTE_ORDER_MARK: &str = "\u{feff}";
const LINE_TERMINATOR: &str = "\r\n";

pub const SQLITE_TABLE: &str = "conversation_analysis";

const CREATE_TABLE: &str = "
    DROP TABLE IF EXISTS conversation_analysis;
    CREATE TABLE conversation_analysis (
        conversation_id TEXT NOT NULL,
        message_id TEXT NOT NULL,
        sender_id TEXT NOT NULL,
        text TEXT NOT NULL,
        is_answered TEXT NOT NULL,
        sentiment TEXT NOT NULL,
        category TEXT NOT NULL,
        intent TEXT NOT NULL,
        \"type\" TEXT NOT NULL,
        is_internal INTEGER NOT NULL,
        timestamp TEXT NOT NULL,
        response_time TEXT
    );";

const INSERT_ROW: &str = "
    INSERT INTO conversation_analysis (
        conversation_id, message_id, sender_id, text, is_answered, sentiment,
        category, intent, \"type\", is_internal, timestamp, response_time
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

/// Output locations for one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub csv: PathBuf,
    pub ndjson: PathBuf,
    pub db: PathBuf,
}

/// `<output_dir>/<stem>_analysis.{csv,ndjson,db}` for an input path.
pub fn output_paths(output_dir: &Path, input: &Path) -> OutputPaths {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "batch".to_string());
    OutputPaths {
        csv: output_dir.join(format!("{}_analysis.csv", stem)),
        ndjson: output_dir.join(format!("{}_analysis.ndjson", stem)),
        db: output_dir.join(format!("{}_analysis.db", stem)),
    }
}

/// CSV writer with RFC 4180 quoting.
pub struct CsvExporter {
    delimiter: char,
    include_headers: bool,
    byte_order_mark: bool,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self {
            delimiter: ',',
            include_headers: true,
            byte_order_mark: true,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_headers(mut self, include_headers: bool) -> Self {
        self.include_headers = include_headers;
        self
    }

    /// Spreadsheet tools need the BOM to detect UTF-8.
    pub fn with_byte_order_mark(mut self, byte_order_mark: bool) -> Self {
        self.byte_order_mark = byte_order_mark;
        self
    }

    fn escape_field<'a>(&self, field: &'a str) -> Cow<'a, str> {
        if field.contains(self.delimiter)
            || field.contains('"')
            || field.contains('\n')
            || field.contains('\r')
        {
            Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
        } else {
            Cow::Borrowed(field)
        }
    }

    fn join(&self, fields: &[Cow<'_, str>]) -> String {
        let mut line = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push(self.delimiter);
            }
            line.push_str(field);
        }
        line
    }

    fn record_to_row(&self, record: &AnnotatedMessage) -> String {
        let response_time = record
            .response_time
            .map(|rt| rt.to_string())
            .unwrap_or_default();
        let fields = [
            self.escape_field(&record.conversation_id),
            self.escape_field(&record.message_id),
            self.escape_field(&record.sender_id),
            self.escape_field(&record.text),
            Cow::Owned(record.is_answered.to_string()),
            Cow::Borrowed(record.sentiment.as_str()),
            self.escape_field(&record.category),
            self.escape_field(&record.intent),
            self.escape_field(&record.message_type),
            Cow::Owned(record.is_internal.to_string()),
            self.escape_field(&record.timestamp),
            self.escape_field(&response_time),
        ];
        self.join(&fields)
    }

    pub fn render(&self, records: &[AnnotatedMessage]) -> String {
        let mut out = String::new();
        if self.byte_order_mark {
            out.push_str(BYTE_ORDER_MARK);
        }
        if self.include_headers {
            let headers: Vec<Cow<'_, str>> =
                CSV_COLUMNS.iter().map(|c| Cow::Borrowed(*c)).collect();
            out.push_str(&self.join(&headers));
            out.push_str(LINE_TERMINATOR);
        }
        for record in records {
            out.push_str(&self.record_to_row(record));
            out.push_str(LINE_TERMINATOR);
        }
        out
    }

    pub fn write(&self, records: &[AnnotatedMessage], path: &Path) -> Result<(), ExportError> {
        fs::write(path, self.render(records)).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// One JSON object per line.
pub fn write_ndjson(records: &[AnnotatedMessage], path: &Path) -> Result<(), ExportError> {
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n").map_err(io_error)?;
    }
    writer.flush().map_err(io_error)
}

/// Replaces the `conversation_analysis` table of the database at `path`
/// with `records`, in one transaction.
pub fn write_sqlite(records: &[AnnotatedMessage], path: &Path) -> Result<(), ExportError> {
    let mut conn = Connection::open(path)?;
    let tx = conn.transaction()?;
    tx.execute_batch(CREATE_TABLE)?;
    {
        let mut insert = tx.prepare(INSERT_ROW)?;
        for record in records {
            insert.execute(params![
                record.conversation_id,
                record.message_id,
                record.sender_id,
                record.text,
                record.is_answered.to_string(),
                record.sentiment.as_str(),
                record.category,
                record.intent,
                record.message_type,
                record.is_internal,
                record.timestamp,
                record.response_time.map(|rt| rt.to_string()),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Answered;
    use crate::sentiment::SentimentLabel;
    use crate::timing::ResponseTime;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;

    fn record(text: &str, response_time: Option<ResponseTime>) -> AnnotatedMessage {
        AnnotatedMessage {
            conversation_id: "c-1".to_string(),
            message_id: "0".to_string(),
            sender_id: "1".to_string(),
            text: text.to_string(),
            is_answered: Answered::Yes,
            sentiment: SentimentLabel::Positive,
            category: "Wedding Venue".to_string(),
            intent: "Praise".to_string(),
            message_type: "text".to_string(),
            is_internal: false,
            timestamp: "2024-05-01T10:00:00".to_string(),
            response_time,
        }
    }

    #[test]
    fn test_output_paths() {
        let paths = output_paths(Path::new("outputs"), Path::new("data/chats_may.json"));
        assert_eq!(paths.csv, PathBuf::from("outputs/chats_may_analysis.csv"));
        assert_eq!(paths.ndjson, PathBuf::from("outputs/chats_may_analysis.ndjson"));
        assert_eq!(paths.db, PathBuf::from("outputs/chats_may_analysis.db"));
    }

    #[test]
    fn test_render_with_header_and_bom() {
        let csv = CsvExporter::new().render(&[record("Harika bir mekan!", None)]);
        let mut lines = csv.split("\r\n");
        assert_eq!(
            lines.next().unwrap(),
            "\u{feff}conversation_id,message_id,sender_id,text,is_answered,sentiment,category,intent,type,is_internal,timestamp,response_time"
        );
        assert_eq!(
            lines.next().unwrap(),
            "c-1,0,1,Harika bir mekan!,Yes,Positive,Wedding Venue,Praise,text,false,2024-05-01T10:00:00,"
        );
        assert_eq!(lines.next().unwrap(), "");
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_quoting() {
        let exporter = CsvExporter::new()
            .with_headers(false)
            .with_byte_order_mark(false);
        let csv = exporter.render(&[record(
            "dedi ki \"ama\", sonra\nsustu",
            Some(ResponseTime::new(TimeDelta::hours(26))),
        )]);
        assert_eq!(
            csv,
            "c-1,0,1,\"dedi ki \"\"ama\"\", sonra\nsustu\",Yes,Positive,Wedding Venue,Praise,text,false,2024-05-01T10:00:00,\"1 day, 2:00:00\"\r\n"
        );
    }

    #[test]
    fn test_custom_delimiter() {
        let exporter = CsvExporter::new()
            .with_delimiter(';')
            .with_headers(false)
            .with_byte_order_mark(false);
        let csv = exporter.render(&[record("a;b, c", None)]);
        assert!(csv.starts_with("c-1;0;1;\"a;b, c\";Yes;"));
    }

    #[test]
    fn test_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = output_paths(dir.path(), Path::new("chats.json"));
        let records = vec![
            record("merhaba", None),
            record("merhaba", Some(ResponseTime::new(TimeDelta::minutes(5)))),
        ];

        CsvExporter::new().write(&records, &paths.csv).unwrap();
        write_ndjson(&records, &paths.ndjson).unwrap();

        let csv = fs::read_to_string(&paths.csv).unwrap();
        assert_eq!(csv.lines().count(), 3);

        let ndjson = fs::read_to_string(&paths.ndjson).unwrap();
        let rows: Vec<serde_json::Value> = ndjson
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["response_time"], serde_json::Value::Null);
        assert_eq!(rows[1]["response_time"], "0:05:00");
        assert_eq!(rows[1]["type"], "text");
        assert_eq!(rows[1]["is_answered"], "Yes");
    }

    type Row = (String, String, String, bool, Option<String>);

    fn read_rows(path: &Path) -> Vec<Row> {
        let conn = Connection::open(path).unwrap();
        let mut select = conn
            .prepare(&format!(
                "SELECT message_id, text, is_answered, is_internal, response_time FROM {} ORDER BY rowid",
                SQLITE_TABLE
            ))
            .unwrap();
        let rows = select
            .query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })
            .unwrap();
        rows.collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_write_sqlite_replaces_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_paths(dir.path(), Path::new("chats.json")).db;

        let mut internal = record("dahili not", None);
        internal.message_id = "1".to_string();
        internal.is_internal = true;
        internal.is_answered = Answered::No;
        write_sqlite(
            &[
                record("merhaba", Some(ResponseTime::new(TimeDelta::minutes(5)))),
                internal,
            ],
            &path,
        )
        .unwrap();

        assert_eq!(
            read_rows(&path),
            vec![
                (
                    "0".to_string(),
                    "merhaba".to_string(),
                    "Yes".to_string(),
                    false,
                    Some("0:05:00".to_string())
                ),
                (
                    "1".to_string(),
                    "dahili not".to_string(),
                    "No".to_string(),
                    true,
                    None
                ),
            ]
        );

        write_sqlite(&[record("tekrar", None)], &path).unwrap();
        let rows = read_rows(&path);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, "tekrar");
    }

    #[test]
    fn test_write_sqlite_into_foreign_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chats_analysis.db");
        fs::write(&path, "plain text, not a database file\n".repeat(64)).unwrap();

        let err = write_sqlite(&[record("merhaba", None)], &path).unwrap_err();
        assert!(matches!(err, ExportError::Sqlite(_)));
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = CsvExporter::new().write(&[], &path).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
