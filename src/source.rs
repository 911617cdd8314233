use crate::error::{DashboardError, Result};
use crate::normalize::RawRow;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use log::{debug, info};
use serde_json::{Number, Value};
use std::io::Cursor;
use std::path::{Path, PathBuf};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = b"\xD0\xCF\x11\xE0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// Excel workbook (`.xlsx`, `.xls`); only the first worksheet is read.
    Xlsx,
    /// Spreadsheet exported as CSV with a single header line.
    Csv,
    /// A sheet dumped as a JSON array of row objects keyed by header.
    Json,
}

impl SheetFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" => Some(SheetFormat::Xlsx),
            "csv" => Some(SheetFormat::Csv),
            "json" => Some(SheetFormat::Json),
            _ => None,
        }
    }

    /// Guesses the format from content: zip or OLE magic means a workbook, a
    /// leading `[` means a JSON row dump.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            return SheetFormat::Xlsx;
        }
        match strip_bom(bytes).iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'[') => SheetFormat::Json,
            _ => SheetFormat::Csv,
        }
    }
}

/// Where the balance report is read from.
#[derive(Debug, Clone)]
pub enum SpreadsheetSource {
    File(PathBuf),
    Bytes {
        bytes: Vec<u8>,
        format: Option<SheetFormat>,
    },
    #[cfg(feature = "remote")]
    Url(String),
}

impl SpreadsheetSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SpreadsheetSource::File(path.into())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        SpreadsheetSource::Bytes {
            bytes: bytes.into(),
            format: None,
        }
    }

    fn declared_format(&self) -> Option<SheetFormat> {
        match self {
            SpreadsheetSource::File(path) => SheetFormat::from_path(path),
            SpreadsheetSource::Bytes { format, .. } => *format,
            #[cfg(feature = "remote")]
            SpreadsheetSource::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                SheetFormat::from_path(Path::new(path))
            }
        }
    }

    /// Reads and parses the whole sheet. Remote sources need [`Self::read_rows_async`].
    pub fn read_rows(&self) -> Result<Vec<RawRow>> {
        let bytes = match self {
            SpreadsheetSource::File(path) => {
                info!("Reading balance report from {}", path.display());
                std::fs::read(path)?
            }
            SpreadsheetSource::Bytes { bytes, .. } => bytes.clone(),
            #[cfg(feature = "remote")]
            SpreadsheetSource::Url(url) => {
                return Err(DashboardError::UnsupportedSource(format!(
                    "{} must be fetched with read_rows_async",
                    url
                )))
            }
        };
        self.parse(&bytes)
    }

    #[cfg(feature = "remote")]
    pub async fn read_rows_async(&self) -> Result<Vec<RawRow>> {
        let bytes = match self {
            SpreadsheetSource::Url(url) => {
                info!("Fetching balance report from {}", url);
                let response = reqwest::get(url).await?.error_for_status()?;
                response.bytes().await?.to_vec()
            }
            SpreadsheetSource::File(path) => {
                info!("Reading balance report from {}", path.display());
                tokio::fs::read(path).await?
            }
            SpreadsheetSource::Bytes { bytes, .. } => bytes.clone(),
        };
        self.parse(&bytes)
    }

    fn parse(&self, bytes: &[u8]) -> Result<Vec<RawRow>> {
        let format = self
            .declared_format()
            .unwrap_or_else(|| SheetFormat::sniff(bytes));
        debug!("Parsing {} bytes as {:?}", bytes.len(), format);
        parse_rows(bytes, format)
    }
}

pub fn parse_rows(bytes: &[u8], format: SheetFormat) -> Result<Vec<RawRow>> {
    let rows = match format {
        SheetFormat::Xlsx => parse_workbook(bytes)?,
        SheetFormat::Csv => parse_csv(strip_bom(bytes))?,
        SheetFormat::Json => parse_json(strip_bom(bytes))?,
    };
    info!("Parsed {} data rows", rows.len());
    Ok(rows)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

/// Reads the first worksheet with its first row as the header. Blank cells are
/// left out and rows with no values are skipped, as in the CSV path.
fn parse_workbook(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let unreadable = |e: calamine::Error| DashboardError::InvalidWorkbook(e.to_string());

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(unreadable)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            DashboardError::InvalidWorkbook("the workbook has no worksheets".to_string())
        })?
        .map_err(unreadable)?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(header) => header
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect(),
        None => Vec::new(),
    };
    if headers.iter().all(|h| h.is_empty()) {
        return Err(DashboardError::InvalidWorkbook(
            "the header row is empty".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for cells in sheet_rows {
        let mut row = RawRow::new();
        for (header, cell) in headers.iter().zip(cells) {
            if header.is_empty() || row.contains_key(header) {
                continue;
            }
            if let Some(value) = cell_value(cell) {
                row.insert(header.clone(), value);
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Numbers stay numeric; formula errors keep their `#` text so ingestion can flag them.
fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::String(text) if text.is_empty() => None,
        Data::String(text) => Some(Value::String(text.clone())),
        Data::Int(n) => Some(Value::from(*n)),
        Data::Float(f) => Number::from_f64(*f).map(Value::Number),
        Data::Bool(b) => Some(Value::Bool(*b)),
        other => Some(Value::String(other.to_string())),
    }
}

/// Blank cells are left out of the row, and rows with no values at all are skipped.
fn parse_csv(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(DashboardError::InvalidWorkbook(
            "the header row is empty".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = RawRow::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if header.is_empty() || cell.is_empty() || row.contains_key(header) {
                continue;
            }
            row.insert(header.to_string(), Value::String(cell.to_string()));
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(rows)
}

fn parse_json(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Array(items) = value else {
        return Err(DashboardError::InvalidWorkbook(
            "expected a JSON array of row objects".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(row) => Ok(row),
            other => Err(DashboardError::InvalidWorkbook(format!(
                "row {} is not an object: {}",
                index, other
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\u{feff}Household ID,Household Name,Officer Code,Current Month-end Deposit Balance\n\
                       H1,Smith Family,100,\"$1,234\"\n\
                       ,,,\n\
                       H2,,200,$5\n";

    #[test]
    fn test_csv_rows_skip_blanks() {
        let rows = parse_rows(CSV.as_bytes(), SheetFormat::Csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Household ID"], "H1");
        assert_eq!(rows[0]["Current Month-end Deposit Balance"], "$1,234");
        assert!(!rows[1].contains_key("Household Name"));
    }

    #[test]
    fn test_json_rows() {
        let json = br#"[{"Household ID": "H1", "Current Month-end Deposit Balance": 1500}]"#;
        let rows = parse_rows(json, SheetFormat::Json).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Current Month-end Deposit Balance"], 1500);
    }

    #[test]
    fn test_json_must_be_array_of_objects() {
        assert!(matches!(
            parse_rows(br#"{"Household ID": "H1"}"#, SheetFormat::Json),
            Err(DashboardError::InvalidWorkbook(_))
        ));
        assert!(matches!(
            parse_rows(br#"[1, 2]"#, SheetFormat::Json),
            Err(DashboardError::InvalidWorkbook(_))
        ));
        assert!(matches!(
            parse_rows(b"not json", SheetFormat::Json),
            Err(DashboardError::SerializationError(_))
        ));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(SheetFormat::sniff(b"  [{}]"), SheetFormat::Json);
        assert_eq!(SheetFormat::sniff(b"Household ID,"), SheetFormat::Csv);
        assert_eq!(
            SheetFormat::from_path(Path::new("report.CSV")),
            Some(SheetFormat::Csv)
        );
        assert_eq!(
            SheetFormat::from_path(Path::new("household-balance-report.xlsx")),
            Some(SheetFormat::Xlsx)
        );
        assert_eq!(
            SheetFormat::from_path(Path::new("legacy.XLS")),
            Some(SheetFormat::Xlsx)
        );
        assert_eq!(SheetFormat::from_path(Path::new("report.ods")), None);
        assert_eq!(SheetFormat::sniff(b"PK\x03\x04rest"), SheetFormat::Xlsx);
        assert_eq!(
            SheetFormat::sniff(b"\xD0\xCF\x11\xE0\xA1\xB1"),
            SheetFormat::Xlsx
        );
    }

    fn fixture_workbook() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/household-balance-report.xlsx")
    }

    #[test]
    fn test_workbook_first_sheet_rows() {
        let rows = SpreadsheetSource::file(fixture_workbook())
            .read_rows()
            .unwrap();
        // the blank sheet row is skipped
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0]["Household ID"], 1001.0);
        assert_eq!(rows[0]["Household Name"], "Smith Family");
        assert_eq!(rows[0]["Current Month-end Deposit Balance"], 2_500_000.0);
        assert_eq!(rows[0]["% of Deposits to Loans (Current)"], "45%");

        assert_eq!(rows[1]["% of Deposits to Loans (Current)"], "#DIV/0!");
        assert_eq!(rows[1]["% of Deposits to Loans (YTD)"], "#N/A");
        assert_eq!(rows[1]["Officer Name"], 4521.0);

        assert!(!rows[2].contains_key("Household Name"));
        assert_eq!(rows[3]["Household ID"], "Totals");
    }

    #[test]
    fn test_workbook_bytes_are_sniffed() {
        let bytes = std::fs::read(fixture_workbook()).unwrap();
        let rows = SpreadsheetSource::bytes(bytes).read_rows().unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_corrupt_workbook_is_invalid() {
        let result =
            SpreadsheetSource::bytes(b"PK\x03\x04 not really a zip".to_vec()).read_rows();
        assert!(matches!(result, Err(DashboardError::InvalidWorkbook(_))));

        let result = parse_rows(b"Household ID,Household Name\n", SheetFormat::Xlsx);
        assert!(matches!(result, Err(DashboardError::InvalidWorkbook(_))));
    }

    #[test]
    fn test_bytes_source_sniffs_format() {
        let rows = SpreadsheetSource::bytes(br#"[{"Household ID": "H1"}]"#.to_vec())
            .read_rows()
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = SpreadsheetSource::file("/definitely/not/here.csv").read_rows();
        assert!(matches!(result, Err(DashboardError::IoError(_))));
    }
}
