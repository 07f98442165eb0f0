//! crates/bod_sheets/src/http.rs
//! Google Sheets v4 + Drive v3 over `reqwest::blocking`.
//!
//! Worksheet ops are queued and sent on `flush` (or before a read): each run of
//! consecutive value writes becomes one `values:batchUpdate` (`USER_ENTERED`),
//! each run of everything else one `batchUpdate`. Runs go out in issue order.
//! Rate-limited calls (429/503) back off and retry a bounded number of times.

use std::thread::sleep;
use std::time::Duration;

use bod_core::{CellLocation, CellRange, CellValue};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{StatusCode, Url};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::api::{reordered, SheetOp, Spreadsheet, Worksheet};
use crate::auth::TokenSource;
use crate::SheetsError;

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";
const DRIVE_FILES: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

const RATE_LIMIT_MAX_RETRIES: usize = 3;

fn rate_limit_delay(attempt: usize) -> Duration {
    let exponent = attempt.saturating_sub(1) as u32;
    let multiplier = 2_u64.saturating_pow(exponent).min(16);
    Duration::from_millis(500 * multiplier)
}

fn is_rate_limited(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
        return true;
    }
    let msg = body.to_lowercase();
    status == StatusCode::FORBIDDEN && (msg.contains("rate") || msg.contains("quota"))
}

#[derive(Clone, Debug, PartialEq)]
struct SheetMeta {
    id: i64,
    title: String,
    rows: u32,
    cols: u32,
}

/// One spreadsheet, resolved by name.
pub struct HttpSpreadsheet {
    client: Client,
    token: Box<dyn TokenSource>,
    id: String,
    sheets: Vec<SheetMeta>,
}

impl HttpSpreadsheet {
    /// Resolve `name` through Drive (shared drives included) and load tab metadata.
    pub fn open(name: &str, token: Box<dyn TokenSource>) -> Result<Self, SheetsError> {
        let client = Client::builder().build()?;
        let mut me = Self { client, token, id: String::new(), sheets: Vec::new() };

        let q = format!(
            "name = '{}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false",
            name.replace('\\', "\\\\").replace('\'', "\\'")
        );
        let files = me.send("resolve spreadsheet", |c| {
            c.get(DRIVE_FILES).query(&[
                ("q", q.as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
        })?;
        me.id = files["files"]
            .as_array()
            .and_then(|a| a.first())
            .and_then(|f| f["id"].as_str())
            .ok_or_else(|| SheetsError::NotFound(format!("spreadsheet '{name}'")))?
            .to_string();
        debug!(name, id = %me.id, "spreadsheet resolved");
        me.refresh()?;
        Ok(me)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn url(&self, suffix: &str) -> Result<Url, SheetsError> {
        Url::parse(&format!("{SHEETS_BASE}{}{suffix}", self.id)).map_err(|e| SheetsError::Http(e.to_string()))
    }

    fn refresh(&mut self) -> Result<(), SheetsError> {
        let url = self.url("")?;
        let meta = self.send("fetch spreadsheet metadata", |c| {
            c.get(url.clone())
                .query(&[("fields", "sheets.properties(sheetId,title,index,gridProperties(rowCount,columnCount))")])
        })?;
        self.sheets = parse_sheets(&meta);
        Ok(())
    }

    fn meta(&self, name: &str) -> Result<&SheetMeta, SheetsError> {
        self.sheets
            .iter()
            .find(|s| s.title == name)
            .ok_or_else(|| SheetsError::NotFound(format!("worksheet '{name}'")))
    }

    /// Authorized call with rate-limit retries; returns the JSON body (`null` when empty).
    fn send(
        &mut self,
        what: &str,
        build: impl Fn(&Client) -> RequestBuilder,
    ) -> Result<Value, SheetsError> {
        let mut attempt = 0usize;
        loop {
            let token = self.token.access_token()?;
            let resp = build(&self.client).bearer_auth(token).send()?;
            let status = resp.status();
            let body = resp.text()?;
            if status.is_success() {
                if body.trim().is_empty() {
                    return Ok(Value::Null);
                }
                return serde_json::from_str(&body).map_err(|e| SheetsError::Http(e.to_string()));
            }
            if attempt < RATE_LIMIT_MAX_RETRIES && is_rate_limited(status, &body) {
                attempt += 1;
                let delay = rate_limit_delay(attempt);
                warn!(what, attempt, max = RATE_LIMIT_MAX_RETRIES, ?delay, "rate limited, retrying");
                sleep(delay);
                continue;
            }
            return Err(SheetsError::Api { status: status.as_u16(), message: api_message(&body) });
        }
    }

    fn batch_update(&mut self, requests: Vec<Value>) -> Result<Value, SheetsError> {
        if requests.is_empty() {
            return Ok(Value::Null);
        }
        let url = self.url(":batchUpdate")?;
        let body = json!({ "requests": requests });
        self.send("batch update", |c| c.post(url.clone()).json(&body))
    }

    fn values_update(&mut self, data: Vec<Value>) -> Result<(), SheetsError> {
        if data.is_empty() {
            return Ok(());
        }
        let url = self.url("/values:batchUpdate")?;
        let body = json!({ "valueInputOption": "USER_ENTERED", "data": data });
        self.send("write values", |c| c.post(url.clone()).json(&body))?;
        Ok(())
    }

    fn flush_ops(&mut self, title: &str, ops: Vec<SheetOp>) -> Result<(), SheetsError> {
        let sheet_id = self.meta(title)?.id;
        let mut writes: Vec<Value> = Vec::new();
        let mut requests: Vec<Value> = Vec::new();
        for op in ops {
            match &op {
                SheetOp::WriteValues { anchor, values } => {
                    if !requests.is_empty() {
                        self.batch_update(std::mem::take(&mut requests))?;
                    }
                    writes.push(values_range(title, *anchor, values));
                }
                other => {
                    if !writes.is_empty() {
                        self.values_update(std::mem::take(&mut writes))?;
                    }
                    if let SheetOp::Resize { rows, cols } = other {
                        if let Some(m) = self.sheets.iter_mut().find(|s| s.title == title) {
                            m.rows = *rows;
                            m.cols = *cols;
                        }
                    }
                    if let Some(req) = op_request(sheet_id, other) {
                        requests.push(req);
                    }
                }
            }
        }
        self.values_update(writes)?;
        self.batch_update(requests)?;
        Ok(())
    }

    fn read_values(&mut self, title: &str) -> Result<Vec<Vec<CellValue>>, SheetsError> {
        let mut url = self.url("/values/")?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Http("unexpected base url".into()))?
            .pop()
            .push(&quoted(title));
        let body = self.send("read worksheet values", |c| {
            c.get(url.clone()).query(&[("valueRenderOption", "UNFORMATTED_VALUE")])
        })?;
        Ok(parse_values(&body))
    }
}

impl Spreadsheet for HttpSpreadsheet {
    fn worksheet_names(&mut self) -> Result<Vec<String>, SheetsError> {
        Ok(self.sheets.iter().map(|s| s.title.clone()).collect())
    }

    fn create_worksheet(&mut self, name: &str, rows: u32, cols: u32) -> Result<(), SheetsError> {
        self.batch_update(vec![add_sheet_request(name, rows, cols)])?;
        self.refresh()
    }

    fn delete_worksheet(&mut self, name: &str) -> Result<(), SheetsError> {
        let id = self.meta(name)?.id;
        self.batch_update(vec![json!({ "deleteSheet": { "sheetId": id } })])?;
        self.refresh()
    }

    fn reorder_worksheets(&mut self, order: &[&str]) -> Result<(), SheetsError> {
        let names: Vec<String> = self.sheets.iter().map(|s| s.title.clone()).collect();
        let target = reordered(&names, order);
        let mut requests = Vec::with_capacity(target.len());
        for (index, name) in target.iter().enumerate() {
            requests.push(reorder_request(self.meta(name)?.id, index));
        }
        self.batch_update(requests)?;
        self.refresh()
    }

    fn worksheet(&mut self, name: &str) -> Result<Box<dyn Worksheet + '_>, SheetsError> {
        let title = self.meta(name)?.title.clone();
        Ok(Box::new(HttpWorksheet { book: self, title, queue: Vec::new() }))
    }
}

struct HttpWorksheet<'a> {
    book: &'a mut HttpSpreadsheet,
    title: String,
    queue: Vec<SheetOp>,
}

impl Worksheet for HttpWorksheet<'_> {
    fn title(&self) -> &str {
        &self.title
    }

    fn apply(&mut self, op: SheetOp) -> Result<(), SheetsError> {
        if let (Some(range), Ok(meta)) = (op.range(), self.book.meta(&self.title)) {
            let (rows, cols) = queued_grid(meta.rows, meta.cols, &self.queue);
            if range.end.row > rows || range.end.col > cols {
                return Err(SheetsError::OutOfBounds {
                    sheet: self.title.clone(),
                    range: range.to_string(),
                    rows,
                    cols,
                });
            }
        }
        self.queue.push(op);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SheetsError> {
        let ops = std::mem::take(&mut self.queue);
        if ops.is_empty() {
            return Ok(());
        }
        debug!(sheet = %self.title, ops = ops.len(), "flushing worksheet ops");
        self.book.flush_ops(&self.title, ops)
    }

    fn read_all(&mut self) -> Result<Vec<Vec<CellValue>>, SheetsError> {
        self.flush()?;
        self.book.read_values(&self.title)
    }
}

impl Drop for HttpWorksheet<'_> {
    fn drop(&mut self) {
        if !self.queue.is_empty() {
            warn!(sheet = %self.title, ops = self.queue.len(), "worksheet dropped with unflushed ops");
        }
    }
}

/// Grid size after any queued resize.
fn queued_grid(rows: u32, cols: u32, queue: &[SheetOp]) -> (u32, u32) {
    queue.iter().fold((rows, cols), |acc, op| match op {
        SheetOp::Resize { rows, cols } => (*rows, *cols),
        _ => acc,
    })
}

/// `'Sheet Name'` with embedded quotes doubled.
fn quoted(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn cell_json(v: &CellValue) -> Value {
    match v {
        CellValue::Missing => json!(""),
        CellValue::Bool(b) => json!(b),
        CellValue::Int(i) => json!(i),
        CellValue::Float(f) => json!(f),
        CellValue::Text(s) => json!(s),
    }
}

fn values_range(title: &str, anchor: CellLocation, values: &[Vec<CellValue>]) -> Value {
    let rows: Vec<Vec<Value>> = values.iter().map(|r| r.iter().map(cell_json).collect()).collect();
    json!({ "range": format!("{}!{anchor}", quoted(title)), "values": rows })
}

fn grid_range(sheet_id: i64, range: &CellRange) -> Value {
    json!({
        "sheetId": sheet_id,
        "startRowIndex": range.start.row - 1,
        "endRowIndex": range.end.row,
        "startColumnIndex": range.start.col - 1,
        "endColumnIndex": range.end.col,
    })
}

fn add_sheet_request(name: &str, rows: u32, cols: u32) -> Value {
    json!({ "addSheet": { "properties": {
        "title": name,
        "gridProperties": { "rowCount": rows, "columnCount": cols },
    } } })
}

fn reorder_request(sheet_id: i64, index: usize) -> Value {
    json!({ "updateSheetProperties": {
        "properties": { "sheetId": sheet_id, "index": index },
        "fields": "index",
    } })
}

/// `batchUpdate` request for every op except value writes.
fn op_request(sheet_id: i64, op: &SheetOp) -> Option<Value> {
    let req = match op {
        SheetOp::WriteValues { .. } => return None,
        SheetOp::Merge { range } => json!({ "mergeCells": {
            "range": grid_range(sheet_id, range),
            "mergeType": "MERGE_ALL",
        } }),
        SheetOp::Format { range, format } => {
            let (fmt, fields) = format.to_api();
            json!({ "repeatCell": {
                "range": grid_range(sheet_id, range),
                "cell": { "userEnteredFormat": fmt },
                "fields": fields,
            } })
        }
        SheetOp::Conditional { range, rule } => json!({ "addConditionalFormatRule": {
            "rule": { "ranges": [grid_range(sheet_id, range)], "booleanRule": rule.to_api() },
            "index": 0,
        } }),
        SheetOp::ColumnWidth { column, pixels } => json!({ "updateDimensionProperties": {
            "range": {
                "sheetId": sheet_id,
                "dimension": "COLUMNS",
                "startIndex": column - 1,
                "endIndex": column,
            },
            "properties": { "pixelSize": pixels },
            "fields": "pixelSize",
        } }),
        SheetOp::Note { cell, text } => json!({ "updateCells": {
            "range": grid_range(sheet_id, &CellRange::single(*cell)),
            "rows": [{ "values": [{ "note": text }] }],
            "fields": "note",
        } }),
        SheetOp::Resize { rows, cols } => json!({ "updateSheetProperties": {
            "properties": {
                "sheetId": sheet_id,
                "gridProperties": { "rowCount": rows, "columnCount": cols },
            },
            "fields": "gridProperties(rowCount,columnCount)",
        } }),
    };
    Some(req)
}

fn parse_sheets(meta: &Value) -> Vec<SheetMeta> {
    let mut out: Vec<(i64, SheetMeta)> = meta["sheets"]
        .as_array()
        .map(|a| a.as_slice())
        .unwrap_or_default()
        .iter()
        .filter_map(|s| {
            let p = &s["properties"];
            let grid = &p["gridProperties"];
            Some((
                p["index"].as_i64().unwrap_or(0),
                SheetMeta {
                    id: p["sheetId"].as_i64()?,
                    title: p["title"].as_str()?.to_string(),
                    rows: grid["rowCount"].as_u64().unwrap_or(0) as u32,
                    cols: grid["columnCount"].as_u64().unwrap_or(0) as u32,
                },
            ))
        })
        .collect();
    out.sort_by_key(|(i, _)| *i);
    out.into_iter().map(|(_, m)| m).collect()
}

fn parse_values(body: &Value) -> Vec<Vec<CellValue>> {
    let Some(rows) = body["values"].as_array() else {
        return Vec::new();
    };
    rows.iter()
        .map(|r| {
            r.as_array()
                .map(|cells| cells.iter().map(value_cell).collect())
                .unwrap_or_default()
        })
        .collect()
}

fn value_cell(v: &Value) -> CellValue {
    match v {
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => n.as_f64().map(CellValue::float).unwrap_or_default(),
        },
        Value::String(s) if s.is_empty() => CellValue::Missing,
        Value::String(s) => CellValue::text(s.as_str()),
        _ => CellValue::Missing,
    }
}

fn api_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
