//! Google Sheets API v4 client and request types.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{BoxFuture, SheetsApi};
use crate::error::ProviderResult;

use super::http;

/// Base URL for Google Sheets API v4.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// Google Sheets API client.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl SheetsClient {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    /// Points the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn create(
        &self,
        access_token: &str,
        spreadsheet: &NewSpreadsheet,
    ) -> ProviderResult<Spreadsheet> {
        let url = format!("{}/spreadsheets", self.base_url);
        let request = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .json(spreadsheet);

        let response = http::send(request, "spreadsheets.create").await?;
        let created: Spreadsheet = http::read_json(response, "spreadsheets.create").await?;
        debug!(spreadsheet_id = ?created.spreadsheet_id, "created spreadsheet");
        Ok(created)
    }

    async fn update(
        &self,
        access_token: &str,
        spreadsheet_id: &str,
        values: &ValueRange,
    ) -> ProviderResult<()> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(&values.range)
        );
        let request = self
            .http_client
            .put(&url)
            .bearer_auth(access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(values);

        http::send(request, "spreadsheets.values.update").await?;
        debug!(spreadsheet_id, range = %values.range, rows = values.values.len(), "wrote values");
        Ok(())
    }

    async fn batch(
        &self,
        access_token: &str,
        spreadsheet_id: &str,
        request_body: &BatchUpdateRequest,
    ) -> ProviderResult<()> {
        let url = format!(
            "{}/spreadsheets/{}:batchUpdate",
            self.base_url,
            urlencoding::encode(spreadsheet_id)
        );
        let request = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .json(request_body);

        http::send(request, "spreadsheets.batchUpdate").await?;
        debug!(spreadsheet_id, requests = request_body.requests.len(), "applied batch update");
        Ok(())
    }
}

impl SheetsApi for SheetsClient {
    fn create_spreadsheet<'a>(
        &'a self,
        access_token: &'a str,
        spreadsheet: &'a NewSpreadsheet,
    ) -> BoxFuture<'a, ProviderResult<Spreadsheet>> {
        Box::pin(self.create(access_token, spreadsheet))
    }

    fn update_values<'a>(
        &'a self,
        access_token: &'a str,
        spreadsheet_id: &'a str,
        values: &'a ValueRange,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(self.update(access_token, spreadsheet_id, values))
    }

    fn batch_update<'a>(
        &'a self,
        access_token: &'a str,
        spreadsheet_id: &'a str,
        request: &'a BatchUpdateRequest,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(self.batch(access_token, spreadsheet_id, request))
    }
}

/// Body of `spreadsheets.create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSpreadsheet {
    pub properties: SpreadsheetProperties,
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetProperties {
    pub title: String,
}

/// A worksheet, both as requested and as returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    #[serde(default)]
    pub properties: Option<SheetProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_properties: Option<GridProperties>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    pub row_count: usize,
    pub column_count: usize,
}

/// Response of `spreadsheets.create`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Spreadsheet {
    /// The `sheetId` of the first worksheet.
    pub fn first_sheet_id(&self) -> Option<i64> {
        self.sheets
            .first()
            .and_then(|s| s.properties.as_ref())
            .and_then(|p| p.sheet_id)
    }
}

/// Body of `spreadsheets.values.update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    /// A1 notation, e.g. `Videos!A1:B4`.
    pub range: String,
    pub major_dimension: String,
    pub values: Vec<Vec<String>>,
}

impl ValueRange {
    /// Row-major values for a range.
    pub fn rows(range: impl Into<String>, values: Vec<Vec<String>>) -> Self {
        Self {
            range: range.into(),
            major_dimension: "ROWS".to_string(),
            values,
        }
    }
}

/// Body of `spreadsheets.batchUpdate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchUpdateRequest {
    pub requests: Vec<SheetRequest>,
}

/// One entry of a batch update; serializes as `{"repeatCell": {...}}` etc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetRequest {
    RepeatCell(RepeatCellRequest),
    AutoResizeDimensions(AutoResizeDimensionsRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatCellRequest {
    pub range: GridRange,
    pub cell: CellData,
    /// Field mask of the format properties to overwrite.
    pub fields: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRange {
    pub sheet_id: i64,
    pub start_row_index: u32,
    pub end_row_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub user_entered_format: CellFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFormat {
    pub background_color: Color,
    pub text_format: TextFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Color {
    pub const fn gray(level: f64) -> Self {
        Self {
            red: level,
            green: level,
            blue: level,
        }
    }

    pub const WHITE: Color = Color::gray(1.0);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFormat {
    pub foreground_color: Color,
    pub font_size: u32,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoResizeDimensionsRequest {
    pub dimensions: DimensionRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRange {
    pub sheet_id: i64,
    /// `ROWS` or `COLUMNS`.
    pub dimension: String,
    pub start_index: u32,
    pub end_index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_create_response() {
        let json = r#"{
            "spreadsheetId": "1AbC",
            "properties": {"title": "YouTube Playlist: Mix"},
            "sheets": [
                {"properties": {"sheetId": 123456, "title": "Videos", "index": 0,
                    "gridProperties": {"rowCount": 4, "columnCount": 2}}}
            ],
            "spreadsheetUrl": "https://docs.google.com/spreadsheets/d/1AbC/edit"
        }"#;

        let spreadsheet: Spreadsheet = serde_json::from_str(json).unwrap();
        assert_eq!(spreadsheet.spreadsheet_id.as_deref(), Some("1AbC"));
        assert_eq!(spreadsheet.first_sheet_id(), Some(123456));
    }

    #[test]
    fn sheet_id_zero_is_present() {
        let json = r#"{"spreadsheetId": "1AbC", "sheets": [{"properties": {"sheetId": 0}}]}"#;
        let spreadsheet: Spreadsheet = serde_json::from_str(json).unwrap();
        assert_eq!(spreadsheet.first_sheet_id(), Some(0));
    }

    #[test]
    fn missing_sheet_id() {
        let json = r#"{"spreadsheetId": "1AbC", "sheets": []}"#;
        let spreadsheet: Spreadsheet = serde_json::from_str(json).unwrap();
        assert_eq!(spreadsheet.first_sheet_id(), None);
    }

    #[test]
    fn sheet_request_is_externally_tagged() {
        let request = SheetRequest::AutoResizeDimensions(AutoResizeDimensionsRequest {
            dimensions: DimensionRange {
                sheet_id: 7,
                dimension: "COLUMNS".into(),
                start_index: 0,
                end_index: 2,
            },
        });
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["autoResizeDimensions"]["dimensions"]["sheetId"], 7);
        assert_eq!(json["autoResizeDimensions"]["dimensions"]["endIndex"], 2);
    }
}
