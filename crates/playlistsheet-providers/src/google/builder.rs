//! Spreadsheet construction.
//!
//! Building a spreadsheet takes three remote calls: create, write values,
//! format the header. There is no transaction spanning them. If a call after
//! the first fails, the spreadsheet already exists and is reported back in a
//! partial failure instead of being deleted.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use playlistsheet_core::{ConversionResult, Video};
use tracing::{info, instrument, warn};

use crate::api::SheetsApi;
use crate::error::{ProviderError, ProviderResult};

use super::sheets::{
    AutoResizeDimensionsRequest, BatchUpdateRequest, CellData, CellFormat, Color, DimensionRange,
    GridProperties, GridRange, NewSpreadsheet, RepeatCellRequest, Sheet, SheetProperties,
    SheetRequest, SpreadsheetProperties, TextFormat, ValueRange,
};

/// Name of the single worksheet.
pub const WORKSHEET_TITLE: &str = "Videos";

/// Header row written above the videos.
pub const HEADER_ROW: [&str; 2] = ["Video Title", "Video URL"];

const HEADER_BACKGROUND: Color = Color::gray(0.2);
const HEADER_FONT_SIZE: u32 = 11;
const HEADER_FIELDS: &str = "userEnteredFormat(backgroundColor,textFormat)";

/// The remote steps of a build, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStep {
    CreateSpreadsheet,
    WriteValues,
    FormatHeader,
}

impl BuildStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateSpreadsheet => "create_spreadsheet",
            Self::WriteValues => "write_values",
            Self::FormatHeader => "format_header",
        }
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates and fills a spreadsheet from a video list.
#[derive(Clone)]
pub struct SheetBuilder {
    api: Arc<dyn SheetsApi>,
}

impl SheetBuilder {
    pub fn new(api: Arc<dyn SheetsApi>) -> Self {
        Self { api }
    }

    /// Builds a spreadsheet titled after the playlist.
    ///
    /// A blank `playlist_title` falls back to today's date.
    pub async fn build(
        &self,
        access_token: &str,
        videos: &[Video],
        playlist_title: &str,
    ) -> ProviderResult<ConversionResult> {
        let today = chrono::Local::now().date_naive();
        self.build_on(access_token, videos, playlist_title, today)
            .await
    }

    /// Same as [`build`](Self::build) with an explicit date for the title
    /// fallback.
    #[instrument(skip_all, fields(videos = videos.len()))]
    pub async fn build_on(
        &self,
        access_token: &str,
        videos: &[Video],
        playlist_title: &str,
        today: NaiveDate,
    ) -> ProviderResult<ConversionResult> {
        if videos.is_empty() {
            return Err(ProviderError::validation(
                "Videos must be a non-empty array",
            ));
        }

        let request = new_spreadsheet(&spreadsheet_title(playlist_title, today), videos.len());
        let created = self.api.create_spreadsheet(access_token, &request).await?;

        let spreadsheet_id = created
            .spreadsheet_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::upstream("spreadsheets.create returned no spreadsheet ID"))?;
        let Some(sheet_id) = created.first_sheet_id() else {
            warn!(%spreadsheet_id, "create response had no sheet ID, spreadsheet left in place");
            return Err(ProviderError::partial_failure(
                spreadsheet_id,
                BuildStep::CreateSpreadsheet,
                ProviderError::upstream("spreadsheets.create returned no sheet ID"),
            ));
        };

        let values = value_range(videos);
        if let Err(e) = self
            .api
            .update_values(access_token, &spreadsheet_id, &values)
            .await
        {
            warn!(%spreadsheet_id, error = %e, "writing values failed, spreadsheet left in place");
            return Err(ProviderError::partial_failure(
                spreadsheet_id,
                BuildStep::WriteValues,
                e,
            ));
        }

        let formatting = header_format_requests(sheet_id);
        if let Err(e) = self
            .api
            .batch_update(access_token, &spreadsheet_id, &formatting)
            .await
        {
            warn!(%spreadsheet_id, error = %e, "formatting failed, data kept");
            return Err(ProviderError::partial_failure(
                spreadsheet_id,
                BuildStep::FormatHeader,
                e,
            ));
        }

        info!(%spreadsheet_id, "spreadsheet built");
        Ok(ConversionResult::new(spreadsheet_id, videos.len()))
    }
}

impl fmt::Debug for SheetBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetBuilder").finish_non_exhaustive()
    }
}

/// `YouTube Playlist: {title}`, or today's date when the title is blank.
pub fn spreadsheet_title(playlist_title: &str, today: NaiveDate) -> String {
    let title = playlist_title.trim();
    if title.is_empty() {
        format!("YouTube Playlist: {}", today.format("%Y-%m-%d"))
    } else {
        format!("YouTube Playlist: {}", title)
    }
}

fn new_spreadsheet(title: &str, video_count: usize) -> NewSpreadsheet {
    NewSpreadsheet {
        properties: SpreadsheetProperties {
            title: title.to_string(),
        },
        sheets: vec![Sheet {
            properties: Some(SheetProperties {
                sheet_id: None,
                title: WORKSHEET_TITLE.to_string(),
                grid_properties: Some(GridProperties {
                    row_count: video_count + 1,
                    column_count: HEADER_ROW.len(),
                }),
            }),
        }],
    }
}

/// Header row followed by one `(title, url)` row per video.
pub fn value_range(videos: &[Video]) -> ValueRange {
    let mut rows = Vec::with_capacity(videos.len() + 1);
    rows.push(HEADER_ROW.iter().map(|h| h.to_string()).collect());
    rows.extend(videos.iter().map(|v| v.as_row().to_vec()));

    ValueRange::rows(
        format!("{}!A1:B{}", WORKSHEET_TITLE, videos.len() + 1),
        rows,
    )
}

/// Dark bold header row and auto-sized columns.
pub fn header_format_requests(sheet_id: i64) -> BatchUpdateRequest {
    BatchUpdateRequest {
        requests: vec![
            SheetRequest::RepeatCell(RepeatCellRequest {
                range: GridRange {
                    sheet_id,
                    start_row_index: 0,
                    end_row_index: 1,
                },
                cell: CellData {
                    user_entered_format: CellFormat {
                        background_color: HEADER_BACKGROUND,
                        text_format: TextFormat {
                            foreground_color: Color::WHITE,
                            font_size: HEADER_FONT_SIZE,
                            bold: true,
                        },
                    },
                },
                fields: HEADER_FIELDS.to_string(),
            }),
            SheetRequest::AutoResizeDimensions(AutoResizeDimensionsRequest {
                dimensions: DimensionRange {
                    sheet_id,
                    dimension: "COLUMNS".to_string(),
                    start_index: 0,
                    end_index: HEADER_ROW.len() as u32,
                },
            }),
        ],
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use playlistsheet_core::ErrorKind;

    use super::*;
    use crate::api::BoxFuture;
    use crate::google::sheets::Spreadsheet;

    /// Records every call; each step can be told to fail.
    #[derive(Default)]
    struct RecordingSheets {
        calls: Mutex<Vec<&'static str>>,
        created: Mutex<Option<NewSpreadsheet>>,
        written: Mutex<Option<ValueRange>>,
        formatted: Mutex<Option<BatchUpdateRequest>>,
        fail_at: Option<BuildStep>,
        omit_sheet_id: bool,
    }

    impl RecordingSheets {
        fn failing_at(step: BuildStep) -> Self {
            Self {
                fail_at: Some(step),
                ..Default::default()
            }
        }

        fn outcome(&self, step: BuildStep) -> ProviderResult<()> {
            if self.fail_at == Some(step) {
                Err(ProviderError::rate_limited("quota exhausted"))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SheetsApi for RecordingSheets {
        fn create_spreadsheet<'a>(
            &'a self,
            _access_token: &'a str,
            spreadsheet: &'a NewSpreadsheet,
        ) -> BoxFuture<'a, ProviderResult<Spreadsheet>> {
            self.calls.lock().unwrap().push("create");
            *self.created.lock().unwrap() = Some(spreadsheet.clone());
            let result = self.outcome(BuildStep::CreateSpreadsheet).map(|()| Spreadsheet {
                spreadsheet_id: Some("1AbC".into()),
                sheets: vec![Sheet {
                    properties: Some(SheetProperties {
                        sheet_id: if self.omit_sheet_id { None } else { Some(0) },
                        title: WORKSHEET_TITLE.into(),
                        grid_properties: None,
                    }),
                }],
            });
            Box::pin(async move { result })
        }

        fn update_values<'a>(
            &'a self,
            _access_token: &'a str,
            _spreadsheet_id: &'a str,
            values: &'a ValueRange,
        ) -> BoxFuture<'a, ProviderResult<()>> {
            self.calls.lock().unwrap().push("update");
            *self.written.lock().unwrap() = Some(values.clone());
            let result = self.outcome(BuildStep::WriteValues);
            Box::pin(async move { result })
        }

        fn batch_update<'a>(
            &'a self,
            _access_token: &'a str,
            _spreadsheet_id: &'a str,
            request: &'a BatchUpdateRequest,
        ) -> BoxFuture<'a, ProviderResult<()>> {
            self.calls.lock().unwrap().push("batch");
            *self.formatted.lock().unwrap() = Some(request.clone());
            let result = self.outcome(BuildStep::FormatHeader);
            Box::pin(async move { result })
        }
    }

    fn videos() -> Vec<Video> {
        vec![
            Video::new("a", "First"),
            Video::new("b", "Second"),
            Video::new("c", "Third"),
        ]
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn title_falls_back_to_date() {
        assert_eq!(spreadsheet_title("Mix", date()), "YouTube Playlist: Mix");
        assert_eq!(spreadsheet_title("  ", date()), "YouTube Playlist: 2024-03-15");
    }

    #[test]
    fn values_have_header_plus_one_row_per_video() {
        let range = value_range(&videos());
        assert_eq!(range.range, "Videos!A1:B4");
        assert_eq!(range.values.len(), 4);
        assert_eq!(range.values[0], vec!["Video Title", "Video URL"]);
        assert_eq!(
            range.values[3],
            vec!["Third", "https://www.youtube.com/watch?v=c"]
        );
    }

    #[test]
    fn header_format_request_shape() {
        let json = serde_json::to_value(header_format_requests(42)).unwrap();
        let repeat = &json["requests"][0]["repeatCell"];
        assert_eq!(repeat["range"]["sheetId"], 42);
        assert_eq!(repeat["range"]["endRowIndex"], 1);
        assert_eq!(repeat["fields"], "userEnteredFormat(backgroundColor,textFormat)");
        let format = &repeat["cell"]["userEnteredFormat"];
        assert_eq!(format["backgroundColor"]["red"], 0.2);
        assert_eq!(format["textFormat"]["foregroundColor"]["blue"], 1.0);
        assert_eq!(format["textFormat"]["fontSize"], 11);
        assert_eq!(format["textFormat"]["bold"], true);

        let resize = &json["requests"][1]["autoResizeDimensions"]["dimensions"];
        assert_eq!(resize["dimension"], "COLUMNS");
        assert_eq!(resize["startIndex"], 0);
        assert_eq!(resize["endIndex"], 2);
    }

    #[tokio::test]
    async fn builds_in_three_steps() {
        let api = Arc::new(RecordingSheets::default());
        let builder = SheetBuilder::new(api.clone());

        let result = builder
            .build_on("token", &videos(), "Mix", date())
            .await
            .unwrap();

        assert_eq!(result.spreadsheet_id, "1AbC");
        assert_eq!(
            result.spreadsheet_url,
            "https://docs.google.com/spreadsheets/d/1AbC/edit"
        );
        assert_eq!(result.video_count, 3);
        assert_eq!(api.calls(), vec!["create", "update", "batch"]);

        let created = api.created.lock().unwrap().clone().unwrap();
        assert_eq!(created.properties.title, "YouTube Playlist: Mix");
        let sheet = created.sheets[0].properties.clone().unwrap();
        assert_eq!(sheet.title, "Videos");
        assert_eq!(
            sheet.grid_properties,
            Some(GridProperties {
                row_count: 4,
                column_count: 2
            })
        );
    }

    #[tokio::test]
    async fn empty_list_is_rejected_before_any_call() {
        let api = Arc::new(RecordingSheets::default());
        let builder = SheetBuilder::new(api.clone());

        let err = builder.build("token", &[], "Mix").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn create_failure_stops_everything() {
        let api = Arc::new(RecordingSheets::failing_at(BuildStep::CreateSpreadsheet));
        let builder = SheetBuilder::new(api.clone());

        let err = builder.build("token", &videos(), "Mix").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.spreadsheet_id().is_none());
        assert_eq!(api.calls(), vec!["create"]);
    }

    #[tokio::test]
    async fn missing_sheet_id_reports_the_created_spreadsheet() {
        let api = Arc::new(RecordingSheets {
            omit_sheet_id: true,
            ..Default::default()
        });
        let builder = SheetBuilder::new(api.clone());

        let err = builder.build("token", &videos(), "Mix").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartialFailure);
        assert_eq!(err.spreadsheet_id(), Some("1AbC"));
        assert_eq!(err.step(), Some(BuildStep::CreateSpreadsheet));
        assert!(err.message().contains("no sheet ID"));
        assert_eq!(api.calls(), vec!["create"]);
    }

    #[tokio::test]
    async fn write_failure_is_partial() {
        let api = Arc::new(RecordingSheets::failing_at(BuildStep::WriteValues));
        let builder = SheetBuilder::new(api.clone());

        let err = builder.build("token", &videos(), "Mix").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartialFailure);
        assert_eq!(err.spreadsheet_id(), Some("1AbC"));
        assert_eq!(err.step(), Some(BuildStep::WriteValues));
        assert_eq!(api.calls(), vec!["create", "update"]);
    }

    #[tokio::test]
    async fn format_failure_keeps_data() {
        let api = Arc::new(RecordingSheets::failing_at(BuildStep::FormatHeader));
        let builder = SheetBuilder::new(api.clone());

        let err = builder.build("token", &videos(), "Mix").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartialFailure);
        assert_eq!(err.step(), Some(BuildStep::FormatHeader));
        assert_eq!(api.calls(), vec!["create", "update", "batch"]);
        assert_eq!(api.written.lock().unwrap().as_ref().unwrap().values.len(), 4);
    }
}
