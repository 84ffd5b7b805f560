use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, trace};

use crate::breakpoint::Breakpoint;
use crate::domain::{Message, RtabConfig, RtabError};
use crate::resolver::StructureResolver;
use crate::structure::{HeaderDescriptor, TableStructure};
use crate::ui::{BORDER_WIDTH, COLUMN_WIDTH_MARGIN, STATUSLINE_HEIGHT, TABLE_HEADER_HEIGHT};

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug, PartialEq)]
pub enum Status {
    Empty,
    Ready,
    Quitting,
}

/// How the current table structure was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StructureSource {
    Configured,
    Derived,
    Placeholder,
}

impl StructureSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureSource::Configured => "configured",
            StructureSource::Derived => "derived from data",
            StructureSource::Placeholder => "placeholder",
        }
    }
}

/// A fully loaded, stringified data column.
pub struct Column {
    name: String,
    max_width: usize,
    data: Vec<String>,
}

/// A windowed column as handed to the UI for rendering.
#[derive(Clone)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
}

#[derive(Default, Clone, Debug)]
pub struct UiLayout {
    pub width: usize,
    pub height: usize,
    pub table_width: usize,
    pub table_height: usize,
}

impl UiLayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let table_width = ui_width.saturating_sub(BORDER_WIDTH);
        let table_height = ui_height
            .saturating_sub(BORDER_WIDTH + TABLE_HEADER_HEIGHT + STATUSLINE_HEIGHT);
        let layout = UiLayout {
            width: ui_width,
            height: ui_height,
            table_width,
            table_height,
        };
        trace!("Build UiLayout: {:?}", layout);
        layout
    }
}

pub struct UiData {
    pub name: String,
    pub table_type: String,
    pub breakpoint: Breakpoint,
    pub overridden: bool,
    pub source: StructureSource,
    pub hide_header: bool,
    pub columns: Vec<ColumnView>,
    pub nrows: usize,
    pub first_row: usize,
    pub status_message: String,
    pub layout: UiLayout,
    pub last_update: Instant,
}

impl UiData {
    pub fn empty() -> Self {
        UiData {
            name: String::new(),
            table_type: String::new(),
            breakpoint: Breakpoint::Xs,
            overridden: false,
            source: StructureSource::Placeholder,
            hide_header: true,
            columns: Vec::new(),
            nrows: 0,
            first_row: 0,
            status_message: String::new(),
            layout: UiLayout::default(),
            last_update: Instant::now(),
        }
    }
}

pub struct Model {
    config: RtabConfig,
    pub status: Status,
    resolver: StructureResolver,
    table_type: String,
    file_name: String,
    columns: Vec<Column>,
    structure: TableStructure,
    source: StructureSource,
    breakpoint: Breakpoint,
    breakpoint_override: Option<Breakpoint>,
    offset_row: usize,
    offset_column: usize,
    uilayout: UiLayout,
    uidata: UiData,
    status_message: String,
}

impl Model {
    pub fn init(
        config: &RtabConfig,
        resolver: StructureResolver,
        table_type: String,
        ui_width: usize,
        ui_height: usize,
    ) -> Result<Self, RtabError> {
        let uilayout = UiLayout::from_values(ui_width, ui_height);
        let breakpoint = config.thresholds.bucket(uilayout.width);
        let mut model = Self {
            config: config.clone(),
            status: Status::Empty,
            resolver,
            table_type,
            file_name: String::new(),
            columns: Vec::new(),
            structure: TableStructure {
                table_type: String::new(),
                headers: Vec::new(),
                hide_header: false,
            },
            source: StructureSource::Placeholder,
            breakpoint,
            breakpoint_override: None,
            offset_row: 0,
            offset_column: 0,
            uilayout,
            uidata: UiData::empty(),
            status_message: "Started rtab!".to_string(),
        };
        model.resolve_structure();
        model.rebuild_view();
        Ok(model)
    }

    pub fn load_data_file(&mut self, path: PathBuf) -> Result<(), RtabError> {
        let file_info = Model::get_file_info(path)?;
        let frame = match file_info.file_type {
            FileType::CSV => Model::load_csv(&file_info.path)?,
            FileType::PARQUET => Model::load_parquet(&file_info.path)?,
            FileType::ARROW => Model::load_arrow(&file_info.path)?,
        };

        // Stringify each column in its own thread. All data is kept in
        // memory as strings for rendering.
        let start_time = Instant::now();
        let df = frame.collect()?;
        let c_: Result<Vec<Column>, _> = df
            .get_column_names()
            .par_iter()
            .map(|name| Self::load_column(&df, name))
            .collect();
        let columns = c_?;

        let data_loading_duration = start_time.elapsed().as_millis();
        info!("Loading data took {data_loading_duration}ms ...");
        for c in columns.iter() {
            debug!("Column: \"{}\", width_max: {}, # rows {}", c.name, c.max_width, c.data.len());
        }

        self.file_name = file_info
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        self.columns = columns;
        self.status = Status::Ready;
        self.offset_row = 0;
        self.offset_column = 0;

        self.resolve_structure();
        self.rebuild_view();
        self.set_status_message(format!("Loaded data in {}ms ...", data_loading_duration));
        Ok(())
    }

    pub fn update(&mut self, message: Message) -> Result<(), RtabError> {
        match message {
            Message::Quit => self.status = Status::Quitting,
            Message::Resize(width, height) => self.ui_resize(width, height),
            Message::MoveUp => self.scroll_rows(-1),
            Message::MoveDown => self.scroll_rows(1),
            Message::MovePageUp => self.scroll_rows(-(self.uilayout.table_height as isize)),
            Message::MovePageDown => self.scroll_rows(self.uilayout.table_height as isize),
            Message::MoveBeginning => {
                self.offset_row = 0;
                self.rebuild_view();
            }
            Message::MoveEnd => {
                self.offset_row = self.max_row_offset();
                self.rebuild_view();
            }
            Message::MoveLeft => self.scroll_columns(-1),
            Message::MoveRight => self.scroll_columns(1),
            Message::CycleBreakpoint => self.cycle_breakpoint(),
            Message::ResetBreakpoint => self.reset_breakpoint(),
        }
        Ok(())
    }

    pub fn get_uidata(&self) -> &UiData {
        &self.uidata
    }

    /// The breakpoint resolution runs against, honoring a manual override.
    fn current_breakpoint(&self) -> Breakpoint {
        self.breakpoint_override.unwrap_or(self.breakpoint)
    }

    fn resolve_structure(&mut self) {
        let breakpoint = self.current_breakpoint();
        let sample: Option<Vec<&str>> = if self.columns.is_empty() {
            None
        } else {
            Some(self.columns.iter().map(|c| c.name.as_str()).collect())
        };

        self.source = if self.resolver.has_config(&self.table_type) {
            StructureSource::Configured
        } else if sample.is_some() {
            StructureSource::Derived
        } else {
            StructureSource::Placeholder
        };

        self.structure = self
            .resolver
            .resolve(&self.table_type, sample.as_deref(), breakpoint);

        trace!(
            "Resolved structure for \"{}\" at {}: {} headers ({})",
            self.table_type,
            breakpoint,
            self.structure.headers.len(),
            self.source.as_str()
        );

        // Structure changes can shrink the header list below the current offset
        self.offset_column = std::cmp::min(
            self.offset_column,
            self.structure.headers.len().saturating_sub(1),
        );
    }

    /// Builds the windowed ColumnViews the UI renders, one per resolved
    /// header that fits into the current table width.
    fn rebuild_view(&mut self) {
        let rbegin = std::cmp::min(self.offset_row, self.max_row_offset());
        let rend = std::cmp::min(rbegin + self.uilayout.table_height, self.nrows());
        self.offset_row = rbegin;

        let mut views = Vec::new();
        let mut visible_width = 0;
        for header in self.structure.headers[self.offset_column..].iter() {
            let view = self.build_column_view(header, rbegin, rend);
            if visible_width + view.width + 1 > self.uilayout.table_width && !views.is_empty() {
                break;
            }
            visible_width += view.width + 1;
            views.push(view);
        }

        self.uidata = UiData {
            name: if self.file_name.is_empty() {
                self.table_type.clone()
            } else {
                self.file_name.clone()
            },
            table_type: self.table_type.clone(),
            breakpoint: self.current_breakpoint(),
            overridden: self.breakpoint_override.is_some(),
            source: self.source,
            hide_header: self.structure.hide_header,
            columns: views,
            nrows: self.nrows(),
            first_row: rbegin,
            status_message: self.status_message.clone(),
            layout: self.uilayout.clone(),
            last_update: Instant::now(),
        };
    }

    fn build_column_view(&self, header: &HeaderDescriptor, rbegin: usize, rend: usize) -> ColumnView {
        let label = header.display_label().to_string();
        match self.columns.iter().find(|c| c.name == header.key) {
            Some(column) => {
                let width = std::cmp::min(
                    std::cmp::max(label.len(), column.max_width) + COLUMN_WIDTH_MARGIN,
                    self.config.max_column_width,
                );
                ColumnView {
                    name: label,
                    width,
                    data: column.data[rbegin..rend].to_vec(),
                }
            }
            // Configured header without a matching data column, render empty cells
            None => ColumnView {
                name: label.clone(),
                width: std::cmp::max(label.len() + COLUMN_WIDTH_MARGIN, 8),
                data: vec![String::new(); rend - rbegin],
            },
        }
    }

    fn nrows(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    fn max_row_offset(&self) -> usize {
        self.nrows().saturating_sub(self.uilayout.table_height)
    }

    fn scroll_rows(&mut self, step: isize) {
        let target = self.offset_row as isize + step;
        self.offset_row = std::cmp::min(target.max(0) as usize, self.max_row_offset());
        self.rebuild_view();
    }

    fn scroll_columns(&mut self, step: isize) {
        let max = self.structure.headers.len().saturating_sub(1);
        let target = self.offset_column as isize + step;
        self.offset_column = std::cmp::min(target.max(0) as usize, max);
        self.rebuild_view();
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UiLayout::from_values(width, height);

        let bucket = self.config.thresholds.bucket(width);
        if bucket != self.breakpoint {
            info!("Breakpoint changed {} -> {}", self.breakpoint, bucket);
            self.breakpoint = bucket;
            if self.breakpoint_override.is_none() {
                self.resolve_structure();
            }
        }
        self.rebuild_view();
    }

    fn cycle_breakpoint(&mut self) {
        let next = self.current_breakpoint().cycle();
        self.breakpoint_override = Some(next);
        self.resolve_structure();
        self.rebuild_view();
        self.set_status_message(format!("Breakpoint override: {}", next));
    }

    fn reset_breakpoint(&mut self) {
        if self.breakpoint_override.take().is_some() {
            self.resolve_structure();
            self.rebuild_view();
            self.set_status_message(format!("Breakpoint: {}", self.breakpoint));
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_update = Instant::now();
    }

    fn detect_file_type(path: &Path) -> Result<FileType, RtabError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(RtabError::UnknownFileType),
        }
    }

    fn get_file_info(path: PathBuf) -> Result<FileInfo, RtabError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RtabError::FileNotFound,
            ErrorKind::PermissionDenied => RtabError::PermissionDenied,
            _ => RtabError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(RtabError::LoadingFailed("Not a file!".into()));
        }

        let file_type = Model::detect_file_type(&path)?;

        Ok(FileInfo { path, file_type })
    }

    fn load_column(df: &DataFrame, col_name: &str) -> Result<Column, PolarsError> {
        let col = df.column(col_name)?.cast(&DataType::String)?;
        let series = col.str()?;
        let mut data = Vec::with_capacity(series.len());

        let mut max_width = 0;
        for value in series.into_iter() {
            let ss = match value {
                Some(s) => s.to_string().replace("\r\n", " ↵ ").replace("\n", " ↵ "),
                None => String::from("∅"),
            };
            if ss.len() > max_width {
                max_width = ss.len();
            }
            data.push(ss);
        }

        Ok(Column {
            name: col_name.to_string(),
            max_width,
            data,
        })
    }

    fn load_csv(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyCsvReader::new(PlPath::Local(path.as_path().into()))
            .with_has_header(true)
            .finish()
    }

    fn load_parquet(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(
            PlPath::Local(path.as_path().into()),
            ScanArgsParquet::default(),
        )
    }

    fn load_arrow(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.as_path().into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_type: FileType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::NullWarnSink;
    use crate::structure::{StructureVariant, TableConfig};

    fn test_column(name: &str, values: &[&str]) -> Column {
        Column {
            name: name.to_string(),
            max_width: values.iter().map(|v| v.len()).max().unwrap_or(0),
            data: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn variant(breakpoint: Option<Breakpoint>, keys: &[&str]) -> StructureVariant {
        StructureVariant {
            breakpoint,
            headers: keys.iter().map(|k| HeaderDescriptor::new(*k)).collect(),
        }
    }

    fn model_with(config: TableConfig, table_type: &str, width: usize) -> Model {
        let resolver = StructureResolver::new(config, Box::new(NullWarnSink));
        Model::init(
            &RtabConfig::default(),
            resolver,
            table_type.to_string(),
            width,
            30,
        )
        .unwrap()
    }

    fn header_names(model: &Model) -> Vec<String> {
        model
            .get_uidata()
            .columns
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    #[test]
    fn resize_across_threshold_reresolves_structure() {
        let mut config = TableConfig::new();
        config.insert(
            "orders",
            vec![
                variant(Some(Breakpoint::Xs), &["total"]),
                variant(Some(Breakpoint::Lg), &["total", "status", "created"]),
            ],
        );

        // 50 columns buckets as Xs with default thresholds
        let mut model = model_with(config, "orders", 50);
        assert_eq!(model.get_uidata().breakpoint, Breakpoint::Xs);
        assert_eq!(header_names(&model), vec!["total"]);

        // 130 columns buckets as Lg
        model.update(Message::Resize(130, 30)).unwrap();
        assert_eq!(model.get_uidata().breakpoint, Breakpoint::Lg);
        assert_eq!(header_names(&model), vec!["total", "status", "created"]);
    }

    #[test]
    fn breakpoint_override_cycles_and_resets() {
        let mut config = TableConfig::new();
        config.insert(
            "orders",
            vec![
                variant(Some(Breakpoint::Xs), &["total"]),
                variant(Some(Breakpoint::Sm), &["total", "status"]),
            ],
        );

        let mut model = model_with(config, "orders", 50);
        assert_eq!(header_names(&model), vec!["total"]);
        assert!(!model.get_uidata().overridden);

        model.update(Message::CycleBreakpoint).unwrap();
        assert_eq!(model.get_uidata().breakpoint, Breakpoint::Sm);
        assert!(model.get_uidata().overridden);
        assert_eq!(header_names(&model), vec!["total", "status"]);

        model.update(Message::ResetBreakpoint).unwrap();
        assert_eq!(model.get_uidata().breakpoint, Breakpoint::Xs);
        assert!(!model.get_uidata().overridden);
        assert_eq!(header_names(&model), vec!["total"]);
    }

    #[test]
    fn derived_structure_follows_data_columns() {
        let mut model = model_with(TableConfig::new(), "orders", 100);
        model.columns = vec![
            test_column("id", &["1", "2"]),
            test_column("name", &["x", "y"]),
        ];
        model.status = Status::Ready;
        model.resolve_structure();
        model.rebuild_view();

        let uidata = model.get_uidata();
        assert_eq!(uidata.source, StructureSource::Derived);
        assert!(!uidata.hide_header);
        assert_eq!(header_names(&model), vec!["id", "name"]);
        assert_eq!(model.get_uidata().nrows, 2);
    }

    #[test]
    fn placeholder_without_config_and_data() {
        let model = model_with(TableConfig::new(), "orders", 100);
        let uidata = model.get_uidata();
        assert_eq!(uidata.source, StructureSource::Placeholder);
        assert!(uidata.hide_header);
        assert_eq!(uidata.nrows, 0);
        assert_eq!(header_names(&model), vec!["unknown"; 5]);
    }

    #[test]
    fn configured_headers_without_data_render_empty_columns() {
        let mut config = TableConfig::new();
        config.insert("orders", vec![variant(None, &["total", "status"])]);
        let mut model = model_with(config, "orders", 100);
        model.columns = vec![test_column("total", &["10", "20"])];
        model.status = Status::Ready;
        model.resolve_structure();
        model.rebuild_view();

        let uidata = model.get_uidata();
        assert_eq!(uidata.source, StructureSource::Configured);
        assert_eq!(header_names(&model), vec!["total", "status"]);
        // The unmatched "status" column renders empty cells
        assert_eq!(uidata.columns[1].data, vec!["", ""]);
    }

    #[test]
    fn loads_csv_and_derives_structure() {
        let mut model = model_with(TableConfig::new(), "orders", 120);
        model
            .load_data_file("tests/fixtures/orders.csv".into())
            .unwrap();

        let uidata = model.get_uidata();
        assert_eq!(model.status, Status::Ready);
        assert_eq!(uidata.source, StructureSource::Derived);
        assert_eq!(uidata.nrows, 3);
        assert_eq!(
            header_names(&model),
            vec!["id", "total", "status", "created"]
        );
    }

    #[test]
    fn row_scrolling_is_clamped() {
        let mut model = model_with(TableConfig::new(), "orders", 100);
        let values: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = values.iter().map(|s| s.as_str()).collect();
        model.columns = vec![test_column("id", &refs)];
        model.status = Status::Ready;
        model.resolve_structure();
        model.rebuild_view();

        model.update(Message::MoveUp).unwrap();
        assert_eq!(model.get_uidata().first_row, 0);

        model.update(Message::MoveEnd).unwrap();
        let max_offset = 100 - model.uilayout.table_height;
        assert_eq!(model.get_uidata().first_row, max_offset);

        model.update(Message::MoveDown).unwrap();
        assert_eq!(model.get_uidata().first_row, max_offset);

        model.update(Message::MoveBeginning).unwrap();
        assert_eq!(model.get_uidata().first_row, 0);
    }
}
