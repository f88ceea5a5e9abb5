use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, Image, Workbook, Worksheet, XlsxError,
};
use std::path::Path;
use tracing::warn;

use super::ReportRow;
use super::summary::ReportSummary;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const NAVY: u32 = 0x0C3175;
const PARAMETER_BAND: u32 = 0xE8F0F8;
const STRIPE: u32 = 0xF0F4F8;

// Rows above the title are left for the logo.
const FIRST_CONTENT_ROW: u32 = 5;
const LOGO_WIDTH: u32 = 160;
const LOGO_HEIGHT: u32 = 60;

const HEADERS: [&str; 4] = ["Employee", "Date", "Check-in", "Check-out"];
const COLUMN_WIDTHS: [f64; 4] = [30.0, 15.0, 15.0, 15.0];

/// Title and logo printed at the top of every export.
pub struct Branding<'a> {
    pub title: &'a str,
    pub logo_path: &'a Path,
}

const DATE_FORMAT: &str = "dd/mm/yyyy";
const TIME_FORMAT: &str = "hh:mm";

#[derive(Debug, Clone, PartialEq)]
enum CellValue {
    Text(String),
    Date(NaiveDate),
    Time(NaiveDateTime),
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Title,
    Stamp,
    Band,
    Label,
    Plain,
    Header,
    Record { shaded: bool },
}

/// One cell (or merged run of cells) of the report sheet.
#[derive(Debug, Clone, PartialEq)]
struct Placement {
    row: u32,
    first_col: u16,
    last_col: u16,
    value: CellValue,
    style: Style,
}

impl Placement {
    fn cell(row: u32, col: u16, value: CellValue, style: Style) -> Self {
        Placement {
            row,
            first_col: col,
            last_col: col,
            value,
            style,
        }
    }

    fn merged(row: u32, first_col: u16, last_col: u16, text: String, style: Style) -> Self {
        Placement {
            row,
            first_col,
            last_col,
            value: CellValue::Text(text),
            style,
        }
    }

    fn num_format(&self) -> Option<&'static str> {
        match (self.style, &self.value) {
            (Style::Record { .. }, CellValue::Date(_)) => Some(DATE_FORMAT),
            (Style::Record { .. }, CellValue::Time(_)) => Some(TIME_FORMAT),
            _ => None,
        }
    }
}

struct CellFormats {
    text: Format,
    date: Format,
    time: Format,
}

impl CellFormats {
    fn new(shaded: bool) -> Self {
        let mut base = Format::new()
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::VerticalCenter);
        if shaded {
            base = base.set_background_color(Color::RGB(STRIPE));
        }

        CellFormats {
            date: base.clone().set_num_format(DATE_FORMAT),
            time: base.clone().set_num_format(TIME_FORMAT),
            text: base,
        }
    }
}

struct SheetFormats {
    title: Format,
    stamp: Format,
    band: Format,
    label: Format,
    plain: Format,
    header: Format,
    record: CellFormats,
    shaded_record: CellFormats,
}

impl SheetFormats {
    fn new() -> Self {
        SheetFormats {
            title: Format::new()
                .set_bold()
                .set_font_size(14)
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(NAVY))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            stamp: Format::new().set_font_size(10).set_align(FormatAlign::Center),
            band: Format::new()
                .set_bold()
                .set_font_size(11)
                .set_background_color(Color::RGB(PARAMETER_BAND))
                .set_border_bottom(FormatBorder::Thin),
            label: Format::new().set_bold(),
            plain: Format::new(),
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(NAVY))
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin),
            record: CellFormats::new(false),
            shaded_record: CellFormats::new(true),
        }
    }

    fn for_placement(&self, placement: &Placement) -> &Format {
        match placement.style {
            Style::Title => &self.title,
            Style::Stamp => &self.stamp,
            Style::Band => &self.band,
            Style::Label => &self.label,
            Style::Plain => &self.plain,
            Style::Header => &self.header,
            Style::Record { shaded } => {
                let formats = if shaded { &self.shaded_record } else { &self.record };
                match placement.num_format() {
                    Some(DATE_FORMAT) => &formats.date,
                    Some(_) => &formats.time,
                    None => &formats.text,
                }
            }
        }
    }
}

/// Attachment name for an ad-hoc export.
pub fn export_file_name(generated_at: NaiveDateTime) -> String {
    format!(
        "attendance_report_{}.xlsx",
        generated_at.format("%Y%m%d%H%M%S")
    )
}

/// Attachment name for a saved report; characters unsafe in a header or path become `_`.
pub fn saved_file_name(report_name: &str) -> String {
    let stem: String = report_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() {
        "report.xlsx".to_string()
    } else {
        format!("{stem}.xlsx")
    }
}

/// Renders the report workbook to an in-memory xlsx file.
pub fn render_workbook(
    branding: &Branding,
    summary: &ReportSummary,
    rows: &[ReportRow],
    generated_at: NaiveDateTime,
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Report")?;

        insert_logo(sheet, branding.logo_path)?;

        let formats = SheetFormats::new();
        for placement in layout(branding.title, summary, rows, generated_at) {
            write_placement(sheet, &placement, formats.for_placement(&placement))?;
        }
        sheet.set_row_height(FIRST_CONTENT_ROW, 24)?;

        for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
            sheet.set_column_width(col as u16, *width)?;
        }
    }

    workbook.save_to_buffer()
}

fn insert_logo(sheet: &mut Worksheet, path: &Path) -> Result<(), XlsxError> {
    if !path.is_file() {
        return Ok(());
    }

    match Image::new(path) {
        Ok(image) => {
            let image = image.set_scale_to_size(LOGO_WIDTH, LOGO_HEIGHT, false);
            sheet.insert_image(0, 0, &image)?;
        }
        Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable report logo"),
    }
    Ok(())
}

fn write_placement(
    sheet: &mut Worksheet,
    placement: &Placement,
    format: &Format,
) -> Result<(), XlsxError> {
    let Placement {
        row,
        first_col: col,
        last_col,
        ..
    } = *placement;

    if col != last_col {
        let text = match &placement.value {
            CellValue::Text(text) => text.as_str(),
            _ => "",
        };
        sheet.merge_range(row, col, row, last_col, text, format)?;
        return Ok(());
    }

    match &placement.value {
        CellValue::Text(text) => sheet.write_string_with_format(row, col, text, format)?,
        CellValue::Date(date) => sheet.write_datetime_with_format(row, col, date, format)?,
        CellValue::Time(time) => sheet.write_datetime_with_format(row, col, time, format)?,
        CellValue::Blank => sheet.write_blank(row, col, format)?,
    };
    Ok(())
}

/// Every cell of the sheet below the logo: title band, generation stamp,
/// search parameters, then the header and striped records.
fn layout(
    title: &str,
    summary: &ReportSummary,
    rows: &[ReportRow],
    generated_at: NaiveDateTime,
) -> Vec<Placement> {
    let mut plan = Vec::with_capacity(16 + rows.len() * 4);
    let mut row = FIRST_CONTENT_ROW;

    plan.push(Placement::merged(row, 0, 3, title.to_string(), Style::Title));
    row += 1;
    plan.push(Placement::merged(
        row,
        0,
        3,
        format!("Generated: {}", generated_at.format("%d/%m/%Y %H:%M")),
        Style::Stamp,
    ));
    row += 2;

    plan.push(Placement::merged(row, 0, 1, "SEARCH PARAMETERS".to_string(), Style::Band));
    row += 1;

    let parameters = [
        ("Employee".to_string(), summary.employee_label.clone()),
        (
            "Start Date".to_string(),
            summary.start_date.format("%d/%m/%Y").to_string(),
        ),
        (
            "End Date".to_string(),
            summary.end_date.format("%d/%m/%Y").to_string(),
        ),
        (
            "Earliest Check-in".to_string(),
            summary.earliest_check_in_display(),
        ),
        (
            "Latest Check-out".to_string(),
            summary.latest_check_out_display(),
        ),
        (
            format!("Total Hours Worked {}", summary.compact_total()),
            summary.long_total(),
        ),
    ];
    for (name, value) in parameters {
        plan.push(Placement::cell(row, 0, CellValue::Text(name), Style::Label));
        plan.push(Placement::cell(row, 1, CellValue::Text(value), Style::Plain));
        row += 1;
    }
    row += 1;

    for (col, name) in HEADERS.iter().enumerate() {
        plan.push(Placement::cell(
            row,
            col as u16,
            CellValue::Text((*name).to_string()),
            Style::Header,
        ));
    }
    row += 1;

    for (i, record) in rows.iter().enumerate() {
        let style = Style::Record { shaded: i % 2 == 1 };
        let time = |t: Option<NaiveDateTime>| t.map_or(CellValue::Blank, CellValue::Time);

        plan.push(Placement::cell(row, 0, CellValue::Text(record.employee_name.clone()), style));
        plan.push(Placement::cell(row, 1, CellValue::Date(record.date), style));
        plan.push(Placement::cell(row, 2, time(record.check_in), style));
        plan.push(Placement::cell(row, 3, time(record.check_out), style));
        row += 1;
    }

    plan
}
