//! Report generation tools
//!
//! Generate a PDF weight and feeding report for one dog, with a weight trend
//! chart and a per-day calories vs. need table.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{Datelike, NaiveDate, Weekday};
use printpdf::*;
use printpdf::image_crate::{DynamicImage, RgbImage, ImageFormat};
use serde::Serialize;

use crate::db::Database;
use crate::models::{timestamp, Dog, FoodIntake, WeightEntry};

// ============================================================================
// Color Constants (RGB 0-255)
// ============================================================================

const COLOR_TITLE: (u8, u8, u8) = (0, 112, 192);        // Blue for titles
const COLOR_ON_TARGET: (u8, u8, u8) = (0, 176, 80);     // Green
const COLOR_UNDER: (u8, u8, u8) = (255, 165, 0);        // Orange
const COLOR_OVER: (u8, u8, u8) = (255, 0, 0);           // Red
const COLOR_BLACK: (u8, u8, u8) = (0, 0, 0);
const COLOR_GRAY: (u8, u8, u8) = (128, 128, 128);

/// Longest range a single report covers
const MAX_REPORT_DAYS: i64 = 366;

/// Share of the need within which a day counts as on target
const ON_TARGET_TOLERANCE: f64 = 0.10;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GenerateReportResponse {
    pub success: bool,
    pub file_path: String,
    pub dog_name: String,
    pub weight_entries: i64,
    pub days_analyzed: i64,
    pub days_with_intakes: i64,
    pub date_range: String,
    pub message: String,
}

// ============================================================================
// Daily Rows
// ============================================================================

/// One day of the report table
#[derive(Debug, Clone, Serialize)]
pub struct DailyReportRow {
    pub date: String,
    pub day_of_week: String,
    /// Last weight measured on this day
    pub measured_weight_kg: Option<f64>,
    /// Weight the need is computed from (latest measurement up to this day)
    pub weight_kg: f64,
    pub calories: i64,
    pub need: u32,
    pub balance: i64,
}

/// Classify a day's intake against its need
pub fn classify_intake(calories: i64, need: u32) -> (&'static str, (u8, u8, u8)) {
    if calories == 0 {
        return ("No data", COLOR_GRAY);
    }
    let need = need as f64;
    let ratio = calories as f64 / need;
    if ratio > 1.0 + ON_TARGET_TOLERANCE {
        ("Over", COLOR_OVER)
    } else if ratio < 1.0 - ON_TARGET_TOLERANCE {
        ("Under", COLOR_UNDER)
    } else {
        ("On target", COLOR_ON_TARGET)
    }
}

fn day_of_week_abbrev(date: &NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Build one row per calendar day from `start` to `end`
///
/// `history` must be ordered oldest first. Days before the first measurement
/// use `fallback_weight`.
pub fn build_daily_rows(
    dog: &Dog,
    start: NaiveDate,
    end: NaiveDate,
    history: &[WeightEntry],
    daily_calories: &[(String, i64)],
    fallback_weight: f64,
) -> Result<Vec<DailyReportRow>, String> {
    let calories: BTreeMap<&str, i64> = daily_calories.iter().map(|(d, c)| (d.as_str(), *c)).collect();

    let mut measured: BTreeMap<String, f64> = BTreeMap::new();
    for entry in history {
        measured.insert(entry.timestamp[..10].to_string(), entry.weight_kg);
    }

    let mut rows = Vec::new();
    let mut current_weight = fallback_weight;
    let mut day = start;
    while day <= end {
        let date = day.format(timestamp::DATE_FORMAT).to_string();

        // Latest measurement up to and including this day
        if let Some((_, w)) = measured.range(..=date.clone()).next_back() {
            current_weight = *w;
        }

        let need = dog.activity_level.daily_requirement(current_weight).map_err(|e| e.to_string())?;
        let eaten = calories.get(date.as_str()).copied().unwrap_or(0);

        rows.push(DailyReportRow {
            measured_weight_kg: measured.get(&date).copied(),
            day_of_week: day_of_week_abbrev(&day).to_string(),
            date,
            weight_kg: current_weight,
            calories: eaten,
            need,
            balance: eaten - need as i64,
        });

        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    Ok(rows)
}

// ============================================================================
// Chart Generation (plotters)
// ============================================================================

/// Generate the weight trend chart as PNG bytes
pub fn generate_weight_chart(
    entries: &[WeightEntry],
    target_weight_kg: Option<f64>,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    use plotters::prelude::*;

    if entries.is_empty() {
        return Err("No data to chart".to_string());
    }

    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let mut y_min = entries.iter().map(|e| e.weight_kg).fold(f64::INFINITY, f64::min);
        let mut y_max = entries.iter().map(|e| e.weight_kg).fold(f64::NEG_INFINITY, f64::max);
        if let Some(target) = target_weight_kg {
            y_min = y_min.min(target);
            y_max = y_max.max(target);
        }
        let pad = ((y_max - y_min) * 0.1).max(0.5);
        let (y_min, y_max) = ((y_min - pad).max(0.0), y_max + pad);

        let x_max = entries.len() as i32;
        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0..x_max, y_min..y_max)
            .map_err(|e| e.to_string())?;

        chart.configure_mesh()
            .x_labels(entries.len().min(10))
            .x_label_formatter(&|x| {
                if *x >= 0 && (*x as usize) < entries.len() {
                    let date = &entries[*x as usize].timestamp[..10];
                    date.split('-').skip(1).collect::<Vec<_>>().join("/")
                } else {
                    String::new()
                }
            })
            .y_desc("kg")
            .draw()
            .map_err(|e| e.to_string())?;

        if let Some(target) = target_weight_kg {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(0, target), (x_max, target)],
                ShapeStyle::from(&RGBColor(0, 176, 80)).stroke_width(2),
            )))
            .map_err(|e| e.to_string())?
            .label("Target")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RGBColor(0, 176, 80).stroke_width(2)));
        }

        let points: Vec<(i32, f64)> = entries.iter()
            .enumerate()
            .map(|(i, e)| (i as i32, e.weight_kg))
            .collect();

        chart.draw_series(LineSeries::new(
            points.clone(),
            BLUE.stroke_width(2),
        ))
        .map_err(|e| e.to_string())?
        .label("Weight")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

        chart.draw_series(points.iter().map(|(x, y)| {
            Circle::new((*x, *y), 3, BLUE.filled())
        })).map_err(|e| e.to_string())?;

        chart.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
    }

    let img = RgbImage::from_raw(width, height, buffer)
        .ok_or("Failed to create image from buffer")?;

    let mut png_bytes = Vec::new();
    let dyn_img = DynamicImage::ImageRgb8(img);
    dyn_img.write_to(&mut std::io::Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    Ok(png_bytes)
}

// ============================================================================
// PDF Generation Helper Functions
// ============================================================================

fn rgb_to_printpdf(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn add_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    x: Mm,
    y: Mm,
    size: f32,
    color: (u8, u8, u8),
) {
    layer.set_fill_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.use_text(text, size, x, y, font);
}

fn add_line(
    layer: &PdfLayerReference,
    x1: Mm,
    y1: Mm,
    x2: Mm,
    y2: Mm,
    color: (u8, u8, u8),
    width: f32,
) {
    layer.set_outline_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.set_outline_thickness(width);

    let line = Line {
        points: vec![
            (Point::new(x1, y1), false),
            (Point::new(x2, y2), false),
        ],
        is_closed: false,
    };
    layer.add_line(line);
}

fn fmt_kg(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1} kg", v)).unwrap_or_else(|| "-".to_string())
}

// ============================================================================
// Weight Report Generation
// ============================================================================

/// Generate a weight and feeding PDF report for one dog
pub fn generate_weight_report(
    db: &Database,
    dog_id: i64,
    start_date: &str,
    end_date: &str,
    output_path: &str,
) -> Result<GenerateReportResponse, String> {
    let start = timestamp::parse_date(start_date).map_err(|e| e.to_string())?;
    let end = timestamp::parse_date(end_date).map_err(|e| e.to_string())?;
    if end < start {
        return Err(format!("end_date {} is before start_date {}", end_date, start_date));
    }
    let span = (end - start).num_days() + 1;
    if span > MAX_REPORT_DAYS {
        return Err(format!("Report range is {} days; the maximum is {}", span, MAX_REPORT_DAYS));
    }

    let conn = db.get_conn().map_err(|e| e.to_string())?;

    let dog = Dog::get_by_id(&conn, dog_id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Dog {} not found", dog_id))?;

    let mut history = WeightEntry::list_for_dog(&conn, dog_id, None).map_err(|e| e.to_string())?;
    history.reverse();
    let in_range = WeightEntry::list_for_range(&conn, dog_id, start_date, end_date)
        .map_err(|e| e.to_string())?;
    let daily_calories = FoodIntake::daily_totals(&conn, dog_id, start_date, end_date)
        .map_err(|e| e.to_string())?;
    drop(conn);

    // Before the first measurement the oldest known weight applies
    let fallback_weight = history.first().map(|e| e.weight_kg).unwrap_or(dog.weight_kg);
    let rows = build_daily_rows(&dog, start, end, &history, &daily_calories, fallback_weight)?;

    let days_analyzed = rows.len() as i64;
    let fed_rows: Vec<&DailyReportRow> = rows.iter().filter(|r| r.calories > 0).collect();
    let days_with_intakes = fed_rows.len() as i64;

    // Create PDF - Page 1 Portrait
    let (doc, page1, layer1) = PdfDocument::new(
        "Weight Report",
        Mm(215.9),  // Letter width
        Mm(279.4),  // Letter height
        "Layer 1",
    );

    let font = doc.add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| e.to_string())?;
    let font_bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| e.to_string())?;

    let mut layer = doc.get_page(page1).get_layer(layer1);

    let page_height = 279.4;
    let margin_left = 15.0;
    let mut y = page_height - 20.0;

    // Header
    add_text(&layer, &font_bold, &format!("Weight Report: {}", dog.name), Mm(margin_left), Mm(y), 18.0, COLOR_TITLE);
    y -= 9.0;

    let breed = if dog.breed.is_empty() { "-" } else { dog.breed.as_str() };
    add_text(&layer, &font, &format!("Breed: {}", breed), Mm(margin_left), Mm(y), 11.0, COLOR_BLACK);
    add_text(&layer, &font, &format!("Activity: {}", dog.activity_level.display_name()), Mm(120.0), Mm(y), 11.0, COLOR_BLACK);
    y -= 6.0;

    let now = timestamp::now().replace('T', " ");
    add_text(&layer, &font, &format!("Report Period: {} to {}", start_date, end_date), Mm(margin_left), Mm(y), 11.0, COLOR_BLACK);
    add_text(&layer, &font, &format!("Generated: {}", now), Mm(120.0), Mm(y), 11.0, COLOR_BLACK);
    y -= 5.0;

    add_line(&layer, Mm(margin_left), Mm(y), Mm(200.0), Mm(y), COLOR_GRAY, 0.5);
    y -= 8.0;

    // Summary
    add_text(&layer, &font_bold, "Summary", Mm(margin_left), Mm(y), 12.0, COLOR_BLACK);
    y -= 6.0;

    let first = in_range.first().map(|e| e.weight_kg);
    let last = in_range.last().map(|e| e.weight_kg);
    add_text(&layer, &font, &format!("Start Weight: {}", fmt_kg(first)), Mm(margin_left), Mm(y), 10.0, COLOR_BLACK);
    add_text(&layer, &font, &format!("End Weight: {}", fmt_kg(last)), Mm(80.0), Mm(y), 10.0, COLOR_BLACK);
    add_text(&layer, &font, &format!("Target: {}", fmt_kg(dog.target_weight_kg)), Mm(145.0), Mm(y), 10.0, COLOR_BLACK);
    y -= 5.0;

    if let (Some(first), Some(last)) = (first, last) {
        add_text(&layer, &font, &format!("Change: {:+.2} kg", last - first), Mm(margin_left), Mm(y), 10.0, COLOR_BLACK);
    }
    add_text(&layer, &font, &format!("Weigh-ins: {}", in_range.len()), Mm(80.0), Mm(y), 10.0, COLOR_BLACK);
    y -= 5.0;

    if !fed_rows.is_empty() {
        let avg_calories = fed_rows.iter().map(|r| r.calories).sum::<i64>() as f64 / fed_rows.len() as f64;
        let avg_need = fed_rows.iter().map(|r| r.need as f64).sum::<f64>() / fed_rows.len() as f64;
        let (classification, class_color) = classify_intake(avg_calories.round() as i64, avg_need.round() as u32);
        add_text(&layer, &font, &format!("Average Intake: {:.0} kcal/day", avg_calories), Mm(margin_left), Mm(y), 10.0, COLOR_BLACK);
        add_text(&layer, &font, &format!("Average Need: {:.0} kcal/day", avg_need), Mm(80.0), Mm(y), 10.0, COLOR_BLACK);
        add_text(&layer, &font, &format!("Overall: {}", classification), Mm(145.0), Mm(y), 10.0, class_color);
    } else {
        add_text(&layer, &font, "No feedings logged in this period", Mm(margin_left), Mm(y), 10.0, COLOR_GRAY);
    }
    y -= 10.0;

    // Daily table
    add_text(&layer, &font_bold, "Daily Calories vs. Need", Mm(margin_left), Mm(y), 12.0, COLOR_BLACK);
    y -= 7.0;

    let col_widths = [24.0, 12.0, 24.0, 24.0, 22.0, 22.0, 22.0, 24.0];
    let headers = ["Date", "Day", "Weighed", "Weight", "Eaten", "Need", "Balance", "Status"];

    let draw_header = |layer: &PdfLayerReference, y: f32| {
        let mut col_x = margin_left;
        for (i, header) in headers.iter().enumerate() {
            add_text(layer, &font_bold, header, Mm(col_x), Mm(y), 8.0, COLOR_BLACK);
            col_x += col_widths[i];
        }
    };
    draw_header(&layer, y);
    y -= 5.0;

    for row in &rows {
        if y < 15.0 {
            let (page, page_layer) = doc.add_page(Mm(215.9), Mm(279.4), "Table Page");
            layer = doc.get_page(page).get_layer(page_layer);
            y = page_height - 20.0;
            draw_header(&layer, y);
            y -= 5.0;
        }

        let (status, row_color) = classify_intake(row.calories, row.need);
        let values = [
            row.date.clone(),
            row.day_of_week.clone(),
            fmt_kg(row.measured_weight_kg),
            format!("{:.1} kg", row.weight_kg),
            row.calories.to_string(),
            row.need.to_string(),
            format!("{:+}", row.balance),
            status.to_string(),
        ];

        let mut col_x = margin_left;
        for (i, value) in values.iter().enumerate() {
            let color = if i >= 6 { row_color } else { COLOR_BLACK };
            add_text(&layer, &font, value, Mm(col_x), Mm(y), 7.0, color);
            col_x += col_widths[i];
        }
        y -= 4.5;
    }

    // ========================================================================
    // Landscape page for the chart
    // ========================================================================
    let (page2, layer2) = doc.add_page(Mm(279.4), Mm(215.9), "Chart Page");  // Landscape
    let layer2 = doc.get_page(page2).get_layer(layer2);

    let landscape_height = 215.9;
    let mut y2 = landscape_height - 20.0;

    add_text(&layer2, &font_bold, "Weight Trend", Mm(margin_left), Mm(y2), 16.0, COLOR_TITLE);
    add_text(&layer2, &font, &format!("{} - {}", start_date, end_date), Mm(120.0), Mm(y2), 11.0, COLOR_BLACK);
    y2 -= 10.0;

    match generate_weight_chart(&in_range, dog.target_weight_kg, 1000, 400) {
        Ok(png_bytes) => {
            let dynamic_image = printpdf::image_crate::load_from_memory(&png_bytes)
                .map_err(|e| e.to_string())?;
            let pdf_image = Image::from_dynamic_image(&dynamic_image);

            // 1000x400 pixels at 120 DPI is about 212mm x 85mm
            let transform = ImageTransform {
                translate_x: Some(Mm(margin_left)),
                translate_y: Some(Mm(y2 - 90.0)),
                dpi: Some(120.0),
                ..Default::default()
            };

            pdf_image.add_to_layer(layer2.clone(), transform);
        }
        Err(e) => {
            add_text(&layer2, &font, &format!("Chart generation error: {}", e), Mm(margin_left), Mm(y2 - 10.0), 9.0, COLOR_OVER);
        }
    }

    // Save PDF
    let path = Path::new(output_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }

    let file = File::create(path).map_err(|e| e.to_string())?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer).map_err(|e| e.to_string())?;

    Ok(GenerateReportResponse {
        success: true,
        file_path: output_path.to_string(),
        dog_name: dog.name,
        weight_entries: in_range.len() as i64,
        days_analyzed,
        days_with_intakes,
        date_range: format!("{} to {}", start_date, end_date),
        message: format!(
            "Weight report generated with {} weigh-ins over {} days",
            in_range.len(),
            days_analyzed
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::sample_dog;
    use crate::models::{FoodIntakeCreate, WeightEntryCreate};

    fn weight(id: i64, kg: f64, ts: &str) -> WeightEntry {
        WeightEntry {
            id,
            dog_id: 1,
            weight_kg: kg,
            timestamp: ts.to_string(),
            note: None,
            created_at: ts.to_string(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_classify_intake() {
        assert_eq!(classify_intake(0, 629).0, "No data");
        assert_eq!(classify_intake(629, 629).0, "On target");
        assert_eq!(classify_intake(700, 629).0, "Over");
        assert_eq!(classify_intake(500, 629).0, "Under");
    }

    #[test]
    fn test_daily_rows_carry_weight_forward() {
        let db = Database::in_memory().unwrap();
        let dog = {
            let conn = db.get_conn().unwrap();
            Dog::create(&conn, &sample_dog()).unwrap()
        };
        let history = vec![
            weight(1, 10.0, "2025-03-01T08:00:00"),
            weight(2, 11.0, "2025-03-03T08:00:00"),
        ];
        let calories = vec![("2025-03-02".to_string(), 600)];

        let rows = build_daily_rows(&dog, date("2025-02-28"), date("2025-03-04"), &history, &calories, 10.0).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].measured_weight_kg, None);
        assert_eq!(rows[1].measured_weight_kg, Some(10.0));
        assert_eq!(rows[2].weight_kg, 10.0);
        assert_eq!(rows[2].need, 629);
        assert_eq!(rows[2].balance, -29);
        assert_eq!(rows[4].weight_kg, 11.0);
        assert!(rows[4].need > 629);
        assert_eq!(rows[4].calories, 0);
    }

    #[test]
    fn test_report_rejects_bad_ranges() {
        let db = Database::in_memory().unwrap();
        let out = std::env::temp_dir().join("snacktrack_bad_range.pdf");
        let out = out.to_string_lossy();
        assert!(generate_weight_report(&db, 1, "2025-03-05", "2025-03-01", &out).is_err());
        assert!(generate_weight_report(&db, 1, "2024-01-01", "2025-06-01", &out).is_err());
        assert!(generate_weight_report(&db, 1, "2025-03-01", "2025-03-05", &out).is_err());
    }

    #[test]
    fn test_generate_weight_report_writes_pdf() {
        let db = Database::in_memory().unwrap();
        let dog_id = {
            let mut conn = db.get_conn().unwrap();
            let dog = Dog::create(&conn, &sample_dog()).unwrap();
            for (kg, ts) in [(10.4, "2025-03-01T08:00:00"), (10.1, "2025-03-08T08:00:00")] {
                let entry = WeightEntryCreate {
                    dog_id: dog.id,
                    weight_kg: kg,
                    timestamp: Some(ts.to_string()),
                    note: None,
                };
                WeightEntry::create(&mut conn, &entry).unwrap();
            }
            let meal = FoodIntakeCreate {
                dog_id: dog.id,
                food_name: "Kibble".to_string(),
                amount_grams: 180.0,
                calories: 612,
                timestamp: Some("2025-03-02T08:00:00".to_string()),
                ..Default::default()
            };
            FoodIntake::create(&conn, &meal).unwrap();
            dog.id
        };

        let out = std::env::temp_dir().join(format!("snacktrack_report_{}.pdf", std::process::id()));
        let response = generate_weight_report(&db, dog_id, "2025-03-01", "2025-03-10", &out.to_string_lossy()).unwrap();
        assert!(response.success);
        assert_eq!(response.weight_entries, 2);
        assert_eq!(response.days_analyzed, 10);
        assert_eq!(response.days_with_intakes, 1);

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let _ = std::fs::remove_file(&out);
    }
}
