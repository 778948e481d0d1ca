use std::fmt::Write;

use crate::models::{ReportSet, VisitRecord};

/// Renders every report as a markdown section with a pipe table.
///
/// `limit` caps the rows shown per section; 0 shows everything.
pub fn build_report(source: &str, window_days: i64, reports: &ReportSet, limit: usize) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Course Visit Analytics Report");
    let _ = writeln!(output, "Generated from {source}");

    write_section(
        &mut output,
        "Total Visits per Course",
        &["courseCode", "CourseTitle", "total_visits"],
        reports.total_visits_per_course.iter().map(|row| {
            vec![
                row.course_code.clone(),
                row.course_title.clone().unwrap_or_default(),
                row.total_visits.to_string(),
            ]
        }),
        limit,
    );

    write_section(
        &mut output,
        "Visits per Course by Program",
        &["Program", "courseCode", "total_visits"],
        reports.visits_per_course_by_program.iter().map(|row| {
            vec![
                row.program.clone(),
                row.course_code.clone(),
                row.total_visits.to_string(),
            ]
        }),
        limit,
    );

    write_section(
        &mut output,
        "Total Visits per Program",
        &["Program", "total_visits"],
        reports
            .visits_per_program
            .iter()
            .map(|row| vec![row.program.clone(), row.total_visits.to_string()]),
        limit,
    );

    write_section(
        &mut output,
        "Unique Users per Program",
        &["Program", "unique_users"],
        reports
            .distinct_users_per_program
            .iter()
            .map(|row| vec![row.program.clone(), row.unique_users.to_string()]),
        limit,
    );

    write_section(
        &mut output,
        "Unique Visitors per Department",
        &["Department", "unique_users"],
        reports
            .unique_visitors_per_department
            .iter()
            .map(|row| vec![row.department.clone(), row.unique_users.to_string()]),
        limit,
    );

    write_section(
        &mut output,
        "Unique Users per Department and Program",
        &["Department", "Program", "unique_users"],
        reports.distinct_users_per_department_program.iter().map(|row| {
            vec![
                row.department.clone(),
                row.program.clone(),
                row.unique_users.to_string(),
            ]
        }),
        limit,
    );

    write_section(
        &mut output,
        "Visits Trend Over Time",
        &["visit_date", "total_visits"],
        reports
            .visits_trend
            .iter()
            .map(|row| vec![row.visit_date.to_string(), row.total_visits.to_string()]),
        limit,
    );

    write_section(
        &mut output,
        "Most Recent Visit per User and Course",
        &["userName", "courseCode", "last_visit"],
        reports.most_recent_visits.iter().map(|row| {
            vec![
                row.user_name.clone(),
                row.course_code.clone(),
                row.last_visit.to_string(),
            ]
        }),
        limit,
    );

    write_section(
        &mut output,
        "Visit Count per User and Course",
        &["userName", "courseCode", "visit_count"],
        reports.visit_counts.iter().map(|row| {
            vec![
                row.user_name.clone(),
                row.course_code.clone(),
                row.visit_count.to_string(),
            ]
        }),
        limit,
    );

    write_section(
        &mut output,
        "Top Visitor per Course",
        &["courseCode", "userName", "visit_count"],
        reports.top_visitor_per_course.iter().map(|row| {
            vec![
                row.course_code.clone(),
                row.user_name.clone(),
                row.visit_count.to_string(),
            ]
        }),
        limit,
    );

    write_section(
        &mut output,
        "Peak Single-Day Visits per Course",
        &["courseCode", "userName", "visit_date", "visits"],
        reports.peak_single_day_per_course.iter().map(|row| {
            vec![
                row.course_code.clone(),
                row.user_name.clone(),
                row.visit_date.to_string(),
                row.visits.to_string(),
            ]
        }),
        limit,
    );

    write_section(
        &mut output,
        "Longest Visit Streak per User and Course",
        &["userName", "courseCode", "longest_streak"],
        reports.longest_streaks.iter().map(|row| {
            vec![
                row.user_name.clone(),
                row.course_code.clone(),
                row.longest_streak.to_string(),
            ]
        }),
        limit,
    );

    write_section(
        &mut output,
        "Longest Gap Between Visits per User and Course",
        &["userName", "courseCode", "longest_gap_days"],
        reports.longest_gaps.iter().map(|row| {
            vec![
                row.user_name.clone(),
                row.course_code.clone(),
                row.longest_gap_days.to_string(),
            ]
        }),
        limit,
    );

    write_section(
        &mut output,
        &format!("Users Visiting Many Courses Within {window_days} Days"),
        &["userName", "unique_courses", "span_days"],
        reports.multi_course_window.iter().map(|row| {
            vec![
                row.user_name.clone(),
                row.unique_courses.to_string(),
                row.span_days.to_string(),
            ]
        }),
        limit,
    );

    output
}

pub fn to_json(reports: &ReportSet) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}

/// First `rows` records as a markdown table.
pub fn preview(records: &[VisitRecord], rows: usize) -> String {
    let mut output = String::new();
    write_table(
        &mut output,
        &[
            "userName",
            "courseCode",
            "CourseTitle",
            "Program",
            "Department",
            "visit_date",
            "visits_on_that_day",
        ],
        records.iter().take(rows).map(|record| {
            vec![
                record.user_name.clone(),
                record.course_code.clone(),
                record.course_title.clone().unwrap_or_default(),
                record.program.clone(),
                record.department.clone(),
                record.visit_date.to_string(),
                record.visits_on_that_day.to_string(),
            ]
        }),
    );
    output
}

fn write_section(
    output: &mut String,
    title: &str,
    headers: &[&str],
    rows: impl ExactSizeIterator<Item = Vec<String>>,
    limit: usize,
) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");

    let total = rows.len();
    if total == 0 {
        let _ = writeln!(output, "No visits recorded.");
        return;
    }

    let shown = if limit == 0 { total } else { limit.min(total) };
    write_table(output, headers, rows.take(shown));

    if shown < total {
        let _ = writeln!(output, "_{shown} of {total} rows shown._");
    }
}

fn write_table(output: &mut String, headers: &[&str], rows: impl Iterator<Item = Vec<String>>) {
    let _ = writeln!(output, "| {} |", headers.join(" | "));
    let _ = writeln!(output, "|{}", " --- |".repeat(headers.len()));

    for row in rows {
        let cells: Vec<String> = row.iter().map(|cell| cell.replace('|', "\\|")).collect();
        let _ = writeln!(output, "| {} |", cells.join(" | "));
    }
}
