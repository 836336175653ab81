use crate::models::{AttendanceStatus, Course};
use crate::projector::Projection;
use crate::stats::format_percentage;
use chrono::NaiveDate;
use std::fmt::Write;

/// `path` with the user carried along as a percent-encoded query parameter.
pub fn user_path(path: &str, user_id: &str) -> String {
    format!("{path}?user_id={}", urlencoding::encode(user_id))
}

pub fn render_timetable(projection: &Projection, user_id: &str, today: NaiveDate) -> String {
    let mut head = String::new();
    for day in &projection.days {
        let _ = write!(head, "<th>{day}</th>");
    }

    let mut rows = String::new();
    for row in &projection.grid.rows {
        let _ = write!(
            rows,
            r#"<tr><td class="slot-label">{}</td>"#,
            escape_html(&row.time_slot)
        );
        for cell in &row.cells {
            let Some(entry) = &cell.entry else {
                rows.push_str(r#"<td class="cell empty"></td>"#);
                continue;
            };
            let view = projection.course(&entry.course_code);
            let Some(course) = view.course else {
                // Nothing can be marked for a course missing from the catalog.
                let _ = write!(
                    rows,
                    r#"<td class="cell unknown"><span class="code">{}</span></td>"#,
                    escape_html(view.code)
                );
                continue;
            };
            let stat = projection.stats.get_or_default(&entry.course_code);
            let _ = write!(
                rows,
                r#"<td class="cell"><details><summary><span class="code">{label}</span><span class="location">{location}</span></summary>
<div class="detail"><strong>{name}</strong> <span class="badge {band}">{percent}</span>{info}
{form}</div></details></td>"#,
                label = escape_html(view.label()),
                location = escape_html(&course.location),
                name = escape_html(&course.name),
                band = stat.band().as_str(),
                percent = format_percentage(stat.percentage),
                info = render_course_info(course),
                form = render_mark_form(&course.code, user_id, today),
            );
        }
        rows.push_str("</tr>");
    }

    let body = TIMETABLE_BODY
        .replace("{{HEAD}}", &head)
        .replace("{{ROWS}}", &rows)
        .replace("{{USER}}", &escape_html(user_id))
        .replace("{{ATTENDANCE_LINK}}", &escape_html(&user_path("/attendance", user_id)))
        .replace("{{LOG_LINK}}", &escape_html(&user_path("/log", user_id)));
    page("Timetable", &body)
}

pub fn render_attendance(projection: &Projection, user_id: &str) -> String {
    let mut sections = String::new();
    if projection.attendance_by_course.is_empty() {
        sections.push_str(r#"<p class="hint">No attendance marked yet.</p>"#);
    }

    for (code, history) in &projection.attendance_by_course {
        let view = projection.course(code);
        let stat = projection.stats.get_or_default(code);
        let mut rows = String::new();
        for record in history {
            let _ = write!(
                rows,
                r#"<tr><td>{}</td><td><span class="status {}">{}</span></td></tr>"#,
                record.date,
                record.status.as_str().to_ascii_lowercase(),
                record.status
            );
        }
        let _ = write!(
            sections,
            r#"<details class="course"><summary><span>{name} ({code})</span><span class="badge {band}">{percent}</span></summary>
<p class="hint">{present} present, {absent} absent, {cancelled} cancelled, {postponed} postponed</p>
<table><thead><tr><th>Date</th><th>Status</th></tr></thead><tbody>{rows}</tbody></table></details>"#,
            name = escape_html(view.name()),
            code = escape_html(code),
            band = stat.band().as_str(),
            percent = format_percentage(stat.percentage),
            present = stat.present_count,
            absent = stat.absent_count,
            cancelled = stat.cancelled_count,
            postponed = stat.postponed_count,
        );
    }

    let body = ATTENDANCE_BODY
        .replace("{{SECTIONS}}", &sections)
        .replace("{{USER}}", &escape_html(user_id))
        .replace("{{HOME_LINK}}", &escape_html(&user_path("/", user_id)));
    page("Attendance Records", &body)
}

pub fn render_log(projection: &Projection, user_id: &str) -> String {
    let mut rows = String::new();
    for entry in projection.log_entries() {
        let _ = write!(
            rows,
            r#"<tr><td class="code">{code}</td><td>{name}</td><td>{date}</td><td><span class="status {class}">{status}</span></td></tr>"#,
            code = escape_html(&entry.course_code),
            name = escape_html(&entry.course_name),
            date = entry.date,
            class = entry.status.as_str().to_ascii_lowercase(),
            status = entry.status,
        );
    }
    if rows.is_empty() {
        rows.push_str(
            r#"<tr><td colspan="4" class="hint">No attendance records found.</td></tr>"#,
        );
    }

    let body = LOG_BODY
        .replace("{{ROWS}}", &rows)
        .replace("{{USER}}", &escape_html(user_id))
        .replace("{{HOME_LINK}}", &escape_html(&user_path("/", user_id)));
    page("Full Attendance Log", &body)
}

fn render_course_info(course: &Course) -> String {
    format!(
        r#"<ul class="info"><li>Code: {code}</li><li>Teacher: {teacher}</li><li>Venue: {venue}</li><li>Category: {category}</li><li>Slot: {slot}</li><li>Credits: {credits:.2}</li><li>Term: {term}</li><li>Nature: {nature}</li></ul>"#,
        code = escape_html(&course.code),
        teacher = escape_html(&course.teacher),
        venue = escape_html(&course.location),
        category = escape_html(&course.category),
        slot = escape_html(&course.slot),
        credits = course.credits,
        term = escape_html(&course.term),
        nature = escape_html(&course.nature),
    )
}

fn render_mark_form(code: &str, user_id: &str, today: NaiveDate) -> String {
    let mut buttons = String::new();
    for status in AttendanceStatus::ALL {
        let _ = write!(
            buttons,
            r#"<button class="{}" name="status" value="{status}" type="submit">{status}</button>"#,
            status.as_str().to_ascii_lowercase()
        );
    }
    format!(
        r#"<form method="post" action="/attendance/mark"><input type="hidden" name="course_code" value="{code}" /><input type="hidden" name="user_id" value="{user}" /><input type="date" name="date" value="{today}" required /><div class="buttons">{buttons}</div></form>"#,
        code = escape_html(code),
        user = escape_html(user_id),
    )
}

fn page(title: &str, body: &str) -> String {
    PAGE_HTML
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{BODY}}", body)
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const TIMETABLE_BODY: &str = r#"<header>
      <h1>Timetable</h1>
      <p class="subtitle">Signed in as {{USER}}. Open a class to mark attendance.</p>
    </header>
    <div class="grid-wrapper">
      <table class="grid">
        <thead><tr><th class="slot-label">Time</th>{{HEAD}}</tr></thead>
        <tbody>{{ROWS}}</tbody>
      </table>
    </div>
    <nav>
      <a class="link" href="{{ATTENDANCE_LINK}}">View attendance records</a>
      <a class="link" href="{{LOG_LINK}}">Full attendance log</a>
    </nav>"#;

const ATTENDANCE_BODY: &str = r#"<header>
      <h1>Attendance Records</h1>
      <p class="subtitle">History for {{USER}}, newest first.</p>
    </header>
    <section class="list">{{SECTIONS}}</section>
    <nav><a class="link" href="{{HOME_LINK}}">Back to timetable</a></nav>"#;

const LOG_BODY: &str = r#"<header>
      <h1>Full Attendance Log</h1>
      <p class="subtitle">Every record for {{USER}}, newest first.</p>
    </header>
    <div class="grid-wrapper">
      <table class="log">
        <thead><tr><th>Course Code</th><th>Course Name</th><th>Date</th><th>Status</th></tr></thead>
        <tbody>{{ROWS}}</tbody>
      </table>
    </div>
    <nav><a class="link" href="{{HOME_LINK}}">Back to timetable</a></nav>"#;

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
      --healthy: #2d7a4b;
      --warning: #b7791f;
      --critical: #c63b2b;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      max-width: 1200px;
      margin: 0 auto;
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Georgia", serif;
      margin: 0;
    }

    .subtitle, .hint {
      margin: 0;
      color: #6f6a65;
    }

    .grid-wrapper {
      overflow-x: auto;
    }

    table {
      border-collapse: collapse;
      width: 100%;
    }

    th, td {
      border: 1px solid rgba(47, 72, 88, 0.12);
      padding: 8px;
      vertical-align: top;
      text-align: left;
    }

    .slot-label {
      white-space: nowrap;
      font-weight: 600;
      position: sticky;
      left: 0;
      background: white;
    }

    .cell.empty {
      background: rgba(47, 72, 88, 0.03);
    }

    .cell summary {
      cursor: pointer;
      display: grid;
      gap: 2px;
    }

    .code {
      font-weight: 600;
      color: var(--accent-2);
    }

    .location {
      font-size: 0.8rem;
      color: #8b857d;
    }

    .detail {
      margin-top: 8px;
      display: grid;
      gap: 6px;
    }

    .info {
      margin: 0;
      padding-left: 18px;
      font-size: 0.85rem;
    }

    .badge, .status {
      border-radius: 999px;
      padding: 2px 10px;
      font-size: 0.8rem;
      font-weight: 600;
      color: white;
    }

    .healthy, .present { background: var(--healthy); }
    .warning, .postponed { background: var(--warning); }
    .critical, .absent { background: var(--critical); }
    .cancelled { background: #7a746d; }

    .buttons {
      display: flex;
      flex-wrap: wrap;
      gap: 4px;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 6px 10px;
      color: white;
      cursor: pointer;
    }

    .course summary {
      cursor: pointer;
      display: flex;
      justify-content: space-between;
      padding: 12px 0;
      font-weight: 600;
    }

    .link {
      color: var(--accent);
      font-weight: 600;
    }
  </style>
</head>
<body>
  <main class="app">
    {{BODY}}
  </main>
</body>
</html>
"#;
