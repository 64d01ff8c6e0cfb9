//! Structural extraction of the hand-authored status page. The page is
//! small, templated and stable, so pattern matching beats pulling in a full
//! HTML tree parser; everything downstream only sees `StatusSnapshot`, so a
//! real parser could be substituted here without contract changes.

use crate::model::{BoxRecord, RowLayout, StatusSnapshot, SwitchTarget};
use regex::Regex;
use std::sync::LazyLock;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>(.*?)</title>").expect("title pattern"));
static THEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<thead>\s*<tr>(.*?)</tr>\s*</thead>").expect("thead pattern"));
static TH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<th>(.*?)</th>").expect("th pattern"));
static BUTTON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"">(.*?)</button>"#).expect("button pattern"));
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"location\.href='(.*?)'").expect("href pattern"));
static TBODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<tbody>(.*?)</tbody>").expect("tbody pattern"));
static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<tr>(.*?)</tr>").expect("row pattern"));
static CLASS_CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<td\s*class="(.*?)">(.*?)</td>"#).expect("class cell pattern"));
static PLAIN_CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<td>(.*?)</td>").expect("plain cell pattern"));

/// Parses one fetched status page. Never fails: a page missing `<title>`,
/// `<thead>` or `<tbody>` yields an empty-but-valid snapshot, which lets
/// callers tell "server unreachable" from "server reachable but page empty".
pub fn parse_status_page(html: &str) -> StatusSnapshot {
    let mut snapshot = StatusSnapshot {
        title: TITLE_RE
            .captures(html)
            .map(|c| c[1].to_string())
            .unwrap_or_default(),
        headline: parse_headline(html),
        switch_targets: parse_switch_targets(html),
        boxes: Vec::new(),
    };
    let Some(body) = TBODY_RE.captures(html) else {
        return snapshot;
    };
    for row in ROW_RE.captures_iter(&body[1]) {
        if let Some(record) = parse_row(&row[1]) {
            snapshot.insert(record);
        }
    }
    snapshot
}

fn parse_headline(html: &str) -> String {
    let Some(head) = THEAD_RE.captures(html) else {
        return String::new();
    };
    let cells: Vec<&str> = TH_RE
        .captures_iter(&head[1])
        .map(|c| c.get(1).map_or("", |m| m.as_str()))
        .collect();
    cells.join(", ")
}

/// Platform-switch buttons: labels and `location.href` targets zipped by
/// document position. Mismatched lengths are clamped to the shorter list.
fn parse_switch_targets(html: &str) -> Vec<SwitchTarget> {
    let names: Vec<&str> = BUTTON_RE
        .captures_iter(html)
        .map(|c| c.get(1).map_or("", |m| m.as_str()))
        .collect();
    let urls: Vec<&str> = HREF_RE
        .captures_iter(html)
        .map(|c| c.get(1).map_or("", |m| m.as_str()))
        .collect();
    if names.len() != urls.len() {
        tracing::warn!(
            "switch control mismatch: {} labels vs {} targets, clamping",
            names.len(),
            urls.len()
        );
    }
    names
        .into_iter()
        .zip(urls)
        .map(|(name, url)| SwitchTarget {
            name: name.to_string(),
            url: url.to_string(),
        })
        .collect()
}

fn parse_row(row: &str) -> Option<BoxRecord> {
    let class_cells: Vec<(String, String)> = CLASS_CELL_RE
        .captures_iter(row)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect();
    let Some(layout) = RowLayout::detect(class_cells.len()) else {
        tracing::warn!("skipping row without class-tagged cells");
        return None;
    };
    let plain: Vec<String> = PLAIN_CELL_RE
        .captures_iter(row)
        .map(|c| c[1].to_string())
        .collect();
    let cell = |i: usize| plain.get(i).cloned().unwrap_or_default();

    let mut record = match layout {
        RowLayout::Current => BoxRecord {
            ordinal: class_cells[0].1.clone(),
            name_class: class_cells[1].0.clone(),
            name: class_cells[1].1.clone(),
            oem_name_class: class_cells[2].0.clone(),
            oem_name: class_cells[2].1.clone(),
            status_class: class_cells[3].0.clone(),
            status: class_cells[3].1.clone(),
            ..BoxRecord::default()
        },
        RowLayout::Legacy => BoxRecord {
            name_class: class_cells[0].0.clone(),
            name: class_cells[0].1.clone(),
            status_class: class_cells[1].0.clone(),
            status: class_cells[1].1.clone(),
            ..BoxRecord::default()
        },
    };
    record.start_build = cell(0);
    record.start_feed_sync = cell(1);
    record.end_build = cell(2);
    record.sync_time = cell(3);
    record.build_time = cell(4);
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html>
<head>
<title>Buildserver Status</title>
</head>
<body>
<button type="button" onclick="location.href='http://farm.example/arm-a'" class="sw">ARM box A</button>
<button type="button" onclick="location.href='http://farm.example/mips'" class="sw">MIPS box</button>
<table>
  <thead>
    <tr>
      <th>No</th><th>Boxname</th><th>OEM Name</th><th>Build Status</th><th>Start Build</th><th>Start FeedSync</th><th>End Build</th><th>Sync Time</th><th>Build Time</th>
    </tr>
  </thead>
  <tbody>
    <tr>
      <td class="no">1</td>
      <td class="box">alpha</td>
      <td class="oem">VendorA</td>
      <td class="ok">Complete</td>
      <td>2024/05/01 10:00</td>
      <td>2024/05/01 09:50</td>
      <td>2024/05/01 11:00</td>
      <td>00:10:00</td>
      <td>01:00:00</td>
    </tr>
    <tr>
      <td class="no">2</td>
      <td class="box">beta</td>
      <td class="oem">VendorB</td>
      <td class="build">Building</td>
      <td>2024/05/01 11:00</td>
      <td>2024/05/01 10:55</td>
      <td>---</td>
      <td>00:05:00</td>
      <td>02:00:00</td>
    </tr>
  </tbody>
</table>
</body>
</html>"#;

    #[test]
    fn extracts_title_and_headline() {
        let snap = parse_status_page(PAGE);
        assert_eq!(snap.title, "Buildserver Status");
        assert!(snap.headline.starts_with("No, Boxname, OEM Name"));
        assert_eq!(snap.headline.split(", ").count(), 9);
    }

    #[test]
    fn extracts_switch_targets_in_document_order() {
        let snap = parse_status_page(PAGE);
        assert_eq!(snap.switch_targets.len(), 2);
        assert_eq!(snap.switch_targets[0].name, "ARM box A");
        assert_eq!(snap.switch_targets[0].url, "http://farm.example/arm-a");
        assert_eq!(snap.switch_targets[1].name, "MIPS box");
    }

    #[test]
    fn extracts_current_layout_rows() {
        let snap = parse_status_page(PAGE);
        assert_eq!(snap.box_count(), 2);
        let alpha = snap.get("alpha").unwrap();
        assert_eq!(alpha.ordinal, "1");
        assert_eq!(alpha.oem_name, "VendorA");
        assert_eq!(alpha.oem_name_class, "oem");
        assert_eq!(alpha.status, "Complete");
        assert_eq!(alpha.status_class, "ok");
        assert_eq!(alpha.start_build, "2024/05/01 10:00");
        assert_eq!(alpha.start_feed_sync, "2024/05/01 09:50");
        assert_eq!(alpha.end_build, "2024/05/01 11:00");
        assert_eq!(alpha.sync_time, "00:10:00");
        assert_eq!(alpha.build_time, "01:00:00");
        let beta = snap.get("beta").unwrap();
        assert!(beta.is_building());
        assert_eq!(beta.end_build, "---");
    }

    #[test]
    fn legacy_two_class_cell_rows_map_name_and_status() {
        let html = r#"<tbody>
            <tr>
              <td class="box">gamma</td>
              <td class="wait">Waiting</td>
              <td>t1</td>
              <td>t2</td>
              <td>t3</td>
              <td>00:01:00</td>
              <td>03:00:00</td>
            </tr>
        </tbody>"#;
        let snap = parse_status_page(html);
        let gamma = snap.get("gamma").unwrap();
        assert_eq!(gamma.status, "Waiting");
        assert_eq!(gamma.ordinal, "");
        assert_eq!(gamma.oem_name, "");
        assert_eq!(gamma.build_time, "03:00:00");
    }

    #[test]
    fn row_with_too_few_class_cells_is_skipped() {
        let html = r#"<tbody>
            <tr><td class="box">lonely</td><td>x</td></tr>
        </tbody>"#;
        let snap = parse_status_page(html);
        assert!(snap.is_empty());
    }

    #[test]
    fn missing_plain_cells_default_to_empty() {
        let html = r#"<tbody>
            <tr>
              <td class="box">gamma</td>
              <td class="wait">Waiting</td>
              <td>only-one</td>
            </tr>
        </tbody>"#;
        let snap = parse_status_page(html);
        let gamma = snap.get("gamma").unwrap();
        assert_eq!(gamma.start_build, "only-one");
        assert_eq!(gamma.build_time, "");
    }

    #[test]
    fn missing_tbody_yields_empty_snapshot() {
        let snap = parse_status_page("<html><title>t</title></html>");
        assert_eq!(snap.title, "t");
        assert!(snap.is_empty());
    }

    #[test]
    fn missing_everything_yields_default_snapshot() {
        let snap = parse_status_page("hello");
        assert_eq!(snap.title, "");
        assert_eq!(snap.headline, "");
        assert!(snap.switch_targets.is_empty());
        assert!(snap.is_empty());
    }

    #[test]
    fn mismatched_switch_lists_clamp_to_shorter() {
        let html = r#"
            <button onclick="location.href='http://farm.example/a'" class="sw">A</button>
            <button class="sw">B</button>
        "#;
        let snap = parse_status_page(html);
        assert_eq!(snap.switch_targets.len(), 1);
        assert_eq!(snap.switch_targets[0].name, "A");
    }

    #[test]
    fn duplicate_box_name_last_row_wins() {
        let html = r#"<tbody>
            <tr><td class="box">dup</td><td class="s">Waiting</td><td>a</td><td>b</td><td>c</td><td>d</td><td>01:00:00</td></tr>
            <tr><td class="box">dup</td><td class="s">Failed</td><td>a</td><td>b</td><td>c</td><td>d</td><td>02:00:00</td></tr>
        </tbody>"#;
        let snap = parse_status_page(html);
        assert_eq!(snap.box_count(), 1);
        assert_eq!(snap.get("dup").unwrap().status, "Failed");
        assert_eq!(snap.get("dup").unwrap().build_time, "02:00:00");
    }

    #[test]
    fn parsing_is_idempotent() {
        assert_eq!(parse_status_page(PAGE), parse_status_page(PAGE));
    }
}
