//! Queue position and time-to-build estimation over one snapshot. The walk
//! mirrors the established queue contract: counting starts from whichever
//! box is building right now, regardless of its position in page order.

use crate::model::{EvaluationResult, StatusSnapshot, TargetResult};
use chrono::TimeDelta;

/// First box in page order whose status label says it is building. The
/// server keeps at most one per platform; `None` means the farm is idle or
/// paused.
pub fn find_building_box(snapshot: &StatusSnapshot) -> Option<&str> {
    snapshot
        .boxes
        .iter()
        .find(|b| b.is_building())
        .map(|b| b.name.as_str())
}

/// Parses a server-rendered elapsed time: bare `HH:MM:SS`, or with a day
/// prefix such as `-1 day, 23:59:24` where only the clock part counts.
/// Fewer than three colon-delimited components, or anything non-numeric,
/// coerces to zero rather than failing.
pub fn parse_build_time(raw: &str) -> TimeDelta {
    let clock = match raw.split_once(',') {
        Some((_, rest)) => rest.trim(),
        None => raw.trim(),
    };
    let mut parts = clock.split(':');
    let (Some(h), Some(m), Some(s)) = (parts.next(), parts.next(), parts.next()) else {
        return TimeDelta::zero();
    };
    match (h.parse::<i64>(), m.parse::<i64>(), s.parse::<i64>()) {
        (Ok(h), Ok(m), Ok(s)) => {
            TimeDelta::hours(h) + TimeDelta::minutes(m) + TimeDelta::seconds(s)
        }
        _ => TimeDelta::zero(),
    }
}

/// Single linear pass over the boxes in page order.
///
/// The collect flag starts true and resets (with the accumulator) when the
/// currently building box is first encountered; while collecting, each box's
/// last build duration feeds the wait estimate. Reaching the target stops
/// collection. Every box except the one building contributes to the
/// full-cycle sum. The returned ahead count excludes the target itself.
pub fn evaluate(snapshot: &StatusSnapshot, target: Option<&str>) -> EvaluationResult {
    let building = find_building_box(snapshot);
    let mut next_build = TimeDelta::zero();
    let mut cycle_time = TimeDelta::zero();
    let mut boxes_ahead: i64 = 0;
    let mut failed_count = 0usize;
    let mut collect = true;
    let mut found = false;

    for record in &snapshot.boxes {
        let duration = parse_build_time(&record.build_time);
        if Some(record.name.as_str()) == building {
            collect = true;
            if !found {
                next_build = TimeDelta::zero();
                boxes_ahead = 0;
            }
        } else {
            cycle_time += duration;
        }
        if collect {
            next_build += duration;
            boxes_ahead += 1;
        }
        if Some(record.name.as_str()) == target {
            found = true;
            collect = false;
        }
        if record.is_failed() {
            failed_count += 1;
        }
    }

    let box_count = snapshot.box_count();
    if target.is_some() && !found {
        return EvaluationResult {
            next_build: TimeDelta::zero(),
            boxes_ahead: 0,
            cycle_time,
            box_count,
            failed_count,
            target: TargetResult::Missing,
        };
    }
    EvaluationResult {
        next_build,
        boxes_ahead: boxes_ahead - 1,
        cycle_time,
        box_count,
        failed_count,
        target: if target.is_some() {
            TargetResult::Found
        } else {
            TargetResult::None
        },
    }
}

/// Formats an elapsed time as zero-padded `HH:MM:SS` with unbounded hours,
/// so a two-day span renders as e.g. `49:00:00`. Truncates to whole seconds.
pub fn format_delta(delta: TimeDelta) -> String {
    let total = delta.num_seconds().max(0);
    let (hours, rest) = (total / 3600, total % 3600);
    format!("{hours:02}:{:02}:{:02}", rest / 60, rest % 60)
}
