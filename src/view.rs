//! Terminal rendering of the custody calendar.
//!
//! A month grid shows one marker per day, chosen by the engine's
//! display tie-break: the parent letter for custody days, the kind
//! initial for holidays, travel and activities, `·` for unassigned
//! days.

use chrono::{Datelike, NaiveDate};
use coparent_core::{events_on_day, resolve_day, DateRange, Event, EventKind, Parent};

/// Render a month grid (weeks run Sunday..Saturday).
pub fn render_month(year: i32, month: u32, events: &[Event]) -> anyhow::Result<String> {
    let window = DateRange::month(year, month)?;

    let mut out = String::new();
    out.push_str(&format!("{:^28}\n", window.from.format("%B %Y")));
    out.push_str(" Su  Mo  Tu  We  Th  Fr  Sa\n");

    // Leading blanks up to the month's first weekday.
    let lead = window.from.weekday().num_days_from_sunday() as usize;
    let mut col = lead;
    out.push_str(&"    ".repeat(lead));

    for day in window.days() {
        out.push_str(&format!("{:>2}{} ", day.day(), day_marker(day, events)));
        col += 1;
        if col == 7 {
            out.push('\n');
            col = 0;
        }
    }
    if col != 0 {
        out.push('\n');
    }

    out.push_str("\n A/B custody · H holiday · T travel · V activity\n");
    Ok(out)
}

fn day_marker(day: NaiveDate, events: &[Event]) -> char {
    match resolve_day(day, events) {
        None => '·',
        Some(event) if event.kind == EventKind::Custody => match event.parent {
            Parent::A => 'A',
            Parent::B => 'B',
        },
        Some(event) => event.kind.marker(),
    }
}

/// Agenda listing: one line per (day, event) occupancy pair in the
/// window, every matching event included (nothing lost to the
/// per-cell tie-break).
pub fn render_agenda(window: &DateRange, events: &[Event]) -> String {
    let mut out = String::new();

    for day in window.days() {
        for event in events_on_day(day, events) {
            out.push_str(&format!(
                "{}  #{:<3} {}  {:<8} {}\n",
                day.format("%Y-%m-%d"),
                event.id,
                event.parent,
                format!("{:?}", event.kind).to_lowercase(),
                event.title,
            ));
        }
    }

    if out.is_empty() {
        out.push_str("No events in this window.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use coparent_core::{EventDraft, Parent, Recurrence};

    fn event(id: u64, title: &str, start: &str, kind: EventKind, parent: Parent) -> Event {
        EventDraft {
            title: title.to_string(),
            description: None,
            location: None,
            child_id: None,
            parent,
            kind,
            start_date: start.parse().unwrap(),
            end_date: None,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            time_zone: coparent_core::event::DEFAULT_TIME_ZONE.to_string(),
            recurrence: Recurrence::None,
            recurrence_interval: 1,
            recurrence_end: None,
            recurrence_days: vec![],
        }
        .validated()
        .unwrap()
        .into_event(id, chrono::Utc::now())
    }

    #[test]
    fn month_grid_marks_resolved_days() {
        let events = vec![
            event(1, "Week with A", "2025-04-07", EventKind::Custody, Parent::A),
            event(2, "Easter", "2025-04-20", EventKind::Holiday, Parent::B),
        ];
        let grid = render_month(2025, 4, &events).unwrap();

        assert!(grid.contains("April 2025"));
        assert!(grid.contains(" 7A"));
        assert!(grid.contains("20H"));
        // An untouched day renders as unassigned, not as an error.
        assert!(grid.contains(" 1· "));
    }

    #[test]
    fn agenda_lists_every_event_on_a_shared_day() {
        let events = vec![
            event(1, "Custody", "2025-06-01", EventKind::Custody, Parent::A),
            event(2, "Parade", "2025-06-01", EventKind::Holiday, Parent::A),
        ];
        let window = DateRange::single("2025-06-01".parse().unwrap());
        let agenda = render_agenda(&window, &events);

        assert!(agenda.contains("Custody"));
        assert!(agenda.contains("Parade"));
    }

    #[test]
    fn empty_window_says_so() {
        let window = DateRange::single("2025-06-01".parse().unwrap());
        assert_eq!(render_agenda(&window, &[]), "No events in this window.\n");
    }
}
