use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions};
use jiff::{
    SignedDuration, Timestamp, Zoned,
    civil::{Date, DateTime},
    tz::TimeZone,
};

use crate::models::{
    collection::TaskCollection,
    selection::{Filter, Sort, ViewSelection},
    task::Task,
};

/// Deadlines closer than this are flagged as due soon
pub const DUE_SOON_WINDOW: SignedDuration = SignedDuration::from_hours(24);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Overdue,
    DueSoon,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    pub completed: usize,
    pub total: usize,
}

/// One displayed task, remembering where it lives in the collection
#[derive(Debug, Clone, Copy)]
pub struct TaskRow<'a> {
    pub index: usize,
    pub task: &'a Task,
    pub urgency: Urgency,
}

#[derive(Debug, Clone)]
pub struct TaskView<'a> {
    pub selection: ViewSelection,
    pub rows: Vec<TaskRow<'a>>,
    pub statistics: Statistics,
}

pub fn build_view<'a>(
    collection: &'a TaskCollection,
    selection: ViewSelection,
    now: &Zoned,
) -> TaskView<'a> {
    let mut visible = filter_tasks(collection.tasks(), selection.filter);
    sort_tasks(&mut visible, selection.sort);

    let rows = visible
        .into_iter()
        .map(|(index, task)| TaskRow {
            index,
            task,
            urgency: classify_urgency(task.deadline.as_deref(), now),
        })
        .collect();

    TaskView {
        selection,
        rows,
        statistics: statistics(collection),
    }
}

/// Keeps the tasks matching `filter`, paired with their collection index
pub fn filter_tasks(tasks: &[Task], filter: Filter) -> Vec<(usize, &Task)> {
    tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| match filter {
            Filter::All => true,
            Filter::Completed => task.completed,
            Filter::NotCompleted => !task.completed,
        })
        .collect()
}

/// Stable in-place sort of an already filtered list
pub fn sort_tasks(tasks: &mut [(usize, &Task)], sort: Sort) {
    match sort {
        Sort::Default => {}
        Sort::Alphabetical => {
            let collator = text_collator();
            tasks.sort_by(|(_, a), (_, b)| locale_compare(collator.as_ref(), &a.text, &b.text));
        }
        Sort::Completed => tasks.sort_by_key(|(_, task)| task.completed),
    }
}

/// Root-locale collator at tertiary strength: accents and case only break ties
pub fn text_collator() -> Option<Collator> {
    Collator::try_new(&Default::default(), CollatorOptions::new())
        .map_err(|e| tracing::warn!("Falling back to caseless ordering: {:?}", e))
        .ok()
}

pub fn locale_compare(collator: Option<&Collator>, a: &str, b: &str) -> Ordering {
    match collator {
        Some(collator) => collator.compare(a, b).then_with(|| a.cmp(b)),
        None => caseless_compare(a, b),
    }
}

/// Lowercased comparison, lowercase first on ties. Only used when no
/// collator could be built.
fn caseless_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    folded
        .then_with(|| {
            a.chars()
                .map(|c| c.is_uppercase())
                .cmp(b.chars().map(|c| c.is_uppercase()))
        })
        .then_with(|| a.cmp(b))
}

pub fn statistics(collection: &TaskCollection) -> Statistics {
    Statistics {
        completed: collection.completed_count(),
        total: collection.len(),
    }
}

pub fn classify_urgency(deadline: Option<&str>, now: &Zoned) -> Urgency {
    let Some(deadline) = deadline.and_then(|raw| parse_deadline(raw, now.time_zone())) else {
        return Urgency::Normal;
    };

    let now = now.timestamp();
    if deadline < now {
        Urgency::Overdue
    } else if now.duration_until(deadline) < DUE_SOON_WINDOW {
        Urgency::DueSoon
    } else {
        Urgency::Normal
    }
}

/// Civil datetimes are read in the caller's time zone; bare dates as UTC midnight.
fn parse_deadline(raw: &str, tz: &TimeZone) -> Option<Timestamp> {
    let raw = raw.trim();
    if !raw.contains(['T', 't', ' ']) {
        return raw
            .parse::<Date>()
            .ok()
            .and_then(|date| date.to_zoned(TimeZone::UTC).ok())
            .map(|z| z.timestamp());
    }
    if let Ok(zoned) = raw.parse::<Zoned>() {
        return Some(zoned.timestamp());
    }
    if let Ok(timestamp) = raw.parse::<Timestamp>() {
        return Some(timestamp);
    }
    raw.parse::<DateTime>()
        .ok()
        .and_then(|datetime| datetime.to_zoned(tz.clone()).ok())
        .map(|z| z.timestamp())
}
