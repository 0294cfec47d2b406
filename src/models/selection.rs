use std::fmt;

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Filter {
    #[default]
    All,
    Completed,
    #[value(alias = "notCompleted")]
    NotCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Sort {
    #[default]
    Default,
    Alphabetical,
    Completed,
}

/// Filter and sort picked for the current session. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewSelection {
    pub filter: Filter,
    pub sort: Sort,
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Filter::All => "All",
            Filter::Completed => "Completed",
            Filter::NotCompleted => "Not Completed",
        };
        f.write_str(label)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Sort::Default => "Default",
            Sort::Alphabetical => "Alphabetical",
            Sort::Completed => "Completed",
        };
        f.write_str(label)
    }
}
