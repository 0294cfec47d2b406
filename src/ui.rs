use colored::*;

use crate::{
    models::session::{EditSession, Notification},
    services::view::{Statistics, TaskRow, TaskView, Urgency},
};

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Checkbox glyph for a task
pub fn get_status_glyph(completed: bool) -> ColoredString {
    if completed {
        "[x]".dimmed()
    } else {
        "[ ]".green()
    }
}

/// Apply urgency color and completion styling to a task's text
pub fn style_task_text(text: &str, urgency: Urgency, completed: bool) -> ColoredString {
    let colored = match urgency {
        Urgency::Overdue => text.red(),
        Urgency::DueSoon => text.yellow(),
        Urgency::Normal => text.normal(),
    };

    if completed {
        colored.strikethrough()
    } else {
        colored.bold()
    }
}

/// Render a single task row with number, checkbox, text and right-aligned deadline
pub fn render_task_line(row: &TaskRow) {
    let terminal_width = get_terminal_width();

    let number = format!("{:>3}", format!("#{}", row.index + 1));
    let glyph = get_status_glyph(row.task.completed);
    let text = style_task_text(&row.task.text, row.urgency, row.task.completed);
    let left = format!("  {}  {}  {}", number.dimmed(), glyph, text);

    let Some(deadline) = row.task.deadline.as_deref() else {
        println!("{}", left);
        return;
    };

    let left_visible_len = format!("  {}  [ ]  {}", number, row.task.text)
        .chars()
        .count();
    let right_visible_len = deadline.chars().count();
    let total_content = left_visible_len + right_visible_len;

    let deadline = match row.urgency {
        Urgency::Overdue => deadline.red(),
        Urgency::DueSoon => deadline.yellow(),
        Urgency::Normal => deadline.dimmed(),
    };

    if total_content + 4 < terminal_width {
        let padding = terminal_width - total_content - 2;
        println!("{}{}{}", left, " ".repeat(padding), deadline);
    } else {
        // Not enough space for right alignment, put the deadline underneath
        println!("{}", left);
        println!("          {}", deadline);
    }
}

/// Render a view header with the active filter and sort
pub fn render_view_header(view: &TaskView) {
    let count = view.rows.len();
    let task_word = if count == 1 { "task" } else { "tasks" };
    println!(
        "\n  {} ({} {})  {}\n",
        "To-Do List".cyan().bold(),
        count,
        task_word,
        format!(
            "filter: {} · sort: {}",
            view.selection.filter, view.selection.sort
        )
        .dimmed()
    );
}

pub fn render_view(view: &TaskView) {
    render_view_header(view);

    if view.rows.is_empty() {
        println!("  {}", "No tasks".dimmed());
    } else {
        for row in &view.rows {
            render_task_line(row);
        }
    }

    println!();
    render_statistics(&view.statistics);
}

pub fn render_statistics(statistics: &Statistics) {
    println!(
        "  Completed tasks: {}/{}",
        statistics.completed, statistics.total
    );
}

/// Render the input form: staged text, staged deadline and the primary action
pub fn render_form(session: &EditSession) {
    let text = if session.text.is_empty() {
        "(empty)".dimmed()
    } else {
        session.text.normal()
    };
    let deadline = session
        .deadline
        .as_deref()
        .map(|d| d.normal())
        .unwrap_or_else(|| "(none)".dimmed());

    println!(
        "\n  {}  text: {}  deadline: {}",
        format!("[{}]", session.primary_action_label()).blue().bold(),
        text,
        deadline
    );
}

/// Render the notification banner
pub fn render_notification(notification: &Notification) {
    println!("\n  {} {}", "✓".green(), notification.kind.to_string().green());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_task_text_is_struck_through() {
        let styled = style_task_text("Buy milk", Urgency::Normal, true);

        assert!(styled.style.contains(Styles::Strikethrough));
        assert!(!styled.style.contains(Styles::Bold));
    }

    #[test]
    fn test_open_task_text_is_bold() {
        let styled = style_task_text("Buy milk", Urgency::Normal, false);

        assert!(styled.style.contains(Styles::Bold));
        assert!(!styled.style.contains(Styles::Strikethrough));
    }

    #[test]
    fn test_urgency_sets_text_color() {
        assert_eq!(
            style_task_text("late", Urgency::Overdue, false).fgcolor,
            Some(Color::Red)
        );
        assert_eq!(
            style_task_text("soon", Urgency::DueSoon, true).fgcolor,
            Some(Color::Yellow)
        );
        assert_eq!(style_task_text("later", Urgency::Normal, false).fgcolor, None);
    }
}
