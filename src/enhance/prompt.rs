//! Prompt construction for task enhancement.
//!
//! Pure function of its inputs: renders the task name, recent-task and
//! recent-context summaries, existing categories, the scoring rubrics, and the
//! literal JSON schema the model's reply must conform to.

use std::fmt::Write;

use super::types::{CategorySnapshot, RecentContext, RecentTask};

const MAX_RECENT_TASKS: usize = 10;
const MAX_RECENT_CONTEXT: usize = 10;
const MAX_CATEGORIES: usize = 15;
const TASK_DESCRIPTION_PREVIEW: usize = 100;
const CONTEXT_PREVIEW: usize = 150;

/// Build the single instruction string sent to the completion endpoint.
pub fn build_enhancement_prompt(
    task_name: &str,
    recent_tasks: &[RecentTask],
    recent_context: &[RecentContext],
    existing_categories: &[CategorySnapshot],
) -> String {
    let mut prompt = String::with_capacity(2048);

    let _ = write!(
        prompt,
        "You are a smart task-management assistant. A user has entered a new task: \"{}\"\n\n\
         Do not modify the task name in any way - use it verbatim as the \"title\" in your output.\n\n\
         Based on the user's recent tasks and context, enrich this task with detailed information.\n",
        task_name
    );

    prompt.push_str("\nRECENT TASKS (last 10):\n");
    prompt.push_str(&format_recent_tasks(recent_tasks));

    prompt.push_str("\nRECENT CONTEXT (last 24 hours):\n");
    prompt.push_str(&format_recent_context(recent_context));

    prompt.push_str("\nEXISTING CATEGORIES (with colors):\n");
    prompt.push_str(&format_categories(existing_categories));

    prompt.push_str(
        "\nPRIORITY SCORING:\n\
         - 0.0-0.3: Low priority (routine, non-urgent)\n\
         - 0.3-0.7: Medium priority (important, moderate urgency)\n\
         - 0.7-1.0: High priority (urgent, critical)\n",
    );

    prompt.push_str(
        "\nDEADLINE (integer days from now):\n\
         - 1: must happen today or is urgent\n\
         - 2: very soon, by tomorrow\n\
         - 3-5: this week\n\
         - 7-10: next week\n\
         - 14-30: longer term, within the month\n",
    );

    let _ = write!(
        prompt,
        "\nAnalyze the task \"{}\" and respond with valid JSON only, following this schema:\n\n\
         {{\n\
         \x20 \"title\": \"<the task name, verbatim>\",\n\
         \x20 \"descriptions\": \"<2-3 sentence detailed plan, goal-driven approach>\",\n\
         \x20 \"category\": {{\"name\": \"<existing or new category>\", \"color\": \"<existing category color, or a new #RRGGBB if the category does not exist>\"}},\n\
         \x20 \"priority_score\": <0.0-1.0>,\n\
         \x20 \"deadline\": <integer 1-30, days from now>,\n\
         \x20 \"confidence\": <0.0-1.0>,\n\
         \x20 \"reasoning\": \"<briefly explain the category choice and the priority/deadline decision>\"\n\
         }}\n\n\
         Output ONLY valid JSON - no markdown fences, no explanatory text.\n",
        task_name
    );

    prompt
}

fn format_recent_tasks(recent_tasks: &[RecentTask]) -> String {
    if recent_tasks.is_empty() {
        return "No recent tasks available (new user)\n".to_string();
    }
    let mut out = String::new();
    for task in recent_tasks.iter().take(MAX_RECENT_TASKS) {
        let _ = writeln!(
            out,
            "- {}: {}... (Category: {} [{}], Priority: {:.2})",
            task.title,
            preview(&task.description, TASK_DESCRIPTION_PREVIEW),
            task.category_name,
            task.category_color,
            task.priority_score,
        );
    }
    out
}

fn format_recent_context(recent_context: &[RecentContext]) -> String {
    if recent_context.is_empty() {
        return "No recent context available\n".to_string();
    }
    let mut out = String::new();
    for entry in recent_context.iter().take(MAX_RECENT_CONTEXT) {
        let _ = writeln!(
            out,
            "- [{}]: {}...",
            entry.source_type,
            preview(&entry.content, CONTEXT_PREVIEW),
        );
    }
    out
}

fn format_categories(existing_categories: &[CategorySnapshot]) -> String {
    if existing_categories.is_empty() {
        return "No existing categories\n".to_string();
    }
    let mut out = String::new();
    for category in existing_categories.iter().take(MAX_CATEGORIES) {
        let _ = writeln!(
            out,
            "- {} [{}] (Used {} times)",
            category.name, category.color, category.usage_frequency,
        );
    }
    out
}

/// Char-boundary-safe truncation for prompt previews.
fn preview(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
