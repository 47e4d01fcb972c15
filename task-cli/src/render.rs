use crate::task::Task;
use chrono::SecondsFormat;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status.to_string(),
            created: task.created.to_rfc3339_opts(SecondsFormat::Secs, true),
            updated: task
                .updated
                .map(|updated| updated.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
        }
    }
}

pub(crate) fn table<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> String {
    Table::new(tasks.into_iter().map(TaskRow::from)).to_string()
}
