pub const DEFAULT_DATABASE: &str = "(default)";

/// Fully qualified database identifier: a project id plus a logical database
/// name within that project.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DatabaseId {
    project_id: String,
    database: String,
}

impl DatabaseId {
    pub fn new(project_id: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: database.into(),
        }
    }

    /// Builds an identifier for the project's default database.
    pub fn default_database(project_id: impl Into<String>) -> Self {
        Self::new(project_id, DEFAULT_DATABASE)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}
