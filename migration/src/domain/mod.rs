use lectern_common::{
    COMPLETED_AT_FIELD_NAME, COMPLETED_FIELD_NAME, CONTENT_FIELD_NAME, COURSE_ID_FIELD_NAME,
    COURSES_TABLE, CREATED_FIELD_NAME, DESCRIPTION_FIELD_NAME, ENROLLED_AT_FIELD_NAME,
    ENROLLMENTS_TABLE, ID_FIELD_NAME, INSTRUCTOR_ID_FIELD_NAME, IS_FREE_FIELD_NAME,
    IS_PREVIEW_FIELD_NAME, LAST_WATCHED_AT_FIELD_NAME, LESSON_ID_FIELD_NAME, LESSON_PROGRESS_TABLE,
    LESSONS_TABLE, LEVEL_FIELD_NAME, ORDER_INDEX_FIELD_NAME, PRICE_FIELD_NAME, PROGRESS_FIELD_NAME,
    SECTION_ID_FIELD_NAME, SECTIONS_TABLE, SLUG_FIELD_NAME, STATUS_FIELD_NAME, THUMBNAIL_FIELD_NAME,
    TITLE_FIELD_NAME, UPDATED_FIELD_NAME, USER_ID_FIELD_NAME, VIDEO_DURATION_FIELD_NAME,
    VIDEO_URL_FIELD_NAME, WATCH_DURATION_FIELD_NAME,
};

use crate::domain::tables::{Column, ColumnType, ForeignKeyConstraint, Index, Table};

pub mod migration;
pub mod persistence;
pub mod tables;

/// Returns the tables of the course subsystem, sorted conform dependency order
/// (a table comes after every table it references).
pub fn course_tables() -> Vec<Table> {
    vec![
        courses_table(),
        sections_table(),
        lessons_table(),
        enrollments_table(),
        lesson_progress_table(),
    ]
}

struct TableBuilder {
    table_name: &'static str,
    has_timestamps: bool,
    columns: Vec<Column>,
    foreign_keys: Vec<ForeignKeyConstraint>,
    indexes: Vec<Index>,
}

impl TableBuilder {
    fn new(table_name: &'static str) -> Self {
        Self {
            table_name,
            has_timestamps: true,
            columns: vec![Column::primary_key(ID_FIELD_NAME, ColumnType::Uuid)],
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    fn without_timestamps(mut self) -> Self {
        self.has_timestamps = false;
        self
    }

    fn column(mut self, name: &str, column_type: ColumnType, default_value: Option<&str>) -> Self {
        self.columns
            .push(Column::new(name, column_type, true, default_value));
        self
    }

    fn nullable(mut self, name: &str, column_type: ColumnType) -> Self {
        self.columns.push(Column::new(name, column_type, false, None));
        self
    }

    /// Adds a not-null UUID column referencing `id` of the parent table, plus an index on it.
    fn owned_by(mut self, column_name: &'static str, parent_table: &'static str) -> Self {
        self.columns
            .push(Column::new(column_name, ColumnType::Uuid, true, None));
        self.foreign_keys.push(ForeignKeyConstraint::new(
            self.table_name,
            column_name,
            parent_table,
            ID_FIELD_NAME,
        ));
        self.indexes
            .push(Index::new(self.table_name, vec![column_name], false));
        self
    }

    fn unique(mut self, columns: Vec<&'static str>) -> Self {
        self.indexes.push(Index::new(self.table_name, columns, true));
        self
    }

    fn index(mut self, columns: Vec<&'static str>) -> Self {
        self.indexes.push(Index::new(self.table_name, columns, false));
        self
    }

    fn into(mut self) -> Table {
        if self.has_timestamps {
            self.columns.push(Column::new(
                CREATED_FIELD_NAME,
                ColumnType::TimestampTZ,
                true,
                Some("now()"),
            ));
            self.columns.push(Column::new(
                UPDATED_FIELD_NAME,
                ColumnType::TimestampTZ,
                true,
                Some("now()"),
            ));
        }

        Table::new(
            self.table_name.to_string(),
            self.columns,
            self.foreign_keys,
            self.indexes,
        )
    }
}

fn courses_table() -> Table {
    TableBuilder::new(COURSES_TABLE)
        .column(TITLE_FIELD_NAME, ColumnType::Text, None)
        .column(SLUG_FIELD_NAME, ColumnType::Text, None)
        .column(DESCRIPTION_FIELD_NAME, ColumnType::Text, Some("''"))
        .column(THUMBNAIL_FIELD_NAME, ColumnType::Text, Some("''"))
        .column(PRICE_FIELD_NAME, ColumnType::DoublePrecision, Some("0"))
        .column(IS_FREE_FIELD_NAME, ColumnType::Boolean, Some("false"))
        .column(LEVEL_FIELD_NAME, ColumnType::Varchar(16), Some("'beginner'"))
        .column(STATUS_FIELD_NAME, ColumnType::Varchar(16), Some("'draft'"))
        .column(INSTRUCTOR_ID_FIELD_NAME, ColumnType::Text, None)
        .unique(vec![SLUG_FIELD_NAME])
        .index(vec![STATUS_FIELD_NAME])
        .into()
}

fn sections_table() -> Table {
    TableBuilder::new(SECTIONS_TABLE)
        .owned_by(COURSE_ID_FIELD_NAME, COURSES_TABLE)
        .column(TITLE_FIELD_NAME, ColumnType::Text, None)
        .column(DESCRIPTION_FIELD_NAME, ColumnType::Text, Some("''"))
        .column(ORDER_INDEX_FIELD_NAME, ColumnType::Integer, Some("0"))
        .into()
}

fn lessons_table() -> Table {
    TableBuilder::new(LESSONS_TABLE)
        .owned_by(SECTION_ID_FIELD_NAME, SECTIONS_TABLE)
        .column(TITLE_FIELD_NAME, ColumnType::Text, None)
        .column(DESCRIPTION_FIELD_NAME, ColumnType::Text, Some("''"))
        .column(CONTENT_FIELD_NAME, ColumnType::Text, Some("''"))
        .column(VIDEO_URL_FIELD_NAME, ColumnType::Text, Some("''"))
        .column(VIDEO_DURATION_FIELD_NAME, ColumnType::Integer, Some("0"))
        .column(ORDER_INDEX_FIELD_NAME, ColumnType::Integer, Some("0"))
        .column(IS_PREVIEW_FIELD_NAME, ColumnType::Boolean, Some("false"))
        .into()
}

fn enrollments_table() -> Table {
    TableBuilder::new(ENROLLMENTS_TABLE)
        .without_timestamps()
        .column(USER_ID_FIELD_NAME, ColumnType::Text, None)
        .owned_by(COURSE_ID_FIELD_NAME, COURSES_TABLE)
        .column(ENROLLED_AT_FIELD_NAME, ColumnType::TimestampTZ, Some("now()"))
        .nullable(COMPLETED_AT_FIELD_NAME, ColumnType::TimestampTZ)
        .column(PROGRESS_FIELD_NAME, ColumnType::Integer, Some("0"))
        .unique(vec![USER_ID_FIELD_NAME, COURSE_ID_FIELD_NAME])
        .into()
}

fn lesson_progress_table() -> Table {
    TableBuilder::new(LESSON_PROGRESS_TABLE)
        .without_timestamps()
        .column(USER_ID_FIELD_NAME, ColumnType::Text, None)
        .owned_by(LESSON_ID_FIELD_NAME, LESSONS_TABLE)
        .column(COMPLETED_FIELD_NAME, ColumnType::Boolean, Some("false"))
        .nullable(COMPLETED_AT_FIELD_NAME, ColumnType::TimestampTZ)
        .column(WATCH_DURATION_FIELD_NAME, ColumnType::Integer, Some("0"))
        .nullable(LAST_WATCHED_AT_FIELD_NAME, ColumnType::TimestampTZ)
        .unique(vec![USER_ID_FIELD_NAME, LESSON_ID_FIELD_NAME])
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table<'a>(tables: &'a [Table], name: &str) -> &'a Table {
        tables.iter().find(|t| t.name == name).unwrap()
    }

    #[test]
    fn tables_follow_dependency_order() {
        let tables = course_tables();
        let position = |name: &str| tables.iter().position(|t| t.name == name).unwrap();

        for table in tables.iter() {
            for fk in table.foreign_keys.iter() {
                assert!(
                    position(&fk.referenced_table_name) < position(&table.name),
                    "{} must be created before {}",
                    fk.referenced_table_name,
                    table.name
                );
            }
        }
    }

    #[test]
    fn enrollment_is_unique_per_user_and_course() {
        let tables = course_tables();
        let enrollments = table(&tables, ENROLLMENTS_TABLE);

        assert!(enrollments.indexes.iter().any(|i| i.unique
            && i.columns == vec![USER_ID_FIELD_NAME.to_string(), COURSE_ID_FIELD_NAME.to_string()]));
    }

    #[test]
    fn lesson_progress_is_unique_per_user_and_lesson() {
        let tables = course_tables();
        let progress = table(&tables, LESSON_PROGRESS_TABLE);

        assert!(progress.indexes.iter().any(|i| i.unique
            && i.columns == vec![USER_ID_FIELD_NAME.to_string(), LESSON_ID_FIELD_NAME.to_string()]));
    }

    #[test]
    fn enrollment_columns_use_shared_field_names() {
        let tables = course_tables();
        let enrollments = table(&tables, ENROLLMENTS_TABLE);
        let names: Vec<&str> = enrollments.columns.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                ID_FIELD_NAME,
                USER_ID_FIELD_NAME,
                COURSE_ID_FIELD_NAME,
                ENROLLED_AT_FIELD_NAME,
                COMPLETED_AT_FIELD_NAME,
                PROGRESS_FIELD_NAME,
            ]
        );
    }

    #[test]
    fn children_reference_their_owner() {
        let tables = course_tables();
        let lessons = table(&tables, LESSONS_TABLE);

        assert_eq!(lessons.foreign_keys.len(), 1);
        assert_eq!(lessons.foreign_keys[0].column_name, SECTION_ID_FIELD_NAME);
        assert_eq!(lessons.foreign_keys[0].referenced_table_name, SECTIONS_TABLE);
    }
}
