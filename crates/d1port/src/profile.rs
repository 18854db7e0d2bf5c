//! Compiled-in configuration for the training platform's D1 database.
//!
//! The tables are declared in emission order; the builder checks that
//! order against the foreign keys below.

use crate::config::{MigrationConfig, MigrationConfigBuilder, TableSpec};
use crate::transform::ValueRule;

/// Removes the placeholder admin the fresh schema is seeded with.
pub const SEED_ADMIN_CLEANUP: &str = "DELETE FROM users WHERE id = 1;";

/// Legacy question types and their replacements.
pub const QUESTION_TYPES: &[(&str, &str)] = &[
    ("multiple_response", "multi_select"),
    ("hotspot", "multiple_choice"),
    ("odd_one_out", "multiple_choice"),
    ("ranking", "ordering"),
];

/// Returns a builder preloaded with the 23-table legacy schema.
///
/// Policies keep their defaults; callers override them before `build()`.
#[must_use]
pub fn legacy_d1() -> MigrationConfigBuilder {
    tables()
        .into_iter()
        .fold(MigrationConfig::builder(), MigrationConfigBuilder::table)
        .rule("users", ValueRule::locale("language_preference"))
        .rule("questions", ValueRule::lookup("question_type", QUESTION_TYPES))
}

#[allow(clippy::too_many_lines)]
fn tables() -> Vec<TableSpec> {
    vec![
        TableSpec::new("achievements")
            .columns(&["id", "code", "title", "description", "icon", "points"]),
        TableSpec::new("users")
            .rename("preferred_language", "language_preference")
            .references("boss_id", "users")
            .columns(&[
                "id",
                "email",
                "password_hash",
                "name",
                "role",
                "boss_id",
                "active",
                "created_at",
                "last_login",
                "language_preference",
                "division",
                "region",
                "location",
                "title",
            ]),
        TableSpec::new("user_achievements")
            .references("user_id", "users")
            .references("achievement_id", "achievements")
            .columns(&["id", "user_id", "achievement_id", "earned_at"]),
        TableSpec::new("levels").columns(&[
            "id",
            "title",
            "description",
            "order_index",
            "is_boss_level",
            "active",
            "created_at",
        ]),
        TableSpec::new("training_materials")
            .references("level_id", "levels")
            .columns(&[
                "id",
                "level_id",
                "title",
                "description",
                "material_type",
                "sharepoint_url",
                "order_index",
                "created_at",
            ]),
        TableSpec::new("tests")
            .references("level_id", "levels")
            .columns(&[
                "id",
                "level_id",
                "title",
                "description",
                "pass_percentage",
                "time_limit_minutes",
                "created_at",
            ]),
        TableSpec::new("questions")
            .drop_column("answer_data")
            .references("test_id", "tests")
            .columns(&[
                "id",
                "test_id",
                "question_text",
                "question_type",
                "order_index",
                "points",
                "created_at",
            ]),
        TableSpec::new("answer_options")
            .references("question_id", "questions")
            .columns(&["id", "question_id", "option_text", "is_correct", "order_index"]),
        TableSpec::new("boss_level_tasks")
            .references("level_id", "levels")
            .columns(&["id", "level_id", "task_description", "order_index", "created_at"]),
        TableSpec::new("user_streaks")
            .references("user_id", "users")
            .columns(&[
                "id",
                "user_id",
                "current_login_streak",
                "longest_login_streak",
                "current_test_streak",
                "longest_test_streak",
                "current_practice_streak",
                "longest_practice_streak",
                "last_login_date",
                "last_test_date",
                "last_practice_date",
                "total_points",
            ]),
        TableSpec::new("leaderboard")
            .references("user_id", "users")
            .columns(&[
                "id",
                "user_id",
                "rungs_completed",
                "days_used",
                "total_points",
                "rank",
                "league",
                "updated_at",
            ]),
        TableSpec::new("activity_log")
            .references("user_id", "users")
            .columns(&["id", "user_id", "activity_type", "activity_date", "created_at"]),
        TableSpec::new("pathways").columns(&[
            "id",
            "title",
            "description",
            "order_index",
            "active",
            "created_at",
        ]),
        TableSpec::new("pathway_levels")
            .references("pathway_id", "pathways")
            .references("level_id", "levels")
            .columns(&["id", "pathway_id", "level_id", "order_index"]),
        TableSpec::new("cohort_groups")
            .references("manager_id", "users")
            .columns(&["id", "name", "description", "manager_id", "created_at"]),
        TableSpec::new("pathway_enrollments")
            .rename("status", "enrollment_status")
            .drop_columns(&[
                "request_note",
                "enrolled_by",
                "requested_at",
                "response_note",
                "reviewed_at",
                "reviewed_by",
                "active",
            ])
            .references("user_id", "users")
            .references("pathway_id", "pathways")
            .references("cohort_id", "cohort_groups")
            .columns(&[
                "id",
                "user_id",
                "pathway_id",
                "cohort_id",
                "enrollment_status",
                "enrolled_at",
                "started_at",
                "completed_at",
            ]),
        TableSpec::new("cohort_members")
            .drop_columns(&["id", "active"])
            .references("cohort_id", "cohort_groups")
            .references("user_id", "users")
            .columns(&["cohort_id", "user_id", "joined_at"]),
        TableSpec::new("cohort_pathways")
            .drop_column("assigned_by")
            .references("cohort_id", "cohort_groups")
            .references("pathway_id", "pathways")
            .columns(&["id", "cohort_id", "pathway_id", "deadline", "assigned_at"]),
        TableSpec::new("boss_consultant_relationships")
            .references("boss_id", "users")
            .references("consultant_id", "users")
            .columns(&["boss_id", "consultant_id", "created_at"]),
        TableSpec::new("user_progress")
            .references("user_id", "users")
            .references("level_id", "levels")
            .references("pathway_id", "pathways")
            .references("cohort_id", "cohort_groups")
            .columns(&[
                "id",
                "user_id",
                "level_id",
                "pathway_id",
                "cohort_id",
                "status",
                "started_at",
                "completed_at",
            ]),
        TableSpec::new("signoff_requests")
            .references("user_id", "users")
            .references("level_id", "levels")
            .references("boss_id", "users")
            .columns(&[
                "id",
                "user_id",
                "level_id",
                "boss_id",
                "evidence_notes",
                "evidence_url",
                "status",
                "boss_feedback",
                "requested_at",
                "reviewed_at",
            ]),
        TableSpec::new("test_attempts")
            .references("user_id", "users")
            .references("test_id", "tests")
            .columns(&[
                "id",
                "user_id",
                "test_id",
                "score",
                "max_score",
                "percentage",
                "passed",
                "started_at",
                "completed_at",
            ]),
        TableSpec::new("user_answers")
            .references("attempt_id", "test_attempts")
            .references("question_id", "questions")
            .references("answer_option_id", "answer_options")
            .columns(&[
                "id",
                "attempt_id",
                "question_id",
                "answer_option_id",
                "answer_text",
                "is_correct",
                "points_earned",
            ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrderMode;
    use crate::order::EmissionOrder;

    #[test]
    fn test_legacy_profile_builds() {
        let config = legacy_d1().build().unwrap();
        assert_eq!(config.tables().len(), 23);
        assert_eq!(config.tables()[0].name(), "achievements");
        assert_eq!(config.tables()[22].name(), "user_answers");
    }

    #[test]
    fn test_every_reference_precedes_its_referrer() {
        let config = legacy_d1().build().unwrap();
        let order = config.order();
        for table in config.tables() {
            let position = order.position(table.name()).unwrap();
            for fk in table.foreign_keys() {
                let target = order.position(&fk.references).unwrap();
                assert!(
                    target <= position,
                    "{} must come after {}",
                    table.name(),
                    fk.references
                );
            }
        }
    }

    #[test]
    fn test_declared_order_is_already_sorted() {
        let sorted = EmissionOrder::sorted(&tables()).unwrap();
        let config = legacy_d1().order_mode(OrderMode::Sorted).build().unwrap();
        assert_eq!(config.order(), &sorted);
        assert_eq!(legacy_d1().build().unwrap().order().names(), sorted.names());
    }

    #[test]
    fn test_mappings() {
        let config = legacy_d1().build().unwrap();
        let enrollments = config.table("pathway_enrollments").unwrap();
        assert_eq!(enrollments.mapping().source_for("enrollment_status"), "status");
        assert_eq!(enrollments.mapping().drops().len(), 7);

        let members = config.table("cohort_members").unwrap();
        assert!(members.mapping().drops().contains("id"));
        assert_eq!(
            members.asserted_columns().unwrap(),
            &["cohort_id", "user_id", "joined_at"]
        );
    }

    #[test]
    fn test_rules() {
        let config = legacy_d1().build().unwrap();
        assert_eq!(config.rules().for_table("users").len(), 1);
        assert_eq!(config.rules().for_table("questions")[0].column(), "question_type");
        assert!(config.rules().for_table("levels").is_empty());
    }
}
