use crate::*;

#[test]
fn test_create_table() {
    let sql = create_table(
        "individual",
        &[
            define_column("id", "int4", true, None),
            define_column("code", "text", false, None),
        ],
        false,
    );
    assert_eq!(
        sql,
        "CREATE TABLE \"individual\" (\n    \"id\" \"int4\" NOT NULL,\n    \"code\" \"text\"\n);"
    );
}

#[test]
fn test_create_unlogged_table() {
    let sql = create_table("cache", &[define_column("id", "int4", true, None)], true);
    assert_eq!(
        sql,
        "CREATE UNLOGGED TABLE \"cache\" (\n    \"id\" \"int4\" NOT NULL\n);"
    );
}

#[test]
fn test_table_statements() {
    insta::assert_snapshot!(drop_table("individual"), @r#"DROP TABLE "individual";"#);
    insta::assert_snapshot!(
        rename_table("individual", "subject"),
        @r#"ALTER TABLE "individual" RENAME TO "subject";"#
    );
    insta::assert_snapshot!(
        comment_on_table("individual", Some(r#"{"title":"Person"}"#)),
        @r#"COMMENT ON TABLE "individual" IS '{"title":"Person"}';"#
    );
    insta::assert_snapshot!(
        comment_on_table("individual", None),
        @r#"COMMENT ON TABLE "individual" IS NULL;"#
    );
}

#[test]
fn test_column_statements() {
    insta::assert_snapshot!(
        add_column("individual", "sex", "individual_sex_enum", true, None),
        @r#"ALTER TABLE "individual" ADD COLUMN "sex" "individual_sex_enum" NOT NULL;"#
    );
    insta::assert_snapshot!(
        add_column("individual", "code", "text", true, Some("'X'")),
        @r#"ALTER TABLE "individual" ADD COLUMN "code" "text" NOT NULL DEFAULT 'X';"#
    );
    insta::assert_snapshot!(
        drop_column("individual", "sex"),
        @r#"ALTER TABLE "individual" DROP COLUMN "sex";"#
    );
    insta::assert_snapshot!(
        rename_column("individual", "sex", "gender"),
        @r#"ALTER TABLE "individual" RENAME COLUMN "sex" TO "gender";"#
    );
    insta::assert_snapshot!(
        alter_column_not_null("individual", "code", false),
        @r#"ALTER TABLE "individual" ALTER COLUMN "code" DROP NOT NULL;"#
    );
    insta::assert_snapshot!(
        alter_column_default("individual", "code", Some("'X'")),
        @r#"ALTER TABLE "individual" ALTER COLUMN "code" SET DEFAULT 'X';"#
    );
    insta::assert_snapshot!(
        alter_column_default("individual", "code", None),
        @r#"ALTER TABLE "individual" ALTER COLUMN "code" DROP DEFAULT;"#
    );
    insta::assert_snapshot!(
        comment_on_column("individual", "code", Some("it's")),
        @r#"COMMENT ON COLUMN "individual"."code" IS 'it''s';"#
    );
}

#[test]
fn test_alter_column_type_with_cast() {
    let using = cast(&quote_ident("age"), "int4");
    insta::assert_snapshot!(
        alter_column_type("individual", "age", "int4", Some(using.as_str())),
        @r#"ALTER TABLE "individual" ALTER COLUMN "age" SET DATA TYPE "int4" USING CAST("age" AS "int4");"#
    );
    insta::assert_snapshot!(
        alter_column_type("individual", "age", "text", None),
        @r#"ALTER TABLE "individual" ALTER COLUMN "age" SET DATA TYPE "text";"#
    );
}

#[test]
fn test_constraint_statements() {
    insta::assert_snapshot!(
        add_unique_constraint("individual", "individual_uk", &["id"], false),
        @r#"ALTER TABLE "individual" ADD CONSTRAINT "individual_uk" UNIQUE ("id");"#
    );
    insta::assert_snapshot!(
        add_unique_constraint("visit", "visit_pk", &["individual_id", "seq"], true),
        @r#"ALTER TABLE "visit" ADD CONSTRAINT "visit_pk" PRIMARY KEY ("individual_id", "seq");"#
    );
    insta::assert_snapshot!(
        add_foreign_key_constraint(
            "visit",
            "visit_individual_fk",
            &["individual_id"],
            "individual",
            &["id"],
            None,
            Some("SET DEFAULT"),
        ),
        @r#"ALTER TABLE "visit" ADD CONSTRAINT "visit_individual_fk" FOREIGN KEY ("individual_id") REFERENCES "individual" ("id") ON DELETE SET DEFAULT;"#
    );
    insta::assert_snapshot!(
        drop_constraint("visit", "visit_pk"),
        @r#"ALTER TABLE "visit" DROP CONSTRAINT "visit_pk";"#
    );
    insta::assert_snapshot!(
        rename_constraint("visit", "visit_pk", "encounter_pk"),
        @r#"ALTER TABLE "visit" RENAME CONSTRAINT "visit_pk" TO "encounter_pk";"#
    );
    insta::assert_snapshot!(
        comment_on_constraint("visit", "visit_pk", Some("x")),
        @r#"COMMENT ON CONSTRAINT "visit_pk" ON "visit" IS 'x';"#
    );
}

#[test]
fn test_type_statements() {
    insta::assert_snapshot!(
        create_enum_type("individual_sex_enum", &["male", "female"]),
        @r#"CREATE TYPE "individual_sex_enum" AS ENUM ('male', 'female');"#
    );
    insta::assert_snapshot!(drop_type("individual_sex_enum"), @r#"DROP TYPE "individual_sex_enum";"#);
    insta::assert_snapshot!(
        rename_type("?", "individual_sex_enum"),
        @r#"ALTER TYPE "?" RENAME TO "individual_sex_enum";"#
    );
}

#[test]
fn test_sequence_and_index_statements() {
    insta::assert_snapshot!(
        create_sequence("individual_seq", Some(("individual", "id"))),
        @r#"CREATE SEQUENCE "individual_seq" OWNED BY "individual"."id";"#
    );
    insta::assert_snapshot!(create_sequence("counter", None), @r#"CREATE SEQUENCE "counter";"#);
    insta::assert_snapshot!(
        rename_sequence("individual_seq", "subject_seq"),
        @r#"ALTER SEQUENCE "individual_seq" RENAME TO "subject_seq";"#
    );
    insta::assert_snapshot!(
        create_index("visit_individual_fk", "visit", &["individual_id"]),
        @r#"CREATE INDEX "visit_individual_fk" ON "visit" ("individual_id");"#
    );
    insta::assert_snapshot!(drop_index("visit_individual_fk"), @r#"DROP INDEX "visit_individual_fk";"#);
}

#[test]
fn test_function_and_trigger_statements() {
    insta::assert_snapshot!(
        create_function::<&str>("visit_pk", &[], "trigger", "plpgsql", "BEGIN RETURN 'x'; END;", false),
        @r#"CREATE FUNCTION "visit_pk"() RETURNS "trigger" LANGUAGE plpgsql AS 'BEGIN RETURN ''x''; END;'"#
    );
    insta::assert_snapshot!(
        create_function::<&str>("visit_pk", &[], "trigger", "plpgsql", "BEGIN END;", true),
        @r#"CREATE OR REPLACE FUNCTION "visit_pk"() RETURNS "trigger" LANGUAGE plpgsql AS 'BEGIN END;'"#
    );
    insta::assert_snapshot!(
        rename_function::<&str>("visit_pk", &[], "encounter_pk"),
        @r#"ALTER FUNCTION "visit_pk"() RENAME TO "encounter_pk""#
    );
    insta::assert_snapshot!(drop_function::<&str>("visit_pk", &[]), @r#"DROP FUNCTION "visit_pk"()"#);
    insta::assert_snapshot!(
        create_trigger("visit", "visit_pk", "BEFORE", "INSERT", "visit_pk", &[]),
        @r#"CREATE TRIGGER "visit_pk" BEFORE INSERT ON "visit" FOR EACH ROW EXECUTE PROCEDURE "visit_pk"()"#
    );
    insta::assert_snapshot!(
        rename_trigger("visit", "visit_pk", "encounter_pk"),
        @r#"ALTER TRIGGER "visit_pk" ON "visit" RENAME TO "encounter_pk""#
    );
    insta::assert_snapshot!(drop_trigger("visit", "visit_pk"), @r#"DROP TRIGGER "visit_pk" ON "visit""#);
}
