use converge::catalog::{Change, ColumnDef, SchemaImage, TriggerEvent, TriggerTiming, TypeRef};
use converge::{Driver, ErrorKind, MemoryConnection, Result};

fn deploy(driver: &mut Driver<MemoryConnection>, source: &str) -> Result<String> {
    let facts = driver.parse_str(source)?;
    driver.apply(&facts, None)?;
    Ok(driver.connection_mut().take_log().join("\n"))
}

fn schema(driver: &Driver<MemoryConnection>) -> &SchemaImage {
    driver.connection().catalog().public().unwrap()
}

const INDIVIDUAL: &str = r#"
- table: individual
- column: individual.code
  type: text
  unique: true
- column: individual.sex
  type: [male, female]
  required: false
"#;

#[test]
fn test_create_table_with_columns() {
    let mut driver = Driver::new(MemoryConnection::new());
    insta::assert_snapshot!(deploy(&mut driver, INDIVIDUAL).unwrap(), @r#"
    CREATE TABLE "individual" (
        "id" "int4" NOT NULL
    );
    CREATE SEQUENCE "individual_seq" OWNED BY "individual"."id";
    ALTER TABLE "individual" ALTER COLUMN "id" SET DEFAULT nextval('"individual_seq"'::regclass);
    ALTER TABLE "individual" ADD CONSTRAINT "individual_uk" UNIQUE ("id");
    ALTER TABLE "individual" ADD COLUMN "code" "text" NOT NULL;
    ALTER TABLE "individual" ADD CONSTRAINT "individual_code_uk" UNIQUE ("code");
    CREATE TYPE "individual_sex_enum" AS ENUM ('male', 'female');
    ALTER TABLE "individual" ADD COLUMN "sex" "individual_sex_enum";
    "#);
}

#[test]
fn test_second_deploy_is_a_no_op() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, INDIVIDUAL).unwrap();
    let before = driver.connection().catalog().clone();

    assert_eq!(deploy(&mut driver, INDIVIDUAL).unwrap(), "");
    assert_eq!(driver.connection().catalog(), &before);
}

#[test]
fn test_link_creates_column_key_and_index() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, "table: individual").unwrap();
    insta::assert_snapshot!(deploy(&mut driver, "[{table: visit}, {link: visit.individual}]").unwrap(), @r#"
    CREATE TABLE "visit" (
        "id" "int4" NOT NULL
    );
    CREATE SEQUENCE "visit_seq" OWNED BY "visit"."id";
    ALTER TABLE "visit" ALTER COLUMN "id" SET DEFAULT nextval('"visit_seq"'::regclass);
    ALTER TABLE "visit" ADD CONSTRAINT "visit_uk" UNIQUE ("id");
    ALTER TABLE "visit" ADD COLUMN "individual_id" "int4" NOT NULL;
    ALTER TABLE "visit" ADD CONSTRAINT "visit_individual_fk" FOREIGN KEY ("individual_id") REFERENCES "individual" ("id") ON DELETE SET DEFAULT;
    CREATE INDEX "visit_individual_fk" ON "visit" ("individual_id");
    "#);

    assert_eq!(
        deploy(&mut driver, "[{table: visit}, {link: visit.individual}]").unwrap(),
        ""
    );
}

#[test]
fn test_unique_link_swaps_index_for_key() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, "[{table: individual}, {table: visit}, {link: visit.individual}]").unwrap();
    insta::assert_snapshot!(deploy(&mut driver, "{link: visit.individual, unique: true}").unwrap(), @r#"
    DROP INDEX "visit_individual_fk";
    ALTER TABLE "visit" ADD CONSTRAINT "visit_individual_uk" UNIQUE ("individual_id");
    "#);
}

#[test]
fn test_column_metadata() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, "table: individual").unwrap();
    insta::assert_snapshot!(deploy(&mut driver, "{column: individual.born, type: date, default: today(), title: Date of Birth}").unwrap(), @r#"
    ALTER TABLE "individual" ADD COLUMN "born" "date" NOT NULL DEFAULT CURRENT_DATE;
    COMMENT ON COLUMN "individual"."born" IS '{"title":"Date of Birth","default":"today()"}';
    "#);

    insta::assert_snapshot!(deploy(&mut driver, "{column: individual.born, type: date}").unwrap(), @r#"
    ALTER TABLE "individual" ALTER COLUMN "born" DROP DEFAULT;
    COMMENT ON COLUMN "individual"."born" IS NULL;
    "#);
}

#[test]
fn test_table_title() {
    let mut driver = Driver::new(MemoryConnection::new());
    insta::assert_snapshot!(deploy(&mut driver, "{table: individual, title: Person, reliable: false}").unwrap(), @r#"
    CREATE UNLOGGED TABLE "individual" (
        "id" "int4" NOT NULL
    );
    CREATE SEQUENCE "individual_seq" OWNED BY "individual"."id";
    ALTER TABLE "individual" ALTER COLUMN "id" SET DEFAULT nextval('"individual_seq"'::regclass);
    ALTER TABLE "individual" ADD CONSTRAINT "individual_uk" UNIQUE ("id");
    COMMENT ON TABLE "individual" IS '{"title":"Person"}';
    "#);
}

#[test]
fn test_mismatched_reliability() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, "table: individual").unwrap();
    let error = deploy(&mut driver, "{table: individual, reliable: false}").unwrap_err();
    insta::assert_snapshot!(error, @r#"
    Discovered table with mismatched reliability mode: individual
    While deploying table fact:
        table: individual
        fact #1
    "#);
}

#[test]
fn test_unsafe_conversion_is_refused() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, "[{table: individual}, {column: individual.born, type: date}]").unwrap();
    let before = driver.connection().catalog().clone();

    let error = deploy(&mut driver, "{column: individual.born, type: boolean}").unwrap_err();
    assert_eq!(
        error.kind(),
        &ErrorKind::UnsafeConversion {
            column: "individual.born".to_string(),
            from: "date".to_string(),
            to: "boolean".to_string(),
        }
    );
    assert_eq!(driver.connection().catalog(), &before);
}

#[test]
fn test_safe_conversion() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, "[{table: individual}, {column: individual.born, type: text}]").unwrap();
    insta::assert_snapshot!(deploy(&mut driver, "{column: individual.born, type: date}").unwrap(), @r#"ALTER TABLE "individual" ALTER COLUMN "born" SET DATA TYPE "date" USING CAST("born" AS "date");"#);
}

#[test]
fn test_enum_swap() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, INDIVIDUAL).unwrap();
    insta::assert_snapshot!(deploy(&mut driver, "{column: individual.sex, type: [male, female, intersex], required: false}").unwrap(), @r#"
    CREATE TYPE "?" AS ENUM ('male', 'female', 'intersex');
    ALTER TABLE "individual" ALTER COLUMN "sex" SET DATA TYPE "?" USING CAST(CAST("sex" AS "text") AS "?");
    DROP TYPE "individual_sex_enum";
    ALTER TYPE "?" RENAME TO "individual_sex_enum";
    "#);

    let labels = &schema(&driver).types["individual_sex_enum"].labels;
    assert_eq!(labels, &["male", "female", "intersex"]);
    assert!(!schema(&driver).types.contains_key("?"));
}

#[test]
fn test_enum_to_text_and_back() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, INDIVIDUAL).unwrap();
    deploy(&mut driver, "{column: individual.sex, type: text, required: false}").unwrap();
    assert!(schema(&driver).types.is_empty());

    insta::assert_snapshot!(deploy(&mut driver, "{column: individual.sex, type: [f, m], required: false}").unwrap(), @r#"
    CREATE TYPE "individual_sex_enum" AS ENUM ('f', 'm');
    ALTER TABLE "individual" ALTER COLUMN "sex" SET DATA TYPE "individual_sex_enum" USING CAST("sex" AS "individual_sex_enum");
    "#);
}

#[test]
fn test_locked_deploy() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, INDIVIDUAL).unwrap();
    let before = driver.connection().catalog().clone();

    let facts = driver.parse_str(INDIVIDUAL).unwrap();
    driver.apply(&facts, Some(true)).unwrap();

    let facts = driver
        .parse_str("{column: individual.born, type: date}")
        .unwrap();
    let error = driver.apply(&facts, Some(true)).unwrap_err();
    assert_eq!(
        error.kind(),
        &ErrorKind::StateMismatch(
            "Detected required change: + column individual.born: date".to_string()
        )
    );
    assert!(!driver.is_locked());
    assert_eq!(driver.connection().catalog(), &before);
    assert!(driver.connection().statements().is_empty());
}

#[test]
fn test_missing_prerequisites() {
    let mut driver = Driver::new(MemoryConnection::new());
    let error = deploy(&mut driver, "{column: individual.code, type: text}").unwrap_err();
    assert_eq!(
        error.kind(),
        &ErrorKind::PrerequisiteMissing {
            what: "table".to_string(),
            name: "individual".to_string(),
        }
    );

    deploy(&mut driver, "table: visit").unwrap();
    let error = deploy(&mut driver, "link: visit.individual").unwrap_err();
    assert_eq!(
        error.kind(),
        &ErrorKind::PrerequisiteMissing {
            what: "table".to_string(),
            name: "individual".to_string(),
        }
    );
}

#[test]
fn test_absent_facts_without_table() {
    let mut driver = Driver::new(MemoryConnection::new());
    let source = r#"
- {link: visit.individual, present: false}
- {column: visit.code, present: false}
- {table: visit, present: false}
"#;
    assert_eq!(deploy(&mut driver, source).unwrap(), "");
}

#[test]
fn test_drop_link_and_table() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, "[{table: individual}, {table: visit}, {link: visit.individual}]").unwrap();

    insta::assert_snapshot!(deploy(&mut driver, "{link: visit.individual, present: false}").unwrap(), @r#"ALTER TABLE "visit" DROP COLUMN "individual_id";"#);
    assert!(schema(&driver).indexes.is_empty());

    deploy(&mut driver, "link: visit.individual").unwrap();
    insta::assert_snapshot!(deploy(&mut driver, "{table: individual, present: false}").unwrap(), @r#"
    ALTER TABLE "visit" DROP COLUMN "individual_id";
    DROP TABLE "individual";
    "#);
}

#[test]
fn test_drop_enum_column() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, INDIVIDUAL).unwrap();
    insta::assert_snapshot!(deploy(&mut driver, "{column: individual.sex, present: false}").unwrap(), @r#"
    ALTER TABLE "individual" DROP COLUMN "sex";
    DROP TYPE "individual_sex_enum";
    "#);
}

#[test]
fn test_column_rename() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, INDIVIDUAL).unwrap();
    insta::assert_snapshot!(deploy(&mut driver, "{column: individual.identifier, was: code, type: text, unique: true}").unwrap(), @r#"
    ALTER TABLE "individual" RENAME COLUMN "code" TO "identifier";
    ALTER TABLE "individual" RENAME CONSTRAINT "individual_code_uk" TO "individual_identifier_uk";
    "#);
}

#[test]
fn test_unrecognized_column_type() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, "table: individual").unwrap();
    driver
        .connection_mut()
        .catalog_mut()
        .apply(&Change::AddColumn {
            table: "individual".to_string(),
            column: ColumnDef::new("code", TypeRef::system("int8"), true),
        })
        .unwrap();
    driver.reset();

    let error = deploy(&mut driver, "{column: individual.code, type: integer}").unwrap_err();
    assert_eq!(
        error.kind(),
        &ErrorKind::StateMismatch("Discovered column of unrecognized type: code".to_string())
    );
}

fn add_check_trigger(driver: &mut Driver<MemoryConnection>) {
    let catalog = driver.connection_mut().catalog_mut();
    let changes = [
        Change::CreateFunction {
            name: "individual_code_chk".to_string(),
            return_type: "trigger".to_string(),
            language: "plpgsql".to_string(),
            source: "\nBEGIN\n    RETURN NEW;\nEND;\n".to_string(),
            or_replace: false,
        },
        Change::CreateTrigger {
            table: "individual".to_string(),
            name: "individual_code_chk".to_string(),
            timing: TriggerTiming::Before,
            event: TriggerEvent::Insert,
            procedure: "individual_code_chk".to_string(),
        },
        Change::CommentOnTrigger {
            table: "individual".to_string(),
            name: "individual_code_chk".to_string(),
            comment: Some("{}".to_string()),
        },
    ];
    for change in &changes {
        catalog.apply(change).unwrap();
    }
    driver.reset();
}

#[test]
fn test_check_trigger_dropped_with_retyped_column() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, INDIVIDUAL).unwrap();
    add_check_trigger(&mut driver);

    // Unrelated changes leave it alone.
    deploy(&mut driver, "{column: individual.code, type: text, unique: true, title: Code Number}").unwrap();
    assert!(schema(&driver).procedures.contains_key("individual_code_chk"));

    insta::assert_snapshot!(deploy(&mut driver, "{column: individual.code, type: integer, unique: true, title: Code Number}").unwrap(), @r#"
    DROP TRIGGER "individual_code_chk" ON "individual"
    DROP FUNCTION "individual_code_chk"()
    ALTER TABLE "individual" ALTER COLUMN "code" SET DATA TYPE "int4" USING CAST("code" AS "int4");
    "#);
}

#[test]
fn test_check_trigger_dropped_with_table() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, INDIVIDUAL).unwrap();
    add_check_trigger(&mut driver);

    deploy(&mut driver, "{table: individual, present: false}").unwrap();
    let schema = schema(&driver);
    assert!(schema.tables.is_empty());
    assert!(schema.types.is_empty());
    assert!(schema.procedures.is_empty());
}
