use converge::catalog::{OnDelete, SchemaImage, TableImage};
use converge::{Driver, ErrorKind, MemoryConnection, Result};

const SCHEMA: &str = r#"
- table: individual
- column: individual.code
  type: text
  unique: true
- column: individual.sex
  type: [male, female]
  required: false
- table: visit
- link: visit.individual
- column: visit.seq
  type: integer
"#;

const IDENTITY: &str = "{identity: [individual, {seq: offset}], of: visit}";

fn deploy(driver: &mut Driver<MemoryConnection>, source: &str) -> Result<Vec<String>> {
    let facts = driver.parse_str(source)?;
    driver.apply(&facts, None)?;
    Ok(driver.connection_mut().take_log())
}

fn setup() -> Driver<MemoryConnection> {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, SCHEMA).unwrap();
    deploy(&mut driver, IDENTITY).unwrap();
    driver
}

fn schema(driver: &Driver<MemoryConnection>) -> &SchemaImage {
    driver.connection().catalog().public().unwrap()
}

fn table<'a>(driver: &'a Driver<MemoryConnection>, name: &str) -> &'a TableImage {
    schema(driver).table(name).unwrap()
}

#[test]
fn test_identity_with_generator() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, SCHEMA).unwrap();
    let log = deploy(&mut driver, IDENTITY).unwrap();

    assert_eq!(log.len(), 6, "{log:#?}");
    assert_eq!(
        log[0],
        r#"ALTER TABLE "visit" ADD CONSTRAINT "visit_pk" PRIMARY KEY ("individual_id", "seq");"#
    );
    assert_eq!(
        log[1],
        r#"ALTER TABLE "visit" DROP CONSTRAINT "visit_individual_fk";"#
    );
    assert_eq!(
        log[2],
        r#"ALTER TABLE "visit" ADD CONSTRAINT "visit_individual_fk" FOREIGN KEY ("individual_id") REFERENCES "individual" ("id") ON DELETE CASCADE;"#
    );
    assert!(
        log[3].starts_with(r#"CREATE FUNCTION "visit_pk"() RETURNS "trigger" LANGUAGE plpgsql AS '"#),
        "{}",
        log[3]
    );
    assert_eq!(
        log[4],
        r#"CREATE TRIGGER "visit_pk" BEFORE INSERT ON "visit" FOR EACH ROW EXECUTE PROCEDURE "visit_pk"()"#
    );
    assert_eq!(
        log[5],
        r#"COMMENT ON CONSTRAINT "visit_pk" ON "visit" IS '{"generators":[null,"offset"]}';"#
    );

    let visit = table(&driver, "visit");
    let key = visit.primary_key().unwrap();
    assert_eq!(key.columns, ["individual_id", "seq"]);
    assert!(visit.triggers.contains_key("visit_pk"));
    assert!(schema(&driver).procedures.contains_key("visit_pk"));
}

#[test]
fn test_identity_is_idempotent() {
    let mut driver = setup();
    let before = driver.connection().catalog().clone();

    let log = deploy(&mut driver, &format!("[{IDENTITY}]")).unwrap();
    assert!(log.is_empty(), "{log:#?}");
    let log = deploy(&mut driver, SCHEMA).unwrap();
    assert!(log.is_empty(), "{log:#?}");
    assert_eq!(driver.connection().catalog(), &before);
}

#[test]
fn test_identity_without_generators() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, SCHEMA).unwrap();
    let log = deploy(&mut driver, "{identity: [individual, seq], of: visit}").unwrap();

    assert_eq!(log.len(), 3, "{log:#?}");
    assert!(table(&driver, "visit").triggers.is_empty());
    assert!(schema(&driver).procedures.is_empty());
}

#[test]
fn test_generator_added_later() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, SCHEMA).unwrap();
    deploy(&mut driver, "{identity: [individual, seq], of: visit}").unwrap();

    let log = deploy(&mut driver, IDENTITY).unwrap();
    assert_eq!(log.len(), 3, "{log:#?}");
    assert!(log[0].starts_with(r#"CREATE FUNCTION "visit_pk"()"#));
    assert!(log[1].starts_with(r#"CREATE TRIGGER "visit_pk""#));
    assert!(log[2].starts_with(r#"COMMENT ON CONSTRAINT "visit_pk""#));
}

#[test]
fn test_identity_fields_changed() {
    let mut driver = setup();
    deploy(&mut driver, "{identity: [{seq: offset}], of: visit}").unwrap();

    let visit = table(&driver, "visit");
    assert_eq!(visit.primary_key().unwrap().columns, ["seq"]);
    assert_eq!(
        visit.foreign_keys["visit_individual_fk"].on_delete,
        OnDelete::SetDefault
    );
    // The offset is now computed over the whole table.
    assert!(
        !schema(&driver).procedures["visit_pk"]
            .source
            .contains("individual_id")
    );
    assert!(
        deploy(&mut driver, "{identity: [{seq: offset}], of: visit}")
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_nullable_field_drops_identity() {
    let mut driver = setup();
    deploy(&mut driver, "{column: visit.seq, type: integer, required: false}").unwrap();

    let visit = table(&driver, "visit");
    assert!(visit.primary_key().is_none());
    assert!(visit.triggers.is_empty());
    assert!(schema(&driver).procedures.is_empty());
    assert_eq!(
        visit.foreign_keys["visit_individual_fk"].on_delete,
        OnDelete::SetDefault
    );
    assert!(!visit.column("seq").unwrap().is_not_null);
}

#[test]
fn test_nullable_field_is_refused() {
    let mut driver = setup();
    deploy(&mut driver, "{column: visit.seq, type: integer, required: false}").unwrap();

    let error = deploy(&mut driver, IDENTITY).unwrap_err();
    assert_eq!(
        error.kind(),
        &ErrorKind::StateMismatch("Discovered nullable field: visit.seq".to_string())
    );
}

#[test]
fn test_retyped_field_loses_generator() {
    let mut driver = setup();
    deploy(&mut driver, "{column: visit.seq, type: text}").unwrap();

    let visit = table(&driver, "visit");
    let key = visit.primary_key().unwrap();
    assert_eq!(key.columns, ["individual_id", "seq"]);
    assert_eq!(key.comment, None);
    assert!(visit.triggers.is_empty());
    assert!(schema(&driver).procedures.is_empty());

    // A text field takes the generator back.
    let log = deploy(&mut driver, IDENTITY).unwrap();
    assert_eq!(log.len(), 3, "{log:#?}");
    assert!(
        schema(&driver).procedures["visit_pk"]
            .source
            .contains("\"seq\"")
    );
}

#[test]
fn test_retyped_field_keeps_other_generators() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, SCHEMA).unwrap();
    deploy(
        &mut driver,
        "[{column: visit.code, type: text}, {identity: [individual, {seq: offset}, {code: random}], of: visit}]",
    )
    .unwrap();
    deploy(&mut driver, "{column: visit.seq, type: text}").unwrap();

    let visit = table(&driver, "visit");
    let key = visit.primary_key().unwrap();
    assert_eq!(key.columns, ["individual_id", "seq", "code"]);
    assert_eq!(
        key.comment.as_deref(),
        Some(r#"{"generators":[null,null,"random"]}"#)
    );
    assert!(visit.triggers.contains_key("visit_pk"));
    let source = &schema(&driver).procedures["visit_pk"].source;
    assert!(source.contains(r#"NEW."code""#), "{source}");
    assert!(!source.contains(r#""seq""#), "{source}");

    let log = deploy(
        &mut driver,
        "{identity: [individual, seq, {code: random}], of: visit}",
    )
    .unwrap();
    assert!(log.is_empty(), "{log:#?}");
}

#[test]
fn test_generator_on_link_is_refused() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, SCHEMA).unwrap();
    let before = driver.connection().catalog().clone();
    driver.begin().unwrap();

    let error = deploy(&mut driver, "{identity: [{individual: offset}, seq], of: visit}").unwrap_err();
    assert_eq!(
        error.kind(),
        &ErrorKind::StateMismatch(
            "Expected an integer or text column: visit.individual_id".to_string()
        )
    );
    driver.rollback().unwrap();
    assert_eq!(driver.connection().catalog(), &before);
}

#[test]
fn test_missing_field() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, SCHEMA).unwrap();

    let error = deploy(&mut driver, "{identity: [individual, number], of: visit}").unwrap_err();
    assert_eq!(
        error.kind(),
        &ErrorKind::PrerequisiteMissing {
            what: "field".to_string(),
            name: "visit.number".to_string(),
        }
    );
}

#[test]
fn test_table_rename_cascades() {
    let mut driver = setup();
    deploy(&mut driver, "{table: person, was: individual}").unwrap();

    let schema = schema(&driver);
    assert!(schema.table("individual").is_none());
    let person = schema.table("person").unwrap();
    assert!(person.unique_keys.contains_key("person_uk"));
    assert!(person.unique_keys.contains_key("person_code_uk"));
    assert!(schema.sequences.contains_key("person_seq"));
    assert!(schema.types.contains_key("person_sex_enum"));
    assert!(!schema.types.contains_key("individual_sex_enum"));

    let visit = schema.table("visit").unwrap();
    assert!(visit.column("person_id").is_some());
    assert!(visit.column("individual_id").is_none());
    let fk = &visit.foreign_keys["visit_person_fk"];
    assert_eq!(fk.target_table, "person");
    assert_eq!(fk.on_delete, OnDelete::Cascade);
    assert!(schema.indexes.contains_key("visit_person_fk"));
    assert_eq!(visit.primary_key().unwrap().name, "visit_pk");
    assert_eq!(visit.primary_key().unwrap().columns, ["person_id", "seq"]);
    assert!(
        schema.procedures["visit_pk"]
            .source
            .contains(r#""person_id" = NEW."person_id""#)
    );

    let log = deploy(&mut driver, "{table: person, was: individual}").unwrap();
    assert!(log.is_empty(), "{log:#?}");
    let log = deploy(&mut driver, "[{link: visit.person}, {identity: [person, {seq: offset}], of: visit}]").unwrap();
    assert!(log.is_empty(), "{log:#?}");
}

#[test]
fn test_link_with_custom_label_keeps_it() {
    let mut driver = Driver::new(MemoryConnection::new());
    deploy(&mut driver, "[{table: individual}, {table: visit}, {link: visit.patient, to: individual}]").unwrap();
    deploy(&mut driver, "{table: person, was: individual}").unwrap();

    let visit = schema(&driver).table("visit").unwrap();
    assert!(visit.column("patient_id").is_some());
    assert!(visit.foreign_keys.contains_key("visit_patient_fk"));
    assert_eq!(visit.foreign_keys["visit_patient_fk"].target_table, "person");
}

#[test]
fn test_dropping_key_table() {
    let mut driver = setup();
    deploy(&mut driver, "{table: individual, present: false}").unwrap();

    let schema = schema(&driver);
    assert!(schema.table("individual").is_none());
    assert!(schema.types.is_empty());
    let visit = schema.table("visit").unwrap();
    assert!(visit.column("individual_id").is_none());
    assert!(visit.primary_key().is_none());
    assert!(visit.triggers.is_empty());
    assert!(schema.procedures.is_empty());
}
