use crate::*;

fn create_table(name: &str) -> Change {
    Change::CreateTable {
        name: name.to_string(),
        columns: vec![ColumnDef::new("id", TypeRef::system("int4"), true)],
        is_unlogged: false,
    }
}

fn add_column(table: &str, name: &str, type_ref: TypeRef) -> Change {
    Change::AddColumn {
        table: table.to_string(),
        column: ColumnDef::new(name, type_ref, false),
    }
}

fn add_unique(table: &str, name: &str, columns: &[&str], is_primary: bool) -> Change {
    Change::AddUniqueKey {
        table: table.to_string(),
        name: name.to_string(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        is_primary,
    }
}

fn add_link(table: &str, column: &str, fk: &str, target: &str) -> Change {
    Change::AddForeignKey {
        table: table.to_string(),
        name: fk.to_string(),
        columns: vec![column.to_string()],
        target_table: target.to_string(),
        target_columns: vec!["id".to_string()],
        on_delete: OnDelete::SetDefault,
    }
}

/// `individual(id, uk)` and `visit(id, uk, individual_id -> individual.id)`.
fn two_linked_tables() -> Catalog {
    let mut catalog = Catalog::new();
    for change in [
        create_table("individual"),
        add_unique("individual", "individual_uk", &["id"], false),
        create_table("visit"),
        add_unique("visit", "visit_uk", &["id"], false),
        add_column("visit", "individual_id", TypeRef::system("int4")),
        add_link("visit", "individual_id", "visit_individual_fk", "individual"),
        Change::CreateIndex {
            name: "visit_individual_fk".to_string(),
            table: "visit".to_string(),
            columns: vec!["individual_id".to_string()],
        },
    ] {
        catalog.apply(&change).unwrap();
    }
    catalog
}

fn public(catalog: &Catalog) -> &SchemaImage {
    catalog.public().unwrap()
}

#[test]
fn test_create_table() {
    let mut catalog = Catalog::new();
    catalog.apply(&create_table("individual")).unwrap();

    let table = public(&catalog).table("individual").unwrap();
    assert_eq!(table.columns.len(), 1);
    assert!(table.column("id").unwrap().is_not_null);
}

#[test]
fn test_create_table_already_exists() {
    let mut catalog = Catalog::new();
    catalog.apply(&create_table("individual")).unwrap();

    let result = catalog.apply(&create_table("individual"));
    assert!(matches!(
        result,
        Err(CatalogError::ObjectAlreadyExists { kind: "relation", .. })
    ));
}

#[test]
fn test_table_name_collides_with_sequence() {
    let mut catalog = Catalog::new();
    catalog
        .apply(&Change::CreateSequence {
            name: "counter".to_string(),
            owner: None,
        })
        .unwrap();

    assert!(catalog.apply(&create_table("counter")).is_err());
}

#[test]
fn test_drop_table_with_referring_key() {
    let mut catalog = two_linked_tables();
    let before = catalog.clone();

    let result = catalog.apply(&Change::DropTable {
        name: "individual".to_string(),
    });
    assert!(matches!(result, Err(CatalogError::DependentObjects { .. })));
    assert_eq!(catalog, before);
}

#[test]
fn test_drop_table_drops_owned_objects() {
    let mut catalog = two_linked_tables();
    catalog
        .apply(&Change::CreateSequence {
            name: "visit_seq".to_string(),
            owner: Some(("visit".to_string(), "id".to_string())),
        })
        .unwrap();

    catalog
        .apply(&Change::DropTable {
            name: "visit".to_string(),
        })
        .unwrap();

    let schema = public(&catalog);
    assert!(schema.table("visit").is_none());
    assert!(schema.sequences.is_empty());
    assert!(schema.indexes.is_empty());
}

#[test]
fn test_rename_table_follows_references() {
    let mut catalog = two_linked_tables();
    catalog
        .apply(&Change::RenameTable {
            name: "individual".to_string(),
            new_name: "subject".to_string(),
        })
        .unwrap();

    let schema = public(&catalog);
    assert!(schema.table("individual").is_none());
    let fk = &schema.table("visit").unwrap().foreign_keys["visit_individual_fk"];
    assert_eq!(fk.target_table, "subject");
    assert_eq!(schema.referring_foreign_keys("subject").len(), 1);
}

#[test]
fn test_rename_column_follows_references() {
    let mut catalog = two_linked_tables();
    catalog
        .apply(&Change::RenameColumn {
            table: "visit".to_string(),
            name: "individual_id".to_string(),
            new_name: "subject_id".to_string(),
        })
        .unwrap();

    let schema = public(&catalog);
    let visit = schema.table("visit").unwrap();
    assert!(visit.column("individual_id").is_none());
    assert_eq!(visit.foreign_keys_of("subject_id").len(), 1);
    assert_eq!(schema.indexes["visit_individual_fk"].columns, ["subject_id"]);
}

#[test]
fn test_drop_column_drops_constraints_and_indexes() {
    let mut catalog = two_linked_tables();
    catalog
        .apply(&Change::DropColumn {
            table: "visit".to_string(),
            name: "individual_id".to_string(),
        })
        .unwrap();

    let schema = public(&catalog);
    assert!(schema.table("visit").unwrap().foreign_keys.is_empty());
    assert!(schema.indexes.is_empty());
}

#[test]
fn test_drop_referenced_column() {
    let mut catalog = two_linked_tables();
    let result = catalog.apply(&Change::DropColumn {
        table: "individual".to_string(),
        name: "id".to_string(),
    });
    assert!(matches!(result, Err(CatalogError::DependentObjects { .. })));
}

#[test]
fn test_foreign_key_requires_unique_target() {
    let mut catalog = Catalog::new();
    catalog.apply(&create_table("individual")).unwrap();
    catalog.apply(&create_table("visit")).unwrap();
    catalog
        .apply(&add_column("visit", "individual_id", TypeRef::system("int4")))
        .unwrap();

    let result = catalog.apply(&add_link(
        "visit",
        "individual_id",
        "visit_individual_fk",
        "individual",
    ));
    assert!(matches!(
        result,
        Err(CatalogError::NoUniqueConstraint { .. })
    ));
}

#[test]
fn test_drop_unique_key_in_use() {
    let mut catalog = two_linked_tables();
    let result = catalog.apply(&Change::DropConstraint {
        table: "individual".to_string(),
        name: "individual_uk".to_string(),
    });
    assert!(matches!(result, Err(CatalogError::DependentObjects { .. })));
}

#[test]
fn test_primary_key_sets_not_null() {
    let mut catalog = Catalog::new();
    catalog.apply(&create_table("individual")).unwrap();
    catalog
        .apply(&add_column("individual", "code", TypeRef::system("text")))
        .unwrap();
    catalog
        .apply(&add_unique("individual", "individual_pk", &["code"], true))
        .unwrap();

    let table = public(&catalog).table("individual").unwrap();
    assert!(table.column("code").unwrap().is_not_null);
    assert_eq!(table.primary_key().unwrap().name, "individual_pk");
    assert!(table.unique_key_of("code").is_none());

    let second = catalog.apply(&add_unique("individual", "other_pk", &["id"], true));
    assert!(matches!(
        second,
        Err(CatalogError::ConstraintAlreadyExists { .. })
    ));

    let nullable = catalog.apply(&Change::AlterColumnNotNull {
        table: "individual".to_string(),
        name: "code".to_string(),
        is_not_null: false,
    });
    assert!(nullable.is_err());
}

#[test]
fn test_enum_type_lifecycle() {
    let mut catalog = Catalog::new();
    catalog.apply(&create_table("individual")).unwrap();

    let sex = TypeRef::public("individual_sex_enum");
    assert!(
        catalog
            .apply(&add_column("individual", "sex", sex.clone()))
            .is_err()
    );

    catalog
        .apply(&Change::CreateEnumType {
            name: "individual_sex_enum".to_string(),
            labels: vec!["male".to_string(), "female".to_string()],
        })
        .unwrap();
    catalog
        .apply(&add_column("individual", "sex", sex))
        .unwrap();

    let drop = Change::DropType {
        name: "individual_sex_enum".to_string(),
    };
    assert!(matches!(
        catalog.apply(&drop),
        Err(CatalogError::DependentObjects { .. })
    ));

    catalog
        .apply(&Change::RenameType {
            name: "individual_sex_enum".to_string(),
            new_name: "individual_gender_enum".to_string(),
        })
        .unwrap();
    let column = public(&catalog)
        .table("individual")
        .unwrap()
        .column("sex")
        .unwrap();
    assert_eq!(column.type_ref, TypeRef::public("individual_gender_enum"));
}

#[test]
fn test_trigger_requires_function() {
    let mut catalog = Catalog::new();
    catalog.apply(&create_table("visit")).unwrap();

    let trigger = Change::CreateTrigger {
        table: "visit".to_string(),
        name: "visit_pk".to_string(),
        timing: TriggerTiming::Before,
        event: TriggerEvent::Insert,
        procedure: "visit_pk".to_string(),
    };
    assert!(matches!(
        catalog.apply(&trigger),
        Err(CatalogError::ObjectNotFound { kind: "function", .. })
    ));

    catalog
        .apply(&Change::CreateFunction {
            name: "visit_pk".to_string(),
            return_type: "trigger".to_string(),
            language: "plpgsql".to_string(),
            source: "BEGIN RETURN NEW; END;".to_string(),
            or_replace: false,
        })
        .unwrap();
    catalog.apply(&trigger).unwrap();

    let drop = Change::DropFunction {
        name: "visit_pk".to_string(),
    };
    assert!(catalog.apply(&drop).is_err());

    catalog
        .apply(&Change::DropTrigger {
            table: "visit".to_string(),
            name: "visit_pk".to_string(),
        })
        .unwrap();
    catalog.apply(&drop).unwrap();
    assert!(public(&catalog).procedures.is_empty());
}

#[test]
fn test_contains() {
    let catalog = two_linked_tables();
    let schema = public(&catalog);
    assert!(schema.contains(&ObjectKey::table("visit")));
    assert!(schema.contains(&ObjectKey::column("visit", "individual_id")));
    assert!(schema.contains(&ObjectKey::unique_key("visit", "visit_uk")));
    assert!(!schema.contains(&ObjectKey::trigger("visit", "visit_pk")));
    assert!(!schema.contains(&ObjectKey::column("nowhere", "id")));
}

#[test]
fn test_change_sql() {
    insta::assert_snapshot!(
        create_table("individual").to_sql(),
        @r#"
    CREATE TABLE "individual" (
        "id" "int4" NOT NULL
    );
    "#
    );
    insta::assert_snapshot!(
        add_link("visit", "individual_id", "visit_individual_fk", "individual").to_sql(),
        @r#"ALTER TABLE "visit" ADD CONSTRAINT "visit_individual_fk" FOREIGN KEY ("individual_id") REFERENCES "individual" ("id") ON DELETE SET DEFAULT;"#
    );
    insta::assert_snapshot!(
        Change::AlterColumnType {
            table: "individual".to_string(),
            name: "sex".to_string(),
            type_ref: TypeRef::system("text"),
            using: Some(r#"CAST("sex" AS "text")"#.to_string()),
        }
        .to_sql(),
        @r#"ALTER TABLE "individual" ALTER COLUMN "sex" SET DATA TYPE "text" USING CAST("sex" AS "text");"#
    );
}

#[test]
fn test_change_display() {
    assert_eq!(create_table("individual").to_string(), "+ table individual");
    assert_eq!(
        add_column("individual", "code", TypeRef::system("text")).to_string(),
        "+ column individual.code: text (nullable)"
    );
    assert_eq!(
        add_unique("visit", "visit_pk", &["individual_id", "seq"], true).to_string(),
        "+ PRIMARY KEY visit.visit_pk (individual_id, seq)"
    );
    assert_eq!(
        Change::AlterColumnDefault {
            table: "individual".to_string(),
            name: "code".to_string(),
            default: None,
        }
        .to_string(),
        "~ column individual.code default: (none)"
    );
}
