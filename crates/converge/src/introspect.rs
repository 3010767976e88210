//! Reading the `public` schema out of `pg_catalog`.

use crate::error::DbError;
use crate::pg::PgConnection;
use converge_catalog::{
    Catalog, ColumnImage, EnumTypeImage, ForeignKeyImage, IndexImage, OnDelete, PUBLIC_SCHEMA,
    ProcedureImage, SchemaImage, SequenceImage, TableImage, TriggerEvent, TriggerImage,
    TriggerTiming, TypeRef, UniqueKeyImage,
};

const TABLES: &str = r#"
SELECT c.relname::text, c.relpersistence = 'u', obj_description(c.oid, 'pg_class')
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = 'public' AND c.relkind = 'r'
ORDER BY c.oid
"#;

const COLUMNS: &str = r#"
SELECT c.relname::text, a.attname::text, tn.nspname::text, t.typname::text, a.attnotnull,
       pg_catalog.pg_get_expr(d.adbin, d.adrelid), col_description(c.oid, a.attnum)
FROM pg_catalog.pg_attribute a
JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_type t ON t.oid = a.atttypid
JOIN pg_catalog.pg_namespace tn ON tn.oid = t.typnamespace
LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
WHERE n.nspname = 'public' AND c.relkind = 'r' AND a.attnum > 0 AND NOT a.attisdropped
ORDER BY c.oid, a.attnum
"#;

const ENUM_TYPES: &str = r#"
SELECT t.typname::text,
       ARRAY(SELECT e.enumlabel::text FROM pg_catalog.pg_enum e
             WHERE e.enumtypid = t.oid ORDER BY e.enumsortorder)
FROM pg_catalog.pg_type t
JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
WHERE n.nspname = 'public' AND t.typtype = 'e'
ORDER BY t.oid
"#;

const CONSTRAINTS: &str = r#"
SELECT c.relname::text, k.conname::text, k.contype::text,
       ARRAY(SELECT a.attname::text
             FROM unnest(k.conkey) WITH ORDINALITY AS u(attnum, ord)
             JOIN pg_catalog.pg_attribute a ON a.attrelid = k.conrelid AND a.attnum = u.attnum
             ORDER BY u.ord),
       r.relname::text,
       ARRAY(SELECT a.attname::text
             FROM unnest(k.confkey) WITH ORDINALITY AS u(attnum, ord)
             JOIN pg_catalog.pg_attribute a ON a.attrelid = k.confrelid AND a.attnum = u.attnum
             ORDER BY u.ord),
       k.confdeltype::text,
       obj_description(k.oid, 'pg_constraint')
FROM pg_catalog.pg_constraint k
JOIN pg_catalog.pg_class c ON c.oid = k.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN pg_catalog.pg_class r ON r.oid = k.confrelid
WHERE n.nspname = 'public' AND k.contype IN ('p', 'u', 'f')
ORDER BY k.oid
"#;

const SEQUENCES: &str = r#"
SELECT s.relname::text, t.relname::text, a.attname::text
FROM pg_catalog.pg_class s
JOIN pg_catalog.pg_namespace n ON n.oid = s.relnamespace
LEFT JOIN pg_catalog.pg_depend d
       ON d.classid = 'pg_catalog.pg_class'::regclass AND d.objid = s.oid
      AND d.refclassid = 'pg_catalog.pg_class'::regclass AND d.deptype = 'a'
LEFT JOIN pg_catalog.pg_class t ON t.oid = d.refobjid
LEFT JOIN pg_catalog.pg_attribute a ON a.attrelid = d.refobjid AND a.attnum = d.refobjsubid
WHERE n.nspname = 'public' AND s.relkind = 'S'
ORDER BY s.oid
"#;

const INDEXES: &str = r#"
SELECT i.relname::text, t.relname::text,
       ARRAY(SELECT a.attname::text
             FROM unnest(x.indkey::int2[]) WITH ORDINALITY AS u(attnum, ord)
             JOIN pg_catalog.pg_attribute a ON a.attrelid = x.indrelid AND a.attnum = u.attnum
             ORDER BY u.ord)
FROM pg_catalog.pg_index x
JOIN pg_catalog.pg_class i ON i.oid = x.indexrelid
JOIN pg_catalog.pg_class t ON t.oid = x.indrelid
JOIN pg_catalog.pg_namespace n ON n.oid = i.relnamespace
WHERE n.nspname = 'public'
  AND NOT EXISTS (SELECT 1 FROM pg_catalog.pg_constraint k
                  WHERE k.conindid = x.indexrelid AND k.contype IN ('p', 'u', 'x'))
ORDER BY i.oid
"#;

const PROCEDURES: &str = r#"
SELECT p.proname::text, t.typname::text, l.lanname::text, p.prosrc
FROM pg_catalog.pg_proc p
JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace
JOIN pg_catalog.pg_type t ON t.oid = p.prorettype
JOIN pg_catalog.pg_language l ON l.oid = p.prolang
WHERE n.nspname = 'public' AND p.pronargs = 0
ORDER BY p.oid
"#;

const TRIGGERS: &str = r#"
SELECT c.relname::text, g.tgname::text, g.tgtype, p.proname::text,
       obj_description(g.oid, 'pg_trigger')
FROM pg_catalog.pg_trigger g
JOIN pg_catalog.pg_class c ON c.oid = g.tgrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_proc p ON p.oid = g.tgfoid
WHERE n.nspname = 'public' AND NOT g.tgisinternal
ORDER BY g.oid
"#;

// `pg_trigger.tgtype` bits.
const TRIGGER_TYPE_BEFORE: i16 = 1 << 1;
const TRIGGER_TYPE_INSERT: i16 = 1 << 2;
const TRIGGER_TYPE_DELETE: i16 = 1 << 3;
const TRIGGER_TYPE_UPDATE: i16 = 1 << 4;

pub(crate) fn introspect(connection: &PgConnection) -> Result<Catalog, DbError> {
    let mut schema = SchemaImage::new(PUBLIC_SCHEMA);

    for row in connection.query(TABLES)? {
        let name: String = row.try_get(0)?;
        schema.tables.insert(
            name.clone(),
            TableImage {
                name,
                is_unlogged: row.try_get(1)?,
                comment: row.try_get(2)?,
                ..Default::default()
            },
        );
    }

    for row in connection.query(COLUMNS)? {
        let table: String = row.try_get(0)?;
        let name: String = row.try_get(1)?;
        let type_ref = TypeRef {
            schema: row.try_get(2)?,
            name: row.try_get(3)?,
        };
        let column = ColumnImage {
            name: name.clone(),
            type_ref,
            is_not_null: row.try_get(4)?,
            default: row.try_get(5)?,
            comment: row.try_get(6)?,
        };
        table_mut(&mut schema, &table)?
            .columns
            .insert(name, column);
    }

    for row in connection.query(ENUM_TYPES)? {
        let name: String = row.try_get(0)?;
        schema.types.insert(
            name.clone(),
            EnumTypeImage {
                name,
                labels: row.try_get(1)?,
            },
        );
    }

    for row in connection.query(CONSTRAINTS)? {
        let table: String = row.try_get(0)?;
        let name: String = row.try_get(1)?;
        let kind: String = row.try_get(2)?;
        let columns: Vec<String> = row.try_get(3)?;
        let image = table_mut(&mut schema, &table)?;

        if kind == "f" {
            let code: String = row.try_get(6)?;
            let on_delete = OnDelete::from_pg_code(&code)
                .ok_or_else(|| DbError::new(format!("unknown referential action '{code}'")))?;
            let target_table: Option<String> = row.try_get(4)?;
            image.foreign_keys.insert(
                name.clone(),
                ForeignKeyImage {
                    name,
                    columns,
                    target_table: target_table.unwrap_or_default(),
                    target_columns: row.try_get(5)?,
                    on_delete,
                },
            );
        } else {
            image.unique_keys.insert(
                name.clone(),
                UniqueKeyImage {
                    name,
                    columns,
                    is_primary: kind == "p",
                    comment: row.try_get(7)?,
                },
            );
        }
    }

    for row in connection.query(SEQUENCES)? {
        let name: String = row.try_get(0)?;
        let table: Option<String> = row.try_get(1)?;
        let column: Option<String> = row.try_get(2)?;
        schema.sequences.insert(
            name.clone(),
            SequenceImage {
                name,
                owner: table.zip(column),
            },
        );
    }

    for row in connection.query(INDEXES)? {
        let name: String = row.try_get(0)?;
        schema.indexes.insert(
            name.clone(),
            IndexImage {
                name,
                table: row.try_get(1)?,
                columns: row.try_get(2)?,
            },
        );
    }

    for row in connection.query(PROCEDURES)? {
        let name: String = row.try_get(0)?;
        schema.procedures.insert(
            name.clone(),
            ProcedureImage {
                name,
                return_type: row.try_get(1)?,
                language: row.try_get(2)?,
                source: row.try_get(3)?,
            },
        );
    }

    for row in connection.query(TRIGGERS)? {
        let table: String = row.try_get(0)?;
        let name: String = row.try_get(1)?;
        let bits: i16 = row.try_get(2)?;
        let trigger = TriggerImage {
            name: name.clone(),
            timing: trigger_timing(bits),
            event: trigger_event(bits),
            procedure: row.try_get(3)?,
            comment: row.try_get(4)?,
        };
        table_mut(&mut schema, &table)?
            .triggers
            .insert(name, trigger);
    }

    let mut catalog = Catalog::default();
    catalog.schemas.insert(PUBLIC_SCHEMA.to_string(), schema);
    Ok(catalog)
}

fn table_mut<'a>(schema: &'a mut SchemaImage, name: &str) -> Result<&'a mut TableImage, DbError> {
    schema
        .tables
        .get_mut(name)
        .ok_or_else(|| DbError::new(format!("table '{name}' vanished during introspection")))
}

fn trigger_timing(bits: i16) -> TriggerTiming {
    if bits & TRIGGER_TYPE_BEFORE != 0 {
        TriggerTiming::Before
    } else {
        TriggerTiming::After
    }
}

fn trigger_event(bits: i16) -> TriggerEvent {
    if bits & TRIGGER_TYPE_INSERT != 0 {
        TriggerEvent::Insert
    } else if bits & TRIGGER_TYPE_DELETE != 0 {
        TriggerEvent::Delete
    } else if bits & TRIGGER_TYPE_UPDATE != 0 {
        TriggerEvent::Update
    } else {
        TriggerEvent::Insert
    }
}
