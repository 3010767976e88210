//! PL/pgSQL bodies for generated identity keys.
//!
//! Each key generator renders an `IF NEW.{column} IS NULL THEN ... END IF;`
//! block. [`primary_key_procedure`] wraps the blocks of every generated
//! column of a primary key into the body of one `BEFORE INSERT` trigger
//! procedure.

use crate::Ident;

const LETTERS: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";

/// Body of the trigger procedure that fills in a new record's key.
pub fn primary_key_procedure<T: AsRef<str>>(parts: &[T]) -> String {
    let mut source = String::from("\nBEGIN\n");
    for part in parts {
        for line in part.as_ref().lines() {
            source.push_str("    ");
            source.push_str(line);
            source.push('\n');
        }
    }
    source.push_str("    RETURN NEW;\nEND;\n");
    source
}

/// A random integer in `1..=999999999`.
pub fn integer_random_key(_table_name: &str, name: &str) -> String {
    let name = Ident(name);
    format!(
        "IF NEW.{name} IS NULL THEN\n    NEW.{name} := TRUNC((RANDOM()*999999999) + 1);\nEND IF;\n"
    )
}

/// A random token shaped like `A00A0000`, drawn from unambiguous letters.
pub fn text_random_key(_table_name: &str, name: &str) -> String {
    let name = Ident(name);
    let letters = LETTERS.chars().map(String::from).collect::<Vec<_>>().join(",");
    let digits = DIGITS.chars().map(String::from).collect::<Vec<_>>().join(",");
    let one_letter = format!("_letters[1 + TRUNC(RANDOM()*{})]", LETTERS.len());
    let one_digit = format!("_digits[1 + TRUNC(RANDOM()*{})]", DIGITS.len());
    let pattern = [
        &one_letter,
        &one_digit,
        &one_digit,
        &one_letter,
        &one_digit,
        &one_digit,
        &one_digit,
        &one_digit,
    ];

    let mut source = String::new();
    source.push_str(&format!("IF NEW.{name} IS NULL THEN\n"));
    source.push_str("    DECLARE\n");
    source.push_str(&format!("        _letters text[] := '{{{letters}}}';\n"));
    source.push_str(&format!("        _digits text[] := '{{{digits}}}';\n"));
    source.push_str("    BEGIN\n");
    source.push_str(&format!("        NEW.{name} :=\n"));
    for (index, item) in pattern.iter().enumerate() {
        let end = if index + 1 < pattern.len() { " ||" } else { ";" };
        source.push_str(&format!("            {item}{end}\n"));
    }
    source.push_str("    END;\n");
    source.push_str("END IF;\n");
    source
}

/// The next integer after the largest existing value among records that
/// share the basis columns with the new one.
pub fn integer_offset_key<T: AsRef<str>>(table_name: &str, name: &str, basis_names: &[T]) -> String {
    let conditions = basis_conditions(basis_names);
    let name = Ident(name);

    let mut source = String::new();
    source.push_str(&format!("IF NEW.{name} IS NULL THEN\n"));
    source.push_str("    DECLARE\n");
    source.push_str("        _offset int4;\n");
    source.push_str("    BEGIN\n");
    source.push_str(&format!("        SELECT MAX({name}) INTO _offset\n"));
    if conditions.is_empty() {
        source.push_str(&format!("            FROM {};\n", Ident(table_name)));
    } else {
        source.push_str(&format!("            FROM {}\n", Ident(table_name)));
        source.push_str(&format!("            WHERE {};\n", conditions.join(" AND ")));
    }
    source.push_str(&format!("        NEW.{name} := COALESCE(_offset, 0) + 1;\n"));
    source.push_str("    END;\n");
    source.push_str("END IF;\n");
    source
}

/// Like [`integer_offset_key`], for three-digit zero-padded text values.
pub fn text_offset_key<T: AsRef<str>>(table_name: &str, name: &str, basis_names: &[T]) -> String {
    let mut conditions = basis_conditions(basis_names);
    let name = Ident(name);
    conditions.push(format!("{name} ~ '^[0-9]{{3}}$'"));

    let mut source = String::new();
    source.push_str(&format!("IF NEW.{name} IS NULL THEN\n"));
    source.push_str("    DECLARE\n");
    source.push_str("        _offset int4;\n");
    source.push_str("    BEGIN\n");
    source.push_str(&format!("        SELECT CAST(MAX({name}) AS int4) INTO _offset\n"));
    source.push_str(&format!("            FROM {}\n", Ident(table_name)));
    source.push_str(&format!("            WHERE {};\n", conditions.join(" AND ")));
    source.push_str(&format!(
        "        NEW.{name} := TO_CHAR(COALESCE(_offset, 0) + 1, 'FM000');\n"
    ));
    source.push_str("    END;\n");
    source.push_str("END IF;\n");
    source
}

fn basis_conditions<T: AsRef<str>>(basis_names: &[T]) -> Vec<String> {
    basis_names
        .iter()
        .map(|basis| {
            let basis = Ident(basis.as_ref());
            format!("{basis} = NEW.{basis}")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_random_key() {
        assert_eq!(
            integer_random_key("individual", "code"),
            "IF NEW.\"code\" IS NULL THEN\n    NEW.\"code\" := TRUNC((RANDOM()*999999999) + 1);\nEND IF;\n"
        );
    }

    #[test]
    fn test_text_random_key() {
        let source = text_random_key("individual", "code");
        assert!(source.starts_with("IF NEW.\"code\" IS NULL THEN\n    DECLARE\n"));
        assert!(source.contains(
            "        _letters text[] := '{A,B,C,D,E,F,G,H,J,K,L,M,N,P,Q,R,S,T,U,V,W,X,Y,Z}';\n"
        ));
        assert!(source.contains("        _digits text[] := '{0,1,2,3,4,5,6,7,8,9}';\n"));
        assert_eq!(source.matches("_letters[1 + TRUNC(RANDOM()*24)]").count(), 2);
        assert_eq!(source.matches("_digits[1 + TRUNC(RANDOM()*10)]").count(), 6);
        assert!(source.contains("            _digits[1 + TRUNC(RANDOM()*10)];\n    END;\nEND IF;\n"));
    }

    #[test]
    fn test_integer_offset_key_without_basis() {
        assert_eq!(
            integer_offset_key::<&str>("individual", "no", &[]),
            "IF NEW.\"no\" IS NULL THEN\n\
             \x20   DECLARE\n\
             \x20       _offset int4;\n\
             \x20   BEGIN\n\
             \x20       SELECT MAX(\"no\") INTO _offset\n\
             \x20           FROM \"individual\";\n\
             \x20       NEW.\"no\" := COALESCE(_offset, 0) + 1;\n\
             \x20   END;\n\
             END IF;\n"
        );
    }

    #[test]
    fn test_text_offset_key_with_basis() {
        let source = text_offset_key("visit", "seq", &["individual_id"]);
        assert!(source.contains(
            "            WHERE \"individual_id\" = NEW.\"individual_id\" AND \"seq\" ~ '^[0-9]{3}$';\n"
        ));
        assert!(source.contains("SELECT CAST(MAX(\"seq\") AS int4) INTO _offset"));
        assert!(source.contains("TO_CHAR(COALESCE(_offset, 0) + 1, 'FM000')"));
    }

    #[test]
    fn test_primary_key_procedure() {
        let source = primary_key_procedure(&["A;\nB;\n", "C;\n"]);
        assert_eq!(source, "\nBEGIN\n    A;\n    B;\n    C;\n    RETURN NEW;\nEND;\n");
    }
}
