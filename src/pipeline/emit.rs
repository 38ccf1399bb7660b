// emit.rs
// Phase 4: Write the JSON table, the struct stub and the assignment stub

use crate::error::{Error, Result};
use crate::table::OffsetTable;
use std::collections::HashMap;
use std::path::Path;

/// Integer type used for every generated struct field.
const FIELD_TYPE: &str = "DWORD";

/// How the assignment stub looks values up at runtime.
#[derive(Debug, Clone)]
pub struct AccessorConfig {
    /// Function called as `function(handle, "namespace", "symbol")`.
    pub function: String,
    pub handle: String,
}

impl Default for AccessorConfig {
    fn default() -> Self {
        Self {
            function: "findOffsetByName".to_string(),
            handle: "j".to_string(),
        }
    }
}

/// Turn a dumped name into a C++ identifier fragment.
pub fn sanitize(name: &str) -> String {
    name.replace("::", "_").replace([' ', '-'], "_")
}

/// Fail if two distinct names would become the same identifier, either two
/// namespaces or two symbols inside one namespace.
pub fn check_identifiers(table: &OffsetTable) -> Result<()> {
    let mut namespaces: HashMap<String, &str> = HashMap::new();

    for (ns, symbols) in table.namespaces() {
        if let Some(first) = namespaces.insert(sanitize(ns), ns) {
            return Err(Error::IdentifierCollision {
                namespace: None,
                first: first.to_string(),
                second: ns.to_string(),
                sanitized: sanitize(ns),
            });
        }

        let mut fields: HashMap<String, &str> = HashMap::new();
        for sym in symbols.keys() {
            if let Some(first) = fields.insert(sanitize(sym), sym) {
                return Err(Error::IdentifierCollision {
                    namespace: Some(ns.to_string()),
                    first: first.to_string(),
                    second: sym.to_string(),
                    sanitized: sanitize(sym),
                });
            }
        }
    }

    Ok(())
}

/// One `inline struct` per namespace, fields declared but never initialized.
pub fn render_type_stub(table: &OffsetTable) -> String {
    let mut out = String::new();

    for (ns, symbols) in table.namespaces() {
        let ns = sanitize(ns);
        out.push_str(&format!("inline struct {}Offsets {{\n", ns));
        for sym in symbols.keys() {
            out.push_str(&format!("\t{} {};\n", FIELD_TYPE, sanitize(sym)));
        }
        out.push_str(&format!("}} {};\n\n", ns));
    }

    out
}

/// Escape a name for use inside a C++ string literal.
fn cpp_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Statements copying each offset from the runtime lookup into its struct field.
pub fn render_assignment_stub(table: &OffsetTable, accessor: &AccessorConfig) -> String {
    let mut lines = Vec::new();

    for (ns, symbols) in table.namespaces() {
        lines.push(format!("// Assignments for {}", ns));
        lines.push(format!("// {} Offsets", ns));

        for sym in symbols.keys() {
            lines.push(format!(
                "{}.{} = {}({}, \"{}\", \"{}\");",
                sanitize(ns),
                sanitize(sym),
                accessor.function,
                accessor.handle,
                cpp_string(ns),
                cpp_string(sym)
            ));
        }

        lines.push(String::new());
    }

    lines.join("\n")
}

pub fn write_json(table: &OffsetTable, path: &Path) -> Result<()> {
    table.save_to_file(path)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

pub fn write_type_stub(table: &OffsetTable, path: &Path) -> Result<()> {
    std::fs::write(path, render_type_stub(table)).map_err(|e| Error::io(path, e))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Build the assignment stub from the JSON file on disk, not from memory.
pub fn write_assignment_stub(
    json_path: &Path,
    output_path: &Path,
    accessor: &AccessorConfig,
) -> Result<()> {
    log::debug!("Reading back {}", json_path.display());
    let table = OffsetTable::load_from_file(json_path)?;
    std::fs::write(output_path, render_assignment_stub(&table, accessor))
        .map_err(|e| Error::io(output_path, e))?;
    log::info!("Wrote {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(json: &str) -> OffsetTable {
        OffsetTable::from_json(json).unwrap()
    }

    #[test]
    fn sanitize_replaces_separators() {
        assert_eq!(sanitize("Render::Engine"), "Render_Engine");
        assert_eq!(sanitize("Offset One"), "Offset_One");
        assert_eq!(sanitize("client-dll"), "client_dll");
        assert_eq!(sanitize("a:::b"), "a_:b");
        assert_eq!(sanitize("plain"), "plain");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "",
            "::",
            ":::",
            "::::",
            "a: :b",
            "x - y",
            "Render::Engine",
            "Offset One",
            "m_pGameSceneNode",
            " -::- ",
            "ü :: ß",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn type_stub_layout() {
        let t = table(r#"{"client_dll": {"dwEntityList": "0x10", "dwViewMatrix": "0x20"}, "Render::Engine": {"Offset One": "0x4"}}"#);
        assert_eq!(
            render_type_stub(&t),
            "inline struct client_dllOffsets {\n\
             \tDWORD dwEntityList;\n\
             \tDWORD dwViewMatrix;\n\
             } client_dll;\n\n\
             inline struct Render_EngineOffsets {\n\
             \tDWORD Offset_One;\n\
             } Render_Engine;\n\n"
        );
    }

    #[test]
    fn type_stub_carries_no_values() {
        let t = table(r#"{"NS": {"Sym": "0xDEADBEEF"}}"#);
        assert!(!render_type_stub(&t).contains("0xDEADBEEF"));
    }

    #[test]
    fn assignment_stub_sanitizes_path_but_not_lookup_keys() {
        let t = table(r#"{"Render::Engine": {"Offset One": "0x4"}}"#);
        let stub = render_assignment_stub(&t, &AccessorConfig::default());
        assert_eq!(
            stub,
            "// Assignments for Render::Engine\n\
             // Render::Engine Offsets\n\
             Render_Engine.Offset_One = findOffsetByName(j, \"Render::Engine\", \"Offset One\");\n"
        );
    }

    #[test]
    fn assignment_stub_separates_namespaces_with_blank_line() {
        let t = table(r#"{"A": {"x": "0x1"}, "B": {"y": "0x2"}}"#);
        let accessor = AccessorConfig {
            function: "lookup".to_string(),
            handle: "doc".to_string(),
        };
        let stub = render_assignment_stub(&t, &accessor);
        assert_eq!(
            stub.lines().collect::<Vec<_>>(),
            vec![
                "// Assignments for A",
                "// A Offsets",
                "A.x = lookup(doc, \"A\", \"x\");",
                "",
                "// Assignments for B",
                "// B Offsets",
                "B.y = lookup(doc, \"B\", \"y\");",
            ]
        );
    }

    #[test]
    fn assignment_stub_escapes_quotes() {
        let t = table(r#"{"NS": {"say \"hi\"": "0x1"}}"#);
        let stub = render_assignment_stub(&t, &AccessorConfig::default());
        assert!(stub.contains(r#"findOffsetByName(j, "NS", "say \"hi\"")"#));
    }

    #[test]
    fn empty_table_renders_empty_stubs() {
        let t = OffsetTable::new();
        assert_eq!(render_type_stub(&t), "");
        assert_eq!(render_assignment_stub(&t, &AccessorConfig::default()), "");
    }

    #[test]
    fn collision_between_symbols_is_rejected() {
        let t = table(r#"{"NS": {"A B": "0x1", "A_B": "0x2"}}"#);
        match check_identifiers(&t) {
            Err(Error::IdentifierCollision {
                namespace,
                first,
                second,
                sanitized,
            }) => {
                assert_eq!(namespace.as_deref(), Some("NS"));
                assert_eq!(first, "A B");
                assert_eq!(second, "A_B");
                assert_eq!(sanitized, "A_B");
            }
            other => panic!("expected collision, got {:?}", other),
        }
    }

    #[test]
    fn collision_between_namespaces_is_rejected() {
        let t = table(r#"{"Render::Engine": {"a": "0x1"}, "Render_Engine": {"b": "0x2"}}"#);
        assert!(matches!(
            check_identifiers(&t),
            Err(Error::IdentifierCollision { namespace: None, .. })
        ));
    }

    #[test]
    fn same_symbol_in_different_namespaces_is_fine() {
        let t = table(r#"{"A": {"x": "0x1"}, "B": {"x": "0x2"}}"#);
        assert!(check_identifiers(&t).is_ok());
    }

    #[test]
    fn assignment_stub_is_driven_by_the_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("offsets.json");
        let out = dir.path().join("set_offsets.cpp");
        std::fs::write(&json, r#"{"Render::Engine": {"Offset One": "0x4"}}"#).unwrap();

        write_assignment_stub(&json, &out, &AccessorConfig::default()).unwrap();
        let stub = std::fs::read_to_string(&out).unwrap();
        assert!(stub.contains(
            "Render_Engine.Offset_One = findOffsetByName(j, \"Render::Engine\", \"Offset One\");"
        ));
    }

    #[test]
    fn assignment_stub_refuses_names_with_line_breaks() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("offsets.json");
        let out = dir.path().join("set_offsets.cpp");
        std::fs::write(&json, r#"{"A\nint evil;": {"x": "0x1"}}"#).unwrap();

        let err = write_assignment_stub(&json, &out, &AccessorConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidTable(_)));
        assert!(!out.exists());
    }

    #[test]
    fn assignment_stub_rejects_corrupt_json() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("offsets.json");
        std::fs::write(&json, "{ not json").unwrap();
        let err = write_assignment_stub(&json, &dir.path().join("o.cpp"), &AccessorConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }
}
