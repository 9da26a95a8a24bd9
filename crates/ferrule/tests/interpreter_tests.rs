//! Interpreter lifecycle and module resolution tests

use std::fs;

use ferrule::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn data_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

fn interpreter_in(dir: &TempDir) -> Interpreter {
    let config = InterpreterConfig::new()
        .include_current_dir(false)
        .with_search_path(dir.path());
    Interpreter::with_config(config).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════
// Data Modules
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_data_module_attributes() {
    let dir = data_dir(&[("settings.json", r#"{"level": 3, "names": ["a", "b"]}"#)]);
    let interp = interpreter_in(&dir);

    let settings = interp.resolve_module("settings").unwrap();
    assert_eq!(settings.name(), "settings");
    assert_eq!(settings.attr_names(), ["level", "names"]);
    assert_eq!(interp.get_attr("settings", &["level"]).unwrap().to_int(), Ok(3));

    let names = List::try_from(interp.get_attr("settings", &["names"]).unwrap()).unwrap();
    assert_eq!(names.len(), 2);
    assert_eq!(interp.loaded_modules().unwrap(), ["settings"]);
}

#[test]
fn test_first_search_path_wins() {
    let first = data_dir(&[("m.json", r#"{"source": "first"}"#)]);
    let second = data_dir(&[("m.json", r#"{"source": "second"}"#)]);
    let interp = interpreter_in(&first);
    interp.add_search_path(second.path()).unwrap();

    let source = interp.get_attr("m", &["source"]).unwrap();
    assert_eq!(source.to_text().unwrap(), "first");
}

#[test]
fn test_invalid_data_modules() {
    let dir = data_dir(&[("list.json", "[1, 2]"), ("broken.json", "{")]);
    let interp = interpreter_in(&dir);

    assert!(matches!(interp.resolve_module("list"), Err(Error::Module(_))));
    assert!(matches!(interp.resolve_module("broken"), Err(Error::Module(_))));
    assert!(interp.loaded_modules().unwrap().is_empty());
}

#[test]
fn test_configured_imports() {
    let dir = data_dir(&[("boot.json", r#"{"ok": true}"#)]);
    let config = InterpreterConfig::new()
        .include_current_dir(false)
        .with_search_path(dir.path())
        .with_import("boot");
    let mut interp = Interpreter::with_config(config).unwrap();
    assert_eq!(interp.loaded_modules().unwrap(), ["boot"]);

    interp.finalize();
    interp.initialize().unwrap();
    assert_eq!(interp.loaded_modules().unwrap(), ["boot"]);
}

#[test]
fn test_attribute_path_errors() {
    let dir = data_dir(&[("cfg.json", r#"{"x": 1}"#)]);
    let interp = interpreter_in(&dir);

    assert!(matches!(
        interp.get_attr("cfg", &["y"]),
        Err(Error::Attribute(_))
    ));
    assert!(matches!(
        interp.get_attr("cfg", &["x", "real"]),
        Err(Error::Attribute(_))
    ));
    assert!(interp.get_attr("cfg", &[]).unwrap().is_module());
}

// ═══════════════════════════════════════════════════════════════════════
// Native Modules
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_native_function_receives_arguments() {
    let mut interp = Interpreter::with_config(InterpreterConfig::new()).unwrap();
    interp.register_module("stats", |module| {
        module.add_function("total", |rt, args| {
            let mut sum = 0i64;
            for arg in args {
                sum += arg.to_int()?;
            }
            sum.to_foreign(rt)
        })?;
        Ok(())
    });

    let total = interp.get_attr("stats", &["total"]).unwrap();
    let args = List::from_items(interp.runtime(), [1i64, 2, 3]).unwrap();
    assert_eq!(total.call_list(&args).unwrap().to_int(), Ok(6));

    let bad = List::from_items(interp.runtime(), ["x"]).unwrap();
    assert!(matches!(total.call_list(&bad), Err(Error::Type { .. })));
    assert!(matches!(args.call0(), Err(Error::Type { .. })));
}

#[test]
fn test_finalize_reports_no_leaks() {
    let dir = data_dir(&[("d.json", r#"{"nested": {"deep": [1, 2, {"k": null}]}}"#)]);
    let mut interp = interpreter_in(&dir);
    {
        let deep = interp.get_attr("d", &["nested"]).unwrap();
        assert!(deep.is_dict());
    }
    assert_eq!(interp.finalize(), 0);
    assert_eq!(interp.runtime().live_objects(), 0);
}

// ═══════════════════════════════════════════════════════════════════════
// End to End
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_build_and_read_nested_structure() {
    let mut interp = Interpreter::with_config(InterpreterConfig::new()).unwrap();
    {
        let rt = interp.runtime();
        let before = rt.stats();

        {
            let m = serde_json::json!({"x": 1, "y": [2, 3]}).to_foreign(rt).unwrap();
            assert_eq!(m.to_string(), "{'x': 1, 'y': [2, 3]}");

            let m = Dict::try_from(m).unwrap();
            let y = List::try_from(m.get("y", true).unwrap()).unwrap();
            assert_eq!(y.get(1).unwrap().extract::<i64>(), Ok(3));
            drop(y);
            drop(m);
        }

        let after = rt.stats();
        assert_eq!(after.outstanding(), before.outstanding());
        assert_eq!(after.live(), before.live());
    }
    assert_eq!(interp.finalize(), 0);
}
