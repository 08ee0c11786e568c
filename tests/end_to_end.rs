//! End-to-end forward/reverse pass tests against a real temp project tree.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use srcview::driver::{
    backup_path, forward_file, publish_views, reverse_file, run_forward, run_reverse,
};
use srcview::layout::{DiskLayout, ProjectLayout, CONTROLLERS_DIR, VIEWS_DIR};
use srcview::views::VIEW_FILE_NAME;
use srcview::SrcviewError;

const FOO_CONTROLLER: &str = r#"using System.Web.Mvc;

namespace SampleApp.Controllers
{
    public class FooController : Controller
    {
        public ActionResult Index()
        {
            return View();
        }
    }
}
"#;

/// Creates `Web/Controllers` and `Web/Views` under a temp root, plus a view
/// directory per controller name given.
fn scaffold(root: &Path, view_names: &[&str]) -> DiskLayout {
    let web = root.join("Web");
    fs::create_dir_all(web.join(CONTROLLERS_DIR)).unwrap();
    for name in view_names {
        fs::create_dir_all(web.join(VIEWS_DIR).join(name)).unwrap();
    }
    if view_names.is_empty() {
        fs::create_dir_all(web.join(VIEWS_DIR)).unwrap();
    }
    DiskLayout::at(web)
}

fn write_controller(layout: &DiskLayout, file: &str, text: &str) -> PathBuf {
    let path = layout.controllers_dir().join(file);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn forward_injects_action_and_writes_view() {
    let tmp = TempDir::new().unwrap();
    let layout = scaffold(tmp.path(), &["Foo"]);
    let path = write_controller(&layout, "FooController.cs", FOO_CONTROLLER);

    let outcome = forward_file(&layout, &path).unwrap();
    assert_eq!(outcome.affected, vec!["Foo"]);

    let transformed = fs::read_to_string(&path).unwrap();
    assert!(transformed.contains("public ActionResult Source()"));
    assert!(transformed.contains("return View(\"Source\");"));
    // Original members are still present.
    assert!(transformed.contains("public ActionResult Index()"));

    let view = layout
        .views_dir_for("Foo")
        .unwrap()
        .join(VIEW_FILE_NAME);
    let html = fs::read_to_string(view).unwrap();
    assert!(html.starts_with("<pre>\n"));
    assert!(html.ends_with("</pre>\n"));
    // The view embeds the full transformed source verbatim.
    assert!(html.contains(&transformed));

    // Backup holds the untouched original.
    let backup = fs::read_to_string(backup_path(&path)).unwrap();
    assert_eq!(backup, FOO_CONTROLLER);
}

#[test]
fn reverse_restores_byte_identical_original_and_deletes_backup() {
    let tmp = TempDir::new().unwrap();
    let layout = scaffold(tmp.path(), &["Foo"]);
    let path = write_controller(&layout, "FooController.cs", FOO_CONTROLLER);

    forward_file(&layout, &path).unwrap();
    assert_ne!(fs::read_to_string(&path).unwrap(), FOO_CONTROLLER);

    reverse_file(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), FOO_CONTROLLER);
    assert!(!backup_path(&path).exists());
}

#[test]
fn reverse_without_forward_is_backup_missing() {
    let tmp = TempDir::new().unwrap();
    let layout = scaffold(tmp.path(), &[]);
    let path = write_controller(&layout, "FooController.cs", FOO_CONTROLLER);

    let err = reverse_file(&path).unwrap_err();
    assert!(matches!(err, SrcviewError::BackupMissing { .. }));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn zero_matches_yields_empty_affected_and_no_views() {
    let tmp = TempDir::new().unwrap();
    let layout = scaffold(tmp.path(), &[]);
    let src = "namespace App\n{\n    public class Helper\n    {\n        public int N() { return 1; }\n    }\n}\n";
    let path = write_controller(&layout, "Helper.cs", src);

    let outcome = forward_file(&layout, &path).unwrap();
    assert!(outcome.affected.is_empty());

    // Round-trip still restores the exact original bytes.
    reverse_file(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), src);
}

#[test]
fn multiple_matching_classes_all_receive_the_action() {
    let tmp = TempDir::new().unwrap();
    let layout = scaffold(tmp.path(), &["A", "B"]);
    let src = "public class AController : Controller { }\npublic class BController : Controller { }\n";
    let path = write_controller(&layout, "Both.cs", src);

    let outcome = forward_file(&layout, &path).unwrap();
    assert_eq!(outcome.affected, vec!["A", "B"]);

    let transformed = fs::read_to_string(&path).unwrap();
    assert_eq!(
        transformed.matches("public ActionResult Source()").count(),
        2
    );
}

#[test]
fn alias_base_type_does_not_match() {
    let tmp = TempDir::new().unwrap();
    let layout = scaffold(tmp.path(), &[]);
    let src = "public class FooController : BaseController { }\n";
    let path = write_controller(&layout, "FooController.cs", src);

    let outcome = forward_file(&layout, &path).unwrap();
    assert!(outcome.affected.is_empty());
    assert!(!fs::read_to_string(&path).unwrap().contains("Source()"));
}

#[test]
fn parse_failure_touches_nothing() {
    let tmp = TempDir::new().unwrap();
    let layout = scaffold(tmp.path(), &[]);
    let src = "public class Broken : Controller {\n";
    let path = write_controller(&layout, "Broken.cs", src);

    let err = forward_file(&layout, &path).unwrap_err();
    assert_eq!(err.exit_code(), 3);
    assert_eq!(fs::read_to_string(&path).unwrap(), src);
    assert!(!backup_path(&path).exists());
}

#[test]
fn run_forward_processes_files_in_sorted_order() {
    let tmp = TempDir::new().unwrap();
    let layout = scaffold(tmp.path(), &["A", "B"]);
    write_controller(
        &layout,
        "BController.cs",
        "public class BController : Controller { }\n",
    );
    write_controller(
        &layout,
        "AController.cs",
        "public class AController : Controller { }\n",
    );

    let outcomes = run_forward(&layout).unwrap();
    let names: Vec<_> = outcomes
        .iter()
        .map(|o| o.path.file_name().unwrap().to_str().unwrap())
        .collect();
    assert_eq!(names, vec!["AController.cs", "BController.cs"]);
}

#[test]
fn run_forward_aborts_on_first_failure() {
    let tmp = TempDir::new().unwrap();
    let layout = scaffold(tmp.path(), &["A", "C"]);
    write_controller(
        &layout,
        "AController.cs",
        "public class AController : Controller { }\n",
    );
    write_controller(&layout, "BController.cs", "class Broken {\n");
    let c = write_controller(
        &layout,
        "CController.cs",
        "public class CController : Controller { }\n",
    );

    assert!(run_forward(&layout).is_err());
    // A (sorted first) was transformed; C (after the failure) was not.
    assert!(backup_path(&layout.controllers_dir().join("AController.cs")).exists());
    assert!(!backup_path(&c).exists());
}

#[test]
fn publish_copies_views_for_release_profile_only() {
    let tmp = TempDir::new().unwrap();
    let layout = scaffold(tmp.path(), &["Foo"]);
    let path = write_controller(&layout, "FooController.cs", FOO_CONTROLLER);
    forward_file(&layout, &path).unwrap();

    let debug_target = tmp.path().join("out-debug");
    run_reverse(&layout, &debug_target, "Debug").unwrap();
    assert!(!debug_target.exists());

    // Forward again so the reverse pass has a backup to consume.
    forward_file(&layout, &path).unwrap();
    let release_target = tmp.path().join("out-release");
    run_reverse(&layout, &release_target, "Release").unwrap();
    let published = release_target.join(VIEWS_DIR).join("Foo").join(VIEW_FILE_NAME);
    assert!(published.is_file());
    assert_eq!(fs::read_to_string(&path).unwrap(), FOO_CONTROLLER);
}

#[test]
fn publish_skips_view_dirs_without_generated_file() {
    let tmp = TempDir::new().unwrap();
    let layout = scaffold(tmp.path(), &["Foo", "Empty"]);
    let path = write_controller(&layout, "FooController.cs", FOO_CONTROLLER);
    forward_file(&layout, &path).unwrap();

    let target = tmp.path().join("publish");
    publish_views(&layout, &target).unwrap();
    assert!(target.join(VIEWS_DIR).join("Foo").join(VIEW_FILE_NAME).is_file());
    assert!(!target.join(VIEWS_DIR).join("Empty").exists());
}

#[test]
fn forward_then_reverse_is_identity_for_normalized_and_messy_input() {
    let tmp = TempDir::new().unwrap();
    let layout = scaffold(tmp.path(), &["Messy"]);
    let src = "using System;\nnamespace X{  public class MessyController:Controller{ public int  N(){return 2;} }}\n";
    let path = write_controller(&layout, "MessyController.cs", src);

    forward_file(&layout, &path).unwrap();
    reverse_file(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), src);
}

#[test]
fn second_forward_pass_is_stable_on_normalized_text() {
    let tmp = TempDir::new().unwrap();
    let layout = scaffold(tmp.path(), &["Foo"]);
    let path = write_controller(&layout, "FooController.cs", FOO_CONTROLLER);

    forward_file(&layout, &path).unwrap();
    let first = fs::read_to_string(&path).unwrap();

    // Re-running forward on the transformed text injects a second copy (the
    // tool never guards against double application; the build scripts call
    // it exactly once). What must hold is that parsing its own output works
    // and the original is still recoverable from the first backup.
    reverse_file(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), FOO_CONTROLLER);
    assert!(srcview_cst::parse_unit(&first).is_ok());
}
