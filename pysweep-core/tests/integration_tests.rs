use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use pysweep_core::{ArtifactSweeper, SweepSettings, sweeper::SweepConfig};

/// 创建一个测试用的Python项目
fn create_python_project(root: &Path) -> Result<(usize, usize)> {
    // 普通源文件
    fs::create_dir_all(root.join("src/app/utils"))?;
    fs::write(root.join("setup.py"), "from setuptools import setup\nsetup()\n")?;
    fs::write(root.join("src/app/__init__.py"), "")?;
    fs::write(root.join("src/app/utils/io.py"), "def read(): pass\n")?;
    fs::write(root.join("src/app/notes.txt"), "keep me")?;

    // 字节码文件 (N = 3)
    fs::write(root.join("stray.pyc"), "stray")?;
    fs::write(root.join("src/app/legacy.pyc"), "legacy")?;
    fs::write(root.join("src/app/utils/io.pyo"), "optimized")?;

    // 缓存目录 (M = 2)
    fs::create_dir_all(root.join("src/app/__pycache__"))?;
    fs::write(root.join("src/app/__pycache__/__init__.cpython-312.pyc"), "c")?;
    fs::create_dir_all(root.join("src/app/utils/__pycache__/nested"))?;
    fs::write(root.join("src/app/utils/__pycache__/nested/io.pyc"), "c")?;

    Ok((3, 2))
}

/// Every path under `root`, relative and sorted
fn list_tree(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = collect_paths(root)
        .into_iter()
        .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
        .collect();
    paths.sort();
    paths
}

fn collect_paths(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path.clone());
            }
            out.push(path);
        }
    }
    out
}

#[test]
fn test_removes_exactly_matching_entries() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    let (files, dirs) = create_python_project(root)?;

    let report = ArtifactSweeper::default().sweep(root)?;

    assert!(report.is_success());
    assert_eq!(report.files_removed, files);
    assert_eq!(report.dirs_removed, dirs);
    assert_eq!(report.removed(), files + dirs);

    assert_eq!(
        list_tree(root),
        vec![
            PathBuf::from("setup.py"),
            PathBuf::from("src"),
            PathBuf::from("src/app"),
            PathBuf::from("src/app/__init__.py"),
            PathBuf::from("src/app/notes.txt"),
            PathBuf::from("src/app/utils"),
            PathBuf::from("src/app/utils/io.py"),
        ]
    );

    Ok(())
}

#[test]
fn test_second_run_is_idempotent() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    create_python_project(root)?;

    let sweeper = ArtifactSweeper::default();
    let first = sweeper.sweep(root)?;
    let tree_after_first = list_tree(root);
    let second = sweeper.sweep(root)?;

    assert!(first.removed() > 0);
    assert_eq!(second.removed(), 0);
    assert_eq!(second.bytes_freed, 0);
    assert!(second.is_success());
    assert_eq!(list_tree(root), tree_after_first);

    Ok(())
}

#[test]
fn test_minimal_tree() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path().join("project");
    fs::create_dir_all(root.join("__pycache__"))?;
    fs::write(root.join("a.pyc"), "a")?;
    fs::write(root.join("b.txt"), "b")?;
    fs::write(root.join("__pycache__/c.pyc"), "c")?;

    let report = ArtifactSweeper::default().sweep(&root)?;

    assert!(report.is_success());
    assert!(root.is_dir());
    assert_eq!(list_tree(&root), vec![PathBuf::from("b.txt")]);

    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unremovable_path_is_reported_and_others_removed() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    fs::create_dir_all(root.join("locked"))?;
    fs::write(root.join("locked/stuck.pyc"), "stuck")?;
    fs::create_dir_all(root.join("open/__pycache__"))?;
    fs::write(root.join("open/__pycache__/m.pyc"), "m")?;
    fs::write(root.join("open/free.pyc"), "free")?;

    // 只读目录中的文件无法删除
    fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o555))?;

    // Privileged users ignore directory permissions, nothing to observe then
    let write_check = root.join("locked/write_check");
    if fs::write(&write_check, "").is_ok() {
        let _ = fs::remove_file(&write_check);
        fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o755))?;
        return Ok(());
    }

    let report = ArtifactSweeper::default().sweep(root)?;

    fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o755))?;

    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, root.join("locked/stuck.pyc"));
    assert!(!report.failures[0].reason.is_empty());

    assert_eq!(report.files_removed, 1);
    assert_eq!(report.dirs_removed, 1);
    assert!(!root.join("open/__pycache__").exists());
    assert!(!root.join("open/free.pyc").exists());
    assert!(root.join("locked/stuck.pyc").exists());

    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_are_removed() -> Result<()> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::write(root.join(OsStr::from_bytes(b"mod\xff.pyc")), "bytecode")?;
    fs::write(root.join("kept.txt"), "keep")?;

    let report = ArtifactSweeper::default().sweep(root)?;

    assert!(report.is_success());
    assert_eq!(report.files_removed, 1);
    assert_eq!(list_tree(root), vec![PathBuf::from("kept.txt")]);

    Ok(())
}

#[test]
fn test_settings_drive_sweep() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    fs::write(
        root.join("pysweep.toml"),
        r#"
[cleanpy]
file-patterns = ["*.pyc"]
exclude = [".venv"]
"#,
    )?;
    fs::create_dir_all(root.join(".venv/lib/__pycache__"))?;
    fs::write(root.join(".venv/lib/__pycache__/site.pyc"), "venv")?;
    fs::write(root.join("kept.pyo"), "pyo")?;
    fs::write(root.join("gone.pyc"), "pyc")?;

    let settings = SweepSettings::discover(root)?;
    let report = ArtifactSweeper::new(settings.sweep_config()?).sweep(root)?;

    assert_eq!(report.removed(), 1);
    assert!(!root.join("gone.pyc").exists());
    assert!(root.join("kept.pyo").exists());
    assert!(root.join(".venv/lib/__pycache__/site.pyc").exists());

    Ok(())
}

#[test]
fn test_dry_run_then_real_run() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    let (files, dirs) = create_python_project(root)?;

    let preview = ArtifactSweeper::new(SweepConfig {
        dry_run: true,
        ..Default::default()
    })
    .sweep(root)?;
    assert_eq!(preview.removed(), files + dirs);
    assert!(root.join("stray.pyc").exists());

    let report = ArtifactSweeper::default().sweep(root)?;
    assert_eq!(report.removed(), preview.removed());
    assert!(!root.join("stray.pyc").exists());

    Ok(())
}
