use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ds_core::DialogError;
use ds_runtime::{parse_dialog, DialogSet, ScriptDialogOptions};
use tracing::debug;
use walkdir::WalkDir;

use crate::{CliFailure, LoadedScripts, DIALOG_FILE_SUFFIX};

pub(crate) fn load_scripts(scripts_dir: &str) -> Result<LoadedScripts, DialogError> {
    let scripts_root = resolve_scripts_dir(scripts_dir)?;
    let sources = read_dialog_sources(&scripts_root)?;

    let mut dialogs = DialogSet::new();
    let mut origins = BTreeMap::<String, String>::new();
    for (relative, content) in sources {
        let definition = parse_dialog(&content).map_err(|error| {
            DialogError::new(error.code, format!("{}: {}", relative, error.message))
        })?;
        if let Some(previous) = origins.get(&definition.id) {
            return Err(CliFailure::SourceDuplicate.error(format!(
                "\"{}\" in both {} and {}",
                definition.id, previous, relative
            )));
        }
        origins.insert(definition.id.clone(), relative.clone());
        debug!(dialog = %definition.id, file = %relative, "loaded dialog");
        dialogs.add(definition.into_dialog(ScriptDialogOptions::default())?);
    }

    Ok(LoadedScripts {
        scripts_dir: scripts_root,
        dialogs,
    })
}

pub(crate) fn resolve_scripts_dir(scripts_dir: &str) -> Result<PathBuf, DialogError> {
    let path = PathBuf::from(scripts_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(|error| CliFailure::SourcePath.error(error))?
            .join(path)
    };

    if !absolute.exists() {
        return Err(CliFailure::SourceNotFound.error(absolute.display()));
    }

    if !absolute.is_dir() {
        return Err(CliFailure::SourceNotDir.error(absolute.display()));
    }

    Ok(absolute)
}

pub(crate) fn read_dialog_sources(
    scripts_dir: &Path,
) -> Result<BTreeMap<String, String>, DialogError> {
    let mut sources = BTreeMap::new();

    for entry in WalkDir::new(scripts_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !path.to_string_lossy().ends_with(DIALOG_FILE_SUFFIX) {
            continue;
        }

        let relative = path
            .strip_prefix(scripts_dir)
            .map_err(|error| CliFailure::SourceScan.error(error))?
            .to_string_lossy()
            .replace('\\', "/");

        let content = fs::read_to_string(path)
            .map_err(|error| CliFailure::SourceRead.error(format!("{}: {}", relative, error)))?;
        sources.insert(relative, content);
    }

    if sources.is_empty() {
        return Err(CliFailure::SourceEmpty.error(scripts_dir.display()));
    }

    Ok(sources)
}

#[cfg(test)]
mod source_loader_tests {
    use super::*;
    use crate::cli_test_support::*;

    #[test]
    fn resolve_scripts_dir_validates_existence_and_directory() {
        let missing = temp_path("missing-dir");
        let missing_err = resolve_scripts_dir(missing.to_string_lossy().as_ref())
            .expect_err("missing path should fail");
        assert_eq!(missing_err.code, "CLI_SOURCE_NOT_FOUND");

        let file_path = temp_path("plain-file");
        write_file(&file_path, "x");
        let file_err = resolve_scripts_dir(file_path.to_string_lossy().as_ref())
            .expect_err("file path should fail");
        assert_eq!(file_err.code, "CLI_SOURCE_NOT_DIR");
    }

    #[test]
    fn read_dialog_sources_only_picks_dialog_files() {
        let root = temp_path("scripts-dir");
        write_file(&root.join("main.dialog.json"), GREETING_DIALOG);
        write_file(&root.join("nested/extra.dialog.json"), "{}");
        write_file(&root.join("data.json"), "{\"ok\":true}");
        write_file(&root.join("notes.txt"), "ignored");

        let sources = read_dialog_sources(&root).expect("scan should pass");
        assert_eq!(
            sources.keys().cloned().collect::<Vec<_>>(),
            vec!["main.dialog.json".to_string(), "nested/extra.dialog.json".to_string()]
        );
    }

    #[test]
    fn read_dialog_sources_errors_when_empty() {
        let root = temp_path("empty-scripts-dir");
        write_file(&root.join("readme.txt"), "not a dialog");
        let error = read_dialog_sources(&root).expect_err("empty source set should fail");
        assert_eq!(error.code, "CLI_SOURCE_EMPTY");
    }

    #[test]
    fn load_scripts_registers_dialogs_by_id() {
        let root = temp_path("load-scripts");
        write_file(&root.join("main.dialog.json"), GREETING_DIALOG);
        let loaded = load_scripts(&root.to_string_lossy()).expect("load should pass");
        assert!(loaded.dialogs.contains("main"));
        assert!(loaded.scripts_dir.is_absolute());
    }

    #[test]
    fn duplicate_dialog_ids_are_rejected() {
        let root = temp_path("duplicate-scripts");
        write_file(&root.join("a.dialog.json"), GREETING_DIALOG);
        write_file(&root.join("b.dialog.json"), GREETING_DIALOG);
        let error = load_scripts(&root.to_string_lossy()).expect_err("duplicate should fail");
        assert_eq!(error.code, "CLI_SOURCE_DUPLICATE");
    }

    #[test]
    fn invalid_dialog_file_names_the_file() {
        let root = temp_path("invalid-scripts");
        write_file(&root.join("broken.dialog.json"), "{ nope");
        let error = load_scripts(&root.to_string_lossy()).expect_err("invalid should fail");
        assert_eq!(error.code, "BUILD_SCRIPT_INVALID");
        assert!(error.message.starts_with("broken.dialog.json"));
    }
}
