//! Prompt loader for YAML prompt definitions.

use crate::types::{PromptDefinition, DEFAULT_PROMPT_ID};
use std::path::{Path, PathBuf};
use tutor_core::{AppError, AppResult};

/// Load a prompt definition by ID.
///
/// Looks for `<id>.yml` or `<id>.yaml` in `.tutor/prompts/`. A workspace file
/// overrides the built-in definition of the same ID; the built-in
/// `textbook.rag.default` is used when no file exists.
///
/// # Example
/// ```no_run
/// use tutor_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "textbook.rag.default")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let Some(prompt_file) = find_prompt_file(workspace_path, prompt_id) else {
        if prompt_id == DEFAULT_PROMPT_ID {
            tracing::debug!("Using built-in prompt {}", DEFAULT_PROMPT_ID);
            return Ok(PromptDefinition::textbook_default());
        }
        return Err(AppError::Prompt(format!(
            "Prompt '{}' not found in {:?}",
            prompt_id,
            prompts_dir(workspace_path)
        )));
    };

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List all available prompt IDs, the built-in one included.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids = vec![DEFAULT_PROMPT_ID.to_string()];
    let dir = prompts_dir(workspace_path);

    if !dir.exists() {
        return Ok(prompt_ids);
    }

    for entry in walkdir::WalkDir::new(&dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yml") | Some("yaml")
        );
        if path.is_file() && is_yaml {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !prompt_ids.iter().any(|id| id == stem) {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    Ok(prompt_ids)
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".tutor").join("prompts")
}

fn find_prompt_file(workspace_path: &Path, prompt_id: &str) -> Option<PathBuf> {
    let dir = prompts_dir(workspace_path);
    ["yml", "yaml"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", prompt_id, ext)))
        .find(|p| p.is_file())
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: '{}'. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if def.system.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt system instructions cannot be empty".to_string(),
        ));
    }

    Ok(())
}
