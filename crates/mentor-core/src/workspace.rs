//! In-memory code workspace owned by a single session.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("File '{0}' already exists")]
    FileExists(String),

    #[error("File '{0}' not found")]
    FileNotFound(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;

const SUPPORTED_LANGUAGES: &[(&str, &[&str])] = &[
    ("python", &["py", "pyw"]),
    ("javascript", &["js", "mjs", "jsx"]),
    ("typescript", &["ts", "tsx"]),
    ("java", &["java"]),
    ("cpp", &["cpp", "h"]),
    ("csharp", &["cs"]),
    ("go", &["go"]),
    ("rust", &["rs"]),
    ("ruby", &["rb"]),
    ("php", &["php"]),
    ("swift", &["swift"]),
    ("kotlin", &["kt", "kts"]),
    ("html", &["html", "htm"]),
    ("css", &["css"]),
    ("sql", &["sql"]),
    ("shell", &["sh", "bash"]),
    ("powershell", &["ps1"]),
    ("r", &["r"]),
    ("perl", &["pl", "pm"]),
    ("lua", &["lua"]),
    ("scala", &["scala", "sc"]),
    ("haskell", &["hs"]),
    ("dart", &["dart"]),
    ("elixir", &["ex", "exs"]),
    ("clojure", &["clj", "cljs"]),
    ("fsharp", &["fs", "fsx"]),
    ("groovy", &["groovy"]),
    ("julia", &["jl"]),
    ("matlab", &["m"]),
    ("zig", &["zig"]),
    ("markdown", &["md"]),
];

/// Maps a file name to its language tag by extension. Unknown extensions are `plaintext`.
pub fn language_for_file_name(name: &str) -> &'static str {
    let Some((_, extension)) = name.rsplit_once('.') else {
        return "plaintext";
    };
    let extension = extension.to_ascii_lowercase();

    SUPPORTED_LANGUAGES
        .iter()
        .find(|(_, extensions)| extensions.contains(&extension.as_str()))
        .map(|(language, _)| *language)
        .unwrap_or("plaintext")
}

/// `src/app.js` -> `src/app.test.js`; names without an extension get `.test`.
pub fn test_file_name(source_name: &str) -> String {
    match source_name.rsplit_once('.') {
        Some((base, extension)) if !base.is_empty() => format!("{base}.test.{extension}"),
        _ => format!("{source_name}.test"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeFile {
    pub id: String,
    pub name: String,
    pub code: String,
    pub language: String,
}

impl CodeFile {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4().to_string(),
            language: language_for_file_name(&name).to_string(),
            name,
            code: code.into(),
        }
    }
}

/// What an explicit run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Preview { entry: String },
    NotPreviewable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceState {
    pub files: Vec<CodeFile>,
    pub active_file_id: Option<String>,
    pub output: String,
    pub preview_html: Option<String>,
}

impl WorkspaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file(&self, id: &str) -> Option<&CodeFile> {
        self.files.iter().find(|file| file.id == id)
    }

    pub fn file_by_name(&self, name: &str) -> Option<&CodeFile> {
        let name = name.trim();
        self.files.iter().find(|file| file.name == name)
    }

    pub fn active_file(&self) -> Option<&CodeFile> {
        self.active_file_id.as_deref().and_then(|id| self.file(id))
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.iter().map(|file| file.name.clone()).collect()
    }

    /// Inserts a new file and makes it active. Names are unique; a collision is rejected.
    pub fn create_file(&mut self, name: &str, code: &str) -> Result<&CodeFile> {
        let name = validate_name(name)?;
        if self.file_by_name(name).is_some() {
            return Err(WorkspaceError::FileExists(name.to_string()));
        }

        let file = CodeFile::new(name, code);
        self.active_file_id = Some(file.id.clone());
        self.files.push(file);
        Ok(&self.files[self.files.len() - 1])
    }

    pub fn update_file_by_name(&mut self, name: &str, code: &str) -> Result<&CodeFile> {
        let name = name.trim();
        let index = self
            .files
            .iter()
            .position(|file| file.name == name)
            .ok_or_else(|| WorkspaceError::FileNotFound(name.to_string()))?;
        self.files[index].code = code.to_string();
        Ok(&self.files[index])
    }

    pub fn update_file(&mut self, id: &str, code: &str) -> Result<&CodeFile> {
        let index = self.index_of(id)?;
        self.files[index].code = code.to_string();
        Ok(&self.files[index])
    }

    pub fn rename_file(&mut self, id: &str, new_name: &str) -> Result<&CodeFile> {
        let new_name = validate_name(new_name)?;
        let index = self.index_of(id)?;
        if self
            .files
            .iter()
            .any(|file| file.name == new_name && file.id != id)
        {
            return Err(WorkspaceError::FileExists(new_name.to_string()));
        }

        let file = &mut self.files[index];
        file.name = new_name.to_string();
        file.language = language_for_file_name(new_name).to_string();
        Ok(&self.files[index])
    }

    /// Removes a file; clears the active pointer when it referenced the removed file.
    pub fn delete_file(&mut self, id: &str) -> Result<CodeFile> {
        let index = self.index_of(id)?;
        let removed = self.files.remove(index);
        if self.active_file_id.as_deref() == Some(id) {
            self.active_file_id = None;
        }
        Ok(removed)
    }

    pub fn set_active(&mut self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) => {
                self.index_of(id)?;
                self.active_file_id = Some(id.to_string());
            }
            None => self.active_file_id = None,
        }
        Ok(())
    }

    pub fn append_output(&mut self, text: &str) {
        self.output.push_str(text);
        if !text.ends_with('\n') {
            self.output.push('\n');
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Rebuilds the preview document from the first HTML file, inlining every
    /// stylesheet and script in the workspace.
    pub fn run(&mut self) -> RunOutcome {
        let Some(entry) = self.files.iter().find(|file| file.language == "html") else {
            self.preview_html = None;
            self.append_output(
                "[run] No HTML entry point found. Only web projects can be previewed.",
            );
            return RunOutcome::NotPreviewable;
        };

        let styles: Vec<&str> = self
            .files
            .iter()
            .filter(|file| file.language == "css")
            .map(|file| file.code.as_str())
            .collect();
        let scripts: Vec<&str> = self
            .files
            .iter()
            .filter(|file| file.language == "javascript")
            .map(|file| file.code.as_str())
            .collect();

        let mut document = entry.code.clone();
        if !styles.is_empty() {
            let block = format!("<style>\n{}\n</style>", styles.join("\n"));
            document = insert_before_tag(&document, "</head>", &block, true);
        }
        if !scripts.is_empty() {
            let block = format!("<script>\n{}\n</script>", scripts.join("\n"));
            document = insert_before_tag(&document, "</body>", &block, false);
        }

        let entry_name = entry.name.clone();
        let message = format!(
            "[run] Preview built from {} ({} stylesheet(s), {} script(s))",
            entry_name,
            styles.len(),
            scripts.len()
        );
        self.preview_html = Some(document);
        self.append_output(&message);
        RunOutcome::Preview { entry: entry_name }
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.files
            .iter()
            .position(|file| file.id == id)
            .ok_or_else(|| WorkspaceError::FileNotFound(id.to_string()))
    }
}

fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WorkspaceError::InvalidName(
            "file name cannot be empty".to_string(),
        ));
    }
    Ok(name)
}

fn insert_before_tag(document: &str, tag: &str, block: &str, prepend_on_miss: bool) -> String {
    match document.to_ascii_lowercase().find(tag) {
        Some(position) => format!("{}{}\n{}", &document[..position], block, &document[position..]),
        None if prepend_on_miss => format!("{block}\n{document}"),
        None => format!("{document}\n{block}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_file_with_unique_name_adds_one_retrievable_file() {
        let mut workspace = WorkspaceState::new();
        workspace.create_file("main.py", "print(1)").unwrap();
        let before = workspace.len();

        let created = workspace.create_file("util.py", "x = 1").unwrap().clone();

        assert_eq!(workspace.len(), before + 1);
        let found = workspace.file_by_name("util.py").expect("file should exist");
        assert_eq!(found.id, created.id);
        assert_eq!(found.language, "python");
        assert_eq!(workspace.active_file_id.as_deref(), Some(created.id.as_str()));
    }

    #[test]
    fn padded_names_resolve_to_the_trimmed_file() {
        let mut workspace = WorkspaceState::new();
        workspace.create_file(" a.js ", "1").unwrap();

        let updated = workspace.update_file_by_name(" a.js ", "2").unwrap();

        assert_eq!(updated.name, "a.js");
        assert_eq!(updated.code, "2");
        assert!(workspace.file_by_name("a.js  ").is_some());
    }

    #[test]
    fn create_file_rejects_name_collision() {
        let mut workspace = WorkspaceState::new();
        workspace.create_file("index.html", "<p>a</p>").unwrap();

        let result = workspace.create_file("index.html", "<p>b</p>");

        assert_eq!(result, Err(WorkspaceError::FileExists("index.html".to_string())));
        assert_eq!(workspace.len(), 1);
        assert_eq!(workspace.files[0].code, "<p>a</p>");
    }

    #[test]
    fn update_preserves_identity_and_count() {
        let mut workspace = WorkspaceState::new();
        let id = workspace.create_file("app.js", "let a;").unwrap().id.clone();

        let updated = workspace.update_file_by_name("app.js", "let b;").unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.code, "let b;");
        assert_eq!(workspace.len(), 1);
    }

    #[test]
    fn update_missing_file_is_not_found() {
        let mut workspace = WorkspaceState::new();
        assert_eq!(
            workspace.update_file_by_name("ghost.js", ""),
            Err(WorkspaceError::FileNotFound("ghost.js".to_string()))
        );
    }

    #[test]
    fn deleting_active_file_clears_pointer() {
        let mut workspace = WorkspaceState::new();
        let first = workspace.create_file("a.css", "").unwrap().id.clone();
        let second = workspace.create_file("b.css", "").unwrap().id.clone();
        assert_eq!(workspace.active_file_id.as_deref(), Some(second.as_str()));

        workspace.delete_file(&second).unwrap();

        assert!(workspace.active_file_id.is_none());
        assert!(workspace.active_file().is_none());

        workspace.set_active(Some(first.as_str())).unwrap();
        workspace.delete_file(&second).unwrap_err();
        assert_eq!(workspace.active_file_id.as_deref(), Some(first.as_str()));
    }

    #[test]
    fn rename_refreshes_language_and_rejects_collisions() {
        let mut workspace = WorkspaceState::new();
        let id = workspace.create_file("notes.txt", "").unwrap().id.clone();
        workspace.create_file("readme.md", "").unwrap();

        let renamed = workspace.rename_file(&id, "notes.rs").unwrap();
        assert_eq!(renamed.language, "rust");

        assert_eq!(
            workspace.rename_file(&id, "readme.md"),
            Err(WorkspaceError::FileExists("readme.md".to_string()))
        );
    }

    #[test]
    fn language_lookup_covers_common_extensions() {
        assert_eq!(language_for_file_name("index.HTM"), "html");
        assert_eq!(language_for_file_name("types.tsx"), "typescript");
        assert_eq!(language_for_file_name("Makefile"), "plaintext");
        assert_eq!(language_for_file_name("data.xyz"), "plaintext");
    }

    #[test]
    fn test_file_name_follows_convention() {
        assert_eq!(test_file_name("app.js"), "app.test.js");
        assert_eq!(test_file_name("src/utils.py"), "src/utils.test.py");
        assert_eq!(test_file_name("Makefile"), "Makefile.test");
    }

    #[test]
    fn run_inlines_styles_and_scripts_into_first_html_file() {
        let mut workspace = WorkspaceState::new();
        workspace
            .create_file(
                "index.html",
                "<html><head></head><body><button>Click</button></body></html>",
            )
            .unwrap();
        workspace.create_file("style.css", "button { color: red; }").unwrap();
        workspace.create_file("main.js", "console.log('hi');").unwrap();

        let outcome = workspace.run();

        assert_eq!(
            outcome,
            RunOutcome::Preview {
                entry: "index.html".to_string()
            }
        );
        let preview = workspace.preview_html.as_deref().unwrap();
        assert!(preview.find("<style>").unwrap() < preview.find("</head>").unwrap());
        assert!(preview.find("<script>").unwrap() < preview.find("</body>").unwrap());
        assert!(workspace.output.contains("index.html"));
    }

    #[test]
    fn run_without_html_logs_notice() {
        let mut workspace = WorkspaceState::new();
        workspace.create_file("main.py", "print(1)").unwrap();

        assert_eq!(workspace.run(), RunOutcome::NotPreviewable);
        assert!(workspace.preview_html.is_none());
        assert!(workspace.output.starts_with("[run]"));
    }

    #[test]
    fn output_is_append_only_and_reset_clears_everything() {
        let mut workspace = WorkspaceState::new();
        workspace.append_output("one");
        workspace.append_output("two\n");
        assert_eq!(workspace.output, "one\ntwo\n");

        workspace.create_file("a.js", "").unwrap();
        workspace.reset();
        assert_eq!(workspace, WorkspaceState::default());
    }
}
