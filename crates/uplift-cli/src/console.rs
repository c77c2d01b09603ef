//! Terminal stand-in for the hosting form.

use std::io::{self, Write};
use std::sync::Mutex;

use uplift_core::{FileMetadata, SelectedFile, UploadWidget};

/// Mutable form state the widget mirrors on the terminal.
#[derive(Debug, Default)]
struct ConsoleForm {
    submit_enabled: bool,
    file_input_visible: bool,
    file_input_attached: bool,
    progress_mounted: bool,
    metadata: Option<FileMetadata>,
    submitted_with: Option<String>,
}

/// A console implementation of [`UploadWidget`].
///
/// Plays the role of the page markup: it holds the selected file and the
/// operator-supplied sibling fields, renders the progress readout and
/// alert dialogs on stderr, and prints the finalized submission on stdout
/// in place of navigating away.
#[derive(Debug)]
pub struct ConsoleWidget {
    selected_file: Option<SelectedFile>,
    upload_directory: String,
    allowed_extensions: String,
    form: Mutex<ConsoleForm>,
}

impl ConsoleWidget {
    /// Creates a widget with a selected file and operator fields.
    pub fn new(
        selected_file: Option<SelectedFile>,
        upload_directory: impl Into<String>,
        allowed_extensions: impl Into<String>,
    ) -> Self {
        Self {
            selected_file,
            upload_directory: upload_directory.into(),
            allowed_extensions: allowed_extensions.into(),
            form: Mutex::new(ConsoleForm {
                submit_enabled: true,
                file_input_visible: true,
                file_input_attached: true,
                ..ConsoleForm::default()
            }),
        }
    }

    /// The submit label the form was finalized with, if it submitted.
    pub fn submitted_with(&self) -> Option<String> {
        self.form.lock().expect("form lock poisoned").submitted_with.clone()
    }
}

impl UploadWidget for ConsoleWidget {
    fn selected_file(&self) -> Option<SelectedFile> {
        self.selected_file.clone()
    }

    fn upload_directory(&self) -> String {
        self.upload_directory.clone()
    }

    fn allowed_extensions(&self) -> String {
        self.allowed_extensions.clone()
    }

    fn set_submit_enabled(&self, enabled: bool) {
        self.form.lock().expect("form lock poisoned").submit_enabled = enabled;
    }

    fn hide_file_input(&self) {
        self.form.lock().expect("form lock poisoned").file_input_visible = false;
    }

    fn show_file_input(&self) {
        self.form.lock().expect("form lock poisoned").file_input_visible = true;
    }

    fn mount_progress(&self) {
        self.form.lock().expect("form lock poisoned").progress_mounted = true;
        eprintln!("Uploading File...");
    }

    fn update_progress(&self, percent: u8) {
        eprint!("\rUploading Progress: {percent}%");
        let _ = io::stderr().flush();
    }

    fn remove_progress(&self) {
        self.form.lock().expect("form lock poisoned").progress_mounted = false;
        eprintln!();
    }

    fn alert(&self, message: &str) {
        eprintln!("! {message}");
    }

    fn set_file_metadata(&self, metadata: &FileMetadata) {
        self.form.lock().expect("form lock poisoned").metadata = Some(metadata.clone());
    }

    fn detach_file_input(&self) {
        self.form.lock().expect("form lock poisoned").file_input_attached = false;
    }

    fn submit_form(&self, submit_label: &str) {
        let mut form = self.form.lock().expect("form lock poisoned");
        form.submitted_with = Some(submit_label.to_string());

        eprintln!();
        println!("submit: {submit_label}");
        if let Some(metadata) = &form.metadata {
            println!("  filemime: {}", metadata.content_type);
            println!("  filesize: {}", metadata.size);
            println!("  filename: {}", metadata.file_name);
        }
    }
}
