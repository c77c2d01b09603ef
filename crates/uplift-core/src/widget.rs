//! The view-port seam over the hosting form.

use crate::file::{FileMetadata, SelectedFile};

/// One uploadable field on a form: the file input, its operator-supplied
/// sibling fields, the hidden metadata fields, and the progress surface.
///
/// All direct UI manipulation flows through this trait so the
/// [`UploadController`](crate::UploadController) transition logic can be
/// exercised against fakes. Implementations own the widget exclusively for
/// the duration of one attempt; the controller is the only mutator of the
/// submit-enabled state and the file input's presence.
pub trait UploadWidget: Send + Sync {
    /// The file currently selected in the input, if any.
    fn selected_file(&self) -> Option<SelectedFile>;

    /// Operator-supplied destination directory (the `upload_location`
    /// sibling field).
    fn upload_directory(&self) -> String;

    /// Operator-supplied extension allow-list (the `upload_extensions`
    /// sibling field).
    fn allowed_extensions(&self) -> String;

    /// Enables or disables every submit control on the owning form.
    fn set_submit_enabled(&self, enabled: bool);

    /// Hides the file input for the duration of an attempt.
    fn hide_file_input(&self);

    /// Shows the file input again after a rollback.
    fn show_file_input(&self);

    /// Mounts the "preparing" indicator and the 0-100% progress surface.
    fn mount_progress(&self);

    /// Updates the textual progress readout with a whole-number percent.
    fn update_progress(&self, percent: u8);

    /// Removes the progress surface during rollback.
    fn remove_progress(&self);

    /// Surfaces a blocking message to the user.
    fn alert(&self, message: &str);

    /// Writes the MIME type, byte size, and file name into the form's
    /// hidden metadata fields.
    fn set_file_metadata(&self, metadata: &FileMetadata);

    /// Detaches the raw file-bearing input from the subtree that will be
    /// serialized, so the bytes are never sent to the backend a second
    /// time.
    fn detach_file_input(&self);

    /// Triggers the form's normal submission pathway with the
    /// operator-intended submit label.
    fn submit_form(&self, submit_label: &str);
}
