//! The upload attempt state machine.

use std::sync::Mutex;

use strum::{AsRefStr, Display, IntoStaticStr};

use crate::endpoint::{EndpointRequest, EndpointResponse};
use crate::error::Error;
use crate::file::FileMetadata;
use crate::progress::TransferProgress;
use crate::widget::UploadWidget;
use crate::{EndpointNegotiator, StorageTransfer};

/// Tracing target for controller operations.
pub const TRACING_TARGET: &str = "uplift_core::controller";

/// Alert shown when the attempt is triggered with an empty file input.
pub const NO_FILE_SELECTED_MESSAGE: &str =
    "There was no file present. Please add a file and try again";

/// Alert shown when the transfer backend cannot perform direct uploads.
pub const TRANSFER_UNSUPPORTED_MESSAGE: &str =
    "Direct upload is not supported in this environment";

/// Phases of one upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum UploadState {
    /// No attempt in flight; the widget is interactable.
    Idle,
    /// Submit controls disabled, progress UI mounted.
    Preparing,
    /// Waiting for the backend to issue a temporary write URL.
    AwaitingEndpoint,
    /// The PUT to object storage is in flight.
    Transferring,
    /// Writing metadata fields and dispatching the form submission.
    Finalizing,
    /// Terminal: the form submission was triggered.
    Submitted,
    /// Terminal for the attempt: the widget was restored and the user may
    /// retry.
    RolledBack,
}

impl UploadState {
    /// Whether a new attempt may start from this state.
    #[must_use]
    pub const fn is_startable(&self) -> bool {
        matches!(self, Self::Idle | Self::RolledBack)
    }
}

/// How one call to [`UploadController::begin_upload`] resolved.
#[derive(Debug)]
pub enum UploadOutcome {
    /// The transfer succeeded and the form submission was triggered.
    Submitted(FileMetadata),
    /// A precondition failed; no UI mutation was performed.
    Rejected(Error),
    /// The attempt failed after UI mutation; the widget was restored to
    /// its pre-attempt presentation.
    RolledBack(Error),
}

/// Drives one upload attempt from user trigger to form submission or
/// rollback.
///
/// One controller serves one widget; instantiate one per upload field so
/// concurrent widgets on a page never share state. At most one attempt is
/// in flight per controller: triggers while an attempt is running are
/// rejected, mirroring the disabled trigger control on the form.
///
/// The negotiation, transfer, and finalization run as a sequential async
/// flow; the transfer never starts before negotiation grants a URL, and
/// finalization never starts before the transfer settles. Nothing is
/// retried: every failure restores the widget and leaves the retry to the
/// user.
#[derive(Debug)]
pub struct UploadController<N, T, W> {
    negotiator: N,
    transfer: T,
    widget: W,
    state: Mutex<UploadState>,
}

impl<N, T, W> UploadController<N, T, W>
where
    N: EndpointNegotiator,
    T: StorageTransfer,
    W: UploadWidget,
{
    /// Creates a controller for one widget.
    pub fn new(negotiator: N, transfer: T, widget: W) -> Self {
        Self {
            negotiator,
            transfer,
            widget,
            state: Mutex::new(UploadState::Idle),
        }
    }

    /// The current attempt phase.
    pub fn state(&self) -> UploadState {
        *self.state.lock().expect("state lock poisoned")
    }

    /// The widget this controller drives.
    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Runs one upload attempt.
    ///
    /// `submit_label` is the operator-intended submit action reasserted
    /// during finalization, so the backend sees the same action it would
    /// have seen without interception.
    pub async fn begin_upload(&self, submit_label: &str) -> UploadOutcome {
        let file = {
            let mut state = self.state.lock().expect("state lock poisoned");
            if !state.is_startable() {
                return UploadOutcome::Rejected(
                    Error::precondition().with_message("an upload attempt is already in flight"),
                );
            }

            // Precondition failures surface an alert and change nothing
            // else; the widget keeps its pre-attempt presentation.
            let Some(file) = self.widget.selected_file() else {
                self.widget.alert(NO_FILE_SELECTED_MESSAGE);
                return UploadOutcome::Rejected(
                    Error::precondition().with_message(NO_FILE_SELECTED_MESSAGE),
                );
            };
            if !self.transfer.is_supported() {
                self.widget.alert(TRANSFER_UNSUPPORTED_MESSAGE);
                return UploadOutcome::Rejected(
                    Error::precondition().with_message(TRANSFER_UNSUPPORTED_MESSAGE),
                );
            }

            // Claim the attempt before releasing the lock so a second
            // trigger cannot race past the guard.
            *state = UploadState::Preparing;
            file
        };

        tracing::info!(
            target: TRACING_TARGET,
            file_name = %file.name,
            size = file.size(),
            "starting upload attempt"
        );

        self.widget.set_submit_enabled(false);
        self.widget.hide_file_input();
        self.widget.mount_progress();

        // Built once, immutable for the rest of the attempt.
        let request = EndpointRequest::for_file(
            &file,
            self.widget.upload_directory(),
            self.widget.allowed_extensions(),
        );

        self.advance(UploadState::AwaitingEndpoint);
        let write_url = match self.negotiator.negotiate(&request).await {
            Ok(EndpointResponse::Granted(url)) => url,
            Ok(EndpointResponse::Denied(message)) => {
                return self.roll_back(Error::negotiation().with_message(message));
            }
            Err(err) => return self.roll_back(err),
        };

        self.advance(UploadState::Transferring);
        let widget = &self.widget;
        let sink = move |sample: TransferProgress| {
            if let Some(percent) = sample.percent() {
                widget.update_progress(percent);
            }
        };
        if let Err(err) = self.transfer.put(&write_url, &file, &sink).await {
            return self.roll_back(err);
        }

        self.advance(UploadState::Finalizing);
        // Metadata always comes from the originally selected file; the
        // storage reply carries no body.
        let metadata = file.metadata();
        self.widget.set_file_metadata(&metadata);
        self.widget.detach_file_input();
        self.widget.set_submit_enabled(true);
        self.widget.submit_form(submit_label);

        // The progress surface stays mounted: submission navigates away.
        self.advance(UploadState::Submitted);
        tracing::info!(
            target: TRACING_TARGET,
            file_name = %metadata.file_name,
            size = metadata.size,
            "upload attempt submitted"
        );
        UploadOutcome::Submitted(metadata)
    }

    /// Records a state transition.
    fn advance(&self, next: UploadState) {
        let mut state = self.state.lock().expect("state lock poisoned");
        tracing::debug!(
            target: TRACING_TARGET,
            from = %*state,
            to = %next,
            "upload state transition"
        );
        *state = next;
    }

    /// Undoes the widget alterations and surfaces the failure.
    ///
    /// Every failure path after UI mutation ends here; leaving the submit
    /// controls disabled or the file input hidden would strand the user.
    fn roll_back(&self, error: Error) -> UploadOutcome {
        tracing::warn!(
            target: TRACING_TARGET,
            kind = %error.kind,
            error = %error,
            "upload attempt failed, restoring widget"
        );
        self.widget.alert(&error.alert_text());
        self.widget.show_file_input();
        self.widget.remove_progress();
        self.widget.set_submit_enabled(true);
        self.advance(UploadState::RolledBack);
        UploadOutcome::RolledBack(error)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::endpoint::TemporaryWriteUrl;
    use crate::error::{ErrorKind, Result};
    use crate::file::SelectedFile;
    use crate::progress::ProgressSink;

    use super::*;

    /// Observable model of the hosting form, shared with the test body.
    #[derive(Debug)]
    struct WidgetModel {
        selected_file: Option<SelectedFile>,
        upload_directory: String,
        allowed_extensions: String,
        submit_enabled: bool,
        file_input_visible: bool,
        file_input_attached: bool,
        progress_mounted: bool,
        progress_updates: Vec<u8>,
        metadata: Option<FileMetadata>,
        alerts: Vec<String>,
        submissions: Vec<String>,
        mount_count: usize,
    }

    impl WidgetModel {
        fn pristine(selected_file: Option<SelectedFile>) -> Self {
            Self {
                selected_file,
                upload_directory: "images/2024".to_string(),
                allowed_extensions: "jpg png gif".to_string(),
                submit_enabled: true,
                file_input_visible: true,
                file_input_attached: true,
                progress_mounted: false,
                progress_updates: Vec::new(),
                metadata: None,
                alerts: Vec::new(),
                submissions: Vec::new(),
                mount_count: 0,
            }
        }

        /// The DOM-state assertions shared by every rollback scenario.
        fn assert_restored(&self) {
            assert!(self.file_input_visible, "file input should be shown again");
            assert!(self.file_input_attached, "file input should stay attached");
            assert!(!self.progress_mounted, "progress surface should be removed");
            assert!(self.submit_enabled, "submit controls should be re-enabled");
            assert!(self.metadata.is_none(), "metadata fields should be untouched");
            assert!(self.submissions.is_empty(), "form must not submit");
        }
    }

    #[derive(Debug, Clone)]
    struct FakeWidget {
        model: Arc<Mutex<WidgetModel>>,
    }

    impl FakeWidget {
        fn new(selected_file: Option<SelectedFile>) -> Self {
            Self {
                model: Arc::new(Mutex::new(WidgetModel::pristine(selected_file))),
            }
        }
    }

    impl UploadWidget for FakeWidget {
        fn selected_file(&self) -> Option<SelectedFile> {
            self.model.lock().unwrap().selected_file.clone()
        }

        fn upload_directory(&self) -> String {
            self.model.lock().unwrap().upload_directory.clone()
        }

        fn allowed_extensions(&self) -> String {
            self.model.lock().unwrap().allowed_extensions.clone()
        }

        fn set_submit_enabled(&self, enabled: bool) {
            self.model.lock().unwrap().submit_enabled = enabled;
        }

        fn hide_file_input(&self) {
            self.model.lock().unwrap().file_input_visible = false;
        }

        fn show_file_input(&self) {
            self.model.lock().unwrap().file_input_visible = true;
        }

        fn mount_progress(&self) {
            let mut model = self.model.lock().unwrap();
            model.progress_mounted = true;
            model.mount_count += 1;
        }

        fn update_progress(&self, percent: u8) {
            self.model.lock().unwrap().progress_updates.push(percent);
        }

        fn remove_progress(&self) {
            self.model.lock().unwrap().progress_mounted = false;
        }

        fn alert(&self, message: &str) {
            self.model.lock().unwrap().alerts.push(message.to_string());
        }

        fn set_file_metadata(&self, metadata: &FileMetadata) {
            self.model.lock().unwrap().metadata = Some(metadata.clone());
        }

        fn detach_file_input(&self) {
            self.model.lock().unwrap().file_input_attached = false;
        }

        fn submit_form(&self, submit_label: &str) {
            self.model
                .lock()
                .unwrap()
                .submissions
                .push(submit_label.to_string());
        }
    }

    #[derive(Debug, Clone)]
    enum NegotiatorBehavior {
        Grant(&'static str),
        Deny(&'static str),
        Fail(&'static str),
    }

    #[derive(Clone)]
    struct FakeNegotiator {
        behavior: Arc<Mutex<NegotiatorBehavior>>,
        requests: Arc<Mutex<Vec<EndpointRequest>>>,
    }

    impl FakeNegotiator {
        fn new(behavior: NegotiatorBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait::async_trait]
    impl EndpointNegotiator for FakeNegotiator {
        async fn negotiate(&self, request: &EndpointRequest) -> Result<EndpointResponse> {
            self.requests.lock().unwrap().push(request.clone());
            match self.behavior.lock().unwrap().clone() {
                NegotiatorBehavior::Grant(url) => {
                    Ok(EndpointResponse::Granted(TemporaryWriteUrl::parse(url)?))
                }
                NegotiatorBehavior::Deny(message) => {
                    Ok(EndpointResponse::Denied(message.to_string()))
                }
                NegotiatorBehavior::Fail(message) => {
                    Err(Error::protocol_violation().with_message(message))
                }
            }
        }
    }

    #[derive(Debug, Clone)]
    enum TransferBehavior {
        Succeed(Vec<TransferProgress>),
        Fail(&'static str),
    }

    #[derive(Clone)]
    struct FakeTransfer {
        behavior: Arc<Mutex<TransferBehavior>>,
        puts: Arc<Mutex<Vec<String>>>,
        supported: bool,
    }

    impl FakeTransfer {
        fn new(behavior: TransferBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                puts: Arc::new(Mutex::new(Vec::new())),
                supported: true,
            }
        }

        fn unsupported() -> Self {
            let mut transfer = Self::new(TransferBehavior::Succeed(Vec::new()));
            transfer.supported = false;
            transfer
        }
    }

    #[async_trait::async_trait]
    impl StorageTransfer for FakeTransfer {
        async fn put(
            &self,
            url: &TemporaryWriteUrl,
            _file: &SelectedFile,
            progress: ProgressSink<'_>,
        ) -> Result<()> {
            self.puts.lock().unwrap().push(url.to_string());
            match self.behavior.lock().unwrap().clone() {
                TransferBehavior::Succeed(samples) => {
                    for sample in samples {
                        progress(sample);
                    }
                    Ok(())
                }
                TransferBehavior::Fail(message) => {
                    Err(Error::transfer().with_message(message))
                }
            }
        }

        fn is_supported(&self) -> bool {
            self.supported
        }
    }

    fn photo_jpg() -> SelectedFile {
        SelectedFile::new("photo.jpg", mime::IMAGE_JPEG, vec![0u8; 2048])
    }

    #[tokio::test]
    async fn test_no_file_selected_changes_nothing() {
        let widget = FakeWidget::new(None);
        let negotiator = FakeNegotiator::new(NegotiatorBehavior::Deny("unused"));
        let transfer = FakeTransfer::new(TransferBehavior::Succeed(Vec::new()));
        let controller = UploadController::new(negotiator.clone(), transfer.clone(), widget.clone());

        let outcome = controller.begin_upload("Save").await;

        assert!(matches!(outcome, UploadOutcome::Rejected(_)));
        assert!(negotiator.requests.lock().unwrap().is_empty());
        assert!(transfer.puts.lock().unwrap().is_empty());
        assert_eq!(controller.state(), UploadState::Idle);

        let model = widget.model.lock().unwrap();
        assert_eq!(model.alerts, vec![NO_FILE_SELECTED_MESSAGE.to_string()]);
        assert!(model.submit_enabled);
        assert!(model.file_input_visible);
        assert!(!model.progress_mounted);
    }

    #[tokio::test]
    async fn test_unsupported_transfer_aborts_before_ui_mutation() {
        let widget = FakeWidget::new(Some(photo_jpg()));
        let negotiator = FakeNegotiator::new(NegotiatorBehavior::Grant("https://storage.example/tmp/xyz"));
        let transfer = FakeTransfer::unsupported();
        let controller = UploadController::new(negotiator.clone(), transfer, widget.clone());

        let outcome = controller.begin_upload("Save").await;

        assert!(matches!(outcome, UploadOutcome::Rejected(_)));
        assert!(negotiator.requests.lock().unwrap().is_empty());
        assert_eq!(controller.state(), UploadState::Idle);

        let model = widget.model.lock().unwrap();
        assert_eq!(model.alerts, vec![TRANSFER_UNSUPPORTED_MESSAGE.to_string()]);
        assert!(model.submit_enabled);
        assert!(model.file_input_visible);
    }

    #[tokio::test]
    async fn test_successful_attempt_finalizes_form() {
        let widget = FakeWidget::new(Some(photo_jpg()));
        let negotiator = FakeNegotiator::new(NegotiatorBehavior::Grant("https://storage.example/tmp/xyz"));
        let transfer = FakeTransfer::new(TransferBehavior::Succeed(vec![
            TransferProgress::computable(512, 2048),
            TransferProgress::not_computable(1024),
            TransferProgress::computable(2048, 2048),
        ]));
        let controller = UploadController::new(negotiator.clone(), transfer.clone(), widget.clone());

        let outcome = controller.begin_upload("Save").await;

        let UploadOutcome::Submitted(metadata) = outcome else {
            panic!("expected submission, got {outcome:?}");
        };
        assert_eq!(metadata.content_type, "image/jpeg");
        assert_eq!(metadata.size, 2048);
        assert_eq!(metadata.file_name, "photo.jpg");
        assert_eq!(controller.state(), UploadState::Submitted);

        let requests = negotiator.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].base_name, "photo");
        assert_eq!(requests[0].extension, "jpg");
        assert_eq!(requests[0].upload_directory, "images/2024");
        assert_eq!(requests[0].allowed_extensions, "jpg png gif");

        assert_eq!(
            transfer.puts.lock().unwrap().as_slice(),
            ["https://storage.example/tmp/xyz"],
        );

        let model = widget.model.lock().unwrap();
        assert_eq!(model.metadata.as_ref(), Some(&metadata));
        assert!(!model.file_input_attached, "file input must leave the payload");
        assert!(model.submit_enabled, "controls re-enabled before submission");
        assert_eq!(model.submissions, vec!["Save".to_string()]);
        // Non-computable samples produce no readout update.
        assert_eq!(model.progress_updates, vec![25, 100]);
        // Success navigates away; the progress surface stays mounted.
        assert!(model.progress_mounted);
        assert!(model.alerts.is_empty());
    }

    #[tokio::test]
    async fn test_denied_negotiation_rolls_back_without_put() {
        let widget = FakeWidget::new(Some(photo_jpg()));
        let negotiator = FakeNegotiator::new(NegotiatorBehavior::Deny("Extension not allowed"));
        let transfer = FakeTransfer::new(TransferBehavior::Succeed(Vec::new()));
        let controller = UploadController::new(negotiator, transfer.clone(), widget.clone());

        let outcome = controller.begin_upload("Save").await;

        let UploadOutcome::RolledBack(error) = outcome else {
            panic!("expected rollback, got {outcome:?}");
        };
        assert_eq!(error.kind, ErrorKind::Negotiation);
        assert!(transfer.puts.lock().unwrap().is_empty(), "no PUT may be issued");
        assert_eq!(controller.state(), UploadState::RolledBack);

        let model = widget.model.lock().unwrap();
        assert_eq!(model.alerts, vec!["Extension not allowed".to_string()]);
        model.assert_restored();
    }

    #[tokio::test]
    async fn test_transfer_failure_rolls_back() {
        let widget = FakeWidget::new(Some(photo_jpg()));
        let negotiator = FakeNegotiator::new(NegotiatorBehavior::Grant("https://storage.example/tmp/xyz"));
        let transfer = FakeTransfer::new(TransferBehavior::Fail("connection reset by peer"));
        let controller = UploadController::new(negotiator, transfer, widget.clone());

        let outcome = controller.begin_upload("Save").await;

        let UploadOutcome::RolledBack(error) = outcome else {
            panic!("expected rollback, got {outcome:?}");
        };
        assert_eq!(error.kind, ErrorKind::Transfer);
        assert_eq!(controller.state(), UploadState::RolledBack);

        let model = widget.model.lock().unwrap();
        assert_eq!(model.alerts, vec!["connection reset by peer".to_string()]);
        model.assert_restored();
    }

    #[tokio::test]
    async fn test_malformed_reply_rolls_back_as_protocol_violation() {
        let widget = FakeWidget::new(Some(photo_jpg()));
        let negotiator = FakeNegotiator::new(NegotiatorBehavior::Fail("endpoint reply carried neither success nor error"));
        let transfer = FakeTransfer::new(TransferBehavior::Succeed(Vec::new()));
        let controller = UploadController::new(negotiator, transfer, widget.clone());

        let outcome = controller.begin_upload("Save").await;

        let UploadOutcome::RolledBack(error) = outcome else {
            panic!("expected rollback, got {outcome:?}");
        };
        assert_eq!(error.kind, ErrorKind::ProtocolViolation);
        widget.model.lock().unwrap().assert_restored();
    }

    #[tokio::test]
    async fn test_retry_after_rollback_behaves_like_first_attempt() {
        let widget = FakeWidget::new(Some(photo_jpg()));
        let negotiator = FakeNegotiator::new(NegotiatorBehavior::Deny("quota exceeded"));
        let transfer = FakeTransfer::new(TransferBehavior::Succeed(Vec::new()));
        let controller = UploadController::new(negotiator.clone(), transfer, widget.clone());

        let first = controller.begin_upload("Save").await;
        assert!(matches!(first, UploadOutcome::RolledBack(_)));

        *negotiator.behavior.lock().unwrap() =
            NegotiatorBehavior::Grant("https://storage.example/tmp/retry");
        let second = controller.begin_upload("Save").await;
        assert!(matches!(second, UploadOutcome::Submitted(_)));

        let model = widget.model.lock().unwrap();
        // One mount per attempt, no leaked progress UI between them.
        assert_eq!(model.mount_count, 2);
        assert_eq!(model.submissions, vec!["Save".to_string()]);
        assert!(model.submit_enabled);
    }

    #[tokio::test]
    async fn test_second_attempt_after_submission_is_rejected() {
        let widget = FakeWidget::new(Some(photo_jpg()));
        let negotiator = FakeNegotiator::new(NegotiatorBehavior::Grant("https://storage.example/tmp/xyz"));
        let transfer = FakeTransfer::new(TransferBehavior::Succeed(Vec::new()));
        let controller = UploadController::new(negotiator.clone(), transfer.clone(), widget.clone());

        let first = controller.begin_upload("Save").await;
        assert!(matches!(first, UploadOutcome::Submitted(_)));

        let second = controller.begin_upload("Save").await;
        assert!(matches!(second, UploadOutcome::Rejected(_)));
        assert_eq!(negotiator.requests.lock().unwrap().len(), 1);
        assert_eq!(transfer.puts.lock().unwrap().len(), 1);
        assert_eq!(
            widget.model.lock().unwrap().submissions,
            vec!["Save".to_string()],
        );
    }
}
