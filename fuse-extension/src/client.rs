//! Two-phase conversion round trip: submit a job, then exchange the returned
//! token for the converted bytes and hand them to the browser.

use std::rc::Rc;

use async_trait::async_trait;
use shared_types::{ConvertRequest, ConvertResponse, ConvertStatus, DownloadRequest, DstFormat};

use crate::config::FuseConfig;
use crate::error::ConversionError;
use crate::notify::{Notifier, ToastKind};
use crate::resource::{ConversionRequest, FileRef, ResourceRef};

/// HTTP side of the conversion service.
#[async_trait(?Send)]
pub trait ConversionTransport {
    /// `POST /download_and_convert`
    async fn submit(&self, body: &ConvertRequest) -> Result<ConvertResponse, ConversionError>;
    /// `POST /download`; the body is opaque bytes
    async fn fetch_artifact(&self, body: &DownloadRequest) -> Result<Vec<u8>, ConversionError>;
}

/// Where converted bytes end up (a browser save dialog in production).
pub trait ArtifactSink {
    fn save(&self, bytes: &[u8], suggested_name: &str) -> Result<(), ConversionError>;
}

#[async_trait(?Send)]
impl<T: ConversionTransport + ?Sized> ConversionTransport for Rc<T> {
    async fn submit(&self, body: &ConvertRequest) -> Result<ConvertResponse, ConversionError> {
        (**self).submit(body).await
    }

    async fn fetch_artifact(&self, body: &DownloadRequest) -> Result<Vec<u8>, ConversionError> {
        (**self).fetch_artifact(body).await
    }
}

impl<N: Notifier + ?Sized> Notifier for Rc<N> {
    fn notify(&self, message: &str, kind: ToastKind, duration_ms: u32) {
        (**self).notify(message, kind, duration_ms)
    }
}

impl<S: ArtifactSink + ?Sized> ArtifactSink for Rc<S> {
    fn save(&self, bytes: &[u8], suggested_name: &str) -> Result<(), ConversionError> {
        (**self).save(bytes, suggested_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub filename: String,
    pub size: usize,
}

pub struct ConversionClient<T, N, S> {
    transport: T,
    notifier: N,
    sink: S,
    success_toast_ms: u32,
    failure_toast_ms: u32,
}

impl<T, N, S> ConversionClient<T, N, S>
where
    T: ConversionTransport,
    N: Notifier,
    S: ArtifactSink,
{
    pub fn new(transport: T, notifier: N, sink: S, config: &FuseConfig) -> Self {
        Self {
            transport,
            notifier,
            sink,
            success_toast_ms: config.success_toast_ms,
            failure_toast_ms: config.failure_toast_ms,
        }
    }

    pub async fn request_dataset_conversion(
        &self,
        dataset_id: &str,
        dst_format: DstFormat,
    ) -> Result<SavedArtifact, ConversionError> {
        let target = ResourceRef::Dataset {
            dataset_id: dataset_id.to_string(),
        };
        self.run(ConversionRequest::new(target, dst_format)).await
    }

    /// Only parsed [`FileRef`]s reach this call; anchors whose URL did not
    /// parse never got a control.
    pub async fn request_file_conversion(
        &self,
        file: FileRef,
        dst_format: DstFormat,
    ) -> Result<SavedArtifact, ConversionError> {
        self.run(ConversionRequest::new(ResourceRef::File(file), dst_format))
            .await
    }

    /// Full round trip for one request, with user-facing notifications.
    ///
    /// The download is only issued after the conversion reply says success.
    /// Every failure is terminal and produces exactly one danger message.
    pub async fn run(&self, request: ConversionRequest) -> Result<SavedArtifact, ConversionError> {
        let request_id = request.request_id();
        let name = request.target().display_name();
        log::info!(
            "[{request_id}] converting {name} to {}",
            request.dst_format()
        );
        self.notifier.notify(
            &format!(
                "Converting {name} to {}...",
                request.dst_format().label()
            ),
            ToastKind::Info,
            0,
        );

        let result = self.round_trip(&request).await;
        match &result {
            Ok(saved) => {
                log::info!(
                    "[{request_id}] saved {} ({} bytes)",
                    saved.filename,
                    saved.size
                );
                self.notify_saved(saved);
            }
            Err(e) => {
                log::warn!("[{request_id}] {e}");
                self.notify_failed(e);
            }
        }
        result
    }

    /// Exchange a file token for bytes and save them.
    pub async fn retrieve_artifact(
        &self,
        token: &str,
        suggested_name: Option<&str>,
    ) -> Result<SavedArtifact, ConversionError> {
        let filename = suggested_name
            .map(str::to_string)
            .unwrap_or_else(|| name_from_token(token));
        let result = self.fetch_and_save(token, filename).await;
        match &result {
            Ok(saved) => self.notify_saved(saved),
            Err(e) => {
                log::warn!("retrieving {token}: {e}");
                self.notify_failed(e);
            }
        }
        result
    }

    async fn round_trip(
        &self,
        request: &ConversionRequest,
    ) -> Result<SavedArtifact, ConversionError> {
        let response = self.transport.submit(&request.to_wire()).await?;
        let (token, filename) = accept_response(response)?;
        log::debug!("[{}] conversion ready as {token}", request.request_id());
        self.fetch_and_save(&token, filename).await
    }

    async fn fetch_and_save(
        &self,
        token: &str,
        filename: String,
    ) -> Result<SavedArtifact, ConversionError> {
        let body = DownloadRequest {
            file: token.to_string(),
        };
        let bytes = self.transport.fetch_artifact(&body).await?;
        self.sink.save(&bytes, &filename)?;
        Ok(SavedArtifact {
            filename,
            size: bytes.len(),
        })
    }

    fn notify_saved(&self, saved: &SavedArtifact) {
        self.notifier.notify(
            &format!("Downloaded {}", saved.filename),
            ToastKind::Success,
            self.success_toast_ms,
        );
    }

    fn notify_failed(&self, error: &ConversionError) {
        self.notifier
            .notify(&error.user_message(), ToastKind::Danger, self.failure_toast_ms);
    }
}

/// Token plus save name from a conversion reply.
fn accept_response(response: ConvertResponse) -> Result<(String, String), ConversionError> {
    match response.status {
        ConvertStatus::Error => Err(ConversionError::Rejected(
            response
                .message
                .unwrap_or_else(|| "unknown error".to_string()),
        )),
        ConvertStatus::Success => {
            let token = response
                .file
                .filter(|token| !token.trim().is_empty())
                .ok_or(ConversionError::MissingToken)?;
            let filename = response
                .filename
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| name_from_token(&token));
            Ok((token, filename))
        }
    }
}

/// The service hands out file paths as tokens; their last segment is a
/// usable file name.
fn name_from_token(token: &str) -> String {
    token
        .rsplit(|c: char| c == '/' || c == '\\')
        .find(|segment| !segment.is_empty())
        .unwrap_or(token)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::parse_file_url;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct FakeTransport {
        replies: RefCell<VecDeque<Result<ConvertResponse, ConversionError>>>,
        artifact: RefCell<Option<Result<Vec<u8>, ConversionError>>>,
        submitted: RefCell<Vec<ConvertRequest>>,
        downloads: RefCell<Vec<DownloadRequest>>,
    }

    impl FakeTransport {
        fn replying(reply: Result<ConvertResponse, ConversionError>) -> Rc<Self> {
            let transport = Self::default();
            transport.replies.borrow_mut().push_back(reply);
            *transport.artifact.borrow_mut() = Some(Ok(vec![1, 2, 3, 4]));
            Rc::new(transport)
        }
    }

    #[async_trait(?Send)]
    impl ConversionTransport for FakeTransport {
        async fn submit(&self, body: &ConvertRequest) -> Result<ConvertResponse, ConversionError> {
            self.submitted.borrow_mut().push(body.clone());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ConversionError::Transport("no reply".to_string())))
        }

        async fn fetch_artifact(
            &self,
            body: &DownloadRequest,
        ) -> Result<Vec<u8>, ConversionError> {
            self.downloads.borrow_mut().push(body.clone());
            self.artifact
                .borrow()
                .clone()
                .unwrap_or_else(|| Err(ConversionError::Download("no artifact".to_string())))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        shown: RefCell<Vec<(String, ToastKind, u32)>>,
    }

    impl RecordingNotifier {
        fn kinds(&self) -> Vec<ToastKind> {
            self.shown.borrow().iter().map(|(_, kind, _)| *kind).collect()
        }

        fn last(&self) -> (String, ToastKind, u32) {
            self.shown.borrow().last().cloned().unwrap()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str, kind: ToastKind, duration_ms: u32) {
            self.shown
                .borrow_mut()
                .push((message.to_string(), kind, duration_ms));
        }
    }

    #[derive(Default)]
    struct MemorySink {
        saved: RefCell<Vec<(String, Vec<u8>)>>,
        fail: bool,
    }

    impl ArtifactSink for MemorySink {
        fn save(&self, bytes: &[u8], suggested_name: &str) -> Result<(), ConversionError> {
            if self.fail {
                return Err(ConversionError::Save("blocked".to_string()));
            }
            self.saved
                .borrow_mut()
                .push((suggested_name.to_string(), bytes.to_vec()));
            Ok(())
        }
    }

    type TestClient =
        ConversionClient<Rc<FakeTransport>, Rc<RecordingNotifier>, Rc<MemorySink>>;

    fn client(
        transport: &Rc<FakeTransport>,
        notifier: &Rc<RecordingNotifier>,
        sink: &Rc<MemorySink>,
    ) -> TestClient {
        ConversionClient::new(
            transport.clone(),
            notifier.clone(),
            sink.clone(),
            &FuseConfig::default(),
        )
    }

    fn sample_file() -> FileRef {
        parse_file_url("/datasets/file/42/7?path=files/sub/dir/data.mat").unwrap()
    }

    #[test]
    fn success_fetches_the_token_exactly_once() {
        let transport = FakeTransport::replying(Ok(ConvertResponse::success("tok123")));
        let notifier = Rc::new(RecordingNotifier::default());
        let sink = Rc::new(MemorySink::default());

        let saved = block_on(
            client(&transport, &notifier, &sink)
                .request_file_conversion(sample_file(), DstFormat::Npz),
        )
        .unwrap();

        let downloads = transport.downloads.borrow();
        assert_eq!(downloads.len(), 1);
        assert!(serde_json::to_string(&downloads[0])
            .unwrap()
            .contains("tok123"));
        assert_eq!(saved.filename, "tok123");
        assert_eq!(saved.size, 4);
        assert_eq!(sink.saved.borrow()[0].1, vec![1, 2, 3, 4]);
        assert_eq!(notifier.kinds(), vec![ToastKind::Info, ToastKind::Success]);
    }

    #[test]
    fn file_request_body_carries_path() {
        let transport = FakeTransport::replying(Ok(ConvertResponse::success("tok")));
        let notifier = Rc::new(RecordingNotifier::default());
        let sink = Rc::new(MemorySink::default());

        block_on(
            client(&transport, &notifier, &sink)
                .request_file_conversion(sample_file(), DstFormat::Mat),
        )
        .unwrap();

        let submitted = transport.submitted.borrow();
        assert_eq!(submitted[0].dataset_id, "42");
        assert_eq!(submitted[0].path.as_deref(), Some("sub/dir/data.mat"));
        assert_eq!(submitted[0].dst_format, DstFormat::Mat);
    }

    #[test]
    fn server_error_skips_download_and_reports_once() {
        let transport = FakeTransport::replying(Ok(ConvertResponse::error("bad format")));
        let notifier = Rc::new(RecordingNotifier::default());
        let sink = Rc::new(MemorySink::default());

        let err = block_on(
            client(&transport, &notifier, &sink)
                .request_file_conversion(sample_file(), DstFormat::Zarr),
        )
        .unwrap_err();

        assert_eq!(err, ConversionError::Rejected("bad format".to_string()));
        assert!(transport.downloads.borrow().is_empty());
        let dangers: Vec<_> = notifier
            .shown
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == ToastKind::Danger)
            .cloned()
            .collect();
        assert_eq!(dangers.len(), 1);
        assert!(dangers[0].0.contains("bad format"));
    }

    #[test]
    fn transport_failure_shows_connectivity_message() {
        let transport = FakeTransport::replying(Err(ConversionError::Transport(
            "connection refused".to_string(),
        )));
        let notifier = Rc::new(RecordingNotifier::default());
        let sink = Rc::new(MemorySink::default());

        let result = block_on(
            client(&transport, &notifier, &sink).request_dataset_conversion("436", DstFormat::Npz),
        );

        assert!(matches!(result, Err(ConversionError::Transport(_))));
        let (message, kind, duration) = notifier.last();
        assert_eq!(kind, ToastKind::Danger);
        assert!(message.contains("conversion service"));
        assert_eq!(duration, FuseConfig::default().failure_toast_ms);
        assert!(transport.submitted.borrow()[0].path.is_none());
    }

    #[test]
    fn started_message_waits_to_be_replaced() {
        let transport = FakeTransport::replying(Ok(ConvertResponse::success("tok")));
        let notifier = Rc::new(RecordingNotifier::default());
        let sink = Rc::new(MemorySink::default());

        block_on(
            client(&transport, &notifier, &sink).request_dataset_conversion("9", DstFormat::Mat),
        )
        .unwrap();

        let first = notifier.shown.borrow()[0].clone();
        assert_eq!(first.1, ToastKind::Info);
        assert_eq!(first.2, 0);
        assert!(first.0.contains("dataset 9"));
        assert!(first.0.contains("MAT"));
    }

    #[test]
    fn download_failure_is_reported_separately() {
        let transport = FakeTransport::replying(Ok(ConvertResponse::success("tok")));
        *transport.artifact.borrow_mut() =
            Some(Err(ConversionError::Download("HTTP 404".to_string())));
        let notifier = Rc::new(RecordingNotifier::default());
        let sink = Rc::new(MemorySink::default());

        let err = block_on(
            client(&transport, &notifier, &sink)
                .request_file_conversion(sample_file(), DstFormat::Npz),
        )
        .unwrap_err();

        assert!(matches!(err, ConversionError::Download(_)));
        assert!(sink.saved.borrow().is_empty());
        assert_eq!(
            notifier.last().0,
            ConversionError::Download(String::new()).user_message()
        );
    }

    #[test]
    fn success_without_token_is_a_failure() {
        let mut reply = ConvertResponse::success("");
        reply.file = None;
        let transport = FakeTransport::replying(Ok(reply));
        let notifier = Rc::new(RecordingNotifier::default());
        let sink = Rc::new(MemorySink::default());

        let err = block_on(
            client(&transport, &notifier, &sink).request_dataset_conversion("1", DstFormat::Npz),
        )
        .unwrap_err();

        assert_eq!(err, ConversionError::MissingToken);
        assert!(transport.downloads.borrow().is_empty());
    }

    #[test]
    fn server_filename_is_preferred_over_token() {
        let mut reply = ConvertResponse::success("../converted/42/7/sub/dir/data.npz");
        reply.filename = Some("data.npz".to_string());
        assert_eq!(
            accept_response(reply).unwrap(),
            (
                "../converted/42/7/sub/dir/data.npz".to_string(),
                "data.npz".to_string()
            )
        );
        assert_eq!(name_from_token("..\\converted\\x.mat"), "x.mat");
        assert_eq!(name_from_token("plain"), "plain");
    }

    #[test]
    fn save_failure_surfaces_as_danger() {
        let transport = FakeTransport::replying(Ok(ConvertResponse::success("tok")));
        let notifier = Rc::new(RecordingNotifier::default());
        let sink = Rc::new(MemorySink {
            fail: true,
            ..MemorySink::default()
        });

        let err = block_on(
            client(&transport, &notifier, &sink).retrieve_artifact("tok", Some("out.mat")),
        )
        .unwrap_err();

        assert!(matches!(err, ConversionError::Save(_)));
        assert_eq!(transport.downloads.borrow().len(), 1);
        assert_eq!(notifier.last().1, ToastKind::Danger);
    }

    #[test]
    fn overlapping_flows_each_notify() {
        let transport = Rc::new(FakeTransport::default());
        transport
            .replies
            .borrow_mut()
            .extend([Ok(ConvertResponse::success("a")), Ok(ConvertResponse::error("nope"))]);
        *transport.artifact.borrow_mut() = Some(Ok(vec![0]));
        let notifier = Rc::new(RecordingNotifier::default());
        let sink = Rc::new(MemorySink::default());
        let client = client(&transport, &notifier, &sink);

        let (first, second) = block_on(futures::future::join(
            client.request_dataset_conversion("1", DstFormat::Npz),
            client.request_dataset_conversion("2", DstFormat::Npz),
        ));

        assert!(first.is_ok());
        assert!(second.is_err());
        assert_eq!(notifier.shown.borrow().len(), 4);
        assert_eq!(transport.downloads.borrow().len(), 1);
    }
}
