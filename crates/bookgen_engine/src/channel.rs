use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use bookgen_core::{GenerationRequest, JobEvent, JobHandle, ARTIFACT_FILE_NAME};
use bookgen_logging::{bookgen_debug, bookgen_info};
use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::persist::AtomicFileWriter;
use crate::sse::{decode_event, resolve_against_origin, SseDecoder};
use crate::{ChannelError, ChannelSettings, FailureKind};

/// Ordered, lazily produced events for one job. Ends after the first
/// terminal event; dropping it closes the connection.
pub type JobEventStream = BoxStream<'static, JobEvent>;

#[async_trait::async_trait]
pub trait JobChannel: Send + Sync {
    async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, ChannelError>;

    async fn subscribe(&self, handle: &JobHandle) -> Result<JobEventStream, ChannelError>;

    /// Fetches a result artifact into `dest_dir` and returns the written path.
    async fn fetch_artifact(&self, location: &Url, dest_dir: &Path)
        -> Result<PathBuf, ChannelError>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestJobChannel {
    settings: ChannelSettings,
    client: reqwest::Client,
}

impl ReqwestJobChannel {
    pub fn new(settings: ChannelSettings) -> Result<Self, ChannelError> {
        // No overall timeout: the event stream stays open for the whole job.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ChannelError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ChannelError> {
        resolve_against_origin(&self.settings.origin, path)
            .map_err(|err| ChannelError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    /// `{origin}/events/{handle}` with the handle percent-encoded as one segment.
    fn events_endpoint(&self, handle: &JobHandle) -> Result<Url, ChannelError> {
        let mut url = self.endpoint("/events")?;
        url.path_segments_mut()
            .map_err(|()| {
                ChannelError::new(
                    FailureKind::InvalidUrl,
                    format!("{} cannot carry a path", self.settings.origin),
                )
            })?
            .pop_if_empty()
            .push(handle.as_str());
        Ok(url)
    }
}

fn build_form(request: &GenerationRequest, document: Vec<u8>) -> Form {
    let section = &request.section;
    let style = &request.style;

    let mut form = Form::new()
        .part(
            "file",
            Part::bytes(document).file_name(request.document.file_name.clone()),
        )
        .text("sectionDescription", section.description.clone())
        .text(
            "additionalContext",
            section.additional_context.clone().unwrap_or_default(),
        );
    if let Some(start) = section.page_start {
        form = form.text("pageStart", start.to_string());
    }
    if let Some(end) = section.page_end {
        form = form.text("pageEnd", end.to_string());
    }
    form.text("theme", style.theme.clone())
        .text("humor", style.humor.get().to_string())
        .text("ageGroup", style.age_group.as_str())
}

#[async_trait::async_trait]
impl JobChannel for ReqwestJobChannel {
    async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, ChannelError> {
        let document = tokio::fs::read(&request.document.path).await.map_err(|err| {
            ChannelError::new(
                FailureKind::Document,
                format!("{}: {err}", request.document.path.display()),
            )
        })?;
        let url = self.endpoint("/generate")?;
        bookgen_info!(
            "Submitting {} ({} bytes) to {}",
            request.document.file_name,
            document.len(),
            url
        );

        let response = self
            .client
            .post(url)
            .timeout(self.settings.request_timeout)
            .multipart(build_form(request, document))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|err| ChannelError::new(FailureKind::InvalidResponse, err.to_string()))?;
        Ok(JobHandle::new(body.job_id))
    }

    async fn subscribe(&self, handle: &JobHandle) -> Result<JobEventStream, ChannelError> {
        let url = self.events_endpoint(handle)?;
        bookgen_debug!("Opening event stream {}", url);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        Ok(event_stream(
            response.bytes_stream().boxed(),
            self.settings.origin.clone(),
        ))
    }

    async fn fetch_artifact(
        &self,
        location: &Url,
        dest_dir: &Path,
    ) -> Result<PathBuf, ChannelError> {
        let response = self
            .client
            .get(location.clone())
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        let writer = AtomicFileWriter::new(dest_dir.to_path_buf());
        let path = writer
            .write(ARTIFACT_FILE_NAME, &bytes)
            .map_err(|err| ChannelError::new(FailureKind::Persist, err.to_string()))?;
        bookgen_info!("Saved {} bytes to {:?}", bytes.len(), path);
        Ok(path)
    }
}

struct StreamState {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: SseDecoder,
    origin: Url,
    pending: VecDeque<JobEvent>,
    eof: bool,
    finished: bool,
}

/// Turns a raw SSE body into job events. A transport failure, or the body
/// ending before a terminal event, yields a single `StreamError`.
pub(crate) fn event_stream(
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    origin: Url,
) -> JobEventStream {
    let state = StreamState {
        body,
        decoder: SseDecoder::new(),
        origin,
        pending: VecDeque::new(),
        eof: false,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                if event.is_terminal() {
                    state.finished = true;
                    state.pending.clear();
                }
                return Some((event, state));
            }
            if state.finished {
                return None;
            }
            if state.eof {
                state.finished = true;
                let event = JobEvent::StreamError {
                    detail: "stream ended before a terminal event".to_string(),
                };
                return Some((event, state));
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    for payload in state.decoder.push(&chunk) {
                        let event = decode_event(&payload, &state.origin);
                        state.pending.push_back(event);
                    }
                }
                Some(Err(err)) => {
                    state.finished = true;
                    let event = JobEvent::StreamError {
                        detail: err.to_string(),
                    };
                    return Some((event, state));
                }
                None => {
                    state.eof = true;
                    if let Some(payload) = state.decoder.finish() {
                        let event = decode_event(&payload, &state.origin);
                        state.pending.push_back(event);
                    }
                }
            }
        }
    })
    .boxed()
}

fn map_reqwest_error(err: reqwest::Error) -> ChannelError {
    if err.is_timeout() {
        return ChannelError::new(FailureKind::Timeout, err.to_string());
    }
    ChannelError::new(FailureKind::Network, err.to_string())
}
