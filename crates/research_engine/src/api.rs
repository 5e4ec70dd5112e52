use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Response, StatusCode};
use research_core::JobStatus;
use research_logging::research_debug;
use serde::Deserialize;
use url::Url;

use crate::{ApiError, ApiFailureKind, SubmitAck};

const RESEARCH_PATH: &str = "api/research";
const STATUS_PATH: &str = "api/status";
const STREAM_PATH: &str = "api/stream";

const SUBMIT_FALLBACK_MESSAGE: &str = "Failed to start research";

/// Raw body chunks of the event stream.
pub type ByteStream = BoxStream<'static, Result<Bytes, ApiError>>;

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub user_agent: String,
}

impl ApiSettings {
    /// Parses `base_url`; a missing trailing slash is added so endpoints nest under it.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| ApiError::new(ApiFailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::new(
                ApiFailureKind::InvalidUrl,
                format!("{base_url} cannot be used as a base url"),
            ));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            user_agent: concat!("research-client/", env!("CARGO_PKG_VERSION")).to_string(),
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::new(ApiFailureKind::InvalidUrl, err.to_string()))
    }
}

/// The job service as seen by this client.
#[async_trait::async_trait]
pub trait ResearchApi: Send + Sync {
    /// `POST /api/research`.
    async fn submit(&self, topic: &str) -> Result<SubmitAck, ApiError>;

    /// `GET /api/status`.
    async fn status(&self) -> Result<JobStatus, ApiError>;

    /// Opens `GET /api/stream` and returns its body as it arrives.
    async fn open_stream(&self) -> Result<ByteStream, ApiError>;
}

#[derive(serde::Serialize)]
struct SubmitRequest<'a> {
    topic: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP implementation. No request timeouts: a silent stream is legitimate.
#[derive(Debug, Clone)]
pub struct ReqwestApi {
    settings: ApiSettings,
    client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| ApiError::new(ApiFailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }
}

#[async_trait::async_trait]
impl ResearchApi for ReqwestApi {
    async fn submit(&self, topic: &str) -> Result<SubmitAck, ApiError> {
        let url = self.settings.endpoint(RESEARCH_PATH)?;
        let response = self
            .client
            .post(url)
            .json(&SubmitRequest { topic })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response)
                .await
                .unwrap_or_else(|| SUBMIT_FALLBACK_MESSAGE.to_string());
            return Err(ApiError::new(
                ApiFailureKind::HttpStatus(status.as_u16()),
                message,
            ));
        }

        let ack = response
            .json::<SubmitAck>()
            .await
            .map_err(|err| ApiError::new(ApiFailureKind::InvalidResponse, err.to_string()))?;
        research_debug!("Submit acknowledged: {:?}", ack);
        Ok(ack)
    }

    async fn status(&self) -> Result<JobStatus, ApiError> {
        let url = self.settings.endpoint(STATUS_PATH)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = require_success(response)?;
        let body = response.text().await.map_err(map_reqwest_error)?;
        JobStatus::parse(&body)
            .map_err(|err| ApiError::new(ApiFailureKind::InvalidResponse, err.to_string()))
    }

    async fn open_stream(&self) -> Result<ByteStream, ApiError> {
        let url = self.settings.endpoint(STREAM_PATH)?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = require_success(response)?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(map_reqwest_error))
            .boxed())
    }
}

fn require_success(response: Response) -> Result<Response, ApiError> {
    let status: StatusCode = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::new(
            ApiFailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ))
    }
}

/// Pulls `error` out of a `{ "error": string }` failure body, if present.
async fn error_message(response: Response) -> Option<String> {
    let body = response.text().await.ok()?;
    serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.is_empty())
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        return ApiError::new(ApiFailureKind::InvalidResponse, err.to_string());
    }
    ApiError::new(ApiFailureKind::Network, err.to_string())
}
