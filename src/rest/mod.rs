use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::{
    common::{ClientError, ClientResult},
    configs::NodeConfig,
    protocol::{LoadResult, Track, TrackInfo},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP side of a node: track loading and decoding.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    config: NodeConfig,
}

impl RestClient {
    pub fn new(config: NodeConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    /// Resolves an identifier: a URL, or a search like `ytsearch:query`.
    pub async fn load_tracks(&self, identifier: &str) -> ClientResult<LoadResult> {
        if identifier.trim().is_empty() {
            return Err(ClientError::MissingOption("identifier"));
        }

        let url = self.config.http_url(&format!(
            "/loadtracks?identifier={}",
            urlencoding::encode(identifier)
        ));
        debug!("[{}] GET {}", self.config.name, url);

        let result = self
            .http
            .get(url)
            .header("Authorization", self.config.password.as_str())
            .send()
            .await?
            .error_for_status()?
            .json::<LoadResult>()
            .await?;
        Ok(result)
    }

    pub async fn decode_track(&self, track: &str) -> ClientResult<TrackInfo> {
        if track.is_empty() {
            return Err(ClientError::MissingOption("track"));
        }

        let url = self.config.http_url(&format!(
            "/decodetrack?track={}",
            urlencoding::encode(track)
        ));
        debug!("[{}] GET {}", self.config.name, url);

        let info = self
            .http
            .get(url)
            .header("Authorization", self.config.password.as_str())
            .send()
            .await?
            .error_for_status()?
            .json::<TrackInfo>()
            .await?;
        Ok(info)
    }

    pub async fn decode_tracks(&self, tracks: &[String]) -> ClientResult<Vec<Track>> {
        if tracks.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.config.http_url("/decodetracks");
        debug!("[{}] POST {} ({} tracks)", self.config.name, url, tracks.len());

        let decoded = self
            .http
            .post(url)
            .header("Authorization", self.config.password.as_str())
            .json(tracks)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Track>>()
            .await?;
        Ok(decoded)
    }
}
