//! GraphQL client adapter implementing the EventSource port.
//!
//! One POSTed query document per cycle fetches all three streams, each
//! bounded below by its watermark and capped by a per-stream limit. The
//! upstream is a Hasura-style endpoint, so the filters and ordering use
//! its `where`/`order_by` argument syntax.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use tally_core::error::{UpstreamError, UpstreamResult};
use tally_core::models::Watermark;
use tally_core::ports::{
    EndMintingEvent, EventBatches, EventSource, StartMintingEvent, StreamWatermarks, TransferEvent,
};

/// Batch cap for the two minting streams.
const MINTING_BATCH_LIMIT: u32 = 50;
/// Batch cap for the transfer stream.
const TRANSFER_BATCH_LIMIT: u32 = 59;
/// Microsecond-precision format the upstream stores `db_write_timestamp` in.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the upstream GraphQL client.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// GraphQL endpoint URL.
    pub url: String,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/v1/graphql".to_string(),
            request_timeout: Duration::from_secs(20),
        }
    }
}

// =============================================================================
// Response Shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(rename = "LpManager_StartMinting", default)]
    start_minting: Vec<StartMintingEvent>,
    #[serde(rename = "LpManager_EndMinting", default)]
    end_minting: Vec<EndMintingEvent>,
    #[serde(rename = "LpNft_Transfer", default)]
    transfers: Vec<TransferEvent>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<QueryData>,
    errors: Option<Vec<GraphqlError>>,
}

// =============================================================================
// GraphqlEventSource
// =============================================================================

/// GraphQL adapter implementing the EventSource port.
pub struct GraphqlEventSource {
    config: UpstreamConfig,
    client: reqwest::Client,
}

impl GraphqlEventSource {
    pub fn new(config: UpstreamConfig) -> UpstreamResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| UpstreamError::Http(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Exclusive lower bound for one stream.
    ///
    /// The id clause resumes inside a run of events that share one
    /// `db_write_timestamp` when a batch limit truncated it.
    fn bound(watermark: &Watermark) -> String {
        let ts = watermark.timestamp.format(TIMESTAMP_FORMAT);
        if watermark.last_event_id.is_empty() {
            format!(r#"{{db_write_timestamp: {{_gt: "{ts}"}}}}"#)
        } else {
            format!(
                r#"{{_or: [{{db_write_timestamp: {{_gt: "{ts}"}}}}, {{_and: [{{db_write_timestamp: {{_eq: "{ts}"}}}}, {{id: {{_gt: "{id}"}}}}]}}]}}"#,
                id = watermark.last_event_id
            )
        }
    }

    /// Build the combined query document for one cycle.
    fn build_query(watermarks: &StreamWatermarks) -> String {
        let start_bound = Self::bound(&watermarks.start_minting);
        let end_bound = Self::bound(&watermarks.end_minting);
        let transfer_bound = Self::bound(&watermarks.transfer);
        format!(
            r#"query IngestEvents {{
  LpManager_StartMinting(
    where: {start_bound}
    order_by: [{{db_write_timestamp: asc}}, {{id: asc}}]
    limit: {MINTING_BATCH_LIMIT}
  ) {{
    id
    txid
    usdcAmount
    depositId
    db_write_timestamp
    creator
  }}
  LpManager_EndMinting(
    where: {end_bound}
    order_by: [{{db_write_timestamp: asc}}, {{id: asc}}]
    limit: {MINTING_BATCH_LIMIT}
  ) {{
    id
    depositIdIsTokenId
    db_write_timestamp
    creator
    _ustcPlusAmount
  }}
  LpNft_Transfer(
    where: {transfer_bound}
    order_by: [{{db_write_timestamp: asc}}, {{id: asc}}]
    limit: {TRANSFER_BATCH_LIMIT}
  ) {{
    db_write_timestamp
    from
    id
    to
    tokenId
  }}
}}"#
        )
    }
}

#[async_trait]
impl EventSource for GraphqlEventSource {
    #[instrument(skip_all)]
    async fn fetch(&self, watermarks: &StreamWatermarks) -> UpstreamResult<EventBatches> {
        let query = Self::build_query(watermarks);

        let response = self
            .client
            .post(&self.config.url)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout(self.config.request_timeout.as_secs())
                } else {
                    UpstreamError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Http(format!(
                "unexpected status {status} from {}",
                self.config.url
            )));
        }

        let body: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            let joined = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(UpstreamError::Graphql(joined));
        }

        let data = body
            .data
            .ok_or_else(|| UpstreamError::Decode("response carried no data".into()))?;

        debug!(
            start_minting = data.start_minting.len(),
            end_minting = data.end_minting.len(),
            transfers = data.transfers.len(),
            "Fetched event batches"
        );

        Ok(EventBatches {
            start_minting: data.start_minting,
            end_minting: data.end_minting,
            transfers: data.transfers,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
