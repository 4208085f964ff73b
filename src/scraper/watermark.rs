//! Best-effort no-watermark URL resolution
//!
//! The watermarked media body embeds a `vid:` marker followed by a 32-byte
//! identifier; a direct CDN URL can be synthesized from it. Each record
//! resolves independently, with its own fixed concurrency width. Any
//! failure leaves that record's no-watermark field empty and moves on.

use crate::error::ScrapeError;
use crate::transport::{Transport, TransportRequest};
use crate::types::Post;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Concurrent resolutions, independent of the page scheduler's width
const RESOLVE_WIDTH: usize = 5;

const ID_MARKER: &[u8] = b"vid:";
const ID_LENGTH: usize = 32;

/// Extract the media id from a watermarked body and synthesize the direct
/// CDN URL, optionally requesting the 1080p variant
pub(crate) fn no_watermark_url(body: &[u8], hd_video: bool) -> Option<String> {
    let position = body.windows(ID_MARKER.len()).position(|w| w == ID_MARKER)?;
    let start = position + ID_MARKER.len();
    let id_bytes = body.get(start..start + ID_LENGTH)?;
    let id = String::from_utf8_lossy(id_bytes);
    let variant = if hd_video {
        "&improve_bitrate=1&ratio=1080p"
    } else {
        ""
    };
    Some(format!(
        "https://api2.musical.ly/aweme/v1/playwm/?video_id={id}{variant}"
    ))
}

/// Resolve the no-watermark URL for every record that has a media URL.
///
/// Failures are logged and leave the field empty; resolution never fails
/// the session.
pub(crate) async fn resolve_all(transport: &Arc<dyn Transport>, posts: &mut [Post], hd_video: bool) {
    let mut pending: VecDeque<usize> = posts
        .iter()
        .enumerate()
        .filter(|(_, post)| !post.video_url.is_empty())
        .map(|(index, _)| index)
        .collect();
    let mut in_flight: JoinSet<(usize, crate::error::Result<crate::transport::TransportResponse>)> =
        JoinSet::new();

    loop {
        while in_flight.len() < RESOLVE_WIDTH {
            let Some(index) = pending.pop_front() else {
                break;
            };
            let url = posts[index].video_url.clone();
            let transport = Arc::clone(transport);
            in_flight.spawn(async move {
                let outcome = transport.fetch(TransportRequest::get(url)).await;
                (index, outcome)
            });
        }

        let Some(joined) = in_flight.join_next().await else {
            break;
        };
        let Ok((index, outcome)) = joined else {
            continue;
        };

        match outcome {
            Ok(response) => match no_watermark_url(&response.body, hd_video) {
                Some(url) => posts[index].video_url_no_water_mark = url,
                None => {
                    let error = ScrapeError::Watermark {
                        id: posts[index].id.clone(),
                        reason: "id marker not found in media body".into(),
                    };
                    tracing::debug!(error = %error, "leaving no-watermark URL empty");
                }
            },
            Err(e) => {
                let error = ScrapeError::Watermark {
                    id: posts[index].id.clone(),
                    reason: e.to_string(),
                };
                tracing::debug!(error = %error, "leaving no-watermark URL empty");
            }
        }
    }
}
