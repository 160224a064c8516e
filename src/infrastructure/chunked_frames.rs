// Chunked frame streaming utilities
use crate::domain::frame::RenderFrame;
use async_compression::tokio::bufread::BrotliEncoder;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub const FRAME_CONTENT_TYPE: &str = "application/x-traffic-frames";

/// Create a chunked frame streaming response
pub fn chunked_frame_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = RenderFrame> + Send + 'static,
{
    let byte_stream = stream.then(move |frame| async move { serialize_chunk(&frame, compress).await });

    let body = Body::from_stream(byte_stream);

    // Each chunk is compressed on its own, so no Content-Encoding here:
    // clients must not try to decompress the stream as a whole.
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, FRAME_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single frame to a chunk: 4-byte big-endian length, then JSON (optionally Brotli)
pub async fn serialize_chunk(frame: &RenderFrame, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(frame).map_err(std::io::Error::other)?;

    let payload = if compress {
        brotli_compress(json).await?
    } else {
        json
    };

    let length = u32::try_from(payload.len())
        .map_err(|_| std::io::Error::other("frame larger than 4 GiB"))?;
    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(length);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

pub async fn brotli_compress(bytes: Vec<u8>) -> Result<Vec<u8>, std::io::Error> {
    let cursor = std::io::Cursor::new(bytes);
    let mut encoder = BrotliEncoder::new(cursor);
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed).await?;
    Ok(compressed)
}

/// Helper to create a streaming response from a receiver
pub fn stream_from_receiver(rx: mpsc::Receiver<RenderFrame>, compress: bool) -> impl IntoResponse {
    match chunked_frame_stream(ReceiverStream::new(rx), compress) {
        Ok(response) => response.into_response(),
        Err(status) => status.into_response(),
    }
}
