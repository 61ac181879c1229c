//! Serving finished clips with HTTP Range support.

use std::{io::SeekFrom, ops::RangeInclusive, path::Path};

use axum::{
  body::Body,
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::prelude::*;

#[derive(Debug, PartialEq, Eq)]
pub enum ByteRange {
  Full,
  Partial(RangeInclusive<u64>),
  Unsatisfiable,
}

/// Interprets a `Range` header against a file of `len` bytes. Only single
/// `bytes=` ranges are honoured, anything else is served whole.
pub fn parse_range(header: Option<&str>, len: u64) -> ByteRange {
  let Some(range) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
    return ByteRange::Full;
  };
  if range.contains(',') {
    return ByteRange::Full;
  }
  let Some((start, end)) = range.split_once('-') else {
    return ByteRange::Unsatisfiable;
  };

  let (start, end) = (start.trim(), end.trim());
  let range = match (start.parse::<u64>(), end.parse::<u64>()) {
    // bytes=-500: the last 500 bytes
    (Err(_), Ok(suffix)) if start.is_empty() => {
      if suffix == 0 || len == 0 {
        return ByteRange::Unsatisfiable;
      }
      len.saturating_sub(suffix)..=len - 1
    }
    (Ok(start), Err(_)) if end.is_empty() => start..=len.saturating_sub(1),
    (Ok(start), Ok(end)) if start <= end => {
      start..=end.min(len.saturating_sub(1))
    }
    _ => return ByteRange::Unsatisfiable,
  };

  if len == 0 || *range.start() >= len {
    return ByteRange::Unsatisfiable;
  }
  ByteRange::Partial(range)
}

pub async fn serve(
  path: &Path,
  headers: &HeaderMap,
) -> Result<Response, (StatusCode, &'static str)> {
  let mut file = match tokio::fs::File::open(path).await {
    Ok(file) => file,
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
      return Err((StatusCode::NOT_FOUND, "Video not found"));
    }
    Err(err) => {
      error!("Failed to open {}: {err}", path.display());
      return Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to open video"));
    }
  };

  let len = file
    .metadata()
    .await
    .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read video"))?
    .len();

  let range = headers.get(header::RANGE).and_then(|value| value.to_str().ok());

  match parse_range(range, len) {
    ByteRange::Full => {
      let headers = [
        (header::CONTENT_TYPE, String::from("video/mp4")),
        (header::CONTENT_LENGTH, len.to_string()),
        (header::ACCEPT_RANGES, String::from("bytes")),
      ];
      let body = Body::from_stream(ReaderStream::new(file));
      Ok((StatusCode::OK, headers, body).into_response())
    }
    ByteRange::Partial(range) => {
      let (start, end) = (*range.start(), *range.end());
      file
        .seek(SeekFrom::Start(start))
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Failed to seek"))?;

      let headers = [
        (header::CONTENT_TYPE, String::from("video/mp4")),
        (header::CONTENT_LENGTH, (end - start + 1).to_string()),
        (header::CONTENT_RANGE, format!("bytes {start}-{end}/{len}")),
        (header::ACCEPT_RANGES, String::from("bytes")),
      ];
      let body =
        Body::from_stream(ReaderStream::new(file.take(end - start + 1)));
      Ok((StatusCode::PARTIAL_CONTENT, headers, body).into_response())
    }
    ByteRange::Unsatisfiable => {
      let headers = [(header::CONTENT_RANGE, format!("bytes */{len}"))];
      Ok((StatusCode::RANGE_NOT_SATISFIABLE, headers).into_response())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_range() {
    assert_eq!(parse_range(None, 100), ByteRange::Full);
    assert_eq!(parse_range(Some("bytes=0-9"), 100), ByteRange::Partial(0..=9));
    assert_eq!(
      parse_range(Some("bytes=90-"), 100),
      ByteRange::Partial(90..=99)
    );
    assert_eq!(
      parse_range(Some("bytes=-10"), 100),
      ByteRange::Partial(90..=99)
    );
    assert_eq!(
      parse_range(Some("bytes=50-500"), 100),
      ByteRange::Partial(50..=99)
    );
    assert_eq!(parse_range(Some("bytes=100-"), 100), ByteRange::Unsatisfiable);
    assert_eq!(parse_range(Some("bytes=9-3"), 100), ByteRange::Unsatisfiable);
    assert_eq!(parse_range(Some("bytes=abc"), 100), ByteRange::Unsatisfiable);
    assert_eq!(parse_range(Some("bytes=0-1,5-6"), 100), ByteRange::Full);
  }

  #[tokio::test]
  async fn test_serve_partial() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("3.mp4");
    tokio::fs::write(&path, b"0123456789").await.unwrap();

    let mut headers = HeaderMap::new();
    headers.insert(header::RANGE, "bytes=2-5".parse().unwrap());
    let res = serve(&path, &headers).await.unwrap();

    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.headers()[header::CONTENT_RANGE], "bytes 2-5/10");
    let body = axum::body::to_bytes(res.into_body(), 64).await.unwrap();
    assert_eq!(&body[..], b"2345");

    headers.insert(header::RANGE, "bytes=20-".parse().unwrap());
    let res = serve(&path, &headers).await.unwrap();
    assert_eq!(res.status(), StatusCode::RANGE_NOT_SATISFIABLE);

    let missing = serve(&dir.path().join("4.mp4"), &HeaderMap::new()).await;
    assert_eq!(missing.unwrap_err().0, StatusCode::NOT_FOUND);
  }
}
