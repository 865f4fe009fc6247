use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::error::RelayError;

pub const DEFAULT_MAX_HEADER_BYTES: usize = 64 * 1024;
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;
const MAX_HEADERS: usize = 100;

/// Upper bounds applied while framing client requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramingLimits {
    /// Request line plus headers, also the bound for each chunk-size line and the trailer block
    pub max_header_bytes: usize,
    /// Decoded body size
    pub max_body_bytes: usize,
}

impl Default for FramingLimits {
    fn default() -> Self {
        Self {
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// One HTTP/1.x request read off the client stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHttpRequest {
    pub method: String,
    pub target: String,
    /// Exact bytes received for this request, forwarded as-is
    pub raw: Vec<u8>,
    /// Message body with any chunked framing removed
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFraming {
    Empty,
    Length(usize),
    Chunked,
}

/// Splits a client byte stream into HTTP/1.x requests.
///
/// The head is parsed with httparse; only `Content-Length` and
/// `Transfer-Encoding` values are interpreted. Everything else stays opaque
/// inside `raw`.
pub struct RequestReader<R> {
    reader: BufReader<R>,
    limits: FramingLimits,
}

impl<R: AsyncRead + Unpin> RequestReader<R> {
    pub fn new(inner: R, limits: FramingLimits) -> Self {
        Self {
            reader: BufReader::new(inner),
            limits,
        }
    }

    /// Read the next request. `Ok(None)` means the client closed the stream
    /// cleanly between two requests.
    pub async fn next_request(&mut self) -> Result<Option<RawHttpRequest>, RelayError> {
        let mut raw = match self.read_head().await? {
            Some(head) => head,
            None => return Ok(None),
        };
        let (method, target, framing) = parse_head(&raw)?;

        let body = match framing {
            BodyFraming::Empty => Vec::new(),
            BodyFraming::Length(length) => {
                if length > self.limits.max_body_bytes {
                    return Err(RelayError::RequestTooLarge {
                        limit: self.limits.max_body_bytes,
                    });
                }
                let mut body = vec![0u8; length];
                self.reader.read_exact(&mut body).await?;
                raw.extend_from_slice(&body);
                body
            }
            BodyFraming::Chunked => self.read_chunked_body(&mut raw).await?,
        };

        Ok(Some(RawHttpRequest {
            method,
            target,
            raw,
            body,
        }))
    }

    /// Read the request line and header block up to and including the empty
    /// line. Blank lines between pipelined requests are skipped, not kept.
    async fn read_head(&mut self) -> Result<Option<Vec<u8>>, RelayError> {
        let limit = self.limits.max_header_bytes;
        let mut budget = limit;

        let mut head = loop {
            match self.read_line(&mut budget, limit).await? {
                None => return Ok(None),
                Some(line) if trim_eol(&line).is_empty() => continue,
                Some(line) => break line,
            }
        };

        loop {
            let line = self
                .read_line(&mut budget, limit)
                .await?
                .ok_or_else(truncated)?;
            head.extend_from_slice(&line);
            if trim_eol(&line).is_empty() {
                return Ok(Some(head));
            }
        }
    }

    async fn read_chunked_body(&mut self, raw: &mut Vec<u8>) -> Result<Vec<u8>, RelayError> {
        let line_limit = self.limits.max_header_bytes;
        let max_body = self.limits.max_body_bytes;
        let mut body = Vec::new();

        loop {
            let mut budget = line_limit;
            let size_line = self
                .read_line(&mut budget, line_limit)
                .await?
                .ok_or_else(truncated)?;
            raw.extend_from_slice(&size_line);

            let size = parse_chunk_size(trim_eol(&size_line))?;
            if size == 0 {
                break;
            }
            if size > max_body - body.len() {
                return Err(RelayError::RequestTooLarge { limit: max_body });
            }

            let start = body.len();
            body.resize(start + size, 0);
            self.reader.read_exact(&mut body[start..]).await?;
            raw.extend_from_slice(&body[start..]);

            let mut budget = line_limit;
            let terminator = self
                .read_line(&mut budget, line_limit)
                .await?
                .ok_or_else(truncated)?;
            if !trim_eol(&terminator).is_empty() {
                return Err(RelayError::MalformedRequest(
                    "chunk data longer than its declared size".to_string(),
                ));
            }
            raw.extend_from_slice(&terminator);
        }

        // Trailer section, ended by an empty line
        let mut budget = line_limit;
        loop {
            let line = self
                .read_line(&mut budget, line_limit)
                .await?
                .ok_or_else(truncated)?;
            raw.extend_from_slice(&line);
            if trim_eol(&line).is_empty() {
                break;
            }
        }

        Ok(body)
    }

    /// Read one LF-terminated line without consuming more than `budget` bytes.
    /// `Ok(None)` on EOF before any byte.
    async fn read_line(
        &mut self,
        budget: &mut usize,
        limit: usize,
    ) -> Result<Option<Vec<u8>>, RelayError> {
        if *budget == 0 {
            return Err(RelayError::RequestTooLarge { limit });
        }

        let mut line = Vec::new();
        let read = (&mut self.reader)
            .take(*budget as u64)
            .read_until(b'\n', &mut line)
            .await?;

        if read == 0 {
            return Ok(None);
        }
        *budget -= read;

        if line.last() != Some(&b'\n') {
            if *budget == 0 {
                return Err(RelayError::RequestTooLarge { limit });
            }
            return Err(truncated());
        }

        Ok(Some(line))
    }
}

fn truncated() -> RelayError {
    RelayError::MalformedRequest("connection closed in the middle of a request".to_string())
}

fn trim_eol(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Parse a complete request head. Header values other than the framing
/// headers are never interpreted, so any bytes httparse accepts pass through.
fn parse_head(head: &[u8]) -> Result<(String, String, BodyFraming), RelayError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut request = httparse::Request::new(&mut headers);

    match request.parse(head) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(RelayError::MalformedRequest(
                "incomplete request head".to_string(),
            ))
        }
        Err(e) => {
            return Err(RelayError::MalformedRequest(format!(
                "invalid request head: {}",
                e
            )))
        }
    }

    let method = request.method.unwrap_or_default().to_string();
    let target = request.path.unwrap_or_default().to_string();

    let mut content_length: Option<usize> = None;
    let mut chunked = false;

    for header in request.headers.iter() {
        if header.name.eq_ignore_ascii_case("content-length") {
            let length = parse_content_length(header.value)?;
            if content_length.is_some_and(|existing| existing != length) {
                return Err(RelayError::MalformedRequest(
                    "conflicting Content-Length headers".to_string(),
                ));
            }
            content_length = Some(length);
        } else if header.name.eq_ignore_ascii_case("transfer-encoding") {
            let value = framing_value(header.value, "Transfer-Encoding")?;
            let last_coding = value.rsplit(',').next().unwrap_or("").trim();
            if !last_coding.eq_ignore_ascii_case("chunked") {
                return Err(RelayError::MalformedRequest(format!(
                    "unsupported Transfer-Encoding: {}",
                    value
                )));
            }
            chunked = true;
        }
    }

    let framing = match (chunked, content_length) {
        (true, Some(_)) => {
            return Err(RelayError::MalformedRequest(
                "both Content-Length and Transfer-Encoding present".to_string(),
            ))
        }
        (true, None) => BodyFraming::Chunked,
        (false, Some(0)) | (false, None) => BodyFraming::Empty,
        (false, Some(length)) => BodyFraming::Length(length),
    };

    Ok((method, target, framing))
}

fn framing_value<'a>(value: &'a [u8], name: &str) -> Result<&'a str, RelayError> {
    std::str::from_utf8(value)
        .map(str::trim)
        .map_err(|_| RelayError::MalformedRequest(format!("{} is not valid UTF-8", name)))
}

fn parse_content_length(value: &[u8]) -> Result<usize, RelayError> {
    let value = framing_value(value, "Content-Length")?;
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RelayError::MalformedRequest(format!(
            "invalid Content-Length: {}",
            value
        )));
    }
    value
        .parse()
        .map_err(|_| RelayError::MalformedRequest(format!("invalid Content-Length: {}", value)))
}

fn parse_chunk_size(line: &[u8]) -> Result<usize, RelayError> {
    let text = std::str::from_utf8(line)
        .map_err(|_| RelayError::MalformedRequest("chunk size is not valid UTF-8".to_string()))?;
    // Chunk extensions after ';' are ignored
    let size = text.split(';').next().unwrap_or("").trim();

    usize::from_str_radix(size, 16)
        .map_err(|_| RelayError::MalformedRequest(format!("invalid chunk size: {}", text)))
}
