//! MCP Stream Server
//!
//! Newline-delimited JSON-RPC 2.0 over any async reader/writer pair (stdio in
//! the binary, an in-memory duplex in tests). One connection is one session:
//! `initialize` opens it, end of input closes it. Requests are answered
//! strictly in the order they arrive.

use crate::mcp::dispatcher::{requires_session, McpDispatcher};
use crate::mcp::session::Session;
use crate::mcp::types::{MCPError, MCPRequest, MCPResponse};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};
use tracing::{debug, info, instrument, warn};

enum LineRead {
    Line,
    TooLong,
    Eof,
}

/// Read one `\n`-terminated line into `buf` without buffering more than
/// `max_bytes`; an oversized line is drained and reported as `TooLong`.
async fn read_line_limited<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_bytes: usize,
) -> std::io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let mut too_long = false;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(if too_long {
                LineRead::TooLong
            } else if buf.is_empty() {
                LineRead::Eof
            } else {
                LineRead::Line
            });
        }

        let (chunk, found_newline) = match available.iter().position(|b| *b == b'\n') {
            Some(pos) => (&available[..pos], true),
            None => (available, false),
        };
        let consumed = chunk.len() + usize::from(found_newline);

        if !too_long {
            if buf.len() + chunk.len() > max_bytes {
                too_long = true;
                buf.clear();
            } else {
                buf.extend_from_slice(chunk);
            }
        }
        reader.consume(consumed);

        if found_newline {
            return Ok(if too_long { LineRead::TooLong } else { LineRead::Line });
        }
    }
}

/// Serve one connection until end of input
///
/// # Arguments
///
/// * `dispatcher` - Shared protocol dispatcher
/// * `reader` / `writer` - The two halves of the connection
/// * `max_message_bytes` - Longest accepted line
///
/// # Returns
///
/// Returns Ok(()) when the input closes, or Err on I/O failure
#[instrument(skip_all)]
pub async fn serve_stream<R, W>(
    dispatcher: McpDispatcher,
    reader: R,
    writer: W,
    max_message_bytes: usize,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("🔌 MCP stream connection opened");

    let mut reader = BufReader::new(reader);
    let mut writer = BufWriter::new(writer);
    let mut line = Vec::new();
    let mut session: Option<Session> = None;

    let result = loop {
        let read = match read_line_limited(&mut reader, &mut line, max_message_bytes).await {
            Ok(read) => read,
            Err(e) => break Err(e.into()),
        };

        let response = match read {
            LineRead::Eof => break Ok(()),
            LineRead::TooLong => {
                warn!("❌ MCP message exceeds {} bytes", max_message_bytes);
                Some(MCPResponse::error(
                    None,
                    MCPError::invalid_request(format!(
                        "Message exceeds {} bytes",
                        max_message_bytes
                    )),
                ))
            }
            LineRead::Line => {
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                handle_line(&dispatcher, &line, &mut session).await
            }
        };

        if let Some(response) = response {
            if let Err(e) = write_response(&mut writer, &response).await {
                break Err(e);
            }
        }
    };

    if let Some(session) = session {
        dispatcher.sessions().remove(&session.id);
    }
    info!("🔌 MCP stream connection closed");
    result
}

async fn handle_line(
    dispatcher: &McpDispatcher,
    line: &[u8],
    session: &mut Option<Session>,
) -> Option<MCPResponse> {
    debug!("📥 MCP request: {}", String::from_utf8_lossy(line));

    let request = match MCPRequest::parse(line) {
        Ok(request) => request,
        Err((id, error)) => {
            warn!("❌ Failed to parse JSON-RPC request: {}", error.message);
            return Some(MCPResponse::error(id, error));
        }
    };

    if requires_session(&request.method) {
        match session.as_ref() {
            Some(current) => revive_if_expired(dispatcher, current),
            None => {
                if request.is_notification() {
                    return None;
                }
                return Some(MCPResponse::error(
                    request.id,
                    MCPError::invalid_request(
                        "Session not initialized: send initialize first".to_string(),
                    ),
                ));
            }
        }
    }

    let session_id = session.as_ref().map(|s| s.id.clone());
    let outcome = dispatcher
        .handle_request(request, session_id.as_deref())
        .await;

    if let Some(created) = outcome.created_session {
        if let Some(previous) = session.replace(created) {
            dispatcher.sessions().remove(&previous.id);
        }
    }

    outcome.response
}

/// The connection itself proves the session was issued, so an idle-expired
/// session is recreated under the same id.
fn revive_if_expired(dispatcher: &McpDispatcher, session: &Session) {
    let sessions = dispatcher.sessions();
    if sessions.get(&session.id).is_none() {
        debug!("Reviving expired stream session {}", session.id);
        sessions.create_with_id(session.id.clone(), session.protocol_version.clone());
        sessions.mark_initialized(&session.id);
    }
}

/// Write a JSON-RPC response as one line
async fn write_response<W>(writer: &mut BufWriter<W>, response: &MCPResponse) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(response)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "server_test.rs"]
mod server_test;
