//! Editor service
//!
//! Reads the state of the window agodoc was run from.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::EditorError;
use crate::infra::acme::{self, Win};
use crate::models::config::EditorConfig;
use crate::models::window::WindowState;

#[async_trait]
pub trait EditorService: Send + Sync {
    /// File name, selection and body of window `winid`.
    async fn read_window(&self, winid: u32) -> Result<WindowState, EditorError>;
}

/// Acme reached through its plan9port socket.
pub struct AcmeEditorService {
    socket: PathBuf,
    user: String,
}

impl AcmeEditorService {
    pub fn new(socket: impl Into<PathBuf>, user: impl Into<String>) -> Self {
        Self {
            socket: socket.into(),
            user: user.into(),
        }
    }

    /// Socket in the configured namespace, or the one derived from
    /// `$USER` and `$DISPLAY`.
    pub fn from_config(config: &EditorConfig) -> Self {
        let user = std::env::var("USER").unwrap_or_else(|_| "none".to_string());
        let display = std::env::var("DISPLAY").ok();
        let dir = acme::namespace(
            config.namespace.as_deref().and_then(Path::to_str),
            &user,
            display.as_deref(),
        );
        Self::new(dir.join("acme"), user)
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }
}

#[async_trait]
impl EditorService for AcmeEditorService {
    async fn read_window(&self, winid: u32) -> Result<WindowState, EditorError> {
        let mut win = Win::open(&self.socket, &self.user, winid).await?;
        let file_name = win.file_name().await?;
        let selection = win.selection().await?;
        let body = win.body().await?;
        win.close().await?;

        tracing::debug!(
            "Window {}: {} at #{},#{}",
            winid,
            file_name,
            selection.start,
            selection.end
        );
        Ok(WindowState {
            file_name,
            selection,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::window::Selection;
    use std::collections::HashMap;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{UnixListener, UnixStream};

    const TAG: &str = "/home/glenda/p/p.go Del Snarf | Look ";
    const BODY: &str = "package p\n\n// Ünïcode\nvar x = 1\n";

    fn reply(kind: u8, tag: u16, body: &[u8]) -> Vec<u8> {
        let mut message = Vec::new();
        message.extend_from_slice(&((7 + body.len()) as u32).to_le_bytes());
        message.push(kind);
        message.extend_from_slice(&tag.to_le_bytes());
        message.extend_from_slice(body);
        message
    }

    fn u32_at(buf: &[u8], pos: usize) -> u32 {
        u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
    }

    fn u16_at(buf: &[u8], pos: usize) -> u16 {
        u16::from_le_bytes([buf[pos], buf[pos + 1]])
    }

    /// Serves `7/{tag,body,addr,ctl}` until the client hangs up.
    async fn serve_window(mut stream: UnixStream) {
        let mut fids: HashMap<u32, String> = HashMap::new();
        let mut dot_copied = false;
        loop {
            let mut size = [0u8; 4];
            if stream.read_exact(&mut size).await.is_err() {
                return;
            }
            let len = u32::from_le_bytes(size) as usize;
            let mut message = vec![0u8; len];
            message[..4].copy_from_slice(&size);
            stream.read_exact(&mut message[4..]).await.unwrap();
            let kind = message[4];
            let tag = u16_at(&message, 5);

            let response = match kind {
                100 => {
                    let mut body = 8192u32.to_le_bytes().to_vec();
                    body.extend_from_slice(&6u16.to_le_bytes());
                    body.extend_from_slice(b"9P2000");
                    reply(101, tag, &body)
                }
                104 => reply(105, tag, &[0u8; 13]),
                110 => {
                    let newfid = u32_at(&message, 11);
                    let count = u16_at(&message, 15) as usize;
                    let mut pos = 17;
                    let mut names = Vec::new();
                    for _ in 0..count {
                        let n = u16_at(&message, pos) as usize;
                        names.push(String::from_utf8(message[pos + 2..pos + 2 + n].to_vec()).unwrap());
                        pos += 2 + n;
                    }
                    let path = names.join("/");
                    if ["7/tag", "7/body", "7/addr", "7/ctl"].contains(&path.as_str()) {
                        fids.insert(newfid, path);
                        let mut body = (count as u16).to_le_bytes().to_vec();
                        body.extend(std::iter::repeat_n(0u8, 13 * count));
                        reply(111, tag, &body)
                    } else {
                        let ename = b"file does not exist";
                        let mut body = (ename.len() as u16).to_le_bytes().to_vec();
                        body.extend_from_slice(ename);
                        reply(107, tag, &body)
                    }
                }
                112 => {
                    let mut body = vec![0u8; 13];
                    body.extend_from_slice(&0u32.to_le_bytes());
                    reply(113, tag, &body)
                }
                116 => {
                    let fid = u32_at(&message, 7);
                    let offset = u64::from_le_bytes(message[11..19].try_into().unwrap()) as usize;
                    let count = u32_at(&message, 19) as usize;
                    let contents = match fids[&fid].as_str() {
                        "7/tag" => TAG.to_string(),
                        "7/body" => BODY.to_string(),
                        "7/addr" if dot_copied => format!("{:11} {:11} ", 24, 27),
                        "7/addr" => format!("{:11} {:11} ", 0, 0),
                        _ => String::new(),
                    };
                    let bytes = contents.as_bytes();
                    let start = offset.min(bytes.len());
                    let end = (start + count).min(bytes.len());
                    let mut body = ((end - start) as u32).to_le_bytes().to_vec();
                    body.extend_from_slice(&bytes[start..end]);
                    reply(117, tag, &body)
                }
                118 => {
                    let fid = u32_at(&message, 7);
                    let count = u32_at(&message, 19);
                    let data = &message[23..];
                    if fids[&fid] == "7/ctl" && data == b"addr=dot" {
                        dot_copied = true;
                    }
                    reply(119, tag, &count.to_le_bytes())
                }
                120 => {
                    fids.remove(&u32_at(&message, 7));
                    reply(121, tag, &[])
                }
                other => panic!("unexpected message type {other}"),
            };
            stream.write_all(&response).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_read_window() {
        let temp = TempDir::new().unwrap();
        let socket = temp.path().join("acme");
        let listener = UnixListener::bind(&socket).unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            serve_window(stream).await;
        });

        let editor = AcmeEditorService::new(&socket, "glenda");
        let window = editor.read_window(7).await.unwrap();
        assert_eq!(window.file_name, "/home/glenda/p/p.go");
        assert_eq!(window.selection, Selection { start: 24, end: 27 });
        assert_eq!(window.body, BODY);

        drop(editor);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_window() {
        let temp = TempDir::new().unwrap();
        let socket = temp.path().join("acme");
        let listener = UnixListener::bind(&socket).unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            serve_window(stream).await;
        });

        let err = AcmeEditorService::new(&socket, "glenda")
            .read_window(8)
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Remote(ref message) if message.contains("does not exist")));
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let temp = TempDir::new().unwrap();
        let err = AcmeEditorService::new(temp.path().join("acme"), "glenda")
            .read_window(1)
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Connect { .. }));
    }

    #[test]
    fn test_from_config_namespace() {
        let editor = AcmeEditorService::from_config(&EditorConfig {
            namespace: Some(PathBuf::from("/run/ns.glenda")),
        });
        assert_eq!(editor.socket(), Path::new("/run/ns.glenda/acme"));
    }
}
