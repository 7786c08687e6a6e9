//! 9P client connection
//!
//! Synchronous request/response over the plan9port Unix socket: one
//! outstanding request at a time, so tags only need to be distinct.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

use super::fcall::{self, Rmsg, Tmsg};
use crate::error::EditorError;

const MSIZE: u32 = 8192;
const ROOT_FID: u32 = 0;

/// A 9P session attached to a file server.
pub struct Conn {
    stream: UnixStream,
    msize: u32,
    next_tag: u16,
    next_fid: u32,
}

/// An open file on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fid(u32);

impl Conn {
    /// Dial `socket`, negotiate the protocol version and attach as `user`.
    pub async fn dial(socket: &Path, user: &str) -> Result<Self, EditorError> {
        let stream = UnixStream::connect(socket)
            .await
            .map_err(|source| EditorError::Connect {
                path: socket.to_path_buf(),
                source,
            })?;
        tracing::debug!("Connected to {}", socket.display());

        let mut conn = Self {
            stream,
            msize: MSIZE,
            next_tag: 0,
            next_fid: ROOT_FID + 1,
        };
        conn.version().await?;
        match conn
            .rpc(Tmsg::Attach {
                fid: ROOT_FID,
                afid: fcall::NOFID,
                uname: user.to_string(),
                aname: String::new(),
            })
            .await?
        {
            Rmsg::Attach => Ok(conn),
            other => Err(unexpected("Rattach", &other)),
        }
    }

    async fn version(&mut self) -> Result<(), EditorError> {
        let request = Tmsg::Version {
            msize: MSIZE,
            version: fcall::VERSION.to_string(),
        };
        match self.exchange(request, fcall::NOTAG).await? {
            Rmsg::Version { msize, version } if version == fcall::VERSION => {
                self.msize = negotiate_msize(msize)?;
                Ok(())
            }
            Rmsg::Version { version, .. } => Err(EditorError::Protocol(format!(
                "server speaks {version}, not {}",
                fcall::VERSION
            ))),
            other => Err(unexpected("Rversion", &other)),
        }
    }

    /// Walk from the root to `path` and open it with `mode`.
    pub async fn open(&mut self, path: &str, mode: u8) -> Result<Fid, EditorError> {
        let fid = self.next_fid;
        self.next_fid += 1;

        let names: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        let wanted = names.len();
        match self
            .rpc(Tmsg::Walk {
                fid: ROOT_FID,
                newfid: fid,
                names,
            })
            .await?
        {
            Rmsg::Walk { nwqid } if nwqid as usize == wanted => {}
            Rmsg::Walk { .. } => {
                return Err(EditorError::Remote(format!("{path}: file does not exist")));
            }
            other => return Err(unexpected("Rwalk", &other)),
        }

        match self.rpc(Tmsg::Open { fid, mode }).await? {
            Rmsg::Open { .. } => Ok(Fid(fid)),
            other => Err(unexpected("Ropen", &other)),
        }
    }

    /// Read up to one message worth of data at `offset`.
    pub async fn read_at(&mut self, fid: Fid, offset: u64) -> Result<Vec<u8>, EditorError> {
        let count = self.msize - fcall::IO_HEADER_LEN as u32;
        match self
            .rpc(Tmsg::Read {
                fid: fid.0,
                offset,
                count,
            })
            .await?
        {
            Rmsg::Read { data } => Ok(data),
            other => Err(unexpected("Rread", &other)),
        }
    }

    /// Read from offset zero until end of file.
    pub async fn read_all(&mut self, fid: Fid) -> Result<Vec<u8>, EditorError> {
        let mut contents = Vec::new();
        loop {
            let chunk = self.read_at(fid, contents.len() as u64).await?;
            if chunk.is_empty() {
                return Ok(contents);
            }
            contents.extend_from_slice(&chunk);
        }
    }

    pub async fn write(&mut self, fid: Fid, data: &[u8]) -> Result<(), EditorError> {
        match self
            .rpc(Tmsg::Write {
                fid: fid.0,
                offset: 0,
                data: data.to_vec(),
            })
            .await?
        {
            Rmsg::Write { count } if count as usize == data.len() => Ok(()),
            Rmsg::Write { count } => Err(EditorError::Protocol(format!(
                "short write: {count} of {} bytes",
                data.len()
            ))),
            other => Err(unexpected("Rwrite", &other)),
        }
    }

    pub async fn clunk(&mut self, fid: Fid) -> Result<(), EditorError> {
        match self.rpc(Tmsg::Clunk { fid: fid.0 }).await? {
            Rmsg::Clunk => Ok(()),
            other => Err(unexpected("Rclunk", &other)),
        }
    }

    async fn rpc(&mut self, request: Tmsg) -> Result<Rmsg, EditorError> {
        let tag = self.next_tag;
        self.next_tag = self.next_tag.wrapping_add(1) % fcall::NOTAG;
        match self.exchange(request, tag).await? {
            Rmsg::Error { ename } => Err(EditorError::Remote(ename)),
            response => Ok(response),
        }
    }

    async fn exchange(&mut self, request: Tmsg, tag: u16) -> Result<Rmsg, EditorError> {
        tracing::trace!("9P -> {:?}", request);
        self.stream.write_all(&request.encode(tag)).await?;
        self.stream.flush().await?;

        let message = self.read_message().await?;
        let (reply_tag, response) = Rmsg::decode(&message)?;
        tracing::trace!("9P <- {:?}", response);
        if reply_tag != tag {
            return Err(EditorError::Protocol(format!(
                "reply tag {reply_tag} does not match request tag {tag}"
            )));
        }
        Ok(response)
    }

    /// Read one size-prefixed message.
    async fn read_message(&mut self) -> Result<Vec<u8>, EditorError> {
        let mut size = [0u8; 4];
        self.stream.read_exact(&mut size).await?;
        let len = u32::from_le_bytes(size) as usize;
        if len < fcall::HEADER_LEN || len > self.msize.max(MSIZE) as usize {
            return Err(EditorError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid message size {len}"),
            )));
        }
        let mut message = vec![0u8; len];
        message[..4].copy_from_slice(&size);
        self.stream.read_exact(&mut message[4..]).await?;
        Ok(message)
    }
}

fn unexpected(wanted: &str, got: &Rmsg) -> EditorError {
    EditorError::Protocol(format!("expected {wanted}, got {got:?}"))
}

/// plan9port namespace directory: `$NAMESPACE`, else `/tmp/ns.$USER.$DISPLAY`.
pub fn namespace(namespace: Option<&str>, user: &str, display: Option<&str>) -> PathBuf {
    if let Some(dir) = namespace.filter(|s| !s.is_empty()) {
        return PathBuf::from(dir);
    }
    let display = display.filter(|s| !s.is_empty()).unwrap_or(":0.0");
    let display = display.strip_suffix(".0").unwrap_or(display).replace('/', "_");
    PathBuf::from(format!("/tmp/ns.{user}.{display}"))
}

/// Message size to use given the server's offer. It must leave room for
/// at least one byte of data in a read or write.
fn negotiate_msize(offered: u32) -> Result<u32, EditorError> {
    if offered <= fcall::IO_HEADER_LEN as u32 {
        return Err(EditorError::Protocol(format!(
            "server msize {offered} is too small"
        )));
    }
    Ok(offered.min(MSIZE))
}
