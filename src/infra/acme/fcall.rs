//! 9P2000 message encoding
//!
//! Only the messages needed to read and control an Acme window are
//! implemented. Every message is framed as `size[4] type[1] tag[2] ...`
//! with little-endian integers and `len[2]`-prefixed strings.

use crate::error::EditorError;

pub const NOTAG: u16 = 0xFFFF;
pub const NOFID: u32 = 0xFFFF_FFFF;
pub const VERSION: &str = "9P2000";

/// Header: size, type and tag.
pub const HEADER_LEN: usize = 7;
/// Header plus the count field of Rread/Twrite.
pub const IO_HEADER_LEN: usize = HEADER_LEN + 4 + 8 + 4;

pub const OREAD: u8 = 0;
pub const OWRITE: u8 = 1;
pub const ORDWR: u8 = 2;

const TVERSION: u8 = 100;
const RVERSION: u8 = 101;
const TATTACH: u8 = 104;
const RATTACH: u8 = 105;
const RERROR: u8 = 107;
const TWALK: u8 = 110;
const RWALK: u8 = 111;
const TOPEN: u8 = 112;
const ROPEN: u8 = 113;
const TREAD: u8 = 116;
const RREAD: u8 = 117;
const TWRITE: u8 = 118;
const RWRITE: u8 = 119;
const TCLUNK: u8 = 120;
const RCLUNK: u8 = 121;

const QID_LEN: usize = 13;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tmsg {
    Version { msize: u32, version: String },
    Attach { fid: u32, afid: u32, uname: String, aname: String },
    Walk { fid: u32, newfid: u32, names: Vec<String> },
    Open { fid: u32, mode: u8 },
    Read { fid: u32, offset: u64, count: u32 },
    Write { fid: u32, offset: u64, data: Vec<u8> },
    Clunk { fid: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rmsg {
    Version { msize: u32, version: String },
    Attach,
    Walk { nwqid: u16 },
    Open { iounit: u32 },
    Read { data: Vec<u8> },
    Write { count: u32 },
    Clunk,
    Error { ename: String },
}

impl Tmsg {
    /// Encode with the given tag, size prefix included.
    pub fn encode(&self, tag: u16) -> Vec<u8> {
        let mut body = Vec::new();
        let kind = match self {
            Self::Version { msize, version } => {
                put_u32(&mut body, *msize);
                put_str(&mut body, version);
                TVERSION
            }
            Self::Attach {
                fid,
                afid,
                uname,
                aname,
            } => {
                put_u32(&mut body, *fid);
                put_u32(&mut body, *afid);
                put_str(&mut body, uname);
                put_str(&mut body, aname);
                TATTACH
            }
            Self::Walk { fid, newfid, names } => {
                put_u32(&mut body, *fid);
                put_u32(&mut body, *newfid);
                put_u16(&mut body, names.len() as u16);
                for name in names {
                    put_str(&mut body, name);
                }
                TWALK
            }
            Self::Open { fid, mode } => {
                put_u32(&mut body, *fid);
                body.push(*mode);
                TOPEN
            }
            Self::Read { fid, offset, count } => {
                put_u32(&mut body, *fid);
                body.extend_from_slice(&offset.to_le_bytes());
                put_u32(&mut body, *count);
                TREAD
            }
            Self::Write { fid, offset, data } => {
                put_u32(&mut body, *fid);
                body.extend_from_slice(&offset.to_le_bytes());
                put_u32(&mut body, data.len() as u32);
                body.extend_from_slice(data);
                TWRITE
            }
            Self::Clunk { fid } => {
                put_u32(&mut body, *fid);
                TCLUNK
            }
        };

        let size = (HEADER_LEN + body.len()) as u32;
        let mut message = Vec::with_capacity(size as usize);
        put_u32(&mut message, size);
        message.push(kind);
        put_u16(&mut message, tag);
        message.extend_from_slice(&body);
        message
    }
}

impl Rmsg {
    /// Decode a complete message (size prefix included) into its tag and body.
    pub fn decode(message: &[u8]) -> Result<(u16, Rmsg), EditorError> {
        let mut reader = Reader::new(message);
        let size = reader.u32()? as usize;
        if size != message.len() {
            return Err(protocol(format!(
                "message size {size} does not match frame of {} bytes",
                message.len()
            )));
        }
        let kind = reader.u8()?;
        let tag = reader.u16()?;

        let rmsg = match kind {
            RVERSION => Rmsg::Version {
                msize: reader.u32()?,
                version: reader.string()?,
            },
            RATTACH => {
                reader.skip(QID_LEN)?;
                Rmsg::Attach
            }
            RERROR => Rmsg::Error {
                ename: reader.string()?,
            },
            RWALK => {
                let nwqid = reader.u16()?;
                reader.skip(QID_LEN * nwqid as usize)?;
                Rmsg::Walk { nwqid }
            }
            ROPEN => {
                reader.skip(QID_LEN)?;
                Rmsg::Open {
                    iounit: reader.u32()?,
                }
            }
            RREAD => {
                let count = reader.u32()? as usize;
                Rmsg::Read {
                    data: reader.bytes(count)?.to_vec(),
                }
            }
            RWRITE => Rmsg::Write {
                count: reader.u32()?,
            },
            RCLUNK => Rmsg::Clunk,
            other => return Err(protocol(format!("unexpected message type {other}"))),
        };
        Ok((tag, rmsg))
    }
}

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_str(buf: &mut Vec<u8>, value: &str) {
    put_u16(buf, value.len() as u16);
    buf.extend_from_slice(value.as_bytes());
}

fn protocol(message: String) -> EditorError {
    EditorError::Protocol(message)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], EditorError> {
        let end = self.pos + len;
        let slice = self
            .buf
            .get(self.pos..end)
            .ok_or_else(|| protocol("short message".to_string()))?;
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), EditorError> {
        self.bytes(len).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8, EditorError> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, EditorError> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, EditorError> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn string(&mut self) -> Result<String, EditorError> {
        let len = self.u16()? as usize;
        let bytes = self.bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| protocol(e.to_string()))
    }
}
