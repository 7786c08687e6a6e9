//! Acme window access over 9P

use std::path::Path;

use super::conn::{Conn, Fid};
use super::fcall::{OREAD, ORDWR, OWRITE};
use crate::error::EditorError;
use crate::models::window::Selection;

/// An Acme window identified by its numeric id.
pub struct Win {
    conn: Conn,
    id: u32,
    addr: Option<Fid>,
}

impl Win {
    pub async fn open(socket: &Path, user: &str, id: u32) -> Result<Self, EditorError> {
        let conn = Conn::dial(socket, user).await?;
        Ok(Self {
            conn,
            id,
            addr: None,
        })
    }

    /// Read the whole contents of one of the window's files.
    pub async fn read_all(&mut self, file: &str) -> Result<Vec<u8>, EditorError> {
        let fid = self.conn.open(&format!("{}/{}", self.id, file), OREAD).await?;
        let contents = self.conn.read_all(fid).await;
        self.conn.clunk(fid).await?;
        contents
    }

    pub async fn ctl(&mut self, command: &str) -> Result<(), EditorError> {
        let fid = self.conn.open(&format!("{}/ctl", self.id), OWRITE).await?;
        let written = self.conn.write(fid, command.as_bytes()).await;
        self.conn.clunk(fid).await?;
        written
    }

    /// Read the `addr` file, keeping it open so `addr=dot` sticks.
    pub async fn read_addr(&mut self) -> Result<Selection, EditorError> {
        let fid = match self.addr {
            Some(fid) => fid,
            None => {
                let fid = self.conn.open(&format!("{}/addr", self.id), ORDWR).await?;
                self.addr = Some(fid);
                fid
            }
        };
        let data = self.conn.read_at(fid, 0).await?;
        parse_addr(&String::from_utf8_lossy(&data))
    }

    /// Current selection (dot) in characters.
    pub async fn selection(&mut self) -> Result<Selection, EditorError> {
        // The addr file must be open before dot is copied into it.
        self.read_addr().await?;
        self.ctl("addr=dot").await?;
        self.read_addr().await
    }

    /// File name shown in the tag.
    pub async fn file_name(&mut self) -> Result<String, EditorError> {
        let tag = self.read_all("tag").await?;
        let tag = String::from_utf8(tag).map_err(|_| EditorError::InvalidText { file: "tag" })?;
        parse_file_name(&tag)
    }

    pub async fn body(&mut self) -> Result<String, EditorError> {
        let body = self.read_all("body").await?;
        String::from_utf8(body).map_err(|_| EditorError::InvalidText { file: "body" })
    }

    pub async fn close(mut self) -> Result<(), EditorError> {
        if let Some(fid) = self.addr.take() {
            self.conn.clunk(fid).await?;
        }
        Ok(())
    }
}

/// The tag starts with the file name, terminated by a space.
pub fn parse_file_name(tag: &str) -> Result<String, EditorError> {
    match tag.find(' ') {
        Some(end) if end > 0 => Ok(tag[..end].to_string()),
        _ => Err(EditorError::MissingFilename),
    }
}

/// `addr` holds two space-padded character offsets.
pub fn parse_addr(addr: &str) -> Result<Selection, EditorError> {
    let mut fields = addr.split_whitespace().map(str::parse::<usize>);
    match (fields.next(), fields.next()) {
        (Some(Ok(start)), Some(Ok(end))) => Ok(Selection { start, end }),
        _ => Err(EditorError::Protocol(format!("malformed addr {addr:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            parse_file_name("/home/glenda/src/p/p.go Del Snarf | Look ").unwrap(),
            "/home/glenda/src/p/p.go"
        );
        assert!(matches!(
            parse_file_name("nospace"),
            Err(EditorError::MissingFilename)
        ));
        assert!(matches!(
            parse_file_name(" Del Snarf"),
            Err(EditorError::MissingFilename)
        ));
    }

    #[test]
    fn test_parse_addr() {
        assert_eq!(
            parse_addr("         42          47 ").unwrap(),
            Selection { start: 42, end: 47 }
        );
        assert!(parse_addr("42").is_err());
        assert!(parse_addr("a b").is_err());
    }
}
