use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Status};
use tracing::{debug, info, warn};

use crate::{ArchiveConfig, ArchiveError, ArchiveResult, BlobReader, RemoteArchive};

/// Archive client speaking FTP. Every retrieval opens its own session.
#[derive(Debug, Clone)]
pub struct FtpArchive {
    config: ArchiveConfig,
}

impl FtpArchive {
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    fn socket_addr(&self) -> ArchiveResult<SocketAddr> {
        let endpoint = self.config.endpoint();
        (self.config.host.as_str(), self.config.port)
            .to_socket_addrs()
            .map_err(|err| ArchiveError::Connect {
                endpoint: endpoint.clone(),
                reason: err.to_string(),
            })?
            .next()
            .ok_or_else(|| ArchiveError::Connect {
                endpoint,
                reason: "host resolved to no address".to_string(),
            })
    }

    /// Connect, log in and switch to binary mode.
    ///
    /// Every reply up to here is bounded by the connect timeout, the greeting
    /// included; a server that accepts and stays silent is a `Connect` error.
    fn open_session(&self) -> ArchiveResult<Session> {
        let endpoint = self.config.endpoint();
        let addr = self.socket_addr()?;
        let setup_timeout = self.config.connect_timeout();
        let connect_err = |reason: String| ArchiveError::Connect {
            endpoint: endpoint.clone(),
            reason,
        };

        let tcp = TcpStream::connect_timeout(&addr, setup_timeout)
            .map_err(|err| connect_err(err.to_string()))?;
        set_stream_timeouts(&tcp, setup_timeout).map_err(|err| connect_err(err.to_string()))?;
        let stream =
            FtpStream::connect_with_stream(tcp).map_err(|err| connect_err(err.to_string()))?;
        let mut session = Session {
            ftp: stream,
            endpoint: endpoint.clone(),
        };

        session
            .ftp
            .login(self.config.user.as_str(), self.config.password.as_str())
            .map_err(|err| match err {
                FtpError::UnexpectedResponse(_) => ArchiveError::Auth {
                    endpoint: endpoint.clone(),
                    user: self.config.user.clone(),
                    reason: err.to_string(),
                },
                other => connect_err(other.to_string()),
            })?;

        session
            .ftp
            .transfer_type(FileType::Binary)
            .map_err(|err| connect_err(format!("cannot switch to binary mode: {err}")))?;

        set_stream_timeouts(session.ftp.get_ref(), self.config.io_timeout())
            .map_err(|err| connect_err(err.to_string()))?;

        debug!(endpoint = %session.endpoint, "archive_session_open");
        Ok(session)
    }
}

fn set_stream_timeouts(stream: &TcpStream, timeout: Duration) -> io::Result<()> {
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))
}

impl RemoteArchive for FtpArchive {
    fn retrieve(&self, blob_name: &str) -> ArchiveResult<BlobReader> {
        let mut session = self.open_session()?;

        info!(endpoint = %session.endpoint, blob = blob_name, "archive_retrieve");
        let data = session
            .ftp
            .retr_as_stream(blob_name)
            .map_err(|err| classify_retrieve(blob_name, err))?;
        set_stream_timeouts(data.get_ref(), self.config.io_timeout()).map_err(|err| {
            ArchiveError::Transfer {
                blob: blob_name.to_string(),
                reason: err.to_string(),
            }
        })?;

        Ok(Box::new(FtpBlob {
            data: Some(Box::new(data)),
            session,
            blob: blob_name.to_string(),
        }))
    }

    fn describe(&self) -> String {
        format!("ftp://{}@{}", self.config.user, self.config.endpoint())
    }
}

fn classify_retrieve(blob: &str, err: FtpError) -> ArchiveError {
    match err {
        FtpError::UnexpectedResponse(ref response) if response.status == Status::FileUnavailable => {
            ArchiveError::NotFound {
                blob: blob.to_string(),
            }
        }
        other => ArchiveError::Transfer {
            blob: blob.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Control connection guard: sends `QUIT` when dropped, on every exit path.
struct Session {
    ftp: FtpStream,
    endpoint: String,
}

impl Drop for Session {
    fn drop(&mut self) {
        match self.ftp.quit() {
            Ok(()) => debug!(endpoint = %self.endpoint, "archive_session_closed"),
            Err(err) => warn!(endpoint = %self.endpoint, error = %err, "archive_quit_failed"),
        }
    }
}

/// Data channel of one `RETR` plus the session that opened it.
struct FtpBlob {
    data: Option<Box<dyn Read + Send>>,
    session: Session,
    blob: String,
}

impl Read for FtpBlob {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.as_mut() {
            Some(data) => data.read(buf),
            None => Ok(0),
        }
    }
}

impl Drop for FtpBlob {
    fn drop(&mut self) {
        // The closing 226 must be read before QUIT, or the server sees a dirty session.
        if let Some(data) = self.data.take() {
            if let Err(err) = self.session.ftp.finalize_retr_stream(data) {
                warn!(blob = %self.blob, error = %err, "archive_finalize_failed");
            }
        }
    }
}
