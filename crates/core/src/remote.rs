//! Remote file-transfer collaborator.
//!
//! The worker only needs five things from the remote side: connect (with anonymous login and a
//! directory change), list, retrieve, and quit. [`Connector`] and [`RemoteSession`] capture
//! exactly that so the worker can be driven by a real FTP server ([`FtpConnector`]) or by an
//! in-memory fake in tests.

use crate::constants::{ANONYMOUS_PASSWORD, ANONYMOUS_USER, DEFAULT_PORT};
use crate::{MirrorError, MirrorResult};
use mirror_types::NonEmptyText;
use std::io::{self, Write};
use std::net::ToSocketAddrs;
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};

/// Where to fetch from: server host, control port and remote directory.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RemoteEndpoint {
    host: NonEmptyText,
    port: u16,
    remote_path: NonEmptyText,
}

impl RemoteEndpoint {
    /// Create an endpoint on the default FTP port.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::Text` if `host` or `remote_path` is empty.
    pub fn new(host: impl AsRef<str>, remote_path: impl AsRef<str>) -> MirrorResult<Self> {
        Ok(Self {
            host: NonEmptyText::new(host)?,
            port: DEFAULT_PORT,
            remote_path: NonEmptyText::new(remote_path)?,
        })
    }

    /// Returns a copy of this endpoint using `port` for the control connection.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::InvalidInput` for port `0`.
    pub fn with_port(mut self, port: u16) -> MirrorResult<Self> {
        if port == 0 {
            return Err(MirrorError::InvalidInput("port cannot be 0".into()));
        }
        self.port = port;
        Ok(self)
    }

    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn remote_path(&self) -> &str {
        self.remote_path.as_str()
    }
}

impl std::fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ftp://{}:{}/{}", self.host, self.port, self.remote_path)
    }
}

/// Opens sessions against a remote endpoint.
pub trait Connector {
    type Session: RemoteSession;

    /// Connect, log in anonymously and change into the endpoint's remote directory.
    ///
    /// # Errors
    ///
    /// Any failure in those three steps; the caller treats it as a setup error.
    fn connect(&self, endpoint: &RemoteEndpoint) -> MirrorResult<Self::Session>;
}

/// An open, logged-in session positioned in the remote directory.
pub trait RemoteSession {
    /// Flat listing of entry names in the current remote directory.
    fn list(&mut self) -> MirrorResult<Vec<String>>;

    /// Stream the binary content of `name` into `sink`, returning the number of bytes written.
    fn retrieve(&mut self, name: &str, sink: &mut dyn Write) -> MirrorResult<u64>;

    /// Close the session.
    fn quit(self) -> MirrorResult<()>;
}

/// [`Connector`] backed by a plain (non-TLS) FTP control connection.
#[derive(Clone, Debug)]
pub struct FtpConnector {
    connect_timeout: Duration,
}

impl FtpConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Connector for FtpConnector {
    type Session = FtpSession;

    fn connect(&self, endpoint: &RemoteEndpoint) -> MirrorResult<FtpSession> {
        let resolve_error = |source| MirrorError::Resolve {
            host: endpoint.host().to_owned(),
            source,
        };

        let addr = (endpoint.host(), endpoint.port())
            .to_socket_addrs()
            .map_err(resolve_error)?
            .next()
            .ok_or_else(|| {
                resolve_error(io::Error::new(
                    io::ErrorKind::NotFound,
                    "no addresses returned",
                ))
            })?;

        tracing::debug!("connecting to {} ({})", endpoint, addr);
        let mut stream =
            FtpStream::connect_timeout(addr, self.connect_timeout).map_err(MirrorError::Connect)?;

        stream
            .login(ANONYMOUS_USER, ANONYMOUS_PASSWORD)
            .map_err(MirrorError::Login)?;
        stream
            .cwd(endpoint.remote_path())
            .map_err(|source| MirrorError::ChangeDir {
                path: endpoint.remote_path().to_owned(),
                source,
            })?;
        stream
            .transfer_type(FileType::Binary)
            .map_err(MirrorError::TransferMode)?;

        Ok(FtpSession { stream })
    }
}

/// Live FTP session created by [`FtpConnector`].
pub struct FtpSession {
    stream: FtpStream,
}

impl RemoteSession for FtpSession {
    fn list(&mut self) -> MirrorResult<Vec<String>> {
        self.stream.nlst(None).map_err(MirrorError::List)
    }

    /// The transfer is always finalized, even when writing to `sink` fails, so the control
    /// connection stays in step for the next command.
    fn retrieve(&mut self, name: &str, sink: &mut dyn Write) -> MirrorResult<u64> {
        let retrieve_error = |source| MirrorError::Retrieve {
            name: name.to_owned(),
            source,
        };

        let mut data = self.stream.retr_as_stream(name).map_err(retrieve_error)?;
        let copied = io::copy(&mut data, sink);
        let finalized = self.stream.finalize_retr_stream(data);

        let bytes = copied.map_err(|e| retrieve_error(FtpError::ConnectionError(e)))?;
        finalized.map_err(retrieve_error)?;
        Ok(bytes)
    }

    fn quit(mut self) -> MirrorResult<()> {
        self.stream.quit().map_err(MirrorError::Quit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    const FILES: &[(&str, &[u8])] = &[("a", b"alpha"), ("b", b"bravo")];

    /// Minimal single-client FTP server on loopback serving fixed file contents.
    fn serve(files: &'static [(&'static str, &'static [u8])]) -> (u16, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (control, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(control.try_clone().unwrap());
            let mut writer = control;
            let mut passive: Option<TcpListener> = None;
            let mut commands = Vec::new();

            writer.write_all(b"220 ready\r\n").unwrap();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 {
                    break;
                }
                let line = line.trim_end().to_owned();
                let (verb, arg) = line.split_once(' ').unwrap_or((line.as_str(), ""));
                commands.push(verb.to_owned());

                let reply = match verb {
                    "USER" => "331 password please".to_owned(),
                    "PASS" => "230 logged in".to_owned(),
                    "CWD" => "250 ok".to_owned(),
                    "TYPE" => "200 ok".to_owned(),
                    "PASV" => {
                        let data = TcpListener::bind("127.0.0.1:0").unwrap();
                        let data_port = data.local_addr().unwrap().port();
                        passive = Some(data);
                        format!(
                            "227 Entering Passive Mode (127,0,0,1,{},{})",
                            data_port >> 8,
                            data_port & 0xff
                        )
                    }
                    "RETR" => {
                        writer.write_all(b"150 opening\r\n").unwrap();
                        let data = passive.take().unwrap();
                        let (mut conn, _) = data.accept().unwrap();
                        let content = files
                            .iter()
                            .find(|(n, _)| *n == arg)
                            .map(|(_, c)| *c)
                            .unwrap_or_default();
                        // The client may already have hung up.
                        let _ = conn.write_all(content);
                        drop(conn);
                        "226 done".to_owned()
                    }
                    "QUIT" => {
                        writer.write_all(b"221 bye\r\n").unwrap();
                        break;
                    }
                    _ => "502 not implemented".to_owned(),
                };
                writer.write_all(format!("{reply}\r\n").as_bytes()).unwrap();
            }
            commands
        });

        (port, handle)
    }

    /// Sink that fails on the first write, like a full disk.
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn loopback(port: u16) -> FtpSession {
        let endpoint = RemoteEndpoint::new("127.0.0.1", "pub")
            .unwrap()
            .with_port(port)
            .unwrap();
        FtpConnector::new(Duration::from_secs(5))
            .connect(&endpoint)
            .unwrap()
    }

    #[test]
    fn test_ftp_session_retrieves_file() {
        let (port, server) = serve(FILES);
        let mut session = loopback(port);

        let mut sink = Vec::new();
        let bytes = session.retrieve("a", &mut sink).unwrap();
        session.quit().unwrap();

        assert_eq!(bytes, 5);
        assert_eq!(sink, b"alpha");
        let commands = server.join().unwrap();
        assert_eq!(
            commands,
            vec!["USER", "PASS", "CWD", "TYPE", "PASV", "RETR", "QUIT"]
        );
    }

    #[test]
    fn test_local_write_failure_keeps_session_usable() {
        let (port, server) = serve(FILES);
        let mut session = loopback(port);

        let failed = session.retrieve("a", &mut FullDisk);
        let mut sink = Vec::new();
        let next = session.retrieve("b", &mut sink);
        session.quit().unwrap();
        server.join().unwrap();

        assert!(matches!(failed, Err(MirrorError::Retrieve { ref name, .. }) if name == "a"));
        assert_eq!(next.unwrap(), 5);
        assert_eq!(sink, b"bravo");
    }

    #[test]
    fn test_endpoint_defaults_to_port_21() {
        let endpoint = RemoteEndpoint::new("ftp.us.debian.org", "debian").unwrap();

        assert_eq!(endpoint.host(), "ftp.us.debian.org");
        assert_eq!(endpoint.port(), 21);
        assert_eq!(endpoint.remote_path(), "debian");
        assert_eq!(endpoint.to_string(), "ftp://ftp.us.debian.org:21/debian");
    }

    #[test]
    fn test_endpoint_rejects_empty_parts() {
        assert!(matches!(
            RemoteEndpoint::new("  ", "debian"),
            Err(MirrorError::Text(_))
        ));
        assert!(matches!(
            RemoteEndpoint::new("ftp.example.org", ""),
            Err(MirrorError::Text(_))
        ));
    }

    #[test]
    fn test_endpoint_with_port() {
        let endpoint = RemoteEndpoint::new("localhost", "/pub")
            .unwrap()
            .with_port(2121)
            .unwrap();
        assert_eq!(endpoint.port(), 2121);

        let zero = RemoteEndpoint::new("localhost", "/pub").unwrap().with_port(0);
        assert!(matches!(zero, Err(MirrorError::InvalidInput(_))));
    }

    #[test]
    fn test_ftp_connector_unresolvable_host() {
        let endpoint = RemoteEndpoint::new("host.invalid", "debian").unwrap();
        let connector = FtpConnector::new(Duration::from_secs(1));

        let result = connector.connect(&endpoint);

        assert!(matches!(result, Err(MirrorError::Resolve { .. })));
    }
}
