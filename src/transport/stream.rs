//! The underlying byte stream a [`crate::transport::connection::Connection`]
//! talks over. Grounded on the teacher crate's `sync/stream.rs` `Stream`
//! enum, adapted to this crate's `sync-tls` feature name and restricted to
//! stable `Read`/`Write` (the teacher's richer variant uses nightly
//! `BorrowedCursor`/`read_buf_exact`, which this driver avoids since it
//! targets stable).

use std::io::{self, BufReader, Read, Write};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::Duration;

#[cfg(feature = "sync-tls")]
use native_tls::TlsStream;

use crate::error::{Error, Result};
use crate::transport::options::ConnectionParams;

pub enum Stream {
    Tcp(BufReader<TcpStream>),
    #[cfg(feature = "sync-tls")]
    Tls(BufReader<TlsStream<TcpStream>>),
    #[cfg(unix)]
    Unix(BufReader<UnixStream>),
}

impl Stream {
    pub fn connect_tcp(host: &str, port: u16, connect_timeout: Option<Duration>) -> Result<Self> {
        use std::net::ToSocketAddrs;

        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::BadConfig(format!("could not resolve host '{host}'")))?;

        let tcp = match connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout)?,
            None => TcpStream::connect(addr)?,
        };
        tcp.set_nodelay(true)?;
        Ok(Stream::Tcp(BufReader::new(tcp)))
    }

    #[cfg(unix)]
    pub fn connect_unix(path: &str) -> Result<Self> {
        let stream = UnixStream::connect(path)?;
        Ok(Stream::Unix(BufReader::new(stream)))
    }

    #[cfg(not(unix))]
    pub fn connect_unix(_path: &str) -> Result<Self> {
        Err(Error::BadConfig("unix sockets are not supported on this platform".into()))
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match self {
            Stream::Tcp(r) => r.get_ref().set_read_timeout(timeout)?,
            #[cfg(feature = "sync-tls")]
            Stream::Tls(r) => r.get_ref().get_ref().set_read_timeout(timeout)?,
            #[cfg(unix)]
            Stream::Unix(r) => r.get_ref().set_read_timeout(timeout)?,
        }
        Ok(())
    }

    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match self {
            Stream::Tcp(r) => r.get_ref().set_write_timeout(timeout)?,
            #[cfg(feature = "sync-tls")]
            Stream::Tls(r) => r.get_ref().get_ref().set_write_timeout(timeout)?,
            #[cfg(unix)]
            Stream::Unix(r) => r.get_ref().set_write_timeout(timeout)?,
        }
        Ok(())
    }

    /// Upgrade a plain TCP connection to TLS via an SSLRequest-style
    /// handshake continuation. Unix-socket and already-TLS streams reject
    /// the upgrade; both are programming errors at the call site.
    #[cfg(feature = "sync-tls")]
    pub fn upgrade_to_tls(self, host: &str, params: &ConnectionParams) -> Result<Self> {
        let tcp = match self {
            Stream::Tcp(buf_reader) => buf_reader.into_inner(),
            Stream::Tls(_) => return Err(Error::Tls("connection is already using TLS".into())),
            #[cfg(unix)]
            Stream::Unix(_) => return Err(Error::Tls("TLS is not supported over unix sockets".into())),
        };

        let mut builder = native_tls::TlsConnector::builder();
        if !params.ssl.mode.verifies_identity() {
            builder.danger_accept_invalid_hostnames(true);
        }
        if matches!(params.ssl.mode, crate::transport::options::SslMode::Required) {
            builder.danger_accept_invalid_certs(true);
        }
        if let Some(ca_path) = &params.ssl.ca {
            let pem = std::fs::read(ca_path)?;
            let cert = native_tls::Certificate::from_pem(&pem).map_err(|e| Error::Tls(e.to_string()))?;
            builder.add_root_certificate(cert);
        }
        let connector = builder.build().map_err(|e| Error::Tls(e.to_string()))?;
        let tls_stream = connector.connect(host, tcp).map_err(|e| Error::Tls(e.to_string()))?;

        Ok(Stream::Tls(BufReader::new(tls_stream)))
    }

    pub fn is_tls(&self) -> bool {
        #[cfg(feature = "sync-tls")]
        {
            matches!(self, Stream::Tls(_))
        }
        #[cfg(not(feature = "sync-tls"))]
        {
            false
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(r) => r.read(buf),
            #[cfg(feature = "sync-tls")]
            Stream::Tls(r) => r.read(buf),
            #[cfg(unix)]
            Stream::Unix(r) => r.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(r) => r.get_mut().write(buf),
            #[cfg(feature = "sync-tls")]
            Stream::Tls(r) => r.get_mut().write(buf),
            #[cfg(unix)]
            Stream::Unix(r) => r.get_mut().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(r) => r.get_mut().flush(),
            #[cfg(feature = "sync-tls")]
            Stream::Tls(r) => r.get_mut().flush(),
            #[cfg(unix)]
            Stream::Unix(r) => r.get_mut().flush(),
        }
    }
}
