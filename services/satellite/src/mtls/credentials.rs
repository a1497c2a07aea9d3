//! PEM loading and checking for mutual TLS.
//!
//! Files are read once at startup. Before anything is handed to tonic the
//! PEM blocks are parsed with `rustls-pemfile`, and leaf certificates are
//! checked against their validity window with `x509-parser`, so a bad file
//! fails startup with a precise error instead of failing every handshake.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tonic::transport::{Certificate, ClientTlsConfig, Identity, ServerTlsConfig};
use tracing::info;
use x509_parser::prelude::*;

use crate::config::TlsPaths;

/// Credential loading errors. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum CredentialsError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// PEM framing is broken
    #[error("Failed to parse PEM in {path}: {reason}")]
    InvalidPem {
        /// File path
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// No CERTIFICATE block in the file
    #[error("No PEM certificate found in {path}")]
    NoCertificate {
        /// File path
        path: PathBuf,
    },

    /// No private key block in the file
    #[error("No private key found in {path}")]
    NoPrivateKey {
        /// File path
        path: PathBuf,
    },

    /// DER content is not an X.509 certificate
    #[error("Failed to parse certificate in {path}: {reason}")]
    InvalidCertificate {
        /// File path
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Certificate is outside its validity window
    #[error("Certificate in {path} is {state}")]
    OutsideValidity {
        /// File path
        path: PathBuf,
        /// "expired" or "not yet valid"
        state: &'static str,
    },
}

/// Subject and expiry of a leaf certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    /// Distinguished name of the subject
    pub subject: String,
    /// Expiry, seconds since the Unix epoch
    pub not_after: i64,
}

/// Server-side mTLS material: server identity plus the client CA.
#[derive(Debug, Clone)]
pub struct ServerCredentials {
    ca_cert: Vec<u8>,
    server_cert: Vec<u8>,
    server_key: Vec<u8>,
}

impl ServerCredentials {
    /// Reads and checks the PEM files.
    pub fn load(paths: &TlsPaths) -> Result<Self, CredentialsError> {
        let ca_cert = read_pem(&paths.ca_cert)?;
        inspect_certificate_pem(&ca_cert, &paths.ca_cert)?;

        let server_cert = read_pem(&paths.server_cert)?;
        let summary = inspect_certificate_pem(&server_cert, &paths.server_cert)?;

        let server_key = read_pem(&paths.server_key)?;
        check_private_key_pem(&server_key, &paths.server_key)?;

        info!(
            subject = %summary.subject,
            not_after = summary.not_after,
            "Server TLS credentials loaded"
        );

        Ok(Self {
            ca_cert,
            server_cert,
            server_key,
        })
    }

    /// tonic server TLS config requiring a client certificate signed by the CA.
    #[must_use]
    pub fn server_tls_config(&self) -> ServerTlsConfig {
        ServerTlsConfig::new()
            .identity(Identity::from_pem(&self.server_cert, &self.server_key))
            .client_ca_root(Certificate::from_pem(&self.ca_cert))
    }
}

/// Client-side mTLS material: client identity plus the server CA.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    ca_cert: Vec<u8>,
    client_cert: Vec<u8>,
    client_key: Vec<u8>,
}

impl ClientCredentials {
    /// Reads and checks the PEM files.
    pub fn load(ca_cert: &Path, client_cert: &Path, client_key: &Path) -> Result<Self, CredentialsError> {
        let ca = read_pem(ca_cert)?;
        inspect_certificate_pem(&ca, ca_cert)?;

        let cert = read_pem(client_cert)?;
        inspect_certificate_pem(&cert, client_cert)?;

        let key = read_pem(client_key)?;
        check_private_key_pem(&key, client_key)?;

        Ok(Self {
            ca_cert: ca,
            client_cert: cert,
            client_key: key,
        })
    }

    /// tonic client TLS config presenting the client certificate.
    #[must_use]
    pub fn client_tls_config(&self, domain: &str) -> ClientTlsConfig {
        ClientTlsConfig::new()
            .ca_certificate(Certificate::from_pem(&self.ca_cert))
            .identity(Identity::from_pem(&self.client_cert, &self.client_key))
            .domain_name(domain)
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, CredentialsError> {
    fs::read(path).map_err(|source| CredentialsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses the first certificate of a PEM bundle and checks its validity window.
pub fn inspect_certificate_pem(pem: &[u8], path: &Path) -> Result<CertificateSummary, CredentialsError> {
    let mut cursor = Cursor::new(pem);
    let cert_der = rustls_pemfile::certs(&mut cursor)
        .next()
        .ok_or_else(|| CredentialsError::NoCertificate {
            path: path.to_path_buf(),
        })?
        .map_err(|e| CredentialsError::InvalidPem {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let (_, cert) = X509Certificate::from_der(cert_der.as_ref()).map_err(|e| {
        CredentialsError::InvalidCertificate {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    check_validity(&cert, path)?;

    Ok(CertificateSummary {
        subject: cert.subject().to_string(),
        not_after: cert.validity().not_after.timestamp(),
    })
}

fn check_private_key_pem(pem: &[u8], path: &Path) -> Result<(), CredentialsError> {
    let mut cursor = Cursor::new(pem);
    match rustls_pemfile::private_key(&mut cursor) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(CredentialsError::NoPrivateKey {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(CredentialsError::InvalidPem {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

fn check_validity(cert: &X509Certificate<'_>, path: &Path) -> Result<(), CredentialsError> {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX));

    if now < cert.validity().not_before.timestamp() {
        return Err(CredentialsError::OutsideValidity {
            path: path.to_path_buf(),
            state: "not yet valid",
        });
    }
    if now > cert.validity().not_after.timestamp() {
        return Err(CredentialsError::OutsideValidity {
            path: path.to_path_buf(),
            state: "expired",
        });
    }
    Ok(())
}
