//! Client identity taken from the verified peer certificate.

use x509_parser::prelude::*;

/// Identity of the client on the other end of an mTLS connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdentity {
    /// Distinguished name from the client certificate
    pub subject: String,
}

impl PeerIdentity {
    /// Parses the subject out of a DER certificate.
    #[must_use]
    pub fn from_der(der: &[u8]) -> Option<Self> {
        let (_, cert) = X509Certificate::from_der(der).ok()?;
        Some(Self {
            subject: cert.subject().to_string(),
        })
    }

    /// Identity from the first peer certificate of a call, if TLS supplied one.
    #[must_use]
    pub fn from_request<T>(request: &tonic::Request<T>) -> Option<Self> {
        let certs = request.peer_certs()?;
        let der: &[u8] = certs.first()?.as_ref();
        Self::from_der(der)
    }
}
