//! mTLS proxy for the Satellite service.

use std::time::Duration;

use tonic::metadata::AsciiMetadataValue;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Streaming};
use tracing::{info, instrument, warn};

use crate::auth::TOKEN_METADATA_KEY;
use crate::client::{ClientConfig, ClientError};
use crate::geometry::{Area, Location, Pixel};
use crate::mtls::ClientCredentials;
use crate::proto;
use crate::proto::satellite_client::SatelliteClient;

/// Client for point and area queries.
#[derive(Debug, Clone)]
pub struct SatelliteProxy {
    client: SatelliteClient<Channel>,
    token: AsciiMetadataValue,
    point_timeout: Duration,
    stream_timeout: Duration,
}

impl SatelliteProxy {
    /// Creates a proxy over a lazily connected mTLS channel.
    ///
    /// The first call establishes the connection.
    pub fn connect(
        config: &ClientConfig,
        credentials: &ClientCredentials,
    ) -> Result<Self, ClientError> {
        let channel = Endpoint::from_shared(config.server_url.to_string())
            .map_err(|e| ClientError::InvalidEndpoint(e.to_string()))?
            .tls_config(credentials.client_tls_config(&config.tls_domain))?
            .connect_lazy();

        info!(server = %config.server_url, "Satellite proxy ready");
        Self::with_channel(channel, config)
    }

    /// Creates a proxy over an existing channel.
    pub fn with_channel(channel: Channel, config: &ClientConfig) -> Result<Self, ClientError> {
        let token = config
            .token
            .parse::<AsciiMetadataValue>()
            .map_err(|_| ClientError::InvalidToken)?;

        Ok(Self {
            client: SatelliteClient::new(channel),
            token,
            point_timeout: config.point_timeout,
            stream_timeout: config.stream_timeout,
        })
    }

    /// Reads one pixel, sending the token and the point deadline.
    #[instrument(skip(self))]
    pub async fn get_point(&self, loc: Location) -> Result<Pixel, ClientError> {
        let mut request = Request::new(proto::Location::from(loc));
        request.set_timeout(self.point_timeout);
        request
            .metadata_mut()
            .insert(TOKEN_METADATA_KEY, self.token.clone());

        let mut client = self.client.clone();
        let image = client.get_image(request).await?.into_inner();
        Pixel::try_from(image).map_err(ClientError::InvalidResponse)
    }

    /// Reads each location in turn; failures are returned alongside the
    /// location and do not stop the remaining queries.
    pub async fn get_points<I>(&self, locations: I) -> Vec<(Location, Result<Pixel, ClientError>)>
    where
        I: IntoIterator<Item = Location>,
    {
        let mut results = Vec::new();
        for loc in locations {
            let result = self.get_point(loc).await;
            if let Err(err) = &result {
                warn!(location = %loc, error = %err, "Point query failed");
            }
            results.push((loc, result));
        }
        results
    }

    /// Opens an area stream under the stream deadline.
    #[instrument(skip(self))]
    pub async fn stream_area(&self, area: Area) -> Result<PixelStream, ClientError> {
        let mut request = Request::new(proto::Area::from(area));
        request.set_timeout(self.stream_timeout);

        let mut client = self.client.clone();
        let inner = client.get_images(request).await?.into_inner();
        Ok(PixelStream { inner })
    }
}

/// Pixels of an area, as the server sends them.
#[derive(Debug)]
pub struct PixelStream {
    inner: Streaming<proto::Image>,
}

impl PixelStream {
    /// Next pixel; `None` once the server has finished the stream.
    pub async fn next(&mut self) -> Result<Option<Pixel>, ClientError> {
        match self.inner.message().await? {
            Some(image) => Pixel::try_from(image)
                .map(Some)
                .map_err(ClientError::InvalidResponse),
            None => Ok(None),
        }
    }
}
